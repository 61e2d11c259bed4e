use crate::ast::{Fodder, FodderElement, FodderKind, Location};
use crate::error::SyntaxError;
use crate::utils::get_line_and_column;
use miette::NamedSource;
use std::fmt;

/// Represents the different kinds of tokens that the lexer can produce.
/// Whitespace and comments never become tokens; they are collected as fodder
/// on the token that follows them.
#[derive(Debug, PartialEq, Clone)]
pub enum TokenType {
    // == Special Tokens ==
    /// Represents the end of the input file. Its fodder is whatever trails the
    /// last real token.
    Eof,

    // == Literals ==
    /// An identifier such as `std` or `_tmp1`.
    Identifier(String),
    /// A number literal, kept exactly as written.
    Number(String),
    /// `"..."`, with escape sequences left as written.
    StringDouble(String),
    /// `'...'`, with escape sequences left as written.
    StringSingle(String),
    /// A `|||` text block. The value has the indentation removed and ends with
    /// a newline unless the block was opened with `|||-`.
    StringBlock {
        value: String,
        indent: String,
        term_indent: String,
    },
    /// `@"..."`, with doubled quotes collapsed.
    VerbatimStringDouble(String),
    /// `@'...'`, with doubled quotes collapsed.
    VerbatimStringSingle(String),
    /// A maximal run of operator characters, e.g. `+`, `==`, `::`, `+:::`.
    Operator(String),

    // == Keywords ==
    Assert,
    Else,
    Error,
    False,
    For,
    Function,
    If,
    Import,
    ImportBin,
    ImportStr,
    In,
    Local,
    Null,
    SelfKeyword,
    Super,
    TailStrict,
    Then,
    True,

    // == Punctuation ==
    /// Left Brace: `{`
    LBrace,
    /// Right Brace: `}`
    RBrace,
    /// Left Bracket: `[`
    LBracket,
    /// Right Bracket: `]`
    RBracket,
    /// Left Parenthesis: `(`
    LParen,
    /// Right Parenthesis: `)`
    RParen,
    /// Comma: `,`
    Comma,
    /// Dollar Sign: `$` (the outermost object)
    Dollar,
    /// Dot: `.`
    Dot,
    /// Semicolon: `;`
    Semicolon,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenType::Eof => "end of file",
            TokenType::Identifier(id) => return write!(f, "identifier `{id}`"),
            TokenType::Number(n) => return write!(f, "number `{n}`"),
            TokenType::StringDouble(_)
            | TokenType::StringSingle(_)
            | TokenType::StringBlock { .. }
            | TokenType::VerbatimStringDouble(_)
            | TokenType::VerbatimStringSingle(_) => "string",
            TokenType::Operator(op) => return write!(f, "operator `{op}`"),
            TokenType::Assert => "`assert`",
            TokenType::Else => "`else`",
            TokenType::Error => "`error`",
            TokenType::False => "`false`",
            TokenType::For => "`for`",
            TokenType::Function => "`function`",
            TokenType::If => "`if`",
            TokenType::Import => "`import`",
            TokenType::ImportBin => "`importbin`",
            TokenType::ImportStr => "`importstr`",
            TokenType::In => "`in`",
            TokenType::Local => "`local`",
            TokenType::Null => "`null`",
            TokenType::SelfKeyword => "`self`",
            TokenType::Super => "`super`",
            TokenType::TailStrict => "`tailstrict`",
            TokenType::Then => "`then`",
            TokenType::True => "`true`",
            TokenType::LBrace => "`{`",
            TokenType::RBrace => "`}`",
            TokenType::LBracket => "`[`",
            TokenType::RBracket => "`]`",
            TokenType::LParen => "`(`",
            TokenType::RParen => "`)`",
            TokenType::Comma => "`,`",
            TokenType::Dollar => "`$`",
            TokenType::Dot => "`.`",
            TokenType::Semicolon => "`;`",
        };
        f.write_str(text)
    }
}

/// A token with its type, the fodder in front of it, and its position.
#[derive(Debug, Clone)]
pub struct Token {
    pub ttype: TokenType,
    pub fodder: Fodder,
    pub pos_start: usize,
    pub pos_end: usize,
    pub begin: Location,
    pub end: Location,
}

pub struct Lexer<'a> {
    input: &'a str,
    file_name: String,
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    position: usize,
    line: usize,
    column: usize,
    /// Nothing but whitespace since the last newline.
    fresh_line: bool,
    seen_token: bool,
    fodder: Fodder,
}

fn is_operator_char(c: char) -> bool {
    matches!(
        c,
        '!' | ':' | '~' | '+' | '-' | '&' | '|' | '^' | '=' | '<' | '>' | '*' | '/' | '%'
    )
}

/// Length in bytes of the leading spaces and tabs.
fn leading_whitespace(text: &str) -> usize {
    text.len() - text.trim_start_matches([' ', '\t']).len()
}

/// Length of the operator at the start of `rest`. The run stops in front of
/// comments and text blocks, and never ends in `+ - ~ !` unless it is a
/// single character, so `a=-1` lexes as `=` then `-`.
fn operator_len(rest: &str) -> usize {
    let mut len = 0;
    for (i, c) in rest.char_indices() {
        let tail = &rest[i..];
        if i > 0 && (tail.starts_with("//") || tail.starts_with("/*") || tail.starts_with("|||"))
        {
            break;
        }
        if !is_operator_char(c) {
            break;
        }
        len = i + c.len_utf8();
    }
    let bytes = rest.as_bytes();
    while len > 1 && matches!(bytes[len - 1], b'+' | b'-' | b'~' | b'!') {
        len -= 1;
    }
    len
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::new_with_name(input, "main.jsonnet".to_string())
    }

    pub fn new_with_name(input: &'a str, file_name: String) -> Self {
        Self {
            input,
            file_name,
            chars: input.chars().peekable(),
            position: 0,
            line: 1,
            column: 1,
            fresh_line: true,
            seen_token: false,
            fodder: Fodder::new(),
        }
    }

    /// Lexes the whole input. The last token is always [`TokenType::Eof`].
    pub fn lex(&mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.ttype == TokenType::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        Ok(tokens)
    }

    pub fn next_token(&mut self) -> Result<Token, SyntaxError> {
        self.lex_fodder()?;
        let start_pos = self.position;
        let begin = self.location();

        let ttype = if let Some(char) = self.advance() {
            match char {
                '{' => TokenType::LBrace,
                '}' => TokenType::RBrace,
                '[' => TokenType::LBracket,
                ']' => TokenType::RBracket,
                '(' => TokenType::LParen,
                ')' => TokenType::RParen,
                ',' => TokenType::Comma,
                '$' => TokenType::Dollar,
                '.' => TokenType::Dot,
                ';' => TokenType::Semicolon,
                '"' => TokenType::StringDouble(self.read_quoted('"', start_pos)?),
                '\'' => TokenType::StringSingle(self.read_quoted('\'', start_pos)?),
                '@' => match self.advance() {
                    Some('"') => TokenType::VerbatimStringDouble(self.read_verbatim('"', start_pos)?),
                    Some('\'') => {
                        TokenType::VerbatimStringSingle(self.read_verbatim('\'', start_pos)?)
                    }
                    _ => return Err(self.error(start_pos, "expected a quote after `@`")),
                },
                '|' if self.input[start_pos..].starts_with("|||") => self.read_text_block(start_pos)?,
                c if c.is_ascii_digit() => self.read_number(c, start_pos)?,
                c if c.is_ascii_alphabetic() || c == '_' => self.read_identifier(c),
                c if is_operator_char(c) => self.read_operator(start_pos),
                c => return Err(self.error(start_pos, format!("unexpected character `{c}`"))),
            }
        } else {
            while matches!(self.fodder.last(), Some(e) if e.kind == FodderKind::LineEnd && e.comment.is_empty())
            {
                self.fodder.pop();
            }
            TokenType::Eof
        };

        self.fresh_line = false;
        self.seen_token = true;
        Ok(Token {
            ttype,
            fodder: std::mem::take(&mut self.fodder),
            pos_start: start_pos,
            pos_end: self.position,
            begin,
            end: self.location(),
        })
    }

    fn advance(&mut self) -> Option<char> {
        let char = self.chars.next();
        if let Some(c) = char {
            self.position += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        char
    }

    fn advance_bytes(&mut self, count: usize) {
        let target = self.position + count;
        while self.position < target && self.advance().is_some() {}
    }

    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    fn location(&self) -> Location {
        Location::new(self.line, self.column)
    }

    fn error(&self, start: usize, message: impl Into<String>) -> SyntaxError {
        let (line, column) = get_line_and_column(self.input, start);
        SyntaxError::InvalidToken {
            src: NamedSource::new(&self.file_name, self.input.to_string()),
            span: (start, self.position.saturating_sub(start)).into(),
            message: message.into(),
            line,
            column,
        }
    }

    // === Fodder ===

    fn lex_fodder(&mut self) -> Result<(), SyntaxError> {
        let input = self.input;
        loop {
            let rest = &input[self.position..];
            match self.peek() {
                Some(' ' | '\t' | '\r' | '\n') => {
                    let (newlines, indent) = self.lex_whitespace();
                    if newlines > 0 {
                        // Blank lines at the very top of the file are not kept.
                        if self.seen_token || !self.fodder.is_empty() {
                            self.fodder.push(FodderElement::new(
                                FodderKind::LineEnd,
                                newlines - 1,
                                indent,
                                Vec::new(),
                            ));
                        }
                        self.fresh_line = true;
                    }
                }
                Some('#') => {
                    self.advance();
                    self.lex_line_comment("#");
                }
                Some('/') if rest.starts_with("//") => {
                    self.advance_bytes(2);
                    self.lex_line_comment("//");
                }
                Some('/') if rest.starts_with("/*") => self.lex_block_comment()?,
                _ => return Ok(()),
            }
        }
    }

    /// Consumes whitespace, returning the newlines seen and the indentation of
    /// the last line. A tab counts as eight columns.
    fn lex_whitespace(&mut self) -> (usize, usize) {
        let mut newlines = 0;
        let mut indent = 0;
        while let Some(&c) = self.peek() {
            match c {
                '\n' => {
                    newlines += 1;
                    indent = 0;
                }
                ' ' => indent += 1,
                '\t' => indent += 8,
                '\r' => {}
                _ => break,
            }
            self.advance();
        }
        (newlines, indent)
    }

    /// `//` and `#` comments run to the end of the line. On a line of their
    /// own they form a paragraph, otherwise they end the current line.
    fn lex_line_comment(&mut self, prefix: &str) {
        let mut text = String::from(prefix);
        while let Some(&c) = self.peek() {
            if c == '\n' {
                break;
            }
            text.push(c);
            self.advance();
        }
        let text = text.trim_end().to_string();
        let kind = if self.fresh_line {
            FodderKind::Paragraph
        } else {
            FodderKind::LineEnd
        };
        let (newlines, indent) = self.lex_whitespace();
        self.fodder.push(FodderElement::new(
            kind,
            newlines.saturating_sub(1),
            indent,
            vec![text],
        ));
        self.fresh_line = newlines > 0;
    }

    /// A `/* */` comment alone on its lines is a paragraph. Anywhere else it is
    /// an interstitial between two tokens.
    fn lex_block_comment(&mut self) -> Result<(), SyntaxError> {
        let start = self.position;
        let start_column = self.column;
        self.advance_bytes(2);
        let mut text = String::from("/*");
        loop {
            match self.advance() {
                None => return Err(self.error(start, "unterminated multi-line comment")),
                Some('*') if self.peek() == Some(&'/') => {
                    self.advance();
                    text.push_str("*/");
                    break;
                }
                Some(c) => text.push(c),
            }
        }

        let input = self.input;
        let rest = &input[self.position..];
        let line_rest = rest.find('\n').map_or(rest, |i| &rest[..i]);
        if self.fresh_line && line_rest.trim().is_empty() {
            let strip = start_column - 1;
            let lines = text
                .split('\n')
                .enumerate()
                .map(|(i, line)| {
                    let line = if i == 0 {
                        line
                    } else {
                        let ws = leading_whitespace(line).min(strip);
                        &line[ws..]
                    };
                    line.trim_end().to_string()
                })
                .collect();
            let (newlines, indent) = self.lex_whitespace();
            self.fodder.push(FodderElement::new(
                FodderKind::Paragraph,
                newlines.saturating_sub(1),
                indent,
                lines,
            ));
            self.fresh_line = newlines > 0;
        } else {
            self.fodder.push(FodderElement::new(
                FodderKind::Interstitial,
                0,
                0,
                vec![text],
            ));
            self.fresh_line = false;
        }
        Ok(())
    }

    // === Tokens ===

    /// Reads a quoted string after its opening quote. Escapes are kept raw.
    fn read_quoted(&mut self, quote: char, start: usize) -> Result<String, SyntaxError> {
        let mut value = String::new();
        loop {
            match self.advance() {
                None => return Err(self.error(start, "unterminated string")),
                Some(c) if c == quote => return Ok(value),
                Some('\\') => {
                    value.push('\\');
                    match self.advance() {
                        Some(c) => value.push(c),
                        None => return Err(self.error(start, "unterminated string")),
                    }
                }
                Some(c) => value.push(c),
            }
        }
    }

    fn read_verbatim(&mut self, quote: char, start: usize) -> Result<String, SyntaxError> {
        let mut value = String::new();
        loop {
            match self.advance() {
                None => return Err(self.error(start, "unterminated verbatim string")),
                Some(c) if c == quote => {
                    if self.peek() == Some(&quote) {
                        self.advance();
                        value.push(quote);
                    } else {
                        return Ok(value);
                    }
                }
                Some(c) => value.push(c),
            }
        }
    }

    /// Reads a `|||` text block; the first `|` is already consumed.
    fn read_text_block(&mut self, start: usize) -> Result<TokenType, SyntaxError> {
        self.advance_bytes(2);
        let chomp = self.peek() == Some(&'-');
        if chomp {
            self.advance();
        }
        while matches!(self.peek(), Some(' ' | '\t' | '\r')) {
            self.advance();
        }
        if self.peek() != Some(&'\n') {
            return Err(self.error(start, "text block requires a new line after |||"));
        }
        self.advance();

        let mut value = String::new();
        while self.peek() == Some(&'\n') {
            value.push('\n');
            self.advance();
        }
        let input = self.input;
        let indent_len = leading_whitespace(&input[self.position..]);
        if indent_len == 0 {
            return Err(self.error(start, "text block's first line must start with whitespace"));
        }
        let indent = input[self.position..self.position + indent_len].to_string();

        loop {
            self.advance_bytes(indent_len);
            loop {
                match self.advance() {
                    None => return Err(self.error(start, "unexpected end of file in text block")),
                    Some('\n') => break,
                    Some('\r') => {}
                    Some(c) => value.push(c),
                }
            }
            value.push('\n');
            while self.peek() == Some(&'\n') {
                value.push('\n');
                self.advance();
            }

            let rest = &input[self.position..];
            if !rest.starts_with(indent.as_str()) {
                let term_len = leading_whitespace(rest);
                if !rest[term_len..].starts_with("|||") {
                    return Err(self.error(start, "text block not terminated with |||"));
                }
                let term_indent = rest[..term_len].to_string();
                self.advance_bytes(term_len + 3);
                if chomp {
                    value.pop();
                }
                return Ok(TokenType::StringBlock {
                    value,
                    indent,
                    term_indent,
                });
            }
        }
    }

    fn read_number(&mut self, first_char: char, start: usize) -> Result<TokenType, SyntaxError> {
        let mut number_str = String::new();
        number_str.push(first_char);
        if first_char != '0' {
            self.read_digits(&mut number_str);
        }
        if self.peek() == Some(&'.') {
            number_str.push('.');
            self.advance();
            if !self.peek().is_some_and(char::is_ascii_digit) {
                return Err(self.error(start, "junk after decimal point in number"));
            }
            self.read_digits(&mut number_str);
        }
        if let Some(&e) = self.peek().filter(|c| matches!(c, 'e' | 'E')) {
            number_str.push(e);
            self.advance();
            if let Some(&sign) = self.peek().filter(|c| matches!(c, '+' | '-')) {
                number_str.push(sign);
                self.advance();
            }
            if !self.peek().is_some_and(char::is_ascii_digit) {
                return Err(self.error(start, "junk after exponent in number"));
            }
            self.read_digits(&mut number_str);
        }
        Ok(TokenType::Number(number_str))
    }

    fn read_digits(&mut self, out: &mut String) {
        while let Some(&c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            out.push(c);
            self.advance();
        }
    }

    fn read_identifier(&mut self, first_char: char) -> TokenType {
        let mut ident = String::new();
        ident.push(first_char);

        while let Some(&c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                ident.push(c);
                self.advance();
            } else {
                break;
            }
        }

        match ident.as_str() {
            "assert" => TokenType::Assert,
            "else" => TokenType::Else,
            "error" => TokenType::Error,
            "false" => TokenType::False,
            "for" => TokenType::For,
            "function" => TokenType::Function,
            "if" => TokenType::If,
            "import" => TokenType::Import,
            "importbin" => TokenType::ImportBin,
            "importstr" => TokenType::ImportStr,
            "in" => TokenType::In,
            "local" => TokenType::Local,
            "null" => TokenType::Null,
            "self" => TokenType::SelfKeyword,
            "super" => TokenType::Super,
            "tailstrict" => TokenType::TailStrict,
            "then" => TokenType::Then,
            "true" => TokenType::True,
            _ => TokenType::Identifier(ident),
        }
    }

    /// The first operator character is already consumed.
    fn read_operator(&mut self, start: usize) -> TokenType {
        let len = operator_len(&self.input[start..]);
        self.advance_bytes(start + len - self.position);
        TokenType::Operator(self.input[start..start + len].to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<Token> {
        Lexer::new(input).lex().unwrap()
    }

    fn assert_tokens(input: &str, expected: Vec<TokenType>) {
        let token_types: Vec<TokenType> = lex(input).into_iter().map(|t| t.ttype).collect();
        assert_eq!(token_types, expected);
    }

    fn op(s: &str) -> TokenType {
        TokenType::Operator(s.to_string())
    }

    #[test]
    fn test_eof() {
        assert_tokens("", vec![TokenType::Eof]);
    }

    #[test]
    fn test_punctuation() {
        assert_tokens(
            "{}[](),$.;",
            vec![
                TokenType::LBrace,
                TokenType::RBrace,
                TokenType::LBracket,
                TokenType::RBracket,
                TokenType::LParen,
                TokenType::RParen,
                TokenType::Comma,
                TokenType::Dollar,
                TokenType::Dot,
                TokenType::Semicolon,
                TokenType::Eof,
            ],
        );
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_tokens(
            "local self super importstr tailstrict std _x1",
            vec![
                TokenType::Local,
                TokenType::SelfKeyword,
                TokenType::Super,
                TokenType::ImportStr,
                TokenType::TailStrict,
                TokenType::Identifier("std".into()),
                TokenType::Identifier("_x1".into()),
                TokenType::Eof,
            ],
        );
    }

    #[test]
    fn test_operators_back_off_trailing_unary() {
        assert_tokens(
            "a=-1",
            vec![
                TokenType::Identifier("a".into()),
                op("="),
                op("-"),
                TokenType::Number("1".into()),
                TokenType::Eof,
            ],
        );
        assert_tokens(
            "a+:: 1 != !b",
            vec![
                TokenType::Identifier("a".into()),
                op("+::"),
                TokenType::Number("1".into()),
                op("!="),
                op("!"),
                TokenType::Identifier("b".into()),
                TokenType::Eof,
            ],
        );
    }

    #[test]
    fn test_operator_stops_before_comment() {
        let tokens = lex("1 +// c\n2");
        assert_eq!(tokens[1].ttype, op("+"));
        assert_eq!(tokens[2].fodder[0].comment, vec!["// c"]);
    }

    #[test]
    fn test_numbers_keep_their_spelling() {
        assert_tokens(
            "0 3.123 1e10 2.5E-3",
            vec![
                TokenType::Number("0".into()),
                TokenType::Number("3.123".into()),
                TokenType::Number("1e10".into()),
                TokenType::Number("2.5E-3".into()),
                TokenType::Eof,
            ],
        );
        assert!(Lexer::new("1.").lex().is_err());
        assert!(Lexer::new("1e+").lex().is_err());
    }

    #[test]
    fn test_strings_keep_escapes() {
        assert_tokens(
            r#"'a\'b' "c\n" @'it''s' @"say ""hi""""#,
            vec![
                TokenType::StringSingle(r"a\'b".into()),
                TokenType::StringDouble(r"c\n".into()),
                TokenType::VerbatimStringSingle("it's".into()),
                TokenType::VerbatimStringDouble(r#"say "hi""#.into()),
                TokenType::Eof,
            ],
        );
    }

    #[test]
    fn test_unterminated_string_is_an_error() {
        let err = Lexer::new("'abc").lex().unwrap_err();
        assert_eq!(err.position(), (1, 1));
        assert!(err.to_string().contains("unterminated string"));
    }

    #[test]
    fn test_text_block() {
        let tokens = lex("|||\n  a\n\n   b\n|||");
        assert_eq!(
            tokens[0].ttype,
            TokenType::StringBlock {
                value: "a\n\n b\n".into(),
                indent: "  ".into(),
                term_indent: "".into(),
            }
        );
    }

    #[test]
    fn test_chomped_text_block() {
        let tokens = lex("x: |||-\n    a\n  |||");
        assert_eq!(
            tokens[2].ttype,
            TokenType::StringBlock {
                value: "a".into(),
                indent: "    ".into(),
                term_indent: "  ".into(),
            }
        );
    }

    #[test]
    fn test_text_block_needs_indentation() {
        assert!(Lexer::new("|||\na\n|||").lex().is_err());
        assert!(Lexer::new("||| a\n  b\n|||").lex().is_err());
    }

    #[test]
    fn test_comment_on_own_line_is_paragraph() {
        let tokens = lex("// Output the number one\n1");
        assert_eq!(
            tokens[0].fodder,
            vec![FodderElement::new(
                FodderKind::Paragraph,
                0,
                0,
                vec!["// Output the number one".into()]
            )]
        );
    }

    #[test]
    fn test_trailing_comment_is_line_end() {
        let tokens = lex("[1, // add two\n  2]");
        let two = &tokens[3];
        assert_eq!(two.ttype, TokenType::Number("2".into()));
        assert_eq!(
            two.fodder,
            vec![FodderElement::new(FodderKind::LineEnd, 0, 2, vec!["// add two".into()])]
        );
    }

    #[test]
    fn test_blank_lines_are_counted() {
        let tokens = lex("a\n\n\n    b");
        assert_eq!(
            tokens[1].fodder,
            vec![FodderElement::new(FodderKind::LineEnd, 2, 4, vec![])]
        );
    }

    #[test]
    fn test_inline_block_comment_is_interstitial() {
        let tokens = lex("a /* b */ c");
        assert_eq!(
            tokens[1].fodder,
            vec![FodderElement::new(FodderKind::Interstitial, 0, 0, vec!["/* b */".into()])]
        );
    }

    #[test]
    fn test_block_comment_paragraph_is_split_into_lines() {
        let tokens = lex("{\n  /* a\n     b */\n  x: 1 }");
        let x = &tokens[1];
        assert_eq!(x.fodder[0].kind, FodderKind::LineEnd);
        assert_eq!(
            x.fodder[1],
            FodderElement::new(FodderKind::Paragraph, 0, 2, vec!["/* a".into(), "   b */".into()])
        );
    }

    #[test]
    fn test_hash_comments() {
        let tokens = lex("# top\n1 # tail");
        assert_eq!(tokens[0].fodder[0].kind, FodderKind::Paragraph);
        assert_eq!(tokens[0].fodder[0].comment, vec!["# top"]);
        assert_eq!(tokens[1].fodder[0].kind, FodderKind::LineEnd);
        assert_eq!(tokens[1].fodder[0].comment, vec!["# tail"]);
    }

    #[test]
    fn test_trailing_newlines_are_dropped_from_final_fodder() {
        let tokens = lex("\n\n1\n\n");
        assert!(tokens[0].fodder.is_empty());
        assert!(tokens[1].fodder.is_empty());
    }

    #[test]
    fn test_positions() {
        let tokens = lex("a\n  bc");
        assert_eq!(tokens[1].begin, Location::new(2, 3));
        assert_eq!(tokens[1].end, Location::new(2, 5));
        assert_eq!((tokens[1].pos_start, tokens[1].pos_end), (4, 6));
    }
}
