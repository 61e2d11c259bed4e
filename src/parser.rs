use crate::ast::*;
use crate::error::SyntaxError;
use crate::lexer::{Lexer, Token, TokenType};
use crate::utils::with_stack;
use miette::NamedSource;
use std::collections::HashSet;
use std::sync::Arc;

const MAX_PRECEDENCE: u8 = 15;
const UNARY_PRECEDENCE: u8 = 4;
const APPLY_PRECEDENCE: u8 = 2;

/// A recursive descent parser for Jsonnet that keeps every comment and line
/// break as fodder on the node it precedes.
#[derive(Debug)]
pub struct Parser<'a> {
    source: NamedSource<String>,
    tokens: Vec<Token>,
    position: usize,
    source_text: &'a str,
    file_name: String,
    file: Option<Arc<Source>>,
}

/// Parses a whole snippet, returning the root node and the fodder that trails
/// the last token.
pub fn parse_snippet(file_name: &str, source_text: &str) -> Result<(Node, Fodder), SyntaxError> {
    Parser::new_with_name(source_text, file_name.to_string())?.parse_snippet()
}

impl<'a> Parser<'a> {
    pub fn new(source_text: &'a str) -> Result<Self, SyntaxError> {
        Self::new_with_name(source_text, "main.jsonnet".to_string())
    }

    pub fn new_with_name(source_text: &'a str, name: String) -> Result<Self, SyntaxError> {
        let source = NamedSource::new(&name, source_text.to_string());
        let mut lexer = Lexer::new_with_name(source_text, name.clone());
        let tokens = lexer.lex()?;

        Ok(Self {
            source,
            tokens,
            position: 0,
            source_text,
            file_name: name,
            file: None,
        })
    }

    /// Attaches the full source text to every location range.
    #[must_use]
    pub fn with_source_attached(mut self) -> Self {
        self.file = Some(Arc::new(Source::new(&self.file_name, self.source_text)));
        self
    }

    // === Main Parsing Methods ===

    ///    Snippet ::= Expr EOF
    pub fn parse_snippet(&mut self) -> Result<(Node, Fodder), SyntaxError> {
        let node = self.parse(MAX_PRECEDENCE)?;
        if !self.check(TokenType::Eof) {
            return self.err_unexpected("end of file");
        }
        let eof = self.pop()?;
        Ok((node, eof.fodder))
    }

    /// Expr ::= "local" Bind { "," Bind } ";" Expr
    ///        | "assert" Expr [ ":" Expr ] ";" Expr
    ///        | "error" Expr
    ///        | "if" Expr "then" Expr [ "else" Expr ]
    ///        | "function" "(" Params ")" Expr
    ///        | ( "import" | "importstr" | "importbin" ) String
    ///        | UnaryOp Expr
    ///        | Expr BinaryOp Expr
    ///        | Postfix
    ///
    /// Only operators binding at `max_prec` or tighter are folded in. The
    /// keyword forms extend as far right as possible at any level.
    fn parse(&mut self, max_prec: u8) -> Result<Node, SyntaxError> {
        with_stack(|| {
            let begin = self.current_token()?.clone();
            match begin.ttype {
                TokenType::Assert => self.parse_assert(begin),
                TokenType::Error => self.parse_error(begin),
                TokenType::If => self.parse_conditional(begin),
                TokenType::Function => self.parse_function(begin),
                TokenType::Import | TokenType::ImportStr | TokenType::ImportBin => self.parse_import(begin),
                TokenType::Local => self.parse_local(begin),
                TokenType::Operator(_) => {
                    let unary = self.parse_unary(begin)?;
                    self.parse_infix(unary, max_prec)
                }
                _ => {
                    let terminal = self.parse_terminal()?;
                    self.parse_infix(terminal, max_prec)
                }
            }
        })
    }

    #[inline(never)]
    fn parse_assert(&mut self, begin: Token) -> Result<Node, SyntaxError> {
        self.advance();
        let cond = self.parse(MAX_PRECEDENCE)?;
        let mut colon_fodder = Fodder::new();
        let mut message = None;
        if self.check_op(":") {
            colon_fodder = self.pop()?.fodder;
            message = Some(Box::new(self.parse(MAX_PRECEDENCE)?));
        }
        let semicolon = self.pop_expect(TokenType::Semicolon)?;
        let rest = self.parse(MAX_PRECEDENCE)?;
        let kind = NodeKind::Assert(Assert {
            cond: Box::new(cond),
            colon_fodder,
            message,
            semicolon_fodder: semicolon.fodder,
            rest: Box::new(rest),
        });
        Ok(self.node(kind, begin))
    }

    #[inline(never)]
    fn parse_error(&mut self, begin: Token) -> Result<Node, SyntaxError> {
        self.advance();
        let expr = self.parse(MAX_PRECEDENCE)?;
        Ok(self.node(NodeKind::Error(Box::new(expr)), begin))
    }

    #[inline(never)]
    fn parse_conditional(&mut self, begin: Token) -> Result<Node, SyntaxError> {
        self.advance();
        let cond = self.parse(MAX_PRECEDENCE)?;
        let then = self.pop_expect(TokenType::Then)?;
        let branch_true = self.parse(MAX_PRECEDENCE)?;
        let mut else_fodder = Fodder::new();
        let mut branch_false = None;
        if self.check(TokenType::Else) {
            else_fodder = self.pop()?.fodder;
            branch_false = Some(Box::new(self.parse(MAX_PRECEDENCE)?));
        }
        let kind = NodeKind::Conditional(Conditional {
            cond: Box::new(cond),
            then_fodder: then.fodder,
            branch_true: Box::new(branch_true),
            else_fodder,
            branch_false,
        });
        Ok(self.node(kind, begin))
    }

    #[inline(never)]
    fn parse_function(&mut self, begin: Token) -> Result<Node, SyntaxError> {
        self.advance();
        let paren_left = self.pop_expect(TokenType::LParen)?;
        let params = self.parse_params(paren_left)?;
        let body = self.parse(MAX_PRECEDENCE)?;
        let kind = NodeKind::Function(Function {
            params,
            body: Box::new(body),
        });
        Ok(self.node(kind, begin))
    }

    #[inline(never)]
    fn parse_import(&mut self, begin: Token) -> Result<Node, SyntaxError> {
        self.advance();
        let file = self.parse(MAX_PRECEDENCE)?;
        match &file.kind {
            NodeKind::LiteralString(s) if s.kind == LiteralStringKind::Block => {
                return self.err_invalid(&begin, "block string literals are not allowed in imports")
            }
            NodeKind::LiteralString(_) => {}
            _ => return self.err_invalid(&begin, "computed imports are not allowed"),
        }
        let file = Box::new(file);
        let kind = match &begin.ttype {
            TokenType::Import => NodeKind::Import(file),
            TokenType::ImportStr => NodeKind::ImportStr(file),
            _ => NodeKind::ImportBin(file),
        };
        Ok(self.node(kind, begin))
    }

    #[inline(never)]
    fn parse_local(&mut self, begin: Token) -> Result<Node, SyntaxError> {
        self.advance();
        let mut binds: Vec<LocalBind> = Vec::new();
        loop {
            let delim = self.parse_bind(&mut binds)?;
            if delim.ttype == TokenType::Semicolon {
                break;
            }
        }
        let body = self.parse(MAX_PRECEDENCE)?;
        let kind = NodeKind::Local(Local {
            binds,
            body: Box::new(body),
        });
        Ok(self.node(kind, begin))
    }

    /// The operand of a unary operator takes postfix forms only, so `-a.b`
    /// negates `a.b` and `-a * b` multiplies `-a`.
    #[inline(never)]
    fn parse_unary(&mut self, begin: Token) -> Result<Node, SyntaxError> {
        let op = match &begin.ttype {
            TokenType::Operator(symbol) => UnaryOp::from_symbol(symbol),
            _ => None,
        };
        let Some(op) = op else {
            return self.err_unexpected("an expression");
        };
        self.advance();
        let expr = self.parse(UNARY_PRECEDENCE)?;
        let kind = NodeKind::Unary(Unary {
            op,
            expr: Box::new(expr),
        });
        Ok(self.node(kind, begin))
    }

    /// Folds binary operators and postfix forms binding at `max_prec` or
    /// tighter onto `lhs`. Operands of a binary operator only take operators
    /// that bind strictly tighter, which keeps every level left-associative.
    fn parse_infix(&mut self, mut lhs: Node, max_prec: u8) -> Result<Node, SyntaxError> {
        loop {
            let next = self.current_token()?;
            let binary_op = match &next.ttype {
                TokenType::In => Some(BinaryOp::In),
                // A colon ends the expression: assert messages, slices and
                // object fields all rely on it.
                TokenType::Operator(symbol) if symbol == ":" || symbol == "::" => return Ok(lhs),
                TokenType::Operator(symbol) => match BinaryOp::from_symbol(symbol) {
                    Some(op) => Some(op),
                    None => return self.err_unexpected("a binary operator"),
                },
                TokenType::Dot | TokenType::LBracket | TokenType::LParen | TokenType::LBrace => None,
                _ => return Ok(lhs),
            };
            let prec = binary_op.map_or(APPLY_PRECEDENCE, BinaryOp::precedence);
            if prec > max_prec {
                return Ok(lhs);
            }

            let begin = lhs.base.loc_range.clone();
            let op = self.pop()?;
            let kind = match binary_op {
                None => self.parse_postfix(lhs, op)?,
                Some(BinaryOp::In) if self.check(TokenType::Super) => {
                    let super_token = self.pop()?;
                    NodeKind::InSuper(InSuper {
                        index: Box::new(lhs),
                        in_fodder: op.fodder,
                        super_fodder: super_token.fodder,
                    })
                }
                Some(binary_op) => {
                    let rhs = self.parse(prec - 1)?;
                    NodeKind::Binary(Binary {
                        left: Box::new(lhs),
                        op_fodder: op.fodder,
                        op: binary_op,
                        right: Box::new(rhs),
                    })
                }
            };
            let loc_range = LocationRange {
                end: self.last_end(begin.end),
                ..begin
            };
            lhs = Node::new(kind, Fodder::new(), loc_range);
        }
    }

    /// Postfix ::= Expr "." Id | Expr "[" ... "]" | Expr "(" Arguments [ "tailstrict" ]
    ///           | Expr "{" Object
    #[inline(never)]
    fn parse_postfix(&mut self, lhs: Node, op: Token) -> Result<NodeKind, SyntaxError> {
        let kind = match op.ttype {
            TokenType::LBracket => self.parse_index_or_slice(lhs, op)?,
            TokenType::Dot => {
                let id = self.pop_expect_identifier()?;
                let name = identifier(&id);
                NodeKind::Index(Index {
                    target: Box::new(lhs),
                    left_bracket_fodder: op.fodder,
                    index: None,
                    right_bracket_fodder: id.fodder,
                    id: Some(name),
                })
            }
            TokenType::LParen => {
                let (arguments, trailing_comma, paren_right) = self.parse_arguments()?;
                let mut tail_strict = false;
                let mut tail_strict_fodder = Fodder::new();
                if self.check(TokenType::TailStrict) {
                    tail_strict = true;
                    tail_strict_fodder = self.pop()?.fodder;
                }
                NodeKind::Apply(Apply {
                    target: Box::new(lhs),
                    fodder_left: op.fodder,
                    arguments,
                    trailing_comma,
                    fodder_right: paren_right.fodder,
                    tail_strict,
                    tail_strict_fodder,
                })
            }
            _ => {
                let object = self.parse_object_remainder(op)?;
                NodeKind::ApplyBrace(ApplyBrace {
                    left: Box::new(lhs),
                    right: Box::new(object),
                })
            }
        };
        Ok(kind)
    }

    /// Index ::= "[" Expr "]"
    /// Slice ::= "[" [ Expr ] ":" [ Expr ] [ ":" [ Expr ] ] "]"
    fn parse_index_or_slice(&mut self, target: Node, bracket: Token) -> Result<NodeKind, SyntaxError> {
        let mut indexes: [Option<Box<Node>>; 3] = [None, None, None];
        let mut colon_fodders: [Fodder; 2] = [Fodder::new(), Fodder::new()];
        let mut colons = 0;
        let mut ready_for_index = true;
        while colons < 3 {
            if self.check(TokenType::RBracket) {
                break;
            } else if self.check_op(":") {
                if colons == 2 {
                    return self.err_unexpected("`]`");
                }
                colon_fodders[colons] = self.pop()?.fodder;
                colons += 1;
                ready_for_index = true;
            } else if self.check_op("::") {
                if colons > 0 {
                    return self.err_unexpected("`]`");
                }
                colon_fodders[0] = self.pop()?.fodder;
                colons = 2;
                ready_for_index = true;
            } else if ready_for_index {
                indexes[colons] = Some(Box::new(self.parse(MAX_PRECEDENCE)?));
                ready_for_index = false;
            } else {
                return self.err_unexpected("`:` or `]`");
            }
        }
        let close = self.pop_expect(TokenType::RBracket)?;
        let [begin_index, end_index, step] = indexes;
        let [end_colon_fodder, step_colon_fodder] = colon_fodders;

        if colons == 0 {
            if begin_index.is_none() {
                return self.err_invalid(&close, "expected an index between the brackets");
            }
            return Ok(NodeKind::Index(Index {
                target: Box::new(target),
                left_bracket_fodder: bracket.fodder,
                index: begin_index,
                right_bracket_fodder: close.fodder,
                id: None,
            }));
        }
        Ok(NodeKind::Slice(Slice {
            target: Box::new(target),
            left_bracket_fodder: bracket.fodder,
            begin_index,
            end_colon_fodder,
            end_index,
            step_colon_fodder,
            step,
            right_bracket_fodder: close.fodder,
        }))
    }

    /// Terminal ::= Literal | Identifier | "self" | "$" | "super" ( "." Id | "[" Expr "]" )
    ///            | "(" Expr ")" | Object | Array
    fn parse_terminal(&mut self) -> Result<Node, SyntaxError> {
        let token = self.current_token()?.clone();
        let kind = match &token.ttype {
            TokenType::LBrace => {
                self.advance();
                return self.parse_object_remainder(token);
            }
            TokenType::LBracket => {
                self.advance();
                return self.parse_array(token);
            }
            TokenType::LParen => {
                self.advance();
                let inner = self.parse(MAX_PRECEDENCE)?;
                let close = self.pop_expect(TokenType::RParen)?;
                NodeKind::Parens(Parens {
                    inner: Box::new(inner),
                    close_fodder: close.fodder,
                })
            }
            TokenType::Number(text) => {
                self.advance();
                NodeKind::LiteralNumber(text.clone())
            }
            TokenType::StringDouble(_)
            | TokenType::StringSingle(_)
            | TokenType::StringBlock { .. }
            | TokenType::VerbatimStringDouble(_)
            | TokenType::VerbatimStringSingle(_) => {
                self.advance();
                NodeKind::LiteralString(string_literal(&token.ttype))
            }
            TokenType::True => {
                self.advance();
                NodeKind::LiteralBoolean(true)
            }
            TokenType::False => {
                self.advance();
                NodeKind::LiteralBoolean(false)
            }
            TokenType::Null => {
                self.advance();
                NodeKind::LiteralNull
            }
            TokenType::Dollar => {
                self.advance();
                NodeKind::Dollar
            }
            TokenType::SelfKeyword => {
                self.advance();
                NodeKind::SelfObject
            }
            TokenType::Identifier(id) => {
                self.advance();
                NodeKind::Var(id.clone())
            }
            TokenType::Super => {
                self.advance();
                self.parse_super_index()?
            }
            _ => return self.err_unexpected("an expression"),
        };
        Ok(self.node(kind, token))
    }

    fn parse_super_index(&mut self) -> Result<NodeKind, SyntaxError> {
        let next = self.current_token()?.clone();
        match next.ttype {
            TokenType::Dot => {
                self.advance();
                let id = self.pop_expect_identifier()?;
                let name = identifier(&id);
                Ok(NodeKind::SuperIndex(SuperIndex {
                    dot_fodder: next.fodder,
                    index: None,
                    id_fodder: id.fodder,
                    id: Some(name),
                }))
            }
            TokenType::LBracket => {
                self.advance();
                let index = self.parse(MAX_PRECEDENCE)?;
                let close = self.pop_expect(TokenType::RBracket)?;
                Ok(NodeKind::SuperIndex(SuperIndex {
                    dot_fodder: next.fodder,
                    index: Some(Box::new(index)),
                    id_fodder: close.fodder,
                    id: None,
                }))
            }
            _ => self.err_unexpected("`.` or `[` after `super`"),
        }
    }

    /// Arguments ::= [ Arg { "," Arg } [ "," ] ] ")"
    /// Arg ::= Expr | Identifier "=" Expr
    ///
    /// Returns the arguments, whether a trailing comma was present, and the
    /// closing parenthesis.
    fn parse_arguments(&mut self) -> Result<(Arguments, bool, Token), SyntaxError> {
        let mut arguments = Arguments::default();
        let mut got_comma = false;
        let mut first = true;
        loop {
            if self.check(TokenType::RParen) {
                let close = self.pop()?;
                return Ok((arguments, got_comma, close));
            }
            if !first && !got_comma {
                return self.err_unexpected("`,` before the next argument");
            }

            let is_named = matches!(self.current_token()?.ttype, TokenType::Identifier(_))
                && self.peek_is_op("=");
            if is_named {
                let name = self.pop()?;
                let eq = self.pop()?;
                let arg = self.parse(MAX_PRECEDENCE)?;
                arguments.named.push(NamedArgument {
                    name_fodder: name.fodder.clone(),
                    name: identifier(&name),
                    eq_fodder: eq.fodder,
                    arg,
                    comma_fodder: Fodder::new(),
                });
            } else {
                let start = self.current_token()?.clone();
                let expr = self.parse(MAX_PRECEDENCE)?;
                if !arguments.named.is_empty() {
                    return self.err_invalid(&start, "positional argument after a named argument");
                }
                arguments.positional.push(CommaSeparatedExpr {
                    expr,
                    comma_fodder: Fodder::new(),
                });
            }

            got_comma = false;
            if self.check(TokenType::Comma) {
                let comma = self.pop()?;
                got_comma = true;
                let comma_fodder = if is_named {
                    arguments.named.last_mut().map(|a| &mut a.comma_fodder)
                } else {
                    arguments.positional.last_mut().map(|a| &mut a.comma_fodder)
                };
                if let Some(slot) = comma_fodder {
                    *slot = comma.fodder;
                }
            }
            first = false;
        }
    }

    /// Params ::= "(" [ Param { "," Param } [ "," ] ] ")"
    /// Param ::= Identifier [ "=" Expr ]
    fn parse_params(&mut self, paren_left: Token) -> Result<Params, SyntaxError> {
        let mut parameters: Vec<Parameter> = Vec::new();
        let mut got_comma = false;
        loop {
            if self.check(TokenType::RParen) {
                let close = self.pop()?;
                return Ok(Params {
                    paren_left_fodder: paren_left.fodder,
                    parameters,
                    trailing_comma: got_comma,
                    paren_right_fodder: close.fodder,
                });
            }
            if !parameters.is_empty() && !got_comma {
                return self.err_unexpected("`,` before the next parameter");
            }
            let name = self.pop_expect_identifier()?;
            let mut eq_fodder = Fodder::new();
            let mut default_arg = None;
            if self.check_op("=") {
                eq_fodder = self.pop()?.fodder;
                default_arg = Some(Box::new(self.parse(MAX_PRECEDENCE)?));
            }
            let loc_range = self.range_from(&name);
            let mut parameter = Parameter {
                name_fodder: name.fodder.clone(),
                name: identifier(&name),
                eq_fodder,
                default_arg,
                comma_fodder: Fodder::new(),
                loc_range,
            };
            got_comma = false;
            if self.check(TokenType::Comma) {
                parameter.comma_fodder = self.pop()?.fodder;
                got_comma = true;
            }
            parameters.push(parameter);
        }
    }

    /// Bind ::= Identifier [ "(" Params ")" ] "=" Expr ( "," | ";" )
    ///
    /// Returns the delimiter so the caller knows whether more binds follow.
    fn parse_bind(&mut self, binds: &mut Vec<LocalBind>) -> Result<Token, SyntaxError> {
        let var = self.pop_expect_identifier()?;
        let variable = identifier(&var);
        if binds.iter().any(|b| b.variable == variable) {
            return self.err_invalid(&var, format!("duplicate local var: {variable}"));
        }
        let mut fun = None;
        if self.check(TokenType::LParen) {
            let paren_left = self.pop()?;
            fun = Some(self.parse_params(paren_left)?);
        }
        let eq = self.pop_expect_op("=")?;
        let body = self.parse(MAX_PRECEDENCE)?;
        if !self.check(TokenType::Comma) && !self.check(TokenType::Semicolon) {
            return self.err_unexpected("`,` or `;`");
        }
        let delim = self.pop()?;
        binds.push(LocalBind {
            var_fodder: var.fodder,
            variable,
            fun,
            eq_fodder: eq.fodder,
            body,
            close_fodder: delim.fodder.clone(),
        });
        Ok(delim)
    }

    /// Object ::= "{" [ Field { "," Field } [ "," ] ] "}"
    ///          | "{" { ObjLocal "," } "[" Expr "]" ":" Expr { "," ObjLocal } [ "," ] ForSpec CompSpec "}"
    fn parse_object_remainder(&mut self, open: Token) -> Result<Node, SyntaxError> {
        let mut fields: Vec<ObjectField> = Vec::new();
        let mut literal_fields: HashSet<String> = HashSet::new();
        let mut local_names: HashSet<String> = HashSet::new();
        let mut got_comma = false;
        let mut next = self.pop()?;
        loop {
            if next.ttype == TokenType::RBrace {
                let kind = NodeKind::Object(Object {
                    fields,
                    trailing_comma: got_comma,
                    close_fodder: next.fodder.clone(),
                });
                return Ok(self.node(kind, open));
            }

            if next.ttype == TokenType::For {
                self.check_comprehension_fields(&fields, &next)?;
                let mut trailing_comma_fodder = Fodder::new();
                if got_comma {
                    if let Some(last) = fields.last_mut() {
                        trailing_comma_fodder = std::mem::take(&mut last.comma_fodder);
                    }
                }
                let (spec, close) = self.parse_comprehension_specs(next, TokenType::RBrace)?;
                let kind = NodeKind::ObjectComp(ObjectComp {
                    fields,
                    trailing_comma_fodder,
                    trailing_comma: got_comma,
                    spec,
                    close_fodder: close.fodder,
                });
                return Ok(self.node(kind, open));
            }

            if !fields.is_empty() && !got_comma {
                return self.err_at(&next, "`,` before the next field");
            }

            let field = match next.ttype {
                TokenType::Local => self.parse_object_local(next, &mut local_names)?,
                TokenType::Assert => self.parse_object_assert(next)?,
                _ => self.parse_object_field(next, &mut literal_fields)?,
            };
            fields.push(field);

            next = self.pop()?;
            if next.ttype == TokenType::Comma {
                if let Some(last) = fields.last_mut() {
                    last.comma_fodder = next.fodder;
                }
                next = self.pop()?;
                got_comma = true;
            } else {
                got_comma = false;
            }
        }
    }

    fn check_comprehension_fields(&self, fields: &[ObjectField], at: &Token) -> Result<(), SyntaxError> {
        let mut value_fields = fields.iter().filter(|f| f.kind != ObjectFieldKind::Local);
        if fields.iter().any(|f| f.kind == ObjectFieldKind::Assert) {
            return self.err_invalid(at, "object comprehension cannot have asserts");
        }
        let (Some(field), None) = (value_fields.next(), value_fields.next()) else {
            return self.err_invalid(at, "object comprehension must have exactly one field");
        };
        if field.hide != ObjectFieldHide::Inherit {
            return self.err_invalid(at, "object comprehensions cannot have hidden fields");
        }
        if field.kind != ObjectFieldKind::FieldExpr {
            return self.err_invalid(at, "object comprehensions can only have [e] fields");
        }
        Ok(())
    }

    /// Field ::= ( Identifier | String | "[" Expr "]" ) [ "(" Params ")" ] FieldOp Expr
    fn parse_object_field(
        &mut self,
        first: Token,
        literal_fields: &mut HashSet<String>,
    ) -> Result<ObjectField, SyntaxError> {
        let mut fodder1 = Fodder::new();
        let mut fodder2 = Fodder::new();
        let mut id = None;
        let mut expr1 = None;
        let kind = match &first.ttype {
            TokenType::Identifier(name) => {
                fodder1 = first.fodder.clone();
                id = Some(name.clone());
                ObjectFieldKind::FieldId
            }
            TokenType::StringDouble(_)
            | TokenType::StringSingle(_)
            | TokenType::StringBlock { .. }
            | TokenType::VerbatimStringDouble(_)
            | TokenType::VerbatimStringSingle(_) => {
                let kind = NodeKind::LiteralString(string_literal(&first.ttype));
                expr1 = Some(Box::new(self.node(kind, first.clone())));
                ObjectFieldKind::FieldStr
            }
            TokenType::LBracket => {
                fodder1 = first.fodder.clone();
                expr1 = Some(Box::new(self.parse(MAX_PRECEDENCE)?));
                fodder2 = self.pop_expect(TokenType::RBracket)?.fodder;
                ObjectFieldKind::FieldExpr
            }
            _ => return self.err_at(&first, "a field name, `local` or `assert`"),
        };

        let mut method = None;
        if self.check(TokenType::LParen) {
            let paren_left = self.pop()?;
            method = Some(self.parse_params(paren_left)?);
        }

        let op = self.current_token()?.clone();
        let (super_sugar, hide) = self.parse_field_op()?;
        if super_sugar && method.is_some() {
            return self.err_invalid(&op, "cannot use +: syntax sugar in a method");
        }

        let literal_name = match (&id, &expr1) {
            (Some(name), _) => Some(name.clone()),
            (None, Some(expr)) if kind == ObjectFieldKind::FieldStr => match &expr.kind {
                NodeKind::LiteralString(s) => Some(s.value.clone()),
                _ => None,
            },
            _ => None,
        };
        if let Some(name) = literal_name {
            if !literal_fields.insert(name.clone()) {
                return self.err_invalid(&first, format!("duplicate field: {name}"));
            }
        }

        let body = self.parse(MAX_PRECEDENCE)?;
        Ok(ObjectField {
            kind,
            hide,
            super_sugar,
            method,
            fodder1,
            id,
            expr1,
            fodder2,
            op_fodder: op.fodder,
            expr2: Box::new(body),
            expr3: None,
            comma_fodder: Fodder::new(),
            loc_range: self.range_from(&first),
        })
    }

    /// FieldOp ::= [ "+" ] ( ":" | "::" | ":::" )
    fn parse_field_op(&mut self) -> Result<(bool, ObjectFieldHide), SyntaxError> {
        let symbol = match &self.current_token()?.ttype {
            TokenType::Operator(symbol) => symbol.clone(),
            _ => return self.err_unexpected("`:`, `::`, `:::`, `+:`, `+::` or `+:::`"),
        };
        let (super_sugar, colons) = match symbol.strip_prefix('+') {
            Some(rest) => (true, rest),
            None => (false, symbol.as_str()),
        };
        let hide = match colons {
            ":" => ObjectFieldHide::Inherit,
            "::" => ObjectFieldHide::Hidden,
            ":::" => ObjectFieldHide::Visible,
            _ => return self.err_unexpected("`:`, `::`, `:::`, `+:`, `+::` or `+:::`"),
        };
        self.advance();
        Ok((super_sugar, hide))
    }

    /// ObjLocal ::= "local" Identifier [ "(" Params ")" ] "=" Expr
    fn parse_object_local(
        &mut self,
        local: Token,
        local_names: &mut HashSet<String>,
    ) -> Result<ObjectField, SyntaxError> {
        let var = self.pop_expect_identifier()?;
        let name = identifier(&var);
        if !local_names.insert(name.clone()) {
            return self.err_invalid(&var, format!("duplicate local var: {name}"));
        }
        let mut method = None;
        if self.check(TokenType::LParen) {
            let paren_left = self.pop()?;
            method = Some(self.parse_params(paren_left)?);
        }
        let eq = self.pop_expect_op("=")?;
        let body = self.parse(MAX_PRECEDENCE)?;
        Ok(ObjectField {
            kind: ObjectFieldKind::Local,
            hide: ObjectFieldHide::Visible,
            super_sugar: false,
            method,
            fodder1: local.fodder.clone(),
            id: Some(name),
            expr1: None,
            fodder2: var.fodder,
            op_fodder: eq.fodder,
            expr2: Box::new(body),
            expr3: None,
            comma_fodder: Fodder::new(),
            loc_range: self.range_from(&local),
        })
    }

    /// ObjAssert ::= "assert" Expr [ ":" Expr ]
    fn parse_object_assert(&mut self, assert: Token) -> Result<ObjectField, SyntaxError> {
        let cond = self.parse(MAX_PRECEDENCE)?;
        let mut op_fodder = Fodder::new();
        let mut message = None;
        if self.check_op(":") {
            op_fodder = self.pop()?.fodder;
            message = Some(Box::new(self.parse(MAX_PRECEDENCE)?));
        }
        Ok(ObjectField {
            kind: ObjectFieldKind::Assert,
            hide: ObjectFieldHide::Visible,
            super_sugar: false,
            method: None,
            fodder1: assert.fodder.clone(),
            id: None,
            expr1: None,
            fodder2: Fodder::new(),
            op_fodder,
            expr2: Box::new(cond),
            expr3: message,
            comma_fodder: Fodder::new(),
            loc_range: self.range_from(&assert),
        })
    }

    /// Array ::= "[" [ Expr { "," Expr } [ "," ] ] "]"
    ///         | "[" Expr [ "," ] ForSpec CompSpec "]"
    fn parse_array(&mut self, open: Token) -> Result<Node, SyntaxError> {
        if self.check(TokenType::RBracket) {
            let close = self.pop()?;
            let kind = NodeKind::Array(Array {
                elements: Vec::new(),
                trailing_comma: false,
                close_fodder: close.fodder,
            });
            return Ok(self.node(kind, open));
        }

        let first = self.parse(MAX_PRECEDENCE)?;
        let mut got_comma = false;
        let mut comma_fodder = Fodder::new();
        if self.check(TokenType::Comma) {
            comma_fodder = self.pop()?.fodder;
            got_comma = true;
        }

        if self.check(TokenType::For) {
            let for_token = self.pop()?;
            let (spec, close) = self.parse_comprehension_specs(for_token, TokenType::RBracket)?;
            let kind = NodeKind::ArrayComp(ArrayComp {
                body: Box::new(first),
                trailing_comma_fodder: comma_fodder,
                trailing_comma: got_comma,
                spec,
                close_fodder: close.fodder,
            });
            return Ok(self.node(kind, open));
        }

        let mut elements = vec![CommaSeparatedExpr {
            expr: first,
            comma_fodder,
        }];
        loop {
            if self.check(TokenType::RBracket) {
                let close = self.pop()?;
                let kind = NodeKind::Array(Array {
                    elements,
                    trailing_comma: got_comma,
                    close_fodder: close.fodder,
                });
                return Ok(self.node(kind, open));
            }
            if !got_comma {
                return self.err_unexpected("`,` before the next array element");
            }
            let expr = self.parse(MAX_PRECEDENCE)?;
            let mut comma_fodder = Fodder::new();
            got_comma = false;
            if self.check(TokenType::Comma) {
                comma_fodder = self.pop()?.fodder;
                got_comma = true;
            }
            elements.push(CommaSeparatedExpr { expr, comma_fodder });
        }
    }

    /// ForSpec ::= "for" Identifier "in" Expr { "if" Expr }
    /// CompSpec ::= { ForSpec }
    ///
    /// Each further `for` wraps the clauses before it as its `outer`.
    fn parse_comprehension_specs(
        &mut self,
        mut for_token: Token,
        end: TokenType,
    ) -> Result<(ForSpec, Token), SyntaxError> {
        let mut outer: Option<Box<ForSpec>> = None;
        loop {
            let var = self.pop_expect_identifier()?;
            let in_token = self.pop_expect(TokenType::In)?;
            let expr = self.parse(MAX_PRECEDENCE)?;
            let mut spec = ForSpec {
                for_fodder: for_token.fodder,
                var_fodder: var.fodder.clone(),
                var_name: identifier(&var),
                in_fodder: in_token.fodder,
                expr: Box::new(expr),
                conditions: Vec::new(),
                outer,
            };
            let mut next = self.pop()?;
            while next.ttype == TokenType::If {
                let cond = self.parse(MAX_PRECEDENCE)?;
                spec.conditions.push(IfSpec {
                    if_fodder: next.fodder,
                    expr: cond,
                });
                next = self.pop()?;
            }
            if next.ttype == end {
                return Ok((spec, next));
            }
            if next.ttype != TokenType::For {
                return self.err_at(&next, &format!("`for`, `if` or {end}"));
            }
            outer = Some(Box::new(spec));
            for_token = next;
        }
    }

    // === Node Helpers ===

    /// Builds a node starting at `begin` and ending at the last consumed token,
    /// carrying the fodder of `begin`.
    fn node(&self, kind: NodeKind, begin: Token) -> Node {
        let loc_range = self.range_from(&begin);
        Node::new(kind, begin.fodder, loc_range)
    }

    fn range_from(&self, begin: &Token) -> LocationRange {
        LocationRange {
            file_name: self.file_name.clone(),
            file: self.file.clone(),
            begin: begin.begin,
            end: self.last_end(begin.end),
        }
    }

    /// End of the most recently consumed token.
    fn last_end(&self, fallback: Location) -> Location {
        self.position
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(fallback, |t| t.end)
    }

    // === Tokenizer Helper Methods ===

    fn current_token(&self) -> Result<&Token, SyntaxError> {
        self.tokens.get(self.position).ok_or_else(|| {
            let pos = self.source_text.len();
            let (line, column) = crate::utils::get_line_and_column(self.source_text, pos);
            SyntaxError::UnexpectedEof {
                src: self.source.clone(),
                span: (pos, 0).into(),
                expected: "more input".to_string(),
                line,
                column,
            }
        })
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    /// Takes the current token.
    fn pop(&mut self) -> Result<Token, SyntaxError> {
        let token = self.current_token()?.clone();
        self.advance();
        Ok(token)
    }

    fn pop_expect(&mut self, expected: TokenType) -> Result<Token, SyntaxError> {
        if self.check(expected.clone()) {
            self.pop()
        } else {
            self.err_unexpected(&expected.to_string())
        }
    }

    fn pop_expect_identifier(&mut self) -> Result<Token, SyntaxError> {
        if matches!(self.current_token()?.ttype, TokenType::Identifier(_)) {
            self.pop()
        } else {
            self.err_unexpected("an identifier")
        }
    }

    fn pop_expect_op(&mut self, op: &str) -> Result<Token, SyntaxError> {
        if self.check_op(op) {
            self.pop()
        } else {
            self.err_unexpected(&format!("`{op}`"))
        }
    }

    fn check(&self, ttype: TokenType) -> bool {
        if let Ok(token) = self.current_token() {
            std::mem::discriminant(&token.ttype) == std::mem::discriminant(&ttype)
        } else {
            false
        }
    }

    fn check_op(&self, op: &str) -> bool {
        matches!(self.current_token(), Ok(Token { ttype: TokenType::Operator(s), .. }) if s == op)
    }

    fn peek_is_op(&self, op: &str) -> bool {
        matches!(self.tokens.get(self.position + 1), Some(Token { ttype: TokenType::Operator(s), .. }) if s == op)
    }

    fn err_unexpected<T>(&self, expected: &str) -> Result<T, SyntaxError> {
        let token = self.current_token()?;
        self.err_at(token, expected)
    }

    fn err_at<T>(&self, token: &Token, expected: &str) -> Result<T, SyntaxError> {
        let span = (token.pos_start, token.pos_end - token.pos_start).into();
        let (line, column) = (token.begin.line, token.begin.column);
        if token.ttype == TokenType::Eof {
            return Err(SyntaxError::UnexpectedEof {
                src: self.source.clone(),
                span,
                expected: expected.to_string(),
                line,
                column,
            });
        }
        Err(SyntaxError::UnexpectedToken {
            src: self.source.clone(),
            span,
            expected: expected.to_string(),
            found: token.ttype.to_string(),
            line,
            column,
        })
    }

    fn err_invalid<T>(&self, token: &Token, message: impl Into<String>) -> Result<T, SyntaxError> {
        Err(SyntaxError::InvalidConstruct {
            src: self.source.clone(),
            span: (token.pos_start, token.pos_end - token.pos_start).into(),
            message: message.into(),
            line: token.begin.line,
            column: token.begin.column,
        })
    }
}

fn identifier(token: &Token) -> Identifier {
    match &token.ttype {
        TokenType::Identifier(name) => name.clone(),
        other => other.to_string(),
    }
}

fn string_literal(ttype: &TokenType) -> LiteralString {
    match ttype {
        TokenType::StringDouble(value) => LiteralString::new(value.clone(), LiteralStringKind::Double),
        TokenType::StringBlock {
            value,
            indent,
            term_indent,
        } => LiteralString {
            value: value.clone(),
            kind: LiteralStringKind::Block,
            block_indent: indent.clone(),
            block_term_indent: term_indent.clone(),
        },
        TokenType::VerbatimStringDouble(value) => {
            LiteralString::new(value.clone(), LiteralStringKind::VerbatimDouble)
        }
        TokenType::VerbatimStringSingle(value) => {
            LiteralString::new(value.clone(), LiteralStringKind::VerbatimSingle)
        }
        TokenType::StringSingle(value) => LiteralString::new(value.clone(), LiteralStringKind::Single),
        _ => LiteralString::new(String::new(), LiteralStringKind::Single),
    }
}
