//! Jsonnet string escapes, used when a literal switches quote style.

/// Resolves the escape sequences of a quoted string body.
pub fn unescape(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = match chars.next() {
            Some('"') => '"',
            Some('\'') => '\'',
            Some('\\') => '\\',
            Some('/') => '/',
            Some('b') => '\u{8}',
            Some('f') => '\u{c}',
            Some('n') => '\n',
            Some('r') => '\r',
            Some('t') => '\t',
            Some('u') => {
                let code = hex4(&mut chars)?;
                decode_utf16_escape(code, &mut chars)?
            }
            Some(other) => return Err(format!("unknown escape sequence `\\{other}`")),
            None => return Err("truncated escape sequence".to_string()),
        };
        out.push(escaped);
    }
    Ok(out)
}

fn hex4(chars: &mut std::str::Chars<'_>) -> Result<u32, String> {
    let digits: String = chars.by_ref().take(4).collect();
    if digits.len() != 4 {
        return Err("truncated unicode escape".to_string());
    }
    u32::from_str_radix(&digits, 16).map_err(|_| format!("malformed unicode escape `\\u{digits}`"))
}

fn decode_utf16_escape(code: u32, chars: &mut std::str::Chars<'_>) -> Result<char, String> {
    if (0xD800..0xDC00).contains(&code) {
        let low = match (chars.next(), chars.next()) {
            (Some('\\'), Some('u')) => hex4(chars)?,
            _ => return Err("unpaired surrogate in unicode escape".to_string()),
        };
        if !(0xDC00..0xE000).contains(&low) {
            return Err("unpaired surrogate in unicode escape".to_string());
        }
        let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
        return char::from_u32(combined).ok_or_else(|| "invalid unicode escape".to_string());
    }
    char::from_u32(code).ok_or_else(|| "unpaired surrogate in unicode escape".to_string())
}

/// Escapes a string for a single- or double-quoted literal.
pub fn escape(value: &str, single: bool) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' if !single => out.push_str("\\\""),
            '\'' if single => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || (0x7f..=0x9f).contains(&(c as u32)) => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r#"a\"b\'c\\d\/e"#).unwrap(), "a\"b'c\\d/e");
        assert_eq!(unescape(r"\n\tA").unwrap(), "\n\tA");
        assert_eq!(unescape(r"\ud83d\ude00").unwrap(), "\u{1F600}");
    }

    #[test]
    fn test_unescape_errors() {
        assert!(unescape(r"\q").is_err());
        assert!(unescape(r"\u00").is_err());
        assert!(unescape(r"\ud83d").is_err());
        assert!(unescape("\\").is_err());
    }

    #[test]
    fn test_escape_depends_on_quote() {
        assert_eq!(escape("it's \"x\"", true), r#"it\'s "x""#);
        assert_eq!(escape("it's \"x\"", false), r#"it's \"x\""#);
        assert_eq!(escape("\u{1}", true), r"\u0001");
    }
}
