//! Text helpers shared by the lexer and the serializer.
//!
//! The lexer and the serializer must agree on what an identifier, a number
//! and a quoted string look like, otherwise rendered output would not read
//! back to the same configuration.

/// Check whether `text` is a valid key or section segment
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_alphanumeric() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        },
        _ => false,
    }
}

/// Check whether a bare word is written as a number (`42`, `-7`, `1.5`,
/// `2e10`, but also `1e400`), whether or not it fits in an `f64`.
///
/// Words such as `inf` or `nan`, which `f64::from_str` would accept, are not numbers.
pub fn is_numeric_word(text: &str) -> bool {
    let unsigned = text
        .strip_prefix('-')
        .or_else(|| text.strip_prefix('+'))
        .unwrap_or(text);

    let starts_numeric = match unsigned.as_bytes() {
        [first, ..] if first.is_ascii_digit() => true,
        [b'.', second, ..] => second.is_ascii_digit(),
        _ => false,
    };

    starts_numeric && (unsigned.parse::<i64>().is_ok() || unsigned.parse::<f64>().is_ok())
}

/// Check whether a bare word is a numeric literal with a finite value
pub fn is_number_literal(text: &str) -> bool {
    is_numeric_word(text) && (text.parse::<i64>().is_ok() || parse_finite(text).is_some())
}

/// Parse a float, rejecting results that overflowed to infinity
pub fn parse_finite(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Format a float so that it always reads back as a float
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{:?}", value)
    }
}

/// Quote a string literal.
///
/// Double quotes are preferred; single quotes are used when the text holds a
/// double quote but no single quote. A backslash is only escaped where the
/// lexer would otherwise treat it as an escape (before the quote character,
/// before another backslash, or at the very end).
pub fn quote(text: &str) -> String {
    let delimiter = if text.contains('"') && !text.contains('\'') {
        '\''
    } else {
        '"'
    };

    let mut out = String::with_capacity(text.len() + 2);
    out.push(delimiter);

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == delimiter {
            out.push('\\');
            out.push(c);
        } else if c == '\\' {
            match chars.peek() {
                Some(&next) if next != delimiter && next != '\\' => out.push('\\'),
                _ => out.push_str("\\\\"),
            }
        } else {
            out.push(c);
        }
    }

    out.push(delimiter);
    out
}
