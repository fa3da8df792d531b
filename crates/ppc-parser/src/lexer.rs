//! Lexer for `.ppc` text.
//!
//! Indentation carries no meaning. A line is classified by its first
//! character: `#` comment, `>>` header, `@` directive, identifier entry.
//! Whatever follows a header, directive or `=` is lexed as values up to the
//! end of the line; an open `[` keeps value lexing going across lines.

use ppc_core::error::{PpcError, PpcResult};
use ppc_core::utils::is_numeric_word;

use crate::token::{Operator, Token, TokenKind};

/// Tokenize a whole document
pub fn tokenize(text: &str) -> PpcResult<Vec<Token>> {
    Lexer::new(text).tokenize()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
        }
    }

    fn tokenize(mut self) -> PpcResult<Vec<Token>> {
        loop {
            self.skip_whitespace();

            let Some(c) = self.peek() else {
                break;
            };

            match c {
                '#' => self.lex_comment(),
                '>' if self.peek_at(1) == Some('>') => self.lex_header()?,
                '@' => self.lex_directive()?,
                c if c.is_alphanumeric() || c == '_' => self.lex_entry()?,
                other => {
                    return Err(PpcError::lex(
                        self.line,
                        self.column,
                        format!("unexpected character '{}'", other),
                    ))
                },
            }
        }

        Ok(self.tokens)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn starts_with(&self, word: &str) -> bool {
        let mut offset = 0;
        for expected in word.chars() {
            if self.peek_at(offset) != Some(expected) {
                return false;
            }
            offset += 1;
        }
        true
    }

    /// Like `starts_with`, but `word` must not run on into an identifier
    fn starts_with_word(&self, word: &str) -> bool {
        self.starts_with(word)
            && !matches!(
                self.peek_at(word.chars().count()),
                Some(c) if c.is_alphanumeric() || c == '_'
            )
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn advance_by(&mut self, count: usize) {
        for _ in 0..count {
            self.advance();
        }
    }

    fn push(&mut self, kind: TokenKind, line: usize, column: usize) {
        self.tokens.push(Token::new(kind, line, column));
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn skip_inline_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace() && c != '\n') {
            self.advance();
        }
    }

    fn read_while(&mut self, accept: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if !accept(c) {
                break;
            }
            out.push(c);
            self.advance();
        }
        out
    }

    fn lex_comment(&mut self) {
        let (line, column) = (self.line, self.column);
        self.advance();
        let text = self.read_while(|c| c != '\n');
        self.push(TokenKind::Comment(text.trim().to_string()), line, column);
    }

    fn lex_header(&mut self) -> PpcResult<()> {
        let (line, column) = (self.line, self.column);
        self.advance_by(2);
        self.skip_inline_whitespace();

        if self.starts_with_word("@when") {
            self.advance_by(5);
            self.push(TokenKind::When, line, column);
        } else if self.starts_with_word("@end") {
            self.advance_by(4);
            self.push(TokenKind::End, line, column);
        } else if self.peek() == Some('@') {
            return Err(PpcError::lex(
                self.line,
                self.column,
                "unknown header directive (expected '@when' or '@end')",
            ));
        } else {
            let path = self.read_while(|c| !c.is_whitespace() && c != '#');
            self.push(TokenKind::Section(path), line, column);
        }

        self.lex_values()
    }

    fn lex_directive(&mut self) -> PpcResult<()> {
        let (line, column) = (self.line, self.column);

        if !self.starts_with_word("@include") {
            return Err(PpcError::lex(
                line,
                column,
                "unknown directive (expected '@include')",
            ));
        }

        self.advance_by(8);
        self.push(TokenKind::Include, line, column);
        self.lex_values()
    }

    fn lex_entry(&mut self) -> PpcResult<()> {
        let (line, column) = (self.line, self.column);
        let key = self.read_while(|c| c.is_alphanumeric() || c == '_' || c == '-');
        self.push(TokenKind::Key(key), line, column);
        self.skip_inline_whitespace();

        if self.starts_with("::") {
            self.push(TokenKind::Op(Operator::DoubleColon), self.line, self.column);
            self.advance_by(2);
            self.skip_inline_whitespace();

            let (line, column) = (self.line, self.column);
            let hint = self.read_while(|c| c.is_alphanumeric() || c == '_');
            if !hint.is_empty() {
                self.push(TokenKind::TypeHint(hint), line, column);
            }
            self.skip_inline_whitespace();
        }

        if self.peek() == Some('=') && self.peek_at(1) != Some('=') {
            self.push(TokenKind::Op(Operator::Assign), self.line, self.column);
            self.advance();
            self.lex_values()?;
        }

        Ok(())
    }

    /// Lex value tokens up to the end of the current line. Inside brackets,
    /// line breaks are skipped.
    fn lex_values(&mut self) -> PpcResult<()> {
        let mut open_brackets: Vec<(usize, usize)> = Vec::new();

        loop {
            self.skip_inline_whitespace();
            let (line, column) = (self.line, self.column);

            let Some(c) = self.peek() else {
                if let Some((line, column)) = open_brackets.last() {
                    return Err(PpcError::lex(*line, *column, "unterminated array"));
                }
                return Ok(());
            };

            match c {
                '\n' if open_brackets.is_empty() => return Ok(()),
                '\n' => {
                    self.advance();
                },
                '#' => self.lex_comment(),
                '"' | '\'' => {
                    let text = self.read_string(c)?;
                    self.push(TokenKind::Str(text), line, column);
                },
                '[' => {
                    self.advance();
                    open_brackets.push((line, column));
                    self.push(TokenKind::LBracket, line, column);
                },
                ']' => {
                    self.advance();
                    open_brackets.pop();
                    self.push(TokenKind::RBracket, line, column);
                },
                ',' => {
                    self.advance();
                    self.push(TokenKind::Comma, line, column);
                },
                '?' if self.peek_at(1) == Some('?') => {
                    self.advance_by(2);
                    self.push(TokenKind::Op(Operator::Default), line, column);
                },
                '=' if self.peek_at(1) == Some('=') => {
                    self.advance_by(2);
                    self.push(TokenKind::Op(Operator::Eq), line, column);
                },
                '!' if self.peek_at(1) == Some('=') => {
                    self.advance_by(2);
                    self.push(TokenKind::Op(Operator::NotEq), line, column);
                },
                '=' => {
                    self.advance();
                    self.push(TokenKind::Op(Operator::Assign), line, column);
                },
                '$' => self.lex_reference()?,
                _ => self.lex_bare_word(),
            }
        }
    }

    fn read_string(&mut self, delimiter: char) -> PpcResult<String> {
        let (line, column) = (self.line, self.column);
        self.advance();

        let mut text = String::new();
        loop {
            match self.peek() {
                None => return Err(PpcError::lex(line, column, "unterminated string literal")),
                Some(c) if c == delimiter => {
                    self.advance();
                    return Ok(text);
                },
                Some('\\') => match self.peek_at(1) {
                    // `\"` and `\\` escape; any other backslash is literal
                    Some(next) if next == delimiter || next == '\\' => {
                        text.push(next);
                        self.advance_by(2);
                    },
                    _ => {
                        text.push('\\');
                        self.advance();
                    },
                },
                Some(c) => {
                    text.push(c);
                    self.advance();
                },
            }
        }
    }

    fn lex_reference(&mut self) -> PpcResult<()> {
        let (line, column) = (self.line, self.column);

        let secret = if self.starts_with("$env.") {
            self.advance_by(5);
            false
        } else if self.starts_with("$secret.") {
            self.advance_by(8);
            true
        } else {
            return Err(PpcError::lex(
                line,
                column,
                "invalid reference (expected $env.NAME or $secret.NAME)",
            ));
        };

        let name = self.read_while(|c| c.is_alphanumeric() || c == '_');
        if name.is_empty() {
            return Err(PpcError::lex(
                self.line,
                self.column,
                "expected a variable name after '.'",
            ));
        }

        let kind = if secret {
            TokenKind::SecretRef(name)
        } else {
            TokenKind::EnvRef(name)
        };
        self.push(kind, line, column);
        Ok(())
    }

    /// Unquoted word: keyword, number, or bare string
    fn lex_bare_word(&mut self) {
        let (line, column) = (self.line, self.column);
        let mut word = String::new();

        while let Some(c) = self.peek() {
            if c.is_whitespace() || matches!(c, ',' | '[' | ']' | '#') {
                break;
            }
            if c == '?' && self.peek_at(1) == Some('?') {
                break;
            }
            word.push(c);
            self.advance();
        }

        let kind = match word.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" => TokenKind::Bool(true),
            "false" | "no" | "off" => TokenKind::Bool(false),
            "null" | "none" | "nil" => TokenKind::Null,
            _ if is_numeric_word(&word) => TokenKind::Number(word),
            _ => TokenKind::Str(word),
        };
        self.push(kind, line, column);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text)
            .unwrap()
            .into_iter()
            .filter(|t| !t.is_comment())
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_section_and_entries() {
        let tokens = kinds(">> database.pool\n  size :: int = 10\n  name = \"main\"\n");

        assert_eq!(
            tokens,
            vec![
                TokenKind::Section("database.pool".to_string()),
                TokenKind::Key("size".to_string()),
                TokenKind::Op(Operator::DoubleColon),
                TokenKind::TypeHint("int".to_string()),
                TokenKind::Op(Operator::Assign),
                TokenKind::Number("10".to_string()),
                TokenKind::Key("name".to_string()),
                TokenKind::Op(Operator::Assign),
                TokenKind::Str("main".to_string()),
            ]
        );
    }

    #[test]
    fn test_line_numbers_survive_comments() {
        let tokens = tokenize("# header comment\n\n>> app # trailing\n  debug = yes\n").unwrap();

        let comment = &tokens[0];
        assert_eq!(comment.kind, TokenKind::Comment("header comment".to_string()));
        assert_eq!(comment.line, 1);

        let section = &tokens[1];
        assert_eq!(section.kind, TokenKind::Section("app".to_string()));
        assert_eq!(section.line, 3);

        let key = tokens
            .iter()
            .find(|t| t.kind == TokenKind::Key("debug".to_string()))
            .unwrap();
        assert_eq!((key.line, key.column), (4, 3));
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let tokens = kinds("a = YES\nb = Off\nc = None\nd = NIL\n");
        assert_eq!(tokens[2], TokenKind::Bool(true));
        assert_eq!(tokens[5], TokenKind::Bool(false));
        assert_eq!(tokens[8], TokenKind::Null);
        assert_eq!(tokens[11], TokenKind::Null);
    }

    #[test]
    fn test_references_and_defaults() {
        let tokens = kinds("port = $env.PORT ?? $secret.PORT??8080\n");
        assert_eq!(
            tokens[2..],
            [
                TokenKind::EnvRef("PORT".to_string()),
                TokenKind::Op(Operator::Default),
                TokenKind::SecretRef("PORT".to_string()),
                TokenKind::Op(Operator::Default),
                TokenKind::Number("8080".to_string()),
            ]
        );
    }

    #[test]
    fn test_when_condition() {
        let tokens = kinds(">> @when $env.ENV == \"dev\"\n>> @when $env.CI != 'true'\n>> @end\n");
        assert_eq!(
            tokens,
            vec![
                TokenKind::When,
                TokenKind::EnvRef("ENV".to_string()),
                TokenKind::Op(Operator::Eq),
                TokenKind::Str("dev".to_string()),
                TokenKind::When,
                TokenKind::EnvRef("CI".to_string()),
                TokenKind::Op(Operator::NotEq),
                TokenKind::Str("true".to_string()),
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn test_multiline_array_with_comments() {
        let tokens = kinds("cogs = [\n  \"music\", # audio\n  'fun',\n]\nnext = 1\n");
        assert_eq!(
            tokens[2..8],
            [
                TokenKind::LBracket,
                TokenKind::Str("music".to_string()),
                TokenKind::Comma,
                TokenKind::Str("fun".to_string()),
                TokenKind::Comma,
                TokenKind::RBracket,
            ]
        );
        assert_eq!(tokens[8], TokenKind::Key("next".to_string()));
    }

    #[test]
    fn test_bare_words() {
        let tokens = kinds("host = localhost\nratio = -0.25\nurl = http://x/?a=b\n");
        assert_eq!(tokens[2], TokenKind::Str("localhost".to_string()));
        assert_eq!(tokens[5], TokenKind::Number("-0.25".to_string()));
        assert_eq!(tokens[8], TokenKind::Str("http://x/?a=b".to_string()));
    }

    #[test]
    fn test_overflowing_numbers_stay_numbers() {
        let tokens = kinds("big = 1e400\n");
        assert_eq!(tokens[2], TokenKind::Number("1e400".to_string()));
    }

    #[test]
    fn test_string_escapes() {
        let tokens = kinds(r#"a = "C:\temp\\"
b = 'it\'s'
c = "multi
line"
"#);
        assert_eq!(tokens[2], TokenKind::Str(r"C:\temp\".to_string()));
        assert_eq!(tokens[5], TokenKind::Str("it's".to_string()));
        assert_eq!(tokens[8], TokenKind::Str("multi\nline".to_string()));
    }

    #[test]
    fn test_include_directive() {
        let tokens = kinds("@include \"shared/db.ppc\"\n");
        assert_eq!(
            tokens,
            vec![TokenKind::Include, TokenKind::Str("shared/db.ppc".to_string())]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize(">> app\n  name = \"oops\n").unwrap_err();
        assert!(matches!(err, PpcError::Lex { line: 2, column: 10, .. }));
    }

    #[test]
    fn test_unterminated_array() {
        let err = tokenize("list = [1, 2,\n  3\n").unwrap_err();
        assert!(matches!(err, PpcError::Lex { line: 1, column: 8, .. }));
    }

    #[test]
    fn test_unrecognized_input() {
        assert!(matches!(
            tokenize("!bang = 1").unwrap_err(),
            PpcError::Lex { line: 1, column: 1, .. }
        ));
        assert!(tokenize("@import \"x\"").is_err());
        assert!(tokenize(">> @unless $env.X").is_err());
        assert!(tokenize("a = $home").is_err());
        assert!(tokenize("a = $env.").is_err());
    }

    proptest! {
        #[test]
        fn quoted_strings_read_back(text in "[ -~\\n]{0,40}") {
            let source = format!("k = {}\n", ppc_core::utils::quote(&text));
            let tokens = tokenize(&source).unwrap();
            prop_assert_eq!(&tokens[2].kind, &TokenKind::Str(text.clone()));
            prop_assert_eq!(tokens.len(), 3);
        }
    }
}
