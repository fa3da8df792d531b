//! Tokens produced by the lexer.

use std::fmt;

/// Operators recognized by the lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `::` between a key and its type hint
    DoubleColon,
    /// `=` between a key and its value
    Assign,
    /// `??` introducing a fallback
    Default,
    /// `==` in a condition
    Eq,
    /// `!=` in a condition
    NotEq,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::DoubleColon => "::",
            Operator::Assign => "=",
            Operator::Default => "??",
            Operator::Eq => "==",
            Operator::NotEq => "!=",
        }
    }
}

/// Kind of a token, with its payload
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// `>> path`; the path is kept as written (possibly empty)
    Section(String),
    /// `>> @when`
    When,
    /// `>> @end`
    End,
    /// `@include`
    Include,
    Key(String),
    TypeHint(String),
    Op(Operator),
    Str(String),
    /// Numeric literal, kept as written
    Number(String),
    Bool(bool),
    Null,
    LBracket,
    RBracket,
    Comma,
    EnvRef(String),
    SecretRef(String),
    Comment(String),
}

/// A token with the position it started at
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, column: usize) -> Self {
        Self { kind, line, column }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, TokenKind::Comment(_))
    }
}

/// Short description used in parse error messages
impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Section(path) => write!(f, "section header '>> {}'", path),
            TokenKind::When => write!(f, "'>> @when'"),
            TokenKind::End => write!(f, "'>> @end'"),
            TokenKind::Include => write!(f, "'@include'"),
            TokenKind::Key(key) => write!(f, "key '{}'", key),
            TokenKind::TypeHint(hint) => write!(f, "type '{}'", hint),
            TokenKind::Op(op) => write!(f, "'{}'", op.as_str()),
            TokenKind::Str(s) => write!(f, "string {:?}", s),
            TokenKind::Number(n) => write!(f, "number {}", n),
            TokenKind::Bool(b) => write!(f, "boolean {}", b),
            TokenKind::Null => write!(f, "null"),
            TokenKind::LBracket => write!(f, "'['"),
            TokenKind::RBracket => write!(f, "']'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::EnvRef(name) => write!(f, "$env.{}", name),
            TokenKind::SecretRef(name) => write!(f, "$secret.{}", name),
            TokenKind::Comment(_) => write!(f, "comment"),
        }
    }
}
