//! Declared type hints (`key :: int = ...`).

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One of the primitive types a value may be declared as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeHint {
    Str,
    Int,
    Float,
    Bool,
    List,
    /// Accepts anything without coercion
    Any,
}

/// Returned when a hint name is not recognized
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown type hint: {0}")]
pub struct UnknownTypeHint(pub String);

impl TypeHint {
    /// Canonical spelling used when rendering
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeHint::Str => "str",
            TypeHint::Int => "int",
            TypeHint::Float => "float",
            TypeHint::Bool => "bool",
            TypeHint::List => "list",
            TypeHint::Any => "any",
        }
    }
}

impl FromStr for TypeHint {
    type Err = UnknownTypeHint;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "str" | "string" => Ok(TypeHint::Str),
            "int" | "integer" => Ok(TypeHint::Int),
            "float" | "number" => Ok(TypeHint::Float),
            "bool" | "boolean" => Ok(TypeHint::Bool),
            "list" | "array" => Ok(TypeHint::List),
            "any" => Ok(TypeHint::Any),
            _ => Err(UnknownTypeHint(s.to_string())),
        }
    }
}

impl fmt::Display for TypeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
