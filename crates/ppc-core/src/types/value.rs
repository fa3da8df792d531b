//! Resolved configuration values.
//!
//! A `Value` is what remains after every reference has been expanded and
//! every type hint applied. There is no variant for an unresolved
//! reference, so a loaded configuration can never expose one.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::{format_float, quote};

/// A fully resolved scalar or list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
}

impl Value {
    /// Name of the variant, as used in type mismatch messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "str",
            Value::List(_) => "list",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Floats, and integers widened to floats
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Render the value as a literal that the lexer reads back unchanged
    pub fn to_literal(&self) -> String {
        match self {
            Value::String(s) => quote(s),
            Value::List(items) => {
                let items: Vec<String> = items.iter().map(Value::to_literal).collect();
                format!("[{}]", items.join(", "))
            },
            other => other.to_string(),
        }
    }
}

/// Plain-text form: strings are written without quotes, everything else as
/// its literal.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", format_float(*x)),
            Value::String(s) => write!(f, "{}", s),
            Value::List(_) => write!(f, "{}", self.to_literal()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_literal() {
        let list = Value::from(vec![Value::from("a"), Value::Int(1), Value::Null]);

        assert_eq!(Value::from("plain").to_string(), "plain");
        assert_eq!(Value::from("plain").to_literal(), r#""plain""#);
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(Value::Bool(false).to_literal(), "false");
        assert_eq!(list.to_string(), r#"["a", 1, null]"#);
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Int(5).as_f64(), Some(5.0));
        assert_eq!(Value::Float(5.5).as_i64(), None);
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert!(Value::Null.is_null());
        assert_eq!(Value::from(vec![1i64, 2]).as_list().map(<[Value]>::len), Some(2));
    }

    #[test]
    fn test_serde_is_untagged() {
        let value = Value::from(vec![Value::Int(1), Value::from("two"), Value::Bool(true)]);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"[1,"two",true]"#);

        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
        assert_eq!(serde_json::to_string(&Value::Null).unwrap(), "null");
    }
}
