//! Unresolved values as written in a document.

use std::fmt;

use crate::types::Value;
use crate::utils::{format_float, quote};

/// A value as parsed, before references are expanded
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<RawValue>),
    /// `$env.NAME` with an optional `?? default`
    EnvRef {
        name: String,
        default: Option<Box<RawValue>>,
    },
    /// `$secret.NAME` with an optional `?? default`
    SecretRef {
        name: String,
        default: Option<Box<RawValue>>,
    },
}

impl RawValue {
    /// Check if the value is a reference (top level only)
    pub fn is_reference(&self) -> bool {
        matches!(self, RawValue::EnvRef { .. } | RawValue::SecretRef { .. })
    }

    /// Attach a `??` fallback to a reference. Non-references are returned as is.
    pub fn with_default(self, fallback: RawValue) -> RawValue {
        match self {
            RawValue::EnvRef { name, .. } => RawValue::EnvRef {
                name,
                default: Some(Box::new(fallback)),
            },
            RawValue::SecretRef { name, .. } => RawValue::SecretRef {
                name,
                default: Some(Box::new(fallback)),
            },
            other => other,
        }
    }
}

/// Renders the value in document syntax
impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Null => write!(f, "null"),
            RawValue::Bool(b) => write!(f, "{}", b),
            RawValue::Int(i) => write!(f, "{}", i),
            RawValue::Float(x) => write!(f, "{}", format_float(*x)),
            RawValue::String(s) => write!(f, "{}", quote(s)),
            RawValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            },
            RawValue::EnvRef { name, default } => {
                write!(f, "$env.{}", name)?;
                if let Some(default) = default {
                    write!(f, " ?? {}", default)?;
                }
                Ok(())
            },
            RawValue::SecretRef { name, default } => {
                write!(f, "$secret.{}", name)?;
                if let Some(default) = default {
                    write!(f, " ?? {}", default)?;
                }
                Ok(())
            },
        }
    }
}

impl From<Value> for RawValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => RawValue::Null,
            Value::Bool(b) => RawValue::Bool(b),
            Value::Int(i) => RawValue::Int(i),
            Value::Float(f) => RawValue::Float(f),
            Value::String(s) => RawValue::String(s),
            Value::List(items) => RawValue::List(items.into_iter().map(RawValue::from).collect()),
        }
    }
}
