//! Value resolution: conditions, references, type hints, materialization.
//!
//! The resolver walks an include-expanded document and collects every
//! section opening and assignment that survives condition evaluation. Those
//! are then replayed in document order, so the last assignment in the text
//! wins no matter whether it came from the base document, an include, or a
//! conditional body. Discarded conditional bodies are never looked at, so
//! they cannot raise missing-reference errors.

use std::str::FromStr;

use ppc_core::error::{PpcError, PpcResult};
use ppc_core::types::{RawValue, TypeHint, Value};
use ppc_core::utils::{is_number_literal, parse_finite};
use ppc_parser::{Condition, DocOrder, Document, Entry, Node, Reference, Section};
use tracing::{debug, trace, warn};

use crate::env::Environment;
use crate::model::{Config, Item};
use crate::secrets::{FileSecrets, SecretProvider, SECRET_ENV_PREFIX};

/// Spellings that make a `>> @when $env.NAME` condition false
const FALSEY: &[&str] = &["", "0", "false", "no", "off", "null", "none", "nil"];

/// Resolves documents against one environment and set of secret sources
pub struct Resolver<'a> {
    environment: &'a Environment,
    secrets: Option<&'a dyn SecretProvider>,
    secrets_file: Option<&'a FileSecrets>,
}

/// Something the document does at a given order, once conditions are settled
enum Step<'d> {
    OpenTable(&'d [String]),
    Assign(&'d [String], &'d Entry),
}

impl<'a> Resolver<'a> {
    pub fn new(environment: &'a Environment) -> Self {
        Self {
            environment,
            secrets: None,
            secrets_file: None,
        }
    }

    /// Explicit secrets, consulted before anything else
    pub fn with_secrets(mut self, secrets: &'a dyn SecretProvider) -> Self {
        self.secrets = Some(secrets);
        self
    }

    /// Secrets file, consulted after `SECRET_<NAME>` environment variables
    pub fn with_secrets_file(mut self, secrets_file: &'a FileSecrets) -> Self {
        self.secrets_file = Some(secrets_file);
        self
    }

    /// Build the config model of an include-expanded document
    pub fn resolve(&self, document: &Document) -> PpcResult<Config> {
        let mut steps = Vec::new();
        self.collect(&document.root, &mut steps);
        steps.sort_by(|a, b| a.0.cmp(b.0));

        let mut config = Config::new();
        for (_, step) in steps {
            match step {
                Step::OpenTable(path) => {
                    config.table_mut(path);
                },
                Step::Assign(path, entry) => {
                    let value = self.resolve_entry(entry).map_err(|err| {
                        entry
                            .included_from
                            .iter()
                            .rev()
                            .fold(err, |err, site| PpcError::include(site.path.as_str(), site.line, err))
                    })?;
                    config
                        .table_mut(path)
                        .assign(entry.key.clone(), Item::Value(value));
                },
            }
        }

        Ok(config)
    }

    fn collect<'d>(&self, section: &'d Section, steps: &mut Vec<(&'d DocOrder, Step<'d>)>) {
        if !section.is_root() {
            steps.push((&section.order, Step::OpenTable(&section.path)));
        }

        for node in &section.children {
            match node {
                Node::Entry(entry) => steps.push((&entry.order, Step::Assign(&section.path, entry))),
                Node::Section(child) => self.collect(child, steps),
                Node::Conditional(block) => {
                    if self.evaluate(&block.condition) {
                        trace!(line = block.line, condition = %block.condition, "applying conditional block");
                        self.collect(&block.body, steps);
                    } else {
                        debug!(line = block.line, condition = %block.condition, "discarding conditional block");
                    }
                },
                Node::Include(include) => {
                    warn!(
                        path = %include.path,
                        line = include.line,
                        "ignoring include that was not expanded"
                    );
                },
            }
        }
    }

    /// Evaluate a `>> @when` condition. An unset variable compares as the
    /// empty string.
    pub fn evaluate(&self, condition: &Condition) -> bool {
        let actual = self.reference_value(condition.reference());
        let actual = actual.as_deref().unwrap_or("");

        match condition {
            Condition::Equals { expected, .. } => actual == expected.as_str(),
            Condition::NotEquals { expected, .. } => actual != expected.as_str(),
            Condition::Truthy(_) => !FALSEY
                .iter()
                .any(|falsey| actual.eq_ignore_ascii_case(falsey)),
        }
    }

    fn reference_value(&self, reference: &Reference) -> Option<String> {
        match reference {
            Reference::Env(name) => self.environment.get(name).map(str::to_string),
            Reference::Secret(name) => self.lookup_secret(name),
        }
    }

    /// Look a secret up in the fixed order: explicit secrets, `SECRET_<NAME>`,
    /// secrets file. Defaults are the caller's business.
    pub fn lookup_secret(&self, name: &str) -> Option<String> {
        if let Some(value) = self.secrets.and_then(|secrets| secrets.secret(name)) {
            trace!(secret = name, source = "explicit", "resolved secret");
            return Some(value);
        }

        let env_name = format!("{}{}", SECRET_ENV_PREFIX, name);
        if let Some(value) = self.environment.get(&env_name) {
            trace!(secret = name, source = "environment", "resolved secret");
            return Some(value.to_string());
        }

        if let Some(value) = self.secrets_file.and_then(|file| file.secret(name)) {
            trace!(secret = name, source = "file", "resolved secret");
            return Some(value);
        }

        None
    }

    fn resolve_entry(&self, entry: &Entry) -> PpcResult<Value> {
        let hint = entry
            .type_hint
            .as_deref()
            .map(|hint| {
                TypeHint::from_str(hint).map_err(|_| PpcError::UnknownType {
                    key: entry.key.clone(),
                    hint: hint.to_string(),
                    line: entry.line,
                })
            })
            .transpose()?;

        let value = self.resolve_value(&entry.value, entry.line)?;
        match hint {
            Some(hint) => coerce(value, hint, &entry.key, entry.line),
            None => Ok(value),
        }
    }

    /// Expand every reference in a raw value
    pub fn resolve_value(&self, value: &RawValue, line: usize) -> PpcResult<Value> {
        Ok(match value {
            RawValue::Null => Value::Null,
            RawValue::Bool(b) => Value::Bool(*b),
            RawValue::Int(i) => Value::Int(*i),
            RawValue::Float(f) => Value::Float(*f),
            RawValue::String(s) => Value::String(s.clone()),
            RawValue::List(items) => Value::List(
                items
                    .iter()
                    .map(|item| self.resolve_value(item, line))
                    .collect::<PpcResult<_>>()?,
            ),
            RawValue::EnvRef { name, default } => match self.environment.get(name) {
                Some(text) => Value::String(text.to_string()),
                None => match default {
                    Some(default) => {
                        debug!(variable = %name, line, "environment variable unset, using default");
                        self.resolve_value(default, line)?
                    },
                    None => {
                        return Err(PpcError::MissingEnvVar {
                            name: name.clone(),
                            line,
                        })
                    },
                },
            },
            RawValue::SecretRef { name, default } => match self.lookup_secret(name) {
                Some(text) => Value::String(text),
                None => match default {
                    Some(default) => {
                        debug!(secret = %name, line, "secret not found, using default");
                        self.resolve_value(default, line)?
                    },
                    None => {
                        return Err(PpcError::MissingSecret {
                            name: name.clone(),
                            line,
                        })
                    },
                },
            },
        })
    }
}

/// Apply a declared type to a resolved value. `null` passes every hint.
pub fn coerce(value: Value, hint: TypeHint, key: &str, line: usize) -> PpcResult<Value> {
    let mismatch = |value: &Value| PpcError::TypeMismatch {
        key: key.to_string(),
        declared: hint.to_string(),
        actual: describe(value),
        line,
    };

    if value.is_null() {
        return Ok(value);
    }

    match hint {
        TypeHint::Any => Ok(value),
        TypeHint::Str => Ok(match value {
            Value::String(_) => value,
            Value::List(_) => Value::String(value.to_literal()),
            other => Value::String(other.to_string()),
        }),
        TypeHint::Int => match &value {
            Value::Int(_) => Ok(value),
            Value::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                Ok(Value::Int(*f as i64))
            },
            Value::String(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| mismatch(&value)),
            _ => Err(mismatch(&value)),
        },
        TypeHint::Float => match &value {
            Value::Float(_) => Ok(value),
            Value::Int(i) => Ok(Value::Float(*i as f64)),
            Value::String(s) if is_number_literal(s.trim()) => parse_finite(s.trim())
                .map(Value::Float)
                .ok_or_else(|| mismatch(&value)),
            _ => Err(mismatch(&value)),
        },
        TypeHint::Bool => match &value {
            Value::Bool(_) => Ok(value),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" => Ok(Value::Bool(true)),
                "false" | "no" | "off" => Ok(Value::Bool(false)),
                _ => Err(mismatch(&value)),
            },
            _ => Err(mismatch(&value)),
        },
        TypeHint::List => match value {
            Value::List(_) => Ok(value),
            other => Err(mismatch(&other)),
        },
    }
}

fn describe(value: &Value) -> String {
    format!("{} {}", value.kind(), value.to_literal())
}
