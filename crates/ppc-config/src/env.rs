//! Environment snapshot used during resolution.

use std::collections::HashMap;

use ppc_parser::References;

/// A fixed set of environment variables.
///
/// Resolution never reads the process environment directly; it only sees
/// the snapshot it was given, so the same inputs always give the same result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// An empty environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current process environment
    pub fn from_process() -> Self {
        std::env::vars().collect()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.vars.remove(name)
    }

    /// Builder form of `set`
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Environment variables a document refers to that are not set here
    pub fn missing<'r>(&self, references: &'r References) -> Vec<&'r str> {
        references
            .env
            .iter()
            .map(String::as_str)
            .filter(|name| !self.contains(name))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

impl From<HashMap<String, String>> for Environment {
    fn from(vars: HashMap<String, String>) -> Self {
        Self { vars }
    }
}
