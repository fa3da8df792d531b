//! Secret sources.
//!
//! A `$secret.NAME` reference is looked up, in this order, in the explicit
//! provider passed by the caller, in the `SECRET_NAME` environment variable,
//! in the secrets file, and finally in the `??` default. The resolver owns
//! that order; the types here only answer "do you have NAME?".

use std::collections::HashMap;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use ppc_core::error::{PpcError, PpcResult};
use tracing::debug;

/// Prefix of environment variables that carry secrets
pub const SECRET_ENV_PREFIX: &str = "SECRET_";

/// Anything that can look up a secret by name
pub trait SecretProvider {
    fn secret(&self, name: &str) -> Option<String>;
}

impl SecretProvider for HashMap<String, String> {
    fn secret(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl<F> SecretProvider for F
where
    F: Fn(&str) -> Option<String>,
{
    fn secret(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// In-memory secrets, for tests and programmatic injection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapSecrets {
    values: HashMap<String, String>,
}

impl MapSecrets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.values.remove(name)
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }
}

impl SecretProvider for MapSecrets {
    fn secret(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapSecrets {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

/// Secrets read from a JSON file holding one flat object, e.g.
/// `{"DB_PASSWORD": "hunter2", "PORT": 5432}`.
///
/// String values are taken as is; numbers and booleans are stored as their
/// text. Anything else makes the file invalid.
#[derive(Debug, Clone)]
pub struct FileSecrets {
    path: Utf8PathBuf,
    values: HashMap<String, String>,
}

impl FileSecrets {
    /// Read and validate a secrets file
    pub fn load(path: impl AsRef<Utf8Path>) -> PpcResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| PpcError::SecretsFile {
            path: path.to_string(),
            message: e.to_string(),
        })?;

        let secrets = Self::from_json(path, &text)?;
        debug!(path = %path, count = secrets.values.len(), "loaded secrets file");
        Ok(secrets)
    }

    /// Parse secrets file contents; `path` is only used in errors
    pub fn from_json(path: impl AsRef<Utf8Path>, text: &str) -> PpcResult<Self> {
        let path = path.as_ref();
        let invalid = |message: String| PpcError::SecretsFile {
            path: path.to_string(),
            message,
        };

        let json: serde_json::Value =
            serde_json::from_str(text).map_err(|e| invalid(format!("invalid JSON: {}", e)))?;

        let serde_json::Value::Object(object) = json else {
            return Err(invalid("expected a JSON object of name/value pairs".to_string()));
        };

        let mut values = HashMap::with_capacity(object.len());
        for (name, value) in object {
            let text = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                other => {
                    return Err(invalid(format!(
                        "secret '{}' must be a string, number or boolean, not {}",
                        name,
                        json_kind(&other)
                    )))
                },
            };
            values.insert(name, text);
        }

        Ok(Self {
            path: path.to_path_buf(),
            values,
        })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl SecretProvider for FileSecrets {
    fn secret(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
