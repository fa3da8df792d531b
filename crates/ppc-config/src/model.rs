//! The resolved configuration model.
//!
//! A `Config` is a table: an ordered map from key to either a resolved
//! `Value` or a nested table. Keys keep document order. Nothing in the
//! public API mutates a loaded config.

use std::ops::Index;

use indexmap::IndexMap;
use ppc_core::error::{PpcError, PpcResult};
use ppc_core::types::Value;
use serde::{Deserialize, Serialize};

/// A table of resolved configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config {
    entries: IndexMap<String, Item>,
}

/// What a key of a `Config` holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Item {
    Value(Value),
    Table(Config),
}

impl Item {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Item::Value(value) => Some(value),
            Item::Table(_) => None,
        }
    }

    pub fn as_table(&self) -> Option<&Config> {
        match self {
            Item::Table(table) => Some(table),
            Item::Value(_) => None,
        }
    }

    pub fn is_table(&self) -> bool {
        matches!(self, Item::Table(_))
    }

    /// Plain JSON form of this item
    pub fn to_plain(&self) -> serde_json::Value {
        match self {
            Item::Value(value) => value_to_plain(value),
            Item::Table(table) => table.to_plain(),
        }
    }
}

impl From<Value> for Item {
    fn from(value: Value) -> Self {
        Item::Value(value)
    }
}

impl From<Config> for Item {
    fn from(table: Config) -> Self {
        Item::Table(table)
    }
}

impl Config {
    /// An empty table
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check for a key at this level
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Check for a dotted path
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Item at a dotted path such as `database.pool.size`
    pub fn get(&self, path: &str) -> Option<&Item> {
        let segments: Vec<&str> = path.split('.').collect();
        self.get_path(&segments)
    }

    /// Item at a path given as segments
    pub fn get_path(&self, segments: &[&str]) -> Option<&Item> {
        let (last, parents) = segments.split_last()?;
        let mut table = self;
        for segment in parents {
            table = table.entries.get(*segment)?.as_table()?;
        }
        table.entries.get(*last)
    }

    /// Item at a dotted path, or `default` when absent
    pub fn get_or<'a>(&'a self, path: &str, default: &'a Item) -> &'a Item {
        self.get(path).unwrap_or(default)
    }

    /// Value at a dotted path; `None` for tables
    pub fn value(&self, path: &str) -> Option<&Value> {
        self.get(path)?.as_value()
    }

    /// Nested table at a dotted path
    pub fn section(&self, path: &str) -> Option<&Config> {
        self.get(path)?.as_table()
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.value(path)?.as_str()
    }

    pub fn get_i64(&self, path: &str) -> Option<i64> {
        self.value(path)?.as_i64()
    }

    pub fn get_f64(&self, path: &str) -> Option<f64> {
        self.value(path)?.as_f64()
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.value(path)?.as_bool()
    }

    pub fn get_list(&self, path: &str) -> Option<&[Value]> {
        self.value(path)?.as_list()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &Item> {
        self.entries.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Item)> {
        self.entries.iter().map(|(key, item)| (key.as_str(), item))
    }

    /// Nested plain structure: objects, arrays and scalars only
    pub fn to_plain(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.entries
                .iter()
                .map(|(key, item)| (key.clone(), item.to_plain()))
                .collect(),
        )
    }

    pub fn to_json_pretty(&self) -> PpcResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| PpcError::Serialize {
            message: e.to_string(),
        })
    }

    /// Set `key` at this level, replacing any previous item but keeping its
    /// position
    pub(crate) fn assign(&mut self, key: String, item: Item) {
        self.entries.insert(key, item);
    }

    /// Table at `path` below this one, created on the way. A value sitting
    /// where a table is needed is replaced by an empty table.
    pub(crate) fn table_mut(&mut self, path: &[String]) -> &mut Config {
        let Some((first, rest)) = path.split_first() else {
            return self;
        };

        let item = self
            .entries
            .entry(first.clone())
            .or_insert_with(|| Item::Table(Config::new()));
        if !item.is_table() {
            *item = Item::Table(Config::new());
        }

        match item {
            Item::Table(table) => table.table_mut(rest),
            Item::Value(_) => unreachable!("replaced by a table above"),
        }
    }
}

fn value_to_plain(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::from(*i),
        Value::Float(f) => serde_json::Value::from(*f),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::List(items) => serde_json::Value::Array(items.iter().map(value_to_plain).collect()),
    }
}

/// Panics if `key` is not present at this level, like `HashMap`
impl Index<&str> for Config {
    type Output = Item;

    fn index(&self, key: &str) -> &Item {
        match self.entries.get(key) {
            Some(item) => item,
            None => panic!("no key '{}' in config", key),
        }
    }
}

impl<'a> IntoIterator for &'a Config {
    type Item = (&'a String, &'a Item);
    type IntoIter = indexmap::map::Iter<'a, String, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<(String, Item)> for Config {
    fn from_iter<I: IntoIterator<Item = (String, Item)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Build a config from a JSON object. Arrays may only hold scalars and
/// arrays, since values cannot contain tables.
impl TryFrom<serde_json::Value> for Config {
    type Error = PpcError;

    fn try_from(json: serde_json::Value) -> PpcResult<Self> {
        serde_json::from_value(json).map_err(|e| PpcError::Serialize {
            message: format!("cannot build a config from JSON: {}", e),
        })
    }
}
