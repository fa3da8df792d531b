//! Environment and secret names a document refers to.

use std::collections::BTreeSet;

use ppc_core::types::RawValue;

use crate::tree::{Document, Node, Reference, Section};

/// Every `$env` and `$secret` name used in a document, including names
/// that only appear in conditions, defaults, or conditional bodies
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct References {
    pub env: BTreeSet<String>,
    pub secrets: BTreeSet<String>,
}

impl References {
    pub fn collect(document: &Document) -> Self {
        let mut references = Self::default();
        references.visit_section(&document.root);
        references
    }

    pub fn is_empty(&self) -> bool {
        self.env.is_empty() && self.secrets.is_empty()
    }

    fn add(&mut self, reference: &Reference) {
        match reference {
            Reference::Env(name) => self.env.insert(name.clone()),
            Reference::Secret(name) => self.secrets.insert(name.clone()),
        };
    }

    fn visit_section(&mut self, section: &Section) {
        for node in &section.children {
            match node {
                Node::Entry(entry) => self.visit_value(&entry.value),
                Node::Section(child) => self.visit_section(child),
                Node::Conditional(block) => {
                    self.add(block.condition.reference());
                    self.visit_section(&block.body);
                },
                Node::Include(_) => {},
            }
        }
    }

    fn visit_value(&mut self, value: &RawValue) {
        match value {
            RawValue::EnvRef { name, default } => {
                self.env.insert(name.clone());
                if let Some(default) = default {
                    self.visit_value(default);
                }
            },
            RawValue::SecretRef { name, default } => {
                self.secrets.insert(name.clone());
                if let Some(default) = default {
                    self.visit_value(default);
                }
            },
            RawValue::List(items) => items.iter().for_each(|item| self.visit_value(item)),
            _ => {},
        }
    }
}

impl Document {
    /// Names of all environment variables and secrets the document uses
    pub fn references(&self) -> References {
        References::collect(self)
    }
}
