//! Document tree produced by the parser.
//!
//! The root of a document is an unnamed `Section`. Dotted headers are
//! normalized into nested sections, and a header naming an existing path
//! reopens that section instead of creating a sibling, so every path appears
//! exactly once in the tree.
//!
//! Because reopened sections are merged, the position of a node among its
//! siblings no longer tells how it was ordered in the text. Every entry,
//! section, conditional block and include therefore carries a `DocOrder`,
//! which the resolver uses for last-write-wins merging.

use std::fmt;

use ppc_core::types::RawValue;

/// Position of a node in the fully expanded document.
///
/// Nodes of a single document get one-element orders in textual order.
/// Nodes spliced in by an include, and nodes inside a conditional body, get
/// orders nested under the order of their directive, so comparing orders
/// lexicographically yields textual order across files.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocOrder(Vec<u32>);

impl DocOrder {
    /// Order of the `index`-th node of a document
    pub fn root(index: u32) -> Self {
        Self(vec![index])
    }

    /// Order of the `index`-th node nested under this one
    pub fn child(&self, index: u32) -> Self {
        let mut segments = self.0.clone();
        segments.push(index);
        Self(segments)
    }

    /// This order re-rooted under `prefix`
    pub fn nested_under(&self, prefix: &DocOrder) -> Self {
        let mut segments = prefix.0.clone();
        segments.extend_from_slice(&self.0);
        Self(segments)
    }

    pub fn segments(&self) -> &[u32] {
        &self.0
    }
}

/// A reference used by a condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Env(String),
    Secret(String),
}

impl Reference {
    pub fn name(&self) -> &str {
        match self {
            Reference::Env(name) | Reference::Secret(name) => name,
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Env(name) => write!(f, "$env.{}", name),
            Reference::Secret(name) => write!(f, "$secret.{}", name),
        }
    }
}

/// Condition of a `>> @when` block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// `$env.NAME == "literal"`
    Equals {
        reference: Reference,
        expected: String,
    },
    /// `$env.NAME != "literal"`
    NotEquals {
        reference: Reference,
        expected: String,
    },
    /// `$env.NAME`: set and not a falsey spelling
    Truthy(Reference),
}

impl Condition {
    pub fn reference(&self) -> &Reference {
        match self {
            Condition::Equals { reference, .. }
            | Condition::NotEquals { reference, .. }
            | Condition::Truthy(reference) => reference,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Equals {
                reference,
                expected,
            } => write!(f, "{} == {}", reference, ppc_core::utils::quote(expected)),
            Condition::NotEquals {
                reference,
                expected,
            } => write!(f, "{} != {}", reference, ppc_core::utils::quote(expected)),
            Condition::Truthy(reference) => write!(f, "{}", reference),
        }
    }
}

/// `key :: hint = value`
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: String,
    /// Declared type as written; validated by the resolver
    pub type_hint: Option<String>,
    pub value: RawValue,
    pub line: usize,
    pub order: DocOrder,
    /// Include directives this entry was spliced in through, outermost
    /// first; empty for entries of the top-level document
    pub included_from: Vec<IncludeSite>,
}

/// Where an include directive was written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeSite {
    /// Path as written in the directive
    pub path: String,
    pub line: usize,
}

impl From<&IncludeDirective> for IncludeSite {
    fn from(directive: &IncludeDirective) -> Self {
        Self {
            path: directive.path.clone(),
            line: directive.line,
        }
    }
}

/// `>> @when condition` and the nodes it guards.
///
/// The body is a separate root: headers inside it are absolute paths, and
/// it is only merged into the document when the condition holds.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalBlock {
    pub condition: Condition,
    pub body: Section,
    pub line: usize,
    pub order: DocOrder,
}

/// `@include "path"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeDirective {
    pub path: String,
    pub line: usize,
    pub order: DocOrder,
}

/// A child of a section
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Entry(Entry),
    Section(Section),
    /// Only found directly under a document or conditional-body root
    Conditional(ConditionalBlock),
    /// Only found directly under a document or conditional-body root
    Include(IncludeDirective),
}

/// A named group of nodes. The root section has an empty name and path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Section {
    pub name: String,
    /// Full path from the root, including `name`
    pub path: Vec<String>,
    pub line: usize,
    /// Order of the header that first opened this section
    pub order: DocOrder,
    pub children: Vec<Node>,
}

impl Section {
    /// An empty root section
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.children.iter().filter_map(|node| match node {
            Node::Entry(entry) => Some(entry),
            _ => None,
        })
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.children.iter().filter_map(|node| match node {
            Node::Section(section) => Some(section),
            _ => None,
        })
    }

    pub fn conditionals(&self) -> impl Iterator<Item = &ConditionalBlock> {
        self.children.iter().filter_map(|node| match node {
            Node::Conditional(block) => Some(block),
            _ => None,
        })
    }

    pub fn includes(&self) -> impl Iterator<Item = &IncludeDirective> {
        self.children.iter().filter_map(|node| match node {
            Node::Include(include) => Some(include),
            _ => None,
        })
    }

    /// Last entry assigned to `key` directly in this section
    pub fn entry(&self, key: &str) -> Option<&Entry> {
        self.entries()
            .filter(|entry| entry.key == key)
            .max_by(|a, b| a.order.cmp(&b.order))
    }

    /// Nested section at a relative path
    pub fn section(&self, path: &[&str]) -> Option<&Section> {
        match path.split_first() {
            None => Some(self),
            Some((first, rest)) => self
                .sections()
                .find(|section| section.name == *first)
                .and_then(|section| section.section(rest)),
        }
    }

    /// Get the section at a relative path, creating missing sections on the way.
    /// Created sections record `line` and `order`.
    pub fn ensure_section(&mut self, path: &[String], line: usize, order: &DocOrder) -> &mut Section {
        let Some((first, rest)) = path.split_first() else {
            return self;
        };

        let index = match self.child_section_index(first) {
            Some(index) => index,
            None => {
                let mut child_path = self.path.clone();
                child_path.push(first.clone());
                self.children.push(Node::Section(Section {
                    name: first.clone(),
                    path: child_path,
                    line,
                    order: order.clone(),
                    children: Vec::new(),
                }));
                self.children.len() - 1
            },
        };

        match &mut self.children[index] {
            Node::Section(child) => child.ensure_section(rest, line, order),
            _ => unreachable!("child_section_index only returns section positions"),
        }
    }

    fn child_section_index(&self, name: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|node| matches!(node, Node::Section(section) if section.name == name))
    }

    /// Absorb the children of `other` (a section at the same path), merging
    /// nested sections by name
    pub fn merge(&mut self, other: Section) {
        if other.order < self.order {
            self.order = other.order;
            self.line = other.line;
        }

        for node in other.children {
            match node {
                Node::Section(section) => match self.child_section_index(&section.name) {
                    Some(index) => {
                        if let Node::Section(existing) = &mut self.children[index] {
                            existing.merge(section);
                        }
                    },
                    None => {
                        let mut section = section;
                        section.reroot(&self.path);
                        self.children.push(Node::Section(section));
                    },
                },
                node => self.children.push(node),
            }
        }
    }

    /// Re-root every order in this subtree under `prefix`
    pub fn nest_orders_under(&mut self, prefix: &DocOrder) {
        self.order = self.order.nested_under(prefix);
        for node in &mut self.children {
            match node {
                Node::Entry(entry) => entry.order = entry.order.nested_under(prefix),
                Node::Section(section) => section.nest_orders_under(prefix),
                Node::Conditional(block) => {
                    block.order = block.order.nested_under(prefix);
                    block.body.nest_orders_under(prefix);
                },
                Node::Include(include) => include.order = include.order.nested_under(prefix),
            }
        }
    }

    /// Mark every entry in this subtree as spliced in through `site`
    pub fn record_include(&mut self, site: &IncludeSite) {
        for node in &mut self.children {
            match node {
                Node::Entry(entry) => entry.included_from.insert(0, site.clone()),
                Node::Section(section) => section.record_include(site),
                Node::Conditional(block) => block.body.record_include(site),
                Node::Include(_) => {},
            }
        }
    }

    /// Rewrite paths so that this section sits below `parent`
    fn reroot(&mut self, parent: &[String]) {
        let mut path = parent.to_vec();
        path.push(self.name.clone());
        self.path = path;

        let own_path = self.path.clone();
        for node in &mut self.children {
            if let Node::Section(section) = node {
                section.reroot(&own_path);
            }
        }
    }
}

/// A parsed `.ppc` document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub root: Section,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether any include directive remains anywhere in the tree
    pub fn has_includes(&self) -> bool {
        fn walk(section: &Section) -> bool {
            section.children.iter().any(|node| match node {
                Node::Include(_) => true,
                Node::Section(child) => walk(child),
                Node::Conditional(block) => walk(&block.body),
                Node::Entry(_) => false,
            })
        }
        walk(&self.root)
    }

    /// Section at a dotted path in the unconditional part of the tree
    pub fn section(&self, dotted: &str) -> Option<&Section> {
        let path: Vec<&str> = dotted.split('.').collect();
        self.root.section(&path)
    }
}
