//! `@include` expansion.
//!
//! Included documents are parsed, expanded depth-first, and merged into the
//! root of the context their directive appears in (the document root, or the
//! body root of a `>> @when` block). Their orders are nested under the
//! directive's order, so the resolver sees the included nodes exactly where
//! the directive was written.
//!
//! Cycle detection looks only at the chain of files currently being
//! expanded: including the same file twice from sibling directives is fine,
//! including a file from inside itself is not.

use std::collections::HashMap;
use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use ppc_core::error::{PpcError, PpcResult};
use ppc_core::utils::{normalize_path, resolve_include_path};
use ppc_parser::{parse, Document, IncludeDirective, IncludeSite, Node, Section};
use tracing::debug;

/// Where document text comes from
pub trait SourceLoader {
    /// Canonical identity of `path`, used for cycle detection and as the
    /// base directory for the file's own includes
    fn canonicalize(&self, path: &Utf8Path) -> PpcResult<Utf8PathBuf>;

    /// Full text of the document at a canonical path
    fn read(&self, path: &Utf8Path) -> PpcResult<String>;
}

/// Reads documents from disk
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystem;

impl SourceLoader for FileSystem {
    fn canonicalize(&self, path: &Utf8Path) -> PpcResult<Utf8PathBuf> {
        path.canonicalize_utf8()
            .map_err(|e| PpcError::io(format!("Failed to resolve {}", path), e))
    }

    fn read(&self, path: &Utf8Path) -> PpcResult<String> {
        fs::read_to_string(path).map_err(|e| PpcError::io(format!("Failed to read {}", path), e))
    }
}

/// Documents held in memory, keyed by normalized path
#[derive(Debug, Clone, Default)]
pub struct MemorySources {
    files: HashMap<Utf8PathBuf, String>,
}

impl MemorySources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl AsRef<Utf8Path>, text: impl Into<String>) {
        self.files.insert(normalize_path(path.as_ref()), text.into());
    }

    pub fn with(mut self, path: impl AsRef<Utf8Path>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }
}

impl SourceLoader for MemorySources {
    fn canonicalize(&self, path: &Utf8Path) -> PpcResult<Utf8PathBuf> {
        Ok(normalize_path(path))
    }

    fn read(&self, path: &Utf8Path) -> PpcResult<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            PpcError::io(
                format!("Failed to read {}", path),
                io::Error::new(io::ErrorKind::NotFound, "no such document"),
            )
        })
    }
}

/// Expand every include of a document that did not come from a file.
/// Relative include paths are resolved against `base_dir`.
pub fn expand(document: Document, base_dir: &Utf8Path, loader: &dyn SourceLoader) -> PpcResult<Document> {
    expand_nested(document, base_dir, loader, &[])
}

/// Expand every include of a document. `stack` holds the canonical paths of
/// the documents currently being expanded, outermost first; the document
/// itself is expected to be the last of them when it came from a file.
pub fn expand_nested(
    mut document: Document,
    base_dir: &Utf8Path,
    loader: &dyn SourceLoader,
    stack: &[Utf8PathBuf],
) -> PpcResult<Document> {
    expand_context(&mut document.root, base_dir, loader, stack)?;
    Ok(document)
}

fn expand_context(
    root: &mut Section,
    base_dir: &Utf8Path,
    loader: &dyn SourceLoader,
    stack: &[Utf8PathBuf],
) -> PpcResult<()> {
    let mut spliced = Vec::new();

    for node in std::mem::take(&mut root.children) {
        match node {
            Node::Include(directive) => {
                spliced.push(load_included(&directive, base_dir, loader, stack)?);
            },
            Node::Conditional(mut block) => {
                expand_context(&mut block.body, base_dir, loader, stack)?;
                root.children.push(Node::Conditional(block));
            },
            other => root.children.push(other),
        }
    }

    for included in spliced {
        root.merge(included);
    }
    Ok(())
}

fn load_included(
    directive: &IncludeDirective,
    base_dir: &Utf8Path,
    loader: &dyn SourceLoader,
    stack: &[Utf8PathBuf],
) -> PpcResult<Section> {
    let wrap = |err: PpcError| match err {
        PpcError::IncludeCycle { .. } => err,
        other => PpcError::include(directive.path.as_str(), directive.line, other),
    };

    let target = resolve_include_path(base_dir, &directive.path);
    let canonical = loader.canonicalize(&target).map_err(wrap)?;

    if stack.contains(&canonical) {
        let chain: Vec<&str> = stack
            .iter()
            .map(|p| p.as_str())
            .chain(std::iter::once(canonical.as_str()))
            .collect();
        return Err(PpcError::IncludeCycle {
            path: canonical.to_string(),
            chain: chain.join(" -> "),
        });
    }

    let text = loader.read(&canonical).map_err(wrap)?;
    let document = parse(&text).map_err(wrap)?;

    let mut nested_stack = stack.to_vec();
    nested_stack.push(canonical.clone());
    let dir = canonical.parent().unwrap_or(base_dir);
    let mut document = expand_nested(document, dir, loader, &nested_stack).map_err(wrap)?;

    debug!(
        path = %canonical,
        line = directive.line,
        depth = nested_stack.len(),
        "spliced include"
    );

    document.root.nest_orders_under(&directive.order);
    document.root.record_include(&IncludeSite::from(directive));
    Ok(document.root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ppc_core::types::RawValue;

    fn expand_text(text: &str, sources: &MemorySources) -> PpcResult<Document> {
        expand(parse(text)?, Utf8Path::new("/conf"), sources)
    }

    #[test]
    fn test_splices_at_directive_order() {
        let sources = MemorySources::new().with("/conf/inc.ppc", ">> bot\n  x = 2\n  y = 5\n");
        let document = expand_text(">> bot\n  x = 1\n@include \"inc.ppc\"\n", &sources).unwrap();

        assert!(!document.has_includes());
        let bot = document.section("bot").unwrap();
        assert_eq!(bot.entries().count(), 3);
        assert_eq!(bot.entry("x").unwrap().value, RawValue::Int(2));
        assert_eq!(bot.entry("y").unwrap().order.segments(), &[2, 2]);
    }

    #[test]
    fn test_nested_relative_includes() {
        let sources = MemorySources::new()
            .with("/conf/shared/db.ppc", "@include \"../base/pool.ppc\"\n>> db\n  host = local\n")
            .with("/conf/base/pool.ppc", ">> db.pool\n  size = 4\n");
        let document = expand_text("@include \"shared/db.ppc\"\n", &sources).unwrap();

        assert_eq!(
            document.section("db.pool").unwrap().entry("size").unwrap().value,
            RawValue::Int(4)
        );
        assert!(document.section("db").unwrap().entry("host").is_some());
    }

    #[test]
    fn test_include_inside_conditional_stays_in_body() {
        let sources = MemorySources::new().with("/conf/dev.ppc", ">> log\n  level = debug\n");
        let document = expand_text(">> @when $env.DEV\n@include \"dev.ppc\"\n", &sources).unwrap();

        assert!(document.section("log").is_none());
        let block = document.root.conditionals().next().unwrap();
        assert!(block.body.section(&["log"]).is_some());
    }

    #[test]
    fn test_cycle_is_detected() {
        let sources = MemorySources::new()
            .with("/conf/a.ppc", "@include \"b.ppc\"\n")
            .with("/conf/b.ppc", "@include \"a.ppc\"\n");

        let document = parse(&sources.read(Utf8Path::new("/conf/a.ppc")).unwrap()).unwrap();
        let err = expand_nested(
            document,
            Utf8Path::new("/conf"),
            &sources,
            &[Utf8PathBuf::from("/conf/a.ppc")],
        )
        .unwrap_err();

        match err {
            PpcError::IncludeCycle { path, chain } => {
                assert_eq!(path, "/conf/a.ppc");
                assert_eq!(chain, "/conf/a.ppc -> /conf/b.ppc -> /conf/a.ppc");
            },
            other => panic!("expected a cycle error, got {:?}", other),
        }
    }

    #[test]
    fn test_self_include_is_a_cycle() {
        let sources = MemorySources::new().with("/conf/self.ppc", "@include \"self.ppc\"\n");
        let err = expand_text("@include \"self.ppc\"\n", &sources).unwrap_err();

        assert!(matches!(err, PpcError::IncludeCycle { .. }));
    }

    #[test]
    fn test_sibling_includes_are_not_a_cycle() {
        let sources = MemorySources::new().with("/conf/b.ppc", ">> s\n  n = 1\n");
        let document = expand_text("@include \"b.ppc\"\n@include \"b.ppc\"\n", &sources).unwrap();

        let entries: Vec<_> = document.section("s").unwrap().entries().collect();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].order < entries[1].order);
    }

    #[test]
    fn test_failures_name_the_included_file() {
        let sources = MemorySources::new().with("/conf/bad.ppc", ">> ok\n  broken = \"x\n");

        let err = expand_text("@include \"bad.ppc\"\n", &sources).unwrap_err();
        match &err {
            PpcError::Include { path, line, .. } => {
                assert_eq!(path, "bad.ppc");
                assert_eq!(*line, 1);
            },
            other => panic!("expected an include error, got {:?}", other),
        }
        assert!(matches!(err.root_cause(), PpcError::Lex { line: 2, .. }));

        let err = expand_text("\n@include \"missing.ppc\"\n", &sources).unwrap_err();
        assert!(matches!(err, PpcError::Include { line: 2, .. }));
        assert!(matches!(err.root_cause(), PpcError::Io { .. }));
    }

    #[test]
    fn test_file_system_loader() {
        let dir = tempfile::tempdir().unwrap();
        let base = Utf8Path::from_path(dir.path()).unwrap();
        fs::write(base.join("inc.ppc"), "included = true\n").unwrap();

        let document = expand(parse("@include \"inc.ppc\"\n").unwrap(), base, &FileSystem).unwrap();
        assert_eq!(document.root.entry("included").unwrap().value, RawValue::Bool(true));
    }
}
