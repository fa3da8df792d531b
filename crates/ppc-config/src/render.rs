//! Rendering configs and documents back to `.ppc` text.
//!
//! Both renderers use flattened dotted headers (`>> a.b`) and put a table's
//! own entries before its nested tables. Output always ends with a newline
//! and is deterministic for a given input.

use std::fmt;

use ppc_core::types::TypeHint;
use ppc_core::utils::quote;
use ppc_parser::{ConditionalBlock, DocOrder, Document, Entry, IncludeDirective, Node, Section};

use crate::model::{Config, Item};

/// Render a resolved config. Loading the output again with any environment
/// gives back an equal config, provided every key is a plain identifier.
pub fn render_config(config: &Config) -> String {
    config.to_string()
}

/// Render a parsed document canonically, keeping references, defaults,
/// type hints, conditional blocks and includes.
///
/// Entries written at the root of the document (or of a conditional body)
/// are moved above the first header of that context. Meant for documents as
/// parsed; an include-expanded document may hold conditionals inside
/// conditional bodies, which the text form cannot express.
pub fn render_document(document: &Document) -> String {
    DocumentText(document).to_string()
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote = false;
        write_table(f, self, &mut Vec::new(), &mut wrote)
    }
}

fn write_table(
    f: &mut fmt::Formatter<'_>,
    table: &Config,
    path: &mut Vec<String>,
    wrote: &mut bool,
) -> fmt::Result {
    let indent = if path.is_empty() {
        ""
    } else {
        if *wrote {
            writeln!(f)?;
        }
        writeln!(f, ">> {}", path.join("."))?;
        *wrote = true;
        "  "
    };

    for (key, item) in table.iter() {
        if let Item::Value(value) = item {
            writeln!(f, "{}{} = {}", indent, key, value.to_literal())?;
            *wrote = true;
        }
    }

    for (key, item) in table.iter() {
        if let Item::Table(child) = item {
            path.push(key.to_string());
            write_table(f, child, path, wrote)?;
            path.pop();
        }
    }

    Ok(())
}

struct DocumentText<'d>(&'d Document);

impl fmt::Display for DocumentText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_context(f, &self.0.root, "")
    }
}

/// A line (or block) of a rendered context
enum Piece<'d> {
    Entry(&'d [String], &'d Entry),
    EmptySection(&'d [String]),
    Include(&'d IncludeDirective),
    Conditional(&'d ConditionalBlock),
}

fn flatten<'d>(section: &'d Section, pieces: &mut Vec<(&'d DocOrder, Piece<'d>)>) {
    let mut has_children = false;

    for node in &section.children {
        match node {
            Node::Entry(entry) => {
                has_children = true;
                pieces.push((&entry.order, Piece::Entry(&section.path, entry)));
            },
            Node::Section(child) => {
                has_children = true;
                flatten(child, pieces);
            },
            Node::Include(include) => pieces.push((&include.order, Piece::Include(include))),
            Node::Conditional(block) => pieces.push((&block.order, Piece::Conditional(block))),
        }
    }

    if !has_children && !section.is_root() {
        pieces.push((&section.order, Piece::EmptySection(&section.path)));
    }
}

/// Render the document root or a conditional body
fn write_context(f: &mut fmt::Formatter<'_>, root: &Section, indent: &str) -> fmt::Result {
    let mut pieces = Vec::new();
    flatten(root, &mut pieces);
    pieces.sort_by(|a, b| a.0.cmp(b.0));

    // root entries written before the first include or block move above
    // the first header; later ones are written where they are, after
    // `>> @end` has returned the scope to the root
    let barrier = pieces
        .iter()
        .position(|(_, piece)| matches!(piece, Piece::Include(_) | Piece::Conditional(_)))
        .unwrap_or(pieces.len());
    let mut hoisted = Vec::new();
    let mut rest = Vec::new();
    for (index, (_, piece)) in pieces.into_iter().enumerate() {
        match piece {
            Piece::Entry(path, entry) if path.is_empty() && index < barrier => hoisted.push(entry),
            piece => rest.push(piece),
        }
    }

    let mut wrote = false;
    for entry in hoisted {
        write_entry(f, entry, indent)?;
        wrote = true;
    }

    let mut scope: &[String] = &[];
    let entry_indent = format!("{}  ", indent);

    for piece in rest {
        match piece {
            Piece::Entry(path, entry) if path.is_empty() => {
                write_entry(f, entry, indent)?;
            },
            Piece::Entry(path, entry) => {
                if scope != path {
                    write_header(f, path, indent, wrote)?;
                    scope = path;
                }
                write_entry(f, entry, &entry_indent)?;
            },
            Piece::EmptySection(path) => {
                write_header(f, path, indent, wrote)?;
                scope = path;
            },
            Piece::Include(include) => {
                writeln!(f, "{}@include {}", indent, quote(&include.path))?;
            },
            Piece::Conditional(block) => {
                if wrote {
                    writeln!(f)?;
                }
                writeln!(f, "{}>> @when {}", indent, block.condition)?;
                write_context(f, &block.body, &entry_indent)?;
                writeln!(f, "{}>> @end", indent)?;
                scope = &[];
            },
        }
        wrote = true;
    }

    Ok(())
}

fn write_header(f: &mut fmt::Formatter<'_>, path: &[String], indent: &str, wrote: bool) -> fmt::Result {
    if wrote {
        writeln!(f)?;
    }
    writeln!(f, "{}>> {}", indent, path.join("."))
}

fn write_entry(f: &mut fmt::Formatter<'_>, entry: &Entry, indent: &str) -> fmt::Result {
    write!(f, "{}{}", indent, entry.key)?;
    if let Some(hint) = &entry.type_hint {
        // unknown hints are kept as written so the resolver still reports them
        match hint.parse::<TypeHint>() {
            Ok(hint) => write!(f, " :: {}", hint)?,
            Err(_) => write!(f, " :: {}", hint)?,
        }
    }
    writeln!(f, " = {}", entry.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Environment;
    use crate::resolve::Resolver;
    use ppc_core::types::Value;
    use ppc_parser::parse;

    #[test]
    fn test_render_config_layout() {
        let config = Config::try_from(serde_json::json!({
            "name": "svc",
            "db": {
                "pool": { "size": 4 },
                "host": "local",
                "ratio": 1.0,
                "tags": ["a", "b's"],
                "none": null
            },
            "empty": {}
        }))
        .unwrap();

        assert_eq!(
            render_config(&config),
            r#"name = "svc"

>> db
  host = "local"
  ratio = 1.0
  tags = ["a", "b's"]
  none = null

>> db.pool
  size = 4

>> empty
"#
        );
    }

    #[test]
    fn test_render_config_quotes_strings() {
        let config: Config = [
            ("plain".to_string(), Item::Value(Value::from("yes"))),
            ("quoted".to_string(), Item::Value(Value::from("say \"hi\""))),
            ("number".to_string(), Item::Value(Value::from("8080"))),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            config.to_string(),
            "plain = \"yes\"\nquoted = 'say \"hi\"'\nnumber = \"8080\"\n"
        );
    }

    #[test]
    fn test_render_document_keeps_unresolved_parts() {
        let document = parse(
            r#"# header
name :: string = $env.NAME ?? "svc"
>> db.pool
  size :: INT = 4
>> @when $env.ENV == 'dev'
  debug = on
  >> db
    host = localhost
  @include "shared.ppc"
>> @end
late = [1, 2.5]
>> empty
"#,
        )
        .unwrap();

        assert_eq!(
            render_document(&document),
            r#"name :: str = $env.NAME ?? "svc"

>> db.pool
  size :: int = 4

>> @when $env.ENV == "dev"
  debug = true

  >> db
    host = "localhost"
  @include "shared.ppc"
>> @end
late = [1, 2.5]

>> empty
"#
        );
    }

    #[test]
    fn test_rendered_documents_resolve_the_same() {
        let sources = [
            ">> @when $env.X\n  name = 2\n>> @end\nname = 1\n",
            "name = 0\n>> @when $env.X\n  name = 2\n>> @end\nname = 1\n>> @when $env.X\n  name = 3\n",
            "a = 1\n>> s\n  k = 1\n>> @when $env.X\n  >> s\n    k = 2\n  a = 2\n>> @end\na = 3\n>> s\n  j = 1\n",
        ];
        let environments = [Environment::new(), Environment::new().with("X", "yes")];

        for text in sources {
            let document = parse(text).unwrap();
            let rendered = render_document(&document);
            let reparsed = parse(&rendered).unwrap();

            for env in &environments {
                let resolver = Resolver::new(env);
                assert_eq!(
                    resolver.resolve(&reparsed).unwrap(),
                    resolver.resolve(&document).unwrap(),
                    "rendered text:\n{}",
                    rendered
                );
            }
        }
    }

    #[test]
    fn test_render_document_reopens_sections_after_blocks() {
        let text = ">> a\n  x = 1\n>> @when $env.X\n  y = 2\n>> @end\n>> a\n  z = 3\n";
        let rendered = render_document(&parse(text).unwrap());

        assert_eq!(
            rendered,
            ">> a\n  x = 1\n\n>> @when $env.X\n  y = 2\n>> @end\n\n>> a\n  z = 3\n"
        );
        assert_eq!(render_document(&parse(&rendered).unwrap()), rendered);
    }
}
