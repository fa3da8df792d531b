//! Parser: token stream → `Document`.
//!
//! Scope is tracked through headers only. `>> a.b` makes `a.b` (relative to
//! the document root) the current section; entries go to the current
//! section; entries before any header belong to the root. `>> @when` opens
//! a conditional body, a fresh root that stays open until the next
//! `>> @when`, a `>> @end`, or the end of the document. `@include` is always
//! recorded at the root of the context it appears in.

use ppc_core::error::{PpcError, PpcResult};
use ppc_core::types::RawValue;
use ppc_core::utils::{is_identifier, parse_finite};
use tracing::trace;

use crate::lexer::tokenize;
use crate::token::{Operator, Token, TokenKind};
use crate::tree::{
    Condition, ConditionalBlock, DocOrder, Document, Entry, IncludeDirective, Node, Reference,
    Section,
};

/// Tokenize and parse a document
pub fn parse(text: &str) -> PpcResult<Document> {
    let tokens = tokenize(text)?;
    parse_tokens(tokens)
}

/// Parse an already tokenized document. Comment tokens are skipped.
pub fn parse_tokens(tokens: Vec<Token>) -> PpcResult<Document> {
    let tokens: Vec<Token> = tokens.into_iter().filter(|t| !t.is_comment()).collect();
    trace!(tokens = tokens.len(), "parsing document");
    Parser::new(tokens).parse()
}

/// Hands out document orders for one context (document or conditional body)
struct OrderCounter {
    prefix: Option<DocOrder>,
    next: u32,
}

impl OrderCounter {
    fn document() -> Self {
        Self {
            prefix: None,
            next: 0,
        }
    }

    fn nested(prefix: DocOrder) -> Self {
        Self {
            prefix: Some(prefix),
            next: 0,
        }
    }

    fn next(&mut self) -> DocOrder {
        let index = self.next;
        self.next += 1;
        match &self.prefix {
            Some(prefix) => prefix.child(index),
            None => DocOrder::root(index),
        }
    }
}

/// A conditional block whose body is still being parsed
struct OpenBlock {
    condition: Condition,
    line: usize,
    order: DocOrder,
    body: Section,
    counter: OrderCounter,
}

impl OpenBlock {
    fn close(self) -> Node {
        Node::Conditional(ConditionalBlock {
            condition: self.condition,
            body: self.body,
            line: self.line,
            order: self.order,
        })
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Line of the most recently consumed token
    last_line: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            last_line: 1,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned()?;
        self.pos += 1;
        self.last_line = token.line;
        Some(token)
    }

    /// Next token, but only if it is on `line`
    fn peek_on_line(&self, line: usize) -> Option<&Token> {
        self.peek().filter(|token| token.line == line)
    }

    /// A statement must end its line
    fn expect_line_end(&self, what: &str) -> PpcResult<()> {
        match self.peek_on_line(self.last_line) {
            Some(token) => Err(PpcError::parse(
                token.line,
                format!("unexpected {} after {}", token.kind, what),
            )),
            None => Ok(()),
        }
    }

    fn parse(mut self) -> PpcResult<Document> {
        let mut document = Document::new();
        let mut counter = OrderCounter::document();
        let mut current: Vec<String> = Vec::new();
        let mut open: Option<OpenBlock> = None;

        while let Some(token) = self.advance() {
            let line = token.line;

            match token.kind {
                TokenKind::Section(path) => {
                    let path = parse_section_path(&path, line)?;
                    self.expect_line_end("section header")?;

                    let (root, order) = match open.as_mut() {
                        Some(block) => (&mut block.body, block.counter.next()),
                        None => (&mut document.root, counter.next()),
                    };
                    root.ensure_section(&path, line, &order);
                    current = path;
                },
                TokenKind::When => {
                    let condition = self.parse_condition(line)?;
                    self.expect_line_end("condition")?;

                    if let Some(block) = open.take() {
                        document.root.children.push(block.close());
                    }
                    let order = counter.next();
                    open = Some(OpenBlock {
                        condition,
                        line,
                        counter: OrderCounter::nested(order.clone()),
                        order,
                        body: Section::root(),
                    });
                    current.clear();
                },
                TokenKind::End => {
                    self.expect_line_end("'>> @end'")?;
                    match open.take() {
                        Some(block) => document.root.children.push(block.close()),
                        None => {
                            return Err(PpcError::parse(
                                line,
                                "'>> @end' without an open '>> @when' block",
                            ))
                        },
                    }
                    current.clear();
                },
                TokenKind::Include => {
                    let path = match self.peek_on_line(line).map(|t| t.kind.clone()) {
                        Some(TokenKind::Str(path)) => {
                            self.advance();
                            path
                        },
                        _ => {
                            return Err(PpcError::parse(
                                line,
                                "'@include' must be followed by a quoted file path",
                            ))
                        },
                    };
                    self.expect_line_end("include path")?;

                    let (root, order) = match open.as_mut() {
                        Some(block) => (&mut block.body, block.counter.next()),
                        None => (&mut document.root, counter.next()),
                    };
                    root.children
                        .push(Node::Include(IncludeDirective { path, line, order }));
                },
                TokenKind::Key(key) => {
                    let (type_hint, value) = self.parse_assignment(&key, line)?;
                    self.expect_line_end("value")?;

                    let (root, order) = match open.as_mut() {
                        Some(block) => (&mut block.body, block.counter.next()),
                        None => (&mut document.root, counter.next()),
                    };
                    let section = root.ensure_section(&current, line, &order);
                    section.children.push(Node::Entry(Entry {
                        key,
                        type_hint,
                        value,
                        line,
                        order,
                        included_from: Vec::new(),
                    }));
                },
                other => {
                    return Err(PpcError::parse(
                        line,
                        format!("unexpected {} at start of line", other),
                    ))
                },
            }
        }

        if let Some(block) = open.take() {
            document.root.children.push(block.close());
        }

        Ok(document)
    }

    /// `:: hint = value`, after the key
    fn parse_assignment(&mut self, key: &str, line: usize) -> PpcResult<(Option<String>, RawValue)> {
        let mut type_hint = None;

        if self.peek_on_line(line).map(|t| &t.kind) == Some(&TokenKind::Op(Operator::DoubleColon)) {
            self.advance();
            match self.peek_on_line(line).map(|t| t.kind.clone()) {
                Some(TokenKind::TypeHint(hint)) => {
                    self.advance();
                    type_hint = Some(hint);
                },
                _ => {
                    return Err(PpcError::parse(
                        line,
                        format!("'::' after '{}' must be followed by a type name", key),
                    ))
                },
            }
        }

        match self.peek_on_line(line).map(|t| &t.kind) {
            Some(TokenKind::Op(Operator::Assign)) => {
                self.advance();
            },
            _ => {
                return Err(PpcError::parse(
                    line,
                    format!("expected '=' after key '{}'", key),
                ))
            },
        }

        if self.peek_on_line(line).is_none() {
            return Err(PpcError::parse(
                line,
                format!("missing value for key '{}'", key),
            ));
        }

        let value = self.parse_value(line)?;
        Ok((type_hint, value))
    }

    /// A literal, list or reference, with an optional `?? fallback`
    fn parse_value(&mut self, line: usize) -> PpcResult<RawValue> {
        let token = self
            .advance()
            .ok_or_else(|| PpcError::parse(line, "expected a value"))?;

        let value = match token.kind {
            TokenKind::Str(text) => RawValue::String(text),
            TokenKind::Number(raw) => parse_number(&raw, token.line)?,
            TokenKind::Bool(b) => RawValue::Bool(b),
            TokenKind::Null => RawValue::Null,
            TokenKind::LBracket => self.parse_list(token.line)?,
            TokenKind::EnvRef(name) => RawValue::EnvRef {
                name,
                default: None,
            },
            TokenKind::SecretRef(name) => RawValue::SecretRef {
                name,
                default: None,
            },
            other => {
                return Err(PpcError::parse(
                    token.line,
                    format!("expected a value, found {}", other),
                ))
            },
        };

        if self.peek().map(|t| &t.kind) == Some(&TokenKind::Op(Operator::Default)) {
            let op_line = self.advance().map_or(line, |t| t.line);
            if !value.is_reference() {
                return Err(PpcError::parse(
                    op_line,
                    "'??' can only follow an $env or $secret reference",
                ));
            }
            if self.peek().is_none() {
                return Err(PpcError::parse(op_line, "'??' must be followed by a value"));
            }
            let fallback = self.parse_value(op_line)?;
            return Ok(value.with_default(fallback));
        }

        Ok(value)
    }

    /// Items after `[` up to the matching `]`
    fn parse_list(&mut self, open_line: usize) -> PpcResult<RawValue> {
        let mut items = Vec::new();

        loop {
            match self.peek().map(|t| &t.kind) {
                None => {
                    return Err(PpcError::parse(
                        open_line,
                        "array is missing its closing ']'",
                    ))
                },
                Some(TokenKind::RBracket) => {
                    self.advance();
                    return Ok(RawValue::List(items));
                },
                Some(_) => {},
            }

            items.push(self.parse_value(self.last_line)?);

            match self.peek().map(|t| t.kind.clone()) {
                Some(TokenKind::Comma) => {
                    self.advance();
                },
                Some(TokenKind::RBracket) => {},
                None => {
                    return Err(PpcError::parse(
                        open_line,
                        "array is missing its closing ']'",
                    ))
                },
                Some(other) => {
                    let line = self.peek().map_or(open_line, |t| t.line);
                    return Err(PpcError::parse(
                        line,
                        format!("expected ',' or ']' in array, found {}", other),
                    ));
                },
            }
        }
    }

    /// `$env.NAME`, `$env.NAME == "x"` or `$env.NAME != "x"` after `>> @when`
    fn parse_condition(&mut self, line: usize) -> PpcResult<Condition> {
        let reference = match self.peek_on_line(line).map(|t| t.kind.clone()) {
            Some(TokenKind::EnvRef(name)) => Reference::Env(name),
            Some(TokenKind::SecretRef(name)) => Reference::Secret(name),
            _ => {
                return Err(PpcError::parse(
                    line,
                    "'>> @when' needs a condition such as $env.NAME or $env.NAME == \"value\"",
                ))
            },
        };
        self.advance();

        let negated = match self.peek_on_line(line).map(|t| &t.kind) {
            Some(TokenKind::Op(Operator::Eq)) => false,
            Some(TokenKind::Op(Operator::NotEq)) => true,
            _ => return Ok(Condition::Truthy(reference)),
        };
        self.advance();

        let expected = match self.peek_on_line(line).map(|t| t.kind.clone()) {
            Some(TokenKind::Str(text)) => text,
            Some(TokenKind::Number(raw)) => raw,
            Some(TokenKind::Bool(b)) => b.to_string(),
            _ => {
                return Err(PpcError::parse(
                    line,
                    format!("comparison with {} needs a literal to compare against", reference),
                ))
            },
        };
        self.advance();

        Ok(if negated {
            Condition::NotEquals {
                reference,
                expected,
            }
        } else {
            Condition::Equals {
                reference,
                expected,
            }
        })
    }
}

fn parse_section_path(path: &str, line: usize) -> PpcResult<Vec<String>> {
    if path.is_empty() {
        return Err(PpcError::parse(line, "'>>' must be followed by a section name"));
    }

    path.split('.')
        .map(|segment| {
            if is_identifier(segment) {
                Ok(segment.to_string())
            } else {
                Err(PpcError::parse(
                    line,
                    format!("invalid section name '{}'", path),
                ))
            }
        })
        .collect()
}

fn parse_number(raw: &str, line: usize) -> PpcResult<RawValue> {
    if let Ok(i) = raw.parse::<i64>() {
        return Ok(RawValue::Int(i));
    }
    if raw.parse::<f64>().is_err() {
        return Err(PpcError::parse(line, format!("invalid number '{}'", raw)));
    }
    parse_finite(raw)
        .map(RawValue::Float)
        .ok_or_else(|| PpcError::parse(line, format!("number '{}' is out of range", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_at(document: &Document, section: &str, key: &str) -> RawValue {
        let section = if section.is_empty() {
            &document.root
        } else {
            document.section(section).unwrap()
        };
        section.entry(key).unwrap().value.clone()
    }

    #[test]
    fn test_parse_sections_and_values() {
        let document = parse(
            r#"
# Discord bot
>> bot
  token :: str = $env.DISCORD_TOKEN
  prefix = "!"
  shards :: int = 4
  ratio = 0.5
  debug = off
  owner = null
  cogs = ["music", "fun", [1, 2]]
"#,
        )
        .unwrap();

        let bot = document.section("bot").unwrap();
        let token = bot.entry("token").unwrap();
        assert_eq!(token.type_hint.as_deref(), Some("str"));
        assert_eq!(token.line, 4);
        assert_eq!(
            token.value,
            RawValue::EnvRef {
                name: "DISCORD_TOKEN".to_string(),
                default: None
            }
        );

        assert_eq!(value_at(&document, "bot", "shards"), RawValue::Int(4));
        assert_eq!(value_at(&document, "bot", "ratio"), RawValue::Float(0.5));
        assert_eq!(value_at(&document, "bot", "debug"), RawValue::Bool(false));
        assert_eq!(value_at(&document, "bot", "owner"), RawValue::Null);
        assert_eq!(
            value_at(&document, "bot", "cogs"),
            RawValue::List(vec![
                RawValue::String("music".to_string()),
                RawValue::String("fun".to_string()),
                RawValue::List(vec![RawValue::Int(1), RawValue::Int(2)]),
            ])
        );
    }

    #[test]
    fn test_root_level_entries() {
        let document = parse("name = \"svc\"\n>> db\n  host = localhost\n").unwrap();

        assert_eq!(
            value_at(&document, "", "name"),
            RawValue::String("svc".to_string())
        );
        assert!(document.root.entry("host").is_none());
    }

    #[test]
    fn test_dotted_sections_merge() {
        let document = parse(">> a.b\n  k = 1\n>> a\n  j = 2\n>> a.b\n  k = 3\n").unwrap();

        assert_eq!(document.root.sections().count(), 1);
        let a = document.section("a").unwrap();
        assert_eq!(a.sections().count(), 1);
        assert_eq!(value_at(&document, "a", "j"), RawValue::Int(2));
        assert_eq!(value_at(&document, "a.b", "k"), RawValue::Int(3));
        assert_eq!(document.section("a.b").unwrap().entries().count(), 2);
    }

    #[test]
    fn test_defaults_chain() {
        let document = parse("port = $env.PORT ?? $secret.PORT ?? 8080\n").unwrap();

        assert_eq!(
            value_at(&document, "", "port").to_string(),
            "$env.PORT ?? $secret.PORT ?? 8080"
        );
    }

    #[test]
    fn test_conditional_blocks() {
        let document = parse(
            r#"
>> server
  debug = false
>> @when $env.ENV == "dev"
  >> server
    debug = true
  >> extra.tools
    enabled = yes
>> @when $secret.FEATURE_KEY
  flag = 1
"#,
        )
        .unwrap();

        let blocks: Vec<&ConditionalBlock> = document.root.conditionals().collect();
        assert_eq!(blocks.len(), 2);

        assert_eq!(
            blocks[0].condition,
            Condition::Equals {
                reference: Reference::Env("ENV".to_string()),
                expected: "dev".to_string(),
            }
        );
        let body = &blocks[0].body;
        assert_eq!(
            body.section(&["server"]).unwrap().entry("debug").unwrap().value,
            RawValue::Bool(true)
        );
        assert!(body.section(&["extra", "tools"]).is_some());

        assert_eq!(
            blocks[1].condition,
            Condition::Truthy(Reference::Secret("FEATURE_KEY".to_string()))
        );
        assert!(blocks[1].body.entry("flag").is_some());

        // the base tree is untouched by the blocks
        assert_eq!(value_at(&document, "server", "debug"), RawValue::Bool(false));
        assert!(document.section("extra").is_none());
    }

    #[test]
    fn test_end_returns_to_root() {
        let document = parse(
            ">> app\n  a = 1\n>> @when $env.CI != \"true\"\n  >> app\n    b = 2\n>> @end\nc = 3\n",
        )
        .unwrap();

        let block = document.root.conditionals().next().unwrap();
        assert!(matches!(block.condition, Condition::NotEquals { .. }));
        assert_eq!(value_at(&document, "", "c"), RawValue::Int(3));
        assert!(document.section("app").unwrap().entry("b").is_none());
    }

    #[test]
    fn test_orders_follow_text() {
        let document = parse(
            ">> bot\n  x = 1\n@include \"inc.ppc\"\n>> @when $env.A\n  y = 2\n>> @end\n>> bot\n  x = 3\n",
        )
        .unwrap();

        let include = document.root.includes().next().unwrap();
        assert_eq!(include.path, "inc.ppc");
        let block = document.root.conditionals().next().unwrap();
        let entry_in_block = block.body.entry("y").unwrap();
        let bot = document.section("bot").unwrap();
        let first = &bot.entries().next().unwrap().order;
        let last = &bot.entry("x").unwrap().order;

        assert!(first < &include.order);
        assert!(include.order < block.order);
        assert!(block.order < entry_in_block.order);
        assert!(entry_in_block.order < *last);
    }

    #[test]
    fn test_parse_errors() {
        let cases = [
            (">>\n", 1),
            (">> a..b\n", 1),
            (">> app\n  port :: = 5\n", 2),
            (">> app\n  port 5\n", 2),
            (">> app\n  port =\n", 2),
            (">> @when\n", 1),
            (">> @when $env.ENV ==\n", 1),
            ("@include\n", 1),
            ("@include [1]\n", 1),
            (">> @end\n", 1),
            ("a = 1 2\n", 1),
            ("a = \"x\" ?? 1\n", 1),
            (">> app extra\n", 1),
            ("big = 1e400\n", 1),
            (">> s\n  list = [1, -2e999]\n", 2),
        ];

        for (source, line) in cases {
            match parse(source) {
                Err(PpcError::Parse { line: got, .. }) => {
                    assert_eq!(got, line, "wrong line for {:?}", source)
                },
                other => panic!("expected parse error for {:?}, got {:?}", source, other),
            }
        }
    }

    #[test]
    fn test_missing_bracket_from_token_stream() {
        let tokens = vec![
            Token::new(TokenKind::Key("a".to_string()), 1, 1),
            Token::new(TokenKind::Op(Operator::Assign), 1, 3),
            Token::new(TokenKind::LBracket, 1, 5),
            Token::new(TokenKind::Number("1".to_string()), 1, 6),
        ];

        let err = parse_tokens(tokens).unwrap_err();
        assert!(err.to_string().contains("closing ']'"));
    }
}
