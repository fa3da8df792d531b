//! Lexer, parser and document tree for the PPC configuration language
//!
//! This crate turns `.ppc` text into a `Document`: a tree of sections and
//! entries, plus the conditional blocks and include directives that the
//! resolver later evaluates. Nothing here touches the environment or the
//! file system.

pub mod parser;
pub mod references;
pub mod token;
pub mod tree;

mod lexer;

// Re-export main types
pub use lexer::tokenize;
pub use parser::{parse, parse_tokens};
pub use references::References;
pub use token::{Operator, Token, TokenKind};
pub use tree::{
    Condition, ConditionalBlock, DocOrder, Document, Entry, IncludeDirective, IncludeSite, Node,
    Reference, Section,
};

pub use ppc_core::error::{PpcError, PpcResult};
