//! Utility functions and helpers.
//!
//! Common functionality used across multiple PPC crates.

pub mod path;
pub mod text;

// Re-export commonly used utilities
pub use path::{normalize_path, resolve_include_path};
pub use text::{format_float, is_identifier, is_number_literal, is_numeric_word, parse_finite, quote};
