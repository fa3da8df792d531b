//! Value types for PPC documents.
//!
//! This module separates the two stages a value goes through:
//! - `RawValue`: what the parser produced, possibly holding `$env`/`$secret` references
//! - `Value`: what the resolver produced; references can no longer occur

pub mod hint;
pub mod raw;
pub mod value;

// Re-export all public types
pub use hint::{TypeHint, UnknownTypeHint};
pub use raw::RawValue;
pub use value::Value;
