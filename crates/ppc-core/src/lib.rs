//! # ppc-core
//!
//! Core types and utilities shared across all PPC crates.
//!
//! This crate provides:
//! - `PpcError` enum for unified error handling across the pipeline
//! - `Value`, the resolved scalar/list type exposed by a loaded configuration
//! - `RawValue` and `TypeHint`, the unresolved values carried by a parsed document
//! - Utility functions for include path handling and literal quoting
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Value types (resolved and raw) and type hints
//! - `error`: Error types and result aliases
//! - `utils`: Utility functions and helpers

pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{PpcError, PpcResult};
pub use types::{RawValue, TypeHint, Value};
