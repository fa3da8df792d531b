//! PPC benchmarking suite
//!
//! Benchmarks for tokenizing, parsing, include expansion and resolution,
//! plus generators for synthetic documents of a given size.

pub mod common;

pub use common::*;
