//! Loading PPC configuration
//!
//! This crate takes parsed `.ppc` documents the rest of the way: it expands
//! `@include` directives, evaluates `>> @when` blocks, resolves `$env` and
//! `$secret` references, applies type hints, and builds the resolved
//! `Config`. It can also render configs and documents back to text.
//!
//! ```no_run
//! use ppc_config::{ConfigLoader, Environment};
//!
//! let config = ConfigLoader::new()
//!     .with_environment(Environment::new().with("ENV", "dev"))
//!     .load("bot.ppc")?;
//! let prefix = config.get_str("bot.prefix");
//! # Ok::<(), ppc_core::PpcError>(())
//! ```

pub mod env;
pub mod include;
pub mod loader;
pub mod model;
pub mod render;
pub mod resolve;
pub mod secrets;

// Re-export main types
pub use env::Environment;
pub use include::{expand, expand_nested, FileSystem, MemorySources, SourceLoader};
pub use loader::{load, load_from_text, write_to_file, ConfigLoader};
pub use model::{Config, Item};
pub use render::{render_config, render_document};
pub use resolve::{coerce, Resolver};
pub use secrets::{FileSecrets, MapSecrets, SecretProvider, SECRET_ENV_PREFIX};

use ppc_core::error::PpcError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, PpcError>;
