//! Loader entry points: text or file in, `Config` out.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use ppc_core::error::PpcError;
use ppc_parser::{parse, Document};
use tracing::{debug, info};

use crate::env::Environment;
use crate::include::{expand, expand_nested, FileSystem, SourceLoader};
use crate::model::Config;
use crate::render::render_config;
use crate::resolve::Resolver;
use crate::secrets::{FileSecrets, SecretProvider};
use crate::ConfigResult;


/// Main configuration loading interface
pub struct ConfigLoader {
    environment: Environment,
    secrets: Option<Box<dyn SecretProvider>>,
    secrets_file: Option<Utf8PathBuf>,
    sources: Box<dyn SourceLoader>,
}

impl ConfigLoader {
    /// A loader reading files from disk and resolving against a snapshot of
    /// the process environment taken now
    pub fn new() -> Self {
        Self {
            environment: Environment::from_process(),
            secrets: None,
            secrets_file: None,
            sources: Box::new(FileSystem),
        }
    }

    /// Resolve against `environment` instead of the process environment
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Explicit secrets, which take precedence over every other source
    pub fn with_secrets(mut self, secrets: impl SecretProvider + 'static) -> Self {
        self.secrets = Some(Box::new(secrets));
        self
    }

    /// JSON secrets file, read on every load
    pub fn with_secrets_file(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.secrets_file = Some(path.into());
        self
    }

    /// Read documents through `sources` instead of the file system
    pub fn with_loader(mut self, sources: impl SourceLoader + 'static) -> Self {
        self.sources = Box::new(sources);
        self
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Load and resolve the document at `path`
    pub fn load(&self, path: impl AsRef<Utf8Path>) -> ConfigResult<Config> {
        let path = path.as_ref();
        let document = self.load_document(path)?;
        let config = self.resolve(&document)?;

        info!(path = %path, keys = config.len(), "loaded configuration");
        Ok(config)
    }

    /// Load and resolve document text; relative includes are looked up
    /// in `base_dir`
    pub fn load_from_text(&self, text: &str, base_dir: impl AsRef<Utf8Path>) -> ConfigResult<Config> {
        let document = expand(parse(text)?, base_dir.as_ref(), self.sources.as_ref())?;
        let config = self.resolve(&document)?;

        info!(keys = config.len(), "loaded configuration from text");
        Ok(config)
    }

    /// Parse the document at `path` and expand its includes, without
    /// resolving anything
    pub fn load_document(&self, path: impl AsRef<Utf8Path>) -> ConfigResult<Document> {
        let canonical = self.sources.canonicalize(path.as_ref())?;
        let text = self.sources.read(&canonical)?;
        let document = parse(&text)?;
        let base_dir = canonical.parent().unwrap_or(Utf8Path::new(""));

        debug!(path = %canonical, "parsed document");
        expand_nested(document, base_dir, self.sources.as_ref(), &[canonical.clone()])
    }

    /// Resolve an include-expanded document with this loader's inputs
    pub fn resolve(&self, document: &Document) -> ConfigResult<Config> {
        let secrets_file = match &self.secrets_file {
            Some(path) => Some(FileSecrets::load(path)?),
            None => None,
        };

        let mut resolver = Resolver::new(&self.environment);
        if let Some(secrets) = &self.secrets {
            resolver = resolver.with_secrets(secrets.as_ref());
        }
        if let Some(file) = &secrets_file {
            resolver = resolver.with_secrets_file(file);
        }
        resolver.resolve(document)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Load a file against the process environment
pub fn load(path: impl AsRef<Utf8Path>) -> ConfigResult<Config> {
    ConfigLoader::new().load(path)
}

/// Load document text against the process environment
pub fn load_from_text(text: &str, base_dir: impl AsRef<Utf8Path>) -> ConfigResult<Config> {
    ConfigLoader::new().load_from_text(text, base_dir)
}

/// Render `config` and write it to `path`, replacing the file
pub fn write_to_file(config: &Config, path: impl AsRef<Utf8Path>) -> ConfigResult<()> {
    let path = path.as_ref();
    fs::write(path, render_config(config))
        .map_err(|e| PpcError::io(format!("Failed to write {}", path), e))?;

    debug!(path = %path, "wrote configuration");
    Ok(())
}
