//! Error types and result aliases for PPC operations.
//!
//! Provides a unified error type that covers every failure of the
//! lex → parse → include → resolve pipeline with actionable error messages.
//! Every error is terminal for the call that produced it.

use thiserror::Error;

/// Unified error type for all PPC operations
#[derive(Error, Debug)]
pub enum PpcError {
    // Syntax errors
    #[error("Lex error at line {line}, column {column}: {message}")]
    Lex {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    // Include errors
    #[error("Failed to include '{path}' (line {line}): {source}")]
    Include {
        path: String,
        line: usize,
        #[source]
        source: Box<PpcError>,
    },

    #[error("Include cycle detected: '{path}' is already being included ({chain})")]
    IncludeCycle { path: String, chain: String },

    // Resolution errors
    #[error("Environment variable '{name}' is not set and has no default (line {line})")]
    MissingEnvVar { name: String, line: usize },

    #[error("Secret '{name}' could not be resolved and has no default (line {line})")]
    MissingSecret { name: String, line: usize },

    #[error("Type mismatch for '{key}' (line {line}): declared {declared}, got {actual}")]
    TypeMismatch {
        key: String,
        declared: String,
        actual: String,
        line: usize,
    },

    #[error("Unknown type hint '{hint}' for '{key}' (line {line})")]
    UnknownType {
        key: String,
        hint: String,
        line: usize,
    },

    // Secrets source errors
    #[error("Invalid secrets file {path}: {message}")]
    SecretsFile { path: String, message: String },

    // Output errors
    #[error("Failed to serialize configuration: {message}")]
    Serialize { message: String },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for PPC operations
pub type PpcResult<T> = Result<T, PpcError>;

impl PpcError {
    /// Create a lex error at the given position
    pub fn lex(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::Lex {
            line,
            column,
            message: message.into(),
        }
    }

    /// Create a parse error at the given line
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Wrap a failure that happened while including `path`
    pub fn include(path: impl Into<String>, line: usize, source: PpcError) -> Self {
        Self::Include {
            path: path.into(),
            line,
            source: Box::new(source),
        }
    }

    /// Source line the error points at, when it has one
    pub fn line(&self) -> Option<usize> {
        match self {
            PpcError::Lex { line, .. }
            | PpcError::Parse { line, .. }
            | PpcError::Include { line, .. }
            | PpcError::MissingEnvVar { line, .. }
            | PpcError::MissingSecret { line, .. }
            | PpcError::TypeMismatch { line, .. }
            | PpcError::UnknownType { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// The innermost error of a chain of include failures
    pub fn root_cause(&self) -> &PpcError {
        match self {
            PpcError::Include { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Check if this error was raised while resolving values (as opposed to
    /// reading or parsing documents), including inside an included file
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self.root_cause(),
            PpcError::MissingEnvVar { .. }
                | PpcError::MissingSecret { .. }
                | PpcError::TypeMismatch { .. }
                | PpcError::UnknownType { .. }
        )
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            PpcError::MissingEnvVar { .. } => {
                Some("Export the variable or add a fallback with '?? <default>'")
            },
            PpcError::MissingSecret { .. } => Some(
                "Pass the secret explicitly, set SECRET_<NAME>, add it to the secrets file, or add a '??' default",
            ),
            PpcError::UnknownType { .. } => {
                Some("Use one of the type hints: str, int, float, bool, list")
            },
            PpcError::IncludeCycle { .. } => {
                Some("Remove the @include that points back to a file already being included")
            },
            PpcError::Include { source, .. } => source.suggestion(),
            _ => None,
        }
    }
}
