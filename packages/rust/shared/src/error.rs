//! Error types for resultgen.
//!
//! Library crates use [`ResultgenError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all resultgen operations.
#[derive(Debug, thiserror::Error)]
pub enum ResultgenError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Bad or unparsable value in a metadata file's front matter.
    #[error("metadata error in {path:?} (field `{field}`): {message}")]
    Metadata {
        path: PathBuf,
        field: String,
        message: String,
    },

    /// CSV file could not be turned into a table.
    #[error("table error in {path:?}: {message}")]
    Table { path: PathBuf, message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ResultgenError>;

impl ResultgenError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a metadata error for `field` in the file at `path`.
    pub fn metadata(
        path: impl Into<PathBuf>,
        field: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Metadata {
            path: path.into(),
            field: field.into(),
            message: msg.into(),
        }
    }

    /// Create a table error for the CSV file at `path`.
    pub fn table(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Table {
            path: path.into(),
            message: msg.into(),
        }
    }
}
