//! Centralized error types for the Hearth workspace.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error enum. Variants map to subsystems.
///
/// `Clone + PartialEq` because failed bundle handles keep their error and
/// read/write completions carry it across the worker channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum HearthError {
    // -- Resource bundles --
    #[error("No resource bundle for {owner} under locale {locale:?}")]
    ResourceNotFound { owner: String, locale: String },

    #[error("Failed to load resource bundle for {owner}: {reason}")]
    ResourceLoad { owner: String, reason: String },

    #[error("Lookup requested without a key")]
    NullKey,

    // -- Text file I/O --
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("I/O error on {}: {reason}", path.display())]
    FileIo { path: PathBuf, reason: String },

    #[error("Text I/O worker is stopped")]
    WorkerStopped,

    // -- Shutdown --
    #[error("Shutdown participant {name} failed: {reason}")]
    Participant { name: String, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HearthError {
    /// Any I/O failure on `path`, with no not-found special case.
    pub fn file_io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::FileIo {
            path: path.into(),
            reason: err.to_string(),
        }
    }

    /// Classifies an `io::Error` raised while reading `path`.
    pub fn from_io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::FileNotFound(path),
            _ => Self::file_io(path, err),
        }
    }
}

pub type HearthResult<T> = Result<T, HearthError>;
