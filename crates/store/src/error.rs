//! Typed error types for the persistence layer.

use std::io;
use std::path::PathBuf;

/// Persistence error conditions.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The record exists but has expired (drafts).
    #[error("expired: {0}")]
    Expired(String),

    /// A record key contains characters that cannot form a file name.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// A template failed schema validation on save.
    #[error("invalid template `{name}`")]
    InvalidTemplate {
        /// The template name the save was attempted under.
        name: String,
        /// The schema error from the compiler.
        #[source]
        source: zplgrid_core::CompileError,
    },

    /// Reading or writing a store file failed.
    #[error("I/O error at {path}")]
    Io {
        /// The file the operation touched.
        path: PathBuf,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// A counter file does not hold a decimal value.
    #[error("corrupt counter at {path}")]
    CorruptCounter {
        /// The file holding the unparsable counter.
        path: PathBuf,
    },

    /// A stored record could not be decoded.
    #[error("corrupt record at {path}")]
    Corrupt {
        /// The file holding the undecodable record.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        StoreError::Corrupt {
            path: path.into(),
            source,
        }
    }
}
