//! Triage error types
//!
//! Classification and escalation never fail at call time. Errors only come
//! from building rule tables or loading rule/catalog files.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for rule-table construction and loading
pub type TriageResult<T> = Result<T, TriageError>;

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("invalid pattern '{pattern}' for {owner}: {source}")]
    InvalidPattern {
        owner: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("unknown category '{0}'")]
    UnknownCategory(String),

    #[error("duplicate rule for category '{0}'")]
    DuplicateCategory(String),

    #[error("sentinel category '{0}' cannot carry scoring rules")]
    SentinelCategory(String),

    #[error("escalation rule '{0}' has no conditions")]
    EmptyConditions(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl TriageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error means the source file simply isn't there.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}
