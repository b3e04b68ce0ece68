//! Error types. Artifact problems are fatal at startup; per-request failures are
//! either surfaced (`ClassifyError`) or recovered locally by the component that owns them.

use std::path::PathBuf;
use thiserror::Error;

/// Vocabulary or classifier artifact could not be loaded or failed validation.
#[derive(Debug, Error)]
pub enum ArtifactLoadError {
    #[error("artifact not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("artifact unreadable: {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact malformed: {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{artifact} artifact inconsistent: {reason}")]
    Inconsistent {
        artifact: &'static str,
        reason: String,
    },
}

impl ArtifactLoadError {
    pub(crate) fn inconsistent(artifact: &'static str, reason: impl Into<String>) -> Self {
        Self::Inconsistent {
            artifact,
            reason: reason.into(),
        }
    }
}

/// Per-request classification failure. Never to be reported as a "safe" verdict.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    #[error("feature vector has {actual} columns, classifier expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("decision score is not finite")]
    NonFiniteScore,
}

#[derive(Debug, Error)]
pub enum ExplanationError {
    #[error("explainer disabled")]
    Disabled,

    #[error("API key not set (env {0})")]
    MissingApiKey(String),

    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    #[error("explainer returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("explainer returned no text")]
    EmptyResponse,
}

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR engine unavailable: {0}")]
    Unavailable(String),

    #[error("image could not be decoded: {0}")]
    Decode(String),

    #[error("recognition failed: {0}")]
    Recognition(String),
}

#[derive(Debug, Error)]
pub enum CacheStoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("encryption failed")]
    Encrypt,

    #[error("decryption failed: {0}")]
    Decrypt(String),

    #[error("store lock poisoned")]
    Poisoned,
}
