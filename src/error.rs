//! Error types for claim accessors.
//!
//! Client failures pass through untouched; the only local errors come from
//! decoding payloads or from inputs missing a field the call needs.

use thiserror::Error;

/// Error type for storage operations
#[derive(Error, Debug)]
pub enum Error {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// Missing required field in resource
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Payload did not match the expected resource schema
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Check if this error indicates a not-found condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Kube(kube::Error::Api(e)) if e.code == 404)
    }
}

/// Result type alias for storage operations
pub type Result<T> = std::result::Result<T, Error>;
