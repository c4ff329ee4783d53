//! Error types for the VYR engine
//!
//! Range problems in biometric data are repaired by the validator and never
//! show up here. These variants cover structural contract violations only.

use thiserror::Error;

/// Errors that can occur while computing state
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Malformed sample: {0}")]
    MalformedSample(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid history: {0}")]
    InvalidHistory(String),

    #[error("FFI error: {0}")]
    Ffi(String),
}

impl EngineError {
    /// Map a serde failure on a sample payload to a structural sample error.
    pub(crate) fn malformed(err: serde_json::Error) -> Self {
        EngineError::MalformedSample(err.to_string())
    }
}
