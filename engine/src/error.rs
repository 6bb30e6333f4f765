//! Error types and handling
//!
//! This module provides the error types used throughout the Pixie engine.
//! Retryable provider failures never appear here: the dispatcher recovers
//! them internally by advancing to the next candidate model. Everything in
//! this enum propagates to the HTTP boundary.

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Main engine error type
#[derive(Debug, Error)]
pub enum EngineError {
    /// The provider credential is not configured.
    #[error("Missing GEMINI_API_KEY in environment.")]
    MissingCredential,

    /// The provider's model listing responded with a non-success status.
    #[error("Failed to list models ({status}): {body}")]
    CatalogFetch { status: u16, body: String },

    /// No usable model survived filtering and no pin is configured.
    #[error("No generateContent-capable models found. Set GEMINI_MODEL explicitly.")]
    NoCandidateModels,

    /// The provider rejected a candidate with a non-retryable error.
    #[error("{message}")]
    FatalProvider {
        status: u16,
        message: String,
        model: String,
    },

    /// The provider reported success but returned no usable text.
    #[error("Model {model} returned empty text.")]
    EmptyGeneration { model: String },

    /// Every candidate model was tried and none produced a result.
    #[error("{message}")]
    AllCandidatesExhausted {
        status: u16,
        message: String,
        model: Option<String>,
        retry_after_seconds: Option<f64>,
    },

    /// Transport-level failure talking to the provider.
    #[error("Network error: {0}")]
    Network(String),

    /// The provider returned a body we could not interpret.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl EngineError {
    /// HTTP status to surface at the API boundary.
    ///
    /// 429 is preserved so callers can back off; everything else collapses
    /// to 500.
    pub fn http_status(&self) -> u16 {
        match self {
            EngineError::FatalProvider { status, .. }
            | EngineError::AllCandidatesExhausted { status, .. }
                if *status == 429 =>
            {
                429
            }
            _ => 500,
        }
    }

    /// Provider-supplied backoff hint in seconds, when one was observed.
    pub fn retry_after_seconds(&self) -> Option<f64> {
        match self {
            EngineError::AllCandidatesExhausted {
                retry_after_seconds,
                ..
            } => *retry_after_seconds,
            _ => None,
        }
    }

    /// The model the failure is attributed to, when known.
    pub fn model(&self) -> Option<&str> {
        match self {
            EngineError::FatalProvider { model, .. } | EngineError::EmptyGeneration { model } => {
                Some(model)
            }
            EngineError::AllCandidatesExhausted { model, .. } => model.as_deref(),
            _ => None,
        }
    }
}
