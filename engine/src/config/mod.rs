//! Configuration management
//!
//! Pixie reads its settings from process environment variables at call time,
//! so a pinned model can change between requests without a restart. The only
//! required value is the provider credential, and even that is checked per
//! request rather than at startup.
//!
//! # Variables
//!
//! - **GEMINI_API_KEY**: provider credential (required for interview routes)
//! - **GEMINI_BASE_URL**: provider base URL (defaults to the public endpoint)
//! - **GEMINI_MODEL**: pinned model for question/follow-up generation
//! - **GEMINI_TRANSCRIBE_MODEL**: pinned model for audio transcription
//! - **GEMINI_CLOSING_MODEL**: pinned model for the closing statement
//!   (falls back to GEMINI_MODEL)
//! - **PIXIE_PORT**: server bind port (default 8080)

use std::env;

use crate::error::{EngineError, Result};
use crate::selector::Workload;

/// Public generative-language endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Snapshot of the environment at one call site.
#[derive(Debug, Clone)]
pub struct Config {
    /// Provider credential, if set.
    pub api_key: Option<String>,

    /// Provider base URL.
    pub base_url: String,

    /// Pinned model for question/follow-up generation.
    pub model: Option<String>,

    /// Pinned model for audio transcription.
    pub transcribe_model: Option<String>,

    /// Pinned model for the closing statement.
    pub closing_model: Option<String>,

    /// Server bind port.
    pub port: u16,
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Read the current environment.
    pub fn from_env() -> Self {
        Self {
            api_key: env_non_empty("GEMINI_API_KEY"),
            base_url: env_non_empty("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: env_non_empty("GEMINI_MODEL"),
            transcribe_model: env_non_empty("GEMINI_TRANSCRIBE_MODEL"),
            closing_model: env_non_empty("GEMINI_CLOSING_MODEL"),
            port: env_non_empty("PIXIE_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
        }
    }

    /// The credential, or the configuration error every route surfaces.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or(EngineError::MissingCredential)
    }

    /// Pinned model override for a workload, if configured.
    pub fn pinned_model(&self, workload: Workload) -> Option<&str> {
        match workload {
            Workload::Interview => self.model.as_deref(),
            Workload::Transcription => self.transcribe_model.as_deref(),
            Workload::Closing => self.closing_model.as_deref().or(self.model.as_deref()),
        }
    }
}
