//! Gemini Provider Plumbing
//!
//! This module provides thin clients for the generative-language HTTP API:
//! the model catalog listing and the per-model generateContent call. The
//! GenerateBackend trait is the seam between the dispatcher and the real
//! HTTP call, so retry behavior can be tested without a network.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub mod catalog;
pub mod generate;

pub use catalog::CatalogClient;
pub use generate::GenerateClient;

/// One entry of the provider's model catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    /// Namespaced model name, e.g. `models/gemini-1.5-flash`.
    #[serde(default)]
    pub name: String,

    /// Capabilities the model advertises, e.g. `generateContent`.
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Strips the catalog's `models/` namespace prefix.
pub fn normalize_model_name(name: &str) -> &str {
    name.strip_prefix("models/").unwrap_or(name)
}

/// The generateContent URL expects the namespaced form.
pub fn to_model_path(name: &str) -> String {
    if name.starts_with("models/") {
        name.to_string()
    } else {
        format!("models/{name}")
    }
}

/// Outcome of a single generateContent call against one model.
///
/// `Failure` is a provider-level rejection, not an engine error: the
/// dispatcher decides whether it is retryable.
#[derive(Debug, Clone)]
pub enum GenerateOutcome {
    /// 2xx response; `text` is the concatenation of all returned parts,
    /// untrimmed.
    Success { text: String },

    /// Non-2xx response with the provider's error message (or the raw body
    /// when no structured message is present).
    Failure { status: u16, message: String },
}

/// Seam between the dispatcher and the provider HTTP call.
#[async_trait]
pub trait GenerateBackend: Send + Sync {
    /// Issue one generation request against `model` with the given payload.
    ///
    /// Transport failures (DNS, connect, body read) surface as
    /// `EngineError::Network` and abort the whole dispatch.
    async fn generate(
        &self,
        api_key: &str,
        model: &str,
        body: &serde_json::Value,
    ) -> Result<GenerateOutcome>;
}
