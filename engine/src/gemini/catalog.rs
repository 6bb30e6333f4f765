//! Model catalog client.

use serde::Deserialize;

use super::ModelDescriptor;
use crate::error::{EngineError, Result};

/// Read-only client for the provider's model listing.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    #[serde(default)]
    models: Vec<ModelDescriptor>,
}

impl CatalogClient {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    /// Fetch the provider's full model list.
    ///
    /// A non-success status is `EngineError::CatalogFetch` carrying the
    /// status and response body; callers treat it as fatal unless a cached
    /// selection can stand in.
    pub async fn list_models(&self, api_key: &str) -> Result<Vec<ModelDescriptor>> {
        let url = format!("{}/models", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("key", api_key)])
            .send()
            .await
            .map_err(|e| EngineError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::CatalogFetch { status, body });
        }

        let data: CatalogResponse = response
            .json()
            .await
            .map_err(|e| EngineError::Parse(e.to_string()))?;

        tracing::debug!(count = data.models.len(), "fetched model catalog");
        Ok(data.models)
    }
}
