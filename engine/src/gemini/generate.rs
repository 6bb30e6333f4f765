//! generateContent client.

use async_trait::async_trait;

use super::{to_model_path, GenerateBackend, GenerateOutcome};
use crate::error::{EngineError, Result};

/// HTTP implementation of [`GenerateBackend`].
#[derive(Debug, Clone)]
pub struct GenerateClient {
    base_url: String,
    client: reqwest::Client,
}

impl GenerateClient {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }
}

#[async_trait]
impl GenerateBackend for GenerateClient {
    async fn generate(
        &self,
        api_key: &str,
        model: &str,
        body: &serde_json::Value,
    ) -> Result<GenerateOutcome> {
        let url = format!("{}/{}:generateContent", self.base_url, to_model_path(model));

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| EngineError::Network(e.to_string()))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| EngineError::Network(e.to_string()))?;

        if !status.is_success() {
            // Prefer the provider's structured message, fall back to the body.
            let message = serde_json::from_str::<serde_json::Value>(&raw)
                .ok()
                .and_then(|data| {
                    data.get("error")
                        .and_then(|e| e.get("message"))
                        .and_then(|m| m.as_str())
                        .map(str::to_string)
                })
                .unwrap_or(raw);

            return Ok(GenerateOutcome::Failure {
                status: status.as_u16(),
                message,
            });
        }

        let data: serde_json::Value =
            serde_json::from_str(&raw).map_err(|e| EngineError::Parse(e.to_string()))?;

        let parts = data
            .get("candidates")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array());

        // An absent or empty parts list is reported as empty text; the
        // dispatcher treats that as a fatal provider defect.
        let mut text = String::new();
        if let Some(parts) = parts {
            for part in parts {
                if let Some(t) = part.get("text").and_then(|t| t.as_str()) {
                    text.push_str(t);
                }
            }
        }

        Ok(GenerateOutcome::Success { text })
    }
}
