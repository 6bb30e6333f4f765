//! Request Dispatch
//!
//! Walks the ordered candidate list one model at a time, classifying each
//! provider failure as retryable (advance to the next candidate) or fatal
//! (stop immediately), and records the first model that produces usable
//! text in the selection cache.
//!
//! The loop is strictly sequential: speculative parallel calls would burn
//! quota on a shared-budget provider.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{EngineError, Result};
use crate::gemini::{GenerateBackend, GenerateOutcome};
use crate::selector::{SelectionCache, Workload};

/// Classifier decision for one provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Advance to the next candidate.
    Retryable,

    /// Stop and surface this failure.
    Fatal,
}

/// Pluggable retryable-vs-fatal decision.
///
/// The default implementation matches on the provider's error text; swap it
/// for structured codes if the provider ever exposes them.
pub trait ErrorClassifier: Send + Sync {
    fn classify(&self, status: u16, message: &str) -> Verdict;
}

/// Default substring rules observed from the provider.
#[derive(Debug, Clone, Copy)]
pub struct SubstringClassifier {
    workload: Workload,
}

impl SubstringClassifier {
    pub fn new(workload: Workload) -> Self {
        Self { workload }
    }
}

/// The model is listed in the catalog but rejects the operation.
fn is_unsupported_model_error(message: &str) -> bool {
    let m = message.to_lowercase();
    m.contains("is not found for api version") || m.contains("not supported for generatecontent")
}

fn is_audio_modality_error(message: &str) -> bool {
    message
        .to_lowercase()
        .contains("audio input modality is not enabled")
}

impl ErrorClassifier for SubstringClassifier {
    fn classify(&self, status: u16, message: &str) -> Verdict {
        if status == 429 {
            return Verdict::Retryable;
        }
        if is_unsupported_model_error(message) {
            return Verdict::Retryable;
        }
        if self.workload == Workload::Transcription && is_audio_modality_error(message) {
            return Verdict::Retryable;
        }
        Verdict::Fatal
    }
}

/// Provider backoff hint, e.g. "retry in 12.3s".
pub fn parse_retry_seconds(message: &str) -> Option<f64> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = PATTERN.get_or_init(|| {
        Regex::new(r"(?i)retry in\s+([0-9.]+)s").expect("Invalid retry-hint pattern")
    });

    let seconds: f64 = re.captures(message)?.get(1)?.as_str().parse().ok()?;
    seconds.is_finite().then_some(seconds)
}

/// A successful generation.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchResult {
    /// Trimmed output text.
    pub text: String,

    /// Normalized name of the model that produced it.
    pub model: String,
}

/// Iterates candidates against a generation backend.
pub struct Dispatcher<B: GenerateBackend> {
    backend: B,
    cache: SelectionCache,
    classifier: Box<dyn ErrorClassifier>,
}

impl<B: GenerateBackend> Dispatcher<B> {
    pub fn new(backend: B, cache: SelectionCache, classifier: Box<dyn ErrorClassifier>) -> Self {
        Self {
            backend,
            cache,
            classifier,
        }
    }

    /// Dispatcher with the default substring rules for `workload`.
    pub fn with_default_classifier(
        backend: B,
        cache: SelectionCache,
        workload: Workload,
    ) -> Self {
        Self::new(backend, cache, Box::new(SubstringClassifier::new(workload)))
    }

    /// Try each candidate in order with the same payload and return the
    /// first usable result.
    pub async fn dispatch(
        &self,
        api_key: &str,
        candidates: &[String],
        body: &serde_json::Value,
    ) -> Result<DispatchResult> {
        let mut last_status: u16 = 500;
        let mut last_message: Option<String> = None;
        let mut last_model: Option<String> = None;
        let mut retry_after_seconds: Option<f64> = None;

        for model in candidates {
            last_model = Some(model.clone());
            tracing::debug!(model = %model, "attempting candidate");

            match self.backend.generate(api_key, model, body).await? {
                GenerateOutcome::Success { text } => {
                    let text = text.trim().to_string();
                    if text.is_empty() {
                        // An empty result from a working model is a provider
                        // defect, not an availability problem.
                        return Err(EngineError::EmptyGeneration {
                            model: model.clone(),
                        });
                    }

                    self.cache.set(model);
                    tracing::info!(model = %model, "generation succeeded");
                    return Ok(DispatchResult {
                        text,
                        model: model.clone(),
                    });
                }
                GenerateOutcome::Failure { status, message } => {
                    last_status = status;
                    if let Some(hint) = parse_retry_seconds(&message) {
                        retry_after_seconds = Some(hint);
                    }

                    match self.classifier.classify(status, &message) {
                        Verdict::Retryable => {
                            tracing::warn!(
                                model = %model,
                                status,
                                "candidate failed, trying next: {}",
                                message
                            );
                            last_message = Some(message);
                        }
                        Verdict::Fatal => {
                            tracing::error!(model = %model, status, "candidate failed: {}", message);
                            return Err(EngineError::FatalProvider {
                                status,
                                message,
                                model: model.clone(),
                            });
                        }
                    }
                }
            }
        }

        let status = if last_status == 429 { 429 } else { 500 };
        let message = last_message.unwrap_or_else(|| {
            if status == 429 {
                "Quota exceeded for the request.".to_string()
            } else {
                "No supported model accepted the request.".to_string()
            }
        });

        tracing::error!(status, "all candidate models exhausted");
        Err(EngineError::AllCandidatesExhausted {
            status,
            message,
            model: last_model,
            retry_after_seconds,
        })
    }
}
