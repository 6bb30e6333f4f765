//! Model Selection
//!
//! Filters the provider catalog down to models usable for a workload, ranks
//! them by a coarse name heuristic, and applies the operator's pinned
//! override. The resulting ordered candidate list feeds the dispatch loop.

use crate::error::{EngineError, Result};
use crate::gemini::{normalize_model_name, CatalogClient, ModelDescriptor};

pub mod cache;

pub use cache::SelectionCache;

const GENERATE_CONTENT: &str = "generateContent";

/// Which downstream operation the candidates will serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workload {
    /// Question and follow-up generation.
    Interview,

    /// Audio-to-text transcription.
    Transcription,

    /// End-of-interview closing statement.
    Closing,
}

impl Workload {
    /// Transcription keeps the broader candidate set instead of restricting
    /// to the gemini product family.
    fn keeps_all_families(self) -> bool {
        matches!(self, Workload::Transcription)
    }
}

/// Coarse "fast/cheap" vs "capable" heuristic on the model name.
fn score_model_name(name: &str) -> u32 {
    let n = name.to_lowercase();
    if n.contains("flash") {
        return 100;
    }
    if n.contains("pro") {
        return 80;
    }
    50
}

/// Speech-synthesis-only models don't accept our inputs.
fn is_tts_model(name: &str) -> bool {
    name.to_lowercase().contains("tts")
}

/// Applets-style preview models are often not usable with generateContent.
fn is_applets_model(name: &str) -> bool {
    name.to_lowercase().contains("applet")
}

/// Rank catalog entries into an ordered candidate list.
///
/// Equal scores keep catalog order (stable sort). The pinned name, when
/// configured, is normalized and forced to the front exactly once.
pub fn select_candidates(
    models: &[ModelDescriptor],
    workload: Workload,
    pin: Option<&str>,
) -> Result<Vec<String>> {
    let mut candidates: Vec<String> = models
        .iter()
        .filter(|m| {
            m.supported_generation_methods
                .iter()
                .any(|method| method == GENERATE_CONTENT)
        })
        .map(|m| normalize_model_name(&m.name).to_string())
        .filter(|n| !n.is_empty())
        .filter(|n| !is_tts_model(n))
        .filter(|n| !is_applets_model(n))
        .collect();

    if !workload.keeps_all_families() {
        candidates.retain(|n| n.starts_with("gemini"));
    }

    // Duplicate catalog entries collapse to their first occurrence.
    let mut seen = std::collections::HashSet::new();
    candidates.retain(|n| seen.insert(n.clone()));

    candidates.sort_by_key(|n| std::cmp::Reverse(score_model_name(n)));

    apply_pin(candidates, pin)
}

/// Force the pinned name (normalized) to the front, deduplicated.
///
/// An empty list without a pin is `EngineError::NoCandidateModels`: the
/// operator has to pin a model explicitly.
pub fn apply_pin(mut candidates: Vec<String>, pin: Option<&str>) -> Result<Vec<String>> {
    if let Some(pin) = pin {
        let pinned = normalize_model_name(pin).to_string();
        candidates.retain(|m| *m != pinned);
        candidates.insert(0, pinned);
        return Ok(candidates);
    }

    if candidates.is_empty() {
        return Err(EngineError::NoCandidateModels);
    }

    Ok(candidates)
}

/// Resolve the ordered candidate list for one request, consulting the
/// time-bounded cache before the catalog.
pub async fn resolve_candidates(
    catalog: &CatalogClient,
    cache: &SelectionCache,
    api_key: &str,
    workload: Workload,
    pin: Option<&str>,
) -> Result<Vec<String>> {
    if let Some(cached) = cache.get() {
        tracing::debug!(model = %cached, "using cached model selection");
        return apply_pin(vec![cached], pin);
    }

    let models = catalog.list_models(api_key).await?;
    let candidates = select_candidates(&models, workload, pin)?;
    tracing::debug!(count = candidates.len(), "ranked model candidates");
    Ok(candidates)
}
