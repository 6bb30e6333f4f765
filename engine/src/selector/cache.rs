use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

/// How long a recorded selection stays valid.
pub const SELECTION_TTL_MS: u64 = 60 * 60 * 1000;

#[derive(Debug, Clone)]
struct CachedSelection {
    name: String,
    fetched_at_ms: u64,
}

/// A single-slot, time-bounded memo of the last model that worked.
///
/// Shared by handle across concurrently-handled requests. Writes are
/// last-writer-wins on the single slot; staleness only affects selection
/// quality, never correctness, so no coordination beyond the lock is needed.
#[derive(Clone)]
pub struct SelectionCache {
    slot: Arc<RwLock<Option<CachedSelection>>>,
}

impl SelectionCache {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(RwLock::new(None)),
        }
    }

    /// The cached name, if one was recorded within the TTL.
    pub fn get(&self) -> Option<String> {
        self.get_at(now_ms())
    }

    /// Record a working model name, overwriting unconditionally.
    pub fn set(&self, name: &str) {
        self.set_at(name, now_ms());
    }

    /// TTL check against an explicit clock reading.
    pub fn get_at(&self, now_ms: u64) -> Option<String> {
        let slot = self.slot.read().expect("SelectionCache lock poisoned");
        slot.as_ref()
            .filter(|s| now_ms.saturating_sub(s.fetched_at_ms) < SELECTION_TTL_MS)
            .map(|s| s.name.clone())
    }

    /// Overwrite the slot and reset its timestamp.
    pub fn set_at(&self, name: &str, now_ms: u64) {
        let mut slot = self.slot.write().expect("SelectionCache lock poisoned");
        *slot = Some(CachedSelection {
            name: name.to_string(),
            fetched_at_ms: now_ms,
        });
    }
}

impl Default for SelectionCache {
    fn default() -> Self {
        Self::new()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
