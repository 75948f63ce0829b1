//! Time-bounded policy snapshot.
//!
//! The snapshot is a derived, expendable artifact: it can always be
//! regenerated from the merged policy and is replaced by any settings
//! write. Freshness is computed lazily on read; stale entries are never
//! read, only treated as absent.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::FilterMode;

/// Snapshot freshness window: 5 minutes
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Persisted snapshot of the merged policy for the fast read path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub domains: Vec<String>,
    /// Unix millis at snapshot time
    pub cached_at: u64,
    pub mode: FilterMode,
}

impl CacheSnapshot {
    pub fn new(domains: Vec<String>, cached_at: u64, mode: FilterMode) -> Self {
        Self {
            domains,
            cached_at,
            mode,
        }
    }

    /// Classify this snapshot at `now_ms`.
    pub fn state(&self, now_ms: u64) -> CacheState {
        if now_ms.saturating_sub(self.cached_at) < CACHE_TTL.as_millis() as u64 {
            CacheState::Fresh {
                domains: self.domains.clone(),
                mode: self.mode,
            }
        } else {
            CacheState::Stale
        }
    }
}

/// Freshness of the persisted snapshot, computed on read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheState {
    Fresh {
        domains: Vec<String>,
        mode: FilterMode,
    },
    Stale,
    Absent,
}

/// Classify an optional stored snapshot at `now_ms`.
pub fn classify(snapshot: Option<&CacheSnapshot>, now_ms: u64) -> CacheState {
    match snapshot {
        Some(snapshot) => snapshot.state(now_ms),
        None => CacheState::Absent,
    }
}
