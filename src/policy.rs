//! Policy merging and compiled evaluation.
//!
//! `merge_sources` reduces all sources to one deduplicated domain policy;
//! `CompiledPolicy` turns that policy into matchers with a memoized
//! per-hostname decision cache.

use std::collections::HashSet;
use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

use crate::matcher::DomainMatcher;
use crate::types::{FilterMode, MergedPolicy, PolicyMetadata, Source};

/// Default LRU size for the per-hostname decision memo
pub const DEFAULT_DECISION_CACHE_SIZE: usize = 512;

/// Reduce all sources into one canonical policy.
///
/// Recomputed in full whenever any source changes; no incremental patching.
/// Domain lists are deduplicated preserving first-seen order.
pub fn merge_sources(sources: &[Source]) -> MergedPolicy {
    let block_domains = dedup_domains(sources.iter().flat_map(|s| s.block_domains.iter()));
    let exception_domains = dedup_domains(sources.iter().flat_map(|s| s.exception_domains.iter()));

    MergedPolicy {
        block_domains,
        exception_domains,
        metadata: PolicyMetadata {
            imported_at: sources.iter().map(|s| s.imported_at).max().unwrap_or(0),
            rule_count: sources.iter().map(|s| s.rule_count).sum(),
        },
    }
}

fn dedup_domains<'a>(domains: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for domain in domains {
        if seen.insert(domain.as_str()) {
            out.push(domain.clone());
        }
    }
    out
}

/// A merged policy compiled for matching, with decision memoization.
pub struct CompiledPolicy {
    mode: FilterMode,
    block: Vec<DomainMatcher>,
    exception: Vec<DomainMatcher>,
    cache: Mutex<LruCache<String, bool>>,
}

impl CompiledPolicy {
    pub fn new(policy: &MergedPolicy, mode: FilterMode) -> Self {
        Self::with_cache_size(policy, mode, DEFAULT_DECISION_CACHE_SIZE)
    }

    pub fn with_cache_size(policy: &MergedPolicy, mode: FilterMode, cache_size: usize) -> Self {
        let cache_size = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            mode,
            block: policy.block_domains.iter().map(|d| DomainMatcher::new(d)).collect(),
            exception: policy
                .exception_domains
                .iter()
                .map(|d| DomainMatcher::new(d))
                .collect(),
            cache: Mutex::new(LruCache::new(cache_size)),
        }
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    /// Decide whether a normalized hostname is allowed under this policy.
    pub fn is_hostname_allowed(&self, hostname: &str) -> bool {
        let mut cache = self.cache.lock();

        if let Some(&allowed) = cache.get(hostname) {
            return allowed;
        }

        // Cache miss — compute while holding the lock to prevent stampede;
        // matching is CPU-only.
        let allowed = self.evaluate(hostname);
        cache.put(hostname.to_string(), allowed);
        allowed
    }

    /// Evaluate without memoization.
    ///
    /// A hostname is "listed" when it matches a block domain and no
    /// exception domain overrides it. Whitelist allows listed hostnames
    /// only; blacklist denies them only.
    fn evaluate(&self, hostname: &str) -> bool {
        match self.mode {
            FilterMode::Disabled => true,
            FilterMode::Whitelist => self.is_listed(hostname),
            FilterMode::Blacklist => !self.is_listed(hostname),
        }
    }

    fn is_listed(&self, hostname: &str) -> bool {
        self.block.iter().any(|m| m.matches(hostname))
            && !self.exception.iter().any(|m| m.matches(hostname))
    }

    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }
}
