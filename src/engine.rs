//! Decision gate.
//!
//! Answers, for any navigated url, whether content extraction may run.
//! Consults the time-bounded cache snapshot first and falls back to an
//! authoritative evaluation of the merged policy when the snapshot is
//! stale, absent, or insufficient.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::cache::{classify, CacheSnapshot, CacheState};
use crate::error::Result;
use crate::matcher::{extract_hostname, DomainMatcher};
use crate::policy::CompiledPolicy;
use crate::store::{decode, encode, keys, KeyValueStore};
use crate::types::{now_millis, Decision, DecisionSource, FilterMode, MergedPolicy};

/// Identifies one compiled revision of the persisted policy.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PolicyFingerprint {
    imported_at: u64,
    rule_count: usize,
    mode: FilterMode,
}

/// Evaluates navigated urls against the persisted filter policy.
pub struct FilterEngine {
    store: Arc<dyn KeyValueStore>,
    compiled: RwLock<Option<(PolicyFingerprint, Arc<CompiledPolicy>)>>,
}

impl FilterEngine {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            compiled: RwLock::new(None),
        }
    }

    /// Decide whether `url` is allowed for content extraction.
    ///
    /// A url whose hostname cannot be extracted is denied: a broken url
    /// must never be treated as implicitly allowed.
    pub async fn is_url_allowed(&self, url: &str) -> Result<Decision> {
        let hostname = match extract_hostname(url) {
            Ok(hostname) => hostname,
            Err(error) => {
                warn!(url, %error, "hostname extraction failed, denying");
                return Ok(Decision {
                    allowed: false,
                    source: DecisionSource::Authoritative,
                });
            }
        };

        let read = self
            .store
            .get(&[
                keys::FILTER_CACHE,
                keys::FILTER_MODE,
                keys::MERGED_POLICY,
                keys::RULE_FORMAT,
            ])
            .await?;
        let snapshot: Option<CacheSnapshot> = decode(&read, keys::FILTER_CACHE)?;
        let rule_format: bool = decode(&read, keys::RULE_FORMAT)?.unwrap_or(false);
        let now = now_millis();

        if let CacheState::Fresh { domains, mode } = classify(snapshot.as_ref(), now) {
            if let Some(allowed) = cached_verdict(&domains, mode, rule_format, &hostname) {
                return Ok(Decision {
                    allowed,
                    source: DecisionSource::Cache,
                });
            }
            debug!(%hostname, "snapshot cannot answer rule-based blacklist, deferring");
        }

        let mode: FilterMode = decode(&read, keys::FILTER_MODE)?.unwrap_or_default();
        let merged: MergedPolicy = decode(&read, keys::MERGED_POLICY)?.unwrap_or_default();

        let policy = self.compiled_policy(&merged, mode);
        let allowed = policy.is_hostname_allowed(&hostname);

        // Write back a fresh snapshot so the next read within the TTL hits
        // the cache path again.
        let refreshed = CacheSnapshot::new(merged.block_domains.clone(), now, mode);
        let entries = HashMap::from([(keys::FILTER_CACHE.to_string(), encode(&refreshed)?)]);
        self.store.set(entries).await?;

        Ok(Decision {
            allowed,
            source: DecisionSource::Authoritative,
        })
    }

    /// Reuse the compiled policy while the persisted revision is unchanged.
    fn compiled_policy(&self, merged: &MergedPolicy, mode: FilterMode) -> Arc<CompiledPolicy> {
        let fingerprint = PolicyFingerprint {
            imported_at: merged.metadata.imported_at,
            rule_count: merged.metadata.rule_count,
            mode,
        };

        {
            let guard = self.compiled.read();
            if let Some((current, policy)) = guard.as_ref() {
                if *current == fingerprint {
                    return policy.clone();
                }
            }
        }

        let policy = Arc::new(CompiledPolicy::new(merged, mode));
        *self.compiled.write() = Some((fingerprint, policy.clone()));
        policy
    }
}

/// Answer from the fresh snapshot alone, or `None` when the snapshot is
/// insufficient.
///
/// The snapshot stores block domains only, so in blacklist mode with the
/// rule-based format active (where exception rules exist) it cannot answer
/// and the caller must defer to the authoritative path.
fn cached_verdict(
    domains: &[String],
    mode: FilterMode,
    rule_format: bool,
    hostname: &str,
) -> Option<bool> {
    match mode {
        FilterMode::Disabled => Some(true),
        FilterMode::Whitelist => Some(matches_any(domains, hostname)),
        FilterMode::Blacklist if rule_format => None,
        FilterMode::Blacklist => Some(!matches_any(domains, hostname)),
    }
}

fn matches_any(domains: &[String], hostname: &str) -> bool {
    domains
        .iter()
        .any(|domain| DomainMatcher::new(domain).matches(hostname))
}
