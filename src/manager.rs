//! Source management.
//!
//! Owns the set of imported sources (one manual plus any number of
//! URL-backed ones). Every mutation reads the latest persisted state,
//! mutates it, recomputes the merged policy, regenerates the cache
//! snapshot, and persists everything as one write. Rejected imports leave
//! prior state completely intact.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::builder::compile_rules;
use crate::cache::CacheSnapshot;
use crate::error::{FilterError, Result};
use crate::fetch::TextFetcher;
use crate::policy::merge_sources;
use crate::store::{decode, encode, keys, KeyValueStore};
use crate::types::{now_millis, FilterMode, Source, MANUAL_SOURCE_URL};

/// Whether a save created a new source or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveAction {
    Added,
    Updated,
}

/// Result of a successful save or import.
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub sources: Vec<Source>,
    pub action: SaveAction,
    pub rule_count: usize,
}

/// Result of a successful reload.
#[derive(Debug, Clone)]
pub struct ReloadOutcome {
    pub sources: Vec<Source>,
    pub rule_count: usize,
}

/// Manages imported filter sources against an injected store handle.
pub struct SourceManager {
    store: Arc<dyn KeyValueStore>,
}

impl SourceManager {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Read the current source list.
    pub async fn list_sources(&self) -> Result<Vec<Source>> {
        let read = self.store.get(&[keys::SOURCES]).await?;
        Ok(decode(&read, keys::SOURCES)?.unwrap_or_default())
    }

    /// Parse filter text and save it as a source.
    ///
    /// The source key is `url`, defaulting to `"manual"` for hand-entered
    /// text. Saving an existing key replaces that source in place, so
    /// repeated saves never create duplicates. Any malformed line, or a
    /// text with no valid rules, rejects the whole import.
    pub async fn save_source(&self, text: &str, url: Option<&str>) -> Result<SaveOutcome> {
        let rules = compile_rules(text)?;
        let key = url.unwrap_or(MANUAL_SOURCE_URL);

        let (mut sources, mode) = self.read_state().await?;

        let source = Source {
            url: key.to_string(),
            imported_at: now_millis(),
            rule_count: rules.rule_count(),
            block_domains: rules.block_domains(),
            exception_domains: rules.exception_domains(),
        };
        let rule_count = source.rule_count;

        let action = match sources.iter().position(|s| s.url == key) {
            Some(index) => {
                sources[index] = source;
                SaveAction::Updated
            }
            None => {
                sources.push(source);
                SaveAction::Added
            }
        };

        self.persist(&sources, mode, HashMap::new()).await?;
        info!(url = key, rules = rule_count, ?action, "saved filter source");

        Ok(SaveOutcome {
            sources,
            action,
            rule_count,
        })
    }

    /// Fetch a filter list and save it as a URL-backed source.
    pub async fn import_url(&self, url: &str, fetcher: &dyn TextFetcher) -> Result<SaveOutcome> {
        let text = fetcher.fetch_text(url).await?;
        self.save_source(&text, Some(url)).await
    }

    /// Remove the source at `index`. Out-of-range indices are ignored.
    pub async fn delete_source(&self, index: usize) -> Result<Vec<Source>> {
        let (mut sources, mode) = self.read_state().await?;

        if index >= sources.len() {
            debug!(index, "delete ignored: index out of range");
            return Ok(sources);
        }

        let removed = sources.remove(index);
        self.persist(&sources, mode, HashMap::new()).await?;
        info!(url = %removed.url, "deleted filter source");

        Ok(sources)
    }

    /// Re-fetch and re-parse the URL-backed source at `index`.
    ///
    /// Fails for out-of-range indices and for the manual source (without
    /// invoking the fetcher). A failed fetch or rejected parse leaves the
    /// existing source and merged policy untouched.
    pub async fn reload_source(
        &self,
        index: usize,
        fetcher: &dyn TextFetcher,
    ) -> Result<ReloadOutcome> {
        let (mut sources, mode) = self.read_state().await?;

        let current = sources
            .get(index)
            .ok_or(FilterError::InvalidIndex(index))?;
        if current.is_manual() {
            return Err(FilterError::ImmutableSource);
        }
        let url = current.url.clone();

        let text = fetcher.fetch_text(&url).await?;
        let rules = compile_rules(&text)?;
        let rule_count = rules.rule_count();

        sources[index] = Source {
            url: url.clone(),
            imported_at: now_millis(),
            rule_count,
            block_domains: rules.block_domains(),
            exception_domains: rules.exception_domains(),
        };

        self.persist(&sources, mode, HashMap::new()).await?;
        info!(url = %url, rules = rule_count, "reloaded filter source");

        Ok(ReloadOutcome { sources, rule_count })
    }

    /// Change the active filter mode and regenerate the cache snapshot.
    pub async fn set_mode(&self, mode: FilterMode) -> Result<()> {
        let (sources, _) = self.read_state().await?;
        let extra = HashMap::from([(keys::FILTER_MODE.to_string(), encode(&mode)?)]);
        self.persist(&sources, mode, extra).await?;
        info!(?mode, "filter mode changed");
        Ok(())
    }

    /// Toggle the rule-based filter format flag and regenerate the cache
    /// snapshot.
    pub async fn set_rule_format(&self, enabled: bool) -> Result<()> {
        let (sources, mode) = self.read_state().await?;
        let extra = HashMap::from([(keys::RULE_FORMAT.to_string(), encode(&enabled)?)]);
        self.persist(&sources, mode, extra).await?;
        info!(enabled, "rule format flag changed");
        Ok(())
    }

    async fn read_state(&self) -> Result<(Vec<Source>, FilterMode)> {
        let read = self
            .store
            .get(&[keys::SOURCES, keys::FILTER_MODE])
            .await?;
        let sources = decode(&read, keys::SOURCES)?.unwrap_or_default();
        let mode = decode(&read, keys::FILTER_MODE)?.unwrap_or_default();
        Ok((sources, mode))
    }

    /// Recompute the merged policy and cache snapshot, then write them
    /// together with the sources (and any settings entries) as one set.
    async fn persist(
        &self,
        sources: &[Source],
        mode: FilterMode,
        extra: HashMap<String, Value>,
    ) -> Result<()> {
        let merged = merge_sources(sources);
        let snapshot = CacheSnapshot::new(merged.block_domains.clone(), now_millis(), mode);

        let mut entries = extra;
        entries.insert(keys::SOURCES.to_string(), encode(&sources)?);
        entries.insert(keys::MERGED_POLICY.to_string(), encode(&merged)?);
        entries.insert(keys::FILTER_CACHE.to_string(), encode(&snapshot)?);

        self.store.set(entries).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::MergedPolicy;

    fn manager() -> (SourceManager, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (SourceManager::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_save_persists_all_policy_keys() {
        let (manager, store) = manager();
        manager
            .save_source("||example.com^\n||test.com^", None)
            .await
            .unwrap();

        let snapshot = store.snapshot();
        assert!(snapshot.contains_key(keys::SOURCES));
        assert!(snapshot.contains_key(keys::MERGED_POLICY));
        assert!(snapshot.contains_key(keys::FILTER_CACHE));

        let merged: MergedPolicy =
            serde_json::from_value(snapshot[keys::MERGED_POLICY].clone()).unwrap();
        assert_eq!(merged.block_domains, vec!["example.com", "test.com"]);
        assert_eq!(merged.metadata.rule_count, 2);
    }

    #[tokio::test]
    async fn test_save_action_add_then_update() {
        let (manager, _) = manager();

        let outcome = manager.save_source("||a.com^", None).await.unwrap();
        assert_eq!(outcome.action, SaveAction::Added);
        assert_eq!(outcome.rule_count, 1);

        let outcome = manager.save_source("||b.com^\n||c.com^", None).await.unwrap();
        assert_eq!(outcome.action, SaveAction::Updated);
        assert_eq!(outcome.rule_count, 2);
        assert_eq!(outcome.sources.len(), 1);
        assert_eq!(outcome.sources[0].block_domains, vec!["b.com", "c.com"]);
    }

    #[tokio::test]
    async fn test_set_mode_regenerates_cache_snapshot() {
        let (manager, store) = manager();
        manager.save_source("||a.com^", None).await.unwrap();
        manager.set_mode(FilterMode::Whitelist).await.unwrap();

        let snapshot = store.snapshot();
        let mode: FilterMode = serde_json::from_value(snapshot[keys::FILTER_MODE].clone()).unwrap();
        assert_eq!(mode, FilterMode::Whitelist);

        let cache: CacheSnapshot =
            serde_json::from_value(snapshot[keys::FILTER_CACHE].clone()).unwrap();
        assert_eq!(cache.mode, FilterMode::Whitelist);
        assert_eq!(cache.domains, vec!["a.com"]);
    }
}
