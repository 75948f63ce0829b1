//! PageGate - a domain filter and rule engine for page-capture gating
//!
//! This library decides, for any navigated URL, whether content extraction
//! should run. It provides:
//! - Parsing of uBlock-Origin-style filter text into block/exception rules
//! - Multiple filter sources (manual text or fetched URLs) merged into one
//!   deduplicated domain policy
//! - A time-bounded policy snapshot for fast decisions, with an
//!   authoritative fallback that understands exception rules
//! - Exact and wildcard domain matching
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use pagegate::{FilterEngine, FilterMode, MemoryStore, SourceManager};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let store = Arc::new(MemoryStore::new());
//! let manager = SourceManager::new(store.clone());
//!
//! // Import a filter list and switch to blacklist mode
//! manager
//!     .save_source("||ads.example.com^\n||*.tracker.net^", None)
//!     .await
//!     .unwrap();
//! manager.set_mode(FilterMode::Blacklist).await.unwrap();
//!
//! // Gate navigations
//! let engine = FilterEngine::new(store);
//! let decision = engine
//!     .is_url_allowed("https://ads.example.com/banner")
//!     .await
//!     .unwrap();
//! assert!(!decision.allowed);
//!
//! let decision = engine
//!     .is_url_allowed("https://news.example.org/article")
//!     .await
//!     .unwrap();
//! assert!(decision.allowed);
//! # });
//! ```
//!
//! # Filter-text format
//!
//! One rule per line:
//!
//! | Line | Meaning |
//! |------|---------|
//! | `\|\|example.com^` | Block rule for `example.com` |
//! | `@@\|\|example.com^` | Exception rule for `example.com` |
//! | `\|\|*.cdn.net^$3p,domain=a.com\|~b.com` | Block rule with options |
//! | `! text` | Comment |
//!
//! Recognized options: `domain=`/`~domain=` (`\|`-separated lists, `~`
//! negates an entry), `3p`, `1p`, `important`/`~important`,
//! `match-case`/`~match-case`. Unknown options are ignored so future
//! filter-list syntax keeps parsing.

pub mod builder;
pub mod cache;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod manager;
pub mod matcher;
pub mod options;
pub mod parser;
pub mod policy;
pub mod store;
pub mod types;

// Re-export commonly used items
pub use builder::{build_rules, compile_rules, BuildReport, RuleSet};
pub use cache::{classify, CacheSnapshot, CacheState, CACHE_TTL};
pub use engine::FilterEngine;
pub use error::{FetchErrorKind, FilterError, Result};
pub use fetch::{StaticTextFetcher, TextFetcher};
pub use manager::{ReloadOutcome, SaveAction, SaveOutcome, SourceManager};
pub use matcher::{extract_hostname, DomainMatcher};
pub use options::{classify_token, parse_options, OptionToken};
pub use parser::{is_comment_line, is_empty_line, parse_line, LineOutcome};
pub use policy::{merge_sources, CompiledPolicy, DEFAULT_DECISION_CACHE_SIZE};
pub use store::{KeyValueStore, MemoryStore};
pub use types::{
    Decision, DecisionSource, FilterMode, MergedPolicy, OptionSet, ParseDiagnostic,
    PolicyMetadata, Rule, RuleKind, Source, MANUAL_SOURCE_URL,
};

#[cfg(feature = "http")]
pub use fetch::{HttpTextFetcher, DEFAULT_FETCH_TIMEOUT};
