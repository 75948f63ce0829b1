use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Reserved source url for hand-entered filter text.
pub const MANUAL_SOURCE_URL: &str = "manual";

/// Rule polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Block,
    Exception,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Block => "block",
            RuleKind::Exception => "exception",
        }
    }
}

/// One parsed filter line.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// Deterministic id derived from kind, domain and line number
    pub id: String,
    pub kind: RuleKind,
    /// Hostname pattern between the rule prefix and suffix markers
    pub domain: String,
    pub options: OptionSet,
    /// Original text, retained for export/round-trip
    pub raw_line: String,
    /// 1-based source line, used in diagnostics
    pub line_number: usize,
}

impl Rule {
    /// Build the deterministic rule id. Re-parsing identical input is
    /// idempotent and diff-friendly.
    pub fn make_id(kind: RuleKind, domain: &str, line_number: usize) -> String {
        format!("{}:{}:{}", kind.as_str(), domain, line_number)
    }
}

/// One malformed filter line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDiagnostic {
    pub line_number: usize,
    pub line: String,
    pub message: String,
}

/// Structured rule options from the `$opt1,opt2,...` segment.
///
/// Unknown tokens never end up here; they are dropped during classification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSet {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domains: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub negated_domains: Vec<String>,
    #[serde(default)]
    pub third_party: bool,
    #[serde(default)]
    pub first_party: bool,
    #[serde(default)]
    pub important: bool,
    #[serde(default)]
    pub match_case: bool,
}

impl OptionSet {
    pub fn is_empty(&self) -> bool {
        *self == OptionSet::default()
    }
}

/// One imported origin of rules.
///
/// Rules are flattened to domain lists rather than stored whole: this bounds
/// the size of persisted policy data independent of filter-list verbosity.
/// Per-rule option fidelity is lost after merge; matching only needs domains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// `"manual"` for hand-entered text, otherwise the fetch url
    pub url: String,
    /// Unix millis of the last (re)load
    pub imported_at: u64,
    pub rule_count: usize,
    pub block_domains: Vec<String>,
    pub exception_domains: Vec<String>,
}

impl Source {
    pub fn is_manual(&self) -> bool {
        self.url == MANUAL_SOURCE_URL
    }
}

/// The reduction of all sources into one deduplicated domain policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedPolicy {
    pub block_domains: Vec<String>,
    pub exception_domains: Vec<String>,
    pub metadata: PolicyMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyMetadata {
    pub imported_at: u64,
    pub rule_count: usize,
}

/// Active filter mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    Disabled,
    Whitelist,
    Blacklist,
}

/// Where a decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionSource {
    Cache,
    Authoritative,
}

/// Outcome of a policy query for one navigated url.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub source: DecisionSource,
}

/// Current unix time in milliseconds.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
