use thiserror::Error;

use crate::types::ParseDiagnostic;

/// Classifies fetch failures for programmatic matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Network-level failure (DNS, connect, CSP-blocked, TLS, ...)
    Network,
    /// Request exceeded the configured timeout
    Timeout,
    /// Response was not text content
    NonText,
}

/// Filter engine error types
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("{}", syntax_summary(.diagnostics))]
    Syntax { diagnostics: Vec<ParseDiagnostic> },

    #[error("filter text contains no valid rules")]
    EmptyPolicy,

    #[error("source index {0} out of range")]
    InvalidIndex(usize),

    #[error("manual sources cannot be reloaded")]
    ImmutableSource,

    #[error("fetch failed: {message}")]
    Fetch {
        kind: FetchErrorKind,
        message: String,
    },

    /// Hostname extraction failure during matching. Never escapes the
    /// decision path: the engine recovers with a fail-closed denial.
    #[error("malformed url: {0}")]
    MalformedUrl(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FilterError>;

fn syntax_summary(diagnostics: &[ParseDiagnostic]) -> String {
    match diagnostics.first() {
        Some(first) => format!(
            "{} malformed filter line(s), first at line {}: {}",
            diagnostics.len(),
            first.line_number,
            first.message
        ),
        None => "malformed filter text".to_string(),
    }
}
