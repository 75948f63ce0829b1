use regex::Regex;
use url::Url;

use crate::error::{FilterError, Result};

/// Domain matching mode
#[derive(Debug, Clone)]
enum MatchMode {
    /// Case-insensitive exact equality with the normalized hostname
    Exact,
    /// Anchored case-insensitive regex compiled from a `*` pattern
    Wildcard(Regex),
}

/// Matches one domain pattern against normalized hostnames.
#[derive(Debug, Clone)]
pub struct DomainMatcher {
    pattern: String,
    mode: MatchMode,
}

impl DomainMatcher {
    /// Create a matcher from a pattern.
    ///
    /// A pattern containing `*` is compiled to an anchored case-insensitive
    /// regex: every regex metacharacter except `*` is escaped, then `*`
    /// translates to `.*`. Patterns without `*` match by case-insensitive
    /// exact equality.
    pub fn new(pattern: &str) -> Self {
        let pattern = pattern.to_lowercase();
        let mode = if pattern.contains('*') {
            let body = regex::escape(&pattern).replace(r"\*", ".*");
            let compiled = Regex::new(&format!("(?i)^{}$", body))
                .expect("wildcard pattern is valid after escaping");
            MatchMode::Wildcard(compiled)
        } else {
            MatchMode::Exact
        };
        Self { pattern, mode }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Check the matcher against a hostname.
    pub fn matches(&self, hostname: &str) -> bool {
        if hostname.is_empty() {
            return false;
        }
        match &self.mode {
            MatchMode::Exact => hostname.eq_ignore_ascii_case(&self.pattern),
            MatchMode::Wildcard(regex) => regex.is_match(hostname),
        }
    }
}

/// Extract and normalize the hostname of a navigated url.
///
/// Normalization strips one leading `www.` label. A url without a parseable
/// hostname is an error; callers on the decision path recover fail-closed.
pub fn extract_hostname(raw_url: &str) -> Result<String> {
    let parsed =
        Url::parse(raw_url).map_err(|e| FilterError::MalformedUrl(format!("{}: {}", raw_url, e)))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| FilterError::MalformedUrl(format!("{}: no host", raw_url)))?;
    let host = host.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    Ok(host.to_string())
}
