//! Fetch collaborator for URL-backed sources.
//!
//! Used only by `reload` and URL-based imports. Failures are classified so
//! callers can distinguish network problems from non-text responses.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::{FetchErrorKind, FilterError, Result};

/// Default fetch timeout for URL-backed sources
#[cfg(feature = "http")]
pub const DEFAULT_FETCH_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Text fetch interface.
#[async_trait]
pub trait TextFetcher: Send + Sync {
    /// Fetch the body of `url` as text.
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// HTTP fetcher with a bounded request timeout.
#[cfg(feature = "http")]
pub struct HttpTextFetcher {
    agent: ureq::Agent,
}

#[cfg(feature = "http")]
impl HttpTextFetcher {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT)
    }

    /// Create a fetcher whose whole request is bounded by `timeout`.
    pub fn with_timeout(timeout: std::time::Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self { agent }
    }
}

#[cfg(feature = "http")]
impl Default for HttpTextFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl TextFetcher for HttpTextFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        use std::io::Read;

        let response = self.agent.get(url).call().map_err(|e| FilterError::Fetch {
            kind: classify_transport_error(&e),
            message: format!("{}: {}", url, e),
        })?;

        let (parts, body) = response.into_parts();

        if let Some(content_type) = parts
            .headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
        {
            if !is_text_content(content_type) {
                return Err(FilterError::Fetch {
                    kind: FetchErrorKind::NonText,
                    message: format!("{}: unexpected content type '{}'", url, content_type),
                });
            }
        }

        let mut text = String::new();
        body.into_reader()
            .read_to_string(&mut text)
            .map_err(|e| FilterError::Fetch {
                kind: if e.kind() == std::io::ErrorKind::InvalidData {
                    FetchErrorKind::NonText
                } else {
                    FetchErrorKind::Network
                },
                message: format!("{}: {}", url, e),
            })?;

        Ok(text)
    }
}

#[cfg(feature = "http")]
fn classify_transport_error(error: &ureq::Error) -> FetchErrorKind {
    match error {
        ureq::Error::Timeout(_) => FetchErrorKind::Timeout,
        _ => FetchErrorKind::Network,
    }
}

#[cfg(feature = "http")]
fn is_text_content(content_type: &str) -> bool {
    let content_type = content_type.trim().to_ascii_lowercase();
    content_type.starts_with("text/")
}

/// Fetcher with predefined url-to-text mappings, for tests.
#[derive(Default)]
pub struct StaticTextFetcher {
    mappings: HashMap<String, String>,
}

impl StaticTextFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mapping and return self for chaining.
    pub fn with_mapping(mut self, url: impl Into<String>, text: impl Into<String>) -> Self {
        self.mappings.insert(url.into(), text.into());
        self
    }
}

#[async_trait]
impl TextFetcher for StaticTextFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        self.mappings
            .get(url)
            .cloned()
            .ok_or_else(|| FilterError::Fetch {
                kind: FetchErrorKind::Network,
                message: format!("{}: no mapping", url),
            })
    }
}
