//! Upstream search client.
//!
//! [`SearchProvider`] is the seam the orchestrator depends on; [`SerpApiClient`]
//! is the one concrete integration. Everything provider specific (endpoint,
//! credential placement, field names) stays in this file.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::data_models::{SearchResult, host_or_raw};
use crate::error::{Result, SearchError};

pub const SERPAPI_URL: &str = "https://serpapi.com";
pub const SERP_API_KEY_VAR: &str = "SERP_API_KEY";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Runs one query and returns results in provider order.
    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchResult>>;

    /// Whether a credential is currently available. Diagnostics only.
    fn is_configured(&self) -> bool {
        true
    }
}

/// Where the API key comes from. Resolved on every call.
#[derive(Debug, Clone)]
pub enum Credential {
    Env(String),
    Fixed(Option<String>),
}

impl Credential {
    pub fn from_env_var(name: &str) -> Self {
        Credential::Env(name.to_string())
    }

    /// Raw value, `None` when unset or empty.
    pub fn resolve(&self) -> Option<String> {
        let raw = match self {
            Credential::Env(name) => std::env::var(name).ok(),
            Credential::Fixed(value) => value.clone(),
        };
        raw.filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct SerpResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    title: Option<String>,
    link: Option<String>,
    snippet: Option<String>,
    displayed_link: Option<String>,
    source: Option<String>,
    date: Option<String>,
}

impl OrganicResult {
    fn into_search_result(self) -> Option<SearchResult> {
        let link = self.link.filter(|link| !link.is_empty())?;
        let host = host_or_raw(&link);
        Some(SearchResult {
            title: self.title.unwrap_or_default(),
            snippet: self.snippet.unwrap_or_default(),
            display_link: self
                .displayed_link
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| host.clone()),
            source: self.source.filter(|s| !s.is_empty()).unwrap_or(host),
            date: self.date,
            link,
        })
    }
}

pub struct SerpApiClient {
    http: reqwest::Client,
    base_url: String,
    credential: Credential,
    timeout: Duration,
}

impl SerpApiClient {
    pub fn new(credential: Credential) -> Result<Self> {
        let http = reqwest::Client::builder().build().map_err(|e| {
            SearchError::Configuration(format!("failed to build HTTP client: {e}"))
        })?;
        Ok(Self {
            http,
            base_url: SERPAPI_URL.to_string(),
            credential,
            timeout: REQUEST_TIMEOUT,
        })
    }

    /// Client reading `SERP_API_KEY` from the environment at call time.
    pub fn from_env() -> Result<Self> {
        Self::new(Credential::from_env_var(SERP_API_KEY_VAR))
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> Result<String> {
        let Some(raw) = self.credential.resolve() else {
            tracing::error!("{SERP_API_KEY_VAR} is not configured");
            return Err(SearchError::Configuration(format!(
                "{SERP_API_KEY_VAR} is not configured"
            )));
        };
        let trimmed = raw.trim();
        tracing::debug!(
            key_len = raw.len(),
            key_prefix = %key_prefix(trimmed),
            had_whitespace = raw.len() != trimmed.len(),
            "search credential check"
        );
        if trimmed.is_empty() {
            return Err(SearchError::Configuration(format!(
                "{SERP_API_KEY_VAR} is blank"
            )));
        }
        if raw.len() != trimmed.len() {
            tracing::warn!("search API key has surrounding whitespace, trimming");
        }
        Ok(trimmed.to_string())
    }
}

#[async_trait]
impl SearchProvider for SerpApiClient {
    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchResult>> {
        let api_key = self.api_key()?;
        let url = format!("{}/search", self.base_url);

        tracing::info!(query, num_results, "calling SERP API");

        let response = self
            .http
            .get(&url)
            .timeout(self.timeout)
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("api_key", api_key.as_str()),
                ("num", num_results.to_string().as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                // without_url keeps the api_key query param out of the logs
                tracing::error!(error = %e.without_url(), "no response from SERP API");
                SearchError::upstream(None, "SERP API did not respond")
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let upstream_error = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string));

            if status == reqwest::StatusCode::UNAUTHORIZED {
                tracing::error!(
                    key_prefix = %key_prefix(&api_key),
                    "SERP API rejected the credential (401 invalid API key)"
                );
            } else {
                tracing::error!(
                    status = status.as_u16(),
                    body = %body,
                    "SERP API request failed"
                );
            }

            return Err(SearchError::upstream(
                Some(status.as_u16()),
                format!(
                    "SERP API returned {}: {}",
                    status.as_u16(),
                    upstream_error.as_deref().unwrap_or("Unknown error")
                ),
            ));
        }

        let body: SerpResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e.without_url(), "unreadable SERP API body");
            SearchError::upstream(Some(status.as_u16()), "SERP API returned an unreadable body")
        })?;

        if let Some(message) = &body.error {
            tracing::warn!(
                message = %message,
                "SERP API reported an error with a success status"
            );
        }

        let results: Vec<SearchResult> = body
            .organic_results
            .into_iter()
            .filter_map(OrganicResult::into_search_result)
            .collect();

        tracing::info!(count = results.len(), "SERP API success");
        Ok(results)
    }

    fn is_configured(&self) -> bool {
        self.credential
            .resolve()
            .is_some_and(|key| !key.trim().is_empty())
    }
}

fn key_prefix(key: &str) -> String {
    let prefix: String = key.chars().take(4).collect();
    format!("{prefix}...")
}

#[test]
fn test_organic_result_fallbacks() {
    let raw = OrganicResult {
        title: None,
        link: Some("https://example.org/a?b=c".into()),
        snippet: Some("snippet".into()),
        displayed_link: None,
        source: None,
        date: None,
    };
    let result = raw.into_search_result().unwrap();
    assert_eq!(result.title, "");
    assert_eq!(result.source, "example.org");
    assert_eq!(result.display_link, "example.org");
    assert!(result.date.is_none());

    let no_link = OrganicResult {
        title: Some("t".into()),
        link: None,
        snippet: None,
        displayed_link: None,
        source: None,
        date: None,
    };
    assert!(no_link.into_search_result().is_none());
}

#[test]
fn test_key_prefix_is_short() {
    assert_eq!(key_prefix("abcdefghijkl"), "abcd...");
    assert_eq!(key_prefix("ab"), "ab...");
}
