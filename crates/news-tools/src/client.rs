//! Request pipeline: one authenticated GET against the NewsAPI base endpoint.
//!
//! Every call goes through the same steps:
//! 1. the shared [`Throttle`] (suspends if the previous call was too recent)
//! 2. credential resolution (fails before any network I/O when missing)
//! 3. `apiKey` injection and URL construction
//! 4. the HTTP call and status check
//! 5. JSON decode, returned verbatim (projection is the caller's job)

use crate::error::{NewsApiError, Result};
use crate::rate_gate::{RateGate, Throttle};
use crate::redact::redact_url;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://newsapi.org/v2";

/// Query parameter carrying the credential.
pub const API_KEY_PARAM: &str = "apiKey";

/// Environment variable the credential is read from.
pub const API_KEY_ENV: &str = "NEWSAPI_KEY";

const USER_AGENT: &str = concat!("newsapi-mcp/", env!("CARGO_PKG_VERSION"));

/// Ordered query parameters, built fresh for each call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, replacing an existing value in place or appending otherwise.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.pairs.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.pairs.push((key, value));
        }
        self
    }

    /// Set `key` only when `value` is present and non-empty.
    pub fn set_opt(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        if let Some(v) = value.filter(|v| !v.is_empty()) {
            self.set(key, v);
        }
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Static settings for a [`NewsClient`].
#[derive(Debug, Clone)]
pub struct NewsClientConfig {
    pub base_url: String,
    /// `None` or empty means calls fail with [`NewsApiError::Configuration`].
    pub api_key: Option<String>,
    /// Per-request timeout. `None` leaves the transport default in place.
    pub request_timeout: Option<Duration>,
}

impl Default for NewsClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            request_timeout: None,
        }
    }
}

/// Shared, cheaply clonable NewsAPI client.
#[derive(Clone)]
pub struct NewsClient {
    inner: Arc<NewsClientInner>,
}

struct NewsClientInner {
    base_url: Url,
    api_key: Option<String>,
    request_timeout: Option<Duration>,
    http: Client,
    throttle: Arc<dyn Throttle>,
}

impl NewsClient {
    /// Build a client with its own default [`RateGate`].
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    pub fn new(config: NewsClientConfig) -> Result<Self> {
        Self::with_throttle(config, Arc::new(RateGate::default()))
    }

    /// Build a client that consults `throttle` before every call.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    pub fn with_throttle(config: NewsClientConfig, throttle: Arc<dyn Throttle>) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            NewsApiError::Configuration(format!("Invalid base URL '{}': {e}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(NewsApiError::Configuration(format!(
                "Invalid base URL '{}': not a hierarchical URL",
                config.base_url
            )));
        }

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(NewsApiError::from)?;

        Ok(Self {
            inner: Arc::new(NewsClientInner {
                base_url,
                api_key: config.api_key,
                request_timeout: config.request_timeout,
                http,
                throttle,
            }),
        })
    }

    /// Issue `GET {base}{path}?{query}&apiKey=...` and decode the JSON body.
    ///
    /// # Errors
    ///
    /// - [`NewsApiError::Configuration`] if no credential is configured
    /// - [`NewsApiError::Transport`] if the request could not be sent
    /// - [`NewsApiError::Upstream`] on a non-2xx status
    /// - [`NewsApiError::Decode`] if a 2xx body is not valid JSON
    pub async fn fetch(&self, path: &str, mut query: Query) -> Result<Value> {
        let inner = &self.inner;
        inner.throttle.acquire().await;

        let key = resolve_api_key(inner.api_key.as_deref())?;
        query.set(API_KEY_PARAM, key);
        let url = build_url(&inner.base_url, path, &query);

        debug!(url = %redact_url(&url), "newsapi request");
        let mut request = inner.http.get(url.clone());
        if let Some(t) = inner.request_timeout {
            request = request.timeout(t);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let detail = upstream_error_detail(&bytes);
            warn!(
                status = status.as_u16(),
                url = %redact_url(&url),
                detail = detail.as_deref().unwrap_or(""),
                "newsapi request failed"
            );
            return Err(NewsApiError::Upstream {
                status: status.as_u16(),
                detail,
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| NewsApiError::Decode(e.to_string()))
    }
}

fn resolve_api_key(key: Option<&str>) -> Result<&str> {
    key.filter(|k| !k.is_empty()).ok_or_else(|| {
        NewsApiError::Configuration(format!(
            "{API_KEY_ENV} required. Free at https://newsapi.org/register"
        ))
    })
}

fn build_url(base_url: &Url, path: &str, query: &Query) -> Url {
    let mut url = base_url.clone();
    let joined = format!(
        "{}/{}",
        base_url.path().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    url.set_path(&joined);
    url.set_query(None);

    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (k, v) in query.iter() {
            pairs.append_pair(k, v);
        }
    }
    url
}

/// `code: message` from a NewsAPI error body, when the body has that shape.
fn upstream_error_detail(bytes: &[u8]) -> Option<String> {
    let body: Value = serde_json::from_slice(bytes).ok()?;
    let code = body.get("code").and_then(Value::as_str);
    let message = body.get("message").and_then(Value::as_str);
    match (code, message) {
        (Some(c), Some(m)) => Some(format!("{c}: {m}")),
        (Some(s), None) | (None, Some(s)) => Some(s.to_string()),
        (None, None) => None,
    }
}
