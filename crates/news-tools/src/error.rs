//! Error types for the NewsAPI tool source.

use thiserror::Error;

/// Main error type for NewsAPI calls and tool execution.
#[derive(Debug, Error)]
pub enum NewsApiError {
    /// Credential missing or otherwise unusable configuration.
    #[error("{0}")]
    Configuration(String),

    /// Upstream answered with a non-success status.
    #[error("NewsAPI {status}{}", fmt_detail(.detail.as_deref()))]
    Upstream { status: u16, detail: Option<String> },

    /// Upstream body was not valid JSON.
    #[error("decode error: {0}")]
    Decode(String),

    /// The request never produced a response (connect, timeout, ...). URL is redacted.
    #[error("http transport error: {0}")]
    Transport(String),

    /// Tool name or arguments rejected before any request was made.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
}

impl NewsApiError {
    /// Upstream HTTP status, if this error came from a non-success response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn fmt_detail(detail: Option<&str>) -> String {
    detail.map(|d| format!(": {d}")).unwrap_or_default()
}

impl From<reqwest::Error> for NewsApiError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(crate::redact::sanitize_reqwest_error(&value))
    }
}

pub type Result<T> = std::result::Result<T, NewsApiError>;
