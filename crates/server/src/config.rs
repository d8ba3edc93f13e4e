use clap::{Parser, ValueEnum};
use newsapi_tools::NewsClientConfig;
use newsapi_tools::client::DEFAULT_BASE_URL;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(
    name = "newsapi-mcp",
    version,
    about = "Expose the NewsAPI REST API as MCP tools over stdio"
)]
pub struct Cli {
    /// NewsAPI key. Only checked when a tool is called.
    #[arg(long, env = "NEWSAPI_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Upstream base URL.
    #[arg(long, env = "NEWSAPI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Minimum spacing between two upstream calls, in milliseconds.
    #[arg(long, env = "NEWSAPI_MIN_INTERVAL_MS", default_value_t = 500)]
    pub min_interval_ms: u64,

    /// Per-request timeout in seconds (0 or unset = transport default).
    #[arg(long, env = "NEWSAPI_REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,

    /// Log filter directive (e.g. `info`, `newsapi_tools=debug`). Logs go to stderr.
    #[arg(long, env = "NEWSAPI_MCP_LOG", default_value = "info")]
    pub log_level: String,

    /// Log output format.
    #[arg(long, env = "NEWSAPI_MCP_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Cli {
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        match self.request_timeout_secs {
            None | Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
        }
    }

    #[must_use]
    pub fn client_config(&self) -> NewsClientConfig {
        NewsClientConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            request_timeout: self.request_timeout(),
        }
    }
}
