//! NewsAPI request pipeline and MCP tool surface.
//!
//! This crate is used by:
//! - `newsapi-mcp` (the stdio MCP server binary)
//!
//! It contains no transport or process bootstrap logic; the server crate owns those.

pub mod client;
pub mod error;
pub mod projection;
pub mod rate_gate;
pub mod redact;
pub mod tools;

pub use client::{NewsClient, NewsClientConfig, Query};
pub use error::{NewsApiError, Result};
pub use rate_gate::{RateGate, Throttle};
pub use tools::{NewsTool, NewsToolSource};
