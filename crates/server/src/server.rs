//! rmcp server handler exposing the NewsAPI tools.

use newsapi_tools::{NewsApiError, NewsToolSource};
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, Implementation, ListToolsResult,
    PaginatedRequestParams, ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData, RoleServer, ServerHandler};
use serde_json::Value;
use tracing::warn;

pub const SERVER_NAME: &str = "newsapi-mcp";

const INSTRUCTIONS: &str = "News tools backed by NewsAPI (newsapi.org). Use get_headlines for \
current top stories, search_news for full-text search across articles, and get_sources to \
discover publishers. Calls are rate limited client-side.";

#[derive(Clone)]
pub struct NewsServer {
    tools: NewsToolSource,
}

impl NewsServer {
    #[must_use]
    pub fn new(tools: NewsToolSource) -> Self {
        Self { tools }
    }
}

impl ServerHandler for NewsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Implementation::from_build_env()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            tools: self.tools.list_tools(),
            ..Default::default()
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let arguments = request.arguments.map_or(Value::Null, Value::Object);
        match self.tools.call_tool(&request.name, arguments).await {
            Ok(result) => Ok(result),
            Err(e) => map_tool_error(&request.name, e),
        }
    }
}

/// Bad input is a protocol error; everything the pipeline reports is a tool-execution failure.
///
/// Upstream status failures are already logged by the pipeline with the redacted URL.
fn map_tool_error(tool: &str, e: NewsApiError) -> Result<CallToolResult, ErrorData> {
    match e {
        NewsApiError::InvalidArguments(msg) => Err(ErrorData::invalid_params(msg, None)),
        other @ NewsApiError::Upstream { .. } => {
            Ok(CallToolResult::error(vec![Content::text(other.to_string())]))
        }
        other => {
            warn!(tool = %tool, error = %other, "tool call failed");
            Ok(CallToolResult::error(vec![Content::text(other.to_string())]))
        }
    }
}
