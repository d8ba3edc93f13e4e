//! The MCP tool surface: `get_headlines`, `search_news`, `get_sources`.
//!
//! Arguments are decoded and validated here, turned into a [`Query`], sent through the shared
//! [`NewsClient`], and the decoded payload is projected and rendered as pretty JSON text.

use crate::client::{NewsClient, Query};
use crate::error::{NewsApiError, Result};
use crate::projection::{ArticleFields, project_articles, project_sources};
use rmcp::model::{CallToolResult, Content, JsonObject, Tool, ToolAnnotations};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Number;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;
const DEFAULT_COUNTRY: &str = "us";
const DEFAULT_LANGUAGE: &str = "en";

const CATEGORIES: [&str; 7] = [
    "business",
    "entertainment",
    "general",
    "health",
    "science",
    "sports",
    "technology",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsTool {
    GetHeadlines,
    SearchNews,
    GetSources,
}

impl NewsTool {
    pub const ALL: [Self; 3] = [Self::GetHeadlines, Self::SearchNews, Self::GetSources];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::GetHeadlines => "get_headlines",
            Self::SearchNews => "search_news",
            Self::GetSources => "get_sources",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::GetHeadlines => "Get top headlines.",
            Self::SearchNews => "Search news articles.",
            Self::GetSources => "List available news sources.",
        }
    }

    /// Upstream path suffix, relative to the base URL.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::GetHeadlines => "/top-headlines",
            Self::SearchNews => "/everything",
            Self::GetSources => "/top-headlines/sources",
        }
    }

    #[must_use]
    pub fn input_schema(self) -> Value {
        let page_size = json!({
            "type": "integer",
            "minimum": 1,
            "maximum": MAX_PAGE_SIZE,
            "default": DEFAULT_PAGE_SIZE
        });
        let category = json!({ "type": "string", "enum": CATEGORIES });

        match self {
            Self::GetHeadlines => json!({
                "type": "object",
                "properties": {
                    "country": {
                        "type": "string",
                        "description": "2-letter country code (e.g. 'us', 'gb')"
                    },
                    "category": category,
                    "query": { "type": "string" },
                    "pageSize": page_size
                }
            }),
            Self::SearchNews => json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string" },
                    "language": { "type": "string", "default": DEFAULT_LANGUAGE },
                    "sortBy": {
                        "type": "string",
                        "enum": ["relevancy", "popularity", "publishedAt"],
                        "default": "publishedAt"
                    },
                    "from": { "type": "string", "description": "Start date (YYYY-MM-DD)" },
                    "to": { "type": "string", "description": "End date (YYYY-MM-DD)" },
                    "pageSize": page_size
                },
                "required": ["query"]
            }),
            Self::GetSources => json!({
                "type": "object",
                "properties": {
                    "category": category,
                    "language": { "type": "string" },
                    "country": { "type": "string" }
                }
            }),
        }
    }

    /// The MCP tool definition advertised in `tools/list`.
    #[must_use]
    pub fn definition(self) -> Tool {
        let schema_obj = self
            .input_schema()
            .as_object()
            .cloned()
            .unwrap_or_else(JsonObject::new);
        let mut tool = Tool::new(self.name(), self.description(), Arc::new(schema_obj));
        tool.annotations = Some(read_only_annotations());
        tool
    }
}

/// All three tools only issue GETs against an external service.
fn read_only_annotations() -> ToolAnnotations {
    ToolAnnotations {
        title: None,
        read_only_hint: Some(true),
        destructive_hint: Some(false),
        idempotent_hint: Some(true),
        open_world_hint: Some(true),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Business,
    Entertainment,
    General,
    Health,
    Science,
    Sports,
    Technology,
}

impl Category {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Business => "business",
            Self::Entertainment => "entertainment",
            Self::General => "general",
            Self::Health => "health",
            Self::Science => "science",
            Self::Sports => "sports",
            Self::Technology => "technology",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum SortBy {
    #[serde(rename = "relevancy")]
    Relevancy,
    #[serde(rename = "popularity")]
    Popularity,
    #[default]
    #[serde(rename = "publishedAt")]
    PublishedAt,
}

impl SortBy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Relevancy => "relevancy",
            Self::Popularity => "popularity",
            Self::PublishedAt => "publishedAt",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadlinesArgs {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub category: Option<Category>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default, deserialize_with = "whole_number")]
    pub page_size: Option<u32>,
}

impl HeadlinesArgs {
    /// `country, category, q, pageSize`; falls back to `country=us` when nothing narrows the
    /// request.
    ///
    /// # Errors
    ///
    /// Returns [`NewsApiError::InvalidArguments`] if `pageSize` is out of range.
    pub fn to_query(&self) -> Result<Query> {
        let page_size = page_size(self.page_size)?;
        let country = non_empty(self.country.as_deref());
        let query = non_empty(self.query.as_deref());

        let mut q = Query::new();
        if country.is_none() && self.category.is_none() && query.is_none() {
            q.set("country", DEFAULT_COUNTRY);
        }
        q.set_opt("country", country)
            .set_opt("category", self.category.map(Category::as_str))
            .set_opt("q", query)
            .set("pageSize", page_size.to_string());
        Ok(q)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchArgs {
    pub query: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub sort_by: Option<SortBy>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default, deserialize_with = "whole_number")]
    pub page_size: Option<u32>,
}

impl SearchArgs {
    /// `q, language, sortBy, from, to, pageSize`.
    ///
    /// # Errors
    ///
    /// Returns [`NewsApiError::InvalidArguments`] if `query` is empty or `pageSize` is out of
    /// range.
    pub fn to_query(&self) -> Result<Query> {
        if self.query.is_empty() {
            return Err(NewsApiError::InvalidArguments(
                "query must not be empty".to_string(),
            ));
        }
        let page_size = page_size(self.page_size)?;
        let language = non_empty(self.language.as_deref()).unwrap_or(DEFAULT_LANGUAGE);
        let sort_by = self.sort_by.unwrap_or_default();

        let mut q = Query::new();
        q.set("q", self.query.as_str())
            .set("language", language)
            .set("sortBy", sort_by.as_str())
            .set_opt("from", self.from.as_deref())
            .set_opt("to", self.to.as_deref())
            .set("pageSize", page_size.to_string());
        Ok(q)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcesArgs {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub category: Option<Category>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl SourcesArgs {
    /// `category, language, country`, each only when given.
    #[must_use]
    pub fn to_query(&self) -> Query {
        let mut q = Query::new();
        q.set_opt("category", self.category.map(Category::as_str))
            .set_opt("language", self.language.as_deref())
            .set_opt("country", self.country.as_deref());
        q
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.is_empty())
}

/// Optional enum argument where `""` means "not provided".
fn empty_as_none<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(v) => serde_json::from_value(v).map(Some).map_err(D::Error::custom),
    }
}

/// `pageSize` as any JSON number with no fractional part (`10` and `10.0` alike). Values beyond
/// `u32` saturate so the range check reports them.
fn whole_number<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(n) = Option::<Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let whole = n.as_u64().or_else(|| {
        n.as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= 0.0)
            .map(|f| f as u64)
    });
    match whole {
        Some(v) => Ok(Some(u32::try_from(v).unwrap_or(u32::MAX))),
        None => Err(D::Error::custom(format!(
            "pageSize must be an integer between 1 and {MAX_PAGE_SIZE}, got {n}"
        ))),
    }
}

fn page_size(value: Option<u32>) -> Result<u32> {
    let size = value.unwrap_or(DEFAULT_PAGE_SIZE);
    if (1..=MAX_PAGE_SIZE).contains(&size) {
        Ok(size)
    } else {
        Err(NewsApiError::InvalidArguments(format!(
            "pageSize must be between 1 and {MAX_PAGE_SIZE}, got {size}"
        )))
    }
}

fn parse_args<T: DeserializeOwned>(tool: NewsTool, arguments: Value) -> Result<T> {
    // A missing arguments object is the same as `{}`.
    let arguments = match arguments {
        Value::Null => Value::Object(JsonObject::new()),
        other => other,
    };
    serde_json::from_value(arguments)
        .map_err(|e| NewsApiError::InvalidArguments(format!("{}: {e}", tool.name())))
}

/// The NewsAPI tool catalogue bound to one [`NewsClient`].
#[derive(Clone)]
pub struct NewsToolSource {
    client: NewsClient,
}

impl NewsToolSource {
    #[must_use]
    pub fn new(client: NewsClient) -> Self {
        Self { client }
    }

    #[must_use]
    pub fn list_tools(&self) -> Vec<Tool> {
        NewsTool::ALL.into_iter().map(NewsTool::definition).collect()
    }

    /// Execute a tool call.
    ///
    /// # Errors
    ///
    /// Returns [`NewsApiError::InvalidArguments`] for an unknown tool or bad arguments (nothing
    /// is sent upstream in that case); any other variant comes from the request pipeline.
    pub async fn call_tool(&self, tool_name: &str, arguments: Value) -> Result<CallToolResult> {
        let tool = NewsTool::from_name(tool_name).ok_or_else(|| {
            NewsApiError::InvalidArguments(format!("Tool not found: {tool_name}"))
        })?;
        info!(tool = tool.name(), "tool call");

        let text = match tool {
            NewsTool::GetHeadlines => {
                let args: HeadlinesArgs = parse_args(tool, arguments)?;
                let payload = self.client.fetch(tool.path(), args.to_query()?).await?;
                render(&project_articles(&payload, ArticleFields::Headlines))
            }
            NewsTool::SearchNews => {
                let args: SearchArgs = parse_args(tool, arguments)?;
                let payload = self.client.fetch(tool.path(), args.to_query()?).await?;
                render(&project_articles(&payload, ArticleFields::Search))
            }
            NewsTool::GetSources => {
                let args: SourcesArgs = parse_args(tool, arguments)?;
                let payload = self.client.fetch(tool.path(), args.to_query()).await?;
                render(&project_sources(&payload))
            }
        };

        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

fn render<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}
