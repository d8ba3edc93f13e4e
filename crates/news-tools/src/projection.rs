//! Field projection over decoded NewsAPI payloads.
//!
//! Upstream payloads are kept as untyped JSON. Every accessor here is total: a missing key, a
//! wrong container type or a non-string free-text field yields `None`, which serializes as an
//! absent field. Upstream `null` on a plain field is passed through as `null`.

use serde::Serialize;
use serde_json::Value;

/// Maximum characters kept from an article description.
pub const ARTICLE_DESCRIPTION_MAX_CHARS: usize = 200;

/// Maximum characters kept from a source description.
pub const SOURCE_DESCRIPTION_MAX_CHARS: usize = 150;

/// Which article fields a tool exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleFields {
    /// `get_headlines`: includes `author`.
    Headlines,
    /// `search_news`: no `author`.
    Search,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<Value>,
}

/// `{ total, articles }` as returned by the article tools.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleDigest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub articles: Option<Vec<ArticleSummary>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<Value>,
}

/// Project an `/top-headlines` or `/everything` payload.
#[must_use]
pub fn project_articles(payload: &Value, fields: ArticleFields) -> ArticleDigest {
    let articles = payload
        .get("articles")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|a| project_article(a, fields))
                .collect()
        });

    ArticleDigest {
        total: field(payload, "totalResults"),
        articles,
    }
}

#[must_use]
pub fn project_article(article: &Value, fields: ArticleFields) -> ArticleSummary {
    ArticleSummary {
        title: field(article, "title"),
        source: article.get("source").and_then(|s| field(s, "name")),
        author: match fields {
            ArticleFields::Headlines => field(article, "author"),
            ArticleFields::Search => None,
        },
        description: truncated_text(article, "description", ARTICLE_DESCRIPTION_MAX_CHARS),
        url: field(article, "url"),
        published_at: field(article, "publishedAt"),
    }
}

/// Project a `/top-headlines/sources` payload. A payload without a `sources` array yields an
/// empty list.
#[must_use]
pub fn project_sources(payload: &Value) -> Vec<SourceSummary> {
    payload
        .get("sources")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(project_source).collect())
        .unwrap_or_default()
}

#[must_use]
pub fn project_source(source: &Value) -> SourceSummary {
    SourceSummary {
        id: field(source, "id"),
        name: field(source, "name"),
        description: truncated_text(source, "description", SOURCE_DESCRIPTION_MAX_CHARS),
        url: field(source, "url"),
        category: field(source, "category"),
        language: field(source, "language"),
        country: field(source, "country"),
    }
}

/// Keep the first `max_chars` characters; no ellipsis, no word boundaries.
#[must_use]
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

fn field(v: &Value, key: &str) -> Option<Value> {
    v.get(key).cloned()
}

fn truncated_text(v: &Value, key: &str, max_chars: usize) -> Option<String> {
    v.get(key)
        .and_then(Value::as_str)
        .map(|s| truncate_chars(s, max_chars))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truncation_boundary_is_exact() {
        let exact = "a".repeat(200);
        assert_eq!(truncate_chars(&exact, 200), exact);

        let over = "b".repeat(201);
        assert_eq!(truncate_chars(&over, 200), "b".repeat(200));
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let s = "é".repeat(151);
        let out = truncate_chars(&s, 150);
        assert_eq!(out.chars().count(), 150);
        assert_eq!(out, "é".repeat(150));
    }

    #[test]
    fn article_description_is_cut_at_200() {
        let article = json!({ "description": "x".repeat(201) });
        let summary = project_article(&article, ArticleFields::Headlines);
        assert_eq!(summary.description.as_deref(), Some("x".repeat(200).as_str()));
    }

    #[test]
    fn source_description_is_cut_at_150() {
        let source = json!({ "id": "bbc-news", "description": "y".repeat(300) });
        let summary = project_source(&source);
        assert_eq!(summary.description.map(|d| d.len()), Some(150));
    }

    #[test]
    fn headlines_projection_selects_fields_and_flattens_source_name() {
        let payload = json!({
            "status": "ok",
            "totalResults": 1,
            "articles": [{
                "source": { "id": "wired", "name": "Wired" },
                "author": "Jane",
                "title": "T",
                "description": "D",
                "url": "https://example.com/a",
                "urlToImage": "https://example.com/a.png",
                "publishedAt": "2024-05-01T10:00:00Z",
                "content": "long"
            }]
        });
        let out = serde_json::to_value(project_articles(&payload, ArticleFields::Headlines))
            .expect("serialize");
        assert_eq!(
            out,
            json!({
                "total": 1,
                "articles": [{
                    "title": "T",
                    "source": "Wired",
                    "author": "Jane",
                    "description": "D",
                    "url": "https://example.com/a",
                    "publishedAt": "2024-05-01T10:00:00Z"
                }]
            })
        );
    }

    #[test]
    fn search_projection_omits_author() {
        let article = json!({ "author": "Jane", "title": "T" });
        let out = serde_json::to_value(project_article(&article, ArticleFields::Search))
            .expect("serialize");
        assert_eq!(out, json!({ "title": "T" }));
    }

    #[test]
    fn missing_nested_fields_degrade_to_absent() {
        let payload = json!({
            "articles": [
                {},
                { "source": null, "description": null, "author": null },
                { "source": "not-an-object", "description": 42 },
                "not-an-object"
            ]
        });
        let out = serde_json::to_value(project_articles(&payload, ArticleFields::Headlines))
            .expect("serialize");
        assert_eq!(
            out,
            json!({ "articles": [{}, { "author": null }, {}, {}] })
        );
    }

    #[test]
    fn payload_without_articles_yields_empty_digest() {
        let digest = project_articles(&json!({ "status": "ok" }), ArticleFields::Search);
        assert_eq!(serde_json::to_value(digest).expect("serialize"), json!({}));

        let digest = project_articles(&json!("garbage"), ArticleFields::Search);
        assert!(digest.total.is_none());
        assert!(digest.articles.is_none());
    }

    #[test]
    fn payload_without_sources_yields_empty_list() {
        assert!(project_sources(&json!({ "status": "ok" })).is_empty());
        assert!(project_sources(&json!({ "sources": {} })).is_empty());
    }

    #[test]
    fn projection_is_idempotent() {
        let payload = json!({
            "totalResults": 2,
            "articles": [
                { "title": "a", "description": "z".repeat(500), "source": { "name": "S" } },
                { "title": "b" }
            ]
        });
        let first = project_articles(&payload, ArticleFields::Headlines);
        let second = project_articles(&payload, ArticleFields::Headlines);
        assert_eq!(first, second);
        assert_eq!(
            payload["articles"][0]["description"].as_str().map(str::len),
            Some(500)
        );
    }
}
