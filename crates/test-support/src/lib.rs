use anyhow::Context as _;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// One request as seen by [`MockUpstream`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    /// Raw query string, exactly as sent (empty when absent).
    pub query: String,
    pub user_agent: Option<String>,
    pub received_at: Instant,
}

impl RecordedRequest {
    /// Decoded query pairs in wire order.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        url::form_urlencoded::parse(self.query.as_bytes())
            .into_owned()
            .collect()
    }

    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.query_pairs()
            .into_iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }
}

struct MockState {
    status: StatusCode,
    body: String,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// In-process stand-in for the NewsAPI upstream.
///
/// Answers every request with the same canned status and body and records what it received.
pub struct MockUpstream {
    base_url: String,
    state: Arc<MockState>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<std::io::Result<()>>>,
}

impl MockUpstream {
    /// Bind `127.0.0.1:0` and start serving `status` + `body` (sent as `application/json`).
    ///
    /// # Errors
    ///
    /// Returns an error if the status code is invalid or the listener cannot be bound.
    pub async fn start(status: u16, body: impl Into<String>) -> anyhow::Result<Self> {
        let status = StatusCode::from_u16(status).context("invalid mock status code")?;
        let state = Arc::new(MockState {
            status,
            body: body.into(),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/{*path}", any(canned_handler))
            .with_state(Arc::clone(&state));
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind mock upstream")?;
        let addr = listener.local_addr().context("mock upstream local_addr")?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });
        let handle = tokio::spawn(async move { server.await });

        Ok(Self {
            base_url: format!("http://{addr}"),
            state,
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Snapshot of everything received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().clone()
    }

    /// Stop the server and wait for it to exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the server task panicked or failed.
    pub async fn shutdown(mut self) -> anyhow::Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("mock upstream task join")?
                .context("mock upstream serve")?;
        }
        Ok(())
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn canned_handler(
    State(state): State<Arc<MockState>>,
    method: axum::http::Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    state.requests.lock().push(RecordedRequest {
        method: method.as_str().to_string(),
        path: uri.path().to_string(),
        query: uri.query().unwrap_or("").to_string(),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        received_at: Instant::now(),
    });

    (
        state.status,
        [(header::CONTENT_TYPE, "application/json")],
        state.body.clone(),
    )
        .into_response()
}

/// Canned NewsAPI article payload with `count` fully populated articles.
#[must_use]
pub fn articles_payload(count: usize) -> serde_json::Value {
    let articles: Vec<serde_json::Value> = (0..count)
        .map(|i| {
            serde_json::json!({
                "source": { "id": format!("src-{i}"), "name": format!("Source {i}") },
                "author": format!("Author {i}"),
                "title": format!("Title {i}"),
                "description": format!("Description {i}"),
                "url": format!("https://example.com/{i}"),
                "urlToImage": null,
                "publishedAt": "2024-01-01T00:00:00Z",
                "content": "full content that is never projected"
            })
        })
        .collect();
    serde_json::json!({
        "status": "ok",
        "totalResults": count,
        "articles": articles,
    })
}
