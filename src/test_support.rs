//! Throwaway webhook endpoint for tests.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct Hit {
    pub content_type: Option<String>,
    pub body: serde_json::Value,
    pub at: Instant,
}

#[derive(Clone)]
struct FakeState {
    hits: Arc<Mutex<Vec<Hit>>>,
    status: StatusCode,
    reply: &'static str,
    hold: Duration,
}

/// Records every POST to `/hook` and answers with a fixed status and body.
pub struct FakeWebhook {
    pub url: String,
    hits: Arc<Mutex<Vec<Hit>>>,
}

impl FakeWebhook {
    pub async fn start(status: StatusCode, reply: &'static str) -> Self {
        Self::start_slow(status, reply, Duration::ZERO).await
    }

    /// Like `start`, but each hit is recorded immediately and answered only
    /// after `hold`.
    pub async fn start_slow(status: StatusCode, reply: &'static str, hold: Duration) -> Self {
        let hits = Arc::new(Mutex::new(Vec::new()));
        let state = FakeState {
            hits: hits.clone(),
            status,
            reply,
            hold,
        };

        let app = Router::new()
            .route("/hook", post(record))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://127.0.0.1:{port}/hook"),
            hits,
        }
    }

    pub fn hits(&self) -> Vec<Hit> {
        self.hits.lock().unwrap().clone()
    }
}

async fn record(
    State(state): State<FakeState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let hit = Hit {
        content_type: headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string()),
        body: serde_json::from_slice(&body)
            .unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(&body).into())),
        at: Instant::now(),
    };
    state.hits.lock().unwrap().push(hit);
    tokio::time::sleep(state.hold).await;
    (state.status, state.reply)
}

/// A loopback URL nothing listens on.
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}/hook")
}
