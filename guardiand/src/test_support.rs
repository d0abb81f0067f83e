//! Shared fixtures for unit tests: an in-process chat-completions backend.

use crate::config::InsightsConfig;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
struct BackendState {
    status: StatusCode,
    body: Value,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

struct SeenRequest {
    authorization: Option<String>,
    body: Value,
}

pub struct MockBackend {
    addr: SocketAddr,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl MockBackend {
    /// Serve `body` with `status` for every completion request.
    pub async fn start(status: StatusCode, body: Value) -> Self {
        async fn completions_handler(
            State(state): State<BackendState>,
            headers: HeaderMap,
            Json(request): Json<Value>,
        ) -> impl IntoResponse {
            let authorization = headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            state.seen.lock().await.push(SeenRequest {
                authorization,
                body: request,
            });
            (state.status, Json(state.body.clone()))
        }

        let seen = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route("/v1/chat/completions", post(completions_handler))
            .with_state(BackendState {
                status,
                body,
                seen: Arc::clone(&seen),
            });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app.into_make_service()).await {
                eprintln!("mock backend error: {err}");
            }
        });
        Self { addr, seen }
    }

    pub fn insights_config(&self) -> InsightsConfig {
        InsightsConfig {
            endpoint: format!("http://{}/v1/chat/completions", self.addr),
            api_key: Some("test-key".to_string()),
            timeout_ms: 2_000,
            ..InsightsConfig::default()
        }
    }

    pub async fn last_request(&self) -> Option<Value> {
        self.seen.lock().await.last().map(|r| r.body.clone())
    }

    pub async fn last_authorization(&self) -> Option<String> {
        self.seen
            .lock()
            .await
            .last()
            .and_then(|r| r.authorization.clone())
    }

    pub async fn request_count(&self) -> usize {
        self.seen.lock().await.len()
    }
}

pub fn tool_call_completion(summary: &str, recommendation: &str) -> Value {
    let arguments = json!({ "summary": summary, "recommendation": recommendation }).to_string();
    json!({
        "choices": [{
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {
                        "name": "provide_health_insights",
                        "arguments": arguments
                    }
                }]
            }
        }]
    })
}
