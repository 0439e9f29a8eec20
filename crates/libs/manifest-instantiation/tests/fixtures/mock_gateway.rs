//! Mock ledger gateway for pipeline tests
//!
//! Serves `POST /transaction/committed-details` on a random local port and
//! records every request it receives.
//!
//! # Usage
//!
//! ```ignore
//! let gateway = MockGateway::start(StatusCode::OK, body).await;
//! let client = GatewayClient::new(gateway.base_url())?;
//! // ...
//! gateway.shutdown().await;
//! ```

use axum::extract::State;
use axum::http::{header::CONTENT_TYPE, HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// A request seen by the mock gateway
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub content_type: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct GatewayState {
    status: StatusCode,
    response: Value,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

pub struct MockGateway {
    base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    server_handle: Option<tokio::task::JoinHandle<()>>,
}

impl MockGateway {
    /// Start a gateway that answers every lookup with `status` and `response`
    pub async fn start(status: StatusCode, response: Value) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock gateway");
        let addr = listener.local_addr().expect("mock gateway address");

        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = GatewayState {
            status,
            response,
            requests: requests.clone(),
        };
        let app = Router::new()
            .route("/transaction/committed-details", post(committed_details))
            .with_state(state);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server_handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("mock gateway server");
        });

        Self {
            base_url: format!("http://{}", addr),
            requests,
            shutdown_tx: Some(shutdown_tx),
            server_handle: Some(server_handle),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.server_handle.take() {
            handle.await.expect("mock gateway task");
        }
    }
}

async fn committed_details(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state
        .requests
        .lock()
        .unwrap()
        .push(RecordedRequest { content_type, body });

    (state.status, Json(state.response.clone()))
}
