//! HTTP transport: REST endpoints plus a JSON-RPC endpoint at `POST /mcp`.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::actions::{self, ActionOutcome, OPEN_FILE_FAILED, OPEN_MAGIT_FAILED};
use crate::client::ClientRunner;
use crate::error::{BridgeError, ErrorKind, SERVER_NOT_RUNNING};
use crate::server;
use crate::tools::ToolRouter;

/// Shared handler state.
pub struct AppState<R> {
    router: Arc<ToolRouter<R>>,
}

impl<R> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            router: Arc::clone(&self.router),
        }
    }
}

impl<R> AppState<R> {
    pub fn new(router: ToolRouter<R>) -> Self {
        Self {
            router: Arc::new(router),
        }
    }
}

/// JSON envelope shared by every REST endpoint.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
}

pub type ApiResponse = (StatusCode, Json<Envelope>);

#[derive(Debug, Default, Deserialize)]
pub struct OpenInBufferBody {
    #[serde(default)]
    pub file_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OpenMagitBody {
    #[serde(default)]
    pub repo_path: Option<String>,
}

/// Build the application router with permissive CORS.
pub fn app<R: ClientRunner + 'static>(state: AppState<R>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/tools/check-server", get(check_server::<R>))
        .route("/api/tools/open-in-buffer", post(open_in_buffer::<R>))
        .route("/api/tools/open-changes-in-magit", post(open_magit::<R>))
        .route("/mcp", post(mcp::<R>))
        .layer(cors)
        .with_state(state)
}

/// Serve HTTP on `addr` until `shutdown` resolves.
pub async fn serve_http<R, F>(addr: SocketAddr, router: ToolRouter<R>, shutdown: F) -> Result<()>
where
    R: ClientRunner + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "MCP server listening on http://{addr}/mcp");

    axum::serve(listener, app(AppState::new(router)))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")?;

    info!("HTTP server stopped");
    Ok(())
}

/// GET /health - the bridge process itself is up.
pub async fn health() -> ApiResponse {
    (
        StatusCode::OK,
        Json(Envelope {
            status: "ok",
            message: "MCP server is running".to_owned(),
            data: None,
            error: None,
        }),
    )
}

/// GET /api/tools/check-server - probe the Emacs server.
pub async fn check_server<R: ClientRunner>(State(state): State<AppState<R>>) -> ApiResponse {
    let running = state.router.executor().check().await;
    let message = if running {
        "Emacs server is running".to_owned()
    } else {
        SERVER_NOT_RUNNING.to_owned()
    };
    (
        StatusCode::OK,
        Json(Envelope {
            status: "success",
            message,
            data: Some(serde_json::json!({ "running": running })),
            error: None,
        }),
    )
}

/// POST /api/tools/open-in-buffer - body `{ "file_path": "..." }`.
pub async fn open_in_buffer<R: ClientRunner>(
    State(state): State<AppState<R>>,
    body: Bytes,
) -> ApiResponse {
    let body: OpenInBufferBody = match parse_body(&body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let Some(file_path) = body.file_path.filter(|p| !p.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(Envelope {
                status: "error",
                message: "Missing required parameter: file_path".to_owned(),
                data: None,
                error: None,
            }),
        );
    };

    let outcome = actions::open_in_buffer(state.router.executor(), Some(&file_path)).await;
    action_response(outcome, OPEN_FILE_FAILED)
}

/// POST /api/tools/open-changes-in-magit - body `{ "repo_path": "..." }`, optional.
pub async fn open_magit<R: ClientRunner>(
    State(state): State<AppState<R>>,
    body: Bytes,
) -> ApiResponse {
    let body: OpenMagitBody = match parse_body(&body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    let outcome = actions::open_magit(state.router.executor(), body.repo_path.as_deref()).await;
    action_response(outcome, OPEN_MAGIT_FAILED)
}

/// POST /mcp - one JSON-RPC message per request.
pub async fn mcp<R: ClientRunner>(State(state): State<AppState<R>>, body: String) -> Response {
    match server::handle_message(&*state.router, &body).await {
        Some(resp) => Json(resp).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Empty bodies decode to `T::default()`.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiResponse> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(Envelope {
                status: "error",
                message: format!("Invalid JSON body: {e}"),
                data: None,
                error: None,
            }),
        )
    })
}

fn action_response(outcome: Result<ActionOutcome, BridgeError>, failure: &str) -> ApiResponse {
    match outcome {
        Ok(outcome) => (
            StatusCode::OK,
            Json(Envelope {
                status: "success",
                message: outcome.message,
                data: Some(serde_json::json!({ "result": outcome.result })),
                error: None,
            }),
        ),
        Err(e) => {
            error!(error = %e, "HTTP action failed");
            let status = match e.kind() {
                ErrorKind::InvalidArguments | ErrorKind::PathResolutionFailed => {
                    StatusCode::BAD_REQUEST
                }
                ErrorKind::ServerUnavailable | ErrorKind::ExecutionFailed => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            (
                status,
                Json(Envelope {
                    status: "error",
                    message: failure.to_owned(),
                    data: None,
                    error: Some(ErrorBody {
                        kind: e.kind(),
                        message: e.root_message(),
                        stderr: e.stderr().map(str::to_owned),
                    }),
                }),
            )
        }
    }
}
