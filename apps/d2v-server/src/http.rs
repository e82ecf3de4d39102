//! HTTP REST API server.
//!
//! Serves nearest-neighbour queries plus health and Prometheus endpoints.

use crate::metrics::{Outcome, QueryMetrics};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use d2v_index::{DocumentIndex, IndexError};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Limits applied to every query.
#[derive(Debug, Clone, Copy)]
pub struct QueryLimits {
    pub timeout: Duration,
    pub default_page_size: usize,
    pub max_page_size: usize,
}

/// HTTP server state.
#[derive(Clone)]
pub struct HttpServerState {
    index: Arc<DocumentIndex>,
    metrics: Arc<QueryMetrics>,
    limits: QueryLimits,
}

/// HTTP server for REST API endpoints.
///
/// Provides:
/// - GET /api/nearest - Paginated nearest neighbours of a document
/// - GET /health - Index status
/// - GET /metrics - Prometheus metrics
pub struct HttpServer {
    addr: SocketAddr,
    local_addr: Option<SocketAddr>,
    state: HttpServerState,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    server_handle: Option<JoinHandle<Result<(), std::io::Error>>>,
}

impl HttpServer {
    /// Create a new HTTP server.
    pub fn new(
        addr: SocketAddr,
        index: Arc<DocumentIndex>,
        metrics: Arc<QueryMetrics>,
        limits: QueryLimits,
    ) -> Self {
        Self {
            addr,
            local_addr: None,
            state: HttpServerState {
                index,
                metrics,
                limits,
            },
            shutdown_tx: None,
            server_handle: None,
        }
    }

    /// Start the HTTP server.
    pub async fn start(&mut self) -> Result<(), HttpServerError> {
        tracing::info!("Starting HTTP server on {}", self.addr);

        let app = router(self.state.clone());

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        self.shutdown_tx = Some(shutdown_tx);

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| HttpServerError::Startup(format!("Failed to bind: {}", e)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| {
                HttpServerError::Startup(format!("Failed to read local address: {}", e))
            })?;
        self.local_addr = Some(local_addr);

        let server_handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
        });

        self.server_handle = Some(server_handle);

        tracing::info!(%local_addr, "HTTP server started successfully");
        Ok(())
    }

    /// Bound address once started; resolves port 0 to the real port.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Shutdown the HTTP server gracefully.
    pub async fn shutdown(mut self) -> Result<(), HttpServerError> {
        tracing::info!("Shutting down HTTP server");

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(handle) = self.server_handle.take() {
            handle
                .await
                .map_err(|e| HttpServerError::Shutdown(format!("Join error: {}", e)))?
                .map_err(|e| HttpServerError::Shutdown(format!("Server error: {}", e)))?;
        }

        tracing::info!("HTTP server shutdown complete");
        Ok(())
    }
}

fn router(state: HttpServerState) -> Router {
    Router::new()
        .route("/api/nearest", get(nearest_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Query parameters for GET /api/nearest.
#[derive(Debug, Deserialize)]
pub struct NearestParams {
    pub id: String,
    #[serde(default)]
    pub offset: usize,
    pub size: Option<usize>,
    /// Comma-separated ids to leave out of the results
    pub exclude: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NearestResponse {
    pub id: String,
    pub offset: usize,
    pub size: usize,
    pub results: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub documents: usize,
    pub dimensions: usize,
}

/// Nearest-neighbour endpoint handler.
///
/// GET /api/nearest?id=<id>&offset=<n>&size=<n>&exclude=<id,id,...>
///
/// The search runs on the blocking pool. Its token is cancelled when the
/// query timeout elapses, and also when this future is dropped because the
/// client went away. A malformed query string is reported as
/// [`ApiError::BadRequest`].
async fn nearest_handler(
    State(state): State<HttpServerState>,
    params: Result<Query<NearestParams>, QueryRejection>,
) -> Result<Json<NearestResponse>, ApiError> {
    let start = Instant::now();
    let result = match params {
        Ok(Query(params)) => run_nearest(&state, params).await,
        Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
    };

    let outcome = match &result {
        Ok(_) => Outcome::Ok,
        Err(e) => e.outcome(),
    };
    state.metrics.record(outcome, start.elapsed());

    result.map(Json)
}

async fn run_nearest(
    state: &HttpServerState,
    params: NearestParams,
) -> Result<NearestResponse, ApiError> {
    let limits = state.limits;
    let size = params.size.unwrap_or(limits.default_page_size);
    if size > limits.max_page_size {
        return Err(ApiError::BadRequest(format!(
            "size {} exceeds maximum of {}",
            size, limits.max_page_size
        )));
    }

    let exclude = parse_id_list(params.exclude.as_deref());
    let offset = params.offset;

    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let index = Arc::clone(&state.index);
    let id = params.id.clone();
    let search_cancel = cancel.clone();
    let search = tokio::task::spawn_blocking(move || {
        let exclude: Vec<&str> = exclude.iter().map(String::as_str).collect();
        index.nearest(&search_cancel, &id, offset, size, &exclude)
    });

    let results = match tokio::time::timeout(limits.timeout, search).await {
        Ok(joined) => joined.map_err(|e| ApiError::Internal(e.into()))??,
        Err(_) => {
            cancel.cancel();
            tracing::warn!(
                id = %params.id,
                timeout_ms = limits.timeout.as_millis() as u64,
                "Query timed out"
            );
            return Err(ApiError::Timeout);
        }
    };

    Ok(NearestResponse {
        id: params.id,
        offset,
        size,
        results,
    })
}

/// Split a comma-separated id list, dropping blanks.
fn parse_id_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Health check endpoint handler.
///
/// GET /health
async fn health_handler(State(state): State<HttpServerState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        documents: state.index.len(),
        dimensions: state.index.dimensions(),
    })
}

/// Metrics endpoint handler.
///
/// GET /metrics
///
/// Returns Prometheus-formatted metrics.
async fn metrics_handler(State(state): State<HttpServerState>) -> Response {
    match state.metrics.export() {
        Ok(body) => (
            StatusCode::OK,
            [(
                header::CONTENT_TYPE,
                "application/openmetrics-text; version=1.0.0; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => ApiError::Internal(anyhow::anyhow!("metrics encoding failed: {}", e))
            .into_response(),
    }
}

/// HTTP server errors.
#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    #[error("Startup error: {0}")]
    Startup(String),

    #[error("Shutdown error: {0}")]
    Shutdown(String),
}

/// Handler error, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Timeout,
    Internal(anyhow::Error),
}

impl ApiError {
    fn outcome(&self) -> Outcome {
        match self {
            ApiError::BadRequest(_) => Outcome::BadRequest,
            ApiError::NotFound(_) => Outcome::NotFound,
            ApiError::Timeout => Outcome::Cancelled,
            ApiError::Internal(_) => Outcome::Error,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<IndexError> for ApiError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::DocumentNotFound(id) => ApiError::NotFound(id),
            IndexError::SearchCancelled => ApiError::Timeout,
            other => ApiError::Internal(other.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::NotFound(id) => format!("document not found: {}", id),
            ApiError::Timeout => "query cancelled".to_string(),
            ApiError::Internal(e) => {
                tracing::error!("Handler error: {:?}", e);
                format!("Internal error: {}", e)
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
