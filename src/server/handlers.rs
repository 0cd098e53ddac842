//! HTTP request handlers for the effects API.
//!
//! # Endpoints
//!
//! - `POST /` (also `POST /image`) - Apply effects to an image
//! - `GET /effects` - Effect catalog with weights
//! - `GET /ping` - Liveness probe
//! - `GET /health` - Health check endpoint

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::effects::Effect;
use crate::pipeline::{Envelope, ErrorKind, Orchestrator};

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the orchestrator.
///
/// This is passed to all handlers via Axum's State extractor.
#[derive(Clone)]
pub struct AppState {
    /// Validates, weighs and runs requests
    pub orchestrator: Arc<Orchestrator>,

    /// Wall-clock limit for one request's pipeline (None = unlimited)
    pub request_timeout: Option<Duration>,
}

impl AppState {
    /// Create a new application state without a request timeout.
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            request_timeout: None,
        }
    }

    /// Limit how long a single pipeline may run.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response for failures outside the pipeline (timeouts, worker
/// crashes).
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "timeout")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = self
            .status
            .and_then(|s| StatusCode::from_u16(s).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

/// Ping response.
#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub msg: String,
}

/// One catalog entry.
#[derive(Debug, Serialize)]
pub struct EffectInfo {
    pub name: &'static str,
    pub weight: u32,
}

/// Response from the effects catalog endpoint.
#[derive(Debug, Serialize)]
pub struct EffectsResponse {
    pub effects: Vec<EffectInfo>,

    /// Budget enforced on each request
    pub max_weight: u32,
}

// =============================================================================
// Envelope Mapping
// =============================================================================

/// HTTP status for an error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotJson
        | ErrorKind::NoImage
        | ErrorKind::NoEffects
        | ErrorKind::MalformedJson => StatusCode::BAD_REQUEST,
        ErrorKind::WeightExceeded => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::InvalidImgFormat => StatusCode::UNSUPPORTED_MEDIA_TYPE,
    }
}

/// Convert an envelope to an HTTP response.
///
/// The body is always the envelope itself; only the status differs.
impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        let status = self.error_kind().map_or(StatusCode::OK, status_for);

        if let Some(kind) = self.error_kind() {
            debug!(
                error_type = kind.name(),
                code = kind.code(),
                status = status.as_u16(),
                "Client error: {}",
                kind.message()
            );
        }

        (status, Json(self)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle effect requests.
///
/// # Endpoint
///
/// `POST /`
///
/// # Request
///
/// ```json
/// { "img": "<base64>", "effects": ["negative", "blur"] }
/// ```
///
/// # Response
///
/// `200 OK` with `{"img": "<base64>", "msg": "Image processed correctly"}`.
///
/// # Errors
///
/// Error envelopes (`{"cod": N, "msg": ...}`) with:
/// - `400 Bad Request`: codes 0, 1, 2, 4
/// - `422 Unprocessable Entity`: code 3, with the weight breakdown
/// - `415 Unsupported Media Type`: code 5
///
/// Plain error responses with `504 Gateway Timeout` when the pipeline runs
/// past the configured timeout, and `500` if the worker fails.
///
/// A timed-out pipeline keeps its blocking thread until the effect in
/// progress finishes; it does not start any further effect.
pub async fn process_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let orchestrator = Arc::clone(&state.orchestrator);

    let timed = state
        .request_timeout
        .and_then(|limit| Some((limit, Instant::now().checked_add(limit)?)));

    let Some((limit, deadline)) = timed else {
        let task =
            tokio::task::spawn_blocking(move || orchestrator.build_response_from_slice(&body));
        return match task.await {
            Ok(envelope) => envelope.into_response(),
            Err(e) => worker_failed(e),
        };
    };

    let task =
        tokio::task::spawn_blocking(move || orchestrator.build_response_before(&body, deadline));

    match tokio::time::timeout(limit, task).await {
        Ok(Ok(Ok(envelope))) => envelope.into_response(),
        Ok(Ok(Err(e))) => {
            debug!(error = %e, "Pipeline stopped at deadline");
            timed_out(limit)
        }
        Ok(Err(e)) => worker_failed(e),
        Err(_) => timed_out(limit),
    }
}

fn timed_out(limit: Duration) -> Response {
    warn!(timeout_ms = limit.as_millis() as u64, "Request timed out");
    ErrorResponse::with_status(
        "timeout",
        format!("Processing exceeded {} ms", limit.as_millis()),
        StatusCode::GATEWAY_TIMEOUT,
    )
    .into_response()
}

fn worker_failed(e: tokio::task::JoinError) -> Response {
    error!(error = %e, "Pipeline worker failed");
    ErrorResponse::with_status(
        "internal_error",
        "Image processing failed unexpectedly",
        StatusCode::INTERNAL_SERVER_ERROR,
    )
    .into_response()
}

/// Handle catalog requests.
///
/// # Endpoint
///
/// `GET /effects`
pub async fn effects_handler(State(state): State<AppState>) -> Json<EffectsResponse> {
    Json(EffectsResponse {
        effects: Effect::ALL
            .iter()
            .map(|effect| EffectInfo {
                name: effect.name(),
                weight: effect.weight(),
            })
            .collect(),
        max_weight: state.orchestrator.max_weight(),
    })
}

/// Handle ping requests.
///
/// # Endpoint
///
/// `GET /ping`
pub async fn ping_handler() -> Json<PingResponse> {
    Json(PingResponse {
        msg: "pong".to_string(),
    })
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
