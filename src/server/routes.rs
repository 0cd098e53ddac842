//! Router configuration for the effects service.
//!
//! # Route Structure
//!
//! ```text
//! POST /             - Apply effects
//! POST /image        - Alias of POST /
//! GET  /effects      - Catalog and budget
//! GET  /ping         - Liveness probe
//! GET  /health       - Health check
//! ```
//!
//! # Example
//!
//! ```ignore
//! use fx_weigher::pipeline::Orchestrator;
//! use fx_weigher::server::routes::{create_router, RouterConfig};
//!
//! let config = RouterConfig::new()
//!     .with_cors_origins(vec!["https://example.com".to_string()]);
//!
//! let router = create_router(Orchestrator::new(), config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{get, post},
    Router,
};
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{effects_handler, health_handler, ping_handler, process_handler, AppState};
use crate::pipeline::Orchestrator;

/// Default request body limit (16 MiB of JSON, base64 included).
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Default pipeline timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Largest accepted request body in bytes
    pub max_body_bytes: usize,

    /// Wall-clock limit per request (None = unlimited)
    pub request_timeout: Option<Duration>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterConfig {
    /// Create a new router configuration.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Bodies up to 16 MiB
    /// - 30 second pipeline timeout
    /// - Tracing is enabled
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            request_timeout: Some(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
            enable_tracing: true,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    pub fn with_max_body_bytes(mut self, bytes: usize) -> Self {
        self.max_body_bytes = bytes;
        self
    }

    /// Set the pipeline timeout; `None` disables it.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// # Arguments
///
/// * `orchestrator` - Validates and runs effect requests
/// * `config` - Router configuration
pub fn create_router(orchestrator: Orchestrator, config: RouterConfig) -> Router {
    let app_state = AppState::new(orchestrator).with_request_timeout(config.request_timeout);
    let cors = build_cors_layer(&config);

    let router = Router::new()
        .route("/", post(process_handler))
        .route("/image", post(process_handler))
        .route("/effects", get(effects_handler))
        .route("/ping", get(ping_handler))
        .route("/health", get(health_handler))
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
