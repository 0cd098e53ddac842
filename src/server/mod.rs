//! HTTP server layer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │                 POST / {"img": ..., "effects": [...]}           │
//! │                                                                 │
//! │  ┌──────────────────────────┐  ┌─────────────────────────────┐  │
//! │  │         handlers         │  │           routes            │  │
//! │  │ (envelope → status/JSON) │  │ (CORS, body limit, tracing) │  │
//! │  └──────────────────────────┘  └─────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    effects_handler, health_handler, ping_handler, process_handler, status_for, AppState,
    EffectInfo, EffectsResponse, ErrorResponse, HealthResponse, PingResponse,
};
pub use routes::{create_router, RouterConfig, DEFAULT_MAX_BODY_BYTES, DEFAULT_REQUEST_TIMEOUT_SECS};
