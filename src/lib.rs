//! # fx-weigher
//!
//! An image effects service: receive an encoded image plus a list of named
//! effects, apply them in order under a cost budget, return the result.
//!
//! ## Features
//!
//! - **Effect catalog**: rotate, grayscale, negative, flip, sharp, sepia, blur,
//!   emboss, scale, noise, laplacian, sobel
//! - **Weighted admission control**: every effect has a fixed weight; requests
//!   over budget are rejected before any pixel work
//! - **Forgiving parameters**: malformed effect parameters fall back to defaults
//! - **Uniform envelopes**: one success shape, one error shape with numeric codes
//!
//! ## Architecture
//!
//! - [`effects`] - Effect catalog, parameter sanitization, image engine
//! - [`pipeline`] - Request validation, weight budget, chained application
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use fx_weigher::{create_router, Orchestrator, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let orchestrator = Orchestrator::new().with_max_weight(50);
//!     let router = create_router(orchestrator, RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod config;
pub mod effects;
pub mod error;
pub mod pipeline;
pub mod server;

// Re-export commonly used types
pub use config::{ApplyConfig, Cli, Command, EffectsConfig, ServeConfig};
pub use effects::{
    weight_of, Effect, EffectParams, FlipAxis, ImageEngine, OutputFormat, WeightBreakdown,
};
pub use error::{ConfigError, EffectError, PipelineError};
pub use pipeline::{
    apply_chain, apply_chain_before, parse_request, EffectRequest, EffectStep, Envelope, ErrorKind,
    Orchestrator, DEFAULT_MAX_WEIGHT,
};
pub use server::{create_router, AppState, RouterConfig};
