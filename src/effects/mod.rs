//! Effect catalog and image transform engine.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              Orchestrator               │
//! └────────────────────┬────────────────────┘
//!                      │ Effect::from_name / weight / apply
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              ImageEngine                │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │   params     │  │     kernel      │  │
//! │  │ (sanitize)   │  │  (pixel math)   │  │
//! │  └──────────────┘  └─────────────────┘  │
//! │  ┌───────────────────────────────────┐  │
//! │  │   OutputFormat (encode, fallback) │  │
//! │  └───────────────────────────────────┘  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`Effect`]: closed catalog of named effects with fixed weights
//! - [`ImageEngine`]: decoded source image plus the latest encoded result
//! - [`EffectParams`]: loosely-typed parameters, sanitized per effect
//! - [`OutputFormat`]: container chosen by extension, JPEG when unknown
//!
//! # Example
//!
//! ```no_run
//! use fx_weigher::effects::{Effect, EffectParams, ImageEngine};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bytes = std::fs::read("city.jpg")?;
//! let mut engine = ImageEngine::new(bytes)?;
//!
//! let params = EffectParams::new().with("factor", 11);
//! Effect::Blur.apply(&mut engine, &params)?;
//!
//! std::fs::write("city-blurred.jpg", engine.encoded())?;
//! # Ok(())
//! # }
//! ```

mod catalog;
mod engine;
mod format;
pub mod kernel;
pub mod params;

pub use catalog::{weight_of, Effect, UnknownEffect, WeightBreakdown};
pub use engine::ImageEngine;
pub use format::{OutputFormat, JPEG_QUALITY};
pub use params::{EffectParams, FlipAxis};
