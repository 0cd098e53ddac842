//! Request pipeline: validation, weighted admission control, and chained
//! application of effects.
//!
//! # Error Codes
//!
//! | code | kind               | raised when                                   |
//! |------|--------------------|-----------------------------------------------|
//! | 0    | `notJson`          | request is not a JSON object                  |
//! | 1    | `noImage`          | `img` missing or decodes to no bytes          |
//! | 2    | `noEffects`        | `effects` missing or empty                    |
//! | 3    | `weightExceeded`   | summed weight is over the budget              |
//! | 4    | `malformedJson`    | neither key present, or wrong shapes          |
//! | 5    | `invalidImgFormat` | image or intermediate result fails to decode  |
//!
//! # Example
//!
//! ```
//! use fx_weigher::pipeline::{ErrorKind, Orchestrator};
//! use serde_json::json;
//!
//! let orchestrator = Orchestrator::new();
//! let envelope = orchestrator.build_response(&json!({"effects": ["negative"]}));
//! assert_eq!(envelope.error_kind(), Some(ErrorKind::NoImage));
//! ```

mod envelope;
mod orchestrator;
mod request;

pub use envelope::{Envelope, ErrorEnvelope, ErrorKind, SuccessEnvelope, SUCCESS_MESSAGE};
pub use orchestrator::{apply_chain, apply_chain_before, Orchestrator, DEFAULT_MAX_WEIGHT};
pub use request::{parse_request, EffectRequest, EffectStep};
