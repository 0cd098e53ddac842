//! Request orchestration.
//!
//! [`Orchestrator::build_response`] turns a request mapping into an
//! [`Envelope`]:
//!
//! ```text
//! request ─► shape checks ─► weight budget ─► decode ─► effect chain ─► envelope
//!                │                 │             │            │
//!                └─────────────────┴─────────────┴────────────┴──► error envelope
//! ```
//!
//! Nothing touches pixels until every structural check and the budget check
//! have passed. Unknown effect names weigh nothing and are skipped.

use std::time::Instant;

use bytes::Bytes;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::envelope::{Envelope, ErrorKind};
use super::request::{parse_request, EffectStep};
use crate::effects::{ImageEngine, OutputFormat, WeightBreakdown};
use crate::error::PipelineError;

/// Default ceiling on the summed weight of a request.
pub const DEFAULT_MAX_WEIGHT: i64 = 50;

/// Admission control plus chained application of effects.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    max_weight: i64,
    output_format: OutputFormat,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    /// Budget of 50, JPEG output.
    pub fn new() -> Self {
        Self {
            max_weight: DEFAULT_MAX_WEIGHT,
            output_format: OutputFormat::default(),
        }
    }

    /// Set the weight budget. Values below 1 behave as 1.
    pub fn with_max_weight(mut self, max_weight: i64) -> Self {
        self.max_weight = max_weight;
        self
    }

    /// Set the container every step encodes its result in.
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// The budget actually enforced.
    pub fn max_weight(&self) -> u32 {
        self.max_weight.clamp(1, i64::from(u32::MAX)) as u32
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    /// Whether a weighed request fits in the budget.
    pub fn admits(&self, breakdown: &WeightBreakdown) -> bool {
        breakdown.total <= self.max_weight()
    }

    /// Build the response for a raw request body.
    ///
    /// A body that is not valid JSON is answered with `notJson`.
    pub fn build_response_from_slice(&self, body: &[u8]) -> Envelope {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => self.build_response(&value),
            Err(e) => {
                warn!(error = %e, "Request body is not JSON");
                Envelope::error(ErrorKind::NotJson)
            }
        }
    }

    /// Build the response for a parsed request.
    pub fn build_response(&self, request: &Value) -> Envelope {
        self.respond(request, None).unwrap_or_else(|e| {
            error!(error = %e, "Effect chain aborted");
            Envelope::error(ErrorKind::InvalidImgFormat)
        })
    }

    /// Like [`Orchestrator::build_response_from_slice`], but stops between
    /// effects once `deadline` has passed.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DeadlineExceeded`] when the chain was cut
    /// short. Every other outcome, errors included, is an envelope.
    pub fn build_response_before(
        &self,
        body: &[u8],
        deadline: Instant,
    ) -> Result<Envelope, PipelineError> {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => self.respond(&value, Some(deadline)),
            Err(e) => {
                warn!(error = %e, "Request body is not JSON");
                Ok(Envelope::error(ErrorKind::NotJson))
            }
        }
    }

    fn respond(
        &self,
        request: &Value,
        deadline: Option<Instant>,
    ) -> Result<Envelope, PipelineError> {
        let request = match parse_request(request) {
            Ok(request) => request,
            Err(kind) => {
                warn!(code = kind.code(), kind = %kind, "Rejected request");
                return Ok(Envelope::error(kind));
            }
        };

        let breakdown = WeightBreakdown::of(request.names());
        if !self.admits(&breakdown) {
            warn!(
                code = ErrorKind::WeightExceeded.code(),
                total_weight = breakdown.total,
                max_weight = self.max_weight(),
                "Rejected request: weight budget exceeded"
            );
            return Ok(Envelope::weight_exceeded(breakdown));
        }

        let result =
            apply_chain_before(request.image, &request.steps, self.output_format, deadline);
        match result {
            Ok(image) => {
                info!(
                    effects = request.steps.len(),
                    total_weight = breakdown.total,
                    bytes = image.len(),
                    "Image processed"
                );
                Ok(Envelope::success(&image))
            }
            Err(e @ PipelineError::DeadlineExceeded { .. }) => {
                warn!(error = %e, "Effect chain stopped at deadline");
                Err(e)
            }
            Err(PipelineError::Source(e)) => {
                warn!(error = %e, "Submitted image could not be decoded");
                Ok(Envelope::error(ErrorKind::InvalidImgFormat))
            }
            Err(e) => {
                error!(error = %e, "Effect chain aborted");
                Ok(Envelope::error(ErrorKind::InvalidImgFormat))
            }
        }
    }
}

/// Apply `steps` in order, starting from the encoded `source`.
///
/// The source is decoded once up front. Each known effect after the first
/// runs on a fresh engine built from the previous step's encoded output, so
/// results compose (including any loss from the output format). Unknown
/// names are skipped. With no applicable steps the source bytes come back
/// untouched.
pub fn apply_chain(
    source: Bytes,
    steps: &[EffectStep],
    format: OutputFormat,
) -> Result<Bytes, PipelineError> {
    apply_chain_before(source, steps, format, None)
}

/// [`apply_chain`] that checks `deadline` before each known effect.
///
/// A step already running is never interrupted; the check only stops the
/// chain from starting the next one.
pub fn apply_chain_before(
    source: Bytes,
    steps: &[EffectStep],
    format: OutputFormat,
    deadline: Option<Instant>,
) -> Result<Bytes, PipelineError> {
    let mut engine = ImageEngine::with_format(source, format).map_err(PipelineError::Source)?;
    let mut applied = 0usize;

    for (index, step) in steps.iter().enumerate() {
        let Some(effect) = step.effect() else {
            debug!(index, name = %step.name, "Skipping unknown effect");
            continue;
        };

        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(PipelineError::DeadlineExceeded { index });
        }

        let step_error = |source| PipelineError::Step {
            index,
            effect: effect.name(),
            source,
        };

        if applied > 0 {
            engine = ImageEngine::with_format(engine.encoded().clone(), format)
                .map_err(step_error)?;
        }

        effect.apply(&mut engine, &step.params).map_err(step_error)?;
        applied += 1;
        debug!(index, effect = %effect, bytes = engine.encoded().len(), "Applied effect");
    }

    Ok(engine.into_encoded())
}
