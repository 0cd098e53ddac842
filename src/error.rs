use thiserror::Error;

use crate::effects::OutputFormat;

/// Errors raised by the image transform engine
#[derive(Debug, Clone, Error)]
pub enum EffectError {
    /// Input bytes could not be interpreted as an image
    #[error("Failed to decode image: {message}")]
    Decode { message: String },

    /// Transformed pixels could not be written in the requested container
    #[error("Failed to encode image as {format}: {message}")]
    Encode {
        format: OutputFormat,
        message: String,
    },
}

impl EffectError {
    pub(crate) fn decode(err: impl ToString) -> Self {
        EffectError::Decode {
            message: err.to_string(),
        }
    }

    pub(crate) fn encode(format: OutputFormat, err: impl ToString) -> Self {
        EffectError::Encode {
            format,
            message: err.to_string(),
        }
    }
}

/// Errors found while validating command-line configuration
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A numeric setting is outside the range the service accepts
    #[error("{name} must be {expected}")]
    OutOfRange {
        name: &'static str,
        expected: &'static str,
    },

    /// A required setting is empty
    #[error("{0} is required")]
    Missing(&'static str),
}

/// Errors raised while applying a chain of effects
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// The submitted image could not be decoded
    #[error("Invalid source image: {0}")]
    Source(#[source] EffectError),

    /// A step failed, either re-decoding the previous result or encoding its own
    #[error("Effect '{effect}' at position {index} failed: {source}")]
    Step {
        index: usize,
        effect: &'static str,
        #[source]
        source: EffectError,
    },

    /// The deadline passed before the step at `index` could start
    #[error("Deadline passed before effect at position {index}")]
    DeadlineExceeded { index: usize },
}
