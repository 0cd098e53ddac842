//! Response envelopes.
//!
//! Every request produces exactly one envelope: a success carrying the
//! encoded image, or an error carrying a numeric code and message.

use std::collections::BTreeMap;
use std::fmt;

use base64::{engine::general_purpose, Engine as _};
use serde::Serialize;

use crate::effects::WeightBreakdown;

/// Message returned with every successful result.
pub const SUCCESS_MESSAGE: &str = "Image processed correctly";

/// Reasons a request is answered with an error envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request is not a JSON object
    NotJson,
    /// No usable image bytes
    NoImage,
    /// No effects requested
    NoEffects,
    /// Requested effects cost more than the budget allows
    WeightExceeded,
    /// The object has neither `img` nor `effects`, or they have the wrong shape
    MalformedJson,
    /// Image bytes could not be decoded
    InvalidImgFormat,
}

impl ErrorKind {
    /// Numeric code sent as `cod`.
    pub fn code(self) -> u8 {
        match self {
            ErrorKind::NotJson => 0,
            ErrorKind::NoImage => 1,
            ErrorKind::NoEffects => 2,
            ErrorKind::WeightExceeded => 3,
            ErrorKind::MalformedJson => 4,
            ErrorKind::InvalidImgFormat => 5,
        }
    }

    /// Message sent as `msg`.
    pub fn message(self) -> &'static str {
        match self {
            ErrorKind::NotJson => "Expected request in Json format",
            ErrorKind::NoImage => "No image to process",
            ErrorKind::NoEffects => "No effects given",
            ErrorKind::WeightExceeded => "Sum of effect's weight exceeds limit",
            ErrorKind::MalformedJson => "Invalid Json format",
            ErrorKind::InvalidImgFormat => "Invalid image format",
        }
    }

    /// Identifier used in logs.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::NotJson => "notJson",
            ErrorKind::NoImage => "noImage",
            ErrorKind::NoEffects => "noEffects",
            ErrorKind::WeightExceeded => "weightExceeded",
            ErrorKind::MalformedJson => "malformedJson",
            ErrorKind::InvalidImgFormat => "invalidImgFormat",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Envelopes
// =============================================================================

/// Body of a successful response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuccessEnvelope {
    /// Base64 of the final encoded image
    pub img: String,

    pub msg: String,
}

/// Body of an error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEnvelope {
    pub cod: u8,

    pub msg: String,

    /// Per-effect weights (weight errors only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect_weight: Option<BTreeMap<String, u32>>,

    /// Sum of requested weights (weight errors only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_effect_weight: Option<u32>,

    #[serde(skip)]
    kind: ErrorKind,
}

impl ErrorEnvelope {
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// The uniform response shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Envelope {
    Success(SuccessEnvelope),
    Error(ErrorEnvelope),
}

impl Envelope {
    /// Success envelope for the given encoded image.
    pub fn success(image: &[u8]) -> Self {
        Envelope::Success(SuccessEnvelope {
            img: general_purpose::STANDARD.encode(image),
            msg: SUCCESS_MESSAGE.to_string(),
        })
    }

    /// Error envelope without a weight breakdown.
    pub fn error(kind: ErrorKind) -> Self {
        Envelope::Error(ErrorEnvelope {
            cod: kind.code(),
            msg: kind.message().to_string(),
            effect_weight: None,
            total_effect_weight: None,
            kind,
        })
    }

    /// `weightExceeded` envelope with the per-effect breakdown attached.
    pub fn weight_exceeded(breakdown: WeightBreakdown) -> Self {
        let kind = ErrorKind::WeightExceeded;
        Envelope::Error(ErrorEnvelope {
            cod: kind.code(),
            msg: kind.message().to_string(),
            effect_weight: Some(breakdown.per_effect),
            total_effect_weight: Some(breakdown.total),
            kind,
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success(_))
    }

    /// The error kind, if this is an error envelope.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Envelope::Success(_) => None,
            Envelope::Error(err) => Some(err.kind),
        }
    }

    /// Decoded image bytes of a success envelope.
    pub fn image_bytes(&self) -> Option<Vec<u8>> {
        match self {
            Envelope::Success(ok) => general_purpose::STANDARD.decode(&ok.img).ok(),
            Envelope::Error(_) => None,
        }
    }
}
