//! Structural parsing of inbound requests.
//!
//! ```text
//! { "img": "<base64>", "effects": ["negative", {"name": "blur", "factor": 11}] }
//! ```
//!
//! Checks run in a fixed order and stop at the first failure: not an
//! object, neither key present, no usable image, no effects.

use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use serde_json::{Map, Value};

use super::envelope::ErrorKind;
use crate::effects::{Effect, EffectParams};

/// One entry of the `effects` list.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectStep {
    /// Name as sent by the client (may not be in the catalog)
    pub name: String,

    /// Extra keys from the object form; empty for bare names
    pub params: EffectParams,
}

impl EffectStep {
    /// A step with default parameters.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: EffectParams::new(),
        }
    }

    pub fn with_params(name: impl Into<String>, params: EffectParams) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// Catalog entry for this name, `None` for unknown effects.
    pub fn effect(&self) -> Option<Effect> {
        Effect::from_name(&self.name)
    }

    /// Parse a bare name or a `{"name": ..., <params>}` object.
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(name) => Some(Self::named(name.as_str())),
            Value::Object(object) => {
                let name = object.get("name")?.as_str()?.to_string();
                let params: Map<String, Value> = object
                    .iter()
                    .filter(|(key, _)| key.as_str() != "name")
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                Some(Self::with_params(name, EffectParams::from_map(params)))
            }
            _ => None,
        }
    }
}

/// A structurally valid request.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectRequest {
    /// Raw image bytes (not yet decoded as an image)
    pub image: Bytes,

    /// Effects in client order, never empty
    pub steps: Vec<EffectStep>,
}

impl EffectRequest {
    /// Names of every step, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|step| step.name.as_str())
    }
}

/// Validate the shape of a request mapping.
///
/// - not an object → `NotJson`
/// - neither `img` nor `effects` present → `MalformedJson`
/// - `img` missing, not a string, not base64, or empty → `NoImage`
/// - `effects` missing, null or empty → `NoEffects`
/// - `effects` not a list, or an entry without a name → `MalformedJson`
pub fn parse_request(value: &Value) -> Result<EffectRequest, ErrorKind> {
    let object = value.as_object().ok_or(ErrorKind::NotJson)?;

    let img = object.get("img");
    let effects = object.get("effects");
    if img.is_none() && effects.is_none() {
        return Err(ErrorKind::MalformedJson);
    }

    let image = img.and_then(decode_image_field).ok_or(ErrorKind::NoImage)?;

    let items = match effects {
        None | Some(Value::Null) => return Err(ErrorKind::NoEffects),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(ErrorKind::MalformedJson),
    };
    if items.is_empty() {
        return Err(ErrorKind::NoEffects);
    }

    let steps = items
        .iter()
        .map(EffectStep::from_value)
        .collect::<Option<Vec<_>>>()
        .ok_or(ErrorKind::MalformedJson)?;

    Ok(EffectRequest { image, steps })
}

/// Base64-decode the `img` field; `None` when nothing usable comes out.
///
/// ASCII whitespace anywhere in the text is ignored, so line-wrapped
/// encodings are accepted.
fn decode_image_field(value: &Value) -> Option<Bytes> {
    let text: String = value.as_str()?.split_ascii_whitespace().collect();
    let bytes = general_purpose::STANDARD.decode(text).ok()?;
    if bytes.is_empty() {
        None
    } else {
        Some(Bytes::from(bytes))
    }
}
