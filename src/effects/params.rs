//! Parameter sanitization.
//!
//! Effect parameters arrive as loosely-typed JSON. None of the rules here can
//! fail: a value of the wrong type or outside its valid range resolves to the
//! effect's documented default, so a bad parameter never aborts a pipeline.

use serde_json::{Map, Value};

/// Default Gaussian kernel size for `blur`.
pub const DEFAULT_BLUR_SIZE: u32 = 35;

/// Largest accepted Gaussian kernel size.
pub const MAX_BLUR_SIZE: u32 = 99;

/// Default aperture for `laplacian`.
pub const DEFAULT_LAPLACIAN_SIZE: u32 = 5;

/// Default aperture for `sobel`.
pub const DEFAULT_SOBEL_SIZE: u32 = 3;

/// Largest accepted aperture for the derivative operators.
pub const MAX_DERIVATIVE_SIZE: u32 = 31;

/// Default `scale` factor (identity).
pub const DEFAULT_SCALE_FACTOR: f64 = 1.0;

/// Largest accepted `scale` factor.
pub const MAX_SCALE_FACTOR: f64 = 5.0;

/// Largest pixel count `scale` will produce.
pub const MAX_SCALED_PIXELS: u64 = 40_000_000;

/// Default `noise` amplitude multiplier.
pub const DEFAULT_NOISE_FACTOR: f64 = 1.5;

// =============================================================================
// Parameter Bag
// =============================================================================

/// Named parameters handed to a single effect.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectParams(Map<String, Value>);

impl EffectParams {
    /// Create an empty parameter set (every effect uses its defaults).
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wrap an existing JSON object.
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Look up a raw parameter value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// Flip Axis
// =============================================================================

/// Mirror axis for `flip`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlipAxis {
    /// Mirror around the horizontal axis (upside down).
    X,
    /// Mirror around the vertical axis (left/right).
    Y,
    /// Both axes.
    #[default]
    Both,
}

/// Resolve the `axis` parameter.
///
/// `x`, `y` and `b` are accepted in either case. Anything else, including
/// non-string values, means both axes.
pub fn flip_axis(value: Option<&Value>) -> FlipAxis {
    match value.and_then(Value::as_str).map(str::to_ascii_lowercase) {
        Some(axis) if axis == "x" => FlipAxis::X,
        Some(axis) if axis == "y" => FlipAxis::Y,
        _ => FlipAxis::Both,
    }
}

// =============================================================================
// Numeric Rules
// =============================================================================

/// Resolve an odd kernel size.
///
/// Only JSON integers count: floats, strings and the like give `default`, as
/// do integers outside `1..=max`. An even size is bumped to the next odd one.
pub fn odd_kernel_size(value: Option<&Value>, max: u32, default: u32) -> u32 {
    let size = match value.and_then(Value::as_i64) {
        Some(n) if n >= 1 && n <= i64::from(max) => n as u32,
        _ => return default,
    };
    if size % 2 == 0 {
        size + 1
    } else {
        size
    }
}

/// Kernel size for `blur`.
pub fn blur_size(value: Option<&Value>) -> u32 {
    odd_kernel_size(value, MAX_BLUR_SIZE, DEFAULT_BLUR_SIZE)
}

/// Aperture for `laplacian`.
pub fn laplacian_size(value: Option<&Value>) -> u32 {
    odd_kernel_size(value, MAX_DERIVATIVE_SIZE, DEFAULT_LAPLACIAN_SIZE)
}

/// Aperture for `sobel`.
pub fn sobel_size(value: Option<&Value>) -> u32 {
    odd_kernel_size(value, MAX_DERIVATIVE_SIZE, DEFAULT_SOBEL_SIZE)
}

/// Factor for `scale`: any number in `0..=5`, otherwise 1.
pub fn scale_factor(value: Option<&Value>) -> f64 {
    match value.and_then(Value::as_f64) {
        Some(f) if (0.0..=MAX_SCALE_FACTOR).contains(&f) => f,
        _ => DEFAULT_SCALE_FACTOR,
    }
}

/// Output size for `scale`.
///
/// Each dimension is truncated to whole pixels with a floor of one. When the
/// factor would produce more than `max_pixels`, it is lowered to the largest
/// factor that fits, keeping the aspect ratio.
pub fn scaled_dimensions(width: u32, height: u32, factor: f64, max_pixels: u64) -> (u32, u32) {
    let (w, h) = (f64::from(width), f64::from(height));
    let fit = (max_pixels as f64 / (w * h).max(1.0)).sqrt();
    let factor = factor.min(fit);
    (((w * factor) as u32).max(1), ((h * factor) as u32).max(1))
}

/// Factor for `noise`: any non-negative number, otherwise 1.5.
pub fn noise_factor(value: Option<&Value>) -> f64 {
    match value.and_then(Value::as_f64) {
        Some(f) if f >= 0.0 && f.is_finite() => f,
        _ => DEFAULT_NOISE_FACTOR,
    }
}

/// Boolean switch with JSON truthiness.
///
/// Missing means `default`; `null`, `false`, `0`, `""`, `[]` and `{}` are
/// false; everything else is true.
pub fn flag(value: Option<&Value>, default: bool) -> bool {
    match value {
        None => default,
        Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}
