//! The effect catalog.
//!
//! A closed set of named effects, each with a fixed weight and a dispatch arm
//! into [`ImageEngine`]. Names that are not in the catalog are tolerated by
//! callers: they weigh nothing and are skipped when a chain is applied.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use image::DynamicImage;
use serde::Serialize;

use super::engine::ImageEngine;
use super::params::EffectParams;
use crate::error::EffectError;

/// A named pixel transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Effect {
    Blur,
    Emboss,
    Flip,
    Grayscale,
    Laplacian,
    Negative,
    Noise,
    Rotate,
    Scale,
    Sepia,
    Sharp,
    Sobel,
}

impl Effect {
    /// Every effect in the catalog, in name order.
    pub const ALL: [Effect; 12] = [
        Effect::Blur,
        Effect::Emboss,
        Effect::Flip,
        Effect::Grayscale,
        Effect::Laplacian,
        Effect::Negative,
        Effect::Noise,
        Effect::Rotate,
        Effect::Scale,
        Effect::Sepia,
        Effect::Sharp,
        Effect::Sobel,
    ];

    /// Name used in requests.
    pub fn name(self) -> &'static str {
        match self {
            Effect::Blur => "blur",
            Effect::Emboss => "emboss",
            Effect::Flip => "flip",
            Effect::Grayscale => "grayscale",
            Effect::Laplacian => "laplacian",
            Effect::Negative => "negative",
            Effect::Noise => "noise",
            Effect::Rotate => "rotate",
            Effect::Scale => "scale",
            Effect::Sepia => "sepia",
            Effect::Sharp => "sharp",
            Effect::Sobel => "sobel",
        }
    }

    /// Admission cost of one application.
    pub fn weight(self) -> u32 {
        match self {
            Effect::Negative => 1,
            Effect::Flip | Effect::Grayscale => 3,
            Effect::Blur | Effect::Rotate => 5,
            Effect::Emboss
            | Effect::Laplacian
            | Effect::Noise
            | Effect::Sepia
            | Effect::Sharp
            | Effect::Sobel => 10,
            Effect::Scale => 20,
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn from_name(name: &str) -> Option<Effect> {
        Self::ALL.into_iter().find(|effect| effect.name() == name)
    }

    /// Run this effect on `engine`, pulling its parameters from `params`.
    ///
    /// Parameter keys: `rotate_90`/`clockwise` for rotate, `axis` for flip,
    /// `factor` for blur, scale, noise, laplacian and sobel, and
    /// `horizontal` for sobel.
    pub fn apply(
        self,
        engine: &mut ImageEngine,
        params: &EffectParams,
    ) -> Result<DynamicImage, EffectError> {
        match self {
            Effect::Rotate => engine.rotate(params.get("rotate_90"), params.get("clockwise")),
            Effect::Grayscale => engine.grayscale(),
            Effect::Negative => engine.negative(),
            Effect::Flip => engine.flip(params.get("axis")),
            Effect::Sharp => engine.sharp(),
            Effect::Sepia => engine.sepia(),
            Effect::Blur => engine.blur(params.get("factor")),
            Effect::Emboss => engine.emboss(),
            Effect::Scale => engine.scale(params.get("factor")),
            Effect::Noise => engine.noise(params.get("factor")),
            Effect::Laplacian => engine.laplacian(params.get("factor")),
            Effect::Sobel => engine.sobel(params.get("factor"), params.get("horizontal")),
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for [`Effect::from_str`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEffect(pub String);

impl fmt::Display for UnknownEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown effect: {}", self.0)
    }
}

impl std::error::Error for UnknownEffect {}

impl FromStr for Effect {
    type Err = UnknownEffect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Effect::from_name(s).ok_or_else(|| UnknownEffect(s.to_string()))
    }
}

/// Weight of a requested name. Unknown names weigh 0.
pub fn weight_of(name: &str) -> u32 {
    Effect::from_name(name).map_or(0, Effect::weight)
}

// =============================================================================
// Weight Breakdown
// =============================================================================

/// Weights of a requested effect list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WeightBreakdown {
    /// Weight per distinct name, unknown names included at 0.
    pub per_effect: BTreeMap<String, u32>,

    /// Sum over the full list, repeats counted each time.
    pub total: u32,
}

impl WeightBreakdown {
    /// Weigh a list of effect names.
    pub fn of<'a, I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut breakdown = Self::default();
        for name in names {
            let weight = weight_of(name);
            breakdown.per_effect.insert(name.to_string(), weight);
            breakdown.total = breakdown.total.saturating_add(weight);
        }
        breakdown
    }
}
