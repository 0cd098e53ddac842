//! Image transform engine.
//!
//! An [`ImageEngine`] owns one decoded source image and the encoded bytes of
//! the most recent result. Every operation reads the *source* pixels, never a
//! previous result, so two calls on the same engine do not compose. Chaining
//! is done by building a new engine from [`ImageEngine::encoded`].
//!
//! Each operation returns the transformed pixels and, as a side effect,
//! replaces the held encoded bytes with that result encoded in the engine's
//! output format. Before any operation runs, the encoded bytes are the input
//! exactly as given.

use bytes::Bytes;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use rand::Rng;
use serde_json::Value;
use tracing::trace;

use super::format::OutputFormat;
use super::kernel;
use super::params::{self, FlipAxis};
use crate::error::EffectError;

/// Holder of one decoded image and its current encoded form.
#[derive(Debug, Clone)]
pub struct ImageEngine {
    source: RgbImage,
    encoded: Bytes,
    format: OutputFormat,
}

impl ImageEngine {
    /// Decode `bytes`; results are encoded as JPEG.
    ///
    /// # Errors
    ///
    /// Returns [`EffectError::Decode`] if the bytes are not a readable image.
    pub fn new(bytes: impl Into<Bytes>) -> Result<Self, EffectError> {
        Self::with_format(bytes, OutputFormat::default())
    }

    /// Decode `bytes`; results are encoded as `format`.
    ///
    /// Any decodable color type is accepted and converted to 8-bit RGB.
    pub fn with_format(
        bytes: impl Into<Bytes>,
        format: OutputFormat,
    ) -> Result<Self, EffectError> {
        let encoded = bytes.into();
        if encoded.is_empty() {
            return Err(EffectError::decode("empty input"));
        }

        let source = image::load_from_memory(&encoded)
            .map_err(EffectError::decode)?
            .to_rgb8();

        trace!(
            width = source.width(),
            height = source.height(),
            "Decoded source image"
        );

        Ok(Self {
            source,
            encoded,
            format,
        })
    }

    /// The decoded source pixels.
    pub fn source(&self) -> &RgbImage {
        &self.source
    }

    /// Encoded bytes of the most recent result (or the untouched input).
    pub fn encoded(&self) -> &Bytes {
        &self.encoded
    }

    pub fn into_encoded(self) -> Bytes {
        self.encoded
    }

    pub fn output_format(&self) -> OutputFormat {
        self.format
    }

    /// (width, height) of the source.
    pub fn dimensions(&self) -> (u32, u32) {
        self.source.dimensions()
    }

    fn store(&mut self, result: DynamicImage) -> Result<DynamicImage, EffectError> {
        self.encoded = self.format.encode(&result)?;
        Ok(result)
    }

    fn store_rgb(&mut self, result: RgbImage) -> Result<DynamicImage, EffectError> {
        self.store(DynamicImage::ImageRgb8(result))
    }

    // =========================================================================
    // Geometric
    // =========================================================================

    /// Rotate by 90° (clockwise or counter-clockwise) when `rotate_90` is
    /// truthy, otherwise by 180°.
    pub fn rotate(
        &mut self,
        rotate_90: Option<&Value>,
        clockwise: Option<&Value>,
    ) -> Result<DynamicImage, EffectError> {
        let rotated = match (params::flag(rotate_90, false), params::flag(clockwise, false)) {
            (true, true) => imageops::rotate90(&self.source),
            (true, false) => imageops::rotate270(&self.source),
            (false, _) => imageops::rotate180(&self.source),
        };
        self.store_rgb(rotated)
    }

    /// Mirror along `axis` (`x`, `y` or `b` for both; anything else is both).
    pub fn flip(&mut self, axis: Option<&Value>) -> Result<DynamicImage, EffectError> {
        let flipped = match params::flip_axis(axis) {
            FlipAxis::X => imageops::flip_vertical(&self.source),
            FlipAxis::Y => imageops::flip_horizontal(&self.source),
            FlipAxis::Both => imageops::rotate180(&self.source),
        };
        self.store_rgb(flipped)
    }

    /// Resize both dimensions by `factor` (0 to 5, default 1), truncating
    /// to whole pixels with a floor of one pixel. The result never exceeds
    /// [`params::MAX_SCALED_PIXELS`].
    pub fn scale(&mut self, factor: Option<&Value>) -> Result<DynamicImage, EffectError> {
        let factor = params::scale_factor(factor);
        let (width, height) = self.source.dimensions();
        let (new_width, new_height) =
            params::scaled_dimensions(width, height, factor, params::MAX_SCALED_PIXELS);
        trace!(factor, new_width, new_height, "Scaling");

        let scaled = if (new_width, new_height) == (width, height) {
            self.source.clone()
        } else {
            imageops::resize(&self.source, new_width, new_height, FilterType::Triangle)
        };
        self.store_rgb(scaled)
    }

    // =========================================================================
    // Color
    // =========================================================================

    /// Single-channel luma conversion.
    pub fn grayscale(&mut self) -> Result<DynamicImage, EffectError> {
        let gray = imageops::grayscale(&self.source);
        self.store(DynamicImage::ImageLuma8(gray))
    }

    /// Bitwise complement of every channel.
    pub fn negative(&mut self) -> Result<DynamicImage, EffectError> {
        let mut inverted = self.source.clone();
        imageops::invert(&mut inverted);
        self.store_rgb(inverted)
    }

    /// Fixed sepia color matrix.
    pub fn sepia(&mut self) -> Result<DynamicImage, EffectError> {
        let toned = kernel::sepia(&self.source);
        self.store_rgb(toned)
    }

    /// Additive Gaussian noise (mean 0, std-dev 128) scaled by `factor`
    /// (non-negative, default 1.5).
    pub fn noise(&mut self, factor: Option<&Value>) -> Result<DynamicImage, EffectError> {
        self.noise_with_rng(factor, &mut rand::rng())
    }

    /// [`ImageEngine::noise`] with a caller-supplied random source.
    pub fn noise_with_rng<R: Rng + ?Sized>(
        &mut self,
        factor: Option<&Value>,
        rng: &mut R,
    ) -> Result<DynamicImage, EffectError> {
        let factor = params::noise_factor(factor);
        let noisy = kernel::add_noise(&self.source, factor, rng);
        self.store_rgb(noisy)
    }

    // =========================================================================
    // Convolution
    // =========================================================================

    pub fn sharp(&mut self) -> Result<DynamicImage, EffectError> {
        let sharpened = kernel::filter3x3(&self.source, &kernel::SHARPEN_KERNEL);
        self.store_rgb(sharpened)
    }

    pub fn emboss(&mut self) -> Result<DynamicImage, EffectError> {
        let embossed = kernel::filter3x3(&self.source, &kernel::EMBOSS_KERNEL);
        self.store_rgb(embossed)
    }

    /// Gaussian blur; `factor` is the kernel size (1 to 99, odd, default 35).
    pub fn blur(&mut self, factor: Option<&Value>) -> Result<DynamicImage, EffectError> {
        let size = params::blur_size(factor);
        let blurred = kernel::gaussian_blur(&self.source, size);
        self.store_rgb(blurred)
    }

    /// Laplacian edge operator; `factor` is the aperture (1 to 31, odd,
    /// default 5).
    pub fn laplacian(&mut self, factor: Option<&Value>) -> Result<DynamicImage, EffectError> {
        let size = params::laplacian_size(factor);
        let edges = kernel::laplacian(&self.source, size);
        self.store_rgb(edges)
    }

    /// Sobel derivative along x when `horizontal` (the default), else y.
    /// `factor` is the aperture (1 to 31, odd, default 3).
    pub fn sobel(
        &mut self,
        factor: Option<&Value>,
        horizontal: Option<&Value>,
    ) -> Result<DynamicImage, EffectError> {
        let size = params::sobel_size(factor);
        let edges = kernel::sobel(&self.source, size, params::flag(horizontal, true));
        self.store_rgb(edges)
    }
}
