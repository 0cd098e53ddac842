//! Output container formats.
//!
//! Every transform result is written back out as an encoded byte buffer. The
//! container is chosen by file extension; anything that is not recognized
//! falls back to JPEG rather than failing.

use std::borrow::Cow;
use std::fmt;
use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};

use crate::error::EffectError;

/// JPEG quality used for encoded results.
pub const JPEG_QUALITY: u8 = 95;

/// Extensions accepted for each container, lower-case.
const EXTENSIONS: &[(&str, OutputFormat)] = &[
    ("bmp", OutputFormat::Bmp),
    ("dib", OutputFormat::Bmp),
    ("jpeg", OutputFormat::Jpeg),
    ("jpg", OutputFormat::Jpeg),
    ("jpe", OutputFormat::Jpeg),
    ("png", OutputFormat::Png),
    ("webp", OutputFormat::WebP),
    ("pbm", OutputFormat::Pnm),
    ("pgm", OutputFormat::Pnm),
    ("ppm", OutputFormat::Pnm),
    ("pxm", OutputFormat::Pnm),
    ("pnm", OutputFormat::Pnm),
    ("tiff", OutputFormat::Tiff),
    ("tif", OutputFormat::Tiff),
    ("exr", OutputFormat::OpenExr),
    ("hdr", OutputFormat::Hdr),
    ("pic", OutputFormat::Hdr),
];

/// Container format for encoded results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    /// Windows bitmap
    Bmp,
    /// JPEG (the fallback for anything unrecognized)
    #[default]
    Jpeg,
    /// Portable Network Graphics
    Png,
    /// Lossless WebP
    WebP,
    /// Portable anymap family, subtype picked from the color type
    Pnm,
    /// TIFF
    Tiff,
    /// OpenEXR, written as 32-bit float RGB
    OpenExr,
    /// Radiance HDR, written as 32-bit float RGB
    Hdr,
}

impl OutputFormat {
    /// Resolve a format from a file extension, case-insensitively.
    ///
    /// A leading dot is ignored. Unknown extensions resolve to JPEG.
    pub fn from_extension(ext: &str) -> Self {
        Self::lookup(ext).unwrap_or_default()
    }

    /// Whether `ext` names a supported container (no fallback applied).
    pub fn is_recognized(ext: &str) -> bool {
        Self::lookup(ext).is_some()
    }

    fn lookup(ext: &str) -> Option<Self> {
        let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
        EXTENSIONS
            .iter()
            .find(|(name, _)| *name == ext)
            .map(|(_, format)| *format)
    }

    /// Canonical file extension.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Bmp => "bmp",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
            OutputFormat::Pnm => "pnm",
            OutputFormat::Tiff => "tiff",
            OutputFormat::OpenExr => "exr",
            OutputFormat::Hdr => "hdr",
        }
    }

    /// MIME type of the encoded output.
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Bmp => "image/bmp",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::WebP => "image/webp",
            OutputFormat::Pnm => "image/x-portable-anymap",
            OutputFormat::Tiff => "image/tiff",
            OutputFormat::OpenExr => "image/x-exr",
            OutputFormat::Hdr => "image/vnd.radiance",
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            OutputFormat::Bmp => ImageFormat::Bmp,
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::WebP => ImageFormat::WebP,
            OutputFormat::Pnm => ImageFormat::Pnm,
            OutputFormat::Tiff => ImageFormat::Tiff,
            OutputFormat::OpenExr => ImageFormat::OpenExr,
            OutputFormat::Hdr => ImageFormat::Hdr,
        }
    }

    /// Encode pixels into this container.
    ///
    /// Pixels are first converted to a color type the container can hold:
    /// 8-bit gray or RGB for the integer formats, 32-bit float RGB for EXR
    /// and HDR.
    pub fn encode(self, img: &DynamicImage) -> Result<Bytes, EffectError> {
        let prepared = self.prepare(img);
        let mut output = Vec::new();

        match self {
            OutputFormat::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(&mut output, JPEG_QUALITY);
                prepared
                    .write_with_encoder(encoder)
                    .map_err(|e| EffectError::encode(self, e))?;
            }
            _ => {
                prepared
                    .write_to(&mut Cursor::new(&mut output), self.image_format())
                    .map_err(|e| EffectError::encode(self, e))?;
            }
        }

        Ok(Bytes::from(output))
    }

    fn prepare<'a>(self, img: &'a DynamicImage) -> Cow<'a, DynamicImage> {
        match (self, img) {
            (OutputFormat::OpenExr | OutputFormat::Hdr, DynamicImage::ImageRgb32F(_)) => {
                Cow::Borrowed(img)
            }
            (OutputFormat::OpenExr | OutputFormat::Hdr, _) => {
                Cow::Owned(DynamicImage::ImageRgb32F(img.to_rgb32f()))
            }
            (OutputFormat::WebP, DynamicImage::ImageRgb8(_)) => Cow::Borrowed(img),
            (OutputFormat::WebP, _) => Cow::Owned(DynamicImage::ImageRgb8(img.to_rgb8())),
            (_, DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_)) => Cow::Borrowed(img),
            (_, _) => Cow::Owned(DynamicImage::ImageRgb8(img.to_rgb8())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
