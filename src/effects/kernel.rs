//! Pixel kernels.
//!
//! Neighbourhood operations work on 8-bit RGB sources and accumulate in `f32`.
//! Borders are reflected without repeating the edge pixel (`dcb|abcd|cba`).
//! Results are rounded and saturated back into `0..=255`.

use image::{Rgb, RgbImage};
use rand::Rng;

/// Standard deviation of the additive noise before the factor is applied.
pub const NOISE_STD_DEV: f64 = 128.0;

/// 3×3 sharpening kernel.
pub const SHARPEN_KERNEL: [[f32; 3]; 3] = [
    [-1.0, -1.0, -1.0],
    [-1.0, 9.0, -1.0],
    [-1.0, -1.0, -1.0],
];

/// 3×3 emboss kernel.
pub const EMBOSS_KERNEL: [[f32; 3]; 3] = [[0.0, -1.0, -1.0], [1.0, 0.0, -1.0], [1.0, 1.0, 0.0]];

/// Aperture-1 Laplacian kernel.
const LAPLACIAN_3X3: [[f32; 3]; 3] = [[0.0, 1.0, 0.0], [1.0, -4.0, 1.0], [0.0, 1.0, 0.0]];

/// Sepia transform, rows produce R, G, B from (R, G, B).
pub const SEPIA_MATRIX: [[f32; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

/// Interleaved RGB samples in floating point.
struct Planes {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl Planes {
    fn from_image(src: &RgbImage) -> Self {
        Self {
            width: src.width(),
            height: src.height(),
            data: src.as_raw().iter().map(|&v| f32::from(v)).collect(),
        }
    }

    fn zeroed(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width as usize * height as usize * 3],
        }
    }

    fn index(&self, x: usize, y: usize) -> usize {
        (y * self.width as usize + x) * 3
    }

    fn into_image(self) -> RgbImage {
        let raw: Vec<u8> = self.data.iter().map(|&v| saturate(v)).collect();
        RgbImage::from_raw(self.width, self.height, raw)
            .unwrap_or_else(|| RgbImage::new(self.width, self.height))
    }
}

#[inline]
fn saturate(v: f32) -> u8 {
    if v.is_nan() {
        0
    } else {
        v.round().clamp(0.0, 255.0) as u8
    }
}

/// Map an out-of-range coordinate back inside `0..len` by reflection.
#[inline]
pub fn reflect_101(i: i64, len: i64) -> usize {
    if len <= 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    let i = i.rem_euclid(period);
    (if i >= len { period - i } else { i }) as usize
}

// =============================================================================
// Convolution
// =============================================================================

fn correlate3x3(src: &Planes, kernel: &[[f32; 3]; 3]) -> Planes {
    let (w, h) = (i64::from(src.width), i64::from(src.height));
    let mut out = Planes::zeroed(src.width, src.height);

    for y in 0..h {
        for x in 0..w {
            let mut acc = [0.0f32; 3];
            for (ky, row) in kernel.iter().enumerate() {
                let sy = reflect_101(y + ky as i64 - 1, h);
                for (kx, &weight) in row.iter().enumerate() {
                    if weight == 0.0 {
                        continue;
                    }
                    let sx = reflect_101(x + kx as i64 - 1, w);
                    let idx = src.index(sx, sy);
                    for (c, a) in acc.iter_mut().enumerate() {
                        *a += weight * src.data[idx + c];
                    }
                }
            }
            let idx = out.index(x as usize, y as usize);
            out.data[idx..idx + 3].copy_from_slice(&acc);
        }
    }

    out
}

/// Correlate with a row kernel, then a column kernel.
fn separable(src: &Planes, kx: &[f32], ky: &[f32]) -> Planes {
    let (w, h) = (i64::from(src.width), i64::from(src.height));
    let rx = (kx.len() / 2) as i64;
    let ry = (ky.len() / 2) as i64;

    let mut tmp = Planes::zeroed(src.width, src.height);
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0.0f32; 3];
            for (k, &weight) in kx.iter().enumerate() {
                let sx = reflect_101(x + k as i64 - rx, w);
                let idx = src.index(sx, y as usize);
                for (c, a) in acc.iter_mut().enumerate() {
                    *a += weight * src.data[idx + c];
                }
            }
            let idx = tmp.index(x as usize, y as usize);
            tmp.data[idx..idx + 3].copy_from_slice(&acc);
        }
    }

    let mut out = Planes::zeroed(src.width, src.height);
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0.0f32; 3];
            for (k, &weight) in ky.iter().enumerate() {
                let sy = reflect_101(y + k as i64 - ry, h);
                let idx = tmp.index(x as usize, sy);
                for (c, a) in acc.iter_mut().enumerate() {
                    *a += weight * tmp.data[idx + c];
                }
            }
            let idx = out.index(x as usize, y as usize);
            out.data[idx..idx + 3].copy_from_slice(&acc);
        }
    }

    out
}

fn convolve1d(a: &[f32], b: &[f32]) -> Vec<f32> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// Apply a 3×3 kernel as-is (no normalization).
pub fn filter3x3(src: &RgbImage, kernel: &[[f32; 3]; 3]) -> RgbImage {
    correlate3x3(&Planes::from_image(src), kernel).into_image()
}

// =============================================================================
// Gaussian Blur
// =============================================================================

/// Normalized 1-D Gaussian of odd length `size`.
///
/// Sigma is derived from the size: `0.3 * ((size - 1) / 2 - 1) + 0.8`.
pub fn gaussian_kernel(size: u32) -> Vec<f32> {
    let size = size.max(1);
    let sigma = 0.3 * ((f64::from(size) - 1.0) * 0.5 - 1.0) + 0.8;
    let center = (f64::from(size) - 1.0) / 2.0;
    let denom = 2.0 * sigma * sigma;

    let weights: Vec<f64> = (0..size)
        .map(|i| {
            let x = f64::from(i) - center;
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights.iter().sum();

    weights.iter().map(|w| (w / sum) as f32).collect()
}

/// Gaussian blur with a square kernel of odd side `size`.
pub fn gaussian_blur(src: &RgbImage, size: u32) -> RgbImage {
    let kernel = gaussian_kernel(size);
    separable(&Planes::from_image(src), &kernel, &kernel).into_image()
}

// =============================================================================
// Derivative Operators
// =============================================================================

/// 1-D derivative kernel of the given order and length.
///
/// Built from binomial smoothing `[1, 1]` repeated `size - order - 1` times
/// and differencing `[-1, 1]` repeated `order` times, so order 0 is pure
/// smoothing. `size` must exceed `order`.
pub fn derivative_kernel(order: u32, size: u32) -> Vec<f32> {
    let mut kernel = vec![1.0f32];
    for _ in 0..size.saturating_sub(order + 1) {
        kernel = convolve1d(&kernel, &[1.0, 1.0]);
    }
    for _ in 0..order {
        kernel = convolve1d(&kernel, &[-1.0, 1.0]);
    }
    kernel
}

/// First-order Sobel derivative along x (`horizontal`) or y.
///
/// Aperture 1 differentiates with `[-1, 0, 1]` and skips the cross-axis
/// smoothing.
pub fn sobel(src: &RgbImage, size: u32, horizontal: bool) -> RgbImage {
    let (deriv, smooth) = if size == 1 {
        (derivative_kernel(1, 3), vec![1.0])
    } else {
        (derivative_kernel(1, size), derivative_kernel(0, size))
    };

    let planes = Planes::from_image(src);
    let out = if horizontal {
        separable(&planes, &deriv, &smooth)
    } else {
        separable(&planes, &smooth, &deriv)
    };
    out.into_image()
}

/// Laplacian: sum of second derivatives along both axes.
pub fn laplacian(src: &RgbImage, size: u32) -> RgbImage {
    let planes = Planes::from_image(src);
    if size == 1 {
        return correlate3x3(&planes, &LAPLACIAN_3X3).into_image();
    }

    let d2 = derivative_kernel(2, size);
    let smooth = derivative_kernel(0, size);
    let mut out = separable(&planes, &d2, &smooth);
    let dyy = separable(&planes, &smooth, &d2);
    for (a, b) in out.data.iter_mut().zip(dyy.data) {
        *a += b;
    }
    out.into_image()
}

// =============================================================================
// Color and Noise
// =============================================================================

/// Per-pixel sepia transform.
pub fn sepia(src: &RgbImage) -> RgbImage {
    let mut out = RgbImage::new(src.width(), src.height());
    for (dst, px) in out.pixels_mut().zip(src.pixels()) {
        let rgb = px.0.map(f32::from);
        let channel =
            |row: &[f32; 3]| saturate(row[0] * rgb[0] + row[1] * rgb[1] + row[2] * rgb[2]);
        *dst = Rgb([
            channel(&SEPIA_MATRIX[0]),
            channel(&SEPIA_MATRIX[1]),
            channel(&SEPIA_MATRIX[2]),
        ]);
    }
    out
}

/// One standard normal sample (Box-Muller).
fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1 = 1.0 - rng.random::<f64>();
    let u2 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// Add zero-mean Gaussian noise (std-dev 128, scaled by `factor`) to every
/// sample, saturating.
pub fn add_noise<R: Rng + ?Sized>(src: &RgbImage, factor: f64, rng: &mut R) -> RgbImage {
    let mut out = src.clone();
    for sample in out.iter_mut() {
        let noisy = f64::from(*sample) + factor * NOISE_STD_DEV * standard_normal(rng);
        *sample = saturate(noisy as f32);
    }
    out
}
