//! Test utilities for integration tests.
//!
//! Helpers for building test images, request bodies and routers.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use http_body_util::BodyExt;
use image::{DynamicImage, Rgb, RgbImage};
use serde_json::{json, Value};

use fx_weigher::{create_router, OutputFormat, Orchestrator, RouterConfig};

// =============================================================================
// Images
// =============================================================================

/// A 24×16 RGB image with distinct values in every channel.
pub fn test_image() -> RgbImage {
    RgbImage::from_fn(24, 16, |x, y| {
        Rgb([
            (x * 10) as u8,
            (y * 15) as u8,
            ((x * 7 + y * 3) % 256) as u8,
        ])
    })
}

/// [`test_image`] encoded as PNG.
pub fn test_png() -> Bytes {
    OutputFormat::Png
        .encode(&DynamicImage::ImageRgb8(test_image()))
        .unwrap()
}

/// [`test_image`] encoded as JPEG.
pub fn test_jpeg() -> Bytes {
    OutputFormat::Jpeg
        .encode(&DynamicImage::ImageRgb8(test_image()))
        .unwrap()
}

pub fn base64(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

pub fn unbase64(text: &str) -> Vec<u8> {
    general_purpose::STANDARD.decode(text).unwrap()
}

/// Request mapping for the PNG test image.
pub fn request_body(effects: Value) -> Value {
    json!({ "img": base64(&test_png()), "effects": effects })
}

// =============================================================================
// Router
// =============================================================================

/// Router producing PNG output, tracing off.
pub fn png_router() -> Router {
    let orchestrator = Orchestrator::new().with_output_format(OutputFormat::Png);
    create_router(orchestrator, RouterConfig::new().with_tracing(false))
}

pub fn post_json(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}
