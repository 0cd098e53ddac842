//! Pipeline and engine property tests.
//!
//! Tests verify:
//! - Kernel-size sanitization (even/odd equivalence, fallback to defaults)
//! - Scale and flip fallbacks
//! - Determinism of everything except noise
//! - Chained application re-decodes each intermediate result

use std::time::{Duration, Instant};

use image::{DynamicImage, Rgb, RgbImage};
use serde_json::{json, Value};

use fx_weigher::{
    apply_chain, Effect, EffectParams, EffectStep, Envelope, ErrorKind, ImageEngine, Orchestrator,
    OutputFormat, WeightBreakdown,
};

use super::test_utils::{base64, request_body, test_image, test_jpeg, test_png};

fn engine() -> ImageEngine {
    ImageEngine::with_format(test_png(), OutputFormat::Png).unwrap()
}

// =============================================================================
// Sanitization Properties
// =============================================================================

#[test]
fn test_blur_even_sizes_round_up() {
    let mut engine = engine();
    for n in [2, 10, 36, 98] {
        let even = engine.blur(Some(&json!(n))).unwrap();
        let odd = engine.blur(Some(&json!(n + 1))).unwrap();
        assert_eq!(even, odd, "blur({n}) != blur({})", n + 1);
    }
}

#[test]
fn test_blur_invalid_sizes_use_default() {
    let mut engine = engine();
    let default = engine.blur(None).unwrap();
    assert_eq!(engine.blur(Some(&json!(35))).unwrap(), default);
    for bad in [json!(0), json!(100), json!(-1), json!(3.5), json!("5"), json!(null)] {
        assert_eq!(engine.blur(Some(&bad)).unwrap(), default, "blur({bad})");
    }
}

#[test]
fn test_laplacian_sanitization() {
    let mut engine = engine();
    assert_eq!(
        engine.laplacian(Some(&json!(4))).unwrap(),
        engine.laplacian(Some(&json!(5))).unwrap()
    );
    let default = engine.laplacian(None).unwrap();
    for bad in [json!(32), json!(0), json!("big"), json!(7.0)] {
        assert_eq!(engine.laplacian(Some(&bad)).unwrap(), default, "laplacian({bad})");
    }
}

#[test]
fn test_sobel_sanitization() {
    let mut engine = engine();
    assert_eq!(
        engine.sobel(Some(&json!(6)), None).unwrap(),
        engine.sobel(Some(&json!(7)), None).unwrap()
    );
    let default = engine.sobel(None, None).unwrap();
    for bad in [json!(33), json!(-3), json!([1])] {
        assert_eq!(engine.sobel(Some(&bad), None).unwrap(), default, "sobel({bad})");
    }
}

#[test]
fn test_scale_fallback_and_determinism() {
    let mut engine = engine();
    let default = engine.scale(None).unwrap();
    for bad in [json!(5.5), json!(-0.5), json!("2"), json!(true)] {
        assert_eq!(engine.scale(Some(&bad)).unwrap(), default, "scale({bad})");
    }

    let first = engine.scale(Some(&json!(5))).unwrap();
    let first_bytes = engine.encoded().clone();
    let second = engine.scale(Some(&json!(5))).unwrap();
    assert_eq!(first, second);
    assert_eq!(&first_bytes, engine.encoded());
    assert_eq!((first.width(), first.height()), (120, 80));
}

#[test]
fn test_flip_fallbacks_match_both_axes() {
    let mut engine = engine();
    let both = engine.flip(Some(&json!("b"))).unwrap();
    for axis in [json!("B"), json!(1), json!("vertical"), json!(null)] {
        assert_eq!(engine.flip(Some(&axis)).unwrap(), both, "flip({axis})");
    }
    assert_ne!(engine.flip(Some(&json!("x"))).unwrap(), both);
}

#[test]
fn test_deterministic_effects_repeat_exactly() {
    let mut engine = engine();
    for effect in Effect::ALL {
        if effect == Effect::Noise {
            continue;
        }
        let params = EffectParams::new();
        let a = effect.apply(&mut engine, &params).unwrap();
        let a_bytes = engine.encoded().clone();
        let b = effect.apply(&mut engine, &params).unwrap();
        assert_eq!(a, b, "{effect} is not deterministic");
        assert_eq!(&a_bytes, engine.encoded(), "{effect} encodes differently");
    }
}

#[test]
fn test_noise_keeps_dimensions() {
    let mut engine = engine();
    for factor in [None, Some(json!(0.2)), Some(json!(-1)), Some(json!("loud"))] {
        let noisy = engine.noise(factor.as_ref()).unwrap();
        assert_eq!((noisy.width(), noisy.height()), (24, 16));
    }
}

// =============================================================================
// Round Trips
// =============================================================================

#[test]
fn test_double_negative_round_trip() {
    let mut first = engine();
    first.negative().unwrap();

    let mut second = ImageEngine::with_format(first.encoded().clone(), OutputFormat::Png).unwrap();
    let restored = second.negative().unwrap();
    assert_eq!(restored.to_rgb8(), test_image());
}

#[test]
fn test_double_negative_through_lossy_format_stays_close() {
    let steps = vec![EffectStep::named("negative"), EffectStep::named("negative")];
    let out = apply_chain(test_png(), &steps, OutputFormat::Jpeg).unwrap();
    let decoded = image::load_from_memory(&out).unwrap().to_rgb8();

    let original = test_image();
    let max_diff = decoded
        .iter()
        .zip(original.iter())
        .map(|(a, b)| a.abs_diff(*b))
        .max()
        .unwrap();
    assert_eq!(decoded.dimensions(), original.dimensions());
    assert!(max_diff < 64, "lossy round trip drifted by {max_diff}");
}

// =============================================================================
// Chaining
// =============================================================================

#[test]
fn test_chain_rebuilds_engine_between_steps() {
    let steps = vec![
        EffectStep::named("sepia"),
        EffectStep::named("not_an_effect"),
        EffectStep::named("flip"),
    ];
    let chained = apply_chain(test_jpeg(), &steps, OutputFormat::Jpeg).unwrap();

    let mut first = ImageEngine::new(test_jpeg()).unwrap();
    first.sepia().unwrap();
    let mut second = ImageEngine::new(first.encoded().clone()).unwrap();
    second.flip(None).unwrap();

    assert_eq!(chained, *second.encoded());
}

#[test]
fn test_chain_order_matters() {
    let scale_then_blur = vec![
        EffectStep::with_params("scale", EffectParams::new().with("factor", 0.5)),
        EffectStep::with_params("blur", EffectParams::new().with("factor", 3)),
    ];
    let blur_then_scale = vec![scale_then_blur[1].clone(), scale_then_blur[0].clone()];

    let a = apply_chain(test_png(), &scale_then_blur, OutputFormat::Png).unwrap();
    let b = apply_chain(test_png(), &blur_then_scale, OutputFormat::Png).unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_empty_and_unknown_chains_return_source() {
    assert_eq!(
        apply_chain(test_jpeg(), &[], OutputFormat::Png).unwrap(),
        test_jpeg()
    );

    let unknown = vec![
        EffectStep::named("unknown_effect1"),
        EffectStep::named("unknown_effect2"),
    ];
    assert_eq!(
        apply_chain(test_jpeg(), &unknown, OutputFormat::Png).unwrap(),
        test_jpeg()
    );
}

// =============================================================================
// Admission Control
// =============================================================================

#[test]
fn test_total_weight_formula() {
    let names = ["negative", "scale", "sepia", "sharp", "sobel"];
    let breakdown = WeightBreakdown::of(names.into_iter());
    let expected: u32 = names.iter().map(|n| fx_weigher::weight_of(n)).sum();
    assert_eq!(breakdown.total, expected);
    assert_eq!(breakdown.total, 51);
}

#[test]
fn test_validation_order() {
    let orchestrator = Orchestrator::new();
    let kind = |body: Value| orchestrator.build_response(&body).error_kind();

    assert_eq!(kind(json!("just a string")), Some(ErrorKind::NotJson));
    assert_eq!(kind(json!({})), Some(ErrorKind::MalformedJson));
    assert_eq!(
        kind(json!({"effects": ["scale", "scale", "scale"]})),
        Some(ErrorKind::NoImage)
    );
    assert_eq!(
        kind(json!({"img": base64(&test_png()), "effects": []})),
        Some(ErrorKind::NoEffects)
    );
    assert_eq!(
        kind(json!({"img": base64(b"junk"), "effects": ["scale", "scale", "scale"]})),
        Some(ErrorKind::WeightExceeded)
    );
    assert_eq!(
        kind(json!({"img": base64(b"junk"), "effects": ["scale"]})),
        Some(ErrorKind::InvalidImgFormat)
    );
}

#[test]
fn test_success_envelope_shape() {
    let envelope = Orchestrator::new().build_response(&request_body(json!(["grayscale"])));
    assert!(matches!(envelope, Envelope::Success(_)));

    let value = serde_json::to_value(&envelope).unwrap();
    let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
    assert_eq!(keys.len(), 2);
    assert_eq!(value["msg"], "Image processed correctly");
}

// =============================================================================
// Cost
// =============================================================================

#[test]
fn test_costly_effects_finish_quickly() {
    let img = RgbImage::from_fn(128, 96, |x, y| Rgb([(x * 2) as u8, (y * 2) as u8, 90]));
    let bytes = OutputFormat::Png.encode(&DynamicImage::ImageRgb8(img)).unwrap();
    let mut engine = ImageEngine::with_format(bytes, OutputFormat::Png).unwrap();
    let limit = Duration::from_secs(10);

    let start = Instant::now();
    engine.blur(Some(&json!(99))).unwrap();
    assert!(start.elapsed() < limit, "blur took {:?}", start.elapsed());

    let start = Instant::now();
    engine.laplacian(Some(&json!(31))).unwrap();
    assert!(start.elapsed() < limit, "laplacian took {:?}", start.elapsed());

    let start = Instant::now();
    engine.sobel(Some(&json!(31)), Some(&json!(false))).unwrap();
    assert!(start.elapsed() < limit, "sobel took {:?}", start.elapsed());

    let start = Instant::now();
    engine.scale(Some(&json!(5))).unwrap();
    assert!(start.elapsed() < limit, "scale took {:?}", start.elapsed());
}
