//! API integration tests for the effects endpoint and probes.
//!
//! Tests verify:
//! - Successful processing returns the envelope with a decodable image
//! - Each admission failure maps to its code and HTTP status
//! - Catalog, ping and health endpoints

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use fx_weigher::{create_router, Orchestrator, OutputFormat, RouterConfig};

use super::test_utils::{
    base64, get, json_body, png_router, post_json, request_body, test_image, test_png, unbase64,
};

// =============================================================================
// Success
// =============================================================================

#[tokio::test]
async fn test_process_success() {
    let body = request_body(json!(["negative"])).to_string();
    let response = png_router().oneshot(post_json("/", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );

    let json = json_body(response).await;
    assert_eq!(json["msg"], "Image processed correctly");
    assert!(json.get("cod").is_none());

    let decoded = image::load_from_memory(&unbase64(json["img"].as_str().unwrap()))
        .unwrap()
        .to_rgb8();
    let mut expected = test_image();
    image::imageops::invert(&mut expected);
    assert_eq!(decoded, expected);
}

#[tokio::test]
async fn test_image_alias_route() {
    let body = request_body(json!(["flip"])).to_string();
    let response = png_router().oneshot(post_json("/image", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_effects_return_source() {
    let body = request_body(json!(["unknown_effect1", "unknown_effect2"])).to_string();
    let response = png_router().oneshot(post_json("/", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(unbase64(json["img"].as_str().unwrap()), test_png().to_vec());
}

#[tokio::test]
async fn test_object_form_with_params() {
    let body = request_body(json!([{"name": "scale", "factor": 0.5}])).to_string();
    let response = png_router().oneshot(post_json("/", body)).await.unwrap();

    let json = json_body(response).await;
    let decoded = image::load_from_memory(&unbase64(json["img"].as_str().unwrap())).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (12, 8));
}

// =============================================================================
// Admission Errors
// =============================================================================

#[tokio::test]
async fn test_not_json_body() {
    let response = png_router()
        .oneshot(post_json("/", "this is not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json, json!({"cod": 0, "msg": "Expected request in Json format"}));
}

#[tokio::test]
async fn test_json_array_is_not_json_object() {
    let response = png_router()
        .oneshot(post_json("/", "[1, 2, 3]"))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["cod"], 0);
}

#[tokio::test]
async fn test_malformed_json() {
    for body in [json!({}), json!({"xxx": "", "bla": [], "extra": 0})] {
        let response = png_router()
            .oneshot(post_json("/", body.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json, json!({"cod": 4, "msg": "Invalid Json format"}));
    }
}

#[tokio::test]
async fn test_no_image() {
    for body in [
        json!({"effects": ["negative"]}),
        json!({"img": "", "effects": ["negative"]}),
        json!({"img": "", "effects": []}),
    ] {
        let response = png_router()
            .oneshot(post_json("/", body.to_string()))
            .await
            .unwrap();
        let json = json_body(response).await;
        assert_eq!(json, json!({"cod": 1, "msg": "No image to process"}));
    }
}

#[tokio::test]
async fn test_no_effects() {
    for body in [
        json!({"img": base64(&test_png())}),
        json!({"img": base64(&test_png()), "effects": []}),
    ] {
        let response = png_router()
            .oneshot(post_json("/", body.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json, json!({"cod": 2, "msg": "No effects given"}));
    }
}

#[tokio::test]
async fn test_weight_exceeded() {
    let body = request_body(json!(["negative", "scale", "sepia", "sharp", "sobel"])).to_string();
    let response = png_router().oneshot(post_json("/", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = json_body(response).await;
    assert_eq!(
        json,
        json!({
            "cod": 3,
            "msg": "Sum of effect's weight exceeds limit",
            "effect_weight": {
                "negative": 1,
                "scale": 20,
                "sepia": 10,
                "sharp": 10,
                "sobel": 10
            },
            "total_effect_weight": 51
        })
    );
}

#[tokio::test]
async fn test_weight_breakdown_includes_unknown_effects() {
    let body = request_body(json!(["scale", "scale", "scale", "glitter"])).to_string();
    let response = png_router().oneshot(post_json("/", body)).await.unwrap();

    let json = json_body(response).await;
    assert_eq!(json["effect_weight"]["glitter"], 0);
    assert_eq!(json["total_effect_weight"], 60);
}

#[tokio::test]
async fn test_configured_budget() {
    let orchestrator = Orchestrator::new()
        .with_max_weight(0)
        .with_output_format(OutputFormat::Png);
    let router = create_router(orchestrator, RouterConfig::new().with_tracing(false));

    let body = request_body(json!(["flip"])).to_string();
    let response = router.clone().oneshot(post_json("/", body)).await.unwrap();
    assert_eq!(json_body(response).await["cod"], 3);

    let body = request_body(json!(["negative"])).to_string();
    let response = router.oneshot(post_json("/", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_invalid_image_format() {
    let body = json!({"img": base64(b"GIF? no, just text"), "effects": ["negative"]});
    let response = png_router()
        .oneshot(post_json("/", body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let json = json_body(response).await;
    assert_eq!(json, json!({"cod": 5, "msg": "Invalid image format"}));
}

#[tokio::test]
async fn test_body_limit() {
    let router = create_router(
        Orchestrator::new(),
        RouterConfig::new().with_max_body_bytes(64).with_tracing(false),
    );
    let body = request_body(json!(["negative"])).to_string();
    let response = router.oneshot(post_json("/", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_generous_timeout_does_not_interfere() {
    let router = create_router(
        Orchestrator::new().with_output_format(OutputFormat::Png),
        RouterConfig::new()
            .with_request_timeout(Some(Duration::from_secs(60)))
            .with_tracing(false),
    );
    let body = request_body(json!(["blur", "laplacian"])).to_string();
    let response = router.oneshot(post_json("/", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_expired_timeout_answers_gateway_timeout() {
    let router = create_router(
        Orchestrator::new().with_output_format(OutputFormat::Png),
        RouterConfig::new()
            .with_request_timeout(Some(Duration::from_nanos(1)))
            .with_tracing(false),
    );
    let body = request_body(json!(["blur", "laplacian", "sobel"])).to_string();
    let response = router.oneshot(post_json("/", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let json = json_body(response).await;
    assert_eq!(json["error"], "timeout");
}

// =============================================================================
// Catalog and Probes
// =============================================================================

#[tokio::test]
async fn test_effects_catalog() {
    let response = png_router().oneshot(get("/effects")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["max_weight"], 50);
    let effects = json["effects"].as_array().unwrap();
    assert_eq!(effects.len(), 12);
    assert!(effects.contains(&json!({"name": "scale", "weight": 20})));
}

#[tokio::test]
async fn test_ping() {
    let response = png_router().oneshot(get("/ping")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"msg": "pong"}));
}

#[tokio::test]
async fn test_health() {
    let response = png_router().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_get_on_process_route_not_allowed() {
    let response = png_router().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
