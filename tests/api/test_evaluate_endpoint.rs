// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Evaluate endpoint tests for POST /v1/evaluate
//!
//! These tests drive the router end to end and verify that:
//! - Malformed bodies and requests are rejected with 400
//! - Unknown overlays return 404 and undecodable ones 422
//! - Engine failures never fail the request
//! - The response envelope is camelCase with null metrics for failed engines

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use fabstir_render_eval::api::{create_router, AppState};
use fabstir_render_eval::evaluation::{
    EvaluationAggregator, ForbiddenRegion, RenderArtifact, TextRegion,
};
use fabstir_render_eval::config::EvaluationConfig;
use fabstir_render_eval::overlays::{
    InMemoryOverlayStore, OverlayError, OverlayStore, ResolvedOverlay,
};
use fabstir_render_eval::vision::ocr::SharedOcrBackend;
use image::{DynamicImage, Rgb, RgbImage};
use mockall::mock;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`
use uuid::Uuid;

mock! {
    pub Store {}

    #[async_trait]
    impl OverlayStore for Store {
        async fn load(&self, id: &Uuid) -> Result<ResolvedOverlay, OverlayError>;
    }
}

/// Test helper: white text over the top-left quarter of a black render,
/// half covering one detection
fn black_overlay() -> ResolvedOverlay {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 100, Rgb([0, 0, 0])));
    ResolvedOverlay {
        artifact: RenderArtifact::new(
            image,
            "SALE",
            "FFFFFF",
            TextRegion::new(0.0, 0.0, 0.5, 0.5),
        )
        .unwrap(),
        detections: vec![ForbiddenRegion::new("pizza", 0.0, 0.0, 50.0, 25.0)],
    }
}

/// Test helper: router with OCR disabled and the given store
fn app_with_store(store: Arc<dyn OverlayStore>) -> Router {
    let aggregator =
        EvaluationAggregator::from_config(&EvaluationConfig::default(), SharedOcrBackend::disabled());
    create_router(AppState::new(aggregator, store))
}

async fn app_with_overlay(id: Uuid) -> Router {
    let store = InMemoryOverlayStore::new();
    store.insert(id, black_overlay()).await;
    app_with_store(Arc::new(store))
}

fn evaluate_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/evaluate")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[cfg(test)]
mod evaluate_endpoint_tests {
    use super::*;

    // =============================================================================
    // Successful evaluations
    // =============================================================================

    #[tokio::test]
    async fn test_evaluate_isolates_ocr_failure() {
        let id = Uuid::new_v4();
        let app = app_with_overlay(id).await;

        let (status, body) = send(app, evaluate_request(json!({ "overlayId": id }))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["overlayId"], id.to_string());
        assert!(body["ocr"].is_null());
        assert!(body["errors"]["ocr"].as_str().unwrap().contains("disabled"));
        assert_eq!(body["readability"]["contrast_ratio"], 21.0);
        assert_eq!(body["readability"]["wcag_aaa_compliant"], true);
        assert_eq!(body["iou"]["iou_with_food"], 0.5);
        assert_eq!(body["iou"]["max_iou_detection_id"], "pizza");
        assert!((body["overallScore"].as_f64().unwrap() - 0.75).abs() < 1e-12);
        assert_eq!(body["ocrBackend"], "disabled");
        assert!(body["executionTimeMs"].is_u64());
    }

    #[tokio::test]
    async fn test_evaluate_requested_types_only() {
        let id = Uuid::new_v4();
        let app = app_with_overlay(id).await;

        let (status, body) = send(
            app,
            evaluate_request(json!({ "overlayId": id, "evaluationTypes": ["readability"] })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["iou"].is_null());
        assert!(body["ocr"].is_null());
        assert!(body["errors"].as_object().unwrap().is_empty());
        assert_eq!(body["latencyMs"].as_object().unwrap().len(), 1);
        assert_eq!(body["overallScore"], 1.0);
    }

    #[tokio::test]
    async fn test_all_engines_failing_is_still_ok() {
        let id = Uuid::new_v4();
        let app = app_with_overlay(id).await;

        let (status, body) = send(
            app,
            evaluate_request(json!({ "overlayId": id, "evaluationTypes": ["ocr"] })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["ocr"].is_null());
        assert_eq!(body["overallScore"], 0.0);
    }

    // =============================================================================
    // Request errors
    // =============================================================================

    #[tokio::test]
    async fn test_malformed_overlay_id() {
        let app = app_with_store(Arc::new(InMemoryOverlayStore::new()));

        let (status, body) = send(app, evaluate_request(json!({ "overlayId": "overlay-7" }))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_type"], "validation_error");
        assert_eq!(body["details"]["field"], "overlayId");
    }

    #[tokio::test]
    async fn test_unparseable_body_is_bad_request() {
        let app = app_with_store(Arc::new(InMemoryOverlayStore::new()));
        let req = Request::builder()
            .method("POST")
            .uri("/v1/evaluate")
            .header("content-type", "application/json")
            .body(Body::from("{\"overlayId\": "))
            .unwrap();

        let (status, body) = send(app, req).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_type"], "invalid_request");
        assert!(body["request_id"].is_string());
    }

    #[tokio::test]
    async fn test_missing_overlay_id_is_bad_request() {
        let app = app_with_store(Arc::new(InMemoryOverlayStore::new()));

        let (status, body) = send(app, evaluate_request(json!({ "evaluationTypes": ["iou"] }))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_type"], "invalid_request");
        assert!(body["message"].as_str().unwrap().contains("overlayId"));
    }

    #[tokio::test]
    async fn test_unknown_evaluation_type() {
        let id = Uuid::new_v4();
        let app = app_with_overlay(id).await;

        let (status, body) = send(
            app,
            evaluate_request(json!({ "overlayId": id, "evaluationTypes": ["ocr", "layout"] })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["field"], "evaluationTypes");
        assert!(body["message"].as_str().unwrap().contains("layout"));
    }

    #[tokio::test]
    async fn test_unknown_overlay_is_not_found() {
        let app = app_with_store(Arc::new(InMemoryOverlayStore::new()));

        let (status, body) = send(
            app,
            evaluate_request(json!({ "overlayId": Uuid::new_v4() })),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error_type"], "not_found");
    }

    #[tokio::test]
    async fn test_unreadable_overlay_is_unprocessable() {
        let id = Uuid::new_v4();
        let mut store = MockStore::new();
        store
            .expect_load()
            .withf(move |requested| *requested == id)
            .times(1)
            .returning(|requested| {
                Err(OverlayError::Unreadable {
                    id: *requested,
                    message: "unsupported image format".to_string(),
                })
            });
        let app = app_with_store(Arc::new(store));

        let (status, body) = send(app, evaluate_request(json!({ "overlayId": id }))).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error_type"], "input_unavailable");
        assert!(body["message"].as_str().unwrap().contains("unsupported image format"));
    }

    #[tokio::test]
    async fn test_invalid_manifest_is_bad_request() {
        let mut store = MockStore::new();
        store.expect_load().returning(|requested| {
            Err(OverlayError::InvalidManifest {
                id: *requested,
                message: "no image source".to_string(),
            })
        });
        let app = app_with_store(Arc::new(store));

        let (status, body) = send(
            app,
            evaluate_request(json!({ "overlayId": Uuid::new_v4() })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["field"], "manifest");
    }

    #[tokio::test]
    async fn test_store_not_consulted_for_invalid_request() {
        let mut store = MockStore::new();
        store.expect_load().times(0);
        let app = app_with_store(Arc::new(store));

        let (status, _) = send(
            app,
            evaluate_request(json!({ "overlayId": Uuid::new_v4(), "evaluationTypes": ["size"] })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    // =============================================================================
    // Health
    // =============================================================================

    #[tokio::test]
    async fn test_health_reports_ocr_backend() {
        let app = app_with_store(Arc::new(InMemoryOverlayStore::new()));
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(app, req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["ocrBackend"], "disabled");
        assert_eq!(body["ocrReady"], false);
        assert!(body["features"].as_array().unwrap().contains(&json!("wcag-contrast")));
    }
}
