// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Evaluate endpoint handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use std::sync::Arc;
use tracing::{debug, info_span, warn, Instrument};

use super::request::EvaluateRequest;
use super::response::EvaluateResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;

/// POST /v1/evaluate - Score a rendered overlay
///
/// # Request
/// - `overlayId`: UUID of a stored overlay (required)
/// - `evaluationTypes`: any of `ocr`, `readability`, `iou` - defaults to all
///
/// # Response
/// Per-engine metrics (`null` when not requested or failed), failure reasons,
/// `overallScore` and `executionTimeMs`.
///
/// # Errors
/// - 400 Bad Request: unparseable body, malformed id, unknown evaluation type
///   or invalid manifest
/// - 404 Not Found: unknown overlay
/// - 422 Unprocessable Entity: overlay image cannot be decoded
///
/// Engine failures never fail the request; when every engine fails the
/// response is still 200 with an overall score of 0.0.
pub async fn evaluate_handler(
    State(state): State<AppState>,
    payload: Result<Json<EvaluateRequest>, JsonRejection>,
) -> Result<Json<EvaluateResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected evaluate body: {}", rejection.body_text());
        ApiError::from(rejection)
    })?;
    let (overlay_id, kinds) = request.validate().map_err(|e| {
        warn!("Evaluate validation failed: {}", e);
        e
    })?;

    async move {
        debug!("Evaluating {:?}", kinds);

        let overlay = state.store.load(&overlay_id).await.map_err(|e| {
            warn!("Failed to load overlay: {}", e);
            ApiError::from(e)
        })?;

        let report = state
            .aggregator
            .evaluate(
                Arc::new(overlay.artifact),
                Arc::from(overlay.detections),
                &kinds,
            )
            .await;

        Ok(Json(EvaluateResponse::from_report(
            overlay_id,
            &report,
            state.aggregator.ocr_backend_name(),
        )))
    }
    .instrument(info_span!("evaluate", overlay = %overlay_id))
    .await
}
