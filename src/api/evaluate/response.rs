// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Evaluate response types

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::evaluation::{
    AggregateReport, ContrastMetrics, EvaluationKind, OverlapMetrics, TextFidelityMetrics,
};

/// Response from an overlay evaluation
///
/// Engines that were not requested or that failed serialize as `null`; the
/// reasons for failures are listed in `errors`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResponse {
    pub overlay_id: Uuid,
    pub ocr: Option<TextFidelityMetrics>,
    pub readability: Option<ContrastMetrics>,
    pub iou: Option<OverlapMetrics>,
    pub errors: BTreeMap<EvaluationKind, String>,
    /// Per-engine latency for every engine that ran
    pub latency_ms: BTreeMap<EvaluationKind, u64>,
    pub overall_score: f64,
    pub execution_time_ms: u64,
    pub ocr_backend: String,
    pub evaluated_at: DateTime<Utc>,
}

impl EvaluateResponse {
    pub fn from_report(overlay_id: Uuid, report: &AggregateReport, ocr_backend: &str) -> Self {
        Self {
            overlay_id,
            ocr: report.ocr().cloned(),
            readability: report.readability().cloned(),
            iou: report.iou().cloned(),
            errors: report.errors(),
            latency_ms: report
                .results
                .iter()
                .map(|(kind, result)| (*kind, result.latency_ms()))
                .collect(),
            overall_score: report.overall_score,
            execution_time_ms: report.execution_time_ms,
            ocr_backend: ocr_backend.to_string(),
            evaluated_at: report.evaluated_at,
        }
    }
}
