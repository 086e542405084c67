// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Concurrent fan-out over the evaluation engines
//!
//! Each requested engine runs as its own task with an independent timeout.
//! Contrast and overlap are pure CPU work and go to the blocking pool; OCR is
//! async because the backend may be a remote sidecar. A failed, panicked or
//! timed out engine is recorded as `Failure` and never fails the report.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, info_span, warn, Instrument};

use super::contrast::ColorContrastEngine;
use super::errors::EvaluationError;
use super::overlap::SpatialOverlapEngine;
use super::text_fidelity::TextFidelityEngine;
use super::types::{
    AggregateReport, EngineMetrics, EvaluationKind, EvaluationResult, ForbiddenRegion,
    RenderArtifact,
};
use crate::config::EvaluationConfig;
use crate::vision::ocr::SharedOcrBackend;

/// Per-engine time budgets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineTimeouts {
    pub ocr: Duration,
    pub readability: Duration,
    pub iou: Duration,
}

impl Default for EngineTimeouts {
    fn default() -> Self {
        Self {
            ocr: Duration::from_secs(30),
            readability: Duration::from_secs(2),
            iou: Duration::from_secs(2),
        }
    }
}

impl EngineTimeouts {
    pub fn from_config(config: &EvaluationConfig) -> Self {
        Self {
            ocr: config.ocr_timeout(),
            readability: config.readability_timeout(),
            iou: config.iou_timeout(),
        }
    }

    pub fn for_kind(&self, kind: EvaluationKind) -> Duration {
        match kind {
            EvaluationKind::Ocr => self.ocr,
            EvaluationKind::Readability => self.readability,
            EvaluationKind::Iou => self.iou,
        }
    }
}

/// Mean normalized score over successful engines, 0.0 when none succeeded
pub fn overall_score(results: &BTreeMap<EvaluationKind, EvaluationResult<EngineMetrics>>) -> f64 {
    let scores: Vec<f64> = results
        .values()
        .filter_map(|r| r.metrics())
        .map(EngineMetrics::normalized_score)
        .collect();

    if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

/// Requested kinds, deduplicated; an empty request selects every engine
pub fn resolve_requested(requested: &[EvaluationKind]) -> BTreeSet<EvaluationKind> {
    if requested.is_empty() {
        EvaluationKind::ALL.iter().copied().collect()
    } else {
        requested.iter().copied().collect()
    }
}

#[derive(Debug, Clone)]
pub struct EvaluationAggregator {
    contrast: Arc<ColorContrastEngine>,
    text: Arc<TextFidelityEngine>,
    overlap: Arc<SpatialOverlapEngine>,
    timeouts: EngineTimeouts,
}

impl EvaluationAggregator {
    pub fn new(
        contrast: ColorContrastEngine,
        text: TextFidelityEngine,
        overlap: SpatialOverlapEngine,
        timeouts: EngineTimeouts,
    ) -> Self {
        Self {
            contrast: Arc::new(contrast),
            text: Arc::new(text),
            overlap: Arc::new(overlap),
            timeouts,
        }
    }

    pub fn from_config(config: &EvaluationConfig, ocr_backend: SharedOcrBackend) -> Self {
        Self::new(
            ColorContrastEngine::from_config(config),
            TextFidelityEngine::new(ocr_backend),
            SpatialOverlapEngine::new(config.iou_threshold),
            EngineTimeouts::from_config(config),
        )
    }

    pub fn timeouts(&self) -> EngineTimeouts {
        self.timeouts
    }

    pub fn ocr_backend_name(&self) -> &str {
        self.text.backend_name()
    }

    pub fn ocr_backend_ready(&self) -> bool {
        self.text.backend_ready()
    }

    /// Run the requested engines against one artifact and merge the results
    ///
    /// Waits for every dispatched engine to finish, fail or time out before
    /// computing the overall score.
    pub async fn evaluate(
        &self,
        artifact: Arc<RenderArtifact>,
        detections: Arc<[ForbiddenRegion]>,
        requested: &[EvaluationKind],
    ) -> AggregateReport {
        let kinds = resolve_requested(requested);
        let (width, height) = artifact.dimensions();
        let span = info_span!("aggregate", engines = kinds.len(), width, height);

        async move {
            let start = Instant::now();

            let runs = kinds.iter().map(|&kind| {
                let handle = self.dispatch(kind, artifact.clone(), detections.clone());
                self.supervise(kind, handle)
            });
            let results: BTreeMap<_, _> = join_all(runs).await.into_iter().collect();

            let overall = overall_score(&results);
            let execution_time_ms = start.elapsed().as_millis() as u64;
            let succeeded = results.values().filter(|r| r.is_success()).count();

            info!(
                "Evaluation finished: {}/{} engines succeeded, overall {:.3} in {}ms",
                succeeded,
                results.len(),
                overall,
                execution_time_ms
            );

            AggregateReport {
                results,
                overall_score: overall,
                execution_time_ms,
                evaluated_at: Utc::now(),
            }
        }
        .instrument(span)
        .await
    }

    fn dispatch(
        &self,
        kind: EvaluationKind,
        artifact: Arc<RenderArtifact>,
        detections: Arc<[ForbiddenRegion]>,
    ) -> JoinHandle<Result<EngineMetrics, EvaluationError>> {
        match kind {
            EvaluationKind::Readability => {
                let engine = self.contrast.clone();
                tokio::task::spawn_blocking(move || {
                    Ok(EngineMetrics::Readability(engine.evaluate(&artifact)))
                })
            }
            EvaluationKind::Iou => {
                let engine = self.overlap.clone();
                tokio::task::spawn_blocking(move || {
                    Ok(EngineMetrics::Iou(
                        engine.evaluate_artifact(&artifact, &detections),
                    ))
                })
            }
            EvaluationKind::Ocr => {
                let engine = self.text.clone();
                tokio::spawn(
                    async move {
                        engine
                            .evaluate_artifact(&artifact)
                            .await
                            .map(EngineMetrics::Ocr)
                    }
                    .in_current_span(),
                )
            }
        }
    }

    async fn supervise(
        &self,
        kind: EvaluationKind,
        handle: JoinHandle<Result<EngineMetrics, EvaluationError>>,
    ) -> (EvaluationKind, EvaluationResult<EngineMetrics>) {
        let budget = self.timeouts.for_kind(kind);
        let abort = handle.abort_handle();
        let start = Instant::now();

        let outcome = match timeout(budget, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(EvaluationError::engine(
                kind,
                format!("engine task aborted: {}", join_error),
            )),
            Err(_) => {
                abort.abort();
                Err(EvaluationError::Timeout {
                    kind,
                    budget_ms: budget.as_millis() as u64,
                })
            }
        };
        let latency_ms = start.elapsed().as_millis() as u64;

        let result = match outcome {
            Ok(metrics) => {
                debug!("{} engine succeeded in {}ms", kind, latency_ms);
                EvaluationResult::Success {
                    metrics,
                    latency_ms,
                }
            }
            Err(e) => {
                warn!("{} engine failed after {}ms: {}", kind, latency_ms, e);
                EvaluationResult::Failure {
                    reason: e.to_string(),
                    latency_ms,
                }
            }
        };

        (kind, result)
    }
}
