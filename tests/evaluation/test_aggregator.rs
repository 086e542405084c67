// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Evaluation aggregator tests
//!
//! Covers concurrent dispatch, per-engine failure isolation, timeouts and
//! the overall score over successful engines.

use anyhow::Result;
use async_trait::async_trait;
use fabstir_render_eval::evaluation::{
    ColorContrastEngine, EngineTimeouts, EvaluationAggregator, EvaluationKind, EvaluationResult,
    ForbiddenRegion, RenderArtifact, SpatialOverlapEngine, TextFidelityEngine, TextRegion,
};
use fabstir_render_eval::vision::ocr::{OcrBackend, OcrOutput, SharedOcrBackend};
use image::{DynamicImage, Rgb, RgbImage};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct EchoBackend {
    text: String,
    delay: Duration,
}

#[async_trait]
impl OcrBackend for EchoBackend {
    fn name(&self) -> &str {
        "echo"
    }

    async fn recognize(&self, _image: &DynamicImage) -> Result<OcrOutput> {
        tokio::time::sleep(self.delay).await;
        Ok(OcrOutput {
            text: self.text.clone(),
            confidence: 0.9,
            processing_time_ms: self.delay.as_millis() as u64,
        })
    }
}

struct PanickingBackend;

#[async_trait]
impl OcrBackend for PanickingBackend {
    fn name(&self) -> &str {
        "panicking"
    }

    async fn recognize(&self, _image: &DynamicImage) -> Result<OcrOutput> {
        panic!("recognition session corrupted");
    }
}

fn echo(text: &str, delay: Duration) -> SharedOcrBackend {
    SharedOcrBackend::ready(Arc::new(EchoBackend {
        text: text.to_string(),
        delay,
    }))
}

/// White "SALE" over the top-left quarter of a black 100x100 render
fn black_render() -> Arc<RenderArtifact> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 100, Rgb([0, 0, 0])));
    Arc::new(
        RenderArtifact::new(image, "SALE", "FFFFFF", TextRegion::new(0.0, 0.0, 0.5, 0.5)).unwrap(),
    )
}

fn half_overlap() -> Arc<[ForbiddenRegion]> {
    Arc::from(vec![ForbiddenRegion::new("pizza", 0.0, 0.0, 50.0, 25.0)])
}

fn aggregator(backend: SharedOcrBackend, timeouts: EngineTimeouts) -> EvaluationAggregator {
    EvaluationAggregator::new(
        ColorContrastEngine::default(),
        TextFidelityEngine::new(backend),
        SpatialOverlapEngine::default(),
        timeouts,
    )
}

#[cfg(test)]
mod aggregator_tests {
    use super::*;

    #[tokio::test]
    async fn test_all_engines_succeed() {
        let agg = aggregator(echo("SALE", Duration::ZERO), EngineTimeouts::default());
        let report = agg.evaluate(black_render(), half_overlap(), &[]).await;

        assert_eq!(report.results.len(), 3);
        assert_eq!(report.success_count(), 3);
        assert!(report.errors().is_empty());

        assert_eq!(report.ocr().unwrap().accuracy, 1.0);
        assert_eq!(report.readability().unwrap().readability_score, 1.0);
        assert!((report.iou().unwrap().iou_with_food - 0.5).abs() < 1e-12);

        // (1.0 + 1.0 + 0.5) / 3
        assert!((report.overall_score - 2.5 / 3.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_failed_engine_excluded_from_overall_score() {
        let agg = aggregator(SharedOcrBackend::disabled(), EngineTimeouts::default());
        let report = agg.evaluate(black_render(), half_overlap(), &[]).await;

        assert_eq!(report.success_count(), 2);
        assert!(matches!(
            report.get(EvaluationKind::Ocr),
            Some(EvaluationResult::Failure { .. })
        ));
        assert!(report.ocr().is_none());
        // mean of readability 1.0 and overlap 0.5
        assert!((report.overall_score - 0.75).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_zero_successes_scores_zero() {
        let agg = aggregator(SharedOcrBackend::disabled(), EngineTimeouts::default());
        let report = agg
            .evaluate(black_render(), half_overlap(), &[EvaluationKind::Ocr])
            .await;

        assert_eq!(report.results.len(), 1);
        assert_eq!(report.success_count(), 0);
        assert_eq!(report.overall_score, 0.0);
        let reason = report.errors().remove(&EvaluationKind::Ocr).unwrap();
        assert!(reason.contains("disabled"));
    }

    #[tokio::test]
    async fn test_slow_ocr_times_out_without_blocking_others() {
        let timeouts = EngineTimeouts {
            ocr: Duration::from_millis(50),
            ..EngineTimeouts::default()
        };
        let agg = aggregator(echo("SALE", Duration::from_secs(10)), timeouts);
        let report = agg.evaluate(black_render(), half_overlap(), &[]).await;

        let reason = report.errors().remove(&EvaluationKind::Ocr).unwrap();
        assert!(reason.contains("timed out"));
        assert!(report.readability().is_some());
        assert!(report.iou().is_some());
        assert!((report.overall_score - 0.75).abs() < 1e-12);
        assert!(report.execution_time_ms < 10_000);
    }

    #[tokio::test]
    async fn test_panicking_engine_is_recorded_as_failure() {
        let agg = aggregator(
            SharedOcrBackend::ready(Arc::new(PanickingBackend)),
            EngineTimeouts::default(),
        );
        let report = agg.evaluate(black_render(), half_overlap(), &[]).await;

        assert!(matches!(
            report.get(EvaluationKind::Ocr),
            Some(EvaluationResult::Failure { .. })
        ));
        assert!(report.readability().is_some());
        assert!(report.iou().is_some());
        assert_eq!(report.success_count(), 2);
        assert!((report.overall_score - 0.75).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_slow_backend_load_survives_ocr_timeout() {
        let inits = Arc::new(AtomicUsize::new(0));
        let counter = inits.clone();
        let backend = SharedOcrBackend::lazy("echo", move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(Arc::new(EchoBackend {
                    text: "SALE".to_string(),
                    delay: Duration::ZERO,
                }) as Arc<dyn OcrBackend>)
            }
        });
        let timeouts = EngineTimeouts {
            ocr: Duration::from_millis(20),
            ..EngineTimeouts::default()
        };
        let agg = aggregator(backend, timeouts);

        // both land while the model is still loading
        for _ in 0..2 {
            let report = agg
                .evaluate(black_render(), half_overlap(), &[EvaluationKind::Ocr])
                .await;
            let reason = report.errors().remove(&EvaluationKind::Ocr).unwrap();
            assert!(reason.contains("timed out"));
        }

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(agg.ocr_backend_ready());

        let report = agg
            .evaluate(black_render(), half_overlap(), &[EvaluationKind::Ocr])
            .await;
        assert_eq!(report.ocr().unwrap().recognized_text, "SALE");
        assert_eq!(inits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_execution_time_covers_slowest_engine() {
        let agg = aggregator(echo("SALE", Duration::from_millis(100)), EngineTimeouts::default());
        let report = agg.evaluate(black_render(), half_overlap(), &[]).await;

        let max_latency = report
            .results
            .values()
            .map(|r| r.latency_ms())
            .max()
            .unwrap();
        assert!(report.get(EvaluationKind::Ocr).unwrap().latency_ms() >= 100);
        assert!(report.execution_time_ms >= max_latency);
    }

    #[tokio::test]
    async fn test_duplicate_requests_run_once() {
        let agg = aggregator(echo("SALE", Duration::ZERO), EngineTimeouts::default());
        let report = agg
            .evaluate(
                black_render(),
                half_overlap(),
                &[EvaluationKind::Iou, EvaluationKind::Iou, EvaluationKind::Readability],
            )
            .await;

        assert_eq!(report.results.len(), 2);
        assert!(report.get(EvaluationKind::Ocr).is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_lazy_backend_shared_across_evaluations() {
        let inits = Arc::new(AtomicUsize::new(0));
        let counter = inits.clone();
        let backend = SharedOcrBackend::lazy("echo", move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(Arc::new(EchoBackend {
                    text: "SALE".to_string(),
                    delay: Duration::ZERO,
                }) as Arc<dyn OcrBackend>)
            }
        });
        let agg = Arc::new(aggregator(backend, EngineTimeouts::default()));

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let agg = agg.clone();
                tokio::spawn(async move {
                    agg.evaluate(black_render(), half_overlap(), &[EvaluationKind::Ocr])
                        .await
                })
            })
            .collect();

        for handle in handles {
            let report = handle.await.unwrap();
            assert_eq!(report.ocr().unwrap().recognized_text, "SALE");
        }
        assert_eq!(inits.load(Ordering::SeqCst), 1);
    }
}
