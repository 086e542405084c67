// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared data model for the evaluation pipeline

use chrono::{DateTime, Utc};
use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::contrast::ContrastMetrics;
use super::errors::EvaluationError;
use super::overlap::OverlapMetrics;
use super::text_fidelity::TextFidelityMetrics;

/// The three independent quality signals
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationKind {
    Ocr,
    Readability,
    Iou,
}

impl EvaluationKind {
    pub const ALL: [EvaluationKind; 3] = [
        EvaluationKind::Ocr,
        EvaluationKind::Readability,
        EvaluationKind::Iou,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationKind::Ocr => "ocr",
            EvaluationKind::Readability => "readability",
            EvaluationKind::Iou => "iou",
        }
    }
}

impl fmt::Display for EvaluationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvaluationKind {
    type Err = EvaluationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ocr" => Ok(EvaluationKind::Ocr),
            "readability" => Ok(EvaluationKind::Readability),
            "iou" => Ok(EvaluationKind::Iou),
            other => Err(EvaluationError::validation(
                "evaluation_types",
                format!(
                    "unsupported evaluation type '{}', supported: [\"ocr\", \"readability\", \"iou\"]",
                    other
                ),
            )),
        }
    }
}

/// Normalized text placement `(x, y, width, height)`, each a ratio of the image size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextRegion {
    pub x_ratio: f64,
    pub y_ratio: f64,
    pub width_ratio: f64,
    pub height_ratio: f64,
}

impl TextRegion {
    pub fn new(x_ratio: f64, y_ratio: f64, width_ratio: f64, height_ratio: f64) -> Self {
        Self {
            x_ratio,
            y_ratio,
            width_ratio,
            height_ratio,
        }
    }

    /// Full-image region
    pub fn full() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    pub fn validate(&self) -> Result<(), EvaluationError> {
        let fields = [
            ("x_ratio", self.x_ratio),
            ("y_ratio", self.y_ratio),
            ("width_ratio", self.width_ratio),
            ("height_ratio", self.height_ratio),
        ];
        for (field, value) in fields {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(EvaluationError::validation(
                    field,
                    format!("must be within [0, 1], got {}", value),
                ));
            }
        }
        Ok(())
    }

    /// Convert to pixel coordinates, clamped to the image bounds
    pub fn to_pixel_rect(&self, image_width: u32, image_height: u32) -> PixelRect {
        let x = ((self.x_ratio * image_width as f64).floor() as u32).min(image_width);
        let y = ((self.y_ratio * image_height as f64).floor() as u32).min(image_height);
        let width = (self.width_ratio * image_width as f64).floor() as u32;
        let height = (self.height_ratio * image_height as f64).floor() as u32;

        PixelRect {
            x,
            y,
            width: width.min(image_width - x),
            height: height.min(image_height - y),
        }
    }
}

/// Axis-aligned rectangle in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }
}

/// A previously detected region that overlay text must avoid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForbiddenRegion {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub confidence: f64,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl ForbiddenRegion {
    pub fn new(id: impl Into<String>, x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            id: id.into(),
            label: String::new(),
            confidence: 1.0,
            x1,
            y1,
            x2,
            y2,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>, confidence: f64) -> Self {
        self.label = label.into();
        self.confidence = confidence;
        self
    }
}

/// A rendered overlay ready for evaluation
///
/// Built once per request and shared read-only between engines.
#[derive(Debug, Clone)]
pub struct RenderArtifact {
    image: Arc<DynamicImage>,
    text: String,
    text_color: String,
    background_color: Option<String>,
    region: TextRegion,
    text_size_px: Option<f64>,
}

impl RenderArtifact {
    pub fn new(
        image: DynamicImage,
        text: impl Into<String>,
        text_color: impl Into<String>,
        region: TextRegion,
    ) -> Result<Self, EvaluationError> {
        region.validate()?;

        if image.width() == 0 || image.height() == 0 {
            return Err(EvaluationError::InputUnavailable(
                "rendered image has zero size".to_string(),
            ));
        }

        Ok(Self {
            image: Arc::new(image),
            text: text.into(),
            text_color: text_color.into(),
            background_color: None,
            region,
            text_size_px: None,
        })
    }

    pub fn with_background_color(mut self, color: Option<String>) -> Self {
        self.background_color = color;
        self
    }

    pub fn with_text_size(mut self, text_size_px: Option<f64>) -> Result<Self, EvaluationError> {
        if let Some(size) = text_size_px {
            if !size.is_finite() || size <= 0.0 {
                return Err(EvaluationError::validation(
                    "text_size_px",
                    format!("must be a positive number, got {}", size),
                ));
            }
        }
        self.text_size_px = text_size_px;
        Ok(self)
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn text_color(&self) -> &str {
        &self.text_color
    }

    pub fn background_color(&self) -> Option<&str> {
        self.background_color.as_deref()
    }

    pub fn region(&self) -> TextRegion {
        self.region
    }

    pub fn text_size_px(&self) -> Option<f64> {
        self.text_size_px
    }

    /// Text region in pixel coordinates
    pub fn text_rect(&self) -> PixelRect {
        let (width, height) = self.dimensions();
        self.region.to_pixel_rect(width, height)
    }
}

/// Outcome of a single engine run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EvaluationResult<T> {
    Success { metrics: T, latency_ms: u64 },
    Failure { reason: String, latency_ms: u64 },
}

impl<T> EvaluationResult<T> {
    pub fn latency_ms(&self) -> u64 {
        match self {
            EvaluationResult::Success { latency_ms, .. }
            | EvaluationResult::Failure { latency_ms, .. } => *latency_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, EvaluationResult::Success { .. })
    }

    pub fn metrics(&self) -> Option<&T> {
        match self {
            EvaluationResult::Success { metrics, .. } => Some(metrics),
            EvaluationResult::Failure { .. } => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            EvaluationResult::Failure { reason, .. } => Some(reason),
            EvaluationResult::Success { .. } => None,
        }
    }
}

/// Metrics produced by any of the engines
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EngineMetrics {
    Ocr(TextFidelityMetrics),
    Readability(ContrastMetrics),
    Iou(OverlapMetrics),
}

impl EngineMetrics {
    pub fn kind(&self) -> EvaluationKind {
        match self {
            EngineMetrics::Ocr(_) => EvaluationKind::Ocr,
            EngineMetrics::Readability(_) => EvaluationKind::Readability,
            EngineMetrics::Iou(_) => EvaluationKind::Iou,
        }
    }

    /// Score in [0, 1] where higher is better
    pub fn normalized_score(&self) -> f64 {
        let score = match self {
            EngineMetrics::Ocr(m) => m.accuracy,
            EngineMetrics::Readability(m) => m.readability_score,
            EngineMetrics::Iou(m) => 1.0 - m.iou_with_food.min(1.0),
        };
        score.clamp(0.0, 1.0)
    }
}

/// Result of one aggregate evaluation
#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    pub results: BTreeMap<EvaluationKind, EvaluationResult<EngineMetrics>>,
    pub overall_score: f64,
    pub execution_time_ms: u64,
    pub evaluated_at: DateTime<Utc>,
}

impl AggregateReport {
    pub fn get(&self, kind: EvaluationKind) -> Option<&EvaluationResult<EngineMetrics>> {
        self.results.get(&kind)
    }

    pub fn ocr(&self) -> Option<&TextFidelityMetrics> {
        match self.get(EvaluationKind::Ocr)?.metrics()? {
            EngineMetrics::Ocr(m) => Some(m),
            _ => None,
        }
    }

    pub fn readability(&self) -> Option<&ContrastMetrics> {
        match self.get(EvaluationKind::Readability)?.metrics()? {
            EngineMetrics::Readability(m) => Some(m),
            _ => None,
        }
    }

    pub fn iou(&self) -> Option<&OverlapMetrics> {
        match self.get(EvaluationKind::Iou)?.metrics()? {
            EngineMetrics::Iou(m) => Some(m),
            _ => None,
        }
    }

    pub fn success_count(&self) -> usize {
        self.results.values().filter(|r| r.is_success()).count()
    }

    /// Failure reasons keyed by engine
    pub fn errors(&self) -> BTreeMap<EvaluationKind, String> {
        self.results
            .iter()
            .filter_map(|(kind, r)| r.failure_reason().map(|reason| (*kind, reason.to_string())))
            .collect()
    }
}
