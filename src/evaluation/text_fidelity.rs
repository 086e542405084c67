// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OCR-based fidelity of rendered overlay text

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::time::Instant;
use tracing::{debug, warn};

use super::errors::EvaluationError;
use super::similarity::{edit_distance, normalize_for_comparison, sequence_ratio, word_match_rate};
use super::types::{EvaluationKind, PixelRect, RenderArtifact};
use crate::vision::image_utils::crop_to_rect;
use crate::vision::ocr::{OcrOutput, SharedOcrBackend};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFidelityMetrics {
    pub recognized_text: String,
    pub ocr_confidence: f32,
    pub accuracy: f64,
    pub character_match_rate: f64,
    pub word_match_rate: f64,
    pub edit_distance: usize,
    pub similarity: f64,
    pub ocr_backend: String,
}

/// Comparison scores between intended and recognized text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextScores {
    pub accuracy: f64,
    pub character_match_rate: f64,
    pub word_match_rate: f64,
    pub edit_distance: usize,
    pub similarity: f64,
}

/// Score recognized text against the intended overlay text
pub fn score_text(ground_truth: &str, recognized: &str) -> TextScores {
    let truth_norm = normalize_for_comparison(ground_truth);
    let recognized_norm = normalize_for_comparison(recognized);

    if truth_norm.is_empty() || recognized_norm.is_empty() {
        return TextScores {
            accuracy: 0.0,
            character_match_rate: 0.0,
            word_match_rate: 0.0,
            edit_distance: truth_norm.chars().count().max(recognized_norm.chars().count()),
            similarity: 0.0,
        };
    }

    let character_match_rate = sequence_ratio(&truth_norm, &recognized_norm);
    let word_match_rate = word_match_rate(ground_truth, recognized);

    TextScores {
        accuracy: (character_match_rate + word_match_rate) / 2.0,
        character_match_rate,
        word_match_rate,
        edit_distance: edit_distance(&truth_norm, &recognized_norm),
        similarity: sequence_ratio(ground_truth, recognized),
    }
}

/// Text fidelity engine
///
/// Recognition errors degrade to an empty read with zero confidence. Only an
/// unavailable backend is reported as an engine failure.
#[derive(Debug, Clone)]
pub struct TextFidelityEngine {
    backend: SharedOcrBackend,
}

impl TextFidelityEngine {
    pub fn new(backend: SharedOcrBackend) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn backend_ready(&self) -> bool {
        self.backend.is_initialized()
    }

    pub async fn evaluate_artifact(
        &self,
        artifact: &RenderArtifact,
    ) -> Result<TextFidelityMetrics, EvaluationError> {
        self.evaluate(artifact.image(), Some(artifact.text_rect()), artifact.text())
            .await
    }

    pub async fn evaluate(
        &self,
        image: &DynamicImage,
        crop: Option<PixelRect>,
        ground_truth: &str,
    ) -> Result<TextFidelityMetrics, EvaluationError> {
        let backend = self
            .backend
            .get()
            .await
            .map_err(|e| EvaluationError::engine(EvaluationKind::Ocr, e.to_string()))?;

        let region = match crop {
            Some(rect) => crop_to_rect(image, rect).map(Cow::Owned),
            None => Some(Cow::Borrowed(image)),
        };

        let start = Instant::now();
        let output = match region {
            Some(region) => match backend.recognize(&region).await {
                Ok(output) => output,
                Err(e) => {
                    warn!("OCR backend '{}' failed, scoring empty text: {}", backend.name(), e);
                    OcrOutput::empty()
                }
            },
            None => {
                debug!("Text region {:?} is empty inside the render, scoring empty text", crop);
                OcrOutput::empty()
            }
        };

        debug!(
            "OCR read {:?} ({:.2} confidence) in {}ms",
            output.text,
            output.confidence,
            start.elapsed().as_millis()
        );

        let scores = score_text(ground_truth, &output.text);

        Ok(TextFidelityMetrics {
            recognized_text: output.text,
            ocr_confidence: output.confidence,
            accuracy: scores.accuracy,
            character_match_rate: scores.character_match_rate,
            word_match_rate: scores.word_match_rate,
            edit_distance: scores.edit_distance,
            similarity: scores.similarity,
            ocr_backend: backend.name().to_string(),
        })
    }
}
