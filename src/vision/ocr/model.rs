// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PaddleOCR pipeline: line splitting followed by per-line recognition

use anyhow::{Context, Result};
use async_trait::async_trait;
use image::DynamicImage;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::backend::{OcrBackend, OcrOutput};
use super::preprocessing::{line_bands, preprocess_for_recognition};
use super::recognition::{OcrRecognitionModel, RecognizedText};
use crate::vision::image_utils::crop_to_rect;

/// Recognition model file expected in the model directory
pub const RECOGNITION_MODEL_FILE: &str = "rec_model.onnx";
/// Character dictionary expected in the model directory
pub const DICTIONARY_FILE: &str = "ppocr_keys_v1.txt";

/// PaddleOCR model for text extraction (CPU-only)
#[derive(Debug, Clone)]
pub struct PaddleOcrModel {
    recognizer: Arc<OcrRecognitionModel>,
}

impl PaddleOcrModel {
    /// Load the recognition model from `model_dir`
    ///
    /// Expected files:
    /// - rec_model.onnx (text recognition)
    /// - ppocr_keys_v1.txt (character dictionary)
    pub async fn new(model_dir: &str) -> Result<Self> {
        let dir = Path::new(model_dir);
        let model_path = dir.join(RECOGNITION_MODEL_FILE);
        let dict_path = dir.join(DICTIONARY_FILE);

        info!("Loading PaddleOCR models from {}", model_dir);

        // Session creation is blocking
        let recognizer = tokio::task::spawn_blocking(move || {
            OcrRecognitionModel::new(&model_path, &dict_path)
        })
        .await
        .context("OCR model loading task failed")??;

        Ok(Self {
            recognizer: Arc::new(recognizer),
        })
    }

    /// Recognize every text line in the image, top to bottom
    pub fn process(&self, image: &DynamicImage) -> Result<OcrOutput> {
        let start = Instant::now();

        let lines: Vec<RecognizedText> = line_bands(image)
            .into_iter()
            .filter_map(|band| crop_to_rect(image, band))
            .map(|line| self.recognizer.recognize(&preprocess_for_recognition(&line)))
            .collect::<Result<_>>()?;

        let recognized: Vec<&RecognizedText> = lines.iter().filter(|l| !l.is_empty()).collect();
        debug!("Recognized {} of {} lines", recognized.len(), lines.len());

        let text = recognized
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let confidence = if recognized.is_empty() {
            0.0
        } else {
            recognized.iter().map(|l| l.confidence).sum::<f32>() / recognized.len() as f32
        };

        Ok(OcrOutput {
            text,
            confidence,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[async_trait]
impl OcrBackend for PaddleOcrModel {
    fn name(&self) -> &str {
        "paddleocr"
    }

    async fn recognize(&self, image: &DynamicImage) -> Result<OcrOutput> {
        let model = self.clone();
        let image = image.clone();
        tokio::task::spawn_blocking(move || model.process(&image))
            .await
            .context("OCR inference task failed")?
    }
}
