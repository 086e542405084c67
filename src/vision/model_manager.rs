// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Selects and lazily loads the configured OCR backend

use std::sync::Arc;

use crate::config::{EvaluationConfig, OcrBackendKind};
use crate::vision::ocr::{OcrBackend, PaddleOcrModel, SharedOcrBackend};
use crate::vision::vlm_client::VlmOcrClient;

/// Build the shared OCR handle for the configured backend
///
/// Nothing is loaded here. Model files are read (or the sidecar client built)
/// on the first OCR evaluation, so a missing model only affects OCR results.
pub fn ocr_backend_from_config(config: &EvaluationConfig) -> anyhow::Result<SharedOcrBackend> {
    let backend = match config.ocr_backend {
        OcrBackendKind::Paddle => {
            let dir = config.ocr_model_dir.clone();
            tracing::info!("OCR backend: PaddleOCR from {} (lazy)", dir);
            SharedOcrBackend::lazy("paddleocr", move || {
                let dir = dir.clone();
                async move {
                    let model = PaddleOcrModel::new(&dir).await?;
                    Ok(Arc::new(model) as Arc<dyn OcrBackend>)
                }
            })
        }
        OcrBackendKind::Vlm => {
            let endpoint = config
                .vlm_endpoint
                .clone()
                .ok_or_else(|| anyhow::anyhow!("VLM OCR backend requires vlm_endpoint"))?;
            let model = config.vlm_model.clone();
            // the sidecar request never outlives the OCR engine budget
            let request_timeout = config.ocr_timeout();
            tracing::info!("OCR backend: VLM sidecar at {} ({})", endpoint, model);
            SharedOcrBackend::lazy("vlm", move || {
                let client = VlmOcrClient::with_timeout(&endpoint, &model, request_timeout);
                async move {
                    let client = client?;
                    if !client.health_check().await {
                        tracing::warn!(
                            "⚠️ VLM sidecar at {} ({}) is not answering health checks",
                            client.base_url(),
                            client.model_name()
                        );
                    }
                    Ok(Arc::new(client) as Arc<dyn OcrBackend>)
                }
            })
        }
        OcrBackendKind::Disabled => {
            tracing::warn!("⚠️ OCR backend disabled; OCR evaluations will fail");
            SharedOcrBackend::disabled()
        }
    };

    Ok(backend)
}
