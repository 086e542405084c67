// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Evaluation node configuration
//!
//! Defaults can be overridden from the `[evaluation]` table of a TOML file and
//! then from environment variables.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Which OCR backend the node should use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrBackendKind {
    /// PaddleOCR ONNX recognition model on CPU
    Paddle,
    /// OpenAI-compatible VLM sidecar
    Vlm,
    Disabled,
}

impl FromStr for OcrBackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "paddle" | "paddleocr" => Ok(OcrBackendKind::Paddle),
            "vlm" => Ok(OcrBackendKind::Vlm),
            "disabled" | "none" | "off" => Ok(OcrBackendKind::Disabled),
            other => Err(anyhow!("unknown OCR backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub iou_threshold: f64,
    pub ocr_timeout_ms: u64,
    pub readability_timeout_ms: u64,
    pub iou_timeout_ms: u64,
    pub sample_window_px: u32,
    pub default_text_color: String,
    pub default_background_color: String,
    pub ocr_backend: OcrBackendKind,
    pub ocr_model_dir: String,
    pub vlm_endpoint: Option<String>,
    pub vlm_model: String,
    pub overlay_store_dir: String,
    pub api_host: String,
    pub api_port: u16,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            iou_threshold: 0.1,
            ocr_timeout_ms: 30_000,
            readability_timeout_ms: 2_000,
            iou_timeout_ms: 2_000,
            sample_window_px: 20,
            default_text_color: "FFFFFF".to_string(),
            default_background_color: "000000".to_string(),
            ocr_backend: OcrBackendKind::Paddle,
            ocr_model_dir: "./models/paddleocr-onnx".to_string(),
            vlm_endpoint: None,
            vlm_model: "qwen3-vl".to_string(),
            overlay_store_dir: "./data/overlays".to_string(),
            api_host: "127.0.0.1".to_string(),
            api_port: 8080,
        }
    }
}

fn env_override<T: FromStr>(key: &str, target: &mut T) {
    if let Ok(val) = std::env::var(key) {
        match val.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => tracing::warn!("Ignoring invalid value for {}: {:?}", key, val),
        }
    }
}

impl EvaluationConfig {
    /// Load the `[evaluation]` table from a TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config {}: {}", path, e))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let toml_value: toml::Value = toml::from_str(content)?;

        match toml_value.get("evaluation") {
            Some(table) => Ok(table.clone().try_into()?),
            None => Ok(Self::default()),
        }
    }

    /// Defaults overridden by environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// File (if given), then environment overrides, then validation
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let mut config = Self::from_file(path)?;
                config.apply_env();
                config
            }
            None => Self::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        env_override("EVAL_IOU_THRESHOLD", &mut self.iou_threshold);
        env_override("EVAL_OCR_TIMEOUT_MS", &mut self.ocr_timeout_ms);
        env_override("EVAL_READABILITY_TIMEOUT_MS", &mut self.readability_timeout_ms);
        env_override("EVAL_IOU_TIMEOUT_MS", &mut self.iou_timeout_ms);
        env_override("OCR_BACKEND", &mut self.ocr_backend);
        env_override("OCR_MODEL_DIR", &mut self.ocr_model_dir);
        env_override("VLM_MODEL_NAME", &mut self.vlm_model);
        env_override("OVERLAY_STORE_DIR", &mut self.overlay_store_dir);
        env_override("API_HOST", &mut self.api_host);
        env_override("API_PORT", &mut self.api_port);

        if let Ok(endpoint) = std::env::var("VLM_ENDPOINT") {
            self.vlm_endpoint = Some(endpoint);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(anyhow!(
                "iou_threshold must be within [0, 1], got {}",
                self.iou_threshold
            ));
        }
        if self.ocr_timeout_ms == 0 || self.readability_timeout_ms == 0 || self.iou_timeout_ms == 0
        {
            return Err(anyhow!("engine timeouts must be greater than zero"));
        }
        if self.ocr_backend == OcrBackendKind::Vlm && self.vlm_endpoint.is_none() {
            return Err(anyhow!("ocr_backend = \"vlm\" requires vlm_endpoint"));
        }
        Ok(())
    }

    pub fn ocr_timeout(&self) -> Duration {
        Duration::from_millis(self.ocr_timeout_ms)
    }

    pub fn readability_timeout(&self) -> Duration {
        Duration::from_millis(self.readability_timeout_ms)
    }

    pub fn iou_timeout(&self) -> Duration {
        Duration::from_millis(self.iou_timeout_ms)
    }
}
