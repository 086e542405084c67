// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing for overlay evaluation
//!
//! This module provides:
//! - Image decoding and region helpers
//! - OCR via PaddleOCR (CPU) or a VLM sidecar

pub mod image_utils;
pub mod model_manager;
pub mod ocr;
pub mod vlm_client;

pub use image_utils::{decode_base64_image, decode_image_bytes, load_image_file, ImageError};
pub use model_manager::ocr_backend_from_config;
pub use vlm_client::VlmOcrClient;
