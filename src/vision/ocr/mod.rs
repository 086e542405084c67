// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text recognition for rendered overlays
//!
//! Components:
//! - `backend` - Backend trait and the shared lazily-initialized handle
//! - `preprocessing` - Line splitting and recognition tensors
//! - `recognition` - PaddleOCR recognition model and CTC decoding
//! - `model` - Combined PaddleOCR pipeline

pub mod backend;
pub mod model;
pub mod preprocessing;
pub mod recognition;

pub use backend::{OcrBackend, OcrOutput, SharedOcrBackend};
pub use model::PaddleOcrModel;
pub use recognition::{CharDictionary, OcrRecognitionModel, RecognizedText};
