// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Resolution of overlay ids to render artifacts
//!
//! An overlay id names a rendered image together with the metadata the
//! engines need: intended text, colors, text placement, text size and the
//! forbidden regions previously detected in the base image.

pub mod file_store;
pub mod memory_store;

pub use file_store::FileOverlayStore;
pub use memory_store::InMemoryOverlayStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

use crate::evaluation::{EvaluationError, ForbiddenRegion, RenderArtifact, TextRegion};
use crate::vision::image_utils::{decode_base64_image, load_image_file};

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("Overlay {0} not found")]
    NotFound(Uuid),

    #[error("Overlay {id} could not be read: {message}")]
    Unreadable { id: Uuid, message: String },

    #[error("Overlay {id} has an invalid manifest: {message}")]
    InvalidManifest { id: Uuid, message: String },
}

impl From<OverlayError> for EvaluationError {
    fn from(err: OverlayError) -> Self {
        match err {
            OverlayError::InvalidManifest { ref message, .. } => {
                EvaluationError::validation("manifest", message.clone())
            }
            other => EvaluationError::InputUnavailable(other.to_string()),
        }
    }
}

/// An overlay ready for evaluation
#[derive(Debug, Clone)]
pub struct ResolvedOverlay {
    pub artifact: RenderArtifact,
    pub detections: Vec<ForbiddenRegion>,
}

/// Source of overlays by id
#[async_trait]
pub trait OverlayStore: Send + Sync {
    async fn load(&self, id: &Uuid) -> Result<ResolvedOverlay, OverlayError>;
}

fn default_text_color() -> String {
    "FFFFFF".to_string()
}

fn default_region() -> TextRegion {
    TextRegion::full()
}

/// On-disk description of a rendered overlay
///
/// Exactly one of `image_path` (relative to the manifest's directory) or
/// `image_base64` must be set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    pub text: String,
    #[serde(default = "default_text_color")]
    pub text_color: String,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default = "default_region")]
    pub region: TextRegion,
    #[serde(default)]
    pub text_size_px: Option<f64>,
    #[serde(default)]
    pub detections: Vec<ForbiddenRegion>,
}

impl OverlayManifest {
    /// Parse manifest JSON
    pub fn from_json(id: Uuid, json: &str) -> Result<Self, OverlayError> {
        serde_json::from_str(json).map_err(|e| OverlayError::InvalidManifest {
            id,
            message: e.to_string(),
        })
    }

    /// Load the image and build the artifact, resolving paths against `base_dir`
    pub fn resolve(self, id: Uuid, base_dir: &Path) -> Result<ResolvedOverlay, OverlayError> {
        let image = match (&self.image_path, &self.image_base64) {
            (Some(path), None) => load_image_file(base_dir.join(path)),
            (None, Some(data)) => decode_base64_image(data),
            _ => {
                return Err(OverlayError::InvalidManifest {
                    id,
                    message: "exactly one of image_path or image_base64 is required".to_string(),
                })
            }
        }
        .map_err(|e| OverlayError::Unreadable {
            id,
            message: e.to_string(),
        })?;

        let invalid = |e: EvaluationError| match e {
            EvaluationError::InputUnavailable(message) => OverlayError::Unreadable { id, message },
            other => OverlayError::InvalidManifest {
                id,
                message: other.to_string(),
            },
        };

        let artifact = RenderArtifact::new(image, self.text, self.text_color, self.region)
            .map_err(invalid)?
            .with_background_color(self.background_color)
            .with_text_size(self.text_size_px)
            .map_err(invalid)?;

        Ok(ResolvedOverlay {
            artifact,
            detections: self.detections,
        })
    }
}
