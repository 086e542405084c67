// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Evaluate request types and validation

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::evaluation::EvaluationKind;

/// Request for evaluating a rendered overlay
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    /// Overlay identifier (UUID)
    pub overlay_id: String,

    /// Engines to run (ocr, readability, iou); all when absent or empty
    #[serde(default)]
    pub evaluation_types: Option<Vec<String>>,
}

impl EvaluateRequest {
    /// Validate the request, returning the parsed id and requested engines
    pub fn validate(&self) -> Result<(Uuid, Vec<EvaluationKind>), ApiError> {
        let overlay_id =
            Uuid::parse_str(self.overlay_id.trim()).map_err(|e| ApiError::ValidationError {
                field: "overlayId".to_string(),
                message: format!("must be a UUID: {}", e),
            })?;

        let kinds = self
            .evaluation_types
            .iter()
            .flatten()
            .map(|name| {
                name.parse::<EvaluationKind>()
                    .map_err(|_| ApiError::ValidationError {
                        field: "evaluationTypes".to_string(),
                        message: format!(
                            "unknown evaluation type '{}', supported: ocr, readability, iou",
                            name
                        ),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok((overlay_id, kinds))
    }
}
