// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error taxonomy for render quality evaluation

use thiserror::Error;

use super::types::EvaluationKind;

/// Errors raised while preparing or running an evaluation
///
/// Only `Validation` and `InputUnavailable` abort a whole request. Engine-level
/// errors (`EngineFailure`, `Timeout`) are recorded per engine in the report and
/// never escalate.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EvaluationError {
    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Input unavailable: {0}")]
    InputUnavailable(String),

    #[error("{kind} engine failed: {reason}")]
    EngineFailure { kind: EvaluationKind, reason: String },

    #[error("{kind} engine timed out after {budget_ms}ms")]
    Timeout { kind: EvaluationKind, budget_ms: u64 },
}

impl EvaluationError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EvaluationError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn engine(kind: EvaluationKind, reason: impl Into<String>) -> Self {
        EvaluationError::EngineFailure {
            kind,
            reason: reason.into(),
        }
    }

    /// Whether this error should fail the whole request
    pub fn is_hard_failure(&self) -> bool {
        matches!(
            self,
            EvaluationError::Validation { .. } | EvaluationError::InputUnavailable(_)
        )
    }
}
