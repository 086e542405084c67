// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::overlays::OverlayError;

/// JSON error body returned by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    pub request_id: Option<String>,
    pub details: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Validation error for {field}: {message}")]
    ValidationError { field: String, message: String },

    /// Input exists but cannot be used (e.g. undecodable image)
    #[error("Input unavailable: {0}")]
    Unprocessable(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApiError {
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::ValidationError { .. } => "validation_error",
            ApiError::Unprocessable(_) => "input_unavailable",
            ApiError::InternalError(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidRequest(_) | ApiError::ValidationError { .. } => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status().as_u16()
    }

    pub fn to_response(&self, request_id: Option<String>) -> ErrorResponse {
        let (message, details) = match self {
            ApiError::ValidationError { field, message } => (
                message.clone(),
                Some(HashMap::from([(
                    "field".to_string(),
                    serde_json::Value::from(field.as_str()),
                )])),
            ),
            ApiError::NotFound(msg)
            | ApiError::InvalidRequest(msg)
            | ApiError::Unprocessable(msg)
            | ApiError::InternalError(msg) => (msg.clone(), None),
        };

        ErrorResponse {
            error_type: self.error_type().to_string(),
            message,
            request_id,
            details,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl From<OverlayError> for ApiError {
    fn from(err: OverlayError) -> Self {
        match err {
            OverlayError::NotFound(_) => ApiError::NotFound(err.to_string()),
            OverlayError::Unreadable { .. } => ApiError::Unprocessable(err.to_string()),
            OverlayError::InvalidManifest { .. } => ApiError::ValidationError {
                field: "manifest".to_string(),
                message: err.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let request_id = Uuid::new_v4().to_string();
        if self.status().is_server_error() {
            error!(request_id = %request_id, "{}", self);
        }
        (self.status(), Json(self.to_response(Some(request_id)))).into_response()
    }
}
