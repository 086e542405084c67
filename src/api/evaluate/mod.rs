// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Evaluation API endpoint module
//!
//! Provides POST /v1/evaluate for scoring rendered overlays.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::evaluate_handler;
pub use request::EvaluateRequest;
pub use response::EvaluateResponse;
