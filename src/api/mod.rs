// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod errors;
pub mod evaluate;
pub mod http_server;

pub use errors::{ApiError, ErrorResponse};
pub use evaluate::{evaluate_handler, EvaluateRequest, EvaluateResponse};
pub use http_server::{create_router, start_server, AppState, HealthResponse};
