// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::State,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::evaluate::evaluate_handler;
use crate::evaluation::EvaluationAggregator;
use crate::overlays::OverlayStore;
use crate::version;

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<EvaluationAggregator>,
    pub store: Arc<dyn OverlayStore>,
}

impl AppState {
    pub fn new(aggregator: EvaluationAggregator, store: Arc<dyn OverlayStore>) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
            store,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub build: String,
    pub features: Vec<String>,
    pub ocr_backend: String,
    /// Whether the OCR model has been loaded yet
    pub ocr_ready: bool,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/evaluate", post(evaluate_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn start_server(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("{}:{}", host, port).parse::<SocketAddr>()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: version::VERSION_NUMBER.to_string(),
        build: version::VERSION.to_string(),
        features: version::FEATURES.iter().map(|f| f.to_string()).collect(),
        ocr_backend: state.aggregator.ocr_backend_name().to_string(),
        ocr_ready: state.aggregator.ocr_backend_ready(),
    })
}
