// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use fabstir_render_eval::{
    api::{start_server, AppState},
    config::EvaluationConfig,
    evaluation::EvaluationAggregator,
    overlays::FileOverlayStore,
    version,
    vision::ocr_backend_from_config,
};
use std::{env, sync::Arc};
use tokio::signal;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    println!("🚀 Starting {}...\n", version::get_version_string());
    println!("📦 BUILD VERSION: {}", version::VERSION);
    println!();

    let config_path = env::var("EVAL_CONFIG").ok();
    let config = EvaluationConfig::load(config_path.as_deref())?;
    tracing::info!("Configuration: {:?}", config);

    // OCR model loading is deferred to the first OCR evaluation
    let ocr_backend = ocr_backend_from_config(&config)?;
    let aggregator = EvaluationAggregator::from_config(&config, ocr_backend);
    println!(
        "✅ Evaluation engines ready (OCR backend: {})",
        aggregator.ocr_backend_name()
    );

    let store = FileOverlayStore::new(&config.overlay_store_dir);
    println!("📂 Overlay store: {}", store.root().display());

    let state = AppState::new(aggregator, Arc::new(store));
    let host = config.api_host.clone();
    let port = config.api_port;

    println!("🌐 API listening on http://{}:{}", host, port);
    println!("   POST /v1/evaluate");
    println!("   GET  /health\n");

    tokio::select! {
        result = start_server(state, &host, port) => {
            if let Err(e) = result {
                tracing::error!("API server error: {}", e);
                return Err(e);
            }
        }
        _ = signal::ctrl_c() => {
            println!("\n🛑 Shutting down...");
        }
    }

    Ok(())
}
