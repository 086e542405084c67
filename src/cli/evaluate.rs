// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::config::EvaluationConfig;
use crate::evaluation::{AggregateReport, EvaluationAggregator, EvaluationKind};
use crate::overlays::OverlayManifest;
use crate::vision::ocr_backend_from_config;

/// Arguments for the evaluate command
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Overlay manifest (JSON); relative image paths resolve against its directory
    #[arg(long)]
    pub manifest: PathBuf,

    /// Comma-separated engines to run (ocr, readability, iou); defaults to all
    #[arg(long, value_delimiter = ',')]
    pub types: Vec<String>,

    /// TOML config file with an [evaluation] table
    #[arg(long, env = "EVAL_CONFIG")]
    pub config: Option<String>,

    /// Pretty-print the JSON report
    #[arg(long)]
    pub pretty: bool,
}

/// Evaluate a manifest from disk and print the report as JSON
pub async fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    dotenv::dotenv().ok();

    let config = EvaluationConfig::load(args.config.as_deref())?;
    let report = evaluate_manifest(&config, &args.manifest, &args.types).await?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", json);

    Ok(())
}

pub async fn evaluate_manifest(
    config: &EvaluationConfig,
    manifest_path: &Path,
    types: &[String],
) -> Result<AggregateReport> {
    let kinds = types
        .iter()
        .map(|t| t.parse::<EvaluationKind>())
        .collect::<Result<Vec<_>, _>>()?;

    let json = std::fs::read_to_string(manifest_path)
        .with_context(|| format!("Failed to read manifest {}", manifest_path.display()))?;
    let base_dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));
    let overlay = OverlayManifest::from_json(Uuid::nil(), &json)?.resolve(Uuid::nil(), base_dir)?;

    let aggregator = EvaluationAggregator::from_config(config, ocr_backend_from_config(config)?);
    info!(
        "Evaluating {} with OCR backend '{}'",
        manifest_path.display(),
        aggregator.ocr_backend_name()
    );

    Ok(aggregator
        .evaluate(
            Arc::new(overlay.artifact),
            Arc::from(overlay.detections),
            &kinds,
        )
        .await)
}
