// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod evaluate;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Fabstir render evaluation CLI
#[derive(Parser, Debug)]
#[command(name = "render-eval-cli")]
#[command(version = crate::version::VERSION_NUMBER)]
#[command(about = "Score rendered overlays for readability, OCR fidelity and overlap", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate an overlay manifest from disk
    Evaluate(evaluate::EvaluateArgs),
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Evaluate(args) => evaluate::run_evaluate(args).await,
    }
}
