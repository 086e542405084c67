// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Render quality evaluation
//!
//! Three independent engines score a rendered overlay:
//! - `contrast` - WCAG contrast between text and background
//! - `text_fidelity` - OCR read-back compared with the intended text
//! - `overlap` - IoU between the text region and forbidden regions
//!
//! `aggregator` runs any subset of them concurrently and folds the results
//! into one report.

pub mod aggregator;
pub mod color;
pub mod contrast;
pub mod errors;
pub mod overlap;
pub mod similarity;
pub mod text_fidelity;
pub mod types;

pub use aggregator::{overall_score, EngineTimeouts, EvaluationAggregator};
pub use contrast::{BackgroundSource, ColorContrastEngine, ContrastMetrics};
pub use errors::EvaluationError;
pub use overlap::{BoundingBox, OverlapMetrics, SpatialOverlapEngine};
pub use text_fidelity::{TextFidelityEngine, TextFidelityMetrics};
pub use types::{
    AggregateReport, EngineMetrics, EvaluationKind, EvaluationResult, ForbiddenRegion,
    PixelRect, RenderArtifact, TextRegion,
};
