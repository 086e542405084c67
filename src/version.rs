// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the render evaluation node

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-render-eval-2025-11-02";

/// Semantic version number
pub const VERSION_NUMBER: &str = "0.1.0";

/// Build date
pub const BUILD_DATE: &str = "2025-11-02";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "wcag-contrast",
    "ocr-fidelity",
    "paddleocr-cpu",
    "vlm-ocr",
    "forbidden-region-iou",
    "concurrent-aggregation",
    "per-engine-timeouts",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Fabstir Render Eval {} ({})", VERSION_NUMBER, BUILD_DATE)
}
