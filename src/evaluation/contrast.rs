// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! WCAG readability scoring for overlay text
//!
//! The background behind the text is resolved in order:
//! 1. Mean of a small centered window of rendered pixels inside the text region
//! 2. The overlay's declared background color
//! 3. Opaque black

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::color::{contrast_ratio, parse_hex_color, parse_hex_rgba, Rgb};
use super::types::{PixelRect, RenderArtifact};
use crate::config::EvaluationConfig;
use crate::vision::image_utils::average_color;

/// Largest sampling window edge in pixels
pub const DEFAULT_SAMPLE_WINDOW_PX: u32 = 20;

/// Text at or above this point size counts as large
pub const LARGE_TEXT_MIN_PT: f64 = 18.0;

/// CSS pixels per point
const PX_PER_PT: f64 = 1.33;

/// Where the background color came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundSource {
    Sampled,
    Declared,
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContrastMetrics {
    pub contrast_ratio: f64,
    pub wcag_aa_compliant: bool,
    pub wcag_aaa_compliant: bool,
    pub readability_score: f64,
    pub is_large_text: bool,
    pub text_rgb: Rgb,
    pub background_rgb: Rgb,
    pub background_source: BackgroundSource,
}

/// WCAG AA/AAA thresholds for a text size class
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WcagThresholds {
    pub aa: f64,
    pub aaa: f64,
}

impl WcagThresholds {
    pub fn for_text(is_large: bool) -> Self {
        if is_large {
            Self { aa: 3.0, aaa: 4.5 }
        } else {
            Self { aa: 4.5, aaa: 7.0 }
        }
    }
}

/// Large text is at least 18pt, with `pt = px / 1.33`
pub fn is_large_text(text_size_px: Option<f64>) -> bool {
    text_size_px
        .map(|px| px / PX_PER_PT >= LARGE_TEXT_MIN_PT)
        .unwrap_or(false)
}

/// Map a contrast ratio to [0, 1]
///
/// AAA-compliant text scores 1.0, AA-compliant text lands in [0.5, 1.0), and
/// anything below AA scales linearly up to 0.5.
pub fn readability_score(ratio: f64, thresholds: WcagThresholds) -> f64 {
    let WcagThresholds { aa, aaa } = thresholds;
    if ratio >= aaa {
        1.0
    } else if ratio >= aa {
        0.5 + ((ratio - aa) / (aaa - aa) * 0.5).min(0.5)
    } else {
        (ratio / aa * 0.5).min(0.5)
    }
}

/// Color contrast engine
///
/// Pure numeric work over a read-only artifact; never fails.
#[derive(Debug, Clone)]
pub struct ColorContrastEngine {
    sample_window_px: u32,
    default_text_color: Rgb,
    default_background: Rgb,
}

impl Default for ColorContrastEngine {
    fn default() -> Self {
        Self {
            sample_window_px: DEFAULT_SAMPLE_WINDOW_PX,
            default_text_color: Rgb::WHITE,
            default_background: Rgb::BLACK,
        }
    }
}

impl ColorContrastEngine {
    pub fn from_config(config: &EvaluationConfig) -> Self {
        Self {
            sample_window_px: config.sample_window_px.max(1),
            default_text_color: parse_hex_color(&config.default_text_color, Rgb::WHITE),
            default_background: parse_hex_color(&config.default_background_color, Rgb::BLACK),
        }
    }

    pub fn evaluate(&self, artifact: &RenderArtifact) -> ContrastMetrics {
        let text_rgb = parse_hex_color(artifact.text_color(), self.default_text_color);
        let (background_rgb, source) = self.resolve_background(artifact);

        debug!(
            "Contrast inputs: text=#{} background=#{} ({:?})",
            text_rgb.to_hex(),
            background_rgb.to_hex(),
            source
        );

        self.evaluate_colors(text_rgb, background_rgb, source, artifact.text_size_px())
    }

    pub fn evaluate_colors(
        &self,
        text_rgb: Rgb,
        background_rgb: Rgb,
        background_source: BackgroundSource,
        text_size_px: Option<f64>,
    ) -> ContrastMetrics {
        let ratio = contrast_ratio(text_rgb, background_rgb);
        let large = is_large_text(text_size_px);
        let thresholds = WcagThresholds::for_text(large);

        ContrastMetrics {
            contrast_ratio: ratio,
            wcag_aa_compliant: ratio >= thresholds.aa,
            wcag_aaa_compliant: ratio >= thresholds.aaa,
            readability_score: readability_score(ratio, thresholds),
            is_large_text: large,
            text_rgb,
            background_rgb,
            background_source,
        }
    }

    /// Resolve the effective background behind the text
    pub fn resolve_background(&self, artifact: &RenderArtifact) -> (Rgb, BackgroundSource) {
        if let Some(sampled) = self.sample_background(artifact.image(), artifact.text_rect()) {
            return (sampled, BackgroundSource::Sampled);
        }

        if let Some(declared) = artifact.background_color() {
            match parse_hex_rgba(declared) {
                Ok(rgba) => return (rgba.rgb(), BackgroundSource::Declared),
                Err(e) => debug!("Ignoring declared background {:?}: {}", declared, e),
            }
        }

        (self.default_background, BackgroundSource::Default)
    }

    /// Average a centered window inside `region`
    ///
    /// The window is at most `sample_window_px` square and no larger than a
    /// quarter of the region on each axis.
    pub fn sample_background(&self, image: &DynamicImage, region: PixelRect) -> Option<Rgb> {
        if region.is_empty() {
            return None;
        }

        let window_w = self.sample_window_px.min((region.width / 4).max(1));
        let window_h = self.sample_window_px.min((region.height / 4).max(1));
        let center_x = region.x + region.width / 2;
        let center_y = region.y + region.height / 2;

        let window = PixelRect::new(
            center_x.saturating_sub(window_w / 2),
            center_y.saturating_sub(window_h / 2),
            window_w,
            window_h,
        );

        average_color(image, window).map(|[r, g, b]| Rgb::new(r, g, b))
    }
}
