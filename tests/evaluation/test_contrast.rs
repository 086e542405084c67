// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Color contrast engine tests
//!
//! Verifies WCAG luminance and contrast math, threshold selection for large
//! text, and background resolution (sampled, declared, default).

use fabstir_render_eval::config::EvaluationConfig;
use fabstir_render_eval::evaluation::color::{contrast_ratio, parse_hex_rgba, Rgb};
use fabstir_render_eval::evaluation::contrast::{readability_score, WcagThresholds};
use fabstir_render_eval::evaluation::{
    BackgroundSource, ColorContrastEngine, RenderArtifact, TextRegion,
};
use image::{DynamicImage, Rgb as Pixel, RgbImage};

fn solid(width: u32, height: u32, rgb: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Pixel(rgb)))
}

#[cfg(test)]
mod contrast_tests {
    use super::*;

    // =============================================================================
    // Color math
    // =============================================================================

    #[test]
    fn test_luminance_extremes() {
        assert_eq!(Rgb::BLACK.relative_luminance(), 0.0);
        assert!((Rgb::WHITE.relative_luminance() - 1.0).abs() < 1e-12);
        assert!((contrast_ratio(Rgb::BLACK, Rgb::WHITE) - 21.0).abs() < 1e-9);
    }

    #[test]
    fn test_contrast_is_symmetric() {
        let a = Rgb::new(0x33, 0x66, 0x99);
        let b = Rgb::new(0xEE, 0xDD, 0x00);
        assert_eq!(contrast_ratio(a, b), contrast_ratio(b, a));
        assert_eq!(contrast_ratio(a, a), 1.0);
    }

    #[test]
    fn test_rgba_alpha_is_ignored_for_contrast() {
        let opaque = parse_hex_rgba("#FF8800").unwrap();
        let translucent = parse_hex_rgba("FF880080").unwrap();
        assert_eq!(opaque.rgb(), translucent.rgb());
    }

    // =============================================================================
    // Readability score
    // =============================================================================

    #[test]
    fn test_readability_score_anchors() {
        let normal = WcagThresholds::for_text(false);
        assert_eq!(readability_score(4.5, normal), 0.5);
        assert_eq!(readability_score(7.0, normal), 1.0);
        assert_eq!(readability_score(21.0, normal), 1.0);
        assert!((readability_score(2.25, normal) - 0.25).abs() < 1e-12);

        let large = WcagThresholds::for_text(true);
        assert_eq!(readability_score(3.0, large), 0.5);
        assert_eq!(readability_score(4.5, large), 1.0);
    }

    // =============================================================================
    // Engine
    // =============================================================================

    #[test]
    fn test_white_text_on_sampled_black() {
        let artifact = RenderArtifact::new(
            solid(200, 100, [0, 0, 0]),
            "BIG SALE",
            "FFFFFF",
            TextRegion::new(0.1, 0.1, 0.8, 0.5),
        )
        .unwrap();

        let metrics = ColorContrastEngine::default().evaluate(&artifact);
        assert!((metrics.contrast_ratio - 21.0).abs() < 1e-9);
        assert!(metrics.wcag_aa_compliant);
        assert!(metrics.wcag_aaa_compliant);
        assert_eq!(metrics.readability_score, 1.0);
        assert!(!metrics.is_large_text);
        assert_eq!(metrics.background_source, BackgroundSource::Sampled);
    }

    #[test]
    fn test_large_text_relaxes_thresholds() {
        // Gray #949494 on black is about 6.9:1: AA but not AAA for normal text
        let artifact = RenderArtifact::new(
            solid(100, 100, [0, 0, 0]),
            "SALE",
            "949494",
            TextRegion::new(0.0, 0.0, 1.0, 1.0),
        )
        .unwrap();
        let engine = ColorContrastEngine::default();

        let normal = engine.evaluate(&artifact);
        assert!(normal.wcag_aa_compliant);
        assert!(!normal.wcag_aaa_compliant);

        let large = engine.evaluate(&artifact.clone().with_text_size(Some(32.0)).unwrap());
        assert!(large.is_large_text);
        assert!(large.wcag_aaa_compliant);
        assert_eq!(large.readability_score, 1.0);
    }

    #[test]
    fn test_declared_background_used_when_region_is_empty() {
        let artifact = RenderArtifact::new(
            solid(50, 50, [0, 0, 0]),
            "SALE",
            "000000",
            TextRegion::new(0.5, 0.5, 0.0, 0.0),
        )
        .unwrap()
        .with_background_color(Some("#FFFFFF".to_string()));

        let metrics = ColorContrastEngine::default().evaluate(&artifact);
        assert_eq!(metrics.background_source, BackgroundSource::Declared);
        assert_eq!(metrics.background_rgb, Rgb::WHITE);
        assert!((metrics.contrast_ratio - 21.0).abs() < 1e-9);
    }

    #[test]
    fn test_malformed_colors_fall_back_to_configured_defaults() {
        let config = EvaluationConfig {
            default_text_color: "FFFF00".to_string(),
            default_background_color: "0000FF".to_string(),
            ..EvaluationConfig::default()
        };
        let artifact = RenderArtifact::new(
            solid(50, 50, [0, 0, 0]),
            "SALE",
            "not-a-color",
            TextRegion::new(0.5, 0.5, 0.0, 0.0),
        )
        .unwrap()
        .with_background_color(Some("zzz".to_string()));

        let metrics = ColorContrastEngine::from_config(&config).evaluate(&artifact);
        assert_eq!(metrics.text_rgb, Rgb::new(0xFF, 0xFF, 0x00));
        assert_eq!(metrics.background_rgb, Rgb::new(0x00, 0x00, 0xFF));
        assert_eq!(metrics.background_source, BackgroundSource::Default);
    }
}
