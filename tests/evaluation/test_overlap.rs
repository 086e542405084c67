// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Spatial overlap engine tests

use fabstir_render_eval::evaluation::{
    BoundingBox, ForbiddenRegion, RenderArtifact, SpatialOverlapEngine, TextRegion,
};
use image::DynamicImage;

fn artifact(region: TextRegion) -> RenderArtifact {
    RenderArtifact::new(DynamicImage::new_rgb8(100, 100), "SALE", "FFFFFF", region).unwrap()
}

#[cfg(test)]
mod overlap_tests {
    use super::*;

    #[test]
    fn test_half_covered_detection() {
        let artifact = artifact(TextRegion::new(0.0, 0.0, 0.5, 0.5));
        let detections = vec![ForbiddenRegion::new("pizza", 0.0, 0.0, 50.0, 25.0)];

        let metrics = SpatialOverlapEngine::default().evaluate_artifact(&artifact, &detections);
        assert!((metrics.iou_with_food - 0.5).abs() < 1e-12);
        assert_eq!(metrics.max_iou_detection_id.as_deref(), Some("pizza"));
        assert!(metrics.overlap_detected);
        assert_eq!(metrics.detections_checked, 1);
    }

    #[test]
    fn test_picks_highest_iou_detection() {
        let artifact = artifact(TextRegion::new(0.0, 0.0, 0.5, 0.5));
        let detections = vec![
            ForbiddenRegion::new("fries", 40.0, 40.0, 60.0, 60.0).with_label("fries", 0.8),
            ForbiddenRegion::new("burger", 0.0, 0.0, 40.0, 40.0).with_label("burger", 0.95),
            ForbiddenRegion::new("drink", 80.0, 80.0, 100.0, 100.0),
        ];

        let metrics = SpatialOverlapEngine::default().evaluate_artifact(&artifact, &detections);
        // 1600 / 2500
        assert!((metrics.iou_with_food - 0.64).abs() < 1e-12);
        assert_eq!(metrics.max_iou_detection_id.as_deref(), Some("burger"));
        assert_eq!(metrics.detections_checked, 3);
    }

    #[test]
    fn test_no_detections() {
        let artifact = artifact(TextRegion::new(0.1, 0.1, 0.3, 0.2));
        let metrics = SpatialOverlapEngine::default().evaluate_artifact(&artifact, &[]);

        assert_eq!(metrics.iou_with_food, 0.0);
        assert_eq!(metrics.max_iou_detection_id, None);
        assert!(!metrics.overlap_detected);
        assert_eq!(metrics.detections_checked, 0);
    }

    #[test]
    fn test_touching_boxes_do_not_overlap() {
        let artifact = artifact(TextRegion::new(0.0, 0.0, 0.5, 0.5));
        let detections = vec![ForbiddenRegion::new("salad", 50.0, 0.0, 100.0, 50.0)];

        let metrics = SpatialOverlapEngine::default().evaluate_artifact(&artifact, &detections);
        assert_eq!(metrics.iou_with_food, 0.0);
        assert_eq!(metrics.max_iou_detection_id, None);
        assert_eq!(metrics.detections_checked, 1);
    }

    #[test]
    fn test_threshold_is_strict() {
        let text = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        // 100 / 400
        let detection = ForbiddenRegion::new("plate", 0.0, 0.0, 10.0, 40.0);
        assert!((text.iou(&BoundingBox::from(&detection)) - 0.25).abs() < 1e-12);

        let at_threshold = SpatialOverlapEngine::new(0.25).evaluate(&text, &[detection.clone()]);
        assert!(!at_threshold.overlap_detected);

        let below = SpatialOverlapEngine::new(0.2).evaluate(&text, &[detection]);
        assert!(below.overlap_detected);
    }

    #[test]
    fn test_degenerate_detection_is_ignored() {
        let text = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let detections = vec![ForbiddenRegion::new("line", 5.0, 0.0, 5.0, 10.0)];

        let metrics = SpatialOverlapEngine::default().evaluate(&text, &detections);
        assert_eq!(metrics.iou_with_food, 0.0);
        assert!(!metrics.overlap_detected);
    }
}
