// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Overlap between overlay text and forbidden image regions

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{ForbiddenRegion, PixelRect, RenderArtifact};

/// Default IoU above which text is considered to cover a forbidden region
pub const DEFAULT_IOU_THRESHOLD: f64 = 0.1;

/// Corner-form box in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn intersection_area(&self, other: &Self) -> f64 {
        let overlap = BoundingBox::new(
            self.x1.max(other.x1),
            self.y1.max(other.y1),
            self.x2.min(other.x2),
            self.y2.min(other.y2),
        );
        overlap.area()
    }

    /// Intersection over union, 0.0 for disjoint or degenerate boxes
    pub fn iou(&self, other: &Self) -> f64 {
        let intersection = self.intersection_area(other);
        let union = self.area() + other.area() - intersection;
        if intersection <= 0.0 || union <= 0.0 {
            0.0
        } else {
            intersection / union
        }
    }
}

impl From<PixelRect> for BoundingBox {
    fn from(rect: PixelRect) -> Self {
        BoundingBox::new(
            rect.x as f64,
            rect.y as f64,
            rect.right() as f64,
            rect.bottom() as f64,
        )
    }
}

impl From<&ForbiddenRegion> for BoundingBox {
    fn from(region: &ForbiddenRegion) -> Self {
        BoundingBox::new(region.x1, region.y1, region.x2, region.y2)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlapMetrics {
    /// Highest IoU against any forbidden region
    pub iou_with_food: f64,
    pub max_iou_detection_id: Option<String>,
    pub overlap_detected: bool,
    pub detections_checked: usize,
}

/// Spatial overlap engine
#[derive(Debug, Clone)]
pub struct SpatialOverlapEngine {
    threshold: f64,
}

impl Default for SpatialOverlapEngine {
    fn default() -> Self {
        Self::new(DEFAULT_IOU_THRESHOLD)
    }
}

impl SpatialOverlapEngine {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn evaluate_artifact(
        &self,
        artifact: &RenderArtifact,
        detections: &[ForbiddenRegion],
    ) -> OverlapMetrics {
        self.evaluate(&BoundingBox::from(artifact.text_rect()), detections)
    }

    pub fn evaluate(&self, text_box: &BoundingBox, detections: &[ForbiddenRegion]) -> OverlapMetrics {
        let mut max_iou = 0.0;
        let mut max_id: Option<&str> = None;

        for detection in detections {
            let iou = text_box.iou(&BoundingBox::from(detection));
            if iou > max_iou {
                max_iou = iou;
                max_id = Some(&detection.id);
            }
        }

        debug!(
            "Max IoU {:.3} over {} detections (threshold {})",
            max_iou,
            detections.len(),
            self.threshold
        );

        OverlapMetrics {
            iou_with_food: max_iou,
            max_iou_detection_id: max_id.map(str::to_string),
            overlap_detected: max_iou > self.threshold,
            detections_checked: detections.len(),
        }
    }
}
