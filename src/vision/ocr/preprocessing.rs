// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for PaddleOCR recognition

use image::{DynamicImage, GenericImageView, GrayImage};
use ndarray::Array4;

use crate::evaluation::types::PixelRect;

/// Recognition model input height (PP-OCRv5 English model uses 48)
pub const REC_INPUT_HEIGHT: u32 = 48;

/// Maximum width for recognition model input
pub const REC_MAX_WIDTH: u32 = 320;

/// Mean values for normalization (ImageNet)
pub const MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// Std values for normalization (ImageNet)
pub const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Minimum luma difference from the background for a pixel to count as ink
pub const INK_THRESHOLD: u8 = 48;

/// Rows of padding kept around each detected line
const LINE_PADDING: u32 = 2;

/// Preprocess a cropped text line for recognition
///
/// Resizes to height 48 with aspect-preserving width (4..=320), normalizes
/// with ImageNet mean/std and returns an NCHW tensor `[1, 3, 48, W]`.
pub fn preprocess_for_recognition(image: &DynamicImage) -> Array4<f32> {
    let (orig_w, orig_h) = image.dimensions();

    let scale = REC_INPUT_HEIGHT as f32 / orig_h.max(1) as f32;
    let new_width = ((orig_w as f32 * scale).round() as u32)
        .min(REC_MAX_WIDTH)
        .max(4);

    let resized = image.resize_exact(
        new_width,
        REC_INPUT_HEIGHT,
        image::imageops::FilterType::Lanczos3,
    );
    let rgb = resized.to_rgb8();

    let output_width = new_width as usize;
    let mut tensor = Array4::zeros((1, 3, REC_INPUT_HEIGHT as usize, output_width));

    for y in 0..REC_INPUT_HEIGHT as usize {
        for x in 0..output_width {
            let pixel = rgb.get_pixel(x as u32, y as u32);
            for c in 0..3 {
                tensor[[0, c, y, x]] = (pixel[c] as f32 / 255.0 - MEAN[c]) / STD[c];
            }
        }
    }

    tensor
}

/// Mean luma of the outermost rows and columns
fn border_luma(gray: &GrayImage) -> u8 {
    let (w, h) = gray.dimensions();
    let mut sum = 0u64;
    let mut count = 0u64;
    for (x, y, pixel) in gray.enumerate_pixels() {
        if x == 0 || y == 0 || x + 1 == w || y + 1 == h {
            sum += pixel[0] as u64;
            count += 1;
        }
    }
    if count == 0 {
        0
    } else {
        (sum / count) as u8
    }
}

/// Split an image into text lines by horizontal ink projection
///
/// Ink is any pixel whose luma differs from the border average by more than
/// [`INK_THRESHOLD`]. Each band of consecutive inked rows becomes one line,
/// trimmed horizontally to its inked columns and padded by a few pixels.
/// Returns lines top to bottom; an image without ink yields no lines.
pub fn line_bands(image: &DynamicImage) -> Vec<PixelRect> {
    let gray = image.to_luma8();
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let background = border_luma(&gray);
    let is_ink = |x: u32, y: u32| gray.get_pixel(x, y)[0].abs_diff(background) > INK_THRESHOLD;

    let row_has_ink: Vec<bool> = (0..height)
        .map(|y| (0..width).any(|x| is_ink(x, y)))
        .collect();

    let mut bands = Vec::new();
    let mut y = 0;
    while y < height {
        if !row_has_ink[y as usize] {
            y += 1;
            continue;
        }
        let top = y;
        while y < height && row_has_ink[y as usize] {
            y += 1;
        }
        bands.push((top, y));
    }

    bands
        .into_iter()
        .filter_map(|(top, bottom)| {
            let columns: Vec<u32> = (0..width)
                .filter(|&x| (top..bottom).any(|y| is_ink(x, y)))
                .collect();
            let left = *columns.first()?;
            let right = *columns.last()? + 1;

            let x = left.saturating_sub(LINE_PADDING);
            let y = top.saturating_sub(LINE_PADDING);
            let x2 = (right + LINE_PADDING).min(width);
            let y2 = (bottom + LINE_PADDING).min(height);
            Some(PixelRect::new(x, y, x2 - x, y2 - y))
        })
        .collect()
}
