// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image loading, cropping and pixel sampling for rendered overlays

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::path::Path;
use thiserror::Error;

use crate::evaluation::types::PixelRect;

/// Largest encoded render accepted (20MB)
const MAX_IMAGE_SIZE: usize = 20 * 1024 * 1024;

/// Leading bytes of the encoded formats renders may arrive in
const SIGNATURES: &[(&[u8], ImageFormat)] = &[
    (b"\x89PNG", ImageFormat::Png),
    (b"\xFF\xD8\xFF", ImageFormat::Jpeg),
    (b"GIF87a", ImageFormat::Gif),
    (b"GIF89a", ImageFormat::Gif),
    (b"BM", ImageFormat::Bmp),
];

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image data is too large: {0} bytes (max: {1} bytes)")]
    TooLarge(usize, usize),

    #[error("Invalid base64 encoding: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("Image data is empty")]
    EmptyData,

    #[error("Failed to read image file {path}: {message}")]
    Unreadable { path: String, message: String },
}

/// Decode a base64-encoded render
///
/// Accepts plain base64 or a `data:image/...;base64,` URL.
pub fn decode_base64_image(encoded: &str) -> Result<DynamicImage, ImageError> {
    let payload = encoded
        .strip_prefix("data:")
        .and_then(|url| url.split_once(";base64,"))
        .map_or(encoded, |(_, data)| data)
        .trim();

    if payload.is_empty() {
        return Err(ImageError::EmptyData);
    }

    decode_image_bytes(&STANDARD.decode(payload)?)
}

/// Decode encoded image bytes after checking size and format
pub fn decode_image_bytes(bytes: &[u8]) -> Result<DynamicImage, ImageError> {
    match bytes.len() {
        0 => return Err(ImageError::EmptyData),
        n if n > MAX_IMAGE_SIZE => return Err(ImageError::TooLarge(n, MAX_IMAGE_SIZE)),
        _ => {}
    }

    let format = detect_format(bytes)?;
    image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))
}

/// Load and decode an image file from disk
pub fn load_image_file<P: AsRef<Path>>(path: P) -> Result<DynamicImage, ImageError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| ImageError::Unreadable {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    decode_image_bytes(&bytes)
}

/// Detect the encoded format from magic bytes
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    // RIFF container with a WEBP form type
    if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        return Ok(ImageFormat::WebP);
    }

    SIGNATURES
        .iter()
        .find(|(magic, _)| bytes.starts_with(magic))
        .map(|(_, format)| *format)
        .ok_or(ImageError::UnsupportedFormat)
}

/// Clip a rectangle to the image bounds
///
/// Returns `None` when nothing of the rectangle lies inside the image.
pub fn clip_rect(rect: PixelRect, image_width: u32, image_height: u32) -> Option<PixelRect> {
    let x = rect.x.min(image_width);
    let y = rect.y.min(image_height);
    let right = rect.right().min(image_width);
    let bottom = rect.bottom().min(image_height);

    let clipped = PixelRect::new(x, y, right.saturating_sub(x), bottom.saturating_sub(y));
    if clipped.is_empty() {
        None
    } else {
        Some(clipped)
    }
}

/// Crop to a rectangle after clipping it to the image bounds
///
/// Returns `None` when the clipped rectangle is empty.
pub fn crop_to_rect(image: &DynamicImage, rect: PixelRect) -> Option<DynamicImage> {
    let (width, height) = image.dimensions();
    let r = clip_rect(rect, width, height)?;
    Some(image.crop_imm(r.x, r.y, r.width, r.height))
}

/// Channel-wise mean RGB over a rectangle, clipped to the image
pub fn average_color(image: &DynamicImage, rect: PixelRect) -> Option<[u8; 3]> {
    let (width, height) = image.dimensions();
    let rect = clip_rect(rect, width, height)?;

    let mut sums = [0u64; 3];
    for y in rect.y..rect.bottom() {
        for x in rect.x..rect.right() {
            let pixel = image.get_pixel(x, y);
            for c in 0..3 {
                sums[c] += pixel[c] as u64;
            }
        }
    }

    let count = rect.width as u64 * rect.height as u64;
    Some([
        (sums[0] / count) as u8,
        (sums[1] / count) as u8,
        (sums[2] / count) as u8,
    ])
}
