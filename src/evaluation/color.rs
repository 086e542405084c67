// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Hex color parsing and WCAG 2.1 luminance math

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Highest contrast ratio reachable with 8-bit sRGB (white on black)
pub const MAX_CONTRAST_RATIO: f64 = 21.0;

/// Linearization cut-off from WCAG 2.1
const LINEAR_THRESHOLD: f64 = 0.03928;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ColorParseError {
    #[error("hex color must be RRGGBB or RRGGBBAA, got {0} digits")]
    InvalidLength(usize),

    #[error("invalid hex byte \"{0}\"")]
    InvalidByte(String),
}

/// 8-bit sRGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
    pub const WHITE: Rgb = Rgb {
        r: 255,
        g: 255,
        b: 255,
    };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// WCAG relative luminance in [0, 1]
    pub fn relative_luminance(&self) -> f64 {
        0.2126 * channel_to_linear(self.r)
            + 0.7152 * channel_to_linear(self.g)
            + 0.0722 * channel_to_linear(self.b)
    }
}

/// 8-bit sRGB color with alpha
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub fn rgb(&self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }
}

/// Parse `RRGGBB` or `RRGGBBAA`, with or without a leading `#`
pub fn parse_hex_rgba(s: &str) -> Result<Rgba, ColorParseError> {
    let s = s.trim();
    let s = s.strip_prefix('#').unwrap_or(s);

    fn hex_byte(pair: &str) -> Result<u8, ColorParseError> {
        u8::from_str_radix(pair, 16).map_err(|_| ColorParseError::InvalidByte(pair.to_string()))
    }

    if !s.is_ascii() {
        return Err(ColorParseError::InvalidByte(s.to_string()));
    }

    match s.len() {
        6 => Ok(Rgba {
            r: hex_byte(&s[0..2])?,
            g: hex_byte(&s[2..4])?,
            b: hex_byte(&s[4..6])?,
            a: 255,
        }),
        8 => Ok(Rgba {
            r: hex_byte(&s[0..2])?,
            g: hex_byte(&s[2..4])?,
            b: hex_byte(&s[4..6])?,
            a: hex_byte(&s[6..8])?,
        }),
        len => Err(ColorParseError::InvalidLength(len)),
    }
}

/// Parse a hex color, falling back to `default` on malformed input
pub fn parse_hex_color(s: &str, default: Rgb) -> Rgb {
    match parse_hex_rgba(s) {
        Ok(rgba) => rgba.rgb(),
        Err(e) => {
            debug!("Falling back to #{} for color {:?}: {}", default.to_hex(), s, e);
            default
        }
    }
}

/// sRGB channel to linear light
pub fn channel_to_linear(channel: u8) -> f64 {
    let c = channel as f64 / 255.0;
    if c <= LINEAR_THRESHOLD {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// WCAG contrast ratio between two colors, in [1, 21]
pub fn contrast_ratio(a: Rgb, b: Rgb) -> f64 {
    let la = a.relative_luminance();
    let lb = b.relative_luminance();
    let (l_max, l_min) = if la >= lb { (la, lb) } else { (lb, la) };

    ((l_max + 0.05) / (l_min + 0.05)).min(MAX_CONTRAST_RATIO)
}
