//! # PNG Decoding
//!
//! Captured fragments arrive as PNG bytes. They are decoded with the
//! `image` crate into 8-bit RGBA [`Pixels`], which the bitmap codec
//! resamples and thresholds.
//!
//! Decoding runs under [`image::Limits`] so a small compressed payload
//! cannot inflate into an unbounded allocation. Every PNG color type, bit
//! depth and interlace mode is accepted; `tRNS` transparency becomes alpha.

use std::io::Cursor;

use image::{ImageFormat, ImageReader, Limits};

use crate::error::BayanError;

/// Largest image accepted, in pixels. Captured fragments are a few
/// hundred dots wide; a full label is well under this.
pub const MAX_PIXELS: usize = 1 << 26;

/// Longest side accepted, in pixels.
pub const MAX_SIDE: u32 = 1 << 16;

/// Decoded image as 8-bit RGBA, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pixels {
    pub width: usize,
    pub height: usize,
    /// `width * height * 4` bytes: R, G, B, A per pixel.
    pub rgba: Vec<u8>,
}

impl Pixels {
    /// Wrap raw RGBA samples. Returns `None` if the length does not match.
    pub fn from_rgba(width: usize, height: usize, rgba: Vec<u8>) -> Option<Self> {
        (rgba.len() == width * height * 4).then_some(Self {
            width,
            height,
            rgba,
        })
    }

    /// RGBA of the pixel at (x, y).
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let i = (y * self.width + x) * 4;
        [
            self.rgba[i],
            self.rgba[i + 1],
            self.rgba[i + 2],
            self.rgba[i + 3],
        ]
    }
}

fn limits() -> Limits {
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_SIDE);
    limits.max_image_height = Some(MAX_SIDE);
    limits.max_alloc = Some((MAX_PIXELS * 4) as u64);
    limits
}

/// Decode PNG bytes to RGBA.
///
/// Fails with [`BayanError::Decode`] for anything that is not a complete,
/// non-empty PNG within the size limits.
pub fn decode(bytes: &[u8]) -> Result<Pixels, BayanError> {
    let mut reader = ImageReader::with_format(Cursor::new(bytes), ImageFormat::Png);
    reader.limits(limits());
    let image = reader
        .decode()
        .map_err(|e| BayanError::Decode(format!("PNG: {}", e)))?
        .to_rgba8();

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(BayanError::Decode(format!(
            "image has zero size ({}x{})",
            width, height
        )));
    }
    if (width as usize).saturating_mul(height as usize) > MAX_PIXELS {
        return Err(BayanError::Decode(format!(
            "image too large ({}x{})",
            width, height
        )));
    }

    Ok(Pixels {
        width: width as usize,
        height: height as usize,
        rgba: image.into_raw(),
    })
}

// ============================================================================
// TESTS
// ============================================================================
