//! # Renderable-Surface Capture
//!
//! The label compiler never draws Arabic itself. It describes the fragment
//! it needs ([`FragmentRequest`]) and asks a [`SurfaceCapture`] for PNG
//! bytes, which the bitmap codec then thresholds into a graphic field.
//!
//! [`TtfSurface`] is the built-in implementation: it lays a fragment out
//! right-to-left with a TrueType font that covers the Arabic block and
//! encodes the result as PNG. Glyphs are placed in reverse logical order
//! with no contextual shaping.

use std::io::Cursor;
use std::path::Path;

use ab_glyph::{Font, FontArc, PxScale, ScaleFont, point};
use image::{ImageFormat, Rgba, RgbaImage};

use crate::error::BayanError;

/// Text direction of a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    LeftToRight,
    #[default]
    RightToLeft,
}

/// Everything a surface needs to render one fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentRequest<'a> {
    pub text: &'a str,
    /// Glyph height in dots.
    pub font_size: u32,
    /// Surface width in dots. Text is aligned to the trailing edge.
    pub width: u32,
    /// Surface height in dots.
    pub height: u32,
    pub direction: Direction,
}

/// Produces compressed raster image bytes for a fragment description.
pub trait SurfaceCapture {
    /// Render `request` and return PNG bytes.
    fn capture(&self, request: &FragmentRequest<'_>) -> Result<Vec<u8>, BayanError>;
}

impl<T: SurfaceCapture + ?Sized> SurfaceCapture for &T {
    fn capture(&self, request: &FragmentRequest<'_>) -> Result<Vec<u8>, BayanError> {
        (*self).capture(request)
    }
}

/// TrueType renderer for bilingual fragments.
#[derive(Clone)]
pub struct TtfSurface {
    font: FontArc,
}

impl std::fmt::Debug for TtfSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtfSurface").finish_non_exhaustive()
    }
}

impl TtfSurface {
    /// Load a font from a `.ttf`/`.otf` file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, BayanError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            BayanError::Config(format!("cannot read font {}: {}", path.display(), e))
        })?;
        Self::from_bytes(bytes)
    }

    /// Load a font from memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, BayanError> {
        let font = FontArc::try_from_vec(bytes)
            .map_err(|e| BayanError::Config(format!("invalid font: {}", e)))?;
        Ok(Self { font })
    }

    /// Render to an RGBA canvas: black glyphs, coverage as alpha, on a
    /// transparent background.
    pub fn render(&self, request: &FragmentRequest<'_>) -> Result<RgbaImage, BayanError> {
        if request.width == 0 || request.height == 0 {
            return Err(BayanError::Image(format!(
                "surface has zero size ({}x{})",
                request.width, request.height
            )));
        }

        let scale = PxScale::from(request.font_size as f32);
        let scaled = self.font.as_scaled(scale);

        // Visual order: RTL fragments run from the last logical char on the left
        let chars: Vec<char> = match request.direction {
            Direction::RightToLeft => request.text.chars().rev().collect(),
            Direction::LeftToRight => request.text.chars().collect(),
        };

        let mut glyphs = Vec::with_capacity(chars.len());
        let mut caret = 0.0f32;
        for ch in chars {
            let id = self.font.glyph_id(ch);
            glyphs.push((id, caret));
            caret += scaled.h_advance(id);
        }

        let width = request.width as f32;
        let height = request.height as f32;
        let origin_x = match request.direction {
            Direction::RightToLeft => width - caret,
            Direction::LeftToRight => 0.0,
        };
        let line_height = scaled.ascent() - scaled.descent();
        let baseline = ((height - line_height) / 2.0).max(0.0) + scaled.ascent();

        let mut canvas = RgbaImage::from_pixel(request.width, request.height, Rgba([0, 0, 0, 0]));
        for (id, x) in glyphs {
            let glyph = id.with_scale_and_position(scale, point(origin_x + x, baseline));
            let Some(outlined) = self.font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px = gx as i32 + bounds.min.x as i32;
                let py = gy as i32 + bounds.min.y as i32;
                if px < 0 || py < 0 || px >= request.width as i32 || py >= request.height as i32 {
                    return;
                }
                let alpha = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
                let pixel = canvas.get_pixel_mut(px as u32, py as u32);
                pixel.0[3] = pixel.0[3].max(alpha);
            });
        }

        Ok(canvas)
    }
}

impl SurfaceCapture for TtfSurface {
    fn capture(&self, request: &FragmentRequest<'_>) -> Result<Vec<u8>, BayanError> {
        let canvas = self.render(request)?;
        let mut out = Cursor::new(Vec::new());
        canvas
            .write_to(&mut out, ImageFormat::Png)
            .map_err(|e| BayanError::Image(format!("PNG encoding failed: {}", e)))?;
        Ok(out.into_inner())
    }
}

// ============================================================================
// TESTS
// ============================================================================
