//! # Monochrome Bitmaps
//!
//! Converts captured images into the packed 1-bit format carried by ZPL
//! graphic fields.
//!
//! ## Pipeline
//!
//! ```text
//! PNG bytes ──► decode ──► resample (nearest) ──► threshold ──► pack ──► ^GFA hex
//! ```
//!
//! ## Thresholding
//!
//! A pixel prints black only when it is opaque enough **and** dark enough:
//!
//! ```text
//! black ⇔ alpha > 128  ∧  0.299·R + 0.587·G + 0.114·B < 128
//! ```
//!
//! Transparent pixels are white regardless of color. The luminance test is
//! evaluated in integer arithmetic (`299R + 587G + 114B < 128000`) so the
//! result never depends on floating-point rounding.
//!
//! ## Failure Policy
//!
//! Decoding can fail ([`BayanError::Decode`]). Layout never aborts because
//! of a bad capture: [`from_png_or_placeholder`] substitutes the
//! deterministic [`placeholder`] pattern at the requested size.

use tracing::warn;

use super::png::{self, Pixels};
use crate::error::BayanError;
use crate::protocol::{graphics, zpl};

/// Pixels with alpha at or below this value are treated as transparent.
pub const ALPHA_THRESHOLD: u8 = 128;

/// Luminance below this value prints black.
pub const LUMINANCE_THRESHOLD: u32 = 128;

/// Placeholder border thickness in dots.
const PLACEHOLDER_BORDER: usize = 2;

/// Packed 1-bit bitmap, row-major, MSB = leftmost dot, 1 = black.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonoBitmap {
    pub width: usize,
    pub height: usize,
    pub bytes_per_row: usize,
    pub data: Vec<u8>,
}

impl MonoBitmap {
    /// All-white bitmap.
    pub fn new(width: usize, height: usize) -> Self {
        let bytes_per_row = width.div_ceil(8);
        Self {
            width,
            height,
            bytes_per_row,
            data: vec![0u8; bytes_per_row * height],
        }
    }

    /// Set the dot at (x, y). Out-of-range coordinates are ignored.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, black: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = y * self.bytes_per_row + x / 8;
        let mask = 0x80u8 >> (x % 8);
        if black {
            self.data[idx] |= mask;
        } else {
            self.data[idx] &= !mask;
        }
    }

    /// Whether the dot at (x, y) is black.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.data[y * self.bytes_per_row + x / 8] & (0x80u8 >> (x % 8)) != 0
    }

    /// `bytes_per_row * height`.
    pub fn total_bytes(&self) -> usize {
        self.data.len()
    }

    /// Uppercase hex payload, `2 * total_bytes` characters.
    pub fn to_hex(&self) -> String {
        graphics::hex_payload(&self.data)
    }

    /// `^GFA,...` command without origin or separator.
    pub fn graphic_field(&self) -> String {
        graphics::graphic_field(self.bytes_per_row, &self.data)
    }

    /// Complete positioned graphic field: `^FOx,y^GFA,...^FS`.
    pub fn to_zpl(&self, x: u32, y: u32) -> String {
        format!(
            "{}{}{}",
            zpl::field_origin(x, y),
            self.graphic_field(),
            zpl::FIELD_SEPARATOR
        )
    }
}

/// Classify one RGBA pixel.
#[inline]
pub fn is_black(r: u8, g: u8, b: u8, a: u8) -> bool {
    if a <= ALPHA_THRESHOLD {
        return false;
    }
    let weighted = 299 * r as u32 + 587 * g as u32 + 114 * b as u32;
    weighted < LUMINANCE_THRESHOLD * 1000
}

/// Pack a row of boolean values into bytes, MSB first.
///
/// ```
/// use bayan::render::bitmap::pack_row;
///
/// let row = [true, true, false, false, true, false, true, false, true];
/// assert_eq!(pack_row(&row), vec![0b1100_1010, 0b1000_0000]);
/// ```
pub fn pack_row(row: &[bool]) -> Vec<u8> {
    let mut out = vec![0u8; row.len().div_ceil(8)];
    for (x, &black) in row.iter().enumerate() {
        if black {
            out[x / 8] |= 0x80 >> (x % 8);
        }
    }
    out
}

/// Nearest-neighbor resample.
///
/// Destination pixel (x, y) samples source pixel
/// `(floor(x * src_w / dst_w), floor(y * src_h / dst_h))`.
pub fn resample_nearest(src: &Pixels, width: usize, height: usize) -> Pixels {
    if src.width == width && src.height == height {
        return src.clone();
    }

    let mut rgba = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        let sy = y * src.height / height;
        for x in 0..width {
            let sx = x * src.width / width;
            rgba.extend_from_slice(&src.pixel(sx, sy));
        }
    }

    Pixels {
        width,
        height,
        rgba,
    }
}

/// Threshold RGBA pixels into a packed bitmap.
pub fn threshold(pixels: &Pixels) -> MonoBitmap {
    let mut bitmap = MonoBitmap::new(pixels.width, pixels.height);
    let mut row = vec![false; pixels.width];

    for y in 0..pixels.height {
        for (x, dot) in row.iter_mut().enumerate() {
            let [r, g, b, a] = pixels.pixel(x, y);
            *dot = is_black(r, g, b, a);
        }
        let start = y * bitmap.bytes_per_row;
        bitmap.data[start..start + bitmap.bytes_per_row].copy_from_slice(&pack_row(&row));
    }

    bitmap
}

/// Decode a PNG and convert it to a bitmap, optionally resampling to
/// `target` = (width, height) first.
pub fn from_png(bytes: &[u8], target: Option<(usize, usize)>) -> Result<MonoBitmap, BayanError> {
    let pixels = png::decode(bytes)?;

    let pixels = match target {
        Some((0, _)) | Some((_, 0)) => {
            return Err(BayanError::Decode(
                "target size must be non-zero".to_string(),
            ));
        }
        Some((w, h)) => resample_nearest(&pixels, w, h),
        None => pixels,
    };

    Ok(threshold(&pixels))
}

/// Deterministic stand-in for an image that could not be decoded.
///
/// A 2-dot border with a diagonal hatch (`(row + col) % 4 == 0`) inside,
/// so a failed capture is visible on paper without breaking the label.
pub fn placeholder(width: usize, height: usize) -> MonoBitmap {
    let mut bitmap = MonoBitmap::new(width, height);
    for row in 0..height {
        for col in 0..width {
            let border = row < PLACEHOLDER_BORDER
                || row + PLACEHOLDER_BORDER >= height
                || col < PLACEHOLDER_BORDER
                || col + PLACEHOLDER_BORDER >= width;
            let hatch = (row + col) % 4 == 0;
            if border || hatch {
                bitmap.set(col, row, true);
            }
        }
    }
    bitmap
}

/// [`from_png`] at a fixed size, degrading to [`placeholder`] on failure.
pub fn from_png_or_placeholder(bytes: &[u8], width: usize, height: usize) -> MonoBitmap {
    match from_png(bytes, Some((width, height))) {
        Ok(bitmap) => bitmap,
        Err(e) => {
            warn!(error = %e, width, height, "captured image unusable, printing placeholder");
            placeholder(width, height)
        }
    }
}

/// Positioned graphic field for a captured image: `^FOx,y^GFA,...^FS`.
///
/// Never fails; see [`from_png_or_placeholder`].
pub fn graphic_field_command(bytes: &[u8], x: u32, y: u32, width: usize, height: usize) -> String {
    from_png_or_placeholder(bytes, width, height).to_zpl(x, y)
}

/// Wrap a single full-label capture as a complete label.
///
/// Used when the whole invoice was rendered as one image instead of being
/// compiled field by field.
pub fn image_label(bytes: &[u8]) -> Result<String, BayanError> {
    let bitmap = from_png(bytes, None)?;
    Ok(format!(
        "{}\n{}\n{}\n{}",
        zpl::START_LABEL,
        zpl::print_width(bitmap.width as u32),
        bitmap.to_zpl(0, 0),
        zpl::END_LABEL
    ))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_of(img: &RgbaImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn solid(width: usize, height: usize, px: [u8; 4]) -> Pixels {
        Pixels::from_rgba(width, height, px.repeat(width * height)).unwrap()
    }

    #[test]
    fn test_threshold_boundaries() {
        assert!(is_black(0, 0, 0, 255));
        assert!(!is_black(255, 255, 255, 255));
        // Transparent is white whatever the color
        assert!(!is_black(0, 0, 0, 128));
        assert!(!is_black(0, 0, 0, 0));
        assert!(is_black(0, 0, 0, 129));
        // Luminance exactly 128 is not black; 127 is
        assert!(!is_black(128, 128, 128, 255));
        assert!(is_black(127, 127, 127, 255));
    }

    #[test]
    fn test_threshold_uses_bt601_weights() {
        // Pure red: 0.299 * 255 = 76 → black
        assert!(is_black(255, 0, 0, 255));
        // Pure green: 0.587 * 255 = 150 → white
        assert!(!is_black(0, 255, 0, 255));
        // Pure blue: 0.114 * 255 = 29 → black
        assert!(is_black(0, 0, 255, 255));
    }

    #[test]
    fn test_bitmap_dimensions() {
        let bitmap = threshold(&solid(13, 5, [0, 0, 0, 255]));
        assert_eq!(bitmap.bytes_per_row, 2);
        assert_eq!(bitmap.total_bytes(), 10);
        assert_eq!(bitmap.to_hex().len(), 2 * 2 * 5);
        // 13 black dots: FF F8 per row
        assert_eq!(&bitmap.to_hex()[..4], "FFF8");
    }

    #[test]
    fn test_msb_is_leftmost() {
        let mut rgba = [255u8, 255, 255, 255].repeat(8);
        rgba[0..4].copy_from_slice(&[0, 0, 0, 255]);
        let bitmap = threshold(&Pixels::from_rgba(8, 1, rgba).unwrap());
        assert_eq!(bitmap.data, vec![0x80]);
        assert!(bitmap.get(0, 0));
        assert!(!bitmap.get(1, 0));
    }

    #[test]
    fn test_resample_nearest_formula() {
        // 4x1 source: black, white, black, white
        let mut rgba = Vec::new();
        for x in 0..4 {
            let v = if x % 2 == 0 { 0 } else { 255 };
            rgba.extend_from_slice(&[v, v, v, 255]);
        }
        let src = Pixels::from_rgba(4, 1, rgba).unwrap();

        // Downscale to 2: samples x=0 and x=2 → both black
        let down = resample_nearest(&src, 2, 1);
        assert_eq!(down.pixel(0, 0), [0, 0, 0, 255]);
        assert_eq!(down.pixel(1, 0), [0, 0, 0, 255]);

        // Upscale to 8: floor(x * 4 / 8) = 0,0,1,1,2,2,3,3
        let up = resample_nearest(&src, 8, 2);
        let row: Vec<u8> = (0..8).map(|x| up.pixel(x, 1)[0]).collect();
        assert_eq!(row, vec![0, 0, 255, 255, 0, 0, 255, 255]);
    }

    #[test]
    fn test_from_png_resamples_to_target() {
        let mut img = RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255]));
        for y in 0..10 {
            for x in 0..5 {
                img.put_pixel(x, y, Rgba([0, 0, 0, 255]));
            }
        }
        let bitmap = from_png(&png_of(&img), Some((20, 4))).unwrap();
        assert_eq!(bitmap.width, 20);
        assert_eq!(bitmap.height, 4);
        assert_eq!(bitmap.bytes_per_row, 3);
        // Left half black: 10 dots → FF C0 00
        assert_eq!(&bitmap.data[0..3], &[0xFF, 0xC0, 0x00]);
    }

    #[test]
    fn test_transparent_png_prints_nothing() {
        let img = RgbaImage::from_pixel(16, 3, Rgba([0, 0, 0, 0]));
        let bitmap = from_png(&png_of(&img), None).unwrap();
        assert!(bitmap.data.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_placeholder_on_garbage() {
        let bitmap = from_png_or_placeholder(b"definitely not a png", 40, 12);
        assert_eq!(bitmap, placeholder(40, 12));
        assert_eq!(bitmap.width, 40);
        assert_eq!(bitmap.height, 12);
        assert_eq!(bitmap.bytes_per_row, 5);
    }

    #[test]
    fn test_placeholder_pattern() {
        let p = placeholder(16, 8);
        // Border rows fully black
        assert!((0..16).all(|x| p.get(x, 0) && p.get(x, 1) && p.get(x, 7)));
        // Interior follows the hatch
        assert!(p.get(2, 2)); // (2 + 2) % 4 == 0
        assert!(!p.get(3, 2));
        assert!(p.get(5, 3));
        // Deterministic
        assert_eq!(p, placeholder(16, 8));
    }

    #[test]
    fn test_graphic_field_command() {
        let img = RgbaImage::from_pixel(8, 2, Rgba([0, 0, 0, 255]));
        let cmd = graphic_field_command(&png_of(&img), 420, 345, 8, 2);
        assert_eq!(cmd, "^FO420,345^GFA,2,2,1,FFFF^FS");
    }

    #[test]
    fn test_interlaced_capture_is_not_a_placeholder() {
        use crate::render::png::tests::build_png;

        // 1x1 opaque white, Adam7; the placeholder would print a border
        let capture = build_png((1, 1), (8, 6, 1), &[], &[0, 255, 255, 255, 255]);
        let cmd = graphic_field_command(&capture, 10, 20, 8, 4);
        assert_eq!(cmd, "^FO10,20^GFA,4,4,1,00000000^FS");
    }

    #[test]
    fn test_zero_target_is_decode_error() {
        let img = RgbaImage::from_pixel(8, 2, Rgba([0, 0, 0, 255]));
        assert!(matches!(
            from_png(&png_of(&img), Some((0, 2))),
            Err(BayanError::Decode(_))
        ));
    }

    #[test]
    fn test_image_label() {
        let img = RgbaImage::from_pixel(576, 2, Rgba([255, 255, 255, 255]));
        let label = image_label(&png_of(&img)).unwrap();
        assert!(label.starts_with("^XA\n^PW576\n^FO0,0^GFA,144,144,72,"));
        assert!(label.ends_with("^FS\n^XZ"));
    }
}
