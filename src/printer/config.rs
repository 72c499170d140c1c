//! # Printer Models
//!
//! Hardware constants of the label printers a template can target.
//!
//! | Model | Width (dots) | Resolution | Media |
//! |-------|--------------|------------|-------|
//! | ZQ520 | 812 | 203 DPI | 4" continuous |
//! | ZQ520 (832) | 832 | 203 DPI | 4" continuous, full head |
//!
//! Both widths describe the same mobile printer. Which one a unit accepts
//! depends on its firmware print-width setting (`^PW`), so the choice is
//! made per device through the layout template.
//!
//! ```
//! use bayan::printer::PrinterConfig;
//!
//! let zq = PrinterConfig::ZQ520;
//! assert_eq!(zq.width_bytes(), 102);
//! assert!(zq.fits(812));
//! assert!(!zq.fits(900));
//! ```

/// Print head geometry of one printer model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrinterConfig {
    pub name: &'static str,

    /// Configured print width in dots.
    pub width_dots: u32,

    /// Physical head width in dots; `^PW` can never exceed it.
    pub head_dots: u32,

    pub dpi: u32,
}

impl PrinterConfig {
    /// Zebra ZQ520 with the factory 812-dot print width.
    pub const ZQ520: Self = Self {
        name: "Zebra ZQ520",
        width_dots: 812,
        head_dots: 832,
        dpi: 203,
    };

    /// Zebra ZQ520 configured for the full 832-dot print head.
    pub const ZQ520_832: Self = Self {
        name: "Zebra ZQ520 (832)",
        width_dots: 832,
        head_dots: 832,
        dpi: 203,
    };

    /// Bytes in one full-width 1-bit row.
    #[inline]
    pub fn width_bytes(&self) -> u32 {
        self.width_dots.div_ceil(8)
    }

    /// Whether a `width`-dot label fits under the head.
    #[inline]
    pub fn fits(&self, width: u32) -> bool {
        width > 0 && width <= self.head_dots
    }

    /// Millimeters covered by `dots` along the feed direction.
    pub fn dots_to_mm(&self, dots: u32) -> f32 {
        dots as f32 * 25.4 / self.dpi as f32
    }
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self::ZQ520
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_bytes() {
        assert_eq!(PrinterConfig::ZQ520.width_bytes(), 102);
        assert_eq!(PrinterConfig::ZQ520_832.width_bytes(), 104);
    }

    #[test]
    fn test_head_limit() {
        let zq = PrinterConfig::ZQ520;
        assert!(zq.fits(832));
        assert!(!zq.fits(833));
        assert!(!zq.fits(0));
    }

    #[test]
    fn test_label_length_in_mm() {
        // 1300 dots at 203 DPI is a little over 16 cm of media
        let mm = PrinterConfig::ZQ520.dots_to_mm(1300);
        assert!((mm - 162.66).abs() < 0.1);
    }

    #[test]
    fn test_default() {
        assert_eq!(PrinterConfig::default(), PrinterConfig::ZQ520);
    }
}
