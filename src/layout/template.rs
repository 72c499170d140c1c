//! # Layout Template
//!
//! Every coordinate, font size and row advance the compiler uses lives in a
//! [`Template`]. Printer variants are presets, not code paths.
//!
//! ## Presets
//!
//! | Preset | Width (dots) | Base height | Per line |
//! |--------|--------------|-------------|----------|
//! | `zq520` | 812 | 1300 | 100 |
//! | `zq520-832` | 832 | 1300 | 100 |
//!
//! ## Canvas Length
//!
//! ```text
//! label_length = base_height + lines × per_line_height
//! ```
//!
//! [`Template::validate`] checks that `base_height` covers every fixed
//! region and that `per_line_height` covers one line block, so the canvas
//! can never be shorter than the content.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BayanError;
use crate::printer::PrinterConfig;

/// Company header: logo box on the left, contact block on the right.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderLayout {
    pub logo_width: u32,
    pub logo_height: u32,
    pub logo_thickness: u32,
    pub logo_font: u32,
    pub logo_text_offset: u32,
    pub block_x: u32,
    pub block_width: u32,
    pub block_font: u32,
    pub block_row: u32,
    /// Character budget for a contact block row.
    pub block_budget: usize,
    /// Distance from the top margin to the title.
    pub height: u32,
    pub title_font: u32,
    pub title_advance: u32,
}

impl Default for HeaderLayout {
    fn default() -> Self {
        Self {
            logo_width: 100,
            logo_height: 80,
            logo_thickness: 2,
            logo_font: 18,
            logo_text_offset: 30,
            block_x: 480,
            block_width: 320,
            block_font: 16,
            block_row: 20,
            block_budget: 36,
            height: 95,
            title_font: 32,
            title_advance: 40,
        }
    }
}

/// Two-column invoice details block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailsLayout {
    pub font: u32,
    pub row: u32,
    /// Character budget for free text in the left column.
    pub left_budget: usize,
    pub right_x: u32,
    pub right_width: u32,
    pub advance: u32,
}

impl Default for DetailsLayout {
    fn default() -> Self {
        Self {
            font: 17,
            row: 24,
            left_budget: 45,
            right_x: 520,
            right_width: 280,
            advance: 200,
        }
    }
}

/// Line item column positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineColumns {
    pub item: u32,
    pub qty: u32,
    pub uom: u32,
    pub price: u32,
    pub discount: u32,
    pub tax: u32,
    pub amount: u32,
    pub amount_width: u32,
}

impl Default for LineColumns {
    fn default() -> Self {
        Self {
            item: 15,
            qty: 280,
            uom: 310,
            price: 340,
            discount: 440,
            tax: 550,
            amount: 700,
            amount_width: 100,
        }
    }
}

/// SALES label, table heading and line item blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableLayout {
    pub sales_x: u32,
    pub sales_font: u32,
    pub sales_arabic_x: u32,
    pub sales_arabic_width: u32,
    pub sales_arabic_font: u32,
    pub sales_advance: u32,

    pub rule_dashes: usize,
    pub rule_font: u32,
    pub rule_advance: u32,

    pub heading_x: [u32; 7],
    pub heading_arabic_width: [u32; 7],
    pub heading_font: u32,
    pub heading_arabic_font: u32,
    pub heading_arabic_offset: u32,
    pub heading_advance: u32,
    pub heading_rule_advance: u32,

    pub columns: LineColumns,
    pub line_font: u32,
    pub tax_font: u32,
    pub description_font: u32,
    pub detail_font: u32,
    /// Offsets of the description, UPC and excise rows from the previous row.
    pub row_offsets: [u32; 3],
    pub line_advance: u32,
    pub item_budget: usize,
    pub uom_budget: usize,
    pub description_budget: usize,
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            sales_x: 200,
            sales_font: 28,
            sales_arabic_x: 420,
            sales_arabic_width: 150,
            sales_arabic_font: 24,
            sales_advance: 35,

            rule_dashes: 76,
            rule_font: 14,
            rule_advance: 20,

            heading_x: [15, 210, 280, 340, 420, 540, 700],
            heading_arabic_width: [100, 100, 80, 80, 120, 120, 80],
            heading_font: 15,
            heading_arabic_font: 14,
            heading_arabic_offset: 20,
            heading_advance: 40,
            heading_rule_advance: 15,

            columns: LineColumns::default(),
            line_font: 16,
            tax_font: 14,
            description_font: 14,
            detail_font: 12,
            row_offsets: [18, 16, 18],
            line_advance: 90,
            item_budget: 24,
            uom_budget: 4,
            description_budget: 40,
        }
    }
}

/// Double rule and totals row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TotalsLayout {
    pub rule_thickness: u32,
    pub rule_gap: u32,
    pub rule_advance: u32,
    pub font: u32,
    pub advance: u32,
}

impl Default for TotalsLayout {
    fn default() -> Self {
        Self {
            rule_thickness: 2,
            rule_gap: 5,
            rule_advance: 20,
            font: 22,
            advance: 40,
        }
    }
}

/// NET DUE breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetDueLayout {
    pub heading_font: u32,
    pub heading_advance: u32,
    pub value_x: u32,
    pub arabic_x: u32,
    pub arabic_width: u32,
    pub row_font: u32,
    pub row_advance: u32,
    pub advance: u32,
}

impl Default for NetDueLayout {
    fn default() -> Self {
        Self {
            heading_font: 20,
            heading_advance: 28,
            value_x: 380,
            arabic_x: 550,
            arabic_width: 240,
            row_font: 16,
            row_advance: 22,
            advance: 260,
        }
    }
}

/// TC CHARGED line through the DUPLICATE watermark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FooterLayout {
    pub charged_font: u32,
    pub charged_advance: u32,
    pub long_dashes: usize,
    pub long_rule_font: u32,
    pub long_rule_advance: u32,
    pub count_font: u32,
    pub count_advance: u32,
    pub due_font: u32,
    pub due_advance: u32,
    pub closing_rule_advance: u32,
    pub signature_font: u32,
    pub salesman_signature_x: u32,
    pub customer_signature_drop: u32,
    pub signature_advance: u32,
    pub duplicate_font: u32,
}

impl Default for FooterLayout {
    fn default() -> Self {
        Self {
            charged_font: 22,
            charged_advance: 35,
            long_dashes: 90,
            long_rule_font: 12,
            long_rule_advance: 20,
            count_font: 18,
            count_advance: 25,
            due_font: 20,
            due_advance: 30,
            closing_rule_advance: 30,
            signature_font: 18,
            salesman_signature_x: 480,
            customer_signature_drop: 40,
            signature_advance: 70,
            duplicate_font: 24,
        }
    }
}

/// Template-constants record for one printer model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Template {
    pub name: String,
    /// Print width in dots (`^PW`).
    pub label_width: u32,
    /// Label home shift (`^LS`).
    pub label_shift: i32,
    pub margin: u32,
    /// Canvas length with no lines.
    pub base_height: u32,
    /// Canvas length added per invoice line.
    pub per_line_height: u32,
    pub header: HeaderLayout,
    pub details: DetailsLayout,
    pub table: TableLayout,
    pub totals: TotalsLayout,
    pub net_due: NetDueLayout,
    pub footer: FooterLayout,
}

impl Default for Template {
    fn default() -> Self {
        Self::zq520()
    }
}

/// Number of rows in the NET DUE breakdown.
pub const NET_DUE_ROWS: u32 = 7;

/// Number of rows in the left details column.
pub const DETAIL_ROWS: u32 = 7;

impl Template {
    /// Zebra ZQ520 at 812 dots.
    pub fn zq520() -> Self {
        Self::for_printer("zq520", PrinterConfig::ZQ520)
    }

    /// Zebra ZQ520 at the full 832-dot head width. Right-anchored columns
    /// move with the wider canvas.
    pub fn zq520_832() -> Self {
        let mut template = Self::for_printer("zq520-832", PrinterConfig::ZQ520_832);
        let shift = PrinterConfig::ZQ520_832.width_dots - PrinterConfig::ZQ520.width_dots;
        template.header.block_x += shift;
        template.details.right_x += shift;
        template.table.heading_x[6] += shift;
        template.table.columns.amount += shift;
        template.net_due.arabic_x += shift;
        template.footer.salesman_signature_x += shift;
        template
    }

    fn for_printer(name: &str, printer: PrinterConfig) -> Self {
        Self {
            name: name.to_string(),
            label_width: printer.width_dots,
            label_shift: 0,
            margin: 15,
            base_height: 1300,
            per_line_height: 100,
            header: HeaderLayout::default(),
            details: DetailsLayout::default(),
            table: TableLayout::default(),
            totals: TotalsLayout::default(),
            net_due: NetDueLayout::default(),
            footer: FooterLayout::default(),
        }
    }

    /// Parse a preset name.
    ///
    /// ```
    /// use bayan::layout::Template;
    ///
    /// assert_eq!(Template::parse("832").unwrap().label_width, 832);
    /// assert!(Template::parse("tsp650").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "zq520" | "812" => Ok(Self::zq520()),
            "zq520-832" | "zq520_832" | "832" => Ok(Self::zq520_832()),
            _ => Err(format!(
                "Unknown template '{}'. Valid options: zq520, zq520-832",
                s
            )),
        }
    }

    /// Load a template from a JSON file. Missing fields take the `zq520`
    /// values.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, BayanError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let template: Self = serde_json::from_str(&text)?;
        template.validate()?;
        Ok(template)
    }

    /// Canvas length for `lines` invoice lines.
    ///
    /// Fails with [`BayanError::LayoutInvariant`] when the length does not
    /// fit a `u32`.
    pub fn label_length(&self, lines: usize) -> Result<u32, BayanError> {
        u32::try_from(lines)
            .ok()
            .and_then(|n| n.checked_mul(self.per_line_height))
            .and_then(|grown| grown.checked_add(self.base_height))
            .ok_or_else(|| {
                BayanError::LayoutInvariant(format!(
                    "template '{}': label length for {} lines overflows",
                    self.name, lines
                ))
            })
    }

    /// Vertical space used by the fixed regions, from the top edge to the
    /// bottom of the DUPLICATE watermark.
    pub fn fixed_extent(&self) -> u64 {
        let t = &self.table;
        let f = &self.footer;
        [
            self.margin,
            self.header.height,
            self.header.title_advance,
            self.details.advance,
            t.sales_advance,
            t.rule_advance,
            t.heading_advance,
            t.heading_rule_advance,
            self.totals.rule_advance,
            self.totals.advance,
            self.net_due.advance,
            f.charged_advance,
            f.long_rule_advance,
            f.count_advance,
            f.due_advance,
            f.closing_rule_advance,
            f.signature_advance,
            f.duplicate_font,
        ]
        .iter()
        .map(|&dots| u64::from(dots))
        .sum()
    }

    /// Height of one line item block.
    pub fn line_extent(&self) -> u64 {
        let t = &self.table;
        t.row_offsets.iter().map(|&dots| u64::from(dots)).sum::<u64>() + u64::from(t.detail_font)
    }

    /// Columns whose right edge is `x + width`, for the width check.
    fn right_edges(&self) -> Vec<(&'static str, u32, u32)> {
        let t = &self.table;
        let mut edges = vec![
            ("logo box", self.margin, self.header.logo_width),
            ("header block", self.header.block_x, self.header.block_width),
            ("details right column", self.details.right_x, self.details.right_width),
            ("SALES Arabic", t.sales_arabic_x, t.sales_arabic_width),
            ("amount column", t.columns.amount, t.columns.amount_width),
            ("NET DUE Arabic", self.net_due.arabic_x, self.net_due.arabic_width),
            ("salesman signature", self.footer.salesman_signature_x, 0),
        ];
        for (x, width) in t.heading_x.iter().zip(&t.heading_arabic_width) {
            edges.push(("table heading", *x, *width));
        }
        edges
    }

    /// Check the canvas constants against the regions they must hold.
    ///
    /// A template that passes compiles without arithmetic overflow: every
    /// sum is checked here in 64 bits before the compiler adds in 32.
    pub fn validate(&self) -> Result<(), BayanError> {
        let fail = |msg: String| Err(BayanError::LayoutInvariant(format!("template '{}': {}", self.name, msg)));
        let dots = u64::from;

        if !PrinterConfig::ZQ520.fits(self.label_width) {
            return fail(format!(
                "label width {} does not fit a {}-dot print head",
                self.label_width,
                PrinterConfig::ZQ520.head_dots
            ));
        }
        if dots(self.margin) * 2 >= dots(self.label_width) {
            return fail(format!(
                "margin {} leaves no printable width in {} dots",
                self.margin, self.label_width
            ));
        }
        for (region, x, width) in self.right_edges() {
            if dots(x) + dots(width) > dots(self.label_width) {
                return fail(format!(
                    "{} at x={} width {} runs past the {}-dot label",
                    region, x, width, self.label_width
                ));
            }
        }
        let fixed = self.fixed_extent();
        if dots(self.base_height) < fixed {
            return fail(format!(
                "base height {} is shorter than the fixed regions ({} dots)",
                self.base_height, fixed
            ));
        }
        let line = self.line_extent().max(dots(self.table.line_advance));
        if dots(self.per_line_height) < line {
            return fail(format!(
                "per-line height {} is shorter than one line block ({} dots)",
                self.per_line_height, line
            ));
        }
        if dots(self.details.advance) < dots(DETAIL_ROWS) * dots(self.details.row) {
            return fail(format!(
                "details advance {} is shorter than {} rows of {}",
                self.details.advance, DETAIL_ROWS, self.details.row
            ));
        }
        let net_due = dots(self.net_due.heading_advance) + dots(NET_DUE_ROWS) * dots(self.net_due.row_advance);
        if dots(self.net_due.advance) < net_due {
            return fail(format!(
                "NET DUE advance {} is shorter than its rows ({} dots)",
                self.net_due.advance, net_due
            ));
        }
        let h = &self.header;
        if h.logo_height > h.height || h.logo_text_offset > h.logo_height {
            return fail(format!(
                "logo box {}x{} with text at {} does not fit the {}-dot header",
                h.logo_width, h.logo_height, h.logo_text_offset, h.height
            ));
        }
        if self.table.heading_arabic_offset > self.table.heading_advance {
            return fail(format!(
                "Arabic heading offset {} is below the heading advance {}",
                self.table.heading_arabic_offset, self.table.heading_advance
            ));
        }
        let rules = dots(self.totals.rule_gap) + dots(self.totals.rule_thickness);
        if rules > dots(self.totals.rule_advance) {
            return fail(format!(
                "double rule ({} dots) is taller than its advance {}",
                rules, self.totals.rule_advance
            ));
        }
        if self.footer.customer_signature_drop > self.footer.signature_advance {
            return fail(format!(
                "customer signature drop {} is below the signature advance {}",
                self.footer.customer_signature_drop, self.footer.signature_advance
            ));
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        Template::zq520().validate().unwrap();
        Template::zq520_832().validate().unwrap();
    }

    #[test]
    fn test_preset_widths() {
        assert_eq!(Template::zq520().label_width, 812);
        assert_eq!(Template::zq520_832().label_width, 832);
        assert_eq!(Template::zq520_832().table.columns.amount, 720);
        assert_eq!(Template::zq520_832().details.right_x, 540);
    }

    #[test]
    fn test_label_length() {
        let t = Template::zq520();
        assert_eq!(t.label_length(0).unwrap(), 1300);
        assert_eq!(t.label_length(3).unwrap(), 1600);
    }

    #[test]
    fn test_label_length_overflow() {
        let mut t = Template::zq520();
        t.base_height = u32::MAX;
        assert_eq!(t.label_length(0).unwrap(), u32::MAX);
        assert!(matches!(t.label_length(1), Err(BayanError::LayoutInvariant(_))));
        assert!(matches!(
            Template::zq520().label_length(usize::MAX),
            Err(BayanError::LayoutInvariant(_))
        ));
    }

    #[test]
    fn test_fixed_extent_fits_base_height() {
        let t = Template::zq520();
        assert_eq!(t.fixed_extent(), 1014);
        assert_eq!(t.line_extent(), 64);
    }

    #[test]
    fn test_parse() {
        assert_eq!(Template::parse("ZQ520").unwrap().name, "zq520");
        assert_eq!(Template::parse("zq520-832").unwrap().name, "zq520-832");
        assert!(Template::parse("unknown").is_err());
    }

    #[test]
    fn test_undersized_base_height() {
        let mut t = Template::zq520();
        t.base_height = 900;
        assert!(matches!(t.validate(), Err(BayanError::LayoutInvariant(_))));
    }

    #[test]
    fn test_width_beyond_print_head() {
        let mut t = Template::zq520();
        t.label_width = 864;
        assert!(matches!(t.validate(), Err(BayanError::LayoutInvariant(_))));
    }

    #[test]
    fn test_huge_margin_is_rejected() {
        let t: Template = serde_json::from_str(r#"{"margin": 3000000000}"#).unwrap();
        assert!(matches!(t.validate(), Err(BayanError::LayoutInvariant(_))));
    }

    #[test]
    fn test_overflowing_extent_is_rejected() {
        let mut t = Template::zq520();
        t.base_height = u32::MAX;
        t.header.height = u32::MAX;
        t.details.advance = u32::MAX;
        assert!(matches!(t.validate(), Err(BayanError::LayoutInvariant(_))));

        let mut t = Template::zq520();
        t.details.row = u32::MAX;
        assert!(matches!(t.validate(), Err(BayanError::LayoutInvariant(_))));

        let mut t = Template::zq520();
        t.net_due.row_advance = u32::MAX;
        assert!(matches!(t.validate(), Err(BayanError::LayoutInvariant(_))));
    }

    #[test]
    fn test_right_column_past_label_width() {
        let mut t = Template::zq520();
        t.details.right_x = 700;
        let err = t.validate().unwrap_err().to_string();
        assert!(err.contains("details right column"), "{}", err);

        let mut t = Template::zq520();
        t.net_due.arabic_x = u32::MAX;
        assert!(matches!(t.validate(), Err(BayanError::LayoutInvariant(_))));

        let mut t = Template::zq520();
        t.table.columns.amount_width = 200;
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_undersized_per_line_height() {
        let mut t = Template::zq520();
        t.per_line_height = 60;
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let t: Template = serde_json::from_str(r#"{"name": "custom", "label_width": 832}"#).unwrap();
        assert_eq!(t.label_width, 832);
        assert_eq!(t.base_height, 1300);
        assert_eq!(t.table.columns.tax, 550);
        t.validate().unwrap();
    }

    #[test]
    fn test_from_json_file() {
        let dir = std::env::temp_dir().join(format!("bayan-template-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("narrow.json");
        std::fs::write(&path, r#"{"name": "narrow", "base_height": 500}"#).unwrap();
        assert!(Template::from_json_file(&path).is_err());
        std::fs::write(&path, serde_json::to_string(&Template::zq520_832()).unwrap()).unwrap();
        assert_eq!(Template::from_json_file(&path).unwrap(), Template::zq520_832());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
