//! # Bilingual Layout Compiler
//!
//! Walks the invoice template top to bottom, advancing a cursor `y`, and
//! emits one [`Op`] per field:
//!
//! ```text
//! company header ─► title ─► details ─► SALES ─► rule ─► table heading ─► rule
//!     ─► line items (×N) ─► double rule ─► totals ─► NET DUE ─► TC CHARGED
//!     ─► rule ─► count ─► payment due ─► rule ─► signatures ─► DUPLICATE
//! ```
//!
//! ## Arabic Policy
//!
//! Each fragment is tagged with [`Script::detect`]. Latin fragments become
//! native text fields. Arabic fragments are right-aligned in their column
//! and rendered according to [`ArabicPolicy`]:
//!
//! - `Raster`: the fragment is captured through a [`SurfaceCapture`],
//!   thresholded by the bitmap codec and placed as a graphic field. A
//!   capture that fails or does not decode prints the placeholder pattern.
//! - `NativeFont`: the fragment is printed with a downloaded font under a
//!   `^CW` alias with `^PA` bidirectional layout. Only for printers known to
//!   carry a font with Arabic coverage.
//!
//! Output is a pure function of the invoice and the template, so repeated
//! compilation yields byte-identical documents.

use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::format;
use super::fragment::{Fragment, Script};
use super::template::Template;
use crate::error::BayanError;
use crate::invoice::{InvoiceDetails, InvoiceLine, Organization, Store};
use crate::ir::{self, FontSpec, Op, Program, TextField};
use crate::printer::PrinterConfig;
use crate::protocol::zpl::Encoding;
use crate::render::bitmap::{self, MonoBitmap};
use crate::render::surface::{Direction, FragmentRequest, SurfaceCapture};

/// Font alias used for native Arabic fields.
pub const NATIVE_FONT_ALIAS: char = 'Z';

/// Arabic-capable TrueType font shipped on ZQ5-series printers.
pub const NATIVE_FONT_PATH: &str = "E:TT0003M_.TTF";

/// Table heading labels, English over Arabic, in column order.
const TABLE_HEADINGS: [(&str, &str); 7] = [
    ("ITEM/DESCRIPTION", "بند/وصف"),
    ("UPC", "رمز المنتج"),
    ("QTY", "الكمية"),
    ("PRICE", "السعر"),
    ("DISC/REBATE", "الخصم/الحسم"),
    ("VAT AMOUNT", "مبلغ الضريبة"),
    ("AMOUNT", "المبلغ"),
];

const SALES_ARABIC: &str = "المبيعات";
const NET_DUE_ARABIC: &str = "صافي مستحق الفاتورة";

/// How Arabic fragments reach the paper.
#[derive(Clone, Copy)]
pub enum ArabicPolicy<'a> {
    /// Rasterize through a surface and embed as graphic fields.
    Raster(&'a dyn SurfaceCapture),
    /// Print with a printer-resident font under [`NATIVE_FONT_ALIAS`].
    NativeFont { font_path: &'a str },
}

impl std::fmt::Debug for ArabicPolicy<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Raster(_) => f.write_str("Raster"),
            Self::NativeFont { font_path } => {
                f.debug_struct("NativeFont").field("font_path", font_path).finish()
            }
        }
    }
}

/// Capture height for an Arabic fragment at `font` dots.
pub fn capture_height(font: u32) -> u32 {
    font.saturating_mul(5).div_ceil(4)
}

/// Compiles invoices into label programs for one template.
///
/// Holds no per-invoice state; one compiler can serve any number of print
/// requests.
#[derive(Debug)]
pub struct LayoutCompiler<'a> {
    template: Template,
    policy: ArabicPolicy<'a>,
}

impl<'a> LayoutCompiler<'a> {
    pub fn new(template: Template, policy: ArabicPolicy<'a>) -> Self {
        Self { template, policy }
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Build the label program for `details`.
    pub fn compile(&self, details: &InvoiceDetails) -> Result<Program, BayanError> {
        self.template.validate()?;
        let length = self.template.label_length(details.lines.len())?;

        let mut label = Label::new(&self.template, self.policy);
        let extent = label.invoice(details, length);

        if extent > length {
            return Err(BayanError::LayoutInvariant(format!(
                "content reaches y={} but the label is {} dots long",
                extent, length
            )));
        }

        debug!(
            invoice = %details.invoice.invoice_number,
            lines = details.lines.len(),
            ops = label.program.len(),
            length,
            media_mm = PrinterConfig::default().dots_to_mm(length),
            "compiled invoice label"
        );
        Ok(label.program)
    }

    /// Compile `details` to ZPL text and check its structure.
    pub fn to_zpl(&self, details: &InvoiceDetails) -> Result<String, BayanError> {
        let zpl = self.compile(details)?.to_zpl();
        ir::validate(&zpl)?;
        Ok(zpl)
    }
}

// ============================================================================
// LABEL BUILDER
// ============================================================================

/// Per-compilation emitter. Owns the program being built.
struct Label<'t, 'a> {
    t: &'t Template,
    policy: ArabicPolicy<'a>,
    program: Program,
}

impl<'t, 'a> Label<'t, 'a> {
    fn new(t: &'t Template, policy: ArabicPolicy<'a>) -> Self {
        Self {
            t,
            policy,
            program: Program::new(),
        }
    }

    /// Emit the whole invoice on a `length`-dot canvas. Returns the lowest
    /// dot row reached.
    fn invoice(&mut self, details: &InvoiceDetails, length: u32) -> u32 {
        let t = self.t;
        let inv = &details.invoice;

        self.setup(length);

        let mut y = t.margin;
        self.company_header(y, details.organization.as_ref());
        y += t.header.height;

        self.centered(y, t.header.title_font, "INVOICE");
        y += t.header.title_advance;

        self.details(y, details);
        y += t.details.advance;

        self.text(t.table.sales_x, y, t.table.sales_font, "SALES");
        self.arabic(
            t.table.sales_arabic_x,
            y,
            t.table.sales_arabic_width,
            t.table.sales_arabic_font,
            SALES_ARABIC,
        );
        y += t.table.sales_advance;

        self.dashed(y, t.table.rule_dashes, t.table.rule_font);
        y += t.table.rule_advance;

        self.table_heading(y);
        y += t.table.heading_advance;

        self.dashed(y, t.table.rule_dashes, t.table.rule_font);
        y += t.table.heading_rule_advance;

        for line in &details.lines {
            self.line_item(y, line);
            y += t.table.line_advance;
        }

        self.double_rule(y);
        y += t.totals.rule_advance;

        self.totals(y, details);
        y += t.totals.advance;

        self.net_due(y, details);
        y += t.net_due.advance;

        let f = &t.footer;
        self.text(
            t.margin,
            y,
            f.charged_font,
            format!("TC CHARGED : {}", format::money(inv.net_amount)),
        );
        y += f.charged_advance;

        self.dashed(y, f.long_dashes, f.long_rule_font);
        y += f.long_rule_advance;

        let items = Decimal::from(details.item_count() as u64);
        let qty = details.total_qty();
        self.text(
            t.margin,
            y,
            f.count_font,
            format!(
                "count : {} + {}={}",
                items,
                format::quantity(qty),
                format::quantity(items + qty)
            ),
        );
        y += f.count_advance;

        self.text(
            t.margin,
            y,
            f.due_font,
            format!("PAYMENT DUE DATE :{}", format::date(&inv.payment_due_date)),
        );
        y += f.due_advance;

        self.dashed(y, f.long_dashes, f.long_rule_font);
        y += f.closing_rule_advance;

        self.signatures(y);
        y += f.signature_advance;

        self.centered(y, f.duplicate_font, "DUPLICATE");
        y += f.duplicate_font;

        self.program.push(Op::EndLabel);
        y
    }

    fn setup(&mut self, length: u32) {
        let t = self.t;
        self.program.extend([
            Op::StartLabel,
            Op::TearOff,
            Op::LabelShift(t.label_shift),
            Op::PrintWidth(t.label_width),
            Op::LabelLength(length),
            Op::Encoding(Encoding::Utf8),
        ]);
        if let ArabicPolicy::NativeFont { font_path } = self.policy {
            self.program.push(Op::FontAlias {
                alias: NATIVE_FONT_ALIAS,
                path: font_path.to_string(),
            });
        }
    }

    // ========== Regions ==========

    fn company_header(&mut self, y: u32, organization: Option<&Organization>) {
        let t = self.t;
        let h = &t.header;
        let fallback = Organization::default();
        let org = organization.unwrap_or(&fallback);

        self.program.push(Op::Box {
            x: t.margin,
            y,
            width: h.logo_width,
            height: h.logo_height,
            thickness: h.logo_thickness,
        });
        self.text(
            t.margin + h.logo_text_offset,
            y + h.logo_text_offset,
            h.logo_font,
            "LOGO",
        );

        // A row whose fields are all empty is left out; the others keep their slot
        let filled = |fields: &[&str]| fields.iter().any(|f| !f.is_empty());
        let rows = [
            filled(&[org.vat_reg_number.as_str()]).then(|| format!("VAT REG.NO.: {}", org.vat_reg_number)),
            filled(&[org.division.as_str()]).then(|| org.division.clone()),
            filled(&[org.po_box.as_str(), org.city.as_str(), org.country.as_str()])
                .then(|| format!("PO BOX:{}-{}-{}", org.po_box, org.city, org.country)),
            filled(&[org.phone.as_str(), org.fax.as_str()]).then(|| format!("TEL:{} FAX:{}", org.phone, org.fax)),
            filled(&[org.email.as_str()]).then(|| format!("EMAIL:{}", org.email)),
        ];
        for (i, row) in rows.iter().enumerate() {
            let Some(row) = row else { continue };
            let row = format::truncate(row, h.block_budget);
            self.right_aligned(h.block_x, y + i as u32 * h.block_row, h.block_width, h.block_font, &row);
        }
    }

    fn details(&mut self, top: u32, details: &InvoiceDetails) {
        let t = self.t;
        let d = &t.details;
        let inv = &details.invoice;
        let fallback = Store::default();
        let store = details.store.as_ref().unwrap_or(&fallback);

        let tax_number = if store.tax_doc_number.is_empty() {
            "N/A"
        } else {
            store.tax_doc_number.as_str()
        };
        let left = [
            format!(
                "SALESMAN: {} - {} - {}",
                inv.salesman_code, inv.salesman_name, inv.salesman_phone
            ),
            format!("Route  : {} - {}", inv.route_code, inv.route_name),
            format!("CUST   : {}", store.code),
            store.name.clone(),
            store.location.clone(),
            format!("CUST VAT : {}", tax_number),
            format!("CUST TEL : {}", store.phone),
        ];
        let left_width = d.right_x.saturating_sub(t.margin);
        for (i, row) in left.iter().enumerate() {
            let row = format::truncate(row, d.left_budget);
            self.left_aligned(t.margin, top + i as u32 * d.row, left_width, d.font, &row);
        }

        let invoice_type = if inv.invoice_type.is_empty() {
            "CREDIT"
        } else {
            inv.invoice_type.as_str()
        };
        let delivery = if inv.delivery_date.is_empty() {
            &inv.invoice_date
        } else {
            &inv.delivery_date
        };
        let right = [
            format!("INVOICE NO  :{}", inv.invoice_number),
            format!("INVOICE TYPE :{}", invoice_type),
            format!("INVOICE DATE :{}", format::date(&inv.invoice_date)),
            format!("DELIVERY DATE:{}", format::date(delivery)),
            format!("TIME        :{}", inv.delivery_time),
        ];
        for (i, row) in right.iter().enumerate() {
            self.right_aligned(d.right_x, top + i as u32 * d.row, d.right_width, d.font, row);
        }
    }

    fn table_heading(&mut self, y: u32) {
        let t = self.t;
        let tb = &t.table;
        for (i, (english, _)) in TABLE_HEADINGS.iter().enumerate() {
            self.text(tb.heading_x[i], y, tb.heading_font, *english);
        }
        let arabic_y = y + tb.heading_arabic_offset;
        for (i, (_, arabic)) in TABLE_HEADINGS.iter().enumerate() {
            self.arabic(
                tb.heading_x[i],
                arabic_y,
                tb.heading_arabic_width[i],
                tb.heading_arabic_font,
                arabic,
            );
        }
    }

    fn line_item(&mut self, top: u32, line: &InvoiceLine) {
        let t = self.t;
        let tb = &t.table;
        let c = &tb.columns;

        let mut y = top;
        self.text(c.item, y, tb.line_font, format::truncate(&line.item_code, tb.item_budget));
        self.text(c.qty, y, tb.line_font, format::quantity(line.qty));
        self.text(c.uom, y, tb.line_font, format::truncate(&line.uom, tb.uom_budget));
        self.text(c.price, y, tb.line_font, format::money(line.unit_price));
        self.text(c.discount, y, tb.line_font, format::money(line.total_discount));
        self.text(
            c.tax,
            y,
            tb.tax_font,
            format!(
                "{}({})",
                format::signed(line.total_tax),
                format::percentage(line.effective_tax_percentage())
            ),
        );
        self.amount(y, tb.line_font, line.net_amount);

        y += tb.row_offsets[0];
        let description = format::truncate(&line.sku_name, tb.description_budget);
        let width = t.label_width - 2 * t.margin;
        self.left_aligned(c.item, y, width, tb.description_font, &description);

        y += tb.row_offsets[1];
        self.text(c.item, y, tb.detail_font, format!("UPC : {}", line.upc_code));

        y += tb.row_offsets[2];
        self.text(
            c.item,
            y,
            tb.detail_font,
            format!("Excise Duty : {}", format::money(line.excise_duty)),
        );
    }

    fn double_rule(&mut self, y: u32) {
        let t = self.t;
        let width = t.label_width - 2 * t.margin;
        for offset in [0, t.totals.rule_gap] {
            self.program.push(Op::Box {
                x: t.margin,
                y: y + offset,
                width,
                height: t.totals.rule_thickness,
                thickness: t.totals.rule_thickness,
            });
        }
    }

    fn totals(&mut self, y: u32, details: &InvoiceDetails) {
        let t = self.t;
        let c = &t.table.columns;
        let font = t.totals.font;
        let inv = &details.invoice;

        self.text(c.item, y, font, "TOTAL");
        self.text(c.qty, y, font, format::quantity(details.total_qty()));
        self.text(c.discount, y, font, format::money(inv.total_discount));
        self.text(c.tax, y, font, format::signed(inv.total_tax));
        self.amount(y, font, inv.net_amount);
    }

    fn net_due(&mut self, top: u32, details: &InvoiceDetails) {
        let t = self.t;
        let n = &t.net_due;
        let inv = &details.invoice;

        self.text(t.margin, top, n.heading_font, "NET DUE THIS INVOICE");
        self.arabic(n.arabic_x, top, n.arabic_width, n.heading_font, NET_DUE_ARABIC);

        let rows = [
            ("SALES", format::signed(details.sales()), "المبيعات"),
            ("DISCOUNT", format::negated(inv.total_discount), "القرص"),
            ("GOOD RETURNS", format::signed(inv.good_returns), "البضائع المرتجعة"),
            ("DAMAGED RETURNS", format::signed(inv.damaged_returns), "بضاعة معدومة مرتجعة"),
            ("VAT AMOUNT", format::signed(inv.total_tax), "مبلغ ضريبة القيمة المضافة"),
            ("EXCISE DUTY AMOUNT", format::signed(inv.excise_duty_amount), "مبلغ ضريبة الاستهلاك"),
            ("NET SALES", format::signed(inv.net_amount), "صافي المبيعات"),
        ];

        let mut y = top + n.heading_advance;
        for (label, value, arabic) in rows {
            self.text(t.margin, y, n.row_font, label);
            self.text(n.value_x, y, n.row_font, value);
            self.arabic(n.arabic_x, y, n.arabic_width, n.row_font, arabic);
            y += n.row_advance;
        }
    }

    fn signatures(&mut self, y: u32) {
        let t = self.t;
        let f = &t.footer;
        self.text(
            t.margin,
            y + f.customer_signature_drop,
            f.signature_font,
            "CUSTOMER SIGNATURE__________",
        );
        self.text(
            f.salesman_signature_x,
            y,
            f.signature_font,
            "SALESMAN SIGNATURE__________",
        );
    }

    // ========== Field Helpers ==========

    fn text(&mut self, x: u32, y: u32, font: u32, content: impl Into<String>) {
        self.program
            .push(Op::Text(TextField::new(x, y, FontSpec::scalable(font), content)));
    }

    fn centered(&mut self, y: u32, font: u32, content: &str) {
        self.program.push(Op::Text(
            TextField::new(0, y, FontSpec::scalable(font), content).center(self.t.label_width),
        ));
    }

    fn amount(&mut self, y: u32, font: u32, value: Decimal) {
        let t = self.t;
        let c = &t.table.columns;
        self.program.push(Op::Text(
            TextField::new(c.amount, y, FontSpec::scalable(font), format::money(value))
                .right(c.amount_width),
        ));
    }

    fn dashed(&mut self, y: u32, dashes: usize, font: u32) {
        self.text(self.t.margin, y, font, "-".repeat(dashes));
    }

    /// Data-derived text in a left-aligned column.
    fn left_aligned(&mut self, x: u32, y: u32, width: u32, font: u32, content: &str) {
        let fragment = Fragment::new(content);
        match fragment.script {
            Script::Latin => self.text(x, y, font, fragment.text),
            Script::Arabic => self.place_arabic(x, y, width, font, &fragment),
        }
    }

    /// Data-derived text in a right-aligned column.
    fn right_aligned(&mut self, x: u32, y: u32, width: u32, font: u32, content: &str) {
        let fragment = Fragment::new(content);
        match fragment.script {
            Script::Latin => self.program.push(Op::Text(
                TextField::new(x, y, FontSpec::scalable(font), fragment.text).right(width),
            )),
            Script::Arabic => self.place_arabic(x, y, width, font, &fragment),
        }
    }

    /// Fixed Arabic label right-aligned in a `width`-dot column at (x, y).
    fn arabic(&mut self, x: u32, y: u32, width: u32, font: u32, content: &str) {
        self.place_arabic(x, y, width, font, &Fragment::new(content));
    }

    /// Place an Arabic fragment according to the policy.
    fn place_arabic(&mut self, x: u32, y: u32, width: u32, font: u32, fragment: &Fragment<'_>) {
        match self.policy {
            ArabicPolicy::NativeFont { .. } => {
                let field = TextField::new(
                    x,
                    y,
                    FontSpec::Alias {
                        alias: NATIVE_FONT_ALIAS,
                        height: font,
                    },
                    fragment.text,
                )
                .right(width);
                let field = match fragment.script.direction() {
                    Direction::RightToLeft => field.right_to_left(),
                    Direction::LeftToRight => field,
                };
                self.program.push(Op::Text(field));
            }
            ArabicPolicy::Raster(surface) => {
                let height = capture_height(font);
                let bitmap = rasterize(surface, fragment, font, width, height);
                self.program.push(Op::Graphic { x, y, bitmap });
            }
        }
    }
}

/// Capture one fragment and convert it to a bitmap of exactly
/// `width` × `height` dots.
fn rasterize(
    surface: &dyn SurfaceCapture,
    fragment: &Fragment<'_>,
    font: u32,
    width: u32,
    height: u32,
) -> MonoBitmap {
    let request = FragmentRequest {
        text: fragment.text,
        font_size: font,
        width,
        height,
        direction: fragment.script.direction(),
    };
    match surface.capture(&request) {
        Ok(png) => bitmap::from_png_or_placeholder(&png, width as usize, height as usize),
        Err(e) => {
            warn!(error = %e, text = fragment.text, "fragment capture failed, printing placeholder");
            bitmap::placeholder(width as usize, height as usize)
        }
    }
}

// ============================================================================
// ARABIC TEST LABEL
// ============================================================================

/// Small fixed label that exercises native right-to-left Arabic printing.
///
/// Useful to find out whether a printer carries a font with Arabic
/// coverage before choosing [`ArabicPolicy::NativeFont`].
pub fn arabic_test_label(template: &Template) -> String {
    let alias = FontSpec::Alias {
        alias: NATIVE_FONT_ALIAS,
        height: 30,
    };
    let width = template.label_width.saturating_sub(template.margin.saturating_mul(2));
    let m = template.margin;

    let mut program = Program::new();
    program.extend([
        Op::StartLabel,
        Op::PrintWidth(template.label_width),
        Op::LabelLength(300),
        Op::Encoding(Encoding::Utf8),
        Op::FontAlias {
            alias: NATIVE_FONT_ALIAS,
            path: NATIVE_FONT_PATH.to_string(),
        },
        Op::Text(TextField::new(m, 20, FontSpec::scalable(28), "ARABIC TEST").center(width)),
        Op::Text(TextField::new(m, 70, alias, "مرحبا بالعالم").right(width).right_to_left()),
        Op::Text(TextField::new(m, 120, alias, SALES_ARABIC).right(width).right_to_left()),
        Op::Text(TextField::new(m, 170, alias, NET_DUE_ARABIC).right(width).right_to_left()),
        Op::Text(TextField::new(m, 230, FontSpec::scalable(20), "0123456789 ABC")),
        Op::EndLabel,
    ]);
    program.to_zpl()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::InvoiceRecord;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use std::cell::RefCell;

    /// Surface that records requests and returns a fixed capture.
    struct ScriptedSurface {
        png: Option<Vec<u8>>,
        requests: RefCell<Vec<(String, u32, u32, Direction)>>,
    }

    impl ScriptedSurface {
        fn failing() -> Self {
            Self {
                png: None,
                requests: RefCell::new(Vec::new()),
            }
        }

        fn returning(png: Vec<u8>) -> Self {
            Self {
                png: Some(png),
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl SurfaceCapture for ScriptedSurface {
        fn capture(&self, request: &FragmentRequest<'_>) -> Result<Vec<u8>, BayanError> {
            self.requests
                .borrow_mut()
                .push((request.text.to_string(), request.width, request.height, request.direction));
            self.png
                .clone()
                .ok_or_else(|| BayanError::Image("no renderer".to_string()))
        }
    }

    fn native() -> LayoutCompiler<'static> {
        LayoutCompiler::new(
            Template::zq520(),
            ArabicPolicy::NativeFont {
                font_path: NATIVE_FONT_PATH,
            },
        )
    }

    fn invoice(lines: Vec<InvoiceLine>) -> InvoiceDetails {
        InvoiceDetails::new(
            InvoiceRecord {
                invoice_number: "INV-1001".to_string(),
                invoice_date: "2024-03-07".to_string(),
                net_amount: dec!(105.00),
                total_amount: dec!(105.00),
                total_discount: dec!(5.00),
                total_tax: dec!(5.00),
                payment_due_date: "2024-04-06T00:00:00Z".to_string(),
                ..Default::default()
            },
            None,
            None,
            lines,
        )
    }

    fn taxed_line(number: u32) -> InvoiceLine {
        InvoiceLine {
            line_number: number,
            item_code: format!("SKU{}", number),
            sku_name: "MINERAL WATER 500ML".to_string(),
            upc_code: "6291234567890".to_string(),
            uom: "CTN".to_string(),
            qty: dec!(3),
            unit_price: dec!(10.00),
            total_tax: dec!(1.50),
            net_amount: dec!(31.50),
            ..Default::default()
        }
    }

    #[test]
    fn test_capture_height() {
        assert_eq!(capture_height(14), 18);
        assert_eq!(capture_height(16), 20);
        assert_eq!(capture_height(24), 30);
    }

    #[test]
    fn test_label_frame() {
        let zpl = native().to_zpl(&invoice(vec![])).unwrap();
        assert!(zpl.starts_with("^XA\n^MMT\n^LS0\n^PW812\n^LL1300\n^CI28\n^CWZ,E:TT0003M_.TTF\n"));
        assert!(zpl.ends_with("^XZ\n"));
    }

    #[test]
    fn test_sales_row_is_signed() {
        let zpl = native().to_zpl(&invoice(vec![])).unwrap();
        assert!(zpl.contains("^FDSALES^FS\n^FO380,"), "{}", zpl);
        assert!(zpl.contains("^FD+105.00^FS"));
        assert!(zpl.contains("^FDDISCOUNT^FS\n^FO380,"));
        assert!(zpl.contains("^FD-5.00^FS"));
    }

    #[test]
    fn test_zero_discount_is_unsigned_zero() {
        let mut details = invoice(vec![]);
        details.invoice.total_discount = dec!(0);
        let zpl = native().to_zpl(&details).unwrap();
        assert!(
            zpl.contains("^FDDISCOUNT^FS\n^FO380,570^A0N,16,16^FD+0.00^FS\n"),
            "{}",
            zpl
        );
        assert!(!zpl.contains("-0.00"));
    }

    #[test]
    fn test_line_tax_defaults_to_five_percent() {
        let zpl = native().to_zpl(&invoice(vec![taxed_line(1)])).unwrap();
        assert!(zpl.contains("^FO550,460^A0N,14,14^FD+1.50(5%)^FS"), "{}", zpl);
        assert!(zpl.contains("^FO700,460^A0N,16,16^FB100,1,0,R^FD31.50^FS"));
        assert!(zpl.contains("^FO15,478^A0N,14,14^FDMINERAL WATER 500ML^FS"));
        assert!(zpl.contains("^FO15,494^A0N,12,12^FDUPC : 6291234567890^FS"));
        assert!(zpl.contains("^FO15,512^A0N,12,12^FDExcise Duty : 0.00^FS"));
    }

    #[test]
    fn test_label_length_grows_with_lines() {
        let c = native();
        let mut last = 0;
        for n in 0..5 {
            let lines = (1..=n).map(taxed_line).collect();
            let length = c.compile(&invoice(lines)).unwrap().label_length().unwrap();
            assert_eq!(length, 1300 + n * 100);
            assert!(length >= last);
            last = length;
        }
    }

    #[test]
    fn test_overflowing_label_length_is_an_error() {
        let mut template = Template::zq520();
        template.base_height = u32::MAX;
        let compiler = LayoutCompiler::new(
            template,
            ArabicPolicy::NativeFont {
                font_path: NATIVE_FONT_PATH,
            },
        );
        assert!(compiler.compile(&invoice(vec![])).is_ok());
        assert!(matches!(
            compiler.compile(&invoice(vec![taxed_line(1)])),
            Err(BayanError::LayoutInvariant(_))
        ));
    }

    #[test]
    fn test_native_arabic_fields() {
        let zpl = native().to_zpl(&invoice(vec![])).unwrap();
        assert!(zpl.contains("^PA0,1,1,1^AZN,24^FB150,1,0,R^FDالمبيعات^FS"));
        assert!(!zpl.contains("^GFA"));
    }

    #[test]
    fn test_raster_arabic_uses_placeholder_on_failure() {
        let surface = ScriptedSurface::failing();
        let compiler = LayoutCompiler::new(Template::zq520(), ArabicPolicy::Raster(&surface));
        let program = compiler.compile(&invoice(vec![])).unwrap();

        let graphics: Vec<&MonoBitmap> = program
            .iter()
            .filter_map(|op| match op {
                Op::Graphic { bitmap, .. } => Some(bitmap),
                _ => None,
            })
            .collect();
        // SALES + 7 headings + NET DUE heading + 7 rows
        assert_eq!(graphics.len(), 16);
        assert_eq!(graphics[0], &bitmap::placeholder(150, 30));

        let requests = surface.requests.borrow();
        assert_eq!(requests[0], ("المبيعات".to_string(), 150, 30, Direction::RightToLeft));
        assert_eq!(requests[1], ("بند/وصف".to_string(), 100, 18, Direction::RightToLeft));
        assert!(!program.to_zpl().contains("^CW"));
    }

    #[test]
    fn test_raster_capture_is_resampled_to_column() {
        let mut img = image::RgbaImage::from_pixel(4, 2, image::Rgba([0, 0, 0, 255]));
        img.put_pixel(0, 0, image::Rgba([255, 255, 255, 255]));
        let mut png = std::io::Cursor::new(Vec::new());
        img.write_to(&mut png, image::ImageFormat::Png).unwrap();

        let surface = ScriptedSurface::returning(png.into_inner());
        let compiler = LayoutCompiler::new(Template::zq520(), ArabicPolicy::Raster(&surface));
        let program = compiler.compile(&invoice(vec![])).unwrap();
        let first = program.iter().find_map(|op| match op {
            Op::Graphic { x, y, bitmap } => Some((*x, *y, bitmap)),
            _ => None,
        });
        let (x, y, bitmap) = first.unwrap();
        assert_eq!((x, y), (420, 350));
        assert_eq!((bitmap.width, bitmap.height), (150, 30));
        assert!(!bitmap.get(0, 0));
        assert!(bitmap.get(149, 29));
    }

    #[test]
    fn test_arabic_store_name_follows_policy() {
        let mut details = invoice(vec![]);
        details.store = Some(Store {
            code: "C042".to_string(),
            name: "بقالة النور".to_string(),
            location: "AL QUOZ".to_string(),
            ..Default::default()
        });
        let zpl = native().to_zpl(&details).unwrap();
        assert!(zpl.contains("^FO15,222^PA0,1,1,1^AZN,17^FB505,1,0,R^FDبقالة النور^FS"), "{}", zpl);
        assert!(zpl.contains("^FO15,246^A0N,17,17^FDAL QUOZ^FS"));
        assert!(zpl.contains("^FDCUST VAT : N/A^FS"));
    }

    #[test]
    fn test_arabic_store_name_is_captured_right_to_left() {
        let mut details = invoice(vec![]);
        details.store = Some(Store {
            name: "بقالة النور".to_string(),
            location: "AL QUOZ".to_string(),
            ..Default::default()
        });
        let surface = ScriptedSurface::failing();
        let compiler = LayoutCompiler::new(Template::zq520(), ArabicPolicy::Raster(&surface));
        compiler.compile(&details).unwrap();

        let requests = surface.requests.borrow();
        let store = requests.iter().find(|r| r.0 == "بقالة النور").unwrap();
        assert_eq!((store.1, store.3), (505, Direction::RightToLeft));
        assert!(requests.iter().all(|r| r.3 == Direction::RightToLeft));
        assert!(!requests.iter().any(|r| r.0 == "AL QUOZ"));
    }

    #[test]
    fn test_missing_organization_prints_no_empty_header_rows() {
        let zpl = native().to_zpl(&invoice(vec![])).unwrap();
        for stub in ["VAT REG.NO.:", "PO BOX:", "TEL:", "EMAIL:"] {
            assert!(!zpl.contains(stub), "{} in {}", stub, zpl);
        }
        assert!(zpl.contains("^FDLOGO^FS"));
    }

    #[test]
    fn test_partial_organization_keeps_row_slots() {
        let mut details = invoice(vec![]);
        details.organization = Some(Organization {
            phone: "04 3334444".to_string(),
            email: "sales@example.ae".to_string(),
            ..Default::default()
        });
        let zpl = native().to_zpl(&details).unwrap();
        assert!(zpl.contains("^FO480,75^A0N,16,16^FB320,1,0,R^FDTEL:04 3334444 FAX:^FS"), "{}", zpl);
        assert!(zpl.contains("^FO480,95^A0N,16,16^FB320,1,0,R^FDEMAIL:sales@example.ae^FS"));
        assert!(!zpl.contains("PO BOX:"));
        assert!(!zpl.contains("VAT REG.NO.:"));
    }

    #[test]
    fn test_details_right_column() {
        let zpl = native().to_zpl(&invoice(vec![])).unwrap();
        assert!(zpl.contains("^FO520,150^A0N,17,17^FB280,1,0,R^FDINVOICE NO  :INV-1001^FS"));
        assert!(zpl.contains("^FDINVOICE TYPE :CREDIT^FS"));
        assert!(zpl.contains("^FDINVOICE DATE :07/03/24^FS"));
        assert!(zpl.contains("^FDDELIVERY DATE:07/03/24^FS"));
        assert!(zpl.contains("^FDPAYMENT DUE DATE :06/04/24^FS"));
    }

    #[test]
    fn test_count_summary() {
        let mut second = taxed_line(2);
        second.qty = dec!(2.5);
        let zpl = native().to_zpl(&invoice(vec![taxed_line(1), second])).unwrap();
        assert!(zpl.contains("^FDcount : 2 + 5.5=7.5^FS"));
        assert!(zpl.contains("^FDTOTAL^FS"));
    }

    #[test]
    fn test_undersized_template_is_rejected() {
        let mut template = Template::zq520();
        template.base_height = 800;
        let c = LayoutCompiler::new(template, ArabicPolicy::NativeFont { font_path: NATIVE_FONT_PATH });
        assert!(matches!(
            c.compile(&invoice(vec![])),
            Err(BayanError::LayoutInvariant(_))
        ));
    }

    #[test]
    fn test_arabic_test_label() {
        let zpl = arabic_test_label(&Template::zq520());
        assert!(zpl.starts_with("^XA\n^PW812\n^LL300\n^CI28\n^CWZ,E:TT0003M_.TTF\n"));
        assert!(zpl.contains("^PA0,1,1,1^AZN,30^FB782,1,0,R^FDمرحبا بالعالم^FS"));
        ir::validate(&zpl).unwrap();
    }
}
