//! # Invoice Data Model
//!
//! Read-only snapshots of an invoice, its ordered lines and the reference
//! data (store, organization) shown on the printed label.
//!
//! ## Money
//!
//! All monetary fields are [`Decimal`] values. They are stored as supplied
//! by the data provider and only rounded to two fractional digits when a
//! label is rendered.
//!
//! ## Derived Totals
//!
//! ```text
//! sales     = net_amount + total_discount - total_tax
//! total_qty = Σ line.qty
//! ```
//!
//! `line_count` is a display field copied from the source record. Layout
//! always uses `lines.len()`.

pub mod provider;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::BayanError;

pub use provider::{InvoiceProvider, JsonInvoiceProvider, MemoryInvoiceProvider};

/// Tolerance used when checking that stored totals agree with each other.
pub const ROUNDING_TOLERANCE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

/// Tax percentage rendered for taxed lines that carry no explicit rate.
pub const DEFAULT_TAX_PERCENTAGE: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// Invoice header record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceRecord {
    pub uid: String,
    pub invoice_number: String,
    pub invoice_date: String,
    pub delivery_date: String,
    pub delivery_time: String,
    pub store_uid: String,
    /// CREDIT, CASH, ...
    pub invoice_type: String,
    pub total_amount: Decimal,
    pub total_discount: Decimal,
    pub total_tax: Decimal,
    pub net_amount: Decimal,
    pub line_count: u32,
    pub status: String,
    pub payment_status: String,
    pub payment_due_date: String,
    pub notes: String,
    pub salesman_code: String,
    pub salesman_name: String,
    pub salesman_phone: String,
    pub route_code: String,
    pub route_name: String,
    pub good_returns: Decimal,
    pub damaged_returns: Decimal,
    pub excise_duty_amount: Decimal,
}

/// One invoice line. Owned by exactly one [`InvoiceDetails`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceLine {
    pub uid: String,
    pub line_number: u32,
    pub item_code: String,
    pub sku_name: String,
    pub upc_code: String,
    pub uom: String,
    pub qty: Decimal,
    pub unit_price: Decimal,
    pub total_amount: Decimal,
    pub total_discount: Decimal,
    pub total_tax: Decimal,
    /// Explicit VAT rate. `None` and zero both mean "not recorded".
    pub tax_percentage: Option<Decimal>,
    pub net_amount: Decimal,
    pub excise_duty: Decimal,
}

impl InvoiceLine {
    /// VAT rate shown on the label.
    ///
    /// An explicit non-zero rate wins; otherwise taxed lines default to
    /// [`DEFAULT_TAX_PERCENTAGE`] and untaxed lines to zero.
    pub fn effective_tax_percentage(&self) -> Decimal {
        match self.tax_percentage {
            Some(rate) if !rate.is_zero() => rate,
            _ if self.total_tax > Decimal::ZERO => DEFAULT_TAX_PERCENTAGE,
            _ => Decimal::ZERO,
        }
    }

    /// Net amount implied by price, quantity, discount and tax.
    pub fn expected_net(&self) -> Decimal {
        self.qty * self.unit_price - self.total_discount + self.total_tax
    }
}

/// Customer store shown in the details block.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Store {
    pub uid: String,
    pub code: String,
    pub name: String,
    pub legal_name: String,
    pub tax_doc_number: String,
    pub phone: String,
    pub location: String,
}

/// Issuing organization shown in the company header.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Organization {
    pub uid: String,
    pub code: String,
    pub name: String,
    pub name_arabic: String,
    pub vat_reg_number: String,
    pub division: String,
    pub po_box: String,
    pub city: String,
    pub country: String,
    pub phone: String,
    pub fax: String,
    pub email: String,
}

/// An invoice with everything needed to print it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InvoiceDetails {
    #[serde(flatten)]
    pub invoice: InvoiceRecord,
    #[serde(default)]
    pub store: Option<Store>,
    #[serde(default)]
    pub organization: Option<Organization>,
    #[serde(default)]
    pub lines: Vec<InvoiceLine>,
}

impl InvoiceDetails {
    /// Assemble an invoice snapshot. Lines are ordered by `line_number`.
    pub fn new(
        invoice: InvoiceRecord,
        store: Option<Store>,
        organization: Option<Organization>,
        lines: Vec<InvoiceLine>,
    ) -> Self {
        Self {
            invoice,
            store,
            organization,
            lines,
        }
        .normalized()
    }

    /// Sort lines by `line_number` (stable, so equal numbers keep input order).
    pub fn normalized(mut self) -> Self {
        self.lines.sort_by_key(|line| line.line_number);
        self
    }

    /// Sales before discount and tax: `net + discount - tax`.
    pub fn sales(&self) -> Decimal {
        self.invoice.net_amount + self.invoice.total_discount - self.invoice.total_tax
    }

    /// Sum of line quantities.
    pub fn total_qty(&self) -> Decimal {
        self.lines.iter().map(|line| line.qty).sum()
    }

    /// Number of distinct lines actually attached.
    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    /// Verify the stored totals agree with each other within
    /// [`ROUNDING_TOLERANCE`].
    ///
    /// Checks the header identity `net ≈ total - discount + tax` and every
    /// line's own net amount.
    pub fn check_consistency(&self) -> Result<(), BayanError> {
        let inv = &self.invoice;
        let expected = inv.total_amount - inv.total_discount + inv.total_tax;
        if (inv.net_amount - expected).abs() > ROUNDING_TOLERANCE {
            return Err(BayanError::Data(format!(
                "invoice {}: net amount {} does not match total {} - discount {} + tax {}",
                inv.invoice_number, inv.net_amount, inv.total_amount, inv.total_discount, inv.total_tax
            )));
        }

        for line in &self.lines {
            let expected = line.expected_net();
            if (line.net_amount - expected).abs() > ROUNDING_TOLERANCE {
                return Err(BayanError::Data(format!(
                    "invoice {} line {}: net amount {} does not match expected {}",
                    inv.invoice_number, line.line_number, line.net_amount, expected
                )));
            }
        }

        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
