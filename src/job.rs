//! # Print Job
//!
//! One print request: fetch the invoice, compile the label, then deliver
//! it through a connected session or report a dry run.
//!
//! ```text
//! provider.require(uid) ─► [strict: check_consistency] ─► compiler.to_zpl
//!                                                             │
//!                       session connected? ── yes ─► session.write ─► Printed
//!                                            └─ no ─► DryRun (size only)
//! ```
//!
//! Nothing is cached between jobs; each request builds its own document.

use tracing::{info, instrument};

use crate::error::BayanError;
use crate::invoice::InvoiceProvider;
use crate::layout::LayoutCompiler;
use crate::transport::{PrinterLink, PrinterSession};

/// How a finished label left the job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Written to the printer at `device`.
    Printed { device: String, bytes: usize },
    /// No printer connected; the document was generated only.
    DryRun,
}

/// Result of one print request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintOutcome {
    pub invoice_number: String,
    pub zpl: String,
    pub delivery: Delivery,
}

impl PrintOutcome {
    /// Size of the generated document in bytes.
    pub fn size(&self) -> usize {
        self.zpl.len()
    }

    pub fn is_dry_run(&self) -> bool {
        self.delivery == Delivery::DryRun
    }
}

/// Print request runner.
pub struct PrintJob<'c, 's, P: InvoiceProvider + ?Sized> {
    provider: &'c P,
    compiler: &'c LayoutCompiler<'s>,
    strict: bool,
}

impl<'c, 's, P: InvoiceProvider + ?Sized> PrintJob<'c, 's, P> {
    pub fn new(provider: &'c P, compiler: &'c LayoutCompiler<'s>) -> Self {
        Self {
            provider,
            compiler,
            strict: false,
        }
    }

    /// Refuse invoices whose stored totals disagree with each other.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Fetch and compile without delivering.
    #[instrument(skip(self))]
    pub fn dry_run(&self, uid: &str) -> Result<PrintOutcome, BayanError> {
        let (invoice_number, zpl) = self.generate(uid)?;
        info!(invoice = %invoice_number, bytes = zpl.len(), "dry run, label generated");
        Ok(PrintOutcome {
            invoice_number,
            zpl,
            delivery: Delivery::DryRun,
        })
    }

    /// Fetch, compile and write to `session`. A session that is not
    /// connected turns the job into a dry run.
    #[instrument(skip(self, session))]
    pub fn print<L: PrinterLink>(
        &self,
        uid: &str,
        session: &mut PrinterSession<L>,
    ) -> Result<PrintOutcome, BayanError> {
        if !session.is_connected() {
            return self.dry_run(uid);
        }

        let (invoice_number, zpl) = self.generate(uid)?;
        let bytes = session.write(&zpl)?;
        let device = session.link().address().to_string();
        info!(invoice = %invoice_number, device = %device, bytes, "label printed");
        Ok(PrintOutcome {
            invoice_number,
            zpl,
            delivery: Delivery::Printed { device, bytes },
        })
    }

    fn generate(&self, uid: &str) -> Result<(String, String), BayanError> {
        let details = self.provider.require(uid)?;
        if self.strict {
            details.check_consistency()?;
        }
        let zpl = self.compiler.to_zpl(&details)?;
        Ok((details.invoice.invoice_number, zpl))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::{InvoiceDetails, InvoiceRecord, MemoryInvoiceProvider};
    use crate::layout::{ArabicPolicy, NATIVE_FONT_PATH, Template};
    use crate::transport::{ConnectOutcome, ConnectorProfile};
    use rust_decimal_macros::dec;

    #[derive(Default)]
    struct RecordingLink {
        connected: bool,
        written: Vec<u8>,
    }

    impl PrinterLink for RecordingLink {
        fn address(&self) -> &str {
            "AC:3F:A4:00:11:22"
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        fn connect(&mut self, _profile: &ConnectorProfile) -> Result<ConnectOutcome, BayanError> {
            self.connected = true;
            Ok(ConnectOutcome::Connected)
        }

        fn write(&mut self, payload: &[u8]) -> Result<(), BayanError> {
            self.written.extend_from_slice(payload);
            Ok(())
        }

        fn disconnect(&mut self) -> Result<(), BayanError> {
            self.connected = false;
            Ok(())
        }
    }

    fn provider() -> MemoryInvoiceProvider {
        let record = InvoiceRecord {
            uid: "inv-1".to_string(),
            invoice_number: "INV-1001".to_string(),
            total_amount: dec!(100.00),
            total_discount: dec!(5.00),
            total_tax: dec!(5.00),
            net_amount: dec!(100.00),
            ..Default::default()
        };
        let broken = InvoiceRecord {
            uid: "inv-2".to_string(),
            invoice_number: "INV-1002".to_string(),
            total_amount: dec!(100.00),
            net_amount: dec!(90.00),
            ..Default::default()
        };
        [record, broken]
            .into_iter()
            .map(|r| InvoiceDetails::new(r, None, None, vec![]))
            .collect()
    }

    fn compiler() -> LayoutCompiler<'static> {
        LayoutCompiler::new(
            Template::zq520(),
            ArabicPolicy::NativeFont {
                font_path: NATIVE_FONT_PATH,
            },
        )
    }

    #[test]
    fn test_dry_run_reports_size() {
        let provider = provider();
        let compiler = compiler();
        let outcome = PrintJob::new(&provider, &compiler).dry_run("inv-1").unwrap();
        assert!(outcome.is_dry_run());
        assert_eq!(outcome.invoice_number, "INV-1001");
        assert!(outcome.size() > 0);
        assert!(outcome.zpl.starts_with("^XA"));
    }

    #[test]
    fn test_unknown_invoice_is_not_found() {
        let provider = provider();
        let compiler = compiler();
        let err = PrintJob::new(&provider, &compiler).dry_run("missing").unwrap_err();
        assert!(matches!(err, BayanError::DataNotFound(_)));
    }

    #[test]
    fn test_print_without_connection_is_dry_run() {
        let provider = provider();
        let compiler = compiler();
        let mut session = PrinterSession::new(RecordingLink::default());
        let outcome = PrintJob::new(&provider, &compiler)
            .print("inv-1", &mut session)
            .unwrap();
        assert!(outcome.is_dry_run());
        assert!(session.link().written.is_empty());
    }

    #[test]
    fn test_print_writes_document() {
        let provider = provider();
        let compiler = compiler();
        let mut session = PrinterSession::new(RecordingLink::default());
        session.connect().unwrap();

        let outcome = PrintJob::new(&provider, &compiler)
            .print("inv-1", &mut session)
            .unwrap();
        assert_eq!(
            outcome.delivery,
            Delivery::Printed {
                device: "AC:3F:A4:00:11:22".to_string(),
                bytes: outcome.size(),
            }
        );
        assert_eq!(session.link().written, outcome.zpl.as_bytes());
    }

    #[test]
    fn test_strict_mode_rejects_inconsistent_totals() {
        let provider = provider();
        let compiler = compiler();
        let job = PrintJob::new(&provider, &compiler);
        assert!(job.dry_run("inv-2").is_ok());

        let err = job.strict(true).dry_run("inv-2").unwrap_err();
        assert!(matches!(err, BayanError::Data(_)));
    }
}
