//! # Invoice Data Providers
//!
//! The core never talks to a database. It asks an [`InvoiceProvider`] for
//! a complete [`InvoiceDetails`] snapshot by invoice identifier.
//!
//! "Not found" is a normal answer (`Ok(None)`), distinct from a query
//! failure (`Err`). [`InvoiceProvider::require`] turns the former into
//! [`BayanError::DataNotFound`] for callers that need a record.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::InvoiceDetails;
use crate::error::BayanError;

/// Query interface for invoice snapshots.
pub trait InvoiceProvider {
    /// Fetch an invoice with its store, organization and ordered lines.
    fn invoice_details(&self, uid: &str) -> Result<Option<InvoiceDetails>, BayanError>;

    /// Fetch an invoice, treating a missing record as [`BayanError::DataNotFound`].
    fn require(&self, uid: &str) -> Result<InvoiceDetails, BayanError> {
        self.invoice_details(uid)?
            .ok_or_else(|| BayanError::DataNotFound(uid.to_string()))
    }
}

/// In-memory provider, keyed by invoice uid.
#[derive(Debug, Clone, Default)]
pub struct MemoryInvoiceProvider {
    invoices: BTreeMap<String, InvoiceDetails>,
}

impl MemoryInvoiceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an invoice.
    pub fn insert(&mut self, details: InvoiceDetails) {
        self.invoices
            .insert(details.invoice.uid.clone(), details.normalized());
    }

    pub fn len(&self) -> usize {
        self.invoices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invoices.is_empty()
    }
}

impl FromIterator<InvoiceDetails> for MemoryInvoiceProvider {
    fn from_iter<T: IntoIterator<Item = InvoiceDetails>>(iter: T) -> Self {
        let mut provider = Self::new();
        for details in iter {
            provider.insert(details);
        }
        provider
    }
}

impl InvoiceProvider for MemoryInvoiceProvider {
    fn invoice_details(&self, uid: &str) -> Result<Option<InvoiceDetails>, BayanError> {
        Ok(self.invoices.get(uid).cloned())
    }
}

/// JSON-backed provider.
///
/// The path is either:
/// - a directory holding one `<uid>.json` file per invoice, or
/// - a single file holding one invoice object or an array of them.
#[derive(Debug, Clone)]
pub struct JsonInvoiceProvider {
    path: PathBuf,
}

impl JsonInvoiceProvider {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn from_directory(&self, uid: &str) -> Result<Option<InvoiceDetails>, BayanError> {
        if uid.is_empty() || uid.contains(['/', '\\']) || uid.contains("..") {
            return Err(BayanError::Data(format!("invalid invoice id '{}'", uid)));
        }

        let file = self.path.join(format!("{}.json", uid));
        if !file.exists() {
            return Ok(None);
        }

        debug!(path = %file.display(), "reading invoice file");
        let contents = fs::read_to_string(&file)?;
        let details: InvoiceDetails = serde_json::from_str(&contents)?;
        Ok(Some(details.normalized()))
    }

    fn from_file(&self, uid: &str) -> Result<Option<InvoiceDetails>, BayanError> {
        debug!(path = %self.path.display(), "reading invoice collection");
        let contents = fs::read_to_string(&self.path)?;
        let value: serde_json::Value = serde_json::from_str(&contents)?;

        let candidates: Vec<InvoiceDetails> = match value {
            serde_json::Value::Array(_) => serde_json::from_value(value)?,
            _ => vec![serde_json::from_value(value)?],
        };

        Ok(candidates
            .into_iter()
            .find(|details| details.invoice.uid == uid)
            .map(InvoiceDetails::normalized))
    }
}

impl InvoiceProvider for JsonInvoiceProvider {
    fn invoice_details(&self, uid: &str) -> Result<Option<InvoiceDetails>, BayanError> {
        if self.path.is_dir() {
            self.from_directory(uid)
        } else if self.path.is_file() {
            self.from_file(uid)
        } else {
            Err(BayanError::Data(format!(
                "invoice source {} does not exist",
                self.path.display()
            )))
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::{InvoiceLine, InvoiceRecord};

    fn details(uid: &str) -> InvoiceDetails {
        InvoiceDetails::new(
            InvoiceRecord {
                uid: uid.to_string(),
                invoice_number: format!("INV-{}", uid),
                ..Default::default()
            },
            None,
            None,
            vec![InvoiceLine {
                line_number: 1,
                ..Default::default()
            }],
        )
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("bayan-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_memory_found_and_missing() {
        let provider: MemoryInvoiceProvider = vec![details("a"), details("b")].into_iter().collect();
        assert_eq!(provider.len(), 2);
        assert!(provider.invoice_details("a").unwrap().is_some());
        assert!(provider.invoice_details("zzz").unwrap().is_none());
    }

    #[test]
    fn test_require_maps_missing_to_not_found() {
        let provider = MemoryInvoiceProvider::new();
        let err = provider.require("nope").unwrap_err();
        assert!(matches!(err, BayanError::DataNotFound(ref id) if id == "nope"));
    }

    #[test]
    fn test_json_directory_provider() {
        let dir = scratch_dir("dir");
        fs::write(
            dir.join("inv1.json"),
            serde_json::to_string(&details("inv1")).unwrap(),
        )
        .unwrap();

        let provider = JsonInvoiceProvider::new(&dir);
        let found = provider.invoice_details("inv1").unwrap().unwrap();
        assert_eq!(found.invoice.invoice_number, "INV-inv1");
        assert!(provider.invoice_details("inv2").unwrap().is_none());
        assert!(provider.invoice_details("../etc/passwd").is_err());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_json_array_file_provider() {
        let dir = scratch_dir("file");
        let file = dir.join("invoices.json");
        fs::write(
            &file,
            serde_json::to_string(&vec![details("x"), details("y")]).unwrap(),
        )
        .unwrap();

        let provider = JsonInvoiceProvider::new(&file);
        assert_eq!(
            provider.require("y").unwrap().invoice.invoice_number,
            "INV-y"
        );
        assert!(matches!(
            provider.require("q"),
            Err(BayanError::DataNotFound(_))
        ));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_json_missing_source_is_query_failure() {
        let provider = JsonInvoiceProvider::new("/nonexistent/bayan/invoices");
        assert!(matches!(
            provider.invoice_details("a"),
            Err(BayanError::Data(_))
        ));
    }
}
