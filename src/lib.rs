//! # Bayan - Bilingual Invoice Labels for Zebra Printers
//!
//! Bayan prints English/Arabic commercial invoices on Zebra mobile label
//! printers over Bluetooth. It provides:
//!
//! - **Layout compiler**: invoice → ZPL label at exact dot coordinates
//! - **Bitmap codec**: PNG → thresholded 1-bit `^GFA` graphic fields
//! - **Arabic rendering**: rasterized right-to-left fragments, or a
//!   printer-resident font where one is available
//! - **Transport**: Bluetooth RFCOMM session with connector fallback
//!
//! ## Quick Start
//!
//! ```no_run
//! use bayan::{
//!     invoice::{InvoiceProvider, JsonInvoiceProvider},
//!     layout::{ArabicPolicy, LayoutCompiler, Template},
//!     render::surface::TtfSurface,
//!     transport::{BluetoothLink, PrinterSession},
//! };
//!
//! // Invoice snapshot
//! let provider = JsonInvoiceProvider::new("invoices/");
//! let details = provider.require("INV-1001")?;
//!
//! // Arabic fragments are rendered with a local TrueType font
//! let surface = TtfSurface::from_file("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf")?;
//! let compiler = LayoutCompiler::new(Template::zq520(), ArabicPolicy::Raster(&surface));
//! let zpl = compiler.to_zpl(&details)?;
//!
//! // Send to printer
//! let mut session = PrinterSession::new(BluetoothLink::new("AC:3F:A4:00:11:22")?);
//! session.connect()?;
//! session.write(&zpl)?;
//! session.disconnect()?;
//!
//! # Ok::<(), bayan::error::BayanError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`invoice`] | Invoice data model and providers |
//! | [`layout`] | Template and bilingual layout compiler |
//! | [`ir`] | Label program, ZPL codegen and validation |
//! | [`protocol`] | ZPL command builders |
//! | [`render`] | PNG decoding, bitmap codec, fragment surfaces |
//! | [`transport`] | Printer links, discovery and sessions |
//! | [`job`] | One print request end to end |
//! | [`printer`] | Printer configurations |
//! | [`error`] | Error types |
//!
//! ## Supported Printers
//!
//! Currently tested with:
//! - Zebra ZQ520 (4" media, 203 DPI, Bluetooth), at 812 or 832 dots
//!
//! Other ZPL printers should work with a custom [`layout::Template`].

pub mod error;
pub mod invoice;
pub mod ir;
pub mod job;
pub mod layout;
pub mod printer;
pub mod protocol;
pub mod render;
pub mod transport;

// Re-exports for convenience
pub use error::BayanError;
pub use layout::{LayoutCompiler, Template};
pub use printer::PrinterConfig;
pub use transport::{BluetoothLink, PrinterSession};
