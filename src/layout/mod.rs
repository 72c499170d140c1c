//! # Label Layout
//!
//! Turns an [`InvoiceDetails`](crate::invoice::InvoiceDetails) into a label
//! program.
//!
//! ## Modules
//!
//! - [`template`]: dot coordinates, fonts and row advances per printer model
//! - [`fragment`]: Latin/Arabic tagging of text fragments
//! - [`format`]: money, sign, percentage and date rendering
//! - [`compiler`]: region traversal and the Arabic rendering policy

pub mod compiler;
pub mod format;
pub mod fragment;
pub mod template;

pub use compiler::{ArabicPolicy, LayoutCompiler, NATIVE_FONT_PATH, arabic_test_label};
pub use fragment::{Fragment, Script};
pub use template::Template;
