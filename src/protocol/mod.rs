//! # ZPL Protocol Implementation
//!
//! This module provides low-level command builders for the ZPL II label
//! language used by Zebra mobile printers (ZQ520 and relatives).
//!
//! ## Module Structure
//!
//! - [`zpl`]: Label framing, field positioning, fonts, text and boxes
//! - [`graphics`]: Graphic fields (`^GFA`) carrying packed monochrome bitmaps
//!
//! ## Usage Example
//!
//! ```
//! use bayan::protocol::{graphics, zpl};
//!
//! let mut label = String::new();
//! label.push_str(zpl::START_LABEL);
//! label.push_str(&zpl::print_width(812));
//! label.push_str(&zpl::field_origin(15, 15));
//! label.push_str(&zpl::scalable_font(20, 20));
//! label.push_str(&zpl::field_data("HELLO"));
//! label.push_str(zpl::FIELD_SEPARATOR);
//! label.push_str(&zpl::field_origin(15, 60));
//! label.push_str(&graphics::graphic_field(1, &[0xF0]));
//! label.push_str(zpl::FIELD_SEPARATOR);
//! label.push_str(zpl::END_LABEL);
//!
//! assert!(label.starts_with("^XA"));
//! assert!(label.contains("^GFA,1,1,1,F0^FS"));
//! ```
//!
//! ## Protocol Reference
//!
//! Based on the "ZPL II Programming Guide" by Zebra Technologies.

pub mod graphics;
pub mod zpl;
