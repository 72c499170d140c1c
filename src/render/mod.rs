//! # Rendering Module
//!
//! This module turns captured images into printable monochrome bitmaps.
//!
//! ## Modules
//!
//! - [`png`]: PNG container parsing, inflate and unfiltering to RGBA
//! - [`bitmap`]: Resampling, thresholding, packing and graphic fields
//! - [`surface`]: The capture boundary and the TrueType fragment renderer
//!
//! ## Usage Example
//!
//! ```
//! use bayan::render::bitmap;
//!
//! // A capture that failed to produce a valid image still yields a
//! // positioned graphic field of the requested size.
//! let cmd = bitmap::graphic_field_command(b"not a png", 420, 345, 16, 4);
//! assert!(cmd.starts_with("^FO420,345^GFA,8,8,2,"));
//! assert!(cmd.ends_with("^FS"));
//! ```

pub mod bitmap;
pub mod png;
pub mod surface;
