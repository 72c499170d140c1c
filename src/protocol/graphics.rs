//! # ZPL Graphic Fields
//!
//! Implements the ASCII-hex graphic field command used to embed packed
//! monochrome bitmaps in a label.
//!
//! ## Command Format
//!
//! ```text
//! ^GFA,b,c,d,data
//!
//! b    = total bytes of the bitmap
//! c    = graphic field count (equal to b for uncompressed ASCII data)
//! d    = bytes per row
//! data = 2 uppercase hex characters per byte, row-major, no separators
//! ```
//!
//! ## Bit Packing
//!
//! Each row is padded to a whole number of bytes. Within a byte the most
//! significant bit is the leftmost dot; a set bit prints black.
//!
//! ```text
//! Byte value 0xF0 = 11110000 = ████░░░░
//! Byte value 0x0F = 00001111 = ░░░░████
//! ```

/// Uppercase hex encoding of a packed bitmap.
pub fn hex_payload(data: &[u8]) -> String {
    hex::encode_upper(data)
}

/// # Graphic Field (`^GFA,b,c,d,data`)
///
/// Builds the graphic field command for `data`, which must hold
/// `bytes_per_row * height` bytes.
///
/// The command does not include a field origin or separator; callers wrap it
/// with `^FOx,y` and `^FS`.
///
/// ## Example
///
/// ```
/// use bayan::protocol::graphics;
///
/// // 12 dots wide, 2 rows: 2 bytes per row
/// let cmd = graphics::graphic_field(2, &[0xFF, 0xF0, 0x80, 0x10]);
/// assert_eq!(cmd, "^GFA,4,4,2,FFF08010");
/// ```
pub fn graphic_field(bytes_per_row: usize, data: &[u8]) -> String {
    debug_assert!(
        bytes_per_row == 0 || data.len() % bytes_per_row == 0,
        "Graphic data must be a whole number of rows. {} bytes, {} per row",
        data.len(),
        bytes_per_row
    );

    let total = data.len();
    format!(
        "^GFA,{},{},{},{}",
        total,
        total,
        bytes_per_row,
        hex_payload(data)
    )
}

// ============================================================================
// TESTS
// ============================================================================
