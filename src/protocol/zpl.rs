//! # ZPL Label Commands
//!
//! ZPL is a textual protocol: every command is a caret (`^`) followed by a
//! two-letter mnemonic and comma-separated parameters.
//!
//! ## Label Structure
//!
//! ```text
//! ^XA                      start of label
//! ^MMT ^LS0 ^PW812 ^LL1300 ^CI28     label setup
//! ^FO15,15 ^A0N,16,16 ^FDtext ^FS    one field: origin, font, data, separator
//! ^FO15,60 ^GB782,2,2 ^FS            one box/rule field
//! ^FO420,345 ^GFA,t,t,r,HEX ^FS      one graphic field
//! ^XZ                      end of label
//! ```
//!
//! Coordinates are in dots (203 DPI on the ZQ520: ~8 dots/mm), measured
//! from the top-left corner of the label.

use std::fmt::Write;

/// Start of label (`^XA`).
pub const START_LABEL: &str = "^XA";

/// End of label (`^XZ`).
pub const END_LABEL: &str = "^XZ";

/// Field separator (`^FS`). Closes every field opened with `^FO`.
pub const FIELD_SEPARATOR: &str = "^FS";

/// Tear-off print mode (`^MMT`).
pub const TEAR_OFF: &str = "^MMT";

/// Right-to-left field parameter (`^PA0,1,1,1`).
///
/// Enables bidirectional text layout and character shaping for the next
/// field when the selected font supports it.
pub const RIGHT_TO_LEFT: &str = "^PA0,1,1,1";

/// Escape character used with `^FH` inside field data.
pub const HEX_INDICATOR: char = '_';

/// Text encoding selected with `^CI`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// `^CI28`: Unicode UTF-8.
    #[default]
    Utf8,
    /// `^CI27`: Code page 1252.
    Latin1,
}

impl Encoding {
    /// `^CI` parameter value.
    pub fn code(self) -> u8 {
        match self {
            Encoding::Utf8 => 28,
            Encoding::Latin1 => 27,
        }
    }
}

/// Justification inside a field block (`^FB`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Justify {
    #[default]
    Left,
    Center,
    Right,
    Full,
}

impl Justify {
    fn code(self) -> char {
        match self {
            Justify::Left => 'L',
            Justify::Center => 'C',
            Justify::Right => 'R',
            Justify::Full => 'J',
        }
    }
}

/// Label home shift (`^LSn`).
pub fn label_shift(dots: i32) -> String {
    format!("^LS{}", dots)
}

/// Print width (`^PWn`).
pub fn print_width(dots: u32) -> String {
    format!("^PW{}", dots)
}

/// Label length (`^LLn`).
pub fn label_length(dots: u32) -> String {
    format!("^LL{}", dots)
}

/// Character set (`^CIn`).
pub fn encoding(encoding: Encoding) -> String {
    format!("^CI{}", encoding.code())
}

/// Font identifier alias (`^CWa,path`).
///
/// Maps a one-letter font name to a font file stored on the printer,
/// e.g. `^CWZ,E:TT0003M_.TTF`.
pub fn font_alias(alias: char, path: &str) -> String {
    format!("^CW{},{}", alias, path)
}

/// Field origin (`^FOx,y`).
pub fn field_origin(x: u32, y: u32) -> String {
    format!("^FO{},{}", x, y)
}

/// Scalable font 0, normal orientation (`^A0N,h,w`).
pub fn scalable_font(height: u32, width: u32) -> String {
    format!("^A0N,{},{}", height, width)
}

/// Aliased font, normal orientation (`^AaN,h`).
pub fn aliased_font(alias: char, height: u32) -> String {
    format!("^A{}N,{}", alias, height)
}

/// Field block (`^FBw,lines,spacing,j`).
///
/// Wraps the next field's data into a block `width` dots wide so it can be
/// right-aligned or centered.
pub fn field_block(width: u32, max_lines: u32, line_spacing: i32, justify: Justify) -> String {
    format!(
        "^FB{},{},{},{}",
        width,
        max_lines,
        line_spacing,
        justify.code()
    )
}

/// Graphic box (`^GBw,h,t`). With a height equal to the thickness this
/// draws a horizontal rule.
pub fn graphic_box(width: u32, height: u32, thickness: u32) -> String {
    format!("^GB{},{},{}", width, height, thickness)
}

/// Whether field data must be hex-escaped to survive the command parser.
pub fn needs_escape(data: &str) -> bool {
    data.contains(['^', '~'])
}

/// Field data (`^FD...`).
///
/// Data containing the command prefixes `^` or `~` is emitted as
/// `^FH^FD...` with those characters (and the `_` indicator itself)
/// written as `_XX` hex escapes. Other data passes through unchanged.
pub fn field_data(data: &str) -> String {
    if !needs_escape(data) {
        return format!("^FD{}", data);
    }

    let mut out = String::with_capacity(data.len() + 16);
    out.push_str("^FH^FD");
    for ch in data.chars() {
        match ch {
            '^' | '~' | HEX_INDICATOR => {
                let _ = write!(out, "{}{:02X}", HEX_INDICATOR, ch as u32);
            }
            _ => out.push(ch),
        }
    }
    out
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_commands() {
        assert_eq!(print_width(812), "^PW812");
        assert_eq!(label_length(1300), "^LL1300");
        assert_eq!(label_shift(0), "^LS0");
        assert_eq!(encoding(Encoding::Utf8), "^CI28");
        assert_eq!(encoding(Encoding::Latin1), "^CI27");
    }

    #[test]
    fn test_field_commands() {
        assert_eq!(field_origin(15, 110), "^FO15,110");
        assert_eq!(scalable_font(17, 17), "^A0N,17,17");
        assert_eq!(aliased_font('Z', 30), "^AZN,30");
        assert_eq!(field_block(320, 1, 0, Justify::Right), "^FB320,1,0,R");
        assert_eq!(field_block(812, 1, 0, Justify::Center), "^FB812,1,0,C");
        assert_eq!(graphic_box(782, 2, 2), "^GB782,2,2");
        assert_eq!(font_alias('Z', "E:TT0003M_.TTF"), "^CWZ,E:TT0003M_.TTF");
    }

    #[test]
    fn test_plain_field_data() {
        assert_eq!(field_data("INVOICE"), "^FDINVOICE");
        assert_eq!(
            field_data("CUSTOMER SIGNATURE____"),
            "^FDCUSTOMER SIGNATURE____"
        );
    }

    #[test]
    fn test_escaped_field_data() {
        assert!(needs_escape("A^B"));
        assert_eq!(field_data("A^B~C_D"), "^FH^FDA_5EB_7EC_5FD");
    }

    #[test]
    fn test_arabic_data_passes_through() {
        assert_eq!(field_data("المبيعات"), "^FDالمبيعات");
    }
}
