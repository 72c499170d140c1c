//! # Code Generation
//!
//! Converts IR programs to ZPL text. Every op is written on its own line.

use super::ops::{FontSpec, Op, Program, TextField};
use crate::protocol::zpl;

impl Program {
    /// Compile the IR program to a ZPL document.
    pub fn to_zpl(&self) -> String {
        let mut out = String::new();

        for op in &self.ops {
            match op {
                Op::StartLabel => out.push_str(zpl::START_LABEL),
                Op::EndLabel => out.push_str(zpl::END_LABEL),
                Op::TearOff => out.push_str(zpl::TEAR_OFF),
                Op::LabelShift(dots) => out.push_str(&zpl::label_shift(*dots)),
                Op::PrintWidth(dots) => out.push_str(&zpl::print_width(*dots)),
                Op::LabelLength(dots) => out.push_str(&zpl::label_length(*dots)),
                Op::Encoding(encoding) => out.push_str(&zpl::encoding(*encoding)),
                Op::FontAlias { alias, path } => out.push_str(&zpl::font_alias(*alias, path)),
                Op::Text(field) => write_text(&mut out, field),
                Op::Box {
                    x,
                    y,
                    width,
                    height,
                    thickness,
                } => {
                    out.push_str(&zpl::field_origin(*x, *y));
                    out.push_str(&zpl::graphic_box(*width, *height, *thickness));
                    out.push_str(zpl::FIELD_SEPARATOR);
                }
                Op::Graphic { x, y, bitmap } => out.push_str(&bitmap.to_zpl(*x, *y)),
            }
            out.push('\n');
        }

        out
    }

    /// Compile to bytes ready for the transport (UTF-8).
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_zpl().into_bytes()
    }
}

fn write_text(out: &mut String, field: &TextField) {
    out.push_str(&zpl::field_origin(field.x, field.y));
    if field.right_to_left {
        out.push_str(zpl::RIGHT_TO_LEFT);
    }
    match field.font {
        FontSpec::Scalable { height, width } => out.push_str(&zpl::scalable_font(height, width)),
        FontSpec::Alias { alias, height } => out.push_str(&zpl::aliased_font(alias, height)),
    }
    if let Some(block) = field.block {
        out.push_str(&zpl::field_block(
            block.width,
            block.max_lines,
            block.line_spacing,
            block.justify,
        ));
    }
    out.push_str(&zpl::field_data(&field.content));
    out.push_str(zpl::FIELD_SEPARATOR);
}
