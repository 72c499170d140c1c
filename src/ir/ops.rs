//! # IR Opcodes
//!
//! Each opcode is one self-contained ZPL construct. Fields (text, boxes,
//! graphics) carry their own origin, so the program can be inspected or
//! reordered without tracking printer state.

use crate::protocol::zpl::{Encoding, Justify};
use crate::render::bitmap::MonoBitmap;

/// Font selection for a text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontSpec {
    /// Built-in scalable font 0 (`^A0N,h,w`).
    Scalable { height: u32, width: u32 },
    /// Font addressed through a `^CW` alias (`^AaN,h`).
    Alias { alias: char, height: u32 },
}

impl FontSpec {
    /// Scalable font with equal height and width.
    pub fn scalable(size: u32) -> Self {
        Self::Scalable {
            height: size,
            width: size,
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Self::Scalable { height, .. } | Self::Alias { height, .. } => *height,
        }
    }
}

/// Field block (`^FB`) wrapping a text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldBlock {
    pub width: u32,
    pub max_lines: u32,
    pub line_spacing: i32,
    pub justify: Justify,
}

impl FieldBlock {
    /// Single-line block of the given width.
    pub fn single_line(width: u32, justify: Justify) -> Self {
        Self {
            width,
            max_lines: 1,
            line_spacing: 0,
            justify,
        }
    }
}

/// A positioned native text field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextField {
    pub x: u32,
    pub y: u32,
    pub font: FontSpec,
    pub block: Option<FieldBlock>,
    /// Emit `^PA0,1,1,1` (bidirectional layout) before the font.
    pub right_to_left: bool,
    pub content: String,
}

impl TextField {
    /// Left-aligned field with no block.
    pub fn new(x: u32, y: u32, font: FontSpec, content: impl Into<String>) -> Self {
        Self {
            x,
            y,
            font,
            block: None,
            right_to_left: false,
            content: content.into(),
        }
    }

    /// Right-align inside a block `width` dots wide.
    pub fn right(mut self, width: u32) -> Self {
        self.block = Some(FieldBlock::single_line(width, Justify::Right));
        self
    }

    /// Center inside a block `width` dots wide.
    pub fn center(mut self, width: u32) -> Self {
        self.block = Some(FieldBlock::single_line(width, Justify::Center));
        self
    }

    pub fn right_to_left(mut self) -> Self {
        self.right_to_left = true;
        self
    }
}

/// IR opcodes - the "bytecode" for label printing.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    // ========== Label Framing ==========
    /// Start of label (`^XA`).
    StartLabel,

    /// End of label (`^XZ`).
    EndLabel,

    // ========== Label Setup ==========
    /// Tear-off media mode (`^MMT`).
    TearOff,

    /// Label home shift in dots (`^LS`).
    LabelShift(i32),

    /// Print width in dots (`^PW`).
    PrintWidth(u32),

    /// Label length in dots (`^LL`).
    LabelLength(u32),

    /// Character set (`^CI`).
    Encoding(Encoding),

    /// Font alias (`^CW`).
    FontAlias { alias: char, path: String },

    // ========== Fields ==========
    /// Native text field.
    Text(TextField),

    /// Box or rule (`^GB`). A rule is a box whose height equals its thickness.
    Box {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        thickness: u32,
    },

    /// Graphic field carrying a packed bitmap (`^GFA`).
    Graphic { x: u32, y: u32, bitmap: MonoBitmap },
}

/// A compiled label program.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub ops: Vec<Op>,
}

impl Program {
    /// Create an empty program.
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Add an op to the program.
    pub fn push(&mut self, op: Op) {
        self.ops.push(op);
    }

    /// Add multiple ops to the program.
    pub fn extend(&mut self, ops: impl IntoIterator<Item = Op>) {
        self.ops.extend(ops);
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Op> {
        self.ops.iter()
    }

    /// Declared label length, if the program sets one.
    pub fn label_length(&self) -> Option<u32> {
        self.ops.iter().find_map(|op| match op {
            Op::LabelLength(dots) => Some(*dots),
            _ => None,
        })
    }

    /// Text content of every native text field, in order.
    pub fn texts(&self) -> impl Iterator<Item = &TextField> {
        self.ops.iter().filter_map(|op| match op {
            Op::Text(field) => Some(field),
            _ => None,
        })
    }
}

impl FromIterator<Op> for Program {
    fn from_iter<T: IntoIterator<Item = Op>>(iter: T) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Program {
    type Item = Op;
    type IntoIter = std::vec::IntoIter<Op>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Op;
    type IntoIter = std::slice::Iter<'a, Op>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}
