//! Bilingual fragment tagging.
//!
//! Every piece of label text is tagged [`Script::Latin`] or
//! [`Script::Arabic`]. Latin fragments print with the native font; Arabic
//! fragments go through the Arabic rendering policy of the compiler, and a
//! rasterized fragment is requested in its script's [`Direction`].

use crate::render::surface::Direction;

/// Script of a text fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Latin,
    Arabic,
}

impl Script {
    /// Tag `text`. A single Arabic code point makes the whole fragment Arabic.
    pub fn detect(text: &str) -> Self {
        if text.chars().any(is_arabic) {
            Self::Arabic
        } else {
            Self::Latin
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            Self::Latin => Direction::LeftToRight,
            Self::Arabic => Direction::RightToLeft,
        }
    }
}

/// Arabic, Arabic Supplement, Extended-A and both presentation-form blocks.
pub fn is_arabic(ch: char) -> bool {
    matches!(
        ch,
        '\u{0600}'..='\u{06FF}'
            | '\u{0750}'..='\u{077F}'
            | '\u{08A0}'..='\u{08FF}'
            | '\u{FB50}'..='\u{FDFF}'
            | '\u{FE70}'..='\u{FEFF}'
    )
}

/// A tagged piece of label text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment<'a> {
    pub text: &'a str,
    pub script: Script,
}

impl<'a> Fragment<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            script: Script::detect(text),
        }
    }
}
