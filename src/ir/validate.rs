//! # Label Validation
//!
//! Structural checks over generated ZPL text:
//!
//! - exactly one `^XA` (first command) and one `^XZ` (last command)
//! - every field opened with `^FO` is closed with `^FS` before the next
//!   field or the end of the label
//! - field content (`^FD`, `^GF`, `^GB`, `^FB`, `^PA`, `^A`, `^FH`) only
//!   appears inside an open field
//!
//! The layout compiler runs this over every document it produces.

use crate::error::BayanError;

/// Counts gathered while validating a label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabelStats {
    pub fields: usize,
    pub text_fields: usize,
    pub graphic_fields: usize,
    pub boxes: usize,
}

/// Field-level commands that are only valid between `^FO` and `^FS`.
const FIELD_COMMANDS: &[&str] = &["FD", "GF", "GB", "FB", "PA", "FH"];

/// Validate the structure of a ZPL document.
pub fn validate(zpl: &str) -> Result<LabelStats, BayanError> {
    let commands: Vec<&str> = zpl
        .split('^')
        .skip(1)
        .map(|c| c.trim_end_matches(['\n', '\r']))
        .collect();

    let fail = |msg: String| Err(BayanError::LayoutInvariant(msg));

    let starts = commands.iter().filter(|c| c.starts_with("XA")).count();
    let ends = commands.iter().filter(|c| c.starts_with("XZ")).count();
    if starts != 1 || ends != 1 {
        return fail(format!(
            "expected one ^XA/^XZ pair, found {} start and {} end markers",
            starts, ends
        ));
    }
    if !commands.first().is_some_and(|c| c.starts_with("XA")) {
        return fail("label does not begin with ^XA".to_string());
    }
    if !commands.last().is_some_and(|c| c.starts_with("XZ")) {
        return fail("label does not end with ^XZ".to_string());
    }

    let mut stats = LabelStats::default();
    let mut open: Option<usize> = None;

    for (i, cmd) in commands.iter().enumerate() {
        let is_font = cmd.len() >= 2 && cmd.starts_with('A') && cmd[1..].starts_with(|c: char| c.is_ascii_alphanumeric());
        let is_field_cmd = FIELD_COMMANDS.iter().any(|f| cmd.starts_with(f)) || is_font;

        if cmd.starts_with("FO") {
            if let Some(at) = open {
                return fail(format!("field opened at command {} is not terminated", at));
            }
            open = Some(i);
            stats.fields += 1;
        } else if cmd.starts_with("FS") {
            if open.take().is_none() {
                return fail(format!("^FS without open field at command {}", i));
            }
        } else if is_field_cmd {
            if open.is_none() {
                return fail(format!("^{} outside of a field", &cmd[..2.min(cmd.len())]));
            }
            if cmd.starts_with("FD") {
                stats.text_fields += 1;
            } else if cmd.starts_with("GF") {
                stats.graphic_fields += 1;
            } else if cmd.starts_with("GB") {
                stats.boxes += 1;
            }
        } else if cmd.starts_with("XZ") {
            if let Some(at) = open {
                return fail(format!("field opened at command {} is not terminated", at));
            }
        }
    }

    Ok(stats)
}
