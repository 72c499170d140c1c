//! # Intermediate Representation (IR)
//!
//! This module provides the IR layer for label printing. The IR is a
//! "bytecode" representation that sits between the layout compiler and
//! the ZPL text sent to the printer.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────┐     ┌───────────┐
//! │   Layout    │ ──► │     IR      │ ──► │ Codegen  │ ──► │ Validate  │
//! │  compiler   │     │  (Vec<Op>)  │     │  (ZPL)   │     │ (markers) │
//! └─────────────┘     └─────────────┘     └──────────┘     └───────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use bayan::ir::{FontSpec, Op, Program, TextField};
//!
//! let mut program = Program::new();
//! program.push(Op::StartLabel);
//! program.push(Op::PrintWidth(812));
//! program.push(Op::Text(TextField::new(15, 15, FontSpec::scalable(20), "HELLO")));
//! program.push(Op::EndLabel);
//!
//! let zpl = program.to_zpl();
//! assert!(bayan::ir::validate(&zpl).is_ok());
//! ```

mod codegen;
mod ops;
mod validate;

pub use ops::*;
pub use validate::{LabelStats, validate};
