#![allow(clippy::result_large_err)]
//! C code emission (stage 4) for oxplc.
//!
//! This crate lowers analyzed IEC 61131-3 instruction list bodies into
//! portable C. The generated code follows the runtime support header's
//! conventions: every IL body is a block declaring the accumulator
//! union (`IL_DEFVAR_T IL_DEFVAR`) together with the parenthesis result
//! carrier (`IL_DEFVAR_BACK`), variables are reached either as plain C
//! locals or through the `GET_VAR`/`SET_VAR` accessor macro family, and
//! `RET` lowers to a jump to the `END_LABEL` emitted at the block tail.
//!
//! # Example
//!
//! ```ignore
//! use oxplc_codegen::{lower_program, CodeWriter, OutputConfig};
//!
//! let mut writer = CodeWriter::new();
//! lower_program(&mut writer, &program, &context, &annotations, &OutputConfig::default())?;
//! print!("{}", writer.into_string());
//! ```

mod emit;
mod error;
mod il;

pub use emit::CodeWriter;
pub use error::CodegenError;
pub use il::{lower_function, lower_function_block, lower_program, OutputConfig};
