//! Error types for code generation.
//!
//! These are internal errors: user-facing data type problems have been
//! reported by the analysis passes before emission starts, so a failure
//! here means the tree or its annotations are not in the shape the
//! emitter was promised.

use std::fmt;

/// Errors that can occur during code generation.
#[derive(Debug)]
pub enum CodegenError {
    /// A variable was referenced but not declared in the POU scope.
    UndeclaredVariable(String),
    /// A call site was never resolved to a callee declaration.
    UnresolvedCall(String),
    /// The type needed to pick a union member or cast is unknown.
    MissingType(String),
    /// An operator's precondition on the accumulator type is violated.
    AccumulatorTypeMismatch(String),
    /// An unsupported AST construct was encountered.
    Unsupported(String),
}

impl fmt::Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodegenError::UndeclaredVariable(name) => {
                write!(f, "undeclared variable: {name}")
            }
            CodegenError::UnresolvedCall(name) => {
                write!(f, "unresolved call: {name}")
            }
            CodegenError::MissingType(context) => {
                write!(f, "missing type: {context}")
            }
            CodegenError::AccumulatorTypeMismatch(context) => {
                write!(f, "accumulator type mismatch: {context}")
            }
            CodegenError::Unsupported(msg) => {
                write!(f, "unsupported: {msg}")
            }
        }
    }
}

impl std::error::Error for CodegenError {}
