// Allow large errors because this is a compiler - we expect large errors.
#![allow(clippy::result_large_err)]

//! Semantic analysis (stage 3) for IEC 61131-3 libraries: constant
//! folding with intraprocedural constant propagation, and data type
//! error reporting over the annotations produced by candidate data type
//! inference and narrowing.

pub mod constant_folding;
pub mod function_environment;
pub mod reporter;
mod result;
pub mod rule_datatype_errors;
pub mod scope;
pub mod semantic_context;
pub mod stages;
pub mod type_environment;

#[cfg(test)]
mod test_helpers;

// Re-export public types for external use
pub use function_environment::{FunctionBlockEnvironment, FunctionEnvironment};
pub use scope::{ScopeEnvironment, VariableClass};
pub use semantic_context::SemanticContext;
