//! Bundles the environments gathered from a library that later passes
//! consume.
use oxplc_dsl::common::Library;

use crate::function_environment::{FunctionBlockEnvironment, FunctionEnvironment};

/// The callable declarations of a library, indexed for lookup by the
/// analysis and code generation passes.
#[derive(Debug, Default)]
pub struct SemanticContext {
    pub functions: FunctionEnvironment,
    pub function_blocks: FunctionBlockEnvironment,
}

impl SemanticContext {
    pub fn new(functions: FunctionEnvironment, function_blocks: FunctionBlockEnvironment) -> Self {
        Self {
            functions,
            function_blocks,
        }
    }

    pub fn from_library(library: &Library) -> Self {
        Self {
            functions: FunctionEnvironment::from_library(library),
            function_blocks: FunctionBlockEnvironment::from_library(library),
        }
    }
}
