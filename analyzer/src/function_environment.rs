//! Environments for callable declarations: functions (which may be
//! overloaded) and function block types.
use std::collections::HashMap;

use oxplc_dsl::common::{
    FunctionBlockDeclaration, FunctionDeclaration, Library, LibraryElementKind, VarDecl,
    VariableType,
};
use oxplc_dsl::core::Id;

/// Function name to declarations. A name maps to more than one
/// declaration when the function is overloaded.
#[derive(Debug, Default)]
pub struct FunctionEnvironment {
    table: HashMap<Id, Vec<FunctionDeclaration>>,
}

impl FunctionEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_library(library: &Library) -> Self {
        let mut env = Self::new();
        for element in &library.elements {
            if let LibraryElementKind::FunctionDeclaration(decl) = element {
                env.insert(decl.clone());
            }
        }
        env
    }

    pub fn insert(&mut self, decl: FunctionDeclaration) {
        self.table.entry(decl.name.clone()).or_default().push(decl);
    }

    /// All declarations registered under the name, in insertion order.
    pub fn overloads(&self, name: &Id) -> &[FunctionDeclaration] {
        self.table.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// How many declarations share the name. Greater than one means the
    /// function is overloaded, which affects the emitted symbol names.
    pub fn multiplicity(&self, name: &Id) -> usize {
        self.overloads(name).len()
    }

    pub fn find(&self, name: &Id, overload_index: usize) -> Option<&FunctionDeclaration> {
        self.overloads(name).get(overload_index)
    }
}

/// Function block type name to declaration.
#[derive(Debug, Default)]
pub struct FunctionBlockEnvironment {
    table: HashMap<Id, FunctionBlockDeclaration>,
}

impl FunctionBlockEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_library(library: &Library) -> Self {
        let mut env = Self::new();
        for element in &library.elements {
            if let LibraryElementKind::FunctionBlockDeclaration(decl) = element {
                env.insert(decl.clone());
            }
        }
        env
    }

    pub fn insert(&mut self, decl: FunctionBlockDeclaration) {
        self.table.insert(decl.name.clone(), decl);
    }

    pub fn find(&self, type_name: &Id) -> Option<&FunctionBlockDeclaration> {
        self.table.get(type_name)
    }
}

/// Iterates the parameters of a callable declaration in declaration
/// order: the input, output and in-out variables.
pub fn parameters(variables: &[VarDecl]) -> impl Iterator<Item = &VarDecl> {
    variables.iter().filter(|decl| {
        matches!(
            decl.var_type,
            VariableType::Input | VariableType::Output | VariableType::InOut
        )
    })
}

/// Finds a parameter by name among the parameters of a callable.
pub fn find_parameter<'a>(variables: &'a [VarDecl], name: &Id) -> Option<&'a VarDecl> {
    parameters(variables).find(|decl| &decl.identifier == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxplc_dsl::common::{PouBody, TypeName};
    use oxplc_dsl::core::NodeIdGen;
    use oxplc_dsl::textual::Statements;

    fn function(gen: &mut NodeIdGen, name: &str) -> FunctionDeclaration {
        FunctionDeclaration {
            id: gen.next(),
            name: Id::from(name),
            return_type: TypeName::Int,
            variables: vec![
                VarDecl::simple(gen.next(), "IN1", TypeName::Int)
                    .with_var_type(VariableType::Input),
                VarDecl::simple(gen.next(), "scratch", TypeName::Int),
            ],
            body: PouBody::Statements(Statements::default()),
        }
    }

    #[test]
    fn multiplicity_when_overloaded_then_counts_declarations() {
        let mut gen = NodeIdGen::new();
        let mut env = FunctionEnvironment::new();
        env.insert(function(&mut gen, "TRUNC"));
        env.insert(function(&mut gen, "TRUNC"));
        assert_eq!(env.multiplicity(&Id::from("trunc")), 2);
        assert_eq!(env.multiplicity(&Id::from("other")), 0);
    }

    #[test]
    fn parameters_when_mixed_variables_then_only_inputs_outputs() {
        let mut gen = NodeIdGen::new();
        let decl = function(&mut gen, "F");
        let names: Vec<String> = parameters(&decl.variables)
            .map(|p| p.identifier.original().clone())
            .collect();
        assert_eq!(names, vec!["IN1"]);
        assert!(find_parameter(&decl.variables, &Id::from("in1")).is_some());
        assert!(find_parameter(&decl.variables, &Id::from("scratch")).is_none());
    }
}
