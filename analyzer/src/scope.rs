//! Lookup of variable instances declared within the scope of one
//! program organization unit.
//!
//! The passes that follow candidate type inference need to know, for an
//! operand, which declaration it refers to, how the variable is stored
//! (a plain local, an external, or a located variable) and what type the
//! accessed element has. The scope environment is built once per POU
//! body and answers those questions.
use std::collections::HashMap;

use oxplc_dsl::common::{
    ArraySpec, FunctionBlockDeclaration, FunctionDeclaration, ProgramDeclaration, TypeName,
    VarDecl, VariableType,
};
use oxplc_dsl::core::Id;
use oxplc_dsl::textual::Variable;

use crate::function_environment::FunctionBlockEnvironment;

/// How a variable is stored, which decides the accessor macros used in
/// generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableClass {
    Local,
    External,
    Located,
}

#[derive(Debug, Clone)]
pub struct VarInfo {
    pub class: VariableClass,
    pub var_type: VariableType,
    pub data_type: TypeName,
    pub array_spec: Option<ArraySpec>,
    pub location: Option<String>,
}

/// The variable instances visible in one POU body.
#[derive(Debug)]
pub struct ScopeEnvironment {
    pou_name: Id,
    vars: HashMap<Id, VarInfo>,
}

impl ScopeEnvironment {
    pub fn new(pou_name: &Id, variables: &[VarDecl]) -> Self {
        let mut vars = HashMap::new();
        for decl in variables {
            let class = if decl.location.is_some() {
                VariableClass::Located
            } else if decl.var_type == VariableType::External {
                VariableClass::External
            } else {
                VariableClass::Local
            };
            vars.insert(
                decl.identifier.clone(),
                VarInfo {
                    class,
                    var_type: decl.var_type,
                    data_type: decl.data_type.clone(),
                    array_spec: decl.array_spec.clone(),
                    location: decl.location.clone(),
                },
            );
        }
        Self {
            pou_name: pou_name.clone(),
            vars,
        }
    }

    pub fn for_function(decl: &FunctionDeclaration) -> Self {
        Self::new(&decl.name, &decl.variables)
    }

    pub fn for_function_block(decl: &FunctionBlockDeclaration) -> Self {
        Self::new(&decl.name, &decl.variables)
    }

    pub fn for_program(decl: &ProgramDeclaration) -> Self {
        Self::new(&decl.name, &decl.variables)
    }

    pub fn pou_name(&self) -> &Id {
        &self.pou_name
    }

    pub fn find(&self, name: &Id) -> Option<&VarInfo> {
        self.vars.get(name)
    }

    /// The storage class of the instance a reference accesses, derived
    /// from the declaration of its left-most name.
    pub fn variable_class(&self, variable: &Variable) -> Option<VariableClass> {
        if let Variable::Direct(_) = variable {
            return Some(VariableClass::Located);
        }
        variable
            .base_name()
            .and_then(|name| self.find(name))
            .map(|info| info.class)
    }

    /// If the named variable is an instance of a function block type,
    /// returns that type name.
    pub fn fb_type_name<'a>(
        &'a self,
        name: &Id,
        function_blocks: &FunctionBlockEnvironment,
    ) -> Option<&'a Id> {
        match self.find(name) {
            Some(VarInfo {
                data_type: TypeName::Derived(type_name),
                ..
            }) if function_blocks.find(type_name).is_some() => Some(type_name),
            _ => None,
        }
    }

    /// The declared type of the element a reference accesses: the
    /// declared type for a named variable, the element type for an array
    /// subscript, and the field's declared type for a member of a
    /// function block instance.
    pub fn instance_type(
        &self,
        variable: &Variable,
        function_blocks: &FunctionBlockEnvironment,
    ) -> Option<TypeName> {
        match variable {
            Variable::Named(named) => self.find(&named.name).map(|info| info.data_type.clone()),
            Variable::Array(array) => match array.variable.as_ref() {
                Variable::Named(named) => self
                    .find(&named.name)
                    .and_then(|info| info.array_spec.as_ref())
                    .map(|spec| spec.element.clone()),
                _ => None,
            },
            Variable::Structured(structured) => {
                let record_type = self.instance_type(structured.record.as_ref(), function_blocks)?;
                let TypeName::Derived(type_name) = record_type else {
                    return None;
                };
                let fb = function_blocks.find(&type_name)?;
                fb.variables
                    .iter()
                    .find(|decl| decl.identifier == structured.field)
                    .map(|decl| decl.data_type.clone())
            }
            Variable::Direct(_) => None,
        }
    }

    /// The array specification of the subscripted variable, needed to
    /// rebase subscripts onto zero in generated code.
    pub fn array_spec(&self, variable: &Variable) -> Option<&ArraySpec> {
        match variable {
            Variable::Named(named) => self.find(&named.name)?.array_spec.as_ref(),
            _ => None,
        }
    }
}
