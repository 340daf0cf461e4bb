//! A set of traits and functions for visiting all nodes in a library.
//!
//! To use the visitor, define a struct and implement the Visitor trait
//! for the struct.
//!
//! Visitor trait functions call functions that implement walking through
//! the library. Selectively call these functions to selectively descend
//! into the library.
//!
//! # Example
//!
//! ```
//! use oxplc_dsl::common::FunctionDeclaration;
//! use oxplc_dsl::diagnostic::Diagnostic;
//! use oxplc_dsl::visitor::{ Visitor, visit_function_declaration };
//!
//! struct Dummy {}
//! impl Dummy {
//!   fn do_work() {}
//! }
//!
//! impl Visitor<Diagnostic> for Dummy {
//!     type Value = ();
//!
//!     fn visit_function_declaration(&mut self, node: &FunctionDeclaration) -> Result<Self::Value, Diagnostic> {
//!         // Do something custom before visiting the FunctionDeclaration node
//!         Dummy::do_work();
//!
//!         // Continue the recursion
//!         visit_function_declaration(self, node)
//!     }
//! }
//! ```

use crate::common::*;
use crate::diagnostic::Diagnostic;
use crate::textual::*;
use crate::time::{DateAndTimeLiteral, DateLiteral, DurationLiteral, TimeOfDayLiteral};
use paste::paste;

/// Defines a macro for the `Visitor` trait that dispatches visiting
/// to a function. In other words, creates a function of the form:
///
/// ```ignore
/// fn visit_type_name(&mut self, node: &TypeName) -> Result<Self::Value, E> {
///    visit_type_name(self, node)
/// }
/// ```
///
/// The visitor generally dispatches to a dedicated function so that
/// implementations can re-use the behavior.
macro_rules! dispatch {
    ($struct_name:ident) => {
        paste! {
            fn [<visit_ $struct_name:snake >](&mut self, node: &$struct_name) -> Result<Self::Value, E> {
                [< visit_ $struct_name:snake >](self, node)
            }
        }
    };
}

/// Defines a macro for the `Visitor` trait that returns `Ok`.
/// In other words, creates a function of the form:
///
/// ```ignore
/// fn visit_type_name(&mut self, node: &TypeName) -> Result<Self::Value, E> {
///    Ok(Self::Value::default())
/// }
/// ```
macro_rules! leaf {
    ($struct_name:ident) => {
        paste! {
            #[allow(unused_variables)]
            fn [<visit_ $struct_name:snake >](&mut self, node: &$struct_name) -> Result<Self::Value, E> {
                Ok(Self::Value::default())
            }
        }
    };
}

/// Defines a way to recurse into an object in the syntax tree.
pub trait Acceptor {
    fn accept<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
        &self,
        visitor: &mut V,
    ) -> Result<V::Value, E>;
}

/// Recurses into a vec of objects.
impl<X> Acceptor for Vec<X>
where
    X: Acceptor,
{
    fn accept<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
        &self,
        visitor: &mut V,
    ) -> Result<V::Value, E> {
        match self.iter().map(|x| x.accept(visitor)).find(|r| r.is_err()) {
            Some(err) => {
                // At least one of the items returned an error, so
                // return the first error.
                err
            }
            None => {
                // There were no errors, so return the default value
                Ok(V::Value::default())
            }
        }
    }
}

/// Recurses into an optional object. Does nothing if the option is none.
impl<X> Acceptor for Option<X>
where
    X: Acceptor,
{
    fn accept<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
        &self,
        visitor: &mut V,
    ) -> Result<V::Value, E> {
        match self.as_ref() {
            Some(x) => x.accept(visitor),
            None => Ok(V::Value::default()),
        }
    }
}

/// Defines a macro for the `Acceptor` trait that dispatches to the
/// visitor. (The `Acceptor` trait defines a handler for lists and
/// optionals of 61131-3 elements.)
macro_rules! acceptor_impl {
    ($struct_name:ident) => {
        paste! {
            impl Acceptor for $struct_name {
                fn accept<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
                    &self,
                    visitor: &mut V,
                ) -> Result<V::Value, E> {
                    visitor.[<visit_ $struct_name:snake >](self)
                }
            }
        }
    };
}

acceptor_impl!(LibraryElementKind);
acceptor_impl!(FunctionDeclaration);
acceptor_impl!(FunctionBlockDeclaration);
acceptor_impl!(ProgramDeclaration);
acceptor_impl!(VarDecl);
acceptor_impl!(PouBody);
acceptor_impl!(Statements);
acceptor_impl!(StmtKind);
acceptor_impl!(ElseIf);
acceptor_impl!(CaseGroup);
acceptor_impl!(ExprKind);
acceptor_impl!(ParamAssignmentKind);
acceptor_impl!(Variable);
acceptor_impl!(ConstantKind);
acceptor_impl!(InstructionList);
acceptor_impl!(IlInstruction);
acceptor_impl!(IlSimpleInstruction);

/// Defines a visitor for the object tree. The default visitor
/// recursively walks to visit items in the tree.
///
/// Functions in the visitor are named based on the snake-case variant of
/// the element name. For example, the `VarDecl` element's visitor
/// function is `visit_var_decl`.
pub trait Visitor<E: std::convert::From<Diagnostic>> {
    /// Value produced by this visitor when the result is not an error.
    ///
    /// The returned value is usually not meaningful because no guarantee
    /// is provided when returning from vectors of objects.
    type Value: Default;

    fn walk(&mut self, node: &Library) -> Result<Self::Value, E> {
        Acceptor::accept(&node.elements, self)
    }

    // Declarations from Common

    dispatch!(LibraryElementKind);

    // 2.5.1
    dispatch!(FunctionDeclaration);

    // 2.5.2
    dispatch!(FunctionBlockDeclaration);

    // 2.5.3
    dispatch!(ProgramDeclaration);

    dispatch!(PouBody);

    // 2.4.3
    dispatch!(VarDecl);

    dispatch!(ConstantKind);

    // 2.2.1
    leaf!(IntegerLiteral);

    // 2.2.1
    leaf!(RealLiteral);

    // 2.2.1
    leaf!(BoolLiteral);

    // 2.2.1
    leaf!(BitStringLiteral);

    // 2.2.2
    leaf!(StringLiteral);

    // 2.2.3.1
    leaf!(DurationLiteral);

    // 2.2.3.2
    leaf!(DateLiteral);

    // 2.2.3.2
    leaf!(TimeOfDayLiteral);

    // 2.2.3.2
    leaf!(DateAndTimeLiteral);

    // 2.3.3.1
    leaf!(EnumeratedValue);

    // Declarations from Textual

    // 3
    dispatch!(Statements);

    dispatch!(StmtKind);

    dispatch!(Variable);

    leaf!(NamedVariable);

    dispatch!(ArrayVariable);

    dispatch!(StructuredVariable);

    // B.1.4.1
    leaf!(DirectVariable);

    dispatch!(ExprKind);

    // 3.3.1
    dispatch!(CompareExpr);

    // 3.3.1
    dispatch!(BinaryExpr);

    // 3.3.1
    dispatch!(UnaryExpr);

    dispatch!(FunctionCall);

    // 3.2.3
    dispatch!(ParamAssignmentKind);

    // 3.2.3
    dispatch!(PositionalInput);

    // 3.2.3
    dispatch!(NamedInput);

    // 3.2.3
    dispatch!(Output);

    // 3.2.3
    dispatch!(FbCall);

    // 3.3.2.1
    dispatch!(Assignment);

    // 3.3.2.3
    dispatch!(If);

    dispatch!(ElseIf);

    // 3.3.2.3
    dispatch!(Case);

    dispatch!(CaseGroup);

    // 3.3.2.4
    dispatch!(For);

    dispatch!(While);

    dispatch!(Repeat);

    // Declarations from IL

    dispatch!(InstructionList);

    // B.2.1
    dispatch!(IlInstruction);

    dispatch!(IlOperationKind);

    dispatch!(IlSimpleOperation);

    dispatch!(IlExpression);

    dispatch!(IlSimpleInstruction);

    dispatch!(IlSimpleOperationKind);

    dispatch!(IlFunctionCall);

    dispatch!(IlFormalFunctionCall);

    dispatch!(IlFbCall);

    leaf!(IlJumpOperation);
}

pub fn visit_library_element_kind<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &LibraryElementKind,
) -> Result<V::Value, E> {
    match node {
        LibraryElementKind::FunctionDeclaration(decl) => v.visit_function_declaration(decl),
        LibraryElementKind::FunctionBlockDeclaration(decl) => {
            v.visit_function_block_declaration(decl)
        }
        LibraryElementKind::ProgramDeclaration(decl) => v.visit_program_declaration(decl),
        LibraryElementKind::GlobalVarDecls(decls) => decls.accept(v),
    }
}

pub fn visit_function_declaration<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &FunctionDeclaration,
) -> Result<V::Value, E> {
    node.variables.accept(v)?;
    node.body.accept(v)
}

pub fn visit_function_block_declaration<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &FunctionBlockDeclaration,
) -> Result<V::Value, E> {
    node.variables.accept(v)?;
    node.body.accept(v)
}

pub fn visit_program_declaration<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &ProgramDeclaration,
) -> Result<V::Value, E> {
    node.variables.accept(v)?;
    node.body.accept(v)
}

pub fn visit_pou_body<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &PouBody,
) -> Result<V::Value, E> {
    match node {
        PouBody::Statements(statements) => v.visit_statements(statements),
        PouBody::Instructions(list) => v.visit_instruction_list(list),
    }
}

pub fn visit_var_decl<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &VarDecl,
) -> Result<V::Value, E> {
    node.initializer.accept(v)
}

pub fn visit_constant_kind<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &ConstantKind,
) -> Result<V::Value, E> {
    match node {
        ConstantKind::IntegerLiteral(literal) => v.visit_integer_literal(literal),
        ConstantKind::RealLiteral(literal) => v.visit_real_literal(literal),
        ConstantKind::BoolLiteral(literal) => v.visit_bool_literal(literal),
        ConstantKind::BitStringLiteral(literal) => v.visit_bit_string_literal(literal),
        ConstantKind::StringLiteral(literal) => v.visit_string_literal(literal),
        ConstantKind::Duration(literal) => v.visit_duration_literal(literal),
        ConstantKind::Date(literal) => v.visit_date_literal(literal),
        ConstantKind::TimeOfDay(literal) => v.visit_time_of_day_literal(literal),
        ConstantKind::DateAndTime(literal) => v.visit_date_and_time_literal(literal),
    }
}

pub fn visit_statements<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &Statements,
) -> Result<V::Value, E> {
    node.body.accept(v)
}

pub fn visit_stmt_kind<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &StmtKind,
) -> Result<V::Value, E> {
    match node {
        StmtKind::Assignment(stmt) => v.visit_assignment(stmt),
        StmtKind::If(stmt) => v.visit_if(stmt),
        StmtKind::Case(stmt) => v.visit_case(stmt),
        StmtKind::For(stmt) => v.visit_for(stmt),
        StmtKind::While(stmt) => v.visit_while(stmt),
        StmtKind::Repeat(stmt) => v.visit_repeat(stmt),
        StmtKind::FbCall(stmt) => v.visit_fb_call(stmt),
        StmtKind::Return | StmtKind::Exit => Ok(V::Value::default()),
    }
}

pub fn visit_variable<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &Variable,
) -> Result<V::Value, E> {
    match node {
        Variable::Named(variable) => v.visit_named_variable(variable),
        Variable::Array(variable) => v.visit_array_variable(variable),
        Variable::Structured(variable) => v.visit_structured_variable(variable),
        Variable::Direct(variable) => v.visit_direct_variable(variable),
    }
}

pub fn visit_array_variable<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &ArrayVariable,
) -> Result<V::Value, E> {
    node.variable.as_ref().accept(v)?;
    node.subscripts.accept(v)
}

pub fn visit_structured_variable<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &StructuredVariable,
) -> Result<V::Value, E> {
    node.record.as_ref().accept(v)
}

pub fn visit_expr_kind<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &ExprKind,
) -> Result<V::Value, E> {
    match node {
        ExprKind::Compare(expr) => v.visit_compare_expr(expr),
        ExprKind::BinaryOp(expr) => v.visit_binary_expr(expr),
        ExprKind::UnaryOp(expr) => v.visit_unary_expr(expr),
        ExprKind::Const(constant) => v.visit_constant_kind(constant),
        ExprKind::EnumeratedValue(value) => v.visit_enumerated_value(value),
        ExprKind::Variable(variable) => v.visit_variable(variable),
        ExprKind::Function(call) => v.visit_function_call(call),
    }
}

pub fn visit_compare_expr<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &CompareExpr,
) -> Result<V::Value, E> {
    node.left.accept(v)?;
    node.right.accept(v)
}

pub fn visit_binary_expr<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &BinaryExpr,
) -> Result<V::Value, E> {
    node.left.accept(v)?;
    node.right.accept(v)
}

pub fn visit_unary_expr<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &UnaryExpr,
) -> Result<V::Value, E> {
    node.term.accept(v)
}

pub fn visit_function_call<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &FunctionCall,
) -> Result<V::Value, E> {
    node.params.accept(v)
}

pub fn visit_param_assignment_kind<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &ParamAssignmentKind,
) -> Result<V::Value, E> {
    match node {
        ParamAssignmentKind::Positional(param) => v.visit_positional_input(param),
        ParamAssignmentKind::NamedInput(param) => v.visit_named_input(param),
        ParamAssignmentKind::Output(param) => v.visit_output(param),
    }
}

pub fn visit_positional_input<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &PositionalInput,
) -> Result<V::Value, E> {
    node.value.accept(v)
}

pub fn visit_named_input<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &NamedInput,
) -> Result<V::Value, E> {
    node.value.accept(v)
}

pub fn visit_output<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &Output,
) -> Result<V::Value, E> {
    node.value.accept(v)
}

pub fn visit_fb_call<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &FbCall,
) -> Result<V::Value, E> {
    node.params.accept(v)
}

pub fn visit_assignment<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &Assignment,
) -> Result<V::Value, E> {
    node.target.accept(v)?;
    node.value.accept(v)
}

pub fn visit_if<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &If,
) -> Result<V::Value, E> {
    node.expr.accept(v)?;
    node.body.accept(v)?;
    node.else_ifs.accept(v)?;
    node.else_body.accept(v)
}

pub fn visit_else_if<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &ElseIf,
) -> Result<V::Value, E> {
    node.expr.accept(v)?;
    node.body.accept(v)
}

pub fn visit_case<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &Case,
) -> Result<V::Value, E> {
    node.selector.accept(v)?;
    node.groups.accept(v)?;
    node.else_body.accept(v)
}

pub fn visit_case_group<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &CaseGroup,
) -> Result<V::Value, E> {
    node.selectors.accept(v)?;
    node.body.accept(v)
}

pub fn visit_for<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &For,
) -> Result<V::Value, E> {
    node.from.accept(v)?;
    node.to.accept(v)?;
    node.by.accept(v)?;
    node.body.accept(v)
}

pub fn visit_while<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &While,
) -> Result<V::Value, E> {
    node.condition.accept(v)?;
    node.body.accept(v)
}

pub fn visit_repeat<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &Repeat,
) -> Result<V::Value, E> {
    node.body.accept(v)?;
    node.until.accept(v)
}

pub fn visit_instruction_list<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &InstructionList,
) -> Result<V::Value, E> {
    node.instructions.accept(v)
}

pub fn visit_il_instruction<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &IlInstruction,
) -> Result<V::Value, E> {
    node.operation.accept(v)
}

impl Acceptor for IlOperationKind {
    fn accept<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
        &self,
        visitor: &mut V,
    ) -> Result<V::Value, E> {
        visitor.visit_il_operation_kind(self)
    }
}

pub fn visit_il_operation_kind<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &IlOperationKind,
) -> Result<V::Value, E> {
    match node {
        IlOperationKind::Simple(operation) => v.visit_il_simple_operation(operation),
        IlOperationKind::Expression(expression) => v.visit_il_expression(expression),
        IlOperationKind::FunctionCall(call) => v.visit_il_function_call(call),
        IlOperationKind::FormalFunctionCall(call) => v.visit_il_formal_function_call(call),
        IlOperationKind::FbCall(call) => v.visit_il_fb_call(call),
        IlOperationKind::Jump(jump) => v.visit_il_jump_operation(jump),
    }
}

pub fn visit_il_simple_operation<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &IlSimpleOperation,
) -> Result<V::Value, E> {
    node.operand.accept(v)
}

pub fn visit_il_expression<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &IlExpression,
) -> Result<V::Value, E> {
    node.operand.accept(v)?;
    node.instructions.accept(v)
}

pub fn visit_il_simple_instruction<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &IlSimpleInstruction,
) -> Result<V::Value, E> {
    v.visit_il_simple_operation_kind(&node.operation)
}

pub fn visit_il_simple_operation_kind<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &IlSimpleOperationKind,
) -> Result<V::Value, E> {
    match node {
        IlSimpleOperationKind::Simple(operation) => v.visit_il_simple_operation(operation),
        IlSimpleOperationKind::FunctionCall(call) => v.visit_il_function_call(call),
        IlSimpleOperationKind::Expression(expression) => v.visit_il_expression(expression),
    }
}

pub fn visit_il_function_call<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &IlFunctionCall,
) -> Result<V::Value, E> {
    node.operands.accept(v)
}

pub fn visit_il_formal_function_call<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &IlFormalFunctionCall,
) -> Result<V::Value, E> {
    node.params.accept(v)
}

pub fn visit_il_fb_call<V: Visitor<E> + ?Sized, E: From<Diagnostic>>(
    v: &mut V,
    node: &IlFbCall,
) -> Result<V::Value, E> {
    node.operands.accept(v)?;
    node.params.accept(v)
}
