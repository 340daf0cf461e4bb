//! Reports data type errors and warnings for a library whose nodes have
//! been through candidate data type inference and narrowing.
//!
//! The rules read two annotations per node: the candidate data type
//! list, and the single chosen data type (absent when narrowing failed).
//! A node with candidates but no chosen type is only an error in
//! contexts that demand a value; a node with no candidates at all never
//! fits its context and is always an error.
//!
//! Errors carry a display level from 0 to 4; only levels up to the
//! configured display level are reported. Warnings are unconditional.
use std::collections::HashSet;

use log::debug;
use oxplc_dsl::analysis::AnnotationMap;
use oxplc_dsl::common::*;
use oxplc_dsl::core::{Id, Located, NodeId, SourceSpan};
use oxplc_dsl::diagnostic::{Diagnostic, Label};
use oxplc_dsl::textual::*;
use oxplc_dsl::visitor::{Acceptor, Visitor};
use oxplc_problems::Problem;

use crate::function_environment::find_parameter;
use crate::scope::ScopeEnvironment;
use crate::semantic_context::SemanticContext;

/// The outcome of the reporting pass.
#[derive(Debug, Default)]
pub struct DatatypeErrorReport {
    pub diagnostics: Vec<Diagnostic>,
    pub error_count: usize,
    pub warning_count: usize,
}

/// Walks the library and reports every data type error and warning.
pub fn apply(
    library: &Library,
    context: &SemanticContext,
    annotations: &AnnotationMap,
    display_error_level: u8,
) -> DatatypeErrorReport {
    debug!("reporting datatype errors");
    let mut reporter = DatatypeErrorReporter {
        context,
        annotations,
        display_error_level,
        scope: None,
        il_prev: None,
        report: DatatypeErrorReport::default(),
    };
    // The reporter records problems instead of failing the walk.
    let result: Result<(), Diagnostic> = reporter.walk(library);
    debug_assert!(result.is_ok());
    reporter.report
}

/// What is known about the accumulator before the IL operation being
/// checked, gathered from the predecessor instructions.
#[derive(Debug, Clone, Default)]
struct IlPrev {
    /// Whether there is any predecessor at all.
    exists: bool,
    /// The candidate data types shared by every predecessor.
    candidates: Vec<TypeName>,
    /// The narrowed data type, when every predecessor narrowed to the
    /// same one.
    datatype: Option<TypeName>,
}

impl IlPrev {
    fn none() -> Self {
        Self::default()
    }

    fn single(annotations: &AnnotationMap, id: NodeId) -> Self {
        Self {
            exists: true,
            candidates: annotations.candidates(id).to_vec(),
            datatype: annotations.datatype(id).cloned(),
        }
    }

    fn merged(annotations: &AnnotationMap, prevs: &[&IlInstruction]) -> Self {
        let Some(first) = prevs.first() else {
            return Self::none();
        };
        let mut candidates = annotations.candidates(first.id).to_vec();
        for prev in &prevs[1..] {
            let other = annotations.candidates(prev.id);
            candidates.retain(|candidate| other.contains(candidate));
        }
        let first_type = annotations.datatype(first.id);
        let all_equal = first_type.is_some()
            && prevs[1..]
                .iter()
                .all(|prev| annotations.datatype(prev.id) == first_type);
        Self {
            exists: true,
            candidates,
            datatype: if all_equal { first_type.cloned() } else { None },
        }
    }
}

/// A reference to the operand of an IL operator: an expression, the
/// result of a parenthesised list, or nothing.
#[derive(Clone, Copy)]
enum IlOperandRef<'a> {
    None,
    Expr(&'a ExprKind),
    /// The final instruction of a parenthesised list, if any.
    InnerList(Option<NodeId>),
}

struct DatatypeErrorReporter<'a> {
    context: &'a SemanticContext,
    annotations: &'a AnnotationMap,
    display_error_level: u8,
    scope: Option<ScopeEnvironment>,
    il_prev: Option<IlPrev>,
    report: DatatypeErrorReport,
}

impl DatatypeErrorReporter<'_> {
    fn error(&mut self, level: u8, problem: Problem, span: SourceSpan, message: String) {
        if self.display_error_level >= level {
            self.report
                .diagnostics
                .push(Diagnostic::problem(problem, Label::span(span, message)).with_level(level));
            self.report.error_count += 1;
        }
    }

    fn warning(&mut self, problem: Problem, span: SourceSpan, message: String) {
        self.report
            .diagnostics
            .push(Diagnostic::warning(problem, Label::span(span, message)));
        self.report.warning_count += 1;
    }

    fn has_candidates(&self, id: NodeId) -> bool {
        self.annotations.has_candidates(id)
    }

    fn datatype_absent(&self, id: NodeId) -> bool {
        self.annotations.datatype(id).is_none()
    }

    /// The common literal rule: no candidate at all means the value
    /// exceeds the range of every type in its family; candidates but no
    /// chosen type means the family does not fit this location.
    fn check_literal(&mut self, id: NodeId, span: SourceSpan, range_message: String, family: &str) {
        if !self.has_candidates(id) {
            self.error(0, Problem::LiteralOutOfRange, span, range_message);
        } else if self.datatype_absent(id) {
            self.error(
                4,
                Problem::LiteralTypeNotValidHere,
                span,
                format!("{family} data type not valid in this location."),
            );
        }
    }

    fn il_prev(&self) -> IlPrev {
        self.il_prev.clone().unwrap_or_default()
    }

    fn operand_has_candidates(&self, operand: IlOperandRef) -> bool {
        match operand {
            IlOperandRef::None => false,
            IlOperandRef::Expr(expr) => self.has_candidates(expr.node_id()),
            IlOperandRef::InnerList(id) => id.map(|id| self.has_candidates(id)).unwrap_or(false),
        }
    }

    /// The rules shared by the binary IL operators.
    fn check_il_binary_operator(
        &mut self,
        name: &str,
        id: NodeId,
        span: SourceSpan,
        operand: IlOperandRef,
    ) {
        if !self.has_candidates(id) && self.operand_has_candidates(operand) {
            self.error(
                0,
                Problem::IlOperatorTypeMismatch,
                span,
                format!("Data type mismatch for '{name}' operator."),
            );
        } else if self.datatype_absent(id) {
            self.warning(
                Problem::ExpressionResultUnused,
                span,
                format!("Result of '{name}' operation is never used."),
            );
        } else if self.annotations.is_deprecated(id) {
            self.warning(
                Problem::DeprecatedOperation,
                span,
                format!("Deprecated operation for '{name}'."),
            );
        }
    }

    /// The conditional flow-control operators require the accumulator
    /// to hold a BOOL, which narrowing records as the operation's own
    /// data type.
    fn check_conditional_flow_control(&mut self, name: &str, id: NodeId, span: SourceSpan) {
        if self.datatype_absent(id) {
            self.error(
                0,
                Problem::IlConditionalNotBool,
                span,
                format!(
                    "{name} operator must be preceded by an IL instruction producing a BOOL value."
                ),
            );
        }
    }

    /// Checks the implicit FB invocation spelled by operators such as
    /// `S1` or `CLK`, which call the named parameter of the FB instance
    /// given as operand with the current accumulator value.
    fn check_implicit_fb_call(
        &mut self,
        param_name: &str,
        node: &IlSimpleOperation,
    ) -> Result<(), Diagnostic> {
        let Some(operand) = &node.operand else {
            self.error(
                0,
                Problem::IlImplicitCallMissingOperand,
                node.span(),
                format!("Missing operand for FB call operator '{param_name}'."),
            );
            return Ok(());
        };
        operand.accept(self)?;

        let span = SourceSpan::join(&node.span(), &operand.span());
        let fb_variables: Option<Vec<VarDecl>> = match operand {
            ExprKind::Variable(variable) => variable
                .base_name()
                .and_then(|name| {
                    self.scope
                        .as_ref()?
                        .fb_type_name(name, &self.context.function_blocks)
                })
                .and_then(|type_name| self.context.function_blocks.find(type_name))
                .map(|decl| decl.variables.clone()),
            _ => None,
        };
        let Some(fb_variables) = fb_variables else {
            self.error(
                0,
                Problem::IlImplicitCallNotFbInstance,
                span,
                "Invalid FB call: operand is not a FB instance.".to_owned(),
            );
            return Ok(());
        };

        if !self.il_prev().exists {
            self.error(
                0,
                Problem::IlImplicitCallMissingLoad,
                span,
                format!(
                    "FB invocation operator '{param_name}' must be preceded by a 'LD' (or equivalent) operator."
                ),
            );
            return Ok(());
        }

        // A FB outside the standard library may declare this name as an
        // output or not at all, neither of which works for an implicit
        // call.
        if find_parameter(&fb_variables, &Id::from(param_name)).is_none() {
            self.error(
                0,
                Problem::IlImplicitCallUnknownParameter,
                span,
                format!("FB called by '{param_name}' operator does not have a parameter named '{param_name}'"),
            );
            return Ok(());
        }

        if self.il_prev().datatype.is_none() {
            self.error(
                0,
                Problem::IlImplicitCallTypeIncompatible,
                span,
                format!(
                    "Data type incompatibility between parameter '{param_name}' and value being passed."
                ),
            );
            return Ok(());
        }

        if self.datatype_absent(operand.node_id()) {
            self.error(
                0,
                Problem::IlImplicitCallTypeIncompatible,
                span,
                format!(
                    "Invalid FB call: Datatype incompatibility between the FB's '{param_name}' parameter and value being passed, or parameter '{param_name}' is not a 'VAR_INPUT' parameter."
                ),
            );
        }
        Ok(())
    }

    /// Checks a function or FB invocation site against the callee's
    /// declared parameters.
    #[allow(clippy::too_many_arguments)]
    fn check_invocation(
        &mut self,
        span: SourceSpan,
        pou_str: &str,
        callee: &Id,
        decl_variables: Option<&[VarDecl]>,
        resolved: bool,
        params: &[ParamAssignmentKind],
        accumulator_first: bool,
    ) {
        let mut invocation_error = false;

        if let Some(variables) = decl_variables {
            let mut seen: HashSet<Id> = HashSet::new();
            let mut position = if accumulator_first {
                // The accumulator is the implicit first value of a
                // non-formal IL invocation.
                if self.il_prev().datatype.is_none() {
                    invocation_error = true;
                    self.error(
                        0,
                        Problem::InvocationParameterTypeIncompatible,
                        span.clone(),
                        format!(
                            "Data type incompatibility for value passed in position 1 when invoking {pou_str} '{callee}'"
                        ),
                    );
                }
                2
            } else {
                1
            };

            for param in params {
                match param {
                    ParamAssignmentKind::Positional(positional) => {
                        if self.datatype_absent(positional.value.node_id()) {
                            invocation_error = true;
                            self.error(
                                0,
                                Problem::InvocationParameterTypeIncompatible,
                                positional.value.span(),
                                format!(
                                    "Data type incompatibility for value passed in position {position} when invoking {pou_str} '{callee}'"
                                ),
                            );
                        }
                        position += 1;
                    }
                    ParamAssignmentKind::NamedInput(named) => {
                        if !seen.insert(named.name.clone()) {
                            invocation_error = true;
                            self.error(
                                0,
                                Problem::InvocationDuplicateParameter,
                                named.name.span(),
                                format!(
                                    "Duplicate parameter '{}' when invoking {pou_str} '{callee}'",
                                    named.name
                                ),
                            );
                            continue;
                        }
                        let Some(decl) = find_parameter(variables, &named.name) else {
                            invocation_error = true;
                            self.error(
                                0,
                                Problem::InvocationUnknownParameter,
                                named.name.span(),
                                format!(
                                    "Invalid parameter '{}' when invoking {pou_str} '{callee}'",
                                    named.name
                                ),
                            );
                            continue;
                        };
                        if !matches!(decl.var_type, VariableType::Input | VariableType::InOut) {
                            invocation_error = true;
                            self.error(
                                0,
                                Problem::InvocationAssignmentDirection,
                                named.name.span(),
                                format!(
                                    "Invalid assignment syntax ':=' used for parameter '{}', when invoking {pou_str} '{callee}'",
                                    named.name
                                ),
                            );
                            continue;
                        }
                        if self.datatype_absent(named.value.node_id()) {
                            invocation_error = true;
                            self.error(
                                0,
                                Problem::InvocationParameterTypeIncompatible,
                                named.value.span(),
                                format!(
                                    "Data type incompatibility between parameter '{}' and value being passed, when invoking {pou_str} '{callee}'",
                                    named.name
                                ),
                            );
                        }
                    }
                    ParamAssignmentKind::Output(output) => {
                        if !seen.insert(output.name.clone()) {
                            invocation_error = true;
                            self.error(
                                0,
                                Problem::InvocationDuplicateParameter,
                                output.name.span(),
                                format!(
                                    "Duplicate parameter '{}' when invoking {pou_str} '{callee}'",
                                    output.name
                                ),
                            );
                            continue;
                        }
                        let Some(decl) = find_parameter(variables, &output.name) else {
                            invocation_error = true;
                            self.error(
                                0,
                                Problem::InvocationUnknownParameter,
                                output.name.span(),
                                format!(
                                    "Invalid parameter '{}' when invoking {pou_str} '{callee}'",
                                    output.name
                                ),
                            );
                            continue;
                        };
                        if decl.var_type != VariableType::Output {
                            invocation_error = true;
                            self.error(
                                0,
                                Problem::InvocationAssignmentDirection,
                                output.name.span(),
                                format!(
                                    "Invalid assignment syntax '=>' used for parameter '{}', when invoking {pou_str} '{callee}'",
                                    output.name
                                ),
                            );
                        }
                    }
                }
            }
        }

        if !resolved {
            invocation_error = true;
            self.error(
                0,
                Problem::InvocationOverloadUnresolved,
                span.clone(),
                format!("Unable to resolve which overloaded {pou_str} '{callee}' is being invoked."),
            );
        }

        if invocation_error {
            self.error(
                2,
                Problem::InvocationInvalidParameters,
                span,
                format!("Invalid parameters when invoking {pou_str} '{callee}'"),
            );
        }
    }

    /// Dispatches the checks for one IL operator with its operand.
    fn check_il_operator(
        &mut self,
        operator: IlOperator,
        id: NodeId,
        span: SourceSpan,
        operand: IlOperandRef,
    ) {
        match operator {
            IlOperator::Ld | IlOperator::Ret => {}
            IlOperator::Ldn
            | IlOperator::St
            | IlOperator::Stn
            | IlOperator::S
            | IlOperator::R => {
                if !self.has_candidates(id) && self.operand_has_candidates(operand) {
                    self.error(
                        0,
                        Problem::IlOperatorTypeMismatch,
                        span,
                        format!("Data type mismatch for '{operator}' operator."),
                    );
                }
            }
            IlOperator::Not => {
                if !matches!(operand, IlOperandRef::None) {
                    self.error(
                        0,
                        Problem::IlNotOperatorWithOperand,
                        span.clone(),
                        "'NOT' operator may not have an operand.".to_owned(),
                    );
                }
                if !self.has_candidates(id) {
                    self.error(
                        0,
                        Problem::IlOperatorTypeMismatch,
                        span,
                        "Data type mismatch for 'NOT' operator.".to_owned(),
                    );
                }
            }
            IlOperator::And
            | IlOperator::Or
            | IlOperator::Xor
            | IlOperator::Andn
            | IlOperator::Orn
            | IlOperator::Xorn
            | IlOperator::Add
            | IlOperator::Sub
            | IlOperator::Mul
            | IlOperator::Div
            | IlOperator::Mod
            | IlOperator::Gt
            | IlOperator::Ge
            | IlOperator::Eq
            | IlOperator::Lt
            | IlOperator::Le
            | IlOperator::Ne => {
                self.check_il_binary_operator(&operator.to_string(), id, span, operand);
            }
            IlOperator::Retc => self.check_conditional_flow_control("RETC", id, span),
            IlOperator::Retcn => self.check_conditional_flow_control("RETCN", id, span),
            // The implicit FB operators are handled by the caller,
            // which has access to the full operation node.
            IlOperator::S1
            | IlOperator::R1
            | IlOperator::Clk
            | IlOperator::Cu
            | IlOperator::Cd
            | IlOperator::Pv
            | IlOperator::In
            | IlOperator::Pt => {}
        }
    }
}

impl Visitor<Diagnostic> for DatatypeErrorReporter<'_> {
    type Value = ();

    // Program organization units. Variable declarations are not checked
    // here, only the bodies.

    fn visit_function_declaration(&mut self, node: &FunctionDeclaration) -> Result<(), Diagnostic> {
        self.scope = Some(ScopeEnvironment::for_function(node));
        node.body.accept(self)?;
        self.scope = None;
        Ok(())
    }

    fn visit_function_block_declaration(
        &mut self,
        node: &FunctionBlockDeclaration,
    ) -> Result<(), Diagnostic> {
        self.scope = Some(ScopeEnvironment::for_function_block(node));
        node.body.accept(self)?;
        self.scope = None;
        Ok(())
    }

    fn visit_program_declaration(&mut self, node: &ProgramDeclaration) -> Result<(), Diagnostic> {
        self.scope = Some(ScopeEnvironment::for_program(node));
        node.body.accept(self)?;
        self.scope = None;
        Ok(())
    }

    // Literals

    fn visit_integer_literal(&mut self, node: &IntegerLiteral) -> Result<(), Diagnostic> {
        let family = node
            .data_type
            .as_ref()
            .map(TypeName::c_name)
            .unwrap_or_else(|| "ANY_INT".to_owned());
        self.check_literal(
            node.id,
            node.span(),
            format!("Numerical value exceeds range for {family} data type."),
            "ANY_INT",
        );
        Ok(())
    }

    fn visit_real_literal(&mut self, node: &RealLiteral) -> Result<(), Diagnostic> {
        let family = node
            .data_type
            .as_ref()
            .map(TypeName::c_name)
            .unwrap_or_else(|| "ANY_REAL".to_owned());
        self.check_literal(
            node.id,
            node.span(),
            format!("Numerical value exceeds range for {family} data type."),
            "ANY_REAL",
        );
        Ok(())
    }

    fn visit_bool_literal(&mut self, node: &BoolLiteral) -> Result<(), Diagnostic> {
        let family = node
            .data_type
            .as_ref()
            .map(TypeName::c_name)
            .unwrap_or_else(|| "ANY_BOOL".to_owned());
        self.check_literal(
            node.id,
            node.span(),
            format!("Value is not valid for {family} data type."),
            "ANY_BOOL",
        );
        Ok(())
    }

    fn visit_bit_string_literal(&mut self, node: &BitStringLiteral) -> Result<(), Diagnostic> {
        self.check_literal(
            node.id,
            node.span(),
            format!(
                "Numerical value exceeds range for {} data type.",
                node.data_type.c_name()
            ),
            "ANY_BIT",
        );
        Ok(())
    }

    fn visit_string_literal(&mut self, node: &StringLiteral) -> Result<(), Diagnostic> {
        let family = if node.wide { "WSTRING" } else { "STRING" };
        self.check_literal(
            node.id,
            node.span(),
            format!("Numerical value exceeds range for {family} data type."),
            family,
        );
        Ok(())
    }

    fn visit_duration_literal(
        &mut self,
        node: &oxplc_dsl::time::DurationLiteral,
    ) -> Result<(), Diagnostic> {
        self.check_literal(
            node.id,
            node.span(),
            "Invalid syntax for TIME data type.".to_owned(),
            "TIME",
        );
        Ok(())
    }

    fn visit_date_literal(&mut self, node: &oxplc_dsl::time::DateLiteral) -> Result<(), Diagnostic> {
        self.check_literal(
            node.id,
            node.span(),
            "Invalid syntax for DATE data type.".to_owned(),
            "DATE",
        );
        Ok(())
    }

    fn visit_time_of_day_literal(
        &mut self,
        node: &oxplc_dsl::time::TimeOfDayLiteral,
    ) -> Result<(), Diagnostic> {
        self.check_literal(
            node.id,
            node.span(),
            "Invalid syntax for TOD data type.".to_owned(),
            "TOD",
        );
        Ok(())
    }

    fn visit_date_and_time_literal(
        &mut self,
        node: &oxplc_dsl::time::DateAndTimeLiteral,
    ) -> Result<(), Diagnostic> {
        self.check_literal(
            node.id,
            node.span(),
            "Invalid syntax for DT data type.".to_owned(),
            "DT",
        );
        Ok(())
    }

    fn visit_enumerated_value(&mut self, node: &EnumeratedValue) -> Result<(), Diagnostic> {
        if !self.has_candidates(node.id) {
            self.error(
                0,
                Problem::EnumeratedValueAmbiguous,
                node.span(),
                "Ambiguous enumerate value or Variable not declared in this scope.".to_owned(),
            );
        }
        Ok(())
    }

    // Variables

    fn visit_named_variable(&mut self, node: &NamedVariable) -> Result<(), Diagnostic> {
        if !self.has_candidates(node.id) {
            self.error(
                0,
                Problem::VariableUndeclared,
                node.span(),
                "Variable not declared in this scope.".to_owned(),
            );
        }
        Ok(())
    }

    fn visit_direct_variable(&mut self, node: &DirectVariable) -> Result<(), Diagnostic> {
        if !self.has_candidates(node.id) {
            self.error(
                0,
                Problem::LocatedVariableOutOfRange,
                node.span(),
                "Numerical value exceeds range for located variable data type.".to_owned(),
            );
        }
        Ok(())
    }

    fn visit_array_variable(&mut self, node: &ArrayVariable) -> Result<(), Diagnostic> {
        if !self.has_candidates(node.id) {
            self.error(
                0,
                Problem::ArrayVariableUndeclared,
                node.span(),
                "Array variable not declared in this scope.".to_owned(),
            );
        }
        // Errors in the expressions used as subscripts still matter.
        node.subscripts.accept(self)
    }

    fn visit_structured_variable(&mut self, node: &StructuredVariable) -> Result<(), Diagnostic> {
        if !self.has_candidates(node.id) {
            self.error(
                0,
                Problem::StructuredVariableUndeclared,
                node.span(),
                "Undeclared structured/FB variable.".to_owned(),
            );
        }
        Ok(())
    }

    // Expressions

    fn visit_binary_expr(&mut self, node: &BinaryExpr) -> Result<(), Diagnostic> {
        node.left.accept(self)?;
        node.right.accept(self)?;
        if !self.has_candidates(node.id)
            && self.has_candidates(node.left.node_id())
            && self.has_candidates(node.right.node_id())
        {
            self.error(
                0,
                Problem::ExpressionTypeMismatch,
                node.span(),
                format!("Data type mismatch for '{}' expression.", node.op),
            );
        }
        if self.annotations.is_deprecated(node.id) {
            self.warning(
                Problem::DeprecatedOperation,
                node.span(),
                format!("Deprecated operation for '{}' expression.", node.op),
            );
        }
        Ok(())
    }

    fn visit_compare_expr(&mut self, node: &CompareExpr) -> Result<(), Diagnostic> {
        node.left.accept(self)?;
        node.right.accept(self)?;
        if !self.has_candidates(node.id)
            && self.has_candidates(node.left.node_id())
            && self.has_candidates(node.right.node_id())
        {
            self.error(
                0,
                Problem::ExpressionTypeMismatch,
                node.span(),
                format!(
                    "Data type mismatch for '{}' expression.",
                    compare_op_symbol(node.op)
                ),
            );
        }
        Ok(())
    }

    fn visit_unary_expr(&mut self, node: &UnaryExpr) -> Result<(), Diagnostic> {
        node.term.accept(self)?;
        if !self.has_candidates(node.id) && self.has_candidates(node.term.node_id()) {
            self.error(
                0,
                Problem::UnaryExpressionTypeInvalid,
                node.span(),
                format!("Invalid data type for '{}' expression.", node.op),
            );
        }
        Ok(())
    }

    fn visit_function_call(&mut self, node: &FunctionCall) -> Result<(), Diagnostic> {
        node.params.accept(self)?;
        let resolved_decl = self
            .annotations
            .called_function(node.id)
            .and_then(|index| self.context.functions.find(&node.name, index));
        // Without a resolution, check against any declaration with the
        // same name so the messages stay relevant.
        let resolved = resolved_decl.is_some();
        let check_decl = resolved_decl.or_else(|| self.context.functions.overloads(&node.name).first());
        let variables = check_decl.map(|decl| decl.variables.clone());
        self.check_invocation(
            node.span(),
            "function",
            &node.name,
            variables.as_deref(),
            resolved,
            &node.params,
            false,
        );
        Ok(())
    }

    fn visit_fb_call(&mut self, node: &FbCall) -> Result<(), Diagnostic> {
        node.params.accept(self)?;
        let variables: Option<Vec<VarDecl>> = self
            .scope
            .as_ref()
            .and_then(|scope| scope.fb_type_name(&node.var_name, &self.context.function_blocks))
            .and_then(|type_name| self.context.function_blocks.find(type_name))
            .map(|decl| decl.variables.clone());
        let resolved = variables.is_some();
        self.check_invocation(
            node.span(),
            "FB",
            &node.var_name,
            variables.as_deref(),
            resolved,
            &node.params,
            false,
        );
        Ok(())
    }

    // Statements

    fn visit_assignment(&mut self, node: &Assignment) -> Result<(), Diagnostic> {
        node.target.accept(self)?;
        node.value.accept(self)?;
        let target_id = node.target.node_id();
        let value_id = node.value.node_id();
        if self.datatype_absent(target_id)
            && self.datatype_absent(value_id)
            && self.has_candidates(target_id)
            && self.has_candidates(value_id)
        {
            self.error(
                0,
                Problem::AssignmentTypeInvalid,
                node.span(),
                "Invalid data types for ':=' operation.".to_owned(),
            );
        }
        Ok(())
    }

    fn visit_if(&mut self, node: &If) -> Result<(), Diagnostic> {
        node.expr.accept(self)?;
        let expr_id = node.expr.node_id();
        if self.datatype_absent(expr_id) && self.has_candidates(expr_id) {
            self.error(
                0,
                Problem::ConditionTypeInvalid,
                node.span(),
                "Invalid data type for 'IF' condition.".to_owned(),
            );
        }
        node.body.accept(self)?;
        node.else_ifs.accept(self)?;
        node.else_body.accept(self)
    }

    fn visit_else_if(&mut self, node: &ElseIf) -> Result<(), Diagnostic> {
        node.expr.accept(self)?;
        let expr_id = node.expr.node_id();
        if self.datatype_absent(expr_id) && self.has_candidates(expr_id) {
            self.error(
                0,
                Problem::ConditionTypeInvalid,
                node.expr.span(),
                "Invalid data type for 'ELSIF' condition.".to_owned(),
            );
        }
        node.body.accept(self)
    }

    fn visit_case(&mut self, node: &Case) -> Result<(), Diagnostic> {
        node.selector.accept(self)?;
        let selector_id = node.selector.node_id();
        if self.datatype_absent(selector_id) && self.has_candidates(selector_id) {
            self.error(
                0,
                Problem::ConditionTypeInvalid,
                node.span(),
                "'CASE' quantity not an integer or enumerated.".to_owned(),
            );
        }
        node.groups.accept(self)?;
        node.else_body.accept(self)
    }

    fn visit_for(&mut self, node: &For) -> Result<(), Diagnostic> {
        self.visit_named_variable(&node.control)?;
        node.from.accept(self)?;
        node.to.accept(self)?;
        if self.datatype_absent(node.control.id) && self.has_candidates(node.control.id) {
            self.error(
                0,
                Problem::ForExpressionTypeInvalid,
                node.span(),
                "Invalid data type for 'FOR' control variable.".to_owned(),
            );
        }
        if self.datatype_absent(node.from.node_id()) && self.has_candidates(node.from.node_id()) {
            self.error(
                0,
                Problem::ForExpressionTypeInvalid,
                node.span(),
                "Invalid data type for 'FOR' begin expression.".to_owned(),
            );
        }
        if self.datatype_absent(node.to.node_id()) && self.has_candidates(node.to.node_id()) {
            self.error(
                0,
                Problem::ForExpressionTypeInvalid,
                node.span(),
                "Invalid data type for 'FOR' end expression.".to_owned(),
            );
        }
        if let Some(by) = &node.by {
            by.accept(self)?;
            if self.datatype_absent(by.node_id()) && self.has_candidates(by.node_id()) {
                self.error(
                    0,
                    Problem::ForExpressionTypeInvalid,
                    node.span(),
                    "Invalid data type for 'FOR' by expression.".to_owned(),
                );
            }
        }
        node.body.accept(self)
    }

    fn visit_while(&mut self, node: &While) -> Result<(), Diagnostic> {
        node.condition.accept(self)?;
        if self.annotations.candidates(node.id).len() != 1 {
            self.error(
                0,
                Problem::ConditionTypeInvalid,
                node.span(),
                "Invalid data type for 'WHILE' condition.".to_owned(),
            );
            return Ok(());
        }
        node.body.accept(self)
    }

    fn visit_repeat(&mut self, node: &Repeat) -> Result<(), Diagnostic> {
        if self.annotations.candidates(node.id).len() != 1 {
            self.error(
                0,
                Problem::ConditionTypeInvalid,
                node.span(),
                "Invalid data type for 'REPEAT' condition.".to_owned(),
            );
            return Ok(());
        }
        node.body.accept(self)?;
        node.until.accept(self)
    }

    // Instruction list

    fn visit_instruction_list(&mut self, node: &InstructionList) -> Result<(), Diagnostic> {
        for instruction in &node.instructions {
            let prevs: Vec<&IlInstruction> = instruction
                .prev
                .iter()
                .filter_map(|index| node.instructions.get(*index))
                .collect();
            self.il_prev = Some(IlPrev::merged(self.annotations, &prevs));
            self.visit_il_instruction(instruction)?;
        }
        self.il_prev = None;
        Ok(())
    }

    fn visit_il_simple_operation(&mut self, node: &IlSimpleOperation) -> Result<(), Diagnostic> {
        if let Some(param_name) = node.operator.implicit_fb_param() {
            return self.check_implicit_fb_call(param_name, node);
        }
        if let Some(operand) = &node.operand {
            operand.accept(self)?;
        }
        let operand = match &node.operand {
            Some(expr) => IlOperandRef::Expr(expr),
            None => IlOperandRef::None,
        };
        self.check_il_operator(node.operator, node.id, node.span(), operand);
        Ok(())
    }

    fn visit_il_expression(&mut self, node: &IlExpression) -> Result<(), Diagnostic> {
        // First give the parenthesised list a chance to report errors.
        let saved = self.il_prev.take();
        let mut prev: Option<&IlSimpleInstruction> = None;
        for instruction in &node.instructions {
            self.il_prev = Some(match prev {
                None => IlPrev::none(),
                Some(p) => IlPrev::single(self.annotations, p.id),
            });
            self.visit_il_simple_instruction(instruction)?;
            prev = Some(instruction);
        }
        self.il_prev = saved;

        // The parenthesised list is the operand of the operator.
        let operand = IlOperandRef::InnerList(node.instructions.last().map(|i| i.id));
        self.check_il_operator(node.operator, node.id, node.span(), operand);
        Ok(())
    }

    fn visit_il_function_call(&mut self, node: &IlFunctionCall) -> Result<(), Diagnostic> {
        node.operands.accept(self)?;
        let resolved_decl = self
            .annotations
            .called_function(node.id)
            .and_then(|index| self.context.functions.find(&node.name, index));
        let resolved = resolved_decl.is_some();
        let check_decl = resolved_decl.or_else(|| self.context.functions.overloads(&node.name).first());
        let variables = check_decl.map(|decl| decl.variables.clone());
        let params: Vec<ParamAssignmentKind> = node
            .operands
            .iter()
            .map(|operand| {
                ParamAssignmentKind::Positional(PositionalInput {
                    value: operand.clone(),
                })
            })
            .collect();
        self.check_invocation(
            node.span(),
            "function",
            &node.name,
            variables.as_deref(),
            resolved,
            &params,
            true,
        );
        Ok(())
    }

    fn visit_il_formal_function_call(
        &mut self,
        node: &IlFormalFunctionCall,
    ) -> Result<(), Diagnostic> {
        node.params.accept(self)?;
        let resolved_decl = self
            .annotations
            .called_function(node.id)
            .and_then(|index| self.context.functions.find(&node.name, index));
        let resolved = resolved_decl.is_some();
        let check_decl = resolved_decl.or_else(|| self.context.functions.overloads(&node.name).first());
        let variables = check_decl.map(|decl| decl.variables.clone());
        self.check_invocation(
            node.span(),
            "function",
            &node.name,
            variables.as_deref(),
            resolved,
            &node.params,
            false,
        );
        Ok(())
    }

    fn visit_il_fb_call(&mut self, node: &IlFbCall) -> Result<(), Diagnostic> {
        node.operands.accept(self)?;
        node.params.accept(self)?;
        let variables: Option<Vec<VarDecl>> = self
            .scope
            .as_ref()
            .and_then(|scope| scope.fb_type_name(&node.fb_name, &self.context.function_blocks))
            .and_then(|type_name| self.context.function_blocks.find(type_name))
            .map(|decl| decl.variables.clone());
        let resolved = variables.is_some();
        let mut params = node.params.clone();
        for operand in &node.operands {
            params.push(ParamAssignmentKind::Positional(PositionalInput {
                value: operand.clone(),
            }));
        }
        self.check_invocation(
            node.span(),
            "FB",
            &node.fb_name,
            variables.as_deref(),
            resolved,
            &params,
            false,
        );
        match node.operator {
            IlCallOperator::Cal => {}
            IlCallOperator::Calc => {
                self.check_conditional_flow_control("CALC", node.id, node.span())
            }
            IlCallOperator::Calcn => {
                self.check_conditional_flow_control("CALCN", node.id, node.span())
            }
        }
        Ok(())
    }

    fn visit_il_jump_operation(&mut self, node: &IlJumpOperation) -> Result<(), Diagnostic> {
        match node.operator {
            IlJumpOperator::Jmp => {}
            IlJumpOperator::Jmpc => {
                self.check_conditional_flow_control("JMPC", node.id, node.span())
            }
            IlJumpOperator::Jmpcn => {
                self.check_conditional_flow_control("JMPCN", node.id, node.span())
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::AstBuilder;
    use oxplc_dsl::constant::CompareOp;

    fn narrow(annotations: &mut AnnotationMap, id: NodeId, datatype: TypeName) {
        annotations.set_candidates(id, vec![datatype.clone()]);
        annotations.set_datatype(id, datatype);
    }

    fn report_with_level(
        library: &Library,
        annotations: &AnnotationMap,
        level: u8,
    ) -> DatatypeErrorReport {
        let context = SemanticContext::from_library(library);
        apply(library, &context, annotations, level)
    }

    #[test]
    fn apply_when_variable_without_candidates_then_undeclared_error() {
        let mut b = AstBuilder::new();
        let one = b.int("1");
        let one_id = one.node_id();
        let stmt = b.assign("x", one);
        let StmtKind::Assignment(ref assignment) = stmt else {
            unreachable!()
        };
        let target_id = assignment.target.node_id();
        let library = b.program("main", vec![], vec![stmt.clone()]);

        let mut annotations = AnnotationMap::new();
        narrow(&mut annotations, one_id, TypeName::Int);
        // the target variable never received candidates
        let _ = target_id;

        let report = report_with_level(&library, &annotations, 1);
        assert_eq!(report.error_count, 1);
        assert_eq!(
            report.diagnostics[0].primary.message,
            "Variable not declared in this scope."
        );
    }

    #[test]
    fn apply_when_operands_typed_but_expression_not_then_mismatch() {
        let mut b = AstBuilder::new();
        let left = b.int("1");
        let left_id = left.node_id();
        let right = b.real("1.5");
        let right_id = right.node_id();
        let expr = b.binary(Operator::Add, left, right);
        let stmt = b.assign("x", expr);
        let StmtKind::Assignment(ref assignment) = stmt else {
            unreachable!()
        };
        let target_id = assignment.target.node_id();
        let decl = b.var_decl("x", TypeName::Int);
        let library = b.program("main", vec![decl], vec![stmt.clone()]);

        let mut annotations = AnnotationMap::new();
        narrow(&mut annotations, left_id, TypeName::Int);
        narrow(&mut annotations, right_id, TypeName::Real);
        narrow(&mut annotations, target_id, TypeName::Int);

        let report = report_with_level(&library, &annotations, 1);
        assert_eq!(report.error_count, 1);
        assert_eq!(
            report.diagnostics[0].primary.message,
            "Data type mismatch for '+' expression."
        );
    }

    #[test]
    fn apply_when_comparison_mismatch_then_symbol_spelled_out() {
        let mut b = AstBuilder::new();
        let left = b.int("1");
        let left_id = left.node_id();
        let right = b.boolean(true);
        let right_id = right.node_id();
        let expr = b.compare(CompareOp::Ne, left, right);
        let stmt = b.assign("x", expr);
        let StmtKind::Assignment(ref assignment) = stmt else {
            unreachable!()
        };
        let target_id = assignment.target.node_id();
        let library = b.program("main", vec![], vec![stmt.clone()]);

        let mut annotations = AnnotationMap::new();
        narrow(&mut annotations, left_id, TypeName::Int);
        narrow(&mut annotations, right_id, TypeName::Bool);
        narrow(&mut annotations, target_id, TypeName::Bool);

        let report = report_with_level(&library, &annotations, 1);
        assert_eq!(report.error_count, 1);
        assert_eq!(
            report.diagnostics[0].primary.message,
            "Data type mismatch for '<>' expression."
        );
    }

    #[test]
    fn apply_when_literal_not_narrowed_then_gated_by_display_level() {
        let mut b = AstBuilder::new();
        let one = b.int("1");
        let one_id = one.node_id();
        let stmt = b.assign("x", one);
        let StmtKind::Assignment(ref assignment) = stmt else {
            unreachable!()
        };
        let target_id = assignment.target.node_id();
        let library = b.program("main", vec![], vec![stmt.clone()]);

        let mut annotations = AnnotationMap::new();
        annotations.set_candidates(one_id, vec![TypeName::Int, TypeName::Uint]);
        narrow(&mut annotations, target_id, TypeName::Int);

        let quiet = report_with_level(&library, &annotations, 1);
        assert_eq!(quiet.error_count, 0);

        let verbose = report_with_level(&library, &annotations, 4);
        assert_eq!(verbose.error_count, 1);
        assert_eq!(
            verbose.diagnostics[0].primary.message,
            "ANY_INT data type not valid in this location."
        );
    }

    #[test]
    fn apply_when_il_result_never_used_then_warning() {
        let mut b = AstBuilder::new();
        let a = b.var("a");
        let a_id = a.node_id();
        let ld = b.il_simple(IlOperator::Ld, Some(a));
        let c = b.var("c");
        let c_id = c.node_id();
        let add = b.il_simple(IlOperator::Add, Some(c));
        let add_id = add.node_id();
        let i0 = b.il_instruction(0, ld);
        let i1 = b.il_instruction(1, add);
        let decls = vec![b.var_decl("a", TypeName::Int), b.var_decl("c", TypeName::Int)];
        let library = b.program_with_il("main", decls, vec![i0, i1]);

        let mut annotations = AnnotationMap::new();
        narrow(&mut annotations, a_id, TypeName::Int);
        narrow(&mut annotations, c_id, TypeName::Int);
        annotations.set_candidates(add_id, vec![TypeName::Int]);

        let report = report_with_level(&library, &annotations, 1);
        assert_eq!(report.error_count, 0);
        assert_eq!(report.warning_count, 1);
        assert_eq!(
            report.diagnostics[0].primary.message,
            "Result of 'ADD' operation is never used."
        );
    }

    #[test]
    fn apply_when_jmpc_not_preceded_by_bool_then_error() {
        let mut b = AstBuilder::new();
        let a = b.var("a");
        let a_id = a.node_id();
        let ld = b.il_simple(IlOperator::Ld, Some(a));
        let jump = IlOperationKind::Jump(IlJumpOperation {
            id: b.next_id(),
            operator: IlJumpOperator::Jmpc,
            label: Id::from("again"),
            span: SourceSpan::default(),
        });
        let i0 = b.il_instruction(0, ld);
        let i1 = b.il_instruction(1, jump);
        let decl = b.var_decl("a", TypeName::Int);
        let library = b.program_with_il("main", vec![decl], vec![i0, i1]);

        let mut annotations = AnnotationMap::new();
        narrow(&mut annotations, a_id, TypeName::Int);
        // the jump operation itself was never narrowed to BOOL

        let report = report_with_level(&library, &annotations, 1);
        assert_eq!(report.error_count, 1);
        assert_eq!(
            report.diagnostics[0].primary.message,
            "JMPC operator must be preceded by an IL instruction producing a BOOL value."
        );
    }

    #[test]
    fn apply_when_implicit_fb_operator_missing_operand_then_error() {
        let mut b = AstBuilder::new();
        let s1 = b.il_simple(IlOperator::S1, None);
        let i0 = b.il_instruction(0, s1);
        let library = b.program_with_il("main", vec![], vec![i0]);

        let annotations = AnnotationMap::new();
        let report = report_with_level(&library, &annotations, 1);
        assert_eq!(report.error_count, 1);
        assert_eq!(
            report.diagnostics[0].primary.message,
            "Missing operand for FB call operator 'S1'."
        );
    }

    #[test]
    fn apply_when_implicit_fb_operand_not_instance_then_error() {
        let mut b = AstBuilder::new();
        let one = b.int("1");
        let one_id = one.node_id();
        let ld = b.il_simple(IlOperator::Ld, Some(one));
        let x = b.var("x");
        let x_id = x.node_id();
        let clk = b.il_simple(IlOperator::Clk, Some(x));
        let i0 = b.il_instruction(0, ld);
        let i1 = b.il_instruction(1, clk);
        let decl = b.var_decl("x", TypeName::Bool);
        let library = b.program_with_il("main", vec![decl], vec![i0, i1]);

        let mut annotations = AnnotationMap::new();
        narrow(&mut annotations, one_id, TypeName::Bool);
        narrow(&mut annotations, x_id, TypeName::Bool);

        let report = report_with_level(&library, &annotations, 1);
        assert_eq!(report.error_count, 1);
        assert_eq!(
            report.diagnostics[0].primary.message,
            "Invalid FB call: operand is not a FB instance."
        );
    }

    #[test]
    fn apply_when_duplicate_fb_parameter_then_errors() {
        let mut b = AstBuilder::new();
        let fb_decl = FunctionBlockDeclaration {
            id: b.next_id(),
            name: Id::from("RS"),
            variables: vec![b
                .var_decl("S1", TypeName::Bool)
                .with_var_type(VariableType::Input)],
            body: PouBody::Statements(Statements::default()),
            span: SourceSpan::default(),
        };
        let first = b.var("a");
        let first_id = first.node_id();
        let second = b.var("c");
        let second_id = second.node_id();
        let call = StmtKind::FbCall(FbCall {
            id: b.next_id(),
            var_name: Id::from("latch"),
            params: vec![
                ParamAssignmentKind::NamedInput(NamedInput {
                    name: Id::from("S1"),
                    value: first,
                }),
                ParamAssignmentKind::NamedInput(NamedInput {
                    name: Id::from("S1"),
                    value: second,
                }),
            ],
            position: SourceSpan::default(),
        });
        let decls = vec![
            b.var_decl("latch", TypeName::Derived(Id::from("RS"))),
            b.var_decl("a", TypeName::Bool),
            b.var_decl("c", TypeName::Bool),
        ];
        let mut library = b.program("main", decls, vec![call]);
        library
            .elements
            .insert(0, LibraryElementKind::FunctionBlockDeclaration(fb_decl));

        let mut annotations = AnnotationMap::new();
        narrow(&mut annotations, first_id, TypeName::Bool);
        narrow(&mut annotations, second_id, TypeName::Bool);

        let report = report_with_level(&library, &annotations, 2);
        assert_eq!(report.error_count, 2);
        assert_eq!(
            report.diagnostics[0].primary.message,
            "Duplicate parameter 'S1' when invoking FB 'latch'"
        );
        assert_eq!(
            report.diagnostics[1].primary.message,
            "Invalid parameters when invoking FB 'latch'"
        );
    }

    #[test]
    fn apply_when_unresolved_overload_then_error() {
        let mut b = AstBuilder::new();
        let arg = b.var("a");
        let arg_id = arg.node_id();
        let call = ExprKind::Function(Box::new(FunctionCall {
            id: b.next_id(),
            name: Id::from("TRUNC"),
            params: vec![ParamAssignmentKind::Positional(PositionalInput {
                value: arg,
            })],
            span: SourceSpan::default(),
        }));
        let call_id = call.node_id();
        let stmt = b.assign("x", call);
        let StmtKind::Assignment(ref assignment) = stmt else {
            unreachable!()
        };
        let target_id = assignment.target.node_id();
        let decls = vec![b.var_decl("a", TypeName::Real), b.var_decl("x", TypeName::Int)];
        let library = b.program("main", decls, vec![stmt.clone()]);

        let mut annotations = AnnotationMap::new();
        narrow(&mut annotations, arg_id, TypeName::Real);
        narrow(&mut annotations, target_id, TypeName::Int);
        narrow(&mut annotations, call_id, TypeName::Int);
        // no called_function annotation: narrowing could not choose

        let report = report_with_level(&library, &annotations, 1);
        assert_eq!(report.error_count, 1);
        assert_eq!(
            report.diagnostics[0].primary.message,
            "Unable to resolve which overloaded function 'TRUNC' is being invoked."
        );
    }
}
