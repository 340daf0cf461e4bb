//! Constant folding and intraprocedural constant propagation.
//!
//! Determines the value of all expressions in which only constant values
//! are used, and records the result in the annotation map. For example
//! `2 + 3` is annotated with the constant `5`, and `22.2 - 5.0` with the
//! constant `17.2`.
//!
//! Because the same source text may be interpreted in several data type
//! families, every node receives up to four parallel results (see
//! [ConstValue]). Overflows are recorded in the affected interpretation
//! and are not reported here: whether an overflow matters depends on the
//! data type chosen by a later pass.
//!
//! On top of folding, a value environment maps variable names to their
//! known constant values within one POU body, so that reads of variables
//! with known values fold too. At control-flow joins the environments of
//! the incoming paths are merged with the meet of the constant lattice.
use std::collections::HashMap;

use log::debug;
use oxplc_dsl::analysis::AnnotationMap;
use oxplc_dsl::common::{DeclarationQualifier, Library, VarDecl, VariableType};
use oxplc_dsl::constant::{ConstValue, Slot};
use oxplc_dsl::core::Id;
use oxplc_dsl::diagnostic::Diagnostic;
use oxplc_dsl::textual::*;
use oxplc_dsl::visitor::{visit_stmt_kind, Acceptor, Visitor};

use crate::result::SemanticResult;

/// Runs constant folding and propagation over the whole library,
/// filling in the constant value annotation of every expression node.
pub fn apply(library: &Library, annotations: &mut AnnotationMap) -> SemanticResult {
    debug!("folding constants");
    let mut folder = ConstantFolder::new(annotations);
    folder.walk(library).map_err(|diagnostic| vec![diagnostic])
}

/// Folds the initializer of a global variable declaration and records
/// the resulting constant on both the global declaration and the
/// external declaration that imports it.
///
/// Called by the declaration checking collaborator, which knows the
/// pairing of `VAR_EXTERNAL` declarations to their `VAR_GLOBAL`
/// counterparts. Must run before [apply] so that the external
/// declaration sites carry their values when POU bodies are folded.
pub fn resolve_extern_global(
    annotations: &mut AnnotationMap,
    extern_decl: &VarDecl,
    global_decl: &VarDecl,
) -> SemanticResult {
    // A declaration without an initial value is probably of a FB data
    // type; there is nothing to bind.
    let Some(init) = &global_decl.initializer else {
        return Ok(());
    };
    {
        let mut folder = ConstantFolder::new(annotations);
        init.accept(&mut folder).map_err(|d: Diagnostic| vec![d])?;
    }
    let value = annotations.const_value_or_default(init.node_id());
    annotations.set_const_value(extern_decl.id, value.clone());
    annotations.set_const_value(global_decl.id, value);
    Ok(())
}

type ValueEnv = HashMap<Id, ConstValue>;

/// Merges the value environments of two control-flow paths. Names known
/// on both paths meet in the constant lattice; names known only on the
/// first path keep their value.
fn join_values(left: ValueEnv, right: &ValueEnv) -> ValueEnv {
    let mut result = ValueEnv::new();
    for (name, value) in left {
        let merged = match right.get(&name) {
            Some(other) => ConstValue::meet(&value, other),
            None => value,
        };
        result.insert(name, merged);
    }
    result
}

pub struct ConstantFolder<'a> {
    annotations: &'a mut AnnotationMap,
    /// The value environment of the POU body currently being folded.
    values: ValueEnv,
    /// Whether the POU being visited is a function.
    function_pou: bool,
    /// The accumulator value before the IL operation currently being
    /// folded. None at the head of an instruction sequence.
    prev_value: Option<ConstValue>,
}

impl<'a> ConstantFolder<'a> {
    pub fn new(annotations: &'a mut AnnotationMap) -> Self {
        Self {
            annotations,
            values: ValueEnv::new(),
            function_pou: false,
            prev_value: None,
        }
    }

    /// The value environment. Only meaningful while a POU body is being
    /// visited; exposed for tests of the propagation behavior.
    pub fn values(&self) -> &HashMap<Id, ConstValue> {
        &self.values
    }

    fn value_of(&self, expr: &ExprKind) -> ConstValue {
        self.annotations.const_value_or_default(expr.node_id())
    }

    /// Whether the initial value of this declaration remains the value
    /// of the variable throughout the POU body.
    fn is_fixed_init(&self, decl: &VarDecl) -> bool {
        match decl.var_type {
            VariableType::Var => {
                self.function_pou || decl.qualifier == DeclarationQualifier::Constant
            }
            VariableType::VarTemp => true,
            VariableType::Output => {
                self.function_pou && decl.qualifier != DeclarationQualifier::Retain
            }
            VariableType::External => decl.qualifier == DeclarationQualifier::Constant,
            VariableType::Input | VariableType::InOut | VariableType::Global => false,
        }
    }

    /// Folds a chain of guarded branches (IF/ELSIF/ELSE) with dead
    /// branch pruning, and adopts the meet of the surviving branch
    /// environments.
    fn fold_branch_chain(
        &mut self,
        branches: &[(Option<&ExprKind>, &[StmtKind])],
    ) -> Result<(), Diagnostic> {
        let incoming = self.values.clone();
        let mut results: Vec<ValueEnv> = vec![];
        for (guard, body) in branches {
            self.values = incoming.clone();
            let mut always_taken = true;
            if let Some(expr) = guard {
                expr.accept(self)?;
                match self.value_of(expr).boolean {
                    // This branch can never execute.
                    Slot::Valid(false) => continue,
                    Slot::Valid(true) => {}
                    _ => always_taken = false,
                }
            }
            for stmt in *body {
                visit_stmt_kind(self, stmt)?;
            }
            results.push(self.values.clone());
            if always_taken {
                // Later branches are unreachable.
                break;
            }
        }
        let mut merged = results
            .pop()
            .expect("the unguarded final branch always yields a result");
        for env in results {
            merged = join_values(merged, &env);
        }
        self.values = merged;
        Ok(())
    }

    /// The result the accumulator holds after executing an IL operator,
    /// given the operand's value (when the operator takes one).
    fn fold_il_operator(&self, operator: IlOperator, operand: Option<&ConstValue>) -> ConstValue {
        fn both(
            a: Option<&ConstValue>,
            b: Option<&ConstValue>,
            f: impl FnOnce(&ConstValue, &ConstValue) -> ConstValue,
        ) -> ConstValue {
            match (a, b) {
                (Some(x), Some(y)) => f(x, y),
                _ => ConstValue::new(),
            }
        }

        let prev = self.prev_value.as_ref();
        match operator {
            IlOperator::Ld => operand.cloned().unwrap_or_default(),
            IlOperator::Ldn => operand.map(ConstValue::not).unwrap_or_default(),
            // Store, set/reset and the implicit FB invocations leave the
            // accumulator unchanged, as do returns.
            IlOperator::St
            | IlOperator::Stn
            | IlOperator::S
            | IlOperator::R
            | IlOperator::S1
            | IlOperator::R1
            | IlOperator::Clk
            | IlOperator::Cu
            | IlOperator::Cd
            | IlOperator::Pv
            | IlOperator::In
            | IlOperator::Pt
            | IlOperator::Ret
            | IlOperator::Retc
            | IlOperator::Retcn => prev.cloned().unwrap_or_default(),
            IlOperator::Not => prev.map(ConstValue::not).unwrap_or_default(),
            IlOperator::And => both(prev, operand, ConstValue::and),
            IlOperator::Or => both(prev, operand, ConstValue::or),
            IlOperator::Xor => both(prev, operand, ConstValue::xor),
            IlOperator::Andn => ConstValue::not(&both(prev, operand, ConstValue::and)),
            IlOperator::Orn => ConstValue::not(&both(prev, operand, ConstValue::or)),
            IlOperator::Xorn => ConstValue::not(&both(prev, operand, ConstValue::xor)),
            IlOperator::Add => both(prev, operand, ConstValue::add),
            IlOperator::Sub => both(prev, operand, ConstValue::sub),
            IlOperator::Mul => both(prev, operand, ConstValue::mul),
            IlOperator::Div => both(prev, operand, ConstValue::div),
            IlOperator::Mod => both(prev, operand, ConstValue::modulo),
            IlOperator::Gt
            | IlOperator::Ge
            | IlOperator::Eq
            | IlOperator::Lt
            | IlOperator::Le
            | IlOperator::Ne => {
                let op = operator
                    .compare_op()
                    .expect("comparison operators map to a compare op");
                both(prev, operand, |a, b| ConstValue::compare(a, b, op))
            }
        }
    }
}

impl Visitor<Diagnostic> for ConstantFolder<'_> {
    type Value = ();

    // Literals

    fn visit_integer_literal(&mut self, node: &oxplc_dsl::common::IntegerLiteral) -> Result<(), Diagnostic> {
        let digits: String = node.value.chars().filter(|c| *c != '_').collect();
        let radix = node.base.radix();
        // Each family parses independently; a failure means the
        // magnitude exceeds that family's 64-bit range.
        let unsigned = u64::from_str_radix(&digits, radix).ok();
        let signed = i64::from_str_radix(&digits, radix).ok();

        let mut value = ConstValue::new();
        if node.is_neg {
            value.uint64 = match unsigned {
                Some(0) => Slot::Valid(0),
                _ => Slot::Overflow,
            };
            value.int64 = match signed {
                Some(v) => Slot::Valid(-v),
                None => Slot::Overflow,
            };
            // The magnitude of the minimum signed value only fits the
            // unsigned parse, so the literal would otherwise be
            // unwritable.
            if unsigned == Some(1u64 << 63) {
                value.int64 = Slot::Valid(i64::MIN);
            }
        } else {
            value.uint64 = unsigned.map_or(Slot::Overflow, Slot::Valid);
            value.int64 = signed.map_or(Slot::Overflow, Slot::Valid);
        }
        self.annotations.set_const_value(node.id, value);
        Ok(())
    }

    fn visit_real_literal(&mut self, node: &oxplc_dsl::common::RealLiteral) -> Result<(), Diagnostic> {
        let digits: String = node.value.chars().filter(|c| *c != '_').collect();
        if let Ok(parsed) = digits.parse::<f64>() {
            let parsed = if node.is_neg { -parsed } else { parsed };
            let mut value = ConstValue::new();
            value.real64 = if parsed.is_finite() {
                Slot::Valid(parsed)
            } else {
                Slot::Overflow
            };
            self.annotations.set_const_value(node.id, value);
        }
        Ok(())
    }

    fn visit_bool_literal(&mut self, node: &oxplc_dsl::common::BoolLiteral) -> Result<(), Diagnostic> {
        self.annotations
            .set_const_value(node.id, ConstValue::of_bool(node.value));
        Ok(())
    }

    // Variables

    fn visit_named_variable(&mut self, node: &NamedVariable) -> Result<(), Diagnostic> {
        if let Some(value) = self.values.get(&node.name) {
            self.annotations.set_const_value(node.id, value.clone());
        }
        Ok(())
    }

    // Declarations

    fn visit_var_decl(&mut self, node: &VarDecl) -> Result<(), Diagnostic> {
        let fixed = self.is_fixed_init(node);

        if node.var_type == VariableType::External {
            // The value was recorded by resolve_extern_global from the
            // paired global declaration.
            let value = self.annotations.const_value_or_default(node.id);
            if fixed {
                self.values.insert(node.identifier.clone(), value);
                return Ok(());
            }
        } else if let Some(init) = &node.initializer {
            init.accept(self)?;
            let value = self.value_of(init);
            self.annotations.set_const_value(node.id, value.clone());
            if fixed {
                self.values.insert(node.identifier.clone(), value);
                return Ok(());
            }
        }

        if !fixed {
            // The variable exists at run time but its value cannot be
            // assumed from the initializer.
            self.values
                .insert(node.identifier.clone(), ConstValue::all_non_const());
        }
        Ok(())
    }

    // Program organization units. Each body folds with a fresh value
    // environment.

    fn visit_function_declaration(
        &mut self,
        node: &oxplc_dsl::common::FunctionDeclaration,
    ) -> Result<(), Diagnostic> {
        self.values.clear();
        self.function_pou = true;
        node.variables.accept(self)?;
        self.function_pou = false;
        node.body.accept(self)
    }

    fn visit_function_block_declaration(
        &mut self,
        node: &oxplc_dsl::common::FunctionBlockDeclaration,
    ) -> Result<(), Diagnostic> {
        self.values.clear();
        self.function_pou = false;
        node.variables.accept(self)?;
        node.body.accept(self)
    }

    fn visit_program_declaration(
        &mut self,
        node: &oxplc_dsl::common::ProgramDeclaration,
    ) -> Result<(), Diagnostic> {
        self.values.clear();
        self.function_pou = false;
        node.variables.accept(self)?;
        node.body.accept(self)
    }

    // Expressions

    fn visit_binary_expr(&mut self, node: &BinaryExpr) -> Result<(), Diagnostic> {
        node.left.accept(self)?;
        node.right.accept(self)?;
        let left = self.value_of(&node.left);
        let right = self.value_of(&node.right);
        let result = match node.op {
            Operator::Add => ConstValue::add(&left, &right),
            Operator::Sub => ConstValue::sub(&left, &right),
            Operator::Mul => ConstValue::mul(&left, &right),
            Operator::Div => ConstValue::div(&left, &right),
            Operator::Mod => ConstValue::modulo(&left, &right),
            Operator::Pow => ConstValue::power(&left, &right),
            Operator::And => ConstValue::and(&left, &right),
            Operator::Or => ConstValue::or(&left, &right),
            Operator::Xor => ConstValue::xor(&left, &right),
        };
        self.annotations.set_const_value(node.id, result);
        Ok(())
    }

    fn visit_compare_expr(&mut self, node: &CompareExpr) -> Result<(), Diagnostic> {
        node.left.accept(self)?;
        node.right.accept(self)?;
        let left = self.value_of(&node.left);
        let right = self.value_of(&node.right);
        let result = ConstValue::compare(&left, &right, node.op);
        self.annotations.set_const_value(node.id, result);
        Ok(())
    }

    fn visit_unary_expr(&mut self, node: &UnaryExpr) -> Result<(), Diagnostic> {
        node.term.accept(self)?;
        let term = self.value_of(&node.term);
        let result = match node.op {
            UnaryOp::Neg => ConstValue::neg(&term),
            UnaryOp::Not => ConstValue::not(&term),
        };
        self.annotations.set_const_value(node.id, result);
        Ok(())
    }

    // Statements

    fn visit_assignment(&mut self, node: &Assignment) -> Result<(), Diagnostic> {
        node.value.accept(self)?;
        // The lvalue may contain array subscripts worth folding.
        node.target.accept(self)?;
        let value = self.value_of(&node.value);
        self.annotations
            .set_const_value(node.target.node_id(), value.clone());
        if let Some(name) = node.target.base_name() {
            self.values.insert(name.clone(), value);
        }
        Ok(())
    }

    fn visit_if(&mut self, node: &If) -> Result<(), Diagnostic> {
        let mut branches: Vec<(Option<&ExprKind>, &[StmtKind])> =
            vec![(Some(&node.expr), node.body.as_slice())];
        for else_if in &node.else_ifs {
            branches.push((Some(&else_if.expr), else_if.body.as_slice()));
        }
        branches.push((None, node.else_body.as_slice()));
        self.fold_branch_chain(&branches)
    }

    fn visit_case(&mut self, node: &Case) -> Result<(), Diagnostic> {
        node.selector.accept(self)?;
        let incoming = self.values.clone();
        let mut results: Vec<ValueEnv> = vec![];
        for group in &node.groups {
            self.values = incoming.clone();
            group.selectors.accept(self)?;
            group.body.accept(self)?;
            results.push(self.values.clone());
        }
        // The ELSE branch also covers falling through when no group
        // matches.
        self.values = incoming;
        node.else_body.accept(self)?;
        let mut merged = self.values.clone();
        for env in results {
            merged = join_values(merged, &env);
        }
        self.values = merged;
        Ok(())
    }

    fn visit_for(&mut self, node: &For) -> Result<(), Diagnostic> {
        let incoming = self.values.clone();
        node.from.accept(self)?;
        node.to.accept(self)?;
        // The control variable takes many values inside the body.
        self.values
            .entry(node.control.name.clone())
            .or_default()
            .int64 = Slot::NonConst;

        let from = self.value_of(&node.from).int64;
        let to = self.value_of(&node.to).int64;
        if let Some(by) = &node.by {
            by.accept(self)?;
            let step = self.value_of(by).int64;
            if let (Slot::Valid(step), Slot::Valid(from), Slot::Valid(to)) = (step, from, to) {
                // Statically empty ranges leave the body dead.
                if (step > 0 && from > to) || (step < 0 && from < to) {
                    return Ok(());
                }
            }
        } else if let (Slot::Valid(from), Slot::Valid(to)) = (from, to) {
            if from > to {
                return Ok(());
            }
        }

        node.body.accept(self)?;
        self.values = join_values(self.values.clone(), &incoming);
        Ok(())
    }

    fn visit_while(&mut self, node: &While) -> Result<(), Diagnostic> {
        node.condition.accept(self)?;
        if self.value_of(&node.condition).boolean == Slot::Valid(false) {
            // The body never executes.
            return Ok(());
        }
        // One-iteration approximation: the body is folded once and its
        // result met with the entry state. This is conservative, not a
        // fixed point.
        let incoming = self.values.clone();
        node.body.accept(self)?;
        self.values = join_values(self.values.clone(), &incoming);
        Ok(())
    }

    fn visit_repeat(&mut self, node: &Repeat) -> Result<(), Diagnostic> {
        let incoming = self.values.clone();
        node.body.accept(self)?;
        node.until.accept(self)?;
        if self.value_of(&node.until).boolean == Slot::Valid(true) {
            // The body executes exactly once.
            return Ok(());
        }
        self.values = join_values(self.values.clone(), &incoming);
        Ok(())
    }

    // Instruction list

    fn visit_instruction_list(&mut self, node: &InstructionList) -> Result<(), Diagnostic> {
        for instruction in &node.instructions {
            // The instruction starts from the slot-wise intersection of
            // the accumulator values its predecessors produced. A
            // predecessor later in the list (a backward jump) has not
            // been folded yet and conservatively reads as undefined.
            let prev_values: Vec<ConstValue> = instruction
                .prev
                .iter()
                .filter_map(|index| node.instructions.get(*index))
                .map(|prev| self.annotations.const_value_or_default(prev.id))
                .collect();
            self.prev_value = if prev_values.is_empty() {
                None
            } else {
                let refs: Vec<&ConstValue> = prev_values.iter().collect();
                Some(ConstValue::intersect_all(&refs))
            };
            self.visit_il_instruction(instruction)?;
        }
        self.prev_value = None;
        Ok(())
    }

    fn visit_il_instruction(&mut self, node: &IlInstruction) -> Result<(), Diagnostic> {
        match &node.operation {
            None => {
                // A bare label does not change the accumulator.
                let value = self.prev_value.clone().unwrap_or_default();
                self.annotations.set_const_value(node.id, value);
            }
            Some(operation) => {
                operation.accept(self)?;
                let value = self.annotations.const_value_or_default(operation.node_id());
                self.annotations.set_const_value(node.id, value);
            }
        }
        Ok(())
    }

    fn visit_il_simple_operation(&mut self, node: &IlSimpleOperation) -> Result<(), Diagnostic> {
        if let Some(operand) = &node.operand {
            operand.accept(self)?;
        }
        let operand_value = node.operand.as_ref().map(|operand| self.value_of(operand));
        let result = self.fold_il_operator(node.operator, operand_value.as_ref());
        self.annotations.set_const_value(node.id, result);
        Ok(())
    }

    fn visit_il_expression(&mut self, node: &IlExpression) -> Result<(), Diagnostic> {
        // The parenthesised list evaluates with a fresh accumulator;
        // control flow inside it is linear.
        let saved = self.prev_value.take();
        let mut inner_prev: Option<ConstValue> = None;
        for instruction in &node.instructions {
            self.prev_value = inner_prev.take();
            self.visit_il_simple_instruction(instruction)?;
            inner_prev = Some(self.annotations.const_value_or_default(instruction.id));
        }
        let list_result = inner_prev;
        self.prev_value = saved;

        let result = self.fold_il_operator(node.operator, list_result.as_ref());
        self.annotations.set_const_value(node.id, result);

        // When an operand is written after the parenthesis the parser
        // rewrote it into an LD at the head of the list; mirror that
        // instruction's value back onto the operand node.
        if let (Some(operand), Some(first)) = (&node.operand, node.instructions.first()) {
            let value = self.annotations.const_value_or_default(first.id);
            self.annotations.set_const_value(operand.node_id(), value);
        }
        Ok(())
    }

    fn visit_il_simple_instruction(&mut self, node: &IlSimpleInstruction) -> Result<(), Diagnostic> {
        self.visit_il_simple_operation_kind(&node.operation)?;
        let value = self
            .annotations
            .const_value_or_default(node.operation.node_id());
        self.annotations.set_const_value(node.id, value);
        Ok(())
    }

    fn visit_il_fb_call(&mut self, node: &IlFbCall) -> Result<(), Diagnostic> {
        node.operands.accept(self)?;
        node.params.accept(self)?;
        // FB calls leave the accumulator unchanged.
        let value = self.prev_value.clone().unwrap_or_default();
        self.annotations.set_const_value(node.id, value);
        Ok(())
    }

    fn visit_il_jump_operation(&mut self, node: &IlJumpOperation) -> Result<(), Diagnostic> {
        let value = self.prev_value.clone().unwrap_or_default();
        self.annotations.set_const_value(node.id, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::AstBuilder;
    use oxplc_dsl::common::TypeName;

    fn fold(library: &Library) -> AnnotationMap {
        let mut annotations = AnnotationMap::new();
        apply(library, &mut annotations).unwrap();
        annotations
    }

    #[test]
    fn apply_when_constant_initializer_then_decl_and_expr_folded() {
        let mut b = AstBuilder::new();
        let two = b.int("2");
        let three = b.int("3");
        let init = b.binary(Operator::Add, two, three);
        let init_id = init.node_id();
        let decl = b
            .var_decl("a", TypeName::Int)
            .with_qualifier(DeclarationQualifier::Constant)
            .with_initializer(init);
        let decl_id = decl.id;
        let library = b.program("main", vec![decl], vec![]);

        let annotations = fold(&library);
        let expr = annotations.const_value(init_id).unwrap();
        assert_eq!(expr.int64, Slot::Valid(5));
        assert_eq!(expr.uint64, Slot::Valid(5));
        let decl = annotations.const_value(decl_id).unwrap();
        assert_eq!(decl.int64, Slot::Valid(5));
        assert_eq!(decl.uint64, Slot::Valid(5));
    }

    #[test]
    fn apply_when_variable_not_fixed_then_sums_non_const() {
        let mut b = AstBuilder::new();
        let a1 = b.var("a");
        let one = b.int("1");
        let sum1 = b.binary(Operator::Add, a1, one);
        let sum1_id = sum1.node_id();
        let a2 = b.var("a");
        let two = b.int("2");
        let sum2 = b.binary(Operator::Add, a2, two);
        let sum2_id = sum2.node_id();
        let stmt1 = b.assign("b", sum1);
        let stmt2 = b.assign("b", sum2);
        let decl_a = b.var_decl("a", TypeName::Uint);
        let decl_b = b.var_decl("b", TypeName::Uint);
        let library = b.program("main", vec![decl_a, decl_b], vec![stmt1, stmt2]);

        let mut annotations = AnnotationMap::new();
        let mut folder = ConstantFolder::new(&mut annotations);
        folder.walk(&library).unwrap();
        assert_eq!(
            folder.values()[&Id::from("a")].uint64,
            Slot::NonConst
        );
        assert_eq!(annotations.const_value(sum1_id).unwrap().uint64, Slot::NonConst);
        assert_eq!(annotations.const_value(sum2_id).unwrap().uint64, Slot::NonConst);
    }

    #[test]
    fn apply_when_real_subtraction_then_real_slot_only() {
        let mut b = AstBuilder::new();
        let left = b.real("22.2");
        let right = b.real("5.0");
        let expr = b.binary(Operator::Sub, left, right);
        let expr_id = expr.node_id();
        let stmt = b.assign("x", expr);
        let decl = b.var_decl("x", TypeName::Lreal);
        let library = b.program("main", vec![decl], vec![stmt]);

        let annotations = fold(&library);
        let value = annotations.const_value(expr_id).unwrap();
        match value.real64 {
            Slot::Valid(v) => assert!((v - 17.2).abs() < 1e-9),
            other => panic!("expected valid real, got {other:?}"),
        }
        assert_eq!(value.int64, Slot::Undefined);
        assert_eq!(value.uint64, Slot::Undefined);
    }

    #[test]
    fn apply_when_uint64_max_plus_one_then_overflow() {
        let mut b = AstBuilder::new();
        let left = b.int("18446744073709551615");
        let one = b.int("1");
        let expr = b.binary(Operator::Add, left, one);
        let expr_id = expr.node_id();
        let stmt = b.assign("x", expr);
        let decl = b.var_decl("x", TypeName::Ulint);
        let library = b.program("main", vec![decl], vec![stmt]);

        let annotations = fold(&library);
        let value = annotations.const_value(expr_id).unwrap();
        assert_eq!(value.uint64, Slot::Overflow);
        assert_eq!(value.int64, Slot::Overflow);
    }

    #[test]
    fn apply_when_minimum_signed_literal_then_valid_int64_min() {
        let mut b = AstBuilder::new();
        let literal = b.neg_int("9223372036854775808");
        let literal_id = literal.node_id();
        let stmt = b.assign("x", literal);
        let decl = b.var_decl("x", TypeName::Lint);
        let library = b.program("main", vec![decl], vec![stmt]);

        let annotations = fold(&library);
        let value = annotations.const_value(literal_id).unwrap();
        assert_eq!(value.int64, Slot::Valid(i64::MIN));
        assert_eq!(value.uint64, Slot::Overflow);
    }

    #[test]
    fn apply_when_condition_statically_true_then_only_taken_branch_counts() {
        let mut b = AstBuilder::new();
        let cond = b.boolean(true);
        let one = b.int("1");
        let two = b.int("2");
        let then_branch = b.assign("x", one);
        let else_branch = b.assign("x", two);
        let stmt = b.if_else(cond, vec![then_branch], vec![else_branch]);
        let decl = b.var_decl("x", TypeName::Int);
        let library = b.program("main", vec![decl], vec![stmt]);

        let mut annotations = AnnotationMap::new();
        let mut folder = ConstantFolder::new(&mut annotations);
        folder.walk(&library).unwrap();
        assert_eq!(folder.values()[&Id::from("x")].int64, Slot::Valid(1));
    }

    #[test]
    fn apply_when_assigned_in_one_branch_then_read_non_const() {
        let mut b = AstBuilder::new();
        let five = b.int("5");
        let first = b.assign("x", five);
        let cond = b.var("cond");
        let six = b.int("6");
        let then_branch = b.assign("x", six);
        let conditional = b.if_else(cond, vec![then_branch], vec![]);
        let x = b.var("x");
        let x_id = x.node_id();
        let last = b.assign("y", x);
        let decls = vec![
            b.var_decl("cond", TypeName::Bool),
            b.var_decl("x", TypeName::Int),
            b.var_decl("y", TypeName::Int),
        ];
        let library = b.program("main", decls, vec![first, conditional, last]);

        let annotations = fold(&library);
        assert_eq!(annotations.const_value(x_id).unwrap().int64, Slot::NonConst);
    }

    #[test]
    fn apply_when_straight_line_propagation_then_read_folds() {
        let mut b = AstBuilder::new();
        let five = b.int("5");
        let first = b.assign("x", five);
        let x = b.var("x");
        let x_id = x.node_id();
        let last = b.assign("y", x);
        let decls = vec![b.var_decl("x", TypeName::Int), b.var_decl("y", TypeName::Int)];
        let library = b.program("main", decls, vec![first, last]);

        let annotations = fold(&library);
        assert_eq!(annotations.const_value(x_id).unwrap().int64, Slot::Valid(5));
    }

    #[test]
    fn apply_when_while_condition_false_then_body_dead() {
        let mut b = AstBuilder::new();
        let five = b.int("5");
        let first = b.assign("x", five);
        let cond = b.boolean(false);
        let seven = b.int("7");
        let inner = b.assign("x", seven);
        let loop_stmt = StmtKind::While(While {
            id: b.next_id(),
            condition: cond,
            body: vec![inner],
            span: Default::default(),
        });
        let decl = b.var_decl("x", TypeName::Int);
        let library = b.program("main", vec![decl], vec![first, loop_stmt]);

        let mut annotations = AnnotationMap::new();
        let mut folder = ConstantFolder::new(&mut annotations);
        folder.walk(&library).unwrap();
        assert_eq!(folder.values()[&Id::from("x")].int64, Slot::Valid(5));
    }

    #[test]
    fn apply_when_for_loop_then_control_variable_non_const() {
        let mut b = AstBuilder::new();
        let from = b.int("1");
        let to = b.int("10");
        let loop_stmt = StmtKind::For(For {
            id: b.next_id(),
            control: NamedVariable {
                id: b.next_id(),
                name: Id::from("i"),
            },
            from,
            to,
            by: None,
            body: vec![],
            span: Default::default(),
        });
        let decl = b.var_decl("i", TypeName::Int);
        let library = b.program("main", vec![decl], vec![loop_stmt]);

        let mut annotations = AnnotationMap::new();
        let mut folder = ConstantFolder::new(&mut annotations);
        folder.walk(&library).unwrap();
        assert_eq!(folder.values()[&Id::from("i")].int64, Slot::NonConst);
    }

    #[test]
    fn apply_when_il_parenthesis_then_accumulator_folds_through() {
        let mut b = AstBuilder::new();
        let one = b.int("1");
        let ld = b.il_simple(IlOperator::Ld, Some(one));
        let zero = b.int("0");
        let inner_ld = b.il_inner(IlOperator::Ld, Some(zero));
        let inner_one = b.int("1");
        let inner_or = b.il_inner(IlOperator::Or, Some(inner_one));
        let and_expr = b.il_expression(IlOperator::And, vec![inner_ld, inner_or]);
        let v = b.var("v");
        let st = b.il_simple(IlOperator::St, Some(v));

        let i0 = b.il_instruction(0, ld);
        let i1 = b.il_instruction(1, and_expr);
        let i2 = b.il_instruction(2, st);
        let st_id = i2.id;
        let decl = b.var_decl("v", TypeName::Word);
        let library = b.program_with_il("main", vec![decl], vec![i0, i1, i2]);

        let annotations = fold(&library);
        // 1 AND (0 OR 1) = 1 in the bit string interpretation
        let value = annotations.const_value(st_id).unwrap();
        assert_eq!(value.uint64, Slot::Valid(1));
    }

    #[test]
    fn apply_when_il_instructions_disagree_at_label_then_non_const() {
        let mut b = AstBuilder::new();
        let one = b.int("1");
        let two = b.int("2");
        let ld1 = b.il_simple(IlOperator::Ld, Some(one));
        let ld2 = b.il_simple(IlOperator::Ld, Some(two));
        let i0 = b.il_instruction(0, ld1);
        let i1 = b.il_instruction(1, ld2);
        // a labelled empty instruction reached from both loads
        let merge = IlInstruction {
            id: b.next_id(),
            label: Some(Id::from("merge")),
            operation: None,
            prev: vec![0, 1],
            span: Default::default(),
        };
        let merge_id = merge.id;
        let library = b.program_with_il("main", vec![], vec![i0, i1, merge]);

        let annotations = fold(&library);
        let value = annotations.const_value(merge_id).unwrap();
        assert_eq!(value.int64, Slot::NonConst);
        assert_eq!(value.uint64, Slot::NonConst);
    }

    #[test]
    fn resolve_extern_global_when_initializer_then_both_decls_annotated() {
        let mut b = AstBuilder::new();
        let init = b.int("40");
        let global = b
            .var_decl("limit", TypeName::Int)
            .with_var_type(VariableType::Global)
            .with_qualifier(DeclarationQualifier::Constant)
            .with_initializer(init);
        let external = b
            .var_decl("limit", TypeName::Int)
            .with_var_type(VariableType::External)
            .with_qualifier(DeclarationQualifier::Constant);

        let mut annotations = AnnotationMap::new();
        resolve_extern_global(&mut annotations, &external, &global).unwrap();
        assert_eq!(
            annotations.const_value(external.id).unwrap().int64,
            Slot::Valid(40)
        );
        assert_eq!(
            annotations.const_value(global.id).unwrap().int64,
            Slot::Valid(40)
        );
    }
}
