//! Provides definitions of objects from IEC 61131-3 textual languages:
//! the expressions and statements of structured text (section 3) and the
//! instructions of instruction list (section 2 of part B.2).
use core::fmt;

use crate::common::{ConstantKind, EnumeratedValue};
use crate::constant::CompareOp;
use crate::core::{Id, Located, NodeId, SourceSpan};

/// A variable reference.
///
/// See section B.1.4.
#[derive(Debug, PartialEq, Clone)]
pub enum Variable {
    Named(NamedVariable),
    Array(ArrayVariable),
    Structured(StructuredVariable),
    /// A variable that maps to a hardware address (`%QX1.0`).
    Direct(DirectVariable),
}

impl Variable {
    pub fn named(id: NodeId, name: &str) -> Variable {
        Variable::Named(NamedVariable {
            id,
            name: Id::from(name),
        })
    }

    pub fn node_id(&self) -> NodeId {
        match self {
            Variable::Named(node) => node.id,
            Variable::Array(node) => node.id,
            Variable::Structured(node) => node.id,
            Variable::Direct(node) => node.id,
        }
    }

    /// The name of the variable instance being accessed, i.e. the
    /// left-most identifier of the reference. A direct variable has no
    /// name.
    pub fn base_name(&self) -> Option<&Id> {
        match self {
            Variable::Named(node) => Some(&node.name),
            Variable::Array(node) => node.variable.base_name(),
            Variable::Structured(node) => node.record.base_name(),
            Variable::Direct(_) => None,
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::Named(node) => write!(f, "{}", node.name),
            Variable::Array(node) => write!(f, "{}[...]", node.variable),
            Variable::Structured(node) => write!(f, "{}.{}", node.record, node.field),
            Variable::Direct(node) => write!(f, "%{}", node.address),
        }
    }
}

impl Located for Variable {
    fn span(&self) -> SourceSpan {
        match self {
            Variable::Named(node) => node.span(),
            Variable::Array(node) => node.span(),
            Variable::Structured(node) => node.span(),
            Variable::Direct(node) => node.span(),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct NamedVariable {
    pub id: NodeId,
    pub name: Id,
}

impl Located for NamedVariable {
    fn span(&self) -> SourceSpan {
        self.name.span()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct ArrayVariable {
    pub id: NodeId,
    /// The variable that is being accessed by subscript (the array).
    pub variable: Box<Variable>,
    /// The ordered set of subscripts. These should be expressions that
    /// evaluate to an index.
    pub subscripts: Vec<ExprKind>,
}

impl Located for ArrayVariable {
    fn span(&self) -> SourceSpan {
        self.variable.span()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct StructuredVariable {
    pub id: NodeId,
    pub record: Box<Variable>,
    pub field: Id,
}

impl Located for StructuredVariable {
    fn span(&self) -> SourceSpan {
        SourceSpan::join(&self.record.span(), &self.field.span())
    }
}

/// A directly represented variable, e.g. `%IX0.2`.
///
/// See section B.1.4.1. The address is kept without the leading percent
/// sign.
#[derive(Debug, PartialEq, Clone)]
pub struct DirectVariable {
    pub id: NodeId,
    pub address: String,
    pub span: SourceSpan,
}

impl Located for DirectVariable {
    fn span(&self) -> SourceSpan {
        self.span.clone()
    }
}

/// The binary operators that produce an arithmetic, bit string or
/// boolean result from two operands.
///
/// See section 3.3.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    And,
    Or,
    Xor,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Mod => "MOD",
            Operator::Pow => "**",
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Xor => "XOR",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Neg => "NEG",
            UnaryOp::Not => "NOT",
        })
    }
}

/// Formats a comparison the way it is spelled in structured text.
pub fn compare_op_symbol(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Eq => "=",
        CompareOp::Ne => "<>",
        CompareOp::Lt => "<",
        CompareOp::Le => "<=",
        CompareOp::Gt => ">",
        CompareOp::Ge => ">=",
    }
}

/// A binary expression that produces a Boolean result by comparing
/// operands.
///
/// See section 3.3.1.
#[derive(Debug, Clone, PartialEq)]
pub struct CompareExpr {
    pub id: NodeId,
    pub op: CompareOp,
    pub left: ExprKind,
    pub right: ExprKind,
}

impl Located for CompareExpr {
    fn span(&self) -> SourceSpan {
        SourceSpan::join(&self.left.span(), &self.right.span())
    }
}

/// A binary expression that produces an arithmetic result by operating
/// on two operands.
///
/// See section 3.3.1.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub id: NodeId,
    pub op: Operator,
    pub left: ExprKind,
    pub right: ExprKind,
}

impl Located for BinaryExpr {
    fn span(&self) -> SourceSpan {
        SourceSpan::join(&self.left.span(), &self.right.span())
    }
}

/// A unary expression that produces a boolean or arithmetic result by
/// transforming the operand.
///
/// See section 3.3.1.
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub id: NodeId,
    pub op: UnaryOp,
    pub term: ExprKind,
}

impl Located for UnaryExpr {
    fn span(&self) -> SourceSpan {
        self.term.span()
    }
}

/// A function invocation in an expression context.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub id: NodeId,
    pub name: Id,
    pub params: Vec<ParamAssignmentKind>,
    pub span: SourceSpan,
}

impl Located for FunctionCall {
    fn span(&self) -> SourceSpan {
        self.span.clone()
    }
}

/// Expression that yields a value derived from the input(s) to the
/// expression.
#[derive(Debug, PartialEq, Clone)]
pub enum ExprKind {
    Compare(Box<CompareExpr>),
    BinaryOp(Box<BinaryExpr>),
    UnaryOp(Box<UnaryExpr>),
    Const(ConstantKind),
    EnumeratedValue(EnumeratedValue),
    Variable(Variable),
    Function(Box<FunctionCall>),
}

impl ExprKind {
    pub fn compare(id: NodeId, op: CompareOp, left: ExprKind, right: ExprKind) -> ExprKind {
        ExprKind::Compare(Box::new(CompareExpr {
            id,
            op,
            left,
            right,
        }))
    }

    pub fn binary(id: NodeId, op: Operator, left: ExprKind, right: ExprKind) -> ExprKind {
        ExprKind::BinaryOp(Box::new(BinaryExpr {
            id,
            op,
            left,
            right,
        }))
    }

    pub fn unary(id: NodeId, op: UnaryOp, term: ExprKind) -> ExprKind {
        ExprKind::UnaryOp(Box::new(UnaryExpr { id, op, term }))
    }

    pub fn named_variable(id: NodeId, name: &str) -> ExprKind {
        ExprKind::Variable(Variable::named(id, name))
    }

    pub fn node_id(&self) -> NodeId {
        match self {
            ExprKind::Compare(node) => node.id,
            ExprKind::BinaryOp(node) => node.id,
            ExprKind::UnaryOp(node) => node.id,
            ExprKind::Const(node) => node.node_id(),
            ExprKind::EnumeratedValue(node) => node.id,
            ExprKind::Variable(node) => node.node_id(),
            ExprKind::Function(node) => node.id,
        }
    }
}

impl Located for ExprKind {
    fn span(&self) -> SourceSpan {
        match self {
            ExprKind::Compare(node) => node.span(),
            ExprKind::BinaryOp(node) => node.span(),
            ExprKind::UnaryOp(node) => node.span(),
            ExprKind::Const(node) => node.span(),
            ExprKind::EnumeratedValue(node) => node.span(),
            ExprKind::Variable(node) => node.span(),
            ExprKind::Function(node) => node.span(),
        }
    }
}

/// An input parameter passed by position.
///
/// See section 3.2.3.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionalInput {
    pub value: ExprKind,
}

/// An input parameter passed by name (`IN := expr`).
///
/// See section 3.2.3.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedInput {
    pub name: Id,
    pub value: ExprKind,
}

/// An output parameter binding (`Q => variable`).
///
/// See section 3.2.3.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub name: Id,
    pub value: Variable,
    /// `NOT Q => variable`.
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamAssignmentKind {
    Positional(PositionalInput),
    NamedInput(NamedInput),
    Output(Output),
}

/// Function block invocation statement.
///
/// See section 3.2.3.
#[derive(Debug, PartialEq, Clone)]
pub struct FbCall {
    pub id: NodeId,
    /// Name of the variable that is associated with the function block
    /// call.
    pub var_name: Id,
    pub params: Vec<ParamAssignmentKind>,
    pub position: SourceSpan,
}

impl Located for FbCall {
    fn span(&self) -> SourceSpan {
        self.position.clone()
    }
}

/// An assignment statement.
///
/// See section 3.3.2.1.
#[derive(Debug, PartialEq, Clone)]
pub struct Assignment {
    pub id: NodeId,
    pub target: Variable,
    pub value: ExprKind,
}

impl Located for Assignment {
    fn span(&self) -> SourceSpan {
        SourceSpan::join(&self.target.span(), &self.value.span())
    }
}

/// An ELSIF branch of an IF statement.
#[derive(Debug, PartialEq, Clone)]
pub struct ElseIf {
    pub expr: ExprKind,
    pub body: Vec<StmtKind>,
}

/// The IF selection statement.
///
/// See section 3.3.2.3.
#[derive(Debug, PartialEq, Clone)]
pub struct If {
    pub id: NodeId,
    pub expr: ExprKind,
    pub body: Vec<StmtKind>,
    pub else_ifs: Vec<ElseIf>,
    pub else_body: Vec<StmtKind>,
    pub span: SourceSpan,
}

impl Located for If {
    fn span(&self) -> SourceSpan {
        self.span.clone()
    }
}

/// One alternative of a CASE statement.
#[derive(Debug, PartialEq, Clone)]
pub struct CaseGroup {
    pub selectors: Vec<ExprKind>,
    pub body: Vec<StmtKind>,
}

/// The CASE selection statement.
///
/// See section 3.3.2.3.
#[derive(Debug, PartialEq, Clone)]
pub struct Case {
    pub id: NodeId,
    pub selector: ExprKind,
    pub groups: Vec<CaseGroup>,
    pub else_body: Vec<StmtKind>,
    pub span: SourceSpan,
}

impl Located for Case {
    fn span(&self) -> SourceSpan {
        self.span.clone()
    }
}

/// The FOR iteration statement.
///
/// See section 3.3.2.4.
#[derive(Debug, PartialEq, Clone)]
pub struct For {
    pub id: NodeId,
    /// The variable that controls the iterations.
    pub control: NamedVariable,
    pub from: ExprKind,
    pub to: ExprKind,
    pub by: Option<ExprKind>,
    pub body: Vec<StmtKind>,
    pub span: SourceSpan,
}

impl Located for For {
    fn span(&self) -> SourceSpan {
        self.span.clone()
    }
}

/// The WHILE iteration statement.
#[derive(Debug, PartialEq, Clone)]
pub struct While {
    pub id: NodeId,
    pub condition: ExprKind,
    pub body: Vec<StmtKind>,
    pub span: SourceSpan,
}

impl Located for While {
    fn span(&self) -> SourceSpan {
        self.span.clone()
    }
}

/// The REPEAT iteration statement. The condition is evaluated after the
/// body.
#[derive(Debug, PartialEq, Clone)]
pub struct Repeat {
    pub id: NodeId,
    pub body: Vec<StmtKind>,
    pub until: ExprKind,
    pub span: SourceSpan,
}

impl Located for Repeat {
    fn span(&self) -> SourceSpan {
        self.span.clone()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum StmtKind {
    Assignment(Assignment),
    If(If),
    Case(Case),
    For(For),
    While(While),
    Repeat(Repeat),
    FbCall(FbCall),
    Return,
    Exit,
}

/// A body of a program organization unit written in structured text.
///
/// See section 3.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Statements {
    pub body: Vec<StmtKind>,
}

// Language IL (instruction list), section B.2.

/// The operators that appear in simple IL instructions and in
/// parenthesised IL expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IlOperator {
    Ld,
    Ldn,
    St,
    Stn,
    S,
    R,
    S1,
    R1,
    Clk,
    Cu,
    Cd,
    Pv,
    In,
    Pt,
    Not,
    And,
    Or,
    Xor,
    Andn,
    Orn,
    Xorn,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Gt,
    Ge,
    Eq,
    Lt,
    Le,
    Ne,
    Ret,
    Retc,
    Retcn,
}

impl IlOperator {
    /// The operators that desugar to a function block invocation with a
    /// single implicitly named parameter.
    pub fn implicit_fb_param(&self) -> Option<&'static str> {
        match self {
            IlOperator::S1 => Some("S1"),
            IlOperator::R1 => Some("R1"),
            IlOperator::Clk => Some("CLK"),
            IlOperator::Cu => Some("CU"),
            IlOperator::Cd => Some("CD"),
            IlOperator::Pv => Some("PV"),
            IlOperator::In => Some("IN"),
            IlOperator::Pt => Some("PT"),
            _ => None,
        }
    }

    pub fn compare_op(&self) -> Option<CompareOp> {
        match self {
            IlOperator::Gt => Some(CompareOp::Gt),
            IlOperator::Ge => Some(CompareOp::Ge),
            IlOperator::Eq => Some(CompareOp::Eq),
            IlOperator::Lt => Some(CompareOp::Lt),
            IlOperator::Le => Some(CompareOp::Le),
            IlOperator::Ne => Some(CompareOp::Ne),
            _ => None,
        }
    }
}

impl fmt::Display for IlOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The variant names match the IL spelling up to case.
        write!(f, "{}", format!("{self:?}").to_uppercase())
    }
}

/// The operators that invoke a function block instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IlCallOperator {
    Cal,
    Calc,
    Calcn,
}

impl fmt::Display for IlCallOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format!("{self:?}").to_uppercase())
    }
}

/// The operators that jump to a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IlJumpOperator {
    Jmp,
    Jmpc,
    Jmpcn,
}

impl fmt::Display for IlJumpOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format!("{self:?}").to_uppercase())
    }
}

/// `il_simple_operator [il_operand]`, e.g. `LD 1` or `ADD x`.
#[derive(Debug, PartialEq, Clone)]
pub struct IlSimpleOperation {
    pub id: NodeId,
    pub operator: IlOperator,
    pub operand: Option<ExprKind>,
    pub span: SourceSpan,
}

impl Located for IlSimpleOperation {
    fn span(&self) -> SourceSpan {
        self.span.clone()
    }
}

/// `il_expr_operator '(' [il_operand] simple_instr_list ')'`.
///
/// The parenthesised list is evaluated with a fresh accumulator and its
/// result becomes the operand of the outer operator. When an operand is
/// written immediately after the parenthesis the parser inserts an
/// equivalent `LD <operand>` at the head of the inner list.
#[derive(Debug, PartialEq, Clone)]
pub struct IlExpression {
    pub id: NodeId,
    pub operator: IlOperator,
    pub operand: Option<ExprKind>,
    pub instructions: Vec<IlSimpleInstruction>,
    pub span: SourceSpan,
}

impl Located for IlExpression {
    fn span(&self) -> SourceSpan {
        self.span.clone()
    }
}

/// A non-formal function invocation, e.g. `ADD 1, 2` for a function
/// named ADD. The preceding accumulator value is the implicit first
/// parameter.
#[derive(Debug, PartialEq, Clone)]
pub struct IlFunctionCall {
    pub id: NodeId,
    pub name: Id,
    pub operands: Vec<ExprKind>,
    pub span: SourceSpan,
}

impl Located for IlFunctionCall {
    fn span(&self) -> SourceSpan {
        self.span.clone()
    }
}

/// A formal function invocation, e.g. `MAX( IN1 := a, IN2 := b )`.
#[derive(Debug, PartialEq, Clone)]
pub struct IlFormalFunctionCall {
    pub id: NodeId,
    pub name: Id,
    pub params: Vec<ParamAssignmentKind>,
    pub span: SourceSpan,
}

impl Located for IlFormalFunctionCall {
    fn span(&self) -> SourceSpan {
        self.span.clone()
    }
}

/// A function block invocation: `CAL[C[N]] fb_instance [( params )]`.
///
/// At most one of `operands` (non-formal) and `params` (formal) is
/// non-empty.
#[derive(Debug, PartialEq, Clone)]
pub struct IlFbCall {
    pub id: NodeId,
    pub operator: IlCallOperator,
    pub fb_name: Id,
    pub operands: Vec<ExprKind>,
    pub params: Vec<ParamAssignmentKind>,
    pub span: SourceSpan,
}

impl Located for IlFbCall {
    fn span(&self) -> SourceSpan {
        self.span.clone()
    }
}

/// `JMP[C[N]] label`.
#[derive(Debug, PartialEq, Clone)]
pub struct IlJumpOperation {
    pub id: NodeId,
    pub operator: IlJumpOperator,
    pub label: Id,
    pub span: SourceSpan,
}

impl Located for IlJumpOperation {
    fn span(&self) -> SourceSpan {
        self.span.clone()
    }
}

/// The operations allowed inside a parenthesised instruction list.
/// Labels, jumps and FB invocations are not.
#[derive(Debug, PartialEq, Clone)]
pub enum IlSimpleOperationKind {
    Simple(IlSimpleOperation),
    FunctionCall(IlFunctionCall),
    Expression(IlExpression),
}

impl IlSimpleOperationKind {
    pub fn node_id(&self) -> NodeId {
        match self {
            IlSimpleOperationKind::Simple(node) => node.id,
            IlSimpleOperationKind::FunctionCall(node) => node.id,
            IlSimpleOperationKind::Expression(node) => node.id,
        }
    }
}

impl Located for IlSimpleOperationKind {
    fn span(&self) -> SourceSpan {
        match self {
            IlSimpleOperationKind::Simple(node) => node.span(),
            IlSimpleOperationKind::FunctionCall(node) => node.span(),
            IlSimpleOperationKind::Expression(node) => node.span(),
        }
    }
}

/// One instruction of a parenthesised instruction list. Control flow
/// inside a parenthesis is linear, so each instruction has exactly the
/// preceding instruction as predecessor.
#[derive(Debug, PartialEq, Clone)]
pub struct IlSimpleInstruction {
    pub id: NodeId,
    pub operation: IlSimpleOperationKind,
}

impl Located for IlSimpleInstruction {
    fn span(&self) -> SourceSpan {
        self.operation.span()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum IlOperationKind {
    Simple(IlSimpleOperation),
    Expression(IlExpression),
    FunctionCall(IlFunctionCall),
    FormalFunctionCall(IlFormalFunctionCall),
    FbCall(IlFbCall),
    Jump(IlJumpOperation),
}

impl IlOperationKind {
    pub fn node_id(&self) -> NodeId {
        match self {
            IlOperationKind::Simple(node) => node.id,
            IlOperationKind::Expression(node) => node.id,
            IlOperationKind::FunctionCall(node) => node.id,
            IlOperationKind::FormalFunctionCall(node) => node.id,
            IlOperationKind::FbCall(node) => node.id,
            IlOperationKind::Jump(node) => node.id,
        }
    }
}

impl Located for IlOperationKind {
    fn span(&self) -> SourceSpan {
        match self {
            IlOperationKind::Simple(node) => node.span(),
            IlOperationKind::Expression(node) => node.span(),
            IlOperationKind::FunctionCall(node) => node.span(),
            IlOperationKind::FormalFunctionCall(node) => node.span(),
            IlOperationKind::FbCall(node) => node.span(),
            IlOperationKind::Jump(node) => node.span(),
        }
    }
}

/// `[label ':'] [il_incomplete_instruction]`.
///
/// An instruction may carry only a label. The `prev` field holds the
/// indices of the instructions that immediately precede this one in
/// control flow; a labelled instruction may have several when branches
/// converge on it. The indices are into the owning [InstructionList]
/// and are filled in by the control-flow analysis that follows parsing.
#[derive(Debug, PartialEq, Clone)]
pub struct IlInstruction {
    pub id: NodeId,
    pub label: Option<Id>,
    pub operation: Option<IlOperationKind>,
    pub prev: Vec<usize>,
    pub span: SourceSpan,
}

impl Located for IlInstruction {
    fn span(&self) -> SourceSpan {
        self.span.clone()
    }
}

/// A body of a program organization unit written in instruction list.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct InstructionList {
    pub instructions: Vec<IlInstruction>,
}
