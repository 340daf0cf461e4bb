//! Builders for syntax trees used across the pass tests. Parsing is a
//! separate stage, so tests construct the trees that the parser and the
//! control-flow analysis would produce.
use oxplc_dsl::common::*;
use oxplc_dsl::constant::CompareOp;
use oxplc_dsl::core::{Id, NodeId, NodeIdGen, SourceSpan};
use oxplc_dsl::textual::*;

pub struct AstBuilder {
    gen: NodeIdGen,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self {
            gen: NodeIdGen::new(),
        }
    }

    pub fn next_id(&mut self) -> NodeId {
        self.gen.next()
    }

    pub fn int(&mut self, digits: &str) -> ExprKind {
        ExprKind::Const(ConstantKind::IntegerLiteral(IntegerLiteral {
            id: self.gen.next(),
            span: SourceSpan::default(),
            value: digits.to_owned(),
            base: IntegerBase::Decimal,
            is_neg: false,
            data_type: None,
        }))
    }

    pub fn neg_int(&mut self, digits: &str) -> ExprKind {
        ExprKind::Const(ConstantKind::IntegerLiteral(IntegerLiteral {
            id: self.gen.next(),
            span: SourceSpan::default(),
            value: digits.to_owned(),
            base: IntegerBase::Decimal,
            is_neg: true,
            data_type: None,
        }))
    }

    pub fn real(&mut self, digits: &str) -> ExprKind {
        ExprKind::Const(ConstantKind::RealLiteral(RealLiteral {
            id: self.gen.next(),
            span: SourceSpan::default(),
            value: digits.to_owned(),
            is_neg: false,
            data_type: None,
        }))
    }

    pub fn boolean(&mut self, value: bool) -> ExprKind {
        ExprKind::Const(ConstantKind::BoolLiteral(BoolLiteral {
            id: self.gen.next(),
            span: SourceSpan::default(),
            value,
            data_type: None,
        }))
    }

    pub fn var(&mut self, name: &str) -> ExprKind {
        ExprKind::named_variable(self.gen.next(), name)
    }

    pub fn binary(&mut self, op: Operator, left: ExprKind, right: ExprKind) -> ExprKind {
        ExprKind::binary(self.gen.next(), op, left, right)
    }

    pub fn compare(&mut self, op: CompareOp, left: ExprKind, right: ExprKind) -> ExprKind {
        ExprKind::compare(self.gen.next(), op, left, right)
    }

    pub fn assign(&mut self, name: &str, value: ExprKind) -> StmtKind {
        StmtKind::Assignment(Assignment {
            id: self.gen.next(),
            target: Variable::named(self.gen.next(), name),
            value,
        })
    }

    pub fn if_else(
        &mut self,
        expr: ExprKind,
        body: Vec<StmtKind>,
        else_body: Vec<StmtKind>,
    ) -> StmtKind {
        StmtKind::If(If {
            id: self.gen.next(),
            expr,
            body,
            else_ifs: vec![],
            else_body,
            span: SourceSpan::default(),
        })
    }

    pub fn var_decl(&mut self, name: &str, data_type: TypeName) -> VarDecl {
        VarDecl::simple(self.gen.next(), name, data_type)
    }

    pub fn program(&mut self, name: &str, variables: Vec<VarDecl>, body: Vec<StmtKind>) -> Library {
        Library {
            elements: vec![LibraryElementKind::ProgramDeclaration(ProgramDeclaration {
                id: self.gen.next(),
                name: Id::from(name),
                variables,
                body: PouBody::Statements(Statements { body }),
            })],
        }
    }

    pub fn program_with_il(
        &mut self,
        name: &str,
        variables: Vec<VarDecl>,
        instructions: Vec<IlInstruction>,
    ) -> Library {
        Library {
            elements: vec![LibraryElementKind::ProgramDeclaration(ProgramDeclaration {
                id: self.gen.next(),
                name: Id::from(name),
                variables,
                body: PouBody::Instructions(InstructionList { instructions }),
            })],
        }
    }

    pub fn il_simple(&mut self, operator: IlOperator, operand: Option<ExprKind>) -> IlOperationKind {
        IlOperationKind::Simple(IlSimpleOperation {
            id: self.gen.next(),
            operator,
            operand,
            span: SourceSpan::default(),
        })
    }

    pub fn il_inner(
        &mut self,
        operator: IlOperator,
        operand: Option<ExprKind>,
    ) -> IlSimpleInstruction {
        IlSimpleInstruction {
            id: self.gen.next(),
            operation: IlSimpleOperationKind::Simple(IlSimpleOperation {
                id: self.gen.next(),
                operator,
                operand,
                span: SourceSpan::default(),
            }),
        }
    }

    pub fn il_expression(
        &mut self,
        operator: IlOperator,
        instructions: Vec<IlSimpleInstruction>,
    ) -> IlOperationKind {
        IlOperationKind::Expression(IlExpression {
            id: self.gen.next(),
            operator,
            operand: None,
            instructions,
            span: SourceSpan::default(),
        })
    }

    /// An instruction whose predecessor is the previous instruction in
    /// the list, the common straight-line case.
    pub fn il_instruction(&mut self, index: usize, operation: IlOperationKind) -> IlInstruction {
        IlInstruction {
            id: self.gen.next(),
            label: None,
            operation: Some(operation),
            prev: if index == 0 { vec![] } else { vec![index - 1] },
            span: SourceSpan::default(),
        }
    }
}
