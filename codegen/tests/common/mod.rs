//! Shared fixtures for the lowering tests. Parsing and the type
//! passes are separate stages, so the tests construct the trees and
//! annotations those stages would produce.
#![allow(dead_code)]

use oxplc_analyzer::SemanticContext;
use oxplc_codegen::{lower_program, CodeWriter, OutputConfig};
use oxplc_dsl::analysis::AnnotationMap;
use oxplc_dsl::common::*;
use oxplc_dsl::core::{Id, NodeId, NodeIdGen, SourceSpan};
use oxplc_dsl::textual::*;

pub struct Fixture {
    pub gen: NodeIdGen,
    pub annotations: AnnotationMap,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            gen: NodeIdGen::new(),
            annotations: AnnotationMap::new(),
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

    pub fn decl(&mut self, name: &str, data_type: TypeName) -> VarDecl {
        VarDecl::simple(self.gen.next(), name, data_type)
    }

    pub fn simple(&mut self, operator: IlOperator, operand: Option<ExprKind>) -> IlOperationKind {
        IlOperationKind::Simple(IlSimpleOperation {
            id: self.gen.next(),
            operator,
            operand,
            span: SourceSpan::default(),
        })
    }

    pub fn inner(
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

    pub fn expression(
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

    pub fn instruction(&mut self, index: usize, operation: IlOperationKind) -> IlInstruction {
        IlInstruction {
            id: self.gen.next(),
            label: None,
            operation: Some(operation),
            prev: if index == 0 { vec![] } else { vec![index - 1] },
            span: SourceSpan::default(),
        }
    }

    pub fn labeled(
        &mut self,
        label: &str,
        index: usize,
        operation: IlOperationKind,
    ) -> IlInstruction {
        IlInstruction {
            id: self.gen.next(),
            label: Some(Id::from(label)),
            operation: Some(operation),
            prev: if index == 0 { vec![] } else { vec![index - 1] },
            span: SourceSpan::default(),
        }
    }

    pub fn program(
        &mut self,
        name: &str,
        variables: Vec<VarDecl>,
        instructions: Vec<IlInstruction>,
    ) -> ProgramDeclaration {
        ProgramDeclaration {
            id: self.gen.next(),
            name: Id::from(name),
            variables,
            body: PouBody::Instructions(InstructionList { instructions }),
        }
    }

    /// Lowers the program against an otherwise empty library and
    /// returns the generated text.
    pub fn lower(&mut self, program: &ProgramDeclaration, config: &OutputConfig) -> String {
        let library = Library {
            elements: vec![LibraryElementKind::ProgramDeclaration(program.clone())],
        };
        self.lower_in_library(program, library, config)
    }

    /// Lowers the program with additional library elements (function
    /// and FB declarations) in scope.
    pub fn lower_in_library(
        &mut self,
        program: &ProgramDeclaration,
        library: Library,
        config: &OutputConfig,
    ) -> String {
        let context = SemanticContext::from_library(&library);
        let mut writer = CodeWriter::new();
        lower_program(&mut writer, program, &context, &self.annotations, config)
            .expect("lowering should succeed");
        writer.into_string()
    }
}
