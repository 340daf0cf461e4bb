//! Lowering tests for labels, jumps and returns.

mod common;

use common::Fixture;
use oxplc_codegen::OutputConfig;
use oxplc_dsl::common::TypeName;
use oxplc_dsl::core::{Id, SourceSpan};
use oxplc_dsl::textual::{IlJumpOperation, IlJumpOperator, IlOperationKind, IlOperator};

fn jump(f: &mut Fixture, operator: IlJumpOperator, label: &str) -> IlOperationKind {
    IlOperationKind::Jump(IlJumpOperation {
        id: f.next_id(),
        operator,
        label: Id::from(label),
        span: SourceSpan::default(),
    })
}

#[test]
fn lower_when_label_and_jump_then_goto() {
    // loop: LD a
    //       JMP loop
    let mut f = Fixture::new();
    let a = f.var("a");
    let ld = f.simple(IlOperator::Ld, Some(a));
    let i0 = f.labeled("again", 0, ld);
    let jmp = jump(&mut f, IlJumpOperator::Jmp, "again");
    let mut i1 = f.instruction(1, jmp);
    i1.prev = vec![0];
    let decls = vec![f.decl("a", TypeName::Bool)];
    let program = f.program("main", decls, vec![i0, i1]);

    let text = f.lower(&program, &OutputConfig::default());
    assert!(text.contains("again:\n"));
    assert!(text.contains("goto again;"));
}

#[test]
fn lower_when_conditional_jump_then_guard_on_bool_accumulator() {
    let mut f = Fixture::new();
    let a = f.var("a");
    let ld = f.simple(IlOperator::Ld, Some(a));
    let i0 = f.labeled("top", 0, ld);
    let jmpcn = jump(&mut f, IlJumpOperator::Jmpcn, "top");
    let i1 = f.instruction(1, jmpcn);
    let decls = vec![f.decl("a", TypeName::Bool)];
    let program = f.program("main", decls, vec![i0, i1]);

    let text = f.lower(&program, &OutputConfig::default());
    assert!(text.contains("if (!IL_DEFVAR.BOOLvar) goto top;"));
}

#[test]
fn lower_when_ret_then_goto_end_label() {
    let mut f = Fixture::new();
    let a = f.var("a");
    let ld = f.simple(IlOperator::Ld, Some(a));
    let ret = f.simple(IlOperator::Retc, None);
    let i0 = f.instruction(0, ld);
    let i1 = f.instruction(1, ret);
    let decls = vec![f.decl("a", TypeName::Bool)];
    let program = f.program("main", decls, vec![i0, i1]);

    let text = f.lower(&program, &OutputConfig::default());
    assert!(text.contains("if (IL_DEFVAR.BOOLvar) goto END_LABEL;"));
    // the end label closes every body
    assert!(text.contains("END_LABEL: ;\n}"));
}

#[test]
fn lower_when_located_variable_then_dereferenced_address() {
    use oxplc_dsl::textual::{DirectVariable, ExprKind, Variable};

    let mut f = Fixture::new();
    let direct_id = f.next_id();
    let direct = ExprKind::Variable(Variable::Direct(DirectVariable {
        id: direct_id,
        address: "QX0.0".to_string(),
        span: SourceSpan::default(),
    }));
    // the located variable's type comes from narrowing
    f.annotations.set_datatype(direct_id, TypeName::Bool);
    let cond = f.var("cond");
    let ld = f.simple(IlOperator::Ld, Some(cond));
    let st = f.simple(IlOperator::St, Some(direct));
    let i0 = f.instruction(0, ld);
    let i1 = f.instruction(1, st);
    let decls = vec![f.decl("cond", TypeName::Bool)];
    let program = f.program("main", decls, vec![i0, i1]);

    let text = f.lower(&program, &OutputConfig::default());
    assert!(text.contains("*(__QX0_0) = IL_DEFVAR.BOOLvar;"));
}
