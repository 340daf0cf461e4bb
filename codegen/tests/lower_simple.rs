//! Lowering tests for loads, stores and the in-place operators.

mod common;

use common::Fixture;
use oxplc_codegen::OutputConfig;
use oxplc_dsl::common::TypeName;
use oxplc_dsl::textual::IlOperator;

#[test]
fn lower_when_load_add_store_then_complete_body() {
    let mut f = Fixture::new();
    let a = f.var("a");
    let ld = f.simple(IlOperator::Ld, Some(a));
    let one = f.int("1");
    let add = f.simple(IlOperator::Add, Some(one));
    let b = f.var("b");
    let st = f.simple(IlOperator::St, Some(b));
    let i0 = f.instruction(0, ld);
    let i1 = f.instruction(1, add);
    let i2 = f.instruction(2, st);
    let decls = vec![f.decl("a", TypeName::Int), f.decl("b", TypeName::Int)];
    let program = f.program("main", decls, vec![i0, i1, i2]);

    let text = f.lower(&program, &OutputConfig::default());
    assert_eq!(
        text,
        "{\n\
         \x20 IL_DEFVAR_T IL_DEFVAR;\n\
         \x20 IL_DEFVAR_T IL_DEFVAR_BACK;\n\
         \x20 IL_DEFVAR_BACK.INTvar = 0;\n\
         \n\
         \x20 IL_DEFVAR.INTvar = a;\n\
         \x20 IL_DEFVAR.INTvar += 1;\n\
         \x20 b = IL_DEFVAR.INTvar;\n\
         \x20 END_LABEL: ;\n\
         }\n"
    );
}

#[test]
fn lower_when_load_negated_bool_then_logical_not() {
    let mut f = Fixture::new();
    let a = f.var("a");
    let ldn = f.simple(IlOperator::Ldn, Some(a));
    let b = f.var("b");
    let stn = f.simple(IlOperator::Stn, Some(b));
    let i0 = f.instruction(0, ldn);
    let i1 = f.instruction(1, stn);
    let decls = vec![f.decl("a", TypeName::Bool), f.decl("b", TypeName::Bool)];
    let program = f.program("main", decls, vec![i0, i1]);

    let text = f.lower(&program, &OutputConfig::default());
    assert!(text.contains("IL_DEFVAR.BOOLvar = !a;"));
    assert!(text.contains("b = !IL_DEFVAR.BOOLvar;"));
}

#[test]
fn lower_when_load_negated_word_then_bit_complement() {
    let mut f = Fixture::new();
    let a = f.var("a");
    let ldn = f.simple(IlOperator::Ldn, Some(a));
    let i0 = f.instruction(0, ldn);
    let decls = vec![f.decl("a", TypeName::Word)];
    let program = f.program("main", decls, vec![i0]);

    let text = f.lower(&program, &OutputConfig::default());
    assert!(text.contains("IL_DEFVAR.WORDvar = ~a;"));
}

#[test]
fn lower_when_untyped_literal_stored_then_adopts_target_type() {
    let mut f = Fixture::new();
    let one = f.int("100");
    let ld = f.simple(IlOperator::Ld, Some(one));
    let b = f.var("b");
    let st = f.simple(IlOperator::St, Some(b));
    let i0 = f.instruction(0, ld);
    let i1 = f.instruction(1, st);
    let decls = vec![f.decl("b", TypeName::Uint)];
    let program = f.program("main", decls, vec![i0, i1]);

    let text = f.lower(&program, &OutputConfig::default());
    // the load uses the widest member while the type is still open
    assert!(text.contains("IL_DEFVAR.LINTvar = 100;"));
    assert!(text.contains("b = IL_DEFVAR.UINTvar;"));
}

#[test]
fn lower_when_and_between_bools_then_in_place_and() {
    let mut f = Fixture::new();
    let a = f.var("a");
    let ld = f.simple(IlOperator::Ld, Some(a));
    let c = f.var("c");
    let andn = f.simple(IlOperator::Andn, Some(c));
    let i0 = f.instruction(0, ld);
    let i1 = f.instruction(1, andn);
    let decls = vec![f.decl("a", TypeName::Bool), f.decl("c", TypeName::Bool)];
    let program = f.program("main", decls, vec![i0, i1]);

    let text = f.lower(&program, &OutputConfig::default());
    assert!(text.contains("IL_DEFVAR.BOOLvar &= !c;"));
}

#[test]
fn lower_when_not_then_in_place_complement() {
    let mut f = Fixture::new();
    let a = f.var("a");
    let ld = f.simple(IlOperator::Ld, Some(a));
    let not = f.simple(IlOperator::Not, None);
    let i0 = f.instruction(0, ld);
    let i1 = f.instruction(1, not);
    let decls = vec![f.decl("a", TypeName::Word)];
    let program = f.program("main", decls, vec![i0, i1]);

    let text = f.lower(&program, &OutputConfig::default());
    assert!(text.contains("IL_DEFVAR.WORDvar = ~IL_DEFVAR.WORDvar;"));
}

#[test]
fn lower_when_comparison_then_runtime_function_and_bool_accumulator() {
    let mut f = Fixture::new();
    let a = f.var("a");
    let ld = f.simple(IlOperator::Ld, Some(a));
    let c = f.var("c");
    let gt = f.simple(IlOperator::Gt, Some(c));
    let q = f.var("q");
    let st = f.simple(IlOperator::St, Some(q));
    let i0 = f.instruction(0, ld);
    let i1 = f.instruction(1, gt);
    let i2 = f.instruction(2, st);
    let decls = vec![
        f.decl("a", TypeName::Int),
        f.decl("c", TypeName::Int),
        f.decl("q", TypeName::Bool),
    ];
    let program = f.program("main", decls, vec![i0, i1, i2]);

    let text = f.lower(&program, &OutputConfig::default());
    assert!(text
        .contains("IL_DEFVAR.BOOLvar = GT_INT(__BOOL_LITERAL(TRUE), NULL, 2, IL_DEFVAR.INTvar, c);"));
    // the comparison switched the accumulator to BOOL
    assert!(text.contains("q = IL_DEFVAR.BOOLvar;"));
}

#[test]
fn lower_when_set_with_bool_accumulator_then_guarded_assignment() {
    let mut f = Fixture::new();
    let cond = f.var("cond");
    let ld = f.simple(IlOperator::Ld, Some(cond));
    let out = f.var("out");
    let set = f.simple(IlOperator::S, Some(out));
    let i0 = f.instruction(0, ld);
    let i1 = f.instruction(1, set);
    let decls = vec![f.decl("cond", TypeName::Bool), f.decl("out", TypeName::Bool)];
    let program = f.program("main", decls, vec![i0, i1]);

    let text = f.lower(&program, &OutputConfig::default());
    assert!(text.contains("if (IL_DEFVAR.BOOLvar) out = __BOOL_LITERAL(TRUE);"));
}

#[test]
fn lower_when_time_addition_then_runtime_helper() {
    let mut f = Fixture::new();
    let t1 = f.var("t1");
    let ld = f.simple(IlOperator::Ld, Some(t1));
    let t2 = f.var("t2");
    let add = f.simple(IlOperator::Add, Some(t2));
    let i0 = f.instruction(0, ld);
    let i1 = f.instruction(1, add);
    let decls = vec![f.decl("t1", TypeName::Time), f.decl("t2", TypeName::Time)];
    let program = f.program("main", decls, vec![i0, i1]);

    let text = f.lower(&program, &OutputConfig::default());
    assert!(text.contains("IL_DEFVAR.TIMEvar = __time_add(IL_DEFVAR.TIMEvar, t2);"));
}

#[test]
fn lower_when_prefix_configured_then_accessor_macros() {
    let mut f = Fixture::new();
    let x = f.var("x");
    let ld = f.simple(IlOperator::Ld, Some(x));
    let y = f.var("y");
    let st = f.simple(IlOperator::St, Some(y));
    let i0 = f.instruction(0, ld);
    let i1 = f.instruction(1, st);
    let decls = vec![f.decl("x", TypeName::Int), f.decl("y", TypeName::Int)];
    let program = f.program("main", decls, vec![i0, i1]);

    let config = OutputConfig {
        variable_prefix: Some("data__->".to_string()),
    };
    let text = f.lower(&program, &config);
    assert!(text.contains("IL_DEFVAR.INTvar = GET_VAR(data__->x);"));
    assert!(text.contains("SET_VAR(data__->,y,IL_DEFVAR.INTvar);"));
}

#[test]
fn lower_when_external_variable_then_external_accessors() {
    let mut f = Fixture::new();
    let x = f.var("x");
    let ld = f.simple(IlOperator::Ld, Some(x));
    let i0 = f.instruction(0, ld);
    let decls = vec![f
        .decl("x", TypeName::Int)
        .with_var_type(oxplc_dsl::common::VariableType::External)];
    let program = f.program("main", decls, vec![i0]);

    let config = OutputConfig {
        variable_prefix: Some("data__->".to_string()),
    };
    let text = f.lower(&program, &config);
    assert!(text.contains("IL_DEFVAR.INTvar = GET_EXTERNAL(data__->x);"));
}
