//! The analysis passes as individual stages (to enable testing).
//!
//! The passes assume that candidate data type inference and narrowing
//! have already annotated the library; those collaborators run between
//! parsing and this stage and communicate through the annotation map.
use log::debug;
use oxplc_dsl::analysis::AnnotationMap;
use oxplc_dsl::common::Library;
use oxplc_dsl::diagnostic::Diagnostic;

use crate::constant_folding;
use crate::rule_datatype_errors::{self, DatatypeErrorReport};
use crate::semantic_context::SemanticContext;

#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Errors above this level are suppressed. Level 0 errors are
    /// always reported.
    pub display_error_level: u8,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            display_error_level: 1,
        }
    }
}

#[derive(Debug)]
pub struct AnalysisResult {
    pub context: SemanticContext,
    pub report: DatatypeErrorReport,
}

impl AnalysisResult {
    pub fn error_count(&self) -> usize {
        self.report.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.report.warning_count
    }
}

/// Runs the analysis passes over the library: constant folding and
/// propagation, then data type error reporting.
///
/// Diagnostics found by the rules are collected in the returned report;
/// an `Err` means a pass could not run at all.
pub fn analyze(
    library: &Library,
    annotations: &mut AnnotationMap,
    options: &AnalysisOptions,
) -> Result<AnalysisResult, Vec<Diagnostic>> {
    let context = SemanticContext::from_library(library);

    constant_folding::apply(library, annotations)?;

    let report =
        rule_datatype_errors::apply(library, &context, annotations, options.display_error_level);
    debug!(
        "analysis found {} errors, {} warnings",
        report.error_count, report.warning_count
    );

    Ok(AnalysisResult { context, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::AstBuilder;
    use oxplc_dsl::common::TypeName;
    use oxplc_dsl::constant::Slot;
    use oxplc_dsl::textual::Operator;

    #[test]
    fn analyze_when_folded_and_annotated_then_no_diagnostics() {
        let mut b = AstBuilder::new();
        let two = b.int("2");
        let two_id = two.node_id();
        let three = b.int("3");
        let three_id = three.node_id();
        let sum = b.binary(Operator::Add, two, three);
        let sum_id = sum.node_id();
        let stmt = b.assign("x", sum);
        let oxplc_dsl::textual::StmtKind::Assignment(ref assignment) = stmt else {
            unreachable!()
        };
        let target_id = assignment.target.node_id();
        let decl = b.var_decl("x", TypeName::Int);
        let library = b.program("main", vec![decl], vec![stmt.clone()]);

        let mut annotations = AnnotationMap::new();
        for id in [two_id, three_id, sum_id, target_id] {
            annotations.set_candidates(id, vec![TypeName::Int]);
            annotations.set_datatype(id, TypeName::Int);
        }

        let result = analyze(&library, &mut annotations, &AnalysisOptions::default()).unwrap();
        assert_eq!(result.error_count(), 0);
        assert_eq!(result.warning_count(), 0);
        assert_eq!(annotations.const_value(sum_id).unwrap().int64, Slot::Valid(5));
    }

    #[test]
    fn analyze_when_undeclared_variable_then_error_counted() {
        let mut b = AstBuilder::new();
        let one = b.int("1");
        let one_id = one.node_id();
        let stmt = b.assign("x", one);
        let library = b.program("main", vec![], vec![stmt]);

        let mut annotations = AnnotationMap::new();
        annotations.set_candidates(one_id, vec![TypeName::Int]);
        annotations.set_datatype(one_id, TypeName::Int);

        let result = analyze(&library, &mut annotations, &AnalysisOptions::default()).unwrap();
        assert_eq!(result.error_count(), 1);
    }
}
