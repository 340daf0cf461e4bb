//! Renders diagnostics in the compiler's textual output format.
//!
//! Each diagnostic becomes one line of the form
//! `<file>:<line>-<column>..<line>-<column>: error: <message>` (or
//! `warning:`), where the positions delimit the source range of the
//! primary label.
use oxplc_dsl::diagnostic::{Diagnostic, Severity};

pub fn render(diagnostic: &Diagnostic) -> String {
    let span = &diagnostic.primary.span;
    let severity = match diagnostic.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    };
    format!(
        "{}:{}-{}..{}-{}: {}: {}\n",
        span.file_id,
        span.start.line,
        span.start.column,
        span.end.line,
        span.end.column,
        severity,
        diagnostic.primary.message
    )
}

pub fn render_all(diagnostics: &[Diagnostic]) -> String {
    diagnostics.iter().map(render).collect()
}
