//! Provides definition for diagnostics, which are normally errors and
//! warnings associated with compilation.
//!
//! There exist crates that make this easy, but we need different
//! information for different integrations and there is no one crate that
//! does it all. The renderer that turns these into compiler output lives
//! with the analysis passes.
use oxplc_problems::Problem;

use crate::core::{FileId, Located, SourceSpan};

/// Whether a diagnostic stops a compilation from succeeding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A label that refers to some range in a file and is associated with a
/// message related to that range.
#[derive(Debug, Clone)]
pub struct Label {
    /// The position of the label.
    pub span: SourceSpan,

    /// A message describing this label.
    pub message: String,
}

impl Label {
    pub fn span(span: SourceSpan, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }

    /// A label for a node with a location.
    pub fn node(node: &dyn Located, message: impl Into<String>) -> Self {
        Self::span(node.span(), message)
    }
}

/// A diagnostic. Diagnostics have a code that is indicative of the
/// category, a severity, a primary location and a possibly non-zero set
/// of secondary locations.
///
/// Errors additionally carry a display level from 0 to 4; level 0 errors
/// are always reported while higher levels are reported only when the
/// configured display level reaches them. Warnings are unconditional.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// A normally unique value describing the type of diagnostic.
    pub code: String,

    pub severity: Severity,

    /// Display gate for errors; meaningless for warnings.
    pub level: u8,

    /// The primary or first label. Its message is the full text shown
    /// to the user.
    pub primary: Label,

    /// Additional information about the diagnostic.
    pub secondary: Vec<Label>,
}

impl Diagnostic {
    /// Creates an error diagnostic from the problem code with the
    /// specified label. The label associates the problem to a particular
    /// instance in an IEC 61131-3 source file.
    pub fn problem(problem: Problem, primary: Label) -> Self {
        Self {
            code: problem.code().to_string(),
            severity: Severity::Error,
            level: 0,
            primary,
            secondary: vec![],
        }
    }

    /// Creates a warning diagnostic from the problem code.
    pub fn warning(problem: Problem, primary: Label) -> Self {
        Self {
            code: problem.code().to_string(),
            severity: Severity::Warning,
            level: 0,
            primary,
            secondary: vec![],
        }
    }

    /// Sets the display level gate of an error.
    pub fn with_level(mut self, level: u8) -> Self {
        self.level = level;
        self
    }

    pub fn with_secondary(mut self, label: Label) -> Self {
        self.secondary.push(label);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn file_id(&self) -> &FileId {
        &self.primary.span.file_id
    }
}
