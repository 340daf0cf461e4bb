//! Common items useful for working with IEC 61131-3 elements but not
//! part of the standard.
use core::fmt;
use std::path::Path;
use std::sync::{Arc, LazyLock};
use std::{cmp::Ordering, hash::Hash, hash::Hasher};

// Static singleton for the common empty FileId value to avoid repeated
// allocations. This is particularly beneficial for test code which
// frequently uses FileId::default().
static EMPTY_FILE_ID: LazyLock<Arc<str>> = LazyLock::new(|| Arc::from(""));

/// FileId is an identifier for a file (may be local or remote).
///
/// FileId is normally useful in the context of source positions
/// where a source position is in a file.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct FileId(Arc<str>);

impl FileId {
    /// Creates an empty file identifier.
    pub fn new() -> Self {
        FileId::default()
    }

    /// Creates a file identifier from the path.
    pub fn from_path(path: &Path) -> Self {
        FileId(Arc::from(path.to_string_lossy().as_ref()))
    }

    /// Creates a file identifier from the slice. The slice
    /// is normally the file path.
    pub fn from_string(path: &str) -> Self {
        FileId(Arc::from(path))
    }
}

impl Default for FileId {
    fn default() -> Self {
        FileId(EMPTY_FILE_ID.clone())
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A position in a source file, by line and column (both 1-indexed).
///
/// Positions order by line, then column, which gives the canonical
/// ordering used when joining two spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self { line: 1, column: 1 }
    }
}

/// Location in a file of a language element instance.
#[derive(Debug, Clone)]
pub struct SourceSpan {
    /// The position of the first character of the element.
    pub start: Position,
    /// The position of the last character of the element.
    pub end: Position,
    pub file_id: FileId,
}

impl SourceSpan {
    /// Joins two spans into the span that covers both: the earliest
    /// start and the latest end. The operation is commutative and
    /// associative.
    pub fn join(a: &SourceSpan, b: &SourceSpan) -> Self {
        Self {
            start: Ord::min(a.start, b.start),
            end: Ord::max(a.end, b.end),
            file_id: if a.start <= b.start {
                a.file_id.clone()
            } else {
                b.file_id.clone()
            },
        }
    }

    pub fn range(start: Position, end: Position) -> Self {
        Self {
            start,
            end,
            file_id: FileId::default(),
        }
    }

    pub fn point(line: usize, column: usize) -> Self {
        let position = Position::new(line, column);
        Self::range(position, position)
    }

    pub fn with_file_id(&self, file_id: &FileId) -> Self {
        Self {
            start: self.start,
            end: self.end,
            file_id: file_id.clone(),
        }
    }
}

impl Default for SourceSpan {
    fn default() -> Self {
        SourceSpan::range(Position::default(), Position::default())
    }
}

impl PartialEq for SourceSpan {
    fn eq(&self, _other: &Self) -> bool {
        // Two source locations are equal by default? Yes - when comparing
        // items, we rarely want to know that they were declared at the same
        // position. With this, we can use the derived "PartialEq"
        // implementation for language elements.
        true
    }
}
impl Eq for SourceSpan {}

/// Defines an element that has a location in source code.
pub trait Located {
    /// Get the source code position of the object.
    fn span(&self) -> SourceSpan;
}

/// Identity of an annotatable node in the syntax tree.
///
/// Passes attach information to nodes (constant values, candidate data
/// types, the chosen data type) through maps keyed by the node identity
/// rather than by mutating the tree. Identifiers are assigned when the
/// tree is built, normally by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// An identifier that no annotation will ever be attached to.
    /// Useful for synthesized nodes that exist only during emission.
    pub const UNASSIGNED: NodeId = NodeId(0);
}

/// Hands out node identifiers in a monotonic sequence.
#[derive(Debug)]
pub struct NodeIdGen {
    next: u32,
}

impl NodeIdGen {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }
}

impl Default for NodeIdGen {
    fn default() -> Self {
        Self::new()
    }
}

/// Implements Identifier.
///
/// 61131-3 declares that identifiers are case insensitive.
/// This class ensures that we do case insensitive comparisons
/// and can use containers as appropriate.
pub struct Id {
    pub original: String,
    pub lower_case: String,
    pub span: SourceSpan,
}

impl Id {
    /// Converts a `&str` into an `Identifier`.
    pub fn from(str: &str) -> Self {
        Id {
            original: String::from(str),
            lower_case: String::from(str).to_lowercase(),
            span: SourceSpan::default(),
        }
    }

    pub fn with_position(mut self, loc: SourceSpan) -> Self {
        self.span = loc;
        self
    }

    /// Converts an `Identifier` into a lower case `String`.
    pub fn lower_case(&self) -> &String {
        &self.lower_case
    }

    pub fn original(&self) -> &String {
        &self.original
    }
}

impl Clone for Id {
    fn clone(&self) -> Self {
        Id::from(self.original.as_str()).with_position(self.span.clone())
    }
}

impl PartialEq for Id {
    fn eq(&self, other: &Self) -> bool {
        self.lower_case == other.lower_case
    }
}
impl Eq for Id {}

impl PartialOrd for Id {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Id {
    fn cmp(&self, other: &Self) -> Ordering {
        self.lower_case.cmp(&other.lower_case)
    }
}

impl Hash for Id {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lower_case.hash(state);
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl Located for Id {
    fn span(&self) -> SourceSpan {
        self.span.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_when_case_differs_then_equal() {
        assert_eq!(Id::from("Trig"), Id::from("TRIG"));
    }

    #[test]
    fn span_join_when_reversed_then_same_result() {
        let a = SourceSpan::range(Position::new(2, 4), Position::new(2, 9));
        let b = SourceSpan::range(Position::new(5, 1), Position::new(5, 3));
        let j1 = SourceSpan::join(&a, &b);
        let j2 = SourceSpan::join(&b, &a);
        assert_eq!(j1.start, j2.start);
        assert_eq!(j1.end, j2.end);
        assert_eq!(j1.start, Position::new(2, 4));
        assert_eq!(j1.end, Position::new(5, 3));
    }

    #[test]
    fn span_join_when_associated_differently_then_same_result() {
        let a = SourceSpan::point(1, 1);
        let b = SourceSpan::point(3, 7);
        let c = SourceSpan::point(2, 2);
        let left = SourceSpan::join(&SourceSpan::join(&a, &b), &c);
        let right = SourceSpan::join(&a, &SourceSpan::join(&b, &c));
        assert_eq!(left.start, right.start);
        assert_eq!(left.end, right.end);
    }

    #[test]
    fn node_id_gen_when_next_then_unique() {
        let mut gen = NodeIdGen::new();
        let a = gen.next();
        let b = gen.next();
        assert_ne!(a, b);
        assert_ne!(a, NodeId::UNASSIGNED);
    }

    #[test]
    fn file_id_when_display_then_returns_value() {
        let file_id = FileId::from_string("test/file.st");
        assert_eq!(format!("{file_id}"), "test/file.st");
    }
}
