//! Provides definitions of objects from the IEC 61131-3 common elements:
//! data types, literals, variable declarations and program organization
//! units.
//!
//! See sections 2.2 (constants), 2.3 (data types), 2.4.3 (declaration)
//! and 2.5 (program organization units).
use core::fmt;

use crate::core::{Id, Located, NodeId, SourceSpan};
use crate::textual::{ExprKind, InstructionList, Statements};
use crate::time::{DateAndTimeLiteral, DateLiteral, DurationLiteral, TimeOfDayLiteral};

/// The name of a data type: one of the elementary type names from
/// section 2.3.1, a literal pseudo-type, or a derived (user defined)
/// type name.
///
/// The literal pseudo-types stand for untyped numeric literals whose
/// concrete width is not yet fixed; code emission resolves them to the
/// widest member of their family.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeName {
    Bool,
    Byte,
    Word,
    Dword,
    Lword,
    Sint,
    Int,
    Dint,
    Lint,
    Usint,
    Uint,
    Udint,
    Ulint,
    Real,
    Lreal,
    Time,
    Date,
    TimeOfDay,
    DateAndTime,
    String,
    WString,
    LiteralInt,
    LiteralReal,
    Derived(Id),
}

impl TypeName {
    pub fn is_bool(&self) -> bool {
        matches!(self, TypeName::Bool)
    }

    pub fn is_literal_integer(&self) -> bool {
        matches!(self, TypeName::LiteralInt)
    }

    pub fn is_literal_real(&self) -> bool {
        matches!(self, TypeName::LiteralReal)
    }

    /// ANY_BIT, plus the untyped integer literal which may stand in
    /// for a bit string.
    pub fn is_binary(&self) -> bool {
        matches!(
            self,
            TypeName::Bool
                | TypeName::Byte
                | TypeName::Word
                | TypeName::Dword
                | TypeName::Lword
                | TypeName::LiteralInt
        )
    }

    pub fn is_signed_integer(&self) -> bool {
        matches!(
            self,
            TypeName::Sint | TypeName::Int | TypeName::Dint | TypeName::Lint
        )
    }

    pub fn is_unsigned_integer(&self) -> bool {
        matches!(
            self,
            TypeName::Usint | TypeName::Uint | TypeName::Udint | TypeName::Ulint
        )
    }

    /// ANY_INT, plus the untyped integer literal.
    pub fn is_integer(&self) -> bool {
        self.is_signed_integer() || self.is_unsigned_integer() || self.is_literal_integer()
    }

    /// ANY_REAL, plus the untyped real literal.
    pub fn is_real(&self) -> bool {
        matches!(self, TypeName::Real | TypeName::Lreal | TypeName::LiteralReal)
    }

    /// ANY_NUM.
    pub fn is_num(&self) -> bool {
        self.is_integer() || self.is_real()
    }

    pub fn is_time(&self) -> bool {
        matches!(self, TypeName::Time)
    }

    /// Whether two type names may hold the same value, unifying the
    /// literal pseudo-types with their families.
    pub fn is_same_type(&self, other: &TypeName) -> bool {
        if self == other {
            return true;
        }
        if self.is_literal_integer() {
            return other.is_integer() || other.is_binary();
        }
        if other.is_literal_integer() {
            return self.is_integer() || self.is_binary();
        }
        if self.is_literal_real() {
            return other.is_real();
        }
        if other.is_literal_real() {
            return self.is_real();
        }
        false
    }

    /// The spelling used in generated C for casts and for the members
    /// of the accumulator union (`BOOLvar`, `LINTvar`, ...). Untyped
    /// literals resolve to the widest member of their family.
    pub fn c_name(&self) -> String {
        match self {
            TypeName::Bool => "BOOL".to_owned(),
            TypeName::Byte => "BYTE".to_owned(),
            TypeName::Word => "WORD".to_owned(),
            TypeName::Dword => "DWORD".to_owned(),
            TypeName::Lword => "LWORD".to_owned(),
            TypeName::Sint => "SINT".to_owned(),
            TypeName::Int => "INT".to_owned(),
            TypeName::Dint => "DINT".to_owned(),
            TypeName::Lint => "LINT".to_owned(),
            TypeName::Usint => "USINT".to_owned(),
            TypeName::Uint => "UINT".to_owned(),
            TypeName::Udint => "UDINT".to_owned(),
            TypeName::Ulint => "ULINT".to_owned(),
            TypeName::Real => "REAL".to_owned(),
            TypeName::Lreal => "LREAL".to_owned(),
            TypeName::Time => "TIME".to_owned(),
            TypeName::Date => "DATE".to_owned(),
            TypeName::TimeOfDay => "TOD".to_owned(),
            TypeName::DateAndTime => "DT".to_owned(),
            TypeName::String => "STRING".to_owned(),
            TypeName::WString => "WSTRING".to_owned(),
            TypeName::LiteralInt => "LINT".to_owned(),
            TypeName::LiteralReal => "LREAL".to_owned(),
            TypeName::Derived(name) => name.original().to_uppercase(),
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.c_name())
    }
}

/// The radix of an integer or bit string literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegerBase {
    Decimal,
    Binary,
    Octal,
    Hexadecimal,
}

impl IntegerBase {
    pub fn radix(&self) -> u32 {
        match self {
            IntegerBase::Decimal => 10,
            IntegerBase::Binary => 2,
            IntegerBase::Octal => 8,
            IntegerBase::Hexadecimal => 16,
        }
    }
}

/// An integer literal in any radix, possibly negative, possibly with a
/// type prefix (`INT#4`).
///
/// The digits are kept as written (underscores included) so that range
/// checking can interpret them in both the signed and unsigned families.
///
/// See section 2.2.1.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegerLiteral {
    pub id: NodeId,
    pub span: SourceSpan,
    /// The digits, without radix prefix or sign.
    pub value: String,
    pub base: IntegerBase,
    pub is_neg: bool,
    /// Present for typed literals such as `INT#4`.
    pub data_type: Option<TypeName>,
}

impl Located for IntegerLiteral {
    fn span(&self) -> SourceSpan {
        self.span.clone()
    }
}

/// A real literal, possibly negative, possibly typed (`LREAL#1.5`).
/// Also covers the fixed point notation used inside durations.
///
/// See section 2.2.1.
#[derive(Debug, Clone, PartialEq)]
pub struct RealLiteral {
    pub id: NodeId,
    pub span: SourceSpan,
    /// The digits as written, underscores included.
    pub value: String,
    pub is_neg: bool,
    pub data_type: Option<TypeName>,
}

impl Located for RealLiteral {
    fn span(&self) -> SourceSpan {
        self.span.clone()
    }
}

/// A boolean literal, possibly typed (`BOOL#TRUE`).
#[derive(Debug, Clone, PartialEq)]
pub struct BoolLiteral {
    pub id: NodeId,
    pub span: SourceSpan,
    pub value: bool,
    pub data_type: Option<TypeName>,
}

impl Located for BoolLiteral {
    fn span(&self) -> SourceSpan {
        self.span.clone()
    }
}

/// A typed bit string literal such as `WORD#16#7FFF`.
///
/// See section 2.2.1.
#[derive(Debug, Clone, PartialEq)]
pub struct BitStringLiteral {
    pub id: NodeId,
    pub span: SourceSpan,
    pub value: String,
    pub base: IntegerBase,
    pub data_type: TypeName,
}

impl Located for BitStringLiteral {
    fn span(&self) -> SourceSpan {
        self.span.clone()
    }
}

/// A character string literal.
///
/// See section 2.2.2.
#[derive(Debug, Clone, PartialEq)]
pub struct StringLiteral {
    pub id: NodeId,
    pub span: SourceSpan,
    pub value: String,
    /// Double-byte (WSTRING) rather than single-byte (STRING).
    pub wide: bool,
}

impl Located for StringLiteral {
    fn span(&self) -> SourceSpan {
        self.span.clone()
    }
}

/// A value from an enumeration, possibly qualified with the enumeration
/// type name (`MyColors#Red`).
#[derive(Debug, Clone, PartialEq)]
pub struct EnumeratedValue {
    pub id: NodeId,
    pub type_name: Option<Id>,
    pub value: Id,
}

impl Located for EnumeratedValue {
    fn span(&self) -> SourceSpan {
        self.value.span()
    }
}

/// A constant of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantKind {
    IntegerLiteral(IntegerLiteral),
    RealLiteral(RealLiteral),
    BoolLiteral(BoolLiteral),
    BitStringLiteral(BitStringLiteral),
    StringLiteral(StringLiteral),
    Duration(DurationLiteral),
    Date(DateLiteral),
    TimeOfDay(TimeOfDayLiteral),
    DateAndTime(DateAndTimeLiteral),
}

impl ConstantKind {
    pub fn node_id(&self) -> NodeId {
        match self {
            ConstantKind::IntegerLiteral(node) => node.id,
            ConstantKind::RealLiteral(node) => node.id,
            ConstantKind::BoolLiteral(node) => node.id,
            ConstantKind::BitStringLiteral(node) => node.id,
            ConstantKind::StringLiteral(node) => node.id,
            ConstantKind::Duration(node) => node.id,
            ConstantKind::Date(node) => node.id,
            ConstantKind::TimeOfDay(node) => node.id,
            ConstantKind::DateAndTime(node) => node.id,
        }
    }
}

impl Located for ConstantKind {
    fn span(&self) -> SourceSpan {
        match self {
            ConstantKind::IntegerLiteral(node) => node.span(),
            ConstantKind::RealLiteral(node) => node.span(),
            ConstantKind::BoolLiteral(node) => node.span(),
            ConstantKind::BitStringLiteral(node) => node.span(),
            ConstantKind::StringLiteral(node) => node.span(),
            ConstantKind::Duration(node) => node.span(),
            ConstantKind::Date(node) => node.span(),
            ConstantKind::TimeOfDay(node) => node.span(),
            ConstantKind::DateAndTime(node) => node.span(),
        }
    }
}

/// The kind of a variable declaration block.
///
/// See section 2.4.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableType {
    /// `VAR`
    Var,
    /// `VAR_TEMP`
    VarTemp,
    /// `VAR_INPUT`
    Input,
    /// `VAR_OUTPUT`
    Output,
    /// `VAR_IN_OUT`
    InOut,
    /// `VAR_EXTERNAL`
    External,
    /// `VAR_GLOBAL`
    Global,
}

/// The storage qualifier on a variable declaration block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationQualifier {
    Unspecified,
    Constant,
    Retain,
    NonRetain,
}

/// A subrange of an integer type, e.g. the bounds of one array
/// dimension.
///
/// See section 2.4.2.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subrange {
    pub lower: i64,
    pub upper: i64,
}

/// An array specification: dimensions and the element type.
///
/// See section 2.4.2.2.
#[derive(Debug, Clone, PartialEq)]
pub struct ArraySpec {
    pub dimensions: Vec<Subrange>,
    pub element: TypeName,
}

/// A single variable declaration.
///
/// See section 2.4.3.1.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub id: NodeId,
    pub identifier: Id,
    pub var_type: VariableType,
    pub qualifier: DeclarationQualifier,
    pub data_type: TypeName,
    /// Present when the declared type is an array of `data_type`.
    pub array_spec: Option<ArraySpec>,
    pub initializer: Option<ExprKind>,
    /// A direct hardware address (`AT %IX0.0`), without the percent sign
    /// stripped.
    pub location: Option<String>,
    /// An extensible parameter of a standard function (`IN1 ..`); such
    /// parameters accept a variable number of arguments.
    pub extensible: bool,
    pub position: SourceSpan,
}

impl VarDecl {
    pub fn simple(id: NodeId, identifier: &str, data_type: TypeName) -> Self {
        Self {
            id,
            identifier: Id::from(identifier),
            var_type: VariableType::Var,
            qualifier: DeclarationQualifier::Unspecified,
            data_type,
            array_spec: None,
            initializer: None,
            location: None,
            extensible: false,
            position: SourceSpan::default(),
        }
    }

    pub fn with_var_type(mut self, var_type: VariableType) -> Self {
        self.var_type = var_type;
        self
    }

    pub fn with_qualifier(mut self, qualifier: DeclarationQualifier) -> Self {
        self.qualifier = qualifier;
        self
    }

    pub fn with_initializer(mut self, initializer: ExprKind) -> Self {
        self.initializer = Some(initializer);
        self
    }
}

impl Located for VarDecl {
    fn span(&self) -> SourceSpan {
        self.position.clone()
    }
}

/// The body of a program organization unit: either a list of structured
/// text statements or an instruction list.
#[derive(Debug, Clone, PartialEq)]
pub enum PouBody {
    Statements(Statements),
    Instructions(InstructionList),
}

/// A function declaration.
///
/// See section 2.5.1.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub id: NodeId,
    pub name: Id,
    pub return_type: TypeName,
    pub variables: Vec<VarDecl>,
    pub body: PouBody,
}

impl Located for FunctionDeclaration {
    fn span(&self) -> SourceSpan {
        self.name.span()
    }
}

/// A function block declaration.
///
/// See section 2.5.2.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionBlockDeclaration {
    pub id: NodeId,
    pub name: Id,
    pub variables: Vec<VarDecl>,
    pub body: PouBody,
    pub span: SourceSpan,
}

impl Located for FunctionBlockDeclaration {
    fn span(&self) -> SourceSpan {
        self.span.clone()
    }
}

/// A program declaration.
///
/// See section 2.5.3.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramDeclaration {
    pub id: NodeId,
    pub name: Id,
    pub variables: Vec<VarDecl>,
    pub body: PouBody,
}

impl Located for ProgramDeclaration {
    fn span(&self) -> SourceSpan {
        self.name.span()
    }
}

/// Any top level element of a library.
#[derive(Debug, Clone, PartialEq)]
pub enum LibraryElementKind {
    FunctionDeclaration(FunctionDeclaration),
    FunctionBlockDeclaration(FunctionBlockDeclaration),
    ProgramDeclaration(ProgramDeclaration),
    /// `VAR_GLOBAL` blocks from a configuration.
    GlobalVarDecls(Vec<VarDecl>),
}

/// A whole set of source declarations, normally the output of parsing
/// one or more files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Library {
    pub elements: Vec<LibraryElementKind>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins the elements of another library into this library.
    pub fn extend(mut self, other: Library) -> Self {
        self.elements.extend(other.elements);
        self
    }
}
