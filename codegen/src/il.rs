//! Lowers instruction list bodies into C.
//!
//! IL executes against an implicit accumulator. The generated C models
//! the accumulator as a local union variable, `IL_DEFVAR`, with one
//! member per elementary type; each operation selects the member that
//! matches the data type currently held. A second union variable,
//! `IL_DEFVAR_BACK`, carries the result of a parenthesised instruction
//! list out to the enclosing operation:
//!
//! ```text
//!         LD var1
//!         AND (
//!         LD var2
//!         OR var3
//!         )
//! ```
//!
//! becomes
//!
//! ```text
//! {
//!   IL_DEFVAR_T IL_DEFVAR;
//!   IL_DEFVAR_T IL_DEFVAR_BACK;
//!   IL_DEFVAR_BACK.INTvar = 0;
//!
//!   IL_DEFVAR.BOOLvar = var1;
//!   {
//!     IL_DEFVAR_T IL_DEFVAR;
//!
//!     IL_DEFVAR.BOOLvar = var2;
//!     IL_DEFVAR.BOOLvar |= var3;
//!
//!     IL_DEFVAR_BACK = IL_DEFVAR;
//!   }
//!   IL_DEFVAR.BOOLvar &= IL_DEFVAR_BACK.BOOLvar;
//!   END_LABEL: ;
//! }
//! ```
//!
//! The `AND (` operation only executes once the parenthesis closes, so
//! the emitter tracks the data type currently stored in the accumulator
//! to know which union member the deferred operation must read.
//!
//! Type errors have been reported by the analysis passes before this
//! runs; a violated precondition here aborts emission as an internal
//! error.
use log::trace;
use oxplc_analyzer::scope::VariableClass;
use oxplc_analyzer::{FunctionBlockEnvironment, ScopeEnvironment, SemanticContext};
use oxplc_dsl::analysis::AnnotationMap;
use oxplc_dsl::common::*;
use oxplc_dsl::constant::CompareOp;
use oxplc_dsl::core::{Id, NodeId};
use oxplc_dsl::textual::*;

use crate::emit::CodeWriter;
use crate::error::CodegenError;

/// The type of the IL accumulator union.
const IL_DEFVAR_T: &str = "IL_DEFVAR_T";
/// The accumulator itself.
const IL_DEFVAR: &str = "IL_DEFVAR";
/// The variable that passes a parenthesised result to the enclosing
/// scope.
const IL_DEFVAR_BACK: &str = "IL_DEFVAR_BACK";
/// The label that RET operators branch to, emitted at the tail of every
/// body.
const END_LABEL: &str = "END_LABEL";
/// Appended to a FB type name to form the name of its body function.
const FB_FUNCTION_SUFFIX: &str = "_body__";
/// The parameter through which wrapper calls receive the instance data.
const FB_FUNCTION_PARAM: &str = "data__";

/// Controls how variable accesses are spelled.
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// When set, variables are reached through the accessor macros
    /// (`GET_VAR`, `SET_VAR`, ...) with this instance prefix, the way
    /// function block and program bodies are generated. When absent,
    /// variables are plain C locals, the way function bodies are
    /// generated.
    pub variable_prefix: Option<String>,
}

/// How a variable reference is being emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VarGen {
    /// As a value in an expression.
    Expression,
    /// As the target of an assignment.
    Assignment,
    /// As a by-reference output argument.
    OutputByRef,
}

/// The operand of an IL operation: either an expression from the
/// source, or the result of a parenthesised list waiting in
/// `IL_DEFVAR_BACK`.
#[derive(Clone, Copy)]
enum Operand<'a> {
    Expr(&'a ExprKind),
    Back,
}

/// Lowers the instruction list body of a program.
pub fn lower_program(
    w: &mut CodeWriter,
    decl: &ProgramDeclaration,
    context: &SemanticContext,
    annotations: &AnnotationMap,
    config: &OutputConfig,
) -> Result<(), CodegenError> {
    let scope = ScopeEnvironment::for_program(decl);
    lower_pou_body(w, &decl.name, &decl.body, &scope, context, annotations, config)
}

/// Lowers the instruction list body of a function.
pub fn lower_function(
    w: &mut CodeWriter,
    decl: &FunctionDeclaration,
    context: &SemanticContext,
    annotations: &AnnotationMap,
    config: &OutputConfig,
) -> Result<(), CodegenError> {
    let scope = ScopeEnvironment::for_function(decl);
    lower_pou_body(w, &decl.name, &decl.body, &scope, context, annotations, config)
}

/// Lowers the instruction list body of a function block.
pub fn lower_function_block(
    w: &mut CodeWriter,
    decl: &FunctionBlockDeclaration,
    context: &SemanticContext,
    annotations: &AnnotationMap,
    config: &OutputConfig,
) -> Result<(), CodegenError> {
    let scope = ScopeEnvironment::for_function_block(decl);
    lower_pou_body(w, &decl.name, &decl.body, &scope, context, annotations, config)
}

fn lower_pou_body(
    w: &mut CodeWriter,
    pou_name: &Id,
    body: &PouBody,
    scope: &ScopeEnvironment,
    context: &SemanticContext,
    annotations: &AnnotationMap,
    config: &OutputConfig,
) -> Result<(), CodegenError> {
    match body {
        PouBody::Instructions(list) => {
            let mut lowering = IlLowering::new(w, pou_name, scope, context, annotations, config);
            lowering.lower_instruction_list(list)
        }
        PouBody::Statements(_) => Err(CodegenError::Unsupported(
            "structured text body in the instruction list emitter".to_string(),
        )),
    }
}

pub(crate) struct IlLowering<'a> {
    w: &'a mut CodeWriter,
    pou_name: &'a Id,
    scope: &'a ScopeEnvironment,
    context: &'a SemanticContext,
    annotations: &'a AnnotationMap,
    config: &'a OutputConfig,
    /// The data type of the value currently stored in the accumulator.
    defvar_type: Option<TypeName>,
    /// The data type of the value currently stored in the back
    /// variable.
    backvar_type: Option<TypeName>,
    /// Numbers the wrapper calls generated for functions with output
    /// parameters.
    fcall_number: u32,
}

impl<'a> IlLowering<'a> {
    pub(crate) fn new(
        w: &'a mut CodeWriter,
        pou_name: &'a Id,
        scope: &'a ScopeEnvironment,
        context: &'a SemanticContext,
        annotations: &'a AnnotationMap,
        config: &'a OutputConfig,
    ) -> Self {
        Self {
            w,
            pou_name,
            scope,
            context,
            annotations,
            config,
            defvar_type: None,
            backvar_type: None,
            fcall_number: 0,
        }
    }

    fn function_blocks(&self) -> &'a FunctionBlockEnvironment {
        let context: &'a SemanticContext = self.context;
        &context.function_blocks
    }

    // Accumulator access

    /// Emits the accumulator (or the back variable) selecting the union
    /// member for the given type. Untyped literal values live in the
    /// widest member of their family.
    fn print_union_var(&mut self, name: &str, data_type: Option<&TypeName>) {
        self.w.print(name);
        if let Some(t) = data_type {
            self.w.print(".");
            self.w.print(&t.c_name());
            self.w.print("var");
        }
    }

    fn print_accumulator(&mut self) {
        let t = self.defvar_type.clone();
        self.print_union_var(IL_DEFVAR, t.as_ref());
    }

    /// Emits the accumulator through a specific union member without
    /// changing the tracked type.
    fn print_accumulator_as(&mut self, data_type: &TypeName) {
        let t = data_type.clone();
        self.print_union_var(IL_DEFVAR, Some(&t));
    }

    fn current_type(&self, operator: IlOperator) -> Result<TypeName, CodegenError> {
        self.defvar_type.clone().ok_or_else(|| {
            CodegenError::MissingType(format!("accumulator undefined before {operator}"))
        })
    }

    /// Guards an operation on the accumulator being a BOOL:
    /// `if (IL_DEFVAR.BOOLvar) `.
    fn c_modifier(&mut self) -> Result<(), CodegenError> {
        if !matches!(self.defvar_type, Some(ref t) if t.is_bool()) {
            return Err(CodegenError::AccumulatorTypeMismatch(
                "conditional operator requires a BOOL accumulator".to_string(),
            ));
        }
        self.w.print("if (");
        self.print_accumulator();
        self.w.print(") ");
        Ok(())
    }

    /// The negated guard: `if (!IL_DEFVAR.BOOLvar) `.
    fn cn_modifier(&mut self) -> Result<(), CodegenError> {
        if !matches!(self.defvar_type, Some(ref t) if t.is_bool()) {
            return Err(CodegenError::AccumulatorTypeMismatch(
                "conditional operator requires a BOOL accumulator".to_string(),
            ));
        }
        self.w.print("if (!");
        self.print_accumulator();
        self.w.print(") ");
        Ok(())
    }

    // Operand typing and emission

    /// The data type of an IL operand. A variable gets the declared
    /// type of the accessed instance; an untyped numeric literal gets
    /// the literal pseudo-type of its family.
    fn operand_type(&self, operand: &Operand) -> Result<TypeName, CodegenError> {
        match operand {
            Operand::Back => self.backvar_type.clone().ok_or_else(|| {
                CodegenError::MissingType("parenthesised list produced no value".to_string())
            }),
            Operand::Expr(expr) => self.expr_type(expr),
        }
    }

    fn expr_type(&self, expr: &ExprKind) -> Result<TypeName, CodegenError> {
        match expr {
            ExprKind::Const(constant) => Ok(match constant {
                ConstantKind::IntegerLiteral(lit) => {
                    lit.data_type.clone().unwrap_or(TypeName::LiteralInt)
                }
                ConstantKind::RealLiteral(lit) => {
                    lit.data_type.clone().unwrap_or(TypeName::LiteralReal)
                }
                ConstantKind::BoolLiteral(lit) => lit.data_type.clone().unwrap_or(TypeName::Bool),
                ConstantKind::BitStringLiteral(lit) => lit.data_type.clone(),
                ConstantKind::StringLiteral(lit) => {
                    if lit.wide {
                        TypeName::WString
                    } else {
                        TypeName::String
                    }
                }
                ConstantKind::Duration(_) => TypeName::Time,
                ConstantKind::Date(_) => TypeName::Date,
                ConstantKind::TimeOfDay(_) => TypeName::TimeOfDay,
                ConstantKind::DateAndTime(_) => TypeName::DateAndTime,
            }),
            ExprKind::Variable(variable) => self
                .scope
                .instance_type(variable, self.function_blocks())
                .or_else(|| self.annotations.datatype(variable.node_id()).cloned())
                .ok_or_else(|| CodegenError::UndeclaredVariable(variable.to_string())),
            ExprKind::EnumeratedValue(value) => self
                .annotations
                .datatype(value.id)
                .cloned()
                .ok_or_else(|| CodegenError::MissingType(format!("enumerated value {}", value.value))),
            _ => Err(CodegenError::Unsupported(
                "expression as IL operand".to_string(),
            )),
        }
    }

    fn print_operand(&mut self, operand: &Operand, mode: VarGen) -> Result<(), CodegenError> {
        match operand {
            Operand::Back => {
                let t = self.backvar_type.clone();
                self.print_union_var(IL_DEFVAR_BACK, t.as_ref());
                Ok(())
            }
            Operand::Expr(expr) => self.print_expr(expr, mode),
        }
    }

    fn print_expr(&mut self, expr: &ExprKind, mode: VarGen) -> Result<(), CodegenError> {
        match expr {
            ExprKind::Const(constant) => self.print_constant(constant),
            ExprKind::Variable(variable) => self.print_variable(variable, mode),
            ExprKind::EnumeratedValue(value) => {
                self.w.print(value.value.original());
                Ok(())
            }
            _ => Err(CodegenError::Unsupported(
                "expression as IL operand".to_string(),
            )),
        }
    }

    fn print_constant(&mut self, constant: &ConstantKind) -> Result<(), CodegenError> {
        match constant {
            ConstantKind::IntegerLiteral(lit) => {
                let digits: String = lit.value.chars().filter(|c| *c != '_').collect();
                let magnitude = u64::from_str_radix(&digits, lit.base.radix()).map_err(|_| {
                    CodegenError::Unsupported(format!("integer literal out of range: {digits}"))
                })?;
                if lit.is_neg {
                    self.w.print("-");
                }
                self.w.print(&magnitude.to_string());
                Ok(())
            }
            ConstantKind::RealLiteral(lit) => {
                let digits: String = lit.value.chars().filter(|c| *c != '_').collect();
                if lit.is_neg {
                    self.w.print("-");
                }
                self.w.print(&digits);
                Ok(())
            }
            ConstantKind::BoolLiteral(lit) => {
                self.w.print(if lit.value {
                    "__BOOL_LITERAL(TRUE)"
                } else {
                    "__BOOL_LITERAL(FALSE)"
                });
                Ok(())
            }
            ConstantKind::BitStringLiteral(lit) => {
                let digits: String = lit.value.chars().filter(|c| *c != '_').collect();
                let magnitude = u64::from_str_radix(&digits, lit.base.radix()).map_err(|_| {
                    CodegenError::Unsupported(format!("bit string literal out of range: {digits}"))
                })?;
                self.w.print(&magnitude.to_string());
                Ok(())
            }
            ConstantKind::Duration(lit) => {
                let sign = if lit.is_neg { -1 } else { 1 };
                let seconds = lit.interval.whole_seconds();
                let milliseconds = lit.interval.subsec_milliseconds();
                self.w.print(&format!(
                    "__time_to_timespec({sign}, {milliseconds}, {seconds})"
                ));
                Ok(())
            }
            ConstantKind::Date(lit) => {
                self.w.print(&format!(
                    "__date_to_timespec({}, {}, {})",
                    lit.date.day(),
                    lit.date.month() as u8,
                    lit.date.year()
                ));
                Ok(())
            }
            ConstantKind::TimeOfDay(lit) => {
                self.w.print(&format!(
                    "__tod_to_timespec({}, {}, {})",
                    lit.time.second(),
                    lit.time.minute(),
                    lit.time.hour()
                ));
                Ok(())
            }
            ConstantKind::DateAndTime(lit) => {
                self.w.print(&format!(
                    "__dt_to_timespec({}, {}, {}, {}, {}, {})",
                    lit.value.second(),
                    lit.value.minute(),
                    lit.value.hour(),
                    lit.value.day(),
                    lit.value.month() as u8,
                    lit.value.year()
                ));
                Ok(())
            }
            ConstantKind::StringLiteral(_) => Err(CodegenError::Unsupported(
                "string literal as IL operand".to_string(),
            )),
        }
    }

    // Variable emission

    fn base_name<'e>(&self, variable: &'e Variable) -> Result<&'e Id, CodegenError> {
        variable
            .base_name()
            .ok_or_else(|| CodegenError::Unsupported("anonymous variable reference".to_string()))
    }

    fn variable_class(&self, variable: &Variable) -> Result<VariableClass, CodegenError> {
        self.scope
            .variable_class(variable)
            .ok_or_else(|| CodegenError::UndeclaredVariable(variable.to_string()))
    }

    /// Whether reaching the accessed element needs a suffix after the
    /// base variable (a field selector or array subscript).
    fn is_complex_access(&self, variable: &Variable) -> bool {
        !matches!(variable, Variable::Named(_) | Variable::Direct(_))
    }

    fn print_variable(&mut self, variable: &Variable, mode: VarGen) -> Result<(), CodegenError> {
        match self.config.variable_prefix.clone() {
            None => self.print_plain_variable(variable, mode),
            Some(prefix) => match mode {
                VarGen::Expression => self.print_getter(variable, &prefix, false),
                VarGen::OutputByRef => self.print_getter(variable, &prefix, true),
                VarGen::Assignment => {
                    // Assignment targets are spelled by the setter
                    // emitters, not here.
                    Err(CodegenError::Unsupported(
                        "assignment target outside a setter".to_string(),
                    ))
                }
            },
        }
    }

    fn print_plain_variable(
        &mut self,
        variable: &Variable,
        mode: VarGen,
    ) -> Result<(), CodegenError> {
        if let Variable::Direct(direct) = variable {
            // A located variable is reached through the pointer that
            // the runtime bound to its address.
            self.w.print("*(");
            self.w.printlocation(&direct.address);
            self.w.print(")");
            return Ok(());
        }
        if mode == VarGen::OutputByRef {
            self.w.print("&(");
            self.print_variable_path(variable)?;
            self.w.print(")");
            return Ok(());
        }
        self.print_variable_path(variable)
    }

    /// The plain C spelling of the access path: `base`, `base.field` or
    /// `base.table[(i) - (lower)]`.
    fn print_variable_path(&mut self, variable: &Variable) -> Result<(), CodegenError> {
        let name = self.base_name(variable)?.original().clone();
        self.w.print(&name);
        self.print_variable_suffix(variable)
    }

    fn print_variable_suffix(&mut self, variable: &Variable) -> Result<(), CodegenError> {
        match variable {
            Variable::Named(_) | Variable::Direct(_) => Ok(()),
            Variable::Structured(structured) => {
                self.print_variable_suffix(structured.record.as_ref())?;
                self.w.print(".");
                self.w.print(structured.field.original());
                Ok(())
            }
            Variable::Array(array) => {
                self.print_variable_suffix(array.variable.as_ref())?;
                let spec = self
                    .scope
                    .array_spec(array.variable.as_ref())
                    .cloned()
                    .ok_or_else(|| {
                        CodegenError::MissingType(format!(
                            "array specification for {}",
                            array.variable
                        ))
                    })?;
                self.w.print(".table");
                for (index, subscript) in array.subscripts.iter().enumerate() {
                    let dimension = spec.dimensions.get(index).ok_or_else(|| {
                        CodegenError::MissingType(format!(
                            "array dimension {index} for {}",
                            array.variable
                        ))
                    })?;
                    self.w.print("[(");
                    self.print_expr(subscript, VarGen::Expression)?;
                    self.w.print(") - (");
                    self.w.print(&dimension.lower.to_string());
                    self.w.print(")]");
                }
                Ok(())
            }
        }
    }

    /// `GET_VAR(<prefix><base>[,<suffix>])` and friends, selecting the
    /// accessor for the variable's storage class.
    fn print_getter(
        &mut self,
        variable: &Variable,
        prefix: &str,
        by_ref: bool,
    ) -> Result<(), CodegenError> {
        let class = self.variable_class(variable)?;
        let accessor = match (class, by_ref) {
            (VariableClass::External, false) => "GET_EXTERNAL",
            (VariableClass::External, true) => "GET_EXTERNAL_BY_REF",
            (VariableClass::Located, false) => "GET_LOCATED",
            (VariableClass::Located, true) => "GET_LOCATED_BY_REF",
            (VariableClass::Local, false) => "GET_VAR",
            (VariableClass::Local, true) => "GET_VAR_BY_REF",
        };
        self.w.print(accessor);
        self.w.print("(");
        if let Variable::Direct(direct) = variable {
            self.w.print(prefix);
            self.w.printlocation(&direct.address);
        } else {
            let name = self.base_name(variable)?.original().clone();
            self.w.print(prefix);
            self.w.print(&name);
            if self.is_complex_access(variable) {
                self.w.print(",");
                self.print_variable_suffix(variable)?;
            }
        }
        self.w.print(")");
        Ok(())
    }

    /// `SET_VAR(<prefix>,<base>,<value>[,<suffix>])` and friends. The
    /// value is emitted by the callback so stores can interpose a
    /// complement operator.
    fn print_setter(
        &mut self,
        variable: &Variable,
        prefix: &str,
        print_value: impl FnOnce(&mut Self) -> Result<(), CodegenError>,
    ) -> Result<(), CodegenError> {
        let class = self.variable_class(variable)?;
        let accessor = match class {
            VariableClass::External => "SET_EXTERNAL",
            VariableClass::Located => "SET_LOCATED",
            VariableClass::Local => "SET_VAR",
        };
        self.w.print(accessor);
        self.w.print("(");
        self.w.print(prefix);
        self.w.print(",");
        if let Variable::Direct(direct) = variable {
            self.w.printlocation(&direct.address);
        } else {
            let name = self.base_name(variable)?.original().clone();
            self.w.print(&name);
        }
        self.w.print(",");
        print_value(self)?;
        if self.is_complex_access(variable) {
            self.w.print(",");
            self.print_variable_suffix(variable)?;
        }
        self.w.print(")");
        Ok(())
    }

    // Promotion rules for untyped literals

    /// The promotion used by the bit string operators: two untyped
    /// integer literals meet in the widest bit string type; otherwise
    /// the non-literal side wins.
    fn byte_operator_result_type(&mut self, operand_type: &mut TypeName) {
        let current = self.defvar_type.clone();
        if let Some(current) = current {
            if current.is_literal_integer() {
                if operand_type.is_literal_integer() {
                    self.defvar_type = Some(TypeName::Lword);
                } else {
                    self.defvar_type = Some(operand_type.clone());
                }
            } else if operand_type.is_literal_integer() {
                *operand_type = current;
            }
        }
    }

    /// The promotion used by the arithmetic operators: untyped integer
    /// literals meet in the widest signed integer, anything touching an
    /// untyped real literal meets in the widest real; otherwise the
    /// non-literal side wins.
    fn num_operator_result_type(&mut self, operand_type: &mut TypeName) {
        let current = self.defvar_type.clone();
        let Some(current) = current else {
            return;
        };
        if current.is_literal_real() {
            if operand_type.is_literal_integer() || operand_type.is_literal_real() {
                self.defvar_type = Some(TypeName::Lreal);
            } else {
                self.defvar_type = Some(operand_type.clone());
            }
        } else if current.is_literal_integer() {
            if operand_type.is_literal_integer() {
                self.defvar_type = Some(TypeName::Lint);
            } else if operand_type.is_literal_real() {
                self.defvar_type = Some(TypeName::Lreal);
            } else {
                self.defvar_type = Some(operand_type.clone());
            }
        } else if operand_type.is_literal_integer() || operand_type.is_literal_real() {
            *operand_type = current;
        }
    }

    // Entry point

    /// Emits the whole body block for an instruction list.
    pub(crate) fn lower_instruction_list(
        &mut self,
        list: &InstructionList,
    ) -> Result<(), CodegenError> {
        trace!("lowering instruction list for {}", self.pou_name);
        self.w.print("{\n");
        self.w.indent_right();

        self.w.print_indent();
        self.w.print(IL_DEFVAR_T);
        self.w.print(" ");
        self.w.print(IL_DEFVAR);
        self.w.print(";\n");
        self.w.print_indent();
        self.w.print(IL_DEFVAR_T);
        self.w.print(" ");
        self.w.print(IL_DEFVAR_BACK);
        self.w.print(";\n");
        self.w.print_indent();
        self.w.print(IL_DEFVAR_BACK);
        self.w.print(".INTvar = 0;\n\n");

        for instruction in &list.instructions {
            if let Some(label) = &instruction.label {
                self.w.print(label.original());
                self.w.print(":\n");
            }
            if let Some(operation) = &instruction.operation {
                self.w.print_indent();
                self.lower_operation(operation)?;
                self.w.print(";\n");
            }
        }

        self.w.print_indent();
        self.w.print(END_LABEL);
        self.w.print(": ;\n");
        self.w.indent_left();
        self.w.print("}\n");
        Ok(())
    }

    fn lower_operation(&mut self, operation: &IlOperationKind) -> Result<(), CodegenError> {
        match operation {
            IlOperationKind::Simple(node) => {
                let operand = node.operand.as_ref().map(Operand::Expr);
                self.apply_operator(node.operator, operand)
            }
            IlOperationKind::Expression(node) => self.lower_expression(node),
            IlOperationKind::FunctionCall(node) => {
                self.emit_function_call(node.id, &node.name, &[], &node.operands, true)
            }
            IlOperationKind::FormalFunctionCall(node) => {
                self.emit_function_call(node.id, &node.name, &node.params, &[], false)
            }
            IlOperationKind::FbCall(node) => self.lower_fb_call(node),
            IlOperationKind::Jump(node) => self.lower_jump(node),
        }
    }

    // Parenthesised sub-lists

    fn lower_expression(&mut self, node: &IlExpression) -> Result<(), CodegenError> {
        // The inner list executes with a fresh accumulator in a nested
        // block. Any operand written after the parenthesis was rewritten
        // into an LD at the head of the list by the parser.
        let outer_type = self.defvar_type.take();

        self.w.print("{\n");
        self.w.indent_right();
        self.w.print_indent();
        self.w.print(IL_DEFVAR_T);
        self.w.print(" ");
        self.w.print(IL_DEFVAR);
        self.w.print(";\n\n");

        for instruction in &node.instructions {
            self.w.print_indent();
            self.lower_simple_instruction(instruction)?;
            self.w.print(";\n");
        }

        // Pass the result out to the enclosing scope, remembering its
        // type so the deferred operation can pick the union member.
        self.backvar_type = self.defvar_type.take();
        self.w.print("\n");
        self.w.print_indent();
        self.w.print(IL_DEFVAR_BACK);
        self.w.print(" = ");
        self.w.print(IL_DEFVAR);
        self.w.print(";\n");
        self.w.indent_left();
        self.w.print_indent();
        self.w.print("}\n");
        self.w.print_indent();

        // Now execute the deferred operation on the passed-out value.
        self.defvar_type = outer_type;
        self.apply_operator(node.operator, Some(Operand::Back))?;
        self.backvar_type = None;
        Ok(())
    }

    fn lower_simple_instruction(
        &mut self,
        instruction: &IlSimpleInstruction,
    ) -> Result<(), CodegenError> {
        match &instruction.operation {
            IlSimpleOperationKind::Simple(node) => {
                let operand = node.operand.as_ref().map(Operand::Expr);
                self.apply_operator(node.operator, operand)
            }
            IlSimpleOperationKind::FunctionCall(node) => {
                self.emit_function_call(node.id, &node.name, &[], &node.operands, true)
            }
            IlSimpleOperationKind::Expression(node) => self.lower_expression(node),
        }
    }

    // Operators

    fn apply_operator(
        &mut self,
        operator: IlOperator,
        operand: Option<Operand>,
    ) -> Result<(), CodegenError> {
        match operator {
            IlOperator::Ld => {
                let operand = self.required_operand(operator, operand)?;
                let operand_type = self.operand_type(&operand)?;
                self.defvar_type = Some(operand_type);
                self.print_accumulator();
                self.w.print(" = ");
                self.print_operand(&operand, VarGen::Expression)
            }
            IlOperator::Ldn => {
                let operand = self.required_operand(operator, operand)?;
                let operand_type = self.operand_type(&operand)?;
                self.defvar_type = Some(operand_type.clone());
                self.print_accumulator();
                self.w
                    .print(if operand_type.is_bool() { " = !" } else { " = ~" });
                self.print_operand(&operand, VarGen::Expression)
            }
            IlOperator::St => self.lower_store(operand, false),
            IlOperator::Stn => self.lower_store(operand, true),
            IlOperator::Not => {
                if operand.is_some() {
                    return Err(CodegenError::Unsupported(
                        "operand on the NOT operator".to_string(),
                    ));
                }
                let current = self.current_type(IlOperator::Not)?;
                self.print_accumulator();
                self.w
                    .print(if current.is_bool() { " = !" } else { " = ~" });
                self.print_accumulator();
                Ok(())
            }
            IlOperator::S => self.lower_set_reset(operand, true),
            IlOperator::R => self.lower_set_reset(operand, false),
            IlOperator::S1
            | IlOperator::R1
            | IlOperator::Clk
            | IlOperator::Cu
            | IlOperator::Cd
            | IlOperator::Pv
            | IlOperator::In
            | IlOperator::Pt => {
                let param = operator
                    .implicit_fb_param()
                    .expect("operator is an implicit FB invocation");
                self.lower_implicit_fb_call(param, operand)
            }
            IlOperator::And => self.lower_bit_operator(operator, operand, " &= ", None),
            IlOperator::Or => self.lower_bit_operator(operator, operand, " |= ", None),
            IlOperator::Xor => self.lower_bit_operator(operator, operand, " ^= ", None),
            IlOperator::Andn => self.lower_bit_operator(operator, operand, " &= !", Some(" &= ~")),
            IlOperator::Orn => self.lower_bit_operator(operator, operand, " |= !", Some(" |= ~")),
            IlOperator::Xorn => self.lower_bit_operator(operator, operand, " ^= !", Some(" ^= ~")),
            IlOperator::Add => self.lower_arith_operator(operator, operand, " += ", Some("__time_add")),
            IlOperator::Sub => self.lower_arith_operator(operator, operand, " -= ", Some("__time_sub")),
            IlOperator::Mul => self.lower_arith_operator(operator, operand, " *= ", Some("__time_mul")),
            IlOperator::Div => self.lower_arith_operator(operator, operand, " /= ", Some("__time_div")),
            IlOperator::Mod => self.lower_arith_operator(operator, operand, " %= ", None),
            IlOperator::Gt => self.lower_compare(CompareOp::Gt, operand),
            IlOperator::Ge => self.lower_compare(CompareOp::Ge, operand),
            IlOperator::Eq => self.lower_compare(CompareOp::Eq, operand),
            IlOperator::Lt => self.lower_compare(CompareOp::Lt, operand),
            IlOperator::Le => self.lower_compare(CompareOp::Le, operand),
            IlOperator::Ne => self.lower_compare(CompareOp::Ne, operand),
            IlOperator::Ret => {
                self.w.print("goto ");
                self.w.print(END_LABEL);
                Ok(())
            }
            IlOperator::Retc => {
                self.c_modifier()?;
                self.w.print("goto ");
                self.w.print(END_LABEL);
                Ok(())
            }
            IlOperator::Retcn => {
                self.cn_modifier()?;
                self.w.print("goto ");
                self.w.print(END_LABEL);
                Ok(())
            }
        }
    }

    fn required_operand<'o>(
        &self,
        operator: IlOperator,
        operand: Option<Operand<'o>>,
    ) -> Result<Operand<'o>, CodegenError> {
        operand.ok_or_else(|| {
            CodegenError::Unsupported(format!("missing operand for the {operator} operator"))
        })
    }

    fn lower_store(&mut self, operand: Option<Operand>, negated: bool) -> Result<(), CodegenError> {
        let operand = self.required_operand(IlOperator::St, operand)?;
        let Operand::Expr(ExprKind::Variable(variable)) = operand else {
            return Err(CodegenError::Unsupported(
                "store target is not a variable".to_string(),
            ));
        };
        let operand_type = self.operand_type(&operand)?;
        // A store of an untyped literal value adopts the target's type.
        if matches!(&self.defvar_type, Some(t) if t.is_literal_integer() || t.is_literal_real()) {
            self.defvar_type = Some(operand_type.clone());
        }
        let invert = if operand_type.is_bool() { "!" } else { "~" };
        match self.config.variable_prefix.clone() {
            None => {
                self.print_plain_variable(variable, VarGen::Assignment)?;
                self.w.print(" = ");
                if negated {
                    self.w.print(invert);
                }
                self.print_accumulator();
                Ok(())
            }
            Some(prefix) => self.print_setter(variable, &prefix, |this| {
                if negated {
                    this.w.print(invert);
                }
                this.print_accumulator();
                Ok(())
            }),
        }
        // The accumulator keeps its value and type across stores.
    }

    fn lower_set_reset(
        &mut self,
        operand: Option<Operand>,
        set: bool,
    ) -> Result<(), CodegenError> {
        let operator = if set { IlOperator::S } else { IlOperator::R };
        let operand = self.required_operand(operator, operand)?;
        let Operand::Expr(ExprKind::Variable(variable)) = operand else {
            return Err(CodegenError::Unsupported(
                "set/reset target is not a variable".to_string(),
            ));
        };
        let operand_type = self.operand_type(&operand)?;
        let literal: String = if operand_type.is_bool() {
            format!("__BOOL_LITERAL({})", if set { "TRUE" } else { "FALSE" })
        } else if operand_type.is_integer() {
            format!(
                "__{}_LITERAL({})",
                operand_type.c_name(),
                if set { "1" } else { "0" }
            )
        } else {
            return Err(CodegenError::AccumulatorTypeMismatch(
                "set/reset target is neither BOOL nor integer".to_string(),
            ));
        };
        self.c_modifier()?;
        match self.config.variable_prefix.clone() {
            None => {
                self.print_plain_variable(variable, VarGen::Assignment)?;
                self.w.print(" = ");
                self.w.print(&literal);
                Ok(())
            }
            Some(prefix) => self.print_setter(variable, &prefix, |this| {
                this.w.print(&literal);
                Ok(())
            }),
        }
    }

    /// AND, OR, XOR and their negated forms over ANY_BIT values.
    fn lower_bit_operator(
        &mut self,
        operator: IlOperator,
        operand: Option<Operand>,
        bool_op: &str,
        bit_op: Option<&str>,
    ) -> Result<(), CodegenError> {
        let operand = self.required_operand(operator, operand)?;
        let mut operand_type = self.operand_type(&operand)?;
        let current = self.current_type(operator)?;
        if !current.is_binary() || !current.is_same_type(&operand_type) {
            return Err(CodegenError::AccumulatorTypeMismatch(format!(
                "{operator} requires matching bit string operands"
            )));
        }
        self.byte_operator_result_type(&mut operand_type);
        // The negated forms complement booleans with ! and bit strings
        // with ~; the plain forms use the same C operator for both.
        let op_text = match bit_op {
            Some(bit_op) if !operand_type.is_bool() => bit_op,
            _ => bool_op,
        };
        self.print_accumulator();
        self.w.print(op_text);
        self.print_operand(&operand, VarGen::Expression)?;
        self.defvar_type = Some(operand_type);
        Ok(())
    }

    /// ADD, SUB, MUL, DIV and MOD over numeric values, with the TIME
    /// forms routed through the runtime helpers.
    fn lower_arith_operator(
        &mut self,
        operator: IlOperator,
        operand: Option<Operand>,
        op_text: &str,
        time_helper: Option<&str>,
    ) -> Result<(), CodegenError> {
        let operand = self.required_operand(operator, operand)?;
        let mut operand_type = self.operand_type(&operand)?;
        let current = self.current_type(operator)?;

        if let Some(helper) = time_helper {
            let time_form = match operator {
                // T + T and T - T
                IlOperator::Add | IlOperator::Sub => {
                    current.is_time() && operand_type.is_time()
                }
                // T * N and T / N
                IlOperator::Mul | IlOperator::Div => {
                    current.is_time() && operand_type.is_integer()
                }
                _ => false,
            };
            if time_form {
                // IL_DEFVAR.TIMEvar = __time_add(IL_DEFVAR.TIMEvar, operand)
                self.print_accumulator();
                self.w.print(" = ");
                self.w.print(helper);
                self.w.print("(");
                self.print_accumulator();
                self.w.print(", ");
                self.print_operand(&operand, VarGen::Expression)?;
                self.w.print(")");
                return Ok(());
            }
        }

        if !current.is_num() || !current.is_same_type(&operand_type) {
            return Err(CodegenError::AccumulatorTypeMismatch(format!(
                "{operator} requires matching numeric operands"
            )));
        }
        self.num_operator_result_type(&mut operand_type);
        self.print_accumulator();
        self.w.print(op_text);
        self.print_operand(&operand, VarGen::Expression)?;
        self.defvar_type = Some(operand_type);
        Ok(())
    }

    /// The comparisons call the runtime comparison function of the
    /// accumulator's current type and leave a BOOL behind:
    /// `IL_DEFVAR.BOOLvar = GT_INT(__BOOL_LITERAL(TRUE), NULL, 2, acc, operand)`.
    fn lower_compare(
        &mut self,
        op: CompareOp,
        operand: Option<Operand>,
    ) -> Result<(), CodegenError> {
        let operator = match op {
            CompareOp::Gt => IlOperator::Gt,
            CompareOp::Ge => IlOperator::Ge,
            CompareOp::Eq => IlOperator::Eq,
            CompareOp::Lt => IlOperator::Lt,
            CompareOp::Le => IlOperator::Le,
            CompareOp::Ne => IlOperator::Ne,
        };
        let operand = self.required_operand(operator, operand)?;
        let current = self.current_type(operator)?;

        self.print_accumulator_as(&TypeName::Bool);
        self.w.print(" = ");
        self.w.print(&format!("{operator}_"));
        self.w.print(&current.c_name());
        self.w.print("(__BOOL_LITERAL(TRUE), NULL, 2, ");
        self.print_accumulator();
        self.w.print(", ");
        self.print_operand(&operand, VarGen::Expression)?;
        self.w.print(")");
        self.defvar_type = Some(TypeName::Bool);
        Ok(())
    }

    fn lower_jump(&mut self, node: &IlJumpOperation) -> Result<(), CodegenError> {
        match node.operator {
            IlJumpOperator::Jmp => {}
            IlJumpOperator::Jmpc => self.c_modifier()?,
            IlJumpOperator::Jmpcn => self.cn_modifier()?,
        }
        self.w.print("goto ");
        self.w.print(node.label.original());
        Ok(())
    }

    // Function block invocation

    fn lower_fb_call(&mut self, node: &IlFbCall) -> Result<(), CodegenError> {
        match node.operator {
            IlCallOperator::Cal => {}
            IlCallOperator::Calc => self.c_modifier()?,
            IlCallOperator::Calcn => self.cn_modifier()?,
        }
        self.emit_fb_call(&node.fb_name, &node.params, &node.operands, None)
    }

    /// The implicit FB operators desugar to a CAL with a single named
    /// input carrying the accumulator, e.g. `S1 trigger` becomes
    /// `CAL trigger(S1 := <accumulator>)`.
    fn lower_implicit_fb_call(
        &mut self,
        param_name: &str,
        operand: Option<Operand>,
    ) -> Result<(), CodegenError> {
        let operand = operand.ok_or_else(|| {
            CodegenError::Unsupported(format!("missing operand for the {param_name} operator"))
        })?;
        let Operand::Expr(ExprKind::Variable(Variable::Named(named))) = operand else {
            return Err(CodegenError::Unsupported(
                "implicit FB operator requires a FB instance operand".to_string(),
            ));
        };
        self.emit_fb_call(&named.name, &[], &[], Some(param_name))
    }

    fn emit_fb_call(
        &mut self,
        fb_name: &Id,
        params: &[ParamAssignmentKind],
        operands: &[ExprKind],
        accumulator_param: Option<&str>,
    ) -> Result<(), CodegenError> {
        // First figure out the function block type of the instance
        // being called, then its declaration.
        let scope = self.scope;
        let function_blocks = self.function_blocks();
        let fb_type = scope
            .fb_type_name(fb_name, function_blocks)
            .ok_or_else(|| CodegenError::UndeclaredVariable(fb_name.to_string()))?;
        let fb_decl = function_blocks
            .find(fb_type)
            .ok_or_else(|| CodegenError::UnresolvedCall(fb_type.to_string()))?;
        let fb_type_name = fb_type.original().clone();
        let prefix = self.config.variable_prefix.clone();

        self.w.print("{\n");
        self.w.indent_right();
        self.w.print_indent();

        // Assign each input parameter the value supplied at the call
        // site, matched by name for formal calls and by position for
        // non-formal calls.
        let mut positional = operands.iter();
        let is_formal = params
            .iter()
            .any(|p| matches!(p, ParamAssignmentKind::NamedInput(_)));
        for decl in fb_decl.variables.iter().filter(|decl| {
            matches!(
                decl.var_type,
                VariableType::Input | VariableType::Output | VariableType::InOut
            )
        }) {
            let mut value: Option<&ExprKind> = None;
            let mut from_accumulator = false;
            if accumulator_param == Some(decl.identifier.original().as_str()) {
                from_accumulator = true;
            } else {
                for param in params {
                    if let ParamAssignmentKind::NamedInput(named) = param {
                        if named.name == decl.identifier {
                            value = Some(&named.value);
                        }
                    }
                }
                if value.is_none()
                    && matches!(decl.var_type, VariableType::Input | VariableType::InOut)
                    && !is_formal
                {
                    value = positional.next();
                }
            }
            if !from_accumulator && value.is_none() {
                continue;
            }
            if !matches!(decl.var_type, VariableType::Input | VariableType::InOut) {
                continue;
            }

            match &prefix {
                None => {
                    self.w.print(fb_name.original());
                    self.w.print(".");
                    self.w.print(decl.identifier.original());
                    self.w.print(" = ");
                    if from_accumulator {
                        self.print_accumulator();
                    } else if let Some(value) = value {
                        self.print_expr(value, VarGen::Expression)?;
                    }
                }
                Some(prefix) => {
                    // SET_VAR(<prefix><fb>.,<param>,<value>)
                    self.w.print("SET_VAR(");
                    self.w.print(prefix);
                    self.w.print(fb_name.original());
                    self.w.print(".,");
                    self.w.print(decl.identifier.original());
                    self.w.print(",");
                    if from_accumulator {
                        self.print_accumulator();
                    } else if let Some(value) = value {
                        self.print_expr(value, VarGen::Expression)?;
                    }
                    self.w.print(")");
                }
            }
            self.w.print(";\n");
            self.w.print_indent();
        }

        // Now call the function block body.
        self.w.print(&fb_type_name);
        self.w.print(FB_FUNCTION_SUFFIX);
        self.w.print("(&");
        if let Some(prefix) = &prefix {
            self.w.print(prefix);
        }
        self.w.print(fb_name.original());
        self.w.print(")");

        // Copy back every output bound with `=>`, and every in-out
        // whose source was a variable.
        let mut copy_backs: Vec<(&Id, &Variable, bool)> = vec![];
        for param in params {
            match param {
                ParamAssignmentKind::Output(output) => {
                    copy_backs.push((&output.name, &output.value, output.negated));
                }
                ParamAssignmentKind::NamedInput(named) => {
                    let is_inout = fb_decl
                        .variables
                        .iter()
                        .any(|d| d.identifier == named.name && d.var_type == VariableType::InOut);
                    if let (true, ExprKind::Variable(variable)) = (is_inout, &named.value) {
                        copy_backs.push((&named.name, variable, false));
                    }
                }
                ParamAssignmentKind::Positional(_) => {}
            }
        }
        for (param_name, target, negated) in copy_backs {
            self.w.print(";\n");
            self.w.print_indent();
            match &prefix {
                None => {
                    self.print_plain_variable(target, VarGen::Assignment)?;
                    self.w.print(" = ");
                    if negated {
                        self.w.print("!");
                    }
                    self.w.print(fb_name.original());
                    self.w.print(".");
                    self.w.print(param_name.original());
                }
                Some(prefix) => {
                    let accessor_prefix = prefix.clone();
                    let value_text = format!(
                        "{}{}{}.{}",
                        if negated { "!" } else { "" },
                        prefix,
                        fb_name.original(),
                        param_name.original()
                    );
                    self.print_setter(target, &accessor_prefix, |this| {
                        this.w.print(&value_text);
                        Ok(())
                    })?;
                }
            }
        }

        self.w.print(";\n");
        self.w.indent_left();
        self.w.print_indent();
        self.w.print("}");
        Ok(())
    }

    // Function invocation

    /// Emits a function call, matching the call site against the
    /// callee's declared parameters in declaration order.
    fn emit_function_call(
        &mut self,
        call_id: NodeId,
        name: &Id,
        formal: &[ParamAssignmentKind],
        nonformal: &[ExprKind],
        accumulator_is_first: bool,
    ) -> Result<(), CodegenError> {
        enum ArgValue<'v> {
            Expr(&'v ExprKind),
            Accumulator,
            Count(usize),
            OutVar(&'v Variable),
            Missing,
        }
        struct Arg<'v> {
            cast: TypeName,
            direction: VariableType,
            value: ArgValue<'v>,
        }

        let context = self.context;
        let f_decl = self
            .annotations
            .called_function(call_id)
            .and_then(|index| context.functions.find(name, index))
            .ok_or_else(|| CodegenError::UnresolvedCall(name.to_string()))?;
        let multiplicity = context.functions.multiplicity(name);
        let return_type = f_decl.return_type.clone();

        // Match values to the declared parameters.
        let mut args: Vec<Arg> = vec![];
        let mut positional = nonformal.iter();
        let mut used_defvar = false;
        let mut found_first_extensible = false;
        for decl in f_decl.variables.iter().filter(|decl| {
            matches!(
                decl.var_type,
                VariableType::Input | VariableType::Output | VariableType::InOut
            )
        }) {
            if decl.extensible && !found_first_extensible {
                // An extensible function receives the number of values
                // passed to the extensible parameter ahead of them.
                let count = self
                    .annotations
                    .extensible_param_count(call_id)
                    .unwrap_or(nonformal.len() + usize::from(accumulator_is_first));
                args.push(Arg {
                    cast: TypeName::Uint,
                    direction: VariableType::Input,
                    value: ArgValue::Count(count),
                });
                found_first_extensible = true;
            }

            if decl.extensible {
                if formal.is_empty() {
                    // Non-formal: the accumulator, then every remaining
                    // value, feed the extensible parameter.
                    if accumulator_is_first && !used_defvar {
                        args.push(Arg {
                            cast: decl.data_type.clone(),
                            direction: VariableType::Input,
                            value: ArgValue::Accumulator,
                        });
                        used_defvar = true;
                    }
                    for value in positional.by_ref() {
                        args.push(Arg {
                            cast: decl.data_type.clone(),
                            direction: VariableType::Input,
                            value: ArgValue::Expr(value),
                        });
                    }
                } else {
                    // Formal: the values are named <PARAM>1, <PARAM>2, ...
                    for index in 1.. {
                        let indexed = Id::from(&format!("{}{}", decl.identifier.original(), index));
                        let Some(value) = formal.iter().find_map(|param| match param {
                            ParamAssignmentKind::NamedInput(named) if named.name == indexed => {
                                Some(&named.value)
                            }
                            _ => None,
                        }) else {
                            break;
                        };
                        args.push(Arg {
                            cast: decl.data_type.clone(),
                            direction: VariableType::Input,
                            value: ArgValue::Expr(value),
                        });
                    }
                }
                break;
            }

            let mut value: Option<ArgValue> = None;

            // A foo(<param_name> := <value>) style call.
            for param in formal {
                match param {
                    ParamAssignmentKind::NamedInput(named) if named.name == decl.identifier => {
                        value = Some(ArgValue::Expr(&named.value));
                    }
                    ParamAssignmentKind::Output(output) if output.name == decl.identifier => {
                        value = Some(ArgValue::OutVar(&output.value));
                    }
                    _ => {}
                }
            }

            // The first parameter of a non-formal IL call receives the
            // value in the accumulator.
            if value.is_none() && accumulator_is_first && !used_defvar {
                value = Some(ArgValue::Accumulator);
                used_defvar = true;
            } else if value.is_none() {
                value = positional.next().map(ArgValue::Expr);
            }

            // No value given for an input: fall back to the declared
            // default.
            if value.is_none() && decl.var_type == VariableType::Input {
                value = decl.initializer.as_ref().map(ArgValue::Expr);
            }

            args.push(Arg {
                cast: decl.data_type.clone(),
                direction: decl.var_type,
                value: value.unwrap_or(ArgValue::Missing),
            });
        }

        let has_output_params = self.config.variable_prefix.is_some()
            && args.iter().any(|arg| {
                matches!(
                    arg.direction,
                    VariableType::Output | VariableType::InOut
                ) && !matches!(arg.value, ArgValue::Missing)
            });

        // Functions with output parameters are reached through a
        // numbered wrapper that takes the outputs by reference;
        // overloads get a suffix derived from the parameter types.
        let overload_suffix: String = if multiplicity > 1 {
            let mut suffix = String::new();
            for decl in f_decl
                .variables
                .iter()
                .filter(|decl| decl.var_type == VariableType::Input)
            {
                suffix.push_str("__");
                suffix.push_str(&decl.data_type.c_name());
            }
            suffix
        } else {
            String::new()
        };

        // The value returned by the function lands in the accumulator,
        // but arguments that read the accumulator still see the value
        // it held before the call.
        let param_time_type = self.defvar_type.clone();
        self.defvar_type = Some(return_type.clone());
        self.print_accumulator();
        self.defvar_type = param_time_type;
        self.w.print(" = ");

        if has_output_params {
            self.fcall_number += 1;
            self.w.print("__");
            self.w.print(self.pou_name.original());
            self.w.print("_");
            self.w.print(name.original());
            self.w.print(&overload_suffix);
            let number = self.fcall_number.to_string();
            self.w.print(&number);
        } else {
            self.w.print(name.original());
            self.w.print(&overload_suffix);
        }
        self.w.print("(");
        self.w.indent_right();

        let mut emitted = 0usize;
        for arg in &args {
            match arg.direction {
                VariableType::Input => {
                    if emitted > 0 {
                        self.w.print(",\n");
                        self.w.print_indent();
                    }
                    // Untyped literal formals route through the widest
                    // member of their family.
                    self.w.print("(");
                    self.w.print(&arg.cast.c_name());
                    self.w.print(")");
                    match &arg.value {
                        ArgValue::Expr(expr) => self.print_expr(expr, VarGen::Expression)?,
                        ArgValue::Accumulator => self.print_accumulator(),
                        ArgValue::Count(count) => self.w.print(&count.to_string()),
                        ArgValue::OutVar(_) | ArgValue::Missing => {
                            return Err(CodegenError::UnresolvedCall(format!(
                                "no value for an input parameter of {name}"
                            )))
                        }
                    }
                    emitted += 1;
                }
                VariableType::Output | VariableType::InOut => {
                    if !has_output_params {
                        if emitted > 0 {
                            self.w.print(",\n");
                            self.w.print_indent();
                        }
                        match &arg.value {
                            ArgValue::OutVar(variable) => {
                                self.print_variable(variable, VarGen::OutputByRef)?
                            }
                            ArgValue::Expr(expr) => self.print_expr(expr, VarGen::OutputByRef)?,
                            _ => self.w.print("NULL"),
                        }
                        emitted += 1;
                    }
                }
                _ => {}
            }
        }
        if has_output_params {
            if emitted > 0 {
                self.w.print(",\n");
                self.w.print_indent();
            }
            self.w.print(FB_FUNCTION_PARAM);
        }
        self.w.print(")");
        self.w.indent_left();

        // The data type returned by the function is what the
        // accumulator now holds.
        self.defvar_type = Some(return_type);
        Ok(())
    }
}
