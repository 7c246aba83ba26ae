use std::fmt::{self, Display, Formatter};

use tern_ast::nodes::{BinaryOperator, Location, UnaryOperator};
use tern_ast::types::TypeAnnotation;
use thiserror::Error;

use crate::scope::ScopeKind;

/// Severity family of a [`SemaError`].
///
/// Declaration and policy errors abort the unit at the point they are raised.
/// Resolution and type errors are collected and reported together once the
/// walk finishes. Warnings never fail an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    Declaration,
    Resolution,
    Type,
    Policy,
    Warning,
}

impl ErrorClass {
    #[must_use = "this is a pure check with no side effects"]
    pub fn is_fatal(self) -> bool {
        matches!(self, ErrorClass::Declaration | ErrorClass::Policy)
    }
}

impl Display for ErrorClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ErrorClass::Declaration => write!(f, "declaration"),
            ErrorClass::Resolution => write!(f, "resolution"),
            ErrorClass::Type => write!(f, "type"),
            ErrorClass::Policy => write!(f, "policy"),
            ErrorClass::Warning => write!(f, "warning"),
        }
    }
}

/// Where a type mismatch was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MismatchContext {
    Assignment,
    Return,
    VariableDefinition,
    BinaryOperation(BinaryOperator),
    UnaryOperation(UnaryOperator),
    Condition,
    Argument { callee: String, index: usize },
    Field { type_name: String, field: String },
    ArrayElement,
    Index,
    Pattern,
    MatchArm,
    RawValue { enum_name: String },
}

impl Display for MismatchContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            MismatchContext::Assignment => write!(f, "in assignment"),
            MismatchContext::Return => write!(f, "in return statement"),
            MismatchContext::VariableDefinition => write!(f, "in variable definition"),
            MismatchContext::BinaryOperation(op) => write!(f, "in binary operation `{op:?}`"),
            MismatchContext::UnaryOperation(op) => write!(f, "in unary operation `{op:?}`"),
            MismatchContext::Condition => write!(f, "in condition"),
            MismatchContext::Argument { callee, index } => {
                write!(f, "in argument {index} of `{callee}`")
            }
            MismatchContext::Field { type_name, field } => {
                write!(f, "in field `{field}` of `{type_name}`")
            }
            MismatchContext::ArrayElement => write!(f, "in array element"),
            MismatchContext::Index => write!(f, "in index expression"),
            MismatchContext::Pattern => write!(f, "in pattern"),
            MismatchContext::MatchArm => write!(f, "in match arm"),
            MismatchContext::RawValue { enum_name } => {
                write!(f, "in raw value of enum `{enum_name}`")
            }
        }
    }
}

/// A user-facing diagnostic. Every variant carries a stable code (see
/// [`SemaError::code`]) and at least one source location.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemaError {
    #[error("{location}: `{name}` is already declared in this scope (previous declaration at {previous})")]
    DuplicateDeclaration {
        name: String,
        location: Location,
        previous: Location,
    },

    #[error("{location}: local `{name}` shadows the module-level binding declared at {module_location}")]
    ShadowsModuleBinding {
        name: String,
        location: Location,
        module_location: Location,
    },

    #[error("{location}: `{name}` is not declared or not accessible in scope `{scope}`")]
    NotDeclared {
        name: String,
        scope: String,
        location: Location,
    },

    #[error("{location}: `{name}` is used before it is declared")]
    UsedBeforeDeclared { name: String, location: Location },

    #[error("{location}: unknown type `{name}`")]
    UnknownType { name: String, location: Location },

    #[error("{location}: cannot import `{path}`: {reason}")]
    UnresolvedImport {
        path: String,
        reason: String,
        location: Location,
    },

    #[error("{location}: import of `{path}` forms a cycle")]
    ImportCycle { path: String, location: Location },

    #[error("{location}: type mismatch {context}: expected `{expected}`, found `{found}`")]
    TypeMismatch {
        expected: TypeAnnotation,
        found: TypeAnnotation,
        context: MismatchContext,
        location: Location,
    },

    #[error("{location}: operator `{operator}` cannot be applied to `{found}`")]
    InvalidOperand {
        operator: String,
        found: TypeAnnotation,
        location: Location,
    },

    #[error("{location}: `{found}` is not callable")]
    NotCallable {
        found: TypeAnnotation,
        location: Location,
    },

    #[error("{location}: `{callee}` expects {}{expected} arguments, but {found} provided", at_least(.variadic))]
    ArgumentCountMismatch {
        callee: String,
        expected: usize,
        found: usize,
        variadic: bool,
        location: Location,
    },

    #[error("{location}: type argument count mismatch for `{name}`: expected {expected}, found {found}")]
    TypeArgumentCountMismatch {
        name: String,
        expected: usize,
        found: usize,
        location: Location,
    },

    #[error("{location}: `{type_name}` has no field `{field}`")]
    UnknownField {
        type_name: String,
        field: String,
        location: Location,
    },

    #[error("{location}: missing field `{field}` in construction of `{type_name}`")]
    MissingField {
        type_name: String,
        field: String,
        location: Location,
    },

    #[error("{location}: no field or method `{member}` on type `{type_name}`")]
    UnknownMember {
        type_name: String,
        member: String,
        location: Location,
    },

    #[error("{location}: `{name}` is not a struct")]
    NotAStruct { name: String, location: Location },

    #[error("{location}: enum `{enum_name}` has no case `{case}`")]
    UnknownEnumCase {
        enum_name: String,
        case: String,
        location: Location,
    },

    #[error("{location}: raw value `{value}` of `{enum_name}.{case}` is already used at {previous}")]
    DuplicateRawValue {
        enum_name: String,
        case: String,
        value: String,
        location: Location,
        previous: Location,
    },

    #[error("{location}: `{enum_name}.{case}` cannot have a raw value: {reason}")]
    MisplacedRawValue {
        enum_name: String,
        case: String,
        reason: &'static str,
        location: Location,
    },

    #[error("{location}: raw type of enum `{enum_name}` must be an integer or string, found `{found}`")]
    InvalidRawType {
        enum_name: String,
        found: TypeAnnotation,
        location: Location,
    },

    #[error("{location}: cannot infer the type of {what}")]
    CannotInfer { what: String, location: Location },

    #[error("{location}: `{found}` is not iterable")]
    NotIterable {
        found: TypeAnnotation,
        location: Location,
    },

    #[error("{location}: `{found}` cannot be indexed")]
    NotIndexable {
        found: TypeAnnotation,
        location: Location,
    },

    #[error("{location}: cannot cast `{from}` to `{to}`")]
    InvalidCast {
        from: TypeAnnotation,
        to: TypeAnnotation,
        location: Location,
    },

    #[error("{location}: `{name}` is read before it is definitely assigned")]
    UseBeforeInitialization { name: String, location: Location },

    #[error("{location}: `{name}` is read after it was deleted")]
    UseAfterDelete { name: String, location: Location },

    #[error("{location}: null literals are only permitted in contexts that interface with foreign code")]
    NullOutsideInterop { location: Location },

    #[error("{location}: cannot assign to immutable binding `{name}` declared at {declared}")]
    AssignToImmutable {
        name: String,
        location: Location,
        declared: Location,
    },

    #[error("{location}: cannot assign to {kind} `{name}`")]
    AssignToNonVariable {
        name: String,
        kind: &'static str,
        location: Location,
    },

    #[error("{location}: mutating method `{method}` called on immutable binding `{name}`")]
    MutatingCallOnImmutable {
        method: String,
        name: String,
        location: Location,
    },

    #[error("{location}: function `{name}` is defined after the entry function `{entry}` at {entry_location}")]
    FunctionAfterEntry {
        name: String,
        entry: String,
        location: Location,
        entry_location: Location,
    },

    #[error("{location}: closure parameter `{name}` needs a type unless the closure is passed directly as a call argument")]
    ImplicitClosureParameter { name: String, location: Location },

    #[error("{location}: implicit widening from `{from}` to `{to}`")]
    ImplicitWidening {
        from: TypeAnnotation,
        to: TypeAnnotation,
        location: Location,
    },
}

fn at_least(variadic: impl std::borrow::Borrow<bool>) -> &'static str {
    if *variadic.borrow() { "at least " } else { "" }
}

impl SemaError {
    /// Stable short code. The first digit pair encodes the [`ErrorClass`].
    #[must_use = "this is a pure lookup with no side effects"]
    pub fn code(&self) -> &'static str {
        match self {
            SemaError::DuplicateDeclaration { .. } => "E0101",
            SemaError::ShadowsModuleBinding { .. } => "E0102",
            SemaError::NotDeclared { .. } => "E0201",
            SemaError::UsedBeforeDeclared { .. } => "E0202",
            SemaError::UnknownType { .. } => "E0203",
            SemaError::UnresolvedImport { .. } => "E0204",
            SemaError::ImportCycle { .. } => "E0205",
            SemaError::TypeMismatch { .. } => "E0301",
            SemaError::InvalidOperand { .. } => "E0302",
            SemaError::NotCallable { .. } => "E0303",
            SemaError::ArgumentCountMismatch { .. } => "E0304",
            SemaError::TypeArgumentCountMismatch { .. } => "E0305",
            SemaError::UnknownField { .. } => "E0306",
            SemaError::MissingField { .. } => "E0307",
            SemaError::UnknownMember { .. } => "E0308",
            SemaError::NotAStruct { .. } => "E0309",
            SemaError::UnknownEnumCase { .. } => "E0310",
            SemaError::DuplicateRawValue { .. } => "E0311",
            SemaError::MisplacedRawValue { .. } => "E0312",
            SemaError::InvalidRawType { .. } => "E0313",
            SemaError::CannotInfer { .. } => "E0314",
            SemaError::NotIterable { .. } => "E0315",
            SemaError::NotIndexable { .. } => "E0316",
            SemaError::InvalidCast { .. } => "E0317",
            SemaError::UseBeforeInitialization { .. } => "E0318",
            SemaError::UseAfterDelete { .. } => "E0319",
            SemaError::NullOutsideInterop { .. } => "E0401",
            SemaError::AssignToImmutable { .. } => "E0402",
            SemaError::AssignToNonVariable { .. } => "E0403",
            SemaError::MutatingCallOnImmutable { .. } => "E0404",
            SemaError::FunctionAfterEntry { .. } => "E0405",
            SemaError::ImplicitClosureParameter { .. } => "E0406",
            SemaError::ImplicitWidening { .. } => "W0501",
        }
    }

    #[must_use = "this is a pure lookup with no side effects"]
    pub fn class(&self) -> ErrorClass {
        match self {
            SemaError::DuplicateDeclaration { .. } | SemaError::ShadowsModuleBinding { .. } => {
                ErrorClass::Declaration
            }
            SemaError::NotDeclared { .. }
            | SemaError::UsedBeforeDeclared { .. }
            | SemaError::UnknownType { .. }
            | SemaError::UnresolvedImport { .. }
            | SemaError::ImportCycle { .. } => ErrorClass::Resolution,
            SemaError::NullOutsideInterop { .. }
            | SemaError::AssignToImmutable { .. }
            | SemaError::AssignToNonVariable { .. }
            | SemaError::MutatingCallOnImmutable { .. }
            | SemaError::FunctionAfterEntry { .. }
            | SemaError::ImplicitClosureParameter { .. } => ErrorClass::Policy,
            SemaError::ImplicitWidening { .. } => ErrorClass::Warning,
            _ => ErrorClass::Type,
        }
    }

    #[must_use = "this is a pure lookup with no side effects"]
    pub fn location(&self) -> &Location {
        match self {
            SemaError::DuplicateDeclaration { location, .. }
            | SemaError::ShadowsModuleBinding { location, .. }
            | SemaError::NotDeclared { location, .. }
            | SemaError::UsedBeforeDeclared { location, .. }
            | SemaError::UnknownType { location, .. }
            | SemaError::UnresolvedImport { location, .. }
            | SemaError::ImportCycle { location, .. }
            | SemaError::TypeMismatch { location, .. }
            | SemaError::InvalidOperand { location, .. }
            | SemaError::NotCallable { location, .. }
            | SemaError::ArgumentCountMismatch { location, .. }
            | SemaError::TypeArgumentCountMismatch { location, .. }
            | SemaError::UnknownField { location, .. }
            | SemaError::MissingField { location, .. }
            | SemaError::UnknownMember { location, .. }
            | SemaError::NotAStruct { location, .. }
            | SemaError::UnknownEnumCase { location, .. }
            | SemaError::DuplicateRawValue { location, .. }
            | SemaError::MisplacedRawValue { location, .. }
            | SemaError::InvalidRawType { location, .. }
            | SemaError::CannotInfer { location, .. }
            | SemaError::NotIterable { location, .. }
            | SemaError::NotIndexable { location, .. }
            | SemaError::InvalidCast { location, .. }
            | SemaError::UseBeforeInitialization { location, .. }
            | SemaError::UseAfterDelete { location, .. }
            | SemaError::NullOutsideInterop { location }
            | SemaError::AssignToImmutable { location, .. }
            | SemaError::AssignToNonVariable { location, .. }
            | SemaError::MutatingCallOnImmutable { location, .. }
            | SemaError::FunctionAfterEntry { location, .. }
            | SemaError::ImplicitClosureParameter { location, .. }
            | SemaError::ImplicitWidening { location, .. } => location,
        }
    }

    /// The other end of a two-sided diagnostic, e.g. the earlier declaration.
    #[must_use = "this is a pure lookup with no side effects"]
    pub fn secondary_location(&self) -> Option<&Location> {
        match self {
            SemaError::DuplicateDeclaration { previous, .. }
            | SemaError::DuplicateRawValue { previous, .. } => Some(previous),
            SemaError::ShadowsModuleBinding {
                module_location, ..
            } => Some(module_location),
            SemaError::AssignToImmutable { declared, .. } => Some(declared),
            SemaError::FunctionAfterEntry { entry_location, .. } => Some(entry_location),
            _ => None,
        }
    }
}

/// A broken invariant between passes. Never caused by user input alone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InternalError {
    #[error("scope cursor expected a {expected} scope but entered {found} scope `{name}`")]
    ScopeKindMismatch {
        expected: ScopeKind,
        found: ScopeKind,
        name: String,
    },

    #[error("scope cursor found no {expected} scope left under `{parent}`")]
    MissingChildScope { parent: String, expected: ScopeKind },

    #[error("scope `{name}` left with {visited} of {total} child scopes visited")]
    UnvisitedChildScopes {
        name: String,
        visited: usize,
        total: usize,
    },

    #[error("scope cursor ascended past its root")]
    AscendPastRoot,

    #[error("{location}: symbol `{name}` already has id {existing}")]
    IdReassigned {
        name: String,
        existing: u32,
        location: Location,
    },

    #[error("{location}: declaration of `{name}` is missing from scope `{scope}`")]
    MissingSymbol {
        name: String,
        scope: String,
        location: Location,
    },

    #[error("{location}: `{name}` was bound to id {expected} but resolves to id {found}")]
    BindingMismatch {
        name: String,
        expected: u32,
        found: u32,
        location: Location,
    },

    #[error("{location}: closure parameter inference expected {expected}, found `{found}`")]
    ClosureShape {
        expected: &'static str,
        found: TypeAnnotation,
        location: Location,
    },

    #[error("{location}: closure captures were already recorded")]
    CapturesAlreadyResolved { location: Location },
}

/// Why a walk stopped early.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Abort {
    #[error(transparent)]
    Fatal(SemaError),
    #[error("internal error: {0}")]
    Internal(#[from] InternalError),
}

/// The error returned by a failed analysis.
///
/// Public entry points return it wrapped in [`anyhow::Error`]; callers that
/// need the individual diagnostics downcast back to this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisError {
    /// Collected diagnostics in report order; a fatal error, if any, is last.
    pub diagnostics: Vec<SemaError>,
    pub internal: Option<InternalError>,
}

impl AnalysisError {
    #[must_use = "this is a pure lookup with no side effects"]
    pub fn codes(&self) -> Vec<&'static str> {
        self.diagnostics.iter().map(SemaError::code).collect()
    }

    #[must_use = "this is a pure check with no side effects"]
    pub fn has_code(&self, code: &str) -> bool {
        self.diagnostics.iter().any(|d| d.code() == code)
    }

    #[must_use = "this is a pure check with no side effects"]
    pub fn is_internal(&self) -> bool {
        self.internal.is_some()
    }
}

impl Display for AnalysisError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut messages: Vec<String> = self.diagnostics.iter().map(ToString::to_string).collect();
        if let Some(internal) = &self.internal {
            messages.push(format!("internal error: {internal}"));
        }
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for AnalysisError {}
