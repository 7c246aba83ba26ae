use core::fmt;
use std::{
    cell::{Cell, RefCell},
    fmt::{Display, Formatter},
    rc::Rc,
};

use crate::types::{TypeAnnotation, TypeSlot};

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Location {
    pub offset_start: u32,
    pub offset_end: u32,
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
    pub source: String,
}

impl Location {
    #[must_use]
    pub fn new(
        offset_start: u32,
        offset_end: u32,
        start_line: u32,
        start_column: u32,
        end_line: u32,
        end_column: u32,
        source: String,
    ) -> Self {
        Self {
            offset_start,
            offset_end,
            start_line,
            start_column,
            end_line,
            end_column,
            source,
        }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_column)
    }
}

#[macro_export]
macro_rules! ast_node {
    (
        $(#[$outer:meta])*
        $struct_vis:vis struct $name:ident {
            $(
                $(#[$field_attr:meta])*
                $field_vis:vis $field_name:ident : $field_ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Clone, PartialEq, Eq, Debug)]
        $struct_vis struct $name {
            pub id: u32,
            pub location: $crate::nodes::Location,
            $(
                $(#[$field_attr])*
                $field_vis $field_name : $field_ty,
            )*
        }
    };
}

macro_rules! ast_nodes {
    (
        $(
            $(#[$outer:meta])*
            $struct_vis:vis struct $name:ident { $($fields:tt)* }
        )+
    ) => {
        $(
            ast_node! {
                $(#[$outer])*
                $struct_vis struct $name { $($fields)* }
            }
        )+
    };
}

macro_rules! ast_enum {
    (
        $(#[$outer:meta])*
        $enum_vis:vis enum $name:ident {
            $(
                $(#[$arm_attr:meta])*
                $arm:ident ( $inner:ty ),
            )*
        }
    ) => {
        $(#[$outer])*
        #[derive(Clone, PartialEq, Eq, Debug)]
        $enum_vis enum $name {
            $(
                $(#[$arm_attr])*
                $arm ( $inner ),
            )*
        }

        impl $name {
            #[must_use]
            pub fn id(&self) -> u32 {
                match self {
                    $( $name::$arm(n) => n.id, )*
                }
            }

            #[must_use]
            pub fn location(&self) -> Location {
                match self {
                    $( $name::$arm(n) => n.location.clone(), )*
                }
            }
        }
    };
}

macro_rules! ast_enums {
    (
        $(
            $(#[$outer:meta])*
            $enum_vis:vis enum $name:ident { $($arms:tt)* }
        )+
    ) => {
        $(
            ast_enum! {
                $(#[$outer])*
                $enum_vis enum $name { $($arms)* }
            }
        )+
    };
}

ast_enums! {

    /// Module-level declarations, in source order.
    pub enum Item {
        Function(Rc<FunctionDefinition>),
        Struct(Rc<StructDefinition>),
        Enum(Rc<EnumDefinition>),
        TypeAlias(Rc<TypeAliasDefinition>),
        Import(Rc<ImportDefinition>),
        Let(Rc<LetStatement>),
    }

    pub enum Statement {
        Let(Rc<LetStatement>),
        Assign(Rc<AssignStatement>),
        Expression(Rc<ExpressionStatement>),
        Return(Rc<ReturnStatement>),
        If(Rc<IfStatement>),
        While(Rc<WhileStatement>),
        Loop(Rc<LoopStatement>),
        For(Rc<ForStatement>),
        Break(Rc<BreakStatement>),
        Continue(Rc<ContinueStatement>),
        Block(Rc<Block>),
        Try(Rc<TryStatement>),
        Throw(Rc<ThrowStatement>),
        Delete(Rc<DeleteStatement>),
    }

    pub enum Expression {
        Literal(Rc<LiteralExpression>),
        Identifier(Rc<Identifier>),
        Binary(Rc<BinaryExpression>),
        Unary(Rc<UnaryExpression>),
        Call(Rc<CallExpression>),
        Member(Rc<MemberExpression>),
        Path(Rc<PathExpression>),
        Construct(Rc<ConstructExpression>),
        Array(Rc<ArrayExpression>),
        Tuple(Rc<TupleExpression>),
        Index(Rc<IndexExpression>),
        Closure(Rc<ClosureExpression>),
        Match(Rc<MatchExpression>),
        Cast(Rc<CastExpression>),
    }

    pub enum Pattern {
        Binding(Rc<BindingPattern>),
        Wildcard(Rc<WildcardPattern>),
        Tuple(Rc<TuplePattern>),
        Literal(Rc<LiteralPattern>),
        EnumCase(Rc<EnumCasePattern>),
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub enum Visibility {
    #[default]
    Private,
    Public,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum UnaryOperator {
    Neg,
    Not,
    BitNot,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum LiteralValue {
    Int(i128),
    /// Kept as written; floats are never compared by value during analysis.
    Float(String),
    Bool(bool),
    Char(char),
    String(String),
    Null,
    Unit,
}

/// A variable lifted into a closure from an enclosing scope.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Capture {
    pub name: String,
    pub symbol_id: u32,
    /// The reference inside the closure body that caused the capture.
    pub location: Location,
}

ast_nodes! {

    pub struct SourceFile {
        pub name: String,
        pub items: Vec<Item>,
    }

    /// A name occurrence. `symbol_id` is `0` until the binder resolves it.
    pub struct Identifier {
        pub name: String,
        pub symbol_id: Cell<u32>,
    }

    pub struct FunctionDefinition {
        pub visibility: Visibility,
        pub name: Rc<Identifier>,
        pub type_parameters: Vec<Rc<Identifier>>,
        pub parameters: Vec<Rc<Parameter>>,
        pub returns: TypeSlot,
        pub body: Rc<Block>,
        /// Methods only: the method may mutate `self`.
        pub is_mutating: bool,
    }

    pub struct Parameter {
        pub name: Rc<Identifier>,
        pub ty: TypeSlot,
        pub is_mut: bool,
    }

    pub struct StructDefinition {
        pub visibility: Visibility,
        pub name: Rc<Identifier>,
        pub type_parameters: Vec<Rc<Identifier>>,
        pub fields: Vec<Rc<FieldDefinition>>,
        pub methods: Vec<Rc<FunctionDefinition>>,
    }

    pub struct FieldDefinition {
        pub name: Rc<Identifier>,
        pub ty: TypeSlot,
        pub is_mut: bool,
    }

    pub struct EnumDefinition {
        pub visibility: Visibility,
        pub name: Rc<Identifier>,
        pub raw_type: Option<TypeAnnotation>,
        pub cases: Vec<Rc<EnumCase>>,
    }

    pub struct EnumCase {
        pub name: Rc<Identifier>,
        pub payload: Vec<TypeAnnotation>,
        pub raw_value: Option<Rc<LiteralExpression>>,
    }

    pub struct TypeAliasDefinition {
        pub visibility: Visibility,
        pub name: Rc<Identifier>,
        pub ty: TypeAnnotation,
    }

    /// `import a.b.c as alias`; `foreign` marks a host assembly import.
    pub struct ImportDefinition {
        pub path: Vec<String>,
        pub alias: Rc<Identifier>,
        pub foreign: bool,
    }

    pub struct Block {
        pub statements: Vec<Statement>,
    }

    pub struct LetStatement {
        pub pattern: Pattern,
        pub ty: TypeSlot,
        pub value: Option<Expression>,
        pub is_mut: bool,
    }

    pub struct AssignStatement {
        pub target: Expression,
        pub value: Expression,
    }

    pub struct ExpressionStatement {
        pub expression: Expression,
    }

    pub struct ReturnStatement {
        pub value: Option<Expression>,
    }

    pub struct IfStatement {
        pub condition: Expression,
        pub then_branch: Rc<Block>,
        pub else_branch: Option<Rc<Block>>,
    }

    pub struct WhileStatement {
        pub condition: Expression,
        pub body: Rc<Block>,
    }

    pub struct LoopStatement {
        pub body: Rc<Block>,
    }

    pub struct ForStatement {
        pub pattern: Pattern,
        pub iterable: Expression,
        pub body: Rc<Block>,
    }

    pub struct BreakStatement {}

    pub struct ContinueStatement {}

    pub struct TryStatement {
        pub body: Rc<Block>,
        pub catch_binding: Option<Rc<Parameter>>,
        pub catch_body: Rc<Block>,
    }

    pub struct ThrowStatement {
        pub value: Expression,
    }

    /// Clears a variable: it stays initialized but is no longer assigned.
    pub struct DeleteStatement {
        pub target: Rc<Identifier>,
    }

    pub struct LiteralExpression {
        pub value: LiteralValue,
    }

    pub struct BinaryExpression {
        pub left: Expression,
        pub operator: BinaryOperator,
        pub right: Expression,
    }

    pub struct UnaryExpression {
        pub operator: UnaryOperator,
        pub operand: Expression,
    }

    pub struct CallExpression {
        pub callee: Expression,
        pub type_arguments: Vec<TypeAnnotation>,
        pub arguments: Vec<Expression>,
    }

    /// `object.member`: field or method of a value.
    pub struct MemberExpression {
        pub object: Expression,
        pub member: Rc<Identifier>,
    }

    /// `Enum::Case`, `alias::item` or `alias::Enum::Case`.
    pub struct PathExpression {
        pub segments: Vec<Rc<Identifier>>,
    }

    pub struct ConstructExpression {
        pub ty: TypeAnnotation,
        pub fields: Vec<Rc<FieldInitializer>>,
    }

    pub struct FieldInitializer {
        pub name: Rc<Identifier>,
        pub value: Expression,
    }

    pub struct ArrayExpression {
        pub elements: Vec<Expression>,
    }

    pub struct TupleExpression {
        pub elements: Vec<Expression>,
    }

    pub struct IndexExpression {
        pub target: Expression,
        pub index: Expression,
    }

    pub struct ClosureExpression {
        pub parameters: Vec<Rc<Parameter>>,
        pub returns: TypeSlot,
        pub body: Rc<Block>,
        /// `None` until the closure's body has been checked.
        pub captures: RefCell<Option<Vec<Capture>>>,
    }

    pub struct MatchExpression {
        pub scrutinee: Expression,
        pub arms: Vec<Rc<MatchArm>>,
    }

    pub struct MatchArm {
        pub pattern: Pattern,
        pub guard: Option<Expression>,
        pub body: Rc<Block>,
    }

    pub struct CastExpression {
        pub value: Expression,
        pub ty: TypeAnnotation,
    }

    pub struct BindingPattern {
        pub name: Rc<Identifier>,
        pub ty: TypeSlot,
        pub is_mut: bool,
    }

    pub struct WildcardPattern {}

    pub struct TuplePattern {
        pub elements: Vec<Pattern>,
    }

    pub struct LiteralPattern {
        pub literal: Rc<LiteralExpression>,
    }

    /// `Enum::Case(p0, p1)` inside a match arm.
    pub struct EnumCasePattern {
        pub path: Vec<Rc<Identifier>>,
        pub arguments: Vec<Pattern>,
    }
}
