//! Programmatic syntax tree construction.
//!
//! The parser front end and the test suite both construct trees through
//! [`AstBuilder`]. The builder owns nothing but a source name and a current
//! line; every node it creates gets a fresh node id and a location on that line.
//!
//! # Node ID Assignment
//!
//! Node IDs are assigned sequentially starting from 1 using an atomic counter.
//! Zero is reserved for "no node", so any id handed out is non-zero and unique
//! within the process.
//!
//! ```ignore
//! use tern_ast::builder::AstBuilder;
//! use tern_ast::types::TypeAnnotation;
//!
//! let b = AstBuilder::new("main.tn");
//! let file = b.source_file(vec![b.function(
//!     "main",
//!     vec![],
//!     None,
//!     vec![b.let_("x", None, b.int(1)), b.expr(b.call(b.ident("print"), vec![b.ident("x")]))],
//! )]);
//! ```

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
    sync::atomic::{AtomicU32, Ordering},
};

use crate::nodes::{
    ArrayExpression, AssignStatement, BinaryExpression, BinaryOperator, BindingPattern, Block,
    BreakStatement, CallExpression, CastExpression, ClosureExpression, ConstructExpression,
    ContinueStatement, DeleteStatement, EnumCase, EnumCasePattern, EnumDefinition, Expression,
    ExpressionStatement, FieldDefinition, FieldInitializer, ForStatement, FunctionDefinition,
    Identifier, IfStatement, ImportDefinition, IndexExpression, Item, LetStatement,
    LiteralExpression, LiteralPattern, LiteralValue, Location, LoopStatement, MatchArm,
    MatchExpression, MemberExpression, Parameter, PathExpression, Pattern, ReturnStatement,
    SourceFile, Statement, StructDefinition, ThrowStatement, TryStatement, TupleExpression,
    TuplePattern, TypeAliasDefinition, UnaryExpression, UnaryOperator, Visibility,
    WhileStatement, WildcardPattern,
};
use crate::types::{TypeAnnotation, TypeSlot};

pub struct AstBuilder {
    source: String,
    line: Cell<u32>,
    column: Cell<u32>,
}

impl AstBuilder {
    #[must_use]
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            line: Cell::new(1),
            column: Cell::new(1),
        }
    }

    /// Moves the builder to `line`; nodes built afterwards are located there.
    pub fn at_line(&self, line: u32) -> &Self {
        self.line.set(line);
        self.column.set(1);
        self
    }

    fn get_node_id() -> u32 {
        static COUNTER: AtomicU32 = AtomicU32::new(1);
        COUNTER.fetch_add(1, Ordering::Relaxed)
    }

    fn get_location(&self) -> Location {
        let line = self.line.get();
        let column = self.column.get();
        self.column.set(column + 1);
        Location::new(0, 0, line, column, line, column + 1, self.source.clone())
    }

    fn node(&self) -> (u32, Location) {
        (Self::get_node_id(), self.get_location())
    }

    // Items

    #[must_use]
    pub fn source_file(&self, items: Vec<Item>) -> Rc<SourceFile> {
        let (id, location) = self.node();
        Rc::new(SourceFile {
            id,
            location,
            name: self.source.clone(),
            items,
        })
    }

    #[must_use]
    pub fn identifier(&self, name: &str) -> Rc<Identifier> {
        let (id, location) = self.node();
        Rc::new(Identifier {
            id,
            location,
            name: name.to_string(),
            symbol_id: Cell::new(0),
        })
    }

    /// A function with no generic parameters. A missing return type means `unit`.
    #[must_use]
    pub fn function(
        &self,
        name: &str,
        parameters: Vec<Rc<Parameter>>,
        returns: Option<TypeAnnotation>,
        body: Vec<Statement>,
    ) -> Item {
        Item::Function(self.function_definition(name, &[], parameters, returns, body))
    }

    /// Like [`AstBuilder::function`], but exported from its unit.
    #[must_use]
    pub fn pub_function(
        &self,
        name: &str,
        parameters: Vec<Rc<Parameter>>,
        returns: Option<TypeAnnotation>,
        body: Vec<Statement>,
    ) -> Item {
        let definition = self.function_definition(name, &[], parameters, returns, body);
        Item::Function(Rc::new(FunctionDefinition {
            visibility: Visibility::Public,
            ..(*definition).clone()
        }))
    }

    #[must_use]
    pub fn generic_function(
        &self,
        name: &str,
        type_parameters: &[&str],
        parameters: Vec<Rc<Parameter>>,
        returns: Option<TypeAnnotation>,
        body: Vec<Statement>,
    ) -> Item {
        Item::Function(self.function_definition(name, type_parameters, parameters, returns, body))
    }

    #[must_use]
    pub fn function_definition(
        &self,
        name: &str,
        type_parameters: &[&str],
        parameters: Vec<Rc<Parameter>>,
        returns: Option<TypeAnnotation>,
        body: Vec<Statement>,
    ) -> Rc<FunctionDefinition> {
        let (id, location) = self.node();
        Rc::new(FunctionDefinition {
            id,
            location,
            visibility: Visibility::Private,
            name: self.identifier(name),
            type_parameters: type_parameters.iter().map(|p| self.identifier(p)).collect(),
            parameters,
            returns: TypeSlot::new(returns.unwrap_or_else(TypeAnnotation::unit)),
            body: self.body(body),
            is_mutating: false,
        })
    }

    /// A method; `self` is implicit.
    #[must_use]
    pub fn method(
        &self,
        name: &str,
        parameters: Vec<Rc<Parameter>>,
        returns: Option<TypeAnnotation>,
        body: Vec<Statement>,
        is_mutating: bool,
    ) -> Rc<FunctionDefinition> {
        let (id, location) = self.node();
        Rc::new(FunctionDefinition {
            id,
            location,
            visibility: Visibility::Public,
            name: self.identifier(name),
            type_parameters: vec![],
            parameters,
            returns: TypeSlot::new(returns.unwrap_or_else(TypeAnnotation::unit)),
            body: self.body(body),
            is_mutating,
        })
    }

    /// A parameter; `None` leaves the type to inference.
    #[must_use]
    pub fn param(&self, name: &str, ty: Option<TypeAnnotation>) -> Rc<Parameter> {
        let (id, location) = self.node();
        Rc::new(Parameter {
            id,
            location,
            name: self.identifier(name),
            ty: TypeSlot::new(ty.unwrap_or(TypeAnnotation::Placeholder)),
            is_mut: false,
        })
    }

    #[must_use]
    pub fn structure(
        &self,
        name: &str,
        type_parameters: &[&str],
        fields: Vec<Rc<FieldDefinition>>,
        methods: Vec<Rc<FunctionDefinition>>,
    ) -> Item {
        let (id, location) = self.node();
        Item::Struct(Rc::new(StructDefinition {
            id,
            location,
            visibility: Visibility::Public,
            name: self.identifier(name),
            type_parameters: type_parameters.iter().map(|p| self.identifier(p)).collect(),
            fields,
            methods,
        }))
    }

    #[must_use]
    pub fn field(&self, name: &str, ty: TypeAnnotation, is_mut: bool) -> Rc<FieldDefinition> {
        let (id, location) = self.node();
        Rc::new(FieldDefinition {
            id,
            location,
            name: self.identifier(name),
            ty: TypeSlot::new(ty),
            is_mut,
        })
    }

    #[must_use]
    pub fn enumeration(
        &self,
        name: &str,
        raw_type: Option<TypeAnnotation>,
        cases: Vec<Rc<EnumCase>>,
    ) -> Item {
        let (id, location) = self.node();
        Item::Enum(Rc::new(EnumDefinition {
            id,
            location,
            visibility: Visibility::Public,
            name: self.identifier(name),
            raw_type,
            cases,
        }))
    }

    #[must_use]
    pub fn case(
        &self,
        name: &str,
        payload: Vec<TypeAnnotation>,
        raw_value: Option<LiteralValue>,
    ) -> Rc<EnumCase> {
        let (id, location) = self.node();
        Rc::new(EnumCase {
            id,
            location,
            name: self.identifier(name),
            payload,
            raw_value: raw_value.map(|value| self.literal(value)),
        })
    }

    #[must_use]
    pub fn type_alias(&self, name: &str, ty: TypeAnnotation) -> Item {
        let (id, location) = self.node();
        Item::TypeAlias(Rc::new(TypeAliasDefinition {
            id,
            location,
            visibility: Visibility::Public,
            name: self.identifier(name),
            ty,
        }))
    }

    #[must_use]
    pub fn import(&self, path: &[&str], alias: &str, foreign: bool) -> Item {
        let (id, location) = self.node();
        Item::Import(Rc::new(ImportDefinition {
            id,
            location,
            path: path.iter().map(|s| (*s).to_string()).collect(),
            alias: self.identifier(alias),
            foreign,
        }))
    }

    /// A module-level `let`.
    #[must_use]
    pub fn global(&self, name: &str, ty: Option<TypeAnnotation>, value: Expression) -> Item {
        Item::Let(self.let_statement(self.bind(name), ty, Some(value), false))
    }

    // Statements

    fn body(&self, statements: Vec<Statement>) -> Rc<Block> {
        let (id, location) = self.node();
        Rc::new(Block {
            id,
            location,
            statements,
        })
    }

    #[must_use]
    pub fn let_statement(
        &self,
        pattern: Pattern,
        ty: Option<TypeAnnotation>,
        value: Option<Expression>,
        is_mut: bool,
    ) -> Rc<LetStatement> {
        let (id, location) = self.node();
        let pattern = if is_mut { Self::mark_mutable(pattern) } else { pattern };
        Rc::new(LetStatement {
            id,
            location,
            pattern,
            ty: TypeSlot::new(ty.unwrap_or(TypeAnnotation::Placeholder)),
            value,
            is_mut,
        })
    }

    fn mark_mutable(pattern: Pattern) -> Pattern {
        match pattern {
            Pattern::Binding(binding) => Pattern::Binding(Rc::new(BindingPattern {
                is_mut: true,
                ..(*binding).clone()
            })),
            Pattern::Tuple(tuple) => Pattern::Tuple(Rc::new(TuplePattern {
                id: tuple.id,
                location: tuple.location.clone(),
                elements: tuple.elements.iter().cloned().map(Self::mark_mutable).collect(),
            })),
            other => other,
        }
    }

    /// `let name[: ty] = value;`
    #[must_use]
    pub fn let_(&self, name: &str, ty: Option<TypeAnnotation>, value: Expression) -> Statement {
        Statement::Let(self.let_statement(self.bind(name), ty, Some(value), false))
    }

    /// `let mut name[: ty] = value;`
    #[must_use]
    pub fn let_mut(&self, name: &str, ty: Option<TypeAnnotation>, value: Expression) -> Statement {
        Statement::Let(self.let_statement(self.bind(name), ty, Some(value), true))
    }

    /// `let mut name: ty;` with no initializer.
    #[must_use]
    pub fn declare(&self, name: &str, ty: TypeAnnotation) -> Statement {
        Statement::Let(self.let_statement(self.bind(name), Some(ty), None, true))
    }

    #[must_use]
    pub fn let_pattern(&self, pattern: Pattern, value: Expression) -> Statement {
        Statement::Let(self.let_statement(pattern, None, Some(value), false))
    }

    #[must_use]
    pub fn assign(&self, target: Expression, value: Expression) -> Statement {
        let (id, location) = self.node();
        Statement::Assign(Rc::new(AssignStatement {
            id,
            location,
            target,
            value,
        }))
    }

    #[must_use]
    pub fn expr(&self, expression: Expression) -> Statement {
        let (id, location) = self.node();
        Statement::Expression(Rc::new(ExpressionStatement {
            id,
            location,
            expression,
        }))
    }

    #[must_use]
    pub fn ret(&self, value: Option<Expression>) -> Statement {
        let (id, location) = self.node();
        Statement::Return(Rc::new(ReturnStatement {
            id,
            location,
            value,
        }))
    }

    #[must_use]
    pub fn if_(
        &self,
        condition: Expression,
        then_branch: Vec<Statement>,
        else_branch: Option<Vec<Statement>>,
    ) -> Statement {
        let (id, location) = self.node();
        Statement::If(Rc::new(IfStatement {
            id,
            location,
            condition,
            then_branch: self.body(then_branch),
            else_branch: else_branch.map(|statements| self.body(statements)),
        }))
    }

    #[must_use]
    pub fn while_(&self, condition: Expression, body: Vec<Statement>) -> Statement {
        let (id, location) = self.node();
        Statement::While(Rc::new(WhileStatement {
            id,
            location,
            condition,
            body: self.body(body),
        }))
    }

    #[must_use]
    pub fn loop_(&self, body: Vec<Statement>) -> Statement {
        let (id, location) = self.node();
        Statement::Loop(Rc::new(LoopStatement {
            id,
            location,
            body: self.body(body),
        }))
    }

    #[must_use]
    pub fn for_(&self, pattern: Pattern, iterable: Expression, body: Vec<Statement>) -> Statement {
        let (id, location) = self.node();
        Statement::For(Rc::new(ForStatement {
            id,
            location,
            pattern,
            iterable,
            body: self.body(body),
        }))
    }

    #[must_use]
    pub fn brk(&self) -> Statement {
        let (id, location) = self.node();
        Statement::Break(Rc::new(BreakStatement { id, location }))
    }

    #[must_use]
    pub fn cont(&self) -> Statement {
        let (id, location) = self.node();
        Statement::Continue(Rc::new(ContinueStatement { id, location }))
    }

    #[must_use]
    pub fn block(&self, statements: Vec<Statement>) -> Statement {
        Statement::Block(self.body(statements))
    }

    #[must_use]
    pub fn try_(
        &self,
        body: Vec<Statement>,
        catch_binding: Option<Rc<Parameter>>,
        catch_body: Vec<Statement>,
    ) -> Statement {
        let (id, location) = self.node();
        Statement::Try(Rc::new(TryStatement {
            id,
            location,
            body: self.body(body),
            catch_binding,
            catch_body: self.body(catch_body),
        }))
    }

    #[must_use]
    pub fn throw(&self, value: Expression) -> Statement {
        let (id, location) = self.node();
        Statement::Throw(Rc::new(ThrowStatement {
            id,
            location,
            value,
        }))
    }

    #[must_use]
    pub fn delete(&self, name: &str) -> Statement {
        let (id, location) = self.node();
        Statement::Delete(Rc::new(DeleteStatement {
            id,
            location,
            target: self.identifier(name),
        }))
    }

    // Expressions

    #[must_use]
    pub fn literal(&self, value: LiteralValue) -> Rc<LiteralExpression> {
        let (id, location) = self.node();
        Rc::new(LiteralExpression {
            id,
            location,
            value,
        })
    }

    #[must_use]
    pub fn int(&self, value: i128) -> Expression {
        Expression::Literal(self.literal(LiteralValue::Int(value)))
    }

    #[must_use]
    pub fn float(&self, value: &str) -> Expression {
        Expression::Literal(self.literal(LiteralValue::Float(value.to_string())))
    }

    #[must_use]
    pub fn boolean(&self, value: bool) -> Expression {
        Expression::Literal(self.literal(LiteralValue::Bool(value)))
    }

    #[must_use]
    pub fn character(&self, value: char) -> Expression {
        Expression::Literal(self.literal(LiteralValue::Char(value)))
    }

    #[must_use]
    pub fn string(&self, value: &str) -> Expression {
        Expression::Literal(self.literal(LiteralValue::String(value.to_string())))
    }

    #[must_use]
    pub fn null(&self) -> Expression {
        Expression::Literal(self.literal(LiteralValue::Null))
    }

    #[must_use]
    pub fn unit(&self) -> Expression {
        Expression::Literal(self.literal(LiteralValue::Unit))
    }

    #[must_use]
    pub fn ident(&self, name: &str) -> Expression {
        Expression::Identifier(self.identifier(name))
    }

    #[must_use]
    pub fn binary(&self, left: Expression, operator: BinaryOperator, right: Expression) -> Expression {
        let (id, location) = self.node();
        Expression::Binary(Rc::new(BinaryExpression {
            id,
            location,
            left,
            operator,
            right,
        }))
    }

    #[must_use]
    pub fn add(&self, left: Expression, right: Expression) -> Expression {
        self.binary(left, BinaryOperator::Add, right)
    }

    #[must_use]
    pub fn unary(&self, operator: UnaryOperator, operand: Expression) -> Expression {
        let (id, location) = self.node();
        Expression::Unary(Rc::new(UnaryExpression {
            id,
            location,
            operator,
            operand,
        }))
    }

    #[must_use]
    pub fn call(&self, callee: Expression, arguments: Vec<Expression>) -> Expression {
        self.call_generic(callee, vec![], arguments)
    }

    #[must_use]
    pub fn call_generic(
        &self,
        callee: Expression,
        type_arguments: Vec<TypeAnnotation>,
        arguments: Vec<Expression>,
    ) -> Expression {
        let (id, location) = self.node();
        Expression::Call(Rc::new(CallExpression {
            id,
            location,
            callee,
            type_arguments,
            arguments,
        }))
    }

    #[must_use]
    pub fn member(&self, object: Expression, member: &str) -> Expression {
        let (id, location) = self.node();
        Expression::Member(Rc::new(MemberExpression {
            id,
            location,
            object,
            member: self.identifier(member),
        }))
    }

    #[must_use]
    pub fn path(&self, segments: &[&str]) -> Expression {
        let (id, location) = self.node();
        Expression::Path(Rc::new(PathExpression {
            id,
            location,
            segments: segments.iter().map(|s| self.identifier(s)).collect(),
        }))
    }

    #[must_use]
    pub fn construct(&self, ty: TypeAnnotation, fields: Vec<(&str, Expression)>) -> Expression {
        let (id, location) = self.node();
        let fields = fields
            .into_iter()
            .map(|(name, value)| {
                let (id, location) = self.node();
                Rc::new(FieldInitializer {
                    id,
                    location,
                    name: self.identifier(name),
                    value,
                })
            })
            .collect();
        Expression::Construct(Rc::new(ConstructExpression {
            id,
            location,
            ty,
            fields,
        }))
    }

    #[must_use]
    pub fn array(&self, elements: Vec<Expression>) -> Expression {
        let (id, location) = self.node();
        Expression::Array(Rc::new(ArrayExpression {
            id,
            location,
            elements,
        }))
    }

    #[must_use]
    pub fn tuple(&self, elements: Vec<Expression>) -> Expression {
        let (id, location) = self.node();
        Expression::Tuple(Rc::new(TupleExpression {
            id,
            location,
            elements,
        }))
    }

    #[must_use]
    pub fn index(&self, target: Expression, index: Expression) -> Expression {
        let (id, location) = self.node();
        Expression::Index(Rc::new(IndexExpression {
            id,
            location,
            target,
            index,
        }))
    }

    #[must_use]
    pub fn closure_expression(
        &self,
        parameters: Vec<Rc<Parameter>>,
        returns: Option<TypeAnnotation>,
        body: Vec<Statement>,
    ) -> Rc<ClosureExpression> {
        let (id, location) = self.node();
        Rc::new(ClosureExpression {
            id,
            location,
            parameters,
            returns: TypeSlot::new(returns.unwrap_or(TypeAnnotation::Placeholder)),
            body: self.body(body),
            captures: RefCell::new(None),
        })
    }

    #[must_use]
    pub fn closure(
        &self,
        parameters: Vec<Rc<Parameter>>,
        returns: Option<TypeAnnotation>,
        body: Vec<Statement>,
    ) -> Expression {
        Expression::Closure(self.closure_expression(parameters, returns, body))
    }

    #[must_use]
    pub fn match_(&self, scrutinee: Expression, arms: Vec<Rc<MatchArm>>) -> Expression {
        let (id, location) = self.node();
        Expression::Match(Rc::new(MatchExpression {
            id,
            location,
            scrutinee,
            arms,
        }))
    }

    #[must_use]
    pub fn arm(&self, pattern: Pattern, guard: Option<Expression>, body: Vec<Statement>) -> Rc<MatchArm> {
        let (id, location) = self.node();
        Rc::new(MatchArm {
            id,
            location,
            pattern,
            guard,
            body: self.body(body),
        })
    }

    #[must_use]
    pub fn cast(&self, value: Expression, ty: TypeAnnotation) -> Expression {
        let (id, location) = self.node();
        Expression::Cast(Rc::new(CastExpression {
            id,
            location,
            value,
            ty,
        }))
    }

    // Patterns

    #[must_use]
    pub fn bind(&self, name: &str) -> Pattern {
        let (id, location) = self.node();
        Pattern::Binding(Rc::new(BindingPattern {
            id,
            location,
            name: self.identifier(name),
            ty: TypeSlot::placeholder(),
            is_mut: false,
        }))
    }

    #[must_use]
    pub fn wildcard(&self) -> Pattern {
        let (id, location) = self.node();
        Pattern::Wildcard(Rc::new(WildcardPattern { id, location }))
    }

    #[must_use]
    pub fn tuple_pattern(&self, elements: Vec<Pattern>) -> Pattern {
        let (id, location) = self.node();
        Pattern::Tuple(Rc::new(TuplePattern {
            id,
            location,
            elements,
        }))
    }

    #[must_use]
    pub fn literal_pattern(&self, value: LiteralValue) -> Pattern {
        let (id, location) = self.node();
        Pattern::Literal(Rc::new(LiteralPattern {
            id,
            location,
            literal: self.literal(value),
        }))
    }

    #[must_use]
    pub fn case_pattern(&self, path: &[&str], arguments: Vec<Pattern>) -> Pattern {
        let (id, location) = self.node();
        Pattern::EnumCase(Rc::new(EnumCasePattern {
            id,
            location,
            path: path.iter().map(|s| self.identifier(s)).collect(),
            arguments,
        }))
    }
}
