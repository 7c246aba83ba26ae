//! Scope Skeleton
//!
//! The first pass over a unit. It creates every scope in the order its
//! construct appears in the tree and pre-declares every declaration with id
//! `0`. Later passes never create scopes; they step through this skeleton
//! with a [`crate::cursor::ScopeCursor`].
//!
//! Scope-introducing constructs, in walk order:
//!
//! - function item: one function scope holding type parameters, parameters and
//!   the body statements
//! - struct and enum items: one type body scope named after the type; each
//!   method gets a function scope inside it with an implicit `self`
//! - import item: one empty import scope named after the alias
//! - `if`: a branch scope for the then branch, another for `else`
//! - `while`, `loop`, `for`: one loop scope (the `for` binding lives in it);
//!   the condition or iterable is walked before the scope
//! - block statement: one block scope
//! - `try`: a block scope for the body, a catch scope for binding and handler
//! - closure: one closure scope
//! - match arm: one match arm scope holding the pattern bindings
//!
//! A `let` walks its initializer before declaring its bindings.

use std::rc::Rc;

use tern_ast::nodes::{
    Block, EnumDefinition, Expression, FunctionDefinition, ImportDefinition, Item, Parameter,
    Pattern, SourceFile, Statement, StructDefinition, Visibility,
};
use tern_ast::types::{TypeAnnotation, TypeSlot};

use crate::{
    errors::Abort,
    scope::{ScopeKind, ScopeRef},
    symbol::{Modifiers, Symbol, SymbolKind, SymbolRef},
    symbol_table::SymbolTable,
};

pub(crate) struct ScopeBuilder<'a> {
    table: &'a SymbolTable,
    current: ScopeRef,
}

fn visibility_modifiers(visibility: &Visibility) -> Modifiers {
    match visibility {
        Visibility::Public => Modifiers::PUBLIC,
        Visibility::Private => Modifiers::empty(),
    }
}

fn mutability(is_mut: bool) -> Modifiers {
    if is_mut {
        Modifiers::MUTABLE
    } else {
        Modifiers::empty()
    }
}

impl<'a> ScopeBuilder<'a> {
    pub(crate) fn new(table: &'a SymbolTable, module: ScopeRef) -> Self {
        Self {
            table,
            current: module,
        }
    }

    #[tracing::instrument(skip_all, fields(file = %file.name))]
    pub(crate) fn build(mut self, file: &SourceFile) -> Result<(), Abort> {
        for item in &file.items {
            self.item(item)?;
        }
        tracing::debug!(scope_count = self.table.next_scope_id(), "scope skeleton built");
        Ok(())
    }

    fn enter(&mut self, name: &str, kind: ScopeKind) -> ScopeRef {
        let scope = self.table.push_child(&self.current, name, kind);
        self.current = scope.clone();
        scope
    }

    fn leave(&mut self) {
        let parent = self.current.borrow().parent();
        if let Some(parent) = parent {
            self.current = parent;
        }
    }

    fn declare_value(&self, symbol: Symbol) -> Result<SymbolRef, Abort> {
        let symbol = Rc::new(symbol);
        self.current
            .borrow_mut()
            .declare_value(symbol.clone())
            .map_err(Abort::Fatal)?;
        Ok(symbol)
    }

    fn declare_type(&self, symbol: Symbol) -> Result<SymbolRef, Abort> {
        let symbol = Rc::new(symbol);
        self.current
            .borrow_mut()
            .declare_type(symbol.clone())
            .map_err(Abort::Fatal)?;
        Ok(symbol)
    }

    fn item(&mut self, item: &Item) -> Result<(), Abort> {
        match item {
            Item::Function(function) => {
                let generics = function.type_parameters.iter().map(|p| p.name.clone()).collect();
                self.declare_value(
                    Symbol::new(
                        &function.name(),
                        SymbolKind::Function,
                        TypeSlot::new(function.signature()),
                        function.location.clone(),
                    )
                    .with_modifiers(visibility_modifiers(&function.visibility) | Modifiers::HOISTED)
                    .with_type_parameters(generics),
                )?;
                self.function_scope(function, None)
            }
            Item::Struct(definition) => self.struct_definition(definition),
            Item::Enum(definition) => self.enum_definition(definition),
            Item::TypeAlias(alias) => {
                self.declare_type(
                    Symbol::new(
                        &alias.name(),
                        SymbolKind::TypeAlias,
                        TypeSlot::new(alias.ty.clone()),
                        alias.location.clone(),
                    )
                    .with_modifiers(visibility_modifiers(&alias.visibility) | Modifiers::HOISTED),
                )?;
                Ok(())
            }
            Item::Import(import) => self.import(import),
            Item::Let(let_statement) => {
                if let Some(value) = &let_statement.value {
                    self.expression(value)?;
                }
                self.declare_pattern(&let_statement.pattern)
            }
        }
    }

    fn import(&mut self, import: &ImportDefinition) -> Result<(), Abort> {
        let mut modifiers = Modifiers::HOISTED;
        if import.foreign {
            modifiers |= Modifiers::FOREIGN;
        }
        self.declare_value(
            Symbol::new(
                &import.alias(),
                SymbolKind::Import,
                TypeSlot::new(TypeAnnotation::simple(&import.path_string())),
                import.location.clone(),
            )
            .with_modifiers(modifiers),
        )?;
        let scope = self
            .table
            .push_child(&self.current, &import.alias(), ScopeKind::Import);
        scope.borrow_mut().foreign = import.foreign;
        Ok(())
    }

    fn struct_definition(&mut self, definition: &StructDefinition) -> Result<(), Abort> {
        let generics: Vec<String> = definition
            .type_parameters
            .iter()
            .map(|p| p.name.clone())
            .collect();
        self.declare_type(
            Symbol::new(
                &definition.name(),
                SymbolKind::Struct,
                TypeSlot::new(definition.self_type()),
                definition.location.clone(),
            )
            .with_modifiers(visibility_modifiers(&definition.visibility) | Modifiers::HOISTED)
            .with_type_parameters(generics),
        )?;
        self.enter(&definition.name(), ScopeKind::TypeBody);
        self.declare_type_parameters(&definition.type_parameters)?;
        for field in &definition.fields {
            self.declare_value(
                Symbol::new(
                    &field.name.name,
                    SymbolKind::Field,
                    field.ty.clone(),
                    field.location.clone(),
                )
                .with_modifiers(mutability(field.is_mut) | Modifiers::PUBLIC | Modifiers::HOISTED),
            )?;
        }
        for method in &definition.methods {
            let mut modifiers = visibility_modifiers(&method.visibility) | Modifiers::HOISTED;
            if method.is_mutating {
                modifiers |= Modifiers::MUTATING;
            }
            self.declare_value(
                Symbol::new(
                    &method.name(),
                    SymbolKind::Method,
                    TypeSlot::new(method.signature()),
                    method.location.clone(),
                )
                .with_modifiers(modifiers)
                .with_type_parameters(
                    method.type_parameters.iter().map(|p| p.name.clone()).collect(),
                ),
            )?;
        }
        let self_type = definition.self_type();
        for method in &definition.methods {
            self.function_scope(method, Some(&self_type))?;
        }
        self.leave();
        Ok(())
    }

    fn enum_definition(&mut self, definition: &EnumDefinition) -> Result<(), Abort> {
        let enum_type = TypeAnnotation::simple(&definition.name());
        self.declare_type(
            Symbol::new(
                &definition.name(),
                SymbolKind::Enum,
                TypeSlot::new(enum_type.clone()),
                definition.location.clone(),
            )
            .with_modifiers(visibility_modifiers(&definition.visibility) | Modifiers::HOISTED),
        )?;
        self.enter(&definition.name(), ScopeKind::TypeBody);
        for case in &definition.cases {
            let ty = if case.payload.is_empty() {
                enum_type.clone()
            } else {
                TypeAnnotation::function(&case.name.name, case.payload.clone(), enum_type.clone())
            };
            self.declare_value(
                Symbol::new(
                    &case.name.name,
                    SymbolKind::EnumCase,
                    TypeSlot::new(ty),
                    case.location.clone(),
                )
                .with_modifiers(Modifiers::PUBLIC | Modifiers::HOISTED),
            )?;
        }
        self.leave();
        Ok(())
    }

    fn declare_type_parameters(
        &mut self,
        parameters: &[Rc<tern_ast::nodes::Identifier>],
    ) -> Result<(), Abort> {
        for parameter in parameters {
            self.declare_type(Symbol::new(
                &parameter.name,
                SymbolKind::TypeParameter,
                TypeSlot::new(TypeAnnotation::Parameter(parameter.name.clone())),
                parameter.location.clone(),
            ))?;
        }
        Ok(())
    }

    fn function_scope(
        &mut self,
        function: &FunctionDefinition,
        self_type: Option<&TypeAnnotation>,
    ) -> Result<(), Abort> {
        self.enter(&function.name(), ScopeKind::Function);
        self.declare_type_parameters(&function.type_parameters)?;
        if let Some(self_type) = self_type {
            self.declare_value(
                Symbol::new(
                    "self",
                    SymbolKind::SelfValue,
                    TypeSlot::new(self_type.clone()),
                    function.location.clone(),
                )
                .with_modifiers(mutability(function.is_mutating)),
            )?;
        }
        self.parameters(&function.parameters)?;
        self.statements(&function.body)?;
        self.leave();
        Ok(())
    }

    fn parameters(&mut self, parameters: &[Rc<Parameter>]) -> Result<(), Abort> {
        for parameter in parameters {
            self.declare_value(
                Symbol::new(
                    &parameter.name(),
                    SymbolKind::Parameter,
                    parameter.ty.clone(),
                    parameter.location.clone(),
                )
                .with_modifiers(mutability(parameter.is_mut)),
            )?;
        }
        Ok(())
    }

    fn declare_pattern(&mut self, pattern: &Pattern) -> Result<(), Abort> {
        for binding in pattern.bindings() {
            self.declare_value(
                Symbol::new(
                    &binding.name.name,
                    SymbolKind::Variable,
                    binding.ty.clone(),
                    binding.location.clone(),
                )
                .with_modifiers(mutability(binding.is_mut)),
            )?;
        }
        Ok(())
    }

    fn statements(&mut self, block: &Block) -> Result<(), Abort> {
        for statement in &block.statements {
            self.statement(statement)?;
        }
        Ok(())
    }

    fn scoped_block(&mut self, name: &str, kind: ScopeKind, block: &Block) -> Result<(), Abort> {
        self.enter(name, kind);
        self.statements(block)?;
        self.leave();
        Ok(())
    }

    fn statement(&mut self, statement: &Statement) -> Result<(), Abort> {
        match statement {
            Statement::Let(let_statement) => {
                if let Some(value) = &let_statement.value {
                    self.expression(value)?;
                }
                self.declare_pattern(&let_statement.pattern)
            }
            Statement::Assign(assign) => {
                self.expression(&assign.target)?;
                self.expression(&assign.value)
            }
            Statement::Expression(statement) => self.expression(&statement.expression),
            Statement::Return(statement) => match &statement.value {
                Some(value) => self.expression(value),
                None => Ok(()),
            },
            Statement::If(statement) => {
                self.expression(&statement.condition)?;
                self.scoped_block("if", ScopeKind::Branch, &statement.then_branch)?;
                if let Some(else_branch) = &statement.else_branch {
                    self.scoped_block("else", ScopeKind::Branch, else_branch)?;
                }
                Ok(())
            }
            Statement::While(statement) => {
                self.expression(&statement.condition)?;
                self.scoped_block("while", ScopeKind::Loop, &statement.body)
            }
            Statement::Loop(statement) => self.scoped_block("loop", ScopeKind::Loop, &statement.body),
            Statement::For(statement) => {
                self.expression(&statement.iterable)?;
                self.enter("for", ScopeKind::Loop);
                self.declare_pattern(&statement.pattern)?;
                self.statements(&statement.body)?;
                self.leave();
                Ok(())
            }
            Statement::Break(_) | Statement::Continue(_) | Statement::Delete(_) => Ok(()),
            Statement::Block(block) => self.scoped_block("block", ScopeKind::Block, block),
            Statement::Try(statement) => {
                self.scoped_block("try", ScopeKind::Block, &statement.body)?;
                self.enter("catch", ScopeKind::Catch);
                if let Some(binding) = &statement.catch_binding {
                    self.declare_value(Symbol::new(
                        &binding.name(),
                        SymbolKind::Variable,
                        binding.ty.clone(),
                        binding.location.clone(),
                    ))?;
                }
                self.statements(&statement.catch_body)?;
                self.leave();
                Ok(())
            }
            Statement::Throw(statement) => self.expression(&statement.value),
        }
    }

    fn expression(&mut self, expression: &Expression) -> Result<(), Abort> {
        match expression {
            Expression::Literal(_) | Expression::Identifier(_) | Expression::Path(_) => Ok(()),
            Expression::Binary(binary) => {
                self.expression(&binary.left)?;
                self.expression(&binary.right)
            }
            Expression::Unary(unary) => self.expression(&unary.operand),
            Expression::Call(call) => {
                self.expression(&call.callee)?;
                for argument in &call.arguments {
                    self.expression(argument)?;
                }
                Ok(())
            }
            Expression::Member(member) => self.expression(&member.object),
            Expression::Construct(construct) => {
                for field in &construct.fields {
                    self.expression(&field.value)?;
                }
                Ok(())
            }
            Expression::Array(array) => {
                for element in &array.elements {
                    self.expression(element)?;
                }
                Ok(())
            }
            Expression::Tuple(tuple) => {
                for element in &tuple.elements {
                    self.expression(element)?;
                }
                Ok(())
            }
            Expression::Index(index) => {
                self.expression(&index.target)?;
                self.expression(&index.index)
            }
            Expression::Closure(closure) => {
                self.enter("closure", ScopeKind::Closure);
                self.parameters(&closure.parameters)?;
                self.statements(&closure.body)?;
                self.leave();
                Ok(())
            }
            Expression::Match(match_expression) => {
                self.expression(&match_expression.scrutinee)?;
                for arm in &match_expression.arms {
                    self.enter("arm", ScopeKind::MatchArm);
                    self.declare_pattern(&arm.pattern)?;
                    if let Some(guard) = &arm.guard {
                        self.expression(guard)?;
                    }
                    self.statements(&arm.body)?;
                    self.leave();
                }
                Ok(())
            }
            Expression::Cast(cast) => self.expression(&cast.value),
        }
    }
}
