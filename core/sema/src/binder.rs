//! Name Binder
//!
//! Gives every declaration its unique id and points every reference at the
//! declaration it means.
//!
//! Binding runs in two steps. The hoisting step assigns ids to module-level
//! functions, types, imports and the members of every type body, so bodies
//! may refer to them regardless of source order. The walk then visits items in
//! source order with a [`ScopeCursor`]; declarations met on the way (module
//! `let`s, parameters, locals, pattern and catch bindings) get their ids as
//! they are reached, and each identifier is resolved against the scope the
//! cursor stands on.
//!
//! Resolution looks in the value namespace (nearest scope first, natives
//! last), then in the type namespace. A symbol that exists but still has id
//! `0` was declared further down and is reported as used before declared.

use rustc_hash::FxHashMap;
use tern_ast::nodes::{
    Block, Expression, FunctionDefinition, Identifier, Item, Location, Parameter, Pattern,
    SourceFile, Statement,
};

use crate::{
    cursor::ScopeCursor,
    diagnostics::Diagnostics,
    errors::{Abort, InternalError, SemaError},
    ids::IdAllocator,
    options::AnalysisOptions,
    scope::{lookup_type_any_scope, lookup_value_any_scope, ScopeKind, ScopeRef},
    symbol::SymbolRef,
};

pub(crate) struct Binder<'a> {
    ids: &'a IdAllocator,
    options: &'a AnalysisOptions,
    diagnostics: &'a mut Diagnostics,
    module: ScopeRef,
    cursor: ScopeCursor,
    symbols: FxHashMap<u32, SymbolRef>,
}

/// What the binder leaves behind for the checker.
pub(crate) struct BinderOutput {
    pub(crate) symbols: FxHashMap<u32, SymbolRef>,
    pub(crate) trace: Vec<u32>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Namespace {
    Value,
    Type,
}

impl<'a> Binder<'a> {
    pub(crate) fn new(
        ids: &'a IdAllocator,
        options: &'a AnalysisOptions,
        diagnostics: &'a mut Diagnostics,
        module: ScopeRef,
    ) -> Self {
        Self {
            ids,
            options,
            diagnostics,
            cursor: ScopeCursor::new(module.clone()).with_trace(options.record_scope_trace),
            module,
            symbols: FxHashMap::default(),
        }
    }

    #[tracing::instrument(skip_all, fields(file = %file.name))]
    pub(crate) fn bind(mut self, file: &SourceFile) -> Result<BinderOutput, Abort> {
        self.check_entry_function(file)?;
        self.hoist(file)?;
        for item in &file.items {
            self.item(item)?;
        }
        let trace = self.cursor.finish()?;
        tracing::debug!(symbols = self.symbols.len(), "binding finished");
        Ok(BinderOutput {
            symbols: self.symbols,
            trace,
        })
    }

    /// The entry function must be the last function of the unit.
    fn check_entry_function(&mut self, file: &SourceFile) -> Result<(), Abort> {
        let Some(entry) = &self.options.entry_function else {
            return Ok(());
        };
        let functions = file.function_definitions();
        let Some(position) = functions.iter().position(|f| &f.name() == entry) else {
            return Ok(());
        };
        if let Some(late) = functions.get(position + 1) {
            self.diagnostics.report(SemaError::FunctionAfterEntry {
                name: late.name(),
                entry: entry.clone(),
                location: late.location.clone(),
                entry_location: functions[position].location.clone(),
            })?;
        }
        Ok(())
    }

    fn assign(&mut self, symbol: &SymbolRef, identifier: Option<&Identifier>) -> Result<(), Abort> {
        let id = self.ids.allocate();
        symbol.assign_id(id)?;
        if let Some(identifier) = identifier {
            identifier.symbol_id.set(id);
        }
        tracing::trace!(name = %symbol.name, id, kind = symbol.kind.describe(), "bound declaration");
        self.symbols.insert(id, symbol.clone());
        Ok(())
    }

    fn local(
        scope: &ScopeRef,
        namespace: Namespace,
        name: &str,
        location: &Location,
    ) -> Result<SymbolRef, InternalError> {
        let scope = scope.borrow();
        let symbol = match namespace {
            Namespace::Value => scope.lookup_value_local(name),
            Namespace::Type => scope.lookup_type_local(name),
        };
        symbol.ok_or_else(|| InternalError::MissingSymbol {
            name: name.to_string(),
            scope: scope.name.clone(),
            location: location.clone(),
        })
    }

    fn assign_local(
        &mut self,
        scope: &ScopeRef,
        namespace: Namespace,
        identifier: &Identifier,
    ) -> Result<(), Abort> {
        let symbol = Self::local(scope, namespace, &identifier.name, &identifier.location)?;
        self.assign(&symbol, Some(identifier))
    }

    fn type_body(&self, name: &str) -> Result<ScopeRef, InternalError> {
        self.module
            .borrow()
            .child_named(ScopeKind::TypeBody, name)
            .ok_or_else(|| InternalError::MissingChildScope {
                parent: self.module.borrow().name.clone(),
                expected: ScopeKind::TypeBody,
            })
    }

    fn hoist(&mut self, file: &SourceFile) -> Result<(), Abort> {
        let module = self.module.clone();
        for item in &file.items {
            match item {
                Item::Function(function) => {
                    self.assign_local(&module, Namespace::Value, &function.name)?;
                }
                Item::Struct(definition) => {
                    self.assign_local(&module, Namespace::Type, &definition.name)?;
                    let body = self.type_body(&definition.name())?;
                    for parameter in &definition.type_parameters {
                        self.assign_local(&body, Namespace::Type, parameter)?;
                    }
                    for field in &definition.fields {
                        self.assign_local(&body, Namespace::Value, &field.name)?;
                    }
                    for method in &definition.methods {
                        self.assign_local(&body, Namespace::Value, &method.name)?;
                    }
                }
                Item::Enum(definition) => {
                    self.assign_local(&module, Namespace::Type, &definition.name)?;
                    let body = self.type_body(&definition.name())?;
                    for case in &definition.cases {
                        self.assign_local(&body, Namespace::Value, &case.name)?;
                    }
                }
                Item::TypeAlias(alias) => {
                    self.assign_local(&module, Namespace::Type, &alias.name)?;
                }
                Item::Import(import) => {
                    self.assign_local(&module, Namespace::Value, &import.alias)?;
                }
                Item::Let(_) => {}
            }
        }
        Ok(())
    }

    fn item(&mut self, item: &Item) -> Result<(), Abort> {
        match item {
            Item::Function(function) => self.function(function, false),
            Item::Struct(definition) => {
                self.cursor.descend(ScopeKind::TypeBody)?;
                for method in &definition.methods {
                    self.function(method, true)?;
                }
                self.cursor.ascend()?;
                Ok(())
            }
            Item::Enum(_) => {
                self.cursor.pass_over(ScopeKind::TypeBody)?;
                Ok(())
            }
            Item::Import(_) => {
                self.cursor.pass_over(ScopeKind::Import)?;
                Ok(())
            }
            Item::TypeAlias(_) => Ok(()),
            Item::Let(let_statement) => {
                if let Some(value) = &let_statement.value {
                    self.expression(value)?;
                }
                self.declare_pattern(&let_statement.pattern, true)
            }
        }
    }

    fn function(&mut self, function: &FunctionDefinition, is_method: bool) -> Result<(), Abort> {
        let scope = self.cursor.descend(ScopeKind::Function)?;
        for parameter in &function.type_parameters {
            self.assign_local(&scope, Namespace::Type, parameter)?;
        }
        if is_method {
            let this = Self::local(&scope, Namespace::Value, "self", &function.location)?;
            self.assign(&this, None)?;
        }
        self.parameters(&function.parameters)?;
        self.block(&function.body)?;
        self.cursor.ascend()?;
        Ok(())
    }

    fn parameters(&mut self, parameters: &[std::rc::Rc<Parameter>]) -> Result<(), Abort> {
        let scope = self.cursor.current();
        for parameter in parameters {
            self.assign_local(&scope, Namespace::Value, &parameter.name)?;
        }
        Ok(())
    }

    /// Binds the names a pattern introduces in the current scope.
    fn declare_pattern(&mut self, pattern: &Pattern, from_let: bool) -> Result<(), Abort> {
        let scope = self.cursor.current();
        let is_module = scope.borrow().kind == ScopeKind::Module;
        for binding in pattern.bindings() {
            if from_let && self.options.shadow_check && !is_module {
                let module_binding = self.module.borrow().lookup_value_local(&binding.name.name);
                if let Some(module_binding) = module_binding {
                    self.diagnostics.report(SemaError::ShadowsModuleBinding {
                        name: binding.name.name.clone(),
                        location: binding.location.clone(),
                        module_location: module_binding.location.clone(),
                    })?;
                }
            }
            self.assign_local(&scope, Namespace::Value, &binding.name)?;
        }
        self.pattern_references(pattern)
    }

    /// Enum case paths inside patterns are references. A bare case name is
    /// resolved later against the scrutinee's type.
    fn pattern_references(&mut self, pattern: &Pattern) -> Result<(), Abort> {
        match pattern {
            Pattern::EnumCase(case) => {
                if let [head, _, ..] = case.path.as_slice() {
                    self.resolve(head)?;
                }
                for argument in &case.arguments {
                    self.pattern_references(argument)?;
                }
                Ok(())
            }
            Pattern::Tuple(tuple) => {
                for element in &tuple.elements {
                    self.pattern_references(element)?;
                }
                Ok(())
            }
            Pattern::Binding(_) | Pattern::Wildcard(_) | Pattern::Literal(_) => Ok(()),
        }
    }

    fn resolve(&mut self, identifier: &Identifier) -> Result<(), Abort> {
        let scope = self.cursor.current();
        let symbol = lookup_value_any_scope(&scope, &identifier.name)
            .or_else(|| lookup_type_any_scope(&scope, &identifier.name));
        match symbol {
            Some(symbol) if symbol.is_bound() => {
                identifier.symbol_id.set(symbol.id());
                Ok(())
            }
            Some(_) => self.diagnostics.report(SemaError::UsedBeforeDeclared {
                name: identifier.name.clone(),
                location: identifier.location.clone(),
            }),
            None => self.diagnostics.report(SemaError::NotDeclared {
                name: identifier.name.clone(),
                scope: scope.borrow().name.clone(),
                location: identifier.location.clone(),
            }),
        }
    }

    fn block(&mut self, block: &Block) -> Result<(), Abort> {
        for statement in &block.statements {
            self.statement(statement)?;
        }
        Ok(())
    }

    fn scoped_block(&mut self, kind: ScopeKind, block: &Block) -> Result<(), Abort> {
        self.cursor.descend(kind)?;
        self.block(block)?;
        self.cursor.ascend()?;
        Ok(())
    }

    fn statement(&mut self, statement: &Statement) -> Result<(), Abort> {
        match statement {
            Statement::Let(let_statement) => {
                if let Some(value) = &let_statement.value {
                    self.expression(value)?;
                }
                self.declare_pattern(&let_statement.pattern, true)
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
                self.scoped_block(ScopeKind::Branch, &statement.then_branch)?;
                if let Some(else_branch) = &statement.else_branch {
                    self.scoped_block(ScopeKind::Branch, else_branch)?;
                }
                Ok(())
            }
            Statement::While(statement) => {
                self.expression(&statement.condition)?;
                self.scoped_block(ScopeKind::Loop, &statement.body)
            }
            Statement::Loop(statement) => self.scoped_block(ScopeKind::Loop, &statement.body),
            Statement::For(statement) => {
                self.expression(&statement.iterable)?;
                self.cursor.descend(ScopeKind::Loop)?;
                self.declare_pattern(&statement.pattern, false)?;
                self.block(&statement.body)?;
                self.cursor.ascend()?;
                Ok(())
            }
            Statement::Break(_) | Statement::Continue(_) => Ok(()),
            Statement::Block(block) => self.scoped_block(ScopeKind::Block, block),
            Statement::Try(statement) => {
                self.scoped_block(ScopeKind::Block, &statement.body)?;
                let scope = self.cursor.descend(ScopeKind::Catch)?;
                if let Some(binding) = &statement.catch_binding {
                    self.assign_local(&scope, Namespace::Value, &binding.name)?;
                }
                self.block(&statement.catch_body)?;
                self.cursor.ascend()?;
                Ok(())
            }
            Statement::Throw(statement) => self.expression(&statement.value),
            Statement::Delete(statement) => self.resolve(&statement.target),
        }
    }

    fn expression(&mut self, expression: &Expression) -> Result<(), Abort> {
        match expression {
            Expression::Literal(_) => Ok(()),
            Expression::Identifier(identifier) => self.resolve(identifier),
            Expression::Path(path) => match path.segments.first() {
                Some(head) => self.resolve(head),
                None => Ok(()),
            },
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
                self.cursor.descend(ScopeKind::Closure)?;
                self.parameters(&closure.parameters)?;
                self.block(&closure.body)?;
                self.cursor.ascend()?;
                Ok(())
            }
            Expression::Match(match_expression) => {
                self.expression(&match_expression.scrutinee)?;
                for arm in &match_expression.arms {
                    self.cursor.descend(ScopeKind::MatchArm)?;
                    self.declare_pattern(&arm.pattern, false)?;
                    if let Some(guard) = &arm.guard {
                        self.expression(guard)?;
                    }
                    self.block(&arm.body)?;
                    self.cursor.ascend()?;
                }
                Ok(())
            }
            Expression::Cast(cast) => self.expression(&cast.value),
        }
    }
}
