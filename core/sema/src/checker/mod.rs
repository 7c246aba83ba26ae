//! Type Checker
//!
//! The orchestrating pass. It runs after the binder and computes a type for
//! every expression, records it in the node type table and validates it
//! against what the context expects. Placeholders met on the way are handed
//! to the [`InferenceRunner`](crate::inference::InferenceRunner); closures are
//! completed with the closure parameter inferencer and the closure inspector.
//!
//! Before the walk, two passes over the items resolve what bodies depend on:
//! declared signatures, field and payload types (so a call may precede the
//! callee's definition) and enum raw values.
//!
//! The walk steps through the scope skeleton with its own cursor, in exactly
//! the binder's order.

mod calls;
mod expressions;

use rustc_hash::FxHashMap;
use tern_ast::nodes::{
    AssignStatement, Block, EnumDefinition, Expression, FunctionDefinition, Identifier, Item,
    LetStatement, LiteralValue, Location, SourceFile, Statement,
};
use tern_ast::types::{PrimitiveKind, TypeAnnotation, TypeSlot};

use crate::{
    compat::{common_type, compatibility, Compatibility},
    cursor::ScopeCursor,
    diagnostics::Diagnostics,
    errors::{Abort, InternalError, MismatchContext, SemaError},
    inference::InferenceRunner,
    options::AnalysisOptions,
    scope::{find_type_scope, lookup_type_any_scope, lookup_value_any_scope, ScopeKind, ScopeRef},
    symbol::{SymbolKind, SymbolRef},
    typed_context::ModuleTables,
};

const MAX_ALIAS_DEPTH: u8 = 16;

/// What a `return` inside the current body is checked against.
enum ReturnFrame {
    Function(TypeAnnotation),
    Closure {
        declared: TypeAnnotation,
        collected: Vec<TypeAnnotation>,
    },
}

pub(crate) struct TypeChecker<'a> {
    diagnostics: &'a mut Diagnostics,
    module: ScopeRef,
    cursor: ScopeCursor,
    tables: &'a mut ModuleTables,
    frames: Vec<ReturnFrame>,
    /// Types thrown inside each enclosing `try` body.
    thrown: Vec<Vec<TypeAnnotation>>,
}

impl<'a> TypeChecker<'a> {
    pub(crate) fn new(
        options: &AnalysisOptions,
        diagnostics: &'a mut Diagnostics,
        module: ScopeRef,
        tables: &'a mut ModuleTables,
    ) -> Self {
        Self {
            diagnostics,
            cursor: ScopeCursor::new(module.clone()).with_trace(options.record_scope_trace),
            module,
            tables,
            frames: Vec::new(),
            thrown: Vec::new(),
        }
    }

    #[tracing::instrument(skip_all, fields(file = %file.name))]
    pub(crate) fn check(mut self, file: &SourceFile) -> Result<Vec<u32>, Abort> {
        self.resolve_signatures(file)?;
        for item in &file.items {
            if let Item::Enum(definition) = item {
                self.enum_raw_values(definition)?;
            }
        }
        for item in &file.items {
            self.item(item)?;
        }
        tracing::debug!(typed_nodes = self.tables.node_types.len(), "type check finished");
        Ok(self.cursor.finish()?)
    }

    fn report(&mut self, error: SemaError) -> Result<(), Abort> {
        self.diagnostics.report(error)
    }

    fn record(&mut self, expression: &Expression, ty: TypeAnnotation) -> TypeAnnotation {
        self.tables.node_types.insert(expression.id(), ty.clone());
        ty
    }

    /// Checks that a `found` value may be used where `expected` is required.
    /// Numeric widening is accepted with a warning.
    fn accept(
        &mut self,
        found: &TypeAnnotation,
        expected: &TypeAnnotation,
        context: MismatchContext,
        location: &Location,
    ) -> Result<(), Abort> {
        match compatibility(found, expected) {
            Compatibility::Compatible => Ok(()),
            Compatibility::Intermediate => {
                if found.is_numeric() && expected.is_numeric() {
                    self.report(SemaError::ImplicitWidening {
                        from: found.clone(),
                        to: expected.clone(),
                        location: location.clone(),
                    })?;
                }
                Ok(())
            }
            Compatibility::Incompatible => self.report(SemaError::TypeMismatch {
                expected: expected.clone(),
                found: found.clone(),
                context,
                location: location.clone(),
            }),
        }
    }

    /// The symbol an identifier was bound to, re-resolved from the cursor's
    /// scope. `None` for identifiers the binder could not resolve.
    fn symbol_of(&self, identifier: &Identifier) -> Result<Option<SymbolRef>, Abort> {
        let bound = identifier.symbol_id();
        if bound == 0 {
            return Ok(None);
        }
        let scope = self.cursor.current();
        let symbol = lookup_value_any_scope(&scope, &identifier.name)
            .or_else(|| lookup_type_any_scope(&scope, &identifier.name))
            .ok_or_else(|| InternalError::MissingSymbol {
                name: identifier.name.clone(),
                scope: scope.borrow().name.clone(),
                location: identifier.location.clone(),
            })?;
        if symbol.id() != bound {
            return Err(InternalError::BindingMismatch {
                name: identifier.name.clone(),
                expected: bound,
                found: symbol.id(),
                location: identifier.location.clone(),
            }
            .into());
        }
        Ok(Some(symbol))
    }

    // ---- annotations -------------------------------------------------------

    /// Resolves type names in `ty` against `scope`: aliases are expanded,
    /// generic parameters become [`TypeAnnotation::Parameter`] and primitive
    /// spellings become primitives.
    fn resolve_annotation(
        &mut self,
        ty: &TypeAnnotation,
        scope: &ScopeRef,
        location: &Location,
    ) -> Result<TypeAnnotation, Abort> {
        self.resolve_annotation_at(ty, scope, location, 0)
    }

    fn resolve_annotation_at(
        &mut self,
        ty: &TypeAnnotation,
        scope: &ScopeRef,
        location: &Location,
        depth: u8,
    ) -> Result<TypeAnnotation, Abort> {
        match ty {
            TypeAnnotation::Placeholder
            | TypeAnnotation::Primitive(_)
            | TypeAnnotation::Parameter(_) => Ok(ty.clone()),
            TypeAnnotation::Simple { name, arguments } => {
                let arguments = arguments
                    .iter()
                    .map(|argument| self.resolve_annotation_at(argument, scope, location, depth))
                    .collect::<Result<Vec<_>, _>>()?;
                self.resolve_named(name, arguments, scope, location, depth)
            }
            TypeAnnotation::Function {
                name,
                returns,
                parameters,
            } => {
                let parameters = parameters
                    .iter()
                    .map(|parameter| self.resolve_annotation_at(parameter, scope, location, depth))
                    .collect::<Result<Vec<_>, _>>()?;
                let returns = self.resolve_annotation_at(returns, scope, location, depth)?;
                Ok(TypeAnnotation::Function {
                    name: name.clone(),
                    returns: Box::new(returns),
                    parameters,
                })
            }
            TypeAnnotation::Reference(inner) => Ok(TypeAnnotation::Reference(Box::new(
                self.resolve_annotation_at(inner, scope, location, depth)?,
            ))),
            TypeAnnotation::Member { path, inner } => {
                let import = path
                    .first()
                    .and_then(|alias| self.module.borrow().child_named(ScopeKind::Import, alias));
                let known = match (&import, inner.scope_name()) {
                    (Some(import), Some(name)) => import.borrow().lookup_type_local(name).is_some(),
                    _ => false,
                };
                if !known {
                    self.report(SemaError::UnknownType {
                        name: ty.to_string(),
                        location: location.clone(),
                    })?;
                }
                Ok(ty.clone())
            }
        }
    }

    fn resolve_named(
        &mut self,
        name: &str,
        arguments: Vec<TypeAnnotation>,
        scope: &ScopeRef,
        location: &Location,
        depth: u8,
    ) -> Result<TypeAnnotation, Abort> {
        let named = TypeAnnotation::generic(name, arguments);
        if TypeAnnotation::BUILTIN_SIMPLE.contains(&name) {
            return Ok(named);
        }
        let TypeAnnotation::Simple { arguments, .. } = &named else {
            return Ok(named);
        };
        if arguments.is_empty() {
            if let Some(kind) = PrimitiveKind::from_name(name) {
                return Ok(TypeAnnotation::Primitive(kind));
            }
        }
        let Some(symbol) = lookup_type_any_scope(scope, name) else {
            if find_type_scope(scope, name).is_none() {
                self.report(SemaError::UnknownType {
                    name: name.to_string(),
                    location: location.clone(),
                })?;
            }
            return Ok(named);
        };
        match symbol.kind {
            SymbolKind::TypeParameter => Ok(TypeAnnotation::Parameter(name.to_string())),
            SymbolKind::TypeAlias => {
                if depth >= MAX_ALIAS_DEPTH {
                    self.report(SemaError::UnknownType {
                        name: name.to_string(),
                        location: location.clone(),
                    })?;
                    return Ok(named);
                }
                let module = self.module.clone();
                self.resolve_annotation_at(&symbol.type_annotation(), &module, location, depth + 1)
            }
            SymbolKind::Struct => {
                let expected = symbol.type_parameters.len();
                if !arguments.is_empty() && arguments.len() != expected {
                    self.report(SemaError::TypeArgumentCountMismatch {
                        name: name.to_string(),
                        expected,
                        found: arguments.len(),
                        location: location.clone(),
                    })?;
                }
                Ok(named)
            }
            _ => Ok(named),
        }
    }

    /// Resolves the annotation held by `slot` in place.
    fn resolve_slot(
        &mut self,
        slot: &TypeSlot,
        scope: &ScopeRef,
        location: &Location,
    ) -> Result<TypeAnnotation, Abort> {
        let current = slot.get();
        let resolved = self.resolve_annotation(&current, scope, location)?;
        if resolved != current {
            slot.replace(resolved.clone());
        }
        Ok(resolved)
    }

    // ---- pre-passes --------------------------------------------------------

    fn child(parent: &ScopeRef, kind: ScopeKind, name: &str) -> Result<ScopeRef, InternalError> {
        let scope = parent.borrow();
        scope
            .child_named(kind, name)
            .ok_or_else(|| InternalError::MissingChildScope {
                parent: scope.name.clone(),
                expected: kind,
            })
    }

    fn resolve_function_signature(
        &mut self,
        function: &FunctionDefinition,
        owner: &ScopeRef,
    ) -> Result<(), Abort> {
        let scope = Self::child(owner, ScopeKind::Function, &function.name())?;
        for parameter in &function.parameters {
            self.resolve_slot(&parameter.ty, &scope, &parameter.location)?;
        }
        self.resolve_slot(&function.returns, &scope, &function.location)?;
        let symbol = owner.borrow().lookup_value_local(&function.name());
        if let Some(symbol) = symbol {
            symbol.ty.replace(function.signature());
        }
        Ok(())
    }

    fn resolve_signatures(&mut self, file: &SourceFile) -> Result<(), Abort> {
        let module = self.module.clone();
        for item in &file.items {
            match item {
                Item::Function(function) => self.resolve_function_signature(function, &module)?,
                Item::Struct(definition) => {
                    let body = Self::child(&module, ScopeKind::TypeBody, &definition.name())?;
                    for field in &definition.fields {
                        self.resolve_slot(&field.ty, &body, &field.location)?;
                    }
                    for method in &definition.methods {
                        self.resolve_function_signature(method, &body)?;
                    }
                }
                Item::Enum(definition) => {
                    let body = Self::child(&module, ScopeKind::TypeBody, &definition.name())?;
                    for case in &definition.cases {
                        let symbol = body.borrow().lookup_value_local(&case.name.name);
                        if let Some(symbol) = symbol {
                            self.resolve_slot(&symbol.ty, &body, &case.location)?;
                        }
                    }
                }
                Item::TypeAlias(alias) => {
                    let symbol = module.borrow().lookup_type_local(&alias.name());
                    if let Some(symbol) = symbol {
                        self.resolve_slot(&symbol.ty, &module, &alias.location)?;
                    }
                }
                Item::Import(_) | Item::Let(_) => {}
            }
        }
        Ok(())
    }

    /// Validates raw values and assigns the implicit ones: integers count up
    /// from the previous case, strings default to the case name.
    fn enum_raw_values(&mut self, definition: &EnumDefinition) -> Result<(), Abort> {
        let enum_name = definition.name();
        let module = self.module.clone();
        let raw_type = match &definition.raw_type {
            Some(raw_type) => {
                let resolved = self.resolve_annotation(raw_type, &module, &definition.location)?;
                if resolved.is_integer() || resolved.is_string() {
                    Some(resolved)
                } else {
                    self.report(SemaError::InvalidRawType {
                        enum_name: enum_name.clone(),
                        found: resolved,
                        location: definition.location.clone(),
                    })?;
                    None
                }
            }
            None => None,
        };
        let mut seen: FxHashMap<String, Location> = FxHashMap::default();
        let mut next_int: i128 = 0;
        for case in &definition.cases {
            let Some(raw_type) = &raw_type else {
                if case.raw_value.is_some() && definition.raw_type.is_none() {
                    self.report(SemaError::MisplacedRawValue {
                        enum_name: enum_name.clone(),
                        case: case.name.name.clone(),
                        reason: "the enum has no raw type",
                        location: case.location.clone(),
                    })?;
                }
                continue;
            };
            if !case.payload.is_empty() {
                if case.raw_value.is_some() {
                    self.report(SemaError::MisplacedRawValue {
                        enum_name: enum_name.clone(),
                        case: case.name.name.clone(),
                        reason: "the case carries a payload",
                        location: case.location.clone(),
                    })?;
                }
                continue;
            }
            let value = match &case.raw_value {
                Some(literal) => {
                    let found = expressions::literal_type(&literal.value, Some(raw_type));
                    self.tables.node_types.insert(literal.id, found.clone());
                    if compatibility(&found, raw_type) == Compatibility::Incompatible {
                        self.report(SemaError::TypeMismatch {
                            expected: raw_type.clone(),
                            found,
                            context: MismatchContext::RawValue {
                                enum_name: enum_name.clone(),
                            },
                            location: literal.location.clone(),
                        })?;
                        continue;
                    }
                    literal.value.clone()
                }
                None if raw_type.is_string() => LiteralValue::String(case.name.name.clone()),
                None => LiteralValue::Int(next_int),
            };
            if let LiteralValue::Int(value) = value {
                next_int = value + 1;
            }
            let key = match &value {
                LiteralValue::Int(value) => value.to_string(),
                LiteralValue::String(value) => format!("{value:?}"),
                other => format!("{other:?}"),
            };
            if let Some(previous) = seen.get(&key) {
                self.report(SemaError::DuplicateRawValue {
                    enum_name: enum_name.clone(),
                    case: case.name.name.clone(),
                    value: key,
                    location: case.location.clone(),
                    previous: previous.clone(),
                })?;
                continue;
            }
            seen.insert(key, case.location.clone());
            self.tables.raw_values.insert(case.id, value);
        }
        Ok(())
    }

    // ---- items and statements ---------------------------------------------

    fn item(&mut self, item: &Item) -> Result<(), Abort> {
        match item {
            Item::Function(function) => self.function(function),
            Item::Struct(definition) => {
                self.cursor.descend(ScopeKind::TypeBody)?;
                for method in &definition.methods {
                    self.function(method)?;
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
            Item::Let(let_statement) => self.let_statement(let_statement),
        }
    }

    fn function(&mut self, function: &FunctionDefinition) -> Result<(), Abort> {
        self.cursor.descend(ScopeKind::Function)?;
        self.frames.push(ReturnFrame::Function(function.returns.get()));
        self.block(&function.body)?;
        self.frames.pop();
        self.cursor.ascend()?;
        Ok(())
    }

    /// Checks the statements of a block. Returns the type of a trailing
    /// expression statement, the block's value.
    fn block(&mut self, block: &Block) -> Result<Option<TypeAnnotation>, Abort> {
        let mut value = None;
        for statement in &block.statements {
            value = self.statement(statement)?;
        }
        Ok(value)
    }

    fn scoped_block(
        &mut self,
        kind: ScopeKind,
        block: &Block,
    ) -> Result<Option<TypeAnnotation>, Abort> {
        self.cursor.descend(kind)?;
        let value = self.block(block)?;
        self.cursor.ascend()?;
        Ok(value)
    }

    fn condition(&mut self, condition: &Expression) -> Result<(), Abort> {
        let found = self.expression(condition, Some(&TypeAnnotation::boolean()))?;
        self.accept(
            &found,
            &TypeAnnotation::boolean(),
            MismatchContext::Condition,
            &condition.location(),
        )
    }

    fn statement(&mut self, statement: &Statement) -> Result<Option<TypeAnnotation>, Abort> {
        match statement {
            Statement::Let(let_statement) => self.let_statement(let_statement)?,
            Statement::Assign(assign) => self.assign(assign)?,
            Statement::Expression(statement) => {
                return Ok(Some(self.expression(&statement.expression, None)?));
            }
            Statement::Return(statement) => self.return_statement(statement.value.as_ref(), &statement.location)?,
            Statement::If(statement) => {
                self.condition(&statement.condition)?;
                self.scoped_block(ScopeKind::Branch, &statement.then_branch)?;
                if let Some(else_branch) = &statement.else_branch {
                    self.scoped_block(ScopeKind::Branch, else_branch)?;
                }
            }
            Statement::While(statement) => {
                self.condition(&statement.condition)?;
                self.scoped_block(ScopeKind::Loop, &statement.body)?;
            }
            Statement::Loop(statement) => {
                self.scoped_block(ScopeKind::Loop, &statement.body)?;
            }
            Statement::For(statement) => {
                let iterable = self.expression(&statement.iterable, None)?;
                let element = self.element_type(&iterable, &statement.iterable.location())?;
                self.cursor.descend(ScopeKind::Loop)?;
                self.bind_pattern(&statement.pattern, &element, &statement.location)?;
                self.block(&statement.body)?;
                self.cursor.ascend()?;
            }
            Statement::Break(_) | Statement::Continue(_) => {}
            Statement::Block(block) => {
                self.scoped_block(ScopeKind::Block, block)?;
            }
            Statement::Try(statement) => {
                self.thrown.push(Vec::new());
                self.scoped_block(ScopeKind::Block, &statement.body)?;
                let thrown = self.thrown.pop().unwrap_or_default();
                let scope = self.cursor.descend(ScopeKind::Catch)?;
                if let Some(binding) = &statement.catch_binding {
                    let declared = self.resolve_slot(&binding.ty, &scope, &binding.location)?;
                    if declared.is_placeholder() {
                        let inferred = thrown
                            .iter()
                            .try_fold(TypeAnnotation::Placeholder, |acc, ty| common_type(&acc, ty))
                            .filter(|ty| !ty.is_placeholder())
                            .unwrap_or_else(TypeAnnotation::string);
                        InferenceRunner::fill(&binding.ty, &inferred);
                    }
                }
                self.block(&statement.catch_body)?;
                self.cursor.ascend()?;
            }
            Statement::Throw(statement) => {
                let thrown = self.expression(&statement.value, None)?;
                if let Some(frame) = self.thrown.last_mut() {
                    frame.push(thrown);
                }
            }
            Statement::Delete(statement) => {
                if let Some(symbol) = self.symbol_of(&statement.target)? {
                    self.require_assignable(&symbol, &statement.target)?;
                }
            }
        }
        Ok(None)
    }

    /// Element type produced by iterating over `iterable`.
    fn element_type(
        &mut self,
        iterable: &TypeAnnotation,
        location: &Location,
    ) -> Result<TypeAnnotation, Abort> {
        let iterable = iterable.dereferenced();
        if iterable.contains_placeholder() && iterable.array_element().is_none() {
            return Ok(TypeAnnotation::Placeholder);
        }
        if let Some(element) = iterable.array_element() {
            return Ok(element.clone());
        }
        if iterable.is_string() {
            return Ok(TypeAnnotation::Primitive(PrimitiveKind::Char));
        }
        self.report(SemaError::NotIterable {
            found: iterable.clone(),
            location: location.clone(),
        })?;
        Ok(TypeAnnotation::Placeholder)
    }

    fn bind_pattern(
        &mut self,
        pattern: &tern_ast::nodes::Pattern,
        ty: &TypeAnnotation,
        location: &Location,
    ) -> Result<(), Abort> {
        if let Err(mismatch) = InferenceRunner::bind_pattern(pattern, ty) {
            self.report(SemaError::TypeMismatch {
                expected: mismatch.expected,
                found: mismatch.found,
                context: MismatchContext::Pattern,
                location: location.clone(),
            })?;
        }
        Ok(())
    }

    fn let_statement(&mut self, statement: &LetStatement) -> Result<(), Abort> {
        let scope = self.cursor.current();
        let declared = self.resolve_slot(&statement.ty, &scope, &statement.location)?;
        let hint = (!declared.contains_placeholder()).then_some(declared.clone());
        let Some(value) = &statement.value else {
            return self.bind_pattern(&statement.pattern, &declared, &statement.location);
        };
        self.expression(value, hint.as_ref())?;
        let value_type = InferenceRunner::new(&self.tables.node_types).initializer(value);
        let binding_type = if declared.contains_placeholder() {
            common_type(&declared, &value_type).unwrap_or(value_type)
        } else {
            self.accept(
                &value_type,
                &declared,
                MismatchContext::VariableDefinition,
                &value.location(),
            )?;
            declared
        };
        self.bind_pattern(&statement.pattern, &binding_type, &statement.location)
    }

    fn return_statement(
        &mut self,
        value: Option<&Expression>,
        location: &Location,
    ) -> Result<(), Abort> {
        let expected = match self.frames.last() {
            Some(ReturnFrame::Function(returns)) => Some(returns.clone()),
            Some(ReturnFrame::Closure { declared, .. }) => {
                (!declared.contains_placeholder()).then(|| declared.clone())
            }
            None => None,
        };
        let found = match value {
            Some(value) => self.expression(value, expected.as_ref())?,
            None => TypeAnnotation::unit(),
        };
        if let Some(ReturnFrame::Closure { collected, .. }) = self.frames.last_mut() {
            collected.push(found.clone());
        }
        match expected {
            Some(expected) => self.accept(&found, &expected, MismatchContext::Return, location),
            None => Ok(()),
        }
    }

    /// A variable binding that may be written: assignment and `delete` targets.
    fn require_assignable(&mut self, symbol: &SymbolRef, identifier: &Identifier) -> Result<(), Abort> {
        if !symbol.kind.is_variable() {
            return self.report(SemaError::AssignToNonVariable {
                name: identifier.name.clone(),
                kind: symbol.kind.describe(),
                location: identifier.location.clone(),
            });
        }
        if !symbol.is_mutable() {
            return self.report(SemaError::AssignToImmutable {
                name: identifier.name.clone(),
                location: identifier.location.clone(),
                declared: symbol.location.clone(),
            });
        }
        Ok(())
    }

    /// The variable a member or index chain is rooted at.
    fn root_identifier(expression: &Expression) -> Option<&Identifier> {
        match expression {
            Expression::Identifier(identifier) => Some(identifier),
            Expression::Member(member) => Self::root_identifier(&member.object),
            Expression::Index(index) => Self::root_identifier(&index.target),
            _ => None,
        }
    }

    /// Writing through `expression` requires its root variable to be mutable.
    fn require_mutable_root(&mut self, expression: &Expression) -> Result<(), Abort> {
        let Some(root) = Self::root_identifier(expression) else {
            return Ok(());
        };
        if let Some(symbol) = self.symbol_of(root)? {
            if symbol.kind.is_variable() && !symbol.is_mutable() {
                return self.report(SemaError::AssignToImmutable {
                    name: root.name.clone(),
                    location: root.location.clone(),
                    declared: symbol.location.clone(),
                });
            }
        }
        Ok(())
    }

    fn assign(&mut self, statement: &AssignStatement) -> Result<(), Abort> {
        let target = &statement.target;
        let mut inferred_slot = None;
        let target_type = match target {
            Expression::Identifier(identifier) => match self.symbol_of(identifier)? {
                Some(symbol) => {
                    self.require_assignable(&symbol, identifier)?;
                    if symbol.ty.get().contains_placeholder() {
                        inferred_slot = Some(symbol.ty.clone());
                    }
                    self.record(target, symbol.type_annotation())
                }
                None => self.record(target, TypeAnnotation::Placeholder),
            },
            Expression::Member(member) => {
                self.require_mutable_root(&member.object)?;
                let ty = self.expression(target, None)?;
                let field = self.tables.symbols.get(&member.member.symbol_id()).cloned();
                if let Some(field) = field {
                    if field.kind != SymbolKind::Field {
                        self.report(SemaError::AssignToNonVariable {
                            name: member.member.name.clone(),
                            kind: field.kind.describe(),
                            location: member.member.location.clone(),
                        })?;
                    } else if !field.is_mutable() {
                        self.report(SemaError::AssignToImmutable {
                            name: member.member.name.clone(),
                            location: member.member.location.clone(),
                            declared: field.location.clone(),
                        })?;
                    }
                }
                ty
            }
            Expression::Index(index) => {
                self.require_mutable_root(&index.target)?;
                self.expression(target, None)?
            }
            Expression::Path(path) => {
                let ty = self.expression(target, None)?;
                let kind = path
                    .segments
                    .last()
                    .and_then(|segment| self.tables.symbols.get(&segment.symbol_id()))
                    .map_or("path", |symbol| symbol.kind.describe());
                self.report(SemaError::AssignToNonVariable {
                    name: path
                        .segments
                        .iter()
                        .map(|segment| segment.name.as_str())
                        .collect::<Vec<_>>()
                        .join("::"),
                    kind,
                    location: path.location.clone(),
                })?;
                ty
            }
            other => {
                let ty = self.expression(other, None)?;
                self.report(SemaError::AssignToNonVariable {
                    name: "expression".to_string(),
                    kind: "temporary value",
                    location: other.location(),
                })?;
                ty
            }
        };
        let hint = (!target_type.contains_placeholder()).then_some(target_type.clone());
        let value_type = self.expression(&statement.value, hint.as_ref())?;
        if let Some(slot) = inferred_slot {
            InferenceRunner::fill(&slot, &value_type);
            return Ok(());
        }
        self.accept(
            &value_type,
            &target_type,
            MismatchContext::Assignment,
            &statement.value.location(),
        )
    }
}
