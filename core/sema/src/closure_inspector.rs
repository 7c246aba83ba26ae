//! Closure Inspector
//!
//! Runs once per closure, right after the checker finished its body, and
//! records which outer variables the closure captures.
//!
//! Each identifier in the body is classified by where its declaration lives:
//!
//! - between the reference and the closure's own scope: a local or a
//!   parameter, nothing to record;
//! - in a scope enclosing the closure: captured if it is a variable,
//!   parameter or `self` (duplicates are kept, one entry per reference);
//! - nowhere but the native table: a built-in, nothing to record;
//! - nowhere: reported as not declared.
//!
//! Nested closures are walked as part of the body, so an outer closure also
//! captures what its inner closures need.

use tern_ast::nodes::{Block, Capture, ClosureExpression, Expression, Identifier, Pattern, Statement};

use crate::{
    cursor::ScopeCursor,
    diagnostics::Diagnostics,
    errors::{Abort, InternalError, SemaError},
    scope::{
        ancestors, lookup_native, lookup_type_any_scope, lookup_value_in_ancestors, ScopeKind,
        ScopeRef,
    },
};

pub(crate) struct ClosureInspector<'a> {
    diagnostics: &'a mut Diagnostics,
    closure_scope: ScopeRef,
    cursor: ScopeCursor,
    captures: Vec<Capture>,
}

impl<'a> ClosureInspector<'a> {
    /// Inspects `closure`, whose scope is `closure_scope`, and stores its captures.
    pub(crate) fn inspect(
        closure: &ClosureExpression,
        closure_scope: ScopeRef,
        diagnostics: &'a mut Diagnostics,
    ) -> Result<(), Abort> {
        if closure.captures_resolved() {
            return Err(InternalError::CapturesAlreadyResolved {
                location: closure.location.clone(),
            }
            .into());
        }
        let mut inspector = ClosureInspector {
            diagnostics,
            cursor: ScopeCursor::new(closure_scope.clone()),
            closure_scope,
            captures: Vec::new(),
        };
        inspector.block(&closure.body)?;
        inspector.cursor.finish()?;
        tracing::debug!(
            captures = inspector.captures.len(),
            location = %closure.location,
            "closure inspected"
        );
        *closure.captures.borrow_mut() = Some(inspector.captures);
        Ok(())
    }

    fn is_local(&self, name: &str) -> bool {
        let current = self.cursor.current();
        for scope in ancestors(&current) {
            if scope.borrow().lookup_value_local(name).is_some() {
                return true;
            }
            if std::rc::Rc::ptr_eq(&scope, &self.closure_scope) {
                break;
            }
        }
        false
    }

    fn classify(&mut self, identifier: &Identifier) -> Result<(), Abort> {
        if self.is_local(&identifier.name) {
            return Ok(());
        }
        let outer = self.closure_scope.borrow().parent();
        let found = outer
            .as_ref()
            .and_then(|outer| lookup_value_in_ancestors(outer, &identifier.name));
        if let Some((symbol, _)) = found {
            if symbol.kind.is_variable() {
                tracing::trace!(name = %symbol.name, id = symbol.id(), "captured");
                self.captures.push(Capture {
                    name: symbol.name.clone(),
                    symbol_id: symbol.id(),
                    location: identifier.location.clone(),
                });
            }
            return Ok(());
        }
        let current = self.cursor.current();
        if lookup_native(&current, &identifier.name).is_some()
            || lookup_type_any_scope(&current, &identifier.name).is_some()
        {
            return Ok(());
        }
        self.diagnostics.report(SemaError::NotDeclared {
            name: identifier.name.clone(),
            scope: self.closure_scope.borrow().name.clone(),
            location: identifier.location.clone(),
        })
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

    fn pattern(&mut self, pattern: &Pattern) -> Result<(), Abort> {
        match pattern {
            Pattern::EnumCase(case) => {
                if let [head, _, ..] = case.path.as_slice() {
                    self.classify(head)?;
                }
                for argument in &case.arguments {
                    self.pattern(argument)?;
                }
                Ok(())
            }
            Pattern::Tuple(tuple) => {
                for element in &tuple.elements {
                    self.pattern(element)?;
                }
                Ok(())
            }
            Pattern::Binding(_) | Pattern::Wildcard(_) | Pattern::Literal(_) => Ok(()),
        }
    }

    fn statement(&mut self, statement: &Statement) -> Result<(), Abort> {
        match statement {
            Statement::Let(let_statement) => match &let_statement.value {
                Some(value) => self.expression(value),
                None => Ok(()),
            },
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
                self.scoped_block(ScopeKind::Loop, &statement.body)
            }
            Statement::Block(block) => self.scoped_block(ScopeKind::Block, block),
            Statement::Try(statement) => {
                self.scoped_block(ScopeKind::Block, &statement.body)?;
                self.scoped_block(ScopeKind::Catch, &statement.catch_body)
            }
            Statement::Throw(statement) => self.expression(&statement.value),
            Statement::Delete(statement) => self.classify(&statement.target),
            Statement::Break(_) | Statement::Continue(_) => Ok(()),
        }
    }

    fn expression(&mut self, expression: &Expression) -> Result<(), Abort> {
        match expression {
            Expression::Literal(_) => Ok(()),
            Expression::Identifier(identifier) => self.classify(identifier),
            Expression::Path(path) => match path.segments.first() {
                Some(head) => self.classify(head),
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
            Expression::Closure(closure) => self.scoped_block(ScopeKind::Closure, &closure.body),
            Expression::Match(match_expression) => {
                self.expression(&match_expression.scrutinee)?;
                for arm in &match_expression.arms {
                    self.cursor.descend(ScopeKind::MatchArm)?;
                    self.pattern(&arm.pattern)?;
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
