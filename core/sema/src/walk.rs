//! Read-only tree traversal for queries over a finished unit: every
//! expression and every declaration-site type slot, in source order.

use tern_ast::nodes::{
    Block, Expression, FunctionDefinition, Item, Location, Parameter, Pattern, SourceFile,
    Statement,
};
use tern_ast::types::TypeSlot;

pub(crate) trait Visitor {
    fn expression(&mut self, _expression: &Expression) {}

    fn slot(&mut self, _what: String, _slot: &TypeSlot, _location: &Location) {}
}

pub(crate) fn walk_file(file: &SourceFile, visitor: &mut impl Visitor) {
    for item in &file.items {
        match item {
            Item::Function(function) => walk_function(function, visitor),
            Item::Struct(definition) => {
                for field in &definition.fields {
                    visitor.slot(
                        format!("field `{}`", field.name.name),
                        &field.ty,
                        &field.location,
                    );
                }
                for method in &definition.methods {
                    walk_function(method, visitor);
                }
            }
            Item::Let(let_statement) => {
                if let Some(value) = &let_statement.value {
                    walk_expression(value, visitor);
                }
                walk_pattern(&let_statement.pattern, visitor);
            }
            Item::Enum(_) | Item::TypeAlias(_) | Item::Import(_) => {}
        }
    }
}

fn walk_function(function: &FunctionDefinition, visitor: &mut impl Visitor) {
    walk_parameters(&function.parameters, visitor);
    visitor.slot(
        format!("return type of `{}`", function.name()),
        &function.returns,
        &function.location,
    );
    walk_block(&function.body, visitor);
}

fn walk_parameters(parameters: &[std::rc::Rc<Parameter>], visitor: &mut impl Visitor) {
    for parameter in parameters {
        visitor.slot(
            format!("parameter `{}`", parameter.name()),
            &parameter.ty,
            &parameter.location,
        );
    }
}

fn walk_pattern(pattern: &Pattern, visitor: &mut impl Visitor) {
    for binding in pattern.bindings() {
        visitor.slot(
            format!("variable `{}`", binding.name.name),
            &binding.ty,
            &binding.location,
        );
    }
}

fn walk_block(block: &Block, visitor: &mut impl Visitor) {
    for statement in &block.statements {
        walk_statement(statement, visitor);
    }
}

fn walk_statement(statement: &Statement, visitor: &mut impl Visitor) {
    match statement {
        Statement::Let(let_statement) => {
            if let Some(value) = &let_statement.value {
                walk_expression(value, visitor);
            }
            walk_pattern(&let_statement.pattern, visitor);
        }
        Statement::Assign(assign) => {
            walk_expression(&assign.target, visitor);
            walk_expression(&assign.value, visitor);
        }
        Statement::Expression(statement) => walk_expression(&statement.expression, visitor),
        Statement::Return(statement) => {
            if let Some(value) = &statement.value {
                walk_expression(value, visitor);
            }
        }
        Statement::If(statement) => {
            walk_expression(&statement.condition, visitor);
            walk_block(&statement.then_branch, visitor);
            if let Some(else_branch) = &statement.else_branch {
                walk_block(else_branch, visitor);
            }
        }
        Statement::While(statement) => {
            walk_expression(&statement.condition, visitor);
            walk_block(&statement.body, visitor);
        }
        Statement::Loop(statement) => walk_block(&statement.body, visitor),
        Statement::For(statement) => {
            walk_expression(&statement.iterable, visitor);
            walk_pattern(&statement.pattern, visitor);
            walk_block(&statement.body, visitor);
        }
        Statement::Block(block) => walk_block(block, visitor),
        Statement::Try(statement) => {
            walk_block(&statement.body, visitor);
            if let Some(binding) = &statement.catch_binding {
                visitor.slot(
                    format!("catch binding `{}`", binding.name()),
                    &binding.ty,
                    &binding.location,
                );
            }
            walk_block(&statement.catch_body, visitor);
        }
        Statement::Throw(statement) => walk_expression(&statement.value, visitor),
        Statement::Break(_) | Statement::Continue(_) | Statement::Delete(_) => {}
    }
}

fn walk_expression(expression: &Expression, visitor: &mut impl Visitor) {
    visitor.expression(expression);
    match expression {
        Expression::Literal(_) | Expression::Identifier(_) | Expression::Path(_) => {}
        Expression::Binary(binary) => {
            walk_expression(&binary.left, visitor);
            walk_expression(&binary.right, visitor);
        }
        Expression::Unary(unary) => walk_expression(&unary.operand, visitor),
        Expression::Call(call) => {
            walk_expression(&call.callee, visitor);
            for argument in &call.arguments {
                walk_expression(argument, visitor);
            }
        }
        Expression::Member(member) => walk_expression(&member.object, visitor),
        Expression::Construct(construct) => {
            for field in &construct.fields {
                walk_expression(&field.value, visitor);
            }
        }
        Expression::Array(array) => {
            for element in &array.elements {
                walk_expression(element, visitor);
            }
        }
        Expression::Tuple(tuple) => {
            for element in &tuple.elements {
                walk_expression(element, visitor);
            }
        }
        Expression::Index(index) => {
            walk_expression(&index.target, visitor);
            walk_expression(&index.index, visitor);
        }
        Expression::Closure(closure) => {
            walk_parameters(&closure.parameters, visitor);
            visitor.slot(
                "closure return type".to_string(),
                &closure.returns,
                &closure.location,
            );
            walk_block(&closure.body, visitor);
        }
        Expression::Match(match_expression) => {
            walk_expression(&match_expression.scrutinee, visitor);
            for arm in &match_expression.arms {
                walk_pattern(&arm.pattern, visitor);
                if let Some(guard) = &arm.guard {
                    walk_expression(guard, visitor);
                }
                walk_block(&arm.body, visitor);
            }
        }
        Expression::Cast(cast) => walk_expression(&cast.value, visitor),
    }
}
