use rustc_hash::FxHashMap;
use tern_ast::nodes::{CallExpression, ClosureExpression, ConstructExpression, Expression};
use tern_ast::types::TypeAnnotation;

use super::{ReturnFrame, TypeChecker};
use crate::{
    closure_inspector::ClosureInspector,
    closure_params::{infer_closure_parameters, ClosureSite},
    compat::{bind_parameters, has_parameters, substitute},
    errors::{Abort, MismatchContext, SemaError},
    inference::InferenceRunner,
    null_context::{check_null, NullContext},
    scope::{find_type_scope, ScopeKind},
    symbol::SymbolKind,
};

/// The resolved callee of a call expression.
struct Callee {
    name: String,
    ty: TypeAnnotation,
    type_parameters: Vec<String>,
}

impl TypeChecker<'_> {
    /// Checks arguments of a call whose callee could not be resolved, so the
    /// cursor still visits every closure inside them.
    fn unchecked_arguments(&mut self, arguments: &[Expression]) -> Result<(), Abort> {
        for argument in arguments {
            if argument.is_null_literal() {
                self.record(argument, TypeAnnotation::Placeholder);
                continue;
            }
            self.expression(argument, None)?;
        }
        Ok(())
    }

    fn callee(&mut self, call: &CallExpression) -> Result<Option<Callee>, Abort> {
        match &call.callee {
            Expression::Member(member) => {
                let object_type = self.expression(&member.object, None)?;
                let Some(target) = self.member_lookup(&member.object, &object_type, &member.member)?
                else {
                    self.record(&call.callee, TypeAnnotation::Placeholder);
                    return Ok(None);
                };
                if target.mutating {
                    if let Some(root) = Self::root_identifier(&member.object) {
                        let symbol = self.symbol_of(root)?;
                        if let Some(symbol) = symbol.filter(|s| s.kind.is_variable()) {
                            if !symbol.is_mutable() {
                                self.report(SemaError::MutatingCallOnImmutable {
                                    method: member.member.name.clone(),
                                    name: root.name.clone(),
                                    location: call.location.clone(),
                                })?;
                            }
                        }
                    }
                }
                self.record(&call.callee, target.ty.clone());
                Ok(Some(Callee {
                    name: member.member.name.clone(),
                    ty: target.ty,
                    type_parameters: target
                        .symbol
                        .map(|symbol| symbol.type_parameters.clone())
                        .unwrap_or_default(),
                }))
            }
            Expression::Identifier(identifier) => {
                let Some(symbol) = self.symbol_of(identifier)? else {
                    self.record(&call.callee, TypeAnnotation::Placeholder);
                    return Ok(None);
                };
                let ty = self.record(&call.callee, symbol.type_annotation());
                Ok(Some(Callee {
                    name: identifier.name.clone(),
                    ty,
                    type_parameters: symbol.type_parameters.clone(),
                }))
            }
            Expression::Path(path) => {
                let ty = self.expression(&call.callee, None)?;
                let last = path.segments.last();
                let type_parameters = last
                    .and_then(|segment| self.tables.symbols.get(&segment.symbol_id()))
                    .map(|symbol| symbol.type_parameters.clone())
                    .unwrap_or_default();
                Ok(Some(Callee {
                    name: last.map(|segment| segment.name.clone()).unwrap_or_default(),
                    ty,
                    type_parameters,
                }))
            }
            other => {
                let ty = self.expression(other, None)?;
                Ok(Some(Callee {
                    name: match &ty {
                        TypeAnnotation::Function { name, .. } => name.clone(),
                        _ => "expression".to_string(),
                    },
                    ty,
                    type_parameters: Vec::new(),
                }))
            }
        }
    }

    pub(super) fn call(
        &mut self,
        call: &CallExpression,
        hint: Option<&TypeAnnotation>,
    ) -> Result<TypeAnnotation, Abort> {
        let Some(callee) = self.callee(call)? else {
            self.unchecked_arguments(&call.arguments)?;
            return Ok(TypeAnnotation::Placeholder);
        };
        let (parameters, returns) = match callee.ty.dereferenced() {
            TypeAnnotation::Function {
                parameters,
                returns,
                ..
            } => (parameters.clone(), (**returns).clone()),
            other => {
                if !other.contains_placeholder() {
                    self.report(SemaError::NotCallable {
                        found: other.clone(),
                        location: call.callee.location(),
                    })?;
                }
                self.unchecked_arguments(&call.arguments)?;
                return Ok(TypeAnnotation::Placeholder);
            }
        };

        let mut bindings: FxHashMap<String, TypeAnnotation> = FxHashMap::default();
        if !call.type_arguments.is_empty() {
            if call.type_arguments.len() == callee.type_parameters.len() {
                let scope = self.cursor.current();
                for (parameter, argument) in callee.type_parameters.iter().zip(&call.type_arguments) {
                    let argument = self.resolve_annotation(argument, &scope, &call.location)?;
                    bindings.insert(parameter.clone(), argument);
                }
            } else {
                self.report(SemaError::TypeArgumentCountMismatch {
                    name: callee.name.clone(),
                    expected: callee.type_parameters.len(),
                    found: call.type_arguments.len(),
                    location: call.location.clone(),
                })?;
            }
        }

        let variadic = parameters
            .last()
            .is_some_and(|last| last.array_element().is_some());
        let fixed = if variadic {
            parameters.len() - 1
        } else {
            parameters.len()
        };
        let arity_ok = if variadic {
            call.arguments.len() >= fixed
        } else {
            call.arguments.len() == fixed
        };
        if !arity_ok {
            self.report(SemaError::ArgumentCountMismatch {
                callee: callee.name.clone(),
                expected: fixed,
                found: call.arguments.len(),
                variadic,
                location: call.location.clone(),
            })?;
        }

        let mut saw_open_argument = false;
        for (index, argument) in call.arguments.iter().enumerate() {
            let in_variadic_tail = variadic && index >= fixed;
            let declared = if index < fixed || in_variadic_tail {
                parameters.get(index.min(parameters.len().saturating_sub(1))).cloned()
            } else {
                None
            };
            let Some(declared) = declared else {
                self.unchecked_arguments(std::slice::from_ref(argument))?;
                continue;
            };
            let context = MismatchContext::Argument {
                callee: callee.name.clone(),
                index,
            };

            if argument.is_null_literal() {
                let null_context = NullContext::CallArgument {
                    param_type: substitute(&declared, &bindings),
                    location: argument.location(),
                };
                if let Err(error) = check_null(&self.cursor.current(), &null_context) {
                    self.report(error)?;
                }
                self.record(argument, substitute(&declared, &bindings));
                continue;
            }

            if let Some(closure) = argument.as_closure() {
                let expected = substitute(&declared, &bindings);
                let signature =
                    TypeAnnotation::function(&callee.name, parameters.clone(), returns.clone());
                let signature = substitute(&signature, &bindings);
                let site = match &expected {
                    TypeAnnotation::Function { parameters, .. }
                        if !in_variadic_tail && parameters.len() == closure.parameters.len() =>
                    {
                        ClosureSite::CallArgument {
                            signature: &signature,
                            position: index,
                        }
                    }
                    TypeAnnotation::Placeholder | TypeAnnotation::Parameter(_) => {
                        ClosureSite::Standalone
                    }
                    _ => {
                        self.report(SemaError::TypeMismatch {
                            expected: expected.clone(),
                            found: TypeAnnotation::function(
                                "closure",
                                closure
                                    .parameters
                                    .iter()
                                    .map(|parameter| parameter.ty.get())
                                    .collect(),
                                closure.returns.get(),
                            ),
                            context: context.clone(),
                            location: argument.location(),
                        })?;
                        ClosureSite::Mismatched
                    }
                };
                let mismatched = matches!(site, ClosureSite::Mismatched);
                let found = self.closure(closure, site)?;
                let found = self.record(argument, found);
                if !mismatched {
                    self.bind_argument(&declared, &found, &mut bindings, context, argument)?;
                }
                continue;
            }

            let (parameter, found) = if in_variadic_tail {
                let element = declared
                    .array_element()
                    .cloned()
                    .unwrap_or(TypeAnnotation::Placeholder);
                let element_hint = substitute(&element, &bindings);
                let found = self.expression(argument, Some(&element_hint))?;
                let whole_array = call.arguments.len() == parameters.len()
                    && found.dereferenced().array_element().is_some();
                (if whole_array { declared } else { element }, found)
            } else {
                let hint = substitute(&declared, &bindings);
                let hint = (!has_parameters(&hint)).then_some(hint);
                let found = self.expression(argument, hint.as_ref())?;
                (declared, found)
            };
            saw_open_argument |= found.contains_placeholder();
            self.bind_argument(&parameter, &found, &mut bindings, context, argument)?;
        }

        let mut result = substitute(&returns, &bindings);
        if has_parameters(&result) {
            if let Some(hint) = hint {
                if bind_parameters(&returns, hint, &mut bindings).is_ok() {
                    result = substitute(&returns, &bindings);
                }
            }
        }
        let unbound = callee
            .type_parameters
            .iter()
            .any(|parameter| !bindings.contains_key(parameter) && mentions(&result, parameter));
        if unbound && !saw_open_argument {
            self.report(SemaError::CannotInfer {
                what: format!("the generic result of `{}`", callee.name),
                location: call.location.clone(),
            })?;
        }
        Ok(result)
    }

    /// Binds generic parameters from one argument and checks it against the
    /// parameter it is passed to.
    fn bind_argument(
        &mut self,
        parameter: &TypeAnnotation,
        found: &TypeAnnotation,
        bindings: &mut FxHashMap<String, TypeAnnotation>,
        context: MismatchContext,
        argument: &Expression,
    ) -> Result<(), Abort> {
        if let Err(conflict) = bind_parameters(parameter, found, bindings) {
            return self.report(SemaError::TypeMismatch {
                expected: conflict.bound,
                found: conflict.found,
                context,
                location: argument.location(),
            });
        }
        let expected = substitute(parameter, bindings);
        if has_parameters(&expected) || found.contains_placeholder() {
            return Ok(());
        }
        self.accept(found, &expected, context, &argument.location())
    }

    /// Checks a closure literal: parameter types (declared or inferred from
    /// the call it is passed to), body, return type and captures.
    pub(super) fn closure(
        &mut self,
        closure: &ClosureExpression,
        site: ClosureSite<'_>,
    ) -> Result<TypeAnnotation, Abort> {
        let scope = self.cursor.descend(ScopeKind::Closure)?;
        for parameter in &closure.parameters {
            self.resolve_slot(&parameter.ty, &scope, &parameter.location)?;
        }
        self.resolve_slot(&closure.returns, &scope, &closure.location)?;
        infer_closure_parameters(closure, site)?;

        let declared = closure.returns.get();
        self.frames.push(ReturnFrame::Closure {
            declared: declared.clone(),
            collected: Vec::new(),
        });
        let trailing = self.block(&closure.body)?;
        let collected = match self.frames.pop() {
            Some(ReturnFrame::Closure { collected, .. }) => collected,
            _ => Vec::new(),
        };
        if declared.contains_placeholder() {
            let mut candidates = collected;
            candidates.extend(trailing);
            match InferenceRunner::closure_return(&candidates) {
                Some(inferred) => {
                    InferenceRunner::fill(&closure.returns, &inferred);
                }
                None => {
                    let expected = candidates.first().cloned().unwrap_or(TypeAnnotation::Placeholder);
                    let found = candidates.last().cloned().unwrap_or(TypeAnnotation::Placeholder);
                    self.report(SemaError::TypeMismatch {
                        expected,
                        found,
                        context: MismatchContext::Return,
                        location: closure.location.clone(),
                    })?;
                }
            }
        } else if let Some(trailing) = trailing {
            if !declared.is_unit() {
                self.accept(&trailing, &declared, MismatchContext::Return, &closure.location)?;
            }
        }
        self.cursor.ascend()?;

        ClosureInspector::inspect(closure, scope, &mut *self.diagnostics)?;
        Ok(TypeAnnotation::function(
            "closure",
            closure
                .parameters
                .iter()
                .map(|parameter| parameter.ty.get())
                .collect(),
            closure.returns.get(),
        ))
    }

    pub(super) fn construct(
        &mut self,
        construct: &ConstructExpression,
        hint: Option<&TypeAnnotation>,
    ) -> Result<TypeAnnotation, Abort> {
        let scope = self.cursor.current();
        let ty = self.resolve_annotation(&construct.ty, &scope, &construct.location)?;
        let type_name = ty.scope_name().unwrap_or_default().to_string();
        let body = find_type_scope(&scope, &type_name);
        let owner = body
            .as_ref()
            .and_then(|body| body.borrow().parent())
            .and_then(|parent| parent.borrow().lookup_type_local(&type_name))
            .filter(|owner| owner.kind == SymbolKind::Struct);
        let (Some(body), Some(owner)) = (body, owner) else {
            self.report(SemaError::NotAStruct {
                name: ty.to_string(),
                location: construct.location.clone(),
            })?;
            for field in &construct.fields {
                self.expression(&field.value, None)?;
            }
            return Ok(TypeAnnotation::Placeholder);
        };

        let mut bindings: FxHashMap<String, TypeAnnotation> = FxHashMap::default();
        let explicit = match ty.dereferenced() {
            TypeAnnotation::Simple { arguments, .. } if !arguments.is_empty() => Some(arguments.clone()),
            _ => hint
                .map(TypeAnnotation::dereferenced)
                .filter(|hint| hint.scope_name() == Some(type_name.as_str()))
                .and_then(|hint| match hint {
                    TypeAnnotation::Simple { arguments, .. } if !arguments.is_empty() => {
                        Some(arguments.clone())
                    }
                    _ => None,
                }),
        };
        if let Some(arguments) = explicit {
            for (parameter, argument) in owner.type_parameters.iter().zip(arguments) {
                if !argument.contains_placeholder() {
                    bindings.insert(parameter.clone(), argument);
                }
            }
        }

        let mut initialized = Vec::with_capacity(construct.fields.len());
        for initializer in &construct.fields {
            let field = body
                .borrow()
                .lookup_value_local(&initializer.name.name)
                .filter(|symbol| symbol.kind == SymbolKind::Field);
            let Some(field) = field else {
                self.report(SemaError::UnknownField {
                    type_name: type_name.clone(),
                    field: initializer.name.name.clone(),
                    location: initializer.name.location.clone(),
                })?;
                self.expression(&initializer.value, None)?;
                continue;
            };
            initializer.name.symbol_id.set(field.id());
            initialized.push(field.name.clone());
            let declared = field.type_annotation();
            let hint = substitute(&declared, &bindings);
            let hint = (!has_parameters(&hint)).then_some(hint);
            let found = self.expression(&initializer.value, hint.as_ref())?;
            let context = MismatchContext::Field {
                type_name: type_name.clone(),
                field: field.name.clone(),
            };
            self.bind_argument(&declared, &found, &mut bindings, context, &initializer.value)?;
        }

        let mut missing: Vec<String> = body
            .borrow()
            .values()
            .filter(|symbol| symbol.kind == SymbolKind::Field && !initialized.contains(&symbol.name))
            .map(|symbol| symbol.name.clone())
            .collect();
        missing.sort_unstable();
        for field in missing {
            self.report(SemaError::MissingField {
                type_name: type_name.clone(),
                field,
                location: construct.location.clone(),
            })?;
        }

        if owner.type_parameters.is_empty() {
            return Ok(ty);
        }
        let arguments: Vec<TypeAnnotation> = owner
            .type_parameters
            .iter()
            .map(|parameter| bindings.get(parameter).cloned().unwrap_or(TypeAnnotation::Placeholder))
            .collect();
        if arguments.iter().any(TypeAnnotation::is_placeholder) {
            self.report(SemaError::CannotInfer {
                what: format!("the type arguments of `{type_name}`"),
                location: construct.location.clone(),
            })?;
        }
        Ok(TypeAnnotation::generic(&type_name, arguments))
    }
}

/// True if the generic parameter `name` occurs in `ty`.
fn mentions(ty: &TypeAnnotation, name: &str) -> bool {
    match ty {
        TypeAnnotation::Parameter(parameter) => parameter == name,
        TypeAnnotation::Simple { arguments, .. } => arguments.iter().any(|a| mentions(a, name)),
        TypeAnnotation::Function {
            returns,
            parameters,
            ..
        } => mentions(returns, name) || parameters.iter().any(|p| mentions(p, name)),
        TypeAnnotation::Reference(inner) | TypeAnnotation::Member { inner, .. } => {
            mentions(inner, name)
        }
        TypeAnnotation::Placeholder | TypeAnnotation::Primitive(_) => false,
    }
}
