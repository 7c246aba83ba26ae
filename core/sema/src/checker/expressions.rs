use rustc_hash::FxHashMap;
use tern_ast::nodes::{
    BinaryExpression, BinaryOperator, CastExpression, EnumCasePattern, Expression, Identifier,
    IndexExpression, LiteralValue, Location, MatchExpression, MemberExpression, PathExpression,
    Pattern, UnaryExpression, UnaryOperator,
};
use tern_ast::types::{PrimitiveKind, TypeAnnotation};

use super::TypeChecker;
use crate::{
    closure_params::ClosureSite,
    compat::{common_type, compatibility, is_castable, substitute, Compatibility},
    errors::{Abort, MismatchContext, SemaError},
    inference::InferenceRunner,
    null_context::{check_null, NullContext},
    scope::{find_type_scope, ScopeKind, ScopeRef},
    symbol::{Modifiers, SymbolKind, SymbolRef},
};

/// Type of a literal. Numeric literals adopt a numeric type the context asks for.
pub(super) fn literal_type(value: &LiteralValue, hint: Option<&TypeAnnotation>) -> TypeAnnotation {
    let hint = hint.map(TypeAnnotation::dereferenced);
    match value {
        LiteralValue::Int(_) => match hint {
            Some(hint) if hint.is_numeric() => hint.clone(),
            _ => TypeAnnotation::int(),
        },
        LiteralValue::Float(_) => match hint {
            Some(TypeAnnotation::Primitive(PrimitiveKind::F32)) => {
                TypeAnnotation::Primitive(PrimitiveKind::F32)
            }
            _ => TypeAnnotation::Primitive(PrimitiveKind::F64),
        },
        LiteralValue::Bool(_) => TypeAnnotation::boolean(),
        LiteralValue::Char(_) => TypeAnnotation::Primitive(PrimitiveKind::Char),
        LiteralValue::String(_) => TypeAnnotation::string(),
        LiteralValue::Unit => TypeAnnotation::unit(),
        LiteralValue::Null => TypeAnnotation::Placeholder,
    }
}

/// Not yet known, or generic: operand checks are skipped for these.
fn is_open(ty: &TypeAnnotation) -> bool {
    matches!(
        ty.dereferenced(),
        TypeAnnotation::Placeholder | TypeAnnotation::Parameter(_)
    )
}

fn is_ordered(ty: &TypeAnnotation) -> bool {
    let ty = ty.dereferenced();
    ty.is_numeric() || ty.is_string() || matches!(ty, TypeAnnotation::Primitive(PrimitiveKind::Char))
}

/// `len` on arrays and strings is a method taking nothing.
fn length_function() -> TypeAnnotation {
    TypeAnnotation::function("len", vec![], TypeAnnotation::int())
}

/// What a member access resolved to.
pub(super) struct MemberTarget {
    pub(super) symbol: Option<SymbolRef>,
    pub(super) ty: TypeAnnotation,
    pub(super) mutating: bool,
}

impl MemberTarget {
    fn builtin(ty: TypeAnnotation, mutating: bool) -> Self {
        Self {
            symbol: None,
            ty,
            mutating,
        }
    }
}

impl TypeChecker<'_> {
    /// Computes, records and returns the type of `expression`. `hint` is the
    /// type the context expects, if any; it steers literals and empty arrays.
    pub(super) fn expression(
        &mut self,
        expression: &Expression,
        hint: Option<&TypeAnnotation>,
    ) -> Result<TypeAnnotation, Abort> {
        let ty = match expression {
            Expression::Literal(literal) => {
                if literal.value == LiteralValue::Null {
                    self.report(SemaError::NullOutsideInterop {
                        location: literal.location.clone(),
                    })?;
                }
                literal_type(&literal.value, hint)
            }
            Expression::Identifier(identifier) => self
                .symbol_of(identifier)?
                .map_or(TypeAnnotation::Placeholder, |symbol| symbol.type_annotation()),
            Expression::Binary(binary) => self.binary(binary, hint)?,
            Expression::Unary(unary) => self.unary(unary, hint)?,
            Expression::Call(call) => self.call(call, hint)?,
            Expression::Member(member) => self.member(member)?,
            Expression::Path(path) => self.path(path)?,
            Expression::Construct(construct) => self.construct(construct, hint)?,
            Expression::Array(array) => self.array(&array.elements, hint, &array.location)?,
            Expression::Tuple(tuple) => {
                let hints = hint.and_then(|hint| hint.dereferenced().tuple_elements());
                let mut elements = Vec::with_capacity(tuple.elements.len());
                for (index, element) in tuple.elements.iter().enumerate() {
                    let element_hint = hints.and_then(|hints| hints.get(index));
                    elements.push(self.expression(element, element_hint)?);
                }
                TypeAnnotation::tuple(elements)
            }
            Expression::Index(index) => self.index(index)?,
            Expression::Closure(closure) => self.closure(closure, ClosureSite::Standalone)?,
            Expression::Match(match_expression) => self.match_expression(match_expression)?,
            Expression::Cast(cast) => self.cast(cast)?,
        };
        Ok(self.record(expression, ty))
    }

    // ---- operators ---------------------------------------------------------

    /// Fills the slot of an identifier whose type is still open from the
    /// type of the other operand.
    fn infer_operand(&mut self, operand: &Expression, from: &TypeAnnotation) -> Result<(), Abort> {
        if from.contains_placeholder() {
            return Ok(());
        }
        if let Expression::Identifier(identifier) = operand {
            if let Some(symbol) = self.symbol_of(identifier)? {
                if InferenceRunner::fill(&symbol.ty, from) {
                    self.record(operand, symbol.type_annotation());
                }
            }
        }
        Ok(())
    }

    fn binary(
        &mut self,
        binary: &BinaryExpression,
        hint: Option<&TypeAnnotation>,
    ) -> Result<TypeAnnotation, Abort> {
        let operator = binary.operator;
        if binary.left.is_null_literal() || binary.right.is_null_literal() {
            return self.null_operand(binary);
        }
        let operand_hint = if operator.is_logical() {
            Some(TypeAnnotation::boolean())
        } else if operator.is_equality() || operator.is_ordering() {
            None
        } else {
            hint.filter(|hint| hint.is_numeric()).cloned()
        };
        let mut left = self.expression(&binary.left, operand_hint.as_ref())?;
        let right_hint = if left.contains_placeholder() {
            operand_hint
        } else {
            Some(left.clone())
        };
        let mut right = self.expression(&binary.right, right_hint.as_ref())?;
        if left.contains_placeholder() {
            self.infer_operand(&binary.left, &right)?;
            left = self.recorded_or(&binary.left, left);
        }
        if right.contains_placeholder() {
            self.infer_operand(&binary.right, &left)?;
            right = self.recorded_or(&binary.right, right);
        }

        let location = &binary.location;
        if operator.is_logical() {
            for (operand, ty) in [(&binary.left, &left), (&binary.right, &right)] {
                if !is_open(ty) {
                    self.accept(
                        ty,
                        &TypeAnnotation::boolean(),
                        MismatchContext::BinaryOperation(operator),
                        &operand.location(),
                    )?;
                }
            }
            return Ok(TypeAnnotation::boolean());
        }
        if is_open(&left) || is_open(&right) {
            let result = if is_open(&left) { right } else { left };
            return Ok(if operator.is_equality() || operator.is_ordering() {
                TypeAnnotation::boolean()
            } else {
                result
            });
        }
        if operator.is_equality() {
            if common_type(&left, &right).is_none()
                && compatibility(&right, &left) == Compatibility::Incompatible
            {
                self.report(SemaError::TypeMismatch {
                    expected: left,
                    found: right,
                    context: MismatchContext::BinaryOperation(operator),
                    location: location.clone(),
                })?;
            }
            return Ok(TypeAnnotation::boolean());
        }
        if operator.is_ordering() {
            for ty in [&left, &right] {
                if !is_ordered(ty) {
                    self.report(SemaError::InvalidOperand {
                        operator: operator.symbol().to_string(),
                        found: ty.clone(),
                        location: location.clone(),
                    })?;
                    return Ok(TypeAnnotation::boolean());
                }
            }
            if common_type(&left, &right).is_none() {
                self.report(SemaError::TypeMismatch {
                    expected: left,
                    found: right,
                    context: MismatchContext::BinaryOperation(operator),
                    location: location.clone(),
                })?;
            }
            return Ok(TypeAnnotation::boolean());
        }
        if operator == BinaryOperator::Add && left.is_string() && right.is_string() {
            return Ok(TypeAnnotation::string());
        }
        let requirement: fn(&TypeAnnotation) -> bool = if operator.is_bitwise() {
            TypeAnnotation::is_integer
        } else {
            TypeAnnotation::is_numeric
        };
        let invalid = [&left, &right]
            .into_iter()
            .find(|ty| !requirement(ty.dereferenced()))
            .cloned();
        if let Some(found) = invalid {
            self.report(SemaError::InvalidOperand {
                operator: operator.symbol().to_string(),
                found,
                location: location.clone(),
            })?;
            return Ok(left);
        }
        let Some(result) = InferenceRunner::new(&self.tables.node_types).binary(&binary.left, &binary.right)
        else {
            self.report(SemaError::TypeMismatch {
                expected: left.clone(),
                found: right,
                context: MismatchContext::BinaryOperation(operator),
                location: location.clone(),
            })?;
            return Ok(left);
        };
        for (operand, ty) in [(&binary.left, &left), (&binary.right, &right)] {
            if *ty != result && !matches!(operand, Expression::Literal(_)) {
                self.report(SemaError::ImplicitWidening {
                    from: ty.clone(),
                    to: result.clone(),
                    location: location.clone(),
                })?;
            }
        }
        Ok(result)
    }

    fn recorded_or(&self, expression: &Expression, fallback: TypeAnnotation) -> TypeAnnotation {
        self.tables
            .node_types
            .get(&expression.id())
            .cloned()
            .unwrap_or(fallback)
    }

    /// `x == null` and friends: the other operand decides whether null is allowed.
    fn null_operand(&mut self, binary: &BinaryExpression) -> Result<TypeAnnotation, Abort> {
        let (null_side, other) = if binary.left.is_null_literal() {
            (&binary.left, &binary.right)
        } else {
            (&binary.right, &binary.left)
        };
        let other_type = self.expression(other, None)?;
        let context = NullContext::Binary {
            other_type: other_type.clone(),
            location: null_side.location(),
        };
        if let Err(error) = check_null(&self.cursor.current(), &context) {
            self.report(error)?;
        }
        self.record(null_side, other_type.clone());
        if binary.operator.is_equality() || binary.operator.is_ordering() || binary.operator.is_logical() {
            Ok(TypeAnnotation::boolean())
        } else {
            Ok(other_type)
        }
    }

    fn unary(
        &mut self,
        unary: &UnaryExpression,
        hint: Option<&TypeAnnotation>,
    ) -> Result<TypeAnnotation, Abort> {
        let operand_hint = match unary.operator {
            UnaryOperator::Not => Some(TypeAnnotation::boolean()),
            UnaryOperator::Neg | UnaryOperator::BitNot => hint.filter(|h| h.is_numeric()).cloned(),
        };
        let operand = self.expression(&unary.operand, operand_hint.as_ref())?;
        if is_open(&operand) {
            return Ok(operand);
        }
        let valid = match unary.operator {
            UnaryOperator::Neg => operand.dereferenced().is_numeric(),
            UnaryOperator::Not => operand.dereferenced().is_bool(),
            UnaryOperator::BitNot => operand.dereferenced().is_integer(),
        };
        if !valid {
            self.report(SemaError::InvalidOperand {
                operator: unary.operator.symbol().to_string(),
                found: operand.clone(),
                location: unary.location.clone(),
            })?;
        }
        Ok(operand.dereferenced().clone())
    }

    // ---- members and paths -------------------------------------------------

    fn import_scope(&self, alias: &str) -> Option<ScopeRef> {
        self.module.borrow().child_named(ScopeKind::Import, alias)
    }

    /// Resolves `object_type.member`. `None` when the object's type is not
    /// known yet; an unknown member has been reported by then.
    pub(super) fn member_lookup(
        &mut self,
        object: &Expression,
        object_type: &TypeAnnotation,
        member: &Identifier,
    ) -> Result<Option<MemberTarget>, Abort> {
        if let Expression::Identifier(alias) = object {
            let import = self
                .symbol_of(alias)?
                .filter(|symbol| symbol.kind == SymbolKind::Import)
                .and_then(|_| self.import_scope(&alias.name));
            if let Some(import) = import {
                return self.import_member(&import, &alias.name, member).map(Some);
            }
        }
        let object_type = object_type.dereferenced();
        if is_open(object_type) {
            return Ok(None);
        }
        if let Some(element) = object_type.array_element() {
            let builtin = match member.name.as_str() {
                "len" => Some(MemberTarget::builtin(length_function(), false)),
                "push" => Some(MemberTarget::builtin(
                    TypeAnnotation::function("push", vec![element.clone()], TypeAnnotation::unit()),
                    true,
                )),
                "pop" => Some(MemberTarget::builtin(
                    TypeAnnotation::function("pop", vec![], element.clone()),
                    true,
                )),
                _ => None,
            };
            if builtin.is_some() {
                return Ok(builtin);
            }
        }
        if object_type.is_string() && member.name == "len" {
            return Ok(Some(MemberTarget::builtin(length_function(), false)));
        }
        let unknown = |this: &mut Self| {
            this.report(SemaError::UnknownMember {
                type_name: object_type.to_string(),
                member: member.name.clone(),
                location: member.location.clone(),
            })
        };
        let Some(type_name) = object_type.scope_name() else {
            unknown(self)?;
            return Ok(None);
        };
        let Some(type_scope) = find_type_scope(&self.cursor.current(), type_name) else {
            unknown(self)?;
            return Ok(None);
        };
        let Some(symbol) = type_scope.borrow().lookup_value_local(&member.name) else {
            unknown(self)?;
            return Ok(None);
        };
        member.symbol_id.set(symbol.id());
        let owner = type_scope
            .borrow()
            .parent()
            .and_then(|parent| parent.borrow().lookup_type_local(type_name));
        let mut bindings = FxHashMap::default();
        if let (Some(owner), TypeAnnotation::Simple { arguments, .. }) = (owner, object_type) {
            for (parameter, argument) in owner.type_parameters.iter().zip(arguments) {
                bindings.insert(parameter.clone(), argument.clone());
            }
        }
        let ty = substitute(&symbol.type_annotation(), &bindings);
        Ok(Some(MemberTarget {
            mutating: symbol.modifiers.contains(Modifiers::MUTATING),
            symbol: Some(symbol),
            ty,
        }))
    }

    fn import_member(
        &mut self,
        import: &ScopeRef,
        alias: &str,
        member: &Identifier,
    ) -> Result<MemberTarget, Abort> {
        let symbol = import.borrow().lookup_value_local(&member.name);
        let Some(symbol) = symbol else {
            self.report(SemaError::NotDeclared {
                name: member.name.clone(),
                scope: alias.to_string(),
                location: member.location.clone(),
            })?;
            return Ok(MemberTarget::builtin(TypeAnnotation::Placeholder, false));
        };
        member.symbol_id.set(symbol.id());
        Ok(MemberTarget {
            ty: symbol.type_annotation(),
            mutating: false,
            symbol: Some(symbol),
        })
    }

    fn member(&mut self, member: &MemberExpression) -> Result<TypeAnnotation, Abort> {
        let object_type = self.expression(&member.object, None)?;
        Ok(self
            .member_lookup(&member.object, &object_type, &member.member)?
            .map_or(TypeAnnotation::Placeholder, |target| target.ty))
    }

    /// Looks up `case` in the body of enum `enum_name`, searched from `scope`.
    fn enum_case(
        &mut self,
        body: Option<ScopeRef>,
        enum_name: &str,
        case: &Identifier,
    ) -> Result<Option<SymbolRef>, Abort> {
        let symbol = body
            .and_then(|body| body.borrow().lookup_value_local(&case.name))
            .filter(|symbol| symbol.kind == SymbolKind::EnumCase);
        match symbol {
            Some(symbol) => {
                case.symbol_id.set(symbol.id());
                Ok(Some(symbol))
            }
            None => {
                self.report(SemaError::UnknownEnumCase {
                    enum_name: enum_name.to_string(),
                    case: case.name.clone(),
                    location: case.location.clone(),
                })?;
                Ok(None)
            }
        }
    }

    /// The body of the enum a path names: `Enum` or `alias::Enum`.
    fn enum_body(&self, segments: &[std::rc::Rc<Identifier>]) -> Option<ScopeRef> {
        match segments {
            [name] => find_type_scope(&self.cursor.current(), &name.name),
            [alias, name] => self
                .import_scope(&alias.name)
                .and_then(|import| import.borrow().child_named(ScopeKind::TypeBody, &name.name)),
            _ => None,
        }
    }

    fn path(&mut self, path: &PathExpression) -> Result<TypeAnnotation, Abort> {
        let Some((head, rest)) = path.segments.split_first() else {
            return Ok(TypeAnnotation::Placeholder);
        };
        let Some(head_symbol) = self.symbol_of(head)? else {
            return Ok(TypeAnnotation::Placeholder);
        };
        match rest {
            [] => Ok(head_symbol.type_annotation()),
            [item] if head_symbol.kind == SymbolKind::Import => {
                let Some(import) = self.import_scope(&head.name) else {
                    return Ok(TypeAnnotation::Placeholder);
                };
                Ok(self.import_member(&import, &head.name, item)?.ty)
            }
            [case] => {
                let body = self.enum_body(std::slice::from_ref(head));
                Ok(self
                    .enum_case(body, &head.name, case)?
                    .map_or(TypeAnnotation::Placeholder, |symbol| symbol.type_annotation()))
            }
            [name, case] if head_symbol.kind == SymbolKind::Import => {
                let body = self.enum_body(&path.segments[..2]);
                if let Some(import) = self.import_scope(&head.name) {
                    if let Some(symbol) = import.borrow().lookup_type_local(&name.name) {
                        name.symbol_id.set(symbol.id());
                    }
                }
                Ok(self
                    .enum_case(body, &name.name, case)?
                    .map_or(TypeAnnotation::Placeholder, |symbol| symbol.type_annotation()))
            }
            _ => {
                let last = rest.last().unwrap_or(head);
                self.report(SemaError::NotDeclared {
                    name: last.name.clone(),
                    scope: head.name.clone(),
                    location: path.location.clone(),
                })?;
                Ok(TypeAnnotation::Placeholder)
            }
        }
    }

    // ---- aggregates --------------------------------------------------------

    fn array(
        &mut self,
        elements: &[Expression],
        hint: Option<&TypeAnnotation>,
        location: &Location,
    ) -> Result<TypeAnnotation, Abort> {
        let hinted = hint
            .and_then(|hint| hint.dereferenced().array_element())
            .filter(|element| !element.contains_placeholder())
            .cloned();
        let mut element_hint = hinted.clone();
        for element in elements {
            let ty = self.expression(element, element_hint.as_ref())?;
            if element_hint.is_none() && !ty.contains_placeholder() {
                element_hint = Some(ty);
            }
        }
        let element = match InferenceRunner::new(&self.tables.node_types).sequence(elements) {
            Some(element) => element,
            None => {
                let mut acc = TypeAnnotation::Placeholder;
                for element in elements {
                    let ty = self.recorded_or(element, TypeAnnotation::Placeholder);
                    match common_type(&acc, &ty) {
                        Some(common) => acc = common,
                        None => {
                            self.report(SemaError::TypeMismatch {
                                expected: acc.clone(),
                                found: ty,
                                context: MismatchContext::ArrayElement,
                                location: element.location(),
                            })?;
                        }
                    }
                }
                acc
            }
        };
        let element = match hinted {
            Some(hinted) if compatibility(&element, &hinted).is_accepted() => hinted,
            _ => element,
        };
        tracing::trace!(%location, %element, "array element type");
        Ok(TypeAnnotation::array(element))
    }

    fn index(&mut self, index: &IndexExpression) -> Result<TypeAnnotation, Abort> {
        let target = self.expression(&index.target, None)?;
        let index_type = self.expression(&index.index, Some(&TypeAnnotation::int()))?;
        if !is_open(&index_type) && !index_type.dereferenced().is_integer() {
            self.report(SemaError::TypeMismatch {
                expected: TypeAnnotation::int(),
                found: index_type,
                context: MismatchContext::Index,
                location: index.index.location(),
            })?;
        }
        let target = target.dereferenced();
        if target.is_placeholder() {
            return Ok(TypeAnnotation::Placeholder);
        }
        if let Some(element) = target.array_element() {
            return Ok(element.clone());
        }
        if target.is_string() {
            return Ok(TypeAnnotation::Primitive(PrimitiveKind::Char));
        }
        if let (Some(elements), Expression::Literal(literal)) = (target.tuple_elements(), &index.index) {
            if let LiteralValue::Int(position) = literal.value {
                let element = usize::try_from(position)
                    .ok()
                    .and_then(|position| elements.get(position));
                if let Some(element) = element {
                    return Ok(element.clone());
                }
            }
        }
        self.report(SemaError::NotIndexable {
            found: target.clone(),
            location: index.location.clone(),
        })?;
        Ok(TypeAnnotation::Placeholder)
    }

    // ---- match -------------------------------------------------------------

    fn match_expression(&mut self, expression: &MatchExpression) -> Result<TypeAnnotation, Abort> {
        let scrutinee = self.expression(&expression.scrutinee, None)?;
        let mut result: Option<TypeAnnotation> = None;
        for arm in &expression.arms {
            self.cursor.descend(ScopeKind::MatchArm)?;
            self.check_pattern(&arm.pattern, &scrutinee)?;
            if let Some(guard) = &arm.guard {
                self.condition(guard)?;
            }
            let value = self.block(&arm.body)?;
            self.cursor.ascend()?;
            let diverges = arm.body.statements.last().is_some_and(|s| s.is_terminator());
            if diverges {
                continue;
            }
            let value = value.unwrap_or_else(TypeAnnotation::unit);
            result = match result {
                None => Some(value),
                Some(acc) => match common_type(&acc, &value) {
                    Some(common) => Some(common),
                    None => {
                        self.report(SemaError::TypeMismatch {
                            expected: acc.clone(),
                            found: value,
                            context: MismatchContext::MatchArm,
                            location: arm.location.clone(),
                        })?;
                        Some(acc)
                    }
                },
            };
        }
        Ok(result.unwrap_or_else(TypeAnnotation::unit))
    }

    fn check_pattern(&mut self, pattern: &Pattern, ty: &TypeAnnotation) -> Result<(), Abort> {
        match pattern {
            Pattern::Binding(binding) => {
                InferenceRunner::fill(&binding.ty, ty);
                Ok(())
            }
            Pattern::Wildcard(_) => Ok(()),
            Pattern::Literal(literal) => {
                let found = literal_type(&literal.literal.value, Some(ty));
                self.tables.node_types.insert(literal.literal.id, found.clone());
                if is_open(&found) || is_open(ty) {
                    return Ok(());
                }
                self.accept(&found, ty, MismatchContext::Pattern, &literal.location)
            }
            Pattern::Tuple(tuple) => {
                if is_open(ty) {
                    for element in &tuple.elements {
                        self.check_pattern(element, ty)?;
                    }
                    return Ok(());
                }
                match ty.dereferenced().tuple_elements() {
                    Some(elements) if elements.len() == tuple.elements.len() => {
                        for (element, element_type) in tuple.elements.iter().zip(elements) {
                            self.check_pattern(element, element_type)?;
                        }
                        Ok(())
                    }
                    _ => self.report(SemaError::TypeMismatch {
                        expected: ty.clone(),
                        found: TypeAnnotation::tuple(
                            tuple.elements.iter().map(|_| TypeAnnotation::Placeholder).collect(),
                        ),
                        context: MismatchContext::Pattern,
                        location: tuple.location.clone(),
                    }),
                }
            }
            Pattern::EnumCase(case) => self.enum_case_pattern(case, ty),
        }
    }

    fn enum_case_pattern(&mut self, pattern: &EnumCasePattern, ty: &TypeAnnotation) -> Result<(), Abort> {
        let Some((case, enum_path)) = pattern.path.split_last() else {
            return Ok(());
        };
        let (enum_name, body) = if enum_path.is_empty() {
            let Some(name) = ty.scope_name() else {
                return self.report(SemaError::UnknownEnumCase {
                    enum_name: ty.to_string(),
                    case: case.name.clone(),
                    location: case.location.clone(),
                });
            };
            (name.to_string(), find_type_scope(&self.cursor.current(), name))
        } else {
            let name = enum_path.last().map_or_else(String::new, |n| n.name.clone());
            (name, self.enum_body(enum_path))
        };
        let Some(symbol) = self.enum_case(body, &enum_name, case)? else {
            return Ok(());
        };
        let (enum_type, payload) = match symbol.type_annotation() {
            TypeAnnotation::Function {
                returns,
                parameters,
                ..
            } => (*returns, parameters),
            other => (other, Vec::new()),
        };
        if !is_open(ty) {
            self.accept(&enum_type, ty, MismatchContext::Pattern, &pattern.location)?;
        }
        if payload.len() != pattern.arguments.len() {
            return self.report(SemaError::ArgumentCountMismatch {
                callee: format!("{enum_name}.{}", case.name),
                expected: payload.len(),
                found: pattern.arguments.len(),
                variadic: false,
                location: pattern.location.clone(),
            });
        }
        for (argument, payload_type) in pattern.arguments.iter().zip(&payload) {
            self.check_pattern(argument, payload_type)?;
        }
        Ok(())
    }

    fn cast(&mut self, cast: &CastExpression) -> Result<TypeAnnotation, Abort> {
        let from = self.expression(&cast.value, None)?;
        let scope = self.cursor.current();
        let to = self.resolve_annotation(&cast.ty, &scope, &cast.location)?;
        if !is_open(&from) && !is_castable(&from, &to) {
            self.report(SemaError::InvalidCast {
                from,
                to: to.clone(),
                location: cast.location.clone(),
            })?;
        }
        Ok(to)
    }
}
