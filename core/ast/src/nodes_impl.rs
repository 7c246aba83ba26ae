use std::rc::Rc;

use crate::nodes::{
    BinaryOperator, BindingPattern, ClosureExpression, EnumDefinition, Expression, FunctionDefinition, Identifier,
    ImportDefinition, Item, LiteralValue, Parameter, Pattern, SourceFile, Statement,
    StructDefinition, TypeAliasDefinition, UnaryOperator,
};
use crate::types::TypeAnnotation;

impl Identifier {
    /// The binder's resolution of this occurrence, `0` while unbound.
    #[must_use]
    pub fn symbol_id(&self) -> u32 {
        self.symbol_id.get()
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.symbol_id.get() != 0
    }
}

impl SourceFile {
    #[must_use]
    pub fn function_definitions(&self) -> Vec<Rc<FunctionDefinition>> {
        self.items
            .iter()
            .filter_map(|item| match item {
                Item::Function(function) => Some(function.clone()),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn struct_definitions(&self) -> Vec<Rc<StructDefinition>> {
        self.items
            .iter()
            .filter_map(|item| match item {
                Item::Struct(definition) => Some(definition.clone()),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn imports(&self) -> Vec<Rc<ImportDefinition>> {
        self.items
            .iter()
            .filter_map(|item| match item {
                Item::Import(import) => Some(import.clone()),
                _ => None,
            })
            .collect()
    }
}

impl FunctionDefinition {
    #[must_use]
    pub fn name(&self) -> String {
        self.name.name.clone()
    }

    /// The declared signature as a function type.
    #[must_use]
    pub fn signature(&self) -> TypeAnnotation {
        TypeAnnotation::Function {
            name: self.name(),
            returns: Box::new(self.returns.get()),
            parameters: self.parameters.iter().map(|p| p.ty.get()).collect(),
        }
    }
}

impl Parameter {
    #[must_use]
    pub fn name(&self) -> String {
        self.name.name.clone()
    }
}

impl StructDefinition {
    #[must_use]
    pub fn name(&self) -> String {
        self.name.name.clone()
    }

    /// The struct's own type with its generic parameters left unbound.
    #[must_use]
    pub fn self_type(&self) -> TypeAnnotation {
        TypeAnnotation::Simple {
            name: self.name(),
            arguments: self
                .type_parameters
                .iter()
                .map(|p| TypeAnnotation::Parameter(p.name.clone()))
                .collect(),
        }
    }
}

impl EnumDefinition {
    #[must_use]
    pub fn name(&self) -> String {
        self.name.name.clone()
    }
}

impl TypeAliasDefinition {
    #[must_use]
    pub fn name(&self) -> String {
        self.name.name.clone()
    }
}

impl ImportDefinition {
    #[must_use]
    pub fn alias(&self) -> String {
        self.alias.name.clone()
    }

    #[must_use]
    pub fn path_string(&self) -> String {
        self.path.join(".")
    }
}

impl ClosureExpression {
    /// Captured symbols, empty until the closure has been inspected.
    #[must_use]
    pub fn captures(&self) -> Vec<crate::nodes::Capture> {
        self.captures.borrow().clone().unwrap_or_default()
    }

    #[must_use]
    pub fn captures_resolved(&self) -> bool {
        self.captures.borrow().is_some()
    }
}

impl Pattern {
    /// Every binding introduced by this pattern, left to right.
    #[must_use]
    pub fn bindings(&self) -> Vec<Rc<BindingPattern>> {
        let mut out = Vec::new();
        self.collect_bindings(&mut out);
        out
    }

    fn collect_bindings(&self, out: &mut Vec<Rc<BindingPattern>>) {
        match self {
            Pattern::Binding(binding) => out.push(binding.clone()),
            Pattern::Tuple(tuple) => {
                for element in &tuple.elements {
                    element.collect_bindings(out);
                }
            }
            Pattern::EnumCase(case) => {
                for argument in &case.arguments {
                    argument.collect_bindings(out);
                }
            }
            Pattern::Wildcard(_) | Pattern::Literal(_) => {}
        }
    }
}

impl Expression {
    #[must_use]
    pub fn is_null_literal(&self) -> bool {
        matches!(self, Expression::Literal(literal) if literal.value == LiteralValue::Null)
    }

    #[must_use]
    pub fn as_closure(&self) -> Option<&Rc<ClosureExpression>> {
        match self {
            Expression::Closure(closure) => Some(closure),
            _ => None,
        }
    }
}

impl Statement {
    /// True for statements after which control never falls through.
    #[must_use]
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Statement::Return(_)
                | Statement::Break(_)
                | Statement::Continue(_)
                | Statement::Throw(_)
        )
    }
}

impl BinaryOperator {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
            BinaryOperator::Eq => "==",
            BinaryOperator::Ne => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
            BinaryOperator::BitAnd => "&",
            BinaryOperator::BitOr => "|",
            BinaryOperator::BitXor => "^",
            BinaryOperator::Shl => "<<",
            BinaryOperator::Shr => ">>",
        }
    }

    #[must_use]
    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }

    #[must_use]
    pub fn is_equality(self) -> bool {
        matches!(self, BinaryOperator::Eq | BinaryOperator::Ne)
    }

    #[must_use]
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            BinaryOperator::Lt | BinaryOperator::Le | BinaryOperator::Gt | BinaryOperator::Ge
        )
    }

    #[must_use]
    pub fn is_bitwise(self) -> bool {
        matches!(
            self,
            BinaryOperator::BitAnd
                | BinaryOperator::BitOr
                | BinaryOperator::BitXor
                | BinaryOperator::Shl
                | BinaryOperator::Shr
        )
    }
}

impl UnaryOperator {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            UnaryOperator::Neg => "-",
            UnaryOperator::Not => "!",
            UnaryOperator::BitNot => "~",
        }
    }
}
