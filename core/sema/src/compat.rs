//! Type compatibility
//!
//! Every "may a value of type A be used where B is expected" question asked
//! by the checker goes through [`compatibility`], which answers with one of
//! three states. `Intermediate` marks a conversion the language performs
//! implicitly but reports as a widening warning.

use rustc_hash::FxHashMap;
use tern_ast::types::{PrimitiveKind, TypeAnnotation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compatibility {
    Compatible,
    Incompatible,
    Intermediate,
}

impl Compatibility {
    /// Compatible or intermediate.
    #[must_use = "this is a pure check with no side effects"]
    pub fn is_accepted(self) -> bool {
        self != Compatibility::Incompatible
    }

    /// The weaker of two answers.
    #[must_use]
    pub fn and(self, other: Compatibility) -> Compatibility {
        match (self, other) {
            (Compatibility::Incompatible, _) | (_, Compatibility::Incompatible) => {
                Compatibility::Incompatible
            }
            (Compatibility::Intermediate, _) | (_, Compatibility::Intermediate) => {
                Compatibility::Intermediate
            }
            _ => Compatibility::Compatible,
        }
    }
}

/// Looks through references and module qualification.
fn unqualified(ty: &TypeAnnotation) -> &TypeAnnotation {
    match ty {
        TypeAnnotation::Reference(inner) | TypeAnnotation::Member { inner, .. } => {
            unqualified(inner)
        }
        other => other,
    }
}

fn primitive_compatibility(from: PrimitiveKind, to: PrimitiveKind) -> Compatibility {
    if from == to {
        Compatibility::Compatible
    } else if from.is_numeric() && to.is_numeric() && from < to {
        Compatibility::Intermediate
    } else {
        Compatibility::Incompatible
    }
}

/// May a value of type `from` be used where `to` is expected?
///
/// Placeholders are compatible with everything: they are resolved by the
/// inference runner, not rejected. Generic arguments are invariant.
#[must_use = "this is a pure check with no side effects"]
pub fn compatibility(from: &TypeAnnotation, to: &TypeAnnotation) -> Compatibility {
    let (from, to) = (unqualified(from), unqualified(to));
    if from == to {
        return Compatibility::Compatible;
    }
    match (from, to) {
        (TypeAnnotation::Placeholder, _) | (_, TypeAnnotation::Placeholder) => {
            Compatibility::Compatible
        }
        (TypeAnnotation::Parameter(_), _) | (_, TypeAnnotation::Parameter(_)) => {
            Compatibility::Intermediate
        }
        (TypeAnnotation::Primitive(from), TypeAnnotation::Primitive(to)) => {
            primitive_compatibility(*from, *to)
        }
        (
            TypeAnnotation::Simple {
                name: from_name,
                arguments: from_arguments,
            },
            TypeAnnotation::Simple {
                name: to_name,
                arguments: to_arguments,
            },
        ) => {
            if from_name != to_name || from_arguments.len() != to_arguments.len() {
                return Compatibility::Incompatible;
            }
            let invariant = from_arguments
                .iter()
                .zip(to_arguments)
                .all(|(from, to)| compatibility(from, to) == Compatibility::Compatible);
            if invariant {
                Compatibility::Compatible
            } else {
                Compatibility::Incompatible
            }
        }
        (
            TypeAnnotation::Function {
                returns: from_returns,
                parameters: from_parameters,
                ..
            },
            TypeAnnotation::Function {
                returns: to_returns,
                parameters: to_parameters,
                ..
            },
        ) => {
            if from_parameters.len() != to_parameters.len() {
                return Compatibility::Incompatible;
            }
            from_parameters
                .iter()
                .zip(to_parameters)
                .fold(compatibility(from_returns, to_returns), |acc, (from, to)| {
                    acc.and(compatibility(to, from))
                })
        }
        _ => Compatibility::Incompatible,
    }
}

/// The narrowest type both sides convert to, if any.
#[must_use = "this is a pure computation with no side effects"]
pub fn common_type(left: &TypeAnnotation, right: &TypeAnnotation) -> Option<TypeAnnotation> {
    if left == right {
        return Some(left.clone());
    }
    match (unqualified(left), unqualified(right)) {
        (TypeAnnotation::Placeholder, other) | (other, TypeAnnotation::Placeholder) => {
            Some(other.clone())
        }
        (TypeAnnotation::Primitive(a), TypeAnnotation::Primitive(b))
            if a.is_numeric() && b.is_numeric() =>
        {
            Some(TypeAnnotation::Primitive(*a.max(b)))
        }
        (
            TypeAnnotation::Simple {
                name: left_name,
                arguments: left_arguments,
            },
            TypeAnnotation::Simple {
                name: right_name,
                arguments: right_arguments,
            },
        ) if left_name == right_name && left_arguments.len() == right_arguments.len() => {
            let arguments = left_arguments
                .iter()
                .zip(right_arguments)
                .map(|(l, r)| common_type(l, r))
                .collect::<Option<Vec<_>>>()?;
            Some(TypeAnnotation::generic(left_name, arguments))
        }
        (a, b) if a == b => Some(a.clone()),
        _ => None,
    }
}

/// Replaces bound generic parameters throughout `ty`.
#[must_use = "substitution returns a new annotation, the original is unchanged"]
pub fn substitute(
    ty: &TypeAnnotation,
    bindings: &FxHashMap<String, TypeAnnotation>,
) -> TypeAnnotation {
    match ty {
        TypeAnnotation::Parameter(name) => bindings.get(name).cloned().unwrap_or_else(|| ty.clone()),
        TypeAnnotation::Simple { name, arguments } => TypeAnnotation::Simple {
            name: name.clone(),
            arguments: arguments.iter().map(|a| substitute(a, bindings)).collect(),
        },
        TypeAnnotation::Function {
            name,
            returns,
            parameters,
        } => TypeAnnotation::Function {
            name: name.clone(),
            returns: Box::new(substitute(returns, bindings)),
            parameters: parameters.iter().map(|p| substitute(p, bindings)).collect(),
        },
        TypeAnnotation::Reference(inner) => {
            TypeAnnotation::Reference(Box::new(substitute(inner, bindings)))
        }
        TypeAnnotation::Member { path, inner } => TypeAnnotation::Member {
            path: path.clone(),
            inner: Box::new(substitute(inner, bindings)),
        },
        TypeAnnotation::Placeholder | TypeAnnotation::Primitive(_) => ty.clone(),
    }
}

/// True if an unbound generic parameter occurs in `ty`.
#[must_use = "this is a pure check with no side effects"]
pub fn has_parameters(ty: &TypeAnnotation) -> bool {
    match ty {
        TypeAnnotation::Parameter(_) => true,
        TypeAnnotation::Simple { arguments, .. } => arguments.iter().any(has_parameters),
        TypeAnnotation::Function {
            returns,
            parameters,
            ..
        } => has_parameters(returns) || parameters.iter().any(has_parameters),
        TypeAnnotation::Reference(inner) | TypeAnnotation::Member { inner, .. } => {
            has_parameters(inner)
        }
        TypeAnnotation::Placeholder | TypeAnnotation::Primitive(_) => false,
    }
}

/// A generic parameter matched against two incompatible argument types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingConflict {
    pub parameter: String,
    pub bound: TypeAnnotation,
    pub found: TypeAnnotation,
}

/// Matches `parameter` structurally against `argument`, recording what each
/// generic parameter stands for. A parameter seen twice keeps its first
/// binding when the second is accepted by it.
pub fn bind_parameters(
    parameter: &TypeAnnotation,
    argument: &TypeAnnotation,
    bindings: &mut FxHashMap<String, TypeAnnotation>,
) -> Result<(), BindingConflict> {
    match (unqualified(parameter), unqualified(argument)) {
        (_, TypeAnnotation::Placeholder) => Ok(()),
        (TypeAnnotation::Parameter(name), argument) => {
            match bindings.get(name) {
                Some(bound) => {
                    if !compatibility(argument, bound).is_accepted() {
                        return Err(BindingConflict {
                            parameter: name.clone(),
                            bound: bound.clone(),
                            found: argument.clone(),
                        });
                    }
                }
                None => {
                    bindings.insert(name.clone(), argument.clone());
                }
            }
            Ok(())
        }
        (
            TypeAnnotation::Simple {
                name: parameter_name,
                arguments: parameter_arguments,
            },
            TypeAnnotation::Simple {
                name: argument_name,
                arguments: argument_arguments,
            },
        ) if parameter_name == argument_name => {
            for (p, a) in parameter_arguments.iter().zip(argument_arguments) {
                bind_parameters(p, a, bindings)?;
            }
            Ok(())
        }
        (
            TypeAnnotation::Function {
                returns: parameter_returns,
                parameters: parameter_parameters,
                ..
            },
            TypeAnnotation::Function {
                returns: argument_returns,
                parameters: argument_parameters,
                ..
            },
        ) => {
            for (p, a) in parameter_parameters.iter().zip(argument_parameters) {
                bind_parameters(p, a, bindings)?;
            }
            bind_parameters(parameter_returns, argument_returns, bindings)
        }
        _ => Ok(()),
    }
}

/// Explicit `as` conversions: anything implicitly accepted, plus numeric
/// narrowing, `char` and `bool` to integers and integers to `char`.
#[must_use = "this is a pure check with no side effects"]
pub fn is_castable(from: &TypeAnnotation, to: &TypeAnnotation) -> bool {
    if compatibility(from, to).is_accepted() {
        return true;
    }
    match (unqualified(from), unqualified(to)) {
        (TypeAnnotation::Primitive(from), TypeAnnotation::Primitive(to)) => {
            (from.is_numeric() && to.is_numeric())
                || (matches!(from, PrimitiveKind::Char | PrimitiveKind::Bool) && to.is_integer())
                || (from.is_integer() && *to == PrimitiveKind::Char)
        }
        _ => false,
    }
}
