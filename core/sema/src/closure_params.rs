//! Closure Parameter Inferencer
//!
//! An untyped closure parameter takes its type from the call the closure is
//! passed to: the callee's parameter at the closure's argument position must
//! be a function type, and its parameter at the same index as the untyped one
//! is copied onto the placeholder.
//!
//! The checker validates the call shape and reports user-facing mismatches
//! before delegating here, so a shape that still does not fit is an internal
//! error.

use tern_ast::nodes::ClosureExpression;
use tern_ast::types::TypeAnnotation;

use crate::errors::{Abort, InternalError, SemaError};

/// Where a closure appears.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ClosureSite<'a> {
    Standalone,
    /// A call argument whose position does not take a matching function;
    /// the mismatch has been reported and parameters stay untyped.
    Mismatched,
    CallArgument {
        /// Callee signature with known generic bindings substituted.
        signature: &'a TypeAnnotation,
        position: usize,
    },
}

fn function_parts(ty: &TypeAnnotation) -> Option<&[TypeAnnotation]> {
    match ty {
        TypeAnnotation::Function { parameters, .. } => Some(parameters),
        _ => None,
    }
}

/// Fills every placeholder parameter type of `closure`.
pub(crate) fn infer_closure_parameters(
    closure: &ClosureExpression,
    site: ClosureSite<'_>,
) -> Result<(), Abort> {
    for (index, parameter) in closure.parameters.iter().enumerate() {
        if !parameter.ty.is_placeholder() {
            continue;
        }
        let (signature, position) = match site {
            ClosureSite::CallArgument {
                signature,
                position,
            } => (signature, position),
            ClosureSite::Mismatched => continue,
            ClosureSite::Standalone => {
                return Err(Abort::Fatal(SemaError::ImplicitClosureParameter {
                    name: parameter.name(),
                    location: parameter.location.clone(),
                }));
            }
        };
        let callee_parameters =
            function_parts(signature).ok_or_else(|| InternalError::ClosureShape {
                expected: "a function-typed callee",
                found: signature.clone(),
                location: closure.location.clone(),
            })?;
        let expected =
            callee_parameters
                .get(position)
                .ok_or_else(|| InternalError::ClosureShape {
                    expected: "a callee parameter at the closure's position",
                    found: signature.clone(),
                    location: closure.location.clone(),
                })?;
        let shape = function_parts(expected).ok_or_else(|| InternalError::ClosureShape {
            expected: "a function-typed parameter",
            found: expected.clone(),
            location: closure.location.clone(),
        })?;
        let inferred = shape.get(index).ok_or_else(|| InternalError::ClosureShape {
            expected: "a parameter at the placeholder's index",
            found: expected.clone(),
            location: parameter.location.clone(),
        })?;
        tracing::debug!(name = %parameter.name(), ty = %inferred, "inferred closure parameter");
        parameter.ty.replace(inferred.clone());
    }
    Ok(())
}
