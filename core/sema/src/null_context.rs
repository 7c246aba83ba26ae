//! Null-Context Checker
//!
//! `null` exists only to talk to foreign code. It may appear as an operand of
//! a binary expression or as a call argument, and only when the type on the
//! other side (the other operand, or the parameter it is passed to) is
//! declared by a foreign import. Every other use is rejected by the checker
//! before it gets here.

use tern_ast::nodes::Location;
use tern_ast::types::TypeAnnotation;

use crate::{
    errors::SemaError,
    scope::{find_type_scope, ScopeRef},
};

/// The two places a null literal may legally appear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NullContext {
    Binary {
        other_type: TypeAnnotation,
        location: Location,
    },
    CallArgument {
        param_type: TypeAnnotation,
        location: Location,
    },
}

impl NullContext {
    fn parts(&self) -> (&TypeAnnotation, &Location) {
        match self {
            NullContext::Binary {
                other_type,
                location,
            } => (other_type, location),
            NullContext::CallArgument {
                param_type,
                location,
            } => (param_type, location),
        }
    }
}

/// Accepts the null literal if the counterpart type lives in a foreign scope.
/// A counterpart whose type is not yet known cannot vouch for it.
pub(crate) fn check_null(scope: &ScopeRef, context: &NullContext) -> Result<(), SemaError> {
    let (ty, location) = context.parts();
    if ty.contains_placeholder() {
        return Err(SemaError::CannotInfer {
            what: "`null`".to_string(),
            location: location.clone(),
        });
    }
    let foreign = ty
        .scope_name()
        .and_then(|name| find_type_scope(scope, name))
        .is_some_and(|type_scope| type_scope.borrow().foreign);
    if foreign {
        tracing::trace!(ty = %ty, "null accepted against foreign type");
        Ok(())
    } else {
        Err(SemaError::NullOutsideInterop {
            location: location.clone(),
        })
    }
}
