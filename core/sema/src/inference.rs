//! Inference Runner
//!
//! The checker calls into the runner whenever it meets a placeholder. The
//! runner never walks further than the nodes it is handed: it reads types the
//! checker has already recorded for those nodes and writes the derived type
//! into the placeholder's slot.

use rustc_hash::FxHashMap;
use tern_ast::nodes::{Expression, Pattern};
use tern_ast::types::{TypeAnnotation, TypeSlot};

use crate::compat::common_type;

/// A pattern whose shape does not fit the type it is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PatternMismatch {
    pub(crate) expected: TypeAnnotation,
    pub(crate) found: TypeAnnotation,
}

pub(crate) struct InferenceRunner<'t> {
    node_types: &'t FxHashMap<u32, TypeAnnotation>,
}

impl<'t> InferenceRunner<'t> {
    pub(crate) fn new(node_types: &'t FxHashMap<u32, TypeAnnotation>) -> Self {
        Self { node_types }
    }

    fn recorded(&self, expression: &Expression) -> TypeAnnotation {
        self.node_types
            .get(&expression.id())
            .cloned()
            .unwrap_or(TypeAnnotation::Placeholder)
    }

    /// Replaces a placeholder (or a partially inferred annotation) with `ty`.
    /// Returns whether the slot changed.
    pub(crate) fn fill(slot: &TypeSlot, ty: &TypeAnnotation) -> bool {
        let current = slot.get();
        if !current.contains_placeholder() || ty.is_placeholder() {
            return false;
        }
        let resolved = common_type(&current, ty).unwrap_or_else(|| ty.clone());
        tracing::debug!(from = %current, to = %resolved, "resolved placeholder");
        slot.replace(resolved);
        true
    }

    /// Binds the names of a `let`, `for` or match pattern to `ty`, destructuring
    /// tuples element by element.
    pub(crate) fn bind_pattern(
        pattern: &Pattern,
        ty: &TypeAnnotation,
    ) -> Result<(), PatternMismatch> {
        match pattern {
            Pattern::Binding(binding) => {
                Self::fill(&binding.ty, ty);
                Ok(())
            }
            Pattern::Wildcard(_) | Pattern::Literal(_) | Pattern::EnumCase(_) => Ok(()),
            Pattern::Tuple(tuple) => {
                if ty.is_placeholder() {
                    for element in &tuple.elements {
                        Self::bind_pattern(element, ty)?;
                    }
                    return Ok(());
                }
                match ty.dereferenced().tuple_elements() {
                    Some(elements) if elements.len() == tuple.elements.len() => {
                        for (element, element_type) in tuple.elements.iter().zip(elements) {
                            Self::bind_pattern(element, element_type)?;
                        }
                        Ok(())
                    }
                    _ => Err(PatternMismatch {
                        expected: TypeAnnotation::tuple(
                            tuple
                                .elements
                                .iter()
                                .map(|_| TypeAnnotation::Placeholder)
                                .collect(),
                        ),
                        found: ty.clone(),
                    }),
                }
            }
        }
    }

    /// The type a `let` without annotation takes from its initializer.
    pub(crate) fn initializer(&self, value: &Expression) -> TypeAnnotation {
        self.recorded(value)
    }

    /// Common type of already checked sequence elements, reduced pairwise.
    /// `None` when two elements have no common type.
    pub(crate) fn sequence(&self, elements: &[Expression]) -> Option<TypeAnnotation> {
        elements
            .iter()
            .map(|element| self.recorded(element))
            .try_fold(TypeAnnotation::Placeholder, |acc, ty| common_type(&acc, &ty))
    }

    /// Result type of an arithmetic expression whose operands are recorded.
    pub(crate) fn binary(&self, left: &Expression, right: &Expression) -> Option<TypeAnnotation> {
        common_type(&self.recorded(left), &self.recorded(right))
    }

    /// Return type of a closure from the types of its `return` values and its
    /// trailing expression. A closure that yields nothing returns `unit`.
    pub(crate) fn closure_return(candidates: &[TypeAnnotation]) -> Option<TypeAnnotation> {
        if candidates.is_empty() {
            return Some(TypeAnnotation::unit());
        }
        candidates
            .iter()
            .try_fold(TypeAnnotation::Placeholder, |acc, ty| common_type(&acc, ty))
    }
}
