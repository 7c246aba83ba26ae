//! Scope Cursor
//!
//! Every pass after the skeleton walks the syntax tree and the scope tree in
//! lock-step. A [`ScopeCursor`] keeps an explicit stack of `(scope, next child)`
//! frames: entering a scope-introducing construct takes the next unvisited
//! child of the current scope, leaving it pops back to the parent.
//!
//! Alignment is checked rather than assumed. Each descent names the kind of
//! scope the construct introduces and fails if the next child has another
//! kind; each ascent fails if the scope being left still has unvisited
//! children. Both failures are [`InternalError`]s.

use crate::{
    errors::InternalError,
    scope::{ScopeKind, ScopeRef},
};

struct Frame {
    scope: ScopeRef,
    next_child: usize,
}

pub(crate) struct ScopeCursor {
    stack: Vec<Frame>,
    trace: Option<Vec<u32>>,
}

impl ScopeCursor {
    /// A cursor positioned on `root`. `root` need not be a tree root; the
    /// closure inspector roots its cursor at the closure's own scope.
    pub(crate) fn new(root: ScopeRef) -> Self {
        Self {
            stack: vec![Frame {
                scope: root,
                next_child: 0,
            }],
            trace: None,
        }
    }

    /// Records the id of every scope entered or passed over.
    #[must_use]
    pub(crate) fn with_trace(mut self, enabled: bool) -> Self {
        self.trace = enabled.then(Vec::new);
        self
    }

    fn top(&self) -> &Frame {
        // The root frame is never popped, see `ascend`.
        &self.stack[self.stack.len() - 1]
    }

    pub(crate) fn current(&self) -> ScopeRef {
        self.top().scope.clone()
    }

    #[must_use = "this is a pure lookup with no side effects"]
    pub(crate) fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    fn next_child(&mut self, expected: ScopeKind) -> Result<ScopeRef, InternalError> {
        let frame = self
            .stack
            .last_mut()
            .ok_or(InternalError::AscendPastRoot)?;
        let child = {
            let scope = frame.scope.borrow();
            scope
                .children()
                .get(frame.next_child)
                .cloned()
                .ok_or_else(|| InternalError::MissingChildScope {
                    parent: scope.name.clone(),
                    expected,
                })?
        };
        {
            let child_ref = child.borrow();
            if child_ref.kind != expected {
                return Err(InternalError::ScopeKindMismatch {
                    expected,
                    found: child_ref.kind,
                    name: child_ref.name.clone(),
                });
            }
            if let Some(trace) = &mut self.trace {
                trace.push(child_ref.id);
            }
        }
        frame.next_child += 1;
        Ok(child)
    }

    /// Enters the next child scope, which must be of kind `expected`.
    pub(crate) fn descend(&mut self, expected: ScopeKind) -> Result<ScopeRef, InternalError> {
        let child = self.next_child(expected)?;
        tracing::trace!(
            scope = %child.borrow().name,
            kind = %expected,
            depth = self.stack.len(),
            "descend"
        );
        self.stack.push(Frame {
            scope: child.clone(),
            next_child: 0,
        });
        Ok(child)
    }

    /// Steps over the next child scope without entering it.
    pub(crate) fn pass_over(&mut self, expected: ScopeKind) -> Result<ScopeRef, InternalError> {
        self.next_child(expected)
    }

    /// Leaves the current scope. Every child of it must have been visited.
    pub(crate) fn ascend(&mut self) -> Result<(), InternalError> {
        if self.stack.len() == 1 {
            return Err(InternalError::AscendPastRoot);
        }
        self.check_fully_visited()?;
        self.stack.pop();
        Ok(())
    }

    fn check_fully_visited(&self) -> Result<(), InternalError> {
        let frame = self.top();
        let scope = frame.scope.borrow();
        let total = scope.children().len();
        if frame.next_child != total {
            return Err(InternalError::UnvisitedChildScopes {
                name: scope.name.clone(),
                visited: frame.next_child,
                total,
            });
        }
        Ok(())
    }

    /// Ends the walk: the cursor must be back on its root with every child visited.
    pub(crate) fn finish(self) -> Result<Vec<u32>, InternalError> {
        if self.stack.len() != 1 {
            let scope = self.top().scope.borrow();
            return Err(InternalError::UnvisitedChildScopes {
                name: scope.name.clone(),
                visited: self.top().next_child,
                total: scope.children().len(),
            });
        }
        self.check_fully_visited()?;
        Ok(self.trace.unwrap_or_default())
    }
}
