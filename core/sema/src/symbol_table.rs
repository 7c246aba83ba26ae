//! Symbol Table
//!
//! Owns the two synthetic roots of the scope forest and numbers every scope
//! created under them. One table lives in each [`crate::session::Session`];
//! every unit the session analyses adds one module scope under the global root.

use std::cell::Cell;

use crate::{
    errors::SemaError,
    ids::IdAllocator,
    natives::native_scope,
    scope::{Scope, ScopeKind, ScopeRef},
};

pub struct SymbolTable {
    root: ScopeRef,
    natives: ScopeRef,
    next_scope_id: Cell<u32>,
}

impl SymbolTable {
    /// Creates both roots and materializes the native functions.
    ///
    /// # Errors
    ///
    /// Fails if the native table declares a name twice.
    pub fn new(ids: &IdAllocator) -> Result<Self, SemaError> {
        let root = Scope::new(1, "root", ScopeKind::Root).into_ref();
        let natives = native_scope(2, ids)?.into_ref();
        root.borrow_mut().link_natives(natives.clone());
        Ok(Self {
            root,
            natives,
            next_scope_id: Cell::new(3),
        })
    }

    #[must_use = "this is a pure lookup with no side effects"]
    pub fn root(&self) -> ScopeRef {
        self.root.clone()
    }

    #[must_use = "this is a pure lookup with no side effects"]
    pub fn natives(&self) -> ScopeRef {
        self.natives.clone()
    }

    pub(crate) fn next_scope_id(&self) -> u32 {
        let id = self.next_scope_id.get();
        self.next_scope_id.set(id + 1);
        id
    }

    /// A fresh, unattached scope numbered by this table.
    pub(crate) fn new_scope(&self, name: &str, kind: ScopeKind) -> Scope {
        Scope::new(self.next_scope_id(), name, kind)
    }

    /// Appends a new child scope to `parent`.
    pub(crate) fn push_child(&self, parent: &ScopeRef, name: &str, kind: ScopeKind) -> ScopeRef {
        Scope::attach(parent, self.new_scope(name, kind))
    }

    /// Adds the module scope of a new unit under the global root.
    pub(crate) fn new_module(&self, name: &str) -> ScopeRef {
        self.push_child(&self.root, name, ScopeKind::Module)
    }
}
