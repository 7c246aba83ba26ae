//! Scope Tree
//!
//! Lexical scopes form an n-ary tree. Parents own their children; a child
//! keeps a weak reference back. Every scope has two independent namespaces,
//! values and types, so a name may denote a value in one place and a type in
//! another.
//!
//! The children of a scope are stored in the order their constructs appear in
//! the syntax tree. Passes never look children up by name while walking; they
//! step through them in order with a [`crate::cursor::ScopeCursor`].
//!
//! Two synthetic roots anchor the forest: the global root, parent of every
//! module scope, and the native root holding built-in functions. The global
//! root keeps a link to the native root so value lookups can fall back to it.

use std::{
    cell::RefCell,
    collections::VecDeque,
    fmt::{self, Display, Formatter},
    rc::{Rc, Weak},
};

use rustc_hash::FxHashMap;

use crate::{errors::SemaError, symbol::SymbolRef};

pub type ScopeRef = Rc<RefCell<Scope>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Root,
    Natives,
    Module,
    Function,
    Closure,
    Block,
    Branch,
    Loop,
    MatchArm,
    Catch,
    TypeBody,
    Import,
}

impl ScopeKind {
    #[must_use = "returns the string representation without modifying self"]
    pub const fn as_str(self) -> &'static str {
        match self {
            ScopeKind::Root => "root",
            ScopeKind::Natives => "natives",
            ScopeKind::Module => "module",
            ScopeKind::Function => "function",
            ScopeKind::Closure => "closure",
            ScopeKind::Block => "block",
            ScopeKind::Branch => "branch",
            ScopeKind::Loop => "loop",
            ScopeKind::MatchArm => "match arm",
            ScopeKind::Catch => "catch",
            ScopeKind::TypeBody => "type body",
            ScopeKind::Import => "import",
        }
    }

    /// Scopes whose children are searched by [`find_type_scope`].
    #[must_use = "this is a pure check with no side effects"]
    pub fn is_namespace(self) -> bool {
        matches!(self, ScopeKind::Module | ScopeKind::Import)
    }
}

impl Display for ScopeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug)]
pub struct Scope {
    pub id: u32,
    pub name: String,
    pub kind: ScopeKind,
    /// Set on scopes describing host types, see the null-context check.
    pub foreign: bool,
    parent: Option<Weak<RefCell<Scope>>>,
    children: Vec<ScopeRef>,
    values: FxHashMap<String, SymbolRef>,
    types: FxHashMap<String, SymbolRef>,
    natives: Option<ScopeRef>,
}

impl Scope {
    #[must_use]
    pub fn new(id: u32, name: &str, kind: ScopeKind) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind,
            foreign: false,
            parent: None,
            children: Vec::new(),
            values: FxHashMap::default(),
            types: FxHashMap::default(),
            natives: None,
        }
    }

    #[must_use]
    pub fn into_ref(self) -> ScopeRef {
        Rc::new(RefCell::new(self))
    }

    /// Appends `child` as the last child of `parent`.
    pub fn attach(parent: &ScopeRef, mut child: Scope) -> ScopeRef {
        child.parent = Some(Rc::downgrade(parent));
        let child = child.into_ref();
        parent.borrow_mut().children.push(child.clone());
        child
    }

    pub(crate) fn link_natives(&mut self, natives: ScopeRef) {
        self.natives = Some(natives);
    }

    #[must_use = "this is a pure lookup with no side effects"]
    pub fn parent(&self) -> Option<ScopeRef> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    #[must_use = "this is a pure lookup with no side effects"]
    pub fn children(&self) -> &[ScopeRef] {
        &self.children
    }

    /// Declares a value.
    ///
    /// # Errors
    ///
    /// Returns [`SemaError::DuplicateDeclaration`] if the name already exists
    /// in this scope's value namespace.
    pub fn declare_value(&mut self, symbol: SymbolRef) -> Result<(), SemaError> {
        Self::declare(&mut self.values, symbol)
    }

    /// Declares a type.
    ///
    /// # Errors
    ///
    /// Returns [`SemaError::DuplicateDeclaration`] if the name already exists
    /// in this scope's type namespace.
    pub fn declare_type(&mut self, symbol: SymbolRef) -> Result<(), SemaError> {
        Self::declare(&mut self.types, symbol)
    }

    fn declare(
        namespace: &mut FxHashMap<String, SymbolRef>,
        symbol: SymbolRef,
    ) -> Result<(), SemaError> {
        if let Some(previous) = namespace.get(&symbol.name) {
            return Err(SemaError::DuplicateDeclaration {
                name: symbol.name.clone(),
                location: symbol.location.clone(),
                previous: previous.location.clone(),
            });
        }
        namespace.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    #[must_use = "this is a pure lookup with no side effects"]
    pub fn lookup_value_local(&self, name: &str) -> Option<SymbolRef> {
        self.values.get(name).cloned()
    }

    #[must_use = "this is a pure lookup with no side effects"]
    pub fn lookup_type_local(&self, name: &str) -> Option<SymbolRef> {
        self.types.get(name).cloned()
    }

    pub fn values(&self) -> impl Iterator<Item = &SymbolRef> {
        self.values.values()
    }

    pub fn types(&self) -> impl Iterator<Item = &SymbolRef> {
        self.types.values()
    }

    /// A parentless, childless copy sharing this scope's symbols.
    #[must_use]
    pub fn detached_clone(&self) -> Scope {
        Scope {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind,
            foreign: self.foreign,
            parent: None,
            children: Vec::new(),
            values: self.values.clone(),
            types: self.types.clone(),
            natives: None,
        }
    }

    /// The first child with the given kind and name.
    #[must_use = "this is a pure lookup with no side effects"]
    pub fn child_named(&self, kind: ScopeKind, name: &str) -> Option<ScopeRef> {
        self.children
            .iter()
            .find(|child| {
                let child = child.borrow();
                child.kind == kind && child.name == name
            })
            .cloned()
    }
}

/// Walks from `scope` to the top, yielding each scope including `scope`.
fn for_each_ancestor<T>(scope: &ScopeRef, mut f: impl FnMut(&ScopeRef) -> Option<T>) -> Option<T> {
    let mut current = Some(scope.clone());
    while let Some(scope) = current {
        if let Some(found) = f(&scope) {
            return Some(found);
        }
        current = scope.borrow().parent();
    }
    None
}

/// The nearest value named `name` in `scope` or its ancestors, without natives.
///
/// Type bodies contribute nothing to value lookups from nested scopes: fields
/// and methods are reached through a value of the type.
#[must_use = "this is a pure lookup with no side effects"]
pub fn lookup_value_in_ancestors(scope: &ScopeRef, name: &str) -> Option<(SymbolRef, ScopeRef)> {
    for_each_ancestor(scope, |current| {
        let current_ref = current.borrow();
        if current_ref.kind == ScopeKind::TypeBody {
            return None;
        }
        current_ref
            .lookup_value_local(name)
            .map(|symbol| (symbol, current.clone()))
    })
}

/// The nearest value named `name`, falling back to the native table.
#[must_use = "this is a pure lookup with no side effects"]
pub fn lookup_value_any_scope(scope: &ScopeRef, name: &str) -> Option<SymbolRef> {
    if let Some((symbol, _)) = lookup_value_in_ancestors(scope, name) {
        return Some(symbol);
    }
    lookup_native(scope, name)
}

/// Looks `name` up in the native table reachable from `scope`'s root.
#[must_use = "this is a pure lookup with no side effects"]
pub fn lookup_native(scope: &ScopeRef, name: &str) -> Option<SymbolRef> {
    let natives = for_each_ancestor(scope, |current| current.borrow().natives.clone())?;
    let natives = natives.borrow();
    natives.lookup_value_local(name)
}

/// The nearest type named `name`. Natives are values only, so they are never searched.
#[must_use = "this is a pure lookup with no side effects"]
pub fn lookup_type_any_scope(scope: &ScopeRef, name: &str) -> Option<SymbolRef> {
    for_each_ancestor(scope, |current| current.borrow().lookup_type_local(name))
}

/// Finds the type body scope of `type_name`.
///
/// For each ancestor of `scope`, nearest first, the ancestor's children are
/// searched breadth first, descending into module and import scopes.
#[must_use = "this is a pure lookup with no side effects"]
pub fn find_type_scope(scope: &ScopeRef, type_name: &str) -> Option<ScopeRef> {
    for_each_ancestor(scope, |ancestor| {
        let mut queue: VecDeque<ScopeRef> = ancestor.borrow().children.iter().cloned().collect();
        while let Some(candidate) = queue.pop_front() {
            let (is_match, nested) = {
                let candidate = candidate.borrow();
                let is_match =
                    candidate.kind == ScopeKind::TypeBody && candidate.name == type_name;
                let nested = if candidate.kind.is_namespace() {
                    candidate.children.clone()
                } else {
                    Vec::new()
                };
                (is_match, nested)
            };
            if is_match {
                return Some(candidate);
            }
            queue.extend(nested);
        }
        None
    })
}

/// The scope chain from `scope` up to the top, `scope` first.
#[must_use]
pub fn ancestors(scope: &ScopeRef) -> Vec<ScopeRef> {
    let mut chain = Vec::new();
    let _: Option<()> = for_each_ancestor(scope, |current| {
        chain.push(current.clone());
        None
    });
    chain
}

/// The innermost module scope enclosing `scope`.
#[must_use = "this is a pure lookup with no side effects"]
pub fn enclosing_module(scope: &ScopeRef) -> Option<ScopeRef> {
    for_each_ancestor(scope, |current| {
        (current.borrow().kind == ScopeKind::Module).then(|| current.clone())
    })
}
