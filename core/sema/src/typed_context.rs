//! Analyzed Module
//!
//! [`AnalyzedModule`] is what a successful analysis hands to later stages:
//! the syntax tree with every type slot filled in and every identifier bound,
//! plus side tables keyed by node id and symbol id.
//!
//! ```text
//! AnalyzedModule
//! ├─ file (fully typed syntax tree)
//! ├─ module_scope (scope forest of this unit)
//! ├─ node_types: node id -> TypeAnnotation
//! ├─ symbols: symbol id -> Symbol
//! ├─ raw_values: enum case node id -> LiteralValue
//! └─ warnings, scope traces
//! ```
//!
//! Only expressions have entries in the node type table. Declaration sites
//! carry their type in their own [`TypeSlot`](tern_ast::types::TypeSlot).

use std::rc::Rc;

use rustc_hash::FxHashMap;
use tern_ast::nodes::{ClosureExpression, Expression, LiteralValue, Location, SourceFile};
use tern_ast::types::{TypeAnnotation, TypeSlot};

use crate::{
    errors::SemaError,
    scope::ScopeRef,
    symbol::SymbolRef,
    walk::{walk_file, Visitor},
};

/// A declaration whose type was never inferred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderSite {
    pub what: String,
    pub location: Location,
}

pub struct AnalyzedModule {
    file: Rc<SourceFile>,
    module_scope: ScopeRef,
    node_types: FxHashMap<u32, TypeAnnotation>,
    symbols: FxHashMap<u32, SymbolRef>,
    raw_values: FxHashMap<u32, LiteralValue>,
    warnings: Vec<SemaError>,
    binder_trace: Vec<u32>,
    checker_trace: Vec<u32>,
}

/// Everything the passes produce for one unit, before it is sealed.
#[derive(Default)]
pub(crate) struct ModuleTables {
    pub(crate) node_types: FxHashMap<u32, TypeAnnotation>,
    pub(crate) symbols: FxHashMap<u32, SymbolRef>,
    pub(crate) raw_values: FxHashMap<u32, LiteralValue>,
    pub(crate) binder_trace: Vec<u32>,
    pub(crate) checker_trace: Vec<u32>,
}

impl AnalyzedModule {
    pub(crate) fn new(
        file: Rc<SourceFile>,
        module_scope: ScopeRef,
        tables: ModuleTables,
        warnings: Vec<SemaError>,
    ) -> Self {
        Self {
            file,
            module_scope,
            node_types: tables.node_types,
            symbols: tables.symbols,
            raw_values: tables.raw_values,
            warnings,
            binder_trace: tables.binder_trace,
            checker_trace: tables.checker_trace,
        }
    }

    #[must_use = "this is a pure lookup with no side effects"]
    pub fn file(&self) -> Rc<SourceFile> {
        self.file.clone()
    }

    #[must_use = "this is a pure lookup with no side effects"]
    pub fn module_scope(&self) -> ScopeRef {
        self.module_scope.clone()
    }

    /// Type computed for the expression with node id `node_id`.
    #[must_use = "this is a pure lookup with no side effects"]
    pub fn get_node_type(&self, node_id: u32) -> Option<&TypeAnnotation> {
        self.node_types.get(&node_id)
    }

    #[must_use = "this is a pure lookup with no side effects"]
    pub fn symbol(&self, id: u32) -> Option<SymbolRef> {
        self.symbols.get(&id).cloned()
    }

    /// All symbols bound in this unit, ordered by id.
    #[must_use = "this is a pure lookup with no side effects"]
    pub fn symbols(&self) -> Vec<SymbolRef> {
        let mut symbols: Vec<SymbolRef> = self.symbols.values().cloned().collect();
        symbols.sort_by_key(|symbol| symbol.id());
        symbols
    }

    /// Symbols with the given name, ordered by id.
    #[must_use = "this is a pure lookup with no side effects"]
    pub fn symbols_named(&self, name: &str) -> Vec<SymbolRef> {
        self.symbols()
            .into_iter()
            .filter(|symbol| symbol.name == name)
            .collect()
    }

    /// Raw value of the enum case declared by node `case_id`.
    #[must_use = "this is a pure lookup with no side effects"]
    pub fn raw_value(&self, case_id: u32) -> Option<&LiteralValue> {
        self.raw_values.get(&case_id)
    }

    #[must_use = "this is a pure lookup with no side effects"]
    pub fn warnings(&self) -> &[SemaError] {
        &self.warnings
    }

    /// Scope ids in the order the binder and the checker visited them. Empty
    /// unless scope trace recording was enabled.
    #[must_use = "this is a pure lookup with no side effects"]
    pub fn scope_traces(&self) -> (&[u32], &[u32]) {
        (&self.binder_trace, &self.checker_trace)
    }

    /// Every closure in the unit, in source order.
    #[must_use = "returns closures without side effects"]
    pub fn closures(&self) -> Vec<Rc<ClosureExpression>> {
        collect_closures(&self.file)
    }

    /// Declarations still typed as a placeholder. Empty after a successful analysis.
    #[must_use = "returns placeholder sites without side effects"]
    pub fn find_placeholders(&self) -> Vec<PlaceholderSite> {
        find_placeholders(&self.file)
    }
}

struct ClosureCollector(Vec<Rc<ClosureExpression>>);

impl Visitor for ClosureCollector {
    fn expression(&mut self, expression: &Expression) {
        if let Expression::Closure(closure) = expression {
            self.0.push(closure.clone());
        }
    }
}

pub(crate) fn collect_closures(file: &SourceFile) -> Vec<Rc<ClosureExpression>> {
    let mut collector = ClosureCollector(Vec::new());
    walk_file(file, &mut collector);
    collector.0
}

struct PlaceholderCollector(Vec<PlaceholderSite>);

impl Visitor for PlaceholderCollector {
    fn slot(&mut self, what: String, slot: &TypeSlot, location: &Location) {
        if slot.get().contains_placeholder() {
            self.0.push(PlaceholderSite {
                what,
                location: location.clone(),
            });
        }
    }
}

pub(crate) fn find_placeholders(file: &SourceFile) -> Vec<PlaceholderSite> {
    let mut collector = PlaceholderCollector(Vec::new());
    walk_file(file, &mut collector);
    collector.0
}
