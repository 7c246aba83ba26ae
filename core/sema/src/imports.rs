//! Imports
//!
//! `import a.b as alias` leaves an empty import scope in the skeleton. Before
//! binding, the session asks its [`ModuleLoader`] for the module and merges
//! what it exports into that scope:
//!
//! - a source module is analysed first (by the same session, so ids stay
//!   unique) and its public symbols and type bodies are copied in with fresh
//!   ids;
//! - a foreign module is a plain description of host types and functions; its
//!   symbols are created directly and everything is marked foreign.
//!
//! Imported symbols keep their own type cells, so inference in the importing
//! unit never writes back into the imported one.

use std::rc::Rc;

use rustc_hash::FxHashMap;
use tern_ast::nodes::{Location, SourceFile};
use tern_ast::types::{TypeAnnotation, TypeSlot};

use crate::{
    errors::Abort,
    ids::IdAllocator,
    scope::{Scope, ScopeKind, ScopeRef},
    symbol::{Modifiers, Symbol, SymbolKind, SymbolRef},
    symbol_table::SymbolTable,
};

/// Supplies the modules named by import statements.
pub trait ModuleLoader {
    /// Loads the module at `path`. `foreign` is the import's own foreign flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the module does not exist or cannot be read. The
    /// message becomes part of the unresolved-import diagnostic.
    fn load(&self, path: &[String], foreign: bool) -> anyhow::Result<LoadedModule>;
}

#[derive(Debug, Clone)]
pub enum LoadedModule {
    Source(Rc<SourceFile>),
    Foreign(ForeignModule),
}

#[derive(Debug, Clone, Default)]
pub struct ForeignModule {
    pub types: Vec<ForeignType>,
    pub functions: Vec<ForeignFunction>,
}

#[derive(Debug, Clone)]
pub struct ForeignType {
    pub name: String,
    pub fields: Vec<(String, TypeAnnotation)>,
    pub methods: Vec<ForeignFunction>,
}

#[derive(Debug, Clone)]
pub struct ForeignFunction {
    pub name: String,
    pub parameters: Vec<TypeAnnotation>,
    pub returns: TypeAnnotation,
}

impl ForeignType {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: vec![],
            methods: vec![],
        }
    }

    #[must_use]
    pub fn with_field(mut self, name: &str, ty: TypeAnnotation) -> Self {
        self.fields.push((name.to_string(), ty));
        self
    }

    #[must_use]
    pub fn with_method(mut self, method: ForeignFunction) -> Self {
        self.methods.push(method);
        self
    }
}

impl ForeignFunction {
    #[must_use]
    pub fn new(name: &str, parameters: Vec<TypeAnnotation>, returns: TypeAnnotation) -> Self {
        Self {
            name: name.to_string(),
            parameters,
            returns,
        }
    }

    fn signature(&self) -> TypeAnnotation {
        TypeAnnotation::function(&self.name, self.parameters.clone(), self.returns.clone())
    }
}

/// Loader backed by a map from dotted path to module. The default instance
/// knows no modules.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLoader {
    modules: FxHashMap<String, LoadedModule>,
}

impl InMemoryLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_source(mut self, path: &str, file: Rc<SourceFile>) -> Self {
        self.modules
            .insert(path.to_string(), LoadedModule::Source(file));
        self
    }

    #[must_use]
    pub fn with_foreign(mut self, path: &str, module: ForeignModule) -> Self {
        self.modules
            .insert(path.to_string(), LoadedModule::Foreign(module));
        self
    }
}

impl ModuleLoader for InMemoryLoader {
    fn load(&self, path: &[String], _foreign: bool) -> anyhow::Result<LoadedModule> {
        let key = path.join(".");
        self.modules
            .get(&key)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("module `{key}` not found"))
    }
}

/// Copies symbols into the import scope of one unit, recording each under its
/// new id.
pub(crate) struct ImportMerger<'a> {
    table: &'a SymbolTable,
    ids: &'a IdAllocator,
    symbols: &'a mut FxHashMap<u32, SymbolRef>,
}

impl<'a> ImportMerger<'a> {
    pub(crate) fn new(
        table: &'a SymbolTable,
        ids: &'a IdAllocator,
        symbols: &'a mut FxHashMap<u32, SymbolRef>,
    ) -> Self {
        Self {
            table,
            ids,
            symbols,
        }
    }

    fn remap(&mut self, symbol: &SymbolRef, extra: Modifiers) -> SymbolRef {
        let copy = Rc::new(symbol.remapped(self.ids.allocate(), extra | Modifiers::IMPORTED));
        self.symbols.insert(copy.id(), copy.clone());
        copy
    }

    fn fresh(&mut self, symbol: Symbol) -> SymbolRef {
        let symbol = Rc::new(symbol.bound(self.ids.allocate()));
        self.symbols.insert(symbol.id(), symbol.clone());
        symbol
    }

    /// Copies the public namespaces and public type bodies of `exported`.
    pub(crate) fn merge_source(&mut self, exported: &ScopeRef, target: &ScopeRef) -> Result<(), Abort> {
        let (values, types, bodies) = {
            let exported = exported.borrow();
            let values: Vec<SymbolRef> = exported
                .values()
                .filter(|s| s.modifiers.contains(Modifiers::PUBLIC) && s.kind != SymbolKind::Import)
                .cloned()
                .collect();
            let types: Vec<SymbolRef> = exported
                .types()
                .filter(|s| s.modifiers.contains(Modifiers::PUBLIC))
                .cloned()
                .collect();
            let bodies: Vec<ScopeRef> = exported
                .children()
                .iter()
                .filter(|child| {
                    let child = child.borrow();
                    child.kind == ScopeKind::TypeBody
                        && types.iter().any(|t| t.name == child.name)
                })
                .cloned()
                .collect();
            (values, types, bodies)
        };
        for symbol in &values {
            let copy = self.remap(symbol, Modifiers::empty());
            target.borrow_mut().declare_value(copy).map_err(Abort::Fatal)?;
        }
        for symbol in &types {
            let copy = self.remap(symbol, Modifiers::empty());
            target.borrow_mut().declare_type(copy).map_err(Abort::Fatal)?;
        }
        for body in &bodies {
            self.merge_type_body(body, target)?;
        }
        tracing::debug!(
            values = values.len(),
            types = types.len(),
            "merged source import"
        );
        Ok(())
    }

    fn merge_type_body(&mut self, body: &ScopeRef, target: &ScopeRef) -> Result<(), Abort> {
        let template = body.borrow().detached_clone();
        let mut copy = self.table.new_scope(&template.name, ScopeKind::TypeBody);
        copy.foreign = template.foreign;
        for symbol in template.values() {
            let remapped = self.remap(symbol, Modifiers::empty());
            copy.declare_value(remapped).map_err(Abort::Fatal)?;
        }
        for symbol in template.types() {
            let remapped = self.remap(symbol, Modifiers::empty());
            copy.declare_type(remapped).map_err(Abort::Fatal)?;
        }
        Scope::attach(target, copy);
        Ok(())
    }

    /// Materializes a foreign module description.
    pub(crate) fn merge_foreign(
        &mut self,
        module: &ForeignModule,
        target: &ScopeRef,
        location: &Location,
    ) -> Result<(), Abort> {
        let foreign = Modifiers::FOREIGN | Modifiers::PUBLIC | Modifiers::IMPORTED;
        for function in &module.functions {
            let symbol = self.fresh(
                Symbol::new(
                    &function.name,
                    SymbolKind::Function,
                    TypeSlot::new(function.signature()),
                    location.clone(),
                )
                .with_modifiers(foreign),
            );
            target.borrow_mut().declare_value(symbol).map_err(Abort::Fatal)?;
        }
        for ty in &module.types {
            let symbol = self.fresh(
                Symbol::new(
                    &ty.name,
                    SymbolKind::Struct,
                    TypeSlot::new(TypeAnnotation::simple(&ty.name)),
                    location.clone(),
                )
                .with_modifiers(foreign),
            );
            target.borrow_mut().declare_type(symbol).map_err(Abort::Fatal)?;

            let mut body = self.table.new_scope(&ty.name, ScopeKind::TypeBody);
            body.foreign = true;
            for (name, field_type) in &ty.fields {
                let field = self.fresh(
                    Symbol::new(
                        name,
                        SymbolKind::Field,
                        TypeSlot::new(field_type.clone()),
                        location.clone(),
                    )
                    .with_modifiers(foreign | Modifiers::MUTABLE),
                );
                body.declare_value(field).map_err(Abort::Fatal)?;
            }
            for method in &ty.methods {
                let method = self.fresh(
                    Symbol::new(
                        &method.name,
                        SymbolKind::Method,
                        TypeSlot::new(method.signature()),
                        location.clone(),
                    )
                    .with_modifiers(foreign),
                );
                body.declare_value(method).map_err(Abort::Fatal)?;
            }
            Scope::attach(target, body);
        }
        tracing::debug!(
            functions = module.functions.len(),
            types = module.types.len(),
            "merged foreign import"
        );
        Ok(())
    }
}
