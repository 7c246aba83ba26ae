//! Analysis Session
//!
//! A session owns the id allocator, the scope forest and the module loader.
//! Every unit it analyses, including units pulled in by imports, gets its
//! module scope under the same global root and its ids from the same
//! allocator.
//!
//! Per unit the passes run in a fixed order:
//!
//! 1. scope skeleton,
//! 2. imports (source imports are analysed recursively and cached),
//! 3. name binding,
//! 4. type checking with inference, closure parameters and captures,
//! 5. definite assignment, when enabled,
//! 6. a final sweep for declarations whose type was never inferred.

use std::rc::Rc;

use rustc_hash::FxHashMap;
use tern_ast::nodes::{ImportDefinition, SourceFile};

use crate::{
    binder::Binder,
    checker::TypeChecker,
    diagnostics::Diagnostics,
    errors::{Abort, AnalysisError, InternalError, SemaError},
    flow::FlowChecker,
    ids::IdAllocator,
    imports::{ImportMerger, LoadedModule, ModuleLoader},
    options::AnalysisOptions,
    scope::{ScopeKind, ScopeRef},
    skeleton::ScopeBuilder,
    symbol::SymbolRef,
    symbol_table::SymbolTable,
    typed_context::{find_placeholders, AnalyzedModule, ModuleTables},
};

/// The dotted path under which a unit named `name` is imported: directory
/// separators become dots and a trailing `.tn` is dropped.
fn unit_key(name: &str) -> String {
    name.strip_suffix(".tn")
        .unwrap_or(name)
        .replace(['/', '\\'], ".")
}

/// A unit whose analysis has started but not finished.
struct InProgress {
    key: String,
    file: Rc<SourceFile>,
}

impl InProgress {
    fn new(key: String, file: &Rc<SourceFile>) -> Self {
        Self {
            key,
            file: file.clone(),
        }
    }

    fn is(&self, key: &str, file: &Rc<SourceFile>) -> bool {
        self.key == key || Rc::ptr_eq(&self.file, file)
    }
}

/// Why an imported source unit could not be used.
enum ImportFailure {
    Cycle,
    Failed(String),
}

pub struct Session {
    ids: IdAllocator,
    table: SymbolTable,
    loader: Box<dyn ModuleLoader>,
    options: AnalysisOptions,
    /// Module scopes of imported units, by dotted path.
    cache: FxHashMap<String, ScopeRef>,
    in_progress: Vec<InProgress>,
}

impl Session {
    /// Creates a session with its own id space and native table.
    ///
    /// # Errors
    ///
    /// Fails if the native table cannot be materialized.
    pub fn new(options: AnalysisOptions, loader: Box<dyn ModuleLoader>) -> anyhow::Result<Self> {
        let ids = IdAllocator::new();
        let table = SymbolTable::new(&ids)?;
        Ok(Self {
            ids,
            table,
            loader,
            options,
            cache: FxHashMap::default(),
            in_progress: Vec::new(),
        })
    }

    #[must_use = "this is a pure lookup with no side effects"]
    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    #[must_use = "this is a pure lookup with no side effects"]
    pub fn symbol_table(&self) -> &SymbolTable {
        &self.table
    }

    #[must_use = "this is a pure lookup with no side effects"]
    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Analyses one unit.
    ///
    /// # Errors
    ///
    /// Returns an [`AnalysisError`] wrapped in [`anyhow::Error`] when the unit
    /// has errors. Warnings alone do not fail the analysis.
    pub fn analyze(&mut self, file: Rc<SourceFile>) -> anyhow::Result<AnalyzedModule> {
        self.in_progress
            .push(InProgress::new(unit_key(&file.name), &file));
        let result = self.run_unit(file);
        self.in_progress.pop();
        result.map_err(anyhow::Error::new)
    }

    #[tracing::instrument(skip_all, fields(unit = %file.name))]
    fn run_unit(&mut self, file: Rc<SourceFile>) -> Result<AnalyzedModule, AnalysisError> {
        let module = self.table.new_module(&file.name);
        let mut diagnostics = Diagnostics::default();
        let mut tables = ModuleTables::default();
        if let Err(abort) = self.passes(&file, &module, &mut diagnostics, &mut tables) {
            if let Abort::Internal(internal) = &abort {
                tracing::error!(%internal, "analysis aborted");
            }
            return Err(diagnostics.into_abort_error(abort));
        }
        let warnings = diagnostics.finish()?;
        tracing::debug!(warnings = warnings.len(), "unit analysed");
        Ok(AnalyzedModule::new(file, module, tables, warnings))
    }

    fn passes(
        &mut self,
        file: &SourceFile,
        module: &ScopeRef,
        diagnostics: &mut Diagnostics,
        tables: &mut ModuleTables,
    ) -> Result<(), Abort> {
        ScopeBuilder::new(&self.table, module.clone()).build(file)?;
        self.resolve_imports(file, module, diagnostics, &mut tables.symbols)?;

        let bound = Binder::new(&self.ids, &self.options, diagnostics, module.clone()).bind(file)?;
        tables.symbols.extend(bound.symbols);
        tables.binder_trace = bound.trace;

        let checker_trace =
            TypeChecker::new(&self.options, diagnostics, module.clone(), tables).check(file)?;
        tables.checker_trace = checker_trace;

        if self.options.flow_check {
            FlowChecker::new(diagnostics).check(file)?;
        }
        if !diagnostics.has_errors() {
            for site in find_placeholders(file) {
                diagnostics.report(SemaError::CannotInfer {
                    what: site.what,
                    location: site.location,
                })?;
            }
        }
        Ok(())
    }

    fn resolve_imports(
        &mut self,
        file: &SourceFile,
        module: &ScopeRef,
        diagnostics: &mut Diagnostics,
        symbols: &mut FxHashMap<u32, SymbolRef>,
    ) -> Result<(), Abort> {
        for import in file.imports() {
            let target = module
                .borrow()
                .child_named(ScopeKind::Import, &import.alias())
                .ok_or_else(|| InternalError::MissingChildScope {
                    parent: module.borrow().name.clone(),
                    expected: ScopeKind::Import,
                })?;
            let loaded = match self.loader.load(&import.path, import.foreign) {
                Ok(loaded) => loaded,
                Err(error) => {
                    diagnostics.report(SemaError::UnresolvedImport {
                        path: import.path_string(),
                        reason: format!("{error:#}"),
                        location: import.location.clone(),
                    })?;
                    continue;
                }
            };
            match loaded {
                LoadedModule::Foreign(foreign) => {
                    target.borrow_mut().foreign = true;
                    ImportMerger::new(&self.table, &self.ids, symbols).merge_foreign(
                        &foreign,
                        &target,
                        &import.location,
                    )?;
                }
                LoadedModule::Source(source) => {
                    let Some(exported) = self.import_source(&import, source, diagnostics)? else {
                        continue;
                    };
                    ImportMerger::new(&self.table, &self.ids, symbols)
                        .merge_source(&exported, &target)?;
                }
            }
            tracing::debug!(path = %import.path_string(), alias = %import.alias(), "import resolved");
        }
        Ok(())
    }

    /// The module scope of an imported source unit, analysing it on first use.
    fn import_source(
        &mut self,
        import: &ImportDefinition,
        source: Rc<SourceFile>,
        diagnostics: &mut Diagnostics,
    ) -> Result<Option<ScopeRef>, Abort> {
        let key = import.path_string();
        let failure = match self.load_source(&key, source) {
            Ok(scope) => return Ok(Some(scope)),
            Err(failure) => failure,
        };
        let error = match failure {
            ImportFailure::Cycle => SemaError::ImportCycle {
                path: key,
                location: import.location.clone(),
            },
            ImportFailure::Failed(reason) => SemaError::UnresolvedImport {
                path: key,
                reason,
                location: import.location.clone(),
            },
        };
        diagnostics.report(error)?;
        Ok(None)
    }

    fn load_source(&mut self, key: &str, source: Rc<SourceFile>) -> Result<ScopeRef, ImportFailure> {
        if let Some(scope) = self.cache.get(key) {
            return Ok(scope.clone());
        }
        if self.in_progress.iter().any(|unit| unit.is(key, &source)) {
            return Err(ImportFailure::Cycle);
        }
        self.in_progress.push(InProgress::new(key.to_string(), &source));
        let result = self.run_unit(source);
        self.in_progress.pop();
        let analysed = result.map_err(|error| ImportFailure::Failed(error.to_string()))?;
        let scope = analysed.module_scope();
        self.cache.insert(key.to_string(), scope.clone());
        Ok(scope)
    }
}
