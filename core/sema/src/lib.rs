#![warn(clippy::pedantic)]
//! Semantic analysis front end for Tern.
//!
//! Given a syntax tree, analysis builds the scope forest, binds every
//! identifier to a symbol, checks and infers types (including closure
//! parameters and captures) and reports the problems it finds, grouped by
//! class. The tree is annotated in place; side tables are returned in an
//! [`AnalyzedModule`].
//!
//! ```ignore
//! let module = AnalyzerBuilder::new()
//!     .with_options(AnalysisOptions::default().with_flow_check(true))
//!     .analyze(&file)?
//!     .module();
//! ```

mod binder;
mod checker;
mod closure_inspector;
mod closure_params;
pub mod compat;
mod cursor;
mod diagnostics;
pub mod errors;
mod flow;
pub mod ids;
pub mod imports;
mod inference;
pub mod natives;
mod null_context;
pub mod options;
pub mod scope;
pub mod session;
mod skeleton;
pub mod symbol;
pub mod symbol_table;
pub mod typed_context;
mod walk;

use std::rc::Rc;

use tern_ast::nodes::SourceFile;

pub use crate::{
    compat::{Compatibility, compatibility},
    errors::{AnalysisError, ErrorClass, InternalError, MismatchContext, SemaError},
    imports::{
        ForeignFunction, ForeignModule, ForeignType, InMemoryLoader, LoadedModule, ModuleLoader,
    },
    options::AnalysisOptions,
    scope::{Scope, ScopeKind, ScopeRef},
    session::Session,
    symbol::{Modifiers, Symbol, SymbolKind, SymbolRef},
    typed_context::{AnalyzedModule, PlaceholderSite},
};

/// Analyzer still being configured.
pub struct Configuring {
    options: AnalysisOptions,
    loader: Box<dyn ModuleLoader>,
}

/// Analyzer holding a successfully analysed module.
pub struct Analyzed {
    module: AnalyzedModule,
}

/// One-shot analysis of a single unit.
///
/// For several units sharing one id space, use a [`Session`] directly.
pub struct AnalyzerBuilder<S> {
    state: S,
}

impl Default for AnalyzerBuilder<Configuring> {
    fn default() -> Self {
        AnalyzerBuilder {
            state: Configuring {
                options: AnalysisOptions::default(),
                loader: Box::new(InMemoryLoader::new()),
            },
        }
    }
}

impl AnalyzerBuilder<Configuring> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_options(mut self, options: AnalysisOptions) -> Self {
        self.state.options = options;
        self
    }

    #[must_use]
    pub fn with_loader(mut self, loader: impl ModuleLoader + 'static) -> Self {
        self.state.loader = Box::new(loader);
        self
    }

    /// Runs every pass over `file`.
    ///
    /// # Errors
    ///
    /// Returns an error wrapping [`AnalysisError`] if the unit has errors.
    #[must_use = "returns builder with the analysed module, extract with .module()"]
    pub fn analyze(self, file: &Rc<SourceFile>) -> anyhow::Result<AnalyzerBuilder<Analyzed>> {
        let Configuring { options, loader } = self.state;
        let mut session = Session::new(options, loader)?;
        let module = session.analyze(file.clone())?;
        Ok(AnalyzerBuilder {
            state: Analyzed { module },
        })
    }
}

impl AnalyzerBuilder<Analyzed> {
    #[must_use = "consumes builder and returns the analysed module"]
    pub fn module(self) -> AnalyzedModule {
        self.state.module
    }
}
