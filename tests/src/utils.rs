use std::rc::Rc;

use tern_ast::nodes::{Identifier, Pattern, SourceFile};
use tern_sema::{
    AnalysisError, AnalysisOptions, AnalyzedModule, AnalyzerBuilder, InMemoryLoader, SymbolRef,
};

pub(crate) fn try_analyze(file: &Rc<SourceFile>) -> anyhow::Result<AnalyzedModule> {
    try_analyze_with(file, AnalysisOptions::default())
}

pub(crate) fn try_analyze_with(
    file: &Rc<SourceFile>,
    options: AnalysisOptions,
) -> anyhow::Result<AnalyzedModule> {
    try_analyze_loaded(file, options, InMemoryLoader::new())
}

pub(crate) fn try_analyze_loaded(
    file: &Rc<SourceFile>,
    options: AnalysisOptions,
    loader: InMemoryLoader,
) -> anyhow::Result<AnalyzedModule> {
    Ok(AnalyzerBuilder::new()
        .with_options(options)
        .with_loader(loader)
        .analyze(file)?
        .module())
}

/// Analyses `file` and panics with the diagnostics if it fails.
pub(crate) fn analyze(file: &Rc<SourceFile>) -> AnalyzedModule {
    match try_analyze(file) {
        Ok(module) => module,
        Err(error) => panic!("analysis failed: {error}"),
    }
}

/// The analysis error of a failed run.
pub(crate) fn analysis_error(result: anyhow::Result<AnalyzedModule>) -> AnalysisError {
    match result {
        Ok(_) => panic!("analysis succeeded, expected errors"),
        Err(error) => match error.downcast::<AnalysisError>() {
            Ok(analysis) => analysis,
            Err(other) => panic!("unexpected error type: {other}"),
        },
    }
}

pub(crate) fn error_codes(result: anyhow::Result<AnalyzedModule>) -> Vec<&'static str> {
    analysis_error(result).codes()
}

/// The identifier a single binding pattern introduces.
pub(crate) fn binding_name(pattern: &Pattern) -> Rc<Identifier> {
    match pattern {
        Pattern::Binding(binding) => binding.name.clone(),
        other => panic!("expected a binding pattern, got {other:?}"),
    }
}

pub(crate) fn bound_symbol(module: &AnalyzedModule, identifier: &Identifier) -> SymbolRef {
    let id = identifier.symbol_id();
    assert_ne!(id, 0, "`{}` was never bound", identifier.name);
    module
        .symbol(id)
        .unwrap_or_else(|| panic!("no symbol with id {id} for `{}`", identifier.name))
}
