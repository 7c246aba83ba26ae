use rustc_hash::FxHashSet;

use crate::errors::{Abort, AnalysisError, ErrorClass, SemaError};

/// Collects the diagnostics of one unit.
///
/// Fatal classes are returned as [`Abort::Fatal`] so the caller can unwind with
/// `?`; everything else is stored and the walk continues.
#[derive(Debug, Default)]
pub(crate) struct Diagnostics {
    errors: Vec<SemaError>,
    warnings: Vec<SemaError>,
    reported_error_keys: FxHashSet<String>,
}

impl Diagnostics {
    pub(crate) fn report(&mut self, error: SemaError) -> Result<(), Abort> {
        match error.class() {
            class if class.is_fatal() => return Err(Abort::Fatal(error)),
            ErrorClass::Warning => {
                tracing::debug!(code = error.code(), "{error}");
                self.warnings.push(error);
                return Ok(());
            }
            _ => {}
        }
        if let Some(key) = Self::dedup_key(&error) {
            if self.reported_error_keys.contains(&key) {
                return Ok(());
            }
            self.reported_error_keys.insert(key);
        }
        tracing::debug!(code = error.code(), "{error}");
        self.errors.push(error);
        Ok(())
    }

    /// Several passes may trip over the same unresolved name at the same spot.
    fn dedup_key(error: &SemaError) -> Option<String> {
        match error {
            SemaError::NotDeclared { name, location, .. } => {
                Some(format!("NotDeclared:{name}@{location}"))
            }
            SemaError::UsedBeforeDeclared { name, location } => {
                Some(format!("UsedBeforeDeclared:{name}@{location}"))
            }
            SemaError::UnknownType { name, location } => {
                Some(format!("UnknownType:{name}@{location}"))
            }
            SemaError::CannotInfer { location, .. } => Some(format!("CannotInfer@{location}")),
            _ => None,
        }
    }

    #[must_use = "this is a pure check with no side effects"]
    pub(crate) fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Turns an aborted walk into the unit's final error.
    pub(crate) fn into_abort_error(self, abort: Abort) -> AnalysisError {
        let mut diagnostics = self.errors;
        let internal = match abort {
            Abort::Fatal(error) => {
                diagnostics.push(error);
                None
            }
            Abort::Internal(internal) => Some(internal),
        };
        AnalysisError {
            diagnostics,
            internal,
        }
    }

    /// Finishes a walk that ran to the end.
    pub(crate) fn finish(self) -> Result<Vec<SemaError>, AnalysisError> {
        if self.errors.is_empty() {
            Ok(self.warnings)
        } else {
            Err(AnalysisError {
                diagnostics: self.errors,
                internal: None,
            })
        }
    }
}
