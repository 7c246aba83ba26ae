/// Knobs for one analysis run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// Reject local `let` bindings that reuse a module-level name.
    pub shadow_check: bool,
    /// Run the definite-assignment pass after type checking. Experimental.
    pub flow_check: bool,
    /// Name of the entry function, which must be the module's last function.
    /// `None` disables the ordering check.
    pub entry_function: Option<String>,
    /// Record the scope ids visited by the binder and the checker.
    pub record_scope_trace: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            shadow_check: true,
            flow_check: false,
            entry_function: Some("main".to_string()),
            record_scope_trace: false,
        }
    }
}

impl AnalysisOptions {
    #[must_use]
    pub fn with_shadow_check(mut self, enabled: bool) -> Self {
        self.shadow_check = enabled;
        self
    }

    #[must_use]
    pub fn with_flow_check(mut self, enabled: bool) -> Self {
        self.flow_check = enabled;
        self
    }

    #[must_use]
    pub fn with_entry_function(mut self, name: Option<&str>) -> Self {
        self.entry_function = name.map(ToString::to_string);
        self
    }

    #[must_use]
    pub fn with_scope_trace(mut self, enabled: bool) -> Self {
        self.record_scope_trace = enabled;
        self
    }
}
