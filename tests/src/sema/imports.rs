/// Tests for imports
///
/// Source imports are analysed once per session and expose their public
/// declarations under the import alias; foreign imports materialize the
/// types and functions their description lists.
#[cfg(test)]
mod import_tests {
    use std::rc::Rc;

    use pretty_assertions::assert_eq;
    use tern_ast::builder::AstBuilder;
    use tern_ast::nodes::SourceFile;
    use tern_ast::types::TypeAnnotation;
    use tern_sema::{AnalysisOptions, InMemoryLoader, Session};

    use crate::utils::{analysis_error, error_codes, try_analyze_loaded};

    /// `util`: a public `double`, a private `helper` and a public enum `Color`.
    fn util_unit() -> Rc<SourceFile> {
        let b = AstBuilder::new("util");
        b.source_file(vec![
            b.pub_function(
                "double",
                vec![b.param("n", Some(TypeAnnotation::int()))],
                Some(TypeAnnotation::int()),
                vec![b.ret(Some(b.add(b.ident("n"), b.ident("n"))))],
            ),
            b.function("helper", vec![], None, vec![]),
            b.enumeration(
                "Color",
                None,
                vec![b.case("Red", vec![], None), b.case("Blue", vec![], None)],
            ),
        ])
    }

    fn util_loader() -> InMemoryLoader {
        InMemoryLoader::new().with_source("util", util_unit())
    }

    fn analyze(file: &Rc<SourceFile>, loader: InMemoryLoader) -> anyhow::Result<tern_sema::AnalyzedModule> {
        try_analyze_loaded(file, AnalysisOptions::default(), loader)
    }

    #[test]
    fn test_public_function_through_alias() {
        let b = AstBuilder::new("main");
        let file = b.source_file(vec![
            b.import(&["util"], "u", false),
            b.function(
                "main",
                vec![],
                None,
                vec![b.let_(
                    "result",
                    None,
                    b.call(b.member(b.ident("u"), "double"), vec![b.int(2)]),
                )],
            ),
        ]);

        let module = analyze(&file, util_loader()).unwrap();

        assert_eq!(
            module.symbols_named("result")[0].type_annotation(),
            TypeAnnotation::int()
        );
    }

    #[test]
    fn test_imported_enum_case_path() {
        let b = AstBuilder::new("main");
        let file = b.source_file(vec![
            b.import(&["util"], "u", false),
            b.function(
                "main",
                vec![],
                None,
                vec![b.let_("color", None, b.path(&["u", "Color", "Blue"]))],
            ),
        ]);

        let module = analyze(&file, util_loader()).unwrap();

        assert_eq!(
            module.symbols_named("color")[0].type_annotation(),
            TypeAnnotation::simple("Color")
        );
    }

    #[test]
    fn test_private_function_is_not_exported() {
        let b = AstBuilder::new("main");
        let file = b.source_file(vec![
            b.import(&["util"], "u", false),
            b.function(
                "main",
                vec![],
                None,
                vec![b.expr(b.call(b.member(b.ident("u"), "helper"), vec![]))],
            ),
        ]);

        let codes = error_codes(analyze(&file, util_loader()));

        assert_eq!(codes[0], "E0201");
    }

    #[test]
    fn test_unknown_module() {
        let b = AstBuilder::new("main");
        let file = b.source_file(vec![
            b.import(&["nowhere"], "n", false),
            b.function("main", vec![], None, vec![]),
        ]);

        let error = analysis_error(analyze(&file, InMemoryLoader::new()));

        assert_eq!(error.codes(), vec!["E0204"]);
        assert!(error.to_string().contains("module `nowhere` not found"));
    }

    #[test]
    fn test_import_cycle() {
        let a = AstBuilder::new("a");
        let unit_a = a.source_file(vec![
            a.import(&["b"], "b", false),
            a.function("main", vec![], None, vec![]),
        ]);
        let b = AstBuilder::new("b");
        let unit_b = b.source_file(vec![b.import(&["a"], "a", false)]);
        let loader = InMemoryLoader::new()
            .with_source("a", unit_a.clone())
            .with_source("b", unit_b);

        let error = analysis_error(analyze(&unit_a, loader));

        assert_eq!(error.codes(), vec!["E0204"]);
        assert!(error.to_string().contains("import of `a` forms a cycle"));
    }

    #[test]
    fn test_cycle_back_to_root_file() {
        let unit_a = |name: &str| {
            let a = AstBuilder::new(name);
            a.source_file(vec![
                a.import(&["b"], "b", false),
                a.function("main", vec![], None, vec![]),
            ])
        };
        let b = AstBuilder::new("b.tn");
        let unit_b = b.source_file(vec![b.import(&["a"], "a", false)]);
        let loader = InMemoryLoader::new()
            .with_source("a", unit_a("a.tn"))
            .with_source("b", unit_b);

        let error = analysis_error(analyze(&unit_a("a.tn"), loader));

        assert_eq!(error.codes(), vec!["E0204"]);
        let message = error.to_string();
        assert!(message.contains("import of `a` forms a cycle"), "{message}");
        assert!(!message.contains("import of `b` forms a cycle"), "{message}");
    }

    #[test]
    fn test_failing_import_reports_its_diagnostics() {
        let broken = AstBuilder::new("broken");
        let broken_unit = broken.source_file(vec![broken.pub_function(
            "oops",
            vec![],
            None,
            vec![broken.expr(broken.ident("ghost"))],
        )]);
        let b = AstBuilder::new("main");
        let file = b.source_file(vec![
            b.import(&["broken"], "broken", false),
            b.function("main", vec![], None, vec![]),
        ]);

        let error = analysis_error(analyze(
            &file,
            InMemoryLoader::new().with_source("broken", broken_unit),
        ));

        assert_eq!(error.codes(), vec!["E0204"]);
        assert!(error.to_string().contains("`ghost` is not declared"));
    }

    #[test]
    fn test_session_shares_ids_and_import_cache() {
        let mut session =
            Session::new(AnalysisOptions::default(), Box::new(util_loader())).unwrap();
        let unit = |name: &str| {
            let b = AstBuilder::new(name);
            b.source_file(vec![
                b.import(&["util"], "u", false),
                b.function(
                    "main",
                    vec![],
                    None,
                    vec![b.expr(b.call(b.member(b.ident("u"), "double"), vec![b.int(1)]))],
                ),
            ])
        };

        let first = session.analyze(unit("first")).unwrap();
        let second = session.analyze(unit("second")).unwrap();

        let first_main = first.symbols_named("main")[0].id();
        let second_main = second.symbols_named("main")[0].id();
        assert_ne!(first_main, second_main);
        assert!(first.symbols().iter().all(|symbol| second.symbol(symbol.id()).is_none()));
    }
}
