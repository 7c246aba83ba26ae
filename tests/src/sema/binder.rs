/// Tests for name binding
///
/// Every declaration gets its own id, every reference carries the id of the
/// declaration it resolves to, and module-level items are visible regardless
/// of their order in the unit.
#[cfg(test)]
mod binder_tests {
    use std::rc::Rc;

    use pretty_assertions::assert_eq;
    use rustc_hash::FxHashSet;
    use tern_ast::builder::AstBuilder;
    use tern_ast::nodes::{Expression, Statement};
    use tern_ast::types::TypeAnnotation;
    use tern_sema::{AnalysisOptions, SymbolKind};

    use crate::utils::{
        analysis_error, analyze, binding_name, bound_symbol, error_codes, try_analyze,
        try_analyze_with,
    };

    #[test]
    fn test_let_chain_binds_distinct_ids() {
        let b = AstBuilder::new("main.tn");
        let x_pattern = b.bind("x");
        let y_pattern = b.bind("y");
        let x_ref = b.identifier("x");
        let file = b.source_file(vec![b.function(
            "main",
            vec![],
            None,
            vec![
                Statement::Let(b.let_statement(x_pattern.clone(), None, Some(b.int(1)), false)),
                Statement::Let(b.let_statement(
                    y_pattern.clone(),
                    None,
                    Some(b.add(Expression::Identifier(x_ref.clone()), b.int(2))),
                    false,
                )),
            ],
        )]);

        let module = analyze(&file);
        let x = bound_symbol(&module, &binding_name(&x_pattern));
        let y = bound_symbol(&module, &binding_name(&y_pattern));

        assert_ne!(x.id(), y.id());
        assert_eq!(x_ref.symbol_id(), x.id());
        assert_eq!(x.kind, SymbolKind::Variable);
        assert_eq!(x.type_annotation(), TypeAnnotation::int());
        assert_eq!(y.type_annotation(), TypeAnnotation::int());
    }

    #[test]
    fn test_declaration_ids_are_unique_across_the_unit() {
        let b = AstBuilder::new("main.tn");
        let file = b.source_file(vec![
            b.structure(
                "Point",
                &[],
                vec![
                    b.field("x", TypeAnnotation::int(), false),
                    b.field("y", TypeAnnotation::int(), false),
                ],
                vec![],
            ),
            b.function(
                "scale",
                vec![b.param("factor", Some(TypeAnnotation::int()))],
                Some(TypeAnnotation::int()),
                vec![
                    b.let_("x", None, b.int(2)),
                    b.ret(Some(b.add(b.ident("x"), b.ident("factor")))),
                ],
            ),
            b.function(
                "main",
                vec![],
                None,
                vec![
                    b.let_("x", None, b.call(b.ident("scale"), vec![b.int(3)])),
                    b.expr(b.call(b.ident("print"), vec![b.ident("x")])),
                ],
            ),
        ]);

        let module = analyze(&file);
        let symbols = module.symbols();
        let ids: FxHashSet<u32> = symbols.iter().map(|symbol| symbol.id()).collect();

        assert_eq!(ids.len(), symbols.len());
        assert!(!ids.contains(&0));
        assert_eq!(module.symbols_named("x").len(), 3);
    }

    #[test]
    fn test_functions_are_hoisted() {
        let b = AstBuilder::new("main.tn");
        let callee = b.identifier("second");
        let file = b.source_file(vec![
            b.function(
                "first",
                vec![],
                Some(TypeAnnotation::int()),
                vec![b.ret(Some(b.call(Expression::Identifier(callee.clone()), vec![])))],
            ),
            b.function(
                "second",
                vec![],
                Some(TypeAnnotation::int()),
                vec![b.ret(Some(b.int(2)))],
            ),
            b.function("main", vec![], None, vec![]),
        ]);

        let module = analyze(&file);
        let second = bound_symbol(&module, &callee);

        assert_eq!(second.kind, SymbolKind::Function);
        assert_eq!(second.name, "second");
    }

    #[test]
    fn test_nearest_declaration_wins() {
        let b = AstBuilder::new("main.tn");
        let inner_pattern = b.bind("value");
        let inner_ref = b.identifier("value");
        let file = b.source_file(vec![b.function(
            "main",
            vec![],
            None,
            vec![
                b.let_("value", None, b.int(1)),
                b.block(vec![
                    Statement::Let(b.let_statement(
                        inner_pattern.clone(),
                        None,
                        Some(b.string("inner")),
                        false,
                    )),
                    b.expr(b.call(b.ident("print"), vec![Expression::Identifier(inner_ref.clone())])),
                ]),
            ],
        )]);

        let module = analyze(&file);
        let inner = bound_symbol(&module, &binding_name(&inner_pattern));

        assert_eq!(inner_ref.symbol_id(), inner.id());
        assert_eq!(inner.type_annotation(), TypeAnnotation::string());
    }

    #[test]
    fn test_natives_resolve_without_import() {
        let b = AstBuilder::new("main.tn");
        let print = b.identifier("print");
        let file = b.source_file(vec![b.function(
            "main",
            vec![],
            None,
            vec![b.expr(b.call(Expression::Identifier(print.clone()), vec![b.string("hi")]))],
        )]);

        let module = analyze(&file);

        assert_ne!(print.symbol_id(), 0);
        // Natives live in the session's table, not in the unit's.
        assert!(module.symbol(print.symbol_id()).is_none());
    }

    #[test]
    fn test_undeclared_name_is_reported() {
        let b = AstBuilder::new("main.tn");
        let file = b.source_file(vec![b.function(
            "main",
            vec![],
            None,
            vec![b.expr(b.call(b.ident("print"), vec![b.ident("ghost")]))],
        )]);

        let error = analysis_error(try_analyze(&file));

        assert_eq!(error.codes(), vec!["E0201"]);
        assert!(
            error.to_string().contains("`ghost` is not declared"),
            "unexpected message: {error}"
        );
    }

    #[test]
    fn test_local_used_before_declared() {
        let b = AstBuilder::new("main.tn");
        let file = b.source_file(vec![b.function(
            "main",
            vec![],
            None,
            vec![
                b.expr(b.call(b.ident("print"), vec![b.ident("later")])),
                b.let_("later", None, b.int(1)),
            ],
        )]);

        assert_eq!(error_codes(try_analyze(&file)), vec!["E0202"]);
    }

    #[test]
    fn test_module_binding_used_before_declared() {
        let b = AstBuilder::new("main.tn");
        let file = b.source_file(vec![
            b.global("first", None, b.ident("second")),
            b.global("second", None, b.int(1)),
            b.function("main", vec![], None, vec![]),
        ]);

        assert_eq!(error_codes(try_analyze(&file)), vec!["E0202"]);
    }

    #[test]
    fn test_duplicate_declaration_is_fatal() {
        let b = AstBuilder::new("main.tn");
        let file = b.source_file(vec![b.function(
            "main",
            vec![],
            None,
            vec![b.let_("x", None, b.int(1)), b.let_("x", None, b.int(2))],
        )]);

        let error = analysis_error(try_analyze(&file));
        let duplicate = error.diagnostics.last().expect("a diagnostic");

        assert_eq!(duplicate.code(), "E0101");
        assert!(duplicate.secondary_location().is_some());
    }

    fn shadowing_unit(b: &AstBuilder) -> Rc<tern_ast::nodes::SourceFile> {
        b.source_file(vec![
            b.global("limit", None, b.int(10)),
            b.function(
                "main",
                vec![],
                None,
                vec![
                    b.let_("limit", None, b.int(3)),
                    b.expr(b.call(b.ident("print"), vec![b.ident("limit")])),
                ],
            ),
        ])
    }

    #[test]
    fn test_shadowing_a_module_binding_is_rejected() {
        let b = AstBuilder::new("main.tn");
        let file = shadowing_unit(&b);

        assert_eq!(error_codes(try_analyze(&file)), vec!["E0102"]);
    }

    #[test]
    fn test_shadowing_is_accepted_with_the_check_off() {
        let b = AstBuilder::new("main.tn");
        let file = shadowing_unit(&b);

        let result = try_analyze_with(&file, AnalysisOptions::default().with_shadow_check(false));

        assert!(result.is_ok(), "shadowing should be accepted: {:?}", result.err());
    }
}
