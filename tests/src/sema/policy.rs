/// Tests for mutability and entry-point policies
///
/// Policy violations are fatal: the first one ends the analysis.
#[cfg(test)]
mod policy_tests {
    use std::rc::Rc;

    use pretty_assertions::assert_eq;
    use tern_ast::builder::AstBuilder;
    use tern_ast::nodes::{Item, SourceFile, Statement};
    use tern_ast::types::TypeAnnotation;
    use tern_sema::AnalysisOptions;

    use crate::utils::{error_codes, try_analyze, try_analyze_with};

    fn main_only(b: &AstBuilder, body: Vec<Statement>) -> Rc<SourceFile> {
        b.source_file(vec![b.function("main", vec![], None, body)])
    }

    /// `struct Counter { mut count: int, label: string }` with a mutating `bump`
    /// and a read-only `peek`.
    fn counter(b: &AstBuilder, bump_is_mutating: bool) -> Item {
        let increment = b.assign(
            b.member(b.ident("self"), "count"),
            b.add(b.member(b.ident("self"), "count"), b.int(1)),
        );
        b.structure(
            "Counter",
            &[],
            vec![
                b.field("count", TypeAnnotation::int(), true),
                b.field("label", TypeAnnotation::string(), false),
            ],
            vec![
                b.method("bump", vec![], None, vec![increment], bump_is_mutating),
                b.method(
                    "peek",
                    vec![],
                    Some(TypeAnnotation::int()),
                    vec![b.ret(Some(b.member(b.ident("self"), "count")))],
                    false,
                ),
            ],
        )
    }

    fn new_counter(b: &AstBuilder) -> tern_ast::nodes::Expression {
        b.construct(
            TypeAnnotation::simple("Counter"),
            vec![("count", b.int(0)), ("label", b.string("hits"))],
        )
    }

    #[test]
    fn test_assign_to_immutable_local() {
        let b = AstBuilder::new("main.tn");
        let file = main_only(
            &b,
            vec![b.let_("x", None, b.int(1)), b.assign(b.ident("x"), b.int(2))],
        );

        assert_eq!(error_codes(try_analyze(&file)), vec!["E0402"]);
    }

    #[test]
    fn test_assign_to_mutable_local() {
        let b = AstBuilder::new("main.tn");
        let file = main_only(
            &b,
            vec![b.let_mut("x", None, b.int(1)), b.assign(b.ident("x"), b.int(2))],
        );

        assert!(try_analyze(&file).is_ok());
    }

    #[test]
    fn test_assign_to_function() {
        let b = AstBuilder::new("main.tn");
        let file = b.source_file(vec![
            b.function("helper", vec![], None, vec![]),
            b.function("main", vec![], None, vec![b.assign(b.ident("helper"), b.int(2))]),
        ]);

        let result = try_analyze(&file);

        assert_eq!(error_codes(result), vec!["E0403"]);
    }

    #[test]
    fn test_field_write_through_immutable_binding() {
        let b = AstBuilder::new("main.tn");
        let file = b.source_file(vec![
            counter(&b, true),
            b.function(
                "main",
                vec![],
                None,
                vec![
                    b.let_("c", None, new_counter(&b)),
                    b.assign(b.member(b.ident("c"), "count"), b.int(5)),
                ],
            ),
        ]);

        assert_eq!(error_codes(try_analyze(&file)), vec!["E0402"]);
    }

    #[test]
    fn test_write_to_immutable_field() {
        let b = AstBuilder::new("main.tn");
        let file = b.source_file(vec![
            counter(&b, true),
            b.function(
                "main",
                vec![],
                None,
                vec![
                    b.let_mut("c", None, new_counter(&b)),
                    b.assign(b.member(b.ident("c"), "count"), b.int(5)),
                    b.assign(b.member(b.ident("c"), "label"), b.string("misses")),
                ],
            ),
        ]);

        assert_eq!(error_codes(try_analyze(&file)), vec!["E0402"]);
    }

    #[test]
    fn test_mutating_method_needs_mutable_receiver() {
        let b = AstBuilder::new("main.tn");
        let call_bump = |b: &AstBuilder| b.expr(b.call(b.member(b.ident("c"), "bump"), vec![]));

        let immutable = b.source_file(vec![
            counter(&b, true),
            b.function(
                "main",
                vec![],
                None,
                vec![b.let_("c", None, new_counter(&b)), call_bump(&b)],
            ),
        ]);
        assert_eq!(error_codes(try_analyze(&immutable)), vec!["E0404"]);

        let b = AstBuilder::new("main.tn");
        let mutable = b.source_file(vec![
            counter(&b, true),
            b.function(
                "main",
                vec![],
                None,
                vec![
                    b.let_mut("c", None, new_counter(&b)),
                    call_bump(&b),
                    b.let_("n", None, b.call(b.member(b.ident("c"), "peek"), vec![])),
                ],
            ),
        ]);
        assert!(try_analyze(&mutable).is_ok());
    }

    #[test]
    fn test_non_mutating_method_cannot_write_self() {
        let b = AstBuilder::new("main.tn");
        let file = b.source_file(vec![
            counter(&b, false),
            b.function("main", vec![], None, vec![]),
        ]);

        assert_eq!(error_codes(try_analyze(&file)), vec!["E0402"]);
    }

    #[test]
    fn test_push_on_immutable_array() {
        let b = AstBuilder::new("main.tn");
        let push = |b: &AstBuilder| b.expr(b.call(b.member(b.ident("xs"), "push"), vec![b.int(3)]));

        let immutable = main_only(
            &b,
            vec![b.let_("xs", None, b.array(vec![b.int(1), b.int(2)])), push(&b)],
        );
        assert_eq!(error_codes(try_analyze(&immutable)), vec!["E0404"]);

        let b = AstBuilder::new("main.tn");
        let mutable = main_only(
            &b,
            vec![
                b.let_mut("xs", None, b.array(vec![b.int(1), b.int(2)])),
                push(&b),
                b.let_("size", None, b.call(b.member(b.ident("xs"), "len"), vec![])),
            ],
        );
        assert!(try_analyze(&mutable).is_ok());
    }

    #[test]
    fn test_function_after_entry_point() {
        let b = AstBuilder::new("main.tn");
        let file = || {
            b.source_file(vec![
                b.function("main", vec![], None, vec![]),
                b.function("late", vec![], None, vec![]),
            ])
        };

        assert_eq!(error_codes(try_analyze(&file())), vec!["E0405"]);
        assert!(
            try_analyze_with(&file(), AnalysisOptions::default().with_entry_function(None)).is_ok()
        );
    }

    #[test]
    fn test_custom_entry_point() {
        let b = AstBuilder::new("main.tn");
        let file = b.source_file(vec![
            b.function("main", vec![], None, vec![]),
            b.function("start", vec![], None, vec![]),
        ]);

        let options = AnalysisOptions::default().with_entry_function(Some("start"));

        assert!(try_analyze_with(&file, options).is_ok());
    }

    #[test]
    fn test_first_policy_violation_stops_analysis() {
        let b = AstBuilder::new("main.tn");
        let file = main_only(
            &b,
            vec![
                b.let_("x", None, b.int(1)),
                b.assign(b.ident("x"), b.int(2)),
                b.assign(b.ident("x"), b.int(3)),
            ],
        );

        let codes = error_codes(try_analyze(&file));

        assert_eq!(codes, vec!["E0402"]);
    }
}
