/// Tests for error collection
///
/// Resolution and type errors are collected so one run reports as many as
/// it can; declaration and policy errors end the run at once, carrying what
/// was collected before them.
#[cfg(test)]
mod error_recovery_tests {
    use std::rc::Rc;

    use pretty_assertions::assert_eq;
    use tern_ast::builder::AstBuilder;
    use tern_ast::nodes::{SourceFile, Statement};
    use tern_ast::types::{PrimitiveKind, TypeAnnotation};
    use tern_sema::ErrorClass;

    use crate::utils::{analysis_error, error_codes, try_analyze};

    fn main_only(b: &AstBuilder, body: Vec<Statement>) -> Rc<SourceFile> {
        b.source_file(vec![b.function("main", vec![], None, body)])
    }

    fn print(b: &AstBuilder, name: &str) -> Statement {
        b.expr(b.call(b.ident("print"), vec![b.ident(name)]))
    }

    #[test]
    fn test_every_undeclared_name_is_reported() {
        let b = AstBuilder::new("main.tn");
        let file = main_only(&b, vec![print(&b, "alpha"), print(&b, "beta")]);

        let error = analysis_error(try_analyze(&file));

        assert_eq!(error.codes(), vec!["E0201", "E0201"]);
        let message = error.to_string();
        assert!(message.contains("`alpha`"));
        assert!(message.contains("`beta`"));
        assert!(!error.is_internal());
    }

    #[test]
    fn test_errors_across_functions() {
        let b = AstBuilder::new("main.tn");
        let file = b.source_file(vec![
            b.function("first", vec![], None, vec![print(&b, "ghost")]),
            b.function("main", vec![], None, vec![print(&b, "phantom")]),
        ]);

        assert_eq!(error_codes(try_analyze(&file)), vec!["E0201", "E0201"]);
    }

    #[test]
    fn test_resolution_and_type_errors_together() {
        let b = AstBuilder::new("main.tn");
        let file = main_only(
            &b,
            vec![
                print(&b, "ghost"),
                b.let_("count", Some(TypeAnnotation::int()), b.string("three")),
            ],
        );

        let error = analysis_error(try_analyze(&file));

        assert_eq!(error.codes(), vec!["E0201", "E0301"]);
        let classes: Vec<ErrorClass> = error.diagnostics.iter().map(|d| d.class()).collect();
        assert_eq!(classes, vec![ErrorClass::Resolution, ErrorClass::Type]);
    }

    #[test]
    fn test_fatal_error_keeps_what_was_collected() {
        let b = AstBuilder::new("main.tn");
        let file = main_only(&b, vec![print(&b, "unknown"), b.let_("x", None, b.null())]);

        assert_eq!(error_codes(try_analyze(&file)), vec!["E0201", "E0401"]);
    }

    #[test]
    fn test_fatal_error_stops_later_checks() {
        let b = AstBuilder::new("main.tn");
        let file = main_only(
            &b,
            vec![
                b.let_("x", None, b.null()),
                b.let_("count", Some(TypeAnnotation::int()), b.string("three")),
            ],
        );

        assert_eq!(error_codes(try_analyze(&file)), vec!["E0401"]);
    }

    #[test]
    fn test_duplicate_declaration_is_fatal() {
        let b = AstBuilder::new("main.tn");
        let file = b.source_file(vec![
            b.function("main", vec![], None, vec![print(&b, "ghost")]),
            b.function("main", vec![], None, vec![]),
        ]);

        let codes = error_codes(try_analyze(&file));

        assert_eq!(codes.last(), Some(&"E0101"));
        assert!(!codes.contains(&"E0201"));
    }

    #[test]
    fn test_same_name_reported_once_per_location() {
        let b = AstBuilder::new("main.tn");
        let file = main_only(&b, vec![b.let_("y", None, b.add(b.ident("ghost"), b.int(1)))]);

        assert_eq!(error_codes(try_analyze(&file)), vec!["E0201"]);
    }

    #[test]
    fn test_warnings_alone_do_not_fail() {
        let b = AstBuilder::new("main.tn");
        let file = main_only(
            &b,
            vec![
                b.let_("small", None, b.int(1)),
                b.let_(
                    "wide",
                    Some(TypeAnnotation::Primitive(PrimitiveKind::U64)),
                    b.ident("small"),
                ),
            ],
        );

        let module = try_analyze(&file).unwrap();

        assert_eq!(module.warnings().len(), 1);
        assert_eq!(module.warnings()[0].code(), "W0501");
    }
}
