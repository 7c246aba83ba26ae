/// Tests for definite assignment
///
/// A local declared without a value must be assigned on every path before
/// it is read, and may not be read after `delete` until assigned again.
#[cfg(test)]
mod flow_tests {
    use std::rc::Rc;

    use pretty_assertions::assert_eq;
    use tern_ast::builder::AstBuilder;
    use tern_ast::nodes::{BinaryOperator, LiteralValue, SourceFile, Statement};
    use tern_ast::types::TypeAnnotation;
    use tern_sema::AnalysisOptions;

    use crate::utils::{error_codes, try_analyze, try_analyze_with};

    fn main_only(b: &AstBuilder, body: Vec<Statement>) -> Rc<SourceFile> {
        b.source_file(vec![b.function(
            "main",
            vec![b.param("flag", Some(TypeAnnotation::boolean()))],
            None,
            body,
        )])
    }

    /// Codes reported with definite assignment enabled; empty on success.
    fn check(file: &Rc<SourceFile>) -> Vec<&'static str> {
        match try_analyze_with(file, AnalysisOptions::default().with_flow_check(true)) {
            Ok(_) => Vec::new(),
            result => error_codes(result),
        }
    }

    fn declare_x(b: &AstBuilder) -> Statement {
        b.declare("x", TypeAnnotation::int())
    }

    fn set_x(b: &AstBuilder, value: i128) -> Statement {
        b.assign(b.ident("x"), b.int(value))
    }

    fn read_x(b: &AstBuilder) -> Statement {
        b.expr(b.call(b.ident("print"), vec![b.ident("x")]))
    }

    #[test]
    fn test_assigned_before_read() {
        let b = AstBuilder::new("main.tn");
        let file = main_only(&b, vec![declare_x(&b), set_x(&b, 1), read_x(&b)]);

        assert_eq!(check(&file), Vec::<&str>::new());
    }

    #[test]
    fn test_read_before_assignment() {
        let b = AstBuilder::new("main.tn");
        let file = main_only(&b, vec![declare_x(&b), read_x(&b)]);

        assert_eq!(check(&file), vec!["E0318"]);
    }

    #[test]
    fn test_disabled_by_default() {
        let b = AstBuilder::new("main.tn");
        let file = main_only(&b, vec![declare_x(&b), read_x(&b)]);

        assert!(try_analyze(&file).is_ok());
    }

    #[test]
    fn test_if_without_else_may_skip_assignment() {
        let b = AstBuilder::new("main.tn");
        let file = main_only(
            &b,
            vec![declare_x(&b), b.if_(b.ident("flag"), vec![set_x(&b, 1)], None), read_x(&b)],
        );

        assert_eq!(check(&file), vec!["E0318"]);
    }

    #[test]
    fn test_both_branches_assign() {
        let b = AstBuilder::new("main.tn");
        let file = main_only(
            &b,
            vec![
                declare_x(&b),
                b.if_(b.ident("flag"), vec![set_x(&b, 1)], Some(vec![set_x(&b, 2)])),
                read_x(&b),
            ],
        );

        assert_eq!(check(&file), Vec::<&str>::new());
    }

    #[test]
    fn test_returning_branch_does_not_weaken_the_join() {
        let b = AstBuilder::new("main.tn");
        let file = main_only(
            &b,
            vec![
                declare_x(&b),
                b.if_(b.ident("flag"), vec![set_x(&b, 1)], Some(vec![b.ret(None)])),
                read_x(&b),
            ],
        );

        assert_eq!(check(&file), Vec::<&str>::new());
    }

    #[test]
    fn test_read_after_delete() {
        let b = AstBuilder::new("main.tn");
        let file = main_only(
            &b,
            vec![b.let_mut("x", None, b.int(1)), b.delete("x"), read_x(&b)],
        );

        assert_eq!(check(&file), vec!["E0319"]);
    }

    #[test]
    fn test_reassignment_after_delete() {
        let b = AstBuilder::new("main.tn");
        let file = main_only(
            &b,
            vec![b.let_mut("x", None, b.int(1)), b.delete("x"), set_x(&b, 2), read_x(&b)],
        );

        assert_eq!(check(&file), Vec::<&str>::new());
    }

    #[test]
    fn test_loop_exits_only_through_break() {
        let b = AstBuilder::new("main.tn");
        let file = main_only(
            &b,
            vec![declare_x(&b), b.loop_(vec![set_x(&b, 1), b.brk()]), read_x(&b)],
        );

        assert_eq!(check(&file), Vec::<&str>::new());
    }

    #[test]
    fn test_while_body_may_not_run() {
        let b = AstBuilder::new("main.tn");
        let file = main_only(
            &b,
            vec![declare_x(&b), b.while_(b.ident("flag"), vec![set_x(&b, 1)]), read_x(&b)],
        );

        assert_eq!(check(&file), vec!["E0318"]);
    }

    #[test]
    fn test_for_body_may_not_run() {
        let b = AstBuilder::new("main.tn");
        let file = main_only(
            &b,
            vec![
                declare_x(&b),
                b.for_(b.bind("item"), b.array(vec![b.int(1)]), vec![set_x(&b, 1)]),
                read_x(&b),
            ],
        );

        assert_eq!(check(&file), vec!["E0318"]);
    }

    #[test]
    fn test_delete_reaches_next_while_iteration() {
        let b = AstBuilder::new("main.tn");
        let file = main_only(
            &b,
            vec![
                b.let_mut("x", None, b.int(1)),
                b.while_(b.ident("flag"), vec![read_x(&b), b.delete("x")]),
            ],
        );

        assert_eq!(check(&file), vec!["E0319"]);
    }

    #[test]
    fn test_delete_reaches_next_loop_iteration() {
        let b = AstBuilder::new("main.tn");
        let file = main_only(
            &b,
            vec![
                b.let_mut("x", None, b.int(1)),
                b.loop_(vec![
                    read_x(&b),
                    b.delete("x"),
                    b.if_(b.ident("flag"), vec![b.brk()], None),
                ]),
            ],
        );

        assert_eq!(check(&file), vec!["E0319"]);
    }

    #[test]
    fn test_delete_reaches_while_condition() {
        let b = AstBuilder::new("main.tn");
        let file = main_only(
            &b,
            vec![
                b.let_mut("x", None, b.int(1)),
                b.while_(
                    b.binary(b.ident("x"), BinaryOperator::Gt, b.int(0)),
                    vec![b.delete("x")],
                ),
            ],
        );

        assert_eq!(check(&file), vec!["E0319"]);
    }

    #[test]
    fn test_reassigned_before_next_iteration() {
        let b = AstBuilder::new("main.tn");
        let file = main_only(
            &b,
            vec![
                b.let_mut("x", None, b.int(1)),
                b.while_(
                    b.ident("flag"),
                    vec![read_x(&b), b.delete("x"), set_x(&b, 2)],
                ),
                read_x(&b),
            ],
        );

        assert_eq!(check(&file), Vec::<&str>::new());
    }

    #[test]
    fn test_catch_sees_delete_in_try() {
        let b = AstBuilder::new("main.tn");
        let file = main_only(
            &b,
            vec![
                b.let_mut("x", None, b.int(1)),
                b.try_(
                    vec![b.delete("x"), b.throw(b.string("failed"))],
                    None,
                    vec![read_x(&b)],
                ),
            ],
        );

        assert_eq!(check(&file), vec!["E0319"]);
    }

    #[test]
    fn test_try_and_catch_both_assign() {
        let b = AstBuilder::new("main.tn");
        let file = main_only(
            &b,
            vec![
                declare_x(&b),
                b.try_(vec![set_x(&b, 1)], None, vec![set_x(&b, 2)]),
                read_x(&b),
            ],
        );

        assert_eq!(check(&file), Vec::<&str>::new());
    }

    #[test]
    fn test_catch_may_skip_assignment() {
        let b = AstBuilder::new("main.tn");
        let file = main_only(
            &b,
            vec![declare_x(&b), b.try_(vec![set_x(&b, 1)], None, vec![]), read_x(&b)],
        );

        assert_eq!(check(&file), vec!["E0318"]);
    }

    #[test]
    fn test_every_match_arm_assigns() {
        let b = AstBuilder::new("main.tn");
        let file = main_only(
            &b,
            vec![
                declare_x(&b),
                b.expr(b.match_(
                    b.int(3),
                    vec![
                        b.arm(b.literal_pattern(LiteralValue::Int(1)), None, vec![set_x(&b, 1)]),
                        b.arm(b.wildcard(), None, vec![set_x(&b, 2)]),
                    ],
                )),
                read_x(&b),
            ],
        );

        assert_eq!(check(&file), Vec::<&str>::new());
    }

    #[test]
    fn test_closure_reads_unassigned_local() {
        let b = AstBuilder::new("main.tn");
        let file = main_only(
            &b,
            vec![
                declare_x(&b),
                b.let_(
                    "f",
                    None,
                    b.closure(
                        vec![b.param("n", Some(TypeAnnotation::int()))],
                        None,
                        vec![b.expr(b.add(b.ident("n"), b.ident("x")))],
                    ),
                ),
                set_x(&b, 1),
            ],
        );

        assert_eq!(check(&file), vec!["E0318"]);
    }

    #[test]
    fn test_destructured_locals_are_assigned() {
        let b = AstBuilder::new("main.tn");
        let file = main_only(
            &b,
            vec![
                b.let_pattern(
                    b.tuple_pattern(vec![b.bind("a"), b.bind("c")]),
                    b.tuple(vec![b.int(1), b.string("one")]),
                ),
                b.expr(b.call(b.ident("print"), vec![b.ident("a")])),
                b.expr(b.call(b.ident("print"), vec![b.ident("c")])),
            ],
        );

        assert_eq!(check(&file), Vec::<&str>::new());
    }
}
