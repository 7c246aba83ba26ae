/// Tests for type checking and inference
///
/// Placeholders are replaced from initializers, operands, sequence elements,
/// call arguments and field values; after a clean analysis none are left.
#[cfg(test)]
mod inference_tests {
    use pretty_assertions::assert_eq;
    use tern_ast::builder::AstBuilder;
    use tern_ast::nodes::{BinaryOperator, Expression, Statement};
    use tern_ast::types::{PrimitiveKind, TypeAnnotation};
    use tern_sema::{Compatibility, SemaError, compatibility};

    use crate::utils::{
        analysis_error, analyze, binding_name, bound_symbol, error_codes, try_analyze,
    };

    fn uint() -> TypeAnnotation {
        TypeAnnotation::Primitive(PrimitiveKind::U64)
    }

    /// `fn main() { <statements> }` with the declared binding of `name` exposed.
    fn binding_type(statements: Vec<Statement>, b: &AstBuilder, name: &str) -> TypeAnnotation {
        let pattern = b.bind(name);
        let mut body = statements;
        let last = body.pop().expect("a trailing initializer");
        let Statement::Expression(value) = last else {
            panic!("the last statement must be the initializer expression");
        };
        body.push(Statement::Let(b.let_statement(
            pattern.clone(),
            None,
            Some(value.expression.clone()),
            false,
        )));
        let file = b.source_file(vec![b.function("main", vec![], None, body)]);
        let module = analyze(&file);
        bound_symbol(&module, &binding_name(&pattern)).type_annotation()
    }

    #[test]
    fn test_tri_state_compatibility() {
        assert_eq!(
            compatibility(&TypeAnnotation::int(), &uint()),
            Compatibility::Intermediate
        );
        assert_eq!(
            compatibility(&TypeAnnotation::int(), &TypeAnnotation::simple("Point")),
            Compatibility::Incompatible
        );
        let t = TypeAnnotation::Parameter("T".to_string());
        assert_eq!(compatibility(&t, &t), Compatibility::Compatible);
    }

    #[test]
    fn test_array_literal_element_type() {
        let b = AstBuilder::new("main.tn");
        let ty = binding_type(vec![b.expr(b.array(vec![b.int(1), b.int(2), b.int(3)]))], &b, "xs");

        assert_eq!(ty, TypeAnnotation::array(TypeAnnotation::int()));
    }

    #[test]
    fn test_tuple_literal_type() {
        let b = AstBuilder::new("main.tn");
        let ty = binding_type(vec![b.expr(b.tuple(vec![b.int(1), b.string("a")]))], &b, "pair");

        assert_eq!(
            ty,
            TypeAnnotation::tuple(vec![TypeAnnotation::int(), TypeAnnotation::string()])
        );
    }

    #[test]
    fn test_comparison_yields_bool() {
        let b = AstBuilder::new("main.tn");
        let ty = binding_type(
            vec![b.expr(b.binary(b.int(1), BinaryOperator::Lt, b.int(2)))],
            &b,
            "smaller",
        );

        assert_eq!(ty, TypeAnnotation::boolean());
    }

    #[test]
    fn test_for_binding_takes_element_type() {
        let b = AstBuilder::new("main.tn");
        let item = b.bind("item");
        let file = b.source_file(vec![b.function(
            "main",
            vec![],
            None,
            vec![
                b.let_("words", None, b.array(vec![b.string("a"), b.string("b")])),
                b.for_(
                    item.clone(),
                    b.ident("words"),
                    vec![b.expr(b.call(b.ident("print"), vec![b.ident("item")]))],
                ),
            ],
        )]);

        let module = analyze(&file);

        assert_eq!(
            bound_symbol(&module, &binding_name(&item)).type_annotation(),
            TypeAnnotation::string()
        );
    }

    #[test]
    fn test_generic_function_result_is_substituted() {
        let b = AstBuilder::new("main.tn");
        let result = b.bind("greeting");
        let file = b.source_file(vec![
            b.generic_function(
                "identity",
                &["T"],
                vec![b.param("value", Some(TypeAnnotation::simple("T")))],
                Some(TypeAnnotation::simple("T")),
                vec![b.ret(Some(b.ident("value")))],
            ),
            b.function(
                "main",
                vec![],
                None,
                vec![Statement::Let(b.let_statement(
                    result.clone(),
                    None,
                    Some(b.call(b.ident("identity"), vec![b.string("hello")])),
                    false,
                ))],
            ),
        ]);

        let module = analyze(&file);

        assert_eq!(
            bound_symbol(&module, &binding_name(&result)).type_annotation(),
            TypeAnnotation::string()
        );
    }

    #[test]
    fn test_variadic_native_accepts_many_arguments() {
        let b = AstBuilder::new("main.tn");
        let ty = binding_type(
            vec![b.expr(b.call(
                b.ident("concat"),
                vec![b.string("a"), b.string("b"), b.string("c")],
            ))],
            &b,
            "joined",
        );

        assert_eq!(ty, TypeAnnotation::string());
    }

    #[test]
    fn test_struct_construction_and_field_access() {
        let b = AstBuilder::new("main.tn");
        let px = b.bind("px");
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
                "main",
                vec![],
                None,
                vec![
                    b.let_(
                        "p",
                        None,
                        b.construct(
                            TypeAnnotation::simple("Point"),
                            vec![("x", b.int(1)), ("y", b.int(2))],
                        ),
                    ),
                    Statement::Let(b.let_statement(
                        px.clone(),
                        None,
                        Some(b.member(b.ident("p"), "x")),
                        false,
                    )),
                ],
            ),
        ]);

        let module = analyze(&file);

        assert_eq!(
            bound_symbol(&module, &binding_name(&px)).type_annotation(),
            TypeAnnotation::int()
        );
        assert_eq!(module.symbols_named("p")[0].type_annotation(), TypeAnnotation::simple("Point"));
    }

    #[test]
    fn test_generic_struct_arguments_inferred_from_fields() {
        let b = AstBuilder::new("main.tn");
        let inner = b.bind("inner");
        let file = b.source_file(vec![
            b.structure(
                "Wrapper",
                &["T"],
                vec![b.field("value", TypeAnnotation::simple("T"), false)],
                vec![],
            ),
            b.function(
                "main",
                vec![],
                None,
                vec![
                    b.let_(
                        "boxed",
                        None,
                        b.construct(TypeAnnotation::simple("Wrapper"), vec![("value", b.int(3))]),
                    ),
                    Statement::Let(b.let_statement(
                        inner.clone(),
                        None,
                        Some(b.member(b.ident("boxed"), "value")),
                        false,
                    )),
                ],
            ),
        ]);

        let module = analyze(&file);

        assert_eq!(
            module.symbols_named("boxed")[0].type_annotation(),
            TypeAnnotation::generic("Wrapper", vec![TypeAnnotation::int()])
        );
        assert_eq!(
            bound_symbol(&module, &binding_name(&inner)).type_annotation(),
            TypeAnnotation::int()
        );
    }

    #[test]
    fn test_catch_binding_takes_thrown_type() {
        let b = AstBuilder::new("main.tn");
        let caught = b.param("error", None);
        let file = b.source_file(vec![b.function(
            "main",
            vec![],
            None,
            vec![b.try_(
                vec![b.throw(b.int(7))],
                Some(caught.clone()),
                vec![b.expr(b.call(b.ident("print"), vec![b.ident("error")]))],
            )],
        )]);

        analyze(&file);

        assert_eq!(caught.ty.get(), TypeAnnotation::int());
    }

    #[test]
    fn test_catch_binding_defaults_to_string() {
        let b = AstBuilder::new("main.tn");
        let caught = b.param("error", None);
        let file = b.source_file(vec![b.function(
            "main",
            vec![],
            None,
            vec![b.try_(
                vec![b.expr(b.call(b.ident("print"), vec![b.int(1)]))],
                Some(caught.clone()),
                vec![],
            )],
        )]);

        analyze(&file);

        assert_eq!(caught.ty.get(), TypeAnnotation::string());
    }

    #[test]
    fn test_no_placeholders_after_success() {
        let b = AstBuilder::new("main.tn");
        let file = b.source_file(vec![
            b.function(
                "twice",
                vec![b.param("n", Some(TypeAnnotation::int()))],
                Some(TypeAnnotation::int()),
                vec![b.ret(Some(b.binary(b.ident("n"), BinaryOperator::Mul, b.int(2))))],
            ),
            b.function(
                "main",
                vec![],
                None,
                vec![
                    b.let_("a", None, b.call(b.ident("twice"), vec![b.int(4)])),
                    b.let_("b", None, b.array(vec![b.ident("a"), b.int(1)])),
                    b.let_("c", None, b.index(b.ident("b"), b.int(0))),
                    b.let_("d", None, b.cast(b.ident("c"), TypeAnnotation::Primitive(PrimitiveKind::F64))),
                ],
            ),
        ]);

        let module = analyze(&file);

        assert!(module.find_placeholders().is_empty());
        assert_eq!(
            module.symbols_named("d")[0].type_annotation(),
            TypeAnnotation::Primitive(PrimitiveKind::F64)
        );
    }

    #[test]
    fn test_numeric_widening_is_a_warning() {
        let b = AstBuilder::new("main.tn");
        let file = b.source_file(vec![b.function(
            "main",
            vec![],
            None,
            vec![
                b.let_("small", Some(TypeAnnotation::int()), b.int(1)),
                b.let_("wide", Some(uint()), b.ident("small")),
            ],
        )]);

        let module = analyze(&file);

        assert_eq!(module.warnings().len(), 1);
        assert!(matches!(
            &module.warnings()[0],
            SemaError::ImplicitWidening { from, to, .. }
                if *from == TypeAnnotation::int() && *to == uint()
        ));
    }

    #[test]
    fn test_incompatible_initializer() {
        let b = AstBuilder::new("main.tn");
        let file = b.source_file(vec![b.function(
            "main",
            vec![],
            None,
            vec![b.let_("name", Some(TypeAnnotation::string()), b.int(1))],
        )]);

        assert_eq!(error_codes(try_analyze(&file)), vec!["E0301"]);
    }

    #[test]
    fn test_mixed_array_elements() {
        let b = AstBuilder::new("main.tn");
        let file = b.source_file(vec![b.function(
            "main",
            vec![],
            None,
            vec![b.let_("xs", None, b.array(vec![b.int(1), b.string("two")]))],
        )]);

        assert!(error_codes(try_analyze(&file)).contains(&"E0301"));
    }

    #[test]
    fn test_empty_array_cannot_be_inferred() {
        let b = AstBuilder::new("main.tn");
        let file = b.source_file(vec![b.function(
            "main",
            vec![],
            None,
            vec![b.let_("xs", None, b.array(vec![]))],
        )]);

        assert_eq!(error_codes(try_analyze(&file)), vec!["E0314"]);
    }

    #[test]
    fn test_empty_array_takes_declared_type() {
        let b = AstBuilder::new("main.tn");
        let file = b.source_file(vec![b.function(
            "main",
            vec![],
            None,
            vec![b.let_(
                "xs",
                Some(TypeAnnotation::array(TypeAnnotation::int())),
                b.array(vec![]),
            )],
        )]);

        let module = analyze(&file);

        assert!(module.find_placeholders().is_empty());
    }

    #[test]
    fn test_call_errors() {
        let b = AstBuilder::new("main.tn");
        let file = b.source_file(vec![
            b.function(
                "pair",
                vec![
                    b.param("a", Some(TypeAnnotation::int())),
                    b.param("b", Some(TypeAnnotation::int())),
                ],
                None,
                vec![],
            ),
            b.function(
                "main",
                vec![],
                None,
                vec![
                    b.let_("n", None, b.int(1)),
                    b.expr(b.call(b.ident("n"), vec![])),
                    b.expr(b.call(b.ident("pair"), vec![b.int(1)])),
                    b.expr(b.call(b.ident("pair"), vec![b.int(1), b.string("x")])),
                ],
            ),
        ]);

        assert_eq!(error_codes(try_analyze(&file)), vec!["E0303", "E0304", "E0301"]);
    }

    #[test]
    fn test_explicit_type_argument_count() {
        let b = AstBuilder::new("main.tn");
        let file = b.source_file(vec![
            b.generic_function(
                "identity",
                &["T"],
                vec![b.param("value", Some(TypeAnnotation::simple("T")))],
                Some(TypeAnnotation::simple("T")),
                vec![b.ret(Some(b.ident("value")))],
            ),
            b.function(
                "main",
                vec![],
                None,
                vec![b.expr(b.call_generic(
                    b.ident("identity"),
                    vec![TypeAnnotation::int(), TypeAnnotation::string()],
                    vec![b.int(1)],
                ))],
            ),
        ]);

        assert!(error_codes(try_analyze(&file)).contains(&"E0305"));
    }

    #[test]
    fn test_construction_field_errors() {
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
                "main",
                vec![],
                None,
                vec![b.let_(
                    "p",
                    None,
                    b.construct(
                        TypeAnnotation::simple("Point"),
                        vec![("x", b.int(1)), ("z", b.int(2))],
                    ),
                )],
            ),
        ]);

        assert_eq!(error_codes(try_analyze(&file)), vec!["E0306", "E0307"]);
    }

    #[test]
    fn test_unknown_member_and_type() {
        let b = AstBuilder::new("main.tn");
        let file = b.source_file(vec![
            b.structure(
                "Point",
                &[],
                vec![b.field("x", TypeAnnotation::int(), false)],
                vec![],
            ),
            b.function(
                "main",
                vec![b.param("origin", Some(TypeAnnotation::simple("Point")))],
                None,
                vec![
                    b.expr(b.member(b.ident("origin"), "depth")),
                    b.let_("q", Some(TypeAnnotation::simple("Missing")), b.int(1)),
                ],
            ),
        ]);

        let codes = error_codes(try_analyze(&file));

        assert!(codes.contains(&"E0308"), "{codes:?}");
        assert!(codes.contains(&"E0203"), "{codes:?}");
    }

    #[test]
    fn test_binary_operand_mismatch() {
        let b = AstBuilder::new("main.tn");
        let file = b.source_file(vec![b.function(
            "main",
            vec![],
            None,
            vec![
                b.let_("flag", None, b.boolean(true)),
                b.let_("sum", None, b.add(b.ident("flag"), b.int(1))),
                b.let_("joined", None, b.add(b.int(1), b.string("a"))),
            ],
        )]);

        let error = analysis_error(try_analyze(&file));

        assert_eq!(error.codes(), vec!["E0302", "E0302"]);
        let found: Vec<TypeAnnotation> = error
            .diagnostics
            .iter()
            .map(|diagnostic| match diagnostic {
                SemaError::InvalidOperand { found, .. } => found.clone(),
                other => panic!("unexpected diagnostic {other}"),
            })
            .collect();
        assert_eq!(found, vec![TypeAnnotation::boolean(), TypeAnnotation::string()]);
    }

    #[test]
    fn test_length_is_a_method_returning_int() {
        let b = AstBuilder::new("main.tn");
        let ty = binding_type(
            vec![
                b.let_("xs", None, b.array(vec![b.int(1), b.int(2)])),
                b.expr(b.call(b.member(b.ident("xs"), "len"), vec![])),
            ],
            &b,
            "size",
        );
        assert_eq!(ty, TypeAnnotation::int());

        let b = AstBuilder::new("main.tn");
        let ty = binding_type(
            vec![b.expr(b.call(b.member(b.string("abc"), "len"), vec![]))],
            &b,
            "chars",
        );
        assert_eq!(ty, TypeAnnotation::int());
    }

    #[test]
    fn test_literal_adopts_declared_width() {
        let b = AstBuilder::new("main.tn");
        let literal = b.int(255);
        let file = b.source_file(vec![b.function(
            "main",
            vec![],
            None,
            vec![b.let_(
                "byte",
                Some(TypeAnnotation::Primitive(PrimitiveKind::U8)),
                literal.clone(),
            )],
        )]);

        let module = analyze(&file);
        let Expression::Literal(literal) = literal else {
            unreachable!()
        };

        assert_eq!(
            module.get_node_type(literal.id),
            Some(&TypeAnnotation::Primitive(PrimitiveKind::U8))
        );
        assert!(module.warnings().is_empty());
    }
}
