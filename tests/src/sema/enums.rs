/// Tests for enums
///
/// Raw values are validated against the raw type and the implicit ones are
/// filled in; cases are reachable through `Enum.Case` paths and patterns.
#[cfg(test)]
mod enum_tests {
    use std::rc::Rc;

    use pretty_assertions::assert_eq;
    use tern_ast::builder::AstBuilder;
    use tern_ast::nodes::{EnumCase, Item, LiteralValue, SourceFile, Statement};
    use tern_ast::types::{PrimitiveKind, TypeAnnotation};

    use crate::utils::{analyze, error_codes, try_analyze};

    fn with_main(b: &AstBuilder, mut items: Vec<Item>, body: Vec<Statement>) -> Rc<SourceFile> {
        items.push(b.function("main", vec![], None, body));
        b.source_file(items)
    }

    fn raw_values(b: &AstBuilder, raw_type: TypeAnnotation, cases: &[Rc<EnumCase>]) -> Vec<LiteralValue> {
        let file = with_main(
            b,
            vec![b.enumeration("Color", Some(raw_type), cases.to_vec())],
            vec![],
        );
        let module = analyze(&file);
        cases
            .iter()
            .map(|case| module.raw_value(case.id).cloned().unwrap())
            .collect()
    }

    #[test]
    fn test_integer_raw_values_count_up_from_the_previous_case() {
        let b = AstBuilder::new("main.tn");
        let cases = [
            b.case("Red", vec![], None),
            b.case("Green", vec![], Some(LiteralValue::Int(5))),
            b.case("Blue", vec![], None),
        ];

        assert_eq!(
            raw_values(&b, TypeAnnotation::int(), &cases),
            vec![LiteralValue::Int(0), LiteralValue::Int(5), LiteralValue::Int(6)]
        );
    }

    #[test]
    fn test_string_raw_values_default_to_the_case_name() {
        let b = AstBuilder::new("main.tn");
        let cases = [
            b.case("Red", vec![], None),
            b.case("Green", vec![], Some(LiteralValue::String("lime".to_string()))),
        ];

        assert_eq!(
            raw_values(&b, TypeAnnotation::string(), &cases),
            vec![
                LiteralValue::String("Red".to_string()),
                LiteralValue::String("lime".to_string()),
            ]
        );
    }

    #[test]
    fn test_enum_without_raw_type_has_no_raw_values() {
        let b = AstBuilder::new("main.tn");
        let red = b.case("Red", vec![], None);
        let file = with_main(&b, vec![b.enumeration("Color", None, vec![red.clone()])], vec![]);

        let module = analyze(&file);

        assert_eq!(module.raw_value(red.id), None);
    }

    #[test]
    fn test_duplicate_raw_value() {
        let b = AstBuilder::new("main.tn");
        let file = with_main(
            &b,
            vec![b.enumeration(
                "Level",
                Some(TypeAnnotation::int()),
                vec![
                    b.case("Low", vec![], Some(LiteralValue::Int(1))),
                    b.case("Zero", vec![], None),
                    b.case("High", vec![], Some(LiteralValue::Int(1))),
                ],
            )],
            vec![],
        );

        assert_eq!(error_codes(try_analyze(&file)), vec!["E0311"]);
    }

    #[test]
    fn test_implicit_value_colliding_with_explicit_one() {
        let b = AstBuilder::new("main.tn");
        let file = with_main(
            &b,
            vec![b.enumeration(
                "Level",
                Some(TypeAnnotation::int()),
                vec![
                    b.case("Low", vec![], Some(LiteralValue::Int(1))),
                    b.case("Mid", vec![], None),
                    b.case("Also", vec![], Some(LiteralValue::Int(2))),
                ],
            )],
            vec![],
        );

        assert_eq!(error_codes(try_analyze(&file)), vec!["E0311"]);
    }

    #[test]
    fn test_raw_value_without_raw_type() {
        let b = AstBuilder::new("main.tn");
        let file = with_main(
            &b,
            vec![b.enumeration(
                "Color",
                None,
                vec![b.case("Red", vec![], Some(LiteralValue::Int(1)))],
            )],
            vec![],
        );

        assert_eq!(error_codes(try_analyze(&file)), vec!["E0312"]);
    }

    #[test]
    fn test_raw_value_on_payload_case() {
        let b = AstBuilder::new("main.tn");
        let file = with_main(
            &b,
            vec![b.enumeration(
                "Shape",
                Some(TypeAnnotation::int()),
                vec![b.case("Circle", vec![TypeAnnotation::int()], Some(LiteralValue::Int(3)))],
            )],
            vec![],
        );

        assert_eq!(error_codes(try_analyze(&file)), vec!["E0312"]);
    }

    #[test]
    fn test_raw_type_must_be_integer_or_string() {
        let b = AstBuilder::new("main.tn");
        let file = with_main(
            &b,
            vec![b.enumeration(
                "Flag",
                Some(TypeAnnotation::boolean()),
                vec![b.case("On", vec![], None)],
            )],
            vec![],
        );

        assert_eq!(error_codes(try_analyze(&file)), vec!["E0313"]);
    }

    #[test]
    fn test_raw_value_of_the_wrong_type() {
        let b = AstBuilder::new("main.tn");
        let file = with_main(
            &b,
            vec![b.enumeration(
                "Color",
                Some(TypeAnnotation::int()),
                vec![b.case("Red", vec![], Some(LiteralValue::String("red".to_string())))],
            )],
            vec![],
        );

        assert_eq!(error_codes(try_analyze(&file)), vec!["E0301"]);
    }

    #[test]
    fn test_case_path_has_the_enum_type() {
        let b = AstBuilder::new("main.tn");
        let file = with_main(
            &b,
            vec![b.enumeration(
                "Color",
                None,
                vec![b.case("Red", vec![], None), b.case("Blue", vec![], None)],
            )],
            vec![b.let_("color", None, b.path(&["Color", "Red"]))],
        );

        let module = analyze(&file);

        assert_eq!(
            module.symbols_named("color")[0].type_annotation(),
            TypeAnnotation::simple("Color")
        );
    }

    #[test]
    fn test_payload_case_constructs_the_enum() {
        let b = AstBuilder::new("main.tn");
        let float = TypeAnnotation::Primitive(PrimitiveKind::F64);
        let file = with_main(
            &b,
            vec![b.enumeration(
                "Shape",
                None,
                vec![b.case("Circle", vec![float], None), b.case("Dot", vec![], None)],
            )],
            vec![b.let_(
                "shape",
                None,
                b.call(b.path(&["Shape", "Circle"]), vec![b.float("2.5")]),
            )],
        );

        let module = analyze(&file);

        assert_eq!(
            module.symbols_named("shape")[0].type_annotation(),
            TypeAnnotation::simple("Shape")
        );
    }

    #[test]
    fn test_match_binds_payloads_and_unifies_arms() {
        let b = AstBuilder::new("main.tn");
        let radius = b.bind("radius");
        let file = with_main(
            &b,
            vec![b.enumeration(
                "Shape",
                None,
                vec![
                    b.case("Circle", vec![TypeAnnotation::int()], None),
                    b.case("Dot", vec![], None),
                ],
            )],
            vec![
                b.let_("shape", None, b.path(&["Shape", "Dot"])),
                b.let_(
                    "size",
                    None,
                    b.match_(
                        b.ident("shape"),
                        vec![
                            b.arm(
                                b.case_pattern(&["Shape", "Circle"], vec![radius.clone()]),
                                None,
                                vec![b.expr(b.ident("radius"))],
                            ),
                            b.arm(b.case_pattern(&["Dot"], vec![]), None, vec![b.expr(b.int(0))]),
                        ],
                    ),
                ),
            ],
        );

        let module = analyze(&file);

        let tern_ast::nodes::Pattern::Binding(radius) = radius else {
            unreachable!()
        };
        assert_eq!(radius.ty.get(), TypeAnnotation::int());
        assert_eq!(
            module.symbols_named("size")[0].type_annotation(),
            TypeAnnotation::int()
        );
    }

    #[test]
    fn test_unknown_case() {
        let b = AstBuilder::new("main.tn");
        let file = with_main(
            &b,
            vec![b.enumeration("Color", None, vec![b.case("Red", vec![], None)])],
            vec![b.let_("color", None, b.path(&["Color", "Purple"]))],
        );

        assert_eq!(error_codes(try_analyze(&file)), vec!["E0310"]);
    }

    #[test]
    fn test_unknown_case_in_pattern() {
        let b = AstBuilder::new("main.tn");
        let file = with_main(
            &b,
            vec![b.enumeration("Color", None, vec![b.case("Red", vec![], None)])],
            vec![b.expr(b.match_(
                b.path(&["Color", "Red"]),
                vec![b.arm(b.case_pattern(&["Color", "Teal"], vec![]), None, vec![])],
            ))],
        );

        assert_eq!(error_codes(try_analyze(&file)), vec!["E0310"]);
    }
}
