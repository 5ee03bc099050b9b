//! End-to-end tests: lex annotation source → parse → inspect/extract.

use serde_json::json;

use typelens_common::{AnnotationSource, LiteralMember, LiteralValue, Qualifier, TypeExpr};
use typelens_inspect::lexer::Lexer;
use typelens_inspect::parser::{Module, Parser};
use typelens_inspect::{
    extract_literal_values, inspect_annotation, visit, AliasPolicy, InspectError,
    InspectedAnnotation, TypeVisitor,
};

/// Lex and parse, asserting no diagnostics.
fn parse(source: &str) -> Module {
    let (tokens, lex_diags) = Lexer::new(source).tokenize();
    assert!(
        !lex_diags.has_errors(),
        "lex errors: {:?}",
        lex_diags.diagnostics()
    );
    let (module, parse_diags) = Parser::new(tokens).parse();
    assert!(
        !parse_diags.has_errors(),
        "parse errors: {:?}",
        parse_diags.diagnostics()
    );
    module
}

fn parse_expr(source: &str) -> TypeExpr {
    parse(source).expr.expect("input should have an expression")
}

fn inspect(source: &str, annotation_source: AnnotationSource) -> InspectedAnnotation {
    inspect_annotation(&parse_expr(source), annotation_source, AliasPolicy::Eager)
        .expect("inspection should succeed")
}

// =========================================================================
// Annotation unwrapping
// =========================================================================

#[test]
fn e2e_plain_generic() {
    let result = inspect("dict[str, list[int]]", AnnotationSource::Function);
    assert!(result.qualifiers.is_empty());
    assert!(result.metadata.is_empty());
    assert_eq!(result.ty.to_string(), "dict[str, list[int]]");
}

#[test]
fn e2e_qualifiers_and_metadata() {
    let result = inspect(
        "Final[Annotated[ClassVar[Annotated[int, 2]], 3]]",
        AnnotationSource::Any,
    );
    assert_eq!(result.ty, TypeExpr::name("int"));
    assert_eq!(result.qualifiers.len(), 2);
    assert!(result.qualifiers.contains(Qualifier::Final));
    assert!(result.qualifiers.contains(Qualifier::ClassVar));
    assert_eq!(result.metadata, vec![json!(2), json!(3)]);
}

#[test]
fn e2e_aliased_metadata_is_deepest_first() {
    let result = inspect(
        "type Alias = Annotated[int, 1]; Final[Annotated[ClassVar[Annotated[Alias, 2]], 3]]",
        AnnotationSource::Any,
    );
    assert_eq!(result.ty, TypeExpr::name("int"));
    assert_eq!(result.metadata, vec![json!(1), json!(2), json!(3)]);
}

#[test]
fn e2e_forbidden_qualifier() {
    let expr = parse_expr("ClassVar[int]");
    let err = inspect_annotation(
        &expr,
        AnnotationSource::AssignmentOrVariable,
        AliasPolicy::Eager,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        InspectError::ForbiddenQualifier(Qualifier::ClassVar)
    ));
}

#[test]
fn e2e_read_only_reports_itself() {
    let expr = parse_expr("ReadOnly[int]");
    let err = inspect_annotation(&expr, AnnotationSource::Class, AliasPolicy::Eager).unwrap_err();
    assert!(matches!(
        err,
        InspectError::ForbiddenQualifier(Qualifier::ReadOnly)
    ));
}

#[test]
fn e2e_bare_final() {
    let result = inspect("Final", AnnotationSource::Any);
    assert_eq!(result.ty, TypeExpr::Any);
    assert!(result.qualifiers.contains(Qualifier::Final));
}

#[test]
fn e2e_typed_dict_field() {
    let result = inspect("Required[ReadOnly[str]]", AnnotationSource::TypedDict);
    assert_eq!(result.ty, TypeExpr::name("str"));
    assert!(result.qualifiers.contains(Qualifier::Required));
    assert!(result.qualifiers.contains(Qualifier::ReadOnly));
}

#[test]
fn e2e_parameterized_alias() {
    let result = inspect(
        "type Tagged[T] = Annotated[T, 'tag']; Tagged[dict[str, int]]",
        AnnotationSource::Bare,
    );
    assert_eq!(result.ty.to_string(), "dict[str, int]");
    assert_eq!(result.metadata, vec![json!("tag")]);
}

// =========================================================================
// Literal extraction
// =========================================================================

#[test]
fn e2e_literal_none_dedup_keep() {
    let expr = parse_expr("Literal[NoneType, None]");
    let values = extract_literal_values(&expr, false, AliasPolicy::Keep).unwrap();
    assert_eq!(values, vec![LiteralMember::Value(LiteralValue::None)]);
}

#[test]
fn e2e_literal_alias_round_trip() {
    let expr = parse_expr("type Ints = Literal[1, 2]; Literal[1, Ints]");
    let values = extract_literal_values(&expr, false, AliasPolicy::Eager).unwrap();
    assert_eq!(
        values,
        vec![
            LiteralMember::Value(LiteralValue::Int(1)),
            LiteralMember::Value(LiteralValue::Int(2)),
        ]
    );
}

#[test]
fn e2e_literal_kind_sensitive_dedup() {
    let expr = parse_expr("Literal[Number.ONE, 1, 1, True]");
    let values = extract_literal_values(&expr, false, AliasPolicy::Eager).unwrap();
    assert_eq!(values.len(), 3);
    assert_eq!(
        values[0],
        LiteralMember::Value(LiteralValue::EnumMember {
            type_name: "Number".into(),
            member: "ONE".into(),
        })
    );
    assert_eq!(values[1], LiteralMember::Value(LiteralValue::Int(1)));
    assert_eq!(values[2], LiteralMember::Value(LiteralValue::Bool(true)));
}

#[test]
fn e2e_literal_type_check() {
    let expr = parse_expr("Literal[1, 2.5]");
    let err = extract_literal_values(&expr, true, AliasPolicy::Eager).unwrap_err();
    match err {
        InspectError::InvalidLiteralValue(member) => assert_eq!(member.to_string(), "2.5"),
        other => panic!("expected invalid literal value, got {:?}", other),
    }
}

// =========================================================================
// Traversal
// =========================================================================

struct Strict;

impl TypeVisitor for Strict {}

#[test]
fn e2e_forward_reference_suspends() {
    let expr = parse_expr("dict[str, list['NotYetDefined']]");
    match visit(&expr, &mut Strict) {
        Err(InspectError::UnevaluatedReference(name)) => assert_eq!(name, "NotYetDefined"),
        other => panic!("expected unevaluated reference, got {:?}", other),
    }
}

#[test]
fn e2e_bare_generic_marker_is_invalid() {
    let expr = parse_expr("Generic[int]");
    assert!(matches!(
        visit(&expr, &mut Strict),
        Err(InspectError::InvalidAnnotationExpression(_))
    ));
}

#[test]
fn e2e_union_traversal() {
    let expr = parse_expr("int | str | list['Pending']");
    assert!(matches!(
        visit(&expr, &mut Strict),
        Err(InspectError::UnevaluatedReference(_))
    ));
}

// =========================================================================
// Results as JSON
// =========================================================================

#[test]
fn e2e_inspection_serializes() {
    let result = inspect("Annotated[int, 'unit']", AnnotationSource::Bare);
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["metadata"], json!(["unit"]));
    assert_eq!(value["qualifiers"], json!([]));
    assert_eq!(value["type"], json!({"name": "int"}));
}
