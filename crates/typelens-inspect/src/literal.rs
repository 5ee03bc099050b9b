use typelens_common::{LiteralMember, LiteralValue, TypeExpr};

use crate::error::{InspectError, Result};
use crate::AliasPolicy;

/// Enumerate the fully expanded, deduplicated values of a literal value set.
///
/// With [`AliasPolicy::Keep`], members are yielded as-is and only the none
/// value and its type-level sentinel are collapsed (the underlying
/// representation does not merge the two itself). With
/// [`AliasPolicy::Lenient`] and [`AliasPolicy::Eager`], alias members are
/// expanded recursively and the result is deduplicated on value *and* value
/// kind, preserving first-occurrence order; an unresolved alias is kept as
/// an opaque member under `Lenient` and fails under `Eager`.
///
/// When `type_check` is set, every non-alias member must be an int, bytes,
/// str, bool, enum member or none.
pub fn extract_literal_values(
    expr: &TypeExpr,
    type_check: bool,
    aliases: AliasPolicy,
) -> Result<Vec<LiteralMember>> {
    let TypeExpr::Literal(members) = expr else {
        return Err(InspectError::InvalidAnnotationExpression(format!(
            "{} is not a literal value set",
            expr
        )));
    };

    if aliases == AliasPolicy::Keep {
        let mut out = Vec::with_capacity(members.len());
        let mut has_none = false;
        for member in members {
            if type_check {
                literal_type_check(member)?;
            }
            match member {
                LiteralMember::Value(LiteralValue::None) | LiteralMember::NoneType => {
                    if !has_none {
                        out.push(LiteralMember::Value(LiteralValue::None));
                    }
                    has_none = true;
                }
                other => out.push(other.clone()),
            }
        }
        return Ok(out);
    }

    let mut out = Vec::with_capacity(members.len());
    expand_members(members, type_check, aliases, &mut out)?;
    Ok(out)
}

fn expand_members(
    members: &[LiteralMember],
    type_check: bool,
    aliases: AliasPolicy,
    out: &mut Vec<LiteralMember>,
) -> Result<()> {
    for member in members {
        match member {
            LiteralMember::Alias(alias) => match alias.value() {
                Ok(value) => {
                    let TypeExpr::Literal(sub_members) = value else {
                        return Err(InspectError::InvalidAnnotationExpression(format!(
                            "the value of type alias '{}' is not a literal value set",
                            alias.name
                        )));
                    };
                    expand_members(sub_members, type_check, aliases, out)?;
                }
                Err(err) => {
                    if aliases == AliasPolicy::Eager {
                        return Err(err.into());
                    }
                    // lenient: keep the unresolved alias as an opaque member
                    push_unique(out, member.clone());
                }
            },
            LiteralMember::NoneType => {
                if type_check {
                    literal_type_check(member)?;
                }
                push_unique(out, LiteralMember::Value(LiteralValue::None));
            }
            LiteralMember::Value(value) => {
                if type_check {
                    literal_type_check(member)?;
                }
                push_unique(out, LiteralMember::Value(value.clone()));
            }
        }
    }
    Ok(())
}

/// First-occurrence-preserving insertion; equality is kind-sensitive, so an
/// enum member never collapses with an equal plain value.
fn push_unique(out: &mut Vec<LiteralMember>, member: LiteralMember) {
    if !out.contains(&member) {
        out.push(member);
    }
}

fn literal_type_check(member: &LiteralMember) -> Result<()> {
    match member {
        LiteralMember::Value(LiteralValue::Float(_)) => {
            Err(InspectError::InvalidLiteralValue(member.clone()))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use typelens_common::TypeAlias;

    fn int(v: i64) -> LiteralMember {
        LiteralMember::Value(LiteralValue::Int(v))
    }

    fn literal(members: Vec<LiteralMember>) -> TypeExpr {
        TypeExpr::Literal(members)
    }

    #[test]
    fn keep_collapses_only_none_duplicates() {
        let expr = literal(vec![
            LiteralMember::NoneType,
            int(1),
            int(1),
            LiteralMember::Value(LiteralValue::None),
        ]);
        let values = extract_literal_values(&expr, false, AliasPolicy::Keep).unwrap();
        // the two int members survive, the two none forms collapse to one,
        // first occurrence first
        assert_eq!(
            values,
            vec![
                LiteralMember::Value(LiteralValue::None),
                int(1),
                int(1),
            ]
        );
    }

    #[test]
    fn keep_does_not_expand_aliases() {
        let alias = Arc::new(TypeAlias::new(
            "Ints",
            vec![],
            literal(vec![int(1), int(2)]),
        ));
        let expr = literal(vec![int(0), LiteralMember::Alias(alias.clone())]);
        let values = extract_literal_values(&expr, false, AliasPolicy::Keep).unwrap();
        assert_eq!(values, vec![int(0), LiteralMember::Alias(alias)]);
    }

    #[test]
    fn eager_expands_aliases_and_deduplicates() {
        let alias = Arc::new(TypeAlias::new(
            "Ints",
            vec![],
            literal(vec![int(1), int(2)]),
        ));
        let expr = literal(vec![int(1), LiteralMember::Alias(alias)]);
        let values = extract_literal_values(&expr, false, AliasPolicy::Eager).unwrap();
        assert_eq!(values, vec![int(1), int(2)]);
    }

    #[test]
    fn nested_aliases_expand_recursively() {
        let inner = Arc::new(TypeAlias::new("Inner", vec![], literal(vec![int(2)])));
        let outer = Arc::new(TypeAlias::new(
            "Outer",
            vec![],
            literal(vec![int(1), LiteralMember::Alias(inner)]),
        ));
        let expr = literal(vec![LiteralMember::Alias(outer), int(3)]);
        let values = extract_literal_values(&expr, false, AliasPolicy::Eager).unwrap();
        assert_eq!(values, vec![int(1), int(2), int(3)]);
    }

    #[test]
    fn deduplication_is_kind_sensitive() {
        let enum_member = LiteralMember::Value(LiteralValue::EnumMember {
            type_name: "Number".into(),
            member: "ONE".into(),
        });
        let expr = literal(vec![
            enum_member.clone(),
            int(1),
            int(1),
            LiteralMember::Value(LiteralValue::Bool(true)),
        ]);
        let values = extract_literal_values(&expr, false, AliasPolicy::Eager).unwrap();
        assert_eq!(
            values,
            vec![
                enum_member,
                int(1),
                LiteralMember::Value(LiteralValue::Bool(true)),
            ]
        );
    }

    #[test]
    fn eager_normalizes_none_sentinel() {
        let expr = literal(vec![LiteralMember::NoneType, int(1), LiteralMember::Value(LiteralValue::None)]);
        let values = extract_literal_values(&expr, false, AliasPolicy::Eager).unwrap();
        assert_eq!(
            values,
            vec![LiteralMember::Value(LiteralValue::None), int(1)]
        );
    }

    #[test]
    fn unresolved_alias_eager_fails() {
        let alias = Arc::new(TypeAlias::undefined("Broken", vec![], "Missing"));
        let expr = literal(vec![LiteralMember::Alias(alias)]);
        match extract_literal_values(&expr, false, AliasPolicy::Eager) {
            Err(InspectError::UnresolvedAlias(err)) => {
                assert_eq!(err.alias, "Broken");
                assert_eq!(err.symbol, "Missing");
            }
            other => panic!("expected unresolved alias, got {:?}", other),
        }
    }

    #[test]
    fn unresolved_alias_lenient_is_kept_opaque() {
        let alias = Arc::new(TypeAlias::undefined("Broken", vec![], "Missing"));
        let expr = literal(vec![int(1), LiteralMember::Alias(alias.clone())]);
        let values = extract_literal_values(&expr, false, AliasPolicy::Lenient).unwrap();
        assert_eq!(values, vec![int(1), LiteralMember::Alias(alias)]);
    }

    #[test]
    fn type_check_rejects_floats() {
        let expr = literal(vec![LiteralMember::Value(LiteralValue::Float(1.0))]);
        assert!(extract_literal_values(&expr, false, AliasPolicy::Eager).is_ok());
        match extract_literal_values(&expr, true, AliasPolicy::Eager) {
            Err(InspectError::InvalidLiteralValue(member)) => {
                assert_eq!(member.to_string(), "1.0");
            }
            other => panic!("expected invalid literal value, got {:?}", other),
        }
    }

    #[test]
    fn type_check_applies_inside_expanded_aliases() {
        let alias = Arc::new(TypeAlias::new(
            "Floats",
            vec![],
            literal(vec![LiteralMember::Value(LiteralValue::Float(2.5))]),
        ));
        let expr = literal(vec![LiteralMember::Alias(alias)]);
        assert!(matches!(
            extract_literal_values(&expr, true, AliasPolicy::Eager),
            Err(InspectError::InvalidLiteralValue(_))
        ));
    }

    #[test]
    fn non_literal_input_is_rejected() {
        assert!(matches!(
            extract_literal_values(&TypeExpr::name("int"), false, AliasPolicy::Eager),
            Err(InspectError::InvalidAnnotationExpression(_))
        ));
    }

    #[test]
    fn alias_to_non_literal_value_is_rejected() {
        let alias = Arc::new(TypeAlias::new("NotASet", vec![], TypeExpr::name("int")));
        let expr = literal(vec![LiteralMember::Alias(alias)]);
        assert!(matches!(
            extract_literal_values(&expr, false, AliasPolicy::Eager),
            Err(InspectError::InvalidAnnotationExpression(_))
        ));
    }
}
