use std::collections::VecDeque;

use serde::Serialize;
use serde_json::Value;

use typelens_common::{AnnotationSource, Qualifier, QualifierSet, TypeExpr};

use crate::error::{InspectError, Result};
use crate::params::bind_arguments;
use crate::transform::substitute_type_params;
use crate::AliasPolicy;

/// The result of inspecting an annotation: the unwrapped type expression,
/// the qualifiers encountered (duplicates collapsed), and the annotated
/// metadata in encounter order, deepest layer first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectedAnnotation {
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    pub qualifiers: QualifierSet,
    pub metadata: Vec<Value>,
}

/// Inspect an annotation expression, stripping qualifier and metadata
/// wrappers.
///
/// Each round peels metadata first, then tests the expression's structural
/// origin against the source's qualifier allow-list; a qualifier outside
/// the allow-list aborts with [`InspectError::ForbiddenQualifier`]. A bare
/// `Final` is legal only as the terminal form and leaves the resulting type
/// fully unconstrained.
pub fn inspect_annotation(
    expr: &TypeExpr,
    source: AnnotationSource,
    aliases: AliasPolicy,
) -> Result<InspectedAnnotation> {
    let allowed = source.allowed_qualifiers();
    let mut qualifiers = QualifierSet::empty();
    let mut metadata: VecDeque<Value> = VecDeque::new();
    let mut current = expr.clone();

    loop {
        let (unwrapped, peeled) = unpack_annotated(&current, aliases)?;
        if !peeled.is_empty() {
            // Outer layers peel first; prepending keeps deeper metadata
            // ahead of metadata peeled earlier.
            for value in peeled.into_iter().rev() {
                metadata.push_front(value);
            }
            current = unwrapped;
            continue;
        }

        match current {
            TypeExpr::Qualified { qualifier, inner } => {
                if !allowed.contains(qualifier) {
                    return Err(InspectError::ForbiddenQualifier(qualifier));
                }
                qualifiers.insert(qualifier);
                current = *inner;
            }
            other => {
                current = other;
                break;
            }
        }
    }

    // `Final` is the only qualifier legal as a bare terminal annotation;
    // its argument is implicit, so the type becomes fully unconstrained.
    if current == TypeExpr::BareQualifier(Qualifier::Final) {
        if !allowed.contains(Qualifier::Final) {
            return Err(InspectError::ForbiddenQualifier(Qualifier::Final));
        }
        qualifiers.insert(Qualifier::Final);
        current = TypeExpr::Any;
    }

    Ok(InspectedAnnotation {
        ty: current,
        qualifiers,
        metadata: metadata.into(),
    })
}

/// Peel one metadata layer, expanding lazy aliases whose value resolves
/// (possibly through further aliases) to a metadata wrapper.
fn unpack_annotated(expr: &TypeExpr, aliases: AliasPolicy) -> Result<(TypeExpr, Vec<Value>)> {
    if aliases == AliasPolicy::Keep {
        if let TypeExpr::Annotated { inner, metadata } = expr {
            return Ok(((**inner).clone(), metadata.clone()));
        }
        return Ok((expr.clone(), Vec::new()));
    }
    unpack_annotated_inner(expr, aliases, true)
}

fn unpack_annotated_inner(
    expr: &TypeExpr,
    aliases: AliasPolicy,
    check_annotated: bool,
) -> Result<(TypeExpr, Vec<Value>)> {
    match expr {
        TypeExpr::Annotated { inner, metadata } if check_annotated => {
            // The wrapped type might be an alias resolving to a further
            // metadata wrapper; its metadata sits deeper, so it goes first.
            let (ty, mut peeled) = unpack_annotated_inner(inner, aliases, false)?;
            peeled.extend(metadata.iter().cloned());
            Ok((ty, peeled))
        }
        TypeExpr::Alias(alias) => match alias.value() {
            Err(err) => {
                if aliases == AliasPolicy::Eager {
                    Err(err.into())
                } else {
                    Ok((expr.clone(), Vec::new()))
                }
            }
            Ok(value) => {
                let (ty, peeled) = unpack_annotated_inner(value, aliases, true)?;
                if peeled.is_empty() {
                    // Only aliases leading to metadata wrappers unwrap; a
                    // plain alias stays a reference.
                    Ok((expr.clone(), Vec::new()))
                } else {
                    Ok((ty, peeled))
                }
            }
        },
        TypeExpr::Generic { origin, args } => {
            let TypeExpr::Alias(alias) = &**origin else {
                return Ok((expr.clone(), Vec::new()));
            };
            match alias.value() {
                Err(err) => {
                    if aliases == AliasPolicy::Eager {
                        Err(err.into())
                    } else {
                        Ok((expr.clone(), Vec::new()))
                    }
                }
                Ok(value) => {
                    let substituted = if alias.type_params.is_empty() {
                        value.clone()
                    } else {
                        match bind_arguments(&alias.type_params, args) {
                            Ok(bindings) => substitute_type_params(value, &bindings)?,
                            // the alias is parameterized but its value takes
                            // no arguments; use it as-is
                            Err(_) => value.clone(),
                        }
                    };
                    let (ty, peeled) = unpack_annotated_inner(&substituted, aliases, true)?;
                    if peeled.is_empty() {
                        Ok((expr.clone(), Vec::new()))
                    } else {
                        Ok((ty, peeled))
                    }
                }
            }
        }
        _ => Ok((expr.clone(), Vec::new())),
    }
}
