use std::borrow::Cow;

use typelens_common::TypeExpr;

use crate::error::{InspectError, Result};
use crate::params::{bind_arguments, TypeParamBindings};
use crate::AliasPolicy;

/// Structure-preserving recursive rewrite of a type-expression tree.
///
/// Same dispatch as [`TypeVisitor`](crate::visit::TypeVisitor), but each
/// argument is rebuilt only if it actually changed: an untouched subtree
/// comes back as `Cow::Borrowed`, so identity transforms allocate nothing.
/// Unions are rebuilt through pairwise combination of the transformed
/// alternatives, flattening nested unions.
pub trait TypeTransformer {
    fn transform<'a>(&mut self, expr: &'a TypeExpr) -> Result<Cow<'a, TypeExpr>> {
        match expr {
            TypeExpr::ParamSpecArgs(_) | TypeExpr::ParamSpecKwargs(_) => self.transform_leaf(expr),
            TypeExpr::GenericMarker => Err(InspectError::InvalidAnnotationExpression(
                expr.to_string(),
            )),
            TypeExpr::LegacyAlias(_) => self.transform_leaf(expr),
            TypeExpr::Union(alternatives) => self.transform_union(expr, alternatives),
            TypeExpr::Generic { origin, args } => {
                if matches!(&**origin, TypeExpr::GenericMarker) {
                    return Err(InspectError::InvalidAnnotationExpression(expr.to_string()));
                }
                self.transform_generic(expr, origin, args)
            }
            TypeExpr::Qualified { qualifier, inner } => match self.transform(inner)? {
                Cow::Borrowed(_) => Ok(Cow::Borrowed(expr)),
                Cow::Owned(new_inner) => Ok(Cow::Owned(TypeExpr::qualified(*qualifier, new_inner))),
            },
            TypeExpr::Annotated { inner, metadata } => match self.transform(inner)? {
                Cow::Borrowed(_) => Ok(Cow::Borrowed(expr)),
                Cow::Owned(new_inner) => Ok(Cow::Owned(TypeExpr::annotated(
                    new_inner,
                    metadata.clone(),
                ))),
            },
            // Literal arguments are values, not type expressions.
            TypeExpr::Literal(_) => Ok(Cow::Borrowed(expr)),
            TypeExpr::ArgList(items) => match transform_all(self, items)? {
                None => Ok(Cow::Borrowed(expr)),
                Some(new_items) => Ok(Cow::Owned(TypeExpr::ArgList(new_items))),
            },
            TypeExpr::Unpacked(inner) => match self.transform(inner)? {
                Cow::Borrowed(_) => Ok(Cow::Borrowed(expr)),
                Cow::Owned(new_inner) => {
                    Ok(Cow::Owned(TypeExpr::Unpacked(Box::new(new_inner))))
                }
            },
            _ => self.transform_leaf(expr),
        }
    }

    fn transform_generic<'a>(
        &mut self,
        expr: &'a TypeExpr,
        origin: &'a TypeExpr,
        args: &'a [TypeExpr],
    ) -> Result<Cow<'a, TypeExpr>> {
        transform_generic_default(self, expr, origin, args)
    }

    fn transform_union<'a>(
        &mut self,
        expr: &'a TypeExpr,
        alternatives: &'a [TypeExpr],
    ) -> Result<Cow<'a, TypeExpr>> {
        match transform_all(self, alternatives)? {
            None => Ok(Cow::Borrowed(expr)),
            Some(new_alternatives) => Ok(Cow::Owned(TypeExpr::union_of(new_alternatives))),
        }
    }

    fn transform_leaf<'a>(&mut self, expr: &'a TypeExpr) -> Result<Cow<'a, TypeExpr>> {
        transform_leaf_default(self, expr)
    }

    fn transform_forward_ref<'a>(
        &mut self,
        _expr: &'a TypeExpr,
        name: &str,
    ) -> Result<Cow<'a, TypeExpr>> {
        Err(InspectError::UnevaluatedReference(name.to_string()))
    }
}

/// Transform `expr` with the given transformer.
pub fn transform<'a>(
    expr: &'a TypeExpr,
    transformer: &mut dyn TypeTransformer,
) -> Result<Cow<'a, TypeExpr>> {
    transformer.transform(expr)
}

pub(crate) fn transform_generic_default<'a, T>(
    transformer: &mut T,
    expr: &'a TypeExpr,
    origin: &'a TypeExpr,
    args: &'a [TypeExpr],
) -> Result<Cow<'a, TypeExpr>>
where
    T: TypeTransformer + ?Sized,
{
    match transform_all(transformer, args)? {
        None => Ok(Cow::Borrowed(expr)),
        Some(new_args) => Ok(Cow::Owned(rebuild_generic(origin.clone(), new_args))),
    }
}

pub(crate) fn transform_leaf_default<'a, T>(
    transformer: &mut T,
    expr: &'a TypeExpr,
) -> Result<Cow<'a, TypeExpr>>
where
    T: TypeTransformer + ?Sized,
{
    if let TypeExpr::ForwardRef(name) = expr {
        transformer.transform_forward_ref(expr, name)
    } else {
        Ok(Cow::Borrowed(expr))
    }
}

/// Transform every element, returning `None` when nothing changed so the
/// caller can keep the original allocation.
fn transform_all<'a, T>(
    transformer: &mut T,
    args: &'a [TypeExpr],
) -> Result<Option<Vec<TypeExpr>>>
where
    T: TypeTransformer + ?Sized,
{
    let mut transformed: Vec<Cow<'a, TypeExpr>> = Vec::with_capacity(args.len());
    let mut changed = false;
    for arg in args {
        let out = transformer.transform(arg)?;
        changed |= matches!(out, Cow::Owned(_));
        transformed.push(out);
    }
    if !changed {
        return Ok(None);
    }
    Ok(Some(
        transformed.into_iter().map(Cow::into_owned).collect(),
    ))
}

/// Rebuild a generic, splicing unpacked argument lists produced by variadic
/// substitution into the surrounding argument positions.
fn rebuild_generic(origin: TypeExpr, args: Vec<TypeExpr>) -> TypeExpr {
    let mut flattened = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            TypeExpr::Unpacked(inner) => match *inner {
                TypeExpr::ArgList(items) => flattened.extend(items),
                other => flattened.push(TypeExpr::Unpacked(Box::new(other))),
            },
            other => flattened.push(other),
        }
    }
    TypeExpr::Generic {
        origin: Box::new(origin),
        args: flattened,
    }
}

/// Replace type-parameter leaves according to `bindings`, leaving everything
/// else untouched, forward references included.
pub fn substitute_type_params(expr: &TypeExpr, bindings: &TypeParamBindings) -> Result<TypeExpr> {
    struct ParamReplacer<'b> {
        bindings: &'b TypeParamBindings,
    }

    impl TypeTransformer for ParamReplacer<'_> {
        fn transform_leaf<'a>(&mut self, expr: &'a TypeExpr) -> Result<Cow<'a, TypeExpr>> {
            match self.bindings.get_expr(expr) {
                Some(replacement) => Ok(Cow::Owned(replacement.clone())),
                None => Ok(Cow::Borrowed(expr)),
            }
        }

        fn transform_forward_ref<'a>(
            &mut self,
            expr: &'a TypeExpr,
            _name: &str,
        ) -> Result<Cow<'a, TypeExpr>> {
            Ok(Cow::Borrowed(expr))
        }
    }

    let mut replacer = ParamReplacer { bindings };
    Ok(replacer.transform(expr)?.into_owned())
}

/// A [`TypeTransformer`] that substitutes leaves from a replacement mapping
/// and optionally expands lazy type aliases, whether they appear as a bare
/// leaf or as a parameterized generic's origin.
pub struct Substituter {
    aliases: AliasPolicy,
    replacements: Vec<(TypeExpr, TypeExpr)>,
}

impl Substituter {
    pub fn new() -> Self {
        Self {
            aliases: AliasPolicy::Keep,
            replacements: Vec::new(),
        }
    }

    pub fn with_aliases(mut self, aliases: AliasPolicy) -> Self {
        self.aliases = aliases;
        self
    }

    /// Register a leaf replacement, applied after the leaf's own handling.
    pub fn replace(mut self, from: TypeExpr, to: TypeExpr) -> Self {
        self.replacements.push((from, to));
        self
    }

    /// Transform and take ownership of the result.
    pub fn apply(&mut self, expr: &TypeExpr) -> Result<TypeExpr> {
        Ok(self.transform(expr)?.into_owned())
    }
}

impl Default for Substituter {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTransformer for Substituter {
    fn transform_generic<'a>(
        &mut self,
        expr: &'a TypeExpr,
        origin: &'a TypeExpr,
        args: &'a [TypeExpr],
    ) -> Result<Cow<'a, TypeExpr>> {
        if self.aliases != AliasPolicy::Keep {
            if let TypeExpr::Alias(alias) = origin {
                match alias.value() {
                    Err(err) => {
                        if self.aliases == AliasPolicy::Eager {
                            return Err(err.into());
                        }
                        // lenient: fall through and keep the reference
                    }
                    Ok(value) => {
                        let mut new_args = Vec::with_capacity(args.len());
                        for arg in args {
                            new_args.push(self.transform(arg)?.into_owned());
                        }
                        let substituted = if alias.type_params.is_empty() {
                            value.clone()
                        } else {
                            match bind_arguments(&alias.type_params, &new_args) {
                                Ok(bindings) => substitute_type_params(value, &bindings)?,
                                // the alias is parameterized but its value
                                // takes no arguments; use it as-is
                                Err(_) => value.clone(),
                            }
                        };
                        return Ok(Cow::Owned(self.transform(&substituted)?.into_owned()));
                    }
                }
            }
        }
        transform_generic_default(self, expr, origin, args)
    }

    fn transform_leaf<'a>(&mut self, expr: &'a TypeExpr) -> Result<Cow<'a, TypeExpr>> {
        let leaf = transform_leaf_default(self, expr)?;
        let replaced = match self
            .replacements
            .iter()
            .find(|(from, _)| from == leaf.as_ref())
        {
            Some((_, to)) => Cow::Owned(to.clone()),
            None => leaf,
        };
        if self.aliases != AliasPolicy::Keep {
            if let TypeExpr::Alias(alias) = replaced.as_ref() {
                match alias.value() {
                    Err(err) => {
                        if self.aliases == AliasPolicy::Eager {
                            return Err(err.into());
                        }
                    }
                    Ok(value) => {
                        return Ok(Cow::Owned(self.transform(value)?.into_owned()));
                    }
                }
            }
        }
        Ok(replaced)
    }
}
