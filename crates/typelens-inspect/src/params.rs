use typelens_common::{TypeExpr, TypeParam, TypeParamKind};

use crate::error::{InspectError, Result};

/// An ordered mapping from declared type parameters to their bound
/// arguments.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeParamBindings(Vec<(TypeParam, TypeExpr)>);

impl TypeParamBindings {
    pub fn get(&self, name: &str) -> Option<&TypeExpr> {
        self.0
            .iter()
            .find(|(param, _)| param.name == name)
            .map(|(_, arg)| arg)
    }

    /// Look up the binding for a type-parameter leaf expression.
    pub fn get_expr(&self, expr: &TypeExpr) -> Option<&TypeExpr> {
        match expr {
            TypeExpr::TypeParam(param) => self.get(&param.name),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &(TypeParam, TypeExpr)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Bind a parameterized generic's arguments to its origin's declared type
/// parameters.
///
/// One variadic parameter absorbs any number of surplus positional
/// arguments (captured as an argument list, possibly empty). Every other
/// parameter binds exactly one argument, falling back to its declared
/// default when arguments are exhausted. A lone parameter specification
/// accepts both `X[[A, B]]` and `X[A, B]` shapes, normalized to an argument
/// list.
pub fn bind_type_parameters(
    generic: &TypeExpr,
    declared_params: &[TypeParam],
) -> Result<TypeParamBindings> {
    let TypeExpr::Generic { args, .. } = generic else {
        return Err(InspectError::InvalidAnnotationExpression(format!(
            "{} is not a parameterized generic",
            generic
        )));
    };
    bind_arguments(declared_params, args)
}

/// Bind a raw argument slice; shared with alias expansion, which has the
/// arguments at hand without a surrounding generic.
pub(crate) fn bind_arguments(
    params: &[TypeParam],
    args: &[TypeExpr],
) -> Result<TypeParamBindings> {
    if let [param] = params {
        if param.kind == TypeParamKind::ParamSpec {
            return bind_lone_param_spec(param, args);
        }
    }

    if let Some(variadic_index) = params
        .iter()
        .position(|p| p.kind == TypeParamKind::TypeVarTuple)
    {
        return bind_with_variadic(params, args, variadic_index);
    }

    let mut bound = Vec::with_capacity(params.len());
    let mut remaining = args.iter();
    for param in params {
        match remaining.next() {
            Some(arg) => bound.push((param.clone(), arg.clone())),
            None => match &param.default {
                Some(default) => bound.push((param.clone(), (**default).clone())),
                None => return Err(InspectError::MissingTypeArgument(param.name.clone())),
            },
        }
    }
    if remaining.next().is_some() {
        return Err(InspectError::ExcessTypeArguments {
            expected: params.len(),
            got: args.len(),
        });
    }
    Ok(TypeParamBindings(bound))
}

fn bind_lone_param_spec(param: &TypeParam, args: &[TypeExpr]) -> Result<TypeParamBindings> {
    let arg = match args {
        [] => match &param.default {
            Some(default) => (**default).clone(),
            None => return Err(InspectError::MissingTypeArgument(param.name.clone())),
        },
        [single] if !is_param_expr(single) => TypeExpr::ArgList(vec![single.clone()]),
        [single] => single.clone(),
        many => TypeExpr::ArgList(many.to_vec()),
    };
    Ok(TypeParamBindings(vec![(param.clone(), arg)]))
}

fn bind_with_variadic(
    params: &[TypeParam],
    args: &[TypeExpr],
    variadic_index: usize,
) -> Result<TypeParamBindings> {
    let front = &params[..variadic_index];
    let back = &params[variadic_index + 1..];

    if args.len() < front.len() + back.len() {
        // Report the first parameter that cannot be bound.
        let unbound = params
            .iter()
            .filter(|p| p.kind != TypeParamKind::TypeVarTuple)
            .nth(args.len().min(front.len()))
            .unwrap_or(&params[variadic_index]);
        return Err(InspectError::MissingTypeArgument(unbound.name.clone()));
    }

    let mut bound = Vec::with_capacity(params.len());
    for (param, arg) in front.iter().zip(args) {
        bound.push((param.clone(), arg.clone()));
    }
    let middle = &args[front.len()..args.len() - back.len()];
    bound.push((
        params[variadic_index].clone(),
        TypeExpr::ArgList(middle.to_vec()),
    ));
    for (param, arg) in back.iter().zip(&args[args.len() - back.len()..]) {
        bound.push((param.clone(), arg.clone()));
    }
    Ok(TypeParamBindings(bound))
}

/// Whether an argument already has the shape of a callable parameter list.
fn is_param_expr(expr: &TypeExpr) -> bool {
    match expr {
        TypeExpr::Ellipsis | TypeExpr::ArgList(_) => true,
        TypeExpr::TypeParam(param) => param.kind == TypeParamKind::ParamSpec,
        TypeExpr::Generic { origin, .. } => {
            matches!(&**origin, TypeExpr::Name(name) if name == "Concatenate")
        }
        _ => false,
    }
}
