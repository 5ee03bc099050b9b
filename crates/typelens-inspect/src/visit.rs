use typelens_common::TypeExpr;

use crate::error::{InspectError, Result};

/// Read-only depth-first traversal over a type-expression tree.
///
/// Default implementations walk children; override specific methods to add
/// behavior at particular shapes. Dispatch happens in [`visit`](TypeVisitor::visit);
/// override the per-shape hooks rather than `visit` itself.
///
/// A forward reference anywhere in the tree suspends the traversal with
/// [`InspectError::UnevaluatedReference`]; it is never silently skipped.
pub trait TypeVisitor {
    fn visit(&mut self, expr: &TypeExpr) -> Result<()> {
        match expr {
            // Parameter-specification capture forms are always leaves.
            TypeExpr::ParamSpecArgs(_) | TypeExpr::ParamSpecKwargs(_) => self.visit_leaf(expr),
            TypeExpr::GenericMarker => Err(InspectError::InvalidAnnotationExpression(
                expr.to_string(),
            )),
            // Bare legacy aliases are opaque.
            TypeExpr::LegacyAlias(_) => self.visit_leaf(expr),
            TypeExpr::Union(alternatives) => self.visit_union(alternatives),
            TypeExpr::Generic { origin, args } => {
                if matches!(&**origin, TypeExpr::GenericMarker) {
                    return Err(InspectError::InvalidAnnotationExpression(expr.to_string()));
                }
                self.visit_generic(origin, args)
            }
            TypeExpr::Qualified { inner, .. } => self.visit(inner),
            TypeExpr::Annotated { inner, .. } => self.visit(inner),
            // Literal arguments are values, not type expressions.
            TypeExpr::Literal(_) => Ok(()),
            TypeExpr::ArgList(items) => {
                for item in items {
                    self.visit(item)?;
                }
                Ok(())
            }
            TypeExpr::Unpacked(inner) => self.visit(inner),
            _ => self.visit_leaf(expr),
        }
    }

    fn visit_generic(&mut self, _origin: &TypeExpr, args: &[TypeExpr]) -> Result<()> {
        for arg in args {
            self.visit(arg)?;
        }
        Ok(())
    }

    fn visit_union(&mut self, alternatives: &[TypeExpr]) -> Result<()> {
        for alternative in alternatives {
            self.visit(alternative)?;
        }
        Ok(())
    }

    fn visit_leaf(&mut self, expr: &TypeExpr) -> Result<()> {
        if let TypeExpr::ForwardRef(name) = expr {
            self.visit_forward_ref(name)
        } else {
            Ok(())
        }
    }

    fn visit_forward_ref(&mut self, name: &str) -> Result<()> {
        Err(InspectError::UnevaluatedReference(name.to_string()))
    }
}

/// Walk `expr` with the given visitor.
pub fn visit(expr: &TypeExpr, visitor: &mut dyn TypeVisitor) -> Result<()> {
    visitor.visit(expr)
}
