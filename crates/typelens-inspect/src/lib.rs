//! Annotation inspection engine: parses textual annotation expressions and
//! reduces type-expression trees to a normalized, fully-expanded form.

pub mod annotation;
pub mod error;
pub mod lexer;
pub mod literal;
pub mod params;
pub mod parser;
pub mod transform;
pub mod visit;

pub use annotation::{inspect_annotation, InspectedAnnotation};
pub use error::InspectError;
pub use literal::extract_literal_values;
pub use params::{bind_type_parameters, TypeParamBindings};
pub use transform::{substitute_type_params, transform, Substituter, TypeTransformer};
pub use visit::{visit, TypeVisitor};

/// What to do when a lazy type alias is encountered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AliasPolicy {
    /// Do not try to expand aliases. Can lead to incomplete results when an
    /// alias hides a metadata wrapper or literal set.
    Keep,
    /// Try to expand aliases, falling back to `Keep` for any alias whose
    /// value cannot be resolved.
    Lenient,
    /// Expand aliases and propagate resolution failures.
    #[default]
    Eager,
}

impl std::str::FromStr for AliasPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keep" | "skip" => Ok(AliasPolicy::Keep),
            "lenient" => Ok(AliasPolicy::Lenient),
            "eager" => Ok(AliasPolicy::Eager),
            other => Err(format!("unknown alias policy '{}'", other)),
        }
    }
}
