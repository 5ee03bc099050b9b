use thiserror::Error;

use typelens_common::{LiteralMember, Qualifier, UnresolvedSymbol};

/// Errors raised by the inspection engine.
///
/// Every failure is deterministic for a given input and alias-resolution
/// state; nothing is retried internally.
#[derive(Error, Debug)]
pub enum InspectError {
    #[error("qualifier '{}' is not allowed in this annotation context", .0.label())]
    ForbiddenQualifier(Qualifier),

    #[error("{0} is not a valid literal value, must be one of: int, bytes, str, bool, Enum member, None")]
    InvalidLiteralValue(LiteralMember),

    #[error(transparent)]
    UnresolvedAlias(#[from] UnresolvedSymbol),

    #[error("unevaluated forward reference '{0}'")]
    UnevaluatedReference(String),

    #[error("'{0}' is not valid in an annotation expression")]
    InvalidAnnotationExpression(String),

    #[error("no argument for type parameter '{0}' and it declares no default")]
    MissingTypeArgument(String),

    #[error("too many arguments: got {got} for {expected} type parameter(s)")]
    ExcessTypeArguments { expected: usize, got: usize },
}

pub type Result<T> = std::result::Result<T, InspectError>;

#[cfg(test)]
mod tests {
    use super::*;
    use typelens_common::LiteralValue;

    #[test]
    fn forbidden_qualifier_display() {
        let e = InspectError::ForbiddenQualifier(Qualifier::ClassVar);
        assert_eq!(
            e.to_string(),
            "qualifier 'class_var' is not allowed in this annotation context"
        );
    }

    #[test]
    fn invalid_literal_display() {
        let e = InspectError::InvalidLiteralValue(LiteralMember::Value(LiteralValue::Float(1.0)));
        assert_eq!(
            e.to_string(),
            "1.0 is not a valid literal value, must be one of: int, bytes, str, bool, Enum member, None"
        );
    }

    #[test]
    fn unresolved_alias_passes_through() {
        let e = InspectError::from(UnresolvedSymbol {
            alias: "A".into(),
            symbol: "B".into(),
        });
        assert_eq!(
            e.to_string(),
            "type alias 'A' references undefined symbol 'B'"
        );
    }
}
