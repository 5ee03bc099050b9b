pub mod errors;
pub mod expr;
pub mod qualifier;
pub mod span;

pub use errors::{Diagnostic, DiagnosticBag, Severity};
pub use expr::{
    legacy_origin, LiteralMember, LiteralValue, TypeAlias, TypeExpr, TypeParam, TypeParamKind,
    UnresolvedSymbol,
};
pub use qualifier::{AnnotationSource, Qualifier, QualifierSet};
pub use span::{Position, Span};
