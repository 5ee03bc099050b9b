use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::qualifier::Qualifier;

/// A type expression: the structural description of an annotation.
///
/// Every shape the inspection engine distinguishes is a variant here, so
/// classification is an exhaustive `match` rather than predicate probing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeExpr {
    /// Atomic named type: `int`, `str`, `collections.OrderedDict`.
    Name(String),
    /// The fully-unconstrained placeholder.
    Any,
    /// `...`, standing in for an unspecified callable parameter list.
    Ellipsis,
    /// Parameterized generic: an origin applied to ordered arguments.
    /// The origin is itself an expression, so `MyAlias[int]` is a `Generic`
    /// with an [`Alias`](TypeExpr::Alias) origin.
    Generic {
        origin: Box<TypeExpr>,
        args: Vec<TypeExpr>,
    },
    /// A bracketed argument list, e.g. the `[int, str]` in
    /// `Callable[[int, str], bool]` or a bound parameter specification.
    ArgList(Vec<TypeExpr>),
    /// Ordered union alternatives. Order is preserved and alternatives are
    /// never deduplicated.
    Union(Vec<TypeExpr>),
    /// One qualifier wrapping exactly one inner expression.
    Qualified {
        qualifier: Qualifier,
        inner: Box<TypeExpr>,
    },
    /// A qualifier used with its argument implicit (`x: Final`).
    BareQualifier(Qualifier),
    /// Metadata wrapper: an inner type plus ordered, non-empty metadata.
    Annotated {
        inner: Box<TypeExpr>,
        metadata: Vec<Value>,
    },
    /// Reference to a lazily-resolved named alias.
    Alias(Arc<TypeAlias>),
    /// Literal value set.
    Literal(Vec<LiteralMember>),
    /// Unevaluated textual placeholder for a type not yet resolvable.
    ForwardRef(String),
    /// A declared type parameter.
    TypeParam(TypeParam),
    /// The `.args` capture form of a parameter specification.
    ParamSpecArgs(String),
    /// The `.kwargs` capture form of a parameter specification.
    ParamSpecKwargs(String),
    /// `*expr` unpacking; spliced into surrounding argument lists when its
    /// inner expression resolves to an [`ArgList`](TypeExpr::ArgList).
    Unpacked(Box<TypeExpr>),
    /// The reserved unparameterized-generic marker, never valid inside an
    /// annotation expression.
    GenericMarker,
    /// A legacy generic alias (`List`, `Dict`, ...) used bare; an opaque leaf.
    LegacyAlias(String),
}

impl TypeExpr {
    pub fn name(name: impl Into<String>) -> TypeExpr {
        TypeExpr::Name(name.into())
    }

    pub fn generic(origin: TypeExpr, args: Vec<TypeExpr>) -> TypeExpr {
        TypeExpr::Generic {
            origin: Box::new(origin),
            args,
        }
    }

    pub fn qualified(qualifier: Qualifier, inner: TypeExpr) -> TypeExpr {
        TypeExpr::Qualified {
            qualifier,
            inner: Box::new(inner),
        }
    }

    pub fn annotated(inner: TypeExpr, metadata: Vec<Value>) -> TypeExpr {
        TypeExpr::Annotated {
            inner: Box::new(inner),
            metadata,
        }
    }

    pub fn forward_ref(name: impl Into<String>) -> TypeExpr {
        TypeExpr::ForwardRef(name.into())
    }

    /// Combine alternatives into a union, flattening nested unions the way
    /// repeated pairwise `|` application would. A single alternative is
    /// returned unchanged.
    pub fn union_of(alternatives: Vec<TypeExpr>) -> TypeExpr {
        let mut flat = Vec::with_capacity(alternatives.len());
        for alt in alternatives {
            match alt {
                TypeExpr::Union(items) => flat.extend(items),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            flat.pop().unwrap()
        } else {
            TypeExpr::Union(flat)
        }
    }
}

/// Legacy generic aliases and the modern origins they stand for.
///
/// Initialized once, never mutated. A *bare* legacy alias is an opaque leaf
/// during traversal; a *subscripted* one is lowered to its modern origin by
/// the parser.
static LEGACY_ALIASES: &[(&str, &str)] = &[
    ("List", "list"),
    ("Dict", "dict"),
    ("Set", "set"),
    ("FrozenSet", "frozenset"),
    ("Tuple", "tuple"),
    ("Type", "type"),
    ("Deque", "collections.deque"),
    ("DefaultDict", "collections.defaultdict"),
    ("OrderedDict", "collections.OrderedDict"),
    ("Counter", "collections.Counter"),
    ("ChainMap", "collections.ChainMap"),
    ("Callable", "callable"),
    ("Iterable", "iterable"),
    ("Iterator", "iterator"),
    ("Generator", "generator"),
    ("Sequence", "sequence"),
    ("MutableSequence", "mutable_sequence"),
    ("Mapping", "mapping"),
    ("MutableMapping", "mutable_mapping"),
    ("AbstractSet", "set"),
    ("MutableSet", "mutable_set"),
    ("Text", "str"),
];

/// Look up the modern origin of a legacy alias name.
pub fn legacy_origin(name: &str) -> Option<&'static str> {
    LEGACY_ALIASES
        .iter()
        .find(|(legacy, _)| *legacy == name)
        .map(|(_, origin)| *origin)
}

/// A lazily-resolved named type alias.
///
/// The body may be [`Undefined`](AliasBody::Undefined) when the alias's
/// definition references a symbol that does not exist in its enclosing
/// scope; [`value`](TypeAlias::value) then fails deterministically until the
/// caller supplies a re-declared alias with a defined body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeAlias {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_params: Vec<TypeParam>,
    body: AliasBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum AliasBody {
    Defined(TypeExpr),
    Undefined { symbol: String },
}

impl TypeAlias {
    pub fn new(name: impl Into<String>, type_params: Vec<TypeParam>, value: TypeExpr) -> Self {
        Self {
            name: name.into(),
            type_params,
            body: AliasBody::Defined(value),
        }
    }

    /// An alias whose definition references `symbol`, which is not defined.
    pub fn undefined(
        name: impl Into<String>,
        type_params: Vec<TypeParam>,
        symbol: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            type_params,
            body: AliasBody::Undefined {
                symbol: symbol.into(),
            },
        }
    }

    /// Resolve the alias's value.
    pub fn value(&self) -> Result<&TypeExpr, UnresolvedSymbol> {
        match &self.body {
            AliasBody::Defined(value) => Ok(value),
            AliasBody::Undefined { symbol } => Err(UnresolvedSymbol {
                alias: self.name.clone(),
                symbol: symbol.clone(),
            }),
        }
    }

    pub fn into_expr(self) -> TypeExpr {
        TypeExpr::Alias(Arc::new(self))
    }
}

/// Resolution failure of a lazy type alias.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("type alias '{alias}' references undefined symbol '{symbol}'")]
pub struct UnresolvedSymbol {
    pub alias: String,
    pub symbol: String,
}

/// A declared type parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeParam {
    pub name: String,
    pub kind: TypeParamKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Box<TypeExpr>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeParamKind {
    /// An ordinary type variable, binding one argument.
    TypeVar,
    /// A variadic type-variable tuple, absorbing any number of arguments.
    TypeVarTuple,
    /// A parameter specification, binding an argument list.
    ParamSpec,
}

impl TypeParam {
    pub fn type_var(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeParamKind::TypeVar,
            default: None,
        }
    }

    pub fn type_var_tuple(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeParamKind::TypeVarTuple,
            default: None,
        }
    }

    pub fn param_spec(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeParamKind::ParamSpec,
            default: None,
        }
    }

    pub fn with_default(mut self, default: TypeExpr) -> Self {
        self.default = Some(Box::new(default));
        self
    }
}

/// One member of a literal value set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralMember {
    /// A concrete value.
    Value(LiteralValue),
    /// The type-level none sentinel, identical to the none value for
    /// deduplication purposes.
    NoneType,
    /// A nested lazy-alias reference.
    Alias(Arc<TypeAlias>),
}

/// A concrete literal value. Equality is kind-sensitive: an enum member and
/// an equal plain value never compare equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralValue {
    Int(i64),
    /// Representable but rejected by the literal type-kind check.
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Bool(bool),
    EnumMember { type_name: String, member: String },
    None,
}

impl PartialEq for LiteralValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (LiteralValue::Int(a), LiteralValue::Int(b)) => a == b,
            // bit comparison keeps equality reflexive for NaN
            (LiteralValue::Float(a), LiteralValue::Float(b)) => a.to_bits() == b.to_bits(),
            (LiteralValue::Str(a), LiteralValue::Str(b)) => a == b,
            (LiteralValue::Bytes(a), LiteralValue::Bytes(b)) => a == b,
            (LiteralValue::Bool(a), LiteralValue::Bool(b)) => a == b,
            (
                LiteralValue::EnumMember {
                    type_name: at,
                    member: am,
                },
                LiteralValue::EnumMember {
                    type_name: bt,
                    member: bm,
                },
            ) => at == bt && am == bm,
            (LiteralValue::None, LiteralValue::None) => true,
            _ => false,
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Int(v) => write!(f, "{}", v),
            LiteralValue::Float(v) => write!(f, "{:?}", v),
            LiteralValue::Str(v) => write!(f, "'{}'", v),
            LiteralValue::Bytes(v) => write!(f, "b'{}'", String::from_utf8_lossy(v)),
            LiteralValue::Bool(v) => f.write_str(if *v { "True" } else { "False" }),
            LiteralValue::EnumMember { type_name, member } => {
                write!(f, "{}.{}", type_name, member)
            }
            LiteralValue::None => f.write_str("None"),
        }
    }
}

impl fmt::Display for LiteralMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralMember::Value(v) => v.fmt(f),
            LiteralMember::NoneType => f.write_str("NoneType"),
            LiteralMember::Alias(alias) => f.write_str(&alias.name),
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Name(name) => f.write_str(name),
            TypeExpr::Any => f.write_str("Any"),
            TypeExpr::Ellipsis => f.write_str("..."),
            TypeExpr::Generic { origin, args } => {
                write!(f, "{}[", origin)?;
                write_list(f, args)?;
                write!(f, "]")
            }
            TypeExpr::ArgList(items) => {
                write!(f, "[")?;
                write_list(f, items)?;
                write!(f, "]")
            }
            TypeExpr::Union(alts) => {
                for (i, alt) in alts.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    alt.fmt(f)?;
                }
                Ok(())
            }
            TypeExpr::Qualified { qualifier, inner } => {
                write!(f, "{}[{}]", qualifier.surface(), inner)
            }
            TypeExpr::BareQualifier(qualifier) => f.write_str(qualifier.surface()),
            TypeExpr::Annotated { inner, metadata } => {
                write!(f, "Annotated[{}", inner)?;
                for value in metadata {
                    write!(f, ", {}", value)?;
                }
                write!(f, "]")
            }
            TypeExpr::Alias(alias) => f.write_str(&alias.name),
            TypeExpr::Literal(members) => {
                write!(f, "Literal[")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    member.fmt(f)?;
                }
                write!(f, "]")
            }
            TypeExpr::ForwardRef(name) => write!(f, "'{}'", name),
            TypeExpr::TypeParam(param) => f.write_str(&param.name),
            TypeExpr::ParamSpecArgs(name) => write!(f, "{}.args", name),
            TypeExpr::ParamSpecKwargs(name) => write!(f, "{}.kwargs", name),
            TypeExpr::Unpacked(inner) => write!(f, "*{}", inner),
            TypeExpr::GenericMarker => f.write_str("Generic"),
            TypeExpr::LegacyAlias(name) => f.write_str(name),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[TypeExpr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        fmt::Display::fmt(item, f)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn union_of_flattens_nested_unions() {
        let nested = TypeExpr::union_of(vec![
            TypeExpr::name("int"),
            TypeExpr::Union(vec![TypeExpr::name("str"), TypeExpr::name("bytes")]),
        ]);
        match nested {
            TypeExpr::Union(alts) => assert_eq!(alts.len(), 3),
            other => panic!("expected union, got {:?}", other),
        }
    }

    #[test]
    fn union_of_single_alternative_is_identity() {
        let single = TypeExpr::union_of(vec![TypeExpr::name("int")]);
        assert_eq!(single, TypeExpr::name("int"));
    }

    #[test]
    fn union_keeps_duplicates() {
        let u = TypeExpr::union_of(vec![TypeExpr::name("int"), TypeExpr::name("int")]);
        match u {
            TypeExpr::Union(alts) => assert_eq!(alts.len(), 2),
            other => panic!("expected union, got {:?}", other),
        }
    }

    #[test]
    fn legacy_table_lookup() {
        assert_eq!(legacy_origin("List"), Some("list"));
        assert_eq!(legacy_origin("OrderedDict"), Some("collections.OrderedDict"));
        assert_eq!(legacy_origin("list"), None);
    }

    #[test]
    fn alias_value_resolution() {
        let alias = TypeAlias::new("MyInt", vec![], TypeExpr::name("int"));
        assert_eq!(alias.value().unwrap(), &TypeExpr::name("int"));

        let broken = TypeAlias::undefined("Broken", vec![], "Missing");
        let err = broken.value().unwrap_err();
        assert_eq!(err.alias, "Broken");
        assert_eq!(err.symbol, "Missing");
        assert_eq!(
            err.to_string(),
            "type alias 'Broken' references undefined symbol 'Missing'"
        );
    }

    #[test]
    fn literal_value_equality_is_kind_sensitive() {
        assert_ne!(
            LiteralValue::Int(1),
            LiteralValue::EnumMember {
                type_name: "Color".into(),
                member: "RED".into(),
            }
        );
        assert_ne!(LiteralValue::Int(1), LiteralValue::Bool(true));
        assert_eq!(LiteralValue::Int(1), LiteralValue::Int(1));
    }

    #[test]
    fn display_round_trip_shapes() {
        let expr = TypeExpr::qualified(
            Qualifier::Final,
            TypeExpr::annotated(
                TypeExpr::generic(
                    TypeExpr::name("dict"),
                    vec![TypeExpr::name("str"), TypeExpr::name("int")],
                ),
                vec![json!("meta")],
            ),
        );
        assert_eq!(expr.to_string(), "Final[Annotated[dict[str, int], \"meta\"]]");

        let lit = TypeExpr::Literal(vec![
            LiteralMember::Value(LiteralValue::Int(1)),
            LiteralMember::Value(LiteralValue::Str("a".into())),
            LiteralMember::NoneType,
        ]);
        assert_eq!(lit.to_string(), "Literal[1, 'a', NoneType]");

        let union = TypeExpr::union_of(vec![TypeExpr::name("int"), TypeExpr::name("None")]);
        assert_eq!(union.to_string(), "int | None");
    }
}
