use serde::{Deserialize, Serialize};

/// A type qualifier restricting how an annotated field may be used.
///
/// Qualifiers wrap a type expression (`Final[int]`) or, for `Final`, may
/// appear bare with the wrapped type left implicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Qualifier {
    Final,
    ClassVar,
    Required,
    NotRequired,
    ReadOnly,
}

impl Qualifier {
    pub const ALL: [Qualifier; 5] = [
        Qualifier::Final,
        Qualifier::ClassVar,
        Qualifier::Required,
        Qualifier::NotRequired,
        Qualifier::ReadOnly,
    ];

    /// The snake_case label used in error messages and serialized output.
    pub fn label(self) -> &'static str {
        match self {
            Qualifier::Final => "final",
            Qualifier::ClassVar => "class_var",
            Qualifier::Required => "required",
            Qualifier::NotRequired => "not_required",
            Qualifier::ReadOnly => "read_only",
        }
    }

    /// The surface spelling used in annotation syntax.
    pub fn surface(self) -> &'static str {
        match self {
            Qualifier::Final => "Final",
            Qualifier::ClassVar => "ClassVar",
            Qualifier::Required => "Required",
            Qualifier::NotRequired => "NotRequired",
            Qualifier::ReadOnly => "ReadOnly",
        }
    }

    /// Match a surface spelling back to the qualifier.
    pub fn from_surface(name: &str) -> Option<Qualifier> {
        match name {
            "Final" => Some(Qualifier::Final),
            "ClassVar" => Some(Qualifier::ClassVar),
            "Required" => Some(Qualifier::Required),
            "NotRequired" => Some(Qualifier::NotRequired),
            "ReadOnly" => Some(Qualifier::ReadOnly),
            _ => None,
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Qualifier::Final => 1 << 0,
            Qualifier::ClassVar => 1 << 1,
            Qualifier::Required => 1 << 2,
            Qualifier::NotRequired => 1 << 3,
            Qualifier::ReadOnly => 1 << 4,
        }
    }
}

impl std::fmt::Display for Qualifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A set of qualifiers. Duplicates collapse; iteration order is fixed
/// (declaration order of [`Qualifier::ALL`]), independent of insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QualifierSet(u8);

impl QualifierSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn of(qualifiers: &[Qualifier]) -> Self {
        let mut bits = 0u8;
        let mut i = 0;
        while i < qualifiers.len() {
            bits |= qualifiers[i].bit();
            i += 1;
        }
        Self(bits)
    }

    pub const fn contains(self, qualifier: Qualifier) -> bool {
        self.0 & qualifier.bit() != 0
    }

    pub fn insert(&mut self, qualifier: Qualifier) {
        self.0 |= qualifier.bit();
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = Qualifier> {
        Qualifier::ALL.into_iter().filter(move |q| self.contains(*q))
    }
}

impl FromIterator<Qualifier> for QualifierSet {
    fn from_iter<I: IntoIterator<Item = Qualifier>>(iter: I) -> Self {
        let mut set = Self::empty();
        for q in iter {
            set.insert(q);
        }
        set
    }
}

impl std::fmt::Display for QualifierSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, q) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            f.write_str(q.label())?;
        }
        write!(f, "}}")
    }
}

impl Serialize for QualifierSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// Where an annotation originates. Each source admits a fixed set of
/// qualifiers; anything else is a hard error during inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationSource {
    /// An assignment or variable annotation (`x: Final[int] = 1`).
    AssignmentOrVariable,
    /// A class body annotation.
    Class,
    /// A typed-dictionary body annotation (optional-field record).
    TypedDict,
    /// A named-tuple body annotation (fixed-shape tuple record).
    NamedTuple,
    /// A function parameter or return annotation.
    Function,
    /// An annotation that might come from any source; all qualifiers allowed.
    Any,
    /// An annotation inspected as-is; no qualifiers allowed.
    Bare,
}

impl AnnotationSource {
    /// The qualifiers legal for annotations from this source.
    ///
    /// Total over every source; a new source variant must be given an
    /// explicit entry here (no fallback arm).
    pub fn allowed_qualifiers(self) -> QualifierSet {
        match self {
            AnnotationSource::AssignmentOrVariable => QualifierSet::of(&[Qualifier::Final]),
            AnnotationSource::Class => QualifierSet::of(&[Qualifier::Final, Qualifier::ClassVar]),
            AnnotationSource::TypedDict => QualifierSet::of(&[
                Qualifier::Required,
                Qualifier::NotRequired,
                Qualifier::ReadOnly,
            ]),
            AnnotationSource::NamedTuple => QualifierSet::empty(),
            AnnotationSource::Function => QualifierSet::empty(),
            AnnotationSource::Any => QualifierSet::of(&Qualifier::ALL),
            AnnotationSource::Bare => QualifierSet::empty(),
        }
    }
}

impl std::str::FromStr for AnnotationSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "assignment" | "variable" | "assignment_or_variable" => {
                Ok(AnnotationSource::AssignmentOrVariable)
            }
            "class" => Ok(AnnotationSource::Class),
            "typed_dict" | "typed-dict" => Ok(AnnotationSource::TypedDict),
            "named_tuple" | "named-tuple" => Ok(AnnotationSource::NamedTuple),
            "function" => Ok(AnnotationSource::Function),
            "any" => Ok(AnnotationSource::Any),
            "bare" => Ok(AnnotationSource::Bare),
            other => Err(format!("unknown annotation source '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_collapses_duplicates() {
        let mut set = QualifierSet::empty();
        set.insert(Qualifier::Final);
        set.insert(Qualifier::Final);
        assert_eq!(set.len(), 1);
        assert!(set.contains(Qualifier::Final));
        assert!(!set.contains(Qualifier::ClassVar));
    }

    #[test]
    fn iteration_order_is_insertion_independent() {
        let mut a = QualifierSet::empty();
        a.insert(Qualifier::ClassVar);
        a.insert(Qualifier::Final);
        let b = QualifierSet::of(&[Qualifier::Final, Qualifier::ClassVar]);
        assert_eq!(a, b);
        let order: Vec<_> = a.iter().collect();
        assert_eq!(order, vec![Qualifier::Final, Qualifier::ClassVar]);
    }

    #[test]
    fn set_display() {
        let set = QualifierSet::of(&[Qualifier::ReadOnly, Qualifier::Required]);
        assert_eq!(set.to_string(), "{required, read_only}");
    }

    #[test]
    fn allowed_qualifiers_per_source() {
        assert!(AnnotationSource::AssignmentOrVariable
            .allowed_qualifiers()
            .contains(Qualifier::Final));
        assert!(!AnnotationSource::AssignmentOrVariable
            .allowed_qualifiers()
            .contains(Qualifier::ClassVar));
        assert_eq!(AnnotationSource::NamedTuple.allowed_qualifiers().len(), 0);
        assert_eq!(AnnotationSource::Function.allowed_qualifiers().len(), 0);
        assert_eq!(AnnotationSource::Bare.allowed_qualifiers().len(), 0);
        assert_eq!(AnnotationSource::Any.allowed_qualifiers().len(), 5);
        assert_eq!(AnnotationSource::TypedDict.allowed_qualifiers().len(), 3);
    }

    #[test]
    fn source_from_str() {
        assert_eq!(
            "typed_dict".parse::<AnnotationSource>().unwrap(),
            AnnotationSource::TypedDict
        );
        assert!("nonsense".parse::<AnnotationSource>().is_err());
    }
}
