//! Name-based type references.

/// A reference to a named type, with list and non-null wrapping.
///
/// References are by name only, so self-referential types (a filter's
/// `AND`/`OR` fields, an embedded type referencing its parent) never form a
/// construction cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// A named type.
    Named(String),
    /// A non-null wrapper.
    NonNull(Box<TypeRef>),
    /// A list wrapper.
    List(Box<TypeRef>),
}

impl TypeRef {
    /// Built-in `String` scalar name.
    pub const STRING: &'static str = "String";
    /// Built-in `Int` scalar name.
    pub const INT: &'static str = "Int";
    /// Built-in `Float` scalar name.
    pub const FLOAT: &'static str = "Float";
    /// Built-in `Boolean` scalar name.
    pub const BOOLEAN: &'static str = "Boolean";

    /// A nullable reference to a named type.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Wraps in non-null. Idempotent.
    #[must_use]
    pub fn non_null(self) -> Self {
        match self {
            Self::NonNull(_) => self,
            other => Self::NonNull(Box::new(other)),
        }
    }

    /// Wraps in a list.
    #[must_use]
    pub fn list(self) -> Self {
        Self::List(Box::new(self))
    }

    /// Strips an outer non-null wrapper, if any.
    #[must_use]
    pub fn nullable(self) -> Self {
        match self {
            Self::NonNull(inner) => *inner,
            other => other,
        }
    }

    /// Whether the outermost wrapper is non-null.
    #[must_use]
    pub fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNull(_))
    }

    /// Whether a list wrapper appears anywhere in the reference.
    #[must_use]
    pub fn is_list(&self) -> bool {
        match self {
            Self::List(_) => true,
            Self::NonNull(inner) => inner.is_list(),
            Self::Named(_) => false,
        }
    }

    /// The innermost type name.
    #[must_use]
    pub fn base_name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::NonNull(inner) | Self::List(inner) => inner.base_name(),
        }
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{name}"),
            Self::NonNull(inner) => write!(f, "{inner}!"),
            Self::List(inner) => write!(f, "[{inner}]"),
        }
    }
}
