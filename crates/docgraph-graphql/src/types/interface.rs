//! Generated interface types.

use std::collections::HashMap;

use indexmap::IndexMap;

use super::composite::FieldDef;

/// How values typed as an interface resolve to a concrete object type:
/// a tag field inside the value maps to an implementing type name.
#[derive(Debug, Clone, Default)]
pub struct PolymorphicMeta {
    /// The tag field read from the value (discriminator key, or `kind` for
    /// error payloads).
    pub key: String,
    /// Tag value → concrete type name.
    pub types: HashMap<String, String>,
    /// Concrete type used when the tag is missing or matches no entry.
    pub fallback: Option<String>,
}

impl PolymorphicMeta {
    /// The concrete type name for a tag value, falling back to the
    /// registered default.
    #[must_use]
    pub fn type_for(&self, tag: &str) -> Option<&str> {
        self.types
            .get(tag)
            .or(self.fallback.as_ref())
            .map(String::as_str)
    }
}

/// A generated interface type.
///
/// The field set always mirrors the base type it was cloned from; the
/// discriminator composer keeps the two in sync through every propagated
/// mutation.
#[derive(Debug, Clone, Default)]
pub struct InterfaceTypeDef {
    /// Type name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Exposed field name → definition, in order.
    pub fields: IndexMap<String, FieldDef>,
    /// Concrete type resolution.
    pub polymorphic: PolymorphicMeta,
}

impl InterfaceTypeDef {
    /// Creates an empty interface with the given tag key.
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
            polymorphic: PolymorphicMeta {
                key: key.into(),
                types: HashMap::new(),
                fallback: None,
            },
        }
    }

    /// Registers an implementing type under a tag value.
    pub fn add_implementer(&mut self, tag: impl Into<String>, type_name: impl Into<String>) {
        self.polymorphic.types.insert(tag.into(), type_name.into());
    }

    /// Exposed field names in order.
    #[must_use]
    pub fn field_names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }
}
