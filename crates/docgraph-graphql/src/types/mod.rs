//! Intermediate representation of the generated type graph.
//!
//! Generated types are held in an inspectable, mutable form until the whole
//! graph is assembled, then lowered into `async_graphql::dynamic` types in a
//! final pass. This keeps structural operations (add/remove/reorder fields,
//! nullability changes, discriminator propagation) expressible: the dynamic
//! builders are write-only.

mod composite;
mod enum_type;
mod interface;
pub mod scalars;
mod type_ref;

pub use composite::{CompositeType, FieldDef};
pub use enum_type::EnumTypeDef;
pub(crate) use enum_type::sanitize_item_name;
pub use interface::{InterfaceTypeDef, PolymorphicMeta};
pub use type_ref::TypeRef;

/// An input object type: same field shape as [`CompositeType`] but lowered
/// into a GraphQL input object.
#[derive(Debug, Clone, Default)]
pub struct InputTypeDef {
    /// Type name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Ordered field map.
    pub fields: indexmap::IndexMap<String, FieldDef>,
}

impl InputTypeDef {
    /// Creates an empty input type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Adds or replaces a field, keeping insertion order for new fields.
    pub fn set_field(&mut self, name: impl Into<String>, field: FieldDef) {
        self.fields.insert(name.into(), field);
    }

    /// Removes a field by name.
    pub fn remove_field(&mut self, name: &str) {
        self.fields.shift_remove(name);
    }

    /// Exposed field names in order.
    #[must_use]
    pub fn field_names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }
}
