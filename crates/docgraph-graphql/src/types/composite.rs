//! Generated object types.

use indexmap::IndexMap;
use serde_json::Value;

use super::type_ref::TypeRef;

/// One field of a generated type.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// The field's type.
    pub type_ref: TypeRef,
    /// Optional description.
    pub description: Option<String>,
    /// Default value, carried as metadata. Consumed by the input generator's
    /// defaults-as-non-null mode; never enforced on output.
    pub default_value: Option<Value>,
    /// Deprecation reason, if deprecated.
    pub deprecation: Option<String>,
    /// Storage key in the parent document when it differs from the exposed
    /// field name (alias). `None` means the exposed name is the storage key.
    pub source_path: Option<String>,
}

impl FieldDef {
    /// Creates a field with the given type and no metadata.
    pub fn new(type_ref: TypeRef) -> Self {
        Self {
            type_ref,
            description: None,
            default_value: None,
            deprecation: None,
            source_path: None,
        }
    }

    /// The key used to read this field from a stored document.
    #[must_use]
    pub fn storage_key<'a>(&'a self, exposed: &'a str) -> &'a str {
        self.source_path.as_deref().unwrap_or(exposed)
    }
}

/// A generated named object type.
///
/// Fields keep insertion order; the order is observable through the
/// structural operations and is preserved in the lowered schema.
#[derive(Debug, Clone, Default)]
pub struct CompositeType {
    /// Type name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Exposed field name → definition, in order.
    pub fields: IndexMap<String, FieldDef>,
    /// Names of interfaces this type implements.
    pub interfaces: Vec<String>,
}

impl CompositeType {
    /// Creates an empty type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Adds or replaces a field. New fields append; existing fields keep
    /// their position.
    pub fn set_field(&mut self, name: impl Into<String>, field: FieldDef) {
        self.fields.insert(name.into(), field);
    }

    /// Adds or replaces several fields at once.
    pub fn set_fields<I>(&mut self, fields: I)
    where
        I: IntoIterator<Item = (String, FieldDef)>,
    {
        for (name, field) in fields {
            self.fields.insert(name, field);
        }
    }

    /// Removes a field by name. Unknown names are ignored.
    pub fn remove_field(&mut self, name: &str) {
        self.fields.shift_remove(name);
    }

    /// Removes every field not named in `keep`.
    pub fn remove_other_fields(&mut self, keep: &[&str]) {
        self.fields.retain(|name, _| keep.contains(&name.as_str()));
    }

    /// Moves the listed fields to the front in the given order; fields not
    /// listed keep their relative order after them.
    pub fn reorder_fields(&mut self, order: &[&str]) {
        let mut reordered = IndexMap::with_capacity(self.fields.len());
        for name in order {
            if let Some(field) = self.fields.shift_remove(*name) {
                reordered.insert((*name).to_string(), field);
            }
        }
        for (name, field) in self.fields.drain(..) {
            reordered.insert(name, field);
        }
        self.fields = reordered;
    }

    /// Makes a field's outer type non-null.
    pub fn make_field_non_null(&mut self, name: &str) {
        if let Some(field) = self.fields.get_mut(name) {
            field.type_ref = field.type_ref.clone().non_null();
        }
    }

    /// Makes a field's outer type nullable.
    pub fn make_field_nullable(&mut self, name: &str) {
        if let Some(field) = self.fields.get_mut(name) {
            field.type_ref = field.type_ref.clone().nullable();
        }
    }

    /// Marks fields deprecated with the given reason.
    pub fn deprecate_fields(&mut self, names: &[&str], reason: &str) {
        for name in names {
            if let Some(field) = self.fields.get_mut(*name) {
                field.deprecation = Some(reason.to_string());
            }
        }
    }

    /// Applies an in-place edit to one field, if present.
    pub fn extend_field(&mut self, name: &str, edit: impl FnOnce(&mut FieldDef)) {
        if let Some(field) = self.fields.get_mut(name) {
            edit(field);
        }
    }

    /// Whether a field exists.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Looks up a field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }

    /// Exposed field names in order.
    #[must_use]
    pub fn field_names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    /// Adds an interface to the implements list.
    pub fn add_interface(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.interfaces.contains(&name) {
            self.interfaces.push(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CompositeType {
        let mut ty = CompositeType::new("User");
        ty.set_field("_id", FieldDef::new(TypeRef::named("MongoID").non_null()));
        ty.set_field("name", FieldDef::new(TypeRef::named("String")));
        ty.set_field("age", FieldDef::new(TypeRef::named("Float")));
        ty
    }

    #[test]
    fn test_field_order_preserved() {
        let ty = sample();
        assert_eq!(ty.field_names(), vec!["_id", "name", "age"]);
    }

    #[test]
    fn test_reorder_moves_listed_to_front() {
        let mut ty = sample();
        ty.reorder_fields(&["age", "name"]);
        assert_eq!(ty.field_names(), vec!["age", "name", "_id"]);
    }

    #[test]
    fn test_remove_other_fields() {
        let mut ty = sample();
        ty.remove_other_fields(&["name"]);
        assert_eq!(ty.field_names(), vec!["name"]);
    }

    #[test]
    fn test_nullability_toggles() {
        let mut ty = sample();
        ty.make_field_non_null("name");
        assert!(ty.field("name").unwrap().type_ref.is_non_null());
        ty.make_field_nullable("name");
        assert!(!ty.field("name").unwrap().type_ref.is_non_null());
    }

    #[test]
    fn test_storage_key_prefers_source_path() {
        let mut field = FieldDef::new(TypeRef::named("String"));
        assert_eq!(field.storage_key("name"), "name");
        field.source_path = Some("n".to_string());
        assert_eq!(field.storage_key("name"), "n");
    }
}
