//! Discriminator composition.
//!
//! A schema with subtypes becomes a family of types: the base composite, a
//! shared interface cloned from the base's fields, and one composite per
//! subtype holding the base fields plus its own. Structural edits applied
//! through [`DiscriminatorGroup`] propagate over the whole family in a fixed
//! order (base, interface, then each subtype in registration order) so the
//! members never drift apart.

use std::sync::Arc;

use docgraph_schema::{DocumentSchema, Model};
use indexmap::IndexMap;
use tracing::debug;

use super::input::map_input_type;
use super::model::convert_fields;
use super::capitalize_first;
use crate::error::ConvertError;
use crate::registry::TypeRegistry;
use crate::types::{FieldDef, InputTypeDef, InterfaceTypeDef, TypeRef, sanitize_item_name};

/// What to do when subtypes disagree on a shared field's input shape while
/// merging their inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeConflictPolicy {
    /// Widen the conflicting field to the JSON scalar, nullable.
    #[default]
    WidenToJson,
    /// Drop the conflicting field from the merged input.
    Skip,
}

/// A composed discriminator family.
#[derive(Debug, Clone)]
pub struct DiscriminatorGroup {
    base: String,
    interface: String,
    key: String,
    children: IndexMap<String, String>,
}

impl DiscriminatorGroup {
    /// Composes a discriminated model into its type family. The model's
    /// base composite gets an implicit `_id` like any other model type, and
    /// the subtypes inherit it.
    ///
    /// # Errors
    ///
    /// `ConvertError::MissingDiscriminator` when the schema declares no
    /// subtypes, `ConvertError::MissingDiscriminatorKey` when it declares
    /// subtypes without a key field name.
    pub fn from_model(
        model: &Model,
        registry: &mut TypeRegistry,
    ) -> Result<Self, ConvertError> {
        let group = Self::compose(&model.schema, &model.name, registry, true)?;
        Ok(group)
    }

    /// Composes a discriminated schema reached through a nested field. The
    /// family mirrors the schema's declared fields exactly, with no implicit
    /// `_id`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`DiscriminatorGroup::from_model`].
    pub fn from_schema(
        schema: &Arc<DocumentSchema>,
        type_name: &str,
        registry: &mut TypeRegistry,
    ) -> Result<Self, ConvertError> {
        Self::compose(schema, type_name, registry, false)
    }

    fn compose(
        schema: &Arc<DocumentSchema>,
        type_name: &str,
        registry: &mut TypeRegistry,
        inject_id: bool,
    ) -> Result<Self, ConvertError> {
        if !schema.has_discriminators() {
            return Err(ConvertError::MissingDiscriminator {
                type_name: type_name.to_string(),
            });
        }
        let Some(key) = schema.discriminator_key() else {
            return Err(ConvertError::MissingDiscriminatorKey {
                type_name: type_name.to_string(),
            });
        };
        let key = key.to_string();
        let interface_name = format!("{type_name}Interface");

        // The memo points at the interface so self-references and repeat
        // conversions of this schema resolve to the polymorphic type. It is
        // written before field iteration so recursion terminates.
        registry.declare_composite(type_name)?;
        registry.memoize_schema(schema, &interface_name);
        debug!(type_name = %type_name, key = %key, "Composing discriminator family");

        let mut base = convert_fields(schema, type_name, registry, true)?;
        if inject_id && !base.has_field("_id") {
            base.set_field(
                "_id",
                FieldDef::new(TypeRef::named(crate::types::scalars::MONGO_ID).non_null()),
            );
            base.reorder_fields(&["_id"]);
        }
        // Every document in the family carries the tag.
        if base.has_field(&key) {
            base.make_field_non_null(&key);
        } else {
            base.set_field(&key, FieldDef::new(TypeRef::named(TypeRef::STRING).non_null()));
        }
        base.add_interface(&interface_name);

        let mut interface = InterfaceTypeDef::new(&interface_name, &key);
        interface.fields = base.fields.clone();
        interface.polymorphic.fallback = Some(type_name.to_string());

        let mut children = IndexMap::new();
        for (value, child_schema) in schema.discriminators() {
            let child_name = capitalize_first(&sanitize_item_name(value));
            registry.declare_composite(&child_name)?;
            registry.memoize_schema(child_schema, &child_name);

            let own = convert_fields(child_schema, &child_name, registry, true)?;
            let mut child = base.clone();
            child.name = child_name.clone();
            child.interfaces = vec![interface_name.clone()];
            // Base definitions win on shared names, so the family stays
            // interface-compatible.
            for (name, def) in own.fields {
                if !child.has_field(&name) {
                    child.set_field(name, def);
                }
            }
            registry.insert_composite(child);

            interface.add_implementer(value.clone(), child_name.clone());
            children.insert(value.clone(), child_name);
        }

        registry.insert_composite(base);
        registry.insert_interface(interface);

        Ok(Self {
            base: type_name.to_string(),
            interface: interface_name,
            key,
            children,
        })
    }

    /// The base composite's name.
    #[must_use]
    pub fn base_name(&self) -> &str {
        &self.base
    }

    /// The shared interface's name.
    #[must_use]
    pub fn interface_name(&self) -> &str {
        &self.interface
    }

    /// The discriminator key field name.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Tag value → subtype composite name, in registration order.
    #[must_use]
    pub fn children(&self) -> &IndexMap<String, String> {
        &self.children
    }

    /// Adds or replaces a field across the family.
    pub fn set_field(
        &self,
        registry: &mut TypeRegistry,
        name: impl Into<String>,
        field: FieldDef,
    ) {
        let name = name.into();
        self.apply(registry, |fields| {
            fields.insert(name.clone(), field.clone());
        });
    }

    /// Adds or replaces several fields across the family.
    pub fn add_fields<I>(&self, registry: &mut TypeRegistry, new_fields: I)
    where
        I: IntoIterator<Item = (String, FieldDef)>,
    {
        let new_fields: Vec<(String, FieldDef)> = new_fields.into_iter().collect();
        self.apply(registry, |fields| {
            for (name, field) in &new_fields {
                fields.insert(name.clone(), field.clone());
            }
        });
    }

    /// Removes a field across the family. The discriminator key cannot be
    /// removed.
    pub fn remove_field(&self, registry: &mut TypeRegistry, name: &str) {
        if name == self.key {
            return;
        }
        self.apply(registry, |fields| {
            fields.shift_remove(name);
        });
    }

    /// Keeps only the listed fields across the family. The discriminator
    /// key survives whether listed or not.
    pub fn remove_other_fields(&self, registry: &mut TypeRegistry, keep: &[&str]) {
        self.apply(registry, |fields| {
            fields.retain(|name, _| name == &self.key || keep.contains(&name.as_str()));
        });
    }

    /// Moves the listed fields to the front across the family.
    pub fn reorder_fields(&self, registry: &mut TypeRegistry, order: &[&str]) {
        self.apply(registry, |fields| {
            let mut reordered = IndexMap::with_capacity(fields.len());
            for name in order {
                if let Some(field) = fields.shift_remove(*name) {
                    reordered.insert((*name).to_string(), field);
                }
            }
            for (name, field) in fields.drain(..) {
                reordered.insert(name, field);
            }
            *fields = reordered;
        });
    }

    /// Makes a field non-null across the family.
    pub fn make_field_non_null(&self, registry: &mut TypeRegistry, name: &str) {
        self.apply(registry, |fields| {
            if let Some(field) = fields.get_mut(name) {
                field.type_ref = field.type_ref.clone().non_null();
            }
        });
    }

    /// Makes a field nullable across the family. The discriminator key
    /// stays non-null.
    pub fn make_field_nullable(&self, registry: &mut TypeRegistry, name: &str) {
        if name == self.key {
            return;
        }
        self.apply(registry, |fields| {
            if let Some(field) = fields.get_mut(name) {
                field.type_ref = field.type_ref.clone().nullable();
            }
        });
    }

    /// Marks fields deprecated across the family.
    pub fn deprecate_fields(&self, registry: &mut TypeRegistry, names: &[&str], reason: &str) {
        self.apply(registry, |fields| {
            for name in names {
                if let Some(field) = fields.get_mut(*name) {
                    field.deprecation = Some(reason.to_string());
                }
            }
        });
    }

    /// Applies an in-place edit to one field across the family.
    pub fn extend_field(
        &self,
        registry: &mut TypeRegistry,
        name: &str,
        edit: impl Fn(&mut FieldDef),
    ) {
        self.apply(registry, |fields| {
            if let Some(field) = fields.get_mut(name) {
                edit(field);
            }
        });
    }

    /// Runs a field-map edit over base, interface, then each subtype.
    fn apply(&self, registry: &mut TypeRegistry, edit: impl Fn(&mut IndexMap<String, FieldDef>)) {
        if let Some(base) = registry.composite_mut(&self.base) {
            edit(&mut base.fields);
        }
        if let Some(interface) = registry.interface_mut(&self.interface) {
            edit(&mut interface.fields);
        }
        for child in self.children.values() {
            if let Some(child) = registry.composite_mut(child) {
                edit(&mut child.fields);
            }
        }
    }

    /// Builds one input type usable against every subtype: the union of the
    /// subtypes' fields in input space. Fields not shared by all subtypes
    /// are nullable; fields whose shapes disagree follow `policy`. The
    /// discriminator key stays required so the subtype can be told apart.
    ///
    /// # Errors
    ///
    /// `ConvertError::DuplicateTypeName` when `input_name` is taken.
    pub fn merged_input(
        &self,
        registry: &mut TypeRegistry,
        input_name: &str,
        policy: MergeConflictPolicy,
    ) -> Result<String, ConvertError> {
        registry.declare_input(input_name)?;

        let mut merged: IndexMap<String, FieldDef> = IndexMap::new();
        let mut seen_in: IndexMap<String, usize> = IndexMap::new();
        let mut conflicted: Vec<String> = Vec::new();

        let child_names: Vec<String> = self.children.values().cloned().collect();
        for child_name in &child_names {
            let Some(child) = registry.composite(child_name).cloned() else {
                continue;
            };
            for (name, def) in &child.fields {
                let type_ref = map_input_type(&def.type_ref, registry)?;
                match merged.get(name) {
                    None => {
                        let mut input_def = FieldDef::new(type_ref);
                        input_def.source_path = def.source_path.clone();
                        merged.insert(name.clone(), input_def);
                        seen_in.insert(name.clone(), 1);
                    }
                    Some(existing) => {
                        if existing.type_ref != type_ref {
                            conflicted.push(name.clone());
                        }
                        *seen_in.entry(name.clone()).or_default() += 1;
                    }
                }
            }
        }

        for name in conflicted {
            match policy {
                MergeConflictPolicy::WidenToJson => {
                    if let Some(def) = merged.get_mut(&name) {
                        def.type_ref = TypeRef::named(crate::types::scalars::JSON);
                    }
                }
                MergeConflictPolicy::Skip => {
                    merged.shift_remove(&name);
                }
            }
        }

        let mut input = InputTypeDef::new(input_name);
        for (name, mut def) in merged {
            let universal = seen_in.get(&name).copied() == Some(child_names.len());
            if name == self.key {
                def.type_ref = def.type_ref.non_null();
            } else if !universal {
                def.type_ref = def.type_ref.nullable();
            }
            input.set_field(name, def);
        }
        registry.insert_input(input);
        Ok(input_name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use docgraph_schema::{FieldDescriptor, FieldKind};

    use super::*;

    fn character_model() -> Model {
        let person = DocumentSchema::builder()
            .field(FieldDescriptor::new("dob", FieldKind::Number))
            .unwrap()
            .build();
        let droid = DocumentSchema::builder()
            .field(FieldDescriptor::new("modelNumber", FieldKind::Number))
            .unwrap()
            .build();
        let schema = DocumentSchema::builder()
            .field(FieldDescriptor::new("name", FieldKind::String))
            .unwrap()
            .discriminator_key("type")
            .discriminator("Person", person)
            .unwrap()
            .discriminator("Droid", droid)
            .unwrap()
            .build();
        Model::new("Character", "characters", schema)
    }

    #[test]
    fn test_family_shape() {
        let model = character_model();
        let mut registry = TypeRegistry::new();
        let group = DiscriminatorGroup::from_model(&model, &mut registry).unwrap();

        assert_eq!(group.base_name(), "Character");
        assert_eq!(group.interface_name(), "CharacterInterface");
        assert_eq!(group.key(), "type");
        assert_eq!(
            group.children().values().collect::<Vec<_>>(),
            vec!["Person", "Droid"]
        );

        let base = registry.composite("Character").unwrap();
        assert_eq!(base.field_names(), vec!["_id", "name", "type"]);
        assert_eq!(base.interfaces, vec!["CharacterInterface"]);
        assert_eq!(base.field("type").unwrap().type_ref.to_string(), "String!");

        let person = registry.composite("Person").unwrap();
        assert_eq!(person.field_names(), vec!["_id", "name", "type", "dob"]);
        let droid = registry.composite("Droid").unwrap();
        assert!(droid.has_field("modelNumber"));
        assert!(!droid.has_field("dob"));

        let interface = registry.interface("CharacterInterface").unwrap();
        assert_eq!(interface.polymorphic.key, "type");
        assert_eq!(interface.polymorphic.type_for("Person"), Some("Person"));
        assert_eq!(interface.polymorphic.type_for("Unknown"), Some("Character"));
    }

    #[test]
    fn test_nested_family_has_no_implicit_id() {
        let model = character_model();
        let mut registry = TypeRegistry::new();
        let group =
            DiscriminatorGroup::from_schema(&model.schema, "Character", &mut registry).unwrap();

        let interface = registry.interface(group.interface_name()).unwrap();
        assert_eq!(interface.field_names(), vec!["name", "type"]);
    }

    #[test]
    fn test_mutations_propagate_in_order() {
        let model = character_model();
        let mut registry = TypeRegistry::new();
        let group = DiscriminatorGroup::from_model(&model, &mut registry).unwrap();

        group.set_field(
            &mut registry,
            "nickname",
            FieldDef::new(TypeRef::named(TypeRef::STRING)),
        );
        for type_name in ["Character", "Person", "Droid"] {
            assert!(registry.composite(type_name).unwrap().has_field("nickname"));
        }
        assert!(
            registry
                .interface("CharacterInterface")
                .unwrap()
                .fields
                .contains_key("nickname")
        );

        group.remove_field(&mut registry, "nickname");
        assert!(!registry.composite("Person").unwrap().has_field("nickname"));

        // The key survives removal attempts.
        group.remove_field(&mut registry, "type");
        group.remove_other_fields(&mut registry, &["name"]);
        let base = registry.composite("Character").unwrap();
        assert!(base.has_field("type"));
        assert!(base.has_field("name"));
        assert!(!base.has_field("_id"));
    }

    #[test]
    fn test_missing_key_rejected() {
        // Builder enforces the key at registration time, so drive the
        // composer with a schema assembled without subtypes.
        let schema = DocumentSchema::builder()
            .field(FieldDescriptor::new("name", FieldKind::String))
            .unwrap()
            .build();
        let mut registry = TypeRegistry::new();
        assert!(matches!(
            DiscriminatorGroup::from_schema(&schema, "Character", &mut registry),
            Err(ConvertError::MissingDiscriminator { .. })
        ));
    }

    #[test]
    fn test_merged_input_union() {
        let model = character_model();
        let mut registry = TypeRegistry::new();
        let group = DiscriminatorGroup::from_model(&model, &mut registry).unwrap();
        group
            .merged_input(&mut registry, "CharacterMergedInput", MergeConflictPolicy::default())
            .unwrap();

        let input = registry.input("CharacterMergedInput").unwrap();
        // Key stays required, subtype-specific fields are nullable.
        assert_eq!(input.fields["type"].type_ref.to_string(), "String!");
        assert_eq!(input.fields["dob"].type_ref.to_string(), "Float");
        assert_eq!(input.fields["modelNumber"].type_ref.to_string(), "Float");
        assert!(input.fields.contains_key("name"));
    }
}
