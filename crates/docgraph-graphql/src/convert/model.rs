//! Model-to-type conversion.

use std::sync::Arc;

use docgraph_schema::{DocumentSchema, FieldDescriptor, FieldKind, Model, Requiredness};
use indexmap::IndexMap;
use tracing::{debug, trace};

use super::field::convert_field;
use super::{discriminator, is_valid_graphql_name};
use crate::error::ConvertError;
use crate::registry::TypeRegistry;
use crate::types::{CompositeType, FieldDef, TypeRef, scalars};

/// Converts a model's schema into a named composite type and returns the
/// type name. An implicit `_id` field is prepended when the schema does not
/// declare one, matching how document stores key every document.
///
/// Registered in the conversion memo: converting the same model (same schema
/// instance) twice returns the same type.
///
/// # Errors
///
/// `ConvertError::EmptyTypeName` for an empty model name, plus anything the
/// recursive field conversion raises.
pub fn convert_model(
    model: &Model,
    registry: &mut TypeRegistry,
    nested_discriminators: bool,
) -> Result<String, ConvertError> {
    if nested_discriminators && model.schema.has_discriminators() {
        if let Some(existing) = registry.composite_for_schema(&model.schema) {
            return Ok(existing.to_string());
        }
        let group = discriminator::DiscriminatorGroup::from_model(model, registry)?;
        return Ok(group.interface_name().to_string());
    }
    let name = convert_schema(&model.schema, &model.name, registry, nested_discriminators)?;
    if let Some(composite) = registry.composite_mut(&name)
        && !composite.has_field("_id")
    {
        composite.set_field(
            "_id",
            FieldDef::new(TypeRef::named(scalars::MONGO_ID).non_null()),
        );
        composite.reorder_fields(&["_id"]);
    }
    Ok(name)
}

/// Converts a document schema into a named composite type and returns the
/// type name.
///
/// Memoized by schema identity; the memo is written before field iteration
/// so self-referential schemas terminate (the recursive call gets the
/// reserved name back and leaves a name-based reference).
///
/// When `nested_discriminators` is set and the schema declares subtypes,
/// conversion delegates to the discriminator composer and the shared
/// interface's name is returned. This branch is checked before field
/// iteration so subtype schemas never re-enter it for their own base.
pub fn convert_schema(
    schema: &Arc<DocumentSchema>,
    type_name: &str,
    registry: &mut TypeRegistry,
    nested_discriminators: bool,
) -> Result<String, ConvertError> {
    if type_name.is_empty() {
        return Err(ConvertError::EmptyTypeName);
    }
    if let Some(existing) = registry.composite_for_schema(schema) {
        trace!(type_name = %existing, "Schema already converted, reusing");
        return Ok(existing.to_string());
    }

    if nested_discriminators && schema.has_discriminators() {
        let group =
            discriminator::DiscriminatorGroup::from_schema(schema, type_name, registry)?;
        return Ok(group.interface_name().to_string());
    }

    registry.declare_composite(type_name)?;
    registry.memoize_schema(schema, type_name);
    debug!(type_name = %type_name, "Converting schema");

    let composite = convert_fields(schema, type_name, registry, nested_discriminators)?;
    registry.insert_composite(composite);
    Ok(type_name.to_string())
}

/// Converts a schema's fields into a composite body without touching the
/// conversion memo. The caller declares, memoizes and inserts; the
/// discriminator composer shares this loop for base and subtype bodies.
pub(crate) fn convert_fields(
    schema: &Arc<DocumentSchema>,
    type_name: &str,
    registry: &mut TypeRegistry,
    nested_discriminators: bool,
) -> Result<CompositeType, ConvertError> {
    let mut composite = CompositeType::new(type_name);
    for (exposed, field) in fold_schema_fields(schema)? {
        if !is_valid_graphql_name(&exposed) {
            debug!(field = %exposed, type_name = %type_name, "Skipping field with invalid GraphQL name");
            continue;
        }

        let mut type_ref = convert_field(&field, type_name, registry, nested_discriminators)?;

        // Numeric ids default to Float through the scalar table, but
        // document ids are integral.
        if exposed == "_id" && type_ref == TypeRef::named(TypeRef::FLOAT) {
            type_ref = TypeRef::named(TypeRef::INT);
        }
        if field.required == Requiredness::Required {
            type_ref = type_ref.non_null();
        }

        let mut def = FieldDef::new(type_ref);
        def.description = field.description.clone();
        def.default_value = field.default_value.clone();
        if field.alias.is_some() {
            def.source_path = Some(field.path.clone());
        }
        composite.set_field(exposed, def);
    }
    Ok(composite)
}

/// Enumerates a schema's path-level fields, coalescing dotted paths into
/// synthetic embedded fields (`a.b` and `a.c` become one embedded field `a`
/// with fields `b` and `c`) and skipping reserved `__`-prefixed paths.
pub(crate) fn fold_schema_fields(
    schema: &DocumentSchema,
) -> Result<IndexMap<String, FieldDescriptor>, ConvertError> {
    let mut plain: IndexMap<String, FieldDescriptor> = IndexMap::new();
    let mut grouped: IndexMap<String, Vec<FieldDescriptor>> = IndexMap::new();

    for (path, field) in schema.fields() {
        if is_reserved_field(path) {
            continue;
        }
        match path.split_once('.') {
            None => {
                plain.insert(field.exposed_name().to_string(), field.clone());
            }
            Some((head, rest)) => {
                let mut remainder = field.clone();
                remainder.path = rest.to_string();
                grouped.entry(head.to_string()).or_default().push(remainder);
            }
        }
    }

    for (head, fields) in grouped {
        if plain.contains_key(&head) {
            return Err(ConvertError::invalid_field(format!(
                "path '{head}' is both a field and a dotted-path prefix"
            )));
        }
        let mut builder = DocumentSchema::builder();
        for field in fields {
            builder = builder.field(field)?;
        }
        plain.insert(
            head.clone(),
            FieldDescriptor::embedded(head, builder.build()),
        );
    }

    Ok(plain)
}

/// Whether a path is reserved and never exposed. GraphQL reserves the
/// `__` prefix for introspection.
pub(crate) fn is_reserved_field(name: &str) -> bool {
    name.starts_with("__")
}

#[cfg(test)]
mod tests {
    use docgraph_schema::IndexDefinition;

    use super::*;

    fn user_model() -> Model {
        let schema = DocumentSchema::builder()
            .field(FieldDescriptor::new("name", FieldKind::String).required())
            .unwrap()
            .field(FieldDescriptor::new("age", FieldKind::Number))
            .unwrap()
            .index(IndexDefinition::ascending("age"))
            .unwrap()
            .build();
        Model::new("User", "users", schema)
    }

    #[test]
    fn test_basic_conversion() {
        let model = user_model();
        let mut registry = TypeRegistry::new();
        let name = convert_model(&model, &mut registry, false).unwrap();
        assert_eq!(name, "User");

        let composite = registry.composite("User").unwrap();
        assert_eq!(composite.field_names(), vec!["_id", "name", "age"]);
        assert_eq!(
            composite.field("name").unwrap().type_ref.to_string(),
            "String!"
        );
        assert_eq!(composite.field("age").unwrap().type_ref.to_string(), "Float");
        assert_eq!(
            composite.field("_id").unwrap().type_ref.to_string(),
            "MongoID!"
        );
    }

    #[test]
    fn test_registry_idempotence() {
        let model = user_model();
        let mut registry = TypeRegistry::new();
        let first = convert_model(&model, &mut registry, false).unwrap();
        let second = convert_model(&model, &mut registry, false).unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.composites().len(), 1);
    }

    #[test]
    fn test_empty_name_rejected() {
        let model = user_model();
        let mut registry = TypeRegistry::new();
        let model = Model::new("", "users", model.schema);
        assert!(matches!(
            convert_model(&model, &mut registry, false),
            Err(ConvertError::EmptyTypeName)
        ));
    }

    #[test]
    fn test_dot_path_folding() {
        let schema = DocumentSchema::builder()
            .field(FieldDescriptor::new("subDoc.field1", FieldKind::String))
            .unwrap()
            .field(FieldDescriptor::new("subDoc.field2.field21", FieldKind::String))
            .unwrap()
            .build();
        let model = Model::new("User", "users", schema);

        let mut registry = TypeRegistry::new();
        convert_model(&model, &mut registry, false).unwrap();

        let composite = registry.composite("User").unwrap();
        assert_eq!(composite.field_names(), vec!["_id", "subDoc"]);

        let sub = registry.composite("UserSubDoc").unwrap();
        assert_eq!(sub.field_names(), vec!["field1", "field2"]);
        assert_eq!(
            sub.field("field1").unwrap().type_ref.to_string(),
            "String"
        );

        let sub2 = registry.composite("UserSubDocField2").unwrap();
        assert_eq!(sub2.field_names(), vec!["field21"]);
    }

    #[test]
    fn test_double_underscore_fields_skipped() {
        let schema = DocumentSchema::builder()
            .field(FieldDescriptor::new("__v", FieldKind::Number))
            .unwrap()
            .field(FieldDescriptor::new("name", FieldKind::String))
            .unwrap()
            .build();
        let model = Model::new("User", "users", schema);

        let mut registry = TypeRegistry::new();
        convert_model(&model, &mut registry, false).unwrap();
        let composite = registry.composite("User").unwrap();
        assert!(!composite.has_field("__v"));
        assert!(composite.has_field("name"));
    }

    #[test]
    fn test_alias_sets_source_path() {
        let schema = DocumentSchema::builder()
            .field(FieldDescriptor::new("n", FieldKind::String).with_alias("name"))
            .unwrap()
            .build();
        let model = Model::new("User", "users", schema);

        let mut registry = TypeRegistry::new();
        convert_model(&model, &mut registry, false).unwrap();
        let composite = registry.composite("User").unwrap();
        assert!(composite.has_field("name"));
        assert!(!composite.has_field("n"));
        assert_eq!(
            composite.field("name").unwrap().source_path.as_deref(),
            Some("n")
        );
    }

    #[test]
    fn test_numeric_id_forced_to_int() {
        let schema = DocumentSchema::builder()
            .field(FieldDescriptor::new("_id", FieldKind::Number))
            .unwrap()
            .build();
        let model = Model::new("Counter", "counters", schema);

        let mut registry = TypeRegistry::new();
        convert_model(&model, &mut registry, false).unwrap();
        let composite = registry.composite("Counter").unwrap();
        assert_eq!(composite.field("_id").unwrap().type_ref.to_string(), "Int");
    }
}
