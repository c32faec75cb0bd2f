//! Input-type generation.
//!
//! Contract: the input derived from a composite type makes every field
//! nullable, recursively, regardless of the output nullability. Nested
//! composite references are rewritten to their own derived input types,
//! memoized against self-reference. Record inputs (the `record` argument of
//! mutations) keep the output nullability instead, unless asked not to.

use std::collections::HashMap;

use crate::config::{InputOptions, RecordOptions};
use crate::error::ConvertError;
use crate::registry::TypeRegistry;
use crate::types::{FieldDef, InputTypeDef, TypeRef, scalars};

/// Derives (or fetches) the all-nullable input type of a composite and
/// applies the given restrictions to it. Returns the input type name.
///
/// # Errors
///
/// `ConvertError::UnknownType` when the composite is not registered.
pub fn build_input_type(
    composite_name: &str,
    registry: &mut TypeRegistry,
    options: &InputOptions,
    defaults_as_non_null: bool,
) -> Result<String, ConvertError> {
    let input_name = match &options.name {
        Some(name) => derive_input_as(composite_name, name, registry)?,
        None => derive_input(composite_name, registry)?,
    };

    if let Some(input) = registry.input_mut(&input_name) {
        if let Some(description) = &options.description {
            input.description = Some(description.clone());
        }
        apply_field_restrictions(
            input,
            &options.only_fields,
            &options.remove_fields,
            &options.required_fields,
        );
    }

    if defaults_as_non_null {
        let mut visited = HashMap::new();
        apply_defaults_as_non_null(&input_name, registry, &mut visited)?;
    }

    Ok(input_name)
}

/// Derives (or fetches) the plain all-nullable input of a composite,
/// recursively. Memoized: the memo entry is written before field mapping so
/// self-referential composites terminate.
pub(crate) fn derive_input(
    composite_name: &str,
    registry: &mut TypeRegistry,
) -> Result<String, ConvertError> {
    let input_name = format!("{composite_name}Input");
    derive_input_as(composite_name, &input_name, registry)
}

/// Like `derive_input` with an explicit input type name. The memo still
/// wins: once a composite has an input, later names are ignored.
fn derive_input_as(
    composite_name: &str,
    input_name: &str,
    registry: &mut TypeRegistry,
) -> Result<String, ConvertError> {
    if let Some(existing) = registry.input_for_composite(composite_name) {
        return Ok(existing.to_string());
    }

    registry.declare_input(input_name)?;
    registry.memoize_input(composite_name, input_name);

    let composite = registry
        .composite(composite_name)
        .ok_or_else(|| ConvertError::UnknownType {
            name: composite_name.to_string(),
        })?
        .clone();

    let mut input = InputTypeDef::new(input_name);
    input.description = composite.description.clone();
    for (name, field) in &composite.fields {
        let type_ref = map_input_type(&field.type_ref, registry)?;
        let mut def = FieldDef::new(type_ref.nullable());
        def.description = field.description.clone();
        def.default_value = field.default_value.clone();
        def.source_path = field.source_path.clone();
        input.set_field(name.clone(), def);
    }

    registry.insert_input(input);
    Ok(input_name.to_string())
}

/// Builds a record input for one mutation operation: output nullability is
/// kept unless `all_fields_nullable` asks for the input cloning rule.
///
/// # Errors
///
/// `ConvertError::UnknownType` when the composite is not registered;
/// `ConvertError::DuplicateTypeName` when the name is taken.
pub fn build_record_input(
    composite_name: &str,
    input_name: &str,
    registry: &mut TypeRegistry,
    options: &RecordOptions,
) -> Result<String, ConvertError> {
    registry.declare_input(input_name)?;

    let composite = registry
        .composite(composite_name)
        .ok_or_else(|| ConvertError::UnknownType {
            name: composite_name.to_string(),
        })?
        .clone();

    let mut input = InputTypeDef::new(input_name);
    for (name, field) in &composite.fields {
        let type_ref = map_input_type(&field.type_ref, registry)?;
        let type_ref = if options.all_fields_nullable {
            type_ref.nullable()
        } else if field.type_ref.is_non_null() {
            type_ref.non_null()
        } else {
            type_ref
        };
        let mut def = FieldDef::new(type_ref);
        def.description = field.description.clone();
        def.default_value = field.default_value.clone();
        def.source_path = field.source_path.clone();
        input.set_field(name.clone(), def);
    }
    apply_field_restrictions(&mut input, &[], &options.remove_fields, &options.required_fields);

    registry.insert_input(input);
    Ok(input_name.to_string())
}

/// Rewrites an output type reference into input space: composite base names
/// become their derived input names; interfaces, which have no input
/// counterpart, widen to the JSON scalar. Wrapping structure is preserved
/// except the outermost non-null, which the callers decide.
pub(crate) fn map_input_type(
    type_ref: &TypeRef,
    registry: &mut TypeRegistry,
) -> Result<TypeRef, ConvertError> {
    Ok(match type_ref {
        TypeRef::Named(base) => {
            if registry.composite(base).is_some() {
                TypeRef::named(derive_input(base, registry)?)
            } else if registry.interface(base).is_some() {
                TypeRef::named(scalars::JSON)
            } else {
                TypeRef::named(base.clone())
            }
        }
        TypeRef::NonNull(inner) => map_input_type(inner, registry)?.non_null(),
        TypeRef::List(inner) => map_input_type(inner, registry)?.list(),
    })
}

fn apply_field_restrictions(
    input: &mut InputTypeDef,
    only: &[String],
    remove: &[String],
    required: &[String],
) {
    if !only.is_empty() {
        input.fields.retain(|name, _| only.contains(name));
    }
    for name in remove {
        input.remove_field(name);
    }
    for name in required {
        if let Some(field) = input.fields.get_mut(name) {
            field.type_ref = field.type_ref.clone().non_null();
        }
    }
}

/// Bottom-up defaults-as-non-null: a field carrying a default value becomes
/// NonNull; a field of a nested input becomes NonNull only when that nested
/// input itself ended up containing NonNull defaulted fields.
fn apply_defaults_as_non_null(
    input_name: &str,
    registry: &mut TypeRegistry,
    visited: &mut HashMap<String, bool>,
) -> Result<bool, ConvertError> {
    if let Some(done) = visited.get(input_name) {
        return Ok(*done);
    }
    // In-progress marker breaks self-reference cycles.
    visited.insert(input_name.to_string(), false);

    let field_names: Vec<String> = registry
        .input(input_name)
        .map(|input| input.fields.keys().cloned().collect())
        .unwrap_or_default();

    let mut has_non_null_default = false;
    for name in field_names {
        let Some(field) = registry
            .input(input_name)
            .and_then(|input| input.fields.get(&name))
        else {
            continue;
        };
        let base = field.type_ref.base_name().to_string();
        let has_default = field.default_value.is_some();

        let force = if has_default {
            true
        } else if registry.input(&base).is_some() {
            apply_defaults_as_non_null(&base, registry, visited)?
        } else {
            false
        };

        if force && let Some(input) = registry.input_mut(input_name) {
            if let Some(field) = input.fields.get_mut(&name) {
                field.type_ref = field.type_ref.clone().non_null();
            }
            has_non_null_default = true;
        }
    }

    visited.insert(input_name.to_string(), has_non_null_default);
    Ok(has_non_null_default)
}

#[cfg(test)]
mod tests {
    use docgraph_schema::{DocumentSchema, FieldDescriptor, FieldKind, Model};
    use serde_json::json;

    use super::*;
    use crate::convert::model::convert_model;

    fn registry_with_user() -> TypeRegistry {
        let schema = DocumentSchema::builder()
            .field(FieldDescriptor::new("name", FieldKind::String).required())
            .unwrap()
            .field(
                FieldDescriptor::new("role", FieldKind::String)
                    .with_default(json!("member")),
            )
            .unwrap()
            .build();
        let model = Model::new("User", "users", schema);
        let mut registry = TypeRegistry::new();
        convert_model(&model, &mut registry, false).unwrap();
        registry
    }

    #[test]
    fn test_input_fields_all_nullable() {
        let mut registry = registry_with_user();
        let name =
            build_input_type("User", &mut registry, &InputOptions::default(), false).unwrap();
        assert_eq!(name, "UserInput");

        let input = registry.input("UserInput").unwrap();
        // `name` is NonNull on output but nullable on input.
        assert_eq!(input.fields["name"].type_ref.to_string(), "String");
        assert_eq!(input.fields["_id"].type_ref.to_string(), "MongoID");
    }

    #[test]
    fn test_input_memoized() {
        let mut registry = registry_with_user();
        let first =
            build_input_type("User", &mut registry, &InputOptions::default(), false).unwrap();
        let second =
            build_input_type("User", &mut registry, &InputOptions::default(), false).unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.inputs().len(), 1);
    }

    #[test]
    fn test_name_override() {
        let mut registry = registry_with_user();
        let options = InputOptions {
            name: Some("UserPatch".to_string()),
            ..Default::default()
        };
        let name = build_input_type("User", &mut registry, &options, false).unwrap();
        assert_eq!(name, "UserPatch");
        assert!(registry.input("UserPatch").is_some());
        assert!(registry.input("UserInput").is_none());

        // The memo keeps the override; later derivations reuse it.
        let again = derive_input("User", &mut registry).unwrap();
        assert_eq!(again, "UserPatch");
    }

    #[test]
    fn test_defaults_as_non_null() {
        let mut registry = registry_with_user();
        build_input_type("User", &mut registry, &InputOptions::default(), true).unwrap();

        let input = registry.input("UserInput").unwrap();
        assert_eq!(input.fields["role"].type_ref.to_string(), "String!");
        assert_eq!(input.fields["name"].type_ref.to_string(), "String");
    }

    #[test]
    fn test_required_override() {
        let mut registry = registry_with_user();
        let options = InputOptions {
            required_fields: vec!["name".to_string()],
            remove_fields: vec!["_id".to_string()],
            ..Default::default()
        };
        build_input_type("User", &mut registry, &options, false).unwrap();

        let input = registry.input("UserInput").unwrap();
        assert!(!input.fields.contains_key("_id"));
        assert_eq!(input.fields["name"].type_ref.to_string(), "String!");
    }

    #[test]
    fn test_record_input_keeps_output_nullability() {
        let mut registry = registry_with_user();
        let options = RecordOptions {
            remove_fields: vec!["_id".to_string()],
            ..Default::default()
        };
        build_record_input("User", "CreateOneUserInput", &mut registry, &options).unwrap();

        let input = registry.input("CreateOneUserInput").unwrap();
        assert_eq!(input.fields["name"].type_ref.to_string(), "String!");
        assert_eq!(input.fields["role"].type_ref.to_string(), "String");
        assert!(!input.fields.contains_key("_id"));
    }

    #[test]
    fn test_nested_composite_maps_to_nested_input() {
        let nested = DocumentSchema::builder()
            .field(FieldDescriptor::new("city", FieldKind::String).required())
            .unwrap()
            .build();
        let schema = DocumentSchema::builder()
            .field(FieldDescriptor::embedded("address", nested))
            .unwrap()
            .build();
        let model = Model::new("User", "users", schema);

        let mut registry = TypeRegistry::new();
        convert_model(&model, &mut registry, false).unwrap();
        build_input_type("User", &mut registry, &InputOptions::default(), false).unwrap();

        let input = registry.input("UserInput").unwrap();
        assert_eq!(
            input.fields["address"].type_ref.to_string(),
            "UserAddressInput"
        );
        let nested_input = registry.input("UserAddressInput").unwrap();
        assert_eq!(nested_input.fields["city"].type_ref.to_string(), "String");
    }
}
