//! Field-to-type conversion.

use docgraph_schema::{FieldDescriptor, FieldKind};
use tracing::trace;

use super::classify::{ComplexTypeCategory, classify};
use super::{capitalize_first, model};
use crate::error::ConvertError;
use crate::registry::TypeRegistry;
use crate::types::{EnumTypeDef, TypeRef, scalars};

/// The fixed scalar table: field kind → scalar type name.
///
/// Anything unmapped falls back to the JSON passthrough scalar.
#[must_use]
pub fn scalar_type_for(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::String => TypeRef::STRING,
        FieldKind::Number => TypeRef::FLOAT,
        FieldKind::Boolean => TypeRef::BOOLEAN,
        FieldKind::Date => scalars::DATE,
        FieldKind::Buffer => scalars::BUFFER,
        FieldKind::ObjectId => scalars::MONGO_ID,
        FieldKind::Decimal => scalars::DECIMAL,
        _ => scalars::JSON,
    }
}

/// Converts one field descriptor into an output type reference, synthesizing
/// nested named types (enums, embedded object types) through the registry.
///
/// `prefix` namespaces synthesized type names; model conversion passes the
/// owning type's name. The returned reference is nullable; requiredness is
/// applied by the model converter.
///
/// # Errors
///
/// Propagates classification and nested-conversion failures.
pub fn convert_field(
    field: &FieldDescriptor,
    prefix: &str,
    registry: &mut TypeRegistry,
    nested_discriminators: bool,
) -> Result<TypeRef, ConvertError> {
    match classify(field)? {
        ComplexTypeCategory::Scalar => Ok(TypeRef::named(scalar_type_for(field.kind))),
        ComplexTypeCategory::Decimal => Ok(TypeRef::named(scalars::DECIMAL)),
        ComplexTypeCategory::Reference => Ok(TypeRef::named(scalars::MONGO_ID)),
        ComplexTypeCategory::Mixed => Ok(TypeRef::named(scalars::JSON)),
        ComplexTypeCategory::Enum => {
            let name = format!("Enum{prefix}{}", capitalize_first(field.exposed_name()));
            if registry.enum_type(&name).is_none() {
                trace!(type_name = %name, "Synthesizing enum type");
                registry.insert_enum(EnumTypeDef::from_values(&name, &field.enum_values));
            }
            Ok(TypeRef::named(name))
        }
        ComplexTypeCategory::Array => {
            let element = unwrapped_caster(field)?;
            let inner = convert_field(&element, prefix, registry, nested_discriminators)?;
            Ok(inner.list())
        }
        ComplexTypeCategory::Embedded => {
            let nested = field
                .nested
                .as_ref()
                .ok_or_else(|| ConvertError::invalid_field("embedded field has no nested schema"))?;
            let name = format!("{prefix}{}", capitalize_first(field.exposed_name()));
            let name =
                model::convert_schema(nested, &name, registry, nested_discriminators)?;
            Ok(TypeRef::named(name))
        }
        ComplexTypeCategory::DocumentArray => {
            let nested = field
                .nested
                .as_ref()
                .ok_or_else(|| ConvertError::invalid_field("document array has no nested schema"))?;
            let name = format!("{prefix}{}", capitalize_first(field.exposed_name()));
            let name =
                model::convert_schema(nested, &name, registry, nested_discriminators)?;
            Ok(TypeRef::named(name).list())
        }
    }
}

/// The element descriptor of an array field, with reference metadata on the
/// array propagated down before recursion. An array without a declared
/// element behaves as an array of arbitrary JSON.
fn unwrapped_caster(field: &FieldDescriptor) -> Result<FieldDescriptor, ConvertError> {
    let mut element = match &field.caster {
        Some(caster) => (**caster).clone(),
        None => FieldDescriptor::new(field.path.clone(), FieldKind::Mixed),
    };
    if element.reference.is_none() {
        element.reference = field.reference.clone();
    }
    Ok(element)
}
