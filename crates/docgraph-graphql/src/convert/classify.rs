//! Field classification.

use docgraph_schema::{FieldDescriptor, FieldKind};

use crate::error::ConvertError;

/// The complex-type category a field converts through.
///
/// Exactly one category per well-formed descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplexTypeCategory {
    /// Array of embedded sub-documents.
    DocumentArray,
    /// Embedded sub-document.
    Embedded,
    /// Array of some element type.
    Array,
    /// Schemaless JSON passthrough.
    Mixed,
    /// High-precision decimal.
    Decimal,
    /// Opaque id referencing another model.
    Reference,
    /// Closed set of string values.
    Enum,
    /// Plain scalar.
    Scalar,
}

/// Classifies one field descriptor.
///
/// Pure and total over well-formed descriptors; the decision order matters
/// because document-arrays and embeds both look array-ish in some schema
/// engines.
///
/// # Errors
///
/// Returns `ConvertError::InvalidField` for an empty path.
pub fn classify(field: &FieldDescriptor) -> Result<ComplexTypeCategory, ConvertError> {
    if field.path.is_empty() {
        return Err(ConvertError::invalid_field("field has no path"));
    }

    let category = if field.nested.is_some() && field.is_array_like() {
        ComplexTypeCategory::DocumentArray
    } else if field.kind == FieldKind::Embedded || field.nested.is_some() {
        ComplexTypeCategory::Embedded
    } else if field.kind == FieldKind::Array || field.caster.is_some() {
        ComplexTypeCategory::Array
    } else if field.kind == FieldKind::Mixed {
        ComplexTypeCategory::Mixed
    } else if field.kind == FieldKind::Decimal {
        ComplexTypeCategory::Decimal
    } else if field.kind == FieldKind::ObjectId {
        ComplexTypeCategory::Reference
    } else if !field.enum_values.is_empty() {
        ComplexTypeCategory::Enum
    } else {
        ComplexTypeCategory::Scalar
    };

    Ok(category)
}
