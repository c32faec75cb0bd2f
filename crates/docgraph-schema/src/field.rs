//! Field descriptors.
//!
//! A [`FieldDescriptor`] carries everything the type converter needs to know
//! about one schema field: its storage path, its kind, an optional element
//! descriptor for arrays, an optional nested schema for embedded documents,
//! enum values, requiredness, default value and external alias.

use std::sync::Arc;

use serde_json::Value;

use crate::schema::DocumentSchema;

/// The primitive instance kind of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// UTF-8 string.
    String,
    /// Double-precision number.
    Number,
    /// Boolean.
    Boolean,
    /// Date/timestamp.
    Date,
    /// Binary buffer.
    Buffer,
    /// Opaque document id (24-hex-char style).
    ObjectId,
    /// High-precision decimal (no float round-trip).
    Decimal,
    /// Schemaless JSON passthrough.
    Mixed,
    /// Array of some element kind (see `caster`).
    Array,
    /// Embedded sub-document (see `nested`).
    Embedded,
    /// Array of embedded sub-documents (see `nested`).
    DocumentArray,
}

/// Whether a field is required.
///
/// `Conditional` models a deferred/runtime predicate; it can never produce a
/// statically NonNull output field, only runtime validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Requiredness {
    /// The field may be absent.
    #[default]
    Optional,
    /// The field must always be present.
    Required,
    /// Required only under a runtime condition; treated as nullable by the
    /// type system but still checked by validation when configured to.
    Conditional,
}

/// One schema field.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Storage path, possibly dotted (`address.city`).
    pub path: String,
    /// Primitive instance kind.
    pub kind: FieldKind,
    /// Element descriptor for `Array` fields.
    pub caster: Option<Box<FieldDescriptor>>,
    /// Nested schema for `Embedded` / `DocumentArray` fields.
    pub nested: Option<Arc<DocumentSchema>>,
    /// Allowed values, in declaration order. Non-empty makes the field an enum.
    pub enum_values: Vec<String>,
    /// Whether the field is required.
    pub required: Requiredness,
    /// Default value, carried as metadata (not enforced by the type system).
    pub default_value: Option<Value>,
    /// External name exposed to clients, distinct from the storage path.
    pub alias: Option<String>,
    /// Human-readable description.
    pub description: Option<String>,
    /// Name of the model a reference field points at. Informational only:
    /// references are exposed as opaque id scalars.
    pub reference: Option<String>,
}

impl FieldDescriptor {
    /// Creates a descriptor with the given path and kind.
    pub fn new(path: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            path: path.into(),
            kind,
            caster: None,
            nested: None,
            enum_values: Vec::new(),
            required: Requiredness::Optional,
            default_value: None,
            alias: None,
            description: None,
            reference: None,
        }
    }

    /// Creates an array field with the given element descriptor.
    pub fn array(path: impl Into<String>, caster: FieldDescriptor) -> Self {
        let mut field = Self::new(path, FieldKind::Array);
        field.caster = Some(Box::new(caster));
        field
    }

    /// Creates an embedded sub-document field.
    pub fn embedded(path: impl Into<String>, nested: Arc<DocumentSchema>) -> Self {
        let mut field = Self::new(path, FieldKind::Embedded);
        field.nested = Some(nested);
        field
    }

    /// Creates an array-of-sub-documents field.
    pub fn document_array(path: impl Into<String>, nested: Arc<DocumentSchema>) -> Self {
        let mut field = Self::new(path, FieldKind::DocumentArray);
        field.nested = Some(nested);
        field
    }

    /// Marks the field required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = Requiredness::Required;
        self
    }

    /// Marks the field conditionally required.
    #[must_use]
    pub fn conditionally_required(mut self) -> Self {
        self.required = Requiredness::Conditional;
        self
    }

    /// Sets the allowed enum values.
    #[must_use]
    pub fn with_enum<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Sets the external alias.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the referenced model name.
    #[must_use]
    pub fn with_reference(mut self, model: impl Into<String>) -> Self {
        self.reference = Some(model.into());
        self
    }

    /// The name the field is exposed under: alias if present, else the last
    /// path segment.
    #[must_use]
    pub fn exposed_name(&self) -> &str {
        self.alias.as_deref().unwrap_or_else(|| {
            self.path.rsplit('.').next().unwrap_or(self.path.as_str())
        })
    }

    /// Whether the field behaves as an array (plain or document array).
    #[must_use]
    pub fn is_array_like(&self) -> bool {
        matches!(self.kind, FieldKind::Array | FieldKind::DocumentArray) || self.caster.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let field = FieldDescriptor::new("gender", FieldKind::String)
            .with_enum(["male", "female"])
            .required()
            .with_description("Stored gender tag");

        assert_eq!(field.path, "gender");
        assert_eq!(field.enum_values, vec!["male", "female"]);
        assert_eq!(field.required, Requiredness::Required);
    }

    #[test]
    fn test_exposed_name_prefers_alias() {
        let field = FieldDescriptor::new("n", FieldKind::String).with_alias("name");
        assert_eq!(field.exposed_name(), "name");

        let field = FieldDescriptor::new("address.city", FieldKind::String);
        assert_eq!(field.exposed_name(), "city");
    }

    #[test]
    fn test_array_is_array_like() {
        let field = FieldDescriptor::array(
            "skills",
            FieldDescriptor::new("skills", FieldKind::String),
        );
        assert!(field.is_array_like());
        assert!(!FieldDescriptor::new("age", FieldKind::Number).is_array_like());
    }
}
