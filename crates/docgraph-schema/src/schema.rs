//! Document schemas and models.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::SchemaError;
use crate::field::FieldDescriptor;

/// Sort direction of one index component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOrder {
    /// Ascending.
    Ascending,
    /// Descending.
    Descending,
}

/// One declared index: an ordered path → direction map plus a uniqueness flag.
#[derive(Debug, Clone)]
pub struct IndexDefinition {
    /// Indexed paths in declaration order.
    pub fields: IndexMap<String, IndexOrder>,
    /// Whether the index enforces uniqueness.
    pub unique: bool,
}

impl IndexDefinition {
    /// Creates a non-unique single-field ascending index.
    pub fn ascending(path: impl Into<String>) -> Self {
        let mut fields = IndexMap::new();
        fields.insert(path.into(), IndexOrder::Ascending);
        Self { fields, unique: false }
    }

    /// Creates a compound index from (path, order) pairs.
    pub fn compound<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, IndexOrder)>,
        S: Into<String>,
    {
        let fields = pairs.into_iter().map(|(p, o)| (p.into(), o)).collect();
        Self { fields, unique: false }
    }

    /// Marks the index unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// The shape of documents in one collection.
///
/// Construct through [`SchemaBuilder`] and share as `Arc<DocumentSchema>`:
/// type-conversion caches key on the `Arc` pointer, so the same instance must
/// be reused for the same logical schema.
#[derive(Debug, Default)]
pub struct DocumentSchema {
    fields: IndexMap<String, FieldDescriptor>,
    indexes: Vec<IndexDefinition>,
    discriminator_key: Option<String>,
    discriminators: IndexMap<String, Arc<DocumentSchema>>,
}

impl DocumentSchema {
    /// Starts building a schema.
    #[must_use]
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// All declared fields in declaration order, keyed by path.
    #[must_use]
    pub fn fields(&self) -> &IndexMap<String, FieldDescriptor> {
        &self.fields
    }

    /// Looks up a field by its storage path.
    #[must_use]
    pub fn field(&self, path: &str) -> Option<&FieldDescriptor> {
        self.fields.get(path)
    }

    /// All declared indexes.
    #[must_use]
    pub fn indexes(&self) -> &[IndexDefinition] {
        &self.indexes
    }

    /// The discriminator key field name, if this schema declares subtypes.
    #[must_use]
    pub fn discriminator_key(&self) -> Option<&str> {
        self.discriminator_key.as_deref()
    }

    /// Discriminator value → subtype schema, in registration order.
    #[must_use]
    pub fn discriminators(&self) -> &IndexMap<String, Arc<DocumentSchema>> {
        &self.discriminators
    }

    /// Whether any discriminator subtype is registered.
    #[must_use]
    pub fn has_discriminators(&self) -> bool {
        !self.discriminators.is_empty()
    }

    /// Paths participating in any declared index, `_id` included.
    ///
    /// Used to decide which fields get comparison operators by default.
    #[must_use]
    pub fn indexed_paths(&self) -> Vec<String> {
        let mut paths = vec!["_id".to_string()];
        for index in &self.indexes {
            for path in index.fields.keys() {
                if !paths.iter().any(|p| p == path) {
                    paths.push(path.clone());
                }
            }
        }
        paths
    }
}

/// Builder for [`DocumentSchema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: IndexMap<String, FieldDescriptor>,
    indexes: Vec<IndexDefinition>,
    discriminator_key: Option<String>,
    discriminators: IndexMap<String, Arc<DocumentSchema>>,
}

impl SchemaBuilder {
    /// Adds a field.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::EmptyFieldPath` for an empty path and
    /// `SchemaError::DuplicateFieldPath` when the path is already declared.
    pub fn field(mut self, field: FieldDescriptor) -> Result<Self, SchemaError> {
        if field.path.is_empty() {
            return Err(SchemaError::EmptyFieldPath);
        }
        if self.fields.contains_key(&field.path) {
            return Err(SchemaError::DuplicateFieldPath { path: field.path });
        }
        self.fields.insert(field.path.clone(), field);
        Ok(self)
    }

    /// Adds an index.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::UnknownIndexPath` if the index names a path the
    /// schema does not declare (`_id` is always allowed).
    pub fn index(mut self, index: IndexDefinition) -> Result<Self, SchemaError> {
        for path in index.fields.keys() {
            if path != "_id" && !self.fields.contains_key(path) {
                return Err(SchemaError::UnknownIndexPath { path: path.clone() });
            }
        }
        self.indexes.push(index);
        Ok(self)
    }

    /// Sets the discriminator key field name.
    #[must_use]
    pub fn discriminator_key(mut self, key: impl Into<String>) -> Self {
        self.discriminator_key = Some(key.into());
        self
    }

    /// Registers a discriminator subtype schema under the given value.
    ///
    /// The child schema holds only the subtype-specific fields; the base
    /// fields are composed in by the type layer.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::MissingDiscriminatorKey` when no key is set and
    /// `SchemaError::DuplicateDiscriminator` when the value is taken.
    pub fn discriminator(
        mut self,
        value: impl Into<String>,
        child: Arc<DocumentSchema>,
    ) -> Result<Self, SchemaError> {
        let value = value.into();
        if self.discriminator_key.is_none() {
            return Err(SchemaError::MissingDiscriminatorKey { value });
        }
        if self.discriminators.contains_key(&value) {
            return Err(SchemaError::DuplicateDiscriminator { value });
        }
        self.discriminators.insert(value, child);
        Ok(self)
    }

    /// Finishes the schema.
    #[must_use]
    pub fn build(self) -> Arc<DocumentSchema> {
        Arc::new(DocumentSchema {
            fields: self.fields,
            indexes: self.indexes,
            discriminator_key: self.discriminator_key,
            discriminators: self.discriminators,
        })
    }
}

/// A named model: the handle resolvers close over.
///
/// `name` is the type name exposed to GraphQL (`User`), `collection` the
/// storage collection documents live in (`users`).
#[derive(Debug, Clone)]
pub struct Model {
    /// GraphQL-facing type name.
    pub name: String,
    /// Storage collection name.
    pub collection: String,
    /// The document schema.
    pub schema: Arc<DocumentSchema>,
}

impl Model {
    /// Creates a model.
    pub fn new(
        name: impl Into<String>,
        collection: impl Into<String>,
        schema: Arc<DocumentSchema>,
    ) -> Self {
        Self {
            name: name.into(),
            collection: collection.into(),
            schema,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldDescriptor, FieldKind};

    fn user_schema() -> Arc<DocumentSchema> {
        DocumentSchema::builder()
            .field(FieldDescriptor::new("name", FieldKind::String).required())
            .unwrap()
            .field(FieldDescriptor::new("age", FieldKind::Number))
            .unwrap()
            .index(IndexDefinition::ascending("name"))
            .unwrap()
            .build()
    }

    #[test]
    fn test_builder_rejects_duplicates() {
        let result = DocumentSchema::builder()
            .field(FieldDescriptor::new("name", FieldKind::String))
            .unwrap()
            .field(FieldDescriptor::new("name", FieldKind::Number));
        assert!(matches!(
            result,
            Err(SchemaError::DuplicateFieldPath { .. })
        ));
    }

    #[test]
    fn test_builder_rejects_empty_path() {
        let result = DocumentSchema::builder().field(FieldDescriptor::new("", FieldKind::String));
        assert!(matches!(result, Err(SchemaError::EmptyFieldPath)));
    }

    #[test]
    fn test_index_requires_known_path() {
        let result = DocumentSchema::builder()
            .field(FieldDescriptor::new("name", FieldKind::String))
            .unwrap()
            .index(IndexDefinition::ascending("missing"));
        assert!(matches!(result, Err(SchemaError::UnknownIndexPath { .. })));
    }

    #[test]
    fn test_indexed_paths_include_id() {
        let schema = user_schema();
        let paths = schema.indexed_paths();
        assert_eq!(paths, vec!["_id".to_string(), "name".to_string()]);
    }

    #[test]
    fn test_discriminator_requires_key() {
        let child = DocumentSchema::builder()
            .field(FieldDescriptor::new("dob", FieldKind::Date))
            .unwrap()
            .build();

        let result = DocumentSchema::builder().discriminator("Person", child.clone());
        assert!(matches!(
            result,
            Err(SchemaError::MissingDiscriminatorKey { .. })
        ));

        let schema = DocumentSchema::builder()
            .discriminator_key("type")
            .discriminator("Person", child)
            .unwrap()
            .build();
        assert!(schema.has_discriminators());
        assert_eq!(schema.discriminator_key(), Some("type"));
    }
}
