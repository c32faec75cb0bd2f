//! Schema definition errors.

/// Errors raised while defining a schema.
///
/// These are programmer errors in schema wiring and are meant to fail loudly
/// at setup time, before any schema is consumed.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A field was declared with an empty path.
    #[error("Field path must not be empty")]
    EmptyFieldPath,

    /// The same path was declared twice.
    #[error("Duplicate field path: {path}")]
    DuplicateFieldPath {
        /// The offending path.
        path: String,
    },

    /// A discriminator was registered on a schema without a discriminator key.
    #[error("Discriminator '{value}' registered but no discriminator key is set")]
    MissingDiscriminatorKey {
        /// The discriminator value being registered.
        value: String,
    },

    /// The same discriminator value was registered twice.
    #[error("Duplicate discriminator value: {value}")]
    DuplicateDiscriminator {
        /// The offending discriminator value.
        value: String,
    },

    /// An index referenced a path the schema does not declare.
    #[error("Index references unknown field path: {path}")]
    UnknownIndexPath {
        /// The offending path.
        path: String,
    },
}
