//! Error types for schema conversion and resolver execution.
//!
//! Two families live here. [`ConvertError`] covers schema-setup time:
//! contract violations and schema-shape problems that must fail loudly
//! before a schema is ever built. [`OperationError`] covers request time:
//! storage and validation failures classified into the three payload error
//! shapes and routed either into the operation payload or into a top-level
//! GraphQL error with structured extensions.

use async_graphql::ErrorExtensions;
use docgraph_schema::{SchemaError, ValidationFailure};
use docgraph_storage::{ErrorCategory, StorageError};
use serde_json::{Value, json};

/// Errors raised while converting schemas into GraphQL types.
///
/// All of these are fatal to the conversion call that raised them; the
/// library performs no auto-repair.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// A field descriptor is malformed (empty path).
    #[error("invalid field descriptor: {reason}")]
    InvalidField {
        /// What is wrong with the descriptor.
        reason: String,
    },

    /// A type name was empty where one is required.
    #[error("type name must not be empty")]
    EmptyTypeName,

    /// Discriminator-aware conversion was requested for a schema that
    /// declares no discriminator subtypes.
    #[error("schema for '{type_name}' declares no discriminators")]
    MissingDiscriminator {
        /// The base type name.
        type_name: String,
    },

    /// The schema declares discriminators but no explicit discriminator key.
    #[error("schema for '{type_name}' has discriminators but no discriminator key")]
    MissingDiscriminatorKey {
        /// The base type name.
        type_name: String,
    },

    /// Two different schemas produced the same type name.
    #[error("duplicate type name '{name}'")]
    DuplicateTypeName {
        /// The colliding name.
        name: String,
    },

    /// A structural operation referenced a type the registry does not hold.
    #[error("unknown type '{name}'")]
    UnknownType {
        /// The missing type name.
        name: String,
    },

    /// A structural operation referenced a field the type does not have.
    #[error("type '{type_name}' has no field '{field}'")]
    UnknownField {
        /// The owning type name.
        type_name: String,
        /// The missing field name.
        field: String,
    },

    /// The underlying schema crate rejected a derived schema.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The final lowering into an executable schema failed.
    #[error("failed to build GraphQL schema: {0}")]
    SchemaBuildFailed(String),
}

impl ConvertError {
    pub(crate) fn invalid_field(reason: impl Into<String>) -> Self {
        Self::InvalidField {
            reason: reason.into(),
        }
    }
}

/// A request-time failure, classified for the dual-path error routing.
///
/// When the client's selection includes the payload `error` field, the error
/// is returned inline as a typed error object; otherwise it is surfaced as a
/// top-level GraphQL error carrying the same detail in extensions.
#[derive(Debug, Clone)]
pub enum OperationError {
    /// A document failed schema validation.
    Validation {
        /// Summary message.
        message: String,
        /// Per-field failures as `(path, message, value)`.
        errors: Vec<(String, String, Option<Value>)>,
    },
    /// The storage layer rejected the operation.
    Database {
        /// Error message.
        message: String,
        /// Native error code where the backend supplies one.
        code: Option<i64>,
    },
    /// Anything that fits neither of the above.
    Runtime {
        /// Error message.
        message: String,
    },
}

impl OperationError {
    /// Creates a runtime error.
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
        }
    }

    /// The concrete GraphQL type name this error resolves to.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "ValidationError",
            Self::Database { .. } => "DatabaseError",
            Self::Runtime { .. } => "RuntimeError",
        }
    }

    /// The discriminating tag stored inside the payload error object.
    fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Database { .. } => "database",
            Self::Runtime { .. } => "runtime",
        }
    }

    /// The error as a payload object, for clients that select the `error`
    /// field. The `kind` tag is consumed by interface type resolution and is
    /// not itself exposed as a field.
    #[must_use]
    pub fn to_payload_value(&self) -> Value {
        match self {
            Self::Validation { message, errors } => json!({
                "kind": self.kind(),
                "message": message,
                "errors": errors
                    .iter()
                    .map(|(path, message, value)| json!({
                        "path": path,
                        "message": message,
                        "value": value,
                    }))
                    .collect::<Vec<_>>(),
            }),
            Self::Database { message, code } => json!({
                "kind": self.kind(),
                "message": message,
                "code": code,
            }),
            Self::Runtime { message } => json!({
                "kind": self.kind(),
                "message": message,
            }),
        }
    }

    /// The error as a top-level GraphQL error with structured extensions,
    /// for clients that did not opt into the payload error field.
    #[must_use]
    pub fn to_graphql_error(&self) -> async_graphql::Error {
        let message = match self {
            Self::Validation { message, .. }
            | Self::Database { message, .. }
            | Self::Runtime { message } => message.clone(),
        };
        let detail = self.clone();

        async_graphql::Error::new(message).extend_with(move |_, e| {
            e.set("kind", detail.kind());
            match &detail {
                OperationError::Validation { errors, .. } => {
                    let list: Vec<Value> = errors
                        .iter()
                        .map(|(path, message, value)| {
                            json!({"path": path, "message": message, "value": value})
                        })
                        .collect();
                    if let Ok(value) = async_graphql::Value::from_json(Value::Array(list)) {
                        e.set("errors", value);
                    }
                }
                OperationError::Database { code, .. } => {
                    if let Some(code) = code {
                        e.set("code", *code);
                    }
                }
                OperationError::Runtime { .. } => {}
            }
        })
    }
}

impl std::fmt::Display for OperationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation { message, .. } => write!(f, "validation failed: {message}"),
            Self::Database { message, .. } => write!(f, "database error: {message}"),
            Self::Runtime { message } => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for OperationError {}

impl From<StorageError> for OperationError {
    fn from(err: StorageError) -> Self {
        match err.category() {
            ErrorCategory::Validation => {
                let errors = match &err {
                    StorageError::InvalidDocument { errors, .. } => errors
                        .iter()
                        .map(|(path, message)| (path.clone(), message.clone(), None))
                        .collect(),
                    _ => Vec::new(),
                };
                Self::Validation {
                    message: err.to_string(),
                    errors,
                }
            }
            ErrorCategory::NotFound | ErrorCategory::Conflict | ErrorCategory::Infrastructure => {
                Self::Database {
                    code: err.native_code(),
                    message: err.to_string(),
                }
            }
            ErrorCategory::Internal => Self::Runtime {
                message: err.to_string(),
            },
        }
    }
}

impl From<ValidationFailure> for OperationError {
    fn from(failure: ValidationFailure) -> Self {
        Self::Validation {
            message: failure.message,
            errors: failure
                .errors
                .into_iter()
                .map(|e| (e.path, e.message, e.value))
                .collect(),
        }
    }
}
