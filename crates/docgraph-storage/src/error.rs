//! Storage error types.

use std::fmt;

use serde_json::Value;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The addressed document was not found.
    #[error("Document not found in {collection}")]
    NotFound {
        /// Collection searched.
        collection: String,
    },

    /// An insert or update violated a unique index.
    #[error("Duplicate key in {collection}: {key}")]
    DuplicateKey {
        /// Collection the violation occurred in.
        collection: String,
        /// The violated key path.
        key: String,
    },

    /// The document failed schema validation.
    #[error("Invalid document: {message}")]
    InvalidDocument {
        /// Summary message.
        message: String,
        /// Per-field detail as (path, message) pairs.
        errors: Vec<(String, String)>,
    },

    /// The query document is malformed.
    #[error("Invalid query: {message}")]
    InvalidQuery {
        /// Description of the problem.
        message: String,
    },

    /// An internal storage error occurred.
    #[error("Internal storage error: {message}")]
    Internal {
        /// Description of the problem.
        message: String,
    },
}

impl StorageError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(collection: impl Into<String>) -> Self {
        Self::NotFound { collection: collection.into() }
    }

    /// Creates a new `DuplicateKey` error.
    #[must_use]
    pub fn duplicate_key(collection: impl Into<String>, key: impl Into<String>) -> Self {
        Self::DuplicateKey {
            collection: collection.into(),
            key: key.into(),
        }
    }

    /// Creates a new `InvalidDocument` error.
    #[must_use]
    pub fn invalid_document(message: impl Into<String>, errors: Vec<(String, String)>) -> Self {
        Self::InvalidDocument { message: message.into(), errors }
    }

    /// Creates a new `InvalidQuery` error.
    #[must_use]
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery { message: message.into() }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is a duplicate key error.
    #[must_use]
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }

    /// The native error code, where one exists (duplicate key maps to the
    /// conventional 11000).
    #[must_use]
    pub fn native_code(&self) -> Option<i64> {
        match self {
            Self::DuplicateKey { .. } => Some(11000),
            _ => None,
        }
    }

    /// Per-field validation detail, as a JSON array of `{path, message}`.
    #[must_use]
    pub fn field_errors(&self) -> Option<Value> {
        match self {
            Self::InvalidDocument { errors, .. } => Some(Value::Array(
                errors
                    .iter()
                    .map(|(path, message)| {
                        serde_json::json!({"path": path, "message": message})
                    })
                    .collect(),
            )),
            _ => None,
        }
    }

    /// Returns the error category for classification and logging.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::DuplicateKey { .. } => ErrorCategory::Conflict,
            Self::InvalidDocument { .. } => ErrorCategory::Validation,
            Self::InvalidQuery { .. } => ErrorCategory::Validation,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of storage errors for classification and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Document not found.
    NotFound,
    /// Constraint conflict (unique index).
    Conflict,
    /// Validation error.
    Validation,
    /// Infrastructure/connection error.
    Infrastructure,
    /// Internal error.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Validation => write!(f, "validation"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::not_found("users");
        assert_eq!(err.to_string(), "Document not found in users");

        let err = StorageError::duplicate_key("users", "email");
        assert_eq!(err.to_string(), "Duplicate key in users: email");
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            StorageError::not_found("users").category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            StorageError::duplicate_key("users", "email").category(),
            ErrorCategory::Conflict
        );
        assert_eq!(
            StorageError::invalid_document("bad", vec![]).category(),
            ErrorCategory::Validation
        );
    }

    #[test]
    fn test_native_code() {
        assert_eq!(
            StorageError::duplicate_key("users", "email").native_code(),
            Some(11000)
        );
        assert_eq!(StorageError::not_found("users").native_code(), None);
    }

    #[test]
    fn test_field_errors() {
        let err = StorageError::invalid_document(
            "validation failed",
            vec![("name".into(), "required field is missing".into())],
        );
        let detail = err.field_errors().unwrap();
        assert_eq!(detail[0]["path"], "name");
    }
}
