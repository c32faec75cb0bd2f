//! Document validation against a schema.
//!
//! Validation checks what the type system cannot enforce statically:
//! required fields actually present, enum values in range, and basic kind
//! agreement. Failures come back as a structured per-field list so callers
//! can surface them inline (the typed-error-as-data style) or attach them to
//! a top-level error.

use serde::Serialize;
use serde_json::Value;

use crate::field::{FieldKind, Requiredness};
use crate::schema::DocumentSchema;

/// One failed field check.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldFailure {
    /// Dotted storage path of the failing field.
    pub path: String,
    /// Why the check failed.
    pub message: String,
    /// The offending value, if any.
    pub value: Option<Value>,
}

/// A failed validation: summary message plus per-field detail.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationFailure {
    /// Summary message.
    pub message: String,
    /// Per-field failures.
    pub errors: Vec<FieldFailure>,
}

impl ValidationFailure {
    fn new(errors: Vec<FieldFailure>) -> Self {
        Self {
            message: format!("Document validation failed: {} error(s)", errors.len()),
            errors,
        }
    }
}

impl DocumentSchema {
    /// Validates a document against this schema.
    ///
    /// Only top-level and embedded fields declared by the schema are checked;
    /// unknown keys pass through untouched (mixed fields exist for a reason).
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationFailure`] listing every failing field.
    pub fn validate(&self, doc: &Value) -> Result<(), ValidationFailure> {
        let mut errors = Vec::new();
        self.collect_failures(doc, "", &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationFailure::new(errors))
        }
    }

    fn collect_failures(&self, doc: &Value, prefix: &str, errors: &mut Vec<FieldFailure>) {
        for (path, field) in self.fields() {
            let full_path = join_path(prefix, path);
            let value = lookup_path(doc, path);

            match value {
                None | Some(Value::Null) => {
                    if field.required == Requiredness::Required {
                        errors.push(FieldFailure {
                            path: full_path,
                            message: "required field is missing".to_string(),
                            value: None,
                        });
                    }
                }
                Some(value) => {
                    self.check_value(field.kind, &field.enum_values, field, value, &full_path, errors);
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn check_value(
        &self,
        kind: FieldKind,
        enum_values: &[String],
        field: &crate::field::FieldDescriptor,
        value: &Value,
        full_path: &str,
        errors: &mut Vec<FieldFailure>,
    ) {
        if !enum_values.is_empty() {
            match value.as_str() {
                Some(s) if enum_values.iter().any(|v| v == s) => {}
                _ => {
                    errors.push(FieldFailure {
                        path: full_path.to_string(),
                        message: format!("value is not one of {enum_values:?}"),
                        value: Some(value.clone()),
                    });
                }
            }
            return;
        }

        match kind {
            FieldKind::Embedded => {
                if let Some(nested) = &field.nested {
                    nested.collect_failures(value, full_path, errors);
                }
            }
            FieldKind::DocumentArray => {
                if let (Some(nested), Some(items)) = (&field.nested, value.as_array()) {
                    for (i, item) in items.iter().enumerate() {
                        nested.collect_failures(item, &format!("{full_path}.{i}"), errors);
                    }
                }
            }
            FieldKind::Array => {
                if let (Some(caster), Some(items)) = (&field.caster, value.as_array()) {
                    for (i, item) in items.iter().enumerate() {
                        self.check_value(
                            caster.kind,
                            &caster.enum_values,
                            caster,
                            item,
                            &format!("{full_path}.{i}"),
                            errors,
                        );
                    }
                }
            }
            FieldKind::String | FieldKind::ObjectId | FieldKind::Date | FieldKind::Decimal => {
                if !value.is_string() {
                    errors.push(FieldFailure {
                        path: full_path.to_string(),
                        message: "expected a string value".to_string(),
                        value: Some(value.clone()),
                    });
                }
            }
            FieldKind::Number => {
                if !value.is_number() {
                    errors.push(FieldFailure {
                        path: full_path.to_string(),
                        message: "expected a numeric value".to_string(),
                        value: Some(value.clone()),
                    });
                }
            }
            FieldKind::Boolean => {
                if !value.is_boolean() {
                    errors.push(FieldFailure {
                        path: full_path.to_string(),
                        message: "expected a boolean value".to_string(),
                        value: Some(value.clone()),
                    });
                }
            }
            // Mixed and Buffer accept anything JSON-shaped.
            FieldKind::Mixed | FieldKind::Buffer => {}
        }
    }
}

fn join_path(prefix: &str, path: &str) -> String {
    if prefix.is_empty() {
        path.to_string()
    } else {
        format!("{prefix}.{path}")
    }
}

/// Resolves a possibly-dotted path inside a document.
fn lookup_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = doc;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}
