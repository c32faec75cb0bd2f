//! Record argument decoding.
//!
//! Mutation `record` arguments arrive in exposed shape (exposed field
//! names, enum item names). Decoding rewrites them into storage shape and,
//! for subtype operations, pins the discriminator key so a created document
//! always lands in its declared subtype.

use serde_json::Value;

use super::OperationSeed;

/// Decodes a record argument into a storage document.
#[must_use]
pub fn decode_record(record: &Value, seed: &OperationSeed) -> Value {
    let mut doc = seed.translator.translate_record(record);
    if let (Some((key, value)), Value::Object(fields)) = (&seed.discriminator, &mut doc) {
        fields.insert(key.clone(), Value::String(value.clone()));
    }
    doc
}

/// Maps a stored document back into exposed shape for the response.
#[must_use]
pub fn expose_document(doc: &Value, seed: &OperationSeed) -> Value {
    seed.translator.expose_document(doc)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use docgraph_schema::{DocumentSchema, FieldDescriptor, FieldKind, Model};
    use serde_json::json;

    use super::super::filter::FieldTranslator;
    use super::super::sort::SortPlan;
    use super::*;

    fn seed(discriminator: Option<(String, String)>) -> OperationSeed {
        let schema = DocumentSchema::builder()
            .field(FieldDescriptor::new("n", FieldKind::String).with_alias("name"))
            .unwrap()
            .build();
        OperationSeed {
            model: Model::new("User", "users", schema.clone()),
            translator: Arc::new(FieldTranslator::from_schema(&schema).unwrap()),
            sort_plan: Arc::new(SortPlan::from_schema(&schema)),
            discriminator,
            polymorphic: None,
            limit_default: 100,
        }
    }

    #[test]
    fn test_alias_decode() {
        let seed = seed(None);
        let doc = decode_record(&json!({"name": "Ada"}), &seed);
        assert_eq!(doc, json!({"n": "Ada"}));
        assert_eq!(expose_document(&doc, &seed), json!({"name": "Ada"}));
    }

    #[test]
    fn test_discriminator_pinned() {
        let seed = seed(Some(("type".to_string(), "Person".to_string())));
        let doc = decode_record(&json!({"name": "Ada", "type": "Droid"}), &seed);
        assert_eq!(doc["type"], "Person");
    }
}
