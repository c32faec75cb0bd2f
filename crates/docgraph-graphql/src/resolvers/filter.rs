//! Filter argument translation.
//!
//! GraphQL filter values speak in exposed field names and enum item names;
//! storage speaks in document paths and raw values. [`FieldTranslator`]
//! carries the per-field mapping decided at compose time and
//! [`filter_to_query`] rewrites a filter argument into a native query
//! document: `_operators` sub-objects become `$`-prefixed comparison
//! operators, `AND`/`OR` become `$and`/`$or`, and nested objects flatten
//! into dotted paths.

use std::sync::Arc;

use docgraph_schema::DocumentSchema;
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::convert::classify::{ComplexTypeCategory, classify};
use crate::convert::filter::FilterOperator;
use crate::convert::model::fold_schema_fields;
use crate::error::ConvertError;
use crate::types::sanitize_item_name;

/// Translation rule for one exposed field.
#[derive(Debug, Clone)]
pub struct FieldRule {
    /// The storage key in the parent document.
    pub storage_key: String,
    /// Enum item name → raw stored value, when the field is enum-typed.
    pub enum_map: Option<IndexMap<String, String>>,
    /// Translator for embedded documents.
    pub nested: Option<Arc<FieldTranslator>>,
    /// Whether the field holds a list.
    pub is_array: bool,
}

/// Exposed-name to storage translation for one document shape.
#[derive(Debug, Clone, Default)]
pub struct FieldTranslator {
    rules: IndexMap<String, FieldRule>,
}

impl FieldTranslator {
    /// Builds a translator from a schema, following the same path folding
    /// as type conversion so the rules line up with the generated fields.
    ///
    /// # Errors
    ///
    /// Propagates classification failures.
    pub fn from_schema(schema: &DocumentSchema) -> Result<Self, ConvertError> {
        let mut rules = IndexMap::new();
        for (exposed, field) in fold_schema_fields(schema)? {
            let is_array = field.is_array_like();
            // Arrays translate by their element.
            let element = match (&field.caster, is_array) {
                (Some(caster), true) => (**caster).clone(),
                _ => field.clone(),
            };

            let enum_map = if element.enum_values.is_empty() {
                None
            } else {
                let mut map = IndexMap::new();
                for raw in &element.enum_values {
                    map.insert(sanitize_item_name(raw), raw.clone());
                }
                Some(map)
            };

            let nested = match classify(&element)? {
                ComplexTypeCategory::Embedded | ComplexTypeCategory::DocumentArray => element
                    .nested
                    .as_ref()
                    .map(|s| Self::from_schema(s))
                    .transpose()?
                    .map(Arc::new),
                _ => None,
            };

            rules.insert(
                exposed,
                FieldRule {
                    storage_key: field.path.clone(),
                    enum_map,
                    nested,
                    is_array,
                },
            );
        }
        Ok(Self { rules })
    }

    /// Adds rules from another translator for names not yet covered. Used to
    /// widen a base translator with a discriminator subtype's own fields.
    pub fn merge(&mut self, other: &FieldTranslator) {
        for (name, rule) in &other.rules {
            if !self.rules.contains_key(name) {
                self.rules.insert(name.clone(), rule.clone());
            }
        }
    }

    /// The rule for an exposed field name.
    #[must_use]
    pub fn rule(&self, exposed: &str) -> Option<&FieldRule> {
        self.rules.get(exposed)
    }

    /// Rewrites a record value into storage shape: exposed names become
    /// storage keys, enum item names become raw values, embedded documents
    /// recurse. Unknown keys pass through untouched.
    #[must_use]
    pub fn translate_record(&self, value: &Value) -> Value {
        let Value::Object(fields) = value else {
            return value.clone();
        };
        let mut out = Map::new();
        for (key, field_value) in fields {
            match self.rule(key) {
                Some(rule) => {
                    out.insert(rule.storage_key.clone(), encode_value(rule, field_value));
                }
                None => {
                    out.insert(key.clone(), field_value.clone());
                }
            }
        }
        Value::Object(out)
    }

    /// Maps a stored document back into exposed shape: storage keys become
    /// exposed names and raw enum values become item names. The inverse of
    /// [`FieldTranslator::translate_record`].
    #[must_use]
    pub fn expose_document(&self, value: &Value) -> Value {
        let Value::Object(fields) = value else {
            return value.clone();
        };
        let mut out = Map::new();
        for (key, field_value) in fields {
            match self
                .rules
                .iter()
                .find(|(_, rule)| rule.storage_key == *key)
            {
                Some((exposed, rule)) => {
                    out.insert(exposed.clone(), decode_value(rule, field_value));
                }
                None => {
                    out.insert(key.clone(), field_value.clone());
                }
            }
        }
        Value::Object(out)
    }
}

/// Encodes one field value into storage shape under its rule.
fn encode_value(rule: &FieldRule, value: &Value) -> Value {
    match value {
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| encode_scalar(rule, v)).collect())
        }
        _ => encode_scalar(rule, value),
    }
}

fn encode_scalar(rule: &FieldRule, value: &Value) -> Value {
    if let (Some(map), Value::String(item)) = (&rule.enum_map, value)
        && let Some(raw) = map.get(item)
    {
        return Value::String(raw.clone());
    }
    if let (Some(nested), Value::Object(_)) = (&rule.nested, value) {
        return nested.translate_record(value);
    }
    value.clone()
}

fn decode_value(rule: &FieldRule, value: &Value) -> Value {
    match value {
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| decode_scalar(rule, v)).collect())
        }
        _ => decode_scalar(rule, value),
    }
}

fn decode_scalar(rule: &FieldRule, value: &Value) -> Value {
    if let (Some(map), Value::String(raw)) = (&rule.enum_map, value)
        && let Some((item, _)) = map.iter().find(|(_, v)| *v == raw)
    {
        return Value::String(item.clone());
    }
    if let (Some(nested), Value::Object(_)) = (&rule.nested, value) {
        return nested.expose_document(value);
    }
    value.clone()
}

/// Rewrites a filter argument into a native query document.
#[must_use]
pub fn filter_to_query(filter: &Value, translator: &FieldTranslator) -> Value {
    let Value::Object(fields) = filter else {
        return Value::Object(Map::new());
    };
    let mut query = Map::new();

    for (key, value) in fields {
        match key.as_str() {
            "AND" | "OR" => {
                let native = if key == "AND" { "$and" } else { "$or" };
                let subs: Vec<Value> = value
                    .as_array()
                    .map(|items| {
                        items
                            .iter()
                            .map(|f| filter_to_query(f, translator))
                            .collect()
                    })
                    .unwrap_or_default();
                query.insert(native.to_string(), Value::Array(subs));
            }
            "_operators" => {
                if let Value::Object(per_field) = value {
                    for (field_name, ops) in per_field {
                        let (storage, rule) = match translator.rule(field_name) {
                            Some(rule) => (rule.storage_key.clone(), Some(rule)),
                            None => (field_name.clone(), None),
                        };
                        let mut op_doc = Map::new();
                        if let Value::Object(ops) = ops {
                            for (op_name, op_value) in ops {
                                let Some(op) = FilterOperator::from_graphql(op_name) else {
                                    continue;
                                };
                                let encoded = match (op, rule) {
                                    (FilterOperator::Regex | FilterOperator::Exists, _) => {
                                        op_value.clone()
                                    }
                                    (_, Some(rule)) => encode_value(rule, op_value),
                                    (_, None) => op_value.clone(),
                                };
                                op_doc.insert(op.query_operator().to_string(), encoded);
                            }
                        }
                        merge_condition(&mut query, &storage, Value::Object(op_doc));
                    }
                }
            }
            _ => match translator.rule(key) {
                Some(rule) => flatten_condition(&mut query, &rule.storage_key, rule, value),
                None => {
                    query.insert(key.clone(), value.clone());
                }
            },
        }
    }

    Value::Object(query)
}

/// Flattens one filter condition to a dotted path. Recursion stops at
/// operator documents (any `$`-prefixed key) and at fields without an
/// embedded translator.
fn flatten_condition(query: &mut Map<String, Value>, path: &str, rule: &FieldRule, value: &Value) {
    if let (Some(nested), Value::Object(sub)) = (&rule.nested, value)
        && !sub.is_empty()
        && !sub.keys().any(|k| k.starts_with('$'))
    {
        for (sub_key, sub_value) in sub {
            match nested.rule(sub_key) {
                Some(sub_rule) => {
                    let dotted = format!("{path}.{}", sub_rule.storage_key);
                    flatten_condition(query, &dotted, sub_rule, sub_value);
                }
                None => {
                    query.insert(format!("{path}.{sub_key}"), sub_value.clone());
                }
            }
        }
        return;
    }
    let encoded = if value.is_object() {
        // Operator document: encode operand values, keep operators.
        let Value::Object(ops) = value else { unreachable!() };
        let mut out = Map::new();
        for (op, op_value) in ops {
            out.insert(op.clone(), encode_value(rule, op_value));
        }
        Value::Object(out)
    } else {
        encode_value(rule, value)
    };
    merge_condition(query, path, encoded);
}

/// Inserts a condition, merging operator documents targeting the same path.
fn merge_condition(query: &mut Map<String, Value>, path: &str, condition: Value) {
    match (query.get_mut(path), &condition) {
        (Some(Value::Object(existing)), Value::Object(new)) => {
            for (k, v) in new {
                existing.insert(k.clone(), v.clone());
            }
        }
        _ => {
            query.insert(path.to_string(), condition);
        }
    }
}
