//! Query-document matching.
//!
//! Pure evaluation of Mongo-style query documents against JSON documents.
//! Supported: implicit equality, comparison operators (`$eq`, `$ne`, `$gt`,
//! `$gte`, `$lt`, `$lte`), membership (`$in`, `$nin`), `$regex`, `$exists`,
//! and the logical combinators `$and` / `$or`. Paths may be dotted and
//! descend through arrays (any element may satisfy the condition).

use std::cmp::Ordering;

use regex::Regex;
use serde_json::Value;

use crate::error::StorageError;
use crate::types::{Projection, SortOrder, SortSpec};

/// Checks whether a document matches a query document.
///
/// # Errors
///
/// Returns `StorageError::InvalidQuery` for malformed operator usage
/// (non-array `$and`, unknown `$op`, invalid `$regex` pattern).
pub fn matches(doc: &Value, query: &Value) -> Result<bool, StorageError> {
    let Some(conditions) = query.as_object() else {
        return Err(StorageError::invalid_query("query must be an object"));
    };

    for (key, condition) in conditions {
        let ok = match key.as_str() {
            "$and" => logical_list(doc, condition, key)?.iter().all(|m| *m),
            "$or" => logical_list(doc, condition, key)?.iter().any(|m| *m),
            path => path_matches(doc, path, condition)?,
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn logical_list(doc: &Value, condition: &Value, op: &str) -> Result<Vec<bool>, StorageError> {
    let Some(clauses) = condition.as_array() else {
        return Err(StorageError::invalid_query(format!("{op} expects an array")));
    };
    clauses.iter().map(|clause| matches(doc, clause)).collect()
}

fn path_matches(doc: &Value, path: &str, condition: &Value) -> Result<bool, StorageError> {
    let mut found = Vec::new();
    resolve_path(doc, path, &mut found);

    if let Some(ops) = operator_object(condition) {
        let mut ok = true;
        for (op, operand) in ops {
            ok &= apply_operator(&found, op, operand)?;
        }
        return Ok(ok);
    }

    // Implicit equality: any resolved value equal to the operand, or an array
    // containing it.
    Ok(found.iter().any(|v| value_equals(v, condition)))
}

/// Returns the operator entries when every key of an object condition starts
/// with `$`; otherwise the condition is a literal value.
fn operator_object(condition: &Value) -> Option<Vec<(&str, &Value)>> {
    let obj = condition.as_object()?;
    if obj.is_empty() || !obj.keys().all(|k| k.starts_with('$')) {
        return None;
    }
    Some(obj.iter().map(|(k, v)| (k.as_str(), v)).collect())
}

fn apply_operator(found: &[&Value], op: &str, operand: &Value) -> Result<bool, StorageError> {
    match op {
        "$eq" => Ok(found.iter().any(|v| value_equals(v, operand))),
        "$ne" => Ok(!found.iter().any(|v| value_equals(v, operand))),
        "$gt" => Ok(any_compares(found, operand, |o| o == Ordering::Greater)),
        "$gte" => Ok(any_compares(found, operand, |o| o != Ordering::Less)),
        "$lt" => Ok(any_compares(found, operand, |o| o == Ordering::Less)),
        "$lte" => Ok(any_compares(found, operand, |o| o != Ordering::Greater)),
        "$in" => {
            let Some(candidates) = operand.as_array() else {
                return Err(StorageError::invalid_query("$in expects an array"));
            };
            Ok(found
                .iter()
                .any(|v| candidates.iter().any(|c| value_equals(v, c))))
        }
        "$nin" => {
            let Some(candidates) = operand.as_array() else {
                return Err(StorageError::invalid_query("$nin expects an array"));
            };
            Ok(!found
                .iter()
                .any(|v| candidates.iter().any(|c| value_equals(v, c))))
        }
        "$exists" => {
            let expected = operand.as_bool().unwrap_or(true);
            Ok(found.is_empty() != expected)
        }
        "$regex" => {
            let Some(pattern) = operand.as_str() else {
                return Err(StorageError::invalid_query("$regex expects a string"));
            };
            let re = Regex::new(pattern).map_err(|e| {
                StorageError::invalid_query(format!("invalid $regex pattern: {e}"))
            })?;
            Ok(found
                .iter()
                .any(|v| v.as_str().is_some_and(|s| re.is_match(s))))
        }
        other => Err(StorageError::invalid_query(format!(
            "unsupported operator: {other}"
        ))),
    }
}

fn any_compares(found: &[&Value], operand: &Value, pred: impl Fn(Ordering) -> bool) -> bool {
    found
        .iter()
        .any(|v| compare_values(v, operand).is_some_and(&pred))
}

/// Equality with array-membership semantics: a stored array equals the
/// operand when any element does.
fn value_equals(stored: &Value, operand: &Value) -> bool {
    if stored == operand {
        return true;
    }
    match stored {
        Value::Array(items) => items.iter().any(|item| item == operand),
        _ => false,
    }
}

/// Same-type comparison. Mixed types never compare (no match), mirroring the
/// behavior of typed range operators.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Resolves a dotted path, descending into arrays at every level.
fn resolve_path<'a>(value: &'a Value, path: &str, out: &mut Vec<&'a Value>) {
    match path.split_once('.') {
        None => collect_leaf(value, path, out),
        Some((head, rest)) => match value {
            Value::Object(obj) => {
                if let Some(next) = obj.get(head) {
                    resolve_path(next, rest, out);
                }
            }
            Value::Array(items) => {
                for item in items {
                    resolve_path(item, path, out);
                }
            }
            _ => {}
        },
    }
}

fn collect_leaf<'a>(value: &'a Value, key: &str, out: &mut Vec<&'a Value>) {
    match value {
        Value::Object(obj) => {
            if let Some(v) = obj.get(key) {
                out.push(v);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_leaf(item, key, out);
            }
        }
        _ => {}
    }
}

/// Total cross-type ordering used for sorting: null < bool < number <
/// string < array < object.
#[must_use]
pub fn compare_for_sort(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Sorts documents in place by a sort specification.
pub fn sort_documents(docs: &mut [Value], spec: &SortSpec) {
    docs.sort_by(|a, b| {
        for (path, order) in spec {
            let mut va = Vec::new();
            let mut vb = Vec::new();
            resolve_path(a, path, &mut va);
            resolve_path(b, path, &mut vb);
            let null = Value::Null;
            let x = va.first().copied().unwrap_or(&null);
            let y = vb.first().copied().unwrap_or(&null);
            let ord = match order {
                SortOrder::Ascending => compare_for_sort(x, y),
                SortOrder::Descending => compare_for_sort(y, x),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

/// Applies a field projection to a document. `_id` is always kept.
#[must_use]
pub fn apply_projection(doc: &Value, projection: &Projection) -> Value {
    match projection {
        Projection::All => doc.clone(),
        Projection::Fields(paths) => {
            let Some(obj) = doc.as_object() else {
                return doc.clone();
            };
            let mut out = serde_json::Map::new();
            if let Some(id) = obj.get("_id") {
                out.insert("_id".to_string(), id.clone());
            }
            for path in paths {
                let key = path.split('.').next().unwrap_or(path);
                if let Some(v) = obj.get(key) {
                    out.insert(key.to_string(), v.clone());
                }
            }
            Value::Object(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc() -> Value {
        json!({
            "_id": "a1",
            "name": "Ada",
            "age": 36,
            "active": true,
            "skills": ["math", "code"],
            "address": {"city": "London", "geo": {"lat": 51.5}},
            "posts": [{"title": "one"}, {"title": "two"}]
        })
    }

    #[test]
    fn test_implicit_equality() {
        assert!(matches(&doc(), &json!({"name": "Ada"})).unwrap());
        assert!(!matches(&doc(), &json!({"name": "Bob"})).unwrap());
    }

    #[test]
    fn test_array_membership_equality() {
        assert!(matches(&doc(), &json!({"skills": "math"})).unwrap());
        assert!(!matches(&doc(), &json!({"skills": "golf"})).unwrap());
    }

    #[test]
    fn test_dotted_path() {
        assert!(matches(&doc(), &json!({"address.city": "London"})).unwrap());
        assert!(matches(&doc(), &json!({"address.geo.lat": 51.5})).unwrap());
        assert!(matches(&doc(), &json!({"posts.title": "two"})).unwrap());
    }

    #[test]
    fn test_comparison_operators() {
        assert!(matches(&doc(), &json!({"age": {"$gt": 30}})).unwrap());
        assert!(!matches(&doc(), &json!({"age": {"$gt": 40}})).unwrap());
        assert!(matches(&doc(), &json!({"age": {"$gte": 36, "$lt": 40}})).unwrap());
        assert!(matches(&doc(), &json!({"age": {"$ne": 35}})).unwrap());
    }

    #[test]
    fn test_in_nin() {
        assert!(matches(&doc(), &json!({"age": {"$in": [35, 36]}})).unwrap());
        assert!(matches(&doc(), &json!({"skills": {"$in": ["code"]}})).unwrap());
        assert!(matches(&doc(), &json!({"age": {"$nin": [1, 2]}})).unwrap());
    }

    #[test]
    fn test_regex_and_exists() {
        assert!(matches(&doc(), &json!({"name": {"$regex": "^A"}})).unwrap());
        assert!(!matches(&doc(), &json!({"name": {"$regex": "^B"}})).unwrap());
        assert!(matches(&doc(), &json!({"name": {"$exists": true}})).unwrap());
        assert!(matches(&doc(), &json!({"missing": {"$exists": false}})).unwrap());
    }

    #[test]
    fn test_logical_combinators() {
        let q = json!({"$and": [{"age": {"$gt": 30}}, {"active": true}]});
        assert!(matches(&doc(), &q).unwrap());

        let q = json!({"$or": [{"age": {"$gt": 100}}, {"name": "Ada"}]});
        assert!(matches(&doc(), &q).unwrap());

        let q = json!({"$or": [{"age": {"$gt": 100}}, {"name": "Bob"}]});
        assert!(!matches(&doc(), &q).unwrap());
    }

    #[test]
    fn test_invalid_query() {
        assert!(matches(&doc(), &json!("nope")).is_err());
        assert!(matches(&doc(), &json!({"$and": "nope"})).is_err());
        assert!(matches(&doc(), &json!({"age": {"$frob": 1}})).is_err());
        assert!(matches(&doc(), &json!({"name": {"$regex": "("}})).is_err());
    }

    #[test]
    fn test_sort_documents() {
        let mut docs = vec![json!({"n": 3}), json!({"n": 1}), json!({"n": 2})];
        let mut spec = SortSpec::new();
        spec.insert("n".to_string(), SortOrder::Descending);
        sort_documents(&mut docs, &spec);
        assert_eq!(docs[0]["n"], 3);
        assert_eq!(docs[2]["n"], 1);
    }

    #[test]
    fn test_sort_missing_values_first_ascending() {
        let mut docs = vec![json!({"n": 1}), json!({})];
        let mut spec = SortSpec::new();
        spec.insert("n".to_string(), SortOrder::Ascending);
        sort_documents(&mut docs, &spec);
        assert_eq!(docs[0], json!({}));
    }

    #[test]
    fn test_projection() {
        let projected = apply_projection(&doc(), &Projection::Fields(vec!["name".into()]));
        assert_eq!(projected, json!({"_id": "a1", "name": "Ada"}));

        let all = apply_projection(&doc(), &Projection::All);
        assert_eq!(all, doc());
    }
}
