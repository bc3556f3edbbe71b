//! Derives a JSON Schema describing the shape of a sample payload.

use serde_json::{json, Map, Value};
use std::collections::BTreeSet;

pub const SCHEMA_DIALECT: &str = "http://json-schema.org/draft-07/schema#";

/// Every observed object key becomes required, and array items are merged
/// into a single schema. Values of different types under one key produce an
/// `anyOf`.
pub fn infer_schema(sample: &Value) -> Value {
    let mut schema = shape_of(sample);
    if let Value::Object(fields) = &mut schema {
        let dialect = Value::String(SCHEMA_DIALECT.into());
        fields.insert(String::from("$schema"), dialect);
    }
    schema
}

fn shape_of(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "type": "null" }),
        Value::Bool(_) => json!({ "type": "boolean" }),
        Value::Number(number) if number.is_i64() || number.is_u64() => json!({ "type": "integer" }),
        Value::Number(_) => json!({ "type": "number" }),
        Value::String(_) => json!({ "type": "string" }),
        Value::Array(items) => {
            let mut schema = json!({ "type": "array" });
            if let Some(items) = items.iter().map(shape_of).reduce(merge) {
                schema["items"] = items;
            }
            schema
        }
        Value::Object(fields) => {
            let properties = fields
                .iter()
                .map(|(key, value)| (key.clone(), shape_of(value)))
                .collect::<Map<_, _>>();
            let required = fields.keys().cloned().collect::<BTreeSet<_>>();
            object_schema(properties, required)
        }
    }
}

fn object_schema(properties: Map<String, Value>, required: BTreeSet<String>) -> Value {
    let mut schema = json!({ "type": "object", "properties": properties });
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}

fn merge(left: Value, right: Value) -> Value {
    if left == right {
        return left;
    }

    let mut merged: Vec<Value> = Vec::new();
    for candidate in variants(left).into_iter().chain(variants(right)) {
        match merged.iter().position(|existing| compatible(existing, &candidate)) {
            Some(index) => {
                let existing = merged.remove(index);
                merged.insert(index, merge_compatible(existing, candidate));
            }
            None => merged.push(candidate),
        }
    }

    match merged.len() {
        1 => merged.remove(0),
        _ => json!({ "anyOf": merged }),
    }
}

fn variants(schema: Value) -> Vec<Value> {
    match schema.get("anyOf") {
        Some(Value::Array(variants)) => variants.clone(),
        _ => vec![schema],
    }
}

fn type_of(schema: &Value) -> Option<&str> {
    schema.get("type").and_then(Value::as_str)
}

fn compatible(left: &Value, right: &Value) -> bool {
    match (type_of(left), type_of(right)) {
        (Some(l), Some(r)) if l == r => true,
        (Some("integer"), Some("number")) | (Some("number"), Some("integer")) => true,
        _ => false,
    }
}

fn merge_compatible(left: Value, right: Value) -> Value {
    match (type_of(&left), type_of(&right)) {
        (Some("object"), Some("object")) => merge_objects(&left, &right),
        (Some("array"), Some("array")) => {
            let items = match (left.get("items").cloned(), right.get("items").cloned()) {
                (Some(l), Some(r)) => Some(merge(l, r)),
                (l, r) => l.or(r),
            };
            let mut schema = json!({ "type": "array" });
            if let Some(items) = items {
                schema["items"] = items;
            }
            schema
        }
        (Some("number"), _) | (_, Some("number")) => json!({ "type": "number" }),
        _ => left,
    }
}

fn merge_objects(left: &Value, right: &Value) -> Value {
    let mut properties = properties_of(left);
    for (key, schema) in properties_of(right) {
        let merged = match properties.remove(&key) {
            Some(existing) => merge(existing, schema),
            None => schema,
        };
        properties.insert(key, merged);
    }

    let required = required_of(left)
        .intersection(&required_of(right))
        .cloned()
        .collect();
    object_schema(properties, required)
}

fn properties_of(schema: &Value) -> Map<String, Value> {
    match schema.get("properties") {
        Some(Value::Object(properties)) => properties.clone(),
        _ => Map::new(),
    }
}

fn required_of(schema: &Value) -> BTreeSet<String> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .map(|keys| keys.iter().filter_map(Value::as_str).map(String::from).collect())
        .unwrap_or_default()
}
