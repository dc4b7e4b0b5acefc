// SPDX-License-Identifier: MIT OR Apache-2.0
//! Strict-mode JSON schema sanitizer.
//!
//! Strict structured output accepts only a subset of JSON Schema. Keywords
//! outside that subset are removed and recorded as `keyword: value` lines in
//! the schema's `description`, so the model still sees the constraint. The
//! remaining normalization closes object schemas, turns boolean sub-schemas
//! into objects, moves `default` into the description and marks every
//! property required.

use serde_json::{Map, Value, json};

/// Keywords strict mode rejects.
pub const UNSUPPORTED_KEYWORDS: &[&str] = &[
    "contentEncoding",
    "contentMediaType",
    "not",
    "minLength",
    "maxLength",
    "pattern",
    "format",
    "minimum",
    "maximum",
    "multipleOf",
    "patternProperties",
    "minItems",
    "maxItems",
    "unevaluatedProperties",
    "propertyNames",
    "minProperties",
    "maxProperties",
    "unevaluatedItems",
    "contains",
    "minContains",
    "maxContains",
    "uniqueItems",
];

/// Keywords whose value is a map of sub-schemas.
const SCHEMA_MAPS: &[&str] = &["properties", "$defs", "definitions"];

/// Keywords whose value is a list of sub-schemas.
const SCHEMA_LISTS: &[&str] = &["anyOf", "oneOf", "allOf", "prefixItems"];

/// Produce a strict-mode-safe copy of `schema`.
///
/// When `strict` is `false`, or `schema` is not a JSON object, the input is
/// returned unchanged.
#[must_use]
pub fn sanitize_schema(schema: &Value, strict: bool) -> Value {
    match schema {
        Value::Object(map) if strict => Value::Object(sanitize_object(map)),
        other => other.clone(),
    }
}

fn sanitize_node(node: &Value) -> Value {
    match node {
        Value::Bool(true) => json!({}),
        Value::Bool(false) => never_schema(),
        Value::Object(map) => Value::Object(sanitize_object(map)),
        other => other.clone(),
    }
}

/// The object form of the `false` schema. It is the one place `not` survives.
fn never_schema() -> Value {
    json!({ "not": true })
}

fn is_never_schema(map: &Map<String, Value>) -> bool {
    map.len() == 1 && map.get("not") == Some(&Value::Bool(true))
}

fn sanitize_object(input: &Map<String, Value>) -> Map<String, Value> {
    if is_never_schema(input) {
        return input.clone();
    }
    let mut map = input.clone();
    let mut notes: Vec<String> = Vec::new();

    for keyword in UNSUPPORTED_KEYWORDS {
        if let Some(value) = map.remove(*keyword) {
            notes.push(format!("{keyword}: {value}"));
        }
    }
    if let Some(default) = map.remove("default") {
        notes.push(format!("Default value: {default}"));
    }

    for key in SCHEMA_MAPS {
        if let Some(Value::Object(children)) = map.get_mut(*key) {
            for child in children.values_mut() {
                *child = sanitize_node(child);
            }
        }
    }
    for key in SCHEMA_LISTS {
        if let Some(Value::Array(children)) = map.get_mut(*key) {
            for child in children.iter_mut() {
                *child = sanitize_node(child);
            }
        }
    }
    match map.get_mut("items") {
        Some(Value::Array(children)) => {
            for child in children.iter_mut() {
                *child = sanitize_node(child);
            }
        }
        Some(child @ (Value::Object(_) | Value::Bool(_))) => *child = sanitize_node(child),
        _ => {}
    }

    if is_object_schema(&map) {
        match map.get_mut("additionalProperties") {
            Some(child @ Value::Object(_)) => *child = sanitize_node(child),
            _ => {
                map.insert("additionalProperties".into(), Value::Bool(false));
            }
        }
        let required: Vec<Value> = match map.get("properties") {
            Some(Value::Object(props)) => props.keys().cloned().map(Value::String).collect(),
            _ => Vec::new(),
        };
        map.insert("required".into(), Value::Array(required));
    }

    if !notes.is_empty() {
        let appended = notes.join("\n");
        let description = match map.get("description").and_then(Value::as_str) {
            Some(existing) if !existing.is_empty() => format!("{existing}\n{appended}"),
            _ => appended,
        };
        map.insert("description".into(), Value::String(description));
    }

    map
}

fn is_object_schema(map: &Map<String, Value>) -> bool {
    let typed_object = match map.get("type") {
        Some(Value::String(t)) => t == "object",
        Some(Value::Array(types)) => types.iter().any(|t| t == "object"),
        _ => false,
    };
    typed_object || map.contains_key("properties")
}
