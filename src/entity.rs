//! Entity helpers for the JSON-LD graph
//!
//! Entities are open `serde_json::Value` objects keyed by `@id`. The
//! functions here read them (ids, types, references) and build the small
//! entity kinds the exporter emits so call sites don't hand-assemble JSON.

use serde_json::{json, Map, Value};

/// `{"@id": id}`
pub fn reference(id: &str) -> Value {
    json!({ "@id": id })
}

/// Extract @id from an entity
pub fn extract_id(entity: &Value) -> Option<&str> {
    entity.get("@id").and_then(|v| v.as_str())
}

/// Extract @type as a list of type names
pub fn extract_types(entity: &Value) -> Vec<String> {
    match entity.get("@type") {
        Some(Value::String(t)) => vec![t.clone()],
        Some(Value::Array(arr)) => arr
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect(),
        _ => vec![],
    }
}

/// Check if an entity has a specific @type
pub fn has_type(entity: &Value, type_name: &str) -> bool {
    extract_types(entity).iter().any(|t| t == type_name)
}

/// Add a reference to an entity's `hasPart` array, creating it if needed
pub fn push_has_part(entity: &mut Value, id: &str) {
    if let Some(obj) = entity.as_object_mut() {
        let has_part = obj
            .entry("hasPart")
            .or_insert_with(|| Value::Array(vec![]));
        if let Value::Array(arr) = has_part {
            if !arr.iter().any(|v| extract_id(v) == Some(id)) {
                arr.push(reference(id));
            }
        }
    }
}

/// Append a reference to a property that may be absent, single or an array
///
/// Absent becomes a single reference; a second distinct reference turns
/// the property into an array.
pub fn append_reference(entity: &mut Value, key: &str, id: &str) {
    let Some(obj) = entity.as_object_mut() else {
        return;
    };
    let new_value = match obj.remove(key) {
        None => reference(id),
        Some(Value::Array(mut arr)) => {
            if !arr.iter().any(|v| extract_id(v) == Some(id)) {
                arr.push(reference(id));
            }
            Value::Array(arr)
        }
        Some(existing) => {
            if extract_id(&existing) == Some(id) {
                existing
            } else {
                Value::Array(vec![existing, reference(id)])
            }
        }
    };
    obj.insert(key.to_string(), new_value);
}

/// Set a property to one reference or an array of references
pub fn set_references(entity: &mut Value, key: &str, ids: &[String], as_array: bool) {
    if ids.is_empty() {
        return;
    }
    let value = if as_array {
        Value::Array(ids.iter().map(|id| reference(id)).collect())
    } else {
        reference(&ids[0])
    };
    if let Some(obj) = entity.as_object_mut() {
        obj.insert(key.to_string(), value);
    }
}

/// Set a property, replacing any previous value
pub fn set_property(entity: &mut Value, key: &str, value: Value) {
    if let Some(obj) = entity.as_object_mut() {
        obj.insert(key.to_string(), value);
    }
}

/// String value of a property
pub fn get_text<'a>(entity: &'a Value, key: &str) -> Option<&'a str> {
    entity.get(key).and_then(|v| v.as_str())
}

/// Start an entity with the given id and types
pub fn new_entity(id: &str, types: &[&str]) -> Value {
    let mut obj = Map::new();
    obj.insert("@id".to_string(), json!(id));
    let type_value = if types.len() == 1 {
        json!(types[0])
    } else {
        json!(types)
    };
    obj.insert("@type".to_string(), type_value);
    Value::Object(obj)
}

pub fn place(id: &str, name: &str) -> Value {
    json!({
        "@id": id,
        "@type": "Place",
        "name": name
    })
}

pub fn person(id: &str, name: &str) -> Value {
    json!({
        "@id": id,
        "@type": "Person",
        "name": name
    })
}

pub fn organization(id: &str, name: &str) -> Value {
    json!({
        "@id": id,
        "@type": "Organization",
        "name": name
    })
}

pub fn defined_term(id: &str, name: &str, description: &str, term_set: &str) -> Value {
    json!({
        "@id": id,
        "@type": "DefinedTerm",
        "name": name,
        "description": description,
        "inDefinedTermSet": {"@id": term_set}
    })
}

pub fn defined_term_set(id: &str, name: &str) -> Value {
    json!({
        "@id": id,
        "@type": "DefinedTermSet",
        "name": name
    })
}
