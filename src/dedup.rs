//! Graph de-duplication
//!
//! Sub-builders emit entities independently, so the same language, person
//! or term definition routinely shows up several times. The first entity
//! for an `@id` wins; later copies are dropped. A later copy whose content
//! differs is a conflict: logged by default, an error in strict mode.

use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::entity::extract_id;
use crate::error::ExportError;

/// Entities left after de-duplication, with counts of what was dropped
#[derive(Debug, Default)]
pub struct UniqueEntries {
    pub entities: Vec<Value>,
    /// Copies dropped because an entity with the same `@id` came first
    pub dropped: usize,
    /// Dropped copies whose content differed from the kept entity
    pub conflicts: usize,
}

/// Keep the first entity for each `@id`
///
/// Entities without an `@id` are kept as they are.
pub fn unique_entries(entries: Vec<Value>, strict: bool) -> Result<UniqueEntries, ExportError> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut result = UniqueEntries::default();

    for entry in entries {
        let Some(id) = extract_id(&entry).map(String::from) else {
            result.entities.push(entry);
            continue;
        };

        match index.get(&id) {
            None => {
                index.insert(id, result.entities.len());
                result.entities.push(entry);
            }
            Some(&kept) => {
                if !values_equal(&result.entities[kept], &entry) {
                    if strict {
                        return Err(ExportError::ConflictingEntity(id));
                    }
                    warn!(id = %id, "dropping conflicting entity, keeping the first one");
                    result.conflicts += 1;
                } else {
                    debug!(id = %id, "dropping duplicate entity");
                }
                result.dropped += 1;
            }
        }
    }

    Ok(result)
}

/// Remove repeated references from an entity's `hasPart`
pub fn dedupe_has_part(entity: &mut Value) {
    let Some(Value::Array(parts)) = entity.get_mut("hasPart") else {
        return;
    };
    let mut seen = HashSet::new();
    parts.retain(|part| match extract_id(part) {
        Some(id) => seen.insert(id.to_string()),
        None => true,
    });
}

/// Structural equality where `{"@id": x}` references compare by id
/// and arrays compare as sets
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(obj_a), Value::Object(obj_b)) => {
            if obj_a.len() == 1 && obj_b.len() == 1 {
                if let (Some(id_a), Some(id_b)) = (obj_a.get("@id"), obj_b.get("@id")) {
                    return id_a == id_b;
                }
            }
            objects_equal(obj_a, obj_b)
        }
        (Value::Array(arr_a), Value::Array(arr_b)) => {
            arr_a.len() == arr_b.len() && arr_a.iter().all(|v| contains_value(arr_b, v))
        }
        _ => a == b,
    }
}

fn objects_equal(a: &Map<String, Value>, b: &Map<String, Value>) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(key, va)| b.get(key).map(|vb| values_equal(va, vb)).unwrap_or(false))
}

fn contains_value(arr: &[Value], value: &Value) -> bool {
    arr.iter().any(|v| values_equal(v, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_entity_wins() {
        let entries = vec![
            json!({"@id": "#language_etr", "@type": "Language", "name": "Edolo"}),
            json!({"@id": "People/Awi/", "@type": "Person"}),
            json!({"@id": "#language_etr", "@type": "Language", "name": "Edolo"}),
        ];
        let unique = unique_entries(entries, false).unwrap();
        assert_eq!(unique.entities.len(), 2);
        assert_eq!(unique.dropped, 1);
        assert_eq!(unique.conflicts, 0);
    }

    #[test]
    fn test_conflicts_are_counted_or_rejected() {
        let entries = vec![
            json!({"@id": "#Huya", "@type": "Place", "name": "Huya"}),
            json!({"@id": "#Huya", "@type": "Place", "name": "Huya", "description": "Located in PNG"}),
        ];

        let unique = unique_entries(entries.clone(), false).unwrap();
        assert_eq!(unique.entities.len(), 1);
        assert!(unique.entities[0].get("description").is_none());
        assert_eq!(unique.conflicts, 1);

        let err = unique_entries(entries, true).unwrap_err();
        assert!(matches!(err, ExportError::ConflictingEntity(id) if id == "#Huya"));
    }

    #[test]
    fn test_reference_order_is_not_a_conflict() {
        let entries = vec![
            json!({"@id": "x", "ldac:speaker": [{"@id": "A"}, {"@id": "B"}]}),
            json!({"@id": "x", "ldac:speaker": [{"@id": "B"}, {"@id": "A"}]}),
        ];
        let unique = unique_entries(entries, true).unwrap();
        assert_eq!(unique.entities.len(), 1);
        assert_eq!(unique.conflicts, 0);
    }

    #[test]
    fn test_entities_without_id_are_kept() {
        let entries = vec![json!({"name": "anonymous"}), json!({"name": "anonymous"})];
        let unique = unique_entries(entries, false).unwrap();
        assert_eq!(unique.entities.len(), 2);
    }

    #[test]
    fn test_dedupe_has_part() {
        let mut entity = json!({
            "@id": "./",
            "hasPart": [{"@id": "a.pdf"}, {"@id": "People/Awi/"}, {"@id": "a.pdf"}]
        });
        dedupe_has_part(&mut entity);
        assert_eq!(entity["hasPart"], json!([{"@id": "a.pdf"}, {"@id": "People/Awi/"}]));
    }
}
