//! Language registry
//!
//! Interns one `Language` entity per normalized ISO 639 code for the
//! lifetime of an export and records which entities referenced each code,
//! so that only languages actually in use end up in the graph.

use serde_json::{json, Value};
use std::collections::{BTreeSet, HashMap};

use crate::id::language_id;

/// Code for "undetermined", used whenever a language field has nothing usable
pub const UNDETERMINED: &str = "und";

/// A `Language` entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageEntity {
    pub id: String,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
}

impl LanguageEntity {
    pub fn to_json(&self) -> Value {
        let mut value = json!({
            "@id": self.id,
            "@type": "Language",
            "code": self.code,
            "name": self.name
        });
        if let Some(description) = &self.description {
            value["description"] = json!(description);
        }
        value
    }
}

/// Per-export language table
#[derive(Debug, Default)]
pub struct LanguageRegistry {
    /// Insertion-ordered entities, indexed by `index`
    entities: Vec<LanguageEntity>,
    index: HashMap<String, usize>,
    usage: HashMap<String, BTreeSet<String>>,
    extra_names: HashMap<String, String>,
}

fn normalize_code(code: &str) -> String {
    code.trim().to_lowercase()
}

impl LanguageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that knows additional code -> name pairs (e.g. from the project's
    /// language list) on top of the built-in table
    pub fn with_names<I, K, V>(names: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut registry = Self::new();
        for (code, name) in names {
            registry
                .extra_names
                .insert(normalize_code(code.as_ref()), name.into());
        }
        registry
    }

    /// Get or create the entity for a code
    ///
    /// Codes that differ only by case or surrounding whitespace share one entity.
    pub fn get_entity(&mut self, code: &str) -> &LanguageEntity {
        let normalized = normalize_code(code);
        if let Some(&i) = self.index.get(&normalized) {
            return &self.entities[i];
        }

        let entity = if normalized == UNDETERMINED {
            LanguageEntity {
                id: language_id(UNDETERMINED),
                code: normalized.clone(),
                name: "Undetermined".to_string(),
                description: Some(
                    "Language marked as undetermined because no working language was specified"
                        .to_string(),
                ),
            }
        } else {
            LanguageEntity {
                id: language_id(&normalized),
                name: self.language_name(&normalized),
                code: normalized.clone(),
                description: None,
            }
        };

        self.entities.push(entity);
        let i = self.entities.len() - 1;
        self.index.insert(normalized, i);
        &self.entities[i]
    }

    /// `{"@id": ...}` for a code, creating the entity if needed
    pub fn get_reference(&mut self, code: &str) -> Value {
        json!({ "@id": self.get_entity(code).id })
    }

    /// Record that `owner_id` referenced `code`
    pub fn track_usage(&mut self, code: &str, owner_id: &str) {
        self.usage
            .entry(normalize_code(code))
            .or_default()
            .insert(owner_id.to_string());
    }

    pub fn usage_count(&self, code: &str) -> usize {
        self.usage
            .get(&normalize_code(code))
            .map(|owners| owners.len())
            .unwrap_or(0)
    }

    pub fn all_entities(&self) -> &[LanguageEntity] {
        &self.entities
    }

    pub fn used_entities(&self) -> Vec<&LanguageEntity> {
        self.entities
            .iter()
            .filter(|e| self.usage_count(&e.code) > 0)
            .collect()
    }

    pub fn unused_entities(&self) -> Vec<&LanguageEntity> {
        self.entities
            .iter()
            .filter(|e| self.usage_count(&e.code) == 0)
            .collect()
    }

    fn language_name(&self, code: &str) -> String {
        if let Some(name) = self.extra_names.get(code) {
            return name.clone();
        }
        builtin_language_name(code)
            .map(String::from)
            .unwrap_or_else(|| code.to_string())
    }
}

/// Names for commonly used ISO 639-3 (and a few 639-1) codes
fn builtin_language_name(code: &str) -> Option<&'static str> {
    let name = match code {
        "eng" | "en" => "English",
        "fra" | "fr" => "French",
        "spa" | "es" => "Spanish",
        "deu" | "de" => "German",
        "por" | "pt" => "Portuguese",
        "rus" | "ru" => "Russian",
        "ara" | "ar" => "Arabic",
        "cmn" | "zh" => "Mandarin Chinese",
        "hin" | "hi" => "Hindi",
        "ind" | "id" => "Indonesian",
        "swh" | "sw" => "Swahili",
        "tpi" => "Tok Pisin",
        "bis" => "Bislama",
        "hmo" => "Hiri Motu",
        "etr" => "Edolo",
        "fuf" => "Pular",
        "tha" | "th" => "Thai",
        "vie" | "vi" => "Vietnamese",
        "jpn" | "ja" => "Japanese",
        "kor" | "ko" => "Korean",
        "nld" | "nl" => "Dutch",
        "ita" | "it" => "Italian",
        "tur" | "tr" => "Turkish",
        "fas" | "fa" => "Persian",
        "amh" | "am" => "Amharic",
        "hau" | "ha" => "Hausa",
        "yor" | "yo" => "Yoruba",
        "zul" | "zu" => "Zulu",
        "que" => "Quechua",
        "mri" | "mi" => "Maori",
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning_ignores_case_and_whitespace() {
        let mut registry = LanguageRegistry::new();
        let first = registry.get_entity("ETR").clone();
        let second = registry.get_entity("  etr ").clone();
        assert_eq!(first, second);
        assert_eq!(registry.all_entities().len(), 1);
        assert_eq!(first.id, "#language_etr");
        assert_eq!(first.name, "Edolo");
    }

    #[test]
    fn test_unknown_code_name_falls_back_to_code() {
        let mut registry = LanguageRegistry::new();
        assert_eq!(registry.get_entity("qaa").name, "qaa");
    }

    #[test]
    fn test_extra_names_override() {
        let mut registry = LanguageRegistry::with_names([("qaa", "Local Variety")]);
        assert_eq!(registry.get_entity("QAA").name, "Local Variety");
    }

    #[test]
    fn test_reference_creates_entity() {
        let mut registry = LanguageRegistry::new();
        let reference = registry.get_reference("tpi");
        assert_eq!(reference, json!({"@id": "#language_tpi"}));
        assert_eq!(registry.all_entities().len(), 1);
    }

    #[test]
    fn test_undetermined_entity() {
        let mut registry = LanguageRegistry::new();
        let und = registry.get_entity("und").to_json();
        assert_eq!(und["name"], json!("Undetermined"));
        assert!(und.get("description").is_some());
        assert_eq!(und["@type"], json!("Language"));
    }

    #[test]
    fn test_usage_is_a_set() {
        let mut registry = LanguageRegistry::new();
        registry.get_entity("etr");
        registry.get_entity("tpi");
        registry.track_usage("etr", "./");
        registry.track_usage("ETR", "./");
        registry.track_usage("etr", "#session-1");

        assert_eq!(registry.usage_count("etr"), 2);
        let used: Vec<_> = registry.used_entities().iter().map(|e| e.code.clone()).collect();
        let unused: Vec<_> = registry.unused_entities().iter().map(|e| e.code.clone()).collect();
        assert_eq!(used, vec!["etr"]);
        assert_eq!(unused, vec!["tpi"]);
    }
}
