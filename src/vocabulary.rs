//! Vocabulary term resolution
//!
//! Free-text vocabulary values (genres and the like) are resolved against
//! bundled JSON vocabularies. A term that maps to LDAC gets the LDAC id;
//! anything else gets a project-scoped custom URI, so the same project
//! always reuses the same id for the same term.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::entity::{defined_term, defined_term_set};
use crate::error::ExportError;
use crate::id::{custom_uri, is_ldac_identifier};
use crate::vocab::{CUSTOM_GENRE_TERMS, LDAC_GENRE_TERMS};

/// Id used for placeholder values such as "unknown" or "unspecified"
pub const UNKNOWN_TERM_ID: &str = "tag:lameta/unknown";

const PLACEHOLDER_TERMS: [&str; 6] = ["unknown", "unspecified", "<unknown>", "", "null", "undefined"];

/// How long a parsed vocabulary file is reused
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermMapping {
    pub vocabulary: String,
    pub term: String,
}

/// One entry of a bundled vocabulary file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyDefinition {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub mapping: Vec<TermMapping>,
}

impl VocabularyDefinition {
    pub fn ldac_term(&self) -> Option<&str> {
        self.mapping
            .iter()
            .find(|m| m.vocabulary == "LDAC")
            .map(|m| m.term.as_str())
    }
}

/// Result of resolving one raw term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularyMapping {
    pub id: String,
    pub term: String,
    /// The value as the user entered it
    pub original_term: String,
    /// The matched vocabulary entry, if any
    pub definition: Option<VocabularyDefinition>,
}

/// Source of parsed vocabulary files
pub trait VocabularyLoader {
    /// Load a vocabulary by file name (e.g. `genres.json`)
    fn load(&self, vocabulary_file: &str) -> Result<Arc<Vec<VocabularyDefinition>>, ExportError>;
}

struct CachedVocabulary {
    data: Arc<Vec<VocabularyDefinition>>,
    loaded_at: Instant,
}

/// Reads `<dir>/<file>` with a short read-through cache
pub struct DirectoryVocabularyLoader {
    dir: PathBuf,
    ttl: Duration,
    cache: Mutex<HashMap<String, CachedVocabulary>>,
}

impl DirectoryVocabularyLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_ttl(dir, DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn read(&self, vocabulary_file: &str) -> Result<Vec<VocabularyDefinition>, ExportError> {
        let path = self.dir.join(vocabulary_file);
        if !path.is_file() {
            return Err(ExportError::VocabularyNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|e| ExportError::VocabularyParse {
            file: vocabulary_file.to_string(),
            reason: e.to_string(),
        })
    }
}

impl VocabularyLoader for DirectoryVocabularyLoader {
    fn load(&self, vocabulary_file: &str) -> Result<Arc<Vec<VocabularyDefinition>>, ExportError> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(cached) = cache.get(vocabulary_file) {
            if cached.loaded_at.elapsed() < self.ttl {
                return Ok(Arc::clone(&cached.data));
            }
        }

        let data = Arc::new(self.read(vocabulary_file)?);
        cache.insert(
            vocabulary_file.to_string(),
            CachedVocabulary {
                data: Arc::clone(&data),
                loaded_at: Instant::now(),
            },
        );
        Ok(data)
    }
}

/// In-memory vocabularies
#[derive(Debug, Default, Clone)]
pub struct StaticVocabularies {
    files: HashMap<String, Arc<Vec<VocabularyDefinition>>>,
}

impl StaticVocabularies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, name: impl Into<String>, definitions: Vec<VocabularyDefinition>) -> Self {
        self.files.insert(name.into(), Arc::new(definitions));
        self
    }
}

impl VocabularyLoader for StaticVocabularies {
    fn load(&self, vocabulary_file: &str) -> Result<Arc<Vec<VocabularyDefinition>>, ExportError> {
        self.files
            .get(vocabulary_file)
            .cloned()
            .ok_or_else(|| ExportError::VocabularyNotFound(vocabulary_file.to_string()))
    }
}

/// A loader that has no vocabularies; every term becomes a custom term
pub struct NoVocabularies;

impl VocabularyLoader for NoVocabularies {
    fn load(&self, vocabulary_file: &str) -> Result<Arc<Vec<VocabularyDefinition>>, ExportError> {
        Err(ExportError::VocabularyNotFound(vocabulary_file.to_string()))
    }
}

/// Resolve a raw term against a vocabulary file
///
/// Exact id match first, then case-insensitive label match. Unmatched terms
/// get a custom id built from the raw input.
pub fn resolve(
    term: &str,
    vocabulary_file: &str,
    project_title: Option<&str>,
    loader: &dyn VocabularyLoader,
) -> Result<VocabularyMapping, ExportError> {
    let definitions = loader.load(vocabulary_file)?;

    let found = definitions
        .iter()
        .find(|d| d.id == term)
        .or_else(|| {
            let lower = term.to_lowercase();
            definitions.iter().find(|d| d.label.to_lowercase() == lower)
        });

    let Some(definition) = found else {
        return Ok(custom_mapping(term, project_title));
    };

    let id = match definition.ldac_term() {
        Some(ldac) => ldac.to_string(),
        None => create_custom_term_id(&definition.label, project_title),
    };

    Ok(VocabularyMapping {
        term: id.clone(),
        id,
        original_term: term.to_string(),
        definition: Some(definition.clone()),
    })
}

/// Mapping for a term no vocabulary knows
pub fn custom_mapping(term: &str, project_title: Option<&str>) -> VocabularyMapping {
    let id = create_custom_term_id(term, project_title);
    VocabularyMapping {
        term: id.clone(),
        id,
        original_term: term.to_string(),
        definition: None,
    }
}

pub fn create_custom_term_id(label: &str, project_title: Option<&str>) -> String {
    let normalized = label.trim().to_lowercase();
    if PLACEHOLDER_TERMS.contains(&normalized.as_str()) {
        return UNKNOWN_TERM_ID.to_string();
    }
    custom_uri(&format!("genre/{}", label), project_title)
}

/// `DefinedTerm` node for a resolved term
pub fn create_term_definition(mapping: &VocabularyMapping) -> Value {
    match &mapping.definition {
        Some(definition) => {
            let term_set = if is_ldac_identifier(&mapping.id) {
                LDAC_GENRE_TERMS
            } else {
                CUSTOM_GENRE_TERMS
            };
            defined_term(&mapping.id, &definition.label, &definition.definition, term_set)
        }
        None => {
            let name = if mapping.original_term == "<Unknown>" {
                "Unknown"
            } else {
                mapping.original_term.as_str()
            };
            json!({
                "@id": mapping.id,
                "@type": "DefinedTerm",
                "name": name,
                "description": format!("Custom term: {}", name),
                "inDefinedTermSet": {"@id": CUSTOM_GENRE_TERMS}
            })
        }
    }
}

/// Term set nodes for whichever kinds of terms were used
pub fn term_sets(has_ldac_terms: bool, has_custom_terms: bool) -> Vec<Value> {
    let mut sets = Vec::new();
    if has_ldac_terms {
        sets.push(defined_term_set(LDAC_GENRE_TERMS, "Linguistic Genre Terms"));
    }
    if has_custom_terms {
        sets.push(defined_term_set(CUSTOM_GENRE_TERMS, "Custom Project Genres"));
    }
    sets
}
