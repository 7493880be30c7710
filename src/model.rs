//! Read-only project snapshot consumed by the exporter
//!
//! These types describe what the surrounding application hands to the
//! compiler: folders with their field definitions, current field values,
//! attached files and contributions. Everything derives `Deserialize` so a
//! snapshot can be loaded from JSON by the CLI.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Value the UI stores for "not filled in"
pub const UNSPECIFIED: &str = "unspecified";

/// Special-purpose handler for a field's RO-Crate mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldHandler {
    Languages,
    Person,
}

/// The `rocrate` block of a field definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RocrateConfig {
    /// Output property name; defaults to the field key
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub handler: Option<FieldHandler>,
    /// Output sub-key -> string containing `[v]` / `[code]` placeholders
    #[serde(default)]
    pub template: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub array: Option<bool>,
}

/// A configured metadata field
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub key: String,
    #[serde(default)]
    pub english_label: Option<String>,
    #[serde(default = "default_field_type", rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub deprecated: Option<String>,
    #[serde(default)]
    pub omit_export: bool,
    #[serde(default)]
    pub personally_identifiable_information: bool,
    #[serde(default)]
    pub is_custom: bool,
    #[serde(default, rename = "additional")]
    pub is_additional: bool,
    #[serde(default)]
    pub vocabulary_file: Option<String>,
    #[serde(default)]
    pub rocrate: Option<RocrateConfig>,
}

fn default_field_type() -> String {
    "Text".to_string()
}

impl FieldDefinition {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            field_type: default_field_type(),
            ..Default::default()
        }
    }

    /// Label used when a value is folded into prose
    pub fn label(&self) -> &str {
        self.english_label.as_deref().unwrap_or(self.key.as_str())
    }

    /// Deprecated fields whose content moved elsewhere are never exported
    pub fn is_migrated(&self) -> bool {
        is_migrated(self.deprecated.as_deref())
    }

    pub fn output_key(&self) -> &str {
        self.rocrate
            .as_ref()
            .and_then(|r| r.key.as_deref())
            .unwrap_or(self.key.as_str())
    }

    pub fn handler(&self) -> Option<FieldHandler> {
        self.rocrate.as_ref().and_then(|r| r.handler)
    }

    pub fn template(&self) -> Option<&BTreeMap<String, String>> {
        self.rocrate.as_ref().and_then(|r| r.template.as_ref())
    }

    /// `rocrate.array`, unset meaning "not an array"
    pub fn is_array(&self) -> bool {
        self.rocrate.as_ref().and_then(|r| r.array).unwrap_or(false)
    }
}

fn is_migrated(deprecated: Option<&str>) -> bool {
    deprecated.map(|d| d.contains("migrated")).unwrap_or(false)
}

/// Current value of one property on a metadata file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    #[serde(default)]
    pub text: String,
    /// User-added field that has no built-in definition
    #[serde(default)]
    pub is_custom: bool,
    #[serde(default)]
    pub deprecated: Option<String>,
}

impl Field {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn custom(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_custom: true,
            deprecated: None,
        }
    }

    pub fn has_value(&self) -> bool {
        !self.text.trim().is_empty()
    }

    pub fn is_migrated(&self) -> bool {
        is_migrated(self.deprecated.as_deref())
    }
}

/// A (person, role) pair recorded on a session or one of its files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    pub person_reference: String,
    pub role: String,
}

impl Contribution {
    pub fn new(person_reference: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            person_reference: person_reference.into(),
            role: role.into(),
        }
    }
}

/// A file attached to a folder
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    /// Actual location on disk; stat-ed during export
    pub path: PathBuf,
    /// Properties from the file's sidecar metadata (e.g. `license`)
    #[serde(default)]
    pub properties: BTreeMap<String, Field>,
    #[serde(default)]
    pub contributions: Vec<Contribution>,
}

impl FileRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text_property(&self, key: &str) -> Option<&str> {
        self.properties
            .get(key)
            .map(|f| f.text.trim())
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderKind {
    #[default]
    Project,
    Session,
    Person,
}

/// A project, session or person folder
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub kind: FolderKind,
    /// Folder name on disk; the basis for session/person ids
    pub file_prefix: String,
    #[serde(default)]
    pub known_fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub properties: BTreeMap<String, Field>,
    #[serde(default)]
    pub files: Vec<FileRef>,
    /// Contributions recorded on the folder's own metadata (sessions)
    #[serde(default)]
    pub contributions: Vec<Contribution>,
}

impl Folder {
    pub fn new(kind: FolderKind, file_prefix: impl Into<String>) -> Self {
        Self {
            kind,
            file_prefix: file_prefix.into(),
            ..Default::default()
        }
    }

    pub fn with_field(mut self, definition: FieldDefinition) -> Self {
        self.known_fields.push(definition);
        self
    }

    pub fn with_value(mut self, key: &str, text: &str) -> Self {
        self.properties.insert(key.to_string(), Field::text(text));
        self
    }

    pub fn with_file(mut self, file: FileRef) -> Self {
        self.files.push(file);
        self
    }

    /// Trimmed text of a property, `None` when missing, blank or `unspecified`
    pub fn text_property(&self, key: &str) -> Option<&str> {
        self.properties
            .get(key)
            .map(|f| f.text.trim())
            .filter(|t| !t.is_empty() && *t != UNSPECIFIED)
    }

    /// Trimmed text of a property, empty when missing
    pub fn raw_text(&self, key: &str) -> &str {
        self.properties
            .get(key)
            .map(|f| f.text.trim())
            .unwrap_or("")
    }

    pub fn has_value(&self, key: &str) -> bool {
        self.properties.get(key).map(Field::has_value).unwrap_or(false)
    }

    pub fn is_known_field(&self, key: &str) -> bool {
        self.known_fields.iter().any(|f| f.key == key)
    }

    /// Contributions on the session itself followed by those on every file
    pub fn all_contributions(&self) -> Vec<&Contribution> {
        self.contributions
            .iter()
            .chain(self.files.iter().flat_map(|f| f.contributions.iter()))
            .collect()
    }

    /// The name other folders use to refer to this person: code, else name
    pub fn reference_id(&self) -> &str {
        self.text_property("code")
            .or_else(|| self.text_property("name"))
            .unwrap_or(self.file_prefix.as_str())
    }
}

/// An access choice from the archive's authority list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessChoice {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: String,
    /// e.g. `ldac:OpenAccess`
    #[serde(default)]
    pub ldac_access_category: Option<String>,
}

/// The whole project snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub folder: Folder,
    #[serde(default)]
    pub sessions: Vec<Folder>,
    #[serde(default)]
    pub people: Vec<Folder>,
    #[serde(default)]
    pub description_documents: Vec<FileRef>,
    #[serde(default)]
    pub other_documents: Vec<FileRef>,
    #[serde(default)]
    pub access_choices: Vec<AccessChoice>,
    /// Display names for language codes used in the project
    #[serde(default)]
    pub language_names: BTreeMap<String, String>,
}

impl Project {
    pub fn new(folder: Folder) -> Self {
        Self {
            folder,
            ..Default::default()
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.folder.text_property("title")
    }

    pub fn archive_configuration_name(&self) -> Option<&str> {
        self.folder.text_property("archiveConfigurationName")
    }

    /// Find a person by the reference string used in contributions
    pub fn find_person(&self, reference: &str) -> Option<&Folder> {
        let reference = reference.trim();
        self.people.iter().find(|p| {
            p.reference_id().eq_ignore_ascii_case(reference)
                || p.text_property("name")
                    .map(|n| n.eq_ignore_ascii_case(reference))
                    .unwrap_or(false)
        })
    }

    pub fn find_access_choice(&self, access: &str) -> Option<&AccessChoice> {
        self.access_choices
            .iter()
            .find(|c| c.id == access || (!c.label.is_empty() && c.label == access))
    }
}
