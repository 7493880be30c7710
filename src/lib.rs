//! LDAC RO-Crate export
//!
//! This library compiles a snapshot of a language documentation project
//! (the project itself, its sessions, its people and their files) into a
//! single RO-Crate JSON-LD document profiled against the LDAC vocabulary.
//!
//! # Overview
//!
//! An export starts from one root (a project, a session or a person) and
//! builds its graph from independent sub-builders:
//!
//! 1. Field entries: configured fields mapped onto properties, languages,
//!    places and vocabulary terms
//! 2. File entities with type, size, timestamps, material type and license
//! 3. Person entities filtered for personally identifying information
//! 4. Session entities with participant roles, nested under the project
//! 5. License, access-type and material-type definitions
//!
//! The loose entities are then de-duplicated by `@id` (first one wins) and
//! every `hasPart` is cleaned of repeated references.
//!
//! # Usage
//!
//! ```ignore
//! use ldac_rocrate_export::{export_rocrate, to_json_string, DirectoryVocabularyLoader, ExportOptions, ExportRoot};
//!
//! let project: Project = // load your snapshot
//! let loader = DirectoryVocabularyLoader::new("vocabularies");
//! let result = export_rocrate(&project, ExportRoot::Project, &loader, &ExportOptions::default())?;
//!
//! println!("{}", to_json_string(&result, true)?);
//! ```

pub mod dedup;
pub mod entity;
pub mod error;
pub mod export;
pub mod fields;
pub mod files;
pub mod id;
pub mod languages;
pub mod license;
pub mod model;
pub mod people;
pub mod sessions;
pub mod vocab;
pub mod vocabulary;

// Re-export main types for convenience
pub use crate::error::ExportError;
pub use crate::export::{
    export_rocrate, to_json_string, to_jsonld, ExportContext, ExportOptions, ExportResult, ExportRoot,
    ExportStats,
};
pub use crate::languages::{LanguageEntity, LanguageRegistry};
pub use crate::license::LicenseResolver;
pub use crate::model::{AccessChoice, Contribution, Field, FieldDefinition, FileRef, Folder, FolderKind, Project};
pub use crate::vocab::{LDAC_NS, ROCRATE_CONTEXT};
pub use crate::vocabulary::{
    DirectoryVocabularyLoader, NoVocabularies, StaticVocabularies, VocabularyDefinition, VocabularyLoader,
};
