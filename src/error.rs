//! Error types for RO-Crate export

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to read file metadata for {path}: {source}")]
    FileMetadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Vocabulary file not found: {0}")]
    VocabularyNotFound(String),

    #[error("Failed to parse vocabulary file {file}: {reason}")]
    VocabularyParse { file: String, reason: String },

    #[error("Invalid project snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Conflicting entities share the @id '{0}'")]
    ConflictingEntity(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
