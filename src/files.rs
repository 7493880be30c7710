//! File entity builder
//!
//! Turns attached files into typed `File` entities with size, timestamps,
//! MIME type, material type and license, and links them from their owner.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};
use std::path::Path;
use std::time::SystemTime;

use crate::entity::{append_reference, extract_id, has_type, push_has_part, reference, set_property};
use crate::error::ExportError;
use crate::export::ExportContext;
use crate::id::{document_file_id, file_id};
use crate::license::{normalized_license_id, sanitize_access};
use crate::model::{FileRef, Folder, FolderKind};
use crate::vocab::{LDAC_ANNOTATION, LDAC_PRIMARY_MATERIAL, RESERVED_FILE_PREFIX};

const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "m4a", "aac", "flac", "ogg", "wma", "aif", "aiff"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mpg", "mpeg", "mkv", "webm", "wmv", "m4v", "mts", "mxf"];
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tif", "tiff", "webp", "svg"];
const DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "odt", "rtf", "txt", "md", "html", "htm", "xml", "eaf", "trs", "textgrid",
    "flextext", "csv", "xls", "xlsx", "ods", "json",
];

/// Folder name for project description documents
pub const DESCRIPTION_DOCUMENTS: &str = "DescriptionDocuments";
/// Folder name for other project documents
pub const OTHER_DOCUMENTS: &str = "OtherDocuments";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Audio,
    Video,
    Image,
    Document,
    Other,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = extension(path);
        let ext = ext.as_str();
        if AUDIO_EXTENSIONS.contains(&ext) {
            FileKind::Audio
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            FileKind::Video
        } else if IMAGE_EXTENSIONS.contains(&ext) {
            FileKind::Image
        } else if DOCUMENT_EXTENSIONS.contains(&ext) {
            FileKind::Document
        } else {
            FileKind::Other
        }
    }

    /// Schema.org type added next to `File`
    pub fn schema_type(self) -> Option<&'static str> {
        match self {
            FileKind::Audio => Some("AudioObject"),
            FileKind::Video => Some("VideoObject"),
            FileKind::Image => Some("ImageObject"),
            FileKind::Document => Some("DigitalDocument"),
            FileKind::Other => None,
        }
    }

    pub fn is_media(self) -> bool {
        matches!(self, FileKind::Audio | FileKind::Video | FileKind::Image)
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// MIME type by extension, `application/octet-stream` when unknown
pub fn mime_type(path: &Path) -> &'static str {
    match extension(path).as_str() {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "flac" => "audio/flac",
        "ogg" => "audio/ogg",
        "wma" => "audio/x-ms-wma",
        "aif" | "aiff" => "audio/aiff",
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mpg" | "mpeg" => "video/mpeg",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "wmv" => "video/x-ms-wmv",
        "mts" => "video/mp2t",
        "mxf" => "application/mxf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "odt" => "application/vnd.oasis.opendocument.text",
        "rtf" => "application/rtf",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "html" | "htm" => "text/html",
        "xml" | "flextext" => "application/xml",
        "eaf" => "text/x-eaf+xml",
        "trs" => "text/xml",
        "textgrid" => "text/praat-textgrid",
        "csv" => "text/csv",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ods" => "application/vnd.oasis.opendocument.spreadsheet",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

pub fn material_type(path: &Path) -> &'static str {
    if FileKind::from_path(path).is_media() {
        LDAC_PRIMARY_MATERIAL
    } else {
        LDAC_ANNOTATION
    }
}

/// Files the export must not describe (the metadata document itself)
pub fn is_reserved(file: &FileRef) -> bool {
    file.file_name().starts_with(RESERVED_FILE_PREFIX)
}

/// `2024-01-31T09:15:00.000Z`
pub fn format_timestamp(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Where a file sits, which decides its license and material type
pub enum FileOwner<'f> {
    Folder(&'f Folder),
    ProjectDocuments,
}

/// Build the entity for one file
///
/// The file is stat-ed; a failure aborts the export.
pub fn build_file_entry(
    ctx: &mut ExportContext<'_>,
    file: &FileRef,
    id: &str,
    owner: FileOwner<'_>,
    parent_license: Option<&str>,
) -> Result<Value, ExportError> {
    let path = file.path();
    let metadata = std::fs::metadata(path).map_err(|source| ExportError::FileMetadata {
        path: path.to_path_buf(),
        source,
    })?;

    let kind = FileKind::from_path(path);
    let types: Vec<&str> = std::iter::once("File").chain(kind.schema_type()).collect();
    let type_value = if types.len() == 1 { json!(types[0]) } else { json!(types) };

    let modified = metadata.modified().ok();
    let created = metadata.created().ok().or(modified);

    let mut entry = json!({
        "@id": id,
        "@type": type_value,
        "contentSize": metadata.len(),
        "encodingFormat": mime_type(path),
        "name": file.file_name()
    });
    if let Some(created) = created {
        set_property(&mut entry, "dateCreated", json!(format_timestamp(created)));
    }
    if let Some(modified) = modified {
        set_property(&mut entry, "dateModified", json!(format_timestamp(modified)));
    }

    let owner_folder = match owner {
        FileOwner::Folder(folder) => {
            set_property(&mut entry, "ldac:materialType", reference(material_type(path)));
            Some(folder)
        }
        FileOwner::ProjectDocuments => None,
    };

    let license = ctx
        .licenses
        .resolve_for_file(file, owner_folder, ctx.project, parent_license);
    if let Some(license) = license {
        set_property(&mut entry, "license", reference(&license));
    }

    Ok(entry)
}

fn license_of(entry: &Value) -> Option<String> {
    entry.get("license").and_then(extract_id).map(String::from)
}

/// Add entities for a folder's files and link them from `entry`
///
/// Sessions and projects list files in `hasPart`. A Person can't have
/// parts, so person files are linked from `image` (pictures) or
/// `subjectOf` (everything else) and point back with `about`.
pub fn add_child_file_entries(
    ctx: &mut ExportContext<'_>,
    folder: &Folder,
    entry: &mut Value,
    other_entries: &mut Vec<Value>,
) -> Result<(), ExportError> {
    let parent_license = license_of(entry);
    let owner_id = extract_id(entry).unwrap_or_default().to_string();

    for file in folder.files.iter().filter(|f| !is_reserved(f)) {
        let id = file_id(folder, &file.file_name());
        let mut file_entry = build_file_entry(
            ctx,
            file,
            &id,
            FileOwner::Folder(folder),
            parent_license.as_deref(),
        )?;

        if folder.kind == FolderKind::Person {
            let key = if has_type(&file_entry, "ImageObject") {
                "image"
            } else {
                "subjectOf"
            };
            append_reference(entry, key, &id);
            set_property(&mut file_entry, "about", reference(&owner_id));
        } else {
            push_has_part(entry, &id);
        }
        other_entries.push(file_entry);
    }
    Ok(())
}

/// What adding one project document folder produced
#[derive(Debug, Default)]
pub struct DocumentEntries {
    pub file_ids: Vec<String>,
    /// Access values set directly on documents; each needs a license node
    pub access_values: Vec<String>,
    /// Earliest modification time among the documents
    pub earliest_date: Option<String>,
}

/// Add the files of a project document folder to the root entity
///
/// Documents carry no material type. A document with its own `access`
/// value gets that access license; otherwise it inherits the root's.
pub fn add_project_document_entries(
    ctx: &mut ExportContext<'_>,
    files: &[FileRef],
    folder_name: &str,
    root_entry: &mut Value,
    other_entries: &mut Vec<Value>,
) -> Result<DocumentEntries, ExportError> {
    let parent_license = license_of(root_entry);
    let mut result = DocumentEntries::default();
    let mut earliest: Option<SystemTime> = None;

    for file in files.iter().filter(|f| !is_reserved(f)) {
        if let Some(access) = sanitize_access(file.text_property("access")) {
            let license = normalized_license_id(access, ctx.project);
            ctx.licenses.set_file_license(file.path(), license);
            result.access_values.push(access.to_string());
        }

        let id = document_file_id(folder_name, &file.file_name());
        let file_entry = build_file_entry(
            ctx,
            file,
            &id,
            FileOwner::ProjectDocuments,
            parent_license.as_deref(),
        )?;

        if let Ok(modified) = std::fs::metadata(file.path()).and_then(|m| m.modified()) {
            if earliest.map(|e| modified < e).unwrap_or(true) {
                earliest = Some(modified);
            }
        }

        push_has_part(root_entry, &id);
        other_entries.push(file_entry);
        result.file_ids.push(id);
    }

    result.earliest_date = earliest.map(format_timestamp);
    Ok(result)
}
