//! Identifier construction for exported entities
//!
//! Every `@id` in the graph is derived deterministically from stable
//! inputs (folder prefixes, file names, codes, labels), which is what lets
//! the assembler treat equal ids as the same entity.

use crate::model::{Folder, FolderKind};
use crate::vocab::LDAC_NS;

/// Percent-encode the characters that are not allowed unescaped in an IRI
///
/// Runs of whitespace collapse to a single `%20`.
pub fn sanitize_for_iri(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_space = false;
    for c in input.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push_str("%20");
            }
            in_space = true;
            continue;
        }
        in_space = false;
        match c {
            '(' => out.push_str("%28"),
            ')' => out.push_str("%29"),
            '!' => out.push_str("%21"),
            _ => out.push(c),
        }
    }
    out
}

/// Lowercase, hyphen-separated slug for readable fragment ids
///
/// "SIL International" -> "sil-international". Letters outside ASCII are
/// kept, so "Мария" and "Иван" stay distinct. Empty input gives "unknown".
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;
    for c in value.to_lowercase().chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "unknown".to_string()
    } else {
        slug
    }
}

/// Replace every character outside `[a-z0-9]` with `-`, one for one
///
/// Used for license ids, where "F: Free" and "F-Free" must stay distinct.
pub fn dash_normalize(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Session entity id when nested in a project export
pub fn session_id(session: &Folder) -> String {
    format!("#session-{}", sanitize_for_iri(&session.file_prefix))
}

pub fn person_id(person: &Folder) -> String {
    format!("People/{}/", sanitize_for_iri(&person.file_prefix))
}

/// Stub id for a contributor that has no person folder
pub fn unresolved_contributor_id(name: &str) -> String {
    format!("#contributor-{}", slugify(name))
}

/// Id of a file inside a session, person or project folder
pub fn file_id(folder: &Folder, file_name: &str) -> String {
    let name = sanitize_for_iri(file_name);
    match folder.kind {
        FolderKind::Session => format!("Sessions/{}/{}", sanitize_for_iri(&folder.file_prefix), name),
        FolderKind::Person => format!("People/{}/{}", sanitize_for_iri(&folder.file_prefix), name),
        FolderKind::Project => name,
    }
}

/// Id of a file in one of the project's document folders
pub fn document_file_id(folder_name: &str, file_name: &str) -> String {
    format!("{}/{}", folder_name, sanitize_for_iri(file_name))
}

pub fn language_id(code: &str) -> String {
    format!("#language_{}", sanitize_for_iri(code))
}

/// `#language_` id for a code that may contain characters unfit for a fragment
pub fn sanitize_language_code(code: &str) -> String {
    if code.starts_with("#language_") {
        return code.to_string();
    }
    let cleaned: String = code
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    language_id(&cleaned)
}

/// True for compact (`ldac:Foo`) and expanded LDAC term ids
pub fn is_ldac_identifier(id: &str) -> bool {
    id.starts_with("ldac:") || id.starts_with(LDAC_NS)
}

/// Project-scoped URI for a term the controlled vocabularies don't know
///
/// With a project title: `tag:lameta,<title>:<path>`. Without one, a
/// PascalCase fragment from the last path segment.
pub fn custom_uri(path: &str, project_title: Option<&str>) -> String {
    if let Some(title) = project_title {
        return format!("tag:lameta,{}:{}", sanitize_for_iri(title.trim()), sanitize_for_iri(path.trim()));
    }

    let last_segment = path.rsplit('/').next().unwrap_or(path);
    let pascal: String = last_segment
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect();
    format!("#{}", pascal)
}
