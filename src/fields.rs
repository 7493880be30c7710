//! Field entry builder
//!
//! Maps each configured field of a folder onto properties of the folder's
//! entity, and onto satellite entities (languages, places, defined terms)
//! pushed into `other_entries`. Field behaviour comes from the field
//! definition's `rocrate` block rather than from code.
//!
//! Handlers are tried in order and the first that accepts a field wins:
//! language, vocabulary, place, template, rocrate key, unresolved handler,
//! plain value.

use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::warn;

use crate::entity::{extract_id, get_text, reference, set_property};
use crate::export::ExportContext;
use crate::id::{is_ldac_identifier, sanitize_for_iri, sanitize_language_code};
use crate::languages::UNDETERMINED;
use crate::model::{FieldDefinition, FieldHandler, Folder, FolderKind, UNSPECIFIED};
use crate::vocab::ROOT_ENTITY_ID;
use crate::vocabulary::{self, create_term_definition, term_sets};

/// Field holding the archive name; exported as publisher/holdingArchive
pub const ARCHIVE_CONFIGURATION_FIELD: &str = "archiveConfigurationName";

/// Field holding the depositor; exported as `ldac:depositor`
pub const DEPOSITOR_FIELD: &str = "depositor";

/// Person fields the person projector turns into description text or age
const PERSON_PROJECTED_FIELDS: [&str; 4] = ["birthYear", "education", "primaryOccupation", "description"];

/// Plain fields that have no place in the output
const OMITTED_PLAIN_FIELDS: [&str; 8] = [
    "status",
    "topic",
    "id",
    "locationRegion",
    "locationCountry",
    "locationContinent",
    "country",
    "continent",
];

const LOCATION_COMPANION_FIELDS: [&str; 3] = ["locationRegion", "locationCountry", "locationContinent"];

struct FieldInput<'f> {
    folder: &'f Folder,
    field: &'f FieldDefinition,
    values: Vec<String>,
    property_key: &'f str,
}

/// Add every exportable field of `folder` to `entry`
pub fn add_field_entries(
    ctx: &mut ExportContext<'_>,
    folder: &Folder,
    entry: &mut Value,
    other_entries: &mut Vec<Value>,
) {
    for field in &folder.known_fields {
        let values = field_values(folder, field);
        if should_skip_field(field, folder, &values) {
            continue;
        }

        let input = FieldInput {
            folder,
            field,
            values,
            property_key: field.output_key(),
        };

        if handle_language_field(ctx, &input, entry) {
            continue;
        }
        if handle_vocabulary_field(ctx, &input, entry, other_entries) {
            continue;
        }
        if handle_place_field(&input, entry, other_entries) {
            continue;
        }
        if handle_template_field(&input, entry, other_entries) {
            continue;
        }
        if handle_rocrate_key_field(&input, entry) {
            continue;
        }
        if handle_unresolved_handler_field(&input, entry) {
            continue;
        }
        handle_plain_value_field(&input, entry);
    }

    add_custom_fields(folder, entry);
}

/// User-added fields become plain properties, except on people
fn add_custom_fields(folder: &Folder, entry: &mut Value) {
    if folder.kind == FolderKind::Person {
        return;
    }
    for (key, field) in &folder.properties {
        if !field.is_custom
            || field.is_migrated()
            || key == ARCHIVE_CONFIGURATION_FIELD
            || key == DEPOSITOR_FIELD
            || folder.is_known_field(key)
        {
            continue;
        }
        let value = field.text.trim();
        if !value.is_empty() && value != UNSPECIFIED {
            set_property(entry, key, json!(value));
        }
    }
}

fn is_language_template(field: &FieldDefinition) -> bool {
    field.field_type == "languageChoices"
        && field
            .template()
            .and_then(|t| t.get("@id"))
            .map(|id| id.contains("#language_"))
            .unwrap_or(false)
}

/// Current values of a field, split where the field is multi-valued
pub fn field_values(folder: &Folder, field: &FieldDefinition) -> Vec<String> {
    if field.omit_export {
        return vec![];
    }

    let split_languages = |text: &str| -> Vec<String> {
        text.split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != UNSPECIFIED)
            .map(String::from)
            .collect()
    };

    if field.handler() == Some(FieldHandler::Languages) {
        return split_languages(folder.raw_text(&field.key));
    }

    match folder.text_property(&field.key) {
        Some(v) if field.template().is_some() && field.field_type == "languageChoices" => {
            split_languages(v)
        }
        Some(v) => vec![v.to_string()],
        None => vec![],
    }
}

fn should_skip_field(field: &FieldDefinition, folder: &Folder, values: &[String]) -> bool {
    if field.omit_export || field.is_migrated() {
        return true;
    }
    if field.key == ARCHIVE_CONFIGURATION_FIELD || field.key == DEPOSITOR_FIELD {
        return true;
    }

    let is_language_field = field.handler() == Some(FieldHandler::Languages);
    if values.is_empty() && !is_language_field {
        return true;
    }

    if folder.kind == FolderKind::Person
        && (field.personally_identifiable_information
            || PERSON_PROJECTED_FIELDS.contains(&field.key.as_str()))
    {
        return true;
    }

    false
}

/// The code part of `"etr: Edolo"`
fn language_code(value: &str) -> &str {
    let code = value.split(':').next().unwrap_or(value).trim();
    if code.is_empty() {
        value
    } else {
        code
    }
}

fn handle_language_field(ctx: &mut ExportContext<'_>, input: &FieldInput<'_>, entry: &mut Value) -> bool {
    let field = input.field;
    if field.handler() != Some(FieldHandler::Languages) && !is_language_template(field) {
        return false;
    }

    let owner_id = extract_id(entry).unwrap_or(ROOT_ENTITY_ID).to_string();
    let mut references: Vec<Value> = Vec::new();

    for value in &input.values {
        let code = value.split(':').next().unwrap_or("").trim();
        if code.is_empty() {
            continue;
        }
        let reference = ctx.languages.get_reference(code);
        ctx.languages.track_usage(code, &owner_id);
        if !references.contains(&reference) {
            references.push(reference);
        }
    }

    if references.is_empty() {
        references.push(ctx.languages.get_reference(UNDETERMINED));
        ctx.languages.track_usage(UNDETERMINED, &owner_id);
    }

    // language fields are arrays unless explicitly configured otherwise
    let as_array = field.rocrate.as_ref().and_then(|r| r.array) != Some(false);
    let value = if as_array {
        Value::Array(references)
    } else {
        references.swap_remove(0)
    };
    set_property(entry, input.property_key, value);
    true
}

/// Point `key` at the undetermined language when no field set it
pub fn ensure_language(ctx: &mut ExportContext<'_>, entry: &mut Value, key: &str) {
    if entry.get(key).is_some() {
        return;
    }
    let owner_id = extract_id(entry).unwrap_or(ROOT_ENTITY_ID).to_string();
    let reference = ctx.languages.get_reference(UNDETERMINED);
    ctx.languages.track_usage(UNDETERMINED, &owner_id);
    set_property(entry, key, Value::Array(vec![reference]));
}

fn handle_vocabulary_field(
    ctx: &mut ExportContext<'_>,
    input: &FieldInput<'_>,
    entry: &mut Value,
    other_entries: &mut Vec<Value>,
) -> bool {
    let Some(vocabulary_file) = input.field.vocabulary_file.as_deref() else {
        return false;
    };

    let project_title = Some(ctx.project.title().unwrap_or("unknown-project"));
    let mut references = Vec::new();
    let mut has_ldac_terms = false;
    let mut has_custom_terms = false;

    let terms = input.values[0]
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty());

    for term in terms {
        let mapping = match vocabulary::resolve(term, vocabulary_file, project_title, ctx.vocabularies) {
            Ok(mapping) => mapping,
            Err(e) => {
                warn!(term, vocabulary_file, error = %e, "vocabulary lookup failed, using a custom term");
                vocabulary::custom_mapping(term, project_title)
            }
        };

        if is_ldac_identifier(&mapping.id) {
            has_ldac_terms = true;
        } else {
            has_custom_terms = true;
        }
        let term_ref = reference(&mapping.id);
        if !references.contains(&term_ref) {
            references.push(term_ref);
        }
        other_entries.push(create_term_definition(&mapping));
    }

    if !references.is_empty() {
        set_property(entry, input.property_key, Value::Array(references));
    }
    other_entries.extend(term_sets(has_ldac_terms, has_custom_terms));
    true
}

/// Link a satellite entity from `entry`, as a single reference or appended to an array
fn link_leaf(entry: &mut Value, key: &str, id: &str, as_array: bool) {
    if !as_array {
        set_property(entry, key, reference(id));
        return;
    }
    let Some(obj) = entry.as_object_mut() else {
        return;
    };
    let slot = obj
        .entry(key.to_string())
        .or_insert_with(|| Value::Array(vec![]));
    match slot {
        Value::Array(arr) => arr.push(reference(id)),
        other => *other = Value::Array(vec![other.take(), reference(id)]),
    }
}

fn handle_place_field(input: &FieldInput<'_>, entry: &mut Value, other_entries: &mut Vec<Value>) -> bool {
    let Some(template) = input.field.template() else {
        return false;
    };
    if input.field.key != "location" || template.get("@type").map(String::as_str) != Some("Place") {
        return false;
    }

    let companions: Vec<&str> = LOCATION_COMPANION_FIELDS
        .iter()
        .filter_map(|key| optional_field_value(input.folder, key))
        .collect();

    for value in &input.values {
        let mut leaf = instantiate_template(template, value);
        if !companions.is_empty() {
            set_property(
                &mut leaf,
                "description",
                json!(format!("Located in {}", companions.join(", "))),
            );
        }
        if let Some(id) = extract_id(&leaf).map(String::from) {
            link_leaf(entry, input.property_key, &id, input.field.is_array());
        }
        other_entries.push(leaf);
    }
    true
}

fn handle_template_field(input: &FieldInput<'_>, entry: &mut Value, other_entries: &mut Vec<Value>) -> bool {
    let Some(template) = input.field.template() else {
        return false;
    };

    for value in &input.values {
        let leaf = instantiate_template(template, value);
        if let Some(id) = extract_id(&leaf).map(String::from) {
            link_leaf(entry, input.property_key, &id, input.field.is_array());
        }
        other_entries.push(leaf);
    }
    true
}

/// A `rocrate` block that only renames the property
fn handle_rocrate_key_field(input: &FieldInput<'_>, entry: &mut Value) -> bool {
    let Some(config) = input.field.rocrate.as_ref() else {
        return false;
    };
    if config.template.is_some() || config.handler.is_some() || input.field.vocabulary_file.is_some() {
        return false;
    }
    set_property(entry, input.property_key, json!(input.values[0]));
    true
}

/// A handler with no template to build from keeps the raw value
fn handle_unresolved_handler_field(input: &FieldInput<'_>, entry: &mut Value) -> bool {
    if input.field.rocrate.is_none() {
        return false;
    }
    set_property(entry, input.property_key, json!(input.values[0]));
    true
}

fn handle_plain_value_field(input: &FieldInput<'_>, entry: &mut Value) {
    let field = input.field;
    let value = input.values[0].as_str();

    // access is exported through licenses, collectionDescription as description
    if field.key == "access" || field.key == "collectionDescription" {
        return;
    }
    if field.key == "title" && get_text(entry, "name") == Some(value) {
        return;
    }
    if OMITTED_PLAIN_FIELDS.contains(&field.key.as_str()) {
        return;
    }
    if field.is_additional {
        warn!(field = %field.key, "skipping additional field without an RO-Crate mapping");
        return;
    }

    if field.key == "date" {
        set_property(entry, "dateCreated", json!(value));
    } else {
        set_property(entry, input.property_key, json!(value));
    }
}

/// Fill a field template with one value
///
/// `[v]` becomes the value, except in an `@id` that builds a `#language_`
/// id, where only the code is used. `[code]` becomes a sanitized
/// `#language_` id.
pub fn instantiate_template(template: &BTreeMap<String, String>, value: &str) -> Value {
    let mut output = serde_json::Map::new();
    for (key, pattern) in template {
        let mut replaced = pattern.clone();

        if replaced.contains("[v]") {
            let replacement = if key == "@id" && replaced.contains("#language_") {
                sanitize_for_iri(language_code(value))
            } else {
                value.to_string()
            };
            replaced = replaced.replacen("[v]", &replacement, 1);
        }

        if replaced.contains("[code]") {
            let code = sanitize_language_code(language_code(value));
            replaced = replaced.replacen("[code]", &code, 1);
        }

        output.insert(key.clone(), Value::String(replaced));
    }
    Value::Object(output)
}

/// Trimmed value of a companion field, `None` when absent or unspecified
pub fn optional_field_value<'f>(folder: &'f Folder, key: &str) -> Option<&'f str> {
    folder.text_property(key)
}
