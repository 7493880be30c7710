//! Person projection
//!
//! People are the one place where exported metadata can identify a living
//! person, so their entities are built from a short allowlist instead of
//! the generic field mapping. Anything flagged as personally identifying,
//! and every user-added field, is left out.

use chrono::{DateTime, Datelike, NaiveDate};
use serde_json::{json, Value};
use std::collections::BTreeSet;

use crate::entity::{new_entity, person, set_property};
use crate::error::ExportError;
use crate::export::ExportContext;
use crate::files::add_child_file_entries;
use crate::id::{person_id, unresolved_contributor_id};
use crate::model::{Folder, Project};

/// Person fields that map directly onto LDAC properties
const LDAC_COMPLIANT_FIELDS: [&str; 2] = ["name", "gender"];

/// Person fields folded into the description as sentences
const DESCRIPTION_FIELDS: [&str; 2] = ["education", "primaryOccupation"];

/// Parse a session date
///
/// Accepts ISO dates, RFC 3339 timestamps, `YYYY/MM/DD` and a bare year.
pub fn parse_session_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some(datetime.date_naive());
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y/%m/%d") {
        return Some(date);
    }
    if text.len() == 4 {
        if let Ok(year) = text.parse::<i32>() {
            return NaiveDate::from_ymd_opt(year, 1, 1);
        }
    }
    None
}

/// Date of the first session, in project order, that has a usable date
pub fn first_session_with_date(project: &Project) -> Option<NaiveDate> {
    project
        .sessions
        .iter()
        .filter_map(|s| s.text_property("date"))
        .find_map(parse_session_date)
}

/// Age in whole years at `date`, as text; `None` for unknown or impossible birth years
pub fn age_on(birth_year: &str, date: NaiveDate) -> Option<String> {
    let year: i32 = birth_year.trim().parse().ok()?;
    let age = date.year() - year;
    (age >= 0).then(|| age.to_string())
}

/// Apply the person allowlist to `entry`
///
/// `name` and `gender` pass through, `education` and `primaryOccupation`
/// become description sentences and `birthYear` turns into `ldac:age`.
pub fn make_ldac_compliant_person(person: &Folder, session_date: Option<NaiveDate>, entry: &mut Value) {
    let is_pii = |key: &str| {
        person
            .known_fields
            .iter()
            .any(|f| f.key == key && f.personally_identifiable_information)
    };

    let mut description_parts: Vec<String> = Vec::new();
    if let Some(existing) = person.text_property("description").filter(|_| !is_pii("description")) {
        description_parts.push(existing.to_string());
    }

    if let (Some(birth_year), Some(date)) = (person.text_property("birthYear"), session_date) {
        if !is_pii("birthYear") {
            if let Some(age) = age_on(birth_year, date) {
                set_property(entry, "ldac:age", json!(age));
            }
        }
    }

    for field in &person.known_fields {
        if field.is_migrated() || field.personally_identifiable_information {
            continue;
        }
        let Some(value) = person.text_property(&field.key) else {
            continue;
        };

        if LDAC_COMPLIANT_FIELDS.contains(&field.key.as_str()) {
            set_property(entry, &field.key, json!(value));
        } else if DESCRIPTION_FIELDS.contains(&field.key.as_str()) {
            description_parts.push(format!("{}: {}.", field.label(), value));
        }
    }

    if !description_parts.is_empty() {
        set_property(entry, "description", json!(description_parts.join(" ")));
    }
}

/// Person entity (plus its file entities) for a person folder
pub fn person_entries(ctx: &mut ExportContext<'_>, person: &Folder) -> Result<Vec<Value>, ExportError> {
    let mut entry = new_entity(&person_id(person), &["Person"]);
    make_ldac_compliant_person(person, first_session_with_date(ctx.project), &mut entry);

    let mut files = Vec::new();
    add_child_file_entries(ctx, person, &mut entry, &mut files)?;

    let mut entries = vec![entry];
    entries.extend(files);
    Ok(entries)
}

/// Stub Person for a contributor with no person folder
pub fn unresolved_contributor(name: &str) -> Value {
    person(&unresolved_contributor_id(name), name)
}

/// Person entities for everyone who contributed to a session
///
/// One entity per distinct (trimmed) person reference across the session
/// and all its files, in first-seen order.
pub fn make_entries_from_participants(
    ctx: &mut ExportContext<'_>,
    session: &Folder,
) -> Result<Vec<Value>, ExportError> {
    let project = ctx.project;
    let mut seen = BTreeSet::new();
    let mut entries = Vec::new();

    for contribution in session.all_contributions() {
        let name = contribution.person_reference.trim();
        if name.is_empty() || !seen.insert(name.to_string()) {
            continue;
        }
        match project.find_person(name) {
            Some(person) => entries.extend(person_entries(ctx, person)?),
            None => entries.push(unresolved_contributor(name)),
        }
    }
    Ok(entries)
}
