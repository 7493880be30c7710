//! Session sub-assembly
//!
//! A session is exported either as the root of its own crate (a Dataset
//! at `./`) or nested inside a project export as an Event linked back to
//! the collection. Nested sessions leave the shared licence, access-type
//! and material-type nodes to the project assembly.

use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::entity::{new_entity, reference, set_property, set_references};
use crate::error::ExportError;
use crate::export::ExportContext;
use crate::fields::{add_field_entries, ensure_language};
use crate::files::add_child_file_entries;
use crate::id::{person_id, session_id, unresolved_contributor_id};
use crate::license::{
    create_access_type_definitions, create_session_license, session_license_id, used_access_types,
};
use crate::model::{Folder, Project};
use crate::people::make_entries_from_participants;
use crate::vocab::{
    lameta_publisher, material_type_definitions, metadata_descriptor, LAMETA_PUBLISHER_ID, LDAC_OBJECT_PROFILE,
    ROOT_ENTITY_ID,
};

/// `@type` of a session exported on its own
pub const STANDALONE_SESSION_TYPES: [&str; 2] = ["Dataset", "RepositoryObject"];

/// `@type` of a session inside a project export
pub const NESTED_SESSION_TYPES: [&str; 2] = ["Event", "RepositoryObject"];

const NO_TITLE: &str = "No title provided for this session.";
const NO_DESCRIPTION: &str = "No description provided for this session.";

/// Build a session entity and everything it pulls in
///
/// The session entity always comes first in the returned list. Entities
/// may repeat ids across sessions; the assembler dedupes them.
pub fn create_session_entry(
    ctx: &mut ExportContext<'_>,
    session: &Folder,
    standalone: bool,
) -> Result<Vec<Value>, ExportError> {
    let project = ctx.project;
    let (id, types) = if standalone {
        (ROOT_ENTITY_ID.to_string(), STANDALONE_SESSION_TYPES)
    } else {
        (session_id(session), NESTED_SESSION_TYPES)
    };

    let mut entry = new_entity(&id, &types);
    set_property(&mut entry, "conformsTo", reference(LDAC_OBJECT_PROFILE));
    set_property(
        &mut entry,
        "name",
        json!(session.text_property("title").unwrap_or(NO_TITLE)),
    );
    set_property(
        &mut entry,
        "description",
        json!(session.text_property("description").unwrap_or(NO_DESCRIPTION)),
    );
    set_property(&mut entry, "datePublished", json!(ctx.date_published));

    if standalone {
        set_property(&mut entry, "publisher", reference(LAMETA_PUBLISHER_ID));
    } else {
        set_property(&mut entry, "pcdm:memberOf", reference(ROOT_ENTITY_ID));
        if let Some(date) = session.text_property("date") {
            set_property(&mut entry, "startDate", json!(date));
        }
    }

    let mut other_entries = Vec::new();
    add_field_entries(ctx, session, &mut entry, &mut other_entries);
    ensure_language(ctx, &mut entry, "ldac:subjectLanguage");

    add_participant_properties(&mut entry, session, project);
    let people = make_entries_from_participants(ctx, session)?;

    set_property(
        &mut entry,
        "license",
        reference(&session_license_id(session, project)),
    );
    add_child_file_entries(ctx, session, &mut entry, &mut other_entries)?;

    let mut entries = vec![entry];
    entries.extend(people);

    if standalone {
        let license = create_session_license(session, project);
        let used = used_access_types([&license]);
        entries.push(license);
        entries.extend(create_access_type_definitions(&used));
        entries.extend(material_type_definitions());
        entries.push(lameta_publisher());
        entries.push(metadata_descriptor());
    }

    entries.extend(other_entries);
    Ok(entries)
}

/// Add one `ldac:<role>` property per role found in the session
///
/// Roles are lowercased; each person counts once per role. One person
/// gives a single reference, several give an array.
pub fn add_participant_properties(entry: &mut Value, session: &Folder, project: &Project) {
    let mut roles: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for contribution in session.all_contributions() {
        let name = contribution.person_reference.trim();
        let role = contribution.role.trim().to_lowercase();
        if name.is_empty() || role.is_empty() {
            continue;
        }

        let id = match project.find_person(name) {
            Some(person) => person_id(person),
            None => unresolved_contributor_id(name),
        };
        let ids = roles.entry(role).or_default();
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    for (role, ids) in roles {
        set_references(entry, &format!("ldac:{}", role), &ids, ids.len() > 1);
    }
}
