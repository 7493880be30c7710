//! Graph assembly
//!
//! Entry point of the crate: compile a project, one of its sessions or one
//! of its people into a single RO-Crate document. Every sub-builder appends
//! loose entities; this module orders them, de-duplicates by `@id` and
//! cleans up each `hasPart`.

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::dedup::{dedupe_has_part, unique_entries};
use crate::entity::{
    extract_id, has_type, new_entity, organization, person, place, push_has_part, reference, set_property,
    set_references,
};
use crate::error::ExportError;
use crate::fields::{add_field_entries, ensure_language, DEPOSITOR_FIELD};
use crate::files::{add_child_file_entries, add_project_document_entries, DESCRIPTION_DOCUMENTS, OTHER_DOCUMENTS};
use crate::id::{person_id, sanitize_for_iri, session_id, slugify, unresolved_contributor_id};
use crate::languages::LanguageRegistry;
use crate::license::{
    collection_license, create_access_type_definitions, create_distinct_licenses, used_access_types,
    LicenseResolver, REPOSITORY_COLLECTION_TYPES,
};
use crate::model::{Folder, FolderKind, Project};
use crate::people::{first_session_with_date, make_ldac_compliant_person, person_entries};
use crate::sessions::create_session_entry;
use crate::vocab::{
    context, material_type_definitions, metadata_descriptor, COLLECTION_LICENSE_ID, DESCRIPTION_PROTOCOL_ID,
    LDAC_COLLECTION_PROFILE, METADATA_DESCRIPTOR_ID, ROOT_ENTITY_ID, UNKNOWN_CONTRIBUTOR_ID,
};
use crate::vocabulary::VocabularyLoader;

/// Archive names that don't identify a real publisher
const PLACEHOLDER_ARCHIVES: [&str; 2] = ["default", "unknown"];

/// Options for an export
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Only emit language entities that something references
    pub prune_unused_languages: bool,
    /// Fail on two different entities sharing an `@id` instead of keeping the first
    pub strict_duplicates: bool,
    /// Fixed `datePublished`; defaults to the time of export
    pub date_published: Option<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            prune_unused_languages: true,
            strict_duplicates: false,
            date_published: None,
        }
    }
}

/// State owned by one export call
///
/// Registries start empty for every export, so two exports never see each
/// other's languages or licenses.
pub struct ExportContext<'a> {
    pub project: &'a Project,
    pub vocabularies: &'a dyn VocabularyLoader,
    pub options: &'a ExportOptions,
    pub languages: LanguageRegistry,
    pub licenses: LicenseResolver,
    pub date_published: String,
}

impl<'a> ExportContext<'a> {
    pub fn new(project: &'a Project, vocabularies: &'a dyn VocabularyLoader, options: &'a ExportOptions) -> Self {
        let date_published = options
            .date_published
            .clone()
            .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
        Self {
            project,
            vocabularies,
            options,
            languages: LanguageRegistry::with_names(&project.language_names),
            licenses: LicenseResolver::new(),
            date_published,
        }
    }
}

/// What to put at the root of the crate
#[derive(Debug, Clone, Copy)]
pub enum ExportRoot<'a> {
    Project,
    Session(&'a Folder),
    Person(&'a Folder),
}

/// Result of an export
#[derive(Debug)]
pub struct ExportResult {
    pub context: Value,
    pub graph: Vec<Value>,
    pub stats: ExportStats,
}

/// Statistics from an export
#[derive(Debug, Default)]
pub struct ExportStats {
    /// Number of entities in the final graph
    pub total_entities: usize,
    /// Entities dropped because an earlier one had the same `@id`
    pub duplicates_dropped: usize,
    /// Dropped entities whose content differed from the kept one
    pub conflicting_entities: usize,
    pub sessions: usize,
    pub people: usize,
    pub files: usize,
}

/// Compile `root` into an RO-Crate graph
pub fn export_rocrate(
    project: &Project,
    root: ExportRoot<'_>,
    vocabularies: &dyn VocabularyLoader,
    options: &ExportOptions,
) -> Result<ExportResult, ExportError> {
    let mut ctx = ExportContext::new(project, vocabularies, options);
    let mut stats = ExportStats::default();

    let mut entries = match root {
        ExportRoot::Project => {
            stats.sessions = project.sessions.len();
            project_entries(&mut ctx)?
        }
        ExportRoot::Session(session) => {
            expect_kind(session, FolderKind::Session)?;
            stats.sessions = 1;
            create_session_entry(&mut ctx, session, true)?
        }
        ExportRoot::Person(person) => {
            expect_kind(person, FolderKind::Person)?;
            person_root_entries(&mut ctx, person)?
        }
    };

    let languages = if options.prune_unused_languages {
        ctx.languages.used_entities()
    } else {
        ctx.languages.all_entities().iter().collect()
    };
    entries.extend(languages.into_iter().map(|l| l.to_json()));

    let unique = unique_entries(entries, options.strict_duplicates)?;
    let mut graph = unique.entities;
    for entity in &mut graph {
        dedupe_has_part(entity);
    }
    // descriptor first, everything else keeps its order
    graph.sort_by_key(|e| extract_id(e) != Some(METADATA_DESCRIPTOR_ID));

    stats.duplicates_dropped = unique.dropped;
    stats.conflicting_entities = unique.conflicts;
    stats.people = graph.iter().filter(|e| has_type(e, "Person")).count();
    stats.files = graph.iter().filter(|e| has_type(e, "File")).count();
    stats.total_entities = graph.len();

    Ok(ExportResult {
        context: context(),
        graph,
        stats,
    })
}

fn expect_kind(folder: &Folder, kind: FolderKind) -> Result<(), ExportError> {
    if folder.kind == kind {
        Ok(())
    } else {
        Err(ExportError::InvalidSnapshot(format!(
            "folder '{}' is a {:?}, expected a {:?}",
            folder.file_prefix, folder.kind, kind
        )))
    }
}

fn project_entries(ctx: &mut ExportContext<'_>) -> Result<Vec<Value>, ExportError> {
    let project = ctx.project;
    let folder = &project.folder;

    let mut entry = new_entity(ROOT_ENTITY_ID, &REPOSITORY_COLLECTION_TYPES);
    set_property(&mut entry, "conformsTo", reference(LDAC_COLLECTION_PROFILE));
    set_property(
        &mut entry,
        "name",
        json!(project.title().unwrap_or("No title provided for this project.")),
    );
    set_property(
        &mut entry,
        "description",
        json!(folder
            .text_property("collectionDescription")
            .unwrap_or("No description provided for this project.")),
    );
    set_property(&mut entry, "datePublished", json!(ctx.date_published));

    let mut other_entries = Vec::new();
    let contact = contact_reference(ctx, &mut other_entries)?;
    for key in ["author", "accountablePerson", "dct:rightsHolder"] {
        set_property(&mut entry, key, contact.clone());
    }
    set_property(&mut entry, "license", reference(COLLECTION_LICENSE_ID));

    add_field_entries(ctx, folder, &mut entry, &mut other_entries);
    add_child_file_entries(ctx, folder, &mut entry, &mut other_entries)?;

    if let Some(publisher) = publisher(project) {
        let id = extract_id(&publisher).unwrap_or_default().to_string();
        set_property(&mut entry, "publisher", reference(&id));
        set_property(&mut entry, "holdingArchive", reference(&id));
        other_entries.push(publisher);
    }
    if let Some(depositor) = depositor(project) {
        let id = extract_id(&depositor).unwrap_or_default().to_string();
        set_property(&mut entry, "ldac:depositor", reference(&id));
        other_entries.push(depositor);
    }
    if let Some(place) = coverage_place(folder) {
        let id = extract_id(&place).unwrap_or_default().to_string();
        set_property(&mut entry, "contentLocation", json!([reference(&id)]));
        other_entries.push(place);
    }

    let mut session_entries = Vec::new();
    let mut member_ids = Vec::new();
    for session in &project.sessions {
        session_entries.extend(create_session_entry(ctx, session, false)?);
        member_ids.push(session_id(session));
        for contribution in session.all_contributions() {
            let name = contribution.person_reference.trim();
            if name.is_empty() {
                continue;
            }
            let id = match project.find_person(name) {
                Some(person) => person_id(person),
                None => unresolved_contributor_id(name),
            };
            push_has_part(&mut entry, &id);
        }
    }
    set_references(&mut entry, "pcdm:hasMember", &member_ids, true);

    let descriptions = add_project_document_entries(
        ctx,
        &project.description_documents,
        DESCRIPTION_DOCUMENTS,
        &mut entry,
        &mut other_entries,
    )?;
    if !descriptions.file_ids.is_empty() {
        other_entries.push(collection_protocol(
            project,
            &descriptions.file_ids,
            &contact,
            descriptions.earliest_date.as_deref().unwrap_or(&ctx.date_published),
        ));
        set_property(
            &mut entry,
            "ldac:hasCollectionProtocol",
            json!([reference(DESCRIPTION_PROTOCOL_ID)]),
        );
    }
    let others = add_project_document_entries(
        ctx,
        &project.other_documents,
        OTHER_DOCUMENTS,
        &mut entry,
        &mut other_entries,
    )?;

    let document_access: Vec<String> = descriptions
        .access_values
        .into_iter()
        .chain(others.access_values)
        .collect();
    let licenses = create_distinct_licenses(&project.sessions, project, &document_access);
    let collection = collection_license();
    let used = used_access_types(licenses.iter().chain(std::iter::once(&collection)));

    let mut entries = vec![metadata_descriptor(), entry];
    entries.extend(session_entries);
    entries.extend(licenses);
    entries.push(collection);
    entries.extend(create_access_type_definitions(&used));
    entries.extend(material_type_definitions());
    entries.extend(other_entries);
    Ok(entries)
}

/// Contact person as a reference, a raw name, or the unknown contributor
fn contact_reference(ctx: &mut ExportContext<'_>, other_entries: &mut Vec<Value>) -> Result<Value, ExportError> {
    let project = ctx.project;
    let contact = project
        .folder
        .text_property("contactPerson")
        .filter(|c| !c.eq_ignore_ascii_case("unknown"));

    let Some(name) = contact else {
        other_entries.push(person(UNKNOWN_CONTRIBUTOR_ID, "Unknown"));
        return Ok(reference(UNKNOWN_CONTRIBUTOR_ID));
    };

    match project.find_person(name) {
        Some(found) => {
            other_entries.extend(person_entries(ctx, found)?);
            Ok(reference(&person_id(found)))
        }
        None => Ok(json!(name)),
    }
}

fn publisher(project: &Project) -> Option<Value> {
    let name = project.archive_configuration_name()?;
    if PLACEHOLDER_ARCHIVES.iter().any(|p| name.eq_ignore_ascii_case(p)) {
        return None;
    }
    Some(organization(&format!("#publisher-{}", slugify(name)), name))
}

fn depositor(project: &Project) -> Option<Value> {
    let name = project.folder.text_property(DEPOSITOR_FIELD)?;
    Some(person(&format!("#depositor-{}", slugify(name)), name))
}

/// Project country (or, failing that, continent) as a Place
fn coverage_place(folder: &Folder) -> Option<Value> {
    let continent = folder.text_property("continent");
    if let Some(country) = folder.text_property("country") {
        let mut country_place = place(&format!("#place-country-{}", sanitize_for_iri(country)), country);
        if let Some(continent) = continent {
            set_property(&mut country_place, "description", json!(format!("Located in {}", continent)));
        }
        return Some(country_place);
    }
    continent.map(|continent| place(&format!("#place-continent-{}", sanitize_for_iri(continent)), continent))
}

fn collection_protocol(project: &Project, file_ids: &[String], author: &Value, date_published: &str) -> Value {
    let name = match project.title() {
        Some(title) => format!("{} collection protocol", title),
        None => "Collection protocol documents".to_string(),
    };
    let description = project
        .folder
        .text_property("collectionDescription")
        .unwrap_or("Description documents summarizing how this collection was gathered.");

    let mut protocol = json!({
        "@id": DESCRIPTION_PROTOCOL_ID,
        "@type": "ldac:CollectionProtocol",
        "name": name,
        "description": description,
        "author": author,
        "datePublished": date_published,
        "isPartOf": reference(ROOT_ENTITY_ID)
    });
    set_references(&mut protocol, "hasPart", file_ids, true);
    protocol
}

/// A person exported on their own
fn person_root_entries(ctx: &mut ExportContext<'_>, folder: &Folder) -> Result<Vec<Value>, ExportError> {
    let id = person_id(folder);
    let mut entry = new_entity(&id, &["Person"]);
    let mut other_entries = Vec::new();

    add_field_entries(ctx, folder, &mut entry, &mut other_entries);
    ensure_language(ctx, &mut entry, "inLanguage");
    make_ldac_compliant_person(folder, first_session_with_date(ctx.project), &mut entry);
    add_child_file_entries(ctx, folder, &mut entry, &mut other_entries)?;

    let mut descriptor = metadata_descriptor();
    set_property(&mut descriptor, "about", reference(&id));

    let mut entries = vec![descriptor, entry];
    entries.extend(other_entries);
    Ok(entries)
}

/// Build a complete RO-Crate JSON-LD document from an export result
pub fn to_jsonld(result: &ExportResult) -> Value {
    json!({
        "@context": result.context,
        "@graph": result.graph
    })
}

/// Serialize an export result to a JSON string
pub fn to_json_string(result: &ExportResult, pretty: bool) -> Result<String, ExportError> {
    let doc = to_jsonld(result);
    if pretty {
        Ok(serde_json::to_string_pretty(&doc)?)
    } else {
        Ok(serde_json::to_string(&doc)?)
    }
}
