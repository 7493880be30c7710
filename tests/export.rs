use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Once;

use serde_json::{json, Value};
use tempfile::TempDir;

use ldac_rocrate_export::model::{FieldHandler, RocrateConfig};
use ldac_rocrate_export::vocabulary::{TermMapping, VocabularyDefinition};
use ldac_rocrate_export::{
    export_rocrate, to_json_string, Contribution, ExportError, ExportOptions, ExportRoot, Field, FieldDefinition,
    FileRef, Folder, FolderKind, NoVocabularies, Project, StaticVocabularies,
};

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

fn options() -> ExportOptions {
    ExportOptions {
        date_published: Some("2024-01-31T09:15:00.000Z".to_string()),
        ..Default::default()
    }
}

fn touch(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, name).unwrap();
    path
}

fn entity<'g>(graph: &'g [Value], id: &str) -> &'g Value {
    graph
        .iter()
        .find(|e| e["@id"] == json!(id))
        .unwrap_or_else(|| panic!("missing entity {}", id))
}

fn genre_field() -> FieldDefinition {
    let mut def = FieldDefinition::new("genre");
    def.vocabulary_file = Some("genres.json".to_string());
    def
}

fn language_field() -> FieldDefinition {
    let mut def = FieldDefinition::new("languages");
    def.field_type = "languageChoices".to_string();
    def.rocrate = Some(RocrateConfig {
        key: Some("ldac:subjectLanguage".to_string()),
        handler: Some(FieldHandler::Languages),
        template: None,
        array: None,
    });
    def
}

fn person_folder(prefix: &str, name: &str, birth_year: &str) -> Folder {
    let mut how_to_contact = FieldDefinition::new("howToContact");
    how_to_contact.personally_identifiable_information = true;
    Folder::new(FolderKind::Person, prefix)
        .with_field(FieldDefinition::new("name"))
        .with_field(FieldDefinition::new("birthYear"))
        .with_field(how_to_contact)
        .with_value("name", name)
        .with_value("birthYear", birth_year)
        .with_value("howToContact", "call the village office")
}

/// Edolo project with five sessions sharing one access value
fn edolo_project(dir: &TempDir) -> Project {
    let mut project = Project::new(
        Folder::new(FolderKind::Project, "Edolo")
            .with_value("title", "Edolo")
            .with_value("archiveConfigurationName", "ELAR")
            .with_value("collectionDescription", "Recordings of Edolo speakers"),
    );

    for (i, date) in ["", "2010-06-06", "2015-01-01", "", "2016-03-03"].iter().enumerate() {
        let prefix = format!("ETR00{}", i + 1);
        let mut session = Folder::new(FolderKind::Session, prefix.as_str())
            .with_field(genre_field())
            .with_field(language_field())
            .with_value("title", &format!("Session {}", i + 1))
            .with_value("access", "U")
            .with_value("genre", "dialog, my_custom_genre")
            .with_value("languages", "etr: Edolo;tpi");
        if !date.is_empty() {
            session = session.with_value("date", date);
        }

        let mut recording = FileRef::new(touch(dir, &format!("{}.wav", prefix)));
        recording.contributions = vec![
            Contribution::new("Awi Heole", "speaker"),
            Contribution::new("Awi Heole", "speaker"),
            Contribution::new("Kelu", "speaker"),
            Contribution::new("Mary Smith", "recorder"),
        ];
        session.files.push(recording);
        session
            .files
            .push(FileRef::new(touch(dir, &format!("{}.eaf", prefix))));
        project.sessions.push(session);
    }

    project.people.push(
        person_folder("Awi", "Awi Heole", "1972")
            .with_file(FileRef::new(touch(dir, "Awi_Photo.jpg"))),
    );
    project.people.push(person_folder("Kelu", "Kelu", "?"));

    project.description_documents.push(FileRef::new(touch(dir, "protocol.pdf")));
    project.other_documents.push(FileRef::new(touch(dir, "map.png")));
    project
}

fn vocabularies() -> StaticVocabularies {
    StaticVocabularies::new().with_file(
        "genres.json",
        vec![VocabularyDefinition {
            id: "dialog".to_string(),
            label: "Dialog".to_string(),
            definition: "A conversation between two or more people".to_string(),
            examples: vec![],
            mapping: vec![TermMapping {
                vocabulary: "LDAC".to_string(),
                term: "ldac:Dialogue".to_string(),
            }],
        }],
    )
}

#[test]
fn test_project_export_has_unique_ids() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let project = edolo_project(&dir);
    let result = export_rocrate(&project, ExportRoot::Project, &vocabularies(), &options()).unwrap();

    let mut seen = HashSet::new();
    for e in &result.graph {
        let id = e["@id"].as_str().unwrap();
        assert!(seen.insert(id.to_string()), "duplicate @id {}", id);
    }
    assert_eq!(result.stats.total_entities, result.graph.len());
    assert!(result.stats.duplicates_dropped > 0);
    assert_eq!(result.stats.sessions, 5);
}

#[test]
fn test_project_export_has_unique_has_part() {
    let dir = TempDir::new().unwrap();
    let project = edolo_project(&dir);
    let result = export_rocrate(&project, ExportRoot::Project, &vocabularies(), &options()).unwrap();

    for e in &result.graph {
        if let Some(parts) = e.get("hasPart").and_then(Value::as_array) {
            let ids: HashSet<&str> = parts.iter().filter_map(|p| p["@id"].as_str()).collect();
            assert_eq!(ids.len(), parts.len(), "repeated hasPart on {}", e["@id"]);
        }
    }

    let root = entity(&result.graph, "./");
    let parts: Vec<&str> = root["hasPart"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["@id"].as_str())
        .collect();
    assert_eq!(
        parts,
        vec![
            "People/Awi/",
            "People/Kelu/",
            "#contributor-mary-smith",
            "DescriptionDocuments/protocol.pdf",
            "OtherDocuments/map.png"
        ]
    );
}

#[test]
fn test_sessions_share_one_license() {
    let dir = TempDir::new().unwrap();
    let project = edolo_project(&dir);
    let result = export_rocrate(&project, ExportRoot::Project, &vocabularies(), &options()).unwrap();

    let licenses: Vec<&Value> = result
        .graph
        .iter()
        .filter(|e| e["@type"] == json!("ldac:DataReuseLicense") && e["@id"] != json!("#collection-license"))
        .collect();
    assert_eq!(licenses.len(), 1);
    assert_eq!(licenses[0]["@id"], json!("#license-elar-u"));

    for session in &project.sessions {
        let id = format!("#session-{}", session.file_prefix);
        assert_eq!(entity(&result.graph, &id)["license"], json!({"@id": "#license-elar-u"}));
        let wav = format!("Sessions/{}/{}.wav", session.file_prefix, session.file_prefix);
        assert_eq!(entity(&result.graph, &wav)["license"], json!({"@id": "#license-elar-u"}));
    }
}

#[test]
fn test_age_and_privacy_through_project_export() {
    let dir = TempDir::new().unwrap();
    let project = edolo_project(&dir);
    let result = export_rocrate(&project, ExportRoot::Project, &vocabularies(), &options()).unwrap();

    let awi = entity(&result.graph, "People/Awi/");
    assert_eq!(awi["ldac:age"], json!("38"));
    assert_eq!(awi["image"], json!({"@id": "People/Awi/Awi_Photo.jpg"}));
    assert!(!awi.to_string().contains("village office"));
    assert!(awi.get("birthYear").is_none());

    let kelu = entity(&result.graph, "People/Kelu/");
    assert!(kelu.get("ldac:age").is_none());
}

#[test]
fn test_roles_through_session_export() {
    let dir = TempDir::new().unwrap();
    let project = edolo_project(&dir);
    let session = &project.sessions[1];
    let result = export_rocrate(&project, ExportRoot::Session(session), &vocabularies(), &options()).unwrap();

    let root = entity(&result.graph, "./");
    assert_eq!(
        root["ldac:speaker"],
        json!([{"@id": "People/Awi/"}, {"@id": "People/Kelu/"}])
    );
    assert_eq!(root["ldac:recorder"], json!({"@id": "#contributor-mary-smith"}));
    assert_eq!(
        entity(&result.graph, "#contributor-mary-smith")["name"],
        json!("Mary Smith")
    );
    entity(&result.graph, "#license-elar-u");
    entity(&result.graph, "ro-crate-metadata.json");
    assert_eq!(root["publisher"], json!({"@id": "https://github.com/onset/lameta"}));
    entity(&result.graph, "https://github.com/onset/lameta");
}

#[test]
fn test_non_ascii_contributors_stay_distinct() {
    let dir = TempDir::new().unwrap();
    let mut project = edolo_project(&dir);
    let mut recording = FileRef::new(touch(&dir, "ETR009.wav"));
    recording.contributions = vec![
        Contribution::new("Мария", "speaker"),
        Contribution::new("Иван", "speaker"),
    ];
    project.sessions.push(
        Folder::new(FolderKind::Session, "ETR009")
            .with_value("access", "U")
            .with_file(recording),
    );

    let result = export_rocrate(&project, ExportRoot::Project, &vocabularies(), &options()).unwrap();

    let session = entity(&result.graph, "#session-ETR009");
    assert_eq!(
        session["ldac:speaker"],
        json!([{"@id": "#contributor-мария"}, {"@id": "#contributor-иван"}])
    );
    assert_eq!(entity(&result.graph, "#contributor-мария")["name"], json!("Мария"));
    assert_eq!(entity(&result.graph, "#contributor-иван")["name"], json!("Иван"));
    assert!(!result.graph.iter().any(|e| e["@id"] == json!("#contributor-unknown")));
}

#[test]
fn test_person_export_keeps_file_license() {
    let dir = TempDir::new().unwrap();
    let mut project = edolo_project(&dir);
    let mut consent = FileRef::new(touch(&dir, "Awi_Consent.pdf"));
    consent
        .properties
        .insert("license".to_string(), Field::text("#license-elar-s"));
    project.people[0].files.push(consent);

    let person = &project.people[0];
    let result = export_rocrate(&project, ExportRoot::Person(person), &vocabularies(), &options()).unwrap();
    assert_eq!(
        entity(&result.graph, "People/Awi/Awi_Consent.pdf")["license"],
        json!({"@id": "#license-elar-s"})
    );
}

#[test]
fn test_genres_and_languages() {
    let dir = TempDir::new().unwrap();
    let project = edolo_project(&dir);
    let result = export_rocrate(&project, ExportRoot::Project, &vocabularies(), &options()).unwrap();
    let session = entity(&result.graph, "#session-ETR001");

    assert_eq!(
        session["ldac:subjectLanguage"],
        json!([{"@id": "#language_etr"}, {"@id": "#language_tpi"}])
    );
    assert_eq!(
        session["genre"],
        json!([
            {"@id": "ldac:Dialogue"},
            {"@id": "tag:lameta,Edolo:genre/my_custom_genre"}
        ])
    );
    entity(&result.graph, "#language_etr");
    entity(&result.graph, "#language_tpi");
    assert!(!result.graph.iter().any(|e| e["@id"] == json!("#language_und")));
}

#[test]
fn test_missing_vocabulary_falls_back_to_custom_terms() {
    let dir = TempDir::new().unwrap();
    let project = edolo_project(&dir);
    let result = export_rocrate(&project, ExportRoot::Project, &NoVocabularies, &options()).unwrap();
    let session = entity(&result.graph, "#session-ETR002");
    assert_eq!(
        session["genre"],
        json!([
            {"@id": "tag:lameta,Edolo:genre/dialog"},
            {"@id": "tag:lameta,Edolo:genre/my_custom_genre"}
        ])
    );
}

#[test]
fn test_missing_file_aborts_export() {
    let dir = TempDir::new().unwrap();
    let mut project = edolo_project(&dir);
    project.sessions[0].files.push(FileRef::new(dir.path().join("gone.wav")));
    let err = export_rocrate(&project, ExportRoot::Project, &vocabularies(), &options()).unwrap_err();
    assert!(matches!(err, ExportError::FileMetadata { .. }));
}

#[test]
fn test_output_is_deterministic_with_fixed_date() {
    let dir = TempDir::new().unwrap();
    let project = edolo_project(&dir);
    let first = export_rocrate(&project, ExportRoot::Project, &vocabularies(), &options()).unwrap();
    let second = export_rocrate(&project, ExportRoot::Project, &vocabularies(), &options()).unwrap();
    assert_eq!(
        to_json_string(&first, true).unwrap(),
        to_json_string(&second, true).unwrap()
    );
}
