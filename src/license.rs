//! License resolution
//!
//! Sessions carry an archive-specific `access` value. Every distinct
//! (archive, access) pair becomes one `ldac:DataReuseLicense` node, and
//! each exported file points at exactly one license id.

use serde_json::{json, Value};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use crate::id::dash_normalize;
use crate::model::{FileRef, Folder, FolderKind, Project, UNSPECIFIED};
use crate::vocab::{
    COLLECTION_LICENSE_ID, LDAC_ACCESS_TYPES, LDAC_AUTHORIZED_ACCESS, LDAC_DATA_REUSE_LICENSE,
    LDAC_NS, LDAC_OPEN_ACCESS,
};

/// Access value used when a session has none
const DEFAULT_ACCESS: &str = "public";

/// Keywords that mark an access value as open when the authority list is silent
const PUBLIC_ACCESS_TERMS: [&str; 4] = ["public", "open", "free", "unrestricted"];

/// Types of the project root entity
pub const REPOSITORY_COLLECTION_TYPES: [&str; 2] = ["Dataset", "RepositoryCollection"];

/// Trimmed access value, `None` when empty or `unspecified`
pub fn sanitize_access(access: Option<&str>) -> Option<&str> {
    access
        .map(str::trim)
        .filter(|a| !a.is_empty() && *a != UNSPECIFIED)
}

/// `#license-<archive>-<access key>`
///
/// The access key is the part of the label before the first `:`, so
/// "F: Free to All" and "F" share a license.
pub fn normalized_license_id(access: &str, project: &Project) -> String {
    let archive = project.archive_configuration_name().unwrap_or("unknown");
    let access_key = match access.split_once(':') {
        Some((key, _)) => key.trim(),
        None => access,
    };
    format!(
        "#license-{}-{}",
        dash_normalize(archive),
        dash_normalize(access_key)
    )
}

/// License id for a session, treating a missing access value as public
pub fn session_license_id(session: &Folder, project: &Project) -> String {
    let access = sanitize_access(session.text_property("access")).unwrap_or(DEFAULT_ACCESS);
    normalized_license_id(access, project)
}

/// Map an access value onto `ldac:OpenAccess` / `ldac:AuthorizedAccess`
///
/// The archive's authority list decides first. Unrecognised values are
/// treated as restricted.
pub fn access_category(access: &str, project: &Project) -> String {
    if let Some(category) = project
        .find_access_choice(access)
        .and_then(|c| c.ldac_access_category.as_deref())
        .filter(|c| !c.trim().is_empty())
    {
        return compact_ldac_id(category.trim());
    }

    let lower = access.to_lowercase();
    if PUBLIC_ACCESS_TERMS.iter().any(|term| lower.contains(term)) {
        LDAC_OPEN_ACCESS.to_string()
    } else {
        LDAC_AUTHORIZED_ACCESS.to_string()
    }
}

fn compact_ldac_id(id: &str) -> String {
    match id.strip_prefix(LDAC_NS) {
        Some(local) => format!("ldac:{}", local),
        None => id.to_string(),
    }
}

/// Build the license node for one access value
pub fn create_access_license(access: Option<&str>, project: &Project) -> Value {
    let sanitized = sanitize_access(access);
    let normalized = sanitized.unwrap_or(DEFAULT_ACCESS);
    let category = match sanitized {
        Some(a) => access_category(a, project),
        None => LDAC_OPEN_ACCESS.to_string(),
    };
    let archive = project
        .archive_configuration_name()
        .unwrap_or("current archive");

    let description = match sanitized {
        Some(a) => {
            let meaning = project
                .find_access_choice(a)
                .map(|c| c.description.trim())
                .filter(|d| !d.is_empty());
            match meaning {
                Some(m) => format!(
                    "Marked with the {}-specific term, '{}' which means '{}'",
                    archive, a, m
                ),
                None => format!("Marked with the {}-specific term, '{}'", archive, a),
            }
        }
        None => format!(
            "Marked with the {}-specific term, 'public' which means 'This is an open access license.'",
            archive
        ),
    };

    json!({
        "@id": normalized_license_id(normalized, project),
        "@type": LDAC_DATA_REUSE_LICENSE,
        "name": format!("{} {} License", archive, normalized),
        "description": description,
        "ldac:access": {"@id": category}
    })
}

pub fn create_session_license(session: &Folder, project: &Project) -> Value {
    create_access_license(session.text_property("access"), project)
}

/// One license node per distinct normalized id across all sessions
///
/// `extra_access_values` covers access values that don't live on a session
/// (e.g. project documents). Order follows first appearance.
pub fn create_distinct_licenses(
    sessions: &[Folder],
    project: &Project,
    extra_access_values: &[String],
) -> Vec<Value> {
    let mut seen = BTreeSet::new();
    let mut licenses = Vec::new();

    let accesses = sessions
        .iter()
        .map(|s| s.text_property("access"))
        .chain(extra_access_values.iter().map(|a| Some(a.as_str())));

    for access in accesses {
        let license = create_access_license(access, project);
        let id = license["@id"].as_str().unwrap_or_default().to_string();
        if seen.insert(id) {
            licenses.push(license);
        }
    }
    licenses
}

/// The project-wide license the root entity points at
pub fn collection_license() -> Value {
    json!({
        "@id": COLLECTION_LICENSE_ID,
        "@type": LDAC_DATA_REUSE_LICENSE,
        "name": "Collection License",
        "description": "License for the collection as a whole. Individual items may have their own specific licenses.",
        "ldac:access": {"@id": LDAC_OPEN_ACCESS}
    })
}

/// Access categories referenced by a set of license nodes
pub fn used_access_types<'a>(licenses: impl IntoIterator<Item = &'a Value>) -> BTreeSet<String> {
    licenses
        .into_iter()
        .filter_map(|l| l.get("ldac:access").and_then(|a| a.get("@id")))
        .filter_map(|id| id.as_str().map(String::from))
        .collect()
}

/// `ldac:AccessTypes` plus only the access terms in `used`
///
/// Nothing is emitted when `used` is empty.
pub fn create_access_type_definitions(used: &BTreeSet<String>) -> Vec<Value> {
    if used.is_empty() {
        return vec![];
    }

    let mut definitions = vec![json!({
        "@id": LDAC_ACCESS_TYPES,
        "@type": "DefinedTermSet",
        "name": "Access Types"
    })];

    if used.contains(LDAC_OPEN_ACCESS) {
        definitions.push(json!({
            "@id": LDAC_OPEN_ACCESS,
            "@type": "DefinedTerm",
            "name": "Open Access",
            "description": "Data covered by this license may be accessed as long as the license is served alongside it, and does not require any specific authorization step.",
            "inDefinedTermSet": {"@id": LDAC_ACCESS_TYPES}
        }));
    }

    if used.contains(LDAC_AUTHORIZED_ACCESS) {
        definitions.push(json!({
            "@id": LDAC_AUTHORIZED_ACCESS,
            "@type": "DefinedTerm",
            "name": "Authorized Access",
            "description": "Data covered by this license requires explicit authorization for access.",
            "inDefinedTermSet": {"@id": LDAC_ACCESS_TYPES}
        }));
    }

    definitions
}

/// Per-export record of which license each file resolved to
#[derive(Debug, Default)]
pub struct LicenseResolver {
    file_licenses: HashMap<PathBuf, String>,
}

impl LicenseResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a session file's license once
    ///
    /// A license set directly on the file is kept verbatim; otherwise the
    /// session's normalized access license applies. Later calls for the
    /// same path are no-ops.
    pub fn ensure_file_license(&mut self, file: &FileRef, session: &Folder, project: &Project) {
        if self.file_licenses.contains_key(file.path()) {
            return;
        }
        let license = match file.text_property("license") {
            Some(own) => own.to_string(),
            None => session_license_id(session, project),
        };
        self.set_file_license(file.path(), license);
    }

    /// License id for any file
    ///
    /// A license set on the file itself wins for every owner. Session files
    /// then go through [`ensure_file_license`](Self::ensure_file_license).
    /// Other files keep a license already recorded for them, else inherit
    /// `parent_license`.
    pub fn resolve_for_file(
        &mut self,
        file: &FileRef,
        owner: Option<&Folder>,
        project: &Project,
        parent_license: Option<&str>,
    ) -> Option<String> {
        if let Some(own) = file.text_property("license") {
            self.set_file_license(file.path(), own);
            return Some(own.to_string());
        }
        if let Some(session) = owner.filter(|f| f.kind == FolderKind::Session) {
            self.ensure_file_license(file, session, project);
        }
        if let Some(license) = self.file_license(file.path()) {
            return Some(license.to_string());
        }
        parent_license.map(String::from)
    }

    pub fn file_license(&self, path: &Path) -> Option<&str> {
        self.file_licenses.get(path).map(String::as_str)
    }

    pub fn set_file_license(&mut self, path: &Path, license: impl Into<String>) {
        self.file_licenses.insert(path.to_path_buf(), license.into());
    }

    pub fn all_file_licenses(&self) -> &HashMap<PathBuf, String> {
        &self.file_licenses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AccessChoice, Field};

    fn project_with_archive(archive: &str) -> Project {
        let mut project = Project::new(
            Folder::new(FolderKind::Project, "proj").with_value("archiveConfigurationName", archive),
        );
        project.access_choices = vec![
            AccessChoice {
                id: "F".to_string(),
                label: "F: Free to All".to_string(),
                description: "Anyone may listen".to_string(),
                ldac_access_category: Some("ldac:OpenAccess".to_string()),
            },
            AccessChoice {
                id: "U".to_string(),
                label: "U: Users".to_string(),
                description: "Registered users only".to_string(),
                ldac_access_category: None,
            },
        ];
        project
    }

    fn session_with_access(prefix: &str, access: &str) -> Folder {
        Folder::new(FolderKind::Session, prefix).with_value("access", access)
    }

    #[test]
    fn test_normalized_license_id_uses_access_key() {
        let project = project_with_archive("PARADISEC");
        assert_eq!(
            normalized_license_id("F: Free to All", &project),
            "#license-paradisec-f"
        );
        assert_eq!(normalized_license_id("Entity", &project), "#license-paradisec-entity");

        let unnamed = Project::new(Folder::new(FolderKind::Project, "p"));
        assert_eq!(normalized_license_id("public", &unnamed), "#license-unknown-public");
    }

    #[test]
    fn test_missing_access_is_public() {
        let project = project_with_archive("ELAR");
        let blank = Folder::new(FolderKind::Session, "s1").with_value("access", "unspecified");
        assert_eq!(session_license_id(&blank, &project), "#license-elar-public");

        let license = create_session_license(&blank, &project);
        assert_eq!(license["ldac:access"]["@id"], json!(LDAC_OPEN_ACCESS));
        assert_eq!(license["name"], json!("ELAR public License"));
    }

    #[test]
    fn test_access_category() {
        let project = project_with_archive("PARADISEC");
        assert_eq!(access_category("F", &project), LDAC_OPEN_ACCESS);
        assert_eq!(access_category("U", &project), LDAC_AUTHORIZED_ACCESS);
        assert_eq!(access_category("Open to all", &project), LDAC_OPEN_ACCESS);
        assert_eq!(access_category("Closed", &project), LDAC_AUTHORIZED_ACCESS);
    }

    #[test]
    fn test_license_description_mentions_choice_meaning() {
        let project = project_with_archive("PARADISEC");
        let license = create_access_license(Some("U"), &project);
        assert_eq!(
            license["description"],
            json!("Marked with the PARADISEC-specific term, 'U' which means 'Registered users only'")
        );
        assert_eq!(license["@type"], json!(LDAC_DATA_REUSE_LICENSE));
    }

    #[test]
    fn test_sessions_with_same_access_share_one_license() {
        let project = project_with_archive("REAP");
        let sessions: Vec<Folder> = (0..5)
            .map(|i| session_with_access(&format!("s{}", i), "U"))
            .collect();

        let licenses = create_distinct_licenses(&sessions, &project, &[]);
        assert_eq!(licenses.len(), 1);
        for session in &sessions {
            assert_eq!(json!(session_license_id(session, &project)), licenses[0]["@id"]);
        }
    }

    #[test]
    fn test_distinct_licenses_include_extra_access_values() {
        let project = project_with_archive("REAP");
        let sessions = vec![session_with_access("a", "U"), session_with_access("b", "F")];
        let licenses = create_distinct_licenses(&sessions, &project, &["U".to_string(), "X".to_string()]);
        let ids: Vec<_> = licenses.iter().map(|l| l["@id"].clone()).collect();
        assert_eq!(
            ids,
            vec![
                json!("#license-reap-u"),
                json!("#license-reap-f"),
                json!("#license-reap-x")
            ]
        );
    }

    #[test]
    fn test_access_type_definitions_only_used() {
        assert!(create_access_type_definitions(&BTreeSet::new()).is_empty());

        let used: BTreeSet<String> = [LDAC_AUTHORIZED_ACCESS.to_string()].into();
        let defs = create_access_type_definitions(&used);
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0]["@id"], json!(LDAC_ACCESS_TYPES));
        assert_eq!(defs[1]["@id"], json!(LDAC_AUTHORIZED_ACCESS));
    }

    #[test]
    fn test_file_license_precedence() {
        let project = project_with_archive("ELAR");
        let session = session_with_access("s1", "U");
        let mut resolver = LicenseResolver::new();

        let mut own = FileRef::new("/data/s1/a.wav");
        own.properties.insert("license".to_string(), Field::text("CC-BY-4.0"));
        let plain = FileRef::new("/data/s1/b.wav");

        resolver.ensure_file_license(&own, &session, &project);
        resolver.ensure_file_license(&plain, &session, &project);
        assert_eq!(resolver.file_license(own.path()), Some("CC-BY-4.0"));
        assert_eq!(resolver.file_license(plain.path()), Some("#license-elar-u"));

        // idempotent
        let other_session = session_with_access("s1", "F");
        resolver.ensure_file_license(&plain, &other_session, &project);
        assert_eq!(resolver.file_license(plain.path()), Some("#license-elar-u"));
        assert_eq!(resolver.all_file_licenses().len(), 2);
    }

    #[test]
    fn test_non_session_files_inherit_parent_license() {
        let project = project_with_archive("ELAR");
        let person = Folder::new(FolderKind::Person, "Awi");
        let mut resolver = LicenseResolver::new();
        let photo = FileRef::new("/data/people/Awi/photo.jpg");

        assert_eq!(
            resolver.resolve_for_file(&photo, Some(&person), &project, Some(COLLECTION_LICENSE_ID)),
            Some(COLLECTION_LICENSE_ID.to_string())
        );
        assert_eq!(resolver.resolve_for_file(&photo, Some(&person), &project, None), None);
    }

    #[test]
    fn test_own_license_wins_outside_sessions() {
        let project = project_with_archive("ELAR");
        let person = Folder::new(FolderKind::Person, "Awi");
        let mut resolver = LicenseResolver::new();
        let mut consent = FileRef::new("/data/people/Awi/consent.pdf");
        consent.properties.insert("license".to_string(), Field::text("#license-elar-s"));

        assert_eq!(
            resolver.resolve_for_file(&consent, Some(&person), &project, None),
            Some("#license-elar-s".to_string())
        );
        assert_eq!(
            resolver.resolve_for_file(&consent, None, &project, Some(COLLECTION_LICENSE_ID)),
            Some("#license-elar-s".to_string())
        );
        assert_eq!(resolver.file_license(consent.path()), Some("#license-elar-s"));
    }
}
