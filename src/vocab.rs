//! Vocabulary definitions for LDAC RO-Crate export
//!
//! Fixed identifiers, the JSON-LD context and the LDAC term-set nodes
//! that every export may reference.

use serde_json::{json, Value};

/// RO-Crate 1.2 context URL
pub const ROCRATE_CONTEXT: &str = "https://w3id.org/ro/crate/1.2/context";

/// RO-Crate 1.2 profile (used by the metadata descriptor)
pub const ROCRATE_PROFILE: &str = "https://w3id.org/ro/crate/1.2";

/// LDAC terms namespace, bound to the `ldac:` prefix in the context
pub const LDAC_NS: &str = "https://w3id.org/ldac/terms#";

/// LDAC profile conformance targets
pub const LDAC_COLLECTION_PROFILE: &str = "https://w3id.org/ldac/profile#Collection";
pub const LDAC_OBJECT_PROFILE: &str = "https://w3id.org/ldac/profile#Object";

pub const PCDM_NS: &str = "http://pcdm.org/models#";
pub const DCT_NS: &str = "http://purl.org/dc/terms/";

/// Standard metadata descriptor filename
pub const METADATA_DESCRIPTOR_ID: &str = "ro-crate-metadata.json";

/// Files whose names start with this are never described by the export
pub const RESERVED_FILE_PREFIX: &str = "ro-crate";

/// Root entity ID
pub const ROOT_ENTITY_ID: &str = "./";

pub const COLLECTION_LICENSE_ID: &str = "#collection-license";
pub const UNKNOWN_CONTRIBUTOR_ID: &str = "#unknown-contributor";
pub const DESCRIPTION_PROTOCOL_ID: &str = "#descriptionDocuments";

/// Publisher of a session exported on its own
pub const LAMETA_PUBLISHER_ID: &str = "https://github.com/onset/lameta";

/// Access categories
pub const LDAC_OPEN_ACCESS: &str = "ldac:OpenAccess";
pub const LDAC_AUTHORIZED_ACCESS: &str = "ldac:AuthorizedAccess";
pub const LDAC_ACCESS_TYPES: &str = "ldac:AccessTypes";
pub const LDAC_DATA_REUSE_LICENSE: &str = "ldac:DataReuseLicense";

/// Material types
pub const LDAC_MATERIAL_TYPES: &str = "ldac:MaterialTypes";
pub const LDAC_PRIMARY_MATERIAL: &str = "ldac:PrimaryMaterial";
pub const LDAC_ANNOTATION: &str = "ldac:Annotation";
pub const LDAC_DERIVED_MATERIAL: &str = "ldac:DerivedMaterial";

/// Genre term sets
pub const LDAC_GENRE_TERMS: &str = "ldac:LinguisticGenreTerms";
pub const CUSTOM_GENRE_TERMS: &str = "#CustomGenreTerms";

/// Build the `@context` array written at the top of every document
///
/// The inline block keeps `ldac:` resolvable and gives validators that
/// only know RO-Crate 1.1 direct definitions for the core terms.
pub fn context() -> Value {
    json!([
        ROCRATE_CONTEXT,
        {
            "ldac": LDAC_NS,
            "pcdm": PCDM_NS,
            "dct": DCT_NS,
            "Dataset": "http://schema.org/Dataset",
            "name": "http://schema.org/name",
            "description": "http://schema.org/description",
            "datePublished": "http://schema.org/datePublished",
            "license": "http://schema.org/license"
        }
    ])
}

/// The `ro-crate-metadata.json` descriptor entity
pub fn metadata_descriptor() -> Value {
    json!({
        "@id": METADATA_DESCRIPTOR_ID,
        "@type": "CreativeWork",
        "conformsTo": {"@id": ROCRATE_PROFILE},
        "about": {"@id": ROOT_ENTITY_ID}
    })
}

/// Organization node for [`LAMETA_PUBLISHER_ID`]
pub fn lameta_publisher() -> Value {
    json!({
        "@id": LAMETA_PUBLISHER_ID,
        "@type": "Organization",
        "name": "LaMeta Project",
        "url": LAMETA_PUBLISHER_ID,
        "description": "A metadata tool for language documentation projects"
    })
}

/// LDAC material type term set and terms
pub fn material_type_definitions() -> Vec<Value> {
    vec![
        json!({
            "@id": LDAC_MATERIAL_TYPES,
            "@type": "DefinedTermSet",
            "name": "Material Types"
        }),
        json!({
            "@id": LDAC_PRIMARY_MATERIAL,
            "@type": "DefinedTerm",
            "name": "Primary Material",
            "description": "The object of study, such as a literary work, film, or recording of natural discourse.",
            "inDefinedTermSet": {"@id": LDAC_MATERIAL_TYPES}
        }),
        json!({
            "@id": LDAC_ANNOTATION,
            "@type": "DefinedTerm",
            "name": "Annotation",
            "description": "The resource includes material that adds information to some other linguistic record.",
            "inDefinedTermSet": {"@id": LDAC_MATERIAL_TYPES}
        }),
        json!({
            "@id": LDAC_DERIVED_MATERIAL,
            "@type": "DefinedTerm",
            "name": "Derived Material",
            "description": "This is derived from another source, such as a Primary Material, via some process, e.g. a downsampled video or an abstract of a resource that is not an annotation.",
            "inDefinedTermSet": {"@id": LDAC_MATERIAL_TYPES}
        }),
    ]
}
