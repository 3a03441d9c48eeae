//! OPC (Open Packaging Conventions) handling for 3MF files
//!
//! 3MF files are ZIP archives following the OPC standard, containing
//! a content type manifest, relationship parts, the main 3D model file and
//! any number of auxiliary parts.

mod content_types;
mod reader;
mod relationships;
mod validation;
mod writer;

pub use content_types::{
    CONTENT_TYPES_NAMESPACE, ContentTypes, MODEL_CONTENT_TYPE, RELS_CONTENT_TYPE,
};
pub use reader::read_archive;
pub use relationships::{
    MODEL_REL_TYPE, RELATIONSHIPS_NAMESPACE, Relationship, parse_relationships,
    write_relationships,
};
pub use writer::create_package;

pub(crate) use validation::{normalize_path, part_name_problems};

/// Main 3D model file path within the 3MF archive
pub const MODEL_PATH: &str = "3D/3dmodel.model";

/// Content types file path
pub const CONTENT_TYPES_PATH: &str = "[Content_Types].xml";

/// Relationships file path
pub const RELS_PATH: &str = "_rels/.rels";

/// Root relationships pointing at the model part
pub fn root_relationships() -> Vec<Relationship> {
    vec![Relationship::new(
        "rel0",
        &format!("/{}", MODEL_PATH),
        MODEL_REL_TYPE,
    )]
}
