//! Data structures representing 3MF model documents

mod core;
mod material;

pub use self::core::{
    Build, BuildItem, CORE_NAMESPACE, Mesh, MetadataEntry, Model, Object, Resources,
    SLIC3RPE_NAMESPACE, Triangle, Vertex,
};
pub use self::material::{BaseMaterial, BaseMaterialGroup};
