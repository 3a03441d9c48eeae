//! Core 3MF document types

use super::material::BaseMaterialGroup;

/// 3MF core namespace
pub const CORE_NAMESPACE: &str = "http://schemas.microsoft.com/3dmanufacturing/core/2015/02";

/// Namespace of the PrusaSlicer / Slic3r PE extensions
pub const SLIC3RPE_NAMESPACE: &str = "http://schemas.slic3r.org/3mf/2017/06";

/// A vertex in a mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
    /// Z coordinate
    pub z: f32,
}

impl Vertex {
    /// Create a new vertex
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<[f32; 3]> for Vertex {
    fn from(p: [f32; 3]) -> Self {
        Self::new(p[0], p[1], p[2])
    }
}

/// A triangle in a mesh
///
/// Besides the core vertex references a triangle may carry a property
/// reference (`pid`/`p1`) or one of the slicer paint attributes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Triangle {
    /// Index of first vertex
    pub v1: usize,
    /// Index of second vertex
    pub v2: usize,
    /// Index of third vertex
    pub v3: usize,
    /// Property group ID
    pub pid: Option<usize>,
    /// Property index within the group, used for the whole triangle
    pub p1: Option<usize>,
    /// `slic3rpe:mmu_segmentation` painted-triangle code
    pub mmu_segmentation: Option<String>,
    /// `paint_color` extruder index
    pub paint_color: Option<String>,
}

impl Triangle {
    /// Create a new triangle
    pub fn new(v1: usize, v2: usize, v3: usize) -> Self {
        Self {
            v1,
            v2,
            v3,
            ..Default::default()
        }
    }

    /// Whether two corners reference the same vertex
    pub fn is_degenerate(&self) -> bool {
        self.v1 == self.v2 || self.v2 == self.v3 || self.v1 == self.v3
    }
}

/// Triangle mesh
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    /// List of vertices
    pub vertices: Vec<Vertex>,
    /// List of triangles
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh with pre-allocated capacity
    pub fn with_capacity(vertices: usize, triangles: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            triangles: Vec::with_capacity(triangles),
        }
    }
}

/// A 3D object resource
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    /// Unique identifier within the model
    pub id: usize,
    /// Optional name
    pub name: Option<String>,
    /// Default property group for triangles without their own
    pub pid: Option<usize>,
    /// Default property index within `pid`
    pub pindex: Option<usize>,
    /// Mesh data
    pub mesh: Option<Mesh>,
}

impl Object {
    /// Create a new object
    pub fn new(id: usize) -> Self {
        Self {
            id,
            name: None,
            pid: None,
            pindex: None,
            mesh: None,
        }
    }
}

/// Item to be built
#[derive(Debug, Clone, PartialEq)]
pub struct BuildItem {
    /// Object ID to build
    pub objectid: usize,
}

impl BuildItem {
    /// Create a new build item
    pub fn new(objectid: usize) -> Self {
        Self { objectid }
    }
}

/// Build section
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Build {
    /// Items to build
    pub items: Vec<BuildItem>,
}

/// Metadata entry
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataEntry {
    /// Metadata name, possibly prefixed
    pub name: String,
    /// Metadata value
    pub value: String,
}

impl MetadataEntry {
    /// Create a new metadata entry
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Resources section
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Resources {
    /// Base material groups, written before objects
    pub base_material_groups: Vec<BaseMaterialGroup>,
    /// Objects
    pub objects: Vec<Object>,
}

/// A 3MF model document
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    /// Unit of measurement
    pub unit: String,
    /// Default namespace
    pub xmlns: String,
    /// Extra `xmlns:prefix` declarations
    pub namespaces: Vec<(String, String)>,
    /// Metadata entries
    pub metadata: Vec<MetadataEntry>,
    /// Resources
    pub resources: Resources,
    /// Build section
    pub build: Build,
    /// Decimals used when writing coordinates
    pub coordinate_precision: usize,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    /// Create an empty millimeter model
    pub fn new() -> Self {
        Self {
            unit: "millimeter".to_string(),
            xmlns: CORE_NAMESPACE.to_string(),
            namespaces: Vec::new(),
            metadata: Vec::new(),
            resources: Resources::default(),
            build: Build::default(),
            coordinate_precision: 6,
        }
    }

    /// Declare an extra namespace prefix
    pub fn declare_namespace(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        let prefix = prefix.into();
        if !self.namespaces.iter().any(|(p, _)| *p == prefix) {
            self.namespaces.push((prefix, uri.into()));
        }
    }

    /// Look up an object by ID
    pub fn object(&self, id: usize) -> Option<&Object> {
        self.resources.objects.iter().find(|o| o.id == id)
    }

    /// Look up a base material group by ID
    pub fn base_material_group(&self, id: usize) -> Option<&BaseMaterialGroup> {
        self.resources
            .base_material_groups
            .iter()
            .find(|g| g.id == id)
    }

    /// Value of a metadata entry
    pub fn metadata_value(&self, name: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.value.as_str())
    }

    /// Triangles across all object meshes
    pub fn triangle_count(&self) -> usize {
        self.meshes().map(|m| m.triangles.len()).sum()
    }

    /// Vertices across all object meshes
    pub fn vertex_count(&self) -> usize {
        self.meshes().map(|m| m.vertices.len()).sum()
    }

    fn meshes(&self) -> impl Iterator<Item = &Mesh> {
        self.resources.objects.iter().filter_map(|o| o.mesh.as_ref())
    }
}
