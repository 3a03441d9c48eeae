//! Imported source meshes and their materials
//!
//! A [`SourceDescriptor`] is what the (external) GLB/OBJ importer hands over:
//! one mesh buffer, its materials, the triangle ranges each material covers,
//! and a world transform. [`merge_sources`] bakes the transforms and
//! concatenates every source into a single indexed [`MeshBuffer`].

use std::sync::Arc;

use nalgebra::{Matrix3, Matrix4, Vector3, Vector4};
use tracing::debug;

use crate::error::{Error, Result};
use crate::mesh::MeshBuffer;

/// Identity of a texture, used as the decode cache key
pub type TextureId = u64;

/// Pixel payload of a texture
#[derive(Debug, Clone, PartialEq)]
pub enum TextureData {
    /// Encoded image file contents (PNG or JPEG)
    Encoded(Vec<u8>),
    /// Already decoded RGBA8 raster, row-major, top row first
    Rgba8 {
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
        /// `width * height * 4` bytes
        pixels: Vec<u8>,
    },
}

/// A texture referenced by one or more materials
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    /// Identity shared by every material that uses this image
    pub id: TextureId,
    /// Pixel payload
    pub data: TextureData,
}

impl Texture {
    /// Texture from encoded PNG/JPEG bytes
    pub fn encoded(id: TextureId, bytes: Vec<u8>) -> Self {
        Self {
            id,
            data: TextureData::Encoded(bytes),
        }
    }

    /// Texture from a decoded RGBA8 raster
    pub fn rgba8(id: TextureId, width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            id,
            data: TextureData::Rgba8 {
                width,
                height,
                pixels,
            },
        }
    }
}

/// Surface material of a source mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Material {
    /// Material name from the source file
    pub name: Option<String>,
    /// Base color factor, linear RGBA in [0, 1]
    pub base_color: Option<[f32; 4]>,
    /// Base color texture
    pub texture: Option<Arc<Texture>>,
}

impl Material {
    /// Flat-colored material
    pub fn with_base_color(r: f32, g: f32, b: f32) -> Self {
        Self {
            base_color: Some([r, g, b, 1.0]),
            ..Self::default()
        }
    }

    /// Textured material with a white base color factor
    pub fn with_texture(texture: Arc<Texture>) -> Self {
        Self {
            texture: Some(texture),
            ..Self::default()
        }
    }

    /// Set the material name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A contiguous triangle range drawn with one material
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialGroup {
    /// First triangle of the range
    pub start: usize,
    /// Number of triangles in the range
    pub count: usize,
    /// Index into the source's material list
    pub material: usize,
}

impl MaterialGroup {
    /// Create a material group
    pub fn new(start: usize, count: usize, material: usize) -> Self {
        Self {
            start,
            count,
            material,
        }
    }

    #[inline]
    fn contains(&self, triangle: usize) -> bool {
        triangle >= self.start && triangle < self.start + self.count
    }
}

/// Column-major identity matrix
pub const IDENTITY_TRANSFORM: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// One imported mesh with its materials and placement
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDescriptor {
    /// Geometry and per-vertex attributes
    pub mesh: MeshBuffer,
    /// Materials referenced by `groups`
    pub materials: Vec<Material>,
    /// Material ranges; an empty list means material 0 covers every triangle
    pub groups: Vec<MaterialGroup>,
    /// World transform, 4x4 column-major
    pub transform: [f32; 16],
}

impl SourceDescriptor {
    /// Source with no materials and an identity transform
    pub fn new(mesh: MeshBuffer) -> Self {
        Self {
            mesh,
            materials: Vec::new(),
            groups: Vec::new(),
            transform: IDENTITY_TRANSFORM,
        }
    }

    /// Add a material covering every triangle not claimed by a group
    pub fn with_material(mut self, material: Material) -> Self {
        self.materials.push(material);
        self
    }

    /// Add a material range
    pub fn with_group(mut self, group: MaterialGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// Set the world transform (column-major)
    pub fn with_transform(mut self, transform: [f32; 16]) -> Self {
        self.transform = transform;
        self
    }

    /// Material index assigned to a triangle, before range checking
    ///
    /// Returns `None` when the source has no materials at all.
    pub fn material_index(&self, triangle: usize) -> Option<usize> {
        if let Some(group) = self.groups.iter().find(|g| g.contains(triangle)) {
            return Some(group.material);
        }
        if self.materials.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    fn matrix(&self) -> Matrix4<f32> {
        Matrix4::from_column_slice(&self.transform)
    }

    /// Whether the transform mirrors geometry (negative determinant)
    pub fn flips_winding(&self) -> bool {
        self.matrix().fixed_view::<3, 3>(0, 0).into_owned().determinant() < 0.0
    }
}

/// Total triangle count across sources
pub fn total_triangles(sources: &[SourceDescriptor]) -> usize {
    sources.iter().map(|s| s.mesh.triangle_count()).sum()
}

/// Merge sources into one indexed mesh in world space
///
/// Triangles keep source order, then per-source order, which is the order
/// the color sampler emits face colors in. Normals, UVs and vertex colors
/// survive only when every source provides them.
pub fn merge_sources(sources: &[SourceDescriptor]) -> Result<MeshBuffer> {
    if sources.is_empty() {
        return Err(Error::invalid_input("no source meshes supplied"));
    }
    for (i, source) in sources.iter().enumerate() {
        source
            .mesh
            .validate()
            .map_err(|e| Error::invalid_input(format!("source {}: {}", i, strip_code(&e))))?;
    }

    let keep_normals = sources.iter().all(|s| s.mesh.normals.is_some());
    let keep_uvs = sources.iter().all(|s| s.mesh.uvs.is_some());
    let keep_colors = sources.iter().all(|s| s.mesh.colors.is_some());

    let vertex_total: usize = sources.iter().map(|s| s.mesh.vertex_count()).sum();
    let mut merged = MeshBuffer {
        positions: Vec::with_capacity(vertex_total),
        normals: keep_normals.then(|| Vec::with_capacity(vertex_total)),
        uvs: keep_uvs.then(|| Vec::with_capacity(vertex_total)),
        colors: keep_colors.then(|| Vec::with_capacity(vertex_total)),
        indices: Some(Vec::with_capacity(total_triangles(sources) * 3)),
    };

    for source in sources {
        let matrix = source.matrix();
        let normal_matrix = normal_matrix(&matrix);
        let flip = source.flips_winding();
        let base = merged.positions.len() as u32;
        let mesh = &source.mesh;

        merged.positions.extend(mesh.positions.iter().map(|p| {
            let v = matrix * Vector4::new(p[0], p[1], p[2], 1.0);
            [v.x, v.y, v.z]
        }));

        if let (Some(out), Some(normals)) = (merged.normals.as_mut(), mesh.normals.as_ref()) {
            out.extend(normals.iter().map(|n| {
                let v = normal_matrix * Vector3::new(n[0], n[1], n[2]);
                let v = v.try_normalize(f32::EPSILON).unwrap_or(v);
                [v.x, v.y, v.z]
            }));
        }
        if let (Some(out), Some(uvs)) = (merged.uvs.as_mut(), mesh.uvs.as_ref()) {
            out.extend_from_slice(uvs);
        }
        if let (Some(out), Some(colors)) = (merged.colors.as_mut(), mesh.colors.as_ref()) {
            out.extend_from_slice(colors);
        }

        if let Some(indices) = merged.indices.as_mut() {
            for [a, b, c] in mesh.triangles() {
                let (a, b, c) = (a as u32 + base, b as u32 + base, c as u32 + base);
                if flip {
                    indices.extend_from_slice(&[a, c, b]);
                } else {
                    indices.extend_from_slice(&[a, b, c]);
                }
            }
        }

        if flip {
            debug!("Source transform mirrors geometry, winding flipped");
        }
    }

    debug!(
        sources = sources.len(),
        vertices = merged.vertex_count(),
        triangles = merged.triangle_count(),
        "Merged sources"
    );

    Ok(merged)
}

/// Inverse-transpose of the upper 3x3, identity when singular
fn normal_matrix(matrix: &Matrix4<f32>) -> Matrix3<f32> {
    let linear: Matrix3<f32> = matrix.fixed_view::<3, 3>(0, 0).into_owned();
    linear
        .try_inverse()
        .map(|inv| inv.transpose())
        .unwrap_or_else(Matrix3::identity)
}

fn strip_code(err: &Error) -> String {
    match err {
        Error::InvalidInput(message) => message.clone(),
        other => other.to_string(),
    }
}
