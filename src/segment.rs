//! Partition of a mesh by palette index
//!
//! Every palette entry that owns at least one triangle becomes a
//! [`ColorGroup`] with its own vertex buffer. Vertices are deduplicated by
//! their coordinates formatted at a fixed number of decimals, the same text
//! the serializer later writes, so re-parsed documents dedup identically.

use std::collections::HashMap;

use tracing::{debug, info_span, warn};

use crate::color::Rgb;
use crate::error::{Error, Result};
use crate::mesh::MeshBuffer;
use crate::progress::{ProgressSink, Stage};

/// Deduplicated triangle buffer owned by one group
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupMesh {
    /// Unique vertices, first occurrence wins
    pub vertices: Vec<[f32; 3]>,
    /// Triangles indexing into `vertices`
    pub triangles: Vec<[u32; 3]>,
}

impl GroupMesh {
    /// Number of unique vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}

/// Triangles assigned to one palette entry
#[derive(Debug, Clone, PartialEq)]
pub struct ColorGroup {
    /// Index into the palette
    pub palette_index: usize,
    /// `palette[palette_index]`
    pub color: Rgb,
    /// Source triangle indices, ascending
    pub triangles: Vec<usize>,
    /// Deduplicated geometry of those triangles
    pub mesh: GroupMesh,
}

/// Single mesh whose triangles each carry a palette index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaggedMesh {
    /// Shared geometry
    pub mesh: GroupMesh,
    /// Palette index per triangle of `mesh`
    pub palette_indices: Vec<usize>,
}

impl TaggedMesh {
    /// Concatenate group buffers into one, deduplicating across groups
    ///
    /// Triangles appear group by group in ascending palette order.
    pub fn from_groups(groups: &[ColorGroup], precision: usize) -> Self {
        let mut dedup = Dedup::new(precision);
        let mut triangles = Vec::new();
        let mut palette_indices = Vec::new();

        for group in groups {
            for tri in &group.mesh.triangles {
                let corners = tri.map(|v| dedup.insert(group.mesh.vertices[v as usize]));
                triangles.push(corners);
                palette_indices.push(group.palette_index);
            }
        }

        Self {
            mesh: GroupMesh {
                vertices: dedup.vertices,
                triangles,
            },
            palette_indices,
        }
    }
}

/// Text form of one coordinate at `precision` decimals
///
/// Negative zero after rounding is written as zero.
pub fn format_coordinate(value: f32, precision: usize) -> String {
    let text = format!("{:.*}", precision, value);
    match text.strip_prefix('-') {
        Some(rest) if rest.bytes().all(|b| b == b'0' || b == b'.') => rest.to_string(),
        _ => text,
    }
}

/// Vertex dedup keyed on formatted coordinates
struct Dedup {
    precision: usize,
    lookup: HashMap<String, u32>,
    vertices: Vec<[f32; 3]>,
}

impl Dedup {
    fn new(precision: usize) -> Self {
        Self {
            precision,
            lookup: HashMap::new(),
            vertices: Vec::new(),
        }
    }

    fn insert(&mut self, position: [f32; 3]) -> u32 {
        let key = format!(
            "{},{},{}",
            format_coordinate(position[0], self.precision),
            format_coordinate(position[1], self.precision),
            format_coordinate(position[2], self.precision)
        );
        let next = self.vertices.len() as u32;
        let index = *self.lookup.entry(key).or_insert(next);
        if index == next {
            self.vertices.push(position);
        }
        index
    }
}

/// Group triangles by palette index
///
/// Groups come back in ascending palette order. Palette entries that own no
/// triangles are skipped with a warning.
///
/// # Errors
///
/// [`Error::InvalidInput`] when `face_index` does not have one entry per
/// triangle or holds an index outside the palette.
pub fn segment(
    mesh: &MeshBuffer,
    face_index: &[usize],
    palette: &[Rgb],
    precision: usize,
) -> Result<Vec<ColorGroup>> {
    segment_with_progress(mesh, face_index, palette, precision, &mut ProgressSink::none())
}

/// [`segment`] with batch progress reports
pub fn segment_with_progress(
    mesh: &MeshBuffer,
    face_index: &[usize],
    palette: &[Rgb],
    precision: usize,
    progress: &mut ProgressSink<'_>,
) -> Result<Vec<ColorGroup>> {
    let _span = info_span!("segment", triangles = face_index.len(), colors = palette.len())
        .entered();

    let triangle_count = mesh.triangle_count();
    if face_index.len() != triangle_count {
        return Err(Error::invalid_input(format!(
            "face index has {} entries for {} triangles",
            face_index.len(),
            triangle_count
        )));
    }

    let mut members: Vec<Vec<usize>> = vec![Vec::new(); palette.len()];
    for (triangle, &index) in face_index.iter().enumerate() {
        let slot = members.get_mut(index).ok_or_else(|| {
            Error::invalid_input(format!(
                "triangle {} has palette index {} but the palette has {} entries",
                triangle,
                index,
                palette.len()
            ))
        })?;
        slot.push(triangle);
    }

    let mut groups = Vec::new();
    let mut done = 0;
    for (palette_index, triangles) in members.into_iter().enumerate() {
        if triangles.is_empty() {
            warn!(palette_index, "Palette entry has no triangles, skipping group");
            continue;
        }

        let mut dedup = Dedup::new(precision);
        let mut group_triangles = Vec::with_capacity(triangles.len());
        for &triangle in &triangles {
            let corners = mesh.triangle(triangle).map(|v| dedup.insert(mesh.positions[v]));
            group_triangles.push(corners);
            done += 1;
            progress.batch(Stage::Segmenting, done, triangle_count);
        }

        debug!(
            palette_index,
            triangles = triangles.len(),
            vertices = dedup.vertices.len(),
            "Built color group"
        );
        groups.push(ColorGroup {
            palette_index,
            color: palette[palette_index],
            triangles,
            mesh: GroupMesh {
                vertices: dedup.vertices,
                triangles: group_triangles,
            },
        });
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = Rgb::new(255, 0, 0);
    const BLUE: Rgb = Rgb::new(0, 0, 255);

    fn quad() -> MeshBuffer {
        MeshBuffer::indexed(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            &[[0, 1, 2], [0, 2, 3]],
        )
    }

    #[test]
    fn test_groups_in_palette_order() {
        let groups = segment(&quad(), &[1, 0], &[RED, BLUE], 6).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].palette_index, 0);
        assert_eq!(groups[0].triangles, vec![1]);
        assert_eq!(groups[0].color, RED);
        assert_eq!(groups[1].palette_index, 1);
        assert_eq!(groups[1].triangles, vec![0]);
        assert_eq!(groups[1].color, BLUE);
    }

    #[test]
    fn test_groups_own_their_vertices() {
        let groups = segment(&quad(), &[0, 1], &[RED, BLUE], 6).unwrap();
        for group in &groups {
            assert_eq!(group.mesh.vertex_count(), 3);
            assert_eq!(group.mesh.triangles, vec![[0, 1, 2]]);
        }
    }

    #[test]
    fn test_dedup_non_indexed_input() {
        let mesh = quad().to_non_indexed();
        let groups = segment(&mesh, &[0, 0], &[RED], 4).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].mesh.vertex_count(), 4);
        assert_eq!(groups[0].mesh.triangles, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn test_dedup_respects_precision() {
        let mesh = MeshBuffer::non_indexed(vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.00001, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 0.0, 0.0],
        ]);
        let coarse = segment(&mesh, &[0, 0], &[RED], 4).unwrap();
        assert_eq!(coarse[0].mesh.vertex_count(), 3);
        let fine = segment(&mesh, &[0, 0], &[RED], 6).unwrap();
        assert_eq!(fine[0].mesh.vertex_count(), 4);
    }

    #[test]
    fn test_empty_palette_entry_skipped() {
        let groups = segment(&quad(), &[2, 2], &[RED, BLUE, RED], 6).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].palette_index, 2);
    }

    #[test]
    fn test_invalid_indices() {
        assert!(segment(&quad(), &[0], &[RED], 6).unwrap_err().is_fatal_input());
        assert!(segment(&quad(), &[0, 5], &[RED], 6).unwrap_err().is_fatal_input());
    }

    #[test]
    fn test_tagged_mesh_shares_boundary_vertices() {
        let groups = segment(&quad(), &[0, 1], &[RED, BLUE], 6).unwrap();
        let tagged = TaggedMesh::from_groups(&groups, 6);
        assert_eq!(tagged.mesh.vertex_count(), 4);
        assert_eq!(tagged.mesh.triangle_count(), 2);
        assert_eq!(tagged.palette_indices, vec![0, 1]);
    }

    #[test]
    fn test_format_coordinate() {
        assert_eq!(format_coordinate(1.5, 4), "1.5000");
        assert_eq!(format_coordinate(-0.0, 6), "0.000000");
        assert_eq!(format_coordinate(-0.00001, 4), "0.0000");
        assert_eq!(format_coordinate(-2.25, 2), "-2.25");
    }
}
