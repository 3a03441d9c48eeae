//! Raw triangle mesh buffers
//!
//! A [`MeshBuffer`] holds GPU-style attribute arrays: positions plus optional
//! normals, UVs and vertex colors, with either an explicit index list or an
//! implicit one where every three consecutive vertices form a triangle.

use crate::error::{Error, Result};

/// Triangulated surface as parallel attribute arrays
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffer {
    /// Vertex positions
    pub positions: Vec<[f32; 3]>,
    /// Optional vertex normals, parallel to `positions`
    pub normals: Option<Vec<[f32; 3]>>,
    /// Optional texture coordinates, parallel to `positions`
    pub uvs: Option<Vec<[f32; 2]>>,
    /// Optional linear vertex colors in [0, 1], parallel to `positions`
    pub colors: Option<Vec<[f32; 3]>>,
    /// Optional triangle index list; `None` means non-indexed
    pub indices: Option<Vec<u32>>,
}

impl MeshBuffer {
    /// Create an empty mesh buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an indexed mesh from positions and triangles
    pub fn indexed(positions: Vec<[f32; 3]>, triangles: &[[u32; 3]]) -> Self {
        Self {
            positions,
            indices: Some(triangles.iter().flatten().copied().collect()),
            ..Self::default()
        }
    }

    /// Create a non-indexed mesh; every three positions form a triangle
    pub fn non_indexed(positions: Vec<[f32; 3]>) -> Self {
        Self {
            positions,
            ..Self::default()
        }
    }

    /// Number of vertices
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles
    #[inline]
    pub fn triangle_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len() / 3,
            None => self.positions.len() / 3,
        }
    }

    /// Whether the mesh carries an explicit index list
    #[inline]
    pub fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }

    /// Vertex indices of triangle `index`
    ///
    /// Callers must keep `index < triangle_count()`.
    #[inline]
    pub fn triangle(&self, index: usize) -> [usize; 3] {
        let base = index * 3;
        match &self.indices {
            Some(indices) => [
                indices[base] as usize,
                indices[base + 1] as usize,
                indices[base + 2] as usize,
            ],
            None => [base, base + 1, base + 2],
        }
    }

    /// Iterator over the vertex indices of every triangle
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        (0..self.triangle_count()).map(move |t| self.triangle(t))
    }

    /// Check the structural invariants of the buffer
    ///
    /// - positions must be present and non-empty
    /// - optional attributes must be parallel to positions
    /// - index list length must be a multiple of 3 and every index in range
    /// - non-indexed vertex count must be a multiple of 3
    /// - at least one triangle
    pub fn validate(&self) -> Result<()> {
        if self.positions.is_empty() {
            return Err(Error::invalid_input("mesh has no position buffer"));
        }

        let vertex_count = self.positions.len();
        if let Some(normals) = &self.normals {
            if normals.len() != vertex_count {
                return Err(Error::invalid_input(format!(
                    "normal buffer has {} entries, expected {}",
                    normals.len(),
                    vertex_count
                )));
            }
        }
        if let Some(uvs) = &self.uvs {
            if uvs.len() != vertex_count {
                return Err(Error::invalid_input(format!(
                    "uv buffer has {} entries, expected {}",
                    uvs.len(),
                    vertex_count
                )));
            }
        }
        if let Some(colors) = &self.colors {
            if colors.len() != vertex_count {
                return Err(Error::invalid_input(format!(
                    "vertex color buffer has {} entries, expected {}",
                    colors.len(),
                    vertex_count
                )));
            }
        }

        match &self.indices {
            Some(indices) => {
                if indices.len() % 3 != 0 {
                    return Err(Error::invalid_input(format!(
                        "index buffer length {} is not a multiple of 3",
                        indices.len()
                    )));
                }
                if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                    return Err(Error::invalid_input(format!(
                        "index {} out of range for {} vertices",
                        bad, vertex_count
                    )));
                }
            }
            None => {
                if vertex_count % 3 != 0 {
                    return Err(Error::invalid_input(format!(
                        "non-indexed mesh has {} vertices, not a multiple of 3",
                        vertex_count
                    )));
                }
            }
        }

        if self.triangle_count() == 0 {
            return Err(Error::invalid_input("mesh has zero triangles"));
        }

        Ok(())
    }

    /// Expand to flat triangle-list form: vertex `3t + k` is corner `k` of
    /// triangle `t`
    pub fn to_non_indexed(&self) -> MeshBuffer {
        if self.indices.is_none() {
            return self.clone();
        }

        let corners: Vec<usize> = self.triangles().flatten().collect();
        let gather3 = |src: &Vec<[f32; 3]>| corners.iter().map(|&i| src[i]).collect::<Vec<_>>();

        MeshBuffer {
            positions: gather3(&self.positions),
            normals: self.normals.as_ref().map(&gather3),
            uvs: self
                .uvs
                .as_ref()
                .map(|uvs| corners.iter().map(|&i| uvs[i]).collect()),
            colors: self.colors.as_ref().map(&gather3),
            indices: None,
        }
    }

    /// Convert to indexed form with identity indices if non-indexed
    pub fn into_indexed(mut self) -> MeshBuffer {
        if self.indices.is_none() {
            self.indices = Some((0..self.positions.len() as u32).collect());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_triangle_count_indexed_and_implicit() {
        assert_eq!(quad().triangle_count(), 2);
        let flat = MeshBuffer::non_indexed(vec![[0.0; 3]; 9]);
        assert_eq!(flat.triangle_count(), 3);
        assert_eq!(flat.triangle(2), [6, 7, 8]);
    }

    #[test]
    fn test_validate_rejects_missing_positions() {
        let err = MeshBuffer::new().validate().unwrap_err();
        assert!(err.is_fatal_input());
        assert!(err.to_string().contains("no position buffer"));
    }

    #[test]
    fn test_validate_rejects_out_of_range_index() {
        let mesh = MeshBuffer::indexed(vec![[0.0; 3]; 3], &[[0, 1, 3]]);
        let err = mesh.validate().unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_validate_rejects_mismatched_attributes() {
        let mut mesh = quad();
        mesh.uvs = Some(vec![[0.0, 0.0]; 3]);
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_triangles() {
        let mesh = MeshBuffer {
            positions: vec![[0.0; 3]; 3],
            indices: Some(Vec::new()),
            ..MeshBuffer::default()
        };
        let err = mesh.validate().unwrap_err();
        assert!(err.to_string().contains("zero triangles"));
    }

    #[test]
    fn test_to_non_indexed_duplicates_shared_vertices() {
        let mut mesh = quad();
        mesh.uvs = Some(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        let flat = mesh.to_non_indexed();
        assert!(!flat.is_indexed());
        assert_eq!(flat.vertex_count(), 6);
        assert_eq!(flat.triangle_count(), 2);
        assert_eq!(flat.positions[3], [0.0, 0.0, 0.0]);
        assert_eq!(flat.uvs.as_ref().unwrap()[5], [0.0, 1.0]);
    }
}
