//! Uniform-grid vertex clustering decimation
//!
//! Vertices falling into the same cubic grid cell are merged into their
//! average position. Triangles whose corners collapse into fewer than three
//! clusters are dropped. The grid resolution is chosen by binary search so
//! the surviving triangle count never exceeds the requested target.

use std::collections::HashMap;

use tracing::debug;

use super::{Decimator, Simplified};
use crate::error::{Error, Result};
use crate::mesh::MeshBuffer;

/// Highest grid resolution tried (cells per axis)
pub const MAX_RESOLUTION: u32 = 1 << 16;

/// Built-in [`Decimator`] based on vertex clustering
///
/// The error metric reported is the diagonal of one grid cell relative to
/// the diagonal of the mesh bounding box. `target_error` is accepted for
/// interface compatibility but only the triangle target steers the search.
///
/// # Example
/// ```
/// use paint3mf::{ClusterDecimator, Decimator, MeshBuffer};
///
/// // 20 x 20 quad grid, 800 triangles
/// let mut positions = Vec::new();
/// for y in 0..=20 {
///     for x in 0..=20 {
///         positions.push([x as f32, y as f32, 0.0]);
///     }
/// }
/// let mut triangles = Vec::new();
/// for y in 0..20u32 {
///     for x in 0..20u32 {
///         let i = y * 21 + x;
///         triangles.push([i, i + 1, i + 22]);
///         triangles.push([i, i + 22, i + 21]);
///     }
/// }
/// let mesh = MeshBuffer::indexed(positions, &triangles);
/// let result = ClusterDecimator::new().simplify(&mesh, 200, 0.01).unwrap();
/// assert!(result.mesh.triangle_count() <= 200);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClusterDecimator {
    max_resolution: u32,
}

impl ClusterDecimator {
    /// Decimator searching resolutions up to [`MAX_RESOLUTION`]
    pub fn new() -> Self {
        Self {
            max_resolution: MAX_RESOLUTION,
        }
    }

    /// Limit the search to at most `resolution` cells per axis
    pub fn with_max_resolution(mut self, resolution: u32) -> Self {
        self.max_resolution = resolution.max(2);
        self
    }

    fn max_resolution(&self) -> u32 {
        if self.max_resolution < 2 {
            MAX_RESOLUTION
        } else {
            self.max_resolution
        }
    }
}

impl Decimator for ClusterDecimator {
    fn simplify(
        &mut self,
        mesh: &MeshBuffer,
        target_triangles: usize,
        _target_error: f32,
    ) -> Result<Simplified> {
        if target_triangles == 0 {
            return Err(Error::decimation("target triangle count must be at least 1"));
        }
        let original = mesh.triangle_count();
        if original <= target_triangles {
            return Ok(Simplified {
                mesh: mesh.clone(),
                error: 0.0,
            });
        }

        let bounds = Bounds::of(&mesh.positions);
        if bounds.extent() <= f32::EPSILON {
            return Err(Error::decimation(
                "mesh has zero spatial extent and cannot be clustered",
            ));
        }

        // lo always satisfies the target, hi never does. Counts are not
        // strictly monotonic in resolution, so keep the densest fitting pass.
        let mut lo = 1u32;
        let mut hi = self.max_resolution();
        let mut best: Option<(u32, MeshBuffer)> = None;

        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            let candidate = cluster(mesh, &bounds, mid);
            let count = candidate.triangle_count();
            debug!(resolution = mid, triangles = count, "Cluster pass");
            if count <= target_triangles {
                lo = mid;
                let denser = best
                    .as_ref()
                    .is_none_or(|(_, kept)| count > kept.triangle_count());
                if denser {
                    best = Some((mid, candidate));
                }
            } else {
                hi = mid;
            }
        }

        let (resolution, simplified) = match best {
            Some((resolution, mesh)) if mesh.triangle_count() > 0 => (resolution, mesh),
            _ => {
                return Err(Error::decimation(format!(
                    "could not reach {} triangles without collapsing the mesh",
                    target_triangles
                )));
            }
        };

        let cell = bounds.extent() / resolution as f32;
        let error = (cell * 3f32.sqrt()) / bounds.diagonal();

        debug!(
            resolution,
            original,
            simplified = simplified.triangle_count(),
            error,
            "Cluster decimation complete"
        );

        Ok(Simplified {
            mesh: simplified,
            error,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Bounds {
    min: [f32; 3],
    max: [f32; 3],
}

impl Bounds {
    fn of(positions: &[[f32; 3]]) -> Self {
        let mut min = [f32::INFINITY; 3];
        let mut max = [f32::NEG_INFINITY; 3];
        for p in positions {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        Self { min, max }
    }

    /// Largest side of the box
    fn extent(&self) -> f32 {
        (0..3)
            .map(|axis| self.max[axis] - self.min[axis])
            .fold(0.0, f32::max)
    }

    fn diagonal(&self) -> f32 {
        (0..3)
            .map(|axis| (self.max[axis] - self.min[axis]).powi(2))
            .sum::<f32>()
            .sqrt()
    }
}

/// Collapse vertices to a `resolution`^3 grid and rebuild the triangle list
fn cluster(mesh: &MeshBuffer, bounds: &Bounds, resolution: u32) -> MeshBuffer {
    let cell = bounds.extent() / resolution as f32;
    let last = resolution - 1;

    let mut cells: HashMap<[u32; 3], u32> = HashMap::new();
    let mut representatives: Vec<usize> = Vec::new();
    let mut sums: Vec<[f64; 4]> = Vec::new();
    let mut remap = Vec::with_capacity(mesh.positions.len());

    for (i, p) in mesh.positions.iter().enumerate() {
        let mut key = [0u32; 3];
        for axis in 0..3 {
            let offset = ((p[axis] - bounds.min[axis]) / cell).floor();
            key[axis] = if offset.is_finite() && offset > 0.0 {
                (offset as u32).min(last)
            } else {
                0
            };
        }
        let id = *cells.entry(key).or_insert_with(|| {
            representatives.push(i);
            sums.push([0.0; 4]);
            (representatives.len() - 1) as u32
        });
        let sum = &mut sums[id as usize];
        sum[0] += p[0] as f64;
        sum[1] += p[1] as f64;
        sum[2] += p[2] as f64;
        sum[3] += 1.0;
        remap.push(id);
    }

    let positions = sums
        .iter()
        .map(|s| {
            [
                (s[0] / s[3]) as f32,
                (s[1] / s[3]) as f32,
                (s[2] / s[3]) as f32,
            ]
        })
        .collect();

    let mut indices = Vec::with_capacity(mesh.triangle_count() * 3);
    for [a, b, c] in mesh.triangles() {
        let (ra, rb, rc) = (remap[a], remap[b], remap[c]);
        if ra != rb && rb != rc && ra != rc {
            indices.extend([ra, rb, rc]);
        }
    }

    let pick = |src: &Vec<[f32; 3]>| -> Vec<[f32; 3]> {
        representatives.iter().map(|&i| src[i]).collect()
    };
    MeshBuffer {
        positions,
        normals: mesh.normals.as_ref().map(pick),
        uvs: mesh
            .uvs
            .as_ref()
            .map(|src| representatives.iter().map(|&i| src[i]).collect()),
        colors: mesh.colors.as_ref().map(pick),
        indices: Some(indices),
    }
}
