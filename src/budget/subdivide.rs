//! Uniform midpoint subdivision with face color replication
//!
//! Each pass splits every triangle into four by inserting edge midpoints.
//! Work happens on the flat triangle-list form, so midpoints are computed per
//! triangle rather than shared across neighbors. Every face color is copied
//! to the four children, so the color table stays exact.

use crate::color::Rgb;
use crate::mesh::MeshBuffer;
use crate::progress::{ProgressSink, Stage};

/// Result of mesh subdivision
#[derive(Debug, Clone)]
pub struct SubdivideResult {
    /// The subdivided non-indexed mesh
    pub mesh: MeshBuffer,
    /// One color per triangle of `mesh`
    pub face_colors: Vec<Rgb>,
    /// Original triangle count
    pub original_triangles: usize,
    /// Number of passes performed
    pub levels: u32,
}

/// Subdivide `levels` times; triangle count grows by exactly `4^levels`
///
/// # Example
/// ```
/// use paint3mf::{MeshBuffer, Rgb, subdivide};
///
/// let mesh = MeshBuffer::non_indexed(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
/// let result = subdivide(&mesh, &[Rgb::new(255, 0, 0)], 2);
/// assert_eq!(result.mesh.triangle_count(), 16);
/// assert_eq!(result.face_colors.len(), 16);
/// ```
pub fn subdivide(mesh: &MeshBuffer, face_colors: &[Rgb], levels: u32) -> SubdivideResult {
    subdivide_with_progress(mesh, face_colors, levels, &mut ProgressSink::none())
}

/// [`subdivide`] with batch progress reports
pub fn subdivide_with_progress(
    mesh: &MeshBuffer,
    face_colors: &[Rgb],
    levels: u32,
    progress: &mut ProgressSink<'_>,
) -> SubdivideResult {
    let original_triangles = mesh.triangle_count();
    let mut current = mesh.to_non_indexed();
    let mut colors = face_colors.to_vec();

    for _ in 0..levels {
        let (next, next_colors) = subdivide_once(&current, &colors, progress);
        current = next;
        colors = next_colors;
    }

    SubdivideResult {
        mesh: current,
        face_colors: colors,
        original_triangles,
        levels,
    }
}

/// One pass over a non-indexed mesh
fn subdivide_once(
    mesh: &MeshBuffer,
    colors: &[Rgb],
    progress: &mut ProgressSink<'_>,
) -> (MeshBuffer, Vec<Rgb>) {
    let triangles = mesh.triangle_count();
    let mut out = MeshBuffer {
        positions: Vec::with_capacity(triangles * 12),
        normals: mesh.normals.as_ref().map(|_| Vec::with_capacity(triangles * 12)),
        uvs: mesh.uvs.as_ref().map(|_| Vec::with_capacity(triangles * 12)),
        colors: mesh.colors.as_ref().map(|_| Vec::with_capacity(triangles * 12)),
        indices: None,
    };
    let mut out_colors = Vec::with_capacity(triangles * 4);

    for t in 0..triangles {
        let [a, b, c] = [3 * t, 3 * t + 1, 3 * t + 2];

        // Corners 0..3, then midpoints ab, bc, ca as 3..6
        let children: [[usize; 3]; 4] = [[0, 3, 5], [3, 1, 4], [5, 4, 2], [3, 4, 5]];

        let positions = expand(&mesh.positions, [a, b, c], mid3);
        push_children(&mut out.positions, &positions, &children);

        if let (Some(src), Some(dst)) = (mesh.normals.as_ref(), out.normals.as_mut()) {
            let normals = expand(src, [a, b, c], mid_normal);
            push_children(dst, &normals, &children);
        }
        if let (Some(src), Some(dst)) = (mesh.uvs.as_ref(), out.uvs.as_mut()) {
            let uvs = expand(src, [a, b, c], mid2);
            push_children(dst, &uvs, &children);
        }
        if let (Some(src), Some(dst)) = (mesh.colors.as_ref(), out.colors.as_mut()) {
            let vertex_colors = expand(src, [a, b, c], mid3);
            push_children(dst, &vertex_colors, &children);
        }

        out_colors.extend_from_slice(&[colors[t]; 4]);
        progress.batch(Stage::Fitting, t + 1, triangles);
    }

    (out, out_colors)
}

/// Three corners followed by the ab, bc, ca midpoints
fn expand<T: Copy>(src: &[T], [a, b, c]: [usize; 3], mid: fn(T, T) -> T) -> [T; 6] {
    let (pa, pb, pc) = (src[a], src[b], src[c]);
    [pa, pb, pc, mid(pa, pb), mid(pb, pc), mid(pc, pa)]
}

fn push_children<T: Copy>(dst: &mut Vec<T>, points: &[T; 6], children: &[[usize; 3]; 4]) {
    for child in children {
        dst.extend(child.iter().map(|&i| points[i]));
    }
}

fn mid3(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [(a[0] + b[0]) * 0.5, (a[1] + b[1]) * 0.5, (a[2] + b[2]) * 0.5]
}

fn mid2(a: [f32; 2], b: [f32; 2]) -> [f32; 2] {
    [(a[0] + b[0]) * 0.5, (a[1] + b[1]) * 0.5]
}

/// Normalized average; opposing normals keep the first endpoint's direction
fn mid_normal(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    let sum = [a[0] + b[0], a[1] + b[1], a[2] + b[2]];
    let len = (sum[0] * sum[0] + sum[1] * sum[1] + sum[2] * sum[2]).sqrt();
    if len > 1e-6 {
        [sum[0] / len, sum[1] / len, sum[2] / len]
    } else {
        a
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_triangle() -> MeshBuffer {
        let mut mesh = MeshBuffer::indexed(
            vec![[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]],
            &[[0, 1, 2]],
        );
        mesh.normals = Some(vec![[0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]]);
        mesh.uvs = Some(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        mesh
    }

    #[test]
    fn test_single_level_midpoints() {
        let result = subdivide(&single_triangle(), &[Rgb::new(1, 2, 3)], 1);
        let mesh = &result.mesh;

        assert_eq!(mesh.triangle_count(), 4);
        assert!(!mesh.is_indexed());
        // First child: a, ab, ca
        assert_eq!(mesh.positions[0], [0.0, 0.0, 0.0]);
        assert_eq!(mesh.positions[1], [1.0, 0.0, 0.0]);
        assert_eq!(mesh.positions[2], [0.0, 1.0, 0.0]);
        // Center child: ab, bc, ca
        assert_eq!(mesh.positions[9], [1.0, 0.0, 0.0]);
        assert_eq!(mesh.positions[10], [1.0, 1.0, 0.0]);
        assert_eq!(mesh.uvs.as_ref().unwrap()[10], [0.5, 0.5]);
        assert_eq!(result.face_colors, vec![Rgb::new(1, 2, 3); 4]);
    }

    #[test]
    fn test_midpoint_normals_are_normalized() {
        let result = subdivide(&single_triangle(), &[Rgb::default()], 1);
        let ab = result.mesh.normals.as_ref().unwrap()[1];
        let expected = std::f32::consts::FRAC_1_SQRT_2;
        assert!((ab[0] - expected).abs() < 1e-6);
        assert!((ab[2] - expected).abs() < 1e-6);
    }

    #[test]
    fn test_opposing_normals_keep_first_endpoint() {
        assert_eq!(mid_normal([0.0, 0.0, 1.0], [0.0, 0.0, -1.0]), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_triangle_count_multiplies_by_four_per_level() {
        let colors = [Rgb::new(255, 0, 0)];
        for level in 0..=3 {
            let result = subdivide(&single_triangle(), &colors, level);
            assert_eq!(result.mesh.triangle_count(), 4usize.pow(level));
            assert_eq!(result.face_colors.len(), 4usize.pow(level));
        }
    }

    #[test]
    fn test_colors_follow_parent_order() {
        let mesh = MeshBuffer::non_indexed(vec![[0.0; 3]; 6]);
        let red = Rgb::new(255, 0, 0);
        let blue = Rgb::new(0, 0, 255);
        let result = subdivide(&mesh, &[red, blue], 1);
        assert_eq!(&result.face_colors[..4], &[red; 4]);
        assert_eq!(&result.face_colors[4..], &[blue; 4]);
    }
}
