//! Shared fixtures for integration tests

#![allow(dead_code)]

use paint3mf::{
    Decimator, Material, MaterialGroup, MeshBuffer, Result, Simplified, SourceDescriptor,
};

pub const RED: [f32; 3] = [1.0, 0.0, 0.0];
pub const BLUE: [f32; 3] = [0.0, 0.0, 1.0];

/// Two disjoint triangles, the first red and the second blue
pub fn red_blue_source() -> SourceDescriptor {
    let mesh = MeshBuffer::indexed(
        vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [2.0, 0.0, 0.0],
            [3.0, 0.0, 0.0],
            [2.0, 1.0, 0.0],
        ],
        &[[0, 1, 2], [3, 4, 5]],
    );
    SourceDescriptor::new(mesh)
        .with_material(Material::with_base_color(RED[0], RED[1], RED[2]))
        .with_material(Material::with_base_color(BLUE[0], BLUE[1], BLUE[2]))
        .with_group(MaterialGroup::new(1, 1, 1))
}

/// A single flat-colored triangle
pub fn single_triangle_source(color: [f32; 3]) -> SourceDescriptor {
    let mesh = MeshBuffer::indexed(
        vec![[0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [0.0, 10.0, 0.0]],
        &[[0, 1, 2]],
    );
    SourceDescriptor::new(mesh).with_material(Material::with_base_color(color[0], color[1], color[2]))
}

/// `n` x `n` grid of quads in the XY plane, two triangles per quad
pub fn grid(n: usize) -> MeshBuffer {
    let mut positions = Vec::with_capacity((n + 1) * (n + 1));
    for y in 0..=n {
        for x in 0..=n {
            positions.push([x as f32, y as f32, 0.0]);
        }
    }
    let stride = (n + 1) as u32;
    let mut triangles = Vec::with_capacity(n * n * 2);
    for y in 0..n as u32 {
        for x in 0..n as u32 {
            let a = y * stride + x;
            let b = a + 1;
            let c = a + stride;
            let d = c + 1;
            triangles.push([a, b, c]);
            triangles.push([b, d, c]);
        }
    }
    MeshBuffer::indexed(positions, &triangles)
}

/// Grid whose left half is red and right half is blue, via vertex colors
pub fn two_tone_grid(n: usize) -> SourceDescriptor {
    let mut mesh = grid(n);
    let half = n as f32 / 2.0;
    mesh.colors = Some(
        mesh.positions
            .iter()
            .map(|p| if p[0] < half { RED } else { BLUE })
            .collect(),
    );
    SourceDescriptor::new(mesh)
}

/// Decimator that keeps the first `target` triangles
pub struct KeepFirst;

impl Decimator for KeepFirst {
    fn simplify(
        &mut self,
        mesh: &MeshBuffer,
        target_triangles: usize,
        _target_error: f32,
    ) -> Result<Simplified> {
        let indices: Vec<u32> = mesh
            .triangles()
            .take(target_triangles)
            .flat_map(|t| t.map(|v| v as u32))
            .collect();
        Ok(Simplified {
            mesh: MeshBuffer {
                positions: mesh.positions.clone(),
                normals: mesh.normals.clone(),
                uvs: mesh.uvs.clone(),
                colors: mesh.colors.clone(),
                indices: Some(indices),
            },
            error: 0.0,
        })
    }
}
