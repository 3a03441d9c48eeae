//! Convert a cube with one color per face into a multi-material 3MF
//!
//! This example shows:
//! - Describing a mesh with per-face materials
//! - Converting it with each encoding mode
//! - Reading the export report
//!
//! Run with `RUST_LOG=paint3mf=debug` to see the pipeline's log output.
//!
//! Usage: cargo run --example paint_cube -- [output-directory]

use paint3mf::{
    ConvertConfig, EncodingMode, Material, MaterialGroup, MeshBuffer, SourceDescriptor, TagDialect,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const FACE_COLORS: [[f32; 3]; 6] = [
    [0.9, 0.1, 0.1],
    [0.1, 0.8, 0.2],
    [0.1, 0.2, 0.9],
    [0.95, 0.85, 0.1],
    [0.95, 0.95, 0.95],
    [0.1, 0.1, 0.1],
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("paint3mf=info")),
        )
        .init();

    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&out_dir)?;

    println!("Painted Cube Example\n");

    let source = painted_cube(20.0);
    let modes = [
        ("cube_objects.3mf", EncodingMode::PerObject),
        ("cube_prusa.3mf", EncodingMode::TriangleTag(TagDialect::PaintHex)),
        ("cube_bambu.3mf", EncodingMode::TriangleTag(TagDialect::ExtruderIndex)),
        ("cube_materials.3mf", EncodingMode::MaterialIndex),
    ];

    for (file_name, mode) in modes {
        let config = ConvertConfig::new()
            .with_palette_size(4)
            .with_encoding(mode)
            .with_name("Painted Cube");
        let package = paint3mf::convert(std::slice::from_ref(&source), &config)?;

        let path = out_dir.join(file_name);
        package.write_to_file(&path)?;

        let report = &package.report;
        println!("{} ({})", path.display(), mode.name());
        println!(
            "   {} triangles, {} vertices, {} bytes",
            report.total_triangles,
            report.total_vertices,
            report.total_bytes()
        );
        for share in &report.colors {
            println!(
                "   {} {:>5.1}% ({} triangles)",
                share.hex, share.percentage, share.triangles
            );
        }
        println!();
    }

    println!("Six face colors were reduced to a four-color palette.");
    Ok(())
}

/// Axis-aligned cube with two triangles per face, one material per face
fn painted_cube(size: f32) -> SourceDescriptor {
    let s = size;
    let positions = vec![
        [0.0, 0.0, 0.0],
        [s, 0.0, 0.0],
        [s, s, 0.0],
        [0.0, s, 0.0],
        [0.0, 0.0, s],
        [s, 0.0, s],
        [s, s, s],
        [0.0, s, s],
    ];
    let triangles = [
        // Bottom
        [0, 2, 1],
        [0, 3, 2],
        // Top
        [4, 5, 6],
        [4, 6, 7],
        // Front
        [0, 1, 5],
        [0, 5, 4],
        // Back
        [3, 7, 6],
        [3, 6, 2],
        // Left
        [0, 4, 7],
        [0, 7, 3],
        // Right
        [1, 2, 6],
        [1, 6, 5],
    ];

    let mut source = SourceDescriptor::new(MeshBuffer::indexed(positions, &triangles));
    for (face, [r, g, b]) in FACE_COLORS.into_iter().enumerate() {
        source = source
            .with_material(Material::with_base_color(r, g, b))
            .with_group(MaterialGroup::new(face * 2, 2, face));
    }
    source
}
