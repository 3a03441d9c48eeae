//! # paint3mf
//!
//! Convert textured triangle meshes into palette-reduced, multi-material
//! 3MF packages for multi-extruder printing.
//!
//! A conversion samples one color per triangle, keeps the triangle count
//! under a ceiling (simplifying or subdividing), reduces the colors to a
//! small palette with median-cut, splits the mesh by palette entry and
//! writes a 3MF archive in one of several slicer encodings. The package is
//! re-read and checked before it is handed back.
//!
//! ## Features
//!
//! - Pure Rust implementation with no unsafe code
//! - Per-object, per-triangle tag (two slicer dialects) and material-index encodings
//! - Built-in vertex-clustering decimator behind a pluggable [`Decimator`] trait
//! - Fail-closed validation: an invalid package is never returned
//! - Structured logging through `tracing`
//!
//! ## Example
//!
//! ```no_run
//! use paint3mf::{ConvertConfig, EncodingMode, Material, MeshBuffer, SourceDescriptor, TagDialect};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mesh = MeshBuffer::indexed(
//!     vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]],
//!     &[[0, 1, 2], [1, 3, 2]],
//! );
//! let source = SourceDescriptor::new(mesh).with_material(Material::with_base_color(0.8, 0.1, 0.1));
//!
//! let config = ConvertConfig::new()
//!     .with_palette_size(4)
//!     .with_encoding(EncodingMode::TriangleTag(TagDialect::PaintHex));
//! let package = paint3mf::convert(&[source], &config)?;
//! package.write_to_file("painted.3mf")?;
//!
//! println!("Palette: {}", package.report.palette.join(", "));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod budget;
pub mod color;
pub mod config;
pub mod error;
pub mod mesh;
pub mod model;
pub mod opc;
pub mod package;
pub mod parser;
mod pipeline;
pub mod progress;
pub mod quantize;
pub mod report;
pub mod sampler;
pub mod segment;
pub mod serializer;
pub mod source;
pub mod validator;
pub mod writer;

pub use budget::{
    ClusterDecimator, Decimator, FitParams, FitReport, Fitted, Simplified, fit, subdivide,
};
pub use color::Rgb;
pub use config::ConvertConfig;
pub use error::{Error, Result};
pub use mesh::MeshBuffer;
pub use opc::read_archive;
pub use package::{ExportPackage, PackageEntry};
pub use pipeline::{convert, convert_with};
pub use progress::{Progress, ProgressSink, Stage};
pub use quantize::{Palette, PaletteQuantizer, assign, median_cut, nearest_index};
pub use report::{ColorShare, ExportReport};
pub use sampler::{ColorSampler, SampleStats};
pub use segment::{ColorGroup, TaggedMesh, segment};
pub use serializer::serialize;
pub use source::{Material, MaterialGroup, SourceDescriptor, Texture, merge_sources};
pub use validator::{
    GeometryStats, ValidationReport, validate, validate_archive, validate_entries,
};
pub use writer::{EncodingMode, TagDialect};
