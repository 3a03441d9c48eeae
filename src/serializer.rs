//! 3MF package assembly
//!
//! Lays out color groups as a model document in the requested
//! [`EncodingMode`], then adds the content type manifest, the root
//! relationships and the slicer sidecars.

use tracing::{debug, info, info_span};

use crate::color::Rgb;
use crate::error::{Error, Result};
use crate::opc::{CONTENT_TYPES_PATH, ContentTypes, MODEL_PATH, RELS_PATH};
use crate::opc::{root_relationships, write_relationships};
use crate::package::{ExportPackage, PackageEntry};
use crate::progress::{ProgressSink, Stage};
use crate::report::ExportReport;
use crate::segment::ColorGroup;
use crate::writer::{
    EncodingMode, SLIC3R_CONFIG_PATH, SLIC3R_MODEL_CONFIG_PATH, build_model, model_to_string,
    slic3r_config, write_model_config,
};

/// Content type of the key/value filament config
pub const CONFIG_CONTENT_TYPE: &str = "text/plain";

/// Content type of the per-volume XML config
pub const MODEL_CONFIG_CONTENT_TYPE: &str = "text/xml";

/// Build a package from color groups
///
/// The package is not validated here; [`crate::validate`] does that.
///
/// # Errors
///
/// [`Error::InvalidInput`] when a group refers to a palette entry that does
/// not exist, [`Error::XmlWrite`] if a document cannot be rendered.
///
/// # Example
///
/// ```
/// use paint3mf::{ColorGroup, EncodingMode, Rgb, serialize};
/// use paint3mf::segment::GroupMesh;
///
/// # fn main() -> Result<(), paint3mf::Error> {
/// let red = Rgb::new(255, 0, 0);
/// let group = ColorGroup {
///     palette_index: 0,
///     color: red,
///     triangles: vec![0],
///     mesh: GroupMesh {
///         vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
///         triangles: vec![[0, 1, 2]],
///     },
/// };
/// let package = serialize(&[group], &[red], EncodingMode::PerObject, "Part")?;
/// assert!(package.model_xml().unwrap().contains("name=\"Part_FF0000\""));
/// # Ok(())
/// # }
/// ```
pub fn serialize(
    groups: &[ColorGroup],
    palette: &[Rgb],
    mode: EncodingMode,
    name: &str,
) -> Result<ExportPackage> {
    serialize_with_progress(groups, palette, mode, name, &mut ProgressSink::none())
}

/// [`serialize`] with a progress report per written document
pub fn serialize_with_progress(
    groups: &[ColorGroup],
    palette: &[Rgb],
    mode: EncodingMode,
    name: &str,
    progress: &mut ProgressSink<'_>,
) -> Result<ExportPackage> {
    let _span = info_span!("serialize", mode = mode.name(), groups = groups.len()).entered();

    if let Some(group) = groups.iter().find(|g| g.palette_index >= palette.len()) {
        return Err(Error::invalid_input(format!(
            "color group refers to palette entry {} but the palette has {} entries",
            group.palette_index,
            palette.len()
        )));
    }

    const DOCUMENTS: usize = 5;
    let model = build_model(groups, palette, mode, name);
    let model_xml = model_to_string(&model)?;
    progress.report(Stage::Serializing, 1, DOCUMENTS);

    let mut model_config = Vec::new();
    write_model_config(&model, &mut model_config)?;
    let config = slic3r_config(palette);
    progress.report(Stage::Serializing, 3, DOCUMENTS);

    let content_types = ContentTypes::new()
        .with_override(SLIC3R_CONFIG_PATH, CONFIG_CONTENT_TYPE)
        .with_override(SLIC3R_MODEL_CONFIG_PATH, MODEL_CONFIG_CONTENT_TYPE)
        .to_xml()?;
    let rels = write_relationships(&root_relationships())?;
    progress.report(Stage::Serializing, DOCUMENTS, DOCUMENTS);

    let entries = vec![
        PackageEntry::new(CONTENT_TYPES_PATH, content_types.into_bytes()),
        PackageEntry::new(RELS_PATH, rels.into_bytes()),
        PackageEntry::new(MODEL_PATH, model_xml.into_bytes()),
        PackageEntry::new(SLIC3R_CONFIG_PATH, config.into_bytes()),
        PackageEntry::new(SLIC3R_MODEL_CONFIG_PATH, model_config),
    ];
    for entry in &entries {
        debug!(path = %entry.path, bytes = entry.len(), "Serialized package entry");
    }

    let report = ExportReport::from_groups(groups, palette, mode, name);
    let package = ExportPackage::new(entries, report);
    info!(
        objects = model.resources.objects.len(),
        triangles = model.triangle_count(),
        vertices = model.vertex_count(),
        bytes = package.report.total_bytes(),
        "Serialized package"
    );

    Ok(package)
}
