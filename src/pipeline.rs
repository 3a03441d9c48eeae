//! End-to-end conversion
//!
//! Sources flow strictly forward: merge, sample, fit, quantize, segment,
//! serialize, validate. Each stage takes ownership of the previous stage's
//! buffers. A package is only returned when validation passes.

use tracing::{error, info, info_span};

use crate::budget::{ClusterDecimator, Decimator, FitParams, fit};
use crate::config::ConvertConfig;
use crate::error::Result;
use crate::package::ExportPackage;
use crate::progress::ProgressSink;
use crate::quantize::PaletteQuantizer;
use crate::sampler::ColorSampler;
use crate::segment::segment_with_progress;
use crate::serializer::serialize_with_progress;
use crate::source::{SourceDescriptor, merge_sources};
use crate::validator::validate_entries_with_progress;

/// Convert sources with the built-in [`ClusterDecimator`] and no progress
///
/// # Example
///
/// ```
/// use paint3mf::{ConvertConfig, Material, MeshBuffer, SourceDescriptor, convert};
///
/// # fn main() -> Result<(), paint3mf::Error> {
/// let mesh = MeshBuffer::indexed(
///     vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
///     &[[0, 1, 2]],
/// );
/// let source = SourceDescriptor::new(mesh).with_material(Material::with_base_color(1.0, 0.0, 0.0));
///
/// let package = convert(&[source], &ConvertConfig::new().with_palette_size(1))?;
/// assert_eq!(package.report.palette, vec!["#FF0000"]);
/// assert!(package.report.is_valid());
/// # Ok(())
/// # }
/// ```
pub fn convert(sources: &[SourceDescriptor], config: &ConvertConfig) -> Result<ExportPackage> {
    convert_with(
        sources,
        config,
        &mut ClusterDecimator::new(),
        &mut ProgressSink::none(),
    )
}

/// Convert sources into a validated 3MF package
///
/// # Errors
///
/// - [`Error::InvalidInput`](crate::Error::InvalidInput) for bad parameters or unusable sources
/// - [`Error::Decimation`](crate::Error::Decimation) when simplification fails
/// - [`Error::Validation`](crate::Error::Validation) with every validator error when the
///   built package is invalid; no package is returned in that case
pub fn convert_with(
    sources: &[SourceDescriptor],
    config: &ConvertConfig,
    decimator: &mut dyn Decimator,
    progress: &mut ProgressSink<'_>,
) -> Result<ExportPackage> {
    let _span = info_span!("convert", name = %config.name, sources = sources.len()).entered();

    config.validate()?;
    let mesh = merge_sources(sources)?;

    // Texture cache lives only for this run
    let (face_colors, sampling) = {
        let _span = info_span!("sample", triangles = mesh.triangle_count()).entered();
        ColorSampler::new()
            .with_flip_v(config.flip_v)
            .sample_with_progress(sources, progress)
    };

    let fitted = fit(mesh, face_colors, &FitParams::from(config), decimator, progress)?;

    let quantizer = PaletteQuantizer::new(config.sample_cap);
    let (palette, face_index) =
        quantizer.quantize_and_assign(&fitted.face_colors, config.palette_size, progress);

    let groups = segment_with_progress(
        &fitted.mesh,
        &face_index,
        &palette,
        config.encoding.coordinate_precision(),
        progress,
    )?;
    drop(fitted.mesh);

    let mut package =
        serialize_with_progress(&groups, &palette, config.encoding, &config.name, progress)?;

    let validation = validate_entries_with_progress(&package.entries, progress);
    package.report.sampling = Some(sampling);
    package.report.fit = Some(fitted.report);
    package.report.validation = Some(validation.clone());

    if let Err(e) = validation.into_result() {
        error!(errors = e.validation_errors().len(), "Built package failed validation");
        return Err(e);
    }

    info!(
        palette = package.report.palette.len(),
        triangles = package.report.total_triangles,
        vertices = package.report.total_vertices,
        bytes = package.report.total_bytes(),
        "Conversion finished"
    );
    Ok(package)
}
