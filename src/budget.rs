//! Triangle budget control
//!
//! Brings a merged mesh within the triangle ceiling and applies uniform
//! subdivision, keeping the face color table aligned with the geometry.
//!
//! Simplification is delegated to a [`Decimator`]. The decimator knows
//! nothing about colors, so face colors are carried over by uniform stride
//! after simplification. That transfer is an approximation: surviving
//! triangles do not keep their original identity.

mod decimate;
mod subdivide;

pub use decimate::{ClusterDecimator, MAX_RESOLUTION};
pub use subdivide::{SubdivideResult, subdivide, subdivide_with_progress};

use tracing::{debug, info, info_span, warn};

use crate::color::Rgb;
use crate::config::{ConvertConfig, DEFAULT_TARGET_ERROR};
use crate::error::{Error, Result};
use crate::mesh::MeshBuffer;
use crate::progress::{ProgressSink, Stage};

/// Output of a [`Decimator`]
#[derive(Debug, Clone)]
pub struct Simplified {
    /// Simplified geometry
    pub mesh: MeshBuffer,
    /// Engine-specific error metric
    pub error: f32,
}

/// Mesh simplification engine
///
/// Receives geometry and a target triangle count; returns geometry with at
/// most that many triangles. Called once per run without retry.
pub trait Decimator {
    /// Simplify `mesh` to at most `target_triangles` triangles
    fn simplify(
        &mut self,
        mesh: &MeshBuffer,
        target_triangles: usize,
        target_error: f32,
    ) -> Result<Simplified>;
}

impl<D: Decimator + ?Sized> Decimator for &mut D {
    fn simplify(
        &mut self,
        mesh: &MeshBuffer,
        target_triangles: usize,
        target_error: f32,
    ) -> Result<Simplified> {
        (**self).simplify(mesh, target_triangles, target_error)
    }
}

/// Budget parameters for [`fit`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitParams {
    /// Hard triangle ceiling
    pub max_triangles: usize,
    /// Advisory threshold for the final count
    pub warn_triangles: usize,
    /// Requested subdivision level
    pub subdivision_level: u32,
    /// Target error handed to the decimator
    pub target_error: f32,
}

impl Default for FitParams {
    fn default() -> Self {
        Self::from(&ConvertConfig::default())
    }
}

impl From<&ConvertConfig> for FitParams {
    fn from(config: &ConvertConfig) -> Self {
        Self {
            max_triangles: config.max_triangles,
            warn_triangles: config.warn_triangles,
            subdivision_level: config.subdivision_level,
            target_error: config.target_error,
        }
    }
}

impl FitParams {
    /// Parameters with the given ceiling and subdivision level
    pub fn new(max_triangles: usize, subdivision_level: u32) -> Self {
        Self {
            max_triangles,
            warn_triangles: max_triangles,
            subdivision_level,
            target_error: DEFAULT_TARGET_ERROR,
        }
    }

    /// Set the advisory threshold
    pub fn with_warn_triangles(mut self, warn_triangles: usize) -> Self {
        self.warn_triangles = warn_triangles;
        self
    }
}

/// Summary of what [`fit`] did
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FitReport {
    /// Triangle count on entry
    pub original_triangles: usize,
    /// Triangle count after simplification, if it ran
    pub simplified_triangles: Option<usize>,
    /// Error metric reported by the decimator
    pub decimation_error: Option<f32>,
    /// Stride used to carry face colors across simplification
    pub color_stride: Option<usize>,
    /// Level asked for
    pub requested_level: u32,
    /// Level actually applied
    pub applied_level: u32,
    /// Triangle count on exit
    pub final_triangles: usize,
    /// Advisory messages
    pub warnings: Vec<String>,
}

impl FitReport {
    /// Whether the decimator was invoked
    pub fn simplified(&self) -> bool {
        self.simplified_triangles.is_some()
    }
}

/// Mesh and colors after budget control
#[derive(Debug, Clone)]
pub struct Fitted {
    /// Final geometry
    pub mesh: MeshBuffer,
    /// One color per triangle of `mesh`
    pub face_colors: Vec<Rgb>,
    /// What happened
    pub report: FitReport,
}

/// Simplify above the ceiling, then subdivide
///
/// Takes ownership of the mesh and color table and returns their
/// replacements. A requested subdivision level that would exceed the
/// ceiling is lowered to the highest level that fits.
///
/// # Errors
///
/// [`Error::InvalidInput`] for an invalid mesh or a color table of the
/// wrong length, [`Error::Decimation`] when the decimator fails or returns
/// more triangles than allowed.
pub fn fit(
    mesh: MeshBuffer,
    face_colors: Vec<Rgb>,
    params: &FitParams,
    decimator: &mut dyn Decimator,
    progress: &mut ProgressSink<'_>,
) -> Result<Fitted> {
    let _span = info_span!("fit", max_triangles = params.max_triangles).entered();

    mesh.validate()?;
    let original_triangles = mesh.triangle_count();
    if face_colors.len() != original_triangles {
        return Err(Error::invalid_input(format!(
            "face color table has {} entries for {} triangles",
            face_colors.len(),
            original_triangles
        )));
    }
    if params.max_triangles == 0 {
        return Err(Error::invalid_input("max_triangles must be at least 1"));
    }

    let mut report = FitReport {
        original_triangles,
        requested_level: params.subdivision_level,
        ..FitReport::default()
    };

    let (mesh, face_colors) = if original_triangles > params.max_triangles {
        let simplified =
            decimator.simplify(&mesh, params.max_triangles, params.target_error)?;
        drop(mesh);
        let result = simplified.mesh;

        result
            .validate()
            .map_err(|e| Error::decimation(format!("decimator returned an invalid mesh: {}", e)))?;
        let achieved = result.triangle_count();
        if achieved > params.max_triangles || achieved > original_triangles {
            return Err(Error::decimation(format!(
                "decimator returned {} triangles for a target of {}",
                achieved, params.max_triangles
            )));
        }

        let stride = color_stride(original_triangles, achieved);
        let colors = resample_by_stride(&face_colors, achieved);
        info!(
            original = original_triangles,
            simplified = achieved,
            error = simplified.error,
            stride,
            "Simplified mesh"
        );

        report.simplified_triangles = Some(achieved);
        report.decimation_error = Some(simplified.error);
        report.color_stride = Some(stride);
        (result, colors)
    } else {
        debug!(triangles = original_triangles, "Mesh within ceiling");
        (mesh, face_colors)
    };
    progress.report(Stage::Fitting, 0, 1);

    let level = highest_fitting_level(
        mesh.triangle_count(),
        params.subdivision_level,
        params.max_triangles,
    );
    if level < params.subdivision_level {
        let message = format!(
            "subdivision level {} would exceed {} triangles; using level {}",
            params.subdivision_level, params.max_triangles, level
        );
        warn!("{}", message);
        report.warnings.push(message);
    }
    report.applied_level = level;

    let (mesh, face_colors) = if level > 0 {
        let result = subdivide_with_progress(&mesh, &face_colors, level, progress);
        info!(
            level,
            triangles = result.mesh.triangle_count(),
            "Subdivided mesh"
        );
        (result.mesh, result.face_colors)
    } else {
        (mesh, face_colors)
    };

    report.final_triangles = mesh.triangle_count();
    if report.final_triangles > params.warn_triangles {
        let message = format!(
            "final mesh has {} triangles, above the advisory threshold of {}",
            report.final_triangles, params.warn_triangles
        );
        warn!("{}", message);
        report.warnings.push(message);
    }
    progress.report(Stage::Fitting, 1, 1);

    Ok(Fitted {
        mesh,
        face_colors,
        report,
    })
}

/// `floor(original / simplified)`, at least 1
pub fn color_stride(original: usize, simplified: usize) -> usize {
    if simplified == 0 {
        1
    } else {
        (original / simplified).max(1)
    }
}

/// Carry `colors` to `count` triangles by taking every stride-th entry
///
/// Indices past the end clamp to the last color.
pub fn resample_by_stride(colors: &[Rgb], count: usize) -> Vec<Rgb> {
    if colors.is_empty() {
        return Vec::new();
    }
    let stride = color_stride(colors.len(), count);
    let last = colors.len() - 1;
    (0..count)
        .map(|i| colors[(i * stride).min(last)])
        .collect()
}

/// Highest level <= `requested` whose result stays within `max_triangles`
fn highest_fitting_level(triangles: usize, requested: u32, max_triangles: usize) -> u32 {
    let mut level = requested;
    while level > 0 {
        let grown = 4usize
            .checked_pow(level)
            .and_then(|factor| triangles.checked_mul(factor));
        if matches!(grown, Some(count) if count <= max_triangles) {
            break;
        }
        level -= 1;
    }
    level
}
