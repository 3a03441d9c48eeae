//! Conversion report handed back with every package

use crate::budget::FitReport;
use crate::color::Rgb;
use crate::sampler::SampleStats;
use crate::segment::ColorGroup;
use crate::validator::ValidationReport;
use crate::writer::EncodingMode;

/// Share of the mesh owned by one palette entry
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColorShare {
    /// Index into the palette
    pub palette_index: usize,
    /// Color as `#RRGGBB`
    pub hex: String,
    /// Triangles assigned to this color
    pub triangles: usize,
    /// Unique vertices in this color's group
    pub vertices: usize,
    /// Percentage of all triangles
    pub percentage: f64,
}

/// Summary of one conversion run
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExportReport {
    /// Document name
    pub name: String,
    /// Encoding mode name
    pub encoding: String,
    /// Triangles across every group
    pub total_triangles: usize,
    /// Vertices across every group
    pub total_vertices: usize,
    /// Palette as `#RRGGBB`, in palette order
    pub palette: Vec<String>,
    /// Per-color distribution, ascending palette index, empty entries included
    pub colors: Vec<ColorShare>,
    /// `(path, byte size)` per package entry
    pub files: Vec<(String, usize)>,
    /// Color source statistics
    pub sampling: Option<SampleStats>,
    /// Simplification and subdivision summary
    pub fit: Option<FitReport>,
    /// Result of post-build validation
    pub validation: Option<ValidationReport>,
}

impl ExportReport {
    /// Report for serialized groups, without file sizes or stage summaries
    pub fn from_groups(
        groups: &[ColorGroup],
        palette: &[Rgb],
        mode: EncodingMode,
        name: &str,
    ) -> Self {
        let total_triangles: usize = groups.iter().map(|g| g.mesh.triangle_count()).sum();
        let total_vertices: usize = groups.iter().map(|g| g.mesh.vertex_count()).sum();

        let colors = palette
            .iter()
            .enumerate()
            .map(|(palette_index, color)| {
                let group = groups.iter().find(|g| g.palette_index == palette_index);
                let triangles = group.map_or(0, |g| g.mesh.triangle_count());
                ColorShare {
                    palette_index,
                    hex: color.to_string(),
                    triangles,
                    vertices: group.map_or(0, |g| g.mesh.vertex_count()),
                    percentage: percentage(triangles, total_triangles),
                }
            })
            .collect();

        Self {
            name: name.to_string(),
            encoding: mode.name().to_string(),
            total_triangles,
            total_vertices,
            palette: palette.iter().map(|c| c.to_string()).collect(),
            colors,
            ..Self::default()
        }
    }

    /// Sum of the per-color percentages
    pub fn percentage_total(&self) -> f64 {
        self.colors.iter().map(|c| c.percentage).sum()
    }

    /// Total size of every package entry in bytes
    pub fn total_bytes(&self) -> usize {
        self.files.iter().map(|(_, size)| size).sum()
    }

    /// Whether validation ran and passed
    pub fn is_valid(&self) -> bool {
        self.validation.as_ref().is_some_and(|v| v.valid)
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}
