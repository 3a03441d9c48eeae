//! Post-build validation of 3MF packages
//!
//! A finished package is re-read the way a slicer would read it: every XML
//! entry must be well-formed, the manifest and relationships must point at
//! parts that exist, and the entry model document must describe printable
//! geometry. Validation ensures that:
//! - The model document exists, is non-empty and has triangles and build items
//! - Triangle vertex indices reference valid vertices
//! - Build items reference existing objects
//! - Base material references are valid
//! - Per-triangle tags are present on every triangle or on none
//!
//! Problems are collected, not returned on first failure, so a caller can
//! report every issue at once.

mod core;
mod opc;

use std::io::{Read, Seek};

use tracing::{info, info_span, warn};

use crate::error::{Error, Result};
use crate::opc::read_archive;
use crate::package::{ExportPackage, PackageEntry};
use crate::parser::parse_model_xml;
use crate::progress::{ProgressSink, Stage};

/// Geometry found in the entry model document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeometryStats {
    /// Number of objects
    pub objects: usize,
    /// Vertices across every object
    pub vertices: usize,
    /// Triangles across every object
    pub triangles: usize,
    /// Triangles with a repeated vertex index
    pub degenerate_triangles: usize,
    /// Number of build items
    pub build_items: usize,
    /// Base material entries across every group
    pub base_materials: usize,
}

/// Outcome of package validation
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValidationReport {
    /// `true` when no errors were found
    pub valid: bool,
    /// Human-readable errors; any entry makes the package invalid
    pub errors: Vec<String>,
    /// Human-readable warnings; informational only
    pub warnings: Vec<String>,
    /// Geometry statistics of the entry model document
    pub geometry: GeometryStats,
}

impl ValidationReport {
    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    fn warning(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(%message, "Package validation warning");
        self.warnings.push(message);
    }

    fn finish(mut self) -> Self {
        self.valid = self.errors.is_empty();
        self
    }

    /// Turn an invalid report into [`Error::Validation`]
    pub fn into_result(self) -> Result<Self> {
        if self.valid {
            Ok(self)
        } else {
            Err(Error::Validation(self.errors))
        }
    }
}

/// Validate an in-memory package
pub fn validate(package: &ExportPackage) -> ValidationReport {
    validate_entries(&package.entries)
}

/// Validate raw package entries
pub fn validate_entries(entries: &[PackageEntry]) -> ValidationReport {
    validate_entries_with_progress(entries, &mut ProgressSink::none())
}

/// [`validate_entries`] with a progress report per checked entry
pub fn validate_entries_with_progress(
    entries: &[PackageEntry],
    progress: &mut ProgressSink<'_>,
) -> ValidationReport {
    let _span = info_span!("validate", entries = entries.len()).entered();
    let mut report = ValidationReport::default();

    let model_path = opc::validate_structure(entries, &mut report, progress);

    let model_entry = model_path.and_then(|path| entries.iter().find(|e| e.path == path));
    if let Some(entry) = model_entry {
        validate_model_entry(entry, &mut report);
    }

    let report = report.finish();
    info!(
        valid = report.valid,
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        triangles = report.geometry.triangles,
        "Validated package"
    );
    report
}

/// Read a ZIP archive and validate it
///
/// # Errors
///
/// Only archive-level failures are returned as errors; problems with the
/// package contents are reported in the [`ValidationReport`].
pub fn validate_archive<R: Read + Seek>(reader: R) -> Result<ValidationReport> {
    let entries = read_archive(reader)?;
    Ok(validate_entries(&entries))
}

fn validate_model_entry(entry: &PackageEntry, report: &mut ValidationReport) {
    if entry.data.iter().all(u8::is_ascii_whitespace) {
        report.error(format!("model document {} is empty", entry.path));
        return;
    }
    let Some(xml) = entry.text() else {
        // Already reported as invalid UTF-8
        return;
    };

    match parse_model_xml(xml) {
        Ok(model) => {
            core::validate_model(&model, report);
            core::validate_color_style(xml, report);
        }
        Err(e) => report.error(format!("model document {} cannot be read: {}", entry.path, e)),
    }
}
