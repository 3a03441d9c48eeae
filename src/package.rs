//! In-memory 3MF package

use std::fs::File;
use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::opc::{CONTENT_TYPES_PATH, MODEL_PATH, create_package, normalize_path};
use crate::report::ExportReport;

/// One file inside a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry {
    /// Archive path without a leading slash, e.g. `3D/3dmodel.model`
    pub path: String,
    /// File contents
    pub data: Vec<u8>,
}

impl PackageEntry {
    /// Create an entry, dropping any leading slash from `path`
    pub fn new(path: &str, data: Vec<u8>) -> Self {
        Self {
            path: normalize_path(path).to_string(),
            data,
        }
    }

    /// Contents as UTF-8 text, if they are valid UTF-8
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the entry has no contents
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Finished package: path to bytes mapping plus the run report
///
/// Entries are kept in archive order with `[Content_Types].xml` first.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPackage {
    /// Package entries
    pub entries: Vec<PackageEntry>,
    /// Conversion report
    pub report: ExportReport,
}

impl ExportPackage {
    /// Package from entries, filling in the report's file list
    pub fn new(mut entries: Vec<PackageEntry>, mut report: ExportReport) -> Self {
        entries.sort_by_key(|e| e.path != CONTENT_TYPES_PATH);
        report.files = entries.iter().map(|e| (e.path.clone(), e.len())).collect();
        Self { entries, report }
    }

    /// Entry at `path`; a leading slash is ignored
    pub fn entry(&self, path: &str) -> Option<&PackageEntry> {
        let path = normalize_path(path);
        self.entries.iter().find(|e| e.path == path)
    }

    /// Contents of the entry at `path`
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.entry(path).map(|e| e.data.as_slice())
    }

    /// Contents of the entry at `path` as text
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.entry(path).and_then(PackageEntry::text)
    }

    /// Entry model document
    pub fn model_xml(&self) -> Option<&str> {
        self.get_str(MODEL_PATH)
    }

    /// Paths of every entry, in archive order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.path.as_str())
    }

    /// Write the package as a ZIP archive
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W> {
        create_package(writer, &self.entries)
    }

    /// ZIP archive bytes
    pub fn to_zip(&self) -> Result<Vec<u8>> {
        Ok(self.write_to(Cursor::new(Vec::new()))?.into_inner())
    }

    /// Write the ZIP archive to a file, replacing it if it exists
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let mut writer = self.write_to(BufWriter::new(file))?;
        writer.flush()?;
        info!(path = %path.display(), entries = self.entries.len(), "Wrote 3MF package");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package() -> ExportPackage {
        ExportPackage::new(
            vec![
                PackageEntry::new("/3D/3dmodel.model", b"<model/>".to_vec()),
                PackageEntry::new(CONTENT_TYPES_PATH, b"<Types/>".to_vec()),
            ],
            ExportReport::default(),
        )
    }

    #[test]
    fn test_content_types_sorted_first() {
        let package = package();
        let paths: Vec<_> = package.paths().collect();
        assert_eq!(paths, vec![CONTENT_TYPES_PATH, MODEL_PATH]);
        assert_eq!(package.report.files[1], (MODEL_PATH.to_string(), 8));
    }

    #[test]
    fn test_lookup_ignores_leading_slash() {
        let package = package();
        assert_eq!(package.get("/3D/3dmodel.model"), Some(&b"<model/>"[..]));
        assert_eq!(package.model_xml(), Some("<model/>"));
        assert!(package.get("missing").is_none());
    }

    #[test]
    fn test_to_zip_produces_archive() {
        let bytes = package().to_zip().unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}
