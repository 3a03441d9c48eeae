//! Package writing functionality for creating 3MF files

use crate::error::Result;
use crate::package::PackageEntry;
use std::io::{Seek, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{CONTENT_TYPES_PATH, normalize_path};

/// Write `entries` into a Deflate-compressed ZIP archive
///
/// `[Content_Types].xml` is always stored first; the remaining entries keep
/// their order.
///
/// # Returns
///
/// Returns the writer after finishing the ZIP archive
pub fn create_package<W: Write + Seek>(writer: W, entries: &[PackageEntry]) -> Result<W> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let (manifest, rest): (Vec<&PackageEntry>, Vec<&PackageEntry>) = entries
        .iter()
        .partition(|e| normalize_path(&e.path) == CONTENT_TYPES_PATH);

    for entry in manifest.into_iter().chain(rest) {
        zip.start_file(normalize_path(&entry.path), options)?;
        zip.write_all(&entry.data)?;
        debug!(path = %entry.path, bytes = entry.data.len(), "Wrote archive entry");
    }

    let writer = zip.finish()?;
    Ok(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use zip::ZipArchive;

    #[test]
    fn test_content_types_written_first() {
        let entries = vec![
            PackageEntry::new("_rels/.rels", b"<Relationships/>".to_vec()),
            PackageEntry::new(CONTENT_TYPES_PATH, b"<Types/>".to_vec()),
        ];
        let cursor = create_package(Cursor::new(Vec::new()), &entries).unwrap();

        let mut archive = ZipArchive::new(cursor).unwrap();
        assert_eq!(archive.len(), 2);
        assert_eq!(archive.by_index(0).unwrap().name(), CONTENT_TYPES_PATH);
        assert_eq!(
            archive.by_index(1).unwrap().compression(),
            CompressionMethod::Deflated
        );
    }
}
