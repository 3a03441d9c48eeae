//! Package reading functionality

use crate::error::Result;
use crate::package::PackageEntry;
use std::io::{Read, Seek};
use zip::ZipArchive;

/// Load every file of a ZIP archive into memory, in archive order
///
/// Directory entries are skipped. No structural checks are made here; pass
/// the result to [`crate::validate_entries`] for that.
pub fn read_archive<R: Read + Seek>(reader: R) -> Result<Vec<PackageEntry>> {
    let mut archive = ZipArchive::new(reader)?;
    let mut entries = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)?;
        entries.push(PackageEntry::new(file.name(), data));
    }

    Ok(entries)
}
