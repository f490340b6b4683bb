//! Bulk retrieval: one zip archive with every retrievable file.

use std::fs;
use std::io::{self, Cursor};
use std::path::Path;

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::job::JobIndex;
use crate::naming::EntryNames;

use super::files::{open_file, DownloadedFile, RetrievalError};

/// Builds an in-memory zip of every file in `files` that can still be opened.
///
/// Entries are named by base name; colliding names are disambiguated with
/// the job number. Returns `Ok(None)` when no file could be included, so an
/// empty selection never produces an archive.
pub fn package_archive(files: &[DownloadedFile]) -> Result<Option<Vec<u8>>, RetrievalError> {
    let mut opened = Vec::with_capacity(files.len());
    for (position, file) in files.iter().enumerate() {
        match open_file(file) {
            Ok(handle) => {
                let size = handle.metadata().map(|m| m.len()).unwrap_or(file.size);
                opened.push((file, file.job.unwrap_or(JobIndex(position)), handle, size));
            }
            Err(RetrievalError::Missing(path)) => {
                tracing::debug!(path = %path.display(), "skipping vanished file");
            }
            Err(e) => return Err(e),
        }
    }
    if opened.is_empty() {
        return Ok(None);
    }

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let mut names = EntryNames::new();
    for (file, job, mut handle, size) in opened {
        let name = names.assign(&file.path, job);
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .large_file(size >= u64::from(u32::MAX));
        zip.start_file(name.as_str(), options)?;
        io::copy(&mut handle, &mut zip).map_err(|source| RetrievalError::Io {
            path: file.path.clone(),
            source,
        })?;
        tracing::debug!(entry = %name, "added to archive");
    }
    let cursor = zip.finish()?;
    Ok(Some(cursor.into_inner()))
}

/// Writes the archive of `files` to `dest`. Returns false (and writes
/// nothing) when there was nothing to package.
pub fn write_archive(files: &[DownloadedFile], dest: &Path) -> Result<bool, RetrievalError> {
    let Some(bytes) = package_archive(files)? else {
        return Ok(false);
    };
    fs::write(dest, bytes).map_err(|source| RetrievalError::Io {
        path: dest.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %dest.display(), files = files.len(), "archive written");
    Ok(true)
}
