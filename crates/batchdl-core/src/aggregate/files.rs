//! Retrievable files: listing, per-file retrieval, directory scans.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::job::{JobIndex, JobResult, MediaKind, ResultState};
use crate::resolver::resolve_output;

/// Errors from the retrieval surface.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("file is no longer available: {}", .0.display())]
    Missing(PathBuf),
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("archive: {0}")]
    Archive(#[from] zip::result::ZipError),
}

/// A media file present on disk at the time it was listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadedFile {
    /// Job that produced the file; `None` for plain directory scans.
    pub job: Option<JobIndex>,
    pub title: Option<String>,
    pub path: PathBuf,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

impl DownloadedFile {
    /// Stats `path`; `Ok(None)` if it does not exist or is not a regular file.
    pub fn probe(
        path: &Path,
        job: Option<JobIndex>,
        title: Option<String>,
    ) -> io::Result<Option<Self>> {
        let meta = match fs::metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        if !meta.is_file() {
            return Ok(None);
        }
        let modified = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| DateTime::<Utc>::from(std::time::SystemTime::UNIX_EPOCH));
        Ok(Some(Self {
            job,
            title,
            path: path.to_path_buf(),
            size: meta.len(),
            modified,
        }))
    }

    /// Base name, used as the download name and archive entry name.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Files of successful (or warning) results that still exist right now,
/// ordered by job index. Results whose file vanished are silently omitted.
///
/// A warning's recorded path is only the engine's prediction, so it is
/// resolved again (stem plus the kind's allow-list) instead of trusted as is.
pub fn list_retrievable_files(results: &[JobResult]) -> Vec<DownloadedFile> {
    let mut files: Vec<DownloadedFile> = results
        .iter()
        .filter_map(|r| {
            let path = retrievable_path(r)?;
            match DownloadedFile::probe(&path, Some(r.index), r.title.clone()) {
                Ok(found) => found,
                Err(e) => {
                    tracing::debug!(path = %path.display(), "skipping unreadable output: {}", e);
                    None
                }
            }
        })
        .collect();
    files.sort_by_key(|f| f.job);
    files
}

fn retrievable_path(result: &JobResult) -> Option<PathBuf> {
    let recorded = result.output.as_deref()?;
    match result.state {
        ResultState::Success => Some(recorded.to_path_buf()),
        ResultState::Warning => {
            let kind = result.kind?;
            let dir = recorded.parent()?;
            match resolve_output(dir, recorded, kind) {
                Ok(found) => found,
                Err(e) => {
                    tracing::debug!(dir = %dir.display(), "cannot re-resolve warning output: {}", e);
                    None
                }
            }
        }
        ResultState::Error => None,
    }
}

/// Opens a listed file for individual retrieval, re-checking it still exists.
pub fn open_file(file: &DownloadedFile) -> Result<fs::File, RetrievalError> {
    fs::File::open(&file.path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            RetrievalError::Missing(file.path.clone())
        } else {
            RetrievalError::Io {
                path: file.path.clone(),
                source,
            }
        }
    })
}

/// Media files currently in `dir`, optionally limited to one kind, ordered
/// by name. Used outside of a batch (e.g. to re-package earlier downloads).
pub fn scan_directory(dir: &Path, kind: Option<MediaKind>) -> io::Result<Vec<DownloadedFile>> {
    let kinds: &[MediaKind] = match kind {
        Some(MediaKind::Video) => &[MediaKind::Video],
        Some(MediaKind::Audio) => &[MediaKind::Audio],
        None => &[MediaKind::Video, MediaKind::Audio],
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let Ok(entry) = entry else { continue };
        let path = entry.path();
        let accepted = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| kinds.iter().any(|k| k.accepts_extension(ext)));
        if !accepted {
            continue;
        }
        if let Ok(Some(file)) = DownloadedFile::probe(&path, None, None) {
            files.push(file);
        }
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}
