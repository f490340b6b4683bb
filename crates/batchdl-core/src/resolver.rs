//! Output resolution: find the file a job actually left on disk.
//!
//! The engine may rename its output after reporting a path (audio
//! extraction turns `Title.webm` into `Title.mp3`, merges drop format ids),
//! so the predicted path is only used for its stem. The destination directory
//! is shared with other jobs and unrelated files; candidates are limited to
//! the job's own stem and the kind's extension allow-list.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::job::MediaKind;

/// Stem (file name without the last extension) of a predicted output path.
pub fn predicted_stem(predicted: &Path) -> Option<String> {
    predicted
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
}

struct Candidate {
    path: PathBuf,
    modified: SystemTime,
}

/// Locates the output of a job in `destination`.
///
/// Files whose stem equals the predicted stem win over files whose stem only
/// starts with it; within the chosen group the most recently modified file is
/// returned. `Ok(None)` means nothing matched. Only a failure to enumerate
/// `destination` itself is an error; unreadable entries are skipped.
pub fn resolve_output(
    destination: &Path,
    predicted: &Path,
    kind: MediaKind,
) -> io::Result<Option<PathBuf>> {
    let Some(stem) = predicted_stem(predicted) else {
        return Ok(None);
    };

    let mut exact = Vec::new();
    let mut prefixed = Vec::new();
    for entry in fs::read_dir(destination)? {
        let Ok(entry) = entry else { continue };
        let path = entry.path();
        let Ok(meta) = fs::metadata(&path) else { continue };
        if !meta.is_file() {
            continue;
        }
        let accepted = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| kind.accepts_extension(ext));
        if !accepted {
            continue;
        }
        let Some(candidate_stem) = path.file_stem().map(|s| s.to_string_lossy().into_owned())
        else {
            continue;
        };
        let candidate = Candidate {
            path,
            modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        };
        if candidate_stem == stem {
            exact.push(candidate);
        } else if candidate_stem.starts_with(&stem) {
            prefixed.push(candidate);
        }
    }

    // Exact stem first, whatever the mtimes: a bare prefix match would let
    // "Clip" claim a newer "Clip 2.mp4" from another job.
    let group = if exact.is_empty() { prefixed } else { exact };
    let chosen = group.into_iter().max_by_key(|c| c.modified).map(|c| c.path);
    tracing::debug!(
        stem = %stem,
        chosen = ?chosen.as_ref().map(|p| p.display().to_string()),
        "resolved output"
    );
    Ok(chosen)
}
