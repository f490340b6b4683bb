//! File naming: safe names from media titles, and unique names inside an
//! archive when several jobs produced the same base name.

use std::collections::HashSet;
use std::path::Path;

use crate::job::JobIndex;

/// Fallback when a title sanitizes to nothing.
const DEFAULT_NAME: &str = "download";

/// Linux NAME_MAX, in bytes.
const NAME_MAX: usize = 255;

/// Sanitizes a media title for use as a file name.
///
/// - Keeps alphanumerics, spaces, `-`, `_` and `.`; drops everything else
/// - Collapses runs of spaces
/// - Trims leading/trailing spaces and dots
/// - Limits length to 255 bytes
pub fn sanitize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut prev_space = false;

    for c in title.chars() {
        let keep = c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.');
        if !keep {
            continue;
        }
        if c == ' ' {
            if !prev_space {
                out.push(' ');
            }
            prev_space = true;
        } else {
            out.push(c);
            prev_space = false;
        }
    }

    let trimmed = out.trim_matches(|c| c == ' ' || c == '.');
    let mut take = trimmed.len().min(NAME_MAX);
    while take > 0 && !trimmed.is_char_boundary(take) {
        take -= 1;
    }
    let name = &trimmed[..take];
    if name.is_empty() {
        DEFAULT_NAME.to_string()
    } else {
        name.to_string()
    }
}

/// Hands out archive entry names. The stem goes through `sanitize_title`
/// and the extension is kept. Later files that collide get ` [N]` (the
/// 1-based job number) before the extension, then a counter if that is
/// taken as well.
#[derive(Debug, Default)]
pub struct EntryNames {
    used: HashSet<String>,
}

impl EntryNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, path: &Path, job: JobIndex) -> String {
        let raw = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (stem, ext) = split_name(&raw);
        let stem = sanitize_title(stem);
        let with_ext = |stem: &str| match ext {
            Some(ext) => format!("{stem}.{ext}"),
            None => stem.to_string(),
        };

        let base = with_ext(&stem);
        if self.used.insert(base.clone()) {
            return base;
        }
        let mut attempt = 0usize;
        loop {
            let candidate = if attempt == 0 {
                with_ext(&format!("{stem} [{}]", job.number()))
            } else {
                with_ext(&format!("{stem} [{}-{}]", job.number(), attempt))
            };
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            attempt += 1;
        }
    }
}

fn split_name(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    }
}
