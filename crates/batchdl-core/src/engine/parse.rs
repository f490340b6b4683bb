//! Parsing of the engine's stdout lines.
//!
//! The engine is asked to print marker-prefixed lines (see `args`), so we
//! only have to recognise our own markers plus a few post-processor tags.

pub(super) const PROGRESS_MARKER: &str = "batchdl-progress:";
pub(super) const FILE_MARKER: &str = "batchdl-file:";
pub(super) const PHASE_MARKER: &str = "batchdl-phase:";

/// Post-processor tags that mean "the download is done, now converting".
const POSTPROCESS_TAGS: &[(&str, &str)] = &[
    ("[ExtractAudio]", "extracting audio"),
    ("[Merger]", "merging formats"),
    ("[VideoConvertor]", "converting video"),
    ("[VideoRemuxer]", "remuxing video"),
    ("[FixupM3u8]", "fixing container"),
];

#[derive(Debug, Clone, PartialEq)]
pub(super) enum EngineLine {
    /// Numeric progress in percent.
    Progress(f64),
    /// Title and predicted output path, printed once before the download.
    File { title: String, path: String },
    /// Textual phase with no percent.
    Phase(String),
}

pub(super) fn parse_line(line: &str) -> Option<EngineLine> {
    let line = line.trim_end_matches(['\r', '\n']);
    if let Some(idx) = line.find(PROGRESS_MARKER) {
        return parse_percent(&line[idx + PROGRESS_MARKER.len()..]).map(EngineLine::Progress);
    }
    if let Some(rest) = line.strip_prefix(FILE_MARKER) {
        let (title, path) = rest.rsplit_once('\t')?;
        if path.trim().is_empty() {
            return None;
        }
        return Some(EngineLine::File {
            title: title.to_string(),
            path: path.to_string(),
        });
    }
    if let Some(rest) = line.strip_prefix(PHASE_MARKER) {
        return Some(EngineLine::Phase(rest.trim().to_string()));
    }
    POSTPROCESS_TAGS
        .iter()
        .find(|(tag, _)| line.starts_with(tag))
        .map(|(_, phase)| EngineLine::Phase((*phase).to_string()))
}

/// Parses `" 45.2%"`; `"N/A"` and garbage yield None.
fn parse_percent(s: &str) -> Option<f64> {
    let end = s.find('%')?;
    let number = s[..end].trim();
    if number == "N/A" {
        return None;
    }
    number.parse::<f64>().ok().map(|p| p.clamp(0.0, 100.0))
}

/// Last `ERROR:` line the engine wrote to stderr, verbatim.
pub(super) fn last_error_line(stderr: &[String]) -> Option<&str> {
    stderr
        .iter()
        .rev()
        .map(|l| l.trim())
        .find(|l| l.starts_with("ERROR:"))
}
