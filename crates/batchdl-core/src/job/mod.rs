//! Job model: immutable job specs, media kinds, quality and format preferences,
//! plus the mutable per-job status and the terminal per-job result.

mod state;

pub use state::{JobResult, JobState, JobStatus, ResultState};
pub(crate) use state::clamp_percent;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Stable identity of a job inside one batch: its 0-based submission position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobIndex(pub usize);

impl JobIndex {
    /// 1-based number for display ("item 1/3").
    pub fn number(self) -> usize {
        self.0 + 1
    }
}

impl fmt::Display for JobIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.number())
    }
}

/// Error for unknown kind/quality/format names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {what} '{value}'")]
pub struct ParseValueError {
    pub what: &'static str,
    pub value: String,
}

impl ParseValueError {
    fn new(what: &'static str, value: &str) -> Self {
        Self {
            what,
            value: value.to_string(),
        }
    }
}

/// What the user wants out of the remote media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Video,
    Audio,
}

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mkv"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "wav", "flac"];

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        }
    }

    /// File extensions (lowercase, no dot) accepted as output of this kind.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            MediaKind::Video => VIDEO_EXTENSIONS,
            MediaKind::Audio => AUDIO_EXTENSIONS,
        }
    }

    /// True if `ext` (any case, no dot) is an accepted extension for this kind.
    pub fn accepts_extension(self, ext: &str) -> bool {
        self.extensions()
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(ext))
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" => Ok(MediaKind::Video),
            "audio" => Ok(MediaKind::Audio),
            _ => Err(ParseValueError::new("media kind", s)),
        }
    }
}

/// Quality preference. For video it caps the frame height; for audio it picks
/// the encoder quality level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Quality {
    #[default]
    #[serde(rename = "best")]
    Best,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "360p")]
    P360,
    #[serde(rename = "worst")]
    Worst,
}

impl Quality {
    pub fn as_str(self) -> &'static str {
        match self {
            Quality::Best => "best",
            Quality::P1080 => "1080p",
            Quality::P720 => "720p",
            Quality::P480 => "480p",
            Quality::P360 => "360p",
            Quality::Worst => "worst",
        }
    }

    /// Maximum frame height, if this preference caps it.
    pub fn max_height(self) -> Option<u32> {
        match self {
            Quality::P1080 => Some(1080),
            Quality::P720 => Some(720),
            Quality::P480 => Some(480),
            Quality::P360 => Some(360),
            Quality::Best | Quality::Worst => None,
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.trim_end_matches('p') {
            "best" => Ok(Quality::Best),
            "1080" => Ok(Quality::P1080),
            "720" => Ok(Quality::P720),
            "480" => Ok(Quality::P480),
            "360" => Ok(Quality::P360),
            "worst" => Ok(Quality::Worst),
            _ => Err(ParseValueError::new("quality", s)),
        }
    }
}

/// Container or codec the output should end up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFormat {
    Mp4,
    Webm,
    Mkv,
    Mp3,
    M4a,
    Wav,
    Flac,
}

impl MediaFormat {
    /// Extension written by the engine for this format (no dot).
    pub fn extension(self) -> &'static str {
        match self {
            MediaFormat::Mp4 => "mp4",
            MediaFormat::Webm => "webm",
            MediaFormat::Mkv => "mkv",
            MediaFormat::Mp3 => "mp3",
            MediaFormat::M4a => "m4a",
            MediaFormat::Wav => "wav",
            MediaFormat::Flac => "flac",
        }
    }

    pub fn kind(self) -> MediaKind {
        match self {
            MediaFormat::Mp4 | MediaFormat::Webm | MediaFormat::Mkv => MediaKind::Video,
            MediaFormat::Mp3 | MediaFormat::M4a | MediaFormat::Wav | MediaFormat::Flac => {
                MediaKind::Audio
            }
        }
    }

    /// Format used when the request does not name one.
    pub fn default_for(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Video => MediaFormat::Mp4,
            MediaKind::Audio => MediaFormat::Mp3,
        }
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for MediaFormat {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "mp4" => Ok(MediaFormat::Mp4),
            "webm" => Ok(MediaFormat::Webm),
            "mkv" => Ok(MediaFormat::Mkv),
            "mp3" => Ok(MediaFormat::Mp3),
            "m4a" => Ok(MediaFormat::M4a),
            "wav" => Ok(MediaFormat::Wav),
            "flac" => Ok(MediaFormat::Flac),
            _ => Err(ParseValueError::new("format", s)),
        }
    }
}

/// Immutable input for one job. Built once at batch submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSpec {
    pub index: JobIndex,
    pub url: String,
    pub kind: MediaKind,
    pub quality: Quality,
    pub format: MediaFormat,
    /// Directory the engine writes into; shared by every job of the batch.
    pub destination: PathBuf,
}
