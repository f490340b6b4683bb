use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::job::{MediaFormat, MediaKind, Quality};

/// Global configuration loaded from `~/.config/batchdl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Default number of concurrent downloads (clamped to 1..=10 at submit).
    pub max_concurrency: usize,
    /// Where downloads land; `None` means the current directory.
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    #[serde(default)]
    pub media_kind: MediaKind,
    #[serde(default)]
    pub quality: Quality,
    /// Container for video downloads (None = mp4).
    #[serde(default)]
    pub video_format: Option<MediaFormat>,
    /// Codec for audio downloads (None = mp3).
    #[serde(default)]
    pub audio_format: Option<MediaFormat>,
    /// Executable used as the fetch engine.
    pub engine_program: PathBuf,
    /// Number of past batches kept in the session history.
    pub history_limit: usize,
    /// Stop admitting new jobs after this many seconds (None = no deadline).
    #[serde(default)]
    pub deadline_secs: Option<u64>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 3,
            download_dir: None,
            media_kind: MediaKind::Video,
            quality: Quality::Best,
            video_format: None,
            audio_format: None,
            engine_program: PathBuf::from("yt-dlp"),
            history_limit: 5,
            deadline_secs: None,
        }
    }
}

impl BatchConfig {
    /// Preferred format for `kind`, if one is configured.
    pub fn format_for(&self, kind: MediaKind) -> Option<MediaFormat> {
        match kind {
            MediaKind::Video => self.video_format,
            MediaKind::Audio => self.audio_format,
        }
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }

    pub fn download_dir_or_cwd(&self) -> Result<PathBuf> {
        match &self.download_dir {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir().context("current directory"),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("batchdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<BatchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = BatchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: BatchConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = BatchConfig::default();
        assert_eq!(cfg.max_concurrency, 3);
        assert_eq!(cfg.history_limit, 5);
        assert_eq!(cfg.media_kind, MediaKind::Video);
        assert_eq!(cfg.quality, Quality::Best);
        assert_eq!(cfg.engine_program, PathBuf::from("yt-dlp"));
        assert!(cfg.deadline().is_none());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = BatchConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: BatchConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.max_concurrency, cfg.max_concurrency);
        assert_eq!(parsed.history_limit, cfg.history_limit);
        assert_eq!(parsed.engine_program, cfg.engine_program);
        assert_eq!(parsed.media_kind, cfg.media_kind);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            max_concurrency = 6
            engine_program = "/usr/local/bin/yt-dlp"
            history_limit = 10
            media_kind = "audio"
            quality = "720p"
            audio_format = "flac"
            download_dir = "/srv/media"
            deadline_secs = 600
        "#;
        let cfg: BatchConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.max_concurrency, 6);
        assert_eq!(cfg.history_limit, 10);
        assert_eq!(cfg.media_kind, MediaKind::Audio);
        assert_eq!(cfg.quality, Quality::P720);
        assert_eq!(cfg.format_for(MediaKind::Audio), Some(MediaFormat::Flac));
        assert_eq!(cfg.format_for(MediaKind::Video), None);
        assert_eq!(cfg.download_dir, Some(PathBuf::from("/srv/media")));
        assert_eq!(cfg.deadline(), Some(Duration::from_secs(600)));
    }

    #[test]
    fn config_toml_optional_sections_default() {
        let toml = r#"
            max_concurrency = 2
            engine_program = "yt-dlp"
            history_limit = 5
        "#;
        let cfg: BatchConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.media_kind, MediaKind::Video);
        assert!(cfg.download_dir.is_none());
        assert!(cfg.video_format.is_none());
        assert!(cfg.deadline_secs.is_none());
    }
}
