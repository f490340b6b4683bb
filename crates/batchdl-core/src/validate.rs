//! Batch submission: turn a request (raw identifiers plus preferences) into
//! validated job specs. Rejected identifiers never reach a worker.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::job::{JobIndex, JobSpec, MediaFormat, MediaKind, Quality};

/// Upper bound on concurrent workers; keeps the engine and remote service
/// from being overwhelmed.
pub const MAX_CONCURRENCY: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("please enter at least one URL")]
    EmptyBatch,
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("unsupported URL scheme '{scheme}' in '{url}' (expected http or https)")]
    UnsupportedScheme { url: String, scheme: String },
    #[error("format {format} cannot be produced by a {kind} download")]
    FormatMismatch { format: MediaFormat, kind: MediaKind },
}

/// An identifier that was dropped before scheduling, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedUrl {
    pub url: String,
    pub reason: String,
}

/// What the user submitted.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub urls: Vec<String>,
    pub kind: MediaKind,
    pub quality: Quality,
    /// `None` picks the kind's default format.
    pub format: Option<MediaFormat>,
    pub max_concurrency: usize,
    pub destination: PathBuf,
    /// Stop admitting jobs after this long.
    pub deadline: Option<Duration>,
}

/// Validated jobs plus everything that was rejected.
#[derive(Debug, Clone)]
pub struct ValidatedBatch {
    pub jobs: Vec<JobSpec>,
    pub rejected: Vec<RejectedUrl>,
    /// Concurrency clamped to `1..=MAX_CONCURRENCY`.
    pub max_concurrency: usize,
}

impl BatchRequest {
    pub fn new<I, S>(urls: I, destination: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            kind: MediaKind::default(),
            quality: Quality::default(),
            format: None,
            max_concurrency: 3,
            destination: destination.into(),
            deadline: None,
        }
    }

    /// Splits pasted text into identifiers, one per non-blank line.
    pub fn parse_urls(text: &str) -> Vec<String> {
        text.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Validates every identifier and assigns job indices in submission
    /// order over the accepted ones.
    pub fn validate(&self) -> Result<ValidatedBatch, ValidationError> {
        let format = self.format.unwrap_or(MediaFormat::default_for(self.kind));
        if format.kind() != self.kind {
            return Err(ValidationError::FormatMismatch {
                format,
                kind: self.kind,
            });
        }

        let candidates: Vec<&str> = self
            .urls
            .iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .collect();
        if candidates.is_empty() {
            return Err(ValidationError::EmptyBatch);
        }

        let mut jobs = Vec::with_capacity(candidates.len());
        let mut rejected = Vec::new();
        for raw in candidates {
            match validate_url(raw) {
                Ok(url) => jobs.push(JobSpec {
                    index: JobIndex(jobs.len()),
                    url,
                    kind: self.kind,
                    quality: self.quality,
                    format,
                    destination: self.destination.clone(),
                }),
                Err(e) => {
                    tracing::warn!("rejected before scheduling: {}", e);
                    rejected.push(RejectedUrl {
                        url: raw.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(ValidatedBatch {
            jobs,
            rejected,
            max_concurrency: self.max_concurrency.clamp(1, MAX_CONCURRENCY),
        })
    }
}

/// Accepts absolute http(s) URLs with a host.
pub fn validate_url(raw: &str) -> Result<String, ValidationError> {
    let url = Url::parse(raw).map_err(|e| ValidationError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ValidationError::UnsupportedScheme {
            url: raw.to_string(),
            scheme: url.scheme().to_string(),
        });
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(ValidationError::InvalidUrl {
            url: raw.to_string(),
            reason: "missing host".to_string(),
        });
    }
    Ok(url.to_string())
}
