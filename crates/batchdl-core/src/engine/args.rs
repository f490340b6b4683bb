//! Command-line arguments for one yt-dlp invocation.

use crate::job::{JobSpec, MediaKind, Quality};

use super::parse::{FILE_MARKER, PHASE_MARKER, PROGRESS_MARKER};

/// Output naming template relative to the destination directory.
pub(super) const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Builds the full argument list (without the program itself) for `job`.
pub(super) fn build_args(job: &JobSpec) -> Vec<String> {
    let output = job.destination.join(OUTPUT_TEMPLATE);
    let mut args = vec![
        job.url.clone(),
        "--output".to_string(),
        output.to_string_lossy().into_owned(),
        "--no-playlist".to_string(),
        "--newline".to_string(),
        "--progress".to_string(),
        "--progress-template".to_string(),
        format!("download:{PROGRESS_MARKER}%(progress._percent_str)s"),
        "--no-simulate".to_string(),
        "--print".to_string(),
        format!("before_dl:{FILE_MARKER}%(title)s\t%(filename)s"),
        "--print".to_string(),
        format!("post_process:{PHASE_MARKER}post-processing"),
        "--windows-filenames".to_string(),
    ];
    args.extend(format_args(job));
    args
}

fn format_args(job: &JobSpec) -> Vec<String> {
    let ext = job.format.extension().to_string();
    match job.kind {
        MediaKind::Video => vec![
            "-f".to_string(),
            video_selector(job.quality),
            "--merge-output-format".to_string(),
            ext.clone(),
            "--remux-video".to_string(),
            ext,
        ],
        MediaKind::Audio => vec![
            "-f".to_string(),
            audio_selector(job.quality).to_string(),
            "--extract-audio".to_string(),
            "--audio-format".to_string(),
            ext,
            "--audio-quality".to_string(),
            audio_quality(job.quality).to_string(),
        ],
    }
}

fn video_selector(quality: Quality) -> String {
    match (quality, quality.max_height()) {
        (Quality::Worst, _) => "wv*+wa/w".to_string(),
        (_, Some(h)) => format!("bv*[height<={h}]+ba/b[height<={h}]"),
        (_, None) => "bv*+ba/b".to_string(),
    }
}

fn audio_selector(quality: Quality) -> &'static str {
    match quality {
        Quality::Worst => "worstaudio/worst",
        _ => "bestaudio/best",
    }
}

/// VBR level passed to the audio encoder: 0 is best, 9 is worst.
fn audio_quality(quality: Quality) -> &'static str {
    match quality {
        Quality::Best | Quality::P1080 => "0",
        Quality::P720 | Quality::P480 => "5",
        Quality::P360 | Quality::Worst => "9",
    }
}
