//! `batchdl download` – run one batch with live progress.

use anyhow::{Context, Result};
use batchdl_core::aggregate::write_archive;
use batchdl_core::config::BatchConfig;
use batchdl_core::engine::{FetchEngine, YtDlp};
use batchdl_core::history::{BatchRecord, History};
use batchdl_core::job::{JobIndex, JobState, MediaFormat, MediaKind, Quality};
use batchdl_core::progress::ProgressStore;
use batchdl_core::session::{BatchReport, BatchSession};
use batchdl_core::validate::BatchRequest;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::format_size;

const PROGRESS_INTERVAL_MS: u64 = 500;

/// `--json` output: the batch report plus the session history.
#[derive(Serialize)]
struct JsonOutput<'a> {
    #[serde(flatten)]
    report: &'a BatchReport,
    history: Vec<&'a BatchRecord>,
}

/// Flags of the `download` subcommand.
#[derive(Debug)]
pub struct DownloadOptions {
    pub urls: Vec<String>,
    pub file: Option<PathBuf>,
    pub kind: Option<MediaKind>,
    pub quality: Option<Quality>,
    pub format: Option<MediaFormat>,
    pub jobs: Option<usize>,
    pub dir: Option<PathBuf>,
    pub archive: Option<PathBuf>,
    pub deadline: Option<u64>,
    pub json: bool,
}

pub async fn run_download(cfg: &BatchConfig, opts: DownloadOptions) -> Result<()> {
    let mut urls = opts.urls;
    if let Some(path) = &opts.file {
        urls.extend(read_url_list(path)?);
    }

    let destination = match opts.dir {
        Some(dir) => dir,
        None => cfg.download_dir_or_cwd()?,
    };
    fs::create_dir_all(&destination)
        .with_context(|| format!("create download directory {}", destination.display()))?;

    let kind = opts.kind.unwrap_or(cfg.media_kind);
    let request = BatchRequest {
        urls,
        kind,
        quality: opts.quality.unwrap_or(cfg.quality),
        format: opts.format.or(cfg.format_for(kind)),
        max_concurrency: opts.jobs.unwrap_or(cfg.max_concurrency),
        destination,
        deadline: opts.deadline.map(Duration::from_secs).or(cfg.deadline()),
    };

    let engine = YtDlp::new(&cfg.engine_program);
    engine.check_available().context("media fetch engine")?;
    let mut session = BatchSession::new(Arc::new(engine), cfg.history_limit);

    let control = session.control();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("interrupted: letting running downloads finish, starting no new ones");
            control.abort();
        }
    });

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let poller = (!opts.json).then(|| tokio::spawn(print_progress(session.progress(), stop_rx)));

    let outcome = session.submit(request).await;
    interrupt.abort();
    let _ = stop_tx.send(());
    if let Some(poller) = poller {
        let _ = poller.await;
    }
    let report = outcome?;

    if opts.json {
        let output = JsonOutput {
            report: &report,
            history: session.history().records().collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_report(&report);
        let history = history_lines(session.history());
        if !history.is_empty() {
            println!();
            println!("RECENT DOWNLOADS");
            for line in history {
                println!("{line}");
            }
        }
    }

    if let Some(path) = &opts.archive {
        let written = write_archive(&session.retrievable_files(), path)
            .with_context(|| format!("write archive {}", path.display()))?;
        if written {
            eprintln!("archive written to {}", path.display());
        } else {
            eprintln!("no downloaded files to archive");
        }
    }
    Ok(())
}

/// URLs from a file, or from stdin when `path` is "-".
fn read_url_list(path: &Path) -> Result<Vec<String>> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read URLs from stdin")?;
        buf
    } else {
        fs::read_to_string(path).with_context(|| format!("read URL list {}", path.display()))?
    };
    Ok(BatchRequest::parse_urls(&text))
}

/// Polls the store and prints a line for every job whose status changed,
/// until `stop` fires.
async fn print_progress(store: ProgressStore, mut stop: tokio::sync::oneshot::Receiver<()>) {
    let mut interval = tokio::time::interval(Duration::from_millis(PROGRESS_INTERVAL_MS));
    let mut shown: BTreeMap<JobIndex, (JobState, u32, String)> = BTreeMap::new();
    loop {
        tokio::select! {
            _ = &mut stop => break,
            _ = interval.tick() => {}
        }
        for (job, status) in store.snapshot() {
            let line = (status.state, status.percent as u32, status.message.clone());
            if shown.get(&job) == Some(&line) {
                continue;
            }
            println!(
                "  {:<5} {:<12} {:>5.1}%  {}",
                job.to_string(),
                status.state.as_str(),
                status.percent,
                status.message
            );
            shown.insert(job, line);
        }
    }
}

fn print_report(report: &BatchReport) {
    println!();
    println!("{:<5} {:<8} {:<40} {}", "JOB", "STATE", "TITLE", "MESSAGE");
    for r in &report.results {
        println!(
            "{:<5} {:<8} {:<40} {}",
            r.index.to_string(),
            r.state.as_str(),
            truncate(r.display_name(), 40),
            r.message
        );
    }
    for rejected in &report.rejected {
        println!("{:<5} {:<8} {:<40} {}", "-", "rejected", truncate(&rejected.url, 40), rejected.reason);
    }

    let s = &report.summary;
    println!();
    println!(
        "{} submitted: {} succeeded, {} warning(s), {} failed",
        s.total, s.success, s.warning, s.error
    );
    if let Some(failure) = &report.failure {
        println!("{failure}");
    }

    if !report.files.is_empty() {
        println!();
        println!("{:<10} {}", "SIZE", "FILE");
        for f in &report.files {
            println!("{:<10} {}", format_size(f.size), f.path.display());
        }
    }
}

/// History panel: one header per batch, newest first, then a line per
/// downloaded item with its title and URL.
pub(crate) fn history_lines(history: &History) -> Vec<String> {
    let mut lines = Vec::new();
    for record in history.records() {
        if record.entries.is_empty() {
            continue;
        }
        lines.push(format!(
            "{} {} ({}/{} succeeded)",
            record.started_at.format("%Y-%m-%d %H:%M:%S"),
            record.kind,
            record.summary.success,
            record.summary.total
        ));
        for entry in &record.entries {
            lines.push(format!("  {}  {}", truncate(&entry.title, 40), entry.url));
        }
    }
    lines
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
