//! CLI for batchdl.

mod commands;

use anyhow::Result;
use batchdl_core::config;
use batchdl_core::job::{MediaFormat, MediaKind, Quality};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{run_archive, run_config, run_download, run_list, DownloadOptions};

/// Top-level CLI for batchdl.
#[derive(Debug, Parser)]
#[command(name = "batchdl")]
#[command(about = "batchdl: concurrent batch video/audio downloads", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download a batch of URLs concurrently.
    Download {
        /// Media URLs (http/https).
        urls: Vec<String>,
        /// Read more URLs from a file, one per line ("-" for stdin).
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
        /// video or audio (default from config).
        #[arg(long)]
        kind: Option<MediaKind>,
        /// best, 1080p, 720p, 480p, 360p or worst.
        #[arg(long)]
        quality: Option<Quality>,
        /// Output format: mp4/webm/mkv for video, mp3/m4a/wav/flac for audio.
        #[arg(long)]
        format: Option<MediaFormat>,
        /// Concurrent downloads, 1 to 10 (default from config).
        #[arg(long, short = 'j', value_name = "N")]
        jobs: Option<usize>,
        /// Destination directory (default from config, else current directory).
        #[arg(long, value_name = "PATH")]
        dir: Option<PathBuf>,
        /// Also write a zip of every downloaded file to PATH.
        #[arg(long, value_name = "PATH")]
        archive: Option<PathBuf>,
        /// Stop starting new downloads after SECS seconds.
        #[arg(long, value_name = "SECS")]
        deadline: Option<u64>,
        /// Print the batch report as JSON instead of tables.
        #[arg(long)]
        json: bool,
    },

    /// List media files in a directory.
    List {
        #[arg(long, value_name = "PATH")]
        dir: Option<PathBuf>,
        /// Only video or only audio files.
        #[arg(long)]
        kind: Option<MediaKind>,
    },

    /// Zip the media files in a directory.
    Archive {
        /// Path of the zip file to write.
        output: PathBuf,
        #[arg(long, value_name = "PATH")]
        dir: Option<PathBuf>,
        #[arg(long)]
        kind: Option<MediaKind>,
    },

    /// Show the config file path and effective settings.
    Config,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Download {
                urls,
                file,
                kind,
                quality,
                format,
                jobs,
                dir,
                archive,
                deadline,
                json,
            } => {
                let opts = DownloadOptions {
                    urls,
                    file,
                    kind,
                    quality,
                    format,
                    jobs,
                    dir,
                    archive,
                    deadline,
                    json,
                };
                run_download(&cfg, opts).await?;
            }
            CliCommand::List { dir, kind } => {
                let dir = match dir {
                    Some(dir) => dir,
                    None => cfg.download_dir_or_cwd()?,
                };
                run_list(&dir, kind)?;
            }
            CliCommand::Archive { output, dir, kind } => {
                let dir = match dir {
                    Some(dir) => dir,
                    None => cfg.download_dir_or_cwd()?,
                };
                run_archive(&output, &dir, kind)?;
            }
            CliCommand::Config => run_config(&cfg)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
