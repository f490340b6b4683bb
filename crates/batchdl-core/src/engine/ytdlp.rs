//! `FetchEngine` backed by the yt-dlp executable.

use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{ChildStdout, Command, Stdio};

use url::Url;

use crate::job::JobSpec;
use crate::naming::sanitize_title;
use crate::progress::ProgressSink;

use super::args::build_args;
use super::parse::{last_error_line, parse_line, EngineLine};
use super::{FetchEngine, FetchError, FetchOutcome};

/// Runs one yt-dlp process per job and translates its output.
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

impl YtDlp {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn spawn_error(&self, e: std::io::Error) -> FetchError {
        if e.kind() == std::io::ErrorKind::NotFound {
            FetchError::Unavailable(format!("{} not found on PATH", self.program.display()))
        } else {
            FetchError::Io(e)
        }
    }
}

impl FetchEngine for YtDlp {
    fn fetch(
        &self,
        job: &JobSpec,
        progress: &mut dyn ProgressSink,
    ) -> Result<FetchOutcome, FetchError> {
        let args = build_args(job);
        tracing::debug!(job = %job.index, program = %self.program.display(), ?args, "spawning engine");

        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        // Own process group, so a terminal Ctrl-C only reaches batchdl.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        let mut child = command.spawn().map_err(|e| self.spawn_error(e))?;

        // Drain stderr on its own thread so a chatty engine cannot block on a full pipe.
        let stderr = child.stderr.take();
        let stderr_reader = std::thread::spawn(move || {
            let mut lines = Vec::new();
            if let Some(stderr) = stderr {
                let mut reader = BufReader::new(stderr);
                let mut buf = Vec::new();
                while let Ok(Some(line)) = read_line_lossy(&mut reader, &mut buf) {
                    lines.push(line);
                }
            }
            lines
        });

        let streamed = match child.stdout.take() {
            Some(stdout) => stream_stdout(stdout, job, progress),
            None => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "engine stdout unavailable",
            )),
        };
        let file = match streamed {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!(job = %job.index, error = %e, "engine output unreadable, killing engine");
                if let Err(kill) = child.kill() {
                    tracing::debug!(job = %job.index, error = %kill, "engine kill failed");
                }
                let _ = child.wait();
                let _ = stderr_reader.join();
                return Err(e.into());
            }
        };

        let status = child.wait();
        let stderr_lines = stderr_reader.join().unwrap_or_default();
        let status = status?;

        if !status.success() {
            let message = last_error_line(&stderr_lines)
                .map(str::to_string)
                .unwrap_or_else(|| format!("{} exited with {}", self.program.display(), status));
            return Err(FetchError::Engine(message));
        }

        let (title, predicted_path) = match file {
            Some((title, path)) => (title, PathBuf::from(path)),
            None => {
                let title = title_from_url(&job.url);
                let name = format!("{}.{}", sanitize_title(&title), job.format.extension());
                (title, job.destination.join(name))
            }
        };
        Ok(FetchOutcome {
            title,
            predicted_path,
        })
    }

    fn check_available(&self) -> Result<(), FetchError> {
        let output = Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| self.spawn_error(e))?;
        if !output.status.success() {
            return Err(FetchError::Unavailable(format!(
                "{} --version exited with {}",
                self.program.display(),
                output.status
            )));
        }
        tracing::debug!(
            version = %String::from_utf8_lossy(&output.stdout).trim(),
            "engine available"
        );
        Ok(())
    }
}

/// Feeds every stdout line to `progress`; returns the last reported
/// title and predicted path, if any.
fn stream_stdout(
    stdout: ChildStdout,
    job: &JobSpec,
    progress: &mut dyn ProgressSink,
) -> io::Result<Option<(String, String)>> {
    let mut reader = BufReader::new(stdout);
    let mut buf = Vec::new();
    let mut file = None;
    while let Some(line) = read_line_lossy(&mut reader, &mut buf)? {
        match parse_line(&line) {
            Some(EngineLine::Progress(p)) => progress.report(Some(p), "downloading"),
            Some(EngineLine::Phase(phase)) => progress.report(None, &phase),
            Some(EngineLine::File { title, path }) => {
                tracing::debug!(job = %job.index, %title, %path, "engine predicted output");
                file = Some((title, path));
            }
            None => {}
        }
    }
    Ok(file)
}

/// One line with invalid UTF-8 replaced; titles are arbitrary bytes.
/// `Ok(None)` at end of stream.
fn read_line_lossy(reader: &mut impl BufRead, buf: &mut Vec<u8>) -> io::Result<Option<String>> {
    buf.clear();
    if reader.read_until(b'\n', buf)? == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

/// Stand-in title when the engine never printed one: the last path segment
/// of the URL, or `download`.
fn title_from_url(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.path_segments()?.last().map(str::to_string))
        .filter(|segment| !segment.is_empty())
        .unwrap_or_else(|| "download".to_string())
}
