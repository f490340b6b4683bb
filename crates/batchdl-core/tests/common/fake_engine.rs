//! Scripted `FetchEngine` for integration tests.
//!
//! Each URL can be told to succeed (writing a file into the job's
//! destination), fail with a message, succeed without leaving a file, leave a
//! file with a different extension than predicted, or panic. The engine
//! tracks how many fetches run at the same time.

use std::collections::HashMap;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use batchdl_core::control::BatchControl;
use batchdl_core::engine::{FetchEngine, FetchError, FetchOutcome};
use batchdl_core::job::JobSpec;
use batchdl_core::progress::ProgressSink;

#[derive(Debug, Clone)]
pub enum Script {
    /// Write `<title>.<format ext>` and predict the same path.
    Succeed,
    /// Predict `<title>.<predicted>` but leave `<title>.<written>` on disk.
    PostProcess { predicted: String, written: String },
    /// Report success without writing anything.
    NoOutput,
    Fail(String),
    Panic,
}

pub struct FakeEngine {
    scripts: HashMap<String, Script>,
    default: Script,
    titles: HashMap<String, String>,
    delay: Duration,
    abort_on_fetch: Option<BatchControl>,
    active: AtomicUsize,
    max_active: AtomicUsize,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            default: Script::Succeed,
            titles: HashMap::new(),
            delay: Duration::ZERO,
            abort_on_fetch: None,
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_default(mut self, script: Script) -> Self {
        self.default = script;
        self
    }

    pub fn script(mut self, url: &str, script: Script) -> Self {
        self.scripts.insert(url.to_string(), script);
        self
    }

    pub fn fail(self, url: &str, message: &str) -> Self {
        self.script(url, Script::Fail(message.to_string()))
    }

    pub fn title(mut self, url: &str, title: &str) -> Self {
        self.titles.insert(url.to_string(), title.to_string());
        self
    }

    /// Trip `control` as soon as the first fetch starts.
    pub fn abort_on_fetch(mut self, control: BatchControl) -> Self {
        self.abort_on_fetch = Some(control);
        self
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }

    fn title_for(&self, url: &str) -> String {
        self.titles.get(url).cloned().unwrap_or_else(|| {
            url.rsplit('/')
                .find(|s| !s.is_empty())
                .unwrap_or("clip")
                .to_string()
        })
    }
}

impl FetchEngine for FakeEngine {
    fn fetch(
        &self,
        job: &JobSpec,
        progress: &mut dyn ProgressSink,
    ) -> Result<FetchOutcome, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(job.url.clone());
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        let _guard = ActiveGuard(&self.active);

        if let Some(control) = &self.abort_on_fetch {
            control.abort();
        }

        let script = self.scripts.get(&job.url).unwrap_or(&self.default).clone();
        let step = self.delay / 3;
        for percent in [10.0, 55.0, 100.0] {
            thread::sleep(step);
            progress.report(Some(percent), "downloading");
        }

        let title = self.title_for(&job.url);
        let ext = job.format.extension().to_string();
        match script {
            Script::Succeed => {
                let path = job.destination.join(format!("{title}.{ext}"));
                fs::write(&path, job.url.as_bytes())?;
                Ok(FetchOutcome {
                    title,
                    predicted_path: path,
                })
            }
            Script::PostProcess { predicted, written } => {
                progress.report(None, "post-processing");
                fs::write(job.destination.join(format!("{title}.{written}")), b"audio")?;
                Ok(FetchOutcome {
                    predicted_path: job.destination.join(format!("{title}.{predicted}")),
                    title,
                })
            }
            Script::NoOutput => Ok(FetchOutcome {
                predicted_path: job.destination.join(format!("{title}.{ext}")),
                title,
            }),
            Script::Fail(message) => Err(FetchError::Engine(message)),
            Script::Panic => panic!("engine crashed on {}", job.url),
        }
    }
}
