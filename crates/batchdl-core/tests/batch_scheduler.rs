//! Integration tests: scheduler + resolver + aggregation against a scripted
//! engine writing into a real temporary directory.

mod common;

use std::collections::BTreeSet;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use batchdl_core::aggregate::{list_retrievable_files, package_archive, summarize};
use batchdl_core::control::{BatchControl, ABORTED_BEFORE_START};
use batchdl_core::job::{JobIndex, JobState, MediaKind, ResultState};
use batchdl_core::progress::ProgressStore;
use batchdl_core::scheduler::{BatchError, JobScheduler};
use common::fake_engine::{FakeEngine, Script};
use tempfile::tempdir;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_job_yields_exactly_one_result() {
    let dir = tempdir().unwrap();
    let urls = common::urls(&["a", "b", "c", "d", "e", "f", "g"]);
    let engine = FakeEngine::new()
        .fail(&urls[1], "ERROR: [generic] Unsupported URL")
        .script(&urls[3], Script::NoOutput)
        .script(&urls[5], Script::Panic);
    let scheduler = JobScheduler::new(Arc::new(engine), ProgressStore::new());

    let results = scheduler
        .run(common::jobs(&urls, MediaKind::Video, dir.path()), 3)
        .await
        .unwrap();

    assert_eq!(results.len(), urls.len());
    let indices: BTreeSet<JobIndex> = results.iter().map(|r| r.index).collect();
    assert_eq!(indices, (0..urls.len()).map(JobIndex).collect());

    let summary = summarize(&results);
    assert_eq!(summary.total, 7);
    assert_eq!(summary.success, 4);
    assert_eq!(summary.warning, 1);
    assert_eq!(summary.error, 2);

    let snapshot = scheduler.store().snapshot();
    assert_eq!(snapshot.len(), urls.len());
    assert!(snapshot.values().all(|s| s.state.is_terminal()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrency_bound_is_never_exceeded() {
    let dir = tempdir().unwrap();
    let urls = common::urls(&["a", "b", "c", "d", "e", "f", "g", "h"]);
    let engine = Arc::new(FakeEngine::new().with_delay(Duration::from_millis(60)));
    let store = ProgressStore::new();
    let scheduler = JobScheduler::new(engine.clone(), store.clone());

    let done = Arc::new(AtomicBool::new(false));
    let max_seen = Arc::new(AtomicUsize::new(0));
    let poller = {
        let (done, max_seen, store) = (done.clone(), max_seen.clone(), store.clone());
        tokio::spawn(async move {
            while !done.load(Ordering::SeqCst) {
                max_seen.fetch_max(store.active_count(), Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
    };

    let results = scheduler
        .run(common::jobs(&urls, MediaKind::Video, dir.path()), 2)
        .await
        .unwrap();
    done.store(true, Ordering::SeqCst);
    poller.await.unwrap();

    assert_eq!(results.len(), 8);
    assert!(results.iter().all(|r| r.state == ResultState::Success));
    assert_eq!(engine.max_active(), 2, "both slots should have been used");
    assert!(max_seen.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn fetch_error_is_contained_and_message_kept() {
    let dir = tempdir().unwrap();
    let urls = common::urls(&["ok", "gone"]);
    let message = "ERROR: [youtube] gone: Video unavailable";
    let engine = FakeEngine::new().fail(&urls[1], message);
    let store = ProgressStore::new();
    let scheduler = JobScheduler::new(Arc::new(engine), store.clone());

    let results = scheduler
        .run(common::jobs(&urls, MediaKind::Video, dir.path()), 2)
        .await
        .unwrap();

    let failed = results.iter().find(|r| r.index == JobIndex(1)).unwrap();
    assert_eq!(failed.state, ResultState::Error);
    assert_eq!(failed.message, message);
    assert!(failed.output.is_none());
    assert_eq!(store.get(JobIndex(1)).unwrap().state, JobState::Error);

    let files = list_retrievable_files(&results);
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].job, Some(JobIndex(0)));
}

#[tokio::test]
async fn success_without_file_is_a_warning() {
    let dir = tempdir().unwrap();
    let urls = common::urls(&["phantom"]);
    let engine = FakeEngine::new().with_default(Script::NoOutput);
    let store = ProgressStore::new();
    let scheduler = JobScheduler::new(Arc::new(engine), store.clone());

    let results = scheduler
        .run(common::jobs(&urls, MediaKind::Video, dir.path()), 1)
        .await
        .unwrap();

    assert_eq!(results[0].state, ResultState::Warning);
    assert!(results[0].message.contains("phantom"));
    assert_eq!(store.get(JobIndex(0)).unwrap().state, JobState::Warning);
    assert!(list_retrievable_files(&results).is_empty());
}

#[tokio::test]
async fn audio_post_processing_resolves_to_real_file() {
    let dir = tempdir().unwrap();
    let urls = common::urls(&["watch"]);
    let engine = FakeEngine::new().title(&urls[0], "My Video").script(
        &urls[0],
        Script::PostProcess {
            predicted: "mp4".into(),
            written: "mp3".into(),
        },
    );
    let scheduler = JobScheduler::new(Arc::new(engine), ProgressStore::new());

    let results = scheduler
        .run(common::jobs(&urls, MediaKind::Audio, dir.path()), 1)
        .await
        .unwrap();

    assert_eq!(results[0].state, ResultState::Success);
    assert_eq!(results[0].title.as_deref(), Some("My Video"));
    assert_eq!(results[0].output, Some(dir.path().join("My Video.mp3")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn three_urls_one_failure_archive_has_two_entries() {
    let dir = tempdir().unwrap();
    let urls = common::urls(&["first", "broken", "third"]);
    let engine = FakeEngine::new()
        .with_delay(Duration::from_millis(15))
        .fail(&urls[1], "ERROR: unable to download webpage");
    let scheduler = JobScheduler::new(Arc::new(engine), ProgressStore::new());

    let results = scheduler
        .run(common::jobs(&urls, MediaKind::Video, dir.path()), 2)
        .await
        .unwrap();

    let summary = summarize(&results);
    assert_eq!((summary.success, summary.warning, summary.error), (2, 0, 1));

    let files = list_retrievable_files(&results);
    assert_eq!(files.len(), 2);
    assert_eq!(files, list_retrievable_files(&results), "listing is stable");

    let bytes = package_archive(&files).unwrap().expect("archive");
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    assert_eq!(archive.len(), 2);
    let mut names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["first.mp4", "third.mp4"]);
}

#[tokio::test]
async fn abort_before_run_admits_nothing() {
    let dir = tempdir().unwrap();
    let urls = common::urls(&["a", "b", "c"]);
    let engine = Arc::new(FakeEngine::new());
    let control = BatchControl::new();
    control.abort();
    let store = ProgressStore::new();
    let scheduler = JobScheduler::new(engine.clone(), store.clone()).with_control(control);

    let results = scheduler
        .run(common::jobs(&urls, MediaKind::Video, dir.path()), 2)
        .await
        .unwrap();

    assert_eq!(engine.calls(), 0);
    assert_eq!(results.len(), 3);
    for r in &results {
        assert_eq!(r.state, ResultState::Error);
        assert_eq!(r.message, ABORTED_BEFORE_START);
    }
    assert!(store.snapshot().values().all(|s| s.state == JobState::Error));
}

#[tokio::test]
async fn elapsed_deadline_admits_nothing() {
    let dir = tempdir().unwrap();
    let urls = common::urls(&["a", "b"]);
    let engine = Arc::new(FakeEngine::new());
    let scheduler = JobScheduler::new(engine.clone(), ProgressStore::new())
        .with_deadline(Some(Duration::ZERO));

    let results = scheduler
        .run(common::jobs(&urls, MediaKind::Video, dir.path()), 2)
        .await
        .unwrap();

    assert_eq!(engine.calls(), 0);
    assert!(results.iter().all(|r| r.message == ABORTED_BEFORE_START));
    assert!(scheduler.control().is_aborted());
}

#[tokio::test]
async fn abort_mid_batch_lets_in_flight_job_finish() {
    let dir = tempdir().unwrap();
    let urls = common::urls(&["a", "b", "c", "d"]);
    let control = BatchControl::new();
    let engine = Arc::new(
        FakeEngine::new()
            .with_delay(Duration::from_millis(30))
            .abort_on_fetch(control.clone()),
    );
    let scheduler = JobScheduler::new(engine.clone(), ProgressStore::new()).with_control(control);

    let mut results = scheduler
        .run(common::jobs(&urls, MediaKind::Video, dir.path()), 1)
        .await
        .unwrap();
    results.sort_by_key(|r| r.index);

    assert_eq!(engine.calls(), 1);
    assert_eq!(results.len(), 4);
    assert_eq!(results[0].state, ResultState::Success);
    assert!(results[1..]
        .iter()
        .all(|r| r.state == ResultState::Error && r.message == ABORTED_BEFORE_START));
}

#[tokio::test]
async fn unlistable_destination_fails_the_batch() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("not-created");
    let urls = common::urls(&["a", "b"]);
    let engine = FakeEngine::new().with_default(Script::NoOutput);
    let scheduler = JobScheduler::new(Arc::new(engine), ProgressStore::new());

    let err = scheduler
        .run(common::jobs(&urls, MediaKind::Video, &missing), 1)
        .await
        .unwrap_err();

    match err {
        BatchError::Destination { path, .. } => assert_eq!(path, missing),
    }
    assert!(scheduler.control().is_aborted(), "admission closed after fatal error");
}

#[tokio::test]
async fn engine_panic_becomes_error_result() {
    let dir = tempdir().unwrap();
    let urls = common::urls(&["boom", "fine"]);
    let engine = FakeEngine::new().script(&urls[0], Script::Panic);
    let scheduler = JobScheduler::new(Arc::new(engine), ProgressStore::new());

    let mut results = scheduler
        .run(common::jobs(&urls, MediaKind::Video, dir.path()), 2)
        .await
        .unwrap();
    results.sort_by_key(|r| r.index);

    assert_eq!(results[0].state, ResultState::Error);
    assert!(results[0].message.starts_with("fetch worker failed"));
    assert_eq!(results[1].state, ResultState::Success);
}

#[tokio::test]
async fn unconverted_audio_is_a_warning_and_never_retrievable() {
    let dir = tempdir().unwrap();
    let urls = common::urls(&["song"]);
    let engine = FakeEngine::new().title(&urls[0], "Song").script(
        &urls[0],
        Script::PostProcess {
            predicted: "webm".into(),
            written: "webm".into(),
        },
    );
    let scheduler = JobScheduler::new(Arc::new(engine), ProgressStore::new());

    let results = scheduler
        .run(common::jobs(&urls, MediaKind::Audio, dir.path()), 1)
        .await
        .unwrap();

    assert_eq!(results[0].state, ResultState::Warning);
    assert!(dir.path().join("Song.webm").exists());
    let files = list_retrievable_files(&results);
    assert!(files.is_empty(), "a video container is not a finished audio file");
    assert_eq!(package_archive(&files).unwrap(), None);
}
