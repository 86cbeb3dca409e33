//! End-to-end tests for the watch -> bus -> import pipeline.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{write_file, RecordingReporter};
use csvwatch::app;
use csvwatch::config::{Config, WatchConfig};
use csvwatch::watch::{start_watching, WatchTarget};
use csvwatch_core::events::NotificationBus;
use tokio_util::sync::CancellationToken;

fn config_for(dir: &std::path::Path, delay_ms: u64) -> Config {
    Config {
        name: "test".into(),
        watch: WatchConfig {
            path: dir.to_path_buf(),
            delay_ms,
        },
    }
}

#[tokio::test]
async fn imports_existing_csv_and_reports_other_files() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "people.csv", "name,age\nAlice,30\nBob,25");
    write_file(dir.path(), "notes.txt", "name,age\nAlice,30");
    write_file(dir.path(), "broken.csv", "a,b\n1,2,3\n");

    let reporter = Arc::new(RecordingReporter::default());
    let cancel = CancellationToken::new();
    let run = tokio::spawn(app::run_with_reporter(
        config_for(dir.path(), 50),
        reporter.clone(),
        cancel.clone(),
    ));

    let settled = reporter
        .wait_until(Duration::from_secs(5), |r| {
            r.imported_count() == 1 && r.failure_count() == 2
        })
        .await;
    cancel.cancel();
    let summary = run.await.unwrap().unwrap();

    assert!(settled, "pipeline did not report all three files");
    assert_eq!(summary.events_emitted, 3);

    let imported = reporter.imported.lock();
    assert_eq!(imported[0].records.len(), 2);
    assert_eq!(imported[0].records[0]["name"], "Alice");
    assert_eq!(imported[0].records[0]["age"], "30");
    assert_eq!(imported[0].records[1]["name"], "Bob");
    assert_eq!(imported[0].records[1]["age"], "25");
    assert!(imported[0].source.is_absolute());

    let failures = reporter.failures.lock();
    assert!(failures.iter().any(|f| f.contains("Unsupported format") && f.contains("notes.txt")));
    assert!(failures.iter().any(|f| f.contains("Parse error") && f.contains("broken.csv")));
}

#[tokio::test]
async fn each_file_is_imported_once_across_many_cycles() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.csv", "x\n1");

    let reporter = Arc::new(RecordingReporter::default());
    let cancel = CancellationToken::new();
    let run = tokio::spawn(app::run_with_reporter(
        config_for(dir.path(), 20),
        reporter.clone(),
        cancel.clone(),
    ));

    tokio::time::sleep(Duration::from_millis(300)).await;
    write_file(dir.path(), "b.csv", "x\n2");
    tokio::time::sleep(Duration::from_millis(300)).await;
    cancel.cancel();
    let summary = run.await.unwrap().unwrap();

    assert!(summary.cycles > 5);
    assert_eq!(summary.events_emitted, 2);
    assert_eq!(reporter.imported_count(), 2);
    assert_eq!(reporter.failure_count(), 0);
}

#[tokio::test]
async fn rejected_file_does_not_block_later_imports() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "notes.txt", "name\nAlice");

    let reporter = Arc::new(RecordingReporter::default());
    let cancel = CancellationToken::new();
    let run = tokio::spawn(app::run_with_reporter(
        config_for(dir.path(), 50),
        reporter.clone(),
        cancel.clone(),
    ));

    let rejected = reporter
        .wait_until(Duration::from_secs(5), |r| r.failure_count() == 1)
        .await;
    assert!(rejected, "non-CSV file was not reported");

    write_file(dir.path(), "good.csv", "name\nBob");
    let imported = reporter
        .wait_until(Duration::from_secs(5), |r| r.imported_count() == 1)
        .await;
    cancel.cancel();
    let summary = run.await.unwrap().unwrap();

    assert!(imported, "CSV written after a rejection was not imported");
    assert_eq!(summary.events_emitted, 2);
    assert_eq!(reporter.failure_count(), 1);
    let imported = reporter.imported.lock();
    assert!(imported[0].source.ends_with("good.csv"));
    assert_eq!(imported[0].records[0]["name"], "Bob");
}

#[tokio::test]
async fn missing_directory_is_reported_and_watch_keeps_running() {
    let dir = tempfile::tempdir().unwrap();
    let watched = dir.path().join("later");

    let reporter = Arc::new(RecordingReporter::default());
    let cancel = CancellationToken::new();
    let run = tokio::spawn(app::run_with_reporter(
        config_for(&watched, 30),
        reporter.clone(),
        cancel.clone(),
    ));

    assert!(
        reporter
            .wait_until(Duration::from_secs(2), |r| r.failure_count() >= 2)
            .await
    );

    std::fs::create_dir(&watched).unwrap();
    write_file(&watched, "a.csv", "x\n1");
    let imported = reporter
        .wait_until(Duration::from_secs(2), |r| r.imported_count() == 1)
        .await;
    cancel.cancel();
    let summary = run.await.unwrap().unwrap();

    assert!(imported);
    assert!(summary.failed_cycles >= 2);
    assert!(reporter.failures.lock()[0].contains("Listing error"));
}

#[tokio::test]
async fn zero_delay_fails_startup() {
    let dir = tempfile::tempdir().unwrap();
    let result = app::run(config_for(dir.path(), 0), CancellationToken::new()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn new_files_are_detected_within_poll_interval() {
    let dir = tempfile::tempdir().unwrap();
    let bus = Arc::new(NotificationBus::new());
    let mut sub = bus.subscribe("counter");
    let cancel = CancellationToken::new();

    let target = WatchTarget::new(dir.path(), Duration::from_millis(100)).unwrap();
    let watcher = start_watching(
        target,
        bus.clone(),
        Arc::new(RecordingReporter::default()),
        cancel.clone(),
    );

    let path = dir.path().to_path_buf();
    let writer = tokio::spawn(async move {
        for i in 0..4 {
            write_file(&path, &format!("{i}.csv"), "x\n1");
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
    });

    tokio::time::sleep(Duration::from_millis(500)).await;
    let mut seen = Vec::new();
    while let Some(event) = sub.try_recv() {
        seen.push(event.filename);
    }
    cancel.cancel();
    writer.await.unwrap();
    watcher.await.unwrap();

    assert!(seen.len() >= 3, "only saw {seen:?}");
    let mut unique = seen.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), seen.len());
}

#[tokio::test]
async fn two_subscribers_both_receive_every_event() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.csv", "x\n1");
    write_file(dir.path(), "b.csv", "x\n2");

    let bus = Arc::new(NotificationBus::new());
    let mut first = bus.subscribe("first");
    let mut second = bus.subscribe("second");

    let target = WatchTarget::new(dir.path(), Duration::from_millis(50)).unwrap();
    let mut poller = csvwatch::watch::Poller::new(
        target,
        bus.clone(),
        Arc::new(RecordingReporter::default()),
    );
    poller.poll_once().await.unwrap();
    poller.poll_once().await.unwrap();

    for sub in [&mut first, &mut second] {
        let mut names = Vec::new();
        while let Some(event) = sub.try_recv() {
            names.push(event.filename);
        }
        names.sort();
        assert_eq!(names, vec!["a.csv", "b.csv"]);
    }
}
