//! End-to-end runs against a scripted device.

mod common;

use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use route_checker::error::{Error, NormalizeError, StorageError, TransportError};
use route_checker::exit::{codes, failure_code};
use route_checker::{ArtifactWriter, CaptureRun, CaptureTimestamp, RunStage};
use tempfile::TempDir;

use common::{FakeDevice, Reply, login, sessions, target};

const THREE_ROUTES: &str = "\
S    0.0.0.0/0 via 10.0.0.1\r
C    10.0.0.0/24 is directly connected\r
O    192.168.1.0/24 via 10.0.0.1";

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_successful_run_writes_both_files() {
    let dir = TempDir::new().unwrap();
    let run = CaptureRun::new(
        sessions(FakeDevice::answering(THREE_ROUTES)),
        ArtifactWriter::new(dir.path()),
    );

    let report = run.execute(&target()).await.unwrap();

    let codes: Vec<_> = report.entries.iter().map(|e| e.protocol.as_str()).collect();
    assert_eq!(codes, ["S", "C", "O"]);

    let stem = format!("10.1.1.1-{}", report.captured_at.token());
    assert_eq!(files_in(dir.path()), [format!("{stem}.json"), format!("{stem}.log")]);

    let raw = fs::read_to_string(&report.artifacts.raw_path).unwrap();
    assert_eq!(raw, THREE_ROUTES.replace('\r', ""));

    let stored = ArtifactWriter::read_structured(&report.artifacts.structured_path).unwrap();
    assert_eq!(stored, report.entries);
}

#[tokio::test]
async fn test_pager_only_output_gives_empty_list() {
    let dir = TempDir::new().unwrap();
    let mut replies = login();
    replies.push(Reply::Data("show ip route\r\n --More-- "));
    replies.push(Reply::Data("\x08\x08\x08\x08\x08\x08\x08\x08\x08\x08"));
    replies.push(Reply::Data("router#"));
    replies.push(Reply::Silence);

    let run = CaptureRun::new(
        sessions(FakeDevice::scripted(replies)),
        ArtifactWriter::new(dir.path()),
    );
    let report = run.execute(&target()).await.unwrap();

    assert!(report.entries.is_empty());
    assert_eq!(fs::read_to_string(&report.artifacts.structured_path).unwrap(), "[]");
    assert!(report.artifacts.raw_path.exists());
}

#[tokio::test]
async fn test_connection_timeout_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let device = FakeDevice::unreachable(TransportError::Timeout(Duration::from_secs(7)));
    let run = CaptureRun::new(sessions(device), ArtifactWriter::new(dir.path()));

    let failure = run.execute(&target()).await.unwrap_err();

    assert_eq!(failure.stage, RunStage::Connecting);
    assert!(matches!(failure.error, Error::Connection(TransportError::Timeout(_))));
    assert_eq!(failure_code(&failure), codes::CONNECTION_ERROR);
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn test_parse_failure_keeps_raw_file() {
    let dir = TempDir::new().unwrap();
    let device = FakeDevice::answering("S    0.0.0.0/0 [1/0] towards 10.0.0.1");
    let run = CaptureRun::new(sessions(device), ArtifactWriter::new(dir.path()));

    let failure = run.execute(&target()).await.unwrap_err();

    assert_eq!(failure.stage, RunStage::Parsing);
    assert!(matches!(
        failure.error,
        Error::Normalize(NormalizeError::Malformed { line: 1, .. })
    ));
    assert_eq!(failure_code(&failure), codes::UNPARSABLE_OUTPUT);

    let files = files_in(dir.path());
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with(".log"));
}

#[tokio::test]
async fn test_lenient_run_skips_bad_lines() {
    let dir = TempDir::new().unwrap();
    let device = FakeDevice::answering(
        "S    0.0.0.0/0 via 10.0.0.1\r\nS    10.2.0.0/16 [1/0] towards 10.0.0.1",
    );
    let run = CaptureRun::new(sessions(device), ArtifactWriter::new(dir.path())).lenient(true);

    let report = run.execute(&target()).await.unwrap();
    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.skipped, 1);
}

#[tokio::test]
async fn test_structured_collision_leaves_raw_file() {
    let dir = TempDir::new().unwrap();
    let writer = ArtifactWriter::new(dir.path());

    // Occupy every structured name the run could pick in the next few seconds.
    let start = Utc::now() - chrono::Duration::seconds(1);
    for offset in 0..10 {
        let ts = CaptureTimestamp::from_datetime(start + chrono::Duration::seconds(offset));
        fs::write(writer.path_for("10.1.1.1", ts, "json"), "taken").unwrap();
    }

    let run = CaptureRun::new(sessions(FakeDevice::answering(THREE_ROUTES)), writer);
    let failure = run.execute(&target()).await.unwrap_err();

    assert_eq!(failure.stage, RunStage::Persisting);
    assert!(matches!(
        failure.error,
        Error::Storage(StorageError::Collision { .. })
    ));
    assert_eq!(failure_code(&failure), codes::STORAGE_ERROR);

    let logs: Vec<_> = files_in(dir.path())
        .into_iter()
        .filter(|name| name.ends_with(".log"))
        .collect();
    assert_eq!(logs.len(), 1);
}

#[tokio::test]
async fn test_session_closed_on_command_timeout() {
    let dir = TempDir::new().unwrap();
    let device = FakeDevice::scripted(login());
    let closed = device.closed.clone();
    let run = CaptureRun::new(sessions(device), ArtifactWriter::new(dir.path()));

    let failure = run.execute(&target()).await.unwrap_err();

    assert_eq!(failure.stage, RunStage::Capturing);
    assert_eq!(failure_code(&failure), codes::COMMAND_TIMEOUT);
    assert_eq!(*closed.lock().unwrap(), 1);
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn test_echo_without_output_is_not_a_snapshot() {
    let dir = TempDir::new().unwrap();
    let mut replies = login();
    replies.push(Reply::Data("show ip route\r\n"));
    replies.push(Reply::Silence);

    let run = CaptureRun::new(
        sessions(FakeDevice::scripted(replies)),
        ArtifactWriter::new(dir.path()),
    );
    let failure = run.execute(&target()).await.unwrap_err();

    assert_eq!(failure.stage, RunStage::Capturing);
    assert_eq!(failure_code(&failure), codes::COMMAND_TIMEOUT);
    assert!(files_in(dir.path()).is_empty());
}
