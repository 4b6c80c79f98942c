use std::time::{Duration, Instant};

use calypso_config::{SharedConfig, ToolConfig};
use calypso_core::debug::setup_logging_verbose;
use calypso_launcher::{CaptureWorker, LaunchContext, LaunchError, LaunchMode, LaunchSpec, Launcher};
use crossbeam_channel::RecvTimeoutError;

fn sh(script: &str) -> LaunchSpec {
    LaunchSpec::new("sh", LaunchMode::Captured).args(["-c".to_string(), script.to_string()])
}

fn collect(worker: &CaptureWorker, n: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let deadline = Instant::now() + Duration::from_secs(10);
    while lines.len() < n && Instant::now() < deadline {
        if let Ok(line) = worker.recv_timeout(Duration::from_millis(100)) {
            lines.push(line);
        }
    }
    lines
}

#[test]
fn test_merges_stdout_and_stderr() {
    setup_logging_verbose();
    let mut worker = CaptureWorker::spawn(
        &sh("echo '0911111111\t1001\thello'; echo 'warning on stderr' >&2; echo; exec sleep 30"),
        Duration::from_secs(5),
    )
    .unwrap();

    let mut lines = collect(&worker, 2);
    lines.sort();
    assert_eq!(lines, vec!["0911111111\t1001\thello", "warning on stderr"]);
    assert!(worker.is_running());

    let start = Instant::now();
    let status = worker.stop().unwrap().expect("exit status");
    assert!(!status.success());
    assert!(start.elapsed() < Duration::from_secs(5), "SIGTERM should end it promptly");
    assert!(!worker.is_running());
    // Readers are gone, so the channel disconnects once drained
    assert_eq!(worker.recv_timeout(Duration::from_millis(100)), Err(RecvTimeoutError::Disconnected));
}

#[test]
fn test_kill_after_timeout_when_sigterm_ignored() {
    let mut worker = CaptureWorker::spawn(&sh("trap '' TERM; echo ready; exec sleep 30"), Duration::from_millis(300)).unwrap();
    assert_eq!(collect(&worker, 1), vec!["ready"]);

    let start = Instant::now();
    let status = worker.stop().unwrap().expect("exit status");
    let elapsed = start.elapsed();
    assert!(!status.success());
    assert!(elapsed >= Duration::from_millis(300), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(5), "{elapsed:?}");
}

#[test]
fn test_second_capture_refused() {
    let mut cfg = ToolConfig::default();
    cfg.launcher.capture_stop_timeout = Duration::from_secs(2);
    let shared = SharedConfig::from_config(cfg.clone()).unwrap();
    let mut launcher = Launcher::new(shared, LaunchContext::new(&cfg, None));

    launcher.start_capture_with(&sh("exec sleep 30")).unwrap();
    let err = launcher.start_capture_with(&sh("exec sleep 30")).unwrap_err();
    assert!(matches!(err, LaunchError::AlreadyRunning));

    launcher.stop_capture().unwrap();
    assert!(launcher.capture().is_none());
    // A new capture may start once the old one is stopped
    launcher.start_capture_with(&sh("echo again; exec sleep 30")).unwrap();
    assert_eq!(collect(launcher.capture().unwrap(), 1), vec!["again"]);
    launcher.stop_capture().unwrap();
}

#[test]
fn test_missing_program_is_spawn_error() {
    let spec = LaunchSpec::new("/nonexistent/capture-tool", LaunchMode::Captured);
    let err = CaptureWorker::spawn(&spec, Duration::from_secs(1)).err().expect("must fail");
    assert!(matches!(err, LaunchError::Spawn { .. }));
}
