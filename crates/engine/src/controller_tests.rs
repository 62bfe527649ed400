// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use scanforge_core::{FakeClock, ScanConfig};
use scanforge_storage::FileStorageBackend;
use tempfile::tempdir;

fn controller(dir: &std::path::Path, clock: FakeClock, quiet_window: Duration, abort_grace: Duration) -> (ScanController, Scan) {
    let storage: Arc<dyn StorageBackend> = Arc::new(FileStorageBackend::open(dir).expect("open backend"));
    let bus = BusHandle::new(Arc::clone(&storage), 16, Duration::from_secs(1), 32);
    let scan_id = ScanId::new("scan-1");
    let scan = Scan::new(scan_id.clone(), "test", ScanConfig::new("example.com", "DOMAIN_NAME"), clock.now_wall_ms());
    let controller = ScanController::new(scan_id, Arc::new(clock), storage, bus, quiet_window, abort_grace);
    (controller, scan)
}

#[test]
fn start_drives_created_to_running() {
    let dir = tempdir().expect("tempdir");
    let (controller, scan) = controller(dir.path(), FakeClock::new(), Duration::from_secs(1), Duration::from_secs(1));
    controller.register(&scan).expect("register");

    controller.start().expect("start");
    assert_eq!(controller.status(), ScanStatus::Running);
}

#[test]
fn is_quiescent_requires_the_full_quiet_window_to_elapse() {
    let dir = tempdir().expect("tempdir");
    let clock = FakeClock::new();
    let (controller, scan) = controller(dir.path(), clock.clone(), Duration::from_secs(2), Duration::from_secs(30));
    controller.register(&scan).expect("register");
    controller.start().expect("start");

    controller.work_started();
    controller.work_finished();
    assert!(!controller.is_quiescent(true), "quiet window has not elapsed yet");

    clock.advance(Duration::from_secs(2));
    assert!(controller.is_quiescent(true));
}

#[test]
fn new_work_resets_the_quiet_window() {
    let dir = tempdir().expect("tempdir");
    let clock = FakeClock::new();
    let (controller, scan) = controller(dir.path(), clock.clone(), Duration::from_secs(2), Duration::from_secs(30));
    controller.register(&scan).expect("register");
    controller.start().expect("start");

    controller.work_started();
    controller.work_finished();
    clock.advance(Duration::from_secs(1));
    controller.work_started();
    controller.work_finished();
    clock.advance(Duration::from_secs(1));

    assert!(!controller.is_quiescent(true), "the second completion should have reset the window");
}

#[test]
fn is_quiescent_is_false_while_the_queue_still_has_items() {
    let dir = tempdir().expect("tempdir");
    let clock = FakeClock::new();
    let (controller, scan) = controller(dir.path(), clock.clone(), Duration::from_secs(1), Duration::from_secs(30));
    controller.register(&scan).expect("register");
    controller.start().expect("start");
    controller.work_started();
    controller.work_finished();
    clock.advance(Duration::from_secs(2));

    assert!(!controller.is_quiescent(false));
    assert!(controller.is_quiescent(true));
}

#[test]
fn finish_transitions_through_finishing_to_finished() {
    let dir = tempdir().expect("tempdir");
    let (controller, scan) = controller(dir.path(), FakeClock::new(), Duration::from_secs(1), Duration::from_secs(1));
    controller.register(&scan).expect("register");
    controller.start().expect("start");

    controller.finish().expect("finish");
    assert_eq!(controller.status(), ScanStatus::Finished);
}

#[tokio::test]
async fn abort_cancels_the_token_and_reaches_aborted_once_work_drains() {
    let dir = tempdir().expect("tempdir");
    let (controller, scan) = controller(dir.path(), FakeClock::new(), Duration::from_secs(1), Duration::from_millis(200));
    controller.register(&scan).expect("register");
    controller.start().expect("start");

    controller.abort().await.expect("abort");
    assert_eq!(controller.status(), ScanStatus::Aborted);
    assert!(controller.cancellation.is_cancelled());
}

#[tokio::test]
async fn abort_does_not_exceed_its_grace_period_even_with_stuck_work() {
    let dir = tempdir().expect("tempdir");
    let (controller, scan) = controller(dir.path(), FakeClock::new(), Duration::from_secs(1), Duration::from_millis(50));
    controller.register(&scan).expect("register");
    controller.start().expect("start");
    controller.work_started(); // never finishes: simulates a stuck handler

    let started = std::time::Instant::now();
    controller.abort().await.expect("abort");
    assert!(started.elapsed() < Duration::from_secs(2), "abort must bound shutdown time to abort_grace");
    assert_eq!(controller.status(), ScanStatus::Aborted);
}

#[test]
fn fail_reaches_error_failed_from_running() {
    let dir = tempdir().expect("tempdir");
    let (controller, scan) = controller(dir.path(), FakeClock::new(), Duration::from_secs(1), Duration::from_secs(1));
    controller.register(&scan).expect("register");
    controller.start().expect("start");

    controller.fail().expect("fail");
    assert_eq!(controller.status(), ScanStatus::ErrorFailed);
}
