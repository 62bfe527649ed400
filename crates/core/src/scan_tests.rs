// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn new_scan() -> Scan {
    Scan::new(
        ScanId::new("scan-1"),
        "example.com scan",
        ScanConfig::new("example.com", "DOMAIN_NAME"),
        1_000,
    )
}

#[test]
fn legal_path_to_finished() {
    let mut scan = new_scan();
    scan.transition(ScanStatus::Starting, 1_001).unwrap();
    scan.transition(ScanStatus::Running, 1_002).unwrap();
    scan.transition(ScanStatus::Finishing, 1_003).unwrap();
    scan.transition(ScanStatus::Finished, 1_004).unwrap();
    assert_eq!(scan.status, ScanStatus::Finished);
    assert_eq!(scan.started_at_ms, Some(1_001));
    assert_eq!(scan.ended_at_ms, Some(1_004));
}

#[test]
fn legal_path_to_aborted() {
    let mut scan = new_scan();
    scan.transition(ScanStatus::Starting, 1_001).unwrap();
    scan.transition(ScanStatus::Running, 1_002).unwrap();
    scan.transition(ScanStatus::Aborting, 1_003).unwrap();
    scan.transition(ScanStatus::Aborted, 1_004).unwrap();
    assert!(scan.status.is_terminal());
}

#[test]
fn illegal_transition_rejected() {
    let mut scan = new_scan();
    let err = scan.transition(ScanStatus::Finished, 1_001).unwrap_err();
    assert_eq!(err.from, ScanStatus::Created);
    assert_eq!(err.to, ScanStatus::Finished);
    assert_eq!(scan.status, ScanStatus::Created);
}

#[test]
fn error_failed_reachable_from_any_nonterminal_state() {
    for status in [
        ScanStatus::Created,
        ScanStatus::Starting,
        ScanStatus::Running,
        ScanStatus::Aborting,
        ScanStatus::Finishing,
    ] {
        assert!(status.can_transition_to(ScanStatus::ErrorFailed));
    }
    assert!(!ScanStatus::Finished.can_transition_to(ScanStatus::ErrorFailed));
}

#[test]
fn ended_at_set_iff_terminal() {
    let mut scan = new_scan();
    scan.transition(ScanStatus::Starting, 1_001).unwrap();
    assert_eq!(scan.ended_at_ms, None);
    scan.transition(ScanStatus::ErrorFailed, 1_002).unwrap();
    assert_eq!(scan.ended_at_ms, Some(1_002));
}

#[test]
fn only_running_accepts_publish_after_starting() {
    assert!(!ScanStatus::Created.accepts_publish());
    assert!(ScanStatus::Starting.accepts_publish());
    assert!(ScanStatus::Running.accepts_publish());
    assert!(!ScanStatus::Finishing.accepts_publish());
}
