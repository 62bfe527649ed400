// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use scanforge_core::ScanId;

#[test]
fn wal_op_round_trips_through_json() {
    let op = WalOp::scan_status_changed(ScanId::new("scan-1"), scanforge_core::ScanStatus::Starting, 1_000);
    let json = serde_json::to_string(&op).unwrap();
    let back: WalOp = serde_json::from_str(&json).unwrap();
    match back {
        WalOp::ScanStatusChanged { scan_id, status, at_ms } => {
            assert_eq!(scan_id, "scan-1");
            assert_eq!(status, scanforge_core::ScanStatus::Starting);
            assert_eq!(at_ms, 1_000);
        }
        other => panic!("unexpected variant: {other:?}"),
    }
}

#[test]
fn wal_op_tag_discriminates_variants_in_json() {
    let op = WalOp::event_appended(scanforge_core::Event::root(
        scanforge_core::EventId::new("ev-1"),
        ScanId::new("scan-1"),
        "ROOT",
        "x",
        1_000,
    ));
    let value: serde_json::Value = serde_json::to_value(&op).unwrap();
    assert_eq!(value["op"], "EventAppended");
}
