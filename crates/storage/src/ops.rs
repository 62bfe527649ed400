// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable operations recorded in the write-ahead log.
//!
//! The engine writes one [`WalOp`] per state-changing action before it takes
//! effect (event fan-out, scan transition, error recorded, node heartbeat).
//! [`crate::state::MaterializedState::apply`] is the single place that turns
//! a replayed op into materialized state, so WAL replay and live application
//! use the same code path.

use scanforge_core::{ErrorRecord, Event, EventId, NodeHealth, Scan, ScanId, ScanStatus};
use serde::{Deserialize, Serialize};

/// Severity of a line appended to a scan's durable log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// One free-text line in a scan's durable log, tied to the module that
/// produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanLogLine {
    pub scan_id: ScanId,
    pub module: String,
    pub level: LogLevel,
    pub message: String,
    pub at_ms: u64,
}

/// A single durable state change, as recorded in the WAL.
///
/// Every variant is idempotent to re-apply: applying the same op twice must
/// produce the same [`crate::state::MaterializedState`] as applying it once.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum WalOp {
    /// An event was durably appended to a scan's event log.
    EventAppended { event: Event },
    /// An event already in the log was marked (or unmarked) as a false
    /// positive. Out-of-band: never changes `Event` identity or ordering.
    EventMarkedFalsePositive { scan_id: ScanId, event_id: EventId, value: bool },
    /// A scan was created or its config/name was replaced wholesale.
    ScanUpserted { scan: Box<Scan> },
    /// A scan transitioned to a new lifecycle status.
    ScanStatusChanged { scan_id: ScanId, status: ScanStatus, at_ms: u64 },
    /// A free-text log line was appended for a scan.
    ScanLogAppended { line: ScanLogLine },
    /// An error fingerprint's counters were recorded or bumped.
    ErrorRecorded { record: ErrorRecord },
    /// A scanner node announced itself or renewed its heartbeat.
    NodeHeartbeat { node_id: String, endpoint: String, capacity: u32, tags: Vec<String>, at_ms: u64 },
    /// A scanner node's health was recomputed (e.g. by a missed-heartbeat sweep).
    NodeHealthChanged { node_id: String, health: NodeHealth, missed_heartbeats: u32 },
}

impl WalOp {
    pub fn event_appended(event: Event) -> Self {
        WalOp::EventAppended { event }
    }

    pub fn scan_status_changed(scan_id: ScanId, status: ScanStatus, at_ms: u64) -> Self {
        WalOp::ScanStatusChanged { scan_id, status, at_ms }
    }
}

#[cfg(test)]
#[path = "ops_tests.rs"]
mod tests;
