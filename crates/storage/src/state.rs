// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state built from WAL replay.

use crate::ops::{ScanLogLine, WalOp};
use scanforge_core::{ErrorRecord, Event, EventId, NodeHealth, Scan, ScannerNode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// All durable events for one scan, in WAL order.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ScanEventLog {
    pub events: Vec<Event>,
    /// Event ids marked as false positives out-of-band (see
    /// [`scanforge_core::event::Event`] docs: never a field flip on the
    /// event itself).
    #[serde(default)]
    pub false_positives: std::collections::HashSet<EventId>,
}

/// Materialized state derived from the durable operation log.
///
/// This is the event-sourcing approach: [`WalOp`]s are facts about what
/// happened, state here is derived from those facts.
///
/// # Idempotency Requirement
///
/// **All op handlers MUST be idempotent.** Applying the same op twice must
/// produce the same state as applying it once, because ops may be applied
/// multiple times: once for immediate in-process visibility, and again
/// during WAL replay after a restart.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub scans: HashMap<String, Scan>,
    #[serde(default)]
    pub scan_events: HashMap<String, ScanEventLog>,
    #[serde(default)]
    pub scan_logs: HashMap<String, Vec<ScanLogLine>>,
    #[serde(default)]
    pub error_records: HashMap<String, ErrorRecord>,
    #[serde(default)]
    pub nodes: HashMap<String, ScannerNode>,
}

impl MaterializedState {
    /// Look up a scan by id or unique id prefix.
    pub fn get_scan(&self, id: &str) -> Option<&Scan> {
        if let Some(scan) = self.scans.get(id) {
            return Some(scan);
        }
        let matches: Vec<_> = self.scans.iter().filter(|(k, _)| k.starts_with(id)).collect();
        if matches.len() == 1 {
            Some(matches[0].1)
        } else {
            None
        }
    }

    pub fn list_events(&self, scan_id: &str) -> &[Event] {
        self.scan_events
            .get(scan_id)
            .map(|log| log.events.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_false_positive(&self, scan_id: &str, event_id: &EventId) -> bool {
        self.scan_events
            .get(scan_id)
            .map(|log| log.false_positives.contains(event_id))
            .unwrap_or(false)
    }

    /// Apply a durable op to derive the next state.
    pub fn apply(&mut self, op: &WalOp) {
        match op {
            WalOp::EventAppended { event } => {
                let log = self.scan_events.entry(event.scan_id.to_string()).or_default();
                if !log.events.iter().any(|e| e.event_id == event.event_id) {
                    log.events.push(event.clone());
                }
                if let Some(scan) = self.scans.get_mut(event.scan_id.as_str()) {
                    scan.metrics.events_produced = log.events.len() as u64;
                }
            }
            WalOp::EventMarkedFalsePositive { scan_id, event_id, value } => {
                let log = self.scan_events.entry(scan_id.to_string()).or_default();
                if *value {
                    log.false_positives.insert(event_id.clone());
                } else {
                    log.false_positives.remove(event_id);
                }
            }
            WalOp::ScanUpserted { scan } => {
                self.scans.insert(scan.scan_id.to_string(), (**scan).clone());
            }
            WalOp::ScanStatusChanged { scan_id, status, at_ms } => {
                if let Some(scan) = self.scans.get_mut(scan_id.as_str()) {
                    // Idempotent: re-applying the same transition is a no-op,
                    // and only a legal transition ever mutates state — an
                    // already-materialized illegal one (should never be
                    // written) is silently ignored rather than panicking
                    // during replay.
                    if scan.status != *status {
                        let _ = scan.transition(*status, *at_ms);
                    }
                }
            }
            WalOp::ScanLogAppended { line } => {
                self.scan_logs
                    .entry(line.scan_id.to_string())
                    .or_default()
                    .push(line.clone());
            }
            WalOp::ErrorRecorded { record } => {
                let entry = self
                    .error_records
                    .entry(record.fingerprint.0.clone())
                    .or_insert_with(|| record.clone());
                entry.last_seen_ms = entry.last_seen_ms.max(record.last_seen_ms);
                entry.count = entry.count.max(record.count);
            }
            WalOp::NodeHeartbeat { node_id, endpoint, capacity, tags, at_ms } => {
                let node = self
                    .nodes
                    .entry(node_id.clone())
                    .or_insert_with(|| ScannerNode::new(node_id.as_str().into(), endpoint.clone(), *capacity, *at_ms));
                node.endpoint = endpoint.clone();
                node.capacity = *capacity;
                node.tags = tags.iter().cloned().collect();
                node.last_heartbeat_ms = (*at_ms).max(node.last_heartbeat_ms);
                node.health = NodeHealth::Healthy;
                node.missed_heartbeats = 0;
            }
            WalOp::NodeHealthChanged { node_id, health, missed_heartbeats } => {
                if let Some(node) = self.nodes.get_mut(node_id) {
                    node.health = *health;
                    node.missed_heartbeats = *missed_heartbeats;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
