// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scan identifier, lifecycle state machine, and frozen configuration.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

crate::define_id! {
    /// Unique identifier for a scan.
    pub struct ScanId;
}

/// Legal lifecycle states for a scan. See the transition table in
/// [`ScanStatus::can_transition_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    Created,
    Starting,
    Running,
    Aborting,
    Finishing,
    Finished,
    Aborted,
    ErrorFailed,
}

impl ScanStatus {
    /// Terminal states never transition further.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ScanStatus::Finished | ScanStatus::Aborted | ScanStatus::ErrorFailed
        )
    }

    /// Whether the bus should currently accept publishes for a scan in
    /// this state.
    pub fn accepts_publish(&self) -> bool {
        matches!(self, ScanStatus::Starting | ScanStatus::Running)
    }

    /// Validate a transition against the legal state graph (§4.4).
    ///
    /// `ErrorFailed` is reachable from any non-terminal state (unrecoverable
    /// engine error), so it is special-cased rather than listed per-row.
    pub fn can_transition_to(&self, next: ScanStatus) -> bool {
        use ScanStatus::*;
        if next == ErrorFailed {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (Created, Starting)
                | (Starting, Running)
                | (Running, Aborting)
                | (Running, Finishing)
                | (Aborting, Aborted)
                | (Finishing, Finished)
        )
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScanStatus::Created => "created",
            ScanStatus::Starting => "starting",
            ScanStatus::Running => "running",
            ScanStatus::Aborting => "aborting",
            ScanStatus::Finishing => "finishing",
            ScanStatus::Finished => "finished",
            ScanStatus::Aborted => "aborted",
            ScanStatus::ErrorFailed => "error_failed",
        };
        write!(f, "{s}")
    }
}

/// Attempted a transition that is not in the legal state graph.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("illegal scan transition: {from} -> {to}")]
pub struct IllegalScanTransition {
    pub from: ScanStatus,
    pub to: ScanStatus,
}

/// Per-plug-in option map, validated and frozen at STARTING.
pub type ModuleOptions = HashMap<String, String>;

/// Configuration snapshot taken at scan creation and frozen at STARTING.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    pub target_value: String,
    pub target_type: String,
    /// Explicit module set, or empty to have the resolver derive one from
    /// `requested_outputs`.
    pub module_set: HashSet<String>,
    pub requested_outputs: HashSet<String>,
    pub module_options: HashMap<String, ModuleOptions>,
    pub required_node_tags: HashSet<String>,
}

impl ScanConfig {
    pub fn new(target_value: impl Into<String>, target_type: impl Into<String>) -> Self {
        Self {
            target_value: target_value.into(),
            target_type: target_type.into(),
            module_set: HashSet::new(),
            requested_outputs: HashSet::new(),
            module_options: HashMap::new(),
            required_node_tags: HashSet::new(),
        }
    }
}

/// Running counters maintained for the lifetime of a scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanMetrics {
    pub events_produced: u64,
    pub errors: u64,
    pub retries: u64,
    pub dead_lettered: u64,
}

/// The owning context for a run of plug-ins against one target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scan {
    pub scan_id: ScanId,
    pub name: String,
    pub status: ScanStatus,
    pub config: ScanConfig,
    /// Resolved plug-in identifiers; fixed at STARTING, immutable thereafter.
    pub module_set: HashSet<String>,
    pub metrics: ScanMetrics,
    pub created_at_ms: u64,
    pub started_at_ms: Option<u64>,
    pub ended_at_ms: Option<u64>,
}

impl Scan {
    pub fn new(scan_id: ScanId, name: impl Into<String>, config: ScanConfig, now_ms: u64) -> Self {
        Self {
            scan_id,
            name: name.into(),
            status: ScanStatus::Created,
            config,
            module_set: HashSet::new(),
            metrics: ScanMetrics::default(),
            created_at_ms: now_ms,
            started_at_ms: None,
            ended_at_ms: None,
        }
    }

    /// Apply a validated transition, stamping `started_at`/`ended_at` as the
    /// invariants in §3 require (`ended_at` set iff status is terminal).
    pub fn transition(
        &mut self,
        next: ScanStatus,
        now_ms: u64,
    ) -> Result<(), IllegalScanTransition> {
        if !self.status.can_transition_to(next) {
            return Err(IllegalScanTransition {
                from: self.status,
                to: next,
            });
        }
        if next == ScanStatus::Starting {
            self.started_at_ms = Some(now_ms);
        }
        if next.is_terminal() {
            self.ended_at_ms = Some(now_ms);
        }
        self.status = next;
        Ok(())
    }
}

#[cfg(test)]
#[path = "scan_tests.rs"]
mod tests;
