// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queued handler invocations and the priority lane they travel on.

use crate::event::Event;
use crate::scan::ScanId;
use serde::{Deserialize, Serialize};
use std::fmt;

crate::define_id! {
    /// Unique identifier for a queued work item.
    pub struct WorkItemId;
}

/// The three scan-queue lanes, also used as the resolver/telemetry priority
/// signal (e.g. work items downgraded under CPU/wall-budget pressure).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Normal,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Normal, Priority::Low];

    /// Default fair-share lane weight (4:2:1, see §4.6).
    pub fn default_weight(&self) -> u32 {
        match self {
            Priority::High => 4,
            Priority::Normal => 2,
            Priority::Low => 1,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
        };
        write!(f, "{s}")
    }
}

/// Lifecycle of a queued work item: CREATED -> IN_FLIGHT -> {COMPLETED,
/// RETRY_SCHEDULED, DEAD_LETTERED}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemStatus {
    Created,
    InFlight,
    Completed,
    RetryScheduled,
    DeadLettered,
}

/// A queued invocation of one plug-in's handler against one event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: WorkItemId,
    pub scan_id: ScanId,
    pub plugin_name: String,
    pub event: Event,
    pub priority: Priority,
    pub attempt: u32,
    pub status: WorkItemStatus,
}

impl WorkItem {
    pub fn new(id: WorkItemId, plugin_name: impl Into<String>, event: Event, priority: Priority) -> Self {
        let scan_id = event.scan_id.clone();
        Self {
            id,
            scan_id,
            plugin_name: plugin_name.into(),
            event,
            priority,
            attempt: 1,
            status: WorkItemStatus::Created,
        }
    }

    /// Build the next attempt of this item, incrementing the attempt counter
    /// and resetting it to `Created` so it can be re-enqueued by the retry
    /// layer (default lane is LOW, see §4.8).
    pub fn next_attempt(&self, priority: Priority) -> Self {
        Self {
            id: self.id.clone(),
            scan_id: self.scan_id.clone(),
            plugin_name: self.plugin_name.clone(),
            event: self.event.clone(),
            priority,
            attempt: self.attempt + 1,
            status: WorkItemStatus::Created,
        }
    }
}

#[cfg(test)]
#[path = "work_item_tests.rs"]
mod tests;
