// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scanner node registry entities for the distribution coordinator.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

crate::define_id! {
    /// Unique identifier for a scanner node.
    #[derive(Default)]
    pub struct NodeId;
}

/// Health as derived from heartbeat recency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeHealth {
    Healthy,
    Degraded,
    Unreachable,
}

impl fmt::Display for NodeHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeHealth::Healthy => "healthy",
            NodeHealth::Degraded => "degraded",
            NodeHealth::Unreachable => "unreachable",
        };
        write!(f, "{s}")
    }
}

/// One process instance participating in a multi-node deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerNode {
    pub node_id: NodeId,
    pub endpoint: String,
    pub capacity: u32,
    pub current_load: u32,
    pub tags: HashSet<String>,
    pub last_heartbeat_ms: u64,
    pub health: NodeHealth,
    /// Consecutive heartbeats missed; resets to 0 on a fresh heartbeat.
    pub missed_heartbeats: u32,
}

impl ScannerNode {
    pub fn new(node_id: NodeId, endpoint: impl Into<String>, capacity: u32, now_ms: u64) -> Self {
        Self {
            node_id,
            endpoint: endpoint.into(),
            capacity,
            current_load: 0,
            tags: HashSet::new(),
            last_heartbeat_ms: now_ms,
            health: NodeHealth::Healthy,
            missed_heartbeats: 0,
        }
    }

    /// Fractional load used by the LEAST_LOADED placement strategy.
    /// An empty-capacity node is treated as fully loaded so it is never
    /// preferred.
    pub fn load_fraction(&self) -> f64 {
        if self.capacity == 0 {
            1.0
        } else {
            self.current_load as f64 / self.capacity as f64
        }
    }

    pub fn has_tags(&self, required: &HashSet<String>) -> bool {
        required.is_subset(&self.tags)
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
