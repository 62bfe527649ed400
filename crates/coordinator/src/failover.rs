// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scan-to-node reassignment when a node goes UNREACHABLE or misses an
//! assignment deadline (§4.7).

use crate::node_registry::NodeRegistry;
use crate::placement::{Placer, PlacementStrategy};
use scanforge_core::{NodeId, ScanId};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// A scan has missed this many consecutive reassignments; the next missed
/// attempt marks it ERROR-FAILED rather than trying a third node (§4.7).
const MAX_CONSECUTIVE_REASSIGNMENTS: u32 = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FailoverError {
    #[error("no eligible node available for scan {0}")]
    NoEligibleNode(ScanId),
    #[error("scan {0} has missed {1} consecutive reassignments and must be marked ERROR-FAILED")]
    TooManyReassignments(ScanId, u32),
}

#[derive(Debug, Clone)]
struct Assignment {
    node_id: NodeId,
    required_tags: HashSet<String>,
    consecutive_reassignments: u32,
}

/// Tracks which node each in-flight scan is assigned to and re-places a
/// scan's assignment when its node becomes unreachable or misses its
/// deadline. Event re-delivery after failover is safe because the target
/// node resumes from the durable event log and every write is idempotent
/// on `event_id` (§4.7, §4.1).
#[derive(Default)]
pub struct FailoverCoordinator {
    assignments: parking_lot::RwLock<HashMap<ScanId, Assignment>>,
    placer: Placer,
}

impl FailoverCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `scan_id` is now running on `node_id`, resetting its
    /// reassignment streak — a successful placement (initial or recovered)
    /// means the scan is no longer in jeopardy.
    pub fn assign(&self, scan_id: ScanId, node_id: NodeId, required_tags: HashSet<String>) {
        self.assignments.write().insert(scan_id, Assignment { node_id, required_tags, consecutive_reassignments: 0 });
    }

    pub fn assigned_node(&self, scan_id: &ScanId) -> Option<NodeId> {
        self.assignments.read().get(scan_id).map(|a| a.node_id.clone())
    }

    /// Scans currently assigned to `node_id`, to be re-placed after it is
    /// reported UNREACHABLE.
    pub fn scans_on(&self, node_id: &NodeId) -> Vec<ScanId> {
        self.assignments.read().iter().filter(|(_, a)| &a.node_id == node_id).map(|(scan_id, _)| scan_id.clone()).collect()
    }

    /// Re-place one scan, bumping its reassignment streak. Returns the new
    /// node on success; on failure (no eligible node, or the streak breach)
    /// the caller must mark the scan ERROR-FAILED per §4.4/§4.7.
    pub fn reassign(
        &self,
        scan_id: &ScanId,
        registry: &NodeRegistry,
        strategy: PlacementStrategy,
        exclude: &NodeId,
    ) -> Result<NodeId, FailoverError> {
        let required_tags = self.assignments.read().get(scan_id).map(|a| a.required_tags.clone()).unwrap_or_default();

        let candidates: Vec<_> = registry.healthy_nodes().into_iter().filter(|n| &n.node_id != exclude).collect();
        let target = self
            .placer
            .place(strategy, &candidates, &required_tags, scan_id)
            .ok_or_else(|| FailoverError::NoEligibleNode(scan_id.clone()))?;

        let mut assignments = self.assignments.write();
        let entry = assignments.entry(scan_id.clone()).or_insert_with(|| Assignment {
            node_id: target.clone(),
            required_tags: required_tags.clone(),
            consecutive_reassignments: 0,
        });
        entry.consecutive_reassignments += 1;
        if entry.consecutive_reassignments > MAX_CONSECUTIVE_REASSIGNMENTS {
            let count = entry.consecutive_reassignments;
            assignments.remove(scan_id);
            tracing::warn!(scan_id = %scan_id, reassignments = count, "scan exceeded its reassignment budget, marking error-failed");
            return Err(FailoverError::TooManyReassignments(scan_id.clone(), count));
        }
        entry.node_id = target.clone();
        tracing::info!(scan_id = %scan_id, node_id = %target, "scan reassigned");
        Ok(target)
    }

    pub fn remove(&self, scan_id: &ScanId) {
        self.assignments.write().remove(scan_id);
    }
}

#[cfg(test)]
#[path = "failover_tests.rs"]
mod tests;
