// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scanner node registry: heartbeat ingestion and health derivation (§4.7).

use parking_lot::RwLock;
use scanforge_core::{NodeHealth, NodeId, ScannerNode};
use std::collections::{HashMap, HashSet};

/// In-memory registry of scanner nodes, keyed by `NodeId`. Health is
/// derived purely from heartbeat recency, never set directly by callers.
#[derive(Default)]
pub struct NodeRegistry {
    nodes: RwLock<HashMap<NodeId, ScannerNode>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a heartbeat, creating the node on first contact. Always
    /// resets health to `Healthy` and `missed_heartbeats` to zero — a node
    /// that is heartbeating is by definition reachable, even if it had
    /// previously been marked degraded or unreachable.
    pub fn heartbeat(
        &self,
        node_id: NodeId,
        endpoint: impl Into<String>,
        capacity: u32,
        current_load: u32,
        tags: HashSet<String>,
        now_ms: u64,
    ) {
        let mut nodes = self.nodes.write();
        let node = nodes.entry(node_id.clone()).or_insert_with(|| ScannerNode::new(node_id, endpoint.into(), capacity, now_ms));
        node.capacity = capacity;
        node.current_load = current_load;
        node.tags = tags;
        node.last_heartbeat_ms = now_ms;
        node.health = NodeHealth::Healthy;
        node.missed_heartbeats = 0;
    }

    /// Re-evaluate every node's health against the current time. A node
    /// missing `missed_threshold` consecutive heartbeats (interval
    /// `heartbeat_interval_ms`) is marked `Unreachable`; one missed
    /// heartbeat short of that is `Degraded`. Returns the nodes that
    /// transitioned into `Unreachable` this call, for the caller to drive
    /// failover.
    pub fn evaluate_health(&self, now_ms: u64, heartbeat_interval_ms: u64, missed_threshold: u32) -> Vec<NodeId> {
        let mut newly_unreachable = Vec::new();
        let mut nodes = self.nodes.write();
        for node in nodes.values_mut() {
            let elapsed = now_ms.saturating_sub(node.last_heartbeat_ms);
            let missed = (elapsed / heartbeat_interval_ms.max(1)) as u32;
            node.missed_heartbeats = missed;
            let next_health = if missed >= missed_threshold {
                NodeHealth::Unreachable
            } else if missed >= 1 {
                NodeHealth::Degraded
            } else {
                NodeHealth::Healthy
            };
            if next_health == NodeHealth::Unreachable && node.health != NodeHealth::Unreachable {
                newly_unreachable.push(node.node_id.clone());
            }
            node.health = next_health;
        }
        newly_unreachable
    }

    pub fn get(&self, node_id: &NodeId) -> Option<ScannerNode> {
        self.nodes.read().get(node_id).cloned()
    }

    pub fn healthy_nodes(&self) -> Vec<ScannerNode> {
        self.nodes.read().values().filter(|n| n.health == NodeHealth::Healthy).cloned().collect()
    }

    pub fn all_nodes(&self) -> Vec<ScannerNode> {
        self.nodes.read().values().cloned().collect()
    }

    /// Adjust a node's advertised current load, e.g. after placement or
    /// completion of a scan. Clamped to zero on underflow.
    pub fn adjust_load(&self, node_id: &NodeId, delta: i64) {
        if let Some(node) = self.nodes.write().get_mut(node_id) {
            node.current_load = (node.current_load as i64 + delta).max(0) as u32;
        }
    }
}

#[cfg(test)]
#[path = "node_registry_tests.rs"]
mod tests;
