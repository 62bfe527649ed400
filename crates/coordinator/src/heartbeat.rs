// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic node-health evaluation loop (§4.7).

use crate::node_registry::NodeRegistry;
use scanforge_core::{Clock, NodeId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy)]
pub struct HeartbeatConfig {
    /// Expected gap between two heartbeats from the same node.
    pub interval: Duration,
    /// Consecutive missed heartbeats before a node is UNREACHABLE.
    pub missed_threshold: u32,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self { interval: Duration::from_secs(10), missed_threshold: 3 }
    }
}

/// Drives `NodeRegistry::evaluate_health` on a timer and surfaces nodes
/// that just went UNREACHABLE so the failover layer can act on them.
pub struct HeartbeatMonitor {
    registry: Arc<NodeRegistry>,
    clock: Arc<dyn Clock>,
    config: HeartbeatConfig,
}

impl HeartbeatMonitor {
    pub fn new(registry: Arc<NodeRegistry>, clock: Arc<dyn Clock>, config: HeartbeatConfig) -> Self {
        Self { registry, clock, config }
    }

    /// One evaluation pass, exposed standalone so tests (and callers on an
    /// externally driven schedule) don't need the `run` loop.
    pub fn tick(&self) -> Vec<NodeId> {
        let unreachable =
            self.registry.evaluate_health(self.clock.now_wall_ms(), self.config.interval.as_millis() as u64, self.config.missed_threshold);
        for node_id in &unreachable {
            tracing::warn!(node_id = %node_id, "node marked unreachable");
        }
        unreachable
    }

    /// Ticks every `config.interval` until cancelled, forwarding newly
    /// unreachable node ids to `tx`.
    pub async fn run(&self, tx: mpsc::Sender<NodeId>, cancellation: CancellationToken) {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.config.interval) => {
                    for node_id in self.tick() {
                        if tx.send(node_id).await.is_err() {
                            return;
                        }
                    }
                }
                _ = cancellation.cancelled() => return,
            }
        }
    }
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
