// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scan-to-node placement strategies (§4.7).

use scanforge_core::{NodeId, ScanId, ScannerNode};
use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementStrategy {
    LeastLoaded,
    RoundRobin,
    HashBased,
    Random,
}

/// Picks a target node for a scan among the HEALTHY nodes whose tags are a
/// superset of the scan's required tags. Holds the round-robin cursor so
/// repeated calls rotate rather than always landing on the first eligible
/// node.
#[derive(Default)]
pub struct Placer {
    round_robin_cursor: AtomicUsize,
}

impl Placer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` when no candidate satisfies the tag filter.
    pub fn place(
        &self,
        strategy: PlacementStrategy,
        candidates: &[ScannerNode],
        required_tags: &HashSet<String>,
        scan_id: &ScanId,
    ) -> Option<NodeId> {
        let mut eligible: Vec<&ScannerNode> = candidates.iter().filter(|n| n.has_tags(required_tags)).collect();
        if eligible.is_empty() {
            return None;
        }
        eligible.sort_by(|a, b| a.node_id.as_str().cmp(b.node_id.as_str()));

        match strategy {
            PlacementStrategy::LeastLoaded => eligible
                .into_iter()
                .min_by(|a, b| a.load_fraction().partial_cmp(&b.load_fraction()).unwrap_or(std::cmp::Ordering::Equal))
                .map(|n| n.node_id.clone()),
            PlacementStrategy::RoundRobin => {
                let idx = self.round_robin_cursor.fetch_add(1, Ordering::SeqCst) % eligible.len();
                Some(eligible[idx].node_id.clone())
            }
            PlacementStrategy::HashBased => {
                let mut hasher = DefaultHasher::new();
                scan_id.as_str().hash(&mut hasher);
                let idx = (hasher.finish() as usize) % eligible.len();
                Some(eligible[idx].node_id.clone())
            }
            PlacementStrategy::Random => {
                use rand::Rng;
                let idx = rand::rng().random_range(0..eligible.len());
                Some(eligible[idx].node_id.clone())
            }
        }
    }
}

#[cfg(test)]
#[path = "placement_tests.rs"]
mod tests;
