// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn node(id: &str, capacity: u32, current_load: u32, tags: &[&str]) -> ScannerNode {
    let mut n = ScannerNode::new(NodeId::new(id), format!("{id}:9000"), capacity, 0);
    n.current_load = current_load;
    n.tags = tags.iter().map(|s| s.to_string()).collect();
    n
}

#[test]
fn least_loaded_picks_the_smallest_fraction() {
    let placer = Placer::new();
    let candidates = vec![node("a", 10, 8, &[]), node("b", 10, 2, &[]), node("c", 10, 5, &[])];

    let chosen = placer.place(PlacementStrategy::LeastLoaded, &candidates, &HashSet::new(), &ScanId::new("scan-1"));
    assert_eq!(chosen, Some(NodeId::new("b")));
}

#[test]
fn least_loaded_breaks_ties_by_lowest_node_id() {
    let placer = Placer::new();
    let candidates = vec![node("zeta", 10, 5, &[]), node("alpha", 10, 5, &[])];

    let chosen = placer.place(PlacementStrategy::LeastLoaded, &candidates, &HashSet::new(), &ScanId::new("scan-1"));
    assert_eq!(chosen, Some(NodeId::new("alpha")));
}

#[test]
fn round_robin_rotates_across_calls() {
    let placer = Placer::new();
    let candidates = vec![node("a", 10, 0, &[]), node("b", 10, 0, &[])];
    let scan_id = ScanId::new("scan-1");

    let first = placer.place(PlacementStrategy::RoundRobin, &candidates, &HashSet::new(), &scan_id);
    let second = placer.place(PlacementStrategy::RoundRobin, &candidates, &HashSet::new(), &scan_id);
    assert_ne!(first, second);
}

#[test]
fn hash_based_is_deterministic_for_the_same_scan_id() {
    let placer = Placer::new();
    let candidates = vec![node("a", 10, 0, &[]), node("b", 10, 0, &[]), node("c", 10, 0, &[])];
    let scan_id = ScanId::new("scan-fixed");

    let first = placer.place(PlacementStrategy::HashBased, &candidates, &HashSet::new(), &scan_id);
    let second = placer.place(PlacementStrategy::HashBased, &candidates, &HashSet::new(), &scan_id);
    assert_eq!(first, second);
}

#[test]
fn tag_filter_restricts_the_candidate_pool() {
    let placer = Placer::new();
    let candidates = vec![node("a", 10, 0, &["gpu"]), node("b", 10, 0, &[])];
    let required: HashSet<String> = ["gpu".to_string()].into_iter().collect();

    let chosen = placer.place(PlacementStrategy::LeastLoaded, &candidates, &required, &ScanId::new("scan-1"));
    assert_eq!(chosen, Some(NodeId::new("a")));
}

#[test]
fn no_eligible_candidate_returns_none() {
    let placer = Placer::new();
    let candidates = vec![node("a", 10, 0, &[])];
    let required: HashSet<String> = ["gpu".to_string()].into_iter().collect();

    let chosen = placer.place(PlacementStrategy::LeastLoaded, &candidates, &required, &ScanId::new("scan-1"));
    assert_eq!(chosen, None);
}

#[test]
fn random_always_returns_one_of_the_eligible_candidates() {
    let placer = Placer::new();
    let candidates = vec![node("a", 10, 0, &[]), node("b", 10, 0, &[])];

    let chosen = placer.place(PlacementStrategy::Random, &candidates, &HashSet::new(), &ScanId::new("scan-1")).expect("a node is chosen");
    assert!(chosen == NodeId::new("a") || chosen == NodeId::new("b"));
}
