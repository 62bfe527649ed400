// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use scanforge_core::{Event, EventId, ScanId, WorkItemId};
use std::time::Instant;

fn item(n: u64, priority: Priority) -> WorkItem {
    let event = Event::root(
        EventId::new(format!("ev-{n}")),
        ScanId::new("scan-1"),
        "ROOT",
        "example.com",
        1_000,
    );
    WorkItem::new(WorkItemId::new(format!("wi-{n}")), "plugin-a", event, priority)
}

fn default_queue(policy: BackpressurePolicy) -> ScanQueue {
    ScanQueue::new(
        LaneConfig { capacity: 3, weight: 4 },
        LaneConfig { capacity: 3, weight: 2 },
        LaneConfig { capacity: 3, weight: 1 },
        policy,
        policy,
        policy,
    )
}

#[test]
fn fair_share_dequeue_visits_every_nonempty_lane_within_one_cycle() {
    let mut q = default_queue(BackpressurePolicy::Reject);
    q.try_enqueue(item(1, Priority::Low)).unwrap();
    q.try_enqueue(item(2, Priority::High)).unwrap();

    // HIGH has weight 4 but only one item; once drained, LOW must still
    // surface within the same 7-slot cycle rather than starving forever.
    let mut seen = Vec::new();
    while let Some(wi) = q.dequeue() {
        seen.push(wi.id.0.clone());
    }
    assert_eq!(seen, vec!["wi-2", "wi-1"]);
}

#[test]
fn reject_policy_fails_fast_when_lane_full() {
    let mut q = default_queue(BackpressurePolicy::Reject);
    for n in 0..3 {
        q.try_enqueue(item(n, Priority::Normal)).unwrap();
    }
    let err = q.try_enqueue(item(99, Priority::Normal)).unwrap_err();
    assert!(matches!(err, QueueError::QueueFull(Priority::Normal)));
}

#[test]
fn drop_oldest_evicts_and_admits_new_item() {
    let mut q = default_queue(BackpressurePolicy::DropOldest);
    for n in 1..=4 {
        let evicted = q.try_enqueue(item(n, Priority::Normal)).unwrap();
        if n == 4 {
            let evicted = evicted.expect("fourth insert evicts the first");
            assert_eq!(evicted.item.id.0, "wi-1");
            assert_eq!(evicted.lane, Priority::Normal);
        } else {
            assert!(evicted.is_none());
        }
    }
    assert_eq!(q.lane_len(Priority::Normal), 3);
    let remaining: Vec<_> = std::iter::from_fn(|| q.dequeue()).map(|i| i.id.0).collect();
    assert_eq!(remaining, vec!["wi-2", "wi-3", "wi-4"]);
}

#[test]
fn block_policy_times_out_when_nothing_drains_the_lane() {
    let mut q = default_queue(BackpressurePolicy::Block {
        deadline: Duration::from_millis(20),
    });
    for n in 0..3 {
        q.try_enqueue(item(n, Priority::High)).unwrap();
    }

    let clock_base = Instant::now();
    let offset = std::cell::Cell::new(Duration::ZERO);
    let now = || clock_base + offset.get();
    let sleep = |d: Duration| offset.set(offset.get() + d);

    let err = q
        .enqueue_blocking(item(99, Priority::High), now, sleep)
        .unwrap_err();
    assert!(matches!(err, QueueError::EnqueueTimeout(Priority::High)));
}

#[test]
fn pressure_reflects_total_used_over_total_capacity() {
    let mut q = default_queue(BackpressurePolicy::Reject);
    assert_eq!(q.pressure(), 0.0);
    q.try_enqueue(item(1, Priority::High)).unwrap();
    // 1 used out of 3 lanes * 3 capacity = 9
    assert!((q.pressure() - (1.0 / 9.0)).abs() < 1e-9);
}

#[test]
fn pressure_callback_fires_once_per_upward_crossing() {
    let mut q = default_queue(BackpressurePolicy::Reject);
    let hits = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let recorded = hits.clone();
    q.register_pressure_callback(
        4.0 / 9.0,
        Box::new(move |pressure| recorded.lock().unwrap().push(pressure)),
    );

    // 3 of 9 slots used: below the 4/9 threshold, no callback yet.
    for n in 0..3 {
        q.try_enqueue(item(n, Priority::High)).unwrap();
    }
    assert!(hits.lock().unwrap().is_empty());

    // Crossing to 4/9 fires exactly once, even though more items keep the
    // pressure at or above the threshold.
    q.try_enqueue(item(3, Priority::Normal)).unwrap();
    q.try_enqueue(item(4, Priority::Normal)).unwrap();
    assert_eq!(hits.lock().unwrap().len(), 1);

    // Draining back under the threshold re-arms the callback for the next
    // crossing.
    q.dequeue();
    q.dequeue();
    q.dequeue();
    q.try_enqueue(item(5, Priority::Low)).unwrap();
    q.try_enqueue(item(6, Priority::Low)).unwrap();
    assert_eq!(hits.lock().unwrap().len(), 2);
}
