// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Three-lane priority scan queue with fair-share dequeue and per-lane
//! backpressure (§4.6).

use crate::config::LaneConfig;
use scanforge_core::{Priority, WorkItem};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("enqueue timed out waiting for space in the {0} lane")]
    EnqueueTimeout(Priority),
    #[error("the {0} lane is full")]
    QueueFull(Priority),
}

/// What happens to `enqueue` when a lane is at capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackpressurePolicy {
    /// Block (the caller is expected to poll `try_enqueue` in a loop) until
    /// space frees or `deadline` elapses.
    Block { deadline: Duration },
    /// Fail immediately with `QueueFull`.
    Reject,
    /// Evict the oldest item in the lane into the DLQ and admit the new one.
    DropOldest,
}

struct Lane {
    items: VecDeque<WorkItem>,
    capacity: usize,
    weight: u32,
    policy: BackpressurePolicy,
}

impl Lane {
    fn new(cfg: LaneConfig, policy: BackpressurePolicy) -> Self {
        Self {
            items: VecDeque::new(),
            capacity: cfg.capacity,
            weight: cfg.weight,
            policy,
        }
    }

    fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }
}

/// An item evicted by a `DropOldest` lane, handed to the caller to
/// dead-letter with category `QUEUE_EVICTED`.
pub struct Evicted {
    pub item: WorkItem,
    pub lane: Priority,
}

/// Fired the first time `pressure()` rises to or past a registered
/// threshold; e.g. a controller can switch its lane's policy to `Reject`
/// at 0.9 and back to `Block` once the queue drains (§4.6).
pub type PressureCallback = Box<dyn FnMut(f64) + Send>;

struct PressureWatch {
    threshold: f64,
    callback: PressureCallback,
    armed: bool,
}

/// The bounded, three-lane priority queue described in §4.6.
///
/// Fair-share dequeue is round-robin weighted: `next_lane` is a cursor over
/// a fixed cycle built from each lane's weight, so every non-empty lane is
/// visited within one full cycle and starvation cannot occur.
pub struct ScanQueue {
    high: Lane,
    normal: Lane,
    low: Lane,
    cycle: Vec<Priority>,
    cursor: usize,
    thresholds: Vec<PressureWatch>,
}

impl ScanQueue {
    pub fn new(
        high: LaneConfig,
        normal: LaneConfig,
        low: LaneConfig,
        high_policy: BackpressurePolicy,
        normal_policy: BackpressurePolicy,
        low_policy: BackpressurePolicy,
    ) -> Self {
        let cycle = build_cycle(high.weight, normal.weight, low.weight);
        Self {
            high: Lane::new(high, high_policy),
            normal: Lane::new(normal, normal_policy),
            low: Lane::new(low, low_policy),
            cycle,
            cursor: 0,
            thresholds: Vec::new(),
        }
    }

    /// Register a callback invoked on each upward crossing of `threshold`
    /// (pressure rising from below it to at-or-above it). Re-arms once
    /// pressure falls back under the threshold, so a sustained spike
    /// notifies once per crossing rather than on every mutation.
    pub fn register_pressure_callback(&mut self, threshold: f64, callback: PressureCallback) {
        self.thresholds.push(PressureWatch { threshold, callback, armed: false });
    }

    fn check_thresholds(&mut self) {
        let pressure = self.pressure();
        for watch in &mut self.thresholds {
            if pressure >= watch.threshold {
                if !watch.armed {
                    watch.armed = true;
                    (watch.callback)(pressure);
                }
            } else {
                watch.armed = false;
            }
        }
    }

    fn lane_mut(&mut self, priority: Priority) -> &mut Lane {
        match priority {
            Priority::High => &mut self.high,
            Priority::Normal => &mut self.normal,
            Priority::Low => &mut self.low,
        }
    }

    fn lane(&self, priority: Priority) -> &Lane {
        match priority {
            Priority::High => &self.high,
            Priority::Normal => &self.normal,
            Priority::Low => &self.low,
        }
    }

    /// Attempt to enqueue without blocking. Returns `Ok(None)` on success,
    /// `Ok(Some(evicted))` when a `DropOldest` lane evicted an item, or an
    /// error for `Reject`/expired-`Block` lanes.
    pub fn try_enqueue(&mut self, item: WorkItem) -> Result<Option<Evicted>, QueueError> {
        let priority = item.priority;
        let policy = self.lane(priority).policy;
        if self.lane(priority).is_full() {
            return match policy {
                BackpressurePolicy::Reject => Err(QueueError::QueueFull(priority)),
                BackpressurePolicy::Block { .. } => Err(QueueError::EnqueueTimeout(priority)),
                BackpressurePolicy::DropOldest => {
                    let lane = self.lane_mut(priority);
                    let oldest = lane.items.pop_front();
                    lane.items.push_back(item);
                    self.check_thresholds();
                    Ok(oldest.map(|item| Evicted { item, lane: priority }))
                }
            };
        }
        self.lane_mut(priority).items.push_back(item);
        self.check_thresholds();
        Ok(None)
    }

    /// Enqueue, honoring a `Block` lane's deadline by polling until space
    /// frees or the deadline elapses. A non-`Block` lane behaves exactly
    /// like `try_enqueue`. `sleep` is injected so tests can drive this with
    /// a fake clock instead of real waits.
    pub fn enqueue_blocking(
        &mut self,
        item: WorkItem,
        now: impl Fn() -> Instant,
        mut sleep: impl FnMut(Duration),
    ) -> Result<Option<Evicted>, QueueError> {
        let priority = item.priority;
        let policy = self.lane(priority).policy;
        let deadline = match policy {
            BackpressurePolicy::Block { deadline } => deadline,
            _ => return self.try_enqueue(item),
        };
        let start = now();
        let mut pending = Some(item);
        loop {
            if !self.lane(priority).is_full() {
                let item = pending.take().expect("pending item set on every iteration");
                self.lane_mut(priority).items.push_back(item);
                self.check_thresholds();
                return Ok(None);
            }
            if now().duration_since(start) >= deadline {
                return Err(QueueError::EnqueueTimeout(priority));
            }
            sleep(Duration::from_millis(10));
        }
    }

    /// Dequeue the next item by fair-share weighted round-robin. Probes at
    /// most one full cycle before concluding every lane is empty.
    pub fn dequeue(&mut self) -> Option<WorkItem> {
        if self.cycle.is_empty() {
            return None;
        }
        for _ in 0..self.cycle.len() {
            let priority = self.cycle[self.cursor];
            self.cursor = (self.cursor + 1) % self.cycle.len();
            if let Some(item) = self.lane_mut(priority).items.pop_front() {
                self.check_thresholds();
                return Some(item);
            }
        }
        None
    }

    /// Total capacity across all three lanes.
    pub fn total_capacity(&self) -> usize {
        self.high.capacity + self.normal.capacity + self.low.capacity
    }

    /// Total items currently queued across all three lanes.
    pub fn total_used(&self) -> usize {
        self.high.items.len() + self.normal.items.len() + self.low.items.len()
    }

    /// Pressure signal in `[0, 1]` (§4.6).
    pub fn pressure(&self) -> f64 {
        let total = self.total_capacity();
        if total == 0 {
            0.0
        } else {
            self.total_used() as f64 / total as f64
        }
    }

    pub fn lane_len(&self, priority: Priority) -> usize {
        self.lane(priority).items.len()
    }
}

/// Build a deterministic round-robin cycle from lane weights, e.g. weights
/// 4:2:1 produce a 7-slot cycle visiting HIGH four times, NORMAL twice, LOW
/// once, interleaved so no lane is starved within one cycle.
fn build_cycle(high: u32, normal: u32, low: u32) -> Vec<Priority> {
    let mut remaining = [
        (Priority::High, high),
        (Priority::Normal, normal),
        (Priority::Low, low),
    ];
    let mut cycle = Vec::new();
    loop {
        let mut any = false;
        for (priority, count) in remaining.iter_mut() {
            if *count > 0 {
                cycle.push(*priority);
                *count -= 1;
                any = true;
            }
        }
        if !any {
            break;
        }
    }
    cycle
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
