// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction so scan timing (quiescence windows, abort grace,
//! heartbeat timeouts) can be driven deterministically in tests.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Source of monotonic and wall-clock time.
///
/// Every timing decision in the engine (quiet-window detection, abort grace,
/// retry backoff, heartbeat expiry) goes through this trait so tests can
/// advance time without sleeping.
pub trait Clock: Send + Sync {
    /// Monotonic instant, used for ordering and elapsed-time math.
    fn now(&self) -> Instant;

    /// Wall-clock time in milliseconds since the epoch, used for reporting.
    fn now_wall_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Real-time clock backed by the OS.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Deterministic clock for tests: `now()` returns a fixed base plus an
/// explicitly advanced offset.
#[derive(Clone)]
pub struct FakeClock {
    base: Instant,
    offset_ms: Arc<AtomicI64>,
    wall_base_ms: u64,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset_ms: Arc::new(AtomicI64::new(0)),
            wall_base_ms: 1_700_000_000_000,
        }
    }

    /// Advance the clock by `duration`. Affects both `now()` and `now_wall_ms()`.
    pub fn advance(&self, duration: Duration) {
        self.offset_ms
            .fetch_add(duration.as_millis() as i64, Ordering::SeqCst);
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        let offset = self.offset_ms.load(Ordering::SeqCst);
        if offset >= 0 {
            self.base + Duration::from_millis(offset as u64)
        } else {
            self.base - Duration::from_millis((-offset) as u64)
        }
    }

    fn now_wall_ms(&self) -> u64 {
        let offset = self.offset_ms.load(Ordering::SeqCst);
        (self.wall_base_ms as i64 + offset).max(0) as u64
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
