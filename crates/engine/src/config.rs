// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tunable defaults for the engine, collected into one frozen value so tests
//! can construct an engine with deterministic timings instead of the §4
//! production defaults.

use std::time::Duration;

/// Per-lane capacity and fair-share weight for the scan queue (§4.6).
#[derive(Debug, Clone, Copy)]
pub struct LaneConfig {
    pub capacity: usize,
    pub weight: u32,
}

/// Engine-wide tunables. `Default` carries the spec's stated defaults.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Continuous in-flight=0 window before a scan is declared quiescent (§4.4).
    pub quiet_window: Duration,
    /// Bound on total ABORTING shutdown time (§4.4).
    pub abort_grace: Duration,
    /// Deadline for `publish` to block under backpressure before failing (§4.1).
    pub publish_backpressure_timeout: Duration,
    /// Bound on recursive synchronous publishes from inside a handler (§4.1).
    pub max_publish_depth: u32,
    /// HIGH/NORMAL/LOW lane configuration (§4.6), default weights 4:2:1.
    pub high_lane: LaneConfig,
    pub normal_lane: LaneConfig,
    pub low_lane: LaneConfig,
    /// Global retry ceiling, overridable per category (§4.8).
    pub retry_ceiling: u32,
    /// Soft per-invocation handler timeout before cancellation is signalled (§4.2).
    pub handler_soft_timeout: Duration,
    /// Hard timeout after which the worker abandons the handler (§5).
    pub handler_hard_timeout: Duration,
    /// Ring buffer size for the telemetry store (§4.9).
    pub telemetry_ring_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            quiet_window: Duration::from_secs(2),
            abort_grace: Duration::from_secs(30),
            publish_backpressure_timeout: Duration::from_secs(10),
            max_publish_depth: 32,
            high_lane: LaneConfig { capacity: 256, weight: 4 },
            normal_lane: LaneConfig { capacity: 256, weight: 2 },
            low_lane: LaneConfig { capacity: 256, weight: 1 },
            retry_ceiling: 5,
            handler_soft_timeout: Duration::from_secs(30),
            handler_hard_timeout: Duration::from_secs(45),
            telemetry_ring_capacity: 10_000,
        }
    }
}
