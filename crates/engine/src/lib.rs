// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! The event bus, plug-in runtime, module resolver, scan queue, retry
//! layer, and error telemetry that make up the scan execution engine.
//! `scanforge-core` defines the data shapes; this crate runs them.

mod bus;
mod config;
mod controller;
mod plugin;
mod queue;
mod resolver;
mod retry;
mod telemetry;
mod worker_pool;

pub use bus::{BusBackend, BusError, BusHandle};
pub use config::{EngineConfig, LaneConfig};
pub use controller::{ControllerError, ScanController};
pub use plugin::{dispatch, DispatchOutcome, Plugin, PluginContext, PluginError, PluginRegistry};
pub use queue::{BackpressurePolicy, Evicted, QueueError, ScanQueue};
pub use resolver::{ModuleResolver, Resolution, ResolverWarning};
pub use retry::{DeadLetter, DeadLetterReason, RetryLayer, RetryOutcome, RetryStrategy};
pub use telemetry::{fingerprint, normalize_message, AlertRule, Telemetry};
pub use worker_pool::{ContextFactory, WorkItemOutcome, WorkerPool};
