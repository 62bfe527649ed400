// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Fixture plug-ins for exercising the engine, coordinator, and end-to-end
//! scan scenarios without real OSINT data-source I/O.

pub mod plugin;

pub use plugin::{FakePlugin, HandleBehavior, PluginCall};
