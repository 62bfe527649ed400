// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixture plug-in for driving the engine and coordinator in tests.

mod fake;

pub use fake::{FakePlugin, HandleBehavior, PluginCall};
