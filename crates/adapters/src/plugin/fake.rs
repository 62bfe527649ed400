// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake plug-in for deterministic engine/coordinator tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use scanforge_core::{ErrorCategory, Event, EventId, EventType, PluginDescriptor};
use scanforge_engine::{Plugin, PluginContext, PluginError};
use std::collections::VecDeque;
use std::sync::Arc;

/// Recorded lifecycle call against a [`FakePlugin`].
#[derive(Debug, Clone)]
pub enum PluginCall {
    Setup,
    Handle { event_type: String },
    Teardown,
}

/// What a queued `handle()` invocation should do. Consumed one entry at a
/// time, FIFO; once the queue is empty every further call succeeds with no
/// emission, mirroring the one-shot programmable-error pattern used by the
/// rest of this crate's fakes.
#[derive(Debug, Clone)]
pub enum HandleBehavior {
    Succeed,
    /// Succeed and emit one event downstream, `produced_by` stamped as the
    /// emitting module.
    SucceedAndEmit { event_type: String, produced_by: String },
    Fail(ErrorCategory, String),
    Panic(String),
}

struct Inner {
    calls: Vec<PluginCall>,
    behaviors: VecDeque<HandleBehavior>,
    emitted: u64,
}

/// A [`Plugin`] whose `handle()` outcome is scripted in advance and whose
/// calls are recorded for assertions, the same shape as this crate's other
/// fakes (`FakeAgentAdapter`, `FakeNotifyAdapter`).
#[derive(Clone)]
pub struct FakePlugin {
    descriptor: PluginDescriptor,
    inner: Arc<Mutex<Inner>>,
}

impl FakePlugin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            descriptor: PluginDescriptor::new(name, "fake plug-in for tests"),
            inner: Arc::new(Mutex::new(Inner { calls: Vec::new(), behaviors: VecDeque::new(), emitted: 0 })),
        }
    }

    pub fn watching(mut self, types: impl IntoIterator<Item = EventType>) -> Self {
        self.descriptor = self.descriptor.watching(types);
        self
    }

    pub fn producing(mut self, types: impl IntoIterator<Item = EventType>) -> Self {
        self.descriptor = self.descriptor.producing(types);
        self
    }

    /// Queue the behavior for the next `handle()` call.
    pub fn push_behavior(&self, behavior: HandleBehavior) {
        self.inner.lock().behaviors.push_back(behavior);
    }

    pub fn calls(&self) -> Vec<PluginCall> {
        self.inner.lock().calls.clone()
    }

    pub fn handle_count(&self) -> usize {
        self.inner.lock().calls.iter().filter(|c| matches!(c, PluginCall::Handle { .. })).count()
    }
}

#[async_trait]
impl Plugin for FakePlugin {
    fn descriptor(&self) -> PluginDescriptor {
        self.descriptor.clone()
    }

    async fn setup(&self, _ctx: &PluginContext) -> Result<(), PluginError> {
        self.inner.lock().calls.push(PluginCall::Setup);
        Ok(())
    }

    async fn handle(&self, ctx: &PluginContext, event: &Event) -> Result<(), PluginError> {
        let behavior = {
            let mut inner = self.inner.lock();
            inner.calls.push(PluginCall::Handle { event_type: event.event_type.as_str().to_string() });
            inner.behaviors.pop_front().unwrap_or(HandleBehavior::Succeed)
        };

        match behavior {
            HandleBehavior::Succeed => Ok(()),
            HandleBehavior::SucceedAndEmit { event_type, produced_by } => {
                let seq = {
                    let mut inner = self.inner.lock();
                    inner.emitted += 1;
                    inner.emitted
                };
                let produced = Event::produced(
                    EventId::new(format!("{produced_by}-{seq}")),
                    event.scan_id.clone(),
                    event_type,
                    event.data.clone(),
                    produced_by,
                    event.event_id.clone(),
                    event.created_at_ms,
                    event.risk,
                    event.confidence,
                );
                ctx.emit(produced).await.map_err(|e| PluginError::new(ErrorCategory::Internal, e.to_string()))
            }
            HandleBehavior::Fail(category, message) => Err(PluginError::new(category, message)),
            #[allow(clippy::panic)]
            HandleBehavior::Panic(message) => panic!("{message}"),
        }
    }

    async fn teardown(&self, _ctx: &PluginContext) {
        self.inner.lock().calls.push(PluginCall::Teardown);
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
