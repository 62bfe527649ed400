// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The plug-in authoring contract and the runtime that dispatches events to
//! it with error isolation (§4.2).

use crate::bus::{BusError, BusHandle};
use async_trait::async_trait;
use scanforge_core::{Event, ErrorCategory, PluginDescriptor, ScanConfig};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors a plug-in's own code can surface (distinct from the bus/runtime
/// errors around it); classified by the caller into an [`ErrorCategory`].
#[derive(Debug, Error, Clone)]
#[error("{message}")]
pub struct PluginError {
    pub category: ErrorCategory,
    pub message: String,
}

impl PluginError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self { category, message: message.into() }
    }
}

/// Per-scan handle passed to a plug-in's lifecycle hooks: emits events,
/// exposes the frozen config, and carries the cancellation token handlers
/// must observe at suspension points.
#[derive(Clone)]
pub struct PluginContext {
    pub bus: BusHandle,
    pub config: Arc<ScanConfig>,
    pub cancellation: CancellationToken,
}

impl PluginContext {
    pub async fn emit(&self, event: Event) -> Result<(), BusError> {
        self.bus.publish(event).await
    }
}

/// The stable authoring contract every plug-in implements (§4.2).
#[async_trait]
pub trait Plugin: Send + Sync {
    fn descriptor(&self) -> PluginDescriptor;

    /// One-time per scan.
    async fn setup(&self, ctx: &PluginContext) -> Result<(), PluginError> {
        let _ = ctx;
        Ok(())
    }

    /// Invoked once per matching delivery. May call `ctx.emit` any number
    /// of times. Must observe `ctx.cancellation` at suspension points.
    async fn handle(&self, ctx: &PluginContext, event: &Event) -> Result<(), PluginError>;

    /// Invoked at scan termination, always, even on ABORT.
    async fn teardown(&self, ctx: &PluginContext) {
        let _ = ctx;
    }
}

/// Outcome of dispatching one delivery to a plug-in, with the failure
/// category attached so the caller can route to Retry or DLQ (§4.2, §7).
pub enum DispatchOutcome {
    Completed,
    Failed { category: ErrorCategory, message: String },
    /// The handler panicked; the runtime catches it at this boundary so one
    /// plug-in's crash never takes down the scan (§4.2, §9).
    Panicked { message: String },
}

/// Invoke a plug-in's `handle` with panic isolation.
///
/// A panic inside an `async fn` surfaces during polling, not at the call
/// site, so `catch_unwind` around the call itself cannot see it. The
/// runtime instead spawns the dispatch as its own `tokio` task and inspects
/// the `JoinError`: this is the one place the engine admits plug-in code may
/// panic (§9) without taking the rest of the scan down with it.
pub async fn dispatch(plugin: Arc<dyn Plugin>, ctx: PluginContext, event: Event) -> DispatchOutcome {
    let handle = tokio::spawn(async move { plugin.handle(&ctx, &event).await });
    match handle.await {
        Ok(Ok(())) => DispatchOutcome::Completed,
        Ok(Err(e)) => DispatchOutcome::Failed { category: e.category, message: e.message },
        Err(join_err) if join_err.is_panic() => {
            DispatchOutcome::Panicked { message: panic_message(join_err.into_panic().as_ref()) }
        }
        Err(join_err) => DispatchOutcome::Panicked { message: join_err.to_string() },
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "plugin panicked with a non-string payload".to_string()
    }
}

/// Static registry of available plug-ins, satisfying the external
/// "plug-in registry" interface in §6.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    pub fn list_plugins(&self) -> Vec<PluginDescriptor> {
        self.plugins.iter().map(|p| p.descriptor()).collect()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.iter().find(|p| p.descriptor().name == name).cloned()
    }
}

#[cfg(test)]
#[path = "plugin_runtime_tests.rs"]
mod tests;
