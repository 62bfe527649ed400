// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-size worker pool that drains the [`ScanQueue`] and dispatches each
//! [`WorkItem`] to its plug-in (§4.5).

use crate::plugin::{dispatch, DispatchOutcome, Plugin, PluginContext, PluginRegistry};
use crate::queue::{Evicted, QueueError, ScanQueue};
use parking_lot::Mutex;
use scanforge_core::{ErrorCategory, WorkItem};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How long an idle worker waits between `ScanQueue` polls when there is no
/// pending notification. Bounds the lost-wakeup window on `notify_waiters`
/// without busy-spinning.
const IDLE_POLL: Duration = Duration::from_millis(50);

/// The result of one dispatched [`WorkItem`], handed back to the caller
/// (the retry layer / scan controller) over the results channel.
pub struct WorkItemOutcome {
    pub item: WorkItem,
    pub outcome: DispatchOutcome,
}

/// Builds the [`PluginContext`] a work item's handler runs under. Supplied
/// by the caller because the pool is process-wide while contexts are
/// per-scan (§5: "physical workers may be shared across scans").
pub type ContextFactory = Arc<dyn Fn(&WorkItem) -> PluginContext + Send + Sync>;

/// A fixed-size set of `tokio` tasks pulling from one shared [`ScanQueue`]
/// (§4.5). `submit` enqueues and wakes a worker; `drain` stops admission
/// and waits for in-flight dispatches to finish.
pub struct WorkerPool {
    queue: Arc<Mutex<ScanQueue>>,
    notify: Arc<Notify>,
    draining: Arc<AtomicBool>,
    in_flight: Arc<AtomicU64>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    pub fn new(
        queue: ScanQueue,
        worker_count: usize,
        registry: Arc<PluginRegistry>,
        context_for: ContextFactory,
        results: mpsc::Sender<WorkItemOutcome>,
        cancellation: CancellationToken,
    ) -> Self {
        let queue = Arc::new(Mutex::new(queue));
        let notify = Arc::new(Notify::new());
        let draining = Arc::new(AtomicBool::new(false));
        let in_flight = Arc::new(AtomicU64::new(0));

        let handles = (0..worker_count)
            .map(|id| {
                tokio::spawn(worker_loop(
                    id,
                    Arc::clone(&queue),
                    Arc::clone(&notify),
                    Arc::clone(&draining),
                    Arc::clone(&in_flight),
                    Arc::clone(&registry),
                    Arc::clone(&context_for),
                    results.clone(),
                    cancellation.clone(),
                ))
            })
            .collect();

        Self { queue, notify, draining, in_flight, handles: Mutex::new(handles) }
    }

    /// Enqueue a work item, honoring its lane's backpressure policy (§4.6).
    pub fn submit(&self, item: WorkItem) -> Result<Option<Evicted>, QueueError> {
        let evicted = self.queue.lock().try_enqueue(item)?;
        self.notify.notify_waiters();
        Ok(evicted)
    }

    pub fn pressure(&self) -> f64 {
        self.queue.lock().pressure()
    }

    pub fn in_flight(&self) -> u64 {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Stop accepting handler work and wait for every worker to observe an
    /// empty queue and exit. Used during scan termination (§4.4, §4.5);
    /// callers needing a hard deadline wrap this in `tokio::time::timeout`.
    pub async fn drain(&self) {
        self.draining.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
        let handles = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            let _ = handle.await;
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn worker_loop(
    id: usize,
    queue: Arc<Mutex<ScanQueue>>,
    notify: Arc<Notify>,
    draining: Arc<AtomicBool>,
    in_flight: Arc<AtomicU64>,
    registry: Arc<PluginRegistry>,
    context_for: ContextFactory,
    results: mpsc::Sender<WorkItemOutcome>,
    cancellation: CancellationToken,
) {
    loop {
        let item = queue.lock().dequeue();
        let item = match item {
            Some(item) => item,
            None => {
                if draining.load(Ordering::SeqCst) {
                    return;
                }
                tokio::select! {
                    _ = notify.notified() => continue,
                    _ = tokio::time::sleep(IDLE_POLL) => continue,
                    _ = cancellation.cancelled() => return,
                }
            }
        };

        in_flight.fetch_add(1, Ordering::SeqCst);
        let outcome = match registry.get(&item.plugin_name) {
            Some(plugin) => run(plugin, context_for(&item), &item).await,
            None => DispatchOutcome::Failed {
                category: ErrorCategory::Internal,
                message: format!("no registered plug-in named '{}'", item.plugin_name),
            },
        };
        in_flight.fetch_sub(1, Ordering::SeqCst);

        match &outcome {
            DispatchOutcome::Completed => {
                tracing::debug!(worker = id, plugin = %item.plugin_name, work_item = %item.id, "dispatch completed");
            }
            DispatchOutcome::Panicked { message } => {
                tracing::warn!(worker = id, plugin = %item.plugin_name, work_item = %item.id, reason = %message, "plugin handler panicked");
            }
            DispatchOutcome::Failed { category, message } => {
                tracing::warn!(worker = id, plugin = %item.plugin_name, work_item = %item.id, ?category, reason = %message, "dispatch failed");
            }
        }

        if results.send(WorkItemOutcome { item, outcome }).await.is_err() {
            return;
        }
    }
}

async fn run(plugin: Arc<dyn Plugin>, ctx: PluginContext, item: &WorkItem) -> DispatchOutcome {
    dispatch(plugin, ctx, item.event.clone()).await
}

#[cfg(test)]
#[path = "worker_pool_tests.rs"]
mod tests;
