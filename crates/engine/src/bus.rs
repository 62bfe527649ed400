// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process publish/subscribe relay with durable write-before-fanout and
//! per-(scan, type) FIFO ordering (§4.1).

use async_trait::async_trait;
use parking_lot::RwLock;
use scanforge_core::{DeliveryMode, Event, IdGen, ScanId, ScanStatus, SubscriptionId, TopicPattern, UuidIdGen};
use scanforge_storage::{StorageBackend, StorageError};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};
use tokio::time::timeout;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("parent event {0:?} does not exist in this scan")]
    InvalidCausality(scanforge_core::EventId),
    #[error("scan {0} is not accepting publishes")]
    ScanTerminated(ScanId),
    #[error("publish blocked past the configured backpressure deadline")]
    BackpressureTimeout,
    #[error("recursive publish depth exceeded the configured limit")]
    DeliveryDepthExceeded,
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// A live subscription: the data half lives in `scanforge-core`, this adds
/// the callable dispatch side owned by the engine.
struct Subscription {
    id: SubscriptionId,
    pattern: TopicPattern,
    mode: DeliveryMode,
    sender: mpsc::Sender<Event>,
}

struct ScanRouting {
    status: ScanStatus,
    by_type: HashMap<String, Vec<Subscription>>,
    wildcard: Vec<Subscription>,
    sequence: AtomicU64,
    seen_event_ids: RwLock<HashSet<String>>,
    known_event_ids: RwLock<HashSet<String>>,
}

impl ScanRouting {
    fn new() -> Self {
        Self {
            status: ScanStatus::Starting,
            by_type: HashMap::new(),
            wildcard: Vec::new(),
            sequence: AtomicU64::new(0),
            seen_event_ids: RwLock::new(HashSet::new()),
            known_event_ids: RwLock::new(HashSet::new()),
        }
    }
}

/// The bus's routing state, shared by every [`BusHandle`] clone for one
/// engine instance.
struct Inner {
    storage: Arc<dyn StorageBackend>,
    scans: RwLock<HashMap<String, ScanRouting>>,
    backpressure_permits: Semaphore,
    backpressure_timeout: std::time::Duration,
    max_publish_depth: u32,
    subscription_ids: UuidIdGen,
}

/// Cheaply-cloneable handle to the bus, passed into every [`crate::plugin::PluginContext`].
#[derive(Clone)]
pub struct BusHandle {
    inner: Arc<Inner>,
}

impl BusHandle {
    pub fn new(storage: Arc<dyn StorageBackend>, backpressure_capacity: usize, backpressure_timeout: std::time::Duration, max_publish_depth: u32) -> Self {
        Self {
            inner: Arc::new(Inner {
                storage,
                scans: RwLock::new(HashMap::new()),
                backpressure_permits: Semaphore::new(backpressure_capacity),
                backpressure_timeout,
                max_publish_depth,
                subscription_ids: UuidIdGen,
            }),
        }
    }

    /// Register a scan so it can accept publishes/subscriptions. Call once
    /// at STARTING.
    pub fn open_scan(&self, scan_id: &ScanId) {
        self.inner
            .scans
            .write()
            .insert(scan_id.as_str().to_string(), ScanRouting::new());
    }

    /// Mirror a scan's lifecycle transition so `publish` can enforce
    /// `accepts_publish` without re-reading scan state from storage on
    /// every call. Driven by `crate::controller::ScanController`.
    pub fn set_status(&self, scan_id: &ScanId, status: ScanStatus) {
        if let Some(routing) = self.inner.scans.write().get_mut(scan_id.as_str()) {
            routing.status = status;
        }
    }

    /// Drain pending deliveries and reject further publishes (§4.1 `close`).
    pub fn close(&self, scan_id: &ScanId) {
        self.set_status(scan_id, ScanStatus::Finished);
    }

    pub fn subscribe(
        &self,
        scan_id: &ScanId,
        pattern: TopicPattern,
        mode: DeliveryMode,
        buffer: usize,
    ) -> Result<(SubscriptionId, mpsc::Receiver<Event>), BusError> {
        let mut scans = self.inner.scans.write();
        let routing = scans
            .get_mut(scan_id.as_str())
            .ok_or_else(|| BusError::ScanTerminated(scan_id.clone()))?;
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let id = SubscriptionId::new(self.inner.subscription_ids.next());
        let sub = Subscription { id: id.clone(), pattern: pattern.clone(), mode, sender: tx };
        match &pattern {
            TopicPattern::Wildcard => routing.wildcard.push(sub),
            TopicPattern::Exact(t) => routing.by_type.entry(t.as_str().to_string()).or_default().push(sub),
        }
        Ok((id, rx))
    }

    pub fn unsubscribe(&self, scan_id: &ScanId, subscription_id: &SubscriptionId) {
        if let Some(routing) = self.inner.scans.write().get_mut(scan_id.as_str()) {
            routing.wildcard.retain(|s| &s.id != subscription_id);
            for subs in routing.by_type.values_mut() {
                subs.retain(|s| &s.id != subscription_id);
            }
        }
    }

    /// Publish an event: assign sequence, durably write, then fan out to
    /// matching subscriptions (§4.1 algorithm).
    pub async fn publish(&self, mut event: Event) -> Result<(), BusError> {
        self.publish_with_depth(&mut event, 0).await
    }

    async fn publish_with_depth(&self, event: &mut Event, depth: u32) -> Result<(), BusError> {
        if depth > self.inner.max_publish_depth {
            return Err(BusError::DeliveryDepthExceeded);
        }

        let scan_key = event.scan_id.as_str().to_string();
        {
            let scans = self.inner.scans.read();
            let routing = scans
                .get(&scan_key)
                .ok_or_else(|| BusError::ScanTerminated(event.scan_id.clone()))?;
            if !routing.status.accepts_publish() {
                return Err(BusError::ScanTerminated(event.scan_id.clone()));
            }
            if let Some(parent) = &event.source_event_id {
                if !routing.known_event_ids.read().contains(parent.as_str()) {
                    return Err(BusError::InvalidCausality(parent.clone()));
                }
            }
            // Idempotent on event_id: duplicate publishes are dropped after the first.
            if routing.seen_event_ids.read().contains(event.event_id.as_str()) {
                return Ok(());
            }
            event.sequence = routing.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        }

        let permit = timeout(self.inner.backpressure_timeout, self.inner.backpressure_permits.acquire())
            .await
            .map_err(|_| BusError::BackpressureTimeout)?
            .expect("semaphore is never closed");

        // Durable write before fanout (§4.1 step 2): any event that exists
        // has either been delivered or is still enqueued for delivery.
        self.inner.storage.append_event(event)?;
        drop(permit);

        {
            let scans = self.inner.scans.read();
            if let Some(routing) = scans.get(&scan_key) {
                routing.known_event_ids.write().insert(event.event_id.as_str().to_string());
                routing.seen_event_ids.write().insert(event.event_id.as_str().to_string());
            }
        }

        self.dispatch(event).await;
        Ok(())
    }

    async fn dispatch(&self, event: &Event) {
        let targets: Vec<(DeliveryMode, mpsc::Sender<Event>)> = {
            let scans = self.inner.scans.read();
            let Some(routing) = scans.get(event.scan_id.as_str()) else { return };
            let mut targets: Vec<(DeliveryMode, mpsc::Sender<Event>)> = routing
                .by_type
                .get(event.event_type.as_str())
                .into_iter()
                .flatten()
                .map(|s| (s.mode, s.sender.clone()))
                .collect();
            targets.extend(routing.wildcard.iter().map(|s| (s.mode, s.sender.clone())));
            targets
        };

        for (mode, sender) in targets {
            match mode {
                DeliveryMode::SyncInline => {
                    // Invoked on the publisher's own worker: `publish`
                    // does not return past this point until the subscriber
                    // has accepted the event or the backpressure deadline
                    // elapses.
                    self.deliver_blocking(sender, event.clone()).await;
                }
                DeliveryMode::AsyncPool => {
                    // Produces a WorkItem for the Worker Pool: the common
                    // case is a non-blocking handoff so `publish` never
                    // waits on the pool's own schedule. Only a momentarily
                    // full channel falls back to a bounded background wait
                    // (§4.1 at-least-once) instead of silently dropping it.
                    match sender.try_send(event.clone()) {
                        Ok(()) => {}
                        Err(mpsc::error::TrySendError::Full(event)) => {
                            let bus = self.clone();
                            tokio::spawn(async move { bus.deliver_blocking(sender, event).await });
                        }
                        Err(mpsc::error::TrySendError::Closed(event)) => {
                            tracing::warn!(event_id = %event.event_id, "subscriber channel closed, delivery dropped");
                        }
                    }
                }
            }
        }
    }

    /// Deliver one event to one subscriber's channel, waiting up to
    /// `backpressure_timeout` for room rather than dropping it on a full
    /// channel (§4.1 at-least-once delivery).
    async fn deliver_blocking(&self, sender: mpsc::Sender<Event>, event: Event) {
        let event_id = event.event_id.as_str().to_string();
        match timeout(self.inner.backpressure_timeout, sender.send(event)).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => {
                tracing::warn!(event_id = %event_id, "subscriber channel closed, delivery dropped");
            }
            Err(_) => {
                tracing::warn!(event_id = %event_id, "subscriber channel full past backpressure deadline, delivery dropped");
            }
        }
    }
}

/// Trait seam admitting an external broker-backed bus (§4.1 "Pluggable
/// backend"), kept behind the same `publish`/`subscribe` surface. No
/// broker implementation ships with this engine; only the in-memory
/// `BusHandle` does.
#[async_trait]
pub trait BusBackend: Send + Sync {
    async fn publish_durable(&self, scan_id: &ScanId, partition_key: &str, event: &Event) -> Result<u64, BusError>;
}

#[async_trait]
impl BusBackend for BusHandle {
    async fn publish_durable(&self, _scan_id: &ScanId, _partition_key: &str, event: &Event) -> Result<u64, BusError> {
        self.publish(event.clone()).await?;
        Ok(event.sequence)
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
