// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scan lifecycle state machine, quiescence detection, and abort handling
//! (§4.4).

use crate::bus::BusHandle;
use parking_lot::Mutex;
use scanforge_core::{Clock, Scan, ScanId, ScanStatus};
use scanforge_storage::{StorageBackend, StorageError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("illegal scan transition: {0}")]
    IllegalTransition(#[from] scanforge_core::IllegalScanTransition),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

struct State {
    status: ScanStatus,
    in_flight: u64,
    /// Instant the in-flight counter last reached zero, `None` while work is
    /// outstanding. Quiescence requires this to hold for `quiet_window`.
    quiet_since: Option<Instant>,
}

/// Drives one scan through CREATED -> STARTING -> RUNNING -> {ABORTING ->
/// ABORTED, FINISHING -> FINISHED} (-> ERROR_FAILED from any non-terminal
/// state), durably persisting every transition before it takes effect
/// elsewhere (bus routing, worker pool) (§4.4).
pub struct ScanController {
    scan_id: ScanId,
    clock: Arc<dyn Clock>,
    storage: Arc<dyn StorageBackend>,
    bus: BusHandle,
    quiet_window: Duration,
    abort_grace: Duration,
    state: Mutex<State>,
    pub cancellation: CancellationToken,
}

impl ScanController {
    pub fn new(
        scan_id: ScanId,
        clock: Arc<dyn Clock>,
        storage: Arc<dyn StorageBackend>,
        bus: BusHandle,
        quiet_window: Duration,
        abort_grace: Duration,
    ) -> Self {
        Self {
            scan_id,
            clock,
            storage,
            bus,
            quiet_window,
            abort_grace,
            state: Mutex::new(State { status: ScanStatus::Created, in_flight: 0, quiet_since: None }),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn status(&self) -> ScanStatus {
        self.state.lock().status
    }

    fn transition(&self, next: ScanStatus) -> Result<(), ControllerError> {
        let now_ms = self.clock.now_wall_ms();
        let mut scan = self
            .storage
            .get_scan(&self.scan_id)?
            .ok_or_else(|| ControllerError::Storage(StorageError::ScanNotFound(self.scan_id.clone())))?;
        scan.transition(next, now_ms)?;
        self.storage.upsert_scan(&scan)?;
        self.state.lock().status = next;
        self.bus.set_status(&self.scan_id, next);
        tracing::info!(scan_id = %self.scan_id, status = ?next, "scan transitioned");
        Ok(())
    }

    /// Register a scan in CREATED state, called once at construction time by
    /// the owning coordinator before `start`.
    pub fn register(&self, scan: &Scan) -> Result<(), ControllerError> {
        self.storage.upsert_scan(scan)?;
        self.bus.open_scan(&self.scan_id);
        Ok(())
    }

    /// CREATED -> STARTING -> RUNNING, after the resolver has frozen the
    /// module set (§4.3, §4.4).
    pub fn start(&self) -> Result<(), ControllerError> {
        self.transition(ScanStatus::Starting)?;
        self.transition(ScanStatus::Running)
    }

    /// Called by the worker pool when a handler dispatch begins.
    pub fn work_started(&self) {
        let mut state = self.state.lock();
        state.in_flight += 1;
        state.quiet_since = None;
    }

    /// Called by the worker pool when a handler dispatch completes (success,
    /// failure, retry, or dead-letter — any terminal outcome for that work
    /// item). Starts the quiet-window clock once the count reaches zero.
    pub fn work_finished(&self) {
        let mut state = self.state.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        if state.in_flight == 0 {
            state.quiet_since = Some(self.clock.now());
        }
    }

    /// True once in-flight work has been zero continuously for
    /// `quiet_window` and the queue has nothing left to drain.
    pub fn is_quiescent(&self, queue_empty: bool) -> bool {
        let state = self.state.lock();
        queue_empty
            && state.in_flight == 0
            && state
                .quiet_since
                .is_some_and(|since| self.clock.now().duration_since(since) >= self.quiet_window)
    }

    /// RUNNING -> FINISHING -> FINISHED, called once `is_quiescent` holds.
    pub fn finish(&self) -> Result<(), ControllerError> {
        self.transition(ScanStatus::Finishing)?;
        self.bus.close(&self.scan_id);
        self.transition(ScanStatus::Finished)
    }

    /// RUNNING -> ABORTING -> ABORTED. Cancels in-flight handlers via the
    /// shared token and bounds total shutdown time to `abort_grace`
    /// regardless of how long handlers take to notice cancellation (§4.4,
    /// §5).
    pub async fn abort(&self) -> Result<(), ControllerError> {
        self.transition(ScanStatus::Aborting)?;
        self.cancellation.cancel();
        self.bus.close(&self.scan_id);

        let deadline = tokio::time::Instant::now() + self.abort_grace;
        while self.state.lock().in_flight > 0 {
            if tokio::time::Instant::now() >= deadline {
                tracing::warn!(scan_id = %self.scan_id, "abort grace period elapsed with handlers still in flight");
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        self.transition(ScanStatus::Aborted)
    }

    /// Any non-terminal state -> ERROR_FAILED, for unrecoverable engine
    /// errors (storage I/O failure, resolver contradiction) rather than
    /// ordinary handler failures, which go through the retry layer instead.
    pub fn fail(&self) -> Result<(), ControllerError> {
        self.transition(ScanStatus::ErrorFailed)
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
