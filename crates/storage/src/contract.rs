// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The storage contract consumed by the engine (§6 External Interfaces).
//!
//! Engine-agnostic: a SQL, document, or embedded key-value store can all
//! satisfy it. This crate ships one implementation, [`crate::state`] backed
//! by [`crate::wal::Wal`] + [`crate::checkpoint::Checkpointer`], but the
//! engine only ever depends on the trait.

use crate::ops::ScanLogLine;
use scanforge_core::{ErrorRecord, Event, EventId, Scan, ScanId, ScanStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("wal error: {0}")]
    Wal(#[from] crate::wal::WalError),
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] crate::checkpoint::CheckpointError),
    #[error("scan not found: {0}")]
    ScanNotFound(ScanId),
    #[error("illegal scan transition: {0}")]
    IllegalTransition(#[from] scanforge_core::IllegalScanTransition),
}

/// Durable sink and source of record for scan state.
///
/// `append_event` must be idempotent on `event.event_id`: calling it twice
/// with the same event leaves the stored log unchanged after the first
/// call. Every mutating method here must durably write before returning,
/// per the "durable write before fanout" engine invariant.
pub trait StorageBackend: Send + Sync {
    fn append_event(&self, event: &Event) -> Result<(), StorageError>;

    fn list_events(&self, scan_id: &ScanId) -> Result<Vec<Event>, StorageError>;

    fn mark_false_positive(
        &self,
        scan_id: &ScanId,
        event_id: &EventId,
        value: bool,
    ) -> Result<(), StorageError>;

    fn upsert_scan(&self, scan: &Scan) -> Result<(), StorageError>;

    fn get_scan(&self, scan_id: &ScanId) -> Result<Option<Scan>, StorageError>;

    fn set_scan_status(
        &self,
        scan_id: &ScanId,
        status: ScanStatus,
        at_ms: u64,
    ) -> Result<(), StorageError>;

    fn append_scan_log(&self, line: ScanLogLine) -> Result<(), StorageError>;

    fn record_error(&self, record: &ErrorRecord) -> Result<(), StorageError>;

    fn heartbeat_node(
        &self,
        node_id: &str,
        endpoint: &str,
        capacity: u32,
        tags: &[String],
        at_ms: u64,
    ) -> Result<(), StorageError>;
}
