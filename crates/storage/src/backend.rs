// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The one `StorageBackend` this crate ships: a local directory holding a
//! `Wal` plus periodic zstd-compressed checkpoints (§6 External Interfaces).
//!
//! `append_event` and friends durably write before returning, satisfying the
//! engine's "durable write before fanout" requirement; fanout itself is the
//! bus's job, not this crate's.

use crate::checkpoint::Checkpointer;
use crate::contract::{StorageBackend, StorageError};
use crate::ops::{ScanLogLine, WalOp};
use crate::snapshot::Snapshot;
use crate::state::MaterializedState;
use crate::wal::Wal;
use parking_lot::Mutex;
use scanforge_core::{ErrorRecord, Event, EventId, Scan, ScanId, ScanStatus};
use std::path::{Path, PathBuf};

/// Checkpoint after this many WAL entries written since the last one.
const CHECKPOINT_INTERVAL: u64 = 500;

struct Inner {
    wal: Wal,
    state: MaterializedState,
    checkpointer: Checkpointer,
    last_checkpoint_seq: u64,
}

impl Inner {
    fn record(&mut self, op: WalOp) -> Result<(), StorageError> {
        let seq = self.wal.append(&op)?;
        self.wal.flush()?;
        self.state.apply(&op);
        self.wal.mark_processed(seq);
        if seq.saturating_sub(self.last_checkpoint_seq) >= CHECKPOINT_INTERVAL {
            let result = self.checkpointer.checkpoint_sync(seq, &self.state);
            if result.is_ok() {
                self.last_checkpoint_seq = seq;
                self.wal.truncate_before(seq)?;
            }
        }
        Ok(())
    }
}

/// Local-filesystem `StorageBackend`: one WAL file plus a snapshot file per
/// directory, safe to share across tasks via `&self` (internally mutexed).
pub struct FileStorageBackend {
    inner: Mutex<Inner>,
}

impl FileStorageBackend {
    /// Open (or create) a backend rooted at `dir`, replaying any existing
    /// snapshot + WAL tail to rebuild in-memory state.
    pub fn open(dir: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(dir).map_err(|e| StorageError::Wal(e.into()))?;
        let snapshot_path = Self::snapshot_path(dir);
        let wal_path = Self::wal_path(dir);

        let snapshot = crate::checkpoint::load_snapshot(&snapshot_path)
            .ok()
            .flatten();
        let (mut state, processed_seq) = match snapshot {
            Some(Snapshot { state, seq, .. }) => (state, seq),
            None => (MaterializedState::default(), 0),
        };

        let mut wal = Wal::open(&wal_path, processed_seq)?;
        while let Some(entry) = wal.next_unprocessed()? {
            state.apply(&entry.op);
            wal.mark_processed(entry.seq);
        }

        let checkpointer = Checkpointer::new(snapshot_path);
        Ok(Self {
            inner: Mutex::new(Inner {
                wal,
                state,
                checkpointer,
                last_checkpoint_seq: processed_seq,
            }),
        })
    }

    fn wal_path(dir: &Path) -> PathBuf {
        dir.join("wal.jsonl")
    }

    fn snapshot_path(dir: &Path) -> PathBuf {
        dir.join("snapshot.zst")
    }

    /// Force an out-of-band checkpoint, e.g. at clean shutdown.
    pub fn checkpoint_now(&self) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        let seq = inner.wal.write_seq();
        inner.checkpointer.checkpoint_sync(seq, &inner.state)?;
        inner.last_checkpoint_seq = seq;
        inner.wal.truncate_before(seq)?;
        Ok(())
    }
}

impl StorageBackend for FileStorageBackend {
    fn append_event(&self, event: &Event) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        if inner.state.list_events(event.scan_id.as_str()).iter().any(|e| e.event_id == event.event_id) {
            return Ok(());
        }
        inner.record(WalOp::event_appended(event.clone()))
    }

    fn list_events(&self, scan_id: &ScanId) -> Result<Vec<Event>, StorageError> {
        let inner = self.inner.lock();
        Ok(inner.state.list_events(scan_id.as_str()).to_vec())
    }

    fn mark_false_positive(&self, scan_id: &ScanId, event_id: &EventId, value: bool) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        inner.record(WalOp::EventMarkedFalsePositive {
            scan_id: scan_id.clone(),
            event_id: event_id.clone(),
            value,
        })
    }

    fn upsert_scan(&self, scan: &Scan) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        inner.record(WalOp::ScanUpserted { scan: Box::new(scan.clone()) })
    }

    fn get_scan(&self, scan_id: &ScanId) -> Result<Option<Scan>, StorageError> {
        let inner = self.inner.lock();
        Ok(inner.state.get_scan(scan_id.as_str()).cloned())
    }

    fn set_scan_status(&self, scan_id: &ScanId, status: ScanStatus, at_ms: u64) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        let current = inner
            .state
            .get_scan(scan_id.as_str())
            .ok_or_else(|| StorageError::ScanNotFound(scan_id.clone()))?
            .clone();
        let mut probe = current;
        probe.transition(status, at_ms)?;
        inner.record(WalOp::scan_status_changed(scan_id.clone(), status, at_ms))
    }

    fn append_scan_log(&self, line: ScanLogLine) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        inner.record(WalOp::ScanLogAppended { line })
    }

    fn record_error(&self, record: &ErrorRecord) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        inner.record(WalOp::ErrorRecorded { record: record.clone() })
    }

    fn heartbeat_node(&self, node_id: &str, endpoint: &str, capacity: u32, tags: &[String], at_ms: u64) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        inner.record(WalOp::NodeHeartbeat {
            node_id: node_id.to_string(),
            endpoint: endpoint.to_string(),
            capacity,
            tags: tags.to_vec(),
            at_ms,
        })
    }
}

#[cfg(test)]
#[path = "backend_tests.rs"]
mod tests;
