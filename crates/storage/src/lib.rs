// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Durable storage for the scan execution engine.
//!
//! Every state change (event appended, scan transitioned, error recorded,
//! node heartbeat) is first written to the [`Wal`], then applied to
//! [`MaterializedState`] in memory, then fanned out — "durable write
//! before fanout". A background [`Checkpointer`] periodically folds the
//! materialized state into a [`Snapshot`] so recovery only has to replay
//! the WAL entries written since the last checkpoint.

mod backend;
mod checkpoint;
mod contract;
mod migration;
mod ops;
mod snapshot;
mod state;
mod wal;

/// Current on-disk snapshot schema version. Bump this and add a
/// [`migration::Migration`] to [`migration::MigrationRegistry::new`] whenever
/// [`MaterializedState`]'s shape changes incompatibly.
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

pub use backend::FileStorageBackend;
pub use checkpoint::{
    CheckpointError, CheckpointHandle, CheckpointResult, CheckpointWriter, Checkpointer,
    FsCheckpointWriter, load_snapshot,
};
pub use contract::{StorageBackend, StorageError};
pub use migration::{Migration, MigrationError, MigrationRegistry};
pub use ops::{LogLevel, ScanLogLine, WalOp};
pub use snapshot::{Snapshot, SnapshotError};
pub use state::{MaterializedState, ScanEventLog};
pub use wal::{GenericWal, Wal, WalEntry, WalError};
