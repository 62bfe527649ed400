// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error classification and the telemetry record shape.
//!
//! Fingerprint computation and rate-window bookkeeping live in
//! `scanforge-engine`'s telemetry module; this crate only fixes the vocabulary
//! both the engine and the storage contract agree on.

use crate::scan::ScanId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification assigned to every caught handler error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    TransientNetwork,
    Auth,
    DataParse,
    Timeout,
    Resource,
    Internal,
    Unknown,
}

impl ErrorCategory {
    /// TRANSIENT_NETWORK, TIMEOUT, and RESOURCE are retried per §4.8;
    /// AUTH, DATA_PARSE, and INTERNAL go straight to the DLQ (§7).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorCategory::TransientNetwork | ErrorCategory::Timeout | ErrorCategory::Resource
        )
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCategory::TransientNetwork => "TRANSIENT_NETWORK",
            ErrorCategory::Auth => "AUTH",
            ErrorCategory::DataParse => "DATA_PARSE",
            ErrorCategory::Timeout => "TIMEOUT",
            ErrorCategory::Resource => "RESOURCE",
            ErrorCategory::Internal => "INTERNAL",
            ErrorCategory::Unknown => "UNKNOWN",
        };
        write!(f, "{s}")
    }
}

/// Structural hash over `(error_class, handler_location, normalized_message)`
/// used to group equivalent failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(pub String);

impl Fingerprint {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A fingerprint-grouped error record kept by the telemetry store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub fingerprint: Fingerprint,
    pub category: ErrorCategory,
    pub first_seen_ms: u64,
    pub last_seen_ms: u64,
    pub count: u64,
    pub scan_id: ScanId,
    pub module: String,
    pub sample_stack: String,
}

#[cfg(test)]
#[path = "error_record_tests.rs"]
mod tests;
