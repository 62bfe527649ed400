// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Risk classification carried on every event.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Risk tag a producing plug-in attaches to an event.
///
/// The core never computes or reinterprets this value; plug-ins assign it
/// and observers (out of scope here) may use it for prioritization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Risk {
    Info,
    Low,
    Medium,
    High,
    Critical,
    Unknown,
}

impl Default for Risk {
    fn default() -> Self {
        Risk::Unknown
    }
}

impl fmt::Display for Risk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Risk::Info => "info",
            Risk::Low => "low",
            Risk::Medium => "medium",
            Risk::High => "high",
            Risk::Critical => "critical",
            Risk::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// Confidence score attached to an event, clamped to `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Confidence(u8);

impl Confidence {
    pub const MIN: Confidence = Confidence(0);
    pub const MAX: Confidence = Confidence(100);

    pub fn new(value: u8) -> Self {
        Self(value.min(100))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Confidence(100)
    }
}

impl From<u8> for Confidence {
    fn from(value: u8) -> Self {
        Confidence::new(value)
    }
}

#[cfg(test)]
#[path = "risk_tests.rs"]
mod tests;
