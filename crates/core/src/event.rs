// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The immutable event record exchanged through the bus.

use crate::risk::{Confidence, Risk};
use crate::scan::ScanId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

crate::define_id! {
    /// Unique identifier for an event.
    pub struct EventId;
}

/// Identifier of the plug-in that produced an event, or `"SYSTEM"` for the
/// synthetic ROOT event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(pub String);

impl ModuleId {
    pub const SYSTEM: &'static str = "SYSTEM";

    pub fn system() -> Self {
        Self(Self::SYSTEM.to_string())
    }

    pub fn is_system(&self) -> bool {
        self.0 == Self::SYSTEM
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ModuleId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ModuleId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Symbolic event type from an open registry (e.g. `"DOMAIN_NAME"`,
/// `"IP_ADDRESS"`, `"ROOT"`). Unknown types are accepted without
/// registration; producers declare the types they emit via
/// [`crate::plugin::PluginDescriptor`].
///
/// Backed by `Arc<str>` so cloning a type tag (common — it is the routing
/// key in the bus's table) never allocates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventType(Arc<str>);

impl EventType {
    /// The synthetic seed type published once per scan.
    pub const ROOT: &'static str = "ROOT";

    /// The reserved pattern that subscribes to every type.
    pub const WILDCARD: &'static str = "*";

    pub fn root() -> Self {
        Self::new(Self::ROOT)
    }

    pub fn new(value: impl AsRef<str>) -> Self {
        Self(Arc::from(value.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.as_ref() == Self::ROOT
    }

    pub fn is_wildcard(&self) -> bool {
        self.0.as_ref() == Self::WILDCARD
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EventType {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EventType {
    fn from(s: String) -> Self {
        Self(Arc::from(s.as_str()))
    }
}

/// Opaque payload. Semantics are owned entirely by the plug-in that declared
/// the event's type; the core never parses or validates its contents beyond
/// passing it along verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    Text(String),
    Bytes(Vec<u8>),
}

impl Payload {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(s) => Some(s),
            Payload::Bytes(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Payload::Text(s) => s.len(),
            Payload::Bytes(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_string())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(b: Vec<u8>) -> Self {
        Payload::Bytes(b)
    }
}

/// An immutable record exchanged through the bus.
///
/// Invariants upheld by construction (enforced by [`crate::scan`] /
/// the bus, not by this type): every non-ROOT event's `source_event_id`
/// resolves to an event already durably written in the same scan; events
/// are never mutated after [`crate::event::Event::new`] returns. A
/// false-positive mark is out-of-band metadata kept by the storage layer,
/// not a field flipped on a live `Event`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: EventId,
    pub scan_id: ScanId,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub data: Payload,
    pub module: ModuleId,
    /// Causal parent. `None` only for the ROOT event.
    pub source_event_id: Option<EventId>,
    /// Monotonic sequence assigned by the bus on publish, used for
    /// same-(scan, type) FIFO ordering. `0` until published.
    #[serde(default)]
    pub sequence: u64,
    /// Wall-clock creation time in milliseconds since the epoch, for
    /// reporting only — ordering always uses `sequence`.
    pub created_at_ms: u64,
    pub risk: Risk,
    pub confidence: Confidence,
    /// Out-of-band: never set on events flowing through the bus, only
    /// meaningful on storage-layer reads. See module docs.
    #[serde(default)]
    pub is_false_positive: bool,
}

impl Event {
    /// Construct the synthetic ROOT event that seeds a scan.
    pub fn root(
        event_id: EventId,
        scan_id: ScanId,
        target_type: impl Into<EventType>,
        target_value: impl Into<Payload>,
        created_at_ms: u64,
    ) -> Self {
        Self {
            event_id,
            scan_id,
            event_type: target_type.into(),
            data: target_value.into(),
            module: ModuleId::system(),
            source_event_id: None,
            sequence: 0,
            created_at_ms,
            risk: Risk::Info,
            confidence: Confidence::MAX,
            is_false_positive: false,
        }
    }

    /// Construct an event produced by a plug-in in response to another event.
    #[allow(clippy::too_many_arguments)]
    pub fn produced(
        event_id: EventId,
        scan_id: ScanId,
        event_type: impl Into<EventType>,
        data: impl Into<Payload>,
        module: impl Into<ModuleId>,
        source_event_id: EventId,
        created_at_ms: u64,
        risk: Risk,
        confidence: Confidence,
    ) -> Self {
        Self {
            event_id,
            scan_id,
            event_type: event_type.into(),
            data: data.into(),
            module: module.into(),
            source_event_id: Some(source_event_id),
            sequence: 0,
            created_at_ms,
            risk,
            confidence,
            is_false_positive: false,
        }
    }

    pub fn is_root(&self) -> bool {
        self.source_event_id.is_none()
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
