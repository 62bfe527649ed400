// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscription data shapes shared between the core model and the bus.
//!
//! The live, callable side of a subscription (the predicate closure and the
//! dispatch handle) is a runtime concept owned by `scanforge-engine`; this
//! module only carries the part of a subscription that is plain data.

use crate::event::EventType;
use serde::{Deserialize, Serialize};
use std::fmt;

crate::define_id! {
    /// Handle returned by `subscribe`; unsubscribing by id is O(1).
    pub struct SubscriptionId;
}

/// Where a matched event is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Invoked on the publisher's own worker context, in-line with `publish`.
    SyncInline,
    /// Enqueued as a `WorkItem` for the worker pool.
    AsyncPool,
}

/// An exact event type, or the wildcard pattern matching every type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TopicPattern {
    Exact(EventType),
    Wildcard,
}

impl TopicPattern {
    pub fn matches(&self, event_type: &EventType) -> bool {
        match self {
            TopicPattern::Exact(t) => t == event_type,
            TopicPattern::Wildcard => true,
        }
    }

    /// The routing-table bucket key for this pattern: exact types route by
    /// their own string, the wildcard always routes to the `"*"` bucket.
    pub fn bucket_key(&self) -> &str {
        match self {
            TopicPattern::Exact(t) => t.as_str(),
            TopicPattern::Wildcard => EventType::WILDCARD,
        }
    }
}

impl From<EventType> for TopicPattern {
    fn from(t: EventType) -> Self {
        if t.is_wildcard() {
            TopicPattern::Wildcard
        } else {
            TopicPattern::Exact(t)
        }
    }
}

impl fmt::Display for TopicPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopicPattern::Exact(t) => write!(f, "{t}"),
            TopicPattern::Wildcard => write!(f, "*"),
        }
    }
}

#[cfg(test)]
#[path = "subscription_tests.rs"]
mod tests;
