// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Static plug-in registration metadata.

use crate::event::EventType;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Administrator-visible labels describing plug-in behavior, e.g. whether
/// it is slow, invasive, or needs an API key. Purely informational to the
/// core; consumed by out-of-scope UI/resolver-hint layers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginFlag(pub String);

impl PluginFlag {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }
}

impl From<&str> for PluginFlag {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Static registration record for a plug-in, returned by
/// `descriptor()` (see the `Plugin` contract in `scanforge-engine`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginDescriptor {
    pub name: String,
    pub watched_events: HashSet<EventType>,
    pub produced_events: HashSet<EventType>,
    /// Subset of `watched_events` without which the plug-in cannot run.
    pub required_inputs: HashSet<EventType>,
    pub optional_inputs: HashSet<EventType>,
    pub flags: HashSet<PluginFlag>,
    pub category: String,
}

impl PluginDescriptor {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            watched_events: HashSet::new(),
            produced_events: HashSet::new(),
            required_inputs: HashSet::new(),
            optional_inputs: HashSet::new(),
            flags: HashSet::new(),
            category: category.into(),
        }
    }

    pub fn watching(mut self, types: impl IntoIterator<Item = EventType>) -> Self {
        self.watched_events.extend(types);
        self
    }

    pub fn producing(mut self, types: impl IntoIterator<Item = EventType>) -> Self {
        self.produced_events.extend(types);
        self
    }

    pub fn requiring(mut self, types: impl IntoIterator<Item = EventType>) -> Self {
        self.required_inputs.extend(types);
        self
    }

    pub fn with_flag(mut self, flag: impl Into<PluginFlag>) -> Self {
        self.flags.insert(flag.into());
        self
    }

    /// Whether this plug-in would accept delivery of an event of `event_type`,
    /// i.e. it watches that exact type or subscribes to the wildcard.
    pub fn watches(&self, event_type: &EventType) -> bool {
        self.watched_events.contains(event_type)
            || self.watched_events.iter().any(|t| t.is_wildcard())
    }
}

#[cfg(test)]
#[path = "plugin_tests.rs"]
mod tests;
