// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error classification, fingerprinting, and sliding-window rate tracking
//! (§4.9).

use scanforge_core::{ErrorCategory, ErrorRecord, Fingerprint, ScanId};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Strip concrete values (anything that looks like a number, an IP octet
/// group, or a quoted string) from an error message so unrelated failures
/// with the same shape fingerprint identically.
pub fn normalize_message(message: &str) -> String {
    let mut out = String::with_capacity(message.len());
    let mut chars = message.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '"' || c == '\'' {
            let quote = c;
            out.push('"');
            out.push('#');
            out.push('"');
            while let Some(&next) = chars.peek() {
                if next == quote {
                    chars.next();
                    break;
                }
                chars.next();
            }
        } else if c.is_ascii_digit() {
            while matches!(chars.peek(), Some(d) if d.is_ascii_digit() || *d == '.') {
                chars.next();
            }
            out.push('#');
        } else {
            out.push(c);
        }
    }
    out
}

/// Compute the structural fingerprint over `(class, location, normalized
/// message)` (§4.9, §8 universal invariant grounding).
pub fn fingerprint(class: &str, location: &str, message: &str) -> Fingerprint {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut hasher = DefaultHasher::new();
    class.hash(&mut hasher);
    location.hash(&mut hasher);
    normalize_message(message).hash(&mut hasher);
    Fingerprint::new(format!("{:016x}", hasher.finish()))
}

/// A fixed set of sliding windows tracked per fingerprint and globally.
const RATE_WINDOWS: [Duration; 3] = [
    Duration::from_secs(60),
    Duration::from_secs(5 * 60),
    Duration::from_secs(60 * 60),
];

#[derive(Default)]
struct Counters {
    events: VecDeque<Instant>,
}

impl Counters {
    fn record(&mut self, at: Instant) {
        self.events.push_back(at);
    }

    fn rate(&self, window: Duration, now: Instant) -> u64 {
        self.events
            .iter()
            .rev()
            .take_while(|t| now.duration_since(**t) <= window)
            .count() as u64
    }

    fn evict_older_than(&mut self, window: Duration, now: Instant) {
        while let Some(front) = self.events.front() {
            if now.duration_since(*front) > window {
                self.events.pop_front();
            } else {
                break;
            }
        }
    }
}

/// A registered alert rule: fires `callback` at most once per window when
/// `predicate` holds over the global 1-minute rate.
pub struct AlertRule {
    pub name: String,
    pub predicate: Box<dyn Fn(u64) -> bool + Send + Sync>,
    pub callback: Box<dyn Fn(&str, u64) + Send + Sync>,
}

struct Inner {
    ring: VecDeque<ErrorRecord>,
    ring_capacity: usize,
    by_fingerprint: HashMap<Fingerprint, ErrorRecord>,
    global_rate: Counters,
    per_module_rate: HashMap<String, Counters>,
    alert_rules: Vec<AlertRule>,
    fired_this_window: HashMap<String, Instant>,
}

/// Fingerprint-grouped error store with a bounded ring buffer, per-category
/// rate windows, and alert callbacks.
#[derive(Clone)]
pub struct Telemetry {
    inner: Arc<Mutex<Inner>>,
}

impl Telemetry {
    pub fn new(ring_capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                ring: VecDeque::new(),
                ring_capacity,
                by_fingerprint: HashMap::new(),
                global_rate: Counters::default(),
                per_module_rate: HashMap::new(),
                alert_rules: Vec::new(),
                fired_this_window: HashMap::new(),
            })),
        }
    }

    pub fn register_alert(&self, rule: AlertRule) {
        self.inner.lock().alert_rules.push(rule);
    }

    /// Record a classified handler error. Returns the merged record (count
    /// reflects all prior occurrences of the same fingerprint).
    pub fn record(
        &self,
        scan_id: ScanId,
        module: &str,
        category: ErrorCategory,
        fp: Fingerprint,
        sample_stack: String,
        now_ms: u64,
        now: Instant,
    ) -> ErrorRecord {
        let mut inner = self.inner.lock();

        let record = inner
            .by_fingerprint
            .entry(fp.clone())
            .and_modify(|r| {
                r.count += 1;
                r.last_seen_ms = now_ms;
            })
            .or_insert_with(|| ErrorRecord {
                fingerprint: fp.clone(),
                category,
                first_seen_ms: now_ms,
                last_seen_ms: now_ms,
                count: 1,
                scan_id: scan_id.clone(),
                module: module.to_string(),
                sample_stack,
            })
            .clone();

        inner.ring.push_back(record.clone());
        while inner.ring.len() > inner.ring_capacity {
            inner.ring.pop_front();
        }

        inner.global_rate.record(now);
        inner
            .per_module_rate
            .entry(module.to_string())
            .or_default()
            .record(now);

        let global_1m = inner.global_rate.rate(RATE_WINDOWS[0], now);
        let rules: Vec<usize> = (0..inner.alert_rules.len()).collect();
        for idx in rules {
            let (name, fires) = {
                let rule = &inner.alert_rules[idx];
                (rule.name.clone(), (rule.predicate)(global_1m))
            };
            if !fires {
                continue;
            }
            let already_fired = inner
                .fired_this_window
                .get(&name)
                .is_some_and(|t| now.duration_since(*t) < RATE_WINDOWS[0]);
            if already_fired {
                continue;
            }
            inner.fired_this_window.insert(name.clone(), now);
            (inner.alert_rules[idx].callback)(&name, global_1m);
        }

        record
    }

    /// Query the ring buffer, optionally filtered by scan/module/category.
    pub fn query(
        &self,
        scan_id: Option<&ScanId>,
        module: Option<&str>,
        category: Option<ErrorCategory>,
    ) -> Vec<ErrorRecord> {
        self.inner
            .lock()
            .ring
            .iter()
            .filter(|r| scan_id.is_none_or(|s| &r.scan_id == s))
            .filter(|r| module.is_none_or(|m| r.module == m))
            .filter(|r| category.is_none_or(|c| r.category == c))
            .cloned()
            .collect()
    }

    /// Sliding-window rate for one of the three default windows
    /// (1 min / 5 min / 1 h), globally or for one module.
    pub fn rate(&self, window_index: usize, module: Option<&str>, now: Instant) -> u64 {
        let window = RATE_WINDOWS[window_index.min(RATE_WINDOWS.len() - 1)];
        let mut inner = self.inner.lock();
        inner.global_rate.evict_older_than(RATE_WINDOWS[2], now);
        match module {
            None => inner.global_rate.rate(window, now),
            Some(m) => inner
                .per_module_rate
                .get(m)
                .map(|c| c.rate(window, now))
                .unwrap_or(0),
        }
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<ErrorRecord> {
        self.inner.lock().by_fingerprint.get(fingerprint).cloned()
    }
}

#[cfg(test)]
#[path = "telemetry_tests.rs"]
mod tests;
