// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Strategy-driven retries with jitter, an attempt ceiling, and a
//! dead-letter sink (§4.8).

use rand::Rng;
use scanforge_core::{ErrorCategory, WorkItem};
use std::collections::HashMap;
use std::time::Duration;

/// Per-category retry strategy (§4.8).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RetryStrategy {
    /// No retry; immediate DLQ.
    None,
    /// Constant gap between attempts.
    Fixed { delay: Duration },
    /// `delay = base * attempt`.
    Linear { base: Duration },
    /// `delay = min(cap, base * factor^(attempt-1))`, plus uniform jitter in
    /// `[0, 0.25 * delay]`.
    Exponential {
        base: Duration,
        factor: f64,
        cap: Duration,
    },
}

impl RetryStrategy {
    /// Delay before the given attempt number (1-indexed: the attempt that
    /// just failed), jitter excluded so callers can test the base formula.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        match *self {
            RetryStrategy::None => Duration::ZERO,
            RetryStrategy::Fixed { delay } => delay,
            RetryStrategy::Linear { base } => base * attempt,
            RetryStrategy::Exponential { base, factor, cap } => {
                let scaled = base.as_secs_f64() * factor.powi(attempt as i32 - 1);
                Duration::from_secs_f64(scaled.min(cap.as_secs_f64()))
            }
        }
    }

    /// Delay with uniform jitter applied, using the supplied RNG so tests
    /// can assert bounds deterministically.
    pub fn delay_with_jitter(&self, attempt: u32, rng: &mut impl Rng) -> Duration {
        let base = self.base_delay(attempt);
        if matches!(self, RetryStrategy::None) {
            return base;
        }
        let jitter_max = base.as_secs_f64() * 0.25;
        let jitter = rng.random_range(0.0..=jitter_max.max(0.0));
        base + Duration::from_secs_f64(jitter)
    }
}

/// Terminal record for a work item that exceeded its retry ceiling or was
/// evicted by a `DropOldest` queue lane.
#[derive(Debug, Clone)]
pub struct DeadLetter {
    pub item: WorkItem,
    pub reason: DeadLetterReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadLetterReason {
    RetryCeilingExceeded,
    QueueEvicted,
    PermanentError,
    DeliveryDepthExceeded,
}

/// Drives retry decisions for failed work items. Retry-ceiling defaults are
/// global, overridable per category (§4.8).
pub struct RetryLayer {
    global_ceiling: u32,
    per_category_ceiling: HashMap<ErrorCategory, u32>,
    strategy_for: HashMap<ErrorCategory, RetryStrategy>,
    default_strategy: RetryStrategy,
}

impl RetryLayer {
    pub fn new(global_ceiling: u32, default_strategy: RetryStrategy) -> Self {
        Self {
            global_ceiling,
            per_category_ceiling: HashMap::new(),
            strategy_for: HashMap::new(),
            default_strategy,
        }
    }

    pub fn set_ceiling(&mut self, category: ErrorCategory, ceiling: u32) {
        self.per_category_ceiling.insert(category, ceiling);
    }

    pub fn set_strategy(&mut self, category: ErrorCategory, strategy: RetryStrategy) {
        self.strategy_for.insert(category, strategy);
    }

    fn ceiling_for(&self, category: ErrorCategory) -> u32 {
        self.per_category_ceiling
            .get(&category)
            .copied()
            .unwrap_or(self.global_ceiling)
    }

    fn strategy_for(&self, category: ErrorCategory) -> RetryStrategy {
        self.strategy_for.get(&category).copied().unwrap_or(self.default_strategy)
    }

    /// Decide the outcome for a failed work item: either the next attempt
    /// (re-enqueued at LOW priority per §4.8) with its delay, or a
    /// dead-letter.
    pub fn on_failure(&self, item: &WorkItem, category: ErrorCategory) -> RetryOutcome {
        if !category.is_transient() {
            return RetryOutcome::DeadLetter(DeadLetter {
                item: item.clone(),
                reason: DeadLetterReason::PermanentError,
            });
        }
        let strategy = self.strategy_for(category);
        if matches!(strategy, RetryStrategy::None) {
            return RetryOutcome::DeadLetter(DeadLetter {
                item: item.clone(),
                reason: DeadLetterReason::RetryCeilingExceeded,
            });
        }
        let ceiling = self.ceiling_for(category);
        if item.attempt >= ceiling {
            return RetryOutcome::DeadLetter(DeadLetter {
                item: item.clone(),
                reason: DeadLetterReason::RetryCeilingExceeded,
            });
        }
        let next = item.next_attempt(scanforge_core::Priority::Low);
        let delay = strategy.base_delay(item.attempt);
        RetryOutcome::Retry { item: next, delay }
    }
}

pub enum RetryOutcome {
    Retry { item: WorkItem, delay: Duration },
    DeadLetter(DeadLetter),
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
