// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use scanforge_core::{Event, EventId, Priority, ScanId, WorkItemId};

fn item(attempt: u32) -> WorkItem {
    let event = Event::root(EventId::new("ev-1"), ScanId::new("scan-1"), "ROOT", "x", 1_000);
    let mut wi = WorkItem::new(WorkItemId::new("wi-1"), "plugin-a", event, Priority::Normal);
    wi.attempt = attempt;
    wi
}

#[test]
fn fixed_strategy_delay_is_constant() {
    let strategy = RetryStrategy::Fixed { delay: Duration::from_millis(500) };
    assert_eq!(strategy.base_delay(1), Duration::from_millis(500));
    assert_eq!(strategy.base_delay(4), Duration::from_millis(500));
}

#[test]
fn linear_strategy_scales_by_attempt() {
    let strategy = RetryStrategy::Linear { base: Duration::from_millis(100) };
    assert_eq!(strategy.base_delay(3), Duration::from_millis(300));
}

#[test]
fn exponential_strategy_caps_growth() {
    let strategy = RetryStrategy::Exponential {
        base: Duration::from_millis(100),
        factor: 2.0,
        cap: Duration::from_secs(5),
    };
    assert_eq!(strategy.base_delay(1), Duration::from_millis(100));
    assert_eq!(strategy.base_delay(2), Duration::from_millis(200));
    assert_eq!(strategy.base_delay(3), Duration::from_millis(400));
    // 100ms * 2^9 = 51200ms, well past the 5s cap.
    assert_eq!(strategy.base_delay(10), Duration::from_secs(5));
}

#[test]
fn jitter_never_exceeds_a_quarter_of_the_base_delay() {
    let strategy = RetryStrategy::Fixed { delay: Duration::from_millis(1000) };
    let mut rng = rand::rng();
    for attempt in 1..=5 {
        let jittered = strategy.delay_with_jitter(attempt, &mut rng);
        assert!(jittered >= Duration::from_millis(1000));
        assert!(jittered <= Duration::from_millis(1250));
    }
}

#[test]
fn permanent_category_dead_letters_without_retry() {
    let layer = RetryLayer::new(5, RetryStrategy::Fixed { delay: Duration::from_millis(10) });
    let outcome = layer.on_failure(&item(1), ErrorCategory::Auth);
    match outcome {
        RetryOutcome::DeadLetter(dl) => assert_eq!(dl.reason, DeadLetterReason::PermanentError),
        _ => panic!("expected dead letter"),
    }
}

#[test]
fn transient_category_retries_until_ceiling_then_dead_letters() {
    let layer = RetryLayer::new(3, RetryStrategy::Fixed { delay: Duration::from_millis(10) });

    for attempt in 1..3 {
        let outcome = layer.on_failure(&item(attempt), ErrorCategory::TransientNetwork);
        match outcome {
            RetryOutcome::Retry { item, .. } => {
                assert_eq!(item.attempt, attempt + 1);
                assert_eq!(item.priority, Priority::Low);
            }
            RetryOutcome::DeadLetter(_) => panic!("should still retry at attempt {attempt}"),
        }
    }

    let outcome = layer.on_failure(&item(3), ErrorCategory::TransientNetwork);
    match outcome {
        RetryOutcome::DeadLetter(dl) => assert_eq!(dl.reason, DeadLetterReason::RetryCeilingExceeded),
        _ => panic!("expected ceiling breach to dead-letter"),
    }
}

#[test]
fn per_category_ceiling_overrides_global() {
    let mut layer = RetryLayer::new(5, RetryStrategy::Fixed { delay: Duration::from_millis(10) });
    layer.set_ceiling(ErrorCategory::Timeout, 1);

    let outcome = layer.on_failure(&item(1), ErrorCategory::Timeout);
    assert!(matches!(outcome, RetryOutcome::DeadLetter(_)));
}
