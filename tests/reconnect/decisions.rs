use super::{INTERVAL, WINDOW, closed, harness, refused};
use kv_resilience_reconnect::{ReconnectDenied, ThrottlePhase};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const LOCK_TIMEOUT: Duration = Duration::from_millis(100);

#[test]
fn new_throttle_is_stable_and_rate_limited_from_creation() {
    let h = harness(LOCK_TIMEOUT);
    assert_eq!(h.throttle.phase(), ThrottlePhase::Stable);

    h.clock.advance(INTERVAL - Duration::from_millis(1));
    let denied = h.throttle.decide(closed).unwrap_err();

    assert!(matches!(denied, ReconnectDenied::TooSoon { .. }));
    assert_eq!(h.throttle.phase(), ThrottlePhase::Failing);
}

#[test]
fn granted_reconnect_advances_last_reconnect() {
    let h = harness(LOCK_TIMEOUT);
    let created = h.throttle.snapshot().last_reconnect;

    h.clock.advance(INTERVAL);
    h.throttle.decide(closed).unwrap();
    let first = h.throttle.snapshot().last_reconnect;

    h.clock.advance(INTERVAL * 2);
    h.throttle.decide(closed).unwrap();
    let second = h.throttle.snapshot().last_reconnect;

    assert!(first > created);
    assert!(second > first);
    assert_eq!(h.throttle.snapshot().reconnects, 2);
}

#[test]
fn denied_decision_does_not_touch_last_reconnect() {
    let h = harness(LOCK_TIMEOUT);
    let created = h.throttle.snapshot().last_reconnect;

    h.clock.advance(Duration::from_secs(5));
    assert!(h.throttle.decide(closed).is_err());

    h.clock.advance(INTERVAL);
    assert!(h.throttle.decide(refused).is_err());

    assert_eq!(h.throttle.snapshot().last_reconnect, created);
    assert_eq!(h.throttle.snapshot().denials, 2);
}

#[test]
fn failed_reconnect_can_be_tried_again_by_next_failure() {
    let h = harness(LOCK_TIMEOUT);
    h.clock.advance(INTERVAL);

    let denied = h.throttle.decide(refused).unwrap_err();
    assert_eq!(
        denied,
        ReconnectDenied::ReconnectFailed {
            message: "connection refused".to_string()
        }
    );
    assert_eq!(h.throttle.phase(), ThrottlePhase::Failing);

    h.throttle.decide(closed).unwrap();
    assert_eq!(h.throttle.phase(), ThrottlePhase::Stable);
}

#[test]
fn window_exhausts_and_stays_exhausted_until_success() {
    let h = harness(LOCK_TIMEOUT);
    let attempts = AtomicUsize::new(0);
    let counted_refusal = || {
        attempts.fetch_add(1, Ordering::SeqCst);
        refused()
    };

    h.clock.advance(INTERVAL);
    assert!(h.throttle.decide(counted_refusal).is_err());
    let opened_at = h.throttle.snapshot().first_failure;
    assert!(opened_at.is_some());

    h.clock.advance(WINDOW);
    let denied = h.throttle.decide(counted_refusal).unwrap_err();
    assert_eq!(denied, ReconnectDenied::WindowExhausted { elapsed: WINDOW });
    assert!(denied.is_exhausted());
    assert_eq!(h.throttle.phase(), ThrottlePhase::Exhausted);

    // Further failures neither reconnect nor move the window start.
    for _ in 0..5 {
        h.clock.advance(INTERVAL * 4);
        assert!(h.throttle.decide(counted_refusal).unwrap_err().is_exhausted());
    }
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(h.throttle.snapshot().first_failure, opened_at);

    h.throttle.record_success();
    assert_eq!(h.throttle.phase(), ThrottlePhase::Stable);

    h.throttle.decide(closed).unwrap();
    assert_eq!(h.throttle.snapshot().reconnects, 1);
}

#[test]
fn window_is_shared_by_every_caller() {
    let h = harness(LOCK_TIMEOUT);

    h.clock.advance(Duration::from_secs(1));
    assert!(h.throttle.decide(closed).is_err());
    let opened_at = h.throttle.snapshot().first_failure;

    h.clock.advance(Duration::from_secs(1));
    assert!(h.throttle.decide(closed).is_err());

    assert_eq!(h.throttle.snapshot().first_failure, opened_at);
}

#[test]
fn success_from_anywhere_resets_window() {
    let h = harness(LOCK_TIMEOUT);

    h.clock.advance(Duration::from_secs(1));
    assert!(h.throttle.decide(closed).is_err());
    assert!(h.throttle.snapshot().first_failure.is_some());

    h.throttle.record_success();

    let snapshot = h.throttle.snapshot();
    assert_eq!(snapshot.first_failure, None);
    assert_eq!(snapshot.phase, ThrottlePhase::Stable);
}
