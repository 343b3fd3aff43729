use super::harness;
use kv_resilience_core::ResilienceEvent;
use kv_resilience_reconnect::{ReconnectDenied, ThrottlePhase};
use kv_resilience_store::{Attempt, FailureCause, KvStore, WriteOutcome};

#[tokio::test]
async fn healthy_write_completes_on_first_attempt() {
    let h = harness();

    let outcome = h.store.write("k1", "v1").await;

    assert_eq!(
        outcome,
        WriteOutcome::Completed {
            attempt: Attempt::First
        }
    );
    assert_eq!(outcome.as_str(), "completed");
    assert_eq!(h.memory.get("k1").unwrap().as_deref(), Some("v1"));
}

#[tokio::test]
async fn write_overwrites_previous_value() {
    let h = harness();

    h.store.write("k1", "old").await;
    h.store.write("k1", "new").await;

    assert_eq!(h.memory.get("k1").unwrap().as_deref(), Some("new"));
}

#[tokio::test]
async fn denied_write_fails_without_touching_connection() {
    let h = harness();
    h.memory.set_outage(true);

    let outcome = h.store.write("k1", "v1").await;

    assert!(matches!(
        outcome,
        WriteOutcome::Failed {
            reason: FailureCause::Denied(ReconnectDenied::TooSoon { .. })
        }
    ));
    assert_eq!(outcome.as_str(), "failed");
    assert_eq!(h.memory.close_count(), 0);
    assert_eq!(h.memory.data_calls(), 1);
}

#[tokio::test]
async fn granted_reconnect_retries_write_once() {
    let h = harness();
    h.memory.set_outage(true);
    h.memory.heal_on_reconnect(true);
    h.elapse_interval();

    let outcome = h.store.write("k1", "v1").await;

    assert_eq!(
        outcome,
        WriteOutcome::Completed {
            attempt: Attempt::AfterReconnect
        }
    );
    assert_eq!(h.memory.close_count(), 1);
    assert_eq!(h.memory.data_calls(), 2);
    assert_eq!(h.memory.get("k1").unwrap().as_deref(), Some("v1"));
    assert_eq!(h.store.throttle().phase(), ThrottlePhase::Stable);
}

#[tokio::test]
async fn failed_retry_is_reported_not_retried() {
    let h = harness();
    h.memory.set_outage(true);
    h.elapse_interval();

    let outcome = h.store.write("k1", "v1").await;

    match outcome {
        WriteOutcome::Failed {
            reason: FailureCause::RetryFailed(error),
        } => assert!(error.is_connection_level()),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(h.memory.data_calls(), 2);
    assert_eq!(h.memory.close_count(), 1);
}

#[tokio::test]
async fn failed_reconnect_fails_write() {
    let h = harness();
    h.memory.set_outage(true);
    h.memory.heal_on_reconnect(true);
    h.memory.fail_close_connection(true);
    h.elapse_interval();

    let outcome = h.store.write("k1", "v1").await;

    assert!(matches!(
        outcome,
        WriteOutcome::Failed {
            reason: FailureCause::Denied(ReconnectDenied::ReconnectFailed { .. })
        }
    ));
    assert_eq!(h.memory.data_calls(), 1);
}

#[tokio::test]
async fn write_events_follow_the_operation() {
    let h = harness();
    h.memory.fail_next(1);
    h.elapse_interval();

    h.store.write("k1", "v1").await;

    let types: Vec<_> = h
        .store_events
        .events()
        .iter()
        .map(|e| e.event_type())
        .collect();
    assert_eq!(types, vec!["failed", "retrying", "retry_succeeded"]);
}

#[tokio::test]
async fn empty_key_and_value_are_written() {
    let h = harness();

    assert!(h.store.write("", "").await.is_completed());
    assert_eq!(h.memory.get("").unwrap().as_deref(), Some(""));
}
