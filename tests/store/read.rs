use super::harness;
use kv_resilience_fallback::{DEFAULT_FALLBACK_VALUE, Fallback};
use kv_resilience_reconnect::ReconnectDenied;
use kv_resilience_store::{
    Attempt, FailureCause, MemoryStore, ReadOutcome, ResilientStore,
};
use std::sync::Arc;

#[tokio::test]
async fn read_returns_written_value() {
    let h = harness();
    h.store.write("k1", "v1").await;

    assert_eq!(
        h.store.read("k1").await,
        ReadOutcome::Found {
            value: "v1".to_string(),
            attempt: Attempt::First
        }
    );
}

#[tokio::test]
async fn missing_key_is_not_a_fallback() {
    let h = harness();

    let outcome = h.store.read("missing").await;

    assert_eq!(
        outcome,
        ReadOutcome::NotFound {
            attempt: Attempt::First
        }
    );
    assert_eq!(outcome.value(), None);
    assert_eq!(h.store_events.count("fallback_used"), 0);
}

#[tokio::test]
async fn denied_read_returns_tagged_sentinel() {
    let h = harness();
    h.memory.set_outage(true);

    let outcome = h.store.read("k1").await;

    match &outcome {
        ReadOutcome::Fallback { value, cause } => {
            assert_eq!(value, "fallback_value");
            assert!(matches!(
                cause,
                FailureCause::Denied(ReconnectDenied::TooSoon { .. })
            ));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(h.store_events.count("fallback_used"), 1);
}

#[tokio::test]
async fn stored_sentinel_is_not_mistaken_for_fallback() {
    let h = harness();
    h.store.write("k1", "fallback_value").await;

    let outcome = h.store.read("k1").await;

    assert!(!outcome.is_fallback());
    assert_eq!(outcome.value(), Some("fallback_value"));
}

#[tokio::test]
async fn read_after_reconnect_is_tagged() {
    let h = harness();
    h.store.write("k1", "v1").await;
    h.memory.set_outage(true);
    h.memory.heal_on_reconnect(true);
    h.elapse_interval();

    assert_eq!(
        h.store.read("k1").await,
        ReadOutcome::Found {
            value: "v1".to_string(),
            attempt: Attempt::AfterReconnect
        }
    );
}

#[tokio::test]
async fn failed_retry_read_falls_back() {
    let h = harness();
    h.memory.set_outage(true);
    h.elapse_interval();

    let outcome = h.store.read("k1").await;

    assert!(matches!(
        outcome,
        ReadOutcome::Fallback {
            cause: FailureCause::RetryFailed(_),
            ..
        }
    ));
    assert_eq!(outcome.into_value().as_deref(), Some("fallback_value"));
}

#[tokio::test]
async fn custom_fallback_provider_sees_key() {
    let memory = Arc::new(MemoryStore::new());
    memory.set_outage(true);
    let store = ResilientStore::builder(Arc::clone(&memory))
        .fallback(
            Fallback::builder()
                .provider(|key: &str| format!("default:{key}"))
                .build(),
        )
        .build();

    assert_eq!(
        store.read("theme").await.into_value().as_deref(),
        Some("default:theme")
    );
}

#[tokio::test]
async fn panicking_fallback_provider_serves_default_value() {
    let memory = Arc::new(MemoryStore::new());
    memory.set_outage(true);
    let store = ResilientStore::builder(Arc::clone(&memory))
        .fallback(
            Fallback::builder()
                .provider(|_: &str| -> String { panic!("provider bug") })
                .build(),
        )
        .build();

    let outcome = store.read_blocking("k1");
    assert!(outcome.is_fallback());
    assert_eq!(outcome.value(), Some(DEFAULT_FALLBACK_VALUE));

    let outcome = store.read("k1").await;
    assert_eq!(outcome.into_value().as_deref(), Some(DEFAULT_FALLBACK_VALUE));
}
