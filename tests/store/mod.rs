//! Tests for the resilient store wrapper.
//!
//! Test organization:
//! - write.rs: Write outcomes and the retry-once policy
//! - read.rs: Read outcomes and fallback tagging
//! - delete_all.rs: Delete-all summaries
//! - scenarios.rs: End-to-end scenarios with concurrent callers
//! - service.rs: The tower::Service surface
//! - logging.rs: Log lines emitted for outcomes and reconnects

mod read;
mod write;

use kv_resilience_core::{ManualClock, RecordingListener};
use kv_resilience_reconnect::{ReconnectConfig, ReconnectEvent, ReconnectThrottle};
use kv_resilience_store::{MemoryStore, ResilientStore, StoreEvent};
use std::sync::Arc;
use std::time::Duration;

pub(crate) const INTERVAL: Duration = Duration::from_secs(30);

pub(crate) struct Harness {
    pub clock: ManualClock,
    pub memory: Arc<MemoryStore>,
    pub store: ResilientStore<Arc<MemoryStore>>,
    pub store_events: Arc<RecordingListener<StoreEvent>>,
    pub throttle_events: Arc<RecordingListener<ReconnectEvent>>,
}

impl Harness {
    /// Moves the clock past the first reconnect interval.
    pub fn elapse_interval(&self) {
        self.clock.advance(INTERVAL);
    }
}

pub(crate) fn harness() -> Harness {
    let clock = ManualClock::new();
    let memory = Arc::new(MemoryStore::new());
    let store_events = RecordingListener::new();
    let throttle_events = RecordingListener::new();

    let throttle = Arc::new(ReconnectThrottle::new(
        ReconnectConfig::builder()
            .name("it")
            .clock(clock.clone())
            .min_reconnect_interval(INTERVAL)
            .max_failure_window(Duration::from_secs(30 * 60))
            .reconnect_lock_timeout(Duration::from_secs(2))
            .listener(throttle_events.clone())
            .build(),
    ));

    let store = ResilientStore::builder(Arc::clone(&memory))
        .name("it")
        .throttle(throttle)
        .listener(store_events.clone())
        .build();

    Harness {
        clock,
        memory,
        store,
        store_events,
        throttle_events,
    }
}
