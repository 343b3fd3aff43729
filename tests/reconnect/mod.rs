//! Tests for the reconnect throttle.
//!
//! Test organization:
//! - decisions.rs: Phase transitions and the order of checks
//! - concurrency.rs: Concurrent callers racing for one reconnect
//! - events.rs: Listener behavior

mod decisions;

use kv_resilience_core::{ManualClock, RecordingListener};
use kv_resilience_reconnect::{ReconnectConfig, ReconnectEvent, ReconnectThrottle};
use std::sync::Arc;
use std::time::Duration;

pub(crate) const INTERVAL: Duration = Duration::from_secs(30);
pub(crate) const WINDOW: Duration = Duration::from_secs(30 * 60);

pub(crate) struct Harness {
    pub clock: ManualClock,
    pub throttle: Arc<ReconnectThrottle>,
    pub events: Arc<RecordingListener<ReconnectEvent>>,
}

pub(crate) fn harness(lock_timeout: Duration) -> Harness {
    let clock = ManualClock::new();
    let events = RecordingListener::new();
    let throttle = Arc::new(ReconnectThrottle::new(
        ReconnectConfig::builder()
            .name("it")
            .clock(clock.clone())
            .min_reconnect_interval(INTERVAL)
            .max_failure_window(WINDOW)
            .reconnect_lock_timeout(lock_timeout)
            .listener(events.clone())
            .build(),
    ));
    Harness {
        clock,
        throttle,
        events,
    }
}

pub(crate) fn closed() -> Result<(), std::io::Error> {
    Ok(())
}

pub(crate) fn refused() -> Result<(), std::io::Error> {
    Err(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "connection refused",
    ))
}
