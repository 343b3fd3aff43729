//! Failure-window bookkeeping for the throttle.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// The externally meaningful phase of a throttle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ThrottlePhase {
    /// No failure observed since the last success or reconnect.
    Stable,

    /// Failures observed and the failure window is still open.
    Failing,

    /// The failure window has lasted at least `max_failure_window`.
    Exhausted,
}

impl ThrottlePhase {
    /// Lowercase name, suitable for logs and health endpoints.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Failing => "failing",
            Self::Exhausted => "exhausted",
        }
    }
}

/// Point-in-time view of a throttle.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectSnapshot {
    /// Phase at the time of the snapshot.
    pub phase: ThrottlePhase,
    /// Start of the open failure window, if any.
    pub first_failure: Option<Instant>,
    /// Last executed reconnect, or the throttle's creation time.
    pub last_reconnect: Instant,
    /// Total reconnects executed.
    pub reconnects: u64,
    /// Total denials handed out.
    pub denials: u64,
}

/// The two timestamps every decision reads and writes together.
#[derive(Debug)]
pub(crate) struct FailureWindow {
    first_failure: Option<Instant>,
    last_reconnect: Instant,
}

impl FailureWindow {
    fn new(now: Instant) -> Self {
        Self {
            first_failure: None,
            last_reconnect: now,
        }
    }

    /// Opens the window at `now` unless it is already open.
    ///
    /// Returns `true` if this call opened it.
    pub(crate) fn open(&mut self, now: Instant) -> bool {
        if self.first_failure.is_none() {
            self.first_failure = Some(now);
            true
        } else {
            false
        }
    }

    /// Time the window has been open, zero when closed.
    pub(crate) fn open_for(&self, now: Instant) -> Duration {
        self.first_failure
            .map(|start| now.saturating_duration_since(start))
            .unwrap_or(Duration::ZERO)
    }

    pub(crate) fn since_last_reconnect(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_reconnect)
    }

    pub(crate) fn phase(&self, now: Instant, max_failure_window: Duration) -> ThrottlePhase {
        match self.first_failure {
            None => ThrottlePhase::Stable,
            Some(_) if self.open_for(now) >= max_failure_window => ThrottlePhase::Exhausted,
            Some(_) => ThrottlePhase::Failing,
        }
    }

    /// Records an executed reconnect and closes the window.
    pub(crate) fn record_reconnect(&mut self, now: Instant) {
        // never move backwards, even with a clock that jitters
        if now > self.last_reconnect {
            self.last_reconnect = now;
        }
        self.first_failure = None;
    }

    /// Closes the window. Returns how long it had been open, if it was.
    pub(crate) fn close(&mut self, now: Instant) -> Option<Duration> {
        self.first_failure
            .take()
            .map(|start| now.saturating_duration_since(start))
    }
}

/// Shared state behind a throttle.
#[derive(Debug)]
pub(crate) struct ReconnectState {
    pub(crate) window: Mutex<FailureWindow>,
    reconnects: AtomicU64,
    denials: AtomicU64,
}

impl ReconnectState {
    pub(crate) fn new(now: Instant) -> Self {
        Self {
            window: Mutex::new(FailureWindow::new(now)),
            reconnects: AtomicU64::new(0),
            denials: AtomicU64::new(0),
        }
    }

    pub(crate) fn increment_reconnects(&self) -> u64 {
        self.reconnects.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub(crate) fn increment_denials(&self) -> u64 {
        self.denials.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub(crate) fn snapshot(&self, now: Instant, max_failure_window: Duration) -> ReconnectSnapshot {
        let window = self.window.lock();
        ReconnectSnapshot {
            phase: window.phase(now, max_failure_window),
            first_failure: window.first_failure,
            last_reconnect: window.last_reconnect,
            reconnects: self.reconnects.load(Ordering::Acquire),
            denials: self.denials.load(Ordering::Acquire),
        }
    }
}
