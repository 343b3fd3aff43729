//! Events emitted by the reconnect throttle.

use crate::error::ReconnectDenied;
use kv_resilience_core::ResilienceEvent;
use std::time::{Duration, Instant};

/// Events emitted by [`ReconnectThrottle`](crate::ReconnectThrottle).
#[derive(Debug, Clone)]
pub enum ReconnectEvent {
    /// The first failure after a stable period opened a failure window.
    FailureWindowOpened {
        /// Name of the throttle instance.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
    },

    /// A caller holds the reconnect lock and is about to run the reconnect action.
    ReconnectStarted {
        /// Name of the throttle instance.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
    },

    /// The reconnect action completed and the failure window was cleared.
    ReconnectSucceeded {
        /// Name of the throttle instance.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Total reconnects executed by this throttle, including this one.
        reconnects: u64,
    },

    /// The reconnect action returned an error.
    ReconnectFailed {
        /// Name of the throttle instance.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Display form of the reconnect error.
        error: String,
    },

    /// A caller was told not to retry.
    Denied {
        /// Name of the throttle instance.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Why the reconnect was refused.
        reason: ReconnectDenied,
    },

    /// A successful operation closed an open failure window.
    FailureWindowReset {
        /// Name of the throttle instance.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// How long the window had been open.
        open_for: Duration,
    },
}

impl ResilienceEvent for ReconnectEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::FailureWindowOpened { .. } => "failure_window_opened",
            Self::ReconnectStarted { .. } => "reconnect_started",
            Self::ReconnectSucceeded { .. } => "reconnect_succeeded",
            Self::ReconnectFailed { .. } => "reconnect_failed",
            Self::Denied { .. } => "denied",
            Self::FailureWindowReset { .. } => "failure_window_reset",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            Self::FailureWindowOpened { timestamp, .. }
            | Self::ReconnectStarted { timestamp, .. }
            | Self::ReconnectSucceeded { timestamp, .. }
            | Self::ReconnectFailed { timestamp, .. }
            | Self::Denied { timestamp, .. }
            | Self::FailureWindowReset { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            Self::FailureWindowOpened { pattern_name, .. }
            | Self::ReconnectStarted { pattern_name, .. }
            | Self::ReconnectSucceeded { pattern_name, .. }
            | Self::ReconnectFailed { pattern_name, .. }
            | Self::Denied { pattern_name, .. }
            | Self::FailureWindowReset { pattern_name, .. } => pattern_name,
        }
    }
}
