//! Reasons the throttle refuses a reconnect.

use std::time::Duration;

/// The throttle refused to reconnect for this caller.
///
/// A denial is not a failure of the throttle itself: it tells the caller to
/// take its degraded path (fallback for reads, a failed outcome for writes)
/// instead of retrying.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconnectDenied {
    /// The current failure window has lasted at least `max_failure_window`.
    #[error("giving up reconnect attempts: failing for {elapsed:?}")]
    WindowExhausted {
        /// Time since the failure window opened.
        elapsed: Duration,
    },

    /// The last reconnect happened less than `min_reconnect_interval` ago.
    #[error("reconnect skipped: last reconnect was {since_last:?} ago")]
    TooSoon {
        /// Time since the last executed reconnect.
        since_last: Duration,
    },

    /// Another caller held the reconnect lock for the whole bounded wait.
    #[error("another caller is already reconnecting (waited {waited:?})")]
    LockContended {
        /// How long this caller waited for the lock.
        waited: Duration,
    },

    /// The reconnect action itself failed.
    #[error("failed to reconnect: {message}")]
    ReconnectFailed {
        /// Display form of the reconnect error.
        message: String,
    },
}

impl ReconnectDenied {
    /// Stable label used in events and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::WindowExhausted { .. } => "window_exhausted",
            Self::TooSoon { .. } => "too_soon",
            Self::LockContended { .. } => "lock_contended",
            Self::ReconnectFailed { .. } => "reconnect_failed",
        }
    }

    /// Returns `true` if the throttle has given up on this failure window.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::WindowExhausted { .. })
    }
}
