//! Events emitted by the fallback.

use kv_resilience_core::ResilienceEvent;
use std::time::Instant;

/// Events emitted by [`Fallback`](crate::Fallback).
#[derive(Debug, Clone)]
pub enum FallbackEvent {
    /// A degraded value was served.
    Applied {
        /// Name of the fallback instance.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// The key the value was served for.
        key: String,
    },
}

impl ResilienceEvent for FallbackEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::Applied { .. } => "applied",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            Self::Applied { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            Self::Applied { pattern_name, .. } => pattern_name,
        }
    }
}
