//! Events emitted by the resilient store wrapper.

use crate::error::StoreError;
use crate::outcome::OperationKind;
use kv_resilience_core::ResilienceEvent;
use kv_resilience_reconnect::ReconnectDenied;
use std::time::Instant;

/// Events emitted by [`ResilientStore`](crate::ResilientStore).
///
/// A single operation emits, in order:
/// - `Succeeded`, or
/// - `Failed`, then either `Denied` or `Retrying` followed by
///   `RetrySucceeded` / `RetryFailed`,
///
/// and `FallbackUsed` last whenever a read was answered by the fallback.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// The first attempt succeeded.
    Succeeded {
        /// Name of the store instance.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Operation kind.
        operation: OperationKind,
    },

    /// The first attempt failed.
    Failed {
        /// Name of the store instance.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Operation kind.
        operation: OperationKind,
        /// The store error.
        error: StoreError,
    },

    /// A reconnect was granted and the operation is being retried.
    Retrying {
        /// Name of the store instance.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Operation kind.
        operation: OperationKind,
    },

    /// The retry after a reconnect succeeded.
    RetrySucceeded {
        /// Name of the store instance.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Operation kind.
        operation: OperationKind,
    },

    /// The retry after a reconnect failed.
    RetryFailed {
        /// Name of the store instance.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Operation kind.
        operation: OperationKind,
        /// The store error from the retry.
        error: StoreError,
    },

    /// The throttle refused to reconnect.
    Denied {
        /// Name of the store instance.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Operation kind.
        operation: OperationKind,
        /// Why.
        reason: ReconnectDenied,
    },

    /// A read was answered with a degraded value.
    FallbackUsed {
        /// Name of the store instance.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// The key that was read.
        key: String,
    },
}

impl StoreEvent {
    /// The operation kind this event belongs to.
    pub fn operation(&self) -> OperationKind {
        match self {
            Self::Succeeded { operation, .. }
            | Self::Failed { operation, .. }
            | Self::Retrying { operation, .. }
            | Self::RetrySucceeded { operation, .. }
            | Self::RetryFailed { operation, .. }
            | Self::Denied { operation, .. } => *operation,
            Self::FallbackUsed { .. } => OperationKind::Read,
        }
    }
}

impl ResilienceEvent for StoreEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::Succeeded { .. } => "succeeded",
            Self::Failed { .. } => "failed",
            Self::Retrying { .. } => "retrying",
            Self::RetrySucceeded { .. } => "retry_succeeded",
            Self::RetryFailed { .. } => "retry_failed",
            Self::Denied { .. } => "denied",
            Self::FallbackUsed { .. } => "fallback_used",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            Self::Succeeded { timestamp, .. }
            | Self::Failed { timestamp, .. }
            | Self::Retrying { timestamp, .. }
            | Self::RetrySucceeded { timestamp, .. }
            | Self::RetryFailed { timestamp, .. }
            | Self::Denied { timestamp, .. }
            | Self::FallbackUsed { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            Self::Succeeded { pattern_name, .. }
            | Self::Failed { pattern_name, .. }
            | Self::Retrying { pattern_name, .. }
            | Self::RetrySucceeded { pattern_name, .. }
            | Self::RetryFailed { pattern_name, .. }
            | Self::Denied { pattern_name, .. }
            | Self::FallbackUsed { pattern_name, .. } => pattern_name,
        }
    }
}
