//! Operation requests and their outcomes.

use crate::error::StoreError;
use kv_resilience_reconnect::ReconnectDenied;
use std::fmt;

/// One logical store operation, as accepted by the `tower::Service` impl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOperation {
    /// Read one key.
    Read {
        /// Key to read.
        key: String,
    },
    /// Write one key.
    Write {
        /// Key to write.
        key: String,
        /// Value to store.
        value: String,
    },
    /// Delete every key in the store.
    DeleteAll,
}

impl StoreOperation {
    /// Shorthand for [`StoreOperation::Read`].
    pub fn read(key: impl Into<String>) -> Self {
        Self::Read { key: key.into() }
    }

    /// Shorthand for [`StoreOperation::Write`].
    pub fn write(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Write {
            key: key.into(),
            value: value.into(),
        }
    }

    /// The kind of operation.
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Read { .. } => OperationKind::Read,
            Self::Write { .. } => OperationKind::Write,
            Self::DeleteAll => OperationKind::DeleteAll,
        }
    }
}

/// Operation kind, used as a label in events, logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// A read.
    Read,
    /// A write.
    Write,
    /// A delete-all.
    DeleteAll,
}

impl OperationKind {
    /// Stable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::DeleteAll => "delete_all",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which attempt produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    /// The initial call.
    First,
    /// The single retry after a granted reconnect.
    AfterReconnect,
}

/// Why an operation could not be served by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// A reconnect ran, and the retry failed too.
    RetryFailed(StoreError),
    /// The throttle refused to reconnect.
    Denied(ReconnectDenied),
    /// The operation did not run to completion (the store panicked or the
    /// task was cancelled).
    Aborted(String),
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RetryFailed(error) => write!(f, "retry after reconnect failed: {}", error),
            Self::Denied(denied) => write!(f, "reconnect denied: {}", denied),
            Self::Aborted(message) => write!(f, "operation aborted: {}", message),
        }
    }
}

/// Result of a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The value was stored.
    Completed {
        /// Which attempt stored it.
        attempt: Attempt,
    },
    /// The value was not stored. Writes have no fallback.
    Failed {
        /// Why.
        reason: FailureCause,
    },
}

impl WriteOutcome {
    /// `"completed"` or `"failed"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
        }
    }

    /// Returns `true` if the value was stored.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Result of a read.
///
/// A degraded value is always tagged as [`ReadOutcome::Fallback`], so it can
/// never be mistaken for a stored value that happens to equal the sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The key exists.
    Found {
        /// The stored value.
        value: String,
        /// Which attempt read it.
        attempt: Attempt,
    },
    /// The store answered and the key does not exist.
    NotFound {
        /// Which attempt answered.
        attempt: Attempt,
    },
    /// The store could not answer; `value` comes from the fallback provider.
    Fallback {
        /// The degraded value.
        value: String,
        /// Why the store could not answer.
        cause: FailureCause,
    },
}

impl ReadOutcome {
    /// The value the caller should use, stored or degraded.
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Found { value, .. } | Self::Fallback { value, .. } => Some(value),
            Self::NotFound { .. } => None,
        }
    }

    /// Consumes the outcome, returning the value the caller should use.
    pub fn into_value(self) -> Option<String> {
        match self {
            Self::Found { value, .. } | Self::Fallback { value, .. } => Some(value),
            Self::NotFound { .. } => None,
        }
    }

    /// Returns `true` if the value came from the fallback provider.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    /// Stable label: `"found"`, `"not_found"` or `"fallback"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Found { .. } => "found",
            Self::NotFound { .. } => "not_found",
            Self::Fallback { .. } => "fallback",
        }
    }
}

/// Result of a delete-all. Never an error past the wrapper boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteSummary {
    /// `count` keys were removed.
    Deleted {
        /// Keys reported as removed by the store.
        count: u64,
    },
    /// The store held no keys.
    NoKeys,
    /// Listing or deleting failed.
    Error {
        /// The store's error message.
        message: String,
    },
}

impl DeleteSummary {
    /// Stable label: `"deleted"`, `"no_keys"` or `"error"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deleted { .. } => "deleted",
            Self::NoKeys => "no_keys",
            Self::Error { .. } => "error",
        }
    }
}

impl fmt::Display for DeleteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deleted { .. } => f.write_str("All keys deleted"),
            Self::NoKeys => f.write_str("No keys to delete"),
            Self::Error { message } => write!(f, "Error deleting keys: {}", message),
        }
    }
}

/// Response of the `tower::Service` impl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    /// Outcome of [`StoreOperation::Write`].
    Write(WriteOutcome),
    /// Outcome of [`StoreOperation::Read`].
    Read(ReadOutcome),
    /// Outcome of [`StoreOperation::DeleteAll`].
    DeleteAll(DeleteSummary),
}

impl From<WriteOutcome> for OperationOutcome {
    fn from(outcome: WriteOutcome) -> Self {
        Self::Write(outcome)
    }
}

impl From<ReadOutcome> for OperationOutcome {
    fn from(outcome: ReadOutcome) -> Self {
        Self::Read(outcome)
    }
}

impl From<DeleteSummary> for OperationOutcome {
    fn from(summary: DeleteSummary) -> Self {
        Self::DeleteAll(summary)
    }
}
