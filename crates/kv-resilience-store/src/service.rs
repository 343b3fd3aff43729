//! The resilient store wrapper.

use crate::config::ResilientStoreBuilder;
use crate::error::StoreError;
use crate::events::StoreEvent;
use crate::handle::OperationHandle;
use crate::outcome::{
    Attempt, DeleteSummary, FailureCause, OperationKind, OperationOutcome, ReadOutcome,
    StoreOperation, WriteOutcome,
};
use crate::store::KvStore;
use futures::future::{BoxFuture, FutureExt};
use kv_resilience_core::{Clock, EventListeners};
use kv_resilience_fallback::{Fallback, DEFAULT_FALLBACK_VALUE};
use kv_resilience_reconnect::{ReconnectDenied, ReconnectThrottle};
use std::any::Any;
use std::convert::Infallible;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::Service;

#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter};

#[cfg(feature = "metrics")]
use std::sync::Once;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

/// Wraps a [`KvStore`] so that every operation survives a broken connection.
///
/// On a failed call the wrapper asks the shared [`ReconnectThrottle`] whether
/// it may reconnect. If the throttle grants it, the connection is closed and
/// the call is retried exactly once. If the throttle refuses, reads are
/// answered by the [`Fallback`] and writes fail.
///
/// Cloning is cheap; clones share the store, throttle, fallback and listeners.
///
/// # Examples
///
/// ```
/// use kv_resilience_store::{MemoryStore, ResilientStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = ResilientStore::builder(MemoryStore::new())
///     .name("sessions")
///     .build();
///
/// assert!(store.write("k1", "v1").await.is_completed());
/// assert_eq!(store.read("k1").await.value(), Some("v1"));
/// # }
/// ```
pub struct ResilientStore<S> {
    shared: Arc<Shared<S>>,
}

struct Shared<S> {
    name: String,
    store: S,
    throttle: Arc<ReconnectThrottle>,
    fallback: Fallback,
    event_listeners: EventListeners<StoreEvent>,
}

/// How far an operation got.
enum Attempted<T> {
    First(T),
    Retried(T),
    RetryFailed(StoreError),
    Denied(ReconnectDenied),
}

impl<S: KvStore> ResilientStore<S> {
    /// Creates a builder around `store`.
    pub fn builder(store: S) -> ResilientStoreBuilder<S> {
        ResilientStoreBuilder::new(store)
    }

    /// Wraps `store` with a shared throttle and the default fallback.
    pub fn new(store: S, throttle: Arc<ReconnectThrottle>) -> Self {
        ResilientStoreBuilder::new(store).throttle(throttle).build()
    }

    pub(crate) fn from_parts(
        name: String,
        store: S,
        throttle: Arc<ReconnectThrottle>,
        fallback: Fallback,
        event_listeners: EventListeners<StoreEvent>,
    ) -> Self {
        #[cfg(feature = "metrics")]
        METRICS_INIT.call_once(|| {
            describe_counter!(
                "kv_store_operations_total",
                "Total number of store operations, by kind and outcome"
            );
        });

        Self {
            shared: Arc::new(Shared {
                name,
                store,
                throttle,
                fallback,
                event_listeners,
            }),
        }
    }

    /// Returns the instance name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Returns the wrapped store.
    pub fn store(&self) -> &S {
        &self.shared.store
    }

    /// Returns the shared throttle.
    pub fn throttle(&self) -> &Arc<ReconnectThrottle> {
        &self.shared.throttle
    }

    /// Returns the fallback used for degraded reads.
    pub fn fallback(&self) -> &Fallback {
        &self.shared.fallback
    }

    /// Writes `value` under `key` on the blocking pool.
    pub fn write(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> OperationHandle<WriteOutcome> {
        let (key, value) = (key.into(), value.into());
        let this = self.clone();
        let recover = self.clone();
        OperationHandle::spawn(
            move || this.write_blocking(&key, &value),
            move |error| recover.aborted_write(error.to_string()),
        )
    }

    /// Reads `key` on the blocking pool.
    pub fn read(&self, key: impl Into<String>) -> OperationHandle<ReadOutcome> {
        let key = key.into();
        let recover_key = key.clone();
        let this = self.clone();
        let recover = self.clone();
        OperationHandle::spawn(
            move || this.read_blocking(&key),
            move |error| recover.aborted_read(&recover_key, error.to_string()),
        )
    }

    /// Deletes every key on the blocking pool.
    pub fn delete_all(&self) -> OperationHandle<DeleteSummary> {
        let this = self.clone();
        let recover = self.clone();
        OperationHandle::spawn(
            move || this.delete_all_blocking(),
            move |error| recover.aborted_delete_all(error.to_string()),
        )
    }

    /// Writes on the calling thread.
    pub fn write_blocking(&self, key: &str, value: &str) -> WriteOutcome {
        catch_unwind(AssertUnwindSafe(|| self.run_write(key, value)))
            .unwrap_or_else(|payload| self.aborted_write(panic_message(payload)))
    }

    /// Reads on the calling thread.
    pub fn read_blocking(&self, key: &str) -> ReadOutcome {
        catch_unwind(AssertUnwindSafe(|| self.run_read(key)))
            .unwrap_or_else(|payload| self.aborted_read(key, panic_message(payload)))
    }

    /// Deletes every key on the calling thread.
    pub fn delete_all_blocking(&self) -> DeleteSummary {
        catch_unwind(AssertUnwindSafe(|| self.run_delete_all()))
            .unwrap_or_else(|payload| self.aborted_delete_all(panic_message(payload)))
    }

    fn run_write(&self, key: &str, value: &str) -> WriteOutcome {
        let outcome = match self.attempt(OperationKind::Write, |store| store.set(key, value)) {
            Attempted::First(()) => WriteOutcome::Completed {
                attempt: Attempt::First,
            },
            Attempted::Retried(()) => WriteOutcome::Completed {
                attempt: Attempt::AfterReconnect,
            },
            Attempted::RetryFailed(error) => WriteOutcome::Failed {
                reason: FailureCause::RetryFailed(error),
            },
            Attempted::Denied(reason) => WriteOutcome::Failed {
                reason: FailureCause::Denied(reason),
            },
        };

        #[cfg(feature = "tracing")]
        match &outcome {
            WriteOutcome::Completed { .. } => tracing::info!(
                store = %self.shared.name,
                key,
                "Write operation completed"
            ),
            WriteOutcome::Failed { reason } => tracing::error!(
                store = %self.shared.name,
                key,
                reason = %reason,
                "Write operation failed"
            ),
        }

        self.record(OperationKind::Write, outcome.as_str());
        outcome
    }

    fn run_read(&self, key: &str) -> ReadOutcome {
        let outcome = match self.attempt(OperationKind::Read, |store| store.get(key)) {
            Attempted::First(Some(value)) => ReadOutcome::Found {
                value,
                attempt: Attempt::First,
            },
            Attempted::First(None) => ReadOutcome::NotFound {
                attempt: Attempt::First,
            },
            Attempted::Retried(Some(value)) => ReadOutcome::Found {
                value,
                attempt: Attempt::AfterReconnect,
            },
            Attempted::Retried(None) => ReadOutcome::NotFound {
                attempt: Attempt::AfterReconnect,
            },
            Attempted::RetryFailed(error) => {
                self.degraded_read(key, FailureCause::RetryFailed(error))
            }
            Attempted::Denied(reason) => self.degraded_read(key, FailureCause::Denied(reason)),
        };

        #[cfg(feature = "tracing")]
        match &outcome {
            ReadOutcome::Found { attempt, .. } | ReadOutcome::NotFound { attempt } => {
                tracing::info!(
                    store = %self.shared.name,
                    key,
                    outcome = outcome.as_str(),
                    attempt = ?attempt,
                    "Read operation completed"
                )
            }
            ReadOutcome::Fallback { cause, .. } => tracing::error!(
                store = %self.shared.name,
                key,
                cause = %cause,
                "Read operation failed, served from fallback"
            ),
        }

        self.record(OperationKind::Read, outcome.as_str());
        outcome
    }

    fn run_delete_all(&self) -> DeleteSummary {
        let store = &self.shared.store;
        let result = store.list_keys("*").and_then(|keys| {
            if keys.is_empty() {
                Ok(None)
            } else {
                store.delete(&keys).map(Some)
            }
        });

        let summary = match result {
            Ok(deleted) => {
                self.shared.throttle.record_success();
                self.emit(StoreEvent::Succeeded {
                    pattern_name: self.shared.name.clone(),
                    timestamp: self.now(),
                    operation: OperationKind::DeleteAll,
                });
                match deleted {
                    Some(count) => DeleteSummary::Deleted { count },
                    None => DeleteSummary::NoKeys,
                }
            }
            Err(error) => {
                let summary = DeleteSummary::Error {
                    message: error.to_string(),
                };
                self.emit(StoreEvent::Failed {
                    pattern_name: self.shared.name.clone(),
                    timestamp: self.now(),
                    operation: OperationKind::DeleteAll,
                    error,
                });
                summary
            }
        };

        #[cfg(feature = "tracing")]
        match &summary {
            DeleteSummary::Error { .. } => {
                tracing::error!(store = %self.shared.name, "{}", summary)
            }
            _ => tracing::info!(store = %self.shared.name, "{}", summary),
        }

        self.record(OperationKind::DeleteAll, summary.as_str());
        summary
    }

    /// Runs `operation`, and on failure runs it once more if the throttle
    /// grants a reconnect.
    fn attempt<T, F>(&self, kind: OperationKind, operation: F) -> Attempted<T>
    where
        F: Fn(&S) -> Result<T, StoreError>,
    {
        let shared = &*self.shared;

        let error = match operation(&shared.store) {
            Ok(value) => {
                shared.throttle.record_success();
                self.emit(StoreEvent::Succeeded {
                    pattern_name: shared.name.clone(),
                    timestamp: self.now(),
                    operation: kind,
                });
                return Attempted::First(value);
            }
            Err(error) => error,
        };

        #[cfg(feature = "tracing")]
        tracing::error!(
            store = %shared.name,
            operation = kind.as_str(),
            error = %error,
            "Operation failed, asking throttle to reconnect"
        );

        self.emit(StoreEvent::Failed {
            pattern_name: shared.name.clone(),
            timestamp: self.now(),
            operation: kind,
            error,
        });

        if let Err(reason) = shared
            .throttle
            .decide(|| shared.store.close_connection())
        {
            self.emit(StoreEvent::Denied {
                pattern_name: shared.name.clone(),
                timestamp: self.now(),
                operation: kind,
                reason: reason.clone(),
            });
            return Attempted::Denied(reason);
        }

        #[cfg(feature = "tracing")]
        tracing::info!(
            store = %shared.name,
            operation = kind.as_str(),
            "Retrying operation after reconnect"
        );

        self.emit(StoreEvent::Retrying {
            pattern_name: shared.name.clone(),
            timestamp: self.now(),
            operation: kind,
        });

        match operation(&shared.store) {
            Ok(value) => {
                shared.throttle.record_success();
                self.emit(StoreEvent::RetrySucceeded {
                    pattern_name: shared.name.clone(),
                    timestamp: self.now(),
                    operation: kind,
                });
                Attempted::Retried(value)
            }
            Err(error) => {
                #[cfg(feature = "tracing")]
                tracing::error!(
                    store = %shared.name,
                    operation = kind.as_str(),
                    error = %error,
                    "Retry after reconnect failed"
                );

                self.emit(StoreEvent::RetryFailed {
                    pattern_name: shared.name.clone(),
                    timestamp: self.now(),
                    operation: kind,
                    error: error.clone(),
                });
                Attempted::RetryFailed(error)
            }
        }
    }

    fn degraded_read(&self, key: &str, cause: FailureCause) -> ReadOutcome {
        let value = catch_unwind(AssertUnwindSafe(|| self.shared.fallback.provide(key)))
            .unwrap_or_else(|_| {
                #[cfg(feature = "tracing")]
                tracing::error!(
                    store = %self.shared.name,
                    key,
                    "Fallback provider panicked, serving default value"
                );
                DEFAULT_FALLBACK_VALUE.to_string()
            });
        self.emit(StoreEvent::FallbackUsed {
            pattern_name: self.shared.name.clone(),
            timestamp: self.now(),
            key: key.to_string(),
        });
        ReadOutcome::Fallback { value, cause }
    }

    fn aborted_write(&self, message: String) -> WriteOutcome {
        self.aborted(OperationKind::Write, &message);
        let outcome = WriteOutcome::Failed {
            reason: FailureCause::Aborted(message),
        };
        self.record(OperationKind::Write, outcome.as_str());
        outcome
    }

    fn aborted_read(&self, key: &str, message: String) -> ReadOutcome {
        self.aborted(OperationKind::Read, &message);
        let outcome = self.degraded_read(key, FailureCause::Aborted(message));
        self.record(OperationKind::Read, outcome.as_str());
        outcome
    }

    fn aborted_delete_all(&self, message: String) -> DeleteSummary {
        self.aborted(OperationKind::DeleteAll, &message);
        let summary = DeleteSummary::Error { message };
        self.record(OperationKind::DeleteAll, summary.as_str());
        summary
    }

    fn aborted(&self, kind: OperationKind, message: &str) {
        #[cfg(feature = "tracing")]
        tracing::error!(
            store = %self.shared.name,
            operation = kind.as_str(),
            error = message,
            "Operation aborted"
        );

        self.emit(StoreEvent::Failed {
            pattern_name: self.shared.name.clone(),
            timestamp: self.now(),
            operation: kind,
            error: StoreError::Other(message.to_string()),
        });
    }

    #[cfg_attr(not(feature = "metrics"), allow(unused_variables))]
    fn record(&self, kind: OperationKind, result: &'static str) {
        #[cfg(feature = "metrics")]
        counter!(
            "kv_store_operations_total",
            "store" => self.shared.name.clone(),
            "operation" => kind.as_str(),
            "result" => result
        )
        .increment(1);
    }

    fn now(&self) -> Instant {
        self.shared.throttle.config().clock().now()
    }

    fn emit(&self, event: StoreEvent) {
        self.shared.event_listeners.emit(&event);
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("store panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("store panicked: {}", message)
    } else {
        "store panicked".to_string()
    }
}

impl<S> Clone for ResilientStore<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S> fmt::Debug for ResilientStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResilientStore")
            .field("name", &self.shared.name)
            .field("throttle", &self.shared.throttle)
            .field("fallback", &self.shared.fallback)
            .finish()
    }
}

impl<S: KvStore> Service<StoreOperation> for ResilientStore<S> {
    type Response = OperationOutcome;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: StoreOperation) -> Self::Future {
        match request {
            StoreOperation::Read { key } => self.read(key).map(|o| Ok(o.into())).boxed(),
            StoreOperation::Write { key, value } => {
                self.write(key, value).map(|o| Ok(o.into())).boxed()
            }
            StoreOperation::DeleteAll => self.delete_all().map(|o| Ok(o.into())).boxed(),
        }
    }
}
