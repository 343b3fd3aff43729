//! Key-value operations that survive a broken connection.
//!
//! [`ResilientStore`] wraps a synchronous [`KvStore`] client. Every operation
//! is tried once; if it fails, the shared
//! [`ReconnectThrottle`](kv_resilience_reconnect::ReconnectThrottle) decides
//! whether this caller may force a reconnect. A granted reconnect is followed
//! by exactly one retry. A denied one ends the operation:
//!
//! | Operation    | First attempt fails, reconnect denied | Retry after reconnect fails |
//! |--------------|---------------------------------------|-----------------------------|
//! | `write`      | `WriteOutcome::Failed`                | `WriteOutcome::Failed`      |
//! | `read`       | `ReadOutcome::Fallback`               | `ReadOutcome::Fallback`     |
//! | `delete_all` | `DeleteSummary::Error` (never retried) | n/a                        |
//!
//! No operation returns an error or panics past the wrapper; a panic inside
//! the store is reported as an outcome too.
//!
//! # Sharing a throttle
//!
//! The throttle guards a connection, not a wrapper. Every wrapper that talks
//! over the same connection must hold the same `Arc<ReconnectThrottle>`:
//!
//! ```rust
//! use kv_resilience_reconnect::{ReconnectConfig, ReconnectThrottle};
//! use kv_resilience_store::{MemoryStore, ResilientStore};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let connection = Arc::new(MemoryStore::new());
//! let throttle = Arc::new(ReconnectThrottle::new(
//!     ReconnectConfig::builder()
//!         .name("primary")
//!         .min_reconnect_interval(Duration::from_secs(30))
//!         .build(),
//! ));
//!
//! let sessions = ResilientStore::builder(Arc::clone(&connection))
//!     .name("sessions")
//!     .throttle(Arc::clone(&throttle))
//!     .build();
//! let settings = ResilientStore::builder(Arc::clone(&connection))
//!     .name("settings")
//!     .throttle(Arc::clone(&throttle))
//!     .fallback_value("defaults")
//!     .build();
//!
//! connection.set_outage(true);
//! let outcome = settings.read_blocking("theme");
//! assert!(outcome.is_fallback());
//! assert_eq!(outcome.value(), Some("defaults"));
//! # let _ = sessions;
//! ```
//!
//! # Async
//!
//! [`ResilientStore::write`], [`ResilientStore::read`] and
//! [`ResilientStore::delete_all`] run the operation on tokio's blocking pool
//! and return an [`OperationHandle`] to await. The `_blocking` variants run on
//! the calling thread.
//!
//! `ResilientStore` is also a `tower::Service<StoreOperation>` whose error type
//! is [`Infallible`](std::convert::Infallible).
//!
//! # Events
//!
//! [`StoreEvent`] reports every step of every operation. Register listeners
//! with `on_event` or `listener` on the builder.

mod config;
mod error;
mod events;
mod handle;
mod memory;
mod outcome;
mod service;
mod store;

pub use config::ResilientStoreBuilder;
pub use error::StoreError;
pub use events::StoreEvent;
pub use handle::OperationHandle;
pub use memory::MemoryStore;
pub use outcome::{
    Attempt, DeleteSummary, FailureCause, OperationKind, OperationOutcome, ReadOutcome,
    StoreOperation, WriteOutcome,
};
pub use service::ResilientStore;
pub use store::KvStore;
