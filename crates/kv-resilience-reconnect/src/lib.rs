//! Reconnect throttling for a shared key-value store connection.
//!
//! When a connection to a remote store goes bad, every concurrent caller sees
//! the failure at roughly the same moment. If each of them forced its own
//! reconnect the store would be hit by a reconnect storm. [`ReconnectThrottle`]
//! sits between those callers and the connection:
//!
//! - Only one reconnect runs at a time (a lock with a bounded wait)
//! - At most one reconnect runs per `min_reconnect_interval`
//! - After `max_failure_window` of unbroken failure it stops reconnecting
//!   altogether until some operation succeeds again
//!
//! # Phases
//!
//! | Phase       | Meaning                                                     |
//! |-------------|-------------------------------------------------------------|
//! | `Stable`    | no failure observed since the last success or reconnect     |
//! | `Failing`   | failures observed, still within the failure window          |
//! | `Exhausted` | the failure window has run out; every decision is a denial  |
//!
//! # Example
//!
//! ```rust
//! use kv_resilience_reconnect::{ReconnectConfig, ReconnectThrottle};
//! use std::time::Duration;
//!
//! let throttle = ReconnectThrottle::new(
//!     ReconnectConfig::builder()
//!         .name("sessions")
//!         .min_reconnect_interval(Duration::from_secs(30))
//!         .max_failure_window(Duration::from_secs(30 * 60))
//!         .reconnect_lock_timeout(Duration::from_secs(1))
//!         .build(),
//! );
//!
//! // A store call failed. Ask whether this caller may force a reconnect.
//! let decision = throttle.decide(|| -> Result<(), std::io::Error> {
//!     // close the shared connection here
//!     Ok(())
//! });
//!
//! // Nothing has been reconnected within the first 30 seconds of the
//! // throttle's life, so this is denied.
//! assert!(decision.is_err());
//! ```
//!
//! # Feature Flags
//!
//! - `tracing` (default): one log line per decision
//! - `metrics`: `reconnect_decisions_total` and `reconnects_total` counters
//! - `serde`: enables `Serialize` for [`ThrottlePhase`]

mod config;
mod error;
mod events;
mod state;
mod throttle;

pub use config::{ReconnectConfig, ReconnectConfigBuilder};
pub use error::ReconnectDenied;
pub use events::ReconnectEvent;
pub use state::{ReconnectSnapshot, ThrottlePhase};
pub use throttle::ReconnectThrottle;
