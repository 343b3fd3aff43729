//! Core infrastructure for kv-resilience.
//!
//! This crate holds what every other kv-resilience crate shares:
//! - The event system used to observe reconnect decisions, store outcomes and
//!   fallback invocations
//! - An injectable monotonic [`Clock`], so failure windows can be driven by
//!   tests without sleeping

pub mod clock;
pub mod events;

pub use clock::{Clock, ManualClock, SystemClock};
pub use events::{
    EventListener, EventListeners, FnListener, RecordingListener, ResilienceEvent,
};
