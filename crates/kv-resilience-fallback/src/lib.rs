//! Degraded-mode values for reads that cannot reach the store.
//!
//! When the reconnect throttle refuses to reconnect, a read still has to
//! answer something. A [`FallbackProvider`] supplies that answer for a key. It
//! must be cheap: it runs on the caller's worker, must not block and must not
//! panic.
//!
//! # Providers
//!
//! ## Static sentinel (the default)
//!
//! ```rust
//! use kv_resilience_fallback::{Fallback, FallbackProvider, StaticFallback};
//!
//! let fallback = Fallback::default();
//! assert_eq!(fallback.provide("any-key"), "fallback_value");
//!
//! let custom = StaticFallback::new("unavailable");
//! assert_eq!(custom.provide("any-key"), "unavailable");
//! ```
//!
//! ## Per-key closure
//!
//! Any `Fn(&str) -> String` is a provider, which is how a secondary source
//! (a local snapshot, a default table) gets plugged in:
//!
//! ```rust
//! use kv_resilience_fallback::Fallback;
//! use std::collections::HashMap;
//!
//! let defaults: HashMap<String, String> =
//!     [("theme".to_string(), "light".to_string())].into_iter().collect();
//!
//! let fallback = Fallback::builder()
//!     .name("settings")
//!     .provider(move |key: &str| {
//!         defaults.get(key).cloned().unwrap_or_default()
//!     })
//!     .build();
//!
//! assert_eq!(fallback.provide("theme"), "light");
//! assert_eq!(fallback.provide("missing"), "");
//! ```
//!
//! # Events
//!
//! [`Fallback`] emits [`FallbackEvent::Applied`] on every invocation.

mod config;
mod events;
mod provider;

pub use config::FallbackBuilder;
pub use events::FallbackEvent;
pub use provider::{FallbackProvider, StaticFallback, DEFAULT_FALLBACK_VALUE};

use kv_resilience_core::{Clock, EventListeners};
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter};

#[cfg(feature = "metrics")]
use std::sync::Once;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

/// A named, observable [`FallbackProvider`].
///
/// Cloning is cheap; clones share the provider and listeners.
#[derive(Clone)]
pub struct Fallback {
    name: String,
    provider: Arc<dyn FallbackProvider>,
    clock: Arc<dyn Clock>,
    event_listeners: EventListeners<FallbackEvent>,
}

impl Fallback {
    pub(crate) fn from_parts(
        name: String,
        provider: Arc<dyn FallbackProvider>,
        clock: Arc<dyn Clock>,
        event_listeners: EventListeners<FallbackEvent>,
    ) -> Self {
        #[cfg(feature = "metrics")]
        METRICS_INIT.call_once(|| {
            describe_counter!(
                "fallback_invocations_total",
                "Total number of degraded-mode values served"
            );
        });

        Self {
            name,
            provider,
            clock,
            event_listeners,
        }
    }

    /// Creates a new builder.
    pub fn builder() -> FallbackBuilder {
        FallbackBuilder::new()
    }

    /// Shorthand for a fallback that always returns `value`.
    pub fn value(value: impl Into<String>) -> Self {
        FallbackBuilder::new().value(value).build()
    }

    /// Returns the instance name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Produces the degraded value for `key` and reports the invocation.
    pub fn provide(&self, key: &str) -> String {
        #[cfg(feature = "tracing")]
        tracing::info!(fallback = %self.name, key, "Reading from fallback source");

        #[cfg(feature = "metrics")]
        counter!("fallback_invocations_total", "fallback" => self.name.clone()).increment(1);

        let value = self.provider.provide(key);

        self.event_listeners.emit(&FallbackEvent::Applied {
            pattern_name: self.name.clone(),
            timestamp: self.clock.now(),
            key: key.to_string(),
        });

        value
    }
}

impl Default for Fallback {
    fn default() -> Self {
        FallbackBuilder::new().build()
    }
}

impl fmt::Debug for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fallback")
            .field("name", &self.name)
            .field("event_listeners", &self.event_listeners.len())
            .finish()
    }
}
