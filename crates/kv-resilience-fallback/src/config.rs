//! Builder for [`Fallback`].

use crate::provider::{FallbackProvider, StaticFallback};
use crate::{Fallback, FallbackEvent};
use kv_resilience_core::{Clock, EventListener, EventListeners, FnListener, SystemClock};
use std::sync::Arc;

/// Builder for constructing a [`Fallback`].
pub struct FallbackBuilder {
    name: String,
    provider: Option<Arc<dyn FallbackProvider>>,
    clock: Arc<dyn Clock>,
    event_listeners: EventListeners<FallbackEvent>,
}

impl Default for FallbackBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FallbackBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            name: "fallback".to_string(),
            provider: None,
            clock: Arc::new(SystemClock),
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the name for this fallback instance (used in logs, metrics and events).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Serves `value` for every key.
    pub fn value(self, value: impl Into<String>) -> Self {
        self.provider(StaticFallback::new(value))
    }

    /// Uses a custom provider.
    pub fn provider<P>(mut self, provider: P) -> Self
    where
        P: FallbackProvider + 'static,
    {
        self.provider = Some(Arc::new(provider));
        self
    }

    /// Replaces the time source used to stamp events.
    ///
    /// Share the reconnect throttle's clock so that fallback and reconnect
    /// events sit on one timeline.
    pub fn clock<C>(mut self, clock: C) -> Self
    where
        C: Clock,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Adds an event listener.
    pub fn on_event<F>(mut self, listener: F) -> Self
    where
        F: Fn(&FallbackEvent) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(listener));
        self
    }

    /// Adds a shared event listener.
    pub fn listener(mut self, listener: Arc<dyn EventListener<FallbackEvent>>) -> Self {
        self.event_listeners.add_shared(listener);
        self
    }

    /// Builds the fallback. Without a provider the default sentinel is served.
    pub fn build(self) -> Fallback {
        let provider = self
            .provider
            .unwrap_or_else(|| Arc::new(StaticFallback::default()));
        Fallback::from_parts(self.name, provider, self.clock, self.event_listeners)
    }
}
