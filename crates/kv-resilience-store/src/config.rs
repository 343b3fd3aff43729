//! Builder for [`ResilientStore`].

use crate::events::StoreEvent;
use crate::service::ResilientStore;
use crate::store::KvStore;
use kv_resilience_core::{EventListener, EventListeners, FnListener};
use kv_resilience_fallback::Fallback;
use kv_resilience_reconnect::ReconnectThrottle;
use std::sync::Arc;

/// Builder for constructing a [`ResilientStore`].
pub struct ResilientStoreBuilder<S> {
    store: S,
    name: String,
    throttle: Option<Arc<ReconnectThrottle>>,
    fallback: Option<Fallback>,
    fallback_value: Option<String>,
    event_listeners: EventListeners<StoreEvent>,
}

impl<S: KvStore> ResilientStoreBuilder<S> {
    /// Creates a builder around `store`.
    pub fn new(store: S) -> Self {
        Self {
            store,
            name: "kv-store".to_string(),
            throttle: None,
            fallback: None,
            fallback_value: None,
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the name for this instance (used in logs, metrics and events).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Shares `throttle` with this wrapper.
    ///
    /// Every wrapper over the same connection must use the same throttle.
    /// Without one, a throttle with default settings is created.
    pub fn throttle(mut self, throttle: Arc<ReconnectThrottle>) -> Self {
        self.throttle = Some(throttle);
        self
    }

    /// Sets the fallback used for reads that the store cannot answer.
    ///
    /// The fallback keeps its own clock; give it the throttle's clock with
    /// [`FallbackBuilder::clock`](kv_resilience_fallback::FallbackBuilder::clock)
    /// when event timestamps have to line up.
    pub fn fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = Some(fallback);
        self.fallback_value = None;
        self
    }

    /// Serves `value` for every degraded read.
    pub fn fallback_value(mut self, value: impl Into<String>) -> Self {
        self.fallback = None;
        self.fallback_value = Some(value.into());
        self
    }

    /// Adds an event listener.
    pub fn on_event<F>(mut self, listener: F) -> Self
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(listener));
        self
    }

    /// Adds a shared event listener.
    pub fn listener(mut self, listener: Arc<dyn EventListener<StoreEvent>>) -> Self {
        self.event_listeners.add_shared(listener);
        self
    }

    /// Builds the wrapper.
    pub fn build(self) -> ResilientStore<S> {
        let throttle = self
            .throttle
            .unwrap_or_else(|| Arc::new(ReconnectThrottle::with_defaults()));
        let fallback = self.fallback.unwrap_or_else(|| {
            let builder = Fallback::builder().clock(Arc::clone(throttle.config().clock()));
            match self.fallback_value {
                Some(value) => builder.value(value).build(),
                None => builder.build(),
            }
        });

        ResilientStore::from_parts(
            self.name,
            self.store,
            throttle,
            fallback,
            self.event_listeners,
        )
    }
}
