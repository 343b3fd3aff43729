//! Event system shared by the throttle, the store wrapper and the fallback.
//!
//! Every component names itself (`pattern_name`) and emits typed events to a
//! list of listeners. Listeners run synchronously on the emitting thread, so
//! they must be cheap; a panicking listener is isolated from the others.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Trait for events emitted by kv-resilience components.
pub trait ResilienceEvent: Send + Sync + fmt::Debug {
    /// Short, stable identifier of the event (e.g. `"reconnect_succeeded"`).
    fn event_type(&self) -> &'static str;

    /// When the event occurred.
    fn timestamp(&self) -> Instant;

    /// Name of the component instance that emitted the event.
    fn pattern_name(&self) -> &str;
}

/// Receives events of one type.
pub trait EventListener<E: ResilienceEvent>: Send + Sync {
    /// Called once per emitted event.
    fn on_event(&self, event: &E);
}

type BoxedEventListener<E> = Arc<dyn EventListener<E>>;

/// An ordered collection of listeners for one event type.
pub struct EventListeners<E: ResilienceEvent> {
    listeners: Vec<BoxedEventListener<E>>,
}

impl<E: ResilienceEvent> Clone for EventListeners<E> {
    fn clone(&self) -> Self {
        Self {
            listeners: self.listeners.clone(),
        }
    }
}

impl<E: ResilienceEvent> EventListeners<E> {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Registers a listener.
    pub fn add<L>(&mut self, listener: L)
    where
        L: EventListener<E> + 'static,
    {
        self.listeners.push(Arc::new(listener));
    }

    /// Registers an already shared listener, e.g. a [`RecordingListener`]
    /// the caller keeps a handle to.
    pub fn add_shared(&mut self, listener: Arc<dyn EventListener<E>>) {
        self.listeners.push(listener);
    }

    /// Delivers `event` to every listener in registration order.
    ///
    /// A listener that panics is skipped; the remaining listeners still run.
    pub fn emit(&self, event: &E) {
        for listener in &self.listeners {
            let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                listener.on_event(event);
            }));
        }
    }

    /// Returns true if no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl<E: ResilienceEvent> Default for EventListeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ResilienceEvent> fmt::Debug for EventListeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListeners")
            .field("len", &self.listeners.len())
            .finish()
    }
}

/// Adapts a closure into an [`EventListener`].
pub struct FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    f: F,
    _phantom: std::marker::PhantomData<fn(&E)>,
}

impl<E, F> FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<E, F> EventListener<E> for FnListener<E, F>
where
    E: ResilienceEvent,
    F: Fn(&E) + Send + Sync,
{
    fn on_event(&self, event: &E) {
        (self.f)(event)
    }
}

/// Keeps a copy of every event it receives.
///
/// Useful wherever the event stream itself is the thing being checked, such as
/// asserting that exactly one reconnect happened under contention.
pub struct RecordingListener<E> {
    events: Mutex<Vec<E>>,
}

impl<E: Clone> RecordingListener<E> {
    /// Creates an empty recorder, already shared.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
        })
    }

    /// Copies out everything recorded so far.
    pub fn events(&self) -> Vec<E> {
        self.events.lock().clone()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Drops everything recorded so far.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl<E> RecordingListener<E>
where
    E: ResilienceEvent + Clone,
{
    /// Number of recorded events whose [`ResilienceEvent::event_type`] is `event_type`.
    pub fn count(&self, event_type: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| event.event_type() == event_type)
            .count()
    }
}

impl<E> EventListener<E> for RecordingListener<E>
where
    E: ResilienceEvent + Clone,
{
    fn on_event(&self, event: &E) {
        self.events.lock().push(event.clone());
    }
}
