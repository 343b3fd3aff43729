use crate::events::ReconnectEvent;
use kv_resilience_core::{Clock, EventListener, EventListeners, FnListener, SystemClock};
use std::sync::Arc;
use std::time::Duration;

/// Configuration for a [`ReconnectThrottle`](crate::ReconnectThrottle).
pub struct ReconnectConfig {
    /// Name used in events, log lines and metric labels.
    pub(crate) name: String,

    /// Minimum time between two executed reconnects.
    pub(crate) min_reconnect_interval: Duration,

    /// How long an unbroken run of failures may last before the throttle
    /// stops granting reconnects.
    pub(crate) max_failure_window: Duration,

    /// Bounded wait for the reconnect lock.
    pub(crate) reconnect_lock_timeout: Duration,

    pub(crate) clock: Arc<dyn Clock>,

    pub(crate) event_listeners: EventListeners<ReconnectEvent>,
}

impl Clone for ReconnectConfig {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            min_reconnect_interval: self.min_reconnect_interval,
            max_failure_window: self.max_failure_window,
            reconnect_lock_timeout: self.reconnect_lock_timeout,
            clock: Arc::clone(&self.clock),
            event_listeners: self.event_listeners.clone(),
        }
    }
}

impl std::fmt::Debug for ReconnectConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconnectConfig")
            .field("name", &self.name)
            .field("min_reconnect_interval", &self.min_reconnect_interval)
            .field("max_failure_window", &self.max_failure_window)
            .field("reconnect_lock_timeout", &self.reconnect_lock_timeout)
            .field("event_listeners", &self.event_listeners.len())
            .finish()
    }
}

impl ReconnectConfig {
    /// Default minimum time between executed reconnects.
    pub const DEFAULT_MIN_RECONNECT_INTERVAL: Duration = Duration::from_secs(30);

    /// Default failure window after which reconnects stop.
    pub const DEFAULT_MAX_FAILURE_WINDOW: Duration = Duration::from_secs(30 * 60);

    /// Default wait for the reconnect lock.
    pub const DEFAULT_RECONNECT_LOCK_TIMEOUT: Duration = Duration::from_secs(1);

    /// Creates a new builder for configuring the throttle.
    pub fn builder() -> ReconnectConfigBuilder {
        ReconnectConfigBuilder::default()
    }

    /// Returns the instance name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the minimum time between executed reconnects.
    pub fn min_reconnect_interval(&self) -> Duration {
        self.min_reconnect_interval
    }

    /// Returns the failure window after which reconnects stop.
    pub fn max_failure_window(&self) -> Duration {
        self.max_failure_window
    }

    /// Returns the bounded wait for the reconnect lock.
    pub fn reconnect_lock_timeout(&self) -> Duration {
        self.reconnect_lock_timeout
    }

    /// Returns the time source that stamps decisions and events.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        ReconnectConfigBuilder::default().build()
    }
}

/// Builder for constructing a [`ReconnectConfig`].
pub struct ReconnectConfigBuilder {
    name: String,
    min_reconnect_interval: Duration,
    max_failure_window: Duration,
    reconnect_lock_timeout: Duration,
    clock: Arc<dyn Clock>,
    event_listeners: EventListeners<ReconnectEvent>,
}

impl std::fmt::Debug for ReconnectConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconnectConfigBuilder")
            .field("name", &self.name)
            .field("min_reconnect_interval", &self.min_reconnect_interval)
            .field("max_failure_window", &self.max_failure_window)
            .field("reconnect_lock_timeout", &self.reconnect_lock_timeout)
            .finish()
    }
}

impl ReconnectConfigBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the instance name (used in events, logs and metrics).
    ///
    /// Default: `"reconnect"`.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the minimum time between two executed reconnects.
    ///
    /// A failure observed sooner than this after the last reconnect is denied
    /// without touching the reconnect lock. Default: 30 seconds.
    ///
    /// # Examples
    ///
    /// ```
    /// use kv_resilience_reconnect::ReconnectConfig;
    /// use std::time::Duration;
    ///
    /// let config = ReconnectConfig::builder()
    ///     .min_reconnect_interval(Duration::from_secs(5))
    ///     .build();
    /// assert_eq!(config.min_reconnect_interval(), Duration::from_secs(5));
    /// ```
    pub fn min_reconnect_interval(mut self, interval: Duration) -> Self {
        self.min_reconnect_interval = interval;
        self
    }

    /// Sets how long an unbroken run of failures may last before every
    /// decision becomes a denial. Default: 30 minutes.
    pub fn max_failure_window(mut self, window: Duration) -> Self {
        self.max_failure_window = window;
        self
    }

    /// Sets how long a caller waits for the reconnect lock before giving up.
    /// Default: 1 second.
    pub fn reconnect_lock_timeout(mut self, timeout: Duration) -> Self {
        self.reconnect_lock_timeout = timeout;
        self
    }

    /// Replaces the time source.
    ///
    /// # Examples
    ///
    /// ```
    /// use kv_resilience_core::ManualClock;
    /// use kv_resilience_reconnect::ReconnectConfig;
    ///
    /// let clock = ManualClock::new();
    /// let config = ReconnectConfig::builder().clock(clock.clone()).build();
    /// ```
    pub fn clock<C>(mut self, clock: C) -> Self
    where
        C: Clock,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Registers a callback invoked for every [`ReconnectEvent`].
    pub fn on_event<F>(mut self, listener: F) -> Self
    where
        F: Fn(&ReconnectEvent) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(listener));
        self
    }

    /// Registers a shared listener, such as a
    /// [`RecordingListener`](kv_resilience_core::RecordingListener).
    pub fn listener(mut self, listener: Arc<dyn EventListener<ReconnectEvent>>) -> Self {
        self.event_listeners.add_shared(listener);
        self
    }

    /// Builds the `ReconnectConfig`.
    pub fn build(self) -> ReconnectConfig {
        ReconnectConfig {
            name: self.name,
            min_reconnect_interval: self.min_reconnect_interval,
            max_failure_window: self.max_failure_window,
            reconnect_lock_timeout: self.reconnect_lock_timeout,
            clock: self.clock,
            event_listeners: self.event_listeners,
        }
    }
}

impl Default for ReconnectConfigBuilder {
    fn default() -> Self {
        Self {
            name: "reconnect".to_string(),
            min_reconnect_interval: ReconnectConfig::DEFAULT_MIN_RECONNECT_INTERVAL,
            max_failure_window: ReconnectConfig::DEFAULT_MAX_FAILURE_WINDOW,
            reconnect_lock_timeout: ReconnectConfig::DEFAULT_RECONNECT_LOCK_TIMEOUT,
            clock: Arc::new(SystemClock),
            event_listeners: EventListeners::new(),
        }
    }
}
