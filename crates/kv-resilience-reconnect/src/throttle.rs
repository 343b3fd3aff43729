use crate::config::ReconnectConfig;
use crate::error::ReconnectDenied;
use crate::events::ReconnectEvent;
use crate::state::{ReconnectSnapshot, ReconnectState, ThrottlePhase};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter};

#[cfg(feature = "metrics")]
use std::sync::Once;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

/// Rate-limits and serializes forced reconnects of one shared connection.
///
/// Construct one per connection and share it (`Arc<ReconnectThrottle>`) with
/// every call site that uses that connection. Each observed failure calls
/// [`decide`](Self::decide) exactly once; each observed success calls
/// [`record_success`](Self::record_success).
///
/// # Examples
///
/// ```
/// use kv_resilience_core::ManualClock;
/// use kv_resilience_reconnect::{ReconnectConfig, ReconnectThrottle, ThrottlePhase};
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// let throttle = ReconnectThrottle::new(ReconnectConfig::builder().clock(clock.clone()).build());
///
/// clock.advance(Duration::from_secs(31));
/// let closed = throttle.decide(|| Ok::<_, std::io::Error>(()));
/// assert!(closed.is_ok());
/// assert_eq!(throttle.phase(), ThrottlePhase::Stable);
///
/// // A second failure right after the reconnect is rate-limited.
/// assert!(throttle.decide(|| Ok::<_, std::io::Error>(())).is_err());
/// assert_eq!(throttle.phase(), ThrottlePhase::Failing);
/// ```
pub struct ReconnectThrottle {
    config: Arc<ReconnectConfig>,
    state: ReconnectState,
    // held for the whole reconnect action; the timestamps live in `state.window`
    reconnect_lock: Mutex<()>,
}

impl ReconnectThrottle {
    /// Creates a throttle. The last-reconnect timestamp starts at "now", so
    /// the first reconnect can happen `min_reconnect_interval` after creation.
    pub fn new(config: ReconnectConfig) -> Self {
        #[cfg(feature = "metrics")]
        METRICS_INIT.call_once(|| {
            describe_counter!(
                "reconnect_decisions_total",
                "Total number of reconnect decisions, by outcome"
            );
            describe_counter!(
                "reconnects_total",
                "Total number of executed reconnect actions, by result"
            );
        });

        let now = config.clock.now();
        Self {
            config: Arc::new(config),
            state: ReconnectState::new(now),
            reconnect_lock: Mutex::new(()),
        }
    }

    /// Creates a throttle with the default intervals (30 s / 30 min / 1 s).
    pub fn with_defaults() -> Self {
        Self::new(ReconnectConfig::default())
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ReconnectConfig {
        &self.config
    }

    /// Current phase.
    pub fn phase(&self) -> ThrottlePhase {
        let now = self.config.clock.now();
        self.state
            .window
            .lock()
            .phase(now, self.config.max_failure_window)
    }

    /// Point-in-time view of timestamps and counters.
    pub fn snapshot(&self) -> ReconnectSnapshot {
        self.state
            .snapshot(self.config.clock.now(), self.config.max_failure_window)
    }

    /// Records a successful store operation, closing any open failure window.
    ///
    /// Success on any key by any caller counts; the window is shared.
    pub fn record_success(&self) {
        let now = self.config.clock.now();
        let closed = self.state.window.lock().close(now);

        if let Some(open_for) = closed {
            #[cfg(feature = "tracing")]
            tracing::info!(
                throttle = %self.config.name,
                open_for_ms = open_for.as_millis() as u64,
                "Operation succeeded, failure window reset"
            );

            self.emit(ReconnectEvent::FailureWindowReset {
                pattern_name: self.config.name.clone(),
                timestamp: now,
                open_for,
            });
        }
    }

    /// Decides whether the caller that just observed a failure may force a
    /// reconnect, and if so runs `reconnect` while holding the reconnect lock.
    ///
    /// Returns `Ok(())` when the reconnect ran and succeeded; the caller may
    /// then retry its operation once. Any `Err` means "do not retry".
    ///
    /// The order of checks is:
    /// 1. open the failure window if it is closed;
    /// 2. deny if the window has been open for `max_failure_window` or longer;
    /// 3. deny if the last reconnect was less than `min_reconnect_interval` ago;
    /// 4. wait up to `reconnect_lock_timeout` for the reconnect lock, deny on timeout;
    /// 5. re-check (3) under the lock, since another caller may have just reconnected;
    /// 6. run `reconnect`; on success record it and close the window.
    ///
    /// Steps 1–3 run inside one critical section over the failure window.
    pub fn decide<F, E>(&self, reconnect: F) -> Result<(), ReconnectDenied>
    where
        F: FnOnce() -> Result<(), E>,
        E: fmt::Display,
    {
        let now = self.config.clock.now();
        if let Err(denied) = self.check_window(now) {
            return self.deny(denied);
        }

        let Some(_permit) = self
            .reconnect_lock
            .try_lock_for(self.config.reconnect_lock_timeout)
        else {
            #[cfg(feature = "tracing")]
            tracing::info!(
                throttle = %self.config.name,
                "Another caller is already reconnecting"
            );
            return self.deny(ReconnectDenied::LockContended {
                waited: self.config.reconnect_lock_timeout,
            });
        };

        let now = self.config.clock.now();
        let since_last = self.state.window.lock().since_last_reconnect(now);
        if since_last < self.config.min_reconnect_interval {
            return self.deny(ReconnectDenied::TooSoon { since_last });
        }

        #[cfg(feature = "tracing")]
        tracing::info!(throttle = %self.config.name, "Reconnecting...");

        self.emit(ReconnectEvent::ReconnectStarted {
            pattern_name: self.config.name.clone(),
            timestamp: now,
        });

        match reconnect() {
            Ok(()) => {
                let finished = self.config.clock.now();
                self.state.window.lock().record_reconnect(finished);
                let reconnects = self.state.increment_reconnects();

                #[cfg(feature = "tracing")]
                tracing::info!(
                    throttle = %self.config.name,
                    reconnects,
                    "Reconnected successfully"
                );

                #[cfg(feature = "metrics")]
                {
                    counter!("reconnects_total", "throttle" => self.config.name.clone(), "result" => "success")
                        .increment(1);
                    counter!("reconnect_decisions_total", "throttle" => self.config.name.clone(), "decision" => "granted")
                        .increment(1);
                }

                self.emit(ReconnectEvent::ReconnectSucceeded {
                    pattern_name: self.config.name.clone(),
                    timestamp: finished,
                    reconnects,
                });
                Ok(())
            }
            Err(error) => {
                let message = error.to_string();

                #[cfg(feature = "tracing")]
                tracing::error!(
                    throttle = %self.config.name,
                    error = %message,
                    "Failed to reconnect"
                );

                #[cfg(feature = "metrics")]
                counter!("reconnects_total", "throttle" => self.config.name.clone(), "result" => "failure")
                    .increment(1);

                self.emit(ReconnectEvent::ReconnectFailed {
                    pattern_name: self.config.name.clone(),
                    timestamp: self.config.clock.now(),
                    error: message.clone(),
                });
                self.deny(ReconnectDenied::ReconnectFailed { message })
            }
        }
    }

    /// Opens the window if needed and applies the exhaustion and interval checks.
    fn check_window(&self, now: Instant) -> Result<(), ReconnectDenied> {
        let (opened, verdict) = {
            let mut window = self.state.window.lock();
            let opened = window.open(now);

            let elapsed = window.open_for(now);
            let since_last = window.since_last_reconnect(now);
            let verdict = if elapsed >= self.config.max_failure_window {
                Err(ReconnectDenied::WindowExhausted { elapsed })
            } else if since_last < self.config.min_reconnect_interval {
                Err(ReconnectDenied::TooSoon { since_last })
            } else {
                Ok(())
            };
            (opened, verdict)
        };

        // listeners never run under the window lock
        if opened {
            #[cfg(feature = "tracing")]
            tracing::error!(
                throttle = %self.config.name,
                "First failure observed, failure window opened"
            );

            self.emit(ReconnectEvent::FailureWindowOpened {
                pattern_name: self.config.name.clone(),
                timestamp: now,
            });
        }

        verdict
    }

    fn deny(&self, reason: ReconnectDenied) -> Result<(), ReconnectDenied> {
        self.state.increment_denials();

        #[cfg(feature = "tracing")]
        match &reason {
            ReconnectDenied::WindowExhausted { .. } => tracing::error!(
                throttle = %self.config.name,
                max_failure_window_secs = self.config.max_failure_window.as_secs(),
                "Giving up reconnect attempts: {}",
                reason
            ),
            _ => tracing::info!(
                throttle = %self.config.name,
                reason = reason.reason(),
                "{}",
                reason
            ),
        }

        #[cfg(feature = "metrics")]
        counter!(
            "reconnect_decisions_total",
            "throttle" => self.config.name.clone(),
            "decision" => "denied",
            "reason" => reason.reason()
        )
        .increment(1);

        self.emit(ReconnectEvent::Denied {
            pattern_name: self.config.name.clone(),
            timestamp: self.config.clock.now(),
            reason: reason.clone(),
        });
        Err(reason)
    }

    fn emit(&self, event: ReconnectEvent) {
        self.config.event_listeners.emit(&event);
    }

    #[cfg(test)]
    fn since_last_reconnect(&self) -> std::time::Duration {
        self.state
            .window
            .lock()
            .since_last_reconnect(self.config.clock.now())
    }
}

impl fmt::Debug for ReconnectThrottle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconnectThrottle")
            .field("config", &self.config)
            .field("phase", &self.phase())
            .finish()
    }
}
