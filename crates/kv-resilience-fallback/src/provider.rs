/// Value returned by [`StaticFallback::default`].
pub const DEFAULT_FALLBACK_VALUE: &str = "fallback_value";

/// Supplies a degraded value for a key.
///
/// Implementations must not block and must not panic.
pub trait FallbackProvider: Send + Sync {
    /// Returns the value to serve for `key` while the store is unreachable.
    fn provide(&self, key: &str) -> String;
}

impl<F> FallbackProvider for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn provide(&self, key: &str) -> String {
        self(key)
    }
}

/// Returns the same value for every key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticFallback {
    value: String,
}

impl StaticFallback {
    /// Creates a provider returning `value`.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// The value this provider returns.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl Default for StaticFallback {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK_VALUE)
    }
}

impl FallbackProvider for StaticFallback {
    fn provide(&self, _key: &str) -> String {
        self.value.clone()
    }
}
