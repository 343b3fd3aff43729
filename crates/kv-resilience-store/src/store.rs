use crate::error::StoreError;
use std::sync::Arc;

/// The store client the wrapper drives.
///
/// Calls are synchronous and may block the calling worker for as long as the
/// client's own command timeout allows. Implementations are shared between
/// concurrent callers and must be internally synchronized.
///
/// `close_connection` drops the current connection so the client
/// re-establishes it lazily on the next call. The wrapper only invokes it from
/// inside [`ReconnectThrottle::decide`](kv_resilience_reconnect::ReconnectThrottle::decide),
/// which holds the reconnect lock for the duration.
pub trait KvStore: Send + Sync + 'static {
    /// Reads `key`. `Ok(None)` means the key does not exist.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Lists keys matching a glob-style `pattern` (`*` matches everything).
    fn list_keys(&self, pattern: &str) -> Result<Vec<String>, StoreError>;

    /// Deletes `keys`, returning how many existed.
    fn delete(&self, keys: &[String]) -> Result<u64, StoreError>;

    /// Closes the current connection.
    fn close_connection(&self) -> Result<(), StoreError>;
}

impl<S> KvStore for Arc<S>
where
    S: KvStore + ?Sized,
{
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn list_keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        (**self).list_keys(pattern)
    }

    fn delete(&self, keys: &[String]) -> Result<u64, StoreError> {
        (**self).delete(keys)
    }

    fn close_connection(&self) -> Result<(), StoreError> {
        (**self).close_connection()
    }
}
