//! An in-process [`KvStore`] with fault injection.

use crate::error::StoreError;
use crate::store::KvStore;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

/// A map-backed store whose connection can be broken on demand.
///
/// Faults, checked in this order on every data call:
/// - `fail_next(n)`: the next `n` data calls fail, then calls succeed again
/// - `set_outage(true)`: every data call fails until the outage is lifted
///
/// With `heal_on_reconnect(true)`, a `close_connection` lifts the outage,
/// which models a stale connection that a reconnect repairs.
///
/// ```
/// use kv_resilience_store::{KvStore, MemoryStore};
///
/// let store = MemoryStore::new();
/// store.set("k1", "v1").unwrap();
///
/// store.set_outage(true);
/// assert!(store.get("k1").is_err());
///
/// store.set_outage(false);
/// assert_eq!(store.get("k1").unwrap().as_deref(), Some("v1"));
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<String, String>>,
    outage: AtomicBool,
    heal_on_reconnect: AtomicBool,
    fail_close: AtomicBool,
    fail_next: AtomicU32,
    latency_micros: AtomicU64,
    data_calls: AtomicU64,
    closes: AtomicU64,
}

impl MemoryStore {
    /// Creates an empty, healthy store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts or ends an outage.
    pub fn set_outage(&self, outage: bool) {
        self.outage.store(outage, Ordering::SeqCst);
    }

    /// Returns `true` while an outage is in effect.
    pub fn is_out(&self) -> bool {
        self.outage.load(Ordering::SeqCst)
    }

    /// Makes `close_connection` end any outage.
    pub fn heal_on_reconnect(&self, heal: bool) {
        self.heal_on_reconnect.store(heal, Ordering::SeqCst);
    }

    /// Makes `close_connection` itself fail.
    pub fn fail_close_connection(&self, fail: bool) {
        self.fail_close.store(fail, Ordering::SeqCst);
    }

    /// Fails the next `count` data calls.
    pub fn fail_next(&self, count: u32) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    /// Adds a fixed delay to every data call.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_micros
            .store(latency.as_micros() as u64, Ordering::SeqCst);
    }

    /// Number of `get`/`set`/`list_keys`/`delete` calls received, failed or not.
    pub fn data_calls(&self) -> u64 {
        self.data_calls.load(Ordering::SeqCst)
    }

    /// Number of `close_connection` calls received.
    pub fn close_count(&self) -> u64 {
        self.closes.load(Ordering::SeqCst)
    }

    /// Number of stored keys, ignoring faults.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Returns `true` if no key is stored, ignoring faults.
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    fn enter(&self) -> Result<(), StoreError> {
        self.data_calls.fetch_add(1, Ordering::SeqCst);

        let latency = self.latency_micros.load(Ordering::SeqCst);
        if latency > 0 {
            std::thread::sleep(Duration::from_micros(latency));
        }

        let injected = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                remaining.checked_sub(1)
            })
            .is_ok();
        if injected {
            return Err(StoreError::connection("injected failure"));
        }

        if self.is_out() {
            return Err(StoreError::connection("store unavailable"));
        }

        Ok(())
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.enter()?;
        Ok(self.data.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.enter()?;
        self.data.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn list_keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        self.enter()?;
        Ok(self
            .data
            .read()
            .keys()
            .filter(|key| glob_match(pattern.as_bytes(), key.as_bytes()))
            .cloned()
            .collect())
    }

    fn delete(&self, keys: &[String]) -> Result<u64, StoreError> {
        self.enter()?;
        let mut data = self.data.write();
        Ok(keys.iter().filter(|key| data.remove(*key).is_some()).count() as u64)
    }

    fn close_connection(&self) -> Result<(), StoreError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close.load(Ordering::SeqCst) {
            return Err(StoreError::connection("close refused"));
        }
        if self.heal_on_reconnect.load(Ordering::SeqCst) {
            self.set_outage(false);
        }
        Ok(())
    }
}

/// `*` and `?` wildcards, the subset of KEYS patterns the wrapper uses.
fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some(b'*') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(&c) if c == b'?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    t = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == b'*')
}
