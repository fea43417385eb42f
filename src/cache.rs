//! Fixed-capacity TTL cache with at-most-once async construction.
//!
//! Reads never return expired entries (expired records are removed
//! opportunistically on access). When the cache is full, the oldest insertion
//! is evicted (plain FIFO). [`TtlCache::get_or_compute`] guarantees that
//! concurrent callers on the same key await a single builder invocation and
//! all observe the same value.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::OnceCell;

struct Inner<V> {
    store: HashMap<String, (Instant, V)>,
    order: VecDeque<String>,
    pending: HashMap<String, Arc<OnceCell<V>>>,
}

pub struct TtlCache<V> {
    ttl: Duration,
    max_entries: usize,
    inner: Mutex<Inner<V>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        TtlCache {
            ttl,
            max_entries: max_entries.max(1),
            inner: Mutex::new(Inner {
                store: HashMap::new(),
                order: VecDeque::new(),
                pending: HashMap::new(),
            }),
        }
    }

    /// Value for `key` if present and not expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock();
        match inner.store.get(key) {
            Some((expiry, value)) if *expiry > Instant::now() => Some(value.clone()),
            Some(_) => {
                inner.store.remove(key);
                inner.order.retain(|k| k != key);
                None
            }
            None => None,
        }
    }

    /// Insert `value` under `key`, evicting the oldest insertion when full.
    pub fn set(&self, key: &str, value: V) {
        let mut inner = self.inner.lock();
        let expiry = Instant::now() + self.ttl;
        if inner.store.contains_key(key) {
            inner.store.insert(key.to_string(), (expiry, value));
            return;
        }
        while inner.store.len() >= self.max_entries {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.store.remove(&oldest);
                }
                None => break,
            }
        }
        inner.store.insert(key.to_string(), (expiry, value));
        inner.order.push_back(key.to_string());
    }

    pub fn len(&self) -> usize {
        self.inner.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached value for `key`, or await `build` — at most once per key even
    /// under concurrent callers; every waiter receives the built value.
    pub async fn get_or_compute<F, Fut, E>(&self, key: &str, build: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }

        let cell = {
            let mut inner = self.inner.lock();
            inner
                .pending
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let result = cell.get_or_try_init(build).await.cloned();

        let mut inner = self.inner.lock();
        match &result {
            Ok(value) => {
                // First completer publishes to the store; later waiters are a no-op
                // because set() replaces in place for known keys.
                if inner.pending.remove(key).is_some() {
                    drop(inner);
                    self.set(key, value.clone());
                }
            }
            Err(_) => {
                // Failed build: forget the cell so the next caller retries fresh.
                if !cell.initialized() {
                    inner.pending.remove(key);
                }
            }
        }
        result
    }
}
