//! Small TTL cache for tool-side lookups (geocoding, quotes).
//!
//! Expiry is lazy: entries are evicted when a read finds them stale.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub struct TtlCache<V> {
    ttl: Duration,
    store: Mutex<HashMap<String, (Instant, V)>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            store: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let mut store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        match store.get(key) {
            Some((written, value)) if written.elapsed() <= self.ttl => Some(value.clone()),
            Some(_) => {
                store.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn set(&self, key: impl Into<String>, value: V) {
        let mut store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        store.insert(key.into(), (Instant::now(), value));
    }
}
