//! In-memory cache for resolved quotes and FX rates.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// A process-lifetime cache keyed by symbol or currency-pair string. Keeps
/// repeated provider lookups within one command from hitting the network
/// twice.
#[derive(Clone)]
pub struct Cache<V>
where
    V: Clone + Send + Sync + 'static,
{
    inner: Arc<Mutex<HashMap<String, V>>>,
}

impl<V> Cache<V>
where
    V: Clone + Send + Sync,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        let cache = self.inner.lock().await;
        let value = cache.get(key).cloned();
        if value.is_some() {
            debug!(key, "Cache HIT");
        } else {
            debug!(key, "Cache MISS");
        }
        value
    }

    pub async fn put(&self, key: &str, value: V) {
        let mut cache = self.inner.lock().await;
        debug!(key, "Cache PUT");
        cache.insert(key.to_string(), value);
    }
}

impl<V> Default for Cache<V>
where
    V: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}
