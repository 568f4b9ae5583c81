//! TTL cache implementation with single-flight loading.

use crate::{CacheConfig, EvictionPolicy};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Cache entry with value and expiry bookkeeping.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    accessed_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V) -> Self {
        let now = Instant::now();
        Self {
            value,
            inserted_at: now,
            accessed_at: now,
        }
    }

    /// The cached value.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// When the entry was last written.
    pub fn inserted_at(&self) -> Instant {
        self.inserted_at
    }

    /// When the entry was last read or written.
    pub fn accessed_at(&self) -> Instant {
        self.accessed_at
    }

    /// Check whether this entry has outlived `ttl` under `policy`.
    ///
    /// `ActivityBased` measures age from the last write; `UsageBased`
    /// measures it from the last access of any kind.
    pub fn is_expired(&self, ttl: Duration, policy: EvictionPolicy) -> bool {
        let basis = match policy {
            EvictionPolicy::ActivityBased => self.inserted_at,
            EvictionPolicy::UsageBased => self.accessed_at,
        };
        basis.elapsed() > ttl
    }
}

struct Store<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    access_order: Vec<K>,
}

impl<K, V> Store<K, V> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            access_order: Vec::new(),
        }
    }
}

type PendingLoad<V, E> = Shared<BoxFuture<'static, Result<Option<V>, E>>>;

/// Generic key-value store with TTL expiry, optional LRU capacity bounds,
/// and single-flight loading.
///
/// Expiry is checked lazily on access: an entry older than the TTL is
/// treated as a miss and removed. The cache is cheaply cloneable and all
/// clones share the same storage.
///
/// The third type parameter is the loader error type used by
/// [`TtlCache::get_or_load`]; caches that never load can leave it at the
/// default.
///
/// # Example
///
/// ```
/// use vermeer_cache::{CacheConfig, TtlCache};
///
/// let cache: TtlCache<u64, String> = TtlCache::new(CacheConfig::default());
/// cache.put(1, "hello".to_string());
/// assert_eq!(cache.get(&1), Some("hello".to_string()));
/// cache.invalidate(&1);
/// assert_eq!(cache.get(&1), None);
/// ```
pub struct TtlCache<K, V, E = std::convert::Infallible> {
    config: CacheConfig,
    store: Arc<Mutex<Store<K, V>>>,
    pending: Arc<Mutex<HashMap<K, PendingLoad<V, E>>>>,
}

impl<K, V, E> Clone for TtlCache<K, V, E> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            store: Arc::clone(&self.store),
            pending: Arc::clone(&self.pending),
        }
    }
}

impl<K, V, E> TtlCache<K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a new cache from configuration.
    pub fn new(config: CacheConfig) -> Self {
        tracing::debug!(
            ttl_secs = config.ttl_secs(),
            capacity = ?config.capacity(),
            policy = %config.policy(),
            enabled = config.enabled(),
            "Creating new TtlCache"
        );
        Self {
            config,
            store: Arc::new(Mutex::new(Store::new())),
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The configuration this cache was built with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get a cached value.
    ///
    /// Returns `None` if the entry doesn't exist, has expired, or the cache
    /// is disabled. Expired entries are removed on the way out. A hit
    /// refreshes the access clock, which extends the entry's life only
    /// under [`EvictionPolicy::UsageBased`].
    pub fn get(&self, key: &K) -> Option<V> {
        if !*self.config.enabled() {
            return None;
        }

        let ttl = self.config.ttl();
        let policy = *self.config.policy();
        let mut store = self.store.lock().expect("cache store lock poisoned");

        let expired = match store.entries.get(key) {
            Some(entry) => entry.is_expired(ttl, policy),
            None => return None,
        };
        if expired {
            tracing::debug!("Cache entry expired, removing");
            store.entries.remove(key);
            if let Some(pos) = store.access_order.iter().position(|k| k == key) {
                store.access_order.remove(pos);
            }
            return None;
        }

        // Update access order for LRU
        if let Some(pos) = store.access_order.iter().position(|k| k == key) {
            let key_clone = store.access_order.remove(pos);
            store.access_order.push(key_clone);
        }

        store.entries.get_mut(key).map(|entry| {
            entry.accessed_at = Instant::now();
            entry.value.clone()
        })
    }

    /// Insert or overwrite a value.
    ///
    /// Writing resets the expiry clock under either policy. When the cache
    /// is at capacity and the key is new, the least recently used entry is
    /// evicted first.
    pub fn put(&self, key: K, value: V) {
        if !*self.config.enabled() {
            tracing::debug!("Cache disabled, skipping insert");
            return;
        }

        let mut store = self.store.lock().expect("cache store lock poisoned");

        // Evict if at capacity
        if let Some(capacity) = self.config.capacity()
            && store.entries.len() >= *capacity
            && !store.entries.contains_key(&key)
        {
            Self::evict_lru(&mut store);
        }

        // Track access order for LRU
        if let Some(pos) = store.access_order.iter().position(|k| k == &key) {
            store.access_order.remove(pos);
        }
        store.access_order.push(key.clone());

        store.entries.insert(key, CacheEntry::new(value));
    }

    /// Remove a single entry. Returns whether an entry was present.
    ///
    /// This is purely local invalidation; it never talks to a remote.
    pub fn invalidate(&self, key: &K) -> bool {
        let mut store = self.store.lock().expect("cache store lock poisoned");
        if let Some(pos) = store.access_order.iter().position(|k| k == key) {
            store.access_order.remove(pos);
        }
        store.entries.remove(key).is_some()
    }

    /// Remove expired entries. Returns how many were dropped.
    pub fn cleanup_expired(&self) -> usize {
        let ttl = self.config.ttl();
        let policy = *self.config.policy();
        let mut store = self.store.lock().expect("cache store lock poisoned");

        let before = store.entries.len();
        let mut expired_keys = Vec::new();
        store.entries.retain(|key, entry| {
            let keep = !entry.is_expired(ttl, policy);
            if !keep {
                expired_keys.push(key.clone());
            }
            keep
        });
        store
            .access_order
            .retain(|key| !expired_keys.contains(key));

        let removed = before - store.entries.len();
        if removed > 0 {
            tracing::info!(
                removed,
                remaining = store.entries.len(),
                "Cleaned up expired cache entries"
            );
        }
        removed
    }

    /// Clear all entries.
    pub fn clear(&self) {
        let mut store = self.store.lock().expect("cache store lock poisoned");
        let count = store.entries.len();
        store.entries.clear();
        store.access_order.clear();
        tracing::info!(cleared = count, "Cleared cache");
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.store
            .lock()
            .expect("cache store lock poisoned")
            .entries
            .len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evict the least recently used entry.
    fn evict_lru(store: &mut Store<K, V>) {
        if !store.access_order.is_empty() {
            let key = store.access_order.remove(0);
            tracing::debug!("Evicting LRU entry");
            store.entries.remove(&key);
        }
    }
}

impl<K, V, E> TtlCache<K, V, E>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Read-through lookup with single-flight loading.
    ///
    /// On a hit the cached value is returned without invoking `loader`. On
    /// a miss, at most one loader runs per key at any time: concurrent
    /// callers for the same missing key await the same in-flight load,
    /// while callers for different keys proceed independently.
    ///
    /// The loader reports `Ok(None)` when the remote confirms the entity is
    /// absent; absence is handed to every waiter and nothing is cached, so
    /// the entity is fetched again next time. A loader failure likewise
    /// fans out to every waiter and leaves the key absent, letting the next
    /// caller retry. Either a new value is installed or the prior cache
    /// state remains untouched.
    ///
    /// # Example
    ///
    /// ```
    /// use vermeer_cache::{CacheConfig, TtlCache};
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let cache: TtlCache<u64, String, String> = TtlCache::new(CacheConfig::default());
    /// let loaded = cache
    ///     .get_or_load(7, || async { Ok(Some("fetched".to_string())) })
    ///     .await;
    /// assert_eq!(loaded, Ok(Some("fetched".to_string())));
    /// // Second call hits the cache, the loader does not run.
    /// let hit = cache
    ///     .get_or_load(7, || async { panic!("loader should not run") })
    ///     .await;
    /// assert_eq!(hit, Ok(Some("fetched".to_string())));
    /// # }
    /// ```
    pub async fn get_or_load<F, Fut>(&self, key: K, loader: F) -> Result<Option<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<V>, E>> + Send + 'static,
    {
        if let Some(hit) = self.get(&key) {
            return Ok(Some(hit));
        }

        let flight = {
            let mut pending = self.pending.lock().expect("cache pending lock poisoned");
            // A writer may have raced us between the miss and this lock.
            if let Some(hit) = self.get(&key) {
                return Ok(Some(hit));
            }
            match pending.get(&key) {
                Some(flight) => {
                    tracing::debug!("Joining in-flight load");
                    flight.clone()
                }
                None => {
                    tracing::debug!("Starting load");
                    let flight = loader().boxed().shared();
                    pending.insert(key.clone(), flight.clone());
                    flight
                }
            }
        };

        let result = flight.clone().await;

        // Whichever waiter observes completion first retires the flight and
        // installs the value. ptr_eq guards against retiring a newer flight
        // for the same key.
        let install = {
            let mut pending = self.pending.lock().expect("cache pending lock poisoned");
            match pending.get(&key) {
                Some(current) if current.ptr_eq(&flight) => {
                    pending.remove(&key);
                    true
                }
                _ => false,
            }
        };
        if install && let Ok(Some(value)) = &result {
            self.put(key, value.clone());
        }

        result
    }
}
