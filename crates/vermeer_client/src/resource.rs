//! Read-through caching bound to a rate-limited remote fetch.

use futures::FutureExt;
use futures::future::BoxFuture;
use std::hash::Hash;
use std::sync::Arc;
use vermeer_cache::{CacheConfig, TtlCache};
use vermeer_error::{FetchError, FetchResult, RateLimitError, VermeerResult};
use vermeer_rate_limit::RateLimiter;

/// Error type carried through the single-flight cache; `Clone` so one
/// failure can be handed to every waiter.
#[derive(Debug, Clone)]
enum LoadError {
    Fetch(FetchError),
    RateLimit(RateLimitError),
}

type FetchFn<K, V> = Arc<dyn Fn(K) -> BoxFuture<'static, FetchResult<Option<V>>> + Send + Sync>;

/// A [`TtlCache`] bound to a rate-limited remote fetch for one resource
/// type (guild, channel, member).
///
/// Reads are served from the cache when fresh; misses acquire a rate-limit
/// permit, fetch, and install the result, with concurrent misses for the
/// same key collapsed into a single remote call. Cache hits never touch
/// the limiter.
pub struct CachedResource<K, V> {
    name: &'static str,
    cache: TtlCache<K, V, LoadError>,
    limiter: RateLimiter,
    fetch: FetchFn<K, V>,
}

impl<K, V> Clone for CachedResource<K, V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            cache: self.cache.clone(),
            limiter: self.limiter.clone(),
            fetch: Arc::clone(&self.fetch),
        }
    }
}

impl<K, V> CachedResource<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    /// Bind a cache to a remote fetch.
    ///
    /// `name` labels tracing spans ("guild", "member"). The limiter is
    /// shared with every other resource talking to the same remote, so one
    /// budget covers them all.
    pub fn new<F, Fut>(
        name: &'static str,
        config: CacheConfig,
        limiter: RateLimiter,
        fetch: F,
    ) -> Self
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = FetchResult<Option<V>>> + Send + 'static,
    {
        Self {
            name,
            cache: TtlCache::new(config),
            limiter,
            fetch: Arc::new(move |key| fetch(key).boxed()),
        }
    }

    /// Get an entity, fetching through the rate limiter on a miss.
    ///
    /// `Ok(None)` means the remote confirmed the entity does not exist;
    /// absence is not cached, so a later call asks again.
    #[tracing::instrument(skip(self, key), fields(resource = self.name))]
    pub async fn get(&self, key: K) -> VermeerResult<Option<V>> {
        let limiter = self.limiter.clone();
        let fetch = Arc::clone(&self.fetch);
        let fetch_key = key.clone();
        let result = self
            .cache
            .get_or_load(key, move || async move {
                let _permit = limiter.acquire(1).await.map_err(LoadError::RateLimit)?;
                fetch(fetch_key).await.map_err(LoadError::Fetch)
            })
            .await;

        match result {
            Ok(value) => Ok(value),
            Err(LoadError::Fetch(e)) => Err(e.into()),
            Err(LoadError::RateLimit(e)) => Err(e.into()),
        }
    }

    /// Re-fetch an entity, bypassing the cached read.
    ///
    /// Still passes the rate limiter. A fetched value overwrites the cache
    /// entry; a confirmed absence removes it. Used when an external event
    /// signals the entity changed.
    #[tracing::instrument(skip(self, key), fields(resource = self.name))]
    pub async fn refresh(&self, key: K) -> VermeerResult<Option<V>> {
        let _permit = self.limiter.acquire(1).await?;
        let value = (self.fetch)(key.clone()).await?;

        match &value {
            Some(v) => self.cache.put(key, v.clone()),
            None => {
                tracing::debug!("Entity gone upstream, dropping cache entry");
                self.cache.invalidate(&key);
            }
        }
        Ok(value)
    }

    /// Drop the local cache entry. Never calls the remote; deletion
    /// upstream is signaled by external events, this only forgets.
    pub fn delete(&self, key: &K) {
        if self.cache.invalidate(key) {
            tracing::debug!(resource = self.name, "Invalidated cache entry");
        }
    }

    /// Drop every cached entry for this resource.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
