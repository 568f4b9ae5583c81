//! Rate limiter chain implementation.

use crate::window::WindowState;
use crate::{RateLimitConfig, RetryableError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::Instant;
use vermeer_error::{RateLimitError, RateLimitErrorKind, RateLimitResult};

/// Smallest sleep between admission retries; absorbs float rounding in
/// token-bucket refill arithmetic so a near-ready caller cannot spin.
const MIN_WAIT: Duration = Duration::from_millis(1);

/// Layered rate limiter guarding outbound API calls.
///
/// Holds an ordered chain of windows (outermost first) behind a single
/// lock. A call acquires a permit from *every* window atomically: the
/// limiter computes the earliest instant at which the whole chain can
/// grant the requested weight, debits all windows in one critical section
/// once that instant arrives, and otherwise sleeps and retries. No partial
/// debit ever happens, so there is nothing to roll back when an outer
/// window is exhausted.
///
/// Cloning is cheap; clones share the same budget.
///
/// # Example
///
/// ```
/// use vermeer_rate_limit::{RateLimitConfig, RateLimiter};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let limiter = RateLimiter::new(RateLimitConfig::default()).unwrap();
/// let guard = limiter.acquire(1).await.unwrap();
/// // make the guarded call...
/// drop(guard);
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct RateLimiter {
    windows: Arc<Mutex<Vec<WindowState>>>,

    // Narrowest window capacity; weights above this can never be granted.
    min_capacity: Option<u32>,

    // Concurrent request semaphore, when configured.
    concurrent: Option<Arc<Semaphore>>,

    acquire_timeout: Option<Duration>,
}

impl RateLimiter {
    /// Create a new rate limiter from configuration.
    ///
    /// # Errors
    /// Returns a `Config` error if any window has zero capacity or a zero
    /// interval.
    pub fn new(config: RateLimitConfig) -> RateLimitResult<Self> {
        for window in config.windows() {
            if window.capacity == 0 {
                return Err(RateLimitError::new(RateLimitErrorKind::Config(format!(
                    "window with interval {}ms has zero capacity",
                    window.interval_ms
                ))));
            }
            if window.interval_ms == 0 {
                return Err(RateLimitError::new(RateLimitErrorKind::Config(format!(
                    "window with capacity {} has zero interval",
                    window.capacity
                ))));
            }
        }

        let now = Instant::now();
        let windows: Vec<WindowState> = config
            .windows()
            .iter()
            .map(|w| WindowState::from_config(w, now))
            .collect();
        let min_capacity = windows.iter().map(WindowState::capacity).min();
        let concurrent = config
            .max_concurrent()
            .as_ref()
            .map(|n| Arc::new(Semaphore::new(*n as usize)));

        tracing::debug!(
            windows = windows.len(),
            max_concurrent = ?config.max_concurrent(),
            acquire_timeout = ?config.acquire_timeout(),
            "Creating new RateLimiter"
        );

        Ok(Self {
            windows: Arc::new(Mutex::new(windows)),
            min_capacity,
            concurrent,
            acquire_timeout: config.acquire_timeout(),
        })
    }

    /// A limiter that always grants immediately. Useful at boundaries the
    /// remote does not meter and in tests.
    pub fn unlimited() -> Self {
        Self {
            windows: Arc::new(Mutex::new(Vec::new())),
            min_capacity: None,
            concurrent: None,
            acquire_timeout: None,
        }
    }

    /// Acquire a permit across the whole chain.
    ///
    /// Suspends until every window can grant `weight`, then debits them all
    /// atomically. Returns a guard that releases the concurrency slot (if
    /// one is configured) when dropped; window debits are consumed, not
    /// returned.
    ///
    /// # Errors
    /// - `WeightExceedsCapacity` if `weight` is larger than the narrowest
    ///   window and could never be granted.
    /// - `Timeout` if a permit was not obtained within the configured
    ///   acquire timeout.
    pub async fn acquire(&self, weight: u32) -> RateLimitResult<RateLimiterGuard> {
        match self.acquire_timeout {
            Some(limit) => tokio::time::timeout(limit, self.acquire_inner(weight))
                .await
                .map_err(|_| {
                    RateLimitError::new(RateLimitErrorKind::Timeout {
                        waited_ms: limit.as_millis() as u64,
                    })
                })?,
            None => self.acquire_inner(weight).await,
        }
    }

    async fn acquire_inner(&self, weight: u32) -> RateLimitResult<RateLimiterGuard> {
        if let Some(capacity) = self.min_capacity
            && weight > capacity
        {
            return Err(RateLimitError::new(
                RateLimitErrorKind::WeightExceedsCapacity { weight, capacity },
            ));
        }

        loop {
            let wait = {
                let mut windows = self.windows.lock().await;
                let now = Instant::now();
                let mut ready = now;
                for window in windows.iter_mut() {
                    window.sync(now);
                    ready = ready.max(window.ready_at(weight, now));
                }
                if ready <= now {
                    for window in windows.iter_mut() {
                        window.debit(weight);
                    }
                    None
                } else {
                    Some(ready.saturating_duration_since(now))
                }
            };

            match wait {
                None => break,
                Some(wait) => {
                    tracing::trace!(?wait, weight, "Waiting for rate limit budget");
                    tokio::time::sleep(wait.max(MIN_WAIT)).await;
                }
            }
        }

        // Acquire the concurrency slot last so budget-blocked callers don't
        // hold slots while waiting.
        let permit = match &self.concurrent {
            Some(semaphore) => Some(
                semaphore
                    .clone()
                    .acquire_owned()
                    .await
                    .expect("Semaphore should not be closed"),
            ),
            None => None,
        };

        Ok(RateLimiterGuard { _permit: permit })
    }

    /// Try to acquire without waiting.
    ///
    /// Returns `None` if any window or the concurrency bound would block.
    pub fn try_acquire(&self, weight: u32) -> Option<RateLimiterGuard> {
        if let Some(capacity) = self.min_capacity
            && weight > capacity
        {
            return None;
        }

        // Take the concurrency slot first; it is returned automatically if
        // the windows refuse.
        let permit = match &self.concurrent {
            Some(semaphore) => Some(semaphore.clone().try_acquire_owned().ok()?),
            None => None,
        };

        let mut windows = self.windows.try_lock().ok()?;
        let now = Instant::now();
        let mut ready = now;
        for window in windows.iter_mut() {
            window.sync(now);
            ready = ready.max(window.ready_at(weight, now));
        }
        if ready > now {
            return None;
        }
        for window in windows.iter_mut() {
            window.debit(weight);
        }

        Some(RateLimiterGuard { _permit: permit })
    }

    /// Execute an operation under the limiter with explicit retry.
    ///
    /// For each attempt: acquire a permit, run the operation, and on a
    /// transient failure (per [`RetryableError`]) retry with exponential
    /// backoff and jitter. Permanent failures return immediately. This is
    /// the only retry path in the layer, and callers opt into it.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let page = limiter.execute(1, || async {
    ///     rest.fetch_messages(channel, None, 100).await
    /// }).await?;
    /// ```
    pub async fn execute<F, Fut, R, E>(&self, weight: u32, operation: F) -> Result<R, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: RetryableError + From<RateLimitError> + std::fmt::Display,
    {
        use tokio_retry2::{Retry, RetryError, strategy::ExponentialBackoff, strategy::jitter};
        use tracing::warn;

        let retry_strategy = ExponentialBackoff::from_millis(2000)
            .factor(2)
            .max_delay(Duration::from_secs(60))
            .map(jitter)
            .take(5);

        Retry::spawn(retry_strategy, || async {
            // Acquire rate limit permission before each attempt
            let _guard = match self.acquire(weight).await {
                Ok(guard) => guard,
                Err(e) => return Err(RetryError::Permanent(E::from(e))),
            };

            match operation().await {
                Ok(value) => Ok(value),
                Err(e) => {
                    if e.is_retryable() {
                        warn!("Transient error, will retry: {}", e);
                        Err(RetryError::Transient {
                            err: e,
                            retry_after: None,
                        })
                    } else {
                        warn!("Permanent error, failing immediately: {}", e);
                        Err(RetryError::Permanent(e))
                    }
                }
            }
        })
        .await
    }
}

/// RAII guard for a granted permit.
///
/// Holds the concurrency slot (when one is configured) and returns it on
/// drop, even if the guarded call fails or panics. Window debits are part
/// of the spent budget and are replenished only by the window's own clock.
#[derive(Debug)]
pub struct RateLimiterGuard {
    _permit: Option<tokio::sync::OwnedSemaphorePermit>,
}
