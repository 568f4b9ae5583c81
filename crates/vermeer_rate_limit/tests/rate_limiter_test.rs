//! Tests for window ceilings, chain acquisition, concurrency bounds, and
//! timeouts. Paused-clock tests drive refill and reset deterministically.

use std::time::Duration;
use tokio::time::Instant;
use vermeer_error::RateLimitErrorKind;
use vermeer_rate_limit::{
    RateLimitConfig, RateLimitConfigBuilder, RateLimiter, WindowAlgorithm, WindowConfig,
};

fn single_window(window: WindowConfig) -> RateLimitConfig {
    RateLimitConfigBuilder::default()
        .windows(vec![window])
        .build()
        .unwrap()
}

#[tokio::test]
async fn unlimited_grants_immediately() {
    let limiter = RateLimiter::unlimited();
    for _ in 0..1000 {
        limiter.acquire(1).await.unwrap();
    }
}

#[test]
fn zero_capacity_window_is_rejected() {
    let config = single_window(WindowConfig {
        capacity: 0,
        interval_ms: 1_000,
        algorithm: WindowAlgorithm::TokenBucket,
    });
    let err = RateLimiter::new(config).unwrap_err();
    assert!(matches!(err.kind(), RateLimitErrorKind::Config(_)));
}

#[test]
fn zero_interval_window_is_rejected() {
    let config = single_window(WindowConfig {
        capacity: 10,
        interval_ms: 0,
        algorithm: WindowAlgorithm::FixedWindow,
    });
    let err = RateLimiter::new(config).unwrap_err();
    assert!(matches!(err.kind(), RateLimitErrorKind::Config(_)));
}

#[tokio::test]
async fn weight_above_narrowest_capacity_fails_fast() {
    let config = single_window(WindowConfig::token_bucket(5, Duration::from_secs(1)));
    let limiter = RateLimiter::new(config).unwrap();

    let err = limiter.acquire(6).await.unwrap_err();
    assert!(matches!(
        err.kind(),
        RateLimitErrorKind::WeightExceedsCapacity {
            weight: 6,
            capacity: 5
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn token_bucket_blocks_until_refill() {
    let config = single_window(WindowConfig::token_bucket(10, Duration::from_secs(1)));
    let limiter = RateLimiter::new(config).unwrap();

    // Drain the burst budget.
    for _ in 0..10 {
        limiter.acquire(1).await.unwrap();
    }

    // The next permit needs one token, refilled at 10/sec.
    let before = Instant::now();
    limiter.acquire(1).await.unwrap();
    let waited = before.elapsed();
    assert!(waited >= Duration::from_millis(100), "waited {waited:?}");
    assert!(waited < Duration::from_millis(250), "waited {waited:?}");
}

#[tokio::test(start_paused = true)]
async fn token_bucket_refills_only_to_capacity() {
    let config = single_window(WindowConfig::token_bucket(5, Duration::from_secs(1)));
    let limiter = RateLimiter::new(config).unwrap();

    // Idle far longer than one interval; the burst is still capped at 5.
    tokio::time::advance(Duration::from_secs(60)).await;

    for _ in 0..5 {
        assert!(limiter.try_acquire(1).is_some());
    }
    assert!(limiter.try_acquire(1).is_none());
}

#[tokio::test(start_paused = true)]
async fn fixed_window_resets_at_boundary() {
    let config = single_window(WindowConfig::fixed_window(3, Duration::from_secs(60)));
    let limiter = RateLimiter::new(config).unwrap();

    for _ in 0..3 {
        limiter.acquire(1).await.unwrap();
    }
    assert!(limiter.try_acquire(1).is_none());

    // Budget does not trickle back mid-window.
    tokio::time::advance(Duration::from_secs(59)).await;
    assert!(limiter.try_acquire(1).is_none());

    // The boundary restores the full budget at once.
    tokio::time::advance(Duration::from_secs(2)).await;
    for _ in 0..3 {
        assert!(limiter.try_acquire(1).is_some());
    }
}

#[tokio::test(start_paused = true)]
async fn blocked_caller_wakes_at_window_boundary() {
    let config = single_window(WindowConfig::fixed_window(1, Duration::from_secs(60)));
    let limiter = RateLimiter::new(config).unwrap();

    limiter.acquire(1).await.unwrap();

    let before = Instant::now();
    limiter.acquire(1).await.unwrap();
    let waited = before.elapsed();
    assert!(waited >= Duration::from_secs(60), "waited {waited:?}");
    assert!(waited < Duration::from_secs(61), "waited {waited:?}");
}

#[tokio::test(start_paused = true)]
async fn chain_debits_all_windows_or_none() {
    // Inner fixed window is the tighter constraint: 2 per minute.
    let config = RateLimitConfigBuilder::default()
        .windows(vec![
            WindowConfig::token_bucket(10, Duration::from_secs(1)),
            WindowConfig::fixed_window(2, Duration::from_secs(60)),
        ])
        .build()
        .unwrap();
    let limiter = RateLimiter::new(config).unwrap();

    limiter.acquire(1).await.unwrap();
    limiter.acquire(1).await.unwrap();

    // The fixed window is exhausted; nothing should have been debited from
    // the bucket for the refused attempt, so after the boundary the bucket
    // still grants its full remaining burst.
    assert!(limiter.try_acquire(1).is_none());

    tokio::time::advance(Duration::from_secs(61)).await;
    limiter.acquire(1).await.unwrap();
    limiter.acquire(1).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn weighted_acquisition_debits_proportionally() {
    let config = single_window(WindowConfig::fixed_window(10, Duration::from_secs(60)));
    let limiter = RateLimiter::new(config).unwrap();

    limiter.acquire(7).await.unwrap();
    assert!(limiter.try_acquire(4).is_none());
    assert!(limiter.try_acquire(3).is_some());
    assert!(limiter.try_acquire(1).is_none());
}

#[tokio::test]
async fn concurrency_bound_limits_in_flight_guards() {
    let config = RateLimitConfigBuilder::default()
        .windows(Vec::new())
        .max_concurrent(Some(2))
        .build()
        .unwrap();
    let limiter = RateLimiter::new(config).unwrap();

    let a = limiter.try_acquire(1).unwrap();
    let _b = limiter.try_acquire(1).unwrap();
    assert!(limiter.try_acquire(1).is_none());

    // Dropping a guard frees its slot.
    drop(a);
    assert!(limiter.try_acquire(1).is_some());
}

#[tokio::test(start_paused = true)]
async fn acquire_times_out_when_configured() {
    let config = RateLimitConfigBuilder::default()
        .windows(vec![WindowConfig::fixed_window(1, Duration::from_secs(600))])
        .acquire_timeout_ms(Some(1_000))
        .build()
        .unwrap();
    let limiter = RateLimiter::new(config).unwrap();

    limiter.acquire(1).await.unwrap();
    let err = limiter.acquire(1).await.unwrap_err();
    assert!(matches!(
        err.kind(),
        RateLimitErrorKind::Timeout { waited_ms: 1_000 }
    ));
}

#[tokio::test(start_paused = true)]
async fn clones_share_the_same_budget() {
    let config = single_window(WindowConfig::fixed_window(2, Duration::from_secs(60)));
    let limiter = RateLimiter::new(config).unwrap();
    let clone = limiter.clone();

    limiter.acquire(1).await.unwrap();
    clone.acquire(1).await.unwrap();
    assert!(limiter.try_acquire(1).is_none());
    assert!(clone.try_acquire(1).is_none());
}

#[test]
fn config_deserializes_window_chain() {
    let config: RateLimitConfig = serde_json::from_str(
        r#"{
            "windows": [
                {"capacity": 50, "interval_ms": 1000, "algorithm": "token_bucket"},
                {"capacity": 300, "interval_ms": 60000, "algorithm": "fixed_window"}
            ],
            "max_concurrent": 8,
            "acquire_timeout_ms": 5000
        }"#,
    )
    .unwrap();

    assert_eq!(config.windows().len(), 2);
    assert_eq!(config.windows()[0].algorithm, WindowAlgorithm::TokenBucket);
    assert_eq!(*config.max_concurrent(), Some(8));
    assert_eq!(config.acquire_timeout(), Some(Duration::from_secs(5)));
}

#[test]
fn default_config_matches_published_budgets() {
    let config = RateLimitConfig::default();
    assert_eq!(config.windows().len(), 2);
    assert_eq!(config.windows()[0].capacity, 50);
    assert_eq!(config.windows()[1].capacity, 300);
    assert_eq!(*config.max_concurrent(), None);
}
