use std::sync::Arc;

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use rust_decimal_macros::dec;

use super::*;
use crate::cache::TtlCacheStore;
use crate::errors::FetchError;
use crate::models::{DataKind, Observation};
use crate::provider::MarketDataProvider;
use crate::registry::{CircuitBreaker, CircuitBreakerConfig, CircuitState, SkipReason, SourceRegistry};
use crate::testing::MockProvider;

fn resolver_with(providers: Vec<Arc<dyn MarketDataProvider>>) -> (FallbackResolver, Arc<TtlCacheStore>) {
    let cache = Arc::new(TtlCacheStore::new());
    let resolver = FallbackResolver::new(Arc::new(SourceRegistry::new(providers)), Arc::clone(&cache));
    (resolver, cache)
}

#[tokio::test]
async fn test_second_source_answers_when_first_fails() {
    let a = Arc::new(MockProvider::failing("A", DataKind::Price, 1));
    let b = Arc::new(MockProvider::ok("B", DataKind::Price, 2, dec!(50)));
    let c = Arc::new(MockProvider::ok("C", DataKind::Price, 3, dec!(70)));
    let (resolver, _) = resolver_with(vec![a.clone(), b.clone(), c.clone()]);

    let resolution = resolver.resolve("161226", DataKind::Price).await;

    let value = resolution.value.as_ref().unwrap();
    assert_eq!(value.observation.value, dec!(50));
    assert_eq!(value.source_name, "B");
    assert_eq!(value.source_id, "B");
    assert!(value.is_live());
    assert_eq!(resolution.tried, ["A", "B"]);
    assert_eq!(a.calls(), 1);
    assert_eq!(b.calls(), 1);
    assert_eq!(c.calls(), 0);
}

#[tokio::test]
async fn test_exhausted_chain_lists_every_source() {
    let (resolver, _) = resolver_with(vec![
        Arc::new(MockProvider::failing("A", DataKind::Reference, 1)),
        Arc::new(MockProvider::failing("B", DataKind::Reference, 2)),
    ]);

    let resolution = resolver.resolve("161226", DataKind::Reference).await;

    assert!(!resolution.is_resolved());
    assert_eq!(resolution.tried_display(), "A, B, Cache");
    assert_eq!(resolution.diagnostics.errors().len(), 2);
    let last = resolution.diagnostics.attempts.last().unwrap();
    assert_eq!(last.skipped, Some(SkipReason::CacheMiss));
}

#[tokio::test]
async fn test_expired_cache_entry_is_not_used() {
    let t0 = Utc.with_ymd_and_hms(2024, 5, 13, 9, 30, 0).unwrap();
    let (resolver, cache) = resolver_with(vec![Arc::new(MockProvider::failing("A", DataKind::Price, 1))]);
    cache.put_at("161226", DataKind::Price, Observation::new(dec!(1.2)), "A", t0);

    let late = resolver
        .resolve_at("161226", DataKind::Price, t0 + ChronoDuration::seconds(301))
        .await;
    assert!(late.value.is_none());
    assert_eq!(late.tried, ["A", "Cache"]);
    let last = late.diagnostics.attempts.last().unwrap();
    assert_eq!(last.skipped, Some(SkipReason::CacheExpired));

    let on_time = resolver
        .resolve_at("161226", DataKind::Price, t0 + ChronoDuration::seconds(300))
        .await;
    let value = on_time.value.unwrap();
    assert_eq!(value.source_name, "A (cached)");
    assert_eq!(value.origin, ValueOrigin::FreshCache);
    assert_eq!(value.observation.value, dec!(1.2));
}

#[tokio::test]
async fn test_expired_cache_reached_only_after_live_sources() {
    let t0 = Utc.with_ymd_and_hms(2024, 5, 13, 9, 30, 0).unwrap();
    let live = Arc::new(MockProvider::ok("LIVE", DataKind::Price, 1, dec!(1.5)));
    let (resolver, cache) = resolver_with(vec![live.clone()]);
    cache.put_at("161226", DataKind::Price, Observation::new(dec!(1.2)), "LIVE", t0);

    let resolution = resolver
        .resolve_at("161226", DataKind::Price, t0 + ChronoDuration::seconds(301))
        .await;

    let value = resolution.value.unwrap();
    assert_eq!(value.observation.value, dec!(1.5));
    assert!(value.is_live());
    assert_eq!(live.calls(), 1);
}

#[tokio::test]
async fn test_stale_tier_only_when_enabled() {
    let t0 = Utc.with_ymd_and_hms(2024, 5, 13, 9, 30, 0).unwrap();
    let cache = Arc::new(TtlCacheStore::new());
    cache.put_at("161226", DataKind::Reference, Observation::new(dec!(1.01)), "East Money NAV", t0);
    let sources = Arc::new(SourceRegistry::new(vec![Arc::new(MockProvider::failing(
        "A",
        DataKind::Reference,
        1,
    ))]));

    let resolver = FallbackResolver::new(Arc::clone(&sources), Arc::clone(&cache))
        .with_options(ResolverOptions { stale_fallback: true });
    let later = t0 + ChronoDuration::hours(2);
    let value = resolver
        .resolve_at("161226", DataKind::Reference, later)
        .await
        .value
        .unwrap();
    assert_eq!(value.source_name, "East Money NAV (stale)");
    assert_eq!(value.origin, ValueOrigin::StaleCache);

    let strict = FallbackResolver::new(sources, cache);
    assert!(strict
        .resolve_at("161226", DataKind::Reference, later)
        .await
        .value
        .is_none());
}

#[tokio::test]
async fn test_non_positive_value_falls_through() {
    let (resolver, _) = resolver_with(vec![
        Arc::new(MockProvider::ok("ZERO", DataKind::Price, 1, dec!(0))),
        Arc::new(MockProvider::ok("GOOD", DataKind::Price, 2, dec!(0.987))),
    ]);

    let resolution = resolver.resolve("161226", DataKind::Price).await;

    assert_eq!(resolution.value.unwrap().source_name, "GOOD");
    let errors = resolution.diagnostics.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].1.starts_with("Invalid value: ZERO"));
}

#[tokio::test]
async fn test_open_circuit_is_skipped_but_listed() {
    let flaky = Arc::new(MockProvider::failing("FLAKY", DataKind::Price, 1));
    let backup = Arc::new(MockProvider::ok("BACKUP", DataKind::Price, 2, dec!(1.1)));
    let breaker = Arc::new(CircuitBreaker::with_config(CircuitBreakerConfig {
        failure_threshold: 2,
        ..CircuitBreakerConfig::default()
    }));
    let resolver = FallbackResolver::new(
        Arc::new(SourceRegistry::new(vec![flaky.clone(), backup.clone()])),
        Arc::new(TtlCacheStore::new()),
    )
    .with_circuit_breaker(Arc::clone(&breaker));

    resolver.resolve("161226", DataKind::Price).await;
    resolver.resolve("161226", DataKind::Price).await;
    assert_eq!(breaker.state("FLAKY"), CircuitState::Open);

    let resolution = resolver.resolve("161226", DataKind::Price).await;
    assert_eq!(flaky.calls(), 2);
    assert_eq!(resolution.tried, ["FLAKY", "BACKUP"]);
    assert_eq!(
        resolution.diagnostics.attempts[0].skipped,
        Some(SkipReason::CircuitBreakerOpen)
    );
    assert_eq!(resolution.value.unwrap().source_name, "BACKUP");
}

#[tokio::test]
async fn test_parse_failures_do_not_trip_circuit() {
    let broken = Arc::new(MockProvider::failing_with(
        "BROKEN",
        DataKind::Price,
        1,
        FetchError::MalformedResponse {
            provider: "BROKEN".to_string(),
            message: "empty quote".to_string(),
        },
    ));
    let breaker = Arc::new(CircuitBreaker::with_config(CircuitBreakerConfig {
        failure_threshold: 1,
        ..CircuitBreakerConfig::default()
    }));
    let resolver = FallbackResolver::new(
        Arc::new(SourceRegistry::new(vec![broken.clone()])),
        Arc::new(TtlCacheStore::new()),
    )
    .with_circuit_breaker(Arc::clone(&breaker));

    resolver.resolve("161226", DataKind::Price).await;
    resolver.resolve("161226", DataKind::Price).await;

    assert_eq!(breaker.state("BROKEN"), CircuitState::Closed);
    assert_eq!(broken.calls(), 2);
}
