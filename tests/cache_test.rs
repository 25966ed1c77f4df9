//! Tests for [`TtlCache`]: fresh/stale reads on a paused clock.

use std::time::Duration;

use hugin::cache::{CacheStore, TtlCache};
use hugin::{CacheKey, PayloadKind, derive_key_plain};

fn key(text: &str) -> CacheKey {
    derive_key_plain(PayloadKind::Dashboard, text)
}

#[tokio::test]
async fn cache_miss_returns_none() {
    let cache: TtlCache<String> = TtlCache::new(PayloadKind::Dashboard, 10);
    assert!(cache.get(&key("nonexistent")).await.is_none());
    assert!(cache.get_stale(&key("nonexistent")).await.is_none());
    assert!(cache.is_empty());
}

#[tokio::test(start_paused = true)]
async fn fresh_for_exactly_the_ttl() {
    let cache = TtlCache::new(PayloadKind::Dashboard, 10);
    let k = key("AAPL:100.00");
    cache.set(&k, "v".to_string(), Duration::from_secs(60)).await;

    for elapsed in [0, 1, 30, 59] {
        let entry = cache.entry(&k).unwrap();
        assert!(
            entry.is_fresh_at(entry.stored_at + Duration::from_secs(elapsed)),
            "{elapsed}s"
        );
    }

    tokio::time::advance(Duration::from_secs(59)).await;
    assert_eq!(cache.get(&k).await.as_deref(), Some("v"));
    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(cache.get(&k).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn stale_until_overwritten() {
    let cache = TtlCache::new(PayloadKind::Dashboard, 10);
    let k = key("AAPL:100.00");
    cache.set(&k, 1u32, Duration::from_secs(1)).await;

    tokio::time::advance(Duration::from_secs(86_400)).await;
    assert_eq!(cache.get_stale(&k).await, Some(1));

    cache.set(&k, 2u32, Duration::from_secs(1)).await;
    assert_eq!(cache.get(&k).await, Some(2));
    assert_eq!(cache.get_stale(&k).await, Some(2));
}

#[tokio::test(start_paused = true)]
async fn keys_are_independent() {
    let cache = TtlCache::new(PayloadKind::Dashboard, 10);
    let a = key("AAPL:100.00");
    let b = key("MSFT:100.00");
    cache.set(&a, 1u32, Duration::from_secs(10)).await;
    cache.set(&b, 2u32, Duration::from_secs(100)).await;

    tokio::time::advance(Duration::from_secs(50)).await;
    assert!(cache.get(&a).await.is_none());
    assert_eq!(cache.get(&b).await, Some(2));
    assert_eq!(cache.len(), 2);
}

#[tokio::test]
async fn reports_its_kind() {
    let cache: TtlCache<u32> = TtlCache::new(PayloadKind::ArticleList, 10);
    assert_eq!(cache.kind(), PayloadKind::ArticleList);
}

#[tokio::test]
async fn capacity_bound_evicts_oldest_and_keeps_newest() {
    let cache = TtlCache::new(PayloadKind::Signals, 10);
    for i in 0..50u32 {
        let k = key(&format!("T{i}:100.00"));
        cache.set(&k, i, Duration::from_secs(60)).await;
        assert_eq!(cache.get(&k).await, Some(i), "entry {i} readable after set");
    }

    assert!(cache.len() <= 10);
    assert_eq!(cache.get_stale(&key("T49:100.00")).await, Some(49));
    assert!(cache.get_stale(&key("T0:100.00")).await.is_none());
}
