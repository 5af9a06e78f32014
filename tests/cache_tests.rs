use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use podsearch::cache::{CacheStats, ResultCache, cache_key};

#[tokio::test(start_paused = true)]
async fn test_get_returns_inserted_value() {
    let cache: ResultCache<String> = ResultCache::new(Duration::from_secs(3600));
    cache.set("basic_rust_5", "value".to_string());

    assert_eq!(cache.get("basic_rust_5").as_deref(), Some("value"));
    assert_eq!(cache.get("basic_go_5"), None);
}

#[tokio::test(start_paused = true)]
async fn test_overwrite_replaces_value_and_expiry() {
    let cache: ResultCache<u32> = ResultCache::new(Duration::from_secs(10));
    cache.set_with_ttl("k", 1, Duration::from_secs(1));
    cache.set("k", 2);

    tokio::time::advance(Duration::from_secs(5)).await;
    assert_eq!(cache.get("k"), Some(2));
}

#[tokio::test(start_paused = true)]
async fn test_entry_with_one_second_ttl_expires() {
    let cache: ResultCache<u32> = ResultCache::default();
    cache.set_with_ttl("short", 7, Duration::from_secs(1));
    assert_eq!(cache.get("short"), Some(7));

    tokio::time::advance(Duration::from_millis(1001)).await;

    // no sweep has run; the read itself must treat it as a miss
    assert_eq!(cache.get("short"), None);
    assert!(cache.is_empty(), "expired entry is dropped on read");
}

#[tokio::test(start_paused = true)]
async fn test_default_ttl_applies() {
    let cache: ResultCache<u32> = ResultCache::new(Duration::from_secs(60));
    cache.set("k", 1);

    tokio::time::advance(Duration::from_secs(59)).await;
    assert_eq!(cache.get("k"), Some(1));

    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(cache.get("k"), None);
}

#[tokio::test(start_paused = true)]
async fn test_purge_expired_removes_only_expired() {
    let cache: ResultCache<u32> = ResultCache::new(Duration::from_secs(3600));
    cache.set_with_ttl("a", 1, Duration::from_secs(1));
    cache.set_with_ttl("b", 2, Duration::from_secs(1));
    cache.set("c", 3);

    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(cache.len(), 3);
    assert_eq!(cache.purge_expired(), 2);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("c"), Some(3));
}

#[tokio::test(start_paused = true)]
async fn test_sweeper_purges_in_background_and_stops_on_shutdown() {
    let cache: Arc<ResultCache<u32>> = Arc::new(ResultCache::new(Duration::from_secs(3600)));
    let shutdown = CancellationToken::new();
    let sweeper = cache.spawn_sweeper(Duration::from_secs(10), shutdown.clone());

    cache.set_with_ttl("a", 1, Duration::from_secs(1));
    cache.set("b", 2);

    // paused clock auto-advances past the first sweep tick
    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(cache.len(), 1);

    shutdown.cancel();
    sweeper.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_stats_count_hits_and_misses() {
    let cache: ResultCache<u32> = ResultCache::default();
    cache.set("k", 1);
    cache.get("k");
    cache.get("k");
    cache.get("missing");

    assert_eq!(
        cache.stats(),
        CacheStats {
            keys: 1,
            hits: 2,
            misses: 1
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_stats_reporter_stops_on_shutdown() {
    let cache: Arc<ResultCache<u32>> = Arc::new(ResultCache::default());
    let shutdown = CancellationToken::new();
    let reporter = cache.spawn_stats_reporter(Duration::from_secs(300), shutdown.clone());

    cache.set("k", 1);
    tokio::time::sleep(Duration::from_secs(301)).await;

    shutdown.cancel();
    reporter.await.unwrap();
}

#[test]
fn test_cache_key_distinguishes_mode_query_and_count() {
    assert_ne!(cache_key("basic", "q", 5), cache_key("intelligent", "q", 5));
    assert_ne!(cache_key("basic", "q", 5), cache_key("basic", "q2", 5));
    assert_ne!(cache_key("basic", "q", 5), cache_key("basic", "q", 6));
}
