// tests/integration/concurrency_test.rs

//! Integration tests for concurrent lookups
//! Tests: single construction per key, convergent accounting, bounds under load

use super::test_helpers::{MemoryAuthority, TestContext};
use contentcache::Content;
use contentcache::config::CacheConfig;
use contentcache::core::cache::BufferMode;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

fn delayed_context(config: CacheConfig) -> Arc<TestContext> {
    let authority = MemoryAuthority::new().with_delay(Duration::from_millis(20));
    Arc::new(TestContext::with_authority(authority, config))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_misses_insert_one_entry() {
    let ctx = delayed_context(CacheConfig::default());
    ctx.authority.insert_body("/hot", 256);

    let mut tasks = JoinSet::new();
    for _ in 0..32 {
        let ctx = ctx.clone();
        tasks.spawn(async move { ctx.get("/hot").await });
    }
    let mut results = Vec::new();
    while let Some(res) = tasks.join_next().await {
        results.push(res.unwrap().expect("content should resolve"));
    }

    assert_eq!(ctx.factory.cached_files(), 1);
    assert_eq!(ctx.factory.cached_size(), 256);

    let stored = ctx.factory.store().get("/hot").unwrap();
    for content in &results {
        match content {
            Content::Cached(entry) => assert!(Arc::ptr_eq(entry, &stored)),
            Content::Uncached(_) => panic!("admissible content must be served from the cache"),
        }
    }
    assert!(ctx.authority.calls("/hot") >= 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_negative_lookups_insert_one_entry() {
    let ctx = delayed_context(CacheConfig::default());

    let mut tasks = JoinSet::new();
    for _ in 0..16 {
        let ctx = ctx.clone();
        tasks.spawn(async move { ctx.get("/nowhere").await.is_none() });
    }
    while let Some(res) = tasks.join_next().await {
        assert!(res.unwrap());
    }

    assert_eq!(ctx.factory.cached_files(), 1);
    assert_eq!(ctx.factory.cached_size(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_accounting_converges_under_contention() {
    let config = CacheConfig {
        max_cached_file_size: 1_000,
        max_cache_size: 4_000,
        max_cached_files: 12,
        buffer_mode: BufferMode::Shared,
    };
    let ctx = Arc::new(TestContext::with_config(config));
    let paths: Vec<String> = (0..40).map(|i| format!("/file-{i}")).collect();
    for (i, path) in paths.iter().enumerate() {
        if i % 7 != 0 {
            ctx.authority.insert_body(path, 50 + (i * 37) % 900);
        }
    }

    let mut tasks = JoinSet::new();
    for worker in 0..16usize {
        let ctx = ctx.clone();
        let paths = paths.clone();
        tasks.spawn(async move {
            for round in 0..50usize {
                let path = &paths[(worker * 13 + round * 7) % paths.len()];
                ctx.factory.get_content(path).await.unwrap();
                if round % 17 == 0 {
                    ctx.factory.store().remove(path);
                }
            }
        });
    }
    while let Some(res) = tasks.join_next().await {
        res.unwrap();
    }

    let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
    assert_eq!(ctx.factory.cached_size(), ctx.sum_of_cached_lengths(&refs));
    assert!(ctx.factory.cached_files() <= 12);
    assert!(ctx.factory.cached_size() <= 4_000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_flush_during_lookups_leaves_consistent_counter() {
    let ctx = Arc::new(TestContext::with_limits(1_000, 100_000, 1_000));
    let paths: Vec<String> = (0..20).map(|i| format!("/f{i}")).collect();
    for path in &paths {
        ctx.authority.insert_body(path, 64);
    }

    let mut tasks = JoinSet::new();
    for worker in 0..4usize {
        let ctx = ctx.clone();
        let paths = paths.clone();
        tasks.spawn(async move {
            for round in 0..100usize {
                ctx.get(&paths[(worker + round) % paths.len()]).await;
                if worker == 0 && round % 25 == 0 {
                    ctx.factory.flush_cache();
                }
            }
        });
    }
    while let Some(res) = tasks.join_next().await {
        res.unwrap();
    }

    let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
    assert_eq!(ctx.factory.cached_size(), ctx.sum_of_cached_lengths(&refs));
    assert_eq!(ctx.factory.cached_size(), 64 * ctx.factory.cached_files() as u64);
}
