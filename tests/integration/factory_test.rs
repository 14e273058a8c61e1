// tests/integration/factory_test.rs

//! Integration tests for the lookup path of `CachingContentFactory`
//! Tests: hits, negative caching, error propagation, removal, flush, buffers

use super::test_helpers::{Fixture, MemoryAuthority, TestContext, body};
use bytes::Bytes;
use contentcache::Content;
use contentcache::config::CacheConfig;
use contentcache::core::ContentCacheError;
use contentcache::core::cache::BufferMode;
use contentcache::core::content::ContentDescriptor;

// ===== Hits and misses =====

#[tokio::test]
async fn test_second_lookup_is_served_from_cache() {
    let ctx = TestContext::new();
    ctx.authority.insert("/a.txt", Fixture::Body(Bytes::from_static(b"hello")));

    let first = ctx.get("/a.txt").await.expect("content should resolve");
    let second = ctx.get("/a.txt").await.expect("content should resolve");

    assert!(first.is_cached());
    assert!(second.is_cached());
    assert_eq!(ctx.authority.calls("/a.txt"), 1);
    assert_eq!(second.buffer(), Some(Bytes::from_static(b"hello")));

    let stats = ctx.factory.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 1);
}

#[tokio::test]
async fn test_cached_metadata_matches_authority() {
    let ctx = TestContext::new();
    ctx.authority.insert_body("/meta.txt", 42);

    let content = ctx.get("/meta.txt").await.unwrap();

    assert_eq!(content.mime_type(), Some("text/plain"));
    assert_eq!(content.character_encoding(), Some("utf-8"));
    assert_eq!(
        content.content_type_value().as_deref(),
        Some("text/plain;charset=utf-8")
    );
    assert_eq!(content.content_length_value(), 42);
    assert_eq!(content.content_length(), Some("42"));
    assert_eq!(content.etag_value(), Some("\"9\""));
    assert_eq!(
        content.resource().map(|r| r.path().to_path_buf()),
        Some("/meta.txt".into())
    );
}

#[tokio::test]
async fn test_hit_refreshes_access_stamp() {
    let ctx = TestContext::new();
    ctx.authority.insert_body("/a", 10);

    ctx.get("/a").await.unwrap();
    let entry = ctx.factory.store().get("/a").unwrap();
    entry.set_last_accessed_nanos(0);

    ctx.get("/a").await.unwrap();
    assert!(entry.last_accessed_nanos() > 0);
}

// ===== Negative caching =====

#[tokio::test]
async fn test_absent_path_is_cached_as_negative_entry() {
    let ctx = TestContext::new();

    assert!(ctx.get("/missing").await.is_none());
    assert!(ctx.get("/missing").await.is_none());

    assert_eq!(ctx.authority.calls("/missing"), 1);
    assert!(ctx.factory.store().contains("/missing"));
    assert_eq!(ctx.factory.cached_files(), 1);
    assert_eq!(ctx.factory.cached_size(), 0);
    assert_eq!(ctx.factory.stats().negative_hits, 1);
}

#[tokio::test]
async fn test_negative_entry_survives_until_removed() {
    let ctx = TestContext::new();

    assert!(ctx.get("/late").await.is_none());
    ctx.authority.insert_body("/late", 8);
    assert!(ctx.get("/late").await.is_none(), "negative entry still cached");

    assert!(ctx.factory.remove("/late"));
    let content = ctx.get("/late").await.expect("content now resolves");
    assert_eq!(content.content_length_value(), 8);
    assert_eq!(ctx.authority.calls("/late"), 2);
}

// ===== Errors =====

#[tokio::test]
async fn test_authority_error_is_propagated_and_not_cached() {
    let ctx = TestContext::new();
    ctx.authority.insert("/broken", Fixture::Failing);

    let err = ctx.factory.get_content("/broken").await.unwrap_err();
    assert!(matches!(err, ContentCacheError::Io(_)));
    assert!(err.is_resolution_failure());
    assert!(!ctx.factory.store().contains("/broken"));

    ctx.factory.get_content("/broken").await.unwrap_err();
    assert_eq!(ctx.authority.calls("/broken"), 2);
    assert_eq!(ctx.factory.cached_files(), 0);
    assert_eq!(ctx.factory.stats().evictions, 0);
}

#[tokio::test]
async fn test_inconsistent_content_fails_without_side_effects() {
    let ctx = TestContext::new();
    ctx.authority.insert(
        "/short",
        Fixture::Inconsistent {
            declared: 100,
            body: body(10),
        },
    );

    let err = ctx.factory.get_content("/short").await.unwrap_err();
    match &err {
        ContentCacheError::InvalidContent { path, .. } => assert_eq!(path, "/short"),
        other => panic!("Expected InvalidContent, got {other:?}"),
    }
    assert!(err.is_resolution_failure());
    assert!(!ctx.factory.store().contains("/short"));
    assert_eq!(ctx.factory.cached_size(), 0);
    assert_eq!(ctx.factory.cached_files(), 0);
}

// ===== Removal and flush =====

#[tokio::test]
async fn test_remove_subtracts_length() {
    let ctx = TestContext::new();
    ctx.authority.insert_body("/a", 100);
    ctx.authority.insert_body("/b", 50);
    ctx.get("/a").await.unwrap();
    ctx.get("/b").await.unwrap();
    assert_eq!(ctx.factory.cached_size(), 150);

    assert!(ctx.factory.store().remove("/a"));
    assert!(!ctx.factory.store().remove("/a"));
    assert_eq!(ctx.factory.cached_size(), 50);
    assert_eq!(ctx.factory.cached_files(), 1);
}

#[tokio::test]
async fn test_flush_is_idempotent() {
    let ctx = TestContext::new();
    for (i, path) in ["/a", "/b", "/c"].iter().enumerate() {
        ctx.authority.insert_body(path, 10 * (i + 1));
        ctx.get(path).await.unwrap();
    }
    ctx.get("/nothing").await;
    assert_eq!(ctx.factory.cached_files(), 4);
    assert_eq!(ctx.factory.cached_size(), 60);

    ctx.factory.flush_cache();
    assert_eq!(ctx.factory.cached_files(), 0);
    assert_eq!(ctx.factory.cached_size(), 0);

    ctx.factory.flush_cache();
    assert_eq!(ctx.factory.cached_files(), 0);
    assert_eq!(ctx.factory.cached_size(), 0);
}

#[tokio::test]
async fn test_flush_keeps_limits() {
    let ctx = TestContext::with_limits(64, 512, 8);
    ctx.authority.insert_body("/a", 10);
    ctx.get("/a").await.unwrap();

    ctx.factory.flush_cache();

    assert_eq!(ctx.factory.max_cached_file_size(), 64);
    assert_eq!(ctx.factory.max_cache_size(), 512);
    assert_eq!(ctx.factory.max_cached_files(), 8);
}

// ===== Buffers =====

#[tokio::test]
async fn test_shared_buffers_alias_one_allocation() {
    let ctx = TestContext::new();
    ctx.authority.insert_body("/shared", 64);

    let content = ctx.get("/shared").await.unwrap();
    let a = content.buffer().unwrap();
    let b = content.buffer().unwrap();

    assert_eq!(a, b);
    assert_eq!(a.as_ptr(), b.as_ptr());
}

#[tokio::test]
async fn test_copy_mode_returns_fresh_buffers() {
    let config = CacheConfig {
        buffer_mode: BufferMode::Copy,
        ..CacheConfig::default()
    };
    let ctx = TestContext::with_authority(MemoryAuthority::new(), config);
    ctx.authority.insert_body("/copied", 64);

    let content = ctx.get("/copied").await.unwrap();
    let a = content.buffer().unwrap();
    let b = content.buffer().unwrap();

    assert_eq!(a, b);
    assert_ne!(a.as_ptr(), b.as_ptr());
}

#[tokio::test]
async fn test_handles_keep_full_body_after_removal() {
    let ctx = TestContext::new();
    ctx.authority
        .insert("/page", Fixture::Body(Bytes::from_static(b"<html></html>")));

    let content = ctx.get("/page").await.unwrap();
    let view = content.buffer().unwrap();

    assert!(ctx.factory.remove("/page"));

    assert_eq!(&view[..], b"<html></html>");
    assert_eq!(content.content_length_value(), 13);
    assert_eq!(content.buffer(), Some(Bytes::from_static(b"<html></html>")));
}

#[tokio::test]
async fn test_handles_keep_full_body_after_eviction() {
    let ctx = TestContext::new();
    ctx.authority.insert_body("/a.txt", 11);

    let content = ctx.get("/a.txt").await.unwrap();
    assert!(content.is_cached());

    ctx.factory.set_max_cached_files(0).unwrap();

    assert!(!ctx.factory.store().contains("/a.txt"));
    assert_eq!(content.content_length_value(), 11);
    assert_eq!(content.buffer().map(|b| b.len()), Some(11));
}

#[tokio::test]
async fn test_release_reports_completion_once() {
    let ctx = TestContext::new();
    ctx.authority.insert_body("/r", 5);
    ctx.get("/r").await.unwrap();

    let entry = ctx.factory.store().get("/r").unwrap();
    assert!(entry.release());
    assert!(!entry.release());
    assert_eq!(entry.buffer().map(|b| b.len()), Some(5));
}

#[tokio::test]
async fn test_removal_releases_the_entry() {
    let ctx = TestContext::new();
    ctx.authority.insert_body("/gone", 7);
    ctx.get("/gone").await.unwrap();
    let entry = ctx.factory.store().get("/gone").unwrap();

    assert!(ctx.factory.remove("/gone"));

    assert!(!entry.release(), "the store already released it");
    assert_eq!(entry.buffer().map(|b| b.len()), Some(7));
}

#[tokio::test]
async fn test_release_through_cached_handle_is_noop() {
    let ctx = TestContext::new();
    ctx.authority.insert_body("/h", 5);

    let content = ctx.get("/h").await.unwrap();
    assert!(matches!(content, Content::Cached(_)));
    assert!(!content.release());
    assert_eq!(content.buffer().map(|b| b.len()), Some(5));
}

// ===== Metrics =====

#[tokio::test]
async fn test_metrics_are_exported() {
    let ctx = TestContext::new();
    ctx.authority.insert_body("/m", 3);
    ctx.get("/m").await.unwrap();
    ctx.get("/m").await.unwrap();

    let text = contentcache::core::metrics::gather_metrics();

    assert!(text.contains("contentcache_hits_total"));
    assert!(text.contains("contentcache_misses_total"));
    assert!(text.contains("contentcache_resolve_latency_seconds"));
}
