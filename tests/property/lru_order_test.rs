// tests/property/lru_order_test.rs

//! Property-based tests for eviction order
//! With distinct access stamps, lowering the file limit to k keeps exactly the
//! k most recently accessed entries.

use crate::test_helpers::TestContext;
use proptest::prelude::*;
use std::collections::HashSet;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_lowering_limit_keeps_most_recent(
        stamps in prop::collection::hash_set(1u64..1_000_000, 2..=20),
        keep_ratio in 0.0f64..1.0,
    ) {
        let stamps: Vec<u64> = stamps.into_iter().collect();
        let k = ((stamps.len() as f64) * keep_ratio) as usize;

        tokio_test::block_on(async {
            let ctx = TestContext::with_limits(1000, 1 << 20, 100);
            let paths: Vec<String> = (0..stamps.len()).map(|i| format!("/e{i}")).collect();
            for (i, path) in paths.iter().enumerate() {
                ctx.authority.insert_body(path, 1 + i % 5);
                ctx.get(path).await.unwrap();
            }
            let store = ctx.factory.store();
            for (path, stamp) in paths.iter().zip(&stamps) {
                store.get(path).unwrap().set_last_accessed_nanos(*stamp);
            }

            let mut by_recency: Vec<(u64, &String)> = stamps.iter().copied().zip(&paths).collect();
            by_recency.sort();
            let expected: HashSet<&String> =
                by_recency.iter().rev().take(k).map(|(_, p)| *p).collect();

            ctx.factory.set_max_cached_files(k as i64).unwrap();

            assert_eq!(ctx.factory.cached_files(), k);
            for path in &paths {
                assert_eq!(store.contains(path), expected.contains(path), "{path}");
            }
        });
    }
}
