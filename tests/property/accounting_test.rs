// tests/property/accounting_test.rs

//! Property-based tests for size accounting
//! The byte counter must always equal the sum of the cached lengths, and the
//! limits must hold after every operation that runs a shrink pass.

use crate::test_helpers::TestContext;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Get(usize),
    Remove(usize),
    SetMaxFiles(i64),
    SetMaxSize(i64),
    SetMaxFileSize(i64),
    Flush,
}

fn op_strategy(paths: usize) -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (0..paths).prop_map(Op::Get),
        1 => (0..paths).prop_map(Op::Remove),
        1 => (0i64..12).prop_map(Op::SetMaxFiles),
        1 => (0i64..3000).prop_map(Op::SetMaxSize),
        1 => (0i64..1000).prop_map(Op::SetMaxFileSize),
        1 => Just(Op::Flush),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        max_shrink_iters: 500,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_counter_equals_sum_of_entries(
        lengths in prop::collection::vec(prop::option::weighted(0.85, 0usize..800), 1..=16),
        ops in prop::collection::vec(op_strategy(16), 1..=80),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ctx = TestContext::with_limits(600, 2000, 8);
            let paths: Vec<String> = (0..lengths.len()).map(|i| format!("/p{i}")).collect();
            for (path, len) in paths.iter().zip(&lengths) {
                if let Some(len) = len {
                    ctx.authority.insert_body(path, *len);
                }
            }
            let refs: Vec<&str> = paths.iter().map(String::as_str).collect();

            for op in &ops {
                match op {
                    Op::Get(i) => {
                        ctx.factory.get_content(refs[i % refs.len()]).await.unwrap();
                    }
                    Op::Remove(i) => {
                        ctx.factory.store().remove(refs[i % refs.len()]);
                    }
                    Op::SetMaxFiles(n) => ctx.factory.set_max_cached_files(*n).unwrap(),
                    Op::SetMaxSize(n) => ctx.factory.set_max_cache_size(*n).unwrap(),
                    Op::SetMaxFileSize(n) => ctx.factory.set_max_cached_file_size(*n).unwrap(),
                    Op::Flush => ctx.factory.flush_cache(),
                }

                assert_eq!(ctx.factory.cached_size(), ctx.sum_of_cached_lengths(&refs));
                assert!(ctx.factory.cached_files() <= ctx.factory.max_cached_files());
                assert!(ctx.factory.cached_size() <= ctx.factory.max_cache_size());
            }
        });
    }

    #[test]
    fn test_admission_boundary(limit in 1u64..4096, extra in 0u64..2) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ctx = TestContext::with_limits(limit, 1 << 20, 16);
            let len = limit + extra;
            ctx.authority.insert_body("/f", len as usize);

            let content = ctx.get("/f").await.unwrap();

            assert_eq!(content.is_cached(), extra == 0);
            assert_eq!(ctx.factory.store().contains("/f"), extra == 0);
        });
    }
}
