use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use super::*;
use crate::backend::{BackendError, MockBackend};
use crate::scoring::NormalizationStrategy;

fn key(name: &str) -> ModelKey {
    ModelKey::new(name)
}

mod loading {
    use super::*;

    #[tokio::test]
    async fn test_ensure_loaded_caches_entry() {
        let cache = ModelCacheHandle::new(MockBackend::new());

        let first = cache.ensure_loaded(&key("minilm")).await.unwrap();
        let second = cache.ensure_loaded(&key("minilm")).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.backend().model_loads(), 1);
        assert_eq!(cache.backend().tokenizer_loads(), 1);
        assert_eq!(first.key(), &key("minilm"));
        assert_eq!(first.strategy(), NormalizationStrategy::SingleLogitSigmoid);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_load() {
        let cache =
            ModelCacheHandle::new(MockBackend::new().with_load_delay(Duration::from_millis(50)));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.ensure_loaded(&key("minilm")).await })
            })
            .collect();

        let entries: Vec<_> = join_all(tasks)
            .await
            .into_iter()
            .map(|joined| joined.unwrap().unwrap())
            .collect();

        assert_eq!(cache.backend().model_loads(), 1);
        assert!(entries.iter().all(|e| Arc::ptr_eq(e, &entries[0])));
        assert_eq!(cache.len(), 1);
        assert!(!cache.is_loading(&key("minilm")));
    }

    #[tokio::test]
    async fn test_distinct_keys_load_independently() {
        let cache = ModelCacheHandle::new(MockBackend::new());

        let (key_a, key_b) = (key("a"), key("b"));
        let (a, b) = tokio::join!(cache.ensure_loaded(&key_a), cache.ensure_loaded(&key_b));

        assert!(!Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(cache.backend().model_loads(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_failure_is_shared() {
        let cache = ModelCacheHandle::new(
            MockBackend::new()
                .failing_loads()
                .with_load_delay(Duration::from_millis(20)),
        );

        let broken = key("broken");
        let results = join_all((0..4).map(|_| cache.ensure_loaded(&broken))).await;

        assert_eq!(cache.backend().model_loads(), 1);
        for result in results {
            assert!(matches!(result, Err(CacheError::LoadFailed { .. })));
        }
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let cache = ModelCacheHandle::new(MockBackend::new().with_missing_key("gone"));

        let err = cache.ensure_loaded(&key("gone")).await.unwrap_err();
        assert!(matches!(
            err,
            CacheError::LoadFailed {
                source: BackendError::ModelNotFound { .. },
                ..
            }
        ));
        assert!(cache.is_empty());
        assert!(!cache.is_loading(&key("gone")));

        let _ = cache.ensure_loaded(&key("gone")).await;
        assert_eq!(cache.backend().model_loads(), 2);
    }

    #[tokio::test]
    async fn test_blank_key_rejected() {
        let cache = ModelCacheHandle::new(MockBackend::new());

        let err = cache.ensure_loaded(&key("  ")).await.unwrap_err();

        assert!(matches!(err, CacheError::InvalidKey { .. }));
        assert_eq!(cache.backend().model_loads(), 0);
    }

    #[tokio::test]
    async fn test_zero_width_model_is_malformed() {
        let cache = ModelCacheHandle::new(MockBackend::new().with_width(0));

        let err = cache.ensure_loaded(&key("empty")).await.unwrap_err();

        assert!(matches!(err, CacheError::MalformedMetadata { .. }));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_positive_label_is_malformed() {
        let cache = ModelCacheHandle::new(
            MockBackend::new().with_labels([(0, "irrelevant"), (5, "relevant")], 1),
        );

        let err = cache.ensure_loaded(&key("odd")).await.unwrap_err();

        assert!(matches!(err, CacheError::MalformedMetadata { .. }));
    }

    #[tokio::test]
    async fn test_multi_label_strategy_resolved_at_load() {
        let cache = ModelCacheHandle::new(
            MockBackend::new().with_labels([(0, "LABEL_NEGATIVE"), (1, "LABEL_POSITIVE")], 1),
        );

        let entry = cache.ensure_loaded(&key("nli")).await.unwrap();

        assert_eq!(
            entry.strategy(),
            NormalizationStrategy::MultiLogitSoftmax { class_index: 1 }
        );
        assert_eq!(entry.info().num_labels, 2);
    }
}

mod waiting {
    use super::*;

    #[tokio::test]
    async fn test_wait_ready_never_loads() {
        let cache = ModelCacheHandle::new(MockBackend::new());

        let err = cache.wait_ready(&key("minilm")).await.unwrap_err();

        assert!(matches!(err, CacheError::NotInitialized { .. }));
        assert_eq!(cache.backend().model_loads(), 0);
    }

    #[tokio::test]
    async fn test_wait_ready_joins_in_flight_load() {
        let cache =
            ModelCacheHandle::new(MockBackend::new().with_load_delay(Duration::from_millis(50)));

        let loader = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.ensure_loaded(&key("minilm")).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(cache.is_loading(&key("minilm")));

        let waited = cache.wait_ready(&key("minilm")).await.unwrap();
        let loaded = loader.await.unwrap().unwrap();

        assert!(Arc::ptr_eq(&waited, &loaded));
        assert_eq!(cache.backend().model_loads(), 1);
    }

    #[tokio::test]
    async fn test_load_survives_aborted_caller() {
        let cache =
            ModelCacheHandle::new(MockBackend::new().with_load_delay(Duration::from_millis(50)));

        let caller = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.ensure_loaded(&key("minilm")).await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        caller.abort();
        assert!(caller.await.unwrap_err().is_cancelled());

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(!cache.is_loading(&key("minilm")));
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&key("minilm")).is_some());

        cache.wait_ready(&key("minilm")).await.unwrap();
        assert_eq!(cache.backend().model_loads(), 1);
    }

    #[tokio::test]
    async fn test_get_only_returns_ready_entries() {
        let cache = ModelCacheHandle::new(MockBackend::new());
        assert!(cache.get(&key("minilm")).is_none());

        cache.ensure_loaded(&key("minilm")).await.unwrap();
        assert!(cache.get(&key("minilm")).is_some());
    }
}

mod eviction {
    use super::*;

    #[tokio::test]
    async fn test_evict_one() {
        let cache = ModelCacheHandle::new(MockBackend::new());
        cache.ensure_loaded(&key("a")).await.unwrap();
        cache.ensure_loaded(&key("b")).await.unwrap();

        assert_eq!(cache.evict(Some(&key("a"))), 1);
        assert_eq!(cache.evict(Some(&key("a"))), 0);

        let keys: Vec<_> = cache.list_keys().into_iter().collect();
        assert_eq!(keys, vec![key("b")]);
    }

    #[tokio::test]
    async fn test_evict_all() {
        let cache = ModelCacheHandle::new(MockBackend::new());
        for name in ["c", "a", "b"] {
            cache.ensure_loaded(&key(name)).await.unwrap();
        }

        let keys: Vec<_> = cache.list_keys().into_iter().collect();
        assert_eq!(keys, vec![key("a"), key("b"), key("c")]);

        assert_eq!(cache.evict(None), 3);
        assert!(cache.list_keys().is_empty());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_evicted_key_reloads() {
        let cache = ModelCacheHandle::new(MockBackend::new());
        let before = cache.ensure_loaded(&key("minilm")).await.unwrap();

        cache.evict(Some(&key("minilm")));
        let after = cache.ensure_loaded(&key("minilm")).await.unwrap();

        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(cache.backend().model_loads(), 2);
    }

    #[tokio::test]
    async fn test_evict_during_load_discards_result() {
        let cache =
            ModelCacheHandle::new(MockBackend::new().with_load_delay(Duration::from_millis(50)));

        let loader = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.ensure_loaded(&key("minilm")).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(cache.evict(Some(&key("minilm"))), 0);
        assert!(!cache.is_loading(&key("minilm")));

        // The in-flight caller still gets its entry.
        assert!(loader.await.unwrap().is_ok());
        assert!(cache.get(&key("minilm")).is_none());

        cache.ensure_loaded(&key("minilm")).await.unwrap();
        assert_eq!(cache.backend().model_loads(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_reload_after_evict_is_not_clobbered_by_stale_load() {
        let cache =
            ModelCacheHandle::new(MockBackend::new().with_load_delay(Duration::from_millis(40)));

        let stale = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.ensure_loaded(&key("minilm")).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        cache.evict(None);

        let fresh = cache.ensure_loaded(&key("minilm")).await.unwrap();
        let stale = stale.await.unwrap().unwrap();

        let cached = cache.get(&key("minilm")).unwrap();
        assert!(Arc::ptr_eq(&cached, &fresh));
        assert!(!Arc::ptr_eq(&cached, &stale));
    }
}
