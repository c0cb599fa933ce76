//! In-memory caching decorator.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::CatalogError;
use crate::model::CatalogSnapshot;
use crate::source::CatalogSource;

/// Serves the last fetched snapshot until it is `ttl` old.
///
/// The freshness check and the delegate fetch run under one lock, so
/// concurrent callers inside a staleness window cause at most one delegate
/// fetch. A failed refresh leaves the previous snapshot in place.
pub struct MemoryCache<S> {
    inner: S,
    ttl: Duration,
    snapshot: Mutex<Option<Arc<CatalogSnapshot>>>,
}

impl<S: CatalogSource> MemoryCache<S> {
    /// Wrap `inner`. A zero `ttl` refetches on every call.
    pub fn new(ttl: Duration, inner: S) -> Self {
        Self {
            inner,
            ttl,
            snapshot: Mutex::new(None),
        }
    }

    /// The snapshot currently held, fresh or not.
    pub async fn cached(&self) -> Option<Arc<CatalogSnapshot>> {
        self.snapshot.lock().await.clone()
    }
}

#[async_trait]
impl<S: CatalogSource> CatalogSource for MemoryCache<S> {
    async fn fetch(&self) -> Result<Arc<CatalogSnapshot>, CatalogError> {
        let mut cached = self.snapshot.lock().await;

        if let Some(snapshot) = cached.as_ref() {
            if snapshot.is_fresh(self.ttl) {
                debug!(fetched_at = %snapshot.fetched_at, "Memory cache hit");
                return Ok(Arc::clone(snapshot));
            }
        }

        debug!("Memory cache miss, fetching from wrapped source");
        let fresh = self.inner.fetch().await?;
        *cached = Some(Arc::clone(&fresh));

        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use tokio::task::JoinSet;

    use super::*;
    use crate::model::{CatalogTier, RepoRecord};

    /// Counts fetches and optionally fails them.
    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
        fail: AtomicBool,
        delay: Duration,
    }

    impl CountingSource {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CatalogSource for CountingSource {
        async fn fetch(&self) -> Result<Arc<CatalogSnapshot>, CatalogError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(CatalogError::Status(503));
            }
            Ok(Arc::new(CatalogSnapshot::new(vec![RepoRecord::new(
                format!("nginx-{call}"),
                CatalogTier::Application,
            )])))
        }
    }

    #[tokio::test]
    async fn test_cache_hit_within_duration() {
        let source = Arc::new(CountingSource::default());
        let cache = MemoryCache::new(Duration::from_secs(3600), Arc::clone(&source));

        let first = cache.fetch().await.unwrap();
        assert_eq!(source.calls(), 1);

        let second = cache.fetch().await.unwrap();
        assert_eq!(source.calls(), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_cache_miss_after_duration() {
        let source = Arc::new(CountingSource::default());
        let cache = MemoryCache::new(Duration::from_millis(20), Arc::clone(&source));

        cache.fetch().await.unwrap();
        assert_eq!(source.calls(), 1);

        tokio::time::sleep(Duration::from_millis(40)).await;

        let refreshed = cache.fetch().await.unwrap();
        assert_eq!(source.calls(), 2);
        assert_eq!(refreshed.records[0].name, "nginx-2");
    }

    #[tokio::test]
    async fn test_zero_duration_disables_caching() {
        let source = Arc::new(CountingSource::default());
        let cache = MemoryCache::new(Duration::ZERO, Arc::clone(&source));

        for _ in 0..3 {
            cache.fetch().await.unwrap();
        }
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_fetches_share_one_delegate_call() {
        let source = Arc::new(CountingSource {
            delay: Duration::from_millis(50),
            ..Default::default()
        });
        let cache = Arc::new(MemoryCache::new(
            Duration::from_secs(3600),
            Arc::clone(&source),
        ));

        let mut tasks = JoinSet::new();
        for _ in 0..16 {
            let cache = Arc::clone(&cache);
            tasks.spawn(async move { cache.fetch().await });
        }

        while let Some(result) = tasks.join_next().await {
            let snapshot = result.unwrap().unwrap();
            assert_eq!(snapshot.records[0].name, "nginx-1");
        }
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_propagates_errors_from_wrapped_source() {
        let source = Arc::new(CountingSource::default());
        source.fail.store(true, Ordering::SeqCst);
        let cache = MemoryCache::new(Duration::from_secs(3600), Arc::clone(&source));

        let err = cache.fetch().await.unwrap_err();
        assert!(err.is_transport());
        assert!(cache.cached().await.is_none());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_stale_snapshot() {
        let source = Arc::new(CountingSource::default());
        let cache = MemoryCache::new(Duration::from_millis(10), Arc::clone(&source));

        let original = cache.fetch().await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        source.fail.store(true, Ordering::SeqCst);
        assert!(cache.fetch().await.is_err());
        assert_eq!(source.calls(), 2);

        let held = cache.cached().await.unwrap();
        assert_eq!(held, original);
    }
}
