//! Audio URL resolution with a time-bounded cache in front of the resolver.

use audiotube_resolver::error::Result;
use audiotube_resolver::{Resolver, VideoId};
use audiotube_store::StreamCache;
use serde::Serialize;
use std::sync::Arc;
use time::{Duration, UtcDateTime};
use tracing::instrument;

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct ResolvedStream {
    pub url: String,
    /// Whether the URL was served from the cache rather than freshly resolved.
    pub cached: bool,
}

/// Serves cached stream URLs while fresh and resolves (and caches) them
/// otherwise.
///
/// The cache is an optimisation only: failing to read or write it is logged
/// and the request carries on as if there were no cache.
#[derive(Clone)]
pub struct StreamService {
    cache: StreamCache,
    resolver: Arc<dyn Resolver>,
    freshness: Duration,
}
impl StreamService {
    pub fn new(cache: StreamCache, resolver: Arc<dyn Resolver>, freshness: Duration) -> Self {
        Self { cache, resolver, freshness }
    }

    pub async fn resolve(&self, video_id: &VideoId) -> Result<ResolvedStream> {
        self.resolve_at(video_id, UtcDateTime::now()).await
    }

    #[instrument(skip_all, fields(video_id = %video_id))]
    pub async fn resolve_at(&self, video_id: &VideoId, now: UtcDateTime) -> Result<ResolvedStream> {
        match self.cache.lookup_at(video_id, self.freshness, now).await {
            Ok(Some(url)) => {
                tracing::debug!("Stream cache hit");
                return Ok(ResolvedStream { url, cached: true });
            },
            Ok(None) => tracing::debug!("Stream cache miss"),
            Err(err) => tracing::warn!(error = ?err, "Stream cache lookup failed; resolving directly"),
        }
        let url = self.resolver.audio_url(video_id).await?;
        if let Err(err) = self.cache.store_at(video_id, &url, now).await {
            tracing::warn!(error = ?err, "Failed to cache resolved stream URL");
        }
        Ok(ResolvedStream { url, cached: false })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use audiotube_resolver::error::ErrorKind;
    use audiotube_resolver::{DateFilter, SearchResult, VideoMetadata};
    use audiotube_store::Database;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingResolver {
        calls: AtomicUsize,
        fail: bool,
    }
    #[async_trait]
    impl Resolver for CountingResolver {
        async fn search(&self, _: &str, _: Option<DateFilter>) -> Result<Vec<SearchResult>> {
            Ok(Vec::new())
        }
        async fn metadata(&self, _: &VideoId) -> Result<VideoMetadata> {
            exn::bail!(ErrorKind::Malformed)
        }
        async fn audio_url(&self, video_id: &VideoId) -> Result<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail {
                exn::bail!(ErrorKind::Failed(1));
            }
            Ok(format!("https://cdn.example/{video_id}/{call}"))
        }
    }

    async fn setup(resolver: Arc<CountingResolver>) -> (Database, StreamService) {
        let db = Database::connect_in_memory().await.unwrap();
        let service = StreamService::new(db.streams(), resolver, Duration::hours(4));
        (db, service)
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let resolver = Arc::new(CountingResolver::default());
        let (_db, service) = setup(resolver.clone()).await;
        let id = VideoId::parse("abc123").unwrap();
        let t0 = UtcDateTime::now();

        let first = service.resolve_at(&id, t0).await.unwrap();
        assert_eq!(first, ResolvedStream { url: "https://cdn.example/abc123/1".into(), cached: false });

        let second = service.resolve_at(&id, t0 + Duration::hours(1)).await.unwrap();
        assert_eq!(second, ResolvedStream { url: "https://cdn.example/abc123/1".into(), cached: true });
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stale_entry_is_re_resolved() {
        let resolver = Arc::new(CountingResolver::default());
        let (db, service) = setup(resolver.clone()).await;
        let id = VideoId::parse("abc123").unwrap();
        let t0 = UtcDateTime::now();

        service.resolve_at(&id, t0).await.unwrap();
        let later = service.resolve_at(&id, t0 + Duration::hours(5)).await.unwrap();
        assert!(!later.cached);
        assert_eq!(later.url, "https://cdn.example/abc123/2");
        assert_eq!(db.streams().get("abc123").await.unwrap().unwrap().audio_url, later.url);
    }

    #[tokio::test]
    async fn test_resolver_failure_is_not_cached() {
        let resolver = Arc::new(CountingResolver { fail: true, ..CountingResolver::default() });
        let (db, service) = setup(resolver).await;
        let id = VideoId::parse("abc123").unwrap();
        let err = service.resolve(&id).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Failed(1)));
        assert!(db.streams().get("abc123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unavailable_cache_degrades_to_resolver() {
        let resolver = Arc::new(CountingResolver::default());
        let (db, service) = setup(resolver.clone()).await;
        db.close().await;
        let id = VideoId::parse("abc123").unwrap();
        let resolved = service.resolve(&id).await.unwrap();
        assert!(!resolved.cached);
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    }
}
