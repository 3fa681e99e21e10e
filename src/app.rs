//! Application state shared by request handlers

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::cache::{Clock, ResourceCache};
use crate::content::ContentService;
use crate::error::ProxyError;
use crate::models::{ArticleSummary, GalleryRecord};

/// Aggregation service plus one cache per cached resource
pub struct AppState {
    pub content: ContentService,
    pub galleries: ResourceCache<GalleryRecord>,
    pub news: ResourceCache<ArticleSummary>,
    pub clock: Arc<dyn Clock>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(content: ContentService, freshness: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            content,
            galleries: ResourceCache::new("galleries", freshness, Arc::clone(&clock)),
            news: ResourceCache::new("news", freshness, Arc::clone(&clock)),
            started_at: clock.now(),
            clock,
        }
    }

    /// Galleries from cache, aggregating when stale or forced
    pub async fn cached_galleries(&self, force_refresh: bool) -> Result<Arc<Vec<GalleryRecord>>, ProxyError> {
        self.galleries
            .get(force_refresh, || self.content.list_galleries())
            .await
    }

    /// News listing from cache, aggregating when stale or forced
    pub async fn cached_articles(&self, force_refresh: bool) -> Result<Arc<Vec<ArticleSummary>>, ProxyError> {
        self.news
            .get(force_refresh, || self.content.list_articles())
            .await
    }
}
