//! Aggregation Result Cache
//!
//! Holds the latest aggregation result for one resource type together with
//! the time it was produced. Reads inside the freshness window return the
//! stored value; anything else runs a new aggregation and swaps the whole
//! value in once it has completed.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};

use super::clock::Clock;

/// Default freshness window: 10 minutes
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(600);

/// Stored result of one aggregation pass
struct CacheEntry<T> {
    data: Option<Arc<Vec<T>>>,
    /// When the aggregation that produced `data` began
    started_at: Option<DateTime<Utc>>,
    last_updated: Option<DateTime<Utc>>,
}

/// Cache age and counters, as reported by the health endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub populated: bool,
    pub last_updated: Option<DateTime<Utc>>,
    pub age_seconds: Option<i64>,
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Single-value cache with a fixed freshness window
///
/// Only one refresh runs at a time. Callers that queued behind a refresh
/// which finished after they arrived get that result instead of starting
/// another aggregation.
pub struct ResourceCache<T> {
    /// Resource name for logs
    name: &'static str,
    /// How long a stored value is served without recomputing
    freshness: chrono::Duration,
    clock: Arc<dyn Clock>,
    entry: RwLock<CacheEntry<T>>,
    /// Held for the duration of a refresh
    refresh: Mutex<()>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<T> ResourceCache<T> {
    pub fn new(name: &'static str, freshness: Duration, clock: Arc<dyn Clock>) -> Self {
        let freshness =
            chrono::Duration::from_std(freshness).unwrap_or_else(|_| chrono::Duration::days(36_500));

        Self {
            name,
            freshness,
            clock,
            entry: RwLock::new(CacheEntry {
                data: None,
                started_at: None,
                last_updated: None,
            }),
            refresh: Mutex::new(()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the cached value, or aggregate a new one
    ///
    /// # Arguments
    /// * `force_refresh` - Skip the freshness check
    /// * `aggregate` - Produces a full replacement value
    ///
    /// A failed aggregation leaves the stored value untouched. A caller that
    /// waited on another refresh reuses its result when that refresh finished
    /// after the caller arrived; a forced caller only when it also started
    /// after the caller arrived.
    pub async fn get<F, Fut, E>(&self, force_refresh: bool, aggregate: F) -> Result<Arc<Vec<T>>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
        E: std::fmt::Display,
    {
        let requested_at = self.clock.now();

        if !force_refresh {
            if let Some(data) = self.fresh_data(requested_at) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                trace!(resource = self.name, "Cache HIT");
                return Ok(data);
            }
        }

        let _guard = self.refresh.lock().await;

        // A refresh that completed while we waited is at least as new as what
        // this caller asked for.
        if let Some(data) = self.refreshed_since(requested_at, force_refresh) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(resource = self.name, "Reusing refresh that completed while waiting");
            return Ok(data);
        }
        if !force_refresh {
            if let Some(data) = self.fresh_data(self.clock.now()) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(data);
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        info!(resource = self.name, forced = force_refresh, "Cache MISS, refreshing");

        let started_at = self.clock.now();
        let data = match aggregate().await {
            Ok(data) => Arc::new(data),
            Err(e) => {
                warn!(resource = self.name, error = %e, "Refresh failed, cache left unchanged");
                return Err(e);
            }
        };

        let now = self.clock.now();
        {
            let mut entry = self.entry.write().unwrap_or_else(|p| p.into_inner());
            entry.data = Some(Arc::clone(&data));
            entry.started_at = Some(started_at);
            entry.last_updated = Some(now);
        }

        info!(resource = self.name, entries = data.len(), "Cache refreshed");
        Ok(data)
    }

    fn fresh_data(&self, now: DateTime<Utc>) -> Option<Arc<Vec<T>>> {
        let entry = self.entry.read().unwrap_or_else(|p| p.into_inner());
        match (&entry.data, entry.last_updated) {
            (Some(data), Some(at)) if now.signed_duration_since(at) < self.freshness => {
                Some(Arc::clone(data))
            }
            _ => None,
        }
    }

    fn refreshed_since(&self, since: DateTime<Utc>, whole_pass: bool) -> Option<Arc<Vec<T>>> {
        let entry = self.entry.read().unwrap_or_else(|p| p.into_inner());
        let at = if whole_pass {
            entry.started_at
        } else {
            entry.last_updated
        };
        match (&entry.data, at) {
            (Some(data), Some(at)) if at >= since => Some(Arc::clone(data)),
            _ => None,
        }
    }

    /// Get cache age and statistics
    pub fn status(&self) -> CacheStatus {
        let entry = self.entry.read().unwrap_or_else(|p| p.into_inner());
        let now = self.clock.now();
        CacheStatus {
            populated: entry.data.is_some(),
            last_updated: entry.last_updated,
            age_seconds: entry
                .last_updated
                .map(|at| now.signed_duration_since(at).num_seconds()),
            entries: entry.data.as_ref().map_or(0, |d| d.len()),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
