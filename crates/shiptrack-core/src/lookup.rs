//! Tracking-number lookup over the cached record set.
//!
//! `search` serves from the cache while it is valid and otherwise performs a
//! full fetch first. A failed fetch leaves the previous cache contents in
//! place; callers can still read them through `search_cached`.

use std::cmp::Reverse;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::api::RemoteStore;
use crate::cache::Cache;
use crate::clock::{Clock, SystemClock};
use crate::error::TrackError;
use crate::models::ShipmentRecord;
use crate::refresh::{Refresh, RefreshGuard, RefreshOutcome};

pub struct Lookup<S> {
    store: Arc<S>,
    cache: RwLock<Cache>,
    clock: Arc<dyn Clock>,
    guard: RefreshGuard,
}

impl<S: RemoteStore + 'static> Lookup<S> {
    pub fn new(store: Arc<S>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            cache: RwLock::new(Cache::new(ttl, clock.clone())),
            clock,
            guard: RefreshGuard::new(),
        }
    }

    pub fn with_system_clock(store: Arc<S>, ttl: Duration) -> Self {
        Self::new(store, ttl, Arc::new(SystemClock))
    }

    /// Tracking ids match after trimming and uppercasing.
    pub fn normalize_id(tracking_id: &str) -> String {
        tracking_id.trim().to_uppercase()
    }

    /// All records for a tracking id, most recent `last_update` first.
    ///
    /// An empty result is a normal outcome. Fetch failures are returned as
    /// `TrackError::Fetch` and leave the cache untouched.
    pub async fn search(&self, tracking_id: &str) -> Result<Vec<ShipmentRecord>, TrackError> {
        let wanted = Self::normalize_id(tracking_id);

        let valid = self.cache.read().await.is_valid();
        if !valid {
            debug!("Cache invalid, fetching before search");
            self.load().await?;
        }

        let cache = self.cache.read().await;
        let results = matching(cache.records(), &wanted);
        debug!(tracking_id = %wanted, matches = results.len(), "Search complete");
        Ok(results)
    }

    /// Search whatever the cache currently holds, valid or not, without
    /// touching the store.
    pub async fn search_cached(&self, tracking_id: &str) -> Vec<ShipmentRecord> {
        let wanted = Self::normalize_id(tracking_id);
        matching(self.cache.read().await.records(), &wanted)
    }

    /// Drop the cache and fetch everything again. While another refresh is
    /// running this is skipped.
    pub async fn force_refresh(&self) -> Result<RefreshOutcome, TrackError> {
        let Some(_permit) = self.guard.try_acquire() else {
            return Ok(RefreshOutcome::Skipped);
        };
        info!("Forced refresh of shipment cache");
        self.cache.write().await.clear();
        let count = self.load().await?;
        Ok(RefreshOutcome::Refreshed(count))
    }

    /// Warm the cache if it is not currently valid.
    pub async fn prefetch(&self) -> Result<RefreshOutcome, TrackError> {
        if self.cache.read().await.is_valid() {
            return Ok(RefreshOutcome::Skipped);
        }
        self.refresh().await
    }

    /// Replace the cache with records fetched elsewhere (e.g. an admin reload).
    pub async fn prime(&self, records: Vec<ShipmentRecord>) {
        self.cache.write().await.set(records);
    }

    pub async fn is_cache_valid(&self) -> bool {
        self.cache.read().await.is_valid()
    }

    pub async fn cached_len(&self) -> usize {
        self.cache.read().await.len()
    }

    pub async fn cache_status(&self) -> String {
        self.cache.read().await.status_line()
    }

    /// Full fetch into the cache. The lock is not held across the request,
    /// so concurrent callers may each fetch; the last `set` wins.
    async fn load(&self) -> Result<usize, TrackError> {
        let rows = self.store.fetch_rows().await.map_err(TrackError::Fetch)?;
        let records = ShipmentRecord::from_rows(&rows, self.clock.now());
        let count = records.len();

        self.cache.write().await.set(records);
        debug!(records = count, "Shipment cache loaded");
        Ok(count)
    }
}

#[async_trait]
impl<S: RemoteStore + 'static> Refresh for Lookup<S> {
    fn name(&self) -> &'static str {
        "lookup"
    }

    /// Fetch and replace the cache without clearing it first, so a failed
    /// scheduled refresh keeps serving the last good data.
    async fn refresh(&self) -> Result<RefreshOutcome, TrackError> {
        let Some(_permit) = self.guard.try_acquire() else {
            return Ok(RefreshOutcome::Skipped);
        };
        let count = self.load().await?;
        Ok(RefreshOutcome::Refreshed(count))
    }
}

/// Exact matches, newest first. The sort is stable so equal timestamps keep
/// store order.
fn matching(records: &[ShipmentRecord], normalized_id: &str) -> Vec<ShipmentRecord> {
    let mut results: Vec<ShipmentRecord> = records
        .iter()
        .filter(|r| r.matches(normalized_id))
        .cloned()
        .collect();
    results.sort_by_key(|r| Reverse(r.last_update_millis()));
    results
}
