use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::clock::Clock;
use crate::models::ShipmentRecord;
use crate::utils::plural;

/// Default time-to-live for a fetched record set.
pub const DEFAULT_CACHE_TTL_SECS: i64 = 30;

/// Time-bounded snapshot of the store. Never partially updated: `set`
/// replaces the whole record set.
pub struct Cache {
    records: Vec<ShipmentRecord>,
    /// `None` until the first `set`, and again after `clear`.
    fetched_at: Option<DateTime<Utc>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl Cache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Vec::new(),
            fetched_at: None,
            ttl,
            clock,
        }
    }

    pub fn with_default_ttl(clock: Arc<dyn Clock>) -> Self {
        Self::new(Duration::seconds(DEFAULT_CACHE_TTL_SECS), clock)
    }

    /// True iff the cache holds records and is younger than its TTL.
    pub fn is_valid(&self) -> bool {
        if self.records.is_empty() {
            return false;
        }
        match self.fetched_at {
            Some(at) => self.clock.now() - at < self.ttl,
            None => false,
        }
    }

    pub fn set(&mut self, records: Vec<ShipmentRecord>) {
        debug!(records = records.len(), "Cache replaced");
        self.records = records;
        self.fetched_at = Some(self.clock.now());
    }

    pub fn clear(&mut self) {
        debug!("Cache cleared");
        self.records.clear();
        self.fetched_at = None;
    }

    pub fn records(&self) -> &[ShipmentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    pub fn age(&self) -> Option<Duration> {
        self.fetched_at.map(|at| self.clock.now() - at)
    }

    /// Human-readable freshness, e.g. "Updated 12 seconds ago".
    pub fn status_line(&self) -> String {
        let Some(age) = self.age() else {
            return "No data loaded".to_string();
        };
        // Clock skew shows as "0 seconds"
        let seconds = age.num_seconds().max(0);
        if seconds < 60 {
            format!("Updated {} ago", plural(seconds, "second"))
        } else {
            format!("Updated {} ago", plural(seconds / 60, "minute"))
        }
    }
}
