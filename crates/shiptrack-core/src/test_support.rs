//! Test doubles shared by the unit tests: an advanceable clock and an
//! in-memory remote store with switchable failures.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};

use crate::api::{ApiError, RemoteStore};
use crate::clock::Clock;
use crate::models::{SheetRow, ShipmentRecord};

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 6, 12, 0, 0).unwrap()
}

pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self { now: Mutex::new(t0()) }
    }
}

impl ManualClock {
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

pub fn record(tracking_id: &str, status: &str, last_update: &str, row_index: usize) -> ShipmentRecord {
    ShipmentRecord {
        tracking_id: tracking_id.to_string(),
        from_zip: "10001".to_string(),
        to_zip: "90210".to_string(),
        status: status.to_string(),
        days: Some(3),
        eta: String::new(),
        last_update: last_update.to_string(),
        row_index,
    }
}

/// Array-shaped store row.
pub fn row(tracking_id: &str, status: &str, last_update: &str) -> Value {
    json!([tracking_id, "10001", "90210", status, "3", "", last_update])
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Fetch,
    Append(Vec<SheetRow>),
    Update(usize, SheetRow),
    Delete(usize),
}

#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Value>>,
    calls: Mutex<Vec<StoreCall>>,
    fetches: AtomicUsize,
    fetch_delay_ms: AtomicUsize,
    pub fail_fetch: AtomicBool,
    pub reject_patch: AtomicBool,
    pub reject_post: AtomicBool,
    pub reject_delete: AtomicBool,
    /// Apply PATCH, then fail as if the response was lost in transit.
    pub drop_patch_response: AtomicBool,
}

impl MemoryStore {
    pub fn with_rows(rows: Vec<Value>) -> Self {
        let store = Self::default();
        *store.rows.lock().unwrap() = rows;
        store
    }

    pub fn set_rows(&self, rows: Vec<Value>) {
        *self.rows.lock().unwrap() = rows;
    }

    pub fn rows(&self) -> Vec<Value> {
        self.rows.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn set_fetch_delay_ms(&self, ms: usize) {
        self.fetch_delay_ms.store(ms, Ordering::SeqCst);
    }

    fn record_call(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn rejected(verb: &str) -> ApiError {
        ApiError::InvalidResponse(format!("Status 405 Method Not Allowed: {} rejected", verb))
    }

    fn transport_failure() -> ApiError {
        let err = reqwest::Client::new()
            .get("not a url")
            .build()
            .expect_err("invalid url should fail");
        ApiError::NetworkError(err)
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn fetch_rows(&self) -> Result<Vec<Value>, ApiError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.record_call(StoreCall::Fetch);

        let delay = self.fetch_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay as u64)).await;
        }

        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(ApiError::ServerError("store unavailable".to_string()));
        }
        Ok(self.rows())
    }

    async fn append_rows(&self, rows: &[SheetRow]) -> Result<(), ApiError> {
        self.record_call(StoreCall::Append(rows.to_vec()));
        if self.reject_post.load(Ordering::SeqCst) {
            return Err(Self::rejected("POST"));
        }
        let mut stored = self.rows.lock().unwrap();
        stored.extend(rows.iter().map(|r| json!(r)));
        Ok(())
    }

    async fn update_row(&self, row_index: usize, row: &SheetRow) -> Result<(), ApiError> {
        self.record_call(StoreCall::Update(row_index, row.clone()));
        if self.reject_patch.load(Ordering::SeqCst) {
            return Err(Self::rejected("PATCH"));
        }
        let mut stored = self.rows.lock().unwrap();
        match row_index.checked_sub(1).and_then(|i| stored.get_mut(i)) {
            Some(slot) => {
                *slot = json!(row);
                if self.drop_patch_response.load(Ordering::SeqCst) {
                    return Err(Self::transport_failure());
                }
                Ok(())
            }
            None => Err(ApiError::NotFound(format!("row {}", row_index))),
        }
    }

    async fn delete_row(&self, row_index: usize) -> Result<(), ApiError> {
        self.record_call(StoreCall::Delete(row_index));
        if self.reject_delete.load(Ordering::SeqCst) {
            return Err(Self::rejected("DELETE"));
        }
        let mut stored = self.rows.lock().unwrap();
        if row_index == 0 || row_index > stored.len() {
            return Err(ApiError::NotFound(format!("row {}", row_index)));
        }
        stored.remove(row_index - 1);
        Ok(())
    }
}
