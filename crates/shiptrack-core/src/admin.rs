//! Administrative create/update/delete against the remote store.
//!
//! Rows are addressed by their 1-based `row_index` from the latest listing.
//! That index is positional: any insert or delete in the store shifts it, so
//! it is only meaningful until the next mutation. Every successful mutation
//! is followed by a full reload; nothing is patched locally. A failed reload
//! does not fail the write that preceded it.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::api::RemoteStore;
use crate::clock::{Clock, SystemClock};
use crate::error::{TrackError, WriteOp};
use crate::lookup::Lookup;
use crate::models::{format_timestamp, SheetRow, ShipmentRecord};
use crate::progress::eta_after;
use crate::refresh::{Refresh, RefreshGuard, RefreshOutcome};

/// Transit days assumed when none are given.
pub const DEFAULT_TRANSIT_DAYS: u32 = 3;

/// Fields for a new shipment. `days` and `eta` are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewShipment {
    pub tracking_id: String,
    pub from_zip: String,
    pub to_zip: String,
    pub status: String,
    pub days: Option<u32>,
    pub eta: Option<String>,
}

/// Partial edit of an existing row. `None` (or an empty eta) keeps the
/// current value. The tracking id cannot be changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShipmentUpdate {
    pub from_zip: Option<String>,
    pub to_zip: Option<String>,
    pub status: Option<String>,
    pub days: Option<u32>,
    pub eta: Option<String>,
}

/// Which write the repository issued for an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePath {
    /// The targeted PATCH was accepted.
    Patched,
    /// PATCH was rejected and the merged row was appended instead.
    AppendedFallback,
}

pub struct AdminRepository<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    shipments: RwLock<Vec<ShipmentRecord>>,
    lookup: Option<Arc<Lookup<S>>>,
    guard: RefreshGuard,
}

impl<S: RemoteStore + 'static> AdminRepository<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            shipments: RwLock::new(Vec::new()),
            lookup: None,
            guard: RefreshGuard::new(),
        }
    }

    pub fn with_system_clock(store: Arc<S>) -> Self {
        Self::new(store, Arc::new(SystemClock))
    }

    /// Prime `lookup`'s cache with every reload this repository performs.
    pub fn with_lookup(mut self, lookup: Arc<Lookup<S>>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// Fetch every row. Record `row_index` values are store positions.
    pub async fn list(&self) -> Result<Vec<ShipmentRecord>, TrackError> {
        let rows = self.store.fetch_rows().await.map_err(TrackError::Fetch)?;
        let records = ShipmentRecord::from_rows(&rows, self.clock.now());
        debug!(records = records.len(), "Admin listing loaded");

        *self.shipments.write().await = records.clone();
        if let Some(lookup) = &self.lookup {
            lookup.prime(records.clone()).await;
        }
        Ok(records)
    }

    /// Records from the most recent `list`.
    pub async fn shipments(&self) -> Vec<ShipmentRecord> {
        self.shipments.read().await.clone()
    }

    /// Append a shipment. Missing `days` defaults to 3 and a missing `eta` is
    /// now + days. Returns the row as written.
    pub async fn create(&self, shipment: NewShipment) -> Result<SheetRow, TrackError> {
        let tracking_id = required("tracking id", &shipment.tracking_id)?;
        let from_zip = required("origin zip", &shipment.from_zip)?;
        let to_zip = required("destination zip", &shipment.to_zip)?;
        let status = required("status", &shipment.status)?;

        let now = self.clock.now();
        let days = shipment.days.unwrap_or(DEFAULT_TRANSIT_DAYS);
        let eta = match shipment.eta.as_deref().map(str::trim) {
            Some(eta) if !eta.is_empty() => eta.to_string(),
            _ => eta_after(now, days).map(format_timestamp).ok_or_else(|| {
                TrackError::Validation(format!("{} transit days is out of range", days))
            })?,
        };

        let row: SheetRow = [
            tracking_id,
            from_zip,
            to_zip,
            status,
            days.to_string(),
            eta,
            format_timestamp(now),
        ];

        self.store
            .append_rows(std::slice::from_ref(&row))
            .await
            .map_err(|e| TrackError::write(WriteOp::Create, e))?;
        info!(tracking_id = %row[0], "Shipment created");

        self.reload_after_write(WriteOp::Create).await;
        Ok(row)
    }

    /// Apply a partial edit to the row at `row_index`.
    ///
    /// Tries a targeted PATCH first; if the store answers with an error status,
    /// the merged row is appended instead. A transport failure is returned as
    /// is, since the PATCH may have landed. Which write the store actually
    /// honored is not verified.
    pub async fn update(
        &self,
        row_index: usize,
        changes: ShipmentUpdate,
    ) -> Result<UpdatePath, TrackError> {
        let current = self.find_row(row_index).await?;
        let merged = self.merge(&current, changes)?;

        let path = match self.store.update_row(row_index, &merged).await {
            Ok(()) => UpdatePath::Patched,
            Err(e) if e.is_rejection() => {
                warn!(row_index, error = %e, "PATCH rejected, falling back to append");
                self.store
                    .append_rows(std::slice::from_ref(&merged))
                    .await
                    .map_err(|e| TrackError::write(WriteOp::Update, e))?;
                UpdatePath::AppendedFallback
            }
            Err(e) => return Err(TrackError::write(WriteOp::Update, e)),
        };
        info!(row_index, tracking_id = %merged[0], ?path, "Shipment updated");

        self.reload_after_write(WriteOp::Update).await;
        Ok(path)
    }

    /// Remove the row at `row_index`.
    pub async fn delete(&self, row_index: usize) -> Result<(), TrackError> {
        self.store
            .delete_row(row_index)
            .await
            .map_err(|e| TrackError::write(WriteOp::Delete, e))?;
        info!(row_index, "Shipment deleted");

        self.reload_after_write(WriteOp::Delete).await;
        Ok(())
    }

    /// The listing stays stale until the next successful `list`.
    async fn reload_after_write(&self, op: WriteOp) {
        if let Err(e) = self.list().await {
            warn!(%op, error = %e, "Write applied but reload failed");
        }
    }

    /// Row from the last listing, reloading once if it is not there.
    async fn find_row(&self, row_index: usize) -> Result<ShipmentRecord, TrackError> {
        if let Some(found) = self.lookup_row(row_index).await {
            return Ok(found);
        }
        self.list().await?;
        self.lookup_row(row_index)
            .await
            .ok_or(TrackError::RowNotFound(row_index))
    }

    async fn lookup_row(&self, row_index: usize) -> Option<ShipmentRecord> {
        self.shipments
            .read()
            .await
            .iter()
            .find(|s| s.row_index == row_index)
            .cloned()
    }

    fn merge(&self, current: &ShipmentRecord, changes: ShipmentUpdate) -> Result<SheetRow, TrackError> {
        let from_zip = match changes.from_zip {
            Some(zip) => required("origin zip", &zip)?,
            None => current.from_zip.clone(),
        };
        let to_zip = match changes.to_zip {
            Some(zip) => required("destination zip", &zip)?,
            None => current.to_zip.clone(),
        };
        let status = match changes.status {
            Some(status) => required("status", &status)?,
            None => current.status.clone(),
        };
        let days = changes
            .days
            .or(current.days)
            .map(|d| d.to_string())
            .unwrap_or_default();
        let eta = changes
            .eta
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| current.eta.clone());

        Ok([
            current.tracking_id.clone(),
            from_zip,
            to_zip,
            status,
            days,
            eta,
            format_timestamp(self.clock.now()),
        ])
    }
}

#[async_trait]
impl<S: RemoteStore + 'static> Refresh for AdminRepository<S> {
    fn name(&self) -> &'static str {
        "admin"
    }

    async fn refresh(&self) -> Result<RefreshOutcome, TrackError> {
        let Some(_permit) = self.guard.try_acquire() else {
            return Ok(RefreshOutcome::Skipped);
        };
        let records = self.list().await?;
        Ok(RefreshOutcome::Refreshed(records.len()))
    }
}

fn required(field: &str, value: &str) -> Result<String, TrackError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(TrackError::Validation(format!("{} is required", field)))
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    use chrono::Duration;
    use serde_json::json;

    use crate::test_support::{row, t0, ManualClock, MemoryStore, StoreCall};

    fn repo_over(rows: Vec<serde_json::Value>) -> (AdminRepository<MemoryStore>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_rows(rows));
        let clock = Arc::new(ManualClock::default());
        (AdminRepository::new(store.clone(), clock), store)
    }

    fn new_shipment() -> NewShipment {
        NewShipment {
            tracking_id: "X".to_string(),
            from_zip: "A".to_string(),
            to_zip: "B".to_string(),
            status: "INFO_RECEIVED".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_list_assigns_store_positions() {
        let (repo, _) = repo_over(vec![
            row("A1", "PICKED_UP", "2024-01-01T00:00:00Z"),
            json!(["", "", "", ""]),
            row("A3", "DELIVERED", "2024-01-02T00:00:00Z"),
        ]);

        let listed = repo.list().await.expect("list");
        let indexes: Vec<usize> = listed.iter().map(|s| s.row_index).collect();
        assert_eq!(indexes, vec![1, 3]);
        assert_eq!(repo.shipments().await, listed);
    }

    #[tokio::test]
    async fn test_create_defaults_days_and_eta() {
        let (repo, store) = repo_over(vec![]);

        let written = repo.create(new_shipment()).await.expect("create");
        assert_eq!(written[4], "3");
        assert_eq!(written[5], format_timestamp(t0() + Duration::days(3)));
        assert_eq!(written[6], format_timestamp(t0()));

        assert_eq!(store.rows(), vec![json!(written)]);
        assert_eq!(store.fetch_count(), 1);
        assert_eq!(repo.shipments().await.len(), 1);
    }

    #[tokio::test]
    async fn test_create_eta_follows_days_or_explicit_value() {
        let (repo, _) = repo_over(vec![]);

        let five_days = NewShipment {
            days: Some(5),
            ..new_shipment()
        };
        let written = repo.create(five_days).await.expect("create");
        assert_eq!(written[4], "5");
        assert_eq!(written[5], format_timestamp(t0() + Duration::days(5)));

        let explicit = NewShipment {
            eta: Some("2024-02-01T10:00".to_string()),
            ..new_shipment()
        };
        let written = repo.create(explicit).await.expect("create");
        assert_eq!(written[5], "2024-02-01T10:00");
    }

    #[tokio::test]
    async fn test_create_requires_fields() {
        let (repo, store) = repo_over(vec![]);
        let missing_status = NewShipment {
            status: "  ".to_string(),
            ..new_shipment()
        };

        let err = repo.create(missing_status).await.expect_err("should reject");
        assert!(matches!(err, TrackError::Validation(ref msg) if msg.contains("status")));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_rejected_by_store() {
        let (repo, store) = repo_over(vec![]);
        store.reject_post.store(true, Ordering::SeqCst);

        let err = repo.create(new_shipment()).await.expect_err("should fail");
        assert!(matches!(err, TrackError::RemoteWrite { op: WriteOp::Create, .. }));
        assert_eq!(store.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_update_patches_merged_row() {
        let (repo, store) = repo_over(vec![
            row("A1", "PICKED_UP", "2024-01-01T00:00:00Z"),
            row("A2", "IN_TRANSIT", "2024-01-02T00:00:00Z"),
        ]);
        repo.list().await.expect("list");

        let path = repo
            .update(2, ShipmentUpdate {
                status: Some("DELIVERED".to_string()),
                ..Default::default()
            })
            .await
            .expect("update");
        assert_eq!(path, UpdatePath::Patched);

        let updated = &repo.shipments().await[1];
        assert_eq!(updated.tracking_id, "A2");
        assert_eq!(updated.status, "DELIVERED");
        assert_eq!(updated.days, Some(3));
        assert_eq!(updated.from_zip, "10001");
        assert_eq!(updated.last_update, format_timestamp(t0()));
        assert_eq!(store.rows().len(), 2);
    }

    #[tokio::test]
    async fn test_rejected_patch_falls_back_to_append() {
        let (repo, store) = repo_over(vec![row("A1", "PICKED_UP", "2024-01-01T00:00:00Z")]);
        repo.list().await.expect("list");
        store.reject_patch.store(true, Ordering::SeqCst);

        let path = repo
            .update(1, ShipmentUpdate {
                to_zip: Some("60601".to_string()),
                ..Default::default()
            })
            .await
            .expect("fallback should succeed");
        assert_eq!(path, UpdatePath::AppendedFallback);

        let writes: Vec<StoreCall> = store
            .calls()
            .into_iter()
            .filter(|c| !matches!(c, StoreCall::Fetch))
            .collect();
        match writes.as_slice() {
            [StoreCall::Update(1, patched), StoreCall::Append(appended)] => {
                assert_eq!(appended.as_slice(), std::slice::from_ref(patched));
                assert_eq!(patched[2], "60601");
            }
            other => panic!("unexpected write sequence: {other:?}"),
        }
        assert_eq!(repo.shipments().await.len(), 2);
    }

    #[tokio::test]
    async fn test_update_fails_when_fallback_rejected() {
        let (repo, store) = repo_over(vec![row("A1", "PICKED_UP", "2024-01-01T00:00:00Z")]);
        repo.list().await.expect("list");
        store.reject_patch.store(true, Ordering::SeqCst);
        store.reject_post.store(true, Ordering::SeqCst);

        let err = repo
            .update(1, ShipmentUpdate::default())
            .await
            .expect_err("should fail");
        assert!(matches!(err, TrackError::RemoteWrite { op: WriteOp::Update, .. }));
    }

    #[tokio::test]
    async fn test_update_unknown_row() {
        let (repo, store) = repo_over(vec![row("A1", "PICKED_UP", "2024-01-01T00:00:00Z")]);

        let err = repo
            .update(7, ShipmentUpdate::default())
            .await
            .expect_err("should fail");
        assert!(matches!(err, TrackError::RowNotFound(7)));
        // one reload attempted before giving up
        assert_eq!(store.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_update_rejects_blanking_required_field() {
        let (repo, _) = repo_over(vec![row("A1", "PICKED_UP", "2024-01-01T00:00:00Z")]);
        repo.list().await.expect("list");

        let err = repo
            .update(1, ShipmentUpdate {
                from_zip: Some(String::new()),
                ..Default::default()
            })
            .await
            .expect_err("should fail");
        assert!(matches!(err, TrackError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_reloads() {
        let (repo, store) = repo_over(vec![
            row("A1", "PICKED_UP", "2024-01-01T00:00:00Z"),
            row("A2", "IN_TRANSIT", "2024-01-02T00:00:00Z"),
        ]);
        repo.list().await.expect("list");

        repo.delete(1).await.expect("delete");
        let remaining = repo.shipments().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].tracking_id, "A2");
        assert_eq!(remaining[0].row_index, 1);
        assert_eq!(store.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_delete_rejected() {
        let (repo, store) = repo_over(vec![row("A1", "PICKED_UP", "2024-01-01T00:00:00Z")]);
        store.reject_delete.store(true, Ordering::SeqCst);

        let err = repo.delete(1).await.expect_err("should fail");
        assert!(matches!(err, TrackError::RemoteWrite { op: WriteOp::Delete, .. }));
        assert_eq!(store.rows().len(), 1);
    }

    #[tokio::test]
    async fn test_mutations_prime_attached_lookup() {
        let store = Arc::new(MemoryStore::default());
        let clock = Arc::new(ManualClock::default());
        let lookup = Arc::new(Lookup::new(store.clone(), Duration::seconds(30), clock.clone()));
        let repo = AdminRepository::new(store.clone(), clock).with_lookup(lookup.clone());

        repo.create(new_shipment()).await.expect("create");
        let found = lookup.search("x").await.expect("search");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].status, "INFO_RECEIVED");
        // the post-create reload served the search
        assert_eq!(store.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_out_of_range_days() {
        let (repo, store) = repo_over(vec![]);
        let far = NewShipment {
            days: Some(200_000_000),
            ..new_shipment()
        };

        let err = repo.create(far).await.expect_err("should reject");
        assert!(matches!(err, TrackError::Validation(ref msg) if msg.contains("200000000")));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_write_succeeds_when_reload_fails() {
        let (repo, store) = repo_over(vec![row("A1", "PICKED_UP", "2024-01-01T00:00:00Z")]);
        repo.list().await.expect("list");
        store.fail_fetch.store(true, Ordering::SeqCst);

        let written = repo.create(new_shipment()).await.expect("create should report success");
        assert_eq!(written[0], "X");
        assert_eq!(store.rows().len(), 2);

        let path = repo
            .update(1, ShipmentUpdate {
                status: Some("IN_TRANSIT".to_string()),
                ..Default::default()
            })
            .await
            .expect("update should report success");
        assert_eq!(path, UpdatePath::Patched);

        repo.delete(2).await.expect("delete should report success");
        assert_eq!(store.rows().len(), 1);
        // listing is stale: still the snapshot from before the writes
        assert_eq!(repo.shipments().await.len(), 1);
        assert_eq!(repo.shipments().await[0].status, "PICKED_UP");
    }

    #[tokio::test]
    async fn test_lost_patch_response_does_not_append() {
        let (repo, store) = repo_over(vec![row("A1", "PICKED_UP", "2024-01-01T00:00:00Z")]);
        repo.list().await.expect("list");
        store.drop_patch_response.store(true, Ordering::SeqCst);

        let err = repo
            .update(1, ShipmentUpdate {
                status: Some("DELIVERED".to_string()),
                ..Default::default()
            })
            .await
            .expect_err("transport failure should surface");
        assert!(matches!(err, TrackError::RemoteWrite { op: WriteOp::Update, .. }));
        assert_eq!(store.rows().len(), 1);
        assert!(!store.calls().iter().any(|c| matches!(c, StoreCall::Append(_))));
    }
}
