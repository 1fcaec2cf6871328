use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::utils::parse_timestamp;

use super::status::{ShipmentStatus, StatusCatalog};

/// Number of cells in a store row.
pub const ROW_WIDTH: usize = 7;

/// One store row in fixed column order:
/// `[tracking_id, from_zip, to_zip, status, days, eta, last_update]`.
pub type SheetRow = [String; ROW_WIDTH];

// Alternate key spellings accepted for object-shaped rows, in priority order.
const TRACKING_ID_KEYS: &[&str] = &["tracking_id", "trackingId", "id"];
const FROM_ZIP_KEYS: &[&str] = &["from_zip", "fromZip"];
const TO_ZIP_KEYS: &[&str] = &["to_zip", "toZip"];
const STATUS_KEYS: &[&str] = &["status"];
const DAYS_KEYS: &[&str] = &["days"];
const ETA_KEYS: &[&str] = &["eta"];
const LAST_UPDATE_KEYS: &[&str] = &["last_update", "lastUpdate"];

/// A normalized tracking row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ShipmentRecord {
    pub tracking_id: String,
    pub from_zip: String,
    pub to_zip: String,
    /// Raw status id; may fall outside the catalog.
    pub status: String,
    pub days: Option<u32>,
    /// ISO-8601 timestamp or empty.
    pub eta: String,
    /// ISO-8601 timestamp as stored.
    pub last_update: String,
    /// 1-based position in the store at fetch time. Unstable across inserts
    /// and deletes.
    pub row_index: usize,
}

impl ShipmentRecord {
    /// Normalize one raw store row.
    ///
    /// Accepts positional (array) rows and named (object) rows. Missing cells
    /// become empty, a missing `last_update` becomes `now`. Returns `None` for
    /// rows of any other shape and for rows without a tracking id.
    pub fn from_row(row: &Value, row_index: usize, now: DateTime<Utc>) -> Option<Self> {
        let cells: [String; ROW_WIDTH] = match row {
            Value::Array(values) => {
                std::array::from_fn(|i| values.get(i).map(cell_text).unwrap_or_default())
            }
            Value::Object(map) => [
                named_cell(map, TRACKING_ID_KEYS),
                named_cell(map, FROM_ZIP_KEYS),
                named_cell(map, TO_ZIP_KEYS),
                named_cell(map, STATUS_KEYS),
                named_cell(map, DAYS_KEYS),
                named_cell(map, ETA_KEYS),
                named_cell(map, LAST_UPDATE_KEYS),
            ],
            _ => return None,
        };

        let [tracking_id, from_zip, to_zip, status, days, eta, last_update] = cells;

        let tracking_id = tracking_id.trim().to_string();
        if tracking_id.is_empty() {
            return None;
        }

        let last_update = if last_update.is_empty() {
            format_timestamp(now)
        } else {
            last_update
        };

        Some(Self {
            tracking_id,
            from_zip,
            to_zip,
            status,
            days: parse_days(&days),
            eta,
            last_update,
            row_index,
        })
    }

    /// Normalize a full fetch. Row indexes follow raw store positions, so
    /// skipped rows leave gaps rather than shifting later rows.
    pub fn from_rows(rows: &[Value], now: DateTime<Utc>) -> Vec<Self> {
        let records: Vec<Self> = rows
            .iter()
            .enumerate()
            .filter_map(|(i, row)| Self::from_row(row, i + 1, now))
            .collect();

        let skipped = rows.len() - records.len();
        if skipped > 0 {
            debug!(skipped, total = rows.len(), "Skipped unusable rows");
        }
        records
    }

    /// Serialize back into the store's column order.
    pub fn to_row(&self) -> SheetRow {
        [
            self.tracking_id.clone(),
            self.from_zip.clone(),
            self.to_zip.clone(),
            self.status.clone(),
            self.days.map(|d| d.to_string()).unwrap_or_default(),
            self.eta.clone(),
            self.last_update.clone(),
        ]
    }

    /// Case-insensitive exact match against an already-normalized id.
    pub fn matches(&self, normalized_id: &str) -> bool {
        self.tracking_id.to_uppercase() == normalized_id
    }

    pub fn status(&self) -> Option<ShipmentStatus> {
        ShipmentStatus::parse(&self.status)
    }

    pub fn status_index(&self) -> i32 {
        StatusCatalog::index_of(&self.status)
    }

    pub fn progress_percent(&self) -> f64 {
        StatusCatalog::progress_percent(self.status_index())
    }

    pub fn eta_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.eta)
    }

    pub fn last_update_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.last_update)
    }

    /// Sort key for recency; missing or unparseable timestamps sort as the epoch.
    pub fn last_update_millis(&self) -> i64 {
        self.last_update_at()
            .map(|t| t.timestamp_millis())
            .unwrap_or(0)
    }
}

/// Format a timestamp the way rows are written back to the store.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Render a JSON cell as text. Null and `false` read as empty.
fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "true".to_string(),
        Value::Null | Value::Bool(false) => String::new(),
        Value::Array(_) | Value::Object(_) => String::new(),
    }
}

/// First non-empty value among the accepted key spellings.
fn named_cell(map: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .map(cell_text)
        .find(|text| !text.is_empty())
        .unwrap_or_default()
}

fn parse_days(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    trimmed.parse::<u32>().ok().or_else(|| {
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|d| *d >= 0.0 && d.fract() == 0.0 && *d <= u32::MAX as f64)
            .map(|d| d as u32)
    })
}
