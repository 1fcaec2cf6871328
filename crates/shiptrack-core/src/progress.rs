//! Progress timeline and delivery estimate for a single shipment.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::admin::DEFAULT_TRANSIT_DAYS;
use crate::models::{ShipmentRecord, ShipmentStatus, StatusCatalog, StatusInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum StageState {
    Completed,
    Current,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Stage {
    pub info: StatusInfo,
    pub state: StageState,
}

/// Every catalog stage, marked relative to `status_id`. An unknown status
/// leaves all stages pending.
pub fn timeline(status_id: &str) -> Vec<Stage> {
    let current = StatusCatalog::index_of(status_id);
    ShipmentStatus::ALL
        .into_iter()
        .map(|status| {
            let index = status.index() as i32;
            let state = if current < 0 || index > current {
                StageState::Pending
            } else if index == current {
                StageState::Current
            } else {
                StageState::Completed
            };
            Stage {
                info: status.into(),
                state,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeliveryEstimate {
    Delivered,
    /// Out for delivery; expected within hours.
    WithinHours,
    Expected {
        eta: DateTime<Utc>,
        transit_days: u32,
    },
    /// No usable eta and the transit days run past the representable range.
    Unknown { transit_days: u32 },
}

/// `start` plus `days`, or `None` if the result is out of range.
pub fn eta_after(start: DateTime<Utc>, days: u32) -> Option<DateTime<Utc>> {
    Duration::try_days(i64::from(days)).and_then(|span| start.checked_add_signed(span))
}

/// When the shipment should arrive. Uses the stored eta when it parses,
/// otherwise `now` plus the transit days (3 if unset).
pub fn delivery_estimate(record: &ShipmentRecord, now: DateTime<Utc>) -> DeliveryEstimate {
    match record.status() {
        Some(ShipmentStatus::Delivered) => DeliveryEstimate::Delivered,
        Some(ShipmentStatus::OutForDelivery) => DeliveryEstimate::WithinHours,
        _ => {
            let transit_days = record.days.unwrap_or(DEFAULT_TRANSIT_DAYS);
            match record.eta_at().or_else(|| eta_after(now, transit_days)) {
                Some(eta) => DeliveryEstimate::Expected { eta, transit_days },
                None => DeliveryEstimate::Unknown { transit_days },
            }
        }
    }
}
