//! Core library for shiptrack.
//!
//! Provides the spreadsheet-backed remote store client, shipment models and
//! status catalog, the time-bounded cache, tracking lookup, the admin
//! repository, and the periodic refresh ticker.

pub mod admin;
pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod lookup;
pub mod models;
pub mod progress;
pub mod refresh;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

pub use admin::{AdminRepository, NewShipment, ShipmentUpdate, UpdatePath};
pub use api::{ApiError, RemoteStore, SheetClient};
pub use cache::Cache;
pub use clock::{Clock, SystemClock};
pub use config::{Config, Settings};
pub use error::{TrackError, WriteOp};
pub use lookup::Lookup;
pub use models::{SheetRow, ShipmentRecord, ShipmentStatus, StatusCatalog, StatusInfo};
pub use progress::{delivery_estimate, timeline, DeliveryEstimate, Stage, StageState};
pub use refresh::{Refresh, RefreshEvent, RefreshGuard, RefreshOutcome, RefreshTicker};
