//! Data models for shipment tracking.
//!
//! - `ShipmentRecord`: one normalized store row, plus the row parsing rules
//! - `ShipmentStatus`, `StatusCatalog`, `StatusInfo`: the fixed status
//!   progression and its display metadata

pub mod shipment;
pub mod status;

pub use shipment::{format_timestamp, SheetRow, ShipmentRecord, ROW_WIDTH};
pub use status::{ShipmentStatus, StatusCatalog, StatusInfo};
