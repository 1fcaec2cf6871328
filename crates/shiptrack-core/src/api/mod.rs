//! Client module for the spreadsheet-backed shipment store.
//!
//! The store is a hosted CRUD endpoint addressed by `tabId`. Reads return
//! every row of the tab; writes append, patch, or delete rows addressed by
//! their 1-based `rowIndex`.
//!
//! `RemoteStore` is the seam the lookup and admin layers are generic over;
//! `SheetClient` is the HTTP implementation.

pub mod client;
pub mod error;

pub use client::{extract_rows, RemoteStore, SheetClient};
pub use error::ApiError;
