//! Utility functions for date handling and display formatting.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{format_date, parse_timestamp, plural, status_display, truncate_string};
