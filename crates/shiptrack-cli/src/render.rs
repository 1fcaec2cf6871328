//! Plain-text rendering of lookup results and the admin table.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use shiptrack_core::models::format_timestamp;
use shiptrack_core::utils::{format_date, plural, status_display, truncate_string};
use shiptrack_core::{
    delivery_estimate, timeline, DeliveryEstimate, RefreshEvent, ShipmentRecord, StageState,
    StatusCatalog,
};

/// Width of the progress bar in characters
const PROGRESS_BAR_WIDTH: usize = 32;

const TRACKING_COLUMN_WIDTH: usize = 16;
const STATUS_COLUMN_WIDTH: usize = 20;

pub fn progress_bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("[{}{}] {:>3.0}%", "#".repeat(filled), "-".repeat(width - filled), percent)
}

pub fn not_found(tracking_id: &str) -> String {
    format!(
        "Tracking number not found: {}\nPlease check the tracking number and try again.",
        tracking_id.trim().to_uppercase()
    )
}

/// Details of the most recent record, with the total match count.
pub fn shipment_details(shipment: &ShipmentRecord, total: usize, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let meta = StatusCatalog::metadata_for(&shipment.status);

    let _ = writeln!(out, "Package {}", shipment.tracking_id);
    let _ = writeln!(out, "  Status:      {}", meta.label);
    let _ = writeln!(out, "  From:        {}", or_na(&shipment.from_zip));
    let _ = writeln!(out, "  To:          {}", or_na(&shipment.to_zip));
    let _ = writeln!(
        out,
        "  Transit:     {}",
        shipment.days.map(|d| plural(i64::from(d), "day")).unwrap_or_else(|| "N/A".to_string())
    );
    let _ = writeln!(out, "  Last update: {}", format_date(&shipment.last_update));
    let _ = writeln!(out, "  {}", progress_bar(shipment.progress_percent(), PROGRESS_BAR_WIDTH));
    let _ = writeln!(out);

    let _ = match delivery_estimate(shipment, now) {
        DeliveryEstimate::Delivered => writeln!(out, "Delivered - successfully delivered to recipient"),
        DeliveryEstimate::WithinHours => writeln!(out, "Out for delivery - expected within the next few hours"),
        DeliveryEstimate::Expected { eta, transit_days } => writeln!(
            out,
            "Estimated delivery: {} ({} estimated transit time)",
            format_date(&format_timestamp(eta)),
            plural(i64::from(transit_days), "day")
        ),
        DeliveryEstimate::Unknown { transit_days } => writeln!(
            out,
            "Estimated delivery: Not available ({} estimated transit time)",
            plural(i64::from(transit_days), "day")
        ),
    };
    let _ = writeln!(out);

    for stage in timeline(&shipment.status) {
        let marker = match stage.state {
            StageState::Completed => "[x]",
            StageState::Current => "[>]",
            StageState::Pending => "[ ]",
        };
        let _ = writeln!(out, "  {} {}", marker, stage.info.label);
    }

    if total > 1 {
        let _ = writeln!(out);
        let _ = writeln!(out, "Found {} tracking records. Showing the most recent update.", total);
    }
    out
}

pub fn admin_table(shipments: &[ShipmentRecord]) -> String {
    if shipments.is_empty() {
        return "No shipments found.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4}  {:<tw$}  {:<7}  {:<7}  {:<sw$}  {}",
        "ROW", "TRACKING", "FROM", "TO", "STATUS", "ETA",
        tw = TRACKING_COLUMN_WIDTH,
        sw = STATUS_COLUMN_WIDTH,
    );
    for s in shipments {
        let eta = s
            .eta_at()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "Not set".to_string());
        let _ = writeln!(
            out,
            "{:>4}  {:<tw$}  {:<7}  {:<7}  {:<sw$}  {}",
            s.row_index,
            truncate_string(&s.tracking_id, TRACKING_COLUMN_WIDTH),
            truncate_string(&s.from_zip, 7),
            truncate_string(&s.to_zip, 7),
            truncate_string(&status_display(&s.status), STATUS_COLUMN_WIDTH),
            eta,
            tw = TRACKING_COLUMN_WIDTH,
            sw = STATUS_COLUMN_WIDTH,
        );
    }
    out
}

pub fn event_line(event: &RefreshEvent, at: DateTime<Utc>) -> String {
    let time = at.format("%H:%M:%S");
    match event {
        RefreshEvent::Refreshed { target, records } => {
            format!("{} [{}] refreshed {}", time, target, plural(*records as i64, "shipment"))
        }
        RefreshEvent::Skipped { target } => {
            format!("{} [{}] refresh already in progress, skipped", time, target)
        }
        RefreshEvent::Failed { target, error } => {
            format!("{} [{}] refresh failed: {}", time, target, error)
        }
    }
}

fn or_na(value: &str) -> &str {
    if value.is_empty() {
        "N/A"
    } else {
        value
    }
}
