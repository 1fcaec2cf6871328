use serde::{Deserialize, Serialize};

/// Lifecycle stages a shipment passes through, in delivery order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    InfoReceived,
    PickedUp,
    LocalArrivalScan,
    LocalProcessed,
    LocalDepartScan,
    InTransit,
    OutForDelivery,
    Delivered,
}

impl ShipmentStatus {
    /// Every status in progression order.
    pub const ALL: [ShipmentStatus; 8] = [
        ShipmentStatus::InfoReceived,
        ShipmentStatus::PickedUp,
        ShipmentStatus::LocalArrivalScan,
        ShipmentStatus::LocalProcessed,
        ShipmentStatus::LocalDepartScan,
        ShipmentStatus::InTransit,
        ShipmentStatus::OutForDelivery,
        ShipmentStatus::Delivered,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            ShipmentStatus::InfoReceived => "INFO_RECEIVED",
            ShipmentStatus::PickedUp => "PICKED_UP",
            ShipmentStatus::LocalArrivalScan => "LOCAL_ARRIVAL_SCAN",
            ShipmentStatus::LocalProcessed => "LOCAL_PROCESSED",
            ShipmentStatus::LocalDepartScan => "LOCAL_DEPART_SCAN",
            ShipmentStatus::InTransit => "IN_TRANSIT",
            ShipmentStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            ShipmentStatus::Delivered => "DELIVERED",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ShipmentStatus::InfoReceived => "Info Received",
            ShipmentStatus::PickedUp => "Picked Up",
            ShipmentStatus::LocalArrivalScan => "Arrival Scan",
            ShipmentStatus::LocalProcessed => "Processed",
            ShipmentStatus::LocalDepartScan => "Depart Scan",
            ShipmentStatus::InTransit => "In Transit",
            ShipmentStatus::OutForDelivery => "Out for Delivery",
            ShipmentStatus::Delivered => "Delivered",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ShipmentStatus::InfoReceived => "fas fa-info-circle",
            ShipmentStatus::PickedUp => "fas fa-box",
            ShipmentStatus::LocalArrivalScan => "fas fa-truck-loading",
            ShipmentStatus::LocalProcessed => "fas fa-cogs",
            ShipmentStatus::LocalDepartScan => "fas fa-truck-moving",
            ShipmentStatus::InTransit => "fas fa-plane",
            ShipmentStatus::OutForDelivery => "fas fa-shipping-fast",
            ShipmentStatus::Delivered => "fas fa-check-circle",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            ShipmentStatus::InfoReceived => "#6c757d",
            ShipmentStatus::PickedUp => "#17a2b8",
            ShipmentStatus::LocalArrivalScan => "#007bff",
            ShipmentStatus::LocalProcessed => "#6610f2",
            ShipmentStatus::LocalDepartScan => "#fd7e14",
            ShipmentStatus::InTransit => "#20c997",
            ShipmentStatus::OutForDelivery => "#ffc107",
            ShipmentStatus::Delivered => "#28a745",
        }
    }

    /// Badge style used by the admin table.
    pub fn badge_class(&self) -> &'static str {
        match self {
            ShipmentStatus::InfoReceived => "bg-secondary",
            ShipmentStatus::PickedUp => "bg-info",
            ShipmentStatus::LocalArrivalScan
            | ShipmentStatus::LocalProcessed
            | ShipmentStatus::LocalDepartScan => "bg-primary",
            ShipmentStatus::InTransit => "bg-warning",
            ShipmentStatus::OutForDelivery => "bg-warning text-dark",
            ShipmentStatus::Delivered => "bg-success",
        }
    }

    /// Position in the progression (0-based).
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Resolve a status id. Case-insensitive; spaces count as underscores.
    pub fn parse(status_id: &str) -> Option<Self> {
        let normalized = StatusCatalog::normalize_id(status_id);
        Self::ALL.into_iter().find(|s| s.id() == normalized)
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Display metadata for a status id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct StatusInfo {
    pub id: String,
    pub label: String,
    pub icon: String,
    pub color: String,
    pub badge_class: String,
}

impl From<ShipmentStatus> for StatusInfo {
    fn from(status: ShipmentStatus) -> Self {
        Self {
            id: status.id().to_string(),
            label: status.label().to_string(),
            icon: status.icon().to_string(),
            color: status.color().to_string(),
            badge_class: status.badge_class().to_string(),
        }
    }
}

const UNKNOWN_ICON: &str = "fas fa-question-circle";
const UNKNOWN_COLOR: &str = "#6c757d";
const UNKNOWN_BADGE: &str = "bg-secondary";

/// Lookup table over the fixed status progression.
pub struct StatusCatalog;

impl StatusCatalog {
    /// Number of stages in the progression.
    pub const LEN: usize = ShipmentStatus::ALL.len();

    pub fn normalize_id(status_id: &str) -> String {
        status_id.trim().to_uppercase().replace(' ', "_")
    }

    /// Progression index of a status id, or -1 when the id is not in the catalog.
    pub fn index_of(status_id: &str) -> i32 {
        ShipmentStatus::parse(status_id)
            .map(|s| s.index() as i32)
            .unwrap_or(-1)
    }

    /// Display metadata for a status id. Unknown ids get a neutral entry
    /// labelled from the id itself.
    pub fn metadata_for(status_id: &str) -> StatusInfo {
        match ShipmentStatus::parse(status_id) {
            Some(status) => status.into(),
            None => StatusInfo {
                id: status_id.to_string(),
                label: status_id.replace('_', " "),
                icon: UNKNOWN_ICON.to_string(),
                color: UNKNOWN_COLOR.to_string(),
                badge_class: UNKNOWN_BADGE.to_string(),
            },
        }
    }

    /// Completion percentage for a progression index. Negative (unknown) is 0%.
    pub fn progress_percent(index: i32) -> f64 {
        if index < 0 {
            return 0.0;
        }
        let clamped = (index as usize).min(Self::LEN - 1);
        (clamped + 1) as f64 / Self::LEN as f64 * 100.0
    }

    pub fn entries() -> impl Iterator<Item = StatusInfo> {
        ShipmentStatus::ALL.into_iter().map(StatusInfo::from)
    }
}
