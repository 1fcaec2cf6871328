use thiserror::Error;

use crate::api::ApiError;

/// Remote write verbs, reported with `TrackError::RemoteWrite`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for WriteOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteOp::Create => write!(f, "create"),
            WriteOp::Update => write!(f, "update"),
            WriteOp::Delete => write!(f, "delete"),
        }
    }
}

#[derive(Error, Debug)]
pub enum TrackError {
    #[error("Failed to fetch shipments: {0}")]
    Fetch(#[source] ApiError),

    #[error("Failed to {op} shipment: {source}")]
    RemoteWrite {
        op: WriteOp,
        #[source]
        source: ApiError,
    },

    #[error("No shipment at row {0}")]
    RowNotFound(usize),

    #[error("Invalid shipment: {0}")]
    Validation(String),
}

impl TrackError {
    pub fn write(op: WriteOp, source: ApiError) -> Self {
        TrackError::RemoteWrite { op, source }
    }

    /// True for failures of the remote store itself (read or write).
    pub fn is_remote(&self) -> bool {
        matches!(self, TrackError::Fetch(_) | TrackError::RemoteWrite { .. })
    }
}
