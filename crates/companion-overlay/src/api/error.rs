use thiserror::Error;

use super::types::ControlId;

/// Failures reported by a host window implementation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HostError {
    #[error("host window is not available")]
    Unavailable,
    #[error("control {0:?} no longer exists")]
    UnknownControl(ControlId),
    #[error("control {id:?} does not support {op}")]
    Unsupported { id: ControlId, op: &'static str },
    #[error("host operation failed: {0}")]
    Failed(String),
}

/// Overlay-level failure taxonomy. Every variant is recovered locally and
/// degrades to "no interaction this tick".
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OverlayError {
    /// The host tree could not be queried; treated as "no controls found".
    #[error("host window unavailable")]
    HostUnavailable,
    /// A handle from an older rebuild no longer refers to a live control.
    #[error("stale control handle {0:?}")]
    StaleHandle(ControlId),
    /// No frame has been rendered yet, so anchors have no projection.
    #[error("no frame has been projected yet")]
    ProjectionUnavailable,
    /// A sequence is already running for this actor.
    #[error("an interaction sequence is already active")]
    SequenceBusy,
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<HostError> for OverlayError {
    fn from(err: HostError) -> Self {
        match err {
            HostError::UnknownControl(id) => OverlayError::StaleHandle(id),
            _ => OverlayError::HostUnavailable,
        }
    }
}

/// Rejected configuration values.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(String),
    #[error("{field} must be {expected}, got {value}")]
    OutOfRange {
        field: &'static str,
        expected: &'static str,
        value: f64,
    },
}
