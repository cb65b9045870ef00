//! Errors raised by the simulation engine and its construction API

use super::types::{IntersectionId, QueueRef};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    /// A vehicle finished crossing but there is no road to its next hop
    #[error("malformed network: no road from {from} to {to}")]
    MalformedNetwork {
        from: IntersectionId,
        to: IntersectionId,
    },

    /// Statistics were requested over an empty vehicle set
    #[error("cannot compute statistics over zero vehicles")]
    EmptyFleet,

    #[error("intersection {0} not found")]
    UnknownIntersection(IntersectionId),

    #[error("road from {from} to {to} already exists")]
    DuplicateRoad {
        from: IntersectionId,
        to: IntersectionId,
    },

    #[error("vehicle path must contain at least one intersection")]
    EmptyPath,

    #[error("destination queue {queue:?} does not belong to first path entry {expected}")]
    DestinationMismatch {
        queue: QueueRef,
        expected: IntersectionId,
    },

    #[error("time delta must be finite and non-negative, got {0}")]
    InvalidDelta(f32),

    #[error("length must be finite and non-negative, got {0}")]
    InvalidLength(f32),
}

pub type SimResult<T> = std::result::Result<T, SimError>;
