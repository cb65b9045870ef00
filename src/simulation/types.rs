//! Core types for the traffic simulation
//!
//! Identifiers, approach directions and the vehicle location tag.

use std::fmt;

/// Time a vehicle needs to traverse an intersection once admitted
pub const DEFAULT_CROSSING_DURATION: f32 = 2.0;

/// Length of every road in the reference network
pub const REFERENCE_ROAD_LENGTH: f32 = 10.0;

/// A wrapper type for intersection IDs
///
/// The wrapped value is also the intersection's index in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IntersectionId(pub usize);

/// A wrapper type for vehicle IDs
///
/// The wrapped value is also the vehicle's index in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VehicleId(pub usize);

impl fmt::Display for IntersectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X{}", self.0)
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}", self.0)
    }
}

/// The compass side from which a vehicle approaches an intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Approach {
    North,
    South,
    West,
    East,
}

impl Approach {
    pub const ALL: [Approach; 4] = [
        Approach::North,
        Approach::South,
        Approach::West,
        Approach::East,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            Approach::North => 0,
            Approach::South => 1,
            Approach::West => 2,
            Approach::East => 3,
        }
    }

    /// The signal pair this approach belongs to
    pub fn phase(self) -> Phase {
        match self {
            Approach::North | Approach::South => Phase::NorthSouth,
            Approach::West | Approach::East => Phase::WestEast,
        }
    }
}

/// One of the two signal pairs of an intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    NorthSouth,
    WestEast,
}

impl Phase {
    pub fn approaches(self) -> [Approach; 2] {
        match self {
            Phase::NorthSouth => [Approach::North, Approach::South],
            Phase::WestEast => [Approach::West, Approach::East],
        }
    }
}

/// Reference to one directional queue of one intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueueRef {
    pub intersection: IntersectionId,
    pub approach: Approach,
}

impl QueueRef {
    pub fn new(intersection: IntersectionId, approach: Approach) -> Self {
        Self {
            intersection,
            approach,
        }
    }
}

/// Where a vehicle currently is
///
/// A vehicle is in exactly one of these at every tick boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// Driving along an edge, not yet part of any queue
    InTransit,
    /// Waiting in a directional queue
    Queued(QueueRef),
    /// Inside an intersection's crossing registry
    Crossing(IntersectionId),
    /// Finished its path
    Arrived,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approaches_pair_up_by_phase() {
        for approach in Approach::ALL {
            assert!(approach.phase().approaches().contains(&approach));
        }
        assert_eq!(Phase::NorthSouth.approaches(), [Approach::North, Approach::South]);
        assert_eq!(Phase::WestEast.approaches(), [Approach::West, Approach::East]);
    }

    #[test]
    fn approach_indices_are_distinct() {
        let mut seen = [false; 4];
        for approach in Approach::ALL {
            assert!(!seen[approach.index()]);
            seen[approach.index()] = true;
        }
    }
}
