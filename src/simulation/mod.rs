//! Standalone traffic simulation module
//!
//! Vehicles drive along one-way roads, queue at signalized intersections and
//! cross when their approach is green. [`SimWorld`] drives the whole network
//! one tick at a time.

mod error;
mod intersection;
mod policy;
mod road_network;
mod stats;
mod types;
mod vehicle;
mod world;

pub use error::{SimError, SimResult};
pub use intersection::{Intersection, SignalFlags};
pub use policy::{AlwaysGreen, FixedCycle, SignalControl, SignalPolicy};
pub use road_network::{RoadEdge, RoadNetwork};
pub use stats::WaitTimeStats;
pub use types::{
    Approach, IntersectionId, Location, Phase, QueueRef, VehicleId, DEFAULT_CROSSING_DURATION,
    REFERENCE_ROAD_LENGTH,
};
pub use vehicle::{TouchedSet, Vehicle};
pub use world::{RunOutcome, SimWorld};
