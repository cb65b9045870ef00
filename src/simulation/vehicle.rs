//! Vehicle state and per-vehicle movement rules
//!
//! Vehicles move at unit speed, so distance and time share one unit.

use std::collections::{HashSet, VecDeque};

use log::debug;

use super::error::{SimError, SimResult};
use super::road_network::RoadNetwork;
use super::types::{IntersectionId, Location, QueueRef, VehicleId, DEFAULT_CROSSING_DURATION};

/// A vehicle in the traffic simulation
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: VehicleId,
    /// Time elapsed since the vehicle was created, frozen once it arrives
    pub wait_time: f32,
    /// Intersections still to visit, front is the next one
    pub path: VecDeque<IntersectionId>,
    pub previous_intersection: Option<IntersectionId>,
    pub distance_to_intersection: f32,
    pub crossing_duration: f32,
    /// The queue this vehicle joins at the end of its current road
    pub destination_queue: QueueRef,
    pub arrived: bool,
    pub location: Location,
}

impl Vehicle {
    pub fn new(
        id: VehicleId,
        distance_to_intersection: f32,
        destination_queue: QueueRef,
        path: Vec<IntersectionId>,
    ) -> Self {
        Self {
            id,
            wait_time: 0.0,
            path: path.into(),
            previous_intersection: None,
            distance_to_intersection,
            crossing_duration: DEFAULT_CROSSING_DURATION,
            destination_queue,
            arrived: false,
            location: Location::InTransit,
        }
    }

    pub fn with_crossing_duration(mut self, crossing_duration: f32) -> Self {
        self.crossing_duration = crossing_duration;
        self
    }

    pub fn is_queued_in(&self, queue: QueueRef) -> bool {
        self.location == Location::Queued(queue)
    }

    /// Drive along the current road for `delta` time units.
    ///
    /// Returns true when the vehicle has reached the tail of its destination
    /// queue (currently `queue_len` vehicles long) and should be appended to it.
    pub(crate) fn drive(&mut self, delta: f32, queue_len: usize) -> bool {
        self.distance_to_intersection -= delta;
        self.distance_to_intersection <= queue_len as f32
            && !self.is_queued_in(self.destination_queue)
    }

    /// Leave the intersection `from` after crossing it.
    ///
    /// `overshoot` is the crossing time spent beyond `crossing_duration`; it is
    /// credited against the next road. Nothing changes when the next road is
    /// missing.
    pub(crate) fn finish_crossing(
        &mut self,
        from: IntersectionId,
        overshoot: f32,
        network: &RoadNetwork,
    ) -> SimResult<()> {
        let road = match self.path.get(1) {
            Some(&next) => {
                let road = network
                    .road_between(from, next)
                    .ok_or(SimError::MalformedNetwork { from, to: next })?;
                Some((next, *road))
            }
            None => None,
        };

        self.previous_intersection = self.path.pop_front();

        let Some((next, road)) = road else {
            self.arrived = true;
            self.location = Location::Arrived;
            debug!("{} arrived at {} after {:.2}", self.id, from, self.wait_time);
            return Ok(());
        };

        self.distance_to_intersection = road.length - overshoot + self.crossing_duration;
        self.destination_queue = QueueRef::new(next, road.destination);
        self.location = Location::InTransit;
        debug!(
            "{} crossed {} heading to {} ({:.2} away)",
            self.id, from, next, self.distance_to_intersection
        );
        Ok(())
    }
}

/// Vehicles touched by one tick's intersection resolution
///
/// Filled while resolving intersections and consumed by the following tick's
/// vehicle advance, which skips every vehicle in it.
#[derive(Debug, Clone, Default)]
pub struct TouchedSet {
    vehicles: HashSet<VehicleId>,
}

impl TouchedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, id: VehicleId) {
        self.vehicles.insert(id);
    }

    pub fn contains(&self, id: VehicleId) -> bool {
        self.vehicles.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }
}
