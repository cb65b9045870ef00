//! Intersection state and the per-tick resolution rules
//!
//! Each intersection owns four approach queues and a crossing registry. Queues
//! keep arrival order, and the most recently appended vehicle is the one at the
//! stop line.

use log::debug;
use std::collections::BTreeMap;

use super::error::SimResult;
use super::road_network::RoadNetwork;
use super::types::{Approach, IntersectionId, Location, Phase, VehicleId};
use super::vehicle::{TouchedSet, Vehicle};

/// The two signal-phase flags of an intersection
///
/// Keeping the pairs exclusive is up to whoever sets them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignalFlags {
    pub north_south_green: bool,
    pub west_east_green: bool,
}

impl SignalFlags {
    pub fn new(north_south_green: bool, west_east_green: bool) -> Self {
        Self {
            north_south_green,
            west_east_green,
        }
    }

    pub fn is_green(&self, phase: Phase) -> bool {
        match phase {
            Phase::NorthSouth => self.north_south_green,
            Phase::WestEast => self.west_east_green,
        }
    }

    /// Make `phase` the only green pair
    pub fn set_phase(&mut self, phase: Phase) {
        self.north_south_green = phase == Phase::NorthSouth;
        self.west_east_green = phase == Phase::WestEast;
    }
}

/// An intersection in the traffic simulation
///
/// Only the engine creates or mutates intersections; outside the crate they
/// are read through `&Intersection` and their signals are changed through
/// [`SignalControl`](super::SignalControl).
#[derive(Debug, Clone)]
pub struct Intersection {
    id: IntersectionId,
    /// Indexed by `Approach::index`
    queues: [Vec<VehicleId>; 4],
    /// Vehicles inside the intersection and how long they have been crossing
    crossing: BTreeMap<VehicleId, f32>,
    signals: SignalFlags,
}

impl Intersection {
    pub(crate) fn new(id: IntersectionId, signals: SignalFlags) -> Self {
        Self {
            id,
            queues: Default::default(),
            crossing: BTreeMap::new(),
            signals,
        }
    }

    pub fn id(&self) -> IntersectionId {
        self.id
    }

    pub fn signals(&self) -> SignalFlags {
        self.signals
    }

    pub(crate) fn signals_mut(&mut self) -> &mut SignalFlags {
        &mut self.signals
    }

    pub fn queue(&self, approach: Approach) -> &[VehicleId] {
        &self.queues[approach.index()]
    }

    /// The vehicle treated as waiting at the stop line of `approach`
    pub fn stop_line_vehicle(&self, approach: Approach) -> Option<VehicleId> {
        self.queue(approach).last().copied()
    }

    pub fn queued_count(&self) -> usize {
        self.queues.iter().map(Vec::len).sum()
    }

    pub fn crossing(&self) -> impl Iterator<Item = (VehicleId, f32)> + '_ {
        self.crossing.iter().map(|(id, elapsed)| (*id, *elapsed))
    }

    pub fn crossing_elapsed(&self, vehicle: VehicleId) -> Option<f32> {
        self.crossing.get(&vehicle).copied()
    }

    pub fn crossing_count(&self) -> usize {
        self.crossing.len()
    }

    pub fn is_green(&self, phase: Phase) -> bool {
        self.signals.is_green(phase)
    }

    pub(crate) fn enqueue(&mut self, approach: Approach, vehicle: VehicleId) {
        self.queues[approach.index()].push(vehicle);
    }

    /// Advance this intersection by `delta`.
    ///
    /// Crossings are completed first so the overshoot of a finishing vehicle is
    /// accounted for before any queue moves. Every vehicle this touches is
    /// marked in `touched`.
    pub(crate) fn resolve(
        &mut self,
        delta: f32,
        vehicles: &mut [Vehicle],
        network: &RoadNetwork,
        touched: &mut TouchedSet,
    ) -> SimResult<()> {
        self.complete_crossings(delta, vehicles, network, touched)?;

        for phase in [Phase::NorthSouth, Phase::WestEast] {
            for approach in phase.approaches() {
                if self.is_green(phase) {
                    self.release_queue(approach, delta, vehicles, touched);
                } else {
                    self.hold_at_stop_line(approach, vehicles);
                }
            }
        }

        for queue in &self.queues {
            for &id in queue {
                touched.mark(id);
            }
        }

        Ok(())
    }

    fn complete_crossings(
        &mut self,
        delta: f32,
        vehicles: &mut [Vehicle],
        network: &RoadNetwork,
        touched: &mut TouchedSet,
    ) -> SimResult<()> {
        let mut finished = Vec::new();
        for (&id, elapsed) in self.crossing.iter_mut() {
            *elapsed += delta;
            touched.mark(id);

            let crossing_duration = vehicles[id.0].crossing_duration;
            if *elapsed >= crossing_duration {
                finished.push((id, *elapsed - crossing_duration));
            }
        }

        // A vehicle with nowhere to go stays in the registry untouched
        for (id, overshoot) in finished {
            vehicles[id.0].finish_crossing(self.id, overshoot, network)?;
            self.crossing.remove(&id);
        }
        Ok(())
    }

    /// Green: move every queued vehicle forward and admit those past the stop line
    fn release_queue(
        &mut self,
        approach: Approach,
        delta: f32,
        vehicles: &mut [Vehicle],
        touched: &mut TouchedSet,
    ) {
        let here = self.id;
        let queue = &mut self.queues[approach.index()];

        for &id in queue.iter() {
            let vehicle = &mut vehicles[id.0];
            vehicle.distance_to_intersection -= delta;
            touched.mark(id);

            if vehicle.distance_to_intersection <= 0.0 {
                self.crossing.insert(id, -vehicle.distance_to_intersection);
                vehicle.distance_to_intersection = 0.0;
                vehicle.location = Location::Crossing(here);
                debug!("{} entered {} from the {:?}", id, here, approach);
            }
        }

        queue.retain(|id| vehicles[id.0].distance_to_intersection > 0.0);
    }

    /// Red: nobody moves, and a stop-line vehicle that overran is pushed back
    /// along with everyone behind it
    fn hold_at_stop_line(&self, approach: Approach, vehicles: &mut [Vehicle]) {
        let Some((&stop_line, behind)) = self.queue(approach).split_last() else {
            return;
        };

        let distance = vehicles[stop_line.0].distance_to_intersection;
        if distance < 0.0 {
            let push_back = -distance;
            vehicles[stop_line.0].distance_to_intersection = 0.0;
            for &id in behind {
                vehicles[id.0].distance_to_intersection += push_back;
            }
            debug!(
                "{} held at red on {} {:?}, queue pushed back {:.2}",
                stop_line, self.id, approach, push_back
            );
        }

        // Two vehicles joining in the same tick can both have overrun the line
        for &id in behind {
            let vehicle = &mut vehicles[id.0];
            if vehicle.distance_to_intersection < 0.0 {
                vehicle.distance_to_intersection = 0.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::types::QueueRef;

    const HERE: IntersectionId = IntersectionId(0);
    const NEXT: IntersectionId = IntersectionId(1);

    fn network() -> RoadNetwork {
        let mut network = RoadNetwork::new();
        network.add_intersection(HERE);
        network.add_intersection(NEXT);
        network.add_road(HERE, NEXT, 10.0, Approach::West).unwrap();
        network
    }

    fn queued(id: usize, distance: f32, approach: Approach) -> Vehicle {
        let queue = QueueRef::new(HERE, approach);
        let mut vehicle = Vehicle::new(VehicleId(id), distance, queue, vec![HERE, NEXT]);
        vehicle.location = Location::Queued(queue);
        vehicle
    }

    #[test]
    fn green_admits_vehicles_past_the_stop_line() {
        let mut intersection = Intersection::new(HERE, SignalFlags::new(true, false));
        let mut vehicles = vec![
            queued(0, 0.5, Approach::North),
            queued(1, 3.0, Approach::North),
        ];
        intersection.enqueue(Approach::North, VehicleId(0));
        intersection.enqueue(Approach::North, VehicleId(1));

        let mut touched = TouchedSet::new();
        intersection
            .resolve(1.0, &mut vehicles, &network(), &mut touched)
            .unwrap();

        assert_eq!(intersection.crossing_elapsed(VehicleId(0)), Some(0.5));
        assert_eq!(vehicles[0].distance_to_intersection, 0.0);
        assert_eq!(vehicles[0].location, Location::Crossing(HERE));
        assert_eq!(intersection.queue(Approach::North), &[VehicleId(1)]);
        assert_eq!(vehicles[1].distance_to_intersection, 2.0);
        assert!(touched.contains(VehicleId(0)));
        assert!(touched.contains(VehicleId(1)));
    }

    #[test]
    fn red_pushes_back_the_queue_behind_an_overrun() {
        let mut intersection = Intersection::new(HERE, SignalFlags::new(false, true));
        let mut vehicles = vec![
            queued(0, 2.0, Approach::South),
            queued(1, 4.0, Approach::South),
            queued(2, -1.5, Approach::South),
        ];
        for id in 0..3 {
            intersection.enqueue(Approach::South, VehicleId(id));
        }

        let mut touched = TouchedSet::new();
        intersection
            .resolve(1.0, &mut vehicles, &network(), &mut touched)
            .unwrap();

        assert_eq!(intersection.crossing_count(), 0);
        assert_eq!(vehicles[2].distance_to_intersection, 0.0);
        assert_eq!(vehicles[0].distance_to_intersection, 3.5);
        assert_eq!(vehicles[1].distance_to_intersection, 5.5);
        assert_eq!(intersection.queue(Approach::South).len(), 3);
        assert_eq!(touched.len(), 3);
    }

    #[test]
    fn red_never_leaves_a_queued_vehicle_past_the_line() {
        let mut intersection = Intersection::new(HERE, SignalFlags::new(true, false));
        let mut vehicles = vec![queued(0, -0.5, Approach::West), queued(1, 0.5, Approach::West)];
        intersection.enqueue(Approach::West, VehicleId(0));
        intersection.enqueue(Approach::West, VehicleId(1));

        let mut touched = TouchedSet::new();
        intersection
            .resolve(1.0, &mut vehicles, &network(), &mut touched)
            .unwrap();

        assert_eq!(vehicles[0].distance_to_intersection, 0.0);
        assert_eq!(vehicles[1].distance_to_intersection, 0.5);
        assert_eq!(intersection.crossing_count(), 0);
    }

    #[test]
    fn red_leaves_a_legal_queue_untouched() {
        let mut intersection = Intersection::new(HERE, SignalFlags::new(true, false));
        let mut vehicles = vec![queued(0, 2.0, Approach::East), queued(1, 1.0, Approach::East)];
        intersection.enqueue(Approach::East, VehicleId(0));
        intersection.enqueue(Approach::East, VehicleId(1));

        let mut touched = TouchedSet::new();
        intersection
            .resolve(1.0, &mut vehicles, &network(), &mut touched)
            .unwrap();

        assert_eq!(vehicles[0].distance_to_intersection, 2.0);
        assert_eq!(vehicles[1].distance_to_intersection, 1.0);
        assert_eq!(intersection.stop_line_vehicle(Approach::East), Some(VehicleId(1)));
        assert!(touched.contains(VehicleId(0)));
        assert!(touched.contains(VehicleId(1)));
    }

    #[test]
    fn finished_crossing_carries_overshoot_onto_the_next_road() {
        let mut intersection = Intersection::new(HERE, SignalFlags::new(false, false));
        let mut vehicles = vec![queued(0, 0.0, Approach::North)];
        vehicles[0].location = Location::Crossing(HERE);
        intersection.crossing.insert(VehicleId(0), 1.5);

        let mut touched = TouchedSet::new();
        intersection
            .resolve(1.0, &mut vehicles, &network(), &mut touched)
            .unwrap();

        let vehicle = &vehicles[0];
        assert_eq!(intersection.crossing_count(), 0);
        assert_eq!(vehicle.previous_intersection, Some(HERE));
        assert_eq!(vehicle.distance_to_intersection, 10.0 - 0.5 + 2.0);
        assert_eq!(vehicle.destination_queue, QueueRef::new(NEXT, Approach::West));
        assert_eq!(vehicle.location, Location::InTransit);
        assert!(touched.contains(VehicleId(0)));
    }

    #[test]
    fn finished_crossing_at_last_hop_arrives() {
        let mut intersection = Intersection::new(HERE, SignalFlags::new(true, true));
        let queue = QueueRef::new(HERE, Approach::North);
        let mut vehicles = vec![Vehicle::new(VehicleId(0), 0.0, queue, vec![HERE])];
        intersection.crossing.insert(VehicleId(0), 1.0);

        let mut touched = TouchedSet::new();
        intersection
            .resolve(1.0, &mut vehicles, &network(), &mut touched)
            .unwrap();

        assert!(vehicles[0].arrived);
        assert_eq!(vehicles[0].location, Location::Arrived);
        assert!(vehicles[0].path.is_empty());
    }

    #[test]
    fn missing_next_road_is_malformed() {
        let mut intersection = Intersection::new(NEXT, SignalFlags::new(true, true));
        let queue = QueueRef::new(NEXT, Approach::West);
        let mut vehicles = vec![Vehicle::new(VehicleId(0), 0.0, queue, vec![NEXT, HERE])];
        vehicles[0].location = Location::Crossing(NEXT);
        intersection.crossing.insert(VehicleId(0), 1.0);

        let mut touched = TouchedSet::new();
        let result = intersection.resolve(1.0, &mut vehicles, &network(), &mut touched);

        assert_eq!(
            result,
            Err(crate::simulation::SimError::MalformedNetwork {
                from: NEXT,
                to: HERE
            })
        );

        // The stranded vehicle keeps its registry entry and its path
        let vehicle = &vehicles[0];
        assert_eq!(intersection.crossing_elapsed(VehicleId(0)), Some(2.0));
        assert_eq!(vehicle.location, Location::Crossing(NEXT));
        assert_eq!(vehicle.path, [NEXT, HERE]);
        assert_eq!(vehicle.previous_intersection, None);
        assert!(!vehicle.arrived);
    }

    #[test]
    fn set_phase_is_exclusive() {
        let mut intersection = Intersection::new(HERE, SignalFlags::new(true, true));
        intersection.signals_mut().set_phase(Phase::WestEast);
        assert!(!intersection.signals().north_south_green);
        assert!(intersection.signals().west_east_green);
        intersection.signals_mut().set_phase(Phase::NorthSouth);
        assert!(intersection.is_green(Phase::NorthSouth));
        assert!(!intersection.is_green(Phase::WestEast));
    }
}
