//! Main simulation world that ties everything together
//!
//! Owns the road network, the intersections and the vehicles, and drives them
//! tick by tick.

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::Rng;
use rand::SeedableRng;

use super::error::{SimError, SimResult};
use super::intersection::{Intersection, SignalFlags};
use super::policy::{AlwaysGreen, SignalControl, SignalPolicy};
use super::road_network::RoadNetwork;
use super::stats::WaitTimeStats;
use super::types::{
    Approach, IntersectionId, Location, QueueRef, VehicleId, DEFAULT_CROSSING_DURATION,
    REFERENCE_ROAD_LENGTH,
};
use super::vehicle::{TouchedSet, Vehicle};

/// How a call to [`SimWorld::run`] ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// Ticks executed by this run
    pub ticks: u64,
    pub all_arrived: bool,
}

/// The main simulation world
pub struct SimWorld {
    network: RoadNetwork,

    /// Indexed by `IntersectionId`
    intersections: Vec<Intersection>,

    /// Indexed by `VehicleId`
    vehicles: Vec<Vehicle>,

    /// Vehicles touched by the last intersection resolution
    touched: TouchedSet,

    policy: Box<dyn SignalPolicy>,

    /// Simulation time
    pub time: f32,

    /// Ticks executed so far
    pub ticks: u64,

    /// Optional seeded RNG for reproducible random fleets
    rng: Option<StdRng>,
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SimWorld {
    fn new_internal(policy: Box<dyn SignalPolicy>, rng: Option<StdRng>) -> Self {
        Self {
            network: RoadNetwork::new(),
            intersections: Vec::new(),
            vehicles: Vec::new(),
            touched: TouchedSet::new(),
            policy,
            time: 0.0,
            ticks: 0,
            rng,
        }
    }

    /// Create an empty world whose signals never change
    pub fn new() -> Self {
        Self::new_internal(Box::new(AlwaysGreen), None)
    }

    pub fn with_policy(policy: impl SignalPolicy + 'static) -> Self {
        Self::new_internal(Box::new(policy), None)
    }

    /// Create a new SimWorld with a seeded RNG for reproducible simulations
    pub fn new_with_seed(seed: u64) -> Self {
        Self::new_internal(Box::new(AlwaysGreen), Some(StdRng::seed_from_u64(seed)))
    }

    pub fn set_policy(&mut self, policy: impl SignalPolicy + 'static) {
        self.policy = Box::new(policy);
    }

    /// Get a random value in the given range, using seeded RNG if available
    fn random_range(&mut self, range: std::ops::Range<f32>) -> f32 {
        match &mut self.rng {
            Some(rng) => rng.random_range(range),
            None => rand::rng().random_range(range),
        }
    }

    /// Choose a random element from a slice, using seeded RNG if available
    fn choose_random<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        if slice.is_empty() {
            return None;
        }
        match &mut self.rng {
            Some(rng) => slice.choose(rng),
            None => slice.choose(&mut rand::rng()),
        }
    }

    /// Add an intersection with its initial signal phases
    pub fn add_intersection(
        &mut self,
        north_south_green: bool,
        west_east_green: bool,
    ) -> IntersectionId {
        let id = IntersectionId(self.intersections.len());
        let signals = SignalFlags::new(north_south_green, west_east_green);
        self.intersections.push(Intersection::new(id, signals));
        self.network.add_intersection(id);
        id
    }

    /// Add a one-way road that feeds the `destination` queue of `end`
    pub fn add_road(
        &mut self,
        start: IntersectionId,
        end: IntersectionId,
        length: f32,
        destination: Approach,
    ) -> SimResult<()> {
        self.network.add_road(start, end, length, destination)
    }

    /// Add a vehicle `distance` away from the queue it will join first.
    ///
    /// `destination` must be one of the queues of the first intersection on `path`.
    pub fn add_vehicle(
        &mut self,
        path: Vec<IntersectionId>,
        distance: f32,
        destination: QueueRef,
    ) -> SimResult<VehicleId> {
        self.add_vehicle_with_crossing_duration(
            path,
            distance,
            destination,
            DEFAULT_CROSSING_DURATION,
        )
    }

    pub fn add_vehicle_with_crossing_duration(
        &mut self,
        path: Vec<IntersectionId>,
        distance: f32,
        destination: QueueRef,
        crossing_duration: f32,
    ) -> SimResult<VehicleId> {
        let first = *path.first().ok_or(SimError::EmptyPath)?;
        if let Some(unknown) = path.iter().find(|id| !self.network.contains(**id)) {
            return Err(SimError::UnknownIntersection(*unknown));
        }
        if destination.intersection != first {
            return Err(SimError::DestinationMismatch {
                queue: destination,
                expected: first,
            });
        }
        for value in [distance, crossing_duration] {
            if !value.is_finite() || value < 0.0 {
                return Err(SimError::InvalidLength(value));
            }
        }

        let id = VehicleId(self.vehicles.len());
        self.vehicles.push(
            Vehicle::new(id, distance, destination, path)
                .with_crossing_duration(crossing_duration),
        );
        debug!("Added {} {:.2} away from {:?}", id, distance, destination);
        Ok(id)
    }

    /// Add a vehicle driving a random walk of up to `hops` roads.
    ///
    /// The walk avoids turning straight back where another road exists. The
    /// vehicle starts somewhere on a random road into its first intersection.
    pub fn add_random_vehicle(&mut self, hops: usize) -> SimResult<VehicleId> {
        let ids: Vec<IntersectionId> = self.intersections.iter().map(|i| i.id()).collect();
        let start = *self.choose_random(&ids).ok_or(SimError::EmptyPath)?;

        let mut path = vec![start];
        let mut previous = None;
        let mut current = start;
        for _ in 0..hops {
            let all: Vec<IntersectionId> = self
                .network
                .outgoing_roads(current)
                .into_iter()
                .map(|(next, _)| next)
                .collect();
            let forward: Vec<IntersectionId> = all
                .iter()
                .copied()
                .filter(|next| Some(*next) != previous)
                .collect();
            let options = if forward.is_empty() { all } else { forward };

            let Some(&next) = self.choose_random(&options) else {
                break;
            };
            path.push(next);
            previous = Some(current);
            current = next;
        }

        let incoming = self.network.incoming_roads(start);
        let (approach, length) = match self.choose_random(&incoming) {
            Some((_, road)) => (road.destination, road.length),
            None => (Approach::North, REFERENCE_ROAD_LENGTH),
        };
        let distance = if length > 0.0 {
            self.random_range(0.0..length)
        } else {
            0.0
        };

        self.add_vehicle(path, distance, QueueRef::new(start, approach))
    }

    pub fn network(&self) -> &RoadNetwork {
        &self.network
    }

    pub fn intersections(&self) -> &[Intersection] {
        &self.intersections
    }

    pub fn intersection(&self, id: IntersectionId) -> Option<&Intersection> {
        self.intersections.get(id.0)
    }

    /// Signal access for adjusting phases between ticks
    pub fn signals_mut(&mut self, id: IntersectionId) -> Option<SignalControl<'_>> {
        self.intersections.get_mut(id.0).map(SignalControl::new)
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(id.0)
    }

    /// Whether the last intersection resolution touched this vehicle, which
    /// makes the next tick's vehicle advance skip it
    pub fn processed_this_tick(&self, id: VehicleId) -> bool {
        self.touched.contains(id)
    }

    pub fn arrived_count(&self) -> usize {
        self.vehicles.iter().filter(|v| v.arrived).count()
    }

    pub fn all_arrived(&self) -> bool {
        self.vehicles.iter().all(|v| v.arrived)
    }

    pub fn stats(&self) -> SimResult<WaitTimeStats> {
        WaitTimeStats::from_vehicles(&self.vehicles)
    }

    /// Move every vehicle that the previous resolution left alone.
    ///
    /// `touched` is what the previous tick's resolution left behind. Returns
    /// whether every vehicle has arrived.
    fn advance_vehicles(&mut self, delta: f32, touched: &TouchedSet) -> bool {
        let mut all_arrived = true;

        for vehicle in &mut self.vehicles {
            if vehicle.arrived {
                continue;
            }
            all_arrived = false;

            if !touched.contains(vehicle.id) {
                let destination = vehicle.destination_queue;
                let intersection = &mut self.intersections[destination.intersection.0];
                let queue_len = intersection.queue(destination.approach).len();

                if vehicle.drive(delta, queue_len) {
                    intersection.enqueue(destination.approach, vehicle.id);
                    vehicle.location = Location::Queued(destination);
                    debug!(
                        "{} joined {} {:?} queue at {:.2}",
                        vehicle.id,
                        destination.intersection,
                        destination.approach,
                        vehicle.distance_to_intersection
                    );
                }
            }

            vehicle.wait_time += delta;
        }

        all_arrived
    }

    fn run_policy(&mut self) {
        let mut controls: Vec<SignalControl<'_>> = self
            .intersections
            .iter_mut()
            .map(SignalControl::new)
            .collect();
        self.policy
            .on_tick(&self.network, &mut controls, &self.vehicles, self.time);
    }

    /// Main simulation tick
    ///
    /// Advances vehicles, then resolves every intersection, then the clock,
    /// then consults the signal policy. Returns whether all vehicles had
    /// already arrived when the tick started. A zero `delta` changes no
    /// vehicle or queue and only consults the policy.
    pub fn tick(&mut self, delta: f32) -> SimResult<bool> {
        if !delta.is_finite() || delta < 0.0 {
            return Err(SimError::InvalidDelta(delta));
        }

        if delta == 0.0 {
            self.run_policy();
            return Ok(self.all_arrived());
        }

        let touched = std::mem::take(&mut self.touched);
        let all_arrived = self.advance_vehicles(delta, &touched);

        for intersection in &mut self.intersections {
            intersection.resolve(delta, &mut self.vehicles, &self.network, &mut self.touched)?;
        }

        self.time += delta;
        self.ticks += 1;
        self.run_policy();

        Ok(all_arrived)
    }

    /// Tick until every vehicle has arrived or `max_ticks` ticks have run.
    ///
    /// Running out of ticks is not an error; the outcome reports it.
    pub fn run(&mut self, delta: f32, max_ticks: u64) -> SimResult<RunOutcome> {
        for tick in 1..=max_ticks {
            if self.tick(delta)? {
                info!(
                    "All {} vehicles arrived after {} ticks ({:.2} time)",
                    self.vehicles.len(),
                    tick,
                    self.time
                );
                return Ok(RunOutcome {
                    ticks: tick,
                    all_arrived: true,
                });
            }
        }

        let all_arrived = self.all_arrived();
        if !all_arrived {
            warn!(
                "Tick budget of {} exhausted with {}/{} vehicles arrived",
                max_ticks,
                self.arrived_count(),
                self.vehicles.len()
            );
        }
        Ok(RunOutcome {
            ticks: max_ticks,
            all_arrived,
        })
    }

    /// Create the four-intersection reference world with its two vehicles
    pub fn reference_network() -> SimResult<Self> {
        let mut world = SimWorld::new();
        let grid = world.add_reference_roads()?;
        world.add_reference_vehicles(grid)?;
        Ok(world)
    }

    /// Add the reference intersections and roads, all signals green.
    ///
    /// ```text
    ///   X0 ---- X1
    ///   |        |
    ///   X2 ---- X3
    /// ```
    pub fn add_reference_roads(&mut self) -> SimResult<[IntersectionId; 4]> {
        let grid = [(); 4].map(|_| self.add_intersection(true, true));
        let [x0, x1, x2, x3] = grid;

        let roads = [
            (x0, x1, Approach::West),
            (x1, x0, Approach::East),
            (x0, x2, Approach::North),
            (x2, x0, Approach::South),
            (x1, x3, Approach::North),
            (x3, x1, Approach::South),
            (x3, x2, Approach::East),
            (x2, x3, Approach::West),
        ];
        for (start, end, destination) in roads {
            self.add_road(start, end, REFERENCE_ROAD_LENGTH, destination)?;
        }

        Ok(grid)
    }

    /// Add the two reference vehicles travelling corner to corner
    pub fn add_reference_vehicles(
        &mut self,
        grid: [IntersectionId; 4],
    ) -> SimResult<[VehicleId; 2]> {
        let [x0, x1, x2, x3] = grid;
        let a = self.add_vehicle(vec![x0, x2, x3], 2.0, QueueRef::new(x0, Approach::North))?;
        let b = self.add_vehicle(vec![x3, x1, x0], 3.0, QueueRef::new(x3, Approach::South))?;
        Ok([a, b])
    }

    /// Print a summary of the world state
    pub fn print_summary(&self) {
        println!("=== Traffic Simulation Summary ===");
        println!("Time: {:.2} ({} ticks)", self.time, self.ticks);
        println!(
            "Intersections: {}, Roads: {}",
            self.network.intersection_count(),
            self.network.road_count()
        );
        println!(
            "Vehicles: {} ({} arrived)",
            self.vehicles.len(),
            self.arrived_count()
        );

        println!("--- Intersections ---");
        for intersection in &self.intersections {
            let signals = intersection.signals();
            let queues: Vec<String> = Approach::ALL
                .iter()
                .map(|approach| format!("{:?}={}", approach, intersection.queue(*approach).len()))
                .collect();
            println!(
                "  {}: NS={} WE={} queues[{}] crossing={}",
                intersection.id(),
                if signals.north_south_green { "green" } else { "red" },
                if signals.west_east_green { "green" } else { "red" },
                queues.join(" "),
                intersection.crossing_count()
            );
        }

        let active: Vec<&Vehicle> = self.vehicles.iter().filter(|v| !v.arrived).collect();
        if !active.is_empty() {
            println!("--- Active Vehicles ---");
            for vehicle in active {
                println!(
                    "  {}: {:?}, distance={:.1}, path_remaining={}, wait={:.1}",
                    vehicle.id,
                    vehicle.location,
                    vehicle.distance_to_intersection,
                    vehicle.path.len(),
                    vehicle.wait_time
                );
            }
        }
    }
}
