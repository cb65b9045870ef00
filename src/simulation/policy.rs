//! Signal policies
//!
//! A policy runs once at the end of every tick and may only change the signal
//! flags of intersections. It sees each intersection through a
//! [`SignalControl`], which reads the whole intersection but writes only its
//! [`SignalFlags`].

use std::ops::Deref;

use super::intersection::{Intersection, SignalFlags};
use super::road_network::RoadNetwork;
use super::types::Phase;
use super::vehicle::Vehicle;

/// Signal access to one intersection handed to a [`SignalPolicy`]
///
/// Dereferences to the intersection for reading. Queues and the crossing
/// registry cannot be reached mutably, and an intersection cannot be replaced:
///
/// ```compile_fail
/// use signal_sim::simulation::SignalControl;
///
/// fn replace(control: &mut SignalControl<'_>) {
///     let _ = &mut **control;
/// }
/// ```
///
/// ```compile_fail
/// use signal_sim::simulation::{Intersection, IntersectionId, SignalFlags};
///
/// let _ = Intersection::new(IntersectionId(0), SignalFlags::default());
/// ```
#[derive(Debug)]
pub struct SignalControl<'a> {
    intersection: &'a mut Intersection,
}

impl<'a> SignalControl<'a> {
    pub(crate) fn new(intersection: &'a mut Intersection) -> Self {
        Self { intersection }
    }

    pub fn signals_mut(&mut self) -> &mut SignalFlags {
        self.intersection.signals_mut()
    }

    /// Give `phase` green and hold the other pair at red
    pub fn set_phase(&mut self, phase: Phase) {
        self.signals_mut().set_phase(phase);
    }
}

impl Deref for SignalControl<'_> {
    type Target = Intersection;

    fn deref(&self) -> &Intersection {
        &*self.intersection
    }
}

pub trait SignalPolicy {
    fn on_tick(
        &mut self,
        network: &RoadNetwork,
        intersections: &mut [SignalControl<'_>],
        vehicles: &[Vehicle],
        time: f32,
    );
}

impl<F> SignalPolicy for F
where
    F: FnMut(&RoadNetwork, &mut [SignalControl<'_>], &[Vehicle], f32),
{
    fn on_tick(
        &mut self,
        network: &RoadNetwork,
        intersections: &mut [SignalControl<'_>],
        vehicles: &[Vehicle],
        time: f32,
    ) {
        self(network, intersections, vehicles, time)
    }
}

/// Leaves every signal as it was configured when the network was built
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysGreen;

impl SignalPolicy for AlwaysGreen {
    fn on_tick(
        &mut self,
        _: &RoadNetwork,
        _: &mut [SignalControl<'_>],
        _: &[Vehicle],
        _: f32,
    ) {
    }
}

/// Alternates north-south and west-east green every `period` time units,
/// starting with north-south
#[derive(Debug, Clone, Copy)]
pub struct FixedCycle {
    pub period: f32,
}

impl FixedCycle {
    pub fn new(period: f32) -> Self {
        Self { period }
    }

    pub fn phase_at(&self, time: f32) -> Phase {
        if self.period <= 0.0 || (time / self.period).floor() as u64 % 2 == 0 {
            Phase::NorthSouth
        } else {
            Phase::WestEast
        }
    }
}

impl SignalPolicy for FixedCycle {
    fn on_tick(
        &mut self,
        _network: &RoadNetwork,
        intersections: &mut [SignalControl<'_>],
        _vehicles: &[Vehicle],
        time: f32,
    ) {
        let phase = self.phase_at(time);
        for intersection in intersections {
            intersection.set_phase(phase);
        }
    }
}
