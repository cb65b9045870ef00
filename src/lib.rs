//! Signalized Intersection Simulation Library
//!
//! A discrete-time traffic simulation of vehicles queuing at and crossing
//! signalized intersections.

pub mod simulation;
