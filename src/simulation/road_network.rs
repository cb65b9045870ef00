//! Road network graph connecting intersections
//!
//! Every road is one-way; a two-way street is two roads.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;

use super::error::{SimError, SimResult};
use super::types::{Approach, IntersectionId};

/// Edge data for the road network graph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadEdge {
    pub length: f32,
    /// The queue of the target intersection that this road feeds into
    pub destination: Approach,
}

#[derive(Debug, Default)]
pub struct RoadNetwork {
    /// The underlying petgraph directed graph (one-way roads)
    graph: DiGraph<IntersectionId, RoadEdge>,

    /// Maps intersection IDs to their node indices in the graph
    intersection_to_node: HashMap<IntersectionId, NodeIndex>,
}

impl RoadNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an intersection to the network graph
    pub fn add_intersection(&mut self, intersection_id: IntersectionId) {
        if self.intersection_to_node.contains_key(&intersection_id) {
            return;
        }

        let node_index = self.graph.add_node(intersection_id);
        self.intersection_to_node.insert(intersection_id, node_index);
    }

    pub fn contains(&self, intersection_id: IntersectionId) -> bool {
        self.intersection_to_node.contains_key(&intersection_id)
    }

    fn node(&self, intersection_id: IntersectionId) -> SimResult<NodeIndex> {
        self.intersection_to_node
            .get(&intersection_id)
            .copied()
            .ok_or(SimError::UnknownIntersection(intersection_id))
    }

    /// Adds a one-way road from `start` to `end` feeding `end`'s `destination` queue
    pub fn add_road(
        &mut self,
        start: IntersectionId,
        end: IntersectionId,
        length: f32,
        destination: Approach,
    ) -> SimResult<()> {
        if !length.is_finite() || length < 0.0 {
            return Err(SimError::InvalidLength(length));
        }

        let start_node = self.node(start)?;
        let end_node = self.node(end)?;

        if self.graph.find_edge(start_node, end_node).is_some() {
            return Err(SimError::DuplicateRoad {
                from: start,
                to: end,
            });
        }

        self.graph
            .add_edge(start_node, end_node, RoadEdge { length, destination });
        Ok(())
    }

    /// Finds the road connecting two intersections
    pub fn road_between(&self, from: IntersectionId, to: IntersectionId) -> Option<&RoadEdge> {
        let from_node = self.intersection_to_node.get(&from)?;
        let to_node = self.intersection_to_node.get(&to)?;

        self.graph
            .find_edge(*from_node, *to_node)
            .map(|edge| &self.graph[edge])
    }

    /// Roads leaving an intersection, with the intersection each one leads to
    pub fn outgoing_roads(
        &self,
        intersection_id: IntersectionId,
    ) -> Vec<(IntersectionId, RoadEdge)> {
        self.roads_directed(intersection_id, Direction::Outgoing)
    }

    /// Roads entering an intersection, with the intersection each one comes from
    pub fn incoming_roads(
        &self,
        intersection_id: IntersectionId,
    ) -> Vec<(IntersectionId, RoadEdge)> {
        self.roads_directed(intersection_id, Direction::Incoming)
    }

    fn roads_directed(
        &self,
        intersection_id: IntersectionId,
        direction: Direction,
    ) -> Vec<(IntersectionId, RoadEdge)> {
        let Some(node_index) = self.intersection_to_node.get(&intersection_id) else {
            return Vec::new();
        };

        self.graph
            .edges_directed(*node_index, direction)
            .map(|edge| {
                let other = match direction {
                    Direction::Outgoing => edge.target(),
                    Direction::Incoming => edge.source(),
                };
                (self.graph[other], *edge.weight())
            })
            .collect()
    }

    /// Get number of roads
    pub fn road_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Get number of intersections
    pub fn intersection_count(&self) -> usize {
        self.intersection_to_node.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_node_network() -> RoadNetwork {
        let mut network = RoadNetwork::new();
        network.add_intersection(IntersectionId(0));
        network.add_intersection(IntersectionId(1));
        network
    }

    #[test]
    fn roads_are_one_way() {
        let mut network = two_node_network();
        network
            .add_road(IntersectionId(0), IntersectionId(1), 10.0, Approach::West)
            .unwrap();

        let road = network
            .road_between(IntersectionId(0), IntersectionId(1))
            .unwrap();
        assert_eq!(road.length, 10.0);
        assert_eq!(road.destination, Approach::West);
        assert!(network
            .road_between(IntersectionId(1), IntersectionId(0))
            .is_none());
    }

    #[test]
    fn rejects_duplicate_and_dangling_roads() {
        let mut network = two_node_network();
        network
            .add_road(IntersectionId(0), IntersectionId(1), 10.0, Approach::West)
            .unwrap();

        assert_eq!(
            network.add_road(IntersectionId(0), IntersectionId(1), 5.0, Approach::East),
            Err(SimError::DuplicateRoad {
                from: IntersectionId(0),
                to: IntersectionId(1)
            })
        );
        assert_eq!(
            network.add_road(IntersectionId(0), IntersectionId(7), 5.0, Approach::East),
            Err(SimError::UnknownIntersection(IntersectionId(7)))
        );
        assert_eq!(
            network.add_road(IntersectionId(1), IntersectionId(0), -1.0, Approach::East),
            Err(SimError::InvalidLength(-1.0))
        );
        assert_eq!(network.road_count(), 1);
    }

    #[test]
    fn lists_incoming_and_outgoing_roads() {
        let mut network = two_node_network();
        network
            .add_road(IntersectionId(0), IntersectionId(1), 10.0, Approach::West)
            .unwrap();

        let outgoing = network.outgoing_roads(IntersectionId(0));
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].0, IntersectionId(1));

        let incoming = network.incoming_roads(IntersectionId(1));
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].0, IntersectionId(0));
        assert!(network.incoming_roads(IntersectionId(0)).is_empty());
    }
}
