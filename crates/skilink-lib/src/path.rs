//! Shortest-path search over the routing graph.
//!
//! Dijkstra over a binary heap. Between equally cheap paths the one with more
//! hops wins, so a detour through an intermediate node is reported when it
//! costs exactly as much as the direct edge.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::graph::{Edge, Graph, NodeId};

/// Edge attribute minimized by the path finder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CostMode {
    /// Planar length.
    #[default]
    Length,
    /// `cost_1`: favours easy slopes.
    Easy,
    /// `cost_2`: favours intermediate slopes.
    Intermediate,
    /// `cost_3`: favours difficult slopes.
    Difficult,
}

impl CostMode {
    fn weight(self, edge: &Edge) -> f64 {
        match self {
            CostMode::Length => edge.length,
            CostMode::Easy => edge.costs[0],
            CostMode::Intermediate => edge.costs[1],
            CostMode::Difficult => edge.costs[2],
        }
    }
}

impl TryFrom<u8> for CostMode {
    type Error = Error;

    fn try_from(mode: u8) -> Result<Self> {
        match mode {
            0 => Ok(CostMode::Length),
            1 => Ok(CostMode::Easy),
            2 => Ok(CostMode::Intermediate),
            3 => Ok(CostMode::Difficult),
            _ => Err(Error::UnsupportedCostMode { mode }),
        }
    }
}

/// Shortest path between the source nodes of the edges carrying `source` and
/// `destination`.
///
/// Returns the r_ids of the traversed edges in travel order without repeats.
/// The result is empty when either r_id is unknown, when both share a node, or
/// when no path exists.
pub fn shortest_path(graph: &Graph, source: u64, destination: u64, mode: CostMode) -> Vec<u64> {
    let (Some(start), Some(goal)) = (graph.edge_source(source), graph.edge_source(destination))
    else {
        debug!(source, destination, "route endpoint not found in graph");
        return Vec::new();
    };

    let Some(steps) = dijkstra(graph, start, Some(goal), mode).path_to(goal) else {
        debug!(source, destination, "no route found");
        return Vec::new();
    };

    let mut r_ids: Vec<u64> = Vec::with_capacity(steps.len());
    for r_id in steps {
        if !r_ids.contains(&r_id) {
            r_ids.push(r_id);
        }
    }
    info!(source, destination, hops = r_ids.len(), ?mode, "route found");
    r_ids
}

/// Shortest length path from the source node of the edge carrying `r_id` to
/// every reachable node, as the r_id sequence of each path.
pub fn reach_all_from_one(graph: &Graph, r_id: u64) -> HashMap<NodeId, Vec<u64>> {
    let Some(start) = graph.edge_source(r_id) else {
        return HashMap::new();
    };
    let tree = dijkstra(graph, start, None, CostMode::Length);
    let mut paths = HashMap::new();
    for &node in tree.distances.keys() {
        if let Some(path) = tree.path_to(node) {
            paths.insert(node, path);
        }
    }
    info!(r_id, reachable = paths.len(), "computed paths from one origin");
    paths
}

/// Shortest-path tree rooted at one node.
struct SearchTree {
    start: NodeId,
    distances: HashMap<NodeId, f64>,
    /// Predecessor node and the r_id of the edge used to reach each node.
    parents: HashMap<NodeId, (NodeId, u64)>,
}

impl SearchTree {
    /// Edge r_ids from the root to `goal`.
    fn path_to(&self, goal: NodeId) -> Option<Vec<u64>> {
        if !self.distances.contains_key(&goal) {
            return None;
        }
        let mut path = Vec::new();
        let mut current = goal;
        while current != self.start {
            let (parent, r_id) = *self.parents.get(&current)?;
            path.push(r_id);
            current = parent;
        }
        path.reverse();
        Some(path)
    }
}

fn dijkstra(graph: &Graph, start: NodeId, goal: Option<NodeId>, mode: CostMode) -> SearchTree {
    let mut distances: HashMap<NodeId, f64> = HashMap::new();
    let mut parents: HashMap<NodeId, (NodeId, u64)> = HashMap::new();
    let mut hops: HashMap<NodeId, usize> = HashMap::new();
    let mut queue = BinaryHeap::new();

    distances.insert(start, 0.0);
    hops.insert(start, 0);
    queue.push(QueueEntry::new(start, 0.0));

    while let Some(entry) = queue.pop() {
        let current_distance = match distances.get(&entry.node) {
            Some(distance) if *distance < entry.cost.0 => continue,
            Some(distance) => *distance,
            None => continue,
        };

        if Some(entry.node) == goal {
            break;
        }

        let current_hops = hops.get(&entry.node).copied().unwrap_or(0);
        for edge in graph.neighbours(entry.node) {
            let next = edge.target;
            let weight = mode.weight(edge);
            let next_cost = current_distance + weight;
            let known = *distances.get(&next).unwrap_or(&f64::INFINITY);
            if next_cost < known {
                distances.insert(next, next_cost);
                parents.insert(next, (entry.node, edge.r_id));
                hops.insert(next, current_hops + 1);
                queue.push(QueueEntry::new(next, next_cost));
            } else if next_cost == known
                && weight > 0.0
                && hops.get(&next).is_some_and(|&h| current_hops + 1 > h)
            {
                // positive weight keeps the parent chain acyclic
                parents.insert(next, (entry.node, edge.r_id));
                hops.insert(next, current_hops + 1);
            }
        }
    }

    SearchTree {
        start,
        distances,
        parents,
    }
}

#[derive(Copy, Clone, Debug, Default)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct QueueEntry {
    node: NodeId,
    cost: FloatOrd,
}

impl QueueEntry {
    fn new(node: NodeId, cost: f64) -> Self {
        Self {
            node,
            cost: FloatOrd(cost),
        }
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so BinaryHeap becomes a min-heap by cost.
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
