//! Directed routing graph over the merged edge set.
//!
//! Nodes are distinct planar vertices; each feature contributes one or two
//! directed edges depending on its category and the elevation of its ends.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tracing::{info, warn};

use crate::constants::{DUPLICATE_NODE_TOLERANCE, R_ID, XML_TYPE};
use crate::error::{Error, Result};
use crate::feature::{Coordinate, Feature, Geometry};
use crate::merge::{TYPE_BUSES, TYPE_LIFTS, TYPE_LINKS, TYPE_SLOPES};
use crate::spatial::PointIndex;

/// Index of a node in the routing graph.
pub type NodeId = usize;

/// Category of the feature behind an edge; decides its orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Downhill only.
    Slope,
    /// Uphill only.
    Lift,
    Bus,
    Link,
}

impl EdgeKind {
    pub fn from_type(xml_type: &str) -> Option<Self> {
        match xml_type {
            TYPE_SLOPES => Some(EdgeKind::Slope),
            TYPE_LIFTS => Some(EdgeKind::Lift),
            TYPE_BUSES => Some(EdgeKind::Bus),
            TYPE_LINKS => Some(EdgeKind::Link),
            _ => None,
        }
    }
}

/// Directed edge within the routing graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub target: NodeId,
    pub kind: EdgeKind,
    pub r_id: u64,
    pub length: f64,
    /// `cost_1`, `cost_2` and `cost_3`.
    pub costs: [f64; 3],
}

/// Directed routing graph built from the merged feature set.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Coordinate>,
    adjacency: Arc<HashMap<NodeId, Vec<Edge>>>,
    /// Source node of the first edge owning each r_id.
    edge_sources: HashMap<u64, NodeId>,
    edge_count: usize,
}

impl Graph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Return the outgoing edges of a node.
    pub fn neighbours(&self, node: NodeId) -> &[Edge] {
        self.adjacency
            .get(&node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Source node of the first edge carrying `r_id`.
    pub fn edge_source(&self, r_id: u64) -> Option<NodeId> {
        self.edge_sources.get(&r_id).copied()
    }
}

/// Planar node key; `-0.0` and `0.0` map to the same node.
fn node_key(coord: &Coordinate) -> (u64, u64) {
    ((coord.x + 0.0).to_bits(), (coord.y + 0.0).to_bits())
}

struct GraphBuilder {
    nodes: Vec<Coordinate>,
    lookup: HashMap<(u64, u64), NodeId>,
    adjacency: HashMap<NodeId, Vec<Edge>>,
    edge_sources: HashMap<u64, NodeId>,
    edge_count: usize,
}

impl GraphBuilder {
    fn new() -> Self {
        Self {
            nodes: Vec::new(),
            lookup: HashMap::new(),
            adjacency: HashMap::new(),
            edge_sources: HashMap::new(),
            edge_count: 0,
        }
    }

    fn node(&mut self, coord: Coordinate) -> NodeId {
        let key = node_key(&coord);
        if let Some(&id) = self.lookup.get(&key) {
            return id;
        }
        let id = self.nodes.len();
        self.nodes.push(coord);
        self.lookup.insert(key, id);
        self.adjacency.entry(id).or_default();
        id
    }

    fn connect(&mut self, from: NodeId, to: NodeId, edge: &Edge) {
        self.edge_sources.entry(edge.r_id).or_insert(from);
        self.adjacency.entry(from).or_default().push(Edge {
            target: to,
            ..edge.clone()
        });
        self.edge_count += 1;
    }

    fn finish(self) -> Graph {
        Graph {
            nodes: self.nodes,
            adjacency: Arc::new(self.adjacency),
            edge_sources: self.edge_sources,
            edge_count: self.edge_count,
        }
    }
}

/// Build the routing graph.
///
/// Slopes run from their upper to their lower end, lifts from lower to upper;
/// bus and link edges are added in both directions. A slope or lift whose ends
/// share the same elevation is added in both directions. Any feature that is
/// not a two-vertex line, has an undefined vertex or carries an unknown type
/// aborts the build.
pub fn build_graph(features: &[Feature]) -> Result<Graph> {
    let mut builder = GraphBuilder::new();

    for feature in features {
        let r_id_text = feature.text(R_ID);
        let r_id = feature
            .int(R_ID)
            .and_then(|value| u64::try_from(value).ok())
            .ok_or_else(|| Error::MissingAttribute {
                attribute: R_ID.to_string(),
            })?;
        let edge_type = feature.text(XML_TYPE);
        let kind = EdgeKind::from_type(&edge_type).ok_or_else(|| Error::UnknownEdgeType {
            r_id: r_id_text.clone(),
            edge_type: edge_type.clone(),
        })?;

        let coords = match &feature.geometry {
            Geometry::LineString(coords) if coords.len() == 2 => coords,
            other => {
                return Err(Error::DegenerateEdge {
                    r_id: r_id_text,
                    edge_type,
                    vertices: other.coordinates().len(),
                })
            }
        };
        let (a, b) = (coords[0], coords[1]);
        if !a.is_finite_2d() || !b.is_finite_2d() {
            return Err(Error::NullVertex { r_id: r_id_text });
        }

        let length = feature.float("length").unwrap_or_else(|| a.distance(&b));
        let cost = |key: &str| feature.float(key).unwrap_or(length);
        let edge = Edge {
            target: 0,
            kind,
            r_id,
            length,
            costs: [cost("cost_1"), cost("cost_2"), cost("cost_3")],
        };

        let (from, to) = (builder.node(a), builder.node(b));
        let forward = match kind {
            EdgeKind::Slope => a.z.partial_cmp(&b.z),
            EdgeKind::Lift => b.z.partial_cmp(&a.z),
            EdgeKind::Bus | EdgeKind::Link => None,
        };
        match forward {
            Some(std::cmp::Ordering::Greater) => builder.connect(from, to, &edge),
            Some(std::cmp::Ordering::Less) => builder.connect(to, from, &edge),
            _ => {
                builder.connect(from, to, &edge);
                builder.connect(to, from, &edge);
            }
        }
    }

    let graph = builder.finish();
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "built routing graph"
    );
    Ok(graph)
}

/// Pairs of distinct nodes lying closer than 1 mm to each other.
pub fn duplicate_nodes(graph: &Graph) -> Vec<(NodeId, NodeId)> {
    let index = PointIndex::build(graph.nodes.iter().copied().enumerate().map(|(i, c)| (c, i)));
    let mut pairs = Vec::new();
    for (id, coord) in graph.nodes.iter().enumerate() {
        for (hit, _) in index.within_radius(coord, DUPLICATE_NODE_TOLERANCE) {
            if hit.payload > id {
                warn!(
                    first = id,
                    second = hit.payload,
                    at = %coord,
                    "coincident graph nodes"
                );
                pairs.push((id, hit.payload));
            }
        }
    }
    pairs
}

/// Outcome of a traversal from one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connectivity {
    pub visited: usize,
    pub total: usize,
}

impl Connectivity {
    pub fn is_connected(&self) -> bool {
        self.visited == self.total
    }
}

/// Breadth-first traversal from the source node of the edge carrying `r_id`.
///
/// Returns `None` when no edge carries `r_id`.
pub fn connectivity_from(graph: &Graph, r_id: u64) -> Option<Connectivity> {
    let start = graph.edge_source(r_id)?;
    let mut visited = vec![false; graph.node_count()];
    let mut queue = VecDeque::new();
    visited[start] = true;
    queue.push_back(start);
    let mut count = 1;

    while let Some(current) = queue.pop_front() {
        for edge in graph.neighbours(current) {
            if !visited[edge.target] {
                visited[edge.target] = true;
                count += 1;
                queue.push_back(edge.target);
            }
        }
    }

    let result = Connectivity {
        visited: count,
        total: graph.node_count(),
    };
    if result.is_connected() {
        info!(r_id, nodes = result.total, "graph is connected");
    } else {
        warn!(
            r_id,
            visited = result.visited,
            total = result.total,
            "graph is not connected"
        );
    }
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(kind: &str, r_id: i64, a: (f64, f64, f64), b: (f64, f64, f64)) -> Feature {
        Feature::line(vec![
            Coordinate::new(a.0, a.1, a.2),
            Coordinate::new(b.0, b.1, b.2),
        ])
        .with(XML_TYPE, kind)
        .with(R_ID, r_id)
    }

    #[test]
    fn slopes_run_downhill_and_lifts_uphill() {
        let graph = build_graph(&[
            edge(TYPE_SLOPES, 1, (0.0, 0.0, 100.0), (10.0, 0.0, 200.0)),
            edge(TYPE_LIFTS, 2, (10.0, 0.0, 200.0), (20.0, 0.0, 500.0)),
        ])
        .expect("valid edges");
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.neighbours(1)[0].target, 0);
        assert_eq!(graph.neighbours(1)[1].target, 2);
        assert!(graph.neighbours(0).is_empty());
        assert_eq!(graph.edge_source(1), Some(1));
    }

    #[test]
    fn links_are_bidirectional() {
        let graph = build_graph(&[edge(TYPE_LINKS, 5, (0.0, 0.0, 0.0), (1.0, 0.0, 0.0))])
            .expect("valid edges");
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.neighbours(0)[0].target, 1);
        assert_eq!(graph.neighbours(1)[0].target, 0);
    }

    #[test]
    fn degenerate_edges_abort_the_build() {
        let three = Feature::line(vec![
            Coordinate::new(0.0, 0.0, 0.0),
            Coordinate::new(1.0, 0.0, 0.0),
            Coordinate::new(2.0, 0.0, 0.0),
        ])
        .with(XML_TYPE, TYPE_LINKS)
        .with(R_ID, 9i64);
        assert!(matches!(
            build_graph(&[three]),
            Err(Error::DegenerateEdge { vertices: 3, .. })
        ));

        let null = edge(TYPE_LINKS, 9, (f64::NAN, 0.0, 0.0), (1.0, 0.0, 0.0));
        assert!(matches!(build_graph(&[null]), Err(Error::NullVertex { .. })));

        let unknown = edge("gondolas", 9, (0.0, 0.0, 0.0), (1.0, 0.0, 0.0));
        assert!(matches!(
            build_graph(&[unknown]),
            Err(Error::UnknownEdgeType { .. })
        ));
    }

    #[test]
    fn near_coincident_nodes_are_reported() {
        let graph = build_graph(&[
            edge(TYPE_LINKS, 1, (0.0, 0.0, 0.0), (10.0, 0.0, 0.0)),
            edge(TYPE_LINKS, 2, (10.0005, 0.0, 0.0), (20.0, 0.0, 0.0)),
        ])
        .expect("valid edges");
        assert_eq!(duplicate_nodes(&graph), vec![(1, 2)]);
    }

    #[test]
    fn connectivity_counts_reachable_nodes() {
        let graph = build_graph(&[
            edge(TYPE_SLOPES, 1, (0.0, 0.0, 200.0), (10.0, 0.0, 100.0)),
            edge(TYPE_SLOPES, 2, (20.0, 0.0, 200.0), (30.0, 0.0, 100.0)),
        ])
        .expect("valid edges");
        let result = connectivity_from(&graph, 1).expect("edge exists");
        assert_eq!(result, Connectivity { visited: 2, total: 4 });
        assert!(!result.is_connected());
        assert!(connectivity_from(&graph, 99).is_none());
    }
}
