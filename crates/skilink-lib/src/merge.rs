//! Routing attributes and the merged edge set.
//!
//! Every feature entering the graph is a two-vertex line tagged with an
//! `XML_TYPE` (`slopes`, `lifts`, `buses` or `links`) and the cost attributes
//! the path finder reads.

use tracing::{info, warn};

use crate::candidate::{Link, LinkKind};
use crate::config::QualifyingGrades;
use crate::constants::{DE_GR_L_0, DE_GR_L_1, DIFFICULTY, LIFT_PREFIX, R_ID, XML_GID, XML_TYPE};
use crate::error::Result;
use crate::feature::{Coordinate, Feature};
use crate::geometry::ordered_endpoints;
use crate::rid::RidAllocator;

pub const TYPE_SLOPES: &str = "slopes";
pub const TYPE_LIFTS: &str = "lifts";
pub const TYPE_BUSES: &str = "buses";
pub const TYPE_LINKS: &str = "links";

/// Reverse cost marking a direction that cannot be travelled.
pub const NO_REVERSE: f64 = -1.0;

/// Forward and reverse costs of one edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeCosts {
    pub cost: [f64; 3],
    pub r_cost: [f64; 3],
    pub rev_c: f64,
}

impl EdgeCosts {
    fn symmetric(cost: [f64; 3], rev_c: f64) -> Self {
        Self {
            cost,
            r_cost: cost,
            rev_c,
        }
    }

    /// Slope costs weighted by difficulty (1 blue, 2 red, 3 black).
    pub fn slope(difficulty: i64, length: f64) -> Self {
        let l = length;
        let cost = match difficulty {
            1 => [l, 10.0 * l, 15.0 * l],
            2 => [5.0 * l, l, 5.0 * l],
            3 => [15.0 * l, 10.0 * l, l],
            _ => [l, l, l],
        };
        Self::symmetric(cost, NO_REVERSE)
    }

    pub fn lift(length: f64) -> Self {
        Self::symmetric([15.0 * length; 3], 50.0 * length)
    }

    pub fn bus(length: f64) -> Self {
        Self::symmetric([20.0 * length; 3], 50.0 * length)
    }
}

/// Attributes of a routable edge.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingEdge {
    pub xml_type: String,
    pub de_name: String,
    pub difficulty: i64,
    pub length: f64,
    pub costs: EdgeCosts,
    pub start_z: f64,
    pub end_z: f64,
    pub r_id: u64,
}

impl RoutingEdge {
    /// Two-vertex feature carrying the routing attributes.
    pub fn into_feature(self, start: Coordinate, end: Coordinate) -> Feature {
        let [cost_1, cost_2, cost_3] = self.costs.cost;
        let [r_cost_1, r_cost_2, r_cost_3] = self.costs.r_cost;
        Feature::line(vec![start, end])
            .with(XML_TYPE, self.xml_type)
            .with("de_name", self.de_name)
            .with(DIFFICULTY, self.difficulty)
            .with("source", "0")
            .with("target", "0")
            .with("duration", 0.0)
            .with("length", self.length)
            .with("r_length", self.length)
            .with("rev_c", self.costs.rev_c)
            .with("r_rev_c", self.costs.rev_c)
            .with("cost_1", cost_1)
            .with("cost_2", cost_2)
            .with("cost_3", cost_3)
            .with("r_cost_1", r_cost_1)
            .with("r_cost_2", r_cost_2)
            .with("r_cost_3", r_cost_3)
            .with("open", 0i64)
            .with("start_z", self.start_z)
            .with("end_z", self.end_z)
            .with(R_ID, self.r_id as i64)
    }
}

/// Each lift as one edge from its lower to its upper end.
///
/// A lift with equal end elevations keeps its geometry order. Lift edges keep
/// raw (decimeter) end elevations.
pub fn lifts_to_merge(lifts: &[Feature], rids: &mut RidAllocator) -> Result<Vec<Feature>> {
    let mut edges = Vec::with_capacity(lifts.len());
    for lift in lifts {
        let line = lift.line_coords()?;
        let (Some(first), Some(last)) = (line.first(), line.last()) else {
            warn!(id = %lift.text(XML_GID), "lift has no vertices, skipping");
            continue;
        };
        let (lower, upper) = ordered_endpoints(line).unwrap_or((*first, *last));
        let length = lift.geometry.length();
        let r_id = rids.segment(LIFT_PREFIX, &lift.require_text(XML_GID)?, 1)?;
        let edge = RoutingEdge {
            xml_type: TYPE_LIFTS.to_string(),
            de_name: format!("{}{}", lift.text(DE_GR_L_0), lift.text(DE_GR_L_1)),
            difficulty: 0,
            length,
            costs: EdgeCosts::lift(length),
            start_z: lower.z,
            end_z: upper.z,
            r_id,
        };
        edges.push(edge.into_feature(lower, upper));
    }
    Ok(edges)
}

/// Links with a qualifying grade as routable edges.
///
/// Slope links are assumed to be easy (difficulty 1) and one-way; lift links
/// cost like lifts; bus links become `buses` edges. Each edge keeps the r_id
/// of its link.
pub fn prepare_links_to_merge(links: &[Link], grades: &QualifyingGrades) -> Vec<Feature> {
    let mut edges = Vec::new();
    for link in links {
        if !link.grade.is_some_and(|grade| grades.contains(grade)) {
            continue;
        }
        let length = link.length();
        let (xml_type, difficulty, costs) = match link.kind {
            LinkKind::SlopeLift | LinkKind::Slope2Slope => {
                (TYPE_LINKS, 1, EdgeCosts::slope(1, length))
            }
            LinkKind::LiftLink => (TYPE_LINKS, 0, EdgeCosts::lift(length)),
            LinkKind::BusLink => (TYPE_BUSES, 0, EdgeCosts::bus(length)),
        };
        let edge = RoutingEdge {
            xml_type: xml_type.to_string(),
            de_name: link.de_name.clone(),
            difficulty,
            length,
            costs,
            start_z: link.pair.start.z,
            end_z: link.pair.end.z,
            r_id: link.r_id,
        };
        edges.push(edge.into_feature(link.pair.start, link.pair.end));
    }
    edges
}

/// Edge collections fed into the merge, in merge order.
#[derive(Debug, Default)]
pub struct MergeInputs<'a> {
    pub slopes: &'a [Feature],
    pub lifts: &'a [Feature],
    /// Simplified bus lines and bus links; `None` when the bus stage was
    /// skipped.
    pub buses: Option<(&'a [Feature], &'a [Feature])>,
    pub slope_links: &'a [Feature],
    pub slope_lift_links: &'a [Feature],
    pub lift_links: &'a [Feature],
}

/// Concatenate every edge collection into one feature set.
pub fn merge_features(inputs: &MergeInputs<'_>) -> Vec<Feature> {
    let mut merged = Vec::new();
    merged.extend_from_slice(inputs.slopes);
    merged.extend_from_slice(inputs.lifts);
    if let Some((bus_lines, bus_links)) = inputs.buses {
        merged.extend_from_slice(bus_lines);
        merged.extend_from_slice(bus_links);
    }
    merged.extend_from_slice(inputs.slope_links);
    merged.extend_from_slice(inputs.slope_lift_links);
    merged.extend_from_slice(inputs.lift_links);
    info!(features = merged.len(), "merged routable features");
    merged
}
