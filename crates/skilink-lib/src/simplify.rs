//! Line simplification: slopes and bus lines are cut at their topology
//! vertices.
//!
//! Each cut produces two outputs. The *split segment* keeps the original
//! geometry between two topology vertices with the original attributes. The
//! *simplified edge* keeps only the two vertices and carries the routing
//! attributes. Both share the same r_id.

use tracing::{debug, info, warn};

use crate::candidate::Link;
use crate::constants::{
    BUS_PREFIX, BUS_SPLIT_TOLERANCE, BUS_STOP_MAX_OFFSET, DB_ID, DE_GR_L_0, DE_GR_L_1,
    DIFFICULTY, ENVELOPE_PADDING, INTERSECTION_ON_LINE_TOLERANCE, LINK_ON_LINE_TOLERANCE, R_ID,
    SLOPE_PREFIX, SLOPE_SPLIT_TOLERANCE, XML_GID, XML_TYPE,
};
use crate::error::Result;
use crate::feature::{Coordinate, Feature};
use crate::geometry::{
    distance_to_line, extract_line, line_length, nearest_points, project_index, Envelope,
};
use crate::merge::{EdgeCosts, RoutingEdge, TYPE_SLOPES};
use crate::rid::RidAllocator;
use crate::spatial::PointIndex;

/// Output of a simplification stage.
#[derive(Debug, Clone, Default)]
pub struct Simplified {
    /// Two-vertex routing edges.
    pub edges: Vec<Feature>,
    /// Original geometry cut at the topology vertices.
    pub segments: Vec<Feature>,
}

/// A topology vertex with its length index on the line being cut.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutVertex {
    pub index: f64,
    pub coord: Coordinate,
}

/// Insert a vertex, replacing the coordinate of an entry at the same index.
fn put_vertex(vertices: &mut Vec<CutVertex>, index: f64, coord: Coordinate) {
    match vertices.iter_mut().find(|v| v.index == index) {
        Some(existing) => existing.coord = coord,
        None => vertices.push(CutVertex { index, coord }),
    }
}

fn contains_coord(vertices: &[CutVertex], coord: &Coordinate) -> bool {
    vertices.iter().any(|v| v.coord.equals_2d(coord))
}

/// Order vertices along the line and drop repeated coordinates.
fn ordered_vertices(mut vertices: Vec<CutVertex>) -> Vec<CutVertex> {
    vertices.sort_by(|a, b| a.index.total_cmp(&b.index));
    let mut out: Vec<CutVertex> = Vec::with_capacity(vertices.len());
    for vertex in vertices {
        if !contains_coord(&out, &vertex.coord) {
            out.push(vertex);
        }
    }
    out
}

/// Cut `line` between consecutive length indices.
///
/// Concatenating the pieces of a line cut at its own ends and any interior
/// indices reproduces the line.
pub fn split_line_at(line: &[Coordinate], indices: &[f64]) -> Vec<Vec<Coordinate>> {
    indices
        .windows(2)
        .map(|w| extract_line(line, w[0], w[1]))
        .collect()
}

/// Attributes shared by every edge cut from one feature.
struct CutTemplate<'a> {
    source: &'a Feature,
    xml_type: String,
    de_name: String,
    difficulty: i64,
    prefix: char,
    id: String,
    tolerance: f64,
    costs: fn(i64, f64) -> EdgeCosts,
}

/// Turn ordered cut vertices into edges and split segments.
fn cut_feature(
    line: &[Coordinate],
    vertices: &[CutVertex],
    template: &CutTemplate<'_>,
    rids: &mut RidAllocator,
    out: &mut Simplified,
) -> Result<()> {
    let mut sequence = 1;
    for pair in vertices.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let length = line_length(&extract_line(line, from.index, to.index));
        if length < template.tolerance {
            continue;
        }
        let r_id = rids.segment(template.prefix, &template.id, sequence)?;
        sequence += 1;

        let edge = RoutingEdge {
            xml_type: template.xml_type.clone(),
            de_name: template.de_name.clone(),
            difficulty: template.difficulty,
            length,
            costs: (template.costs)(template.difficulty, length),
            start_z: from.coord.elevation(),
            end_z: to.coord.elevation(),
            r_id,
        };
        out.edges.push(edge.into_feature(from.coord, to.coord));

        let mut segment = Feature::line(extract_line(line, from.index, to.index));
        segment.attributes = template.source.attributes.clone();
        segment.set(R_ID, r_id as i64);
        segment.set("length", length);
        if template.xml_type == TYPE_SLOPES {
            segment.set(DIFFICULTY, template.difficulty);
        }
        out.segments.push(segment);
    }
    Ok(())
}

/// Cut every slope at the crossings and link ends lying on it.
///
/// `intersections` are the crossing points found by slope matching; `links`
/// are slope, slope-lift and bus links (lift-to-lift links never touch a
/// slope).
pub fn simplify_slopes(
    slopes: &[Feature],
    intersections: &[Feature],
    links: &[&Link],
    rids: &mut RidAllocator,
) -> Result<Simplified> {
    let crossing_index = PointIndex::build(
        intersections
            .iter()
            .filter_map(|f| f.geometry.as_point())
            .map(|p| (p, ())),
    );
    if crossing_index.is_empty() {
        warn!("no intersections loaded while simplifying slopes");
    }
    let link_index = PointIndex::build(
        links
            .iter()
            .enumerate()
            .flat_map(|(i, link)| [(link.pair.start, i), (link.pair.end, i)]),
    );

    let mut out = Simplified::default();
    for slope in slopes {
        let line = slope.line_coords()?;
        let (Some(first), Some(last)) = (line.first(), line.last()) else {
            continue;
        };
        let search = Envelope::of(line).expanded_by(ENVELOPE_PADDING);
        let mut vertices = vec![
            CutVertex {
                index: 0.0,
                coord: *first,
            },
            CutVertex {
                index: line_length(line),
                coord: *last,
            },
        ];

        for crossing in crossing_index.within_envelope(&search) {
            if distance_to_line(&crossing.coord, line) < INTERSECTION_ON_LINE_TOLERANCE {
                let index = project_index(line, &crossing.coord);
                if !vertices.iter().any(|v| v.index == index)
                    && !contains_coord(&vertices, &crossing.coord)
                {
                    vertices.push(CutVertex {
                        index,
                        coord: crossing.coord,
                    });
                }
            }
        }

        let mut seen: Vec<usize> = Vec::new();
        for hit in link_index.within_envelope(&search) {
            if seen.contains(&hit.payload) {
                continue;
            }
            seen.push(hit.payload);
            let link = links[hit.payload];
            let ends = [link.pair.start, link.pair.end];
            let touches = nearest_points(&ends, line)
                .is_some_and(|(a, b)| a.distance(&b) < LINK_ON_LINE_TOLERANCE);
            if !touches {
                continue;
            }
            for end in ends {
                if distance_to_line(&end, line) < LINK_ON_LINE_TOLERANCE
                    && !contains_coord(&vertices, &end)
                {
                    put_vertex(&mut vertices, project_index(line, &end), end);
                    break;
                }
            }
        }

        let vertices = ordered_vertices(vertices);
        let difficulty = slope.int(DIFFICULTY).unwrap_or(1);
        let template = CutTemplate {
            source: slope,
            xml_type: TYPE_SLOPES.to_string(),
            de_name: format!("{} {}", slope.text(DE_GR_L_0), slope.text(DE_GR_L_1)),
            difficulty,
            prefix: SLOPE_PREFIX,
            id: slope.require_text(XML_GID)?,
            tolerance: SLOPE_SPLIT_TOLERANCE,
            costs: EdgeCosts::slope,
        };
        debug!(slope = %template.id, vertices = vertices.len(), "cutting slope");
        cut_feature(line, &vertices, &template, rids, &mut out)?;
    }

    info!(
        edges = out.edges.len(),
        segments = out.segments.len(),
        "simplified slopes"
    );
    Ok(out)
}

/// Cut every bus line at the stops lying within 50 m of it.
///
/// The stop position itself becomes the edge vertex; the line is cut at the
/// stop's projection. Line ends are added unless a stop already sits there.
pub fn simplify_bus_lines(
    bus_lines: &[Feature],
    stops: &[Feature],
    rids: &mut RidAllocator,
) -> Result<Simplified> {
    let stop_index = PointIndex::build(
        stops
            .iter()
            .filter_map(|f| f.geometry.as_point())
            .map(|p| (p, ())),
    );
    if stop_index.is_empty() {
        warn!("no bus stops loaded while simplifying bus lines");
    }

    let mut out = Simplified::default();
    for bus in bus_lines {
        let line = bus.line_coords()?;
        let (Some(first), Some(last)) = (line.first(), line.last()) else {
            continue;
        };
        let end_index = line_length(line);
        let search = Envelope::of(line).expanded_by(ENVELOPE_PADDING);
        let mut vertices: Vec<CutVertex> = Vec::new();
        let (mut has_start, mut has_end) = (false, false);

        for stop in stop_index.within_envelope(&search) {
            if distance_to_line(&stop.coord, line) > BUS_STOP_MAX_OFFSET {
                continue;
            }
            let index = project_index(line, &stop.coord);
            put_vertex(&mut vertices, index, stop.coord);
            if index.trunc() == 0.0 {
                has_start = true;
            } else if index.trunc() == end_index.trunc() {
                has_end = true;
            }
        }
        if !has_start {
            put_vertex(&mut vertices, 0.0, *first);
        }
        if !has_end {
            put_vertex(&mut vertices, end_index, *last);
        }

        let vertices = ordered_vertices(vertices);
        let template = CutTemplate {
            source: bus,
            xml_type: bus.text(XML_TYPE),
            de_name: format!("{} {}", bus.text(DE_GR_L_0), bus.text(DE_GR_L_1)),
            difficulty: 0,
            prefix: BUS_PREFIX,
            id: bus.require_text(DB_ID)?,
            tolerance: BUS_SPLIT_TOLERANCE,
            costs: |_, length| EdgeCosts::bus(length),
        };
        cut_feature(line, &vertices, &template, rids, &mut out)?;
    }

    info!(
        edges = out.edges.len(),
        segments = out.segments.len(),
        "simplified bus lines"
    );
    Ok(out)
}
