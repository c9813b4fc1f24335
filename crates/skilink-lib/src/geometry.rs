//! Point and line primitives used by the matching and simplification stages.
//!
//! Lines are plain vertex slices. Positions along a line are expressed as a
//! *length index*: the planar distance travelled from the first vertex. Every
//! point extracted from a line gets its elevation interpolated linearly between
//! the surrounding vertices.

use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Coord, Line, LineString, Simplify};

use crate::constants::INTERSECTION_SIMPLIFY_TOLERANCE;
use crate::feature::Coordinate;

/// Planar length of a vertex sequence.
pub fn line_length(line: &[Coordinate]) -> f64 {
    line.windows(2).map(|w| w[0].distance(&w[1])).sum()
}

/// Terminal vertices of a line ordered by elevation as `(lower, upper)`.
///
/// Returns `None` when the line has fewer than two vertices or both ends share
/// the same elevation, because the order is then ambiguous.
pub fn ordered_endpoints(line: &[Coordinate]) -> Option<(Coordinate, Coordinate)> {
    let (first, last) = (*line.first()?, *line.last()?);
    if line.len() < 2 || first.z == last.z || first.z.is_nan() || last.z.is_nan() {
        return None;
    }
    if first.z < last.z {
        Some((first, last))
    } else {
        Some((last, first))
    }
}

/// A ring whose first and last vertex coincide, exactly or after flooring.
pub fn is_closed(line: &[Coordinate]) -> bool {
    match (line.first(), line.last()) {
        (Some(first), Some(last)) if line.len() > 1 => {
            first.equals_2d(last)
                || (first.x.floor() == last.x.floor() && first.y.floor() == last.y.floor())
        }
        _ => false,
    }
}

/// Fraction along segment `a`-`b` of the point closest to `p`, clamped to 0..=1.
fn segment_fraction(a: &Coordinate, b: &Coordinate, p: &Coordinate) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return 0.0;
    }
    (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
}

fn point_along(a: &Coordinate, b: &Coordinate, fraction: f64) -> Coordinate {
    Coordinate::new(
        a.x + fraction * (b.x - a.x),
        a.y + fraction * (b.y - a.y),
        a.z + fraction * (b.z - a.z),
    )
}

/// Planar distance from `p` to segment `a`-`b`.
pub fn segment_distance(a: &Coordinate, b: &Coordinate, p: &Coordinate) -> f64 {
    point_along(a, b, segment_fraction(a, b, p)).distance(p)
}

/// Planar distance from a point to a line.
pub fn distance_to_line(point: &Coordinate, line: &[Coordinate]) -> f64 {
    match line {
        [] => f64::INFINITY,
        [only] => only.distance(point),
        _ => line
            .windows(2)
            .map(|w| segment_distance(&w[0], &w[1], point))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Length index of the point on `line` closest to `point`.
///
/// When several segments are equally close the first one wins.
pub fn project_index(line: &[Coordinate], point: &Coordinate) -> f64 {
    let mut best_distance = f64::INFINITY;
    let mut best_index = 0.0;
    let mut travelled = 0.0;
    for w in line.windows(2) {
        let fraction = segment_fraction(&w[0], &w[1], point);
        let distance = point_along(&w[0], &w[1], fraction).distance(point);
        let seg_len = w[0].distance(&w[1]);
        if distance < best_distance {
            best_distance = distance;
            best_index = travelled + fraction * seg_len;
        }
        travelled += seg_len;
    }
    best_index
}

/// Point at a length index, with interpolated elevation. The index is clamped
/// to the line.
pub fn extract_point(line: &[Coordinate], index: f64) -> Option<Coordinate> {
    let first = *line.first()?;
    if index <= 0.0 {
        return Some(first);
    }
    let mut travelled = 0.0;
    for w in line.windows(2) {
        let seg_len = w[0].distance(&w[1]);
        if seg_len > 0.0 && travelled + seg_len >= index {
            return Some(point_along(&w[0], &w[1], (index - travelled) / seg_len));
        }
        travelled += seg_len;
    }
    line.last().copied()
}

/// Sub-line between two length indices, `start <= end`.
pub fn extract_line(line: &[Coordinate], start: f64, end: f64) -> Vec<Coordinate> {
    let (Some(head), Some(tail)) = (extract_point(line, start), extract_point(line, end)) else {
        return Vec::new();
    };
    let mut out = vec![head];
    let mut travelled = 0.0;
    for (i, vertex) in line.iter().enumerate() {
        if i > 0 {
            travelled += line[i - 1].distance(vertex);
        }
        if travelled > start && travelled < end {
            out.push(*vertex);
        }
    }
    out.push(tail);
    out
}

/// Closest point of `line` to `point`, elevation interpolated on the line.
pub fn closest_point(line: &[Coordinate], point: &Coordinate) -> Option<Coordinate> {
    extract_point(line, project_index(line, point))
}

/// Give a point without elevation the elevation of its projection on `line`.
pub fn interpolate_elevation(point: Coordinate, line: &[Coordinate]) -> Coordinate {
    if point.has_elevation() {
        return point;
    }
    match closest_point(line, &point) {
        Some(projected) => Coordinate::new(point.x, point.y, projected.z),
        None => point,
    }
}

/// Project `point` onto the interior of `line`.
///
/// Returns the projected point when `point` is within `max_distance` of the
/// line and the projection does not coincide with either end of the line.
pub fn project_onto_line(
    point: &Coordinate,
    line: &[Coordinate],
    max_distance: f64,
) -> Option<Coordinate> {
    if distance_to_line(point, line) > max_distance {
        return None;
    }
    let projected = closest_point(line, point)?;
    let (first, last) = (line.first()?, line.last()?);
    if projected.equals_2d(first) || projected.equals_2d(last) {
        return None;
    }
    Some(projected)
}

/// Vertex of `candidates` closest to `point`; ties keep the first encountered.
pub fn nearest_vertex(point: &Coordinate, candidates: &[Coordinate]) -> Option<Coordinate> {
    let mut best: Option<(f64, Coordinate)> = None;
    for candidate in candidates {
        let distance = candidate.distance(point);
        if best.map_or(true, |(d, _)| distance < d) {
            best = Some((distance, *candidate));
        }
    }
    best.map(|(_, coord)| coord)
}

/// Closest pair of points between two lines, each with elevation interpolated
/// on its own line.
pub fn nearest_points(a: &[Coordinate], b: &[Coordinate]) -> Option<(Coordinate, Coordinate)> {
    let mut best: Option<(f64, Coordinate, Coordinate)> = None;
    let mut consider = |on_a: Coordinate, on_b: Coordinate| {
        let distance = on_a.distance(&on_b);
        if best.map_or(true, |(d, _, _)| distance < d) {
            best = Some((distance, on_a, on_b));
        }
    };
    for vertex in a {
        consider(*vertex, closest_point(b, vertex)?);
    }
    for vertex in b {
        consider(closest_point(a, vertex)?, *vertex);
    }
    if let Some(hits) = intersection_points_2d(a, b) {
        for hit in hits {
            consider(hit, hit);
        }
    }
    best.map(|(_, on_a, on_b)| {
        let on_a = closest_point(a, &on_a).unwrap_or(on_a);
        let on_b = closest_point(b, &on_b).unwrap_or(on_b);
        (on_a, on_b)
    })
}

fn to_geo(coord: &Coordinate) -> Coord<f64> {
    Coord {
        x: coord.x,
        y: coord.y,
    }
}

/// Planar intersection points of two lines in order of discovery, without
/// elevation.
fn intersection_points_2d(a: &[Coordinate], b: &[Coordinate]) -> Option<Vec<Coordinate>> {
    let mut points: Vec<Coordinate> = Vec::new();
    let mut push = |coord: Coord<f64>| {
        let point = Coordinate::planar(coord.x, coord.y);
        if !points.iter().any(|p| p.equals_2d(&point)) {
            points.push(point);
        }
    };
    for wa in a.windows(2) {
        let line_a = Line::new(to_geo(&wa[0]), to_geo(&wa[1]));
        for wb in b.windows(2) {
            let line_b = Line::new(to_geo(&wb[0]), to_geo(&wb[1]));
            match line_intersection(line_a, line_b) {
                Some(LineIntersection::SinglePoint { intersection, .. }) => push(intersection),
                Some(LineIntersection::Collinear { intersection }) => {
                    push(intersection.start);
                    push(intersection.end);
                }
                None => {}
            }
        }
    }
    (!points.is_empty()).then_some(points)
}

/// Intersection vertices of two lines.
///
/// Returns `None` when the lines do not intersect. A multi-vertex intersection
/// (overlapping stretches or several crossings) is ordered along `a` and
/// simplified with Douglas-Peucker. Every returned vertex carries the elevation
/// interpolated on `a`.
pub fn intersection_vertices(a: &[Coordinate], b: &[Coordinate]) -> Option<Vec<Coordinate>> {
    let mut points = intersection_points_2d(a, b)?;
    if points.len() > 1 {
        points.sort_by(|p, q| project_index(a, p).total_cmp(&project_index(a, q)));
        let path: LineString<f64> = points.iter().map(to_geo).collect();
        points = path
            .simplify(&INTERSECTION_SIMPLIFY_TOLERANCE)
            .0
            .into_iter()
            .map(|c| Coordinate::planar(c.x, c.y))
            .collect();
    }
    Some(
        points
            .into_iter()
            .map(|p| interpolate_elevation(p, a))
            .collect(),
    )
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Envelope {
    pub fn of(coords: &[Coordinate]) -> Self {
        coords.iter().fold(
            Envelope {
                min_x: f64::INFINITY,
                min_y: f64::INFINITY,
                max_x: f64::NEG_INFINITY,
                max_y: f64::NEG_INFINITY,
            },
            |env, c| Envelope {
                min_x: env.min_x.min(c.x),
                min_y: env.min_y.min(c.y),
                max_x: env.max_x.max(c.x),
                max_y: env.max_y.max(c.y),
            },
        )
    }

    pub fn expanded_by(&self, distance: f64) -> Self {
        Envelope {
            min_x: self.min_x - distance,
            min_y: self.min_y - distance,
            max_x: self.max_x + distance,
            max_y: self.max_y + distance,
        }
    }

    pub fn contains(&self, point: &Coordinate) -> bool {
        point.x >= self.min_x && point.x <= self.max_x && point.y >= self.min_y && point.y <= self.max_y
    }

    pub fn centre(&self) -> Coordinate {
        Coordinate::planar(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Half the diagonal: radius of the circle circumscribing the box.
    pub fn radius(&self) -> f64 {
        ((self.max_x - self.min_x).powi(2) + (self.max_y - self.min_y).powi(2)).sqrt() / 2.0
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }
}
