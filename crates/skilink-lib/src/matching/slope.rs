//! Slope preparation and the two slope matching stages.
//!
//! * [`split_multiline_slopes`] turns raw slope features into single-part
//!   lines with a numeric difficulty.
//! * [`match_slope_lifts`] connects slope ends (or interior points) to lift
//!   ends.
//! * [`match_slopes`] connects slopes with each other and records the crossing
//!   points later used as split vertices.

use tracing::{debug, info, warn};

use crate::candidate::{Candidate, CandidateKind, LinkKind};
use crate::config::Thresholds;
use crate::constants::{
    DE_GR_L_0, DE_GR_L_1, DE_GR_L_3, DIFFICULTY, SLOPE_LIFT_MIN_ENDPOINT_CLEARANCE,
    THRESHOLD_MARGIN, XML_GID, XML_TYPE,
};
use crate::error::Result;
use crate::feature::{clean_duplicate_features, Coordinate, Feature, Geometry};
use crate::geometry::{
    intersection_vertices, is_closed, nearest_points, nearest_vertex, project_onto_line,
};
use crate::matching::{
    clean_duplicates, clean_redundant, endpoints, feature_id, finalize_links, region_name,
    MatchOutcome,
};
use crate::rid::RidAllocator;

/// Stage label of slope-to-lift links.
pub const SLOPE_LIFT_STAGE: &str = "slopeToLiftLinks";
/// Stage label of slope-to-slope links.
pub const SLOPE_STAGE: &str = "slopeLinks";

/// Numeric difficulty from the colour classification of a slope.
pub fn difficulty_from_class(class: &str) -> i64 {
    if class.contains("Blau") {
        1
    } else if class.contains("Rot") {
        2
    } else if class.contains("Schwarz") {
        3
    } else {
        1
    }
}

/// Split multi-part slopes into one feature per part.
///
/// Parts keep the identifying attributes and get a numeric `difficulty`.
/// Closed parts are dropped, as are parts whose geometry repeats an earlier
/// one exactly.
pub fn split_multiline_slopes(slopes: &[Feature]) -> Vec<Feature> {
    let mut parts = Vec::new();
    for slope in slopes {
        let lines: Vec<&Vec<Coordinate>> = match &slope.geometry {
            Geometry::MultiLineString(lines) => lines.iter().collect(),
            Geometry::LineString(line) => vec![line],
            other => {
                warn!(
                    id = %slope.text(XML_GID),
                    geometry = other.kind(),
                    "slope is not a line, skipping"
                );
                continue;
            }
        };
        let difficulty = difficulty_from_class(&slope.text(DE_GR_L_3));

        for line in lines {
            if line.len() < 2 {
                warn!(id = %slope.text(XML_GID), "slope part has fewer than two vertices, skipping");
                continue;
            }
            if is_closed(line) {
                warn!(id = %slope.text(XML_GID), "slope part is a closed ring, skipping");
                continue;
            }
            let mut part = Feature::line(line.clone()).with(DIFFICULTY, difficulty);
            for key in [XML_TYPE, DE_GR_L_0, DE_GR_L_1, XML_GID] {
                if let Some(value) = slope.get(key) {
                    part.set(key, value.clone());
                }
            }
            parts.push(part);
        }
    }
    let removed = clean_duplicate_features(&mut parts, "slope");
    info!(parts = parts.len(), removed, "split slopes into single parts");
    parts
}

/// Interior point of `slope` closest to a lift end, at least 100 m away from
/// both slope ends.
fn slope_interior_neighbour(
    lift_end: &Coordinate,
    slope: &[Coordinate],
    ends: (Coordinate, Coordinate),
    max_distance: f64,
) -> Option<Coordinate> {
    let closest = project_onto_line(lift_end, slope, max_distance)?;
    (closest.distance(&ends.0) > SLOPE_LIFT_MIN_ENDPOINT_CLEARANCE
        && closest.distance(&ends.1) > SLOPE_LIFT_MIN_ENDPOINT_CLEARANCE)
        .then_some(closest)
}

/// Slope-to-lift candidates for every lift and slope combination.
///
/// Skiers leave a slope at its lower end (or an interior point) towards a lift
/// entry, and arrive at a slope from a lift exit.
pub fn slope_lift_candidates(
    slopes: &[Feature],
    lifts: &[Feature],
    thresholds: &Thresholds,
) -> Result<Vec<Candidate>> {
    let threshold = thresholds.slope_distances[0] + THRESHOLD_MARGIN;
    let mid_threshold = thresholds.slope_midpoint_dist[0] + THRESHOLD_MARGIN;
    let slope_ends: Vec<_> = slopes
        .iter()
        .map(|slope| endpoints(slope, SLOPE_LIFT_STAGE))
        .collect();
    let mut candidates = Vec::new();

    for lift in lifts {
        let Some((lift_lower, lift_upper)) = endpoints(lift, SLOPE_LIFT_STAGE) else {
            continue;
        };
        let lift_id = feature_id(lift)?;
        let (mut has_lower, mut has_upper) = (false, false);

        for (slope, ends) in slopes.iter().zip(&slope_ends) {
            let Some((slope_lower, slope_upper)) = *ends else {
                continue;
            };
            let line = slope.line_coords()?;
            let slope_id = feature_id(slope)?;
            let de_name = region_name(slope, DE_GR_L_1);

            if slope_lower.distance(&lift_lower) < threshold {
                candidates.push(Candidate::new(
                    LinkKind::SlopeLift,
                    slope_lower,
                    lift_lower,
                    slope_id.as_str(),
                    lift_id.as_str(),
                    de_name.as_str(),
                    thresholds,
                ));
                has_lower = true;
            } else if let Some(closest) =
                slope_interior_neighbour(&lift_lower, line, (slope_lower, slope_upper), mid_threshold)
            {
                candidates.push(Candidate::new(
                    LinkKind::SlopeLift,
                    closest,
                    lift_lower,
                    slope_id.as_str(),
                    lift_id.as_str(),
                    de_name.as_str(),
                    thresholds,
                ));
                has_lower = true;
            }

            if slope_upper.distance(&lift_upper) < threshold {
                candidates.push(Candidate::new(
                    LinkKind::SlopeLift,
                    lift_upper,
                    slope_upper,
                    lift_id.as_str(),
                    slope_id.as_str(),
                    de_name.as_str(),
                    thresholds,
                ));
                has_upper = true;
            } else if let Some(closest) =
                slope_interior_neighbour(&lift_upper, line, (slope_lower, slope_upper), mid_threshold)
            {
                candidates.push(Candidate::new(
                    LinkKind::SlopeLift,
                    lift_upper,
                    closest,
                    lift_id.as_str(),
                    slope_id.as_str(),
                    de_name.as_str(),
                    thresholds,
                ));
                has_upper = true;
            }
        }

        if !has_lower {
            warn!(lift = %lift_id, "lift has no slope connection at its lower end");
        }
        if !has_upper {
            warn!(lift = %lift_id, "lift has no slope connection at its upper end");
        }
    }

    debug!(count = candidates.len(), "slope-lift candidates before cleaning");
    clean_duplicates(&mut candidates);
    clean_redundant(&mut candidates);
    Ok(candidates)
}

/// Find, validate and grade slope-to-lift links.
pub fn match_slope_lifts(
    slopes: &[Feature],
    lifts: &[Feature],
    thresholds: &Thresholds,
    rids: &mut RidAllocator,
) -> Result<MatchOutcome> {
    let candidates = slope_lift_candidates(slopes, lifts, thresholds)?;
    let links = finalize_links(&candidates, thresholds, rids)?;
    info!(
        candidates = candidates.len(),
        links = links.len(),
        "slope-lift matching finished"
    );
    Ok(MatchOutcome {
        stage: SLOPE_LIFT_STAGE,
        candidates,
        links,
    })
}

/// One slope of a pair under examination.
struct SlopeSide<'a> {
    id: &'a str,
    line: &'a [Coordinate],
    lower: Coordinate,
    upper: Coordinate,
}

/// Distance thresholds of slope-to-slope matching.
struct SlopeThresholds<'a> {
    endpoint: f64,
    midpoint: f64,
    limits: &'a Thresholds,
}

fn remove_first_equal(points: &mut Vec<Coordinate>, target: &Coordinate) {
    if let Some(position) = points.iter().position(|p| p.equals_2d(target)) {
        points.remove(position);
    }
}

/// Best connection from end `a` of slope `own` towards end `b` of slope
/// `other`.
///
/// Precedence: a shared end, then a crossing near `a`, then an interior point
/// of `other` near `a`, then the plain end-to-end distance. Consumed crossings
/// are removed from `intersections`. For an upper end the candidate runs from
/// `other` into `own`; for a lower end it runs from `own` into `other`.
#[allow(clippy::too_many_arguments)]
fn endpoint_candidate(
    a: Coordinate,
    b: Coordinate,
    own: &SlopeSide<'_>,
    other: &SlopeSide<'_>,
    intersections: &mut Vec<Coordinate>,
    upper: bool,
    de_name: &str,
    t: &SlopeThresholds<'_>,
) -> Option<Candidate> {
    let mid = project_onto_line(&a, other.line, t.midpoint);
    let closest = nearest_vertex(&a, intersections);

    let (from, to, kind) = if a.distance(&b) < t.endpoint {
        if a.equals_3d(&b) {
            remove_first_equal(intersections, &a);
            (b, a, CandidateKind::Intersection { at_endpoint: true })
        } else if let Some(hit) = closest.filter(|hit| hit.distance(&a) < t.endpoint) {
            remove_first_equal(intersections, &hit);
            (hit, hit, CandidateKind::Intersection { at_endpoint: false })
        } else if let Some(mid) = mid {
            (mid, a, CandidateKind::Link(LinkKind::Slope2Slope))
        } else {
            (b, a, CandidateKind::Link(LinkKind::Slope2Slope))
        }
    } else {
        let mid = mid?;
        if closest.is_some_and(|hit| hit.distance(&a) < t.endpoint) {
            return None;
        }
        (mid, a, CandidateKind::Link(LinkKind::Slope2Slope))
    };

    let (start, end, gid_start, gid_end) = if upper {
        (from, to, other.id, own.id)
    } else {
        (to, from, own.id, other.id)
    };
    Some(match kind {
        CandidateKind::Link(link) => {
            Candidate::new(link, start, end, gid_start, gid_end, de_name, t.limits)
        }
        CandidateKind::Intersection { at_endpoint } => {
            Candidate::intersection(start, at_endpoint, gid_start, gid_end, de_name)
        }
    })
}

/// Candidates between one pair of slopes, `inbound` being the earlier one.
fn slope_pair_candidates(
    inbound: &SlopeSide<'_>,
    outbound: &SlopeSide<'_>,
    de_name: &str,
    t: &SlopeThresholds<'_>,
) -> Vec<Candidate> {
    let mut intersections = intersection_vertices(inbound.line, outbound.line);
    let crossed = intersections.is_some();
    let mut found = Vec::new();

    if let Some(points) = intersections.as_mut() {
        for (own, other) in [
            (inbound.lower, outbound.lower),
            (inbound.upper, outbound.upper),
        ] {
            if own.equals_2d(&other) {
                remove_first_equal(points, &own);
            }
        }
    }
    let mut points = intersections.unwrap_or_default();

    let checks = [
        (inbound.upper, outbound.lower, inbound, outbound, true),
        (inbound.lower, outbound.upper, inbound, outbound, false),
        (outbound.upper, inbound.lower, outbound, inbound, true),
        (outbound.lower, inbound.upper, outbound, inbound, false),
    ];
    for (a, b, own, other, upper) in checks {
        if let Some(candidate) =
            endpoint_candidate(a, b, own, other, &mut points, upper, de_name, t)
        {
            found.push(candidate);
        }
    }

    if found.is_empty() && !crossed {
        if let Some((on_in, on_out)) = nearest_points(inbound.line, outbound.line) {
            if on_in.distance(&on_out) <= t.midpoint {
                let candidate = if on_in.z > on_out.z {
                    Candidate::new(
                        LinkKind::Slope2Slope,
                        on_in,
                        on_out,
                        inbound.id,
                        outbound.id,
                        de_name,
                        t.limits,
                    )
                } else {
                    Candidate::new(
                        LinkKind::Slope2Slope,
                        on_out,
                        on_in,
                        outbound.id,
                        inbound.id,
                        de_name,
                        t.limits,
                    )
                };
                found.push(candidate);
            }
        }
    }

    for point in points {
        found.push(Candidate::intersection(
            point,
            false,
            inbound.id,
            outbound.id,
            de_name,
        ));
    }
    found
}

/// Slope-to-slope candidates and crossing markers for every unordered pair of
/// slopes.
pub fn slope_candidates(slopes: &[Feature], thresholds: &Thresholds) -> Result<Vec<Candidate>> {
    let t = SlopeThresholds {
        endpoint: thresholds.slope_endpoint_dist + THRESHOLD_MARGIN,
        midpoint: thresholds.slope_midpoint_dist[1] + THRESHOLD_MARGIN,
        limits: thresholds,
    };

    let mut ids = Vec::with_capacity(slopes.len());
    for slope in slopes {
        ids.push(feature_id(slope)?);
    }
    let mut sides = Vec::with_capacity(slopes.len());
    for (slope, id) in slopes.iter().zip(&ids) {
        let side = match endpoints(slope, SLOPE_STAGE) {
            Some((lower, upper)) => Some(SlopeSide {
                id: id.as_str(),
                line: slope.line_coords()?,
                lower,
                upper,
            }),
            None => None,
        };
        sides.push(side);
    }

    let mut candidates = Vec::new();
    for (i, inbound) in sides.iter().enumerate() {
        let Some(inbound) = inbound else {
            continue;
        };
        let de_name = region_name(&slopes[i], DE_GR_L_1);
        for outbound in sides.iter().skip(i + 1).flatten() {
            candidates.extend(slope_pair_candidates(inbound, outbound, &de_name, &t));
        }
    }

    debug!(count = candidates.len(), "slope candidates before cleaning");
    clean_duplicates(&mut candidates);
    Ok(candidates)
}

/// Find, validate and grade slope-to-slope links.
pub fn match_slopes(
    slopes: &[Feature],
    thresholds: &Thresholds,
    rids: &mut RidAllocator,
) -> Result<MatchOutcome> {
    let candidates = slope_candidates(slopes, thresholds)?;
    let links = finalize_links(&candidates, thresholds, rids)?;
    info!(
        candidates = candidates.len(),
        links = links.len(),
        "slope matching finished"
    );
    Ok(MatchOutcome {
        stage: SLOPE_STAGE,
        candidates,
        links,
    })
}

/// Point features of every slope candidate that is not a slope-to-slope link:
/// crossings and shared ends.
pub fn intersection_features(candidates: &[Candidate]) -> Vec<Feature> {
    candidates
        .iter()
        .filter(|c| c.link_kind() != Some(LinkKind::Slope2Slope))
        .map(|c| {
            Feature::point(c.pair.start)
                .with("gid_start", c.gid_start.as_str())
                .with("gid_end", c.gid_end.as_str())
                .with("de_name", c.de_name.as_str())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slope(id: &str, coords: &[(f64, f64, f64)]) -> Feature {
        Feature::line(
            coords
                .iter()
                .map(|&(x, y, z)| Coordinate::new(x, y, z))
                .collect(),
        )
        .with(XML_GID, id)
        .with(DE_GR_L_0, "Region")
        .with(DE_GR_L_1, "Area")
    }

    #[test]
    fn difficulty_follows_colour() {
        assert_eq!(difficulty_from_class("Piste Blau"), 1);
        assert_eq!(difficulty_from_class("Rot"), 2);
        assert_eq!(difficulty_from_class("Schwarz (steil)"), 3);
        assert_eq!(difficulty_from_class("Gelb"), 1);
    }

    #[test]
    fn split_drops_closed_parts() {
        let multi = Feature::new(Geometry::MultiLineString(vec![
            vec![Coordinate::new(0.0, 0.0, 10.0), Coordinate::new(10.0, 0.0, 0.0)],
            vec![
                Coordinate::new(0.0, 0.0, 10.0),
                Coordinate::new(5.0, 5.0, 5.0),
                Coordinate::new(0.2, 0.3, 10.0),
            ],
        ]))
        .with(XML_GID, "5")
        .with(DE_GR_L_3, "Rot");
        let parts = split_multiline_slopes(&[multi]);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].int(DIFFICULTY), Some(2));
        assert_eq!(parts[0].text(XML_GID), "5");
    }

    #[test]
    fn crossing_slopes_produce_intersection_marker() {
        let a = slope("1", &[(0.0, 0.0, 2000.0), (100.0, 0.0, 1000.0)]);
        let b = slope("2", &[(50.0, -50.0, 1800.0), (50.0, 50.0, 1200.0)]);
        let candidates = slope_candidates(&[a, b], &Thresholds::default()).expect("ids");
        assert_eq!(candidates.len(), 1);
        assert_eq!(
            candidates[0].kind,
            CandidateKind::Intersection { at_endpoint: false }
        );
        assert!(candidates[0].pair.start.equals_2d(&Coordinate::new(50.0, 0.0, 0.0)));
        assert_eq!(intersection_features(&candidates).len(), 1);
    }

    #[test]
    fn slope_end_near_next_slope_start_links_downhill() {
        let upper = slope("1", &[(0.0, 0.0, 2000.0), (100.0, 0.0, 1500.0)]);
        let lower = slope("2", &[(105.0, 0.0, 1490.0), (300.0, 0.0, 1000.0)]);
        let candidates = slope_candidates(&[upper, lower], &Thresholds::default()).expect("ids");
        let links: Vec<_> = candidates
            .iter()
            .filter(|c| c.link_kind() == Some(LinkKind::Slope2Slope))
            .collect();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].gid_start, "1");
        assert_eq!(links[0].gid_end, "2");
        assert_eq!(links[0].pair.start.x, 100.0);
        assert_eq!(links[0].pair.end.x, 105.0);
    }
}
