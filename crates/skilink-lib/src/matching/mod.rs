//! Candidate search, reduction and link finalization.
//!
//! Each engine (lift, slope, bus) walks feature pairs, emits [`Candidate`]s
//! using its own topological rules and hands them to [`finalize_links`], which
//! validates, grades and numbers the surviving links.

pub mod bus;
pub mod lift;
pub mod slope;

use tracing::{debug, warn};

use crate::candidate::{Candidate, Link};
use crate::config::Thresholds;
use crate::constants::{DE_GR_L_0, XML_GID};
use crate::error::Result;
use crate::feature::{Coordinate, Feature};
use crate::geometry::ordered_endpoints;
use crate::rid::RidAllocator;

/// Candidates and links produced by one matching stage.
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    /// Stage label used in reports and output file names.
    pub stage: &'static str,
    pub candidates: Vec<Candidate>,
    pub links: Vec<Link>,
}

/// Feature identifier (`XML_GID`).
pub(crate) fn feature_id(feature: &Feature) -> Result<String> {
    feature.require_text(XML_GID)
}

/// `"<region> - <value of key>"`.
pub(crate) fn region_name(feature: &Feature, key: &str) -> String {
    format!("{} - {}", feature.text(DE_GR_L_0), feature.text(key))
}

/// Lower and upper end of a line feature, or `None` with a warning when the
/// line is flat or not a single line.
pub(crate) fn endpoints(feature: &Feature, stage: &str) -> Option<(Coordinate, Coordinate)> {
    let ends = feature.geometry.as_line().and_then(ordered_endpoints);
    if ends.is_none() {
        warn!(
            stage,
            id = %feature.text(XML_GID),
            "feature has no distinct lower and upper end, skipping"
        );
    }
    ends
}

/// Remove candidates repeating the start and end features and the start and
/// end points (in 2D) of an earlier one.
pub fn clean_duplicates(candidates: &mut Vec<Candidate>) {
    let before = candidates.len();
    let mut kept: Vec<Candidate> = Vec::with_capacity(before);
    for candidate in candidates.drain(..) {
        let duplicate = kept.iter().any(|other| {
            other.gid_start == candidate.gid_start
                && other.gid_end == candidate.gid_end
                && other.pair.start.equals_2d(&candidate.pair.start)
                && other.pair.end.equals_2d(&candidate.pair.end)
        });
        if !duplicate {
            kept.push(candidate);
        }
    }
    *candidates = kept;
    debug!(before, after = candidates.len(), "cleaned duplicate candidates");
}

/// Height above which the longer of two redundant candidates is kept.
const REDUNDANT_MIN_HEIGHT: f64 = 15.0;
/// Length difference above which the longer of two redundant candidates may be
/// kept.
const REDUNDANT_MIN_LENGTH_DIFF: f64 = 30.0;
/// Required distance between the longer candidate's end and the other's start.
const REDUNDANT_MIN_SPREAD: f64 = 60.0;

/// Reduce candidates that connect the same pair of features.
///
/// Within each (start feature, end feature) group candidates are compared in
/// order. The longer one survives when its height reaches 15 m, or when the
/// lengths differ by at least 30 m and its end lies at least 60 m from the
/// other's start. Otherwise both are dropped.
pub fn clean_redundant(candidates: &mut Vec<Candidate>) {
    let before = candidates.len();
    let mut removed = vec![false; candidates.len()];
    for i in 0..candidates.len() {
        if removed[i] {
            continue;
        }
        let mut current = i;
        for j in (i + 1)..candidates.len() {
            if removed[j]
                || candidates[j].gid_start != candidates[current].gid_start
                || candidates[j].gid_end != candidates[current].gid_end
            {
                continue;
            }
            let (a, b) = (&candidates[current], &candidates[j]);
            let length_diff = a.pair.distance() - b.pair.distance();
            let (longer, other) = if length_diff > 0.0 { (current, j) } else { (j, current) };
            let keep_longer = candidates[longer].pair.height_difference().abs()
                >= REDUNDANT_MIN_HEIGHT
                || (length_diff.abs() >= REDUNDANT_MIN_LENGTH_DIFF
                    && candidates[longer].pair.end.distance(&candidates[other].pair.start)
                        >= REDUNDANT_MIN_SPREAD);
            removed[other] = true;
            if keep_longer {
                current = longer;
            } else {
                removed[longer] = true;
                break;
            }
        }
    }
    let mut index = 0;
    candidates.retain(|_| {
        let keep = !removed[index];
        index += 1;
        keep
    });
    debug!(before, after = candidates.len(), "cleaned redundant candidates");
}

/// Promote candidates to links, drop those graded `E` and number the rest.
pub fn finalize_links(
    candidates: &[Candidate],
    thresholds: &Thresholds,
    rids: &mut RidAllocator,
) -> Result<Vec<Link>> {
    let mut links = Vec::new();
    for candidate in candidates {
        let Some(mut link) = candidate.create_link(thresholds) else {
            continue;
        };
        if link.grade == Some(crate::candidate::Grade::E) {
            continue;
        }
        link.r_id = rids.link(link.kind.rid_prefix(), &link.gid_start)?;
        links.push(link);
    }
    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::LinkKind;

    fn cand(start: (f64, f64, f64), end: (f64, f64, f64), ids: (&str, &str)) -> Candidate {
        Candidate::new(
            LinkKind::SlopeLift,
            Coordinate::new(start.0, start.1, start.2),
            Coordinate::new(end.0, end.1, end.2),
            ids.0,
            ids.1,
            "",
            &Thresholds::default(),
        )
    }

    #[test]
    fn duplicates_are_removed_idempotently() {
        let mut candidates = vec![
            cand((0.0, 0.0, 0.0), (10.0, 0.0, 0.0), ("1", "2")),
            cand((0.0, 0.0, 5.0), (10.0, 0.0, 9.0), ("1", "2")),
            cand((0.0, 0.0, 0.0), (10.0, 0.0, 0.0), ("1", "3")),
        ];
        clean_duplicates(&mut candidates);
        assert_eq!(candidates.len(), 2);
        let once = candidates.clone();
        clean_duplicates(&mut candidates);
        assert_eq!(candidates, once);
    }

    #[test]
    fn redundant_pair_keeps_longer_when_it_spreads() {
        let mut candidates = vec![
            cand((0.0, 0.0, 1000.0), (10.0, 0.0, 1000.0), ("1", "2")),
            cand((100.0, 0.0, 1000.0), (200.0, 0.0, 1000.0), ("1", "2")),
        ];
        clean_redundant(&mut candidates);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].pair.start.x, 100.0);
    }

    #[test]
    fn redundant_pair_of_similar_candidates_is_dropped() {
        let mut candidates = vec![
            cand((0.0, 0.0, 1000.0), (10.0, 0.0, 1000.0), ("1", "2")),
            cand((0.0, 5.0, 1000.0), (12.0, 5.0, 1000.0), ("1", "2")),
            cand((0.0, 0.0, 1000.0), (10.0, 0.0, 1000.0), ("1", "3")),
        ];
        clean_redundant(&mut candidates);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].gid_end, "3");
    }

    #[test]
    fn finalize_drops_grade_e_and_numbers_links() {
        let t = Thresholds::default();
        let candidates = vec![
            Candidate::new(
                LinkKind::LiftLink,
                Coordinate::new(0.0, 0.0, 1000.0),
                Coordinate::new(180.0, 0.0, 1100.0),
                "7",
                "8",
                "",
                &t,
            ),
            Candidate::new(
                LinkKind::LiftLink,
                Coordinate::new(0.0, 0.0, 1000.0),
                Coordinate::new(20.0, 0.0, 1010.0),
                "7",
                "9",
                "",
                &t,
            ),
        ];
        let mut rids = RidAllocator::new();
        let links = finalize_links(&candidates, &t, &mut rids).expect("numeric ids");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].gid_end, "9");
        assert_eq!(links[0].r_id, 27001);
    }
}
