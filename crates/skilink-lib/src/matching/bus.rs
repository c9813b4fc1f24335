//! Bus stop connections to lifts and slopes.

use tracing::{debug, info, warn};

use crate::candidate::{Candidate, LinkKind};
use crate::config::Thresholds;
use crate::constants::{DE_NAME, PT_ID, THRESHOLD_MARGIN};
use crate::error::Result;
use crate::feature::{clean_duplicate_features, Feature};
use crate::matching::{
    clean_duplicates, endpoints, feature_id, finalize_links, region_name, MatchOutcome,
};
use crate::rid::RidAllocator;

/// Stage label of bus links.
pub const STAGE: &str = "busLinks";

/// Remove bus stops that repeat an earlier stop's position.
pub fn prepare_bus_stops(mut stops: Vec<Feature>) -> Vec<Feature> {
    let removed = clean_duplicate_features(&mut stops, "bus stop");
    if removed > 0 {
        info!(removed, remaining = stops.len(), "removed duplicate bus stops");
    }
    stops
}

/// Candidates between every bus stop with a known elevation and the ends of
/// every lift and slope.
///
/// Stops feed lift entries and slope starts, and collect from lift exits and
/// slope ends.
pub fn bus_candidates(
    stops: &[Feature],
    lifts: &[Feature],
    slopes: &[Feature],
    thresholds: &Thresholds,
) -> Result<Vec<Candidate>> {
    let threshold = thresholds.bus_distances[0] + THRESHOLD_MARGIN;
    let lift_ends: Vec<_> = lifts.iter().map(|lift| endpoints(lift, STAGE)).collect();
    let slope_ends: Vec<_> = slopes.iter().map(|slope| endpoints(slope, STAGE)).collect();
    let mut candidates = Vec::new();

    for stop in stops {
        let Some(at) = stop.geometry.as_point() else {
            warn!(id = %stop.text(PT_ID), "bus stop is not a point, skipping");
            continue;
        };
        if at.z == 0.0 || !at.has_elevation() {
            debug!(id = %stop.text(PT_ID), "bus stop has no elevation, skipping");
            continue;
        }
        let stop_id = stop.require_text(PT_ID)?;
        let de_name = region_name(stop, DE_NAME);

        for (lift, ends) in lifts.iter().zip(&lift_ends) {
            let Some((lower, upper)) = *ends else {
                continue;
            };
            let lift_id = feature_id(lift)?;
            if at.distance(&lower) < threshold {
                candidates.push(Candidate::new(
                    LinkKind::BusLink,
                    at,
                    lower,
                    stop_id.as_str(),
                    lift_id,
                    de_name.as_str(),
                    thresholds,
                ));
            } else if at.distance(&upper) < threshold {
                candidates.push(Candidate::new(
                    LinkKind::BusLink,
                    upper,
                    at,
                    lift_id,
                    stop_id.as_str(),
                    de_name.as_str(),
                    thresholds,
                ));
            }
        }

        for (slope, ends) in slopes.iter().zip(&slope_ends) {
            let Some((lower, upper)) = *ends else {
                continue;
            };
            let slope_id = feature_id(slope)?;
            if lower.distance(&at) < threshold {
                candidates.push(Candidate::new(
                    LinkKind::BusLink,
                    lower,
                    at,
                    slope_id,
                    stop_id.as_str(),
                    de_name.as_str(),
                    thresholds,
                ));
            } else if at.distance(&upper) < threshold {
                candidates.push(Candidate::new(
                    LinkKind::BusLink,
                    at,
                    upper,
                    stop_id.as_str(),
                    slope_id,
                    de_name.as_str(),
                    thresholds,
                ));
            }
        }
    }

    debug!(count = candidates.len(), "bus candidates before cleaning");
    clean_duplicates(&mut candidates);
    Ok(candidates)
}

/// Find, validate and grade bus links.
pub fn match_buses(
    stops: &[Feature],
    lifts: &[Feature],
    slopes: &[Feature],
    thresholds: &Thresholds,
    rids: &mut RidAllocator,
) -> Result<MatchOutcome> {
    let candidates = bus_candidates(stops, lifts, slopes, thresholds)?;
    let links = finalize_links(&candidates, thresholds, rids)?;
    info!(
        candidates = candidates.len(),
        links = links.len(),
        "bus matching finished"
    );
    Ok(MatchOutcome {
        stage: STAGE,
        candidates,
        links,
    })
}
