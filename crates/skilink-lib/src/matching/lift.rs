//! Lift-to-lift connections.
//!
//! Two lifts are linked when the exit (upper end) of one lies close to the
//! entry (lower end) of the other. The candidate runs from the exit to the
//! entry.

use tracing::{debug, info};

use crate::candidate::{Candidate, LinkKind};
use crate::config::Thresholds;
use crate::constants::{DE_GR_L_1, THRESHOLD_MARGIN};
use crate::error::Result;
use crate::feature::Feature;
use crate::matching::{
    clean_duplicates, endpoints, feature_id, finalize_links, region_name, MatchOutcome,
};
use crate::rid::RidAllocator;

/// Stage label of lift links.
pub const STAGE: &str = "liftLinks";

/// Candidates between every unordered pair of lifts.
pub fn lift_candidates(lifts: &[Feature], thresholds: &Thresholds) -> Result<Vec<Candidate>> {
    let threshold = thresholds.lift_distances[0] + THRESHOLD_MARGIN;
    let ends: Vec<_> = lifts.iter().map(|lift| endpoints(lift, STAGE)).collect();
    let mut candidates = Vec::new();

    for (i, inbound) in lifts.iter().enumerate() {
        let Some((in_lower, in_upper)) = ends[i] else {
            continue;
        };
        let in_id = feature_id(inbound)?;
        let de_name = region_name(inbound, DE_GR_L_1);

        for (j, outbound) in lifts.iter().enumerate().skip(i + 1) {
            let Some((out_lower, out_upper)) = ends[j] else {
                continue;
            };
            let out_id = feature_id(outbound)?;

            if in_lower.distance(&out_upper) < threshold {
                candidates.push(Candidate::new(
                    LinkKind::LiftLink,
                    out_upper,
                    in_lower,
                    out_id,
                    in_id.as_str(),
                    de_name.as_str(),
                    thresholds,
                ));
            } else if in_upper.distance(&out_lower) < threshold {
                candidates.push(Candidate::new(
                    LinkKind::LiftLink,
                    in_upper,
                    out_lower,
                    in_id.as_str(),
                    out_id,
                    de_name.as_str(),
                    thresholds,
                ));
            }
        }
    }

    debug!(count = candidates.len(), "lift candidates before cleaning");
    clean_duplicates(&mut candidates);
    Ok(candidates)
}

/// Find, validate and grade lift-to-lift links.
pub fn match_lifts(
    lifts: &[Feature],
    thresholds: &Thresholds,
    rids: &mut RidAllocator,
) -> Result<MatchOutcome> {
    let candidates = lift_candidates(lifts, thresholds)?;
    let links = finalize_links(&candidates, thresholds, rids)?;
    info!(
        candidates = candidates.len(),
        links = links.len(),
        "lift matching finished"
    );
    Ok(MatchOutcome {
        stage: STAGE,
        candidates,
        links,
    })
}
