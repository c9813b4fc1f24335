//! Rule tables that grade a link by its planar length and height difference.
//!
//! Every table is a pure function of `(length, height, thresholds)`. A result
//! of `Some(Grade::E)` marks the link for deletion; `None` means the
//! combination falls outside every graded band, so the link is kept in the link
//! report but never qualifies for the routing graph.

use crate::candidate::Grade;
use crate::config::Thresholds;

/// Lift exit to lift entry. `height` is signed.
pub fn grade_lift_link(length: f64, height: f64, t: &Thresholds) -> Option<Grade> {
    let (d, h) = (&t.lift_distances, &t.lift_heights);
    if length < d[2] {
        if height <= h[1] {
            Some(Grade::A)
        } else if height <= h[0] {
            Some(Grade::B)
        } else {
            None
        }
    } else if length < d[1] {
        Some(if height <= h[3] {
            Grade::B
        } else if height <= h[2] {
            Grade::C
        } else {
            Grade::E
        })
    } else if length <= d[0] {
        Some(if height <= h[3] {
            Grade::B
        } else if height <= h[2] {
            Grade::D
        } else {
            Grade::E
        })
    } else {
        None
    }
}

/// Slope end to lift end, in either direction. `height` is signed.
pub fn grade_slope_lift(length: f64, height: f64, t: &Thresholds) -> Option<Grade> {
    let (d, h) = (&t.slope_distances, &t.slope_heights);
    if length < d[3] {
        Some(if height <= h[3] {
            Grade::A
        } else if height <= h[2] {
            Grade::B
        } else {
            Grade::C
        })
    } else if length < d[2] {
        Some(if height <= h[4] {
            Grade::A
        } else if height <= h[3] {
            Grade::B
        } else if height <= h[1] {
            Grade::D
        } else {
            Grade::E
        })
    } else if length < d[1] {
        Some(if height <= h[5] {
            Grade::B
        } else if height <= h[4] {
            Grade::C
        } else if height <= h[1] {
            Grade::D
        } else {
            Grade::E
        })
    } else if length <= d[0] {
        Some(if height <= h[5] {
            Grade::C
        } else if height <= h[4] {
            Grade::D
        } else {
            Grade::E
        })
    } else {
        None
    }
}

/// Signed height below which a slope-to-slope connection climbs too steeply
/// against the direction of travel.
const SLOPE_LINK_DROP_LIMIT: f64 = -15.0;

/// Signed height up to which a slope-to-slope connection counts as level.
const SLOPE_LINK_LEVEL_LIMIT: f64 = 1.0;

/// Slope to slope. `height` is signed (end minus start).
pub fn grade_slope_link(length: f64, height: f64, t: &Thresholds) -> Option<Grade> {
    let band = if length < t.slope_midpoint_dist[1] {
        (Grade::A, Grade::B)
    } else if length <= t.slope_endpoint_dist {
        (Grade::B, Grade::C)
    } else {
        return None;
    };
    Some(if height <= SLOPE_LINK_DROP_LIMIT {
        Grade::E
    } else if height <= SLOPE_LINK_LEVEL_LIMIT {
        band.0
    } else {
        band.1
    })
}

/// Bus stop to lift or slope. Both length and height are floored and the
/// height is taken as absolute.
pub fn grade_bus_link(length: f64, height: f64, t: &Thresholds) -> Option<Grade> {
    let (d, h) = (&t.bus_distances, &t.bus_heights);
    let length = length.floor();
    let height = height.abs().floor();
    let grades = if length <= d[2] {
        [Grade::A, Grade::B, Grade::B]
    } else if length <= d[1] {
        [Grade::A, Grade::B, Grade::C]
    } else if length <= d[0] {
        [Grade::B, Grade::D, Grade::D]
    } else {
        return None;
    };
    if height <= h[2] {
        Some(grades[0])
    } else if height <= h[1] {
        Some(grades[1])
    } else if height <= h[0] {
        Some(grades[2])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lift_short_bands_never_delete() {
        let t = Thresholds::default();
        assert_eq!(grade_lift_link(30.0, 10.0, &t), Some(Grade::A));
        assert_eq!(grade_lift_link(90.0, 20.0, &t), Some(Grade::B));
        assert_eq!(grade_lift_link(90.0, 40.0, &t), None);
    }

    #[test]
    fn lift_long_bands_delete_steep_links() {
        let t = Thresholds::default();
        assert_eq!(grade_lift_link(120.0, 0.5, &t), Some(Grade::B));
        assert_eq!(grade_lift_link(120.0, 4.0, &t), Some(Grade::C));
        assert_eq!(grade_lift_link(180.0, 4.0, &t), Some(Grade::D));
        assert_eq!(grade_lift_link(180.0, 6.0, &t), Some(Grade::E));
        assert_eq!(grade_lift_link(200.2, 0.0, &t), None);
    }

    #[test]
    fn slope_lift_bands() {
        let t = Thresholds::default();
        assert_eq!(grade_slope_lift(30.0, 22.0, &t), Some(Grade::C));
        assert_eq!(grade_slope_lift(70.0, 12.0, &t), Some(Grade::B));
        assert_eq!(grade_slope_lift(70.0, 26.0, &t), Some(Grade::E));
        assert_eq!(grade_slope_lift(90.0, 3.0, &t), Some(Grade::B));
        assert_eq!(grade_slope_lift(110.0, 8.0, &t), Some(Grade::D));
        assert_eq!(grade_slope_lift(110.0, 11.0, &t), Some(Grade::E));
    }

    #[test]
    fn slope_link_uses_signed_height() {
        let t = Thresholds::default();
        assert_eq!(grade_slope_link(5.0, -20.0, &t), Some(Grade::E));
        assert_eq!(grade_slope_link(5.0, -3.0, &t), Some(Grade::A));
        assert_eq!(grade_slope_link(5.0, 3.0, &t), Some(Grade::B));
        assert_eq!(grade_slope_link(15.0, 0.0, &t), Some(Grade::B));
        assert_eq!(grade_slope_link(15.0, 3.0, &t), Some(Grade::C));
        assert_eq!(grade_slope_link(25.0, 0.0, &t), None);
    }

    #[test]
    fn bus_grade_escalates_with_distance() {
        let t = Thresholds::default();
        assert_eq!(grade_bus_link(80.0, -9.0, &t), Some(Grade::A));
        assert_eq!(grade_bus_link(150.0, 18.0, &t), Some(Grade::C));
        assert_eq!(grade_bus_link(300.0, 12.0, &t), Some(Grade::D));
        assert_eq!(grade_bus_link(350.9, 5.0, &t), Some(Grade::B));
        assert_eq!(grade_bus_link(400.0, 5.0, &t), None);
    }

    #[test]
    fn lift_bounds_are_pinned() {
        let t = Thresholds::default();
        assert_eq!(grade_lift_link(94.99, 10.0, &t), Some(Grade::A));
        assert_eq!(grade_lift_link(94.99, 35.0, &t), Some(Grade::B));
        assert_eq!(grade_lift_link(94.99, 35.01, &t), None);
        assert_eq!(grade_lift_link(95.0, 1.0, &t), Some(Grade::B));
        assert_eq!(grade_lift_link(95.0, 5.0, &t), Some(Grade::C));
        assert_eq!(grade_lift_link(95.0, 5.01, &t), Some(Grade::E));
        assert_eq!(grade_lift_link(160.0, 5.0, &t), Some(Grade::D));
        assert_eq!(grade_lift_link(200.0, 1.0, &t), Some(Grade::B));
        assert_eq!(grade_lift_link(200.01, 1.0, &t), None);
    }

    #[test]
    fn slope_lift_bounds_are_pinned() {
        let t = Thresholds::default();
        assert_eq!(grade_slope_lift(59.99, 15.0, &t), Some(Grade::A));
        assert_eq!(grade_slope_lift(60.0, 15.0, &t), Some(Grade::B));
        assert_eq!(grade_slope_lift(60.0, 10.0, &t), Some(Grade::A));
        assert_eq!(grade_slope_lift(80.0, 5.0, &t), Some(Grade::B));
        assert_eq!(grade_slope_lift(80.0, 10.0, &t), Some(Grade::C));
        assert_eq!(grade_slope_lift(100.0, 5.0, &t), Some(Grade::C));
        assert_eq!(grade_slope_lift(120.0, 10.0, &t), Some(Grade::D));
        assert_eq!(grade_slope_lift(120.01, 0.0, &t), None);
    }

    #[test]
    fn slope_link_bounds_are_pinned() {
        let t = Thresholds::default();
        assert_eq!(grade_slope_link(9.99, 1.0, &t), Some(Grade::A));
        assert_eq!(grade_slope_link(10.0, 1.0, &t), Some(Grade::B));
        assert_eq!(grade_slope_link(20.0, 1.01, &t), Some(Grade::C));
        assert_eq!(grade_slope_link(20.01, 0.0, &t), None);
        assert_eq!(grade_slope_link(5.0, -15.0, &t), Some(Grade::E));
        assert_eq!(grade_slope_link(5.0, -14.99, &t), Some(Grade::A));
    }

    #[test]
    fn bus_bounds_are_pinned_after_flooring() {
        let t = Thresholds::default();
        assert_eq!(grade_bus_link(100.9, 10.9, &t), Some(Grade::A));
        assert_eq!(grade_bus_link(101.0, 11.0, &t), Some(Grade::B));
        assert_eq!(grade_bus_link(200.0, 16.0, &t), Some(Grade::C));
        assert_eq!(grade_bus_link(201.0, 20.0, &t), Some(Grade::D));
        assert_eq!(grade_bus_link(350.0, -20.9, &t), Some(Grade::D));
        assert_eq!(grade_bus_link(350.0, 21.0, &t), None);
        assert_eq!(grade_bus_link(351.0, 0.0, &t), None);
    }

    /// Lengths from 0 up to and past the outermost bound in 0.1 m steps.
    fn lengths(limit: f64) -> impl Iterator<Item = f64> {
        (0..=((limit + 1.0) * 10.0) as u32).map(|tenth| f64::from(tenth) / 10.0)
    }

    /// Heights from -40 to 60 in 0.5 m steps.
    fn heights() -> impl Iterator<Item = f64> {
        (-80..=120).map(|half| f64::from(half) / 2.0)
    }

    #[test]
    fn bands_leave_no_gaps_inside_the_graded_range() {
        let t = Thresholds::default();
        for length in lengths(t.lift_distances[0]) {
            for height in heights() {
                let graded = grade_lift_link(length, height, &t).is_some();
                let in_range = length <= t.lift_distances[0]
                    && (length >= t.lift_distances[2] || height <= t.lift_heights[0]);
                assert_eq!(graded, in_range, "lift link {length} m / {height} m");
            }
        }
        for length in lengths(t.slope_distances[0]) {
            for height in heights() {
                let graded = grade_slope_lift(length, height, &t).is_some();
                assert_eq!(
                    graded,
                    length <= t.slope_distances[0],
                    "slope lift {length} m / {height} m"
                );
            }
        }
        for length in lengths(t.slope_endpoint_dist) {
            for height in heights() {
                let graded = grade_slope_link(length, height, &t).is_some();
                assert_eq!(
                    graded,
                    length <= t.slope_endpoint_dist,
                    "slope link {length} m / {height} m"
                );
            }
        }
        for length in lengths(t.bus_distances[0]) {
            for height in heights() {
                let graded = grade_bus_link(length, height, &t).is_some();
                let in_range = length.floor() <= t.bus_distances[0]
                    && height.abs().floor() <= t.bus_heights[0];
                assert_eq!(graded, in_range, "bus link {length} m / {height} m");
            }
        }
    }
}
