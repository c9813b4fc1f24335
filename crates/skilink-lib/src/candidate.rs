//! Prospective connections ([`Candidate`]) and their validated, graded form
//! ([`Link`]).

use std::fmt;

use serde::Serialize;

use crate::config::Thresholds;
use crate::constants::{BUS_PREFIX, LIFT_PREFIX, SLOPE_PREFIX, THRESHOLD_MARGIN};
use crate::feature::{Coordinate, Feature};
use crate::grading;

/// Quality label of a link. `E` marks a link for deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
}

impl Grade {
    pub fn as_char(self) -> char {
        match self {
            Grade::A => 'A',
            Grade::B => 'B',
            Grade::C => 'C',
            Grade::D => 'D',
            Grade::E => 'E',
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Two oriented points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointPair {
    pub start: Coordinate,
    pub end: Coordinate,
}

impl PointPair {
    pub fn new(start: Coordinate, end: Coordinate) -> Self {
        Self { start, end }
    }

    /// Planar distance between the two points.
    pub fn distance(&self) -> f64 {
        self.start.distance(&self.end)
    }

    /// `end` minus `start` in meters.
    pub fn height_difference(&self) -> f64 {
        self.end.elevation() - self.start.elevation()
    }
}

/// Connection categories that can become a [`Link`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    LiftLink,
    SlopeLift,
    Slope2Slope,
    BusLink,
}

impl LinkKind {
    /// Grade a link of this kind.
    pub fn grade(self, length: f64, height: f64, thresholds: &Thresholds) -> Option<Grade> {
        match self {
            LinkKind::LiftLink => grading::grade_lift_link(length, height, thresholds),
            LinkKind::SlopeLift => grading::grade_slope_lift(length, height, thresholds),
            LinkKind::Slope2Slope => grading::grade_slope_link(length, height, thresholds),
            LinkKind::BusLink => grading::grade_bus_link(length, height, thresholds),
        }
    }

    /// Largest height difference a candidate of this kind may bridge.
    pub fn max_height(self, thresholds: &Thresholds) -> f64 {
        THRESHOLD_MARGIN
            + match self {
                LinkKind::LiftLink => thresholds.lift_heights[0],
                LinkKind::SlopeLift => thresholds.slope_heights[0],
                LinkKind::Slope2Slope => thresholds.slope_heights[5],
                LinkKind::BusLink => thresholds.bus_heights[0],
            }
    }

    /// Prefix digit of r_ids minted for links of this kind.
    pub fn rid_prefix(self) -> char {
        match self {
            LinkKind::LiftLink => LIFT_PREFIX,
            LinkKind::SlopeLift | LinkKind::Slope2Slope => SLOPE_PREFIX,
            LinkKind::BusLink => BUS_PREFIX,
        }
    }
}

/// Tag of a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateKind {
    Link(LinkKind),
    /// Zero-length marker of a slope crossing, used only as a split vertex.
    /// `at_endpoint` is set when both slopes share the point as an end.
    Intersection { at_endpoint: bool },
}

/// An unvalidated prospective connection between two features.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub pair: PointPair,
    pub kind: CandidateKind,
    pub gid_start: String,
    pub gid_end: String,
    pub de_name: String,
    pub max_height: f64,
}

impl Candidate {
    pub fn new(
        kind: LinkKind,
        start: Coordinate,
        end: Coordinate,
        gid_start: impl Into<String>,
        gid_end: impl Into<String>,
        de_name: impl Into<String>,
        thresholds: &Thresholds,
    ) -> Self {
        Self {
            pair: PointPair::new(start, end),
            kind: CandidateKind::Link(kind),
            gid_start: gid_start.into(),
            gid_end: gid_end.into(),
            de_name: de_name.into(),
            max_height: kind.max_height(thresholds),
        }
    }

    /// Zero-length intersection marker between two slopes.
    pub fn intersection(
        at: Coordinate,
        at_endpoint: bool,
        gid_start: impl Into<String>,
        gid_end: impl Into<String>,
        de_name: impl Into<String>,
    ) -> Self {
        Self {
            pair: PointPair::new(at, at),
            kind: CandidateKind::Intersection { at_endpoint },
            gid_start: gid_start.into(),
            gid_end: gid_end.into(),
            de_name: de_name.into(),
            max_height: f64::INFINITY,
        }
    }

    pub fn link_kind(&self) -> Option<LinkKind> {
        match self.kind {
            CandidateKind::Link(kind) => Some(kind),
            CandidateKind::Intersection { .. } => None,
        }
    }

    /// Height check of the candidate. Slope-to-slope candidates compare the
    /// signed height so that only downhill-or-level connections pass; the
    /// others compare the absolute value.
    pub fn is_valid(&self) -> bool {
        let height = self.pair.height_difference();
        match self.kind {
            CandidateKind::Link(LinkKind::Slope2Slope) => height < self.max_height,
            CandidateKind::Link(_) => height.abs() < self.max_height,
            CandidateKind::Intersection { .. } => false,
        }
    }

    /// Promote a valid candidate to a graded link. The r_id is left empty until
    /// the link survives grading.
    pub fn create_link(&self, thresholds: &Thresholds) -> Option<Link> {
        let kind = self.link_kind()?;
        if !self.is_valid() {
            return None;
        }
        let length = self.pair.distance();
        let height = self.pair.height_difference();
        Some(Link {
            pair: self.pair,
            kind,
            gid_start: self.gid_start.clone(),
            gid_end: self.gid_end.clone(),
            de_name: self.de_name.clone(),
            grade: kind.grade(length, height, thresholds),
            r_id: 0,
        })
    }

    /// Two-vertex feature for candidate exports.
    pub fn to_feature(&self) -> Feature {
        Feature::line(vec![self.pair.start, self.pair.end])
            .with("gid_start", self.gid_start.as_str())
            .with("gid_end", self.gid_end.as_str())
            .with("de_name", self.de_name.as_str())
            .with("length", self.pair.distance())
            .with("height", self.pair.height_difference())
    }
}

/// A validated, graded connection retained for the routing graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub pair: PointPair,
    pub kind: LinkKind,
    pub gid_start: String,
    pub gid_end: String,
    pub de_name: String,
    /// `None` when the length/height combination is outside every graded band.
    pub grade: Option<Grade>,
    pub r_id: u64,
}

impl Link {
    pub fn length(&self) -> f64 {
        self.pair.distance()
    }

    pub fn height(&self) -> f64 {
        self.pair.height_difference()
    }

    /// Grade as written to the `rate` attribute; empty when ungraded.
    pub fn rate(&self) -> String {
        self.grade.map(|g| g.to_string()).unwrap_or_default()
    }

    /// Two-vertex feature carrying the link attributes.
    pub fn to_feature(&self) -> Feature {
        Feature::line(vec![self.pair.start, self.pair.end])
            .with("r_id", self.r_id as i64)
            .with("de_name", self.de_name.as_str())
            .with("gid_start", self.gid_start.as_str())
            .with("gid_end", self.gid_end.as_str())
            .with("length", self.length())
            .with("height", self.height())
            .with("rate", self.rate())
    }
}
