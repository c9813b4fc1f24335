//! Pipeline configuration.
//!
//! The configuration is read from an optional TOML file. Every key is
//! optional; threshold arrays that are absent or have the wrong length fall
//! back to their defaults with a warning so a half-written file never aborts a
//! run.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::candidate::Grade;
use crate::error::{Error, Result};

pub const DEFAULT_LIFT_DISTANCES: [f64; 4] = [200.0, 160.0, 95.0, 50.0];
pub const DEFAULT_LIFT_HEIGHTS: [f64; 4] = [35.0, 10.0, 5.0, 1.0];
pub const DEFAULT_SLOPE_DISTANCES: [f64; 5] = [120.0, 100.0, 80.0, 60.0, 40.0];
pub const DEFAULT_SLOPE_HEIGHTS: [f64; 6] = [30.0, 25.0, 20.0, 15.0, 10.0, 5.0];
pub const DEFAULT_BUS_DISTANCES: [f64; 3] = [350.0, 200.0, 100.0];
pub const DEFAULT_BUS_HEIGHTS: [f64; 3] = [20.0, 15.0, 10.0];
pub const DEFAULT_SLOPE_ENDPOINT_DIST: f64 = 20.0;
pub const DEFAULT_SLOPE_MIDPOINT_DIST: [f64; 2] = [60.0, 10.0];
pub const DEFAULT_LINK_GRADES: &str = "ABCD";

/// File layout as written in the TOML file. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RawConfig {
    pub folder_in: Option<PathBuf>,
    pub folder_out: Option<PathBuf>,
    pub file_in_slopes: Option<String>,
    pub file_in_lifts: Option<String>,
    pub file_in_bus: Option<String>,
    pub file_in_stops: Option<String>,
    pub results_file: Option<String>,
    pub output_candidates: Option<bool>,
    pub lifts_dist: Option<Vec<f64>>,
    pub lifts_height_dif: Option<Vec<f64>>,
    pub slopes_dist: Option<Vec<f64>>,
    pub slopes_height_dif: Option<Vec<f64>>,
    pub bus_dist: Option<Vec<f64>>,
    pub bus_height_dif: Option<Vec<f64>>,
    pub slopes_endpoint: Option<f64>,
    pub slopes_midpoint: Option<Vec<f64>>,
    pub link_grades: Option<String>,
    pub connectivity_start: Option<String>,
    pub routes: Vec<RouteQuery>,
}

/// A shortest-path query evaluated once the graph is built.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RouteQuery {
    /// r_id of the edge whose start node is the origin.
    pub source: String,
    /// r_id of the edge whose start node is the destination.
    pub destination: String,
    /// Cost attribute selector, see [`crate::path::CostMode`].
    #[serde(default)]
    pub cost_mode: u8,
}

/// Distance and height thresholds driving candidate search and grading.
///
/// Distance arrays are ordered from the widest band to the narrowest; height
/// arrays from the most to the least tolerant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub lift_distances: [f64; 4],
    pub lift_heights: [f64; 4],
    pub slope_distances: [f64; 5],
    pub slope_heights: [f64; 6],
    pub bus_distances: [f64; 3],
    pub bus_heights: [f64; 3],
    pub slope_endpoint_dist: f64,
    pub slope_midpoint_dist: [f64; 2],
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            lift_distances: DEFAULT_LIFT_DISTANCES,
            lift_heights: DEFAULT_LIFT_HEIGHTS,
            slope_distances: DEFAULT_SLOPE_DISTANCES,
            slope_heights: DEFAULT_SLOPE_HEIGHTS,
            bus_distances: DEFAULT_BUS_DISTANCES,
            bus_heights: DEFAULT_BUS_HEIGHTS,
            slope_endpoint_dist: DEFAULT_SLOPE_ENDPOINT_DIST,
            slope_midpoint_dist: DEFAULT_SLOPE_MIDPOINT_DIST,
        }
    }
}

/// Grades a link must carry to be merged into the routing graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifyingGrades(String);

impl QualifyingGrades {
    /// Validate a grade string, resetting it to `"ABCD"` when it names none of
    /// the grades A to D or is longer than four characters.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim().to_ascii_uppercase();
        let names_a_grade = trimmed.chars().any(|c| matches!(c, 'A'..='D'));
        if !names_a_grade || trimmed.chars().count() > 4 {
            warn!(
                link_grades = value,
                fallback = DEFAULT_LINK_GRADES,
                "invalid link grade setting, using fallback"
            );
            return Self::default();
        }
        Self(trimmed)
    }

    pub fn contains(&self, grade: Grade) -> bool {
        grade != Grade::E && self.0.contains(grade.as_char())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for QualifyingGrades {
    fn default() -> Self {
        Self(DEFAULT_LINK_GRADES.to_string())
    }
}

/// Validated configuration passed by reference into every stage.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub folder_in: PathBuf,
    pub folder_out: PathBuf,
    pub file_in_slopes: String,
    pub file_in_lifts: String,
    pub file_in_bus: String,
    pub file_in_stops: String,
    pub results_file: String,
    pub output_candidates: bool,
    pub thresholds: Thresholds,
    pub qualifying_grades: QualifyingGrades,
    pub connectivity_start: Option<String>,
    pub routes: Vec<RouteQuery>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            folder_in: PathBuf::from("input"),
            folder_out: PathBuf::from("output"),
            file_in_slopes: "slopes.geojson".to_string(),
            file_in_lifts: "lifts.geojson".to_string(),
            file_in_bus: "bus_lines.geojson".to_string(),
            file_in_stops: "bus_stops.geojson".to_string(),
            results_file: "results.txt".to_string(),
            output_candidates: false,
            thresholds: Thresholds::default(),
            qualifying_grades: QualifyingGrades::default(),
            connectivity_start: None,
            routes: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// Load a TOML configuration file.
    ///
    /// Relative folders are resolved against the directory holding the file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let raw: RawConfig = toml::from_str(&text).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        debug!(path = %path.display(), "loaded configuration file");
        Ok(Self::from_raw(raw, Some(base)))
    }

    /// Validate a raw configuration, applying fallbacks where needed.
    pub fn from_raw(raw: RawConfig, base: Option<&Path>) -> Self {
        let defaults = Self::default();
        let resolve = |folder: Option<PathBuf>, fallback: PathBuf| {
            let folder = folder.unwrap_or(fallback);
            match base {
                Some(base) if folder.is_relative() => base.join(folder),
                _ => folder,
            }
        };

        let slope_endpoint_dist = match raw.slopes_endpoint {
            Some(value) if value > 0.0 => value,
            Some(_) => {
                warn!(
                    fallback = DEFAULT_SLOPE_ENDPOINT_DIST,
                    "slopes_endpoint unset, using fallback"
                );
                DEFAULT_SLOPE_ENDPOINT_DIST
            }
            None => DEFAULT_SLOPE_ENDPOINT_DIST,
        };

        let thresholds = Thresholds {
            lift_distances: fixed_array("lifts_dist", raw.lifts_dist, DEFAULT_LIFT_DISTANCES, false),
            lift_heights: fixed_array(
                "lifts_height_dif",
                raw.lifts_height_dif,
                DEFAULT_LIFT_HEIGHTS,
                false,
            ),
            slope_distances: fixed_array(
                "slopes_dist",
                raw.slopes_dist,
                DEFAULT_SLOPE_DISTANCES,
                true,
            ),
            slope_heights: fixed_array(
                "slopes_height_dif",
                raw.slopes_height_dif,
                DEFAULT_SLOPE_HEIGHTS,
                false,
            ),
            bus_distances: fixed_array("bus_dist", raw.bus_dist, DEFAULT_BUS_DISTANCES, true),
            bus_heights: fixed_array(
                "bus_height_dif",
                raw.bus_height_dif,
                DEFAULT_BUS_HEIGHTS,
                false,
            ),
            slope_endpoint_dist,
            slope_midpoint_dist: fixed_array(
                "slopes_midpoint",
                raw.slopes_midpoint,
                DEFAULT_SLOPE_MIDPOINT_DIST,
                false,
            ),
        };

        Self {
            folder_in: resolve(raw.folder_in, defaults.folder_in),
            folder_out: resolve(raw.folder_out, defaults.folder_out),
            file_in_slopes: raw.file_in_slopes.unwrap_or(defaults.file_in_slopes),
            file_in_lifts: raw.file_in_lifts.unwrap_or(defaults.file_in_lifts),
            file_in_bus: raw.file_in_bus.unwrap_or(defaults.file_in_bus),
            file_in_stops: raw.file_in_stops.unwrap_or(defaults.file_in_stops),
            results_file: raw.results_file.unwrap_or(defaults.results_file),
            output_candidates: raw.output_candidates.unwrap_or(false),
            thresholds,
            qualifying_grades: raw
                .link_grades
                .as_deref()
                .map(QualifyingGrades::parse)
                .unwrap_or_default(),
            connectivity_start: raw.connectivity_start.filter(|id| !id.trim().is_empty()),
            routes: raw.routes,
        }
    }

    pub fn slopes_path(&self) -> PathBuf {
        self.folder_in.join(&self.file_in_slopes)
    }

    pub fn lifts_path(&self) -> PathBuf {
        self.folder_in.join(&self.file_in_lifts)
    }

    pub fn bus_lines_path(&self) -> PathBuf {
        self.folder_in.join(&self.file_in_bus)
    }

    pub fn bus_stops_path(&self) -> PathBuf {
        self.folder_in.join(&self.file_in_stops)
    }

    pub fn results_path(&self) -> PathBuf {
        self.folder_out.join(&self.results_file)
    }
}

/// Copy a configured array into a fixed-size one.
///
/// With `at_least` set, longer arrays are accepted and truncated.
fn fixed_array<const N: usize>(
    key: &str,
    value: Option<Vec<f64>>,
    fallback: [f64; N],
    at_least: bool,
) -> [f64; N] {
    let Some(values) = value else {
        return fallback;
    };
    let accepted = values.len() == N || (at_least && values.len() > N);
    if !accepted || values.iter().any(|v| !v.is_finite()) {
        warn!(
            key,
            expected = N,
            found = values.len(),
            ?fallback,
            "threshold array has the wrong shape, using fallback"
        );
        return fallback;
    }
    let mut out = fallback;
    out.copy_from_slice(&values[..N]);
    out
}
