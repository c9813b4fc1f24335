//! Common test utilities and fixture helpers.
//!
//! Builds a small ski area (one lift, one slope, an optional bus line) in a
//! temporary input folder and the configuration pointing at it.

use std::path::PathBuf;

use skilink_lib::constants::{
    DB_ID, DE_GR_L_0, DE_GR_L_1, DE_GR_L_3, DE_NAME, PT_ID, XML_GID, XML_TYPE,
};
use skilink_lib::{write_features, Coordinate, Feature, PipelineConfig};
use tempfile::TempDir;

/// r_id of the lift edge in [`SkiArea`].
#[allow(dead_code)]
pub const LIFT_EDGE: u64 = 200100001;
/// r_id of the slope edge in [`SkiArea`]; the link from the slope end took
/// `100200001` first.
#[allow(dead_code)]
pub const SLOPE_EDGE: u64 = 100200002;
/// r_id of the link from the lift exit to the slope start.
#[allow(dead_code)]
pub const LIFT_EXIT_LINK: u64 = 100100001;
/// r_id of the bus line edge in [`SkiArea`].
#[allow(dead_code)]
pub const BUS_EDGE: u64 = 300007001;
/// r_id of the link from the valley bus stop to the lift entry.
#[allow(dead_code)]
pub const BUS_STOP_LINK: u64 = 300008001;

pub fn c(x: f64, y: f64, z: f64) -> Coordinate {
    Coordinate::new(x, y, z)
}

pub fn lift(gid: &str, lower: Coordinate, upper: Coordinate) -> Feature {
    Feature::line(vec![lower, upper])
        .with(XML_GID, gid)
        .with(XML_TYPE, "lifts")
        .with(DE_GR_L_0, "Testberg")
        .with(DE_GR_L_1, format!("Lift {gid}"))
}

pub fn slope(gid: &str, class: &str, coords: Vec<Coordinate>) -> Feature {
    Feature::line(coords)
        .with(XML_GID, gid)
        .with(XML_TYPE, "slopes")
        .with(DE_GR_L_0, "Testberg")
        .with(DE_GR_L_1, format!("Piste {gid}"))
        .with(DE_GR_L_3, class)
}

#[allow(dead_code)]
pub fn bus_stop(id: &str, at: Coordinate) -> Feature {
    Feature::point(at)
        .with(PT_ID, id)
        .with(DE_GR_L_0, "Testberg")
        .with(DE_NAME, format!("Stop {id}"))
}

#[allow(dead_code)]
pub fn bus_line(id: &str, coords: Vec<Coordinate>) -> Feature {
    Feature::line(coords)
        .with(DB_ID, id)
        .with(XML_TYPE, "buses")
        .with(DE_GR_L_0, "Testberg")
        .with(DE_GR_L_1, format!("Bus {id}"))
}

/// A lift from (0,0) up to (0,1000) with a red slope running back down 10 m
/// to the east of it.
#[allow(dead_code)]
pub fn area_lifts() -> Vec<Feature> {
    vec![lift("100", c(0.0, 0.0, 10_000.0), c(0.0, 1000.0, 15_000.0))]
}

#[allow(dead_code)]
pub fn area_slopes() -> Vec<Feature> {
    vec![slope(
        "200",
        "Piste Rot",
        vec![
            c(10.0, 1000.0, 14_990.0),
            c(10.0, 500.0, 12_500.0),
            c(10.0, 0.0, 10_010.0),
        ],
    )]
}

/// A valley bus stop 50 m below the lift entry, plus a stop without elevation
/// next to the lift exit.
#[allow(dead_code)]
pub fn area_stops() -> Vec<Feature> {
    vec![
        bus_stop("8", c(0.0, -50.0, 10_000.0)),
        bus_stop("9", c(0.0, 1050.0, 0.0)),
    ]
}

#[allow(dead_code)]
pub fn area_bus_lines() -> Vec<Feature> {
    vec![bus_line(
        "7",
        vec![c(0.0, -50.0, 10_000.0), c(0.0, -500.0, 9_000.0)],
    )]
}

/// Temporary input and output folders holding the ski area.
#[allow(dead_code)]
pub struct SkiArea {
    _temp_dir: TempDir,
    pub config: PipelineConfig,
}

#[allow(dead_code)]
impl SkiArea {
    /// Write the lift and slope files; bus files are only written when
    /// `with_bus` is set.
    pub fn new(with_bus: bool) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let config = PipelineConfig {
            folder_in: temp_dir.path().join("input"),
            folder_out: temp_dir.path().join("output"),
            ..PipelineConfig::default()
        };

        write_features(&config.slopes_path(), &area_slopes()).expect("write slopes");
        write_features(&config.lifts_path(), &area_lifts()).expect("write lifts");
        if with_bus {
            write_features(&config.bus_lines_path(), &area_bus_lines()).expect("write bus lines");
            write_features(&config.bus_stops_path(), &area_stops()).expect("write bus stops");
        }

        Self {
            _temp_dir: temp_dir,
            config,
        }
    }

    pub fn output(&self, name: &str) -> PathBuf {
        self.config.folder_out.join(name)
    }
}
