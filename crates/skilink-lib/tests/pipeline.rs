mod common;

use std::collections::HashSet;
use std::fs;

use common::{SkiArea, BUS_EDGE, BUS_STOP_LINK, LIFT_EDGE, LIFT_EXIT_LINK, SLOPE_EDGE};
use skilink_lib::constants::R_ID;
use skilink_lib::{read_features, run_pipeline, Error, RouteQuery};

fn route(source: u64, destination: u64, cost_mode: u8) -> RouteQuery {
    RouteQuery {
        source: source.to_string(),
        destination: destination.to_string(),
        cost_mode,
    }
}

#[test]
fn pipeline_without_bus_data_builds_a_connected_graph() {
    let mut area = SkiArea::new(false);
    area.config.connectivity_start = Some(LIFT_EDGE.to_string());
    area.config.routes = vec![route(LIFT_EDGE, SLOPE_EDGE, 0)];

    let summary = run_pipeline(&area.config).expect("pipeline succeeds");

    assert!(!summary.bus_stage);
    assert_eq!(summary.slopes, 1);
    assert_eq!(summary.lifts, 1);
    let stages: Vec<&str> = summary.stages.iter().map(|s| s.stage.as_str()).collect();
    assert_eq!(stages, ["liftLinks", "slopeToLiftLinks", "slopeLinks"]);
    assert_eq!(summary.stages[1].links, 2);

    // slope, lift and two links in both directions
    assert_eq!(summary.graph_nodes, 4);
    assert_eq!(summary.graph_edges, 6);
    assert_eq!(summary.duplicate_nodes, 0);

    let connectivity = summary.connectivity.expect("origin exists");
    assert_eq!((connectivity.visited, connectivity.total), (4, 4));

    assert_eq!(summary.routes[0].r_ids, vec![LIFT_EDGE, LIFT_EXIT_LINK]);
}

#[test]
fn pipeline_writes_every_output_file() {
    let mut area = SkiArea::new(false);
    area.config.output_candidates = true;
    run_pipeline(&area.config).expect("pipeline succeeds");

    for name in [
        "results.txt",
        "merged_pivots.geojson",
        "segments_slopes.geojson",
        "splitSlopes/split_slopes.geojson",
        "candidates/slope_intersections.geojson",
        "candidates/slopeToLiftLinks_candidates.geojson",
        "links/liftLinks.geojson",
        "links/slopeToLiftLinks.geojson",
        "links/slopeLinks.geojson",
    ] {
        assert!(area.output(name).is_file(), "{name} missing");
    }
    assert!(!area.output("segments_buses.geojson").exists());

    let merged = read_features(&area.output("merged_pivots.geojson")).expect("merged output");
    let r_ids: Vec<i64> = merged.iter().filter_map(|f| f.int(R_ID)).collect();
    assert!(r_ids.contains(&(SLOPE_EDGE as i64)));
    assert!(r_ids.contains(&(LIFT_EDGE as i64)));

    let report = fs::read_to_string(area.output("results.txt")).expect("report");
    assert!(report.contains("slopeToLiftLinks processing yielded: 2 candidate links"));
    assert!(report.contains("busLinks skipped"));
}

#[test]
fn pipeline_with_bus_data_routes_from_the_valley() {
    let mut area = SkiArea::new(true);
    area.config.connectivity_start = Some(BUS_EDGE.to_string());
    area.config.routes = vec![route(BUS_EDGE, SLOPE_EDGE, 0)];

    let summary = run_pipeline(&area.config).expect("pipeline succeeds");

    assert!(summary.bus_stage);
    let bus = summary
        .stages
        .iter()
        .find(|s| s.stage == "busLinks")
        .expect("bus stage ran");
    // the stop without elevation contributes nothing
    assert_eq!((bus.candidates, bus.links), (2, 2));
    assert_eq!(summary.bus_edges, 1);
    assert_eq!(summary.graph_nodes, 6);

    let connectivity = summary.connectivity.expect("origin exists");
    assert_eq!(connectivity.visited, connectivity.total);

    assert_eq!(
        summary.routes[0].r_ids,
        vec![BUS_STOP_LINK, LIFT_EDGE, LIFT_EXIT_LINK]
    );
    assert!(area.output("segments_buses.geojson").is_file());

    let merged = read_features(&area.output("merged_pivots.geojson")).expect("merged output");
    let r_ids: Vec<i64> = merged.iter().filter_map(|f| f.int(R_ID)).collect();
    assert_eq!(r_ids.len(), merged.len(), "every merged edge carries an r_id");
    let distinct: HashSet<i64> = r_ids.iter().copied().collect();
    assert_eq!(distinct.len(), r_ids.len(), "duplicate r_ids: {r_ids:?}");
    assert_eq!(merged.len(), summary.merged_features);
}

#[test]
fn missing_lift_data_aborts_the_run() {
    let area = SkiArea::new(false);
    fs::remove_file(area.config.lifts_path()).expect("remove lifts");

    let err = run_pipeline(&area.config).expect_err("lifts are mandatory");
    assert!(matches!(err, Error::MissingInput { kind: "lifts", .. }));
}

#[test]
fn invalid_cost_mode_is_rejected() {
    let mut area = SkiArea::new(false);
    area.config.routes = vec![route(LIFT_EDGE, SLOPE_EDGE, 7)];

    let err = run_pipeline(&area.config).expect_err("cost mode 7 is unknown");
    assert!(matches!(err, Error::UnsupportedCostMode { mode: 7 }));
}
