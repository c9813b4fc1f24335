//! End-to-end batch run: read, match, simplify, merge, build and query.

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::candidate::Link;
use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::feature::Feature;
use crate::graph::{build_graph, connectivity_from, duplicate_nodes};
use crate::io::{read_features, write_features};
use crate::matching::bus::{match_buses, prepare_bus_stops};
use crate::matching::lift::match_lifts;
use crate::matching::slope::{
    intersection_features, match_slope_lifts, match_slopes, split_multiline_slopes,
};
use crate::matching::MatchOutcome;
use crate::merge::{lifts_to_merge, merge_features, prepare_links_to_merge, MergeInputs};
use crate::path::{reach_all_from_one, shortest_path, CostMode};
use crate::report::ResultLog;
use crate::rid::RidAllocator;
use crate::simplify::{simplify_bus_lines, simplify_slopes};

/// Counts of one matching stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageSummary {
    pub stage: String,
    pub candidates: usize,
    pub links: usize,
}

/// Result of one configured route query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSummary {
    pub source: u64,
    pub destination: u64,
    pub cost_mode: u8,
    /// r_ids of the traversed edges; empty when no route exists.
    pub r_ids: Vec<u64>,
}

/// Traversal counts from the configured connectivity origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConnectivitySummary {
    pub origin: u64,
    pub visited: usize,
    pub total: usize,
    pub reachable_paths: usize,
}

/// Everything a run produced, in counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineSummary {
    pub slopes: usize,
    pub lifts: usize,
    pub bus_stage: bool,
    pub stages: Vec<StageSummary>,
    pub intersections: usize,
    pub slope_edges: usize,
    pub bus_edges: usize,
    pub merged_features: usize,
    pub graph_nodes: usize,
    pub graph_edges: usize,
    pub duplicate_nodes: usize,
    pub connectivity: Option<ConnectivitySummary>,
    pub routes: Vec<RouteSummary>,
    pub output_folder: PathBuf,
}

fn read_mandatory(kind: &'static str, path: &Path) -> Result<Vec<Feature>> {
    if !path.is_file() {
        return Err(Error::MissingInput {
            kind,
            path: path.to_path_buf(),
        });
    }
    read_features(path)
}

fn read_bus_inputs(config: &PipelineConfig) -> Result<Option<(Vec<Feature>, Vec<Feature>)>> {
    let (lines, stops) = (config.bus_lines_path(), config.bus_stops_path());
    if !lines.is_file() || !stops.is_file() {
        warn!(
            lines = %lines.display(),
            stops = %stops.display(),
            "bus data not found, skipping bus stage"
        );
        return Ok(None);
    }
    Ok(Some((read_features(&lines)?, read_features(&stops)?)))
}

fn parse_rid(value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidIdentifier {
            value: value.to_string(),
        })
}

/// Writes the per-stage outputs under the output folder.
struct StageWriter<'a, W: std::io::Write> {
    config: &'a PipelineConfig,
    log: ResultLog<W>,
    summary: Vec<StageSummary>,
}

impl<W: std::io::Write> StageWriter<'_, W> {
    fn record(&mut self, outcome: &MatchOutcome) -> Result<()> {
        self.log.candidates(outcome.stage, &outcome.candidates)?;
        self.log.links(outcome.stage, &outcome.links)?;

        let links: Vec<Feature> = outcome.links.iter().map(Link::to_feature).collect();
        let links_path = self
            .config
            .folder_out
            .join("links")
            .join(format!("{}.geojson", outcome.stage));
        write_features(&links_path, &links)?;

        if self.config.output_candidates {
            let candidates: Vec<Feature> = outcome
                .candidates
                .iter()
                .filter(|c| c.pair.distance() > 0.0)
                .map(|c| c.to_feature())
                .collect();
            let path = self
                .config
                .folder_out
                .join("candidates")
                .join(format!("{}_candidates.geojson", outcome.stage));
            write_features(&path, &candidates)?;
        }

        self.summary.push(StageSummary {
            stage: outcome.stage.to_string(),
            candidates: outcome.candidates.len(),
            links: outcome.links.len(),
        });
        Ok(())
    }
}

/// Run the whole pipeline described by `config`.
///
/// Missing slope or lift data aborts the run; missing bus data only skips the
/// bus stage.
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineSummary> {
    let started = Instant::now();
    let out = &config.folder_out;

    let raw_slopes = read_mandatory("slopes", &config.slopes_path())?;
    let lifts = read_mandatory("lifts", &config.lifts_path())?;
    let bus_inputs = read_bus_inputs(config)?;

    let mut stages = StageWriter {
        config,
        log: ResultLog::create(&config.results_path())?,
        summary: Vec::new(),
    };
    let mut rids = RidAllocator::new();
    let thresholds = &config.thresholds;

    let slopes = split_multiline_slopes(&raw_slopes);
    write_features(&out.join("splitSlopes").join("split_slopes.geojson"), &slopes)?;

    let step = Instant::now();
    let lift_links = match_lifts(&lifts, thresholds, &mut rids)?;
    stages.record(&lift_links)?;
    info!(elapsed_ms = step.elapsed().as_millis() as u64, "lift stage done");

    let step = Instant::now();
    let slope_lift_links = match_slope_lifts(&slopes, &lifts, thresholds, &mut rids)?;
    stages.record(&slope_lift_links)?;
    let slope_links = match_slopes(&slopes, thresholds, &mut rids)?;
    stages.record(&slope_links)?;
    let intersections = intersection_features(&slope_links.candidates);
    write_features(
        &out.join("candidates").join("slope_intersections.geojson"),
        &intersections,
    )?;
    info!(elapsed_ms = step.elapsed().as_millis() as u64, "slope stages done");

    let bus = match bus_inputs {
        Some((bus_lines, stops)) => {
            let step = Instant::now();
            let stops = prepare_bus_stops(stops);
            let outcome = match_buses(&stops, &lifts, &slopes, thresholds, &mut rids)?;
            stages.record(&outcome)?;
            info!(elapsed_ms = step.elapsed().as_millis() as u64, "bus stage done");
            Some((bus_lines, stops, outcome))
        }
        None => {
            stages.log.note("busLinks skipped: bus data not available")?;
            None
        }
    };

    let step = Instant::now();
    let mut topology_links: Vec<&Link> = slope_links
        .links
        .iter()
        .chain(&slope_lift_links.links)
        .collect();
    if let Some((_, _, outcome)) = &bus {
        topology_links.extend(&outcome.links);
    }
    let slope_cut = simplify_slopes(&slopes, &intersections, &topology_links, &mut rids)?;
    write_features(&out.join("segments_slopes.geojson"), &slope_cut.segments)?;

    let bus_cut = match &bus {
        Some((bus_lines, stops, _)) => {
            let cut = simplify_bus_lines(bus_lines, stops, &mut rids)?;
            write_features(&out.join("segments_buses.geojson"), &cut.segments)?;
            Some(cut)
        }
        None => None,
    };
    info!(elapsed_ms = step.elapsed().as_millis() as u64, "simplification done");

    let grades = &config.qualifying_grades;
    let lift_edges = lifts_to_merge(&lifts, &mut rids)?;
    let bus_link_edges = bus
        .as_ref()
        .map(|(_, _, outcome)| prepare_links_to_merge(&outcome.links, grades))
        .unwrap_or_default();
    let slope_link_edges = prepare_links_to_merge(&slope_links.links, grades);
    let slope_lift_edges = prepare_links_to_merge(&slope_lift_links.links, grades);
    let lift_link_edges = prepare_links_to_merge(&lift_links.links, grades);

    let merged = merge_features(&MergeInputs {
        slopes: &slope_cut.edges,
        lifts: &lift_edges,
        buses: bus_cut
            .as_ref()
            .map(|cut| (cut.edges.as_slice(), bus_link_edges.as_slice())),
        slope_links: &slope_link_edges,
        slope_lift_links: &slope_lift_edges,
        lift_links: &lift_link_edges,
    });
    write_features(&out.join("merged_pivots.geojson"), &merged)?;

    let graph = build_graph(&merged)?;
    let duplicates = duplicate_nodes(&graph);

    let connectivity = match config.connectivity_start.as_deref() {
        Some(origin) => {
            let origin = parse_rid(origin)?;
            match connectivity_from(&graph, origin) {
                Some(result) => Some(ConnectivitySummary {
                    origin,
                    visited: result.visited,
                    total: result.total,
                    reachable_paths: reach_all_from_one(&graph, origin).len(),
                }),
                None => {
                    warn!(origin, "connectivity origin not found in graph");
                    None
                }
            }
        }
        None => None,
    };

    let mut routes = Vec::with_capacity(config.routes.len());
    for query in &config.routes {
        let source = parse_rid(&query.source)?;
        let destination = parse_rid(&query.destination)?;
        let mode = CostMode::try_from(query.cost_mode)?;
        let r_ids = shortest_path(&graph, source, destination, mode);
        info!(source, destination, route = ?r_ids, "route query");
        routes.push(RouteSummary {
            source,
            destination,
            cost_mode: query.cost_mode,
            r_ids,
        });
    }

    stages.log.flush()?;
    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        output = %out.display(),
        "pipeline finished"
    );

    Ok(PipelineSummary {
        slopes: slopes.len(),
        lifts: lifts.len(),
        bus_stage: bus.is_some(),
        stages: stages.summary,
        intersections: intersections.len(),
        slope_edges: slope_cut.edges.len(),
        bus_edges: bus_cut.map(|cut| cut.edges.len()).unwrap_or(0),
        merged_features: merged.len(),
        graph_nodes: graph.node_count(),
        graph_edges: graph.edge_count(),
        duplicate_nodes: duplicates.len(),
        connectivity,
        routes,
        output_folder: out.clone(),
    })
}
