//! Ski-area link inference library entry points.
//!
//! This crate reads slope, lift and bus line geometry, infers the walking
//! links that connect them, grades those links, cuts the lines into routable
//! edges, and builds a directed graph for shortest-path queries. Front ends
//! (the CLI) should only depend on the functions exported here instead of
//! reimplementing behavior.
//!

#![deny(warnings)]

pub mod candidate;
pub mod config;
pub mod constants;
pub mod error;
pub mod feature;
pub mod geometry;
pub mod grading;
pub mod graph;
pub mod io;
pub mod matching;
pub mod merge;
pub mod path;
pub mod pipeline;
pub mod report;
pub mod rid;
pub mod simplify;
pub mod spatial;

pub use candidate::{Candidate, CandidateKind, Grade, Link, LinkKind, PointPair};
pub use config::{PipelineConfig, QualifyingGrades, RouteQuery, Thresholds};
pub use error::{Error, Result};
pub use feature::{AttrValue, Coordinate, Feature, Geometry};
pub use graph::{build_graph, connectivity_from, duplicate_nodes, Connectivity, Graph};
pub use io::{read_features, write_features};
pub use matching::MatchOutcome;
pub use path::{reach_all_from_one, shortest_path, CostMode};
pub use pipeline::{run_pipeline, PipelineSummary, RouteSummary, StageSummary};
pub use rid::RidAllocator;
