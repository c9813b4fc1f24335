//! Integration tests for the pipeline command.
//!
//! These tests use `assert_cmd` to verify CLI behavior including:
//! - a full run over a small ski area
//! - JSON output format
//! - exit codes when mandatory data is missing

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

const LIFTS: &str = r#"{"type":"FeatureCollection","features":[
  {"type":"Feature","properties":{"XML_GID":"100","DE_GR_L_0":"Testberg","DE_GR_L_1":"Lift"},
   "geometry":{"type":"LineString","coordinates":[[0.0,0.0,10000.0],[0.0,1000.0,15000.0]]}}
]}"#;

const SLOPES: &str = r#"{"type":"FeatureCollection","features":[
  {"type":"Feature","properties":{"XML_GID":"200","XML_TYPE":"slopes","DE_GR_L_0":"Testberg","DE_GR_L_1":"Piste","DE_GR_L_3":"Rot"},
   "geometry":{"type":"LineString","coordinates":[[10.0,1000.0,14990.0],[10.0,500.0,12500.0],[10.0,0.0,10010.0]]}}
]}"#;

/// Temporary folder with input data and a configuration file.
struct TestEnv {
    _temp_dir: TempDir,
    root: PathBuf,
    config: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let root = temp_dir.path().to_path_buf();
        let input = root.join("input");
        fs::create_dir_all(&input).expect("create input dir");
        fs::write(input.join("lifts.geojson"), LIFTS).expect("write lifts");
        fs::write(input.join("slopes.geojson"), SLOPES).expect("write slopes");

        let config = root.join("skilink.toml");
        fs::write(
            &config,
            r#"folder_in = "input"
folder_out = "output"
connectivity_start = "200100001"

[[routes]]
source = "200100001"
destination = "100200002"
cost_mode = 0
"#,
        )
        .expect("write config");

        Self {
            _temp_dir: temp_dir,
            root,
            config,
        }
    }

    fn output(&self, name: &str) -> PathBuf {
        self.root.join("output").join(name)
    }
}

fn cli(config: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("skilink-cli");
    cmd.env("RUST_LOG", "error").arg(config);
    cmd
}

#[test]
fn run_prints_text_summary() {
    let env = TestEnv::new();

    cli(&env.config)
        .assert()
        .success()
        .stdout(contains("Inputs: 1 slopes, 1 lifts (bus stage skipped)"))
        .stdout(contains("- slopeToLiftLinks: 2 candidates, 2 links"))
        .stdout(contains("Connectivity from 200100001: 4/4 nodes reached"))
        .stdout(contains(
            "Route 200100001 -> 100200002 (cost mode 0): 200100001, 100100001",
        ));

    assert!(env.output("merged_pivots.geojson").is_file());
    assert!(env.output("results.txt").is_file());
}

#[test]
fn json_flag_emits_machine_readable_summary() {
    let env = TestEnv::new();

    let output = cli(&env.config)
        .arg("--json")
        .output()
        .expect("run cli");
    assert!(output.status.success());

    let summary: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(summary["graph_nodes"], 4);
    assert_eq!(summary["bus_stage"], false);
    assert_eq!(summary["routes"][0]["r_ids"][1], 100100001);
}

#[test]
fn missing_lifts_fail_with_context() {
    let env = TestEnv::new();
    fs::remove_file(env.root.join("input").join("lifts.geojson")).expect("remove lifts");

    cli(&env.config)
        .assert()
        .failure()
        .stderr(contains("mandatory lifts dataset not found"));
}

#[test]
fn unreadable_config_is_reported() {
    let env = TestEnv::new();
    fs::write(&env.config, "folder_in = [").expect("write broken config");

    cli(&env.config)
        .assert()
        .failure()
        .stderr(contains("failed to load configuration"));
}
