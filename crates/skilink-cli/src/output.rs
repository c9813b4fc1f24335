use std::fmt::Write as _;
use std::io::{self, Write};

use skilink_lib::PipelineSummary;

/// Render a pipeline summary as plain text.
pub fn render_text(summary: &PipelineSummary) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_summary(&mut out, summary);
    out
}

fn write_summary(out: &mut String, summary: &PipelineSummary) -> std::fmt::Result {
    writeln!(
        out,
        "Pipeline finished, outputs in {}",
        summary.output_folder.display()
    )?;
    writeln!(
        out,
        "Inputs: {} slopes, {} lifts (bus stage {})",
        summary.slopes,
        summary.lifts,
        if summary.bus_stage { "ran" } else { "skipped" }
    )?;
    for stage in &summary.stages {
        writeln!(
            out,
            "- {}: {} candidates, {} links",
            stage.stage, stage.candidates, stage.links
        )?;
    }
    writeln!(
        out,
        "Edges: {} slope, {} bus, {} merged",
        summary.slope_edges, summary.bus_edges, summary.merged_features
    )?;
    writeln!(
        out,
        "Graph: {} nodes, {} edges, {} duplicate node pairs",
        summary.graph_nodes, summary.graph_edges, summary.duplicate_nodes
    )?;
    if let Some(connectivity) = &summary.connectivity {
        writeln!(
            out,
            "Connectivity from {}: {}/{} nodes reached",
            connectivity.origin, connectivity.visited, connectivity.total
        )?;
    }
    for route in &summary.routes {
        if route.r_ids.is_empty() {
            writeln!(
                out,
                "Route {} -> {} (cost mode {}): no route found",
                route.source, route.destination, route.cost_mode
            )?;
        } else {
            let ids: Vec<String> = route.r_ids.iter().map(u64::to_string).collect();
            writeln!(
                out,
                "Route {} -> {} (cost mode {}): {}",
                route.source,
                route.destination,
                route.cost_mode,
                ids.join(", ")
            )?;
        }
    }
    Ok(())
}

/// Render a pipeline summary in JSON format.
///
/// # Errors
///
/// Returns an error if JSON serialization or writing fails.
pub fn render_json(summary: &PipelineSummary) -> io::Result<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer_pretty(&mut stdout, summary).map_err(io::Error::other)?;
    stdout.write_all(b"\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use skilink_lib::pipeline::{ConnectivitySummary, RouteSummary, StageSummary};
    use std::path::PathBuf;

    fn summary() -> PipelineSummary {
        PipelineSummary {
            slopes: 3,
            lifts: 2,
            stages: vec![StageSummary {
                stage: "liftLinks".to_string(),
                candidates: 4,
                links: 1,
            }],
            connectivity: Some(ConnectivitySummary {
                origin: 11001,
                visited: 5,
                total: 6,
                reachable_paths: 5,
            }),
            routes: vec![
                RouteSummary {
                    source: 11001,
                    destination: 200001001,
                    cost_mode: 0,
                    r_ids: vec![11001, 27001],
                },
                RouteSummary {
                    source: 1,
                    destination: 2,
                    cost_mode: 1,
                    r_ids: Vec::new(),
                },
            ],
            output_folder: PathBuf::from("out"),
            ..PipelineSummary::default()
        }
    }

    #[test]
    fn text_lists_stages_and_routes() {
        let text = render_text(&summary());
        assert!(text.contains("Inputs: 3 slopes, 2 lifts (bus stage skipped)"));
        assert!(text.contains("- liftLinks: 4 candidates, 1 links"));
        assert!(text.contains("Connectivity from 11001: 5/6 nodes reached"));
        assert!(text.contains("Route 11001 -> 200001001 (cost mode 0): 11001, 27001"));
        assert!(text.contains("Route 1 -> 2 (cost mode 1): no route found"));
    }
}
