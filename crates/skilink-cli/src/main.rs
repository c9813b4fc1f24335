use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use skilink_cli::output::{render_json, render_text};
use skilink_lib::{run_pipeline, PipelineConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Ski-area link inference and routing")]
struct Cli {
    /// TOML configuration file; built-in defaults are used when omitted.
    config: Option<PathBuf>,

    /// Override the input folder.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Override the output folder.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print the run summary as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(input) = cli.input {
        config.folder_in = input;
    }
    if let Some(output) = cli.output {
        config.folder_out = output;
    }

    let summary = run_pipeline(&config).with_context(|| {
        format!(
            "pipeline failed for input folder {}",
            config.folder_in.display()
        )
    })?;

    if cli.json {
        render_json(&summary).context("failed to write JSON summary")?;
    } else {
        print!("{}", render_text(&summary));
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
