//! bucket-sim: scenario simulator for bucket finalization
//!
//! Plays a scripted stream of clock advances, slashes and report submissions
//! against a bucket service and writes every event and snapshot as a JSON
//! line, for tabular export or charting.

mod scenario;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use bucket_finality::{BucketConfig, BucketService, JsonLinesObserver, ServiceConfig};
use bucket_telemetry::{init_logging, TelemetryConfig};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::scenario::{run_scenario, Scenario};

/// bucket-sim: replay bucket scenarios
#[derive(Parser, Debug)]
#[command(name = "bucket-sim")]
#[command(about = "Replay scripted scenarios against the bucket state machine")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Emit logs as JSON lines (overrides BUCKET_JSON_LOGS)
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a TOML or JSON scenario file
    Run {
        /// Scenario file (.toml or .json)
        scenario: PathBuf,

        /// Bucket geometry TOML (defaults to one-week periods)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write event lines here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only write events, not per-step snapshots
        #[arg(long)]
        no_snapshots: bool,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut telemetry = TelemetryConfig::for_service("bucket-sim");
    if args.json_logs {
        telemetry.json_logs = true;
    }
    if let Err(e) = init_logging(&telemetry) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    match execute(args.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(2)
        }
    }
}

/// Returns whether every expectation held.
fn execute(command: Command) -> Result<bool> {
    match command {
        Command::Run {
            scenario,
            config,
            output,
            no_snapshots,
        } => {
            let bucket = match config {
                Some(path) => BucketConfig::load(&path)
                    .with_context(|| format!("failed to load config {}", path.display()))?,
                None => BucketConfig::default(),
            };
            let service_config = ServiceConfig {
                bucket,
                emit_snapshots: !no_snapshots,
                ..ServiceConfig::default()
            };

            let writer: Box<dyn Write + Send> = match &output {
                Some(path) => Box::new(BufWriter::new(
                    File::create(path)
                        .with_context(|| format!("failed to create {}", path.display()))?,
                )),
                None => Box::new(io::stdout()),
            };

            let scenario_file = Scenario::load(&scenario)?;
            let observer = Arc::new(JsonLinesObserver::new(writer));
            let service = BucketService::new(service_config, observer)?;

            info!(
                scenario = %scenario.display(),
                name = scenario_file.name.as_deref().unwrap_or("unnamed"),
                steps = scenario_file.steps.len(),
                "Running scenario"
            );
            let report = run_scenario(&scenario_file, &service)?;

            if report.passed() {
                info!(
                    steps = report.steps,
                    rejected_reports = report.rejected_reports,
                    "Scenario passed"
                );
            } else {
                for failure in &report.failures {
                    warn!(failure = %failure, "Expectation failed");
                }
                eprintln!(
                    "{} of {} steps failed expectations",
                    report.failures.len(),
                    report.steps
                );
            }
            Ok(report.passed())
        }
    }
}
