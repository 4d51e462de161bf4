//! Beamtrain CLI - Replay a MU-MIMO beam-training scenario
//!
//! Loads a run configuration and a scenario script, drives the phase
//! coordinator through it, and writes the trace files plus a run summary
//! into the traces folder.
//!
//! Usage:
//!     beamtrain --scenario demos/two_client_group.json
//!     beamtrain --scenario s.json --config run.json --k-best-combinations 8
//!     beamtrain --scenario s.json --csv --traces-folder out/

use std::path::PathBuf;

use beamtrain_core::collaborator::{RecordingCodebook, RecordingMac};
use beamtrain_core::{CsvTraceSink, RunConfig, RunReport, Scenario, Simulator};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "beamtrain")]
#[command(about = "Replay a MU-MIMO beam-training scenario")]
#[command(version)]
struct Args {
    /// Scenario JSON: stations and the scripted signal timeline
    #[arg(short, long)]
    scenario: PathBuf,

    /// Run configuration JSON (defaults apply to missing fields)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of K-best candidates tested in the MIMO phase
    #[arg(long)]
    k_best_combinations: Option<usize>,

    /// Antenna array geometry of the coordinator
    #[arg(long)]
    array_config_ap: Option<String>,

    /// Antenna array geometry of the clients
    #[arg(long)]
    array_config_sta: Option<String>,

    /// Channel-model dataset folder
    #[arg(long)]
    qd_channel_folder: Option<String>,

    /// Output directory for trace files
    #[arg(long)]
    traces_folder: Option<PathBuf>,

    /// Simulated duration in seconds
    #[arg(long)]
    simulation_time: Option<f64>,

    /// Beamformed links required before group training starts
    #[arg(long)]
    group_training_links: Option<u32>,

    /// Machine-readable mode: only warnings reach the log
    #[arg(long)]
    csv: bool,

    /// Verbose output (debug log)
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let config = match build_config(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(e.exit_code());
        }
    };

    init_logging(&config);
    tracing::info!("beamtrain v{}", env!("CARGO_PKG_VERSION"));

    match run(&args, config) {
        Ok(report) => {
            if !report.incomplete_links().is_empty() {
                tracing::warn!(
                    "{} link(s) did not complete training",
                    report.incomplete_links().len()
                );
            }
        }
        Err(e) => {
            tracing::error!(code = e.error_code(), "{}", e);
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

fn build_config(args: &Args) -> beamtrain_core::Result<RunConfig> {
    let mut config = match &args.config {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };

    if let Some(k) = args.k_best_combinations {
        config.k_best_combinations = k;
    }
    if let Some(ap) = &args.array_config_ap {
        config.array_config_ap = ap.clone();
    }
    if let Some(sta) = &args.array_config_sta {
        config.array_config_sta = sta.clone();
    }
    if let Some(folder) = &args.qd_channel_folder {
        config.qd_channel_folder = folder.clone();
    }
    if let Some(folder) = &args.traces_folder {
        config.traces_folder = folder.clone();
    }
    if let Some(time) = args.simulation_time {
        config.simulation_time_s = time;
    }
    if let Some(links) = args.group_training_links {
        config.group_training_links = links;
    }
    config.csv |= args.csv;
    config.verbose |= args.verbose;

    config.validate()?;
    Ok(config)
}

/// Log to stderr; `RUST_LOG` overrides the mode-derived default
fn init_logging(config: &RunConfig) {
    let default_filter = if config.verbose {
        "beamtrain_core=debug,beamtrain=debug"
    } else if config.csv {
        "beamtrain_core=warn,beamtrain=warn"
    } else {
        "beamtrain_core=info,beamtrain=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(args: &Args, config: RunConfig) -> beamtrain_core::Result<RunReport> {
    let scenario = Scenario::from_file(&args.scenario)?;
    tracing::info!(
        stations = scenario.stations.len(),
        events = scenario.events.len(),
        "Loaded scenario {}",
        args.scenario.display()
    );
    tracing::debug!(
        ap = %config.array_config_ap,
        sta = %config.array_config_sta,
        channel = %config.qd_channel_folder,
        "Antenna and channel configuration"
    );

    let traces_folder = config.traces_folder.clone();
    let sink = CsvTraceSink::new(&traces_folder)?;
    let mut simulator = Simulator::new(
        config,
        scenario,
        RecordingMac::new(),
        RecordingCodebook::new(),
        sink,
    )?;
    let report = simulator.run()?;

    let summary = traces_folder.join("run_summary.json");
    report.write_json(&summary)?;
    tracing::info!(
        instructions = simulator.coordinator().mac().count(),
        "Wrote summary to {}",
        summary.display()
    );
    Ok(report)
}
