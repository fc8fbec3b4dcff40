//! `plclogger`: record PLC tags to a CSV file

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use plclogger_core::prelude::*;
use tokio_util::sync::CancellationToken;

mod logging;

/// Log PLC tag values to a CSV file at a fixed sampling interval
#[derive(Parser, Debug)]
#[command(name = "plclogger")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    config: PathBuf,

    /// Directory for data files (default: <Documents>/PLC Data Logger/Data)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory for log files (default: <Documents>/PLC Data Logger/Logs)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Stop after this many cycles
    #[arg(long)]
    cycles: Option<u64>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn program_dirs(cli: &Cli) -> Result<ProgramDirs> {
    let mut dirs = match (&cli.data_dir, &cli.log_dir) {
        (Some(data), Some(logs)) => ProgramDirs::under(".").with_data(data).with_logs(logs),
        _ => ProgramDirs::default_location().context("Could not locate the program folder")?,
    };
    if let Some(data) = &cli.data_dir {
        dirs = dirs.with_data(data);
    }
    if let Some(logs) = &cli.log_dir {
        dirs = dirs.with_logs(logs);
    }
    dirs.ensure().context("Could not create program folders")?;
    Ok(dirs)
}

async fn run(cli: Cli, dirs: ProgramDirs) -> Result<SessionSummary> {
    let config = DataLoggerConfig::from_path(&cli.config)
        .with_context(|| format!("Could not load {}", cli.config.display()))?;

    let data_path = dirs.data.join(data_file_name(Local::now()));
    let sink = CsvSink::append_to(&data_path)
        .with_context(|| format!("Could not open {}", data_path.display()))?;
    tracing::info!(path = %data_path.display(), "Writing data file.");

    tracing::warn!(
        controller = %config.controller_address(),
        "No controller driver is built in; reading from the simulated controller."
    );

    let mut logger = DataLogger::new(config, SimulatedController::new(), sink);
    if let Some(cycles) = cli.cycles {
        logger = logger.with_cycle_limit(cycles);
    }

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received; stopping.");
            ctrl_c.cancel();
        }
    });

    let summary = logger.run(shutdown).await?;
    Ok(summary)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let dirs = match program_dirs(&cli) {
        Ok(dirs) => dirs,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let _guard = match logging::init(&dirs.logs, &cli.log_level) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli, dirs).await {
        Ok(summary) => {
            tracing::info!(
                cycles = summary.cycles,
                records = summary.records,
                overruns = summary.stats.overruns(),
                "Finished ({:?}).",
                summary.reason
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
