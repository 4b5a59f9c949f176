//! sweepfile - archive folders and files that have not changed for a while.
//!
//! Usage:
//!   sweepfile                        Sweep now, then every DELETION_FREQUENCY_DAYS days
//!   sweepfile --config PATH          Use another configuration file
//!   sweepfile --once                 Run a single sweep and exit
//!   sweepfile --dry-run              Log what would be archived, touch nothing
//!   sweepfile --help                 Show help

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Context, Result, eyre};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use sweepfile_core::SweepConfig;
use sweepfile_schedule::Scheduler;

#[derive(Parser)]
#[command(
    name = "sweepfile",
    version,
    about = "Archives aged folders and files on a schedule",
    long_about = "sweepfile walks the configured folders under ROOT_PATH and moves every \
                  folder or file older than DELETION_FREQUENCY_DAYS into TEMP_PATH, \
                  replacing any previous copy there. It repeats every \
                  DELETION_FREQUENCY_DAYS days until interrupted."
)]
struct Cli {
    /// Configuration file (Java-style .properties)
    #[arg(short, long, env = "SWEEPFILE_CONFIG", default_value = "config.properties")]
    config: PathBuf,

    /// Run a single sweep and exit
    #[arg(long)]
    once: bool,

    /// Log what would be archived without moving anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = SweepConfig::from_properties(&cli.config).wrap_err_with(|| {
        format!("Failed to load configuration from {}", cli.config.display())
    })?;
    if cli.dry_run {
        config = config.with_dry_run(true);
    }

    tracing::info!(
        "Archiving from {} into {} ({} layout{})",
        config.root_path.display(),
        config.archive_path.display(),
        config.layout,
        if config.dry_run { ", dry-run" } else { "" }
    );

    let scheduler = Scheduler::new(config);

    let cancel = scheduler.cancellation_token();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown signal received, stopping");
                cancel.cancel();
            }
            Err(e) => tracing::warn!("Cannot listen for shutdown signal: {}", e),
        }
    });

    if cli.once {
        return run_once(&scheduler).await;
    }

    scheduler.run().await;
    Ok(())
}

/// Run a single sweep and fail the process if it aborted.
async fn run_once(scheduler: &Scheduler) -> Result<()> {
    let report = scheduler.run_once().await.wrap_err("Sweep failed")?;
    if report.failed > 0 {
        return Err(eyre!("{} node(s) could not be archived", report.failed));
    }
    Ok(())
}
