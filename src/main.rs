//! aw-analyzer — personal activity analytics agent.
//!
//! A short-lived command invoked on a cadence by the OS scheduler. Each
//! `tick` pulls metrics from a local ActivityWatch-style server, evaluates
//! the notification jobs, and exits; `weekly-report` runs the multi-day
//! pipeline; `install` registers the cadence with launchd.

mod analyzer;
mod autostart;
mod config;
mod error;
mod jobs;
mod notify;
mod provider;
mod report;
mod scheduler;
mod slack;
mod state;
mod timeline;
mod weekly;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result};

use crate::config::AppConfig;
use crate::jobs::default_jobs;
use crate::notify::DesktopNotifier;
use crate::scheduler::{run_tick, JobContext};
use crate::state::StateStore;

/// aw-analyzer — turn activity data into notifications and reports.
#[derive(Parser)]
#[command(name = "aw-analyzer", version, about)]
struct Cli {
    /// Raise log output to debug for this invocation.
    #[arg(long, global = true)]
    verbose: bool,

    /// Only log errors; suppress the per-job summary.
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all registered jobs once and exit.
    Tick {
        /// Unknown flags are tolerated for forward compatibility.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
        extra: Vec<String>,
    },

    /// Build and deliver the multi-day report.
    WeeklyReport {
        /// Completed days to cover, ending yesterday (clamped to 1-31).
        #[arg(long, default_value_t = 7)]
        days: u32,

        #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
        extra: Vec<String>,
    },

    /// Clear all persisted state (cooldowns and daily markers).
    Reset {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
        extra: Vec<String>,
    },

    /// Register the periodic tick with the OS scheduler.
    Install {
        /// Minutes between ticks.
        #[arg(long, default_value_t = 10)]
        interval: u32,

        /// Print the scheduler descriptor instead of writing it.
        #[arg(long)]
        dry_run: bool,

        #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
        extra: Vec<String>,
    },

    /// Remove the OS scheduler registration.
    Uninstall {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
        extra: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = AppConfig::load();
    init_logging(&config, cli.verbose, cli.quiet);
    config.validate();

    match cli.command {
        Command::Tick { .. } => cmd_tick(config, cli.quiet).await,
        Command::WeeklyReport { days, .. } => {
            weekly::run_weekly_report(&config, chrono::Utc::now(), days)
                .await
                .map_err(|e| eyre!("weekly report failed: {e}"))
        }
        Command::Reset { .. } => cmd_reset(config),
        Command::Install {
            interval, dry_run, ..
        } => autostart::install(interval, dry_run)
            .await
            .map_err(|e| eyre!("install failed: {e}")),
        Command::Uninstall { .. } => autostart::uninstall()
            .await
            .map_err(|e| eyre!("uninstall failed: {e}")),
    }
}

/// Evaluate the job roster once.
async fn cmd_tick(config: AppConfig, quiet: bool) -> Result<()> {
    let jobs = default_jobs(&config.jobs);
    let state = StateStore::open(&config.state_path);
    let mut ctx = JobContext::new(chrono::Utc::now(), state, config);

    let result = run_tick(&mut ctx, &DesktopNotifier, &jobs)
        .await
        .map_err(|e| eyre!("tick aborted: {e}"))?;

    if !quiet {
        println!(
            "tick: {} executed, {} notified, {} skipped",
            result.executed.len(),
            result.notified.len(),
            result.skipped.len()
        );
        for id in &result.notified {
            println!("  notified: {id}");
        }
    }

    Ok(())
}

/// Wipe cooldowns and daily markers.
fn cmd_reset(config: AppConfig) -> Result<()> {
    let mut state = StateStore::open(&config.state_path);
    state
        .clear()
        .map_err(|e| eyre!("failed to clear state: {e}"))?;
    println!("State cleared: {}", config.state_path.display());
    Ok(())
}

/// Wire the `log` facade to stderr at the configured level. `RUST_LOG`
/// still wins when set, matching the usual env_logger contract.
fn init_logging(config: &AppConfig, verbose: bool, quiet: bool) {
    let level = if quiet {
        log::LevelFilter::Error
    } else if verbose {
        log::LevelFilter::Debug
    } else {
        match config.log_level.to_ascii_uppercase().as_str() {
            "DEBUG" => log::LevelFilter::Debug,
            "WARN" => log::LevelFilter::Warn,
            "ERROR" => log::LevelFilter::Error,
            _ => log::LevelFilter::Info,
        }
    };

    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp_secs()
        .init();
}
