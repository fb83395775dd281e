use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use indicator_engine::{
    commands::{candidates, cleanup, features, grid, quicktest, sweep, sync_listings},
    config::EngineSettings,
    listing::RunStatus,
    models::ExitMode,
};
use log::info;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "indicator_engine")]
#[command(about = "Indicator signal generation with fixed take-profit/stop-loss exits")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one indicator over a price CSV and print a signal summary
    Quicktest {
        /// Indicator name or handbook number
        indicator: String,
        /// OHLCV CSV with a timestamp,open,high,low,close,volume header
        #[arg(long, value_name = "PATH")]
        data: PathBuf,
        #[arg(long, value_enum, default_value_t = ExitMode::Fixed)]
        mode: ExitMode,
        /// Take-profit distance in pips (fixed mode)
        #[arg(long)]
        tp: Option<f64>,
        /// Stop-loss distance in pips (fixed mode)
        #[arg(long)]
        sl: Option<f64>,
        /// Indicator parameter as key=value; repeatable
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
        /// First date to include (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Last date to include (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Also write the summary JSON here
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Print the parameter grid an indicator would be swept over
    Grid {
        indicator: String,
        /// Handbook entry number (defaults to the indicator's registry number)
        #[arg(long)]
        number: Option<u32>,
        #[arg(long, value_name = "PATH")]
        handbook: Option<PathBuf>,
    },
    /// Evaluate every grid point in fixed-exit mode
    Sweep {
        indicator: String,
        #[arg(long, value_name = "PATH")]
        data: PathBuf,
        #[arg(long)]
        number: Option<u32>,
        #[arg(long, value_name = "PATH")]
        handbook: Option<PathBuf>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Destination for the JSON sweep report
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Export ML feature columns for an indicator as CSV
    Features {
        indicator: String,
        #[arg(long, value_name = "PATH")]
        data: PathBuf,
        #[arg(short, long, value_name = "PATH")]
        output: PathBuf,
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Group a run log into per-status script listings
    SyncListings {
        /// Newline-delimited JSON run log
        #[arg(long, value_name = "PATH")]
        log: PathBuf,
        #[arg(long)]
        timeframe: String,
        /// Listing directory (defaults to LISTING_DIR)
        #[arg(long, value_name = "PATH")]
        dir: Option<PathBuf>,
    },
    /// Merge status listings into a candidates file
    Candidates {
        #[arg(long)]
        timeframe: String,
        #[arg(long, value_name = "PATH")]
        dir: Option<PathBuf>,
        /// Statuses to include; defaults to passed
        #[arg(long, value_delimiter = ',', num_args = 1..)]
        statuses: Vec<RunStatus>,
    },
    /// Remove all listings for a timeframe
    Cleanup {
        #[arg(long)]
        timeframe: String,
        #[arg(long, value_name = "PATH")]
        dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = EngineSettings::from_env()?;
    info!(
        "Starting indicator engine (pip value {}, default brackets {}/{} pips)",
        settings.pip_value, settings.default_tp_pips, settings.default_sl_pips
    );

    match cli.command {
        Commands::Quicktest {
            indicator,
            data,
            mode,
            tp,
            sl,
            params,
            start,
            end,
            output,
        } => quicktest::run(
            &settings,
            quicktest::QuicktestOptions {
                indicator,
                data,
                mode,
                tp_pips: tp,
                sl_pips: sl,
                params,
                start_date: start,
                end_date: end,
                output,
            },
        )?,
        Commands::Grid {
            indicator,
            number,
            handbook,
        } => grid::run(&settings, &indicator, number, handbook)?,
        Commands::Sweep {
            indicator,
            data,
            number,
            handbook,
            start,
            end,
            output,
        } => sweep::run(
            &settings,
            sweep::SweepOptions {
                indicator,
                data,
                number,
                handbook,
                start_date: start,
                end_date: end,
                output,
            },
        )?,
        Commands::Features {
            indicator,
            data,
            output,
            params,
            start,
            end,
        } => features::run(&indicator, &data, &output, &params, start, end)?,
        Commands::SyncListings {
            log,
            timeframe,
            dir,
        } => {
            let dir = dir.unwrap_or_else(|| settings.listing_dir.clone());
            sync_listings::run(&log, &dir, &timeframe)?;
        }
        Commands::Candidates {
            timeframe,
            dir,
            statuses,
        } => {
            let dir = dir.unwrap_or_else(|| settings.listing_dir.clone());
            candidates::run(&dir, &timeframe, &statuses)?;
        }
        Commands::Cleanup { timeframe, dir } => {
            let dir = dir.unwrap_or_else(|| settings.listing_dir.clone());
            cleanup::run(&dir, &timeframe)?;
        }
    }

    Ok(())
}
