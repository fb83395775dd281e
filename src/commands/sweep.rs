use crate::config::EngineSettings;
use crate::handbook::{load_handbook_or_warn, resolve_grid};
use crate::strategy::{create_indicator, resolve_indicator_name};
use crate::sweep::{SweepReport, SweepRunner};
use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use log::info;
use std::collections::HashMap;
use std::path::PathBuf;

const TOP_ROWS: usize = 10;

pub struct SweepOptions {
    pub indicator: String,
    pub data: PathBuf,
    pub number: Option<u32>,
    pub handbook: Option<PathBuf>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub output: Option<PathBuf>,
}

pub fn run(settings: &EngineSettings, options: SweepOptions) -> Result<()> {
    let name = resolve_indicator_name(&options.indicator)?;
    let template = create_indicator(name, &HashMap::new())?;
    let handbook_path = options
        .handbook
        .or_else(|| settings.handbook_path.clone());
    let handbook = load_handbook_or_warn(handbook_path.as_deref());
    let (grid, source) = resolve_grid(
        template.as_ref(),
        handbook.as_ref(),
        options.number,
        settings.default_tp_pips,
        settings.default_sl_pips,
    );
    if grid.is_empty() {
        return Err(anyhow!("Grid for {} has no points with tp > sl", name));
    }

    let series = super::load_series(&options.data, options.start_date, options.end_date)?;
    let runner = SweepRunner::new(settings.pip_value)
        .with_threads(settings.sweep_threads)
        .with_progress(true);
    let rows = runner.run(name, &series, &grid)?;
    let report = SweepReport::new(name, source, &series, &runner.status().snapshot(), rows);

    println!(
        "\n=== TOP {} GRID POINTS FOR {} ===\n",
        TOP_ROWS.min(report.rows.len()),
        name
    );
    for (i, row) in report.rows.iter().take(TOP_ROWS).enumerate() {
        println!("Rank {}:", i + 1);
        println!("  TP/SL: {} / {} pips", row.tp_pips, row.sl_pips);
        println!(
            "  Trades: {} opened, {} closed",
            row.holding.trades_opened, row.holding.trades_closed
        );
        println!(
            "  Bars held: mean {:.2}, median {:.1}",
            row.holding.mean_bars_held, row.holding.median_bars_held
        );
        println!("  Parameters:");
        for (key, value) in &row.parameters {
            println!("    {}: {}", key, value);
        }
        println!();
    }

    if let Some(path) = options.output {
        report.write_json(&path)?;
        info!("Wrote {} sweep rows to {}", report.rows.len(), path.display());
    }
    Ok(())
}
