use crate::config::EngineSettings;
use crate::models::{parse_parameter_assignments, ExitMode, SignalSummary};
use crate::performance::HoldingStats;
use crate::strategy::{create_indicator, resolve_indicator_name};
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use log::info;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

pub struct QuicktestOptions {
    pub indicator: String,
    pub data: PathBuf,
    pub mode: ExitMode,
    pub tp_pips: Option<f64>,
    pub sl_pips: Option<f64>,
    pub params: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct QuicktestReport {
    #[serde(flatten)]
    summary: SignalSummary,
    parameters: BTreeMap<String, f64>,
    tp_pips: Option<f64>,
    sl_pips: Option<f64>,
    holding: Option<HoldingStats>,
}

pub fn run(settings: &EngineSettings, options: QuicktestOptions) -> Result<()> {
    let name = resolve_indicator_name(&options.indicator)?;
    let parameters = parse_parameter_assignments(&options.params)?;
    let indicator = create_indicator(name, &parameters)
        .with_context(|| format!("failed to configure {}", name))?;
    let series = super::load_series(&options.data, options.start_date, options.end_date)?;

    info!(
        "Quicktest of {} in {} mode over {} bars",
        name,
        options.mode,
        series.len()
    );

    let sorted_parameters: BTreeMap<String, f64> = parameters.into_iter().collect();
    let report = match options.mode {
        ExitMode::Fixed => {
            let tp_pips = options.tp_pips.unwrap_or(settings.default_tp_pips);
            let sl_pips = options.sl_pips.unwrap_or(settings.default_sl_pips);
            if !(tp_pips > 0.0 && sl_pips > 0.0) {
                return Err(anyhow!(
                    "--tp and --sl must be positive pip counts (tp: {}, sl: {})",
                    tp_pips,
                    sl_pips
                ));
            }
            let exit_params = settings.exit_params(tp_pips, sl_pips);
            let pair = indicator.generate_signals_fixed(&series, &exit_params)?;
            QuicktestReport {
                summary: SignalSummary::from_pair(name, &series, &pair),
                parameters: sorted_parameters,
                tp_pips: Some(tp_pips),
                sl_pips: Some(sl_pips),
                holding: Some(HoldingStats::from_pair(&pair)),
            }
        }
        ExitMode::Dynamic => {
            let pair = indicator.generate_signals_dynamic(&series)?;
            QuicktestReport {
                summary: SignalSummary::from_pair(name, &series, &pair),
                parameters: sorted_parameters,
                tp_pips: None,
                sl_pips: None,
                holding: None,
            }
        }
    };

    let rendered = serde_json::to_string_pretty(&report)?;
    println!("{}", rendered);
    if let Some(path) = options.output {
        std::fs::write(&path, &rendered)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("Wrote quicktest summary to {}", path.display());
    }
    Ok(())
}
