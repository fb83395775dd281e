use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::cache::IndicatorCache;
use crate::error::IndicatorError;
use crate::handbook::{GridPoint, GridSource, ParameterGrid};
use crate::models::{parameter_signature, PriceSeries};
use crate::performance::HoldingStats;
use crate::signals::fixed_signal_pair;
use crate::simulator::{FixedExitParams, DEFAULT_PIP_VALUE};
use crate::sweep_status::{SweepStatus, SweepStatusSnapshot};

#[derive(Debug, Clone, Serialize)]
pub struct SweepRow {
    pub parameters: BTreeMap<String, f64>,
    pub signature: String,
    pub tp_pips: f64,
    pub sl_pips: f64,
    pub entry_signals: usize,
    pub exit_signals: usize,
    pub open_at_end: bool,
    pub holding: HoldingStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub indicator: String,
    pub grid_source: GridSource,
    pub bars: usize,
    pub total_points: usize,
    pub skipped_invalid: usize,
    pub skipped_insufficient: usize,
    pub rows: Vec<SweepRow>,
}

impl SweepReport {
    pub fn new(
        indicator: &str,
        grid_source: GridSource,
        series: &PriceSeries,
        status: &SweepStatusSnapshot,
        rows: Vec<SweepRow>,
    ) -> Self {
        Self {
            indicator: indicator.to_string(),
            grid_source,
            bars: series.len(),
            total_points: status.total_points,
            skipped_invalid: status.invalid_points,
            skipped_insufficient: status.insufficient_points,
            rows,
        }
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), self)
            .with_context(|| format!("failed to write sweep report {}", path.display()))?;
        Ok(())
    }
}

/// Evaluates every point of a parameter grid in fixed-exit mode.
pub struct SweepRunner {
    cache: IndicatorCache,
    status: SweepStatus,
    pip_value: f64,
    threads: Option<usize>,
    show_progress: bool,
}

impl Default for SweepRunner {
    fn default() -> Self {
        Self::new(DEFAULT_PIP_VALUE)
    }
}

impl SweepRunner {
    pub fn new(pip_value: f64) -> Self {
        Self {
            cache: IndicatorCache::new(),
            status: SweepStatus::new(),
            pip_value,
            threads: None,
            show_progress: false,
        }
    }

    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn status(&self) -> &SweepStatus {
        &self.status
    }

    pub fn cache(&self) -> &IndicatorCache {
        &self.cache
    }

    pub fn run(
        &self,
        indicator: &str,
        series: &PriceSeries,
        grid: &ParameterGrid,
    ) -> Result<Vec<SweepRow>> {
        let points = grid.points();
        let fingerprint = series.fingerprint();
        self.status.set_phase("Evaluating grid");
        self.status.reset(points.len());
        info!(
            "Sweeping {} grid points for {} over {} bars",
            points.len(),
            indicator,
            series.len()
        );

        let pb = if self.show_progress {
            let pb = ProgressBar::new(points.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
                    )?
                    .progress_chars("#>-"),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        let evaluate_all = || -> Vec<SweepRow> {
            points
                .par_iter()
                .filter_map(|point| {
                    let row = self.evaluate_point(indicator, series, fingerprint, point);
                    pb.inc(1);
                    row
                })
                .collect()
        };

        let mut rows = match self.threads {
            Some(threads) => {
                info!("Using {} worker threads", threads);
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .context("failed to build sweep thread pool")?;
                pool.install(evaluate_all)
            }
            None => evaluate_all(),
        };
        pb.finish_with_message("Sweep completed");

        sort_rows(&mut rows);
        self.status.set_phase("Completed");

        let snapshot = self.status.snapshot();
        if snapshot.skipped_points() > 0 {
            warn!(
                "Skipped {} of {} grid points ({} invalid, {} with insufficient data)",
                snapshot.skipped_points(),
                snapshot.total_points,
                snapshot.invalid_points,
                snapshot.insufficient_points
            );
        }
        info!(
            "Sweep of {} finished: {} rows, {} cached indicator outputs",
            indicator,
            rows.len(),
            self.cache.len()
        );
        Ok(rows)
    }

    fn evaluate_point(
        &self,
        indicator: &str,
        series: &PriceSeries,
        fingerprint: u64,
        point: &GridPoint,
    ) -> Option<SweepRow> {
        let signature = parameter_signature(&point.parameters);
        let output = match self.cache.get_or_compute_with_fingerprint(
            indicator,
            &point.parameters,
            series,
            fingerprint,
        ) {
            Ok(output) => output,
            Err(err) => {
                self.record_skip(&err);
                warn!("Skipping {} {}: {}", indicator, signature, err);
                return None;
            }
        };

        let params = FixedExitParams::new(point.tp_pips, point.sl_pips).with_pip_value(self.pip_value);
        let pair = match fixed_signal_pair(series, (*output).clone(), &params) {
            Ok(pair) => pair,
            Err(err) => {
                self.record_skip(&err);
                warn!("Skipping {} {}: {}", indicator, signature, err);
                return None;
            }
        };
        self.status.record_completed();

        Some(SweepRow {
            parameters: to_sorted(&point.parameters),
            signature,
            tp_pips: point.tp_pips,
            sl_pips: point.sl_pips,
            entry_signals: pair.entry_count(),
            exit_signals: pair.exit_count(),
            open_at_end: pair.open_at_end,
            holding: HoldingStats::from_pair(&pair),
        })
    }

    fn record_skip(&self, err: &IndicatorError) {
        match err {
            IndicatorError::InsufficientData { .. } => self.status.record_insufficient(),
            _ => self.status.record_invalid(),
        }
    }
}

fn to_sorted(parameters: &HashMap<String, f64>) -> BTreeMap<String, f64> {
    parameters.iter().map(|(k, v)| (k.clone(), *v)).collect()
}

/// Most trades closed first; ties broken by signature, then brackets.
pub fn sort_rows(rows: &mut [SweepRow]) {
    rows.sort_by(|a, b| {
        b.holding
            .trades_closed
            .cmp(&a.holding.trades_closed)
            .then_with(|| a.signature.cmp(&b.signature))
            .then_with(|| a.tp_pips.partial_cmp(&b.tp_pips).unwrap_or(Ordering::Equal))
            .then_with(|| a.sl_pips.partial_cmp(&b.sl_pips).unwrap_or(Ordering::Equal))
    });
}
