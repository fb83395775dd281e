use crate::models::SignalPair;
use serde::Serialize;
use statrs::statistics::Statistics;
use std::cmp::Ordering;

/// Holding-period summary of a fixed-exit signal pair. Only closed trades
/// contribute to the bar statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldingStats {
    pub trades_opened: usize,
    pub trades_closed: usize,
    pub mean_bars_held: f64,
    pub median_bars_held: f64,
    pub std_bars_held: f64,
    pub max_bars_held: usize,
    /// Closed over opened; 0 with no trades.
    pub exit_ratio: f64,
}

impl HoldingStats {
    pub fn from_pair(pair: &SignalPair) -> Self {
        let held: Vec<usize> = pair.trades.iter().filter_map(|t| t.bars_held()).collect();
        let bars: Vec<f64> = held.iter().map(|b| *b as f64).collect();

        let trades_opened = pair.trades.len();
        let trades_closed = held.len();
        let exit_ratio = if trades_opened > 0 {
            trades_closed as f64 / trades_opened as f64
        } else {
            0.0
        };

        let mean_bars_held = if bars.is_empty() {
            0.0
        } else {
            bars.iter().mean()
        };
        let std_bars_held = if bars.len() < 2 {
            0.0
        } else {
            bars.iter().std_dev()
        };

        Self {
            trades_opened,
            trades_closed,
            mean_bars_held,
            median_bars_held: median(&bars),
            std_bars_held,
            max_bars_held: held.iter().copied().max().unwrap_or(0),
            exit_ratio,
        }
    }
}

fn median(values: &[f64]) -> f64 {
    let mut filtered: Vec<f64> = values
        .iter()
        .copied()
        .filter(|value| value.is_finite())
        .collect();

    if filtered.is_empty() {
        return 0.0;
    }

    filtered.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = filtered.len() / 2;

    if filtered.len() % 2 == 0 {
        (filtered[mid - 1] + filtered[mid]) / 2.0
    } else {
        filtered[mid]
    }
}
