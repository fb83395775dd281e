//! Fixed take-profit / stop-loss position simulation.
//!
//! Walks the bars once, left to right, holding at most one long position.
//! An entry on bar `i` opens at `close[i]` with a bracket of
//! `tp_pips * pip_value` above and `sl_pips * pip_value` below. Later bars
//! close the position when `high >= tp_level` or `low <= sl_level`.
//!
//! Edge behavior:
//! * bar 0 never opens or closes a position;
//! * an entry bar only opens, even when its own high/low already breach the
//!   new bracket;
//! * a bar breaching both levels records a single exit, without saying which
//!   level was hit;
//! * entries while a position is open are ignored;
//! * a position still open after the last bar produces no exit.

use log::debug;
use serde::Serialize;

use crate::error::IndicatorError;

/// Price value of one pip for the instruments in scope.
pub const DEFAULT_PIP_VALUE: f64 = 0.0001;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FixedExitParams {
    pub tp_pips: f64,
    pub sl_pips: f64,
    pub pip_value: f64,
}

impl FixedExitParams {
    pub fn new(tp_pips: f64, sl_pips: f64) -> Self {
        Self {
            tp_pips,
            sl_pips,
            pip_value: DEFAULT_PIP_VALUE,
        }
    }

    pub fn with_pip_value(mut self, pip_value: f64) -> Self {
        self.pip_value = pip_value;
        self
    }

    pub fn take_profit_distance(&self) -> f64 {
        self.tp_pips * self.pip_value
    }

    pub fn stop_loss_distance(&self) -> f64 {
        self.sl_pips * self.pip_value
    }
}

/// State of the single position a simulation run may hold.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PositionState {
    pub in_position: bool,
    pub entry_price: f64,
    pub tp_level: f64,
    pub sl_level: f64,
}

impl PositionState {
    pub fn flat() -> Self {
        Self::default()
    }

    fn open(&mut self, close: f64, params: &FixedExitParams) {
        self.in_position = true;
        self.entry_price = close;
        self.tp_level = close + params.take_profit_distance();
        self.sl_level = close - params.stop_loss_distance();
    }

    fn bracket_hit(&self, high: f64, low: f64) -> bool {
        high >= self.tp_level || low <= self.sl_level
    }

    fn close(&mut self) {
        self.in_position = false;
    }
}

/// One position opened by the simulator. `exit_index` is `None` when the
/// data ended before either level was reached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FixedExitTrade {
    pub entry_index: usize,
    pub exit_index: Option<usize>,
    pub entry_price: f64,
    pub tp_level: f64,
    pub sl_level: f64,
}

impl FixedExitTrade {
    pub fn bars_held(&self) -> Option<usize> {
        self.exit_index.map(|exit| exit - self.entry_index)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FixedExitSimulation {
    pub exits: Vec<bool>,
    pub trades: Vec<FixedExitTrade>,
    pub final_state: PositionState,
}

impl FixedExitSimulation {
    pub fn open_at_end(&self) -> bool {
        self.final_state.in_position
    }
}

fn ensure_length(
    series: &'static str,
    expected: usize,
    actual: usize,
) -> Result<(), IndicatorError> {
    if expected != actual {
        return Err(IndicatorError::LengthMismatch {
            series,
            expected,
            actual,
        });
    }
    Ok(())
}

pub fn simulate_fixed_exits(
    entries: &[bool],
    high: &[f64],
    low: &[f64],
    close: &[f64],
    params: &FixedExitParams,
) -> Result<FixedExitSimulation, IndicatorError> {
    let n = entries.len();
    ensure_length("high", n, high.len())?;
    ensure_length("low", n, low.len())?;
    ensure_length("close", n, close.len())?;

    let mut exits = vec![false; n];
    let mut trades: Vec<FixedExitTrade> = Vec::new();
    let mut state = PositionState::flat();

    for i in 1..n {
        if entries[i] && !state.in_position {
            state.open(close[i], params);
            trades.push(FixedExitTrade {
                entry_index: i,
                exit_index: None,
                entry_price: state.entry_price,
                tp_level: state.tp_level,
                sl_level: state.sl_level,
            });
        } else if state.in_position && state.bracket_hit(high[i], low[i]) {
            exits[i] = true;
            state.close();
            if let Some(trade) = trades.last_mut() {
                trade.exit_index = Some(i);
            }
        }
    }

    debug!(
        "Fixed-exit simulation over {} bars: {} opened, {} closed, open at end: {}",
        n,
        trades.len(),
        trades.iter().filter(|t| t.exit_index.is_some()).count(),
        state.in_position
    );

    Ok(FixedExitSimulation {
        exits,
        trades,
        final_state: state,
    })
}

/// Exit flags only.
pub fn fixed_exits(
    entries: &[bool],
    high: &[f64],
    low: &[f64],
    close: &[f64],
    params: &FixedExitParams,
) -> Result<Vec<bool>, IndicatorError> {
    simulate_fixed_exits(entries, high, low, close, params).map(|sim| sim.exits)
}
