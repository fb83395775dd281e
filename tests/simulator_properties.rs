//! Property tests for the fixed-exit position simulator.
//!
//! Random bar paths and entry masks check that:
//! 1. exits never outnumber accepted entries
//! 2. no bar both opens and closes a position
//! 3. every exit bar actually touches its bracket
//! 4. an all-false entry mask produces no exits
//! 5. re-entries while in position keep the original levels
//! 6. a position left open at the end produces no exit and no error

use indicator_engine::error::IndicatorError;
use indicator_engine::simulator::{fixed_exits, simulate_fixed_exits, FixedExitParams};
use proptest::prelude::*;

const F: bool = false;
const T: bool = true;

#[derive(Debug, Clone)]
struct BarPath {
    entries: Vec<bool>,
    high: Vec<f64>,
    low: Vec<f64>,
    close: Vec<f64>,
}

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_path() -> impl Strategy<Value = BarPath> {
    (2usize..120).prop_flat_map(|len| {
        (
            prop::collection::vec(-0.004..0.004_f64, len),
            prop::collection::vec(0.0..0.003_f64, len),
            prop::collection::vec(0.0..0.003_f64, len),
            prop::collection::vec(prop::bool::weighted(0.25), len),
        )
            .prop_map(|(steps, up, down, entries)| {
                let mut close = Vec::with_capacity(steps.len());
                let mut price = 1.1_f64;
                for step in &steps {
                    price = (price + step).max(0.5);
                    close.push(price);
                }
                let high = close.iter().zip(&up).map(|(c, u)| c + u).collect();
                let low = close.iter().zip(&down).map(|(c, d)| c - d).collect();
                BarPath {
                    entries,
                    high,
                    low,
                    close,
                }
            })
    })
}

fn arb_params() -> impl Strategy<Value = FixedExitParams> {
    (1.0..120.0_f64, 1.0..120.0_f64).prop_map(|(tp, sl)| FixedExitParams::new(tp, sl))
}

fn run(path: &BarPath, params: &FixedExitParams) -> Vec<bool> {
    fixed_exits(&path.entries, &path.high, &path.low, &path.close, params).unwrap()
}

proptest! {
    #[test]
    fn exits_never_exceed_accepted_entries(path in arb_path(), params in arb_params()) {
        let sim = simulate_fixed_exits(&path.entries, &path.high, &path.low, &path.close, &params).unwrap();
        let exit_count = sim.exits.iter().filter(|e| **e).count();
        prop_assert!(exit_count <= sim.trades.len());
        prop_assert_eq!(sim.exits.len(), path.entries.len());
        prop_assert!(!sim.exits[0]);

        // Exits alternate with opens: each exit closes the trade opened before it.
        for trade in &sim.trades {
            if let Some(exit) = trade.exit_index {
                prop_assert!(exit > trade.entry_index);
                prop_assert!(sim.exits[exit]);
            }
        }
    }

    #[test]
    fn no_bar_opens_and_closes(path in arb_path(), params in arb_params()) {
        let sim = simulate_fixed_exits(&path.entries, &path.high, &path.low, &path.close, &params).unwrap();
        for trade in &sim.trades {
            prop_assert!(!sim.exits[trade.entry_index]);
        }
    }

    #[test]
    fn exits_touch_the_bracket(path in arb_path(), params in arb_params()) {
        let sim = simulate_fixed_exits(&path.entries, &path.high, &path.low, &path.close, &params).unwrap();
        for trade in &sim.trades {
            if let Some(exit) = trade.exit_index {
                prop_assert!(path.high[exit] >= trade.tp_level || path.low[exit] <= trade.sl_level);
                // Bars between entry and exit never touched it.
                for i in trade.entry_index + 1..exit {
                    prop_assert!(path.high[i] < trade.tp_level && path.low[i] > trade.sl_level);
                }
            }
        }
    }

    #[test]
    fn no_entries_means_no_exits(mut path in arb_path(), params in arb_params()) {
        path.entries.iter_mut().for_each(|e| *e = false);
        prop_assert!(run(&path, &params).iter().all(|e| !e));
    }

    #[test]
    fn levels_follow_entry_close(path in arb_path(), params in arb_params()) {
        let sim = simulate_fixed_exits(&path.entries, &path.high, &path.low, &path.close, &params).unwrap();
        for trade in &sim.trades {
            prop_assert_eq!(trade.entry_price, path.close[trade.entry_index]);
            prop_assert!((trade.tp_level - (trade.entry_price + params.take_profit_distance())).abs() < 1e-12);
            prop_assert!((trade.sl_level - (trade.entry_price - params.stop_loss_distance())).abs() < 1e-12);
        }
    }

    #[test]
    fn open_position_at_end_has_no_exit(path in arb_path(), params in arb_params()) {
        let sim = simulate_fixed_exits(&path.entries, &path.high, &path.low, &path.close, &params).unwrap();
        match sim.trades.last() {
            Some(last) if last.exit_index.is_none() => {
                prop_assert!(sim.open_at_end());
                prop_assert!(sim.exits[last.entry_index..].iter().all(|e| !e));
            }
            _ => prop_assert!(!sim.open_at_end()),
        }
    }
}

#[test]
fn take_profit_example() {
    let entries = [F, T, F, F, F];
    let close = [1.1000, 1.1000, 1.1010, 1.1060, 1.0970];
    let high = [1.1000, 1.1000, 1.1015, 1.1065, 1.0975];
    let low = [1.1000, 1.0995, 1.1005, 1.1055, 1.0965];
    let exits = fixed_exits(&entries, &high, &low, &close, &FixedExitParams::new(50.0, 25.0)).unwrap();
    assert_eq!(exits, vec![F, F, F, T, F]);
}

#[test]
fn re_entry_does_not_reset_levels() {
    // Second entry at bar 2 would move the stop above bar 3's low if it reset.
    let entries = [F, T, T, F];
    let close = [1.1000, 1.1000, 1.1020, 1.1000];
    let high = [1.1000, 1.1000, 1.1020, 1.1010];
    let low = [1.1000, 1.1000, 1.1010, 1.0990];
    let sim =
        simulate_fixed_exits(&entries, &high, &low, &close, &FixedExitParams::new(50.0, 25.0)).unwrap();
    assert_eq!(sim.trades.len(), 1);
    assert_eq!(sim.trades[0].entry_price, 1.1000);
    assert_eq!(sim.exits, vec![F, F, F, F]);
    assert!(sim.open_at_end());
}

#[test]
fn entry_on_last_bar_stays_open() {
    let entries = [F, F, T];
    let close = [1.1, 1.1, 1.1];
    let high = [1.2, 1.2, 1.2];
    let low = [1.0, 1.0, 1.0];
    let sim =
        simulate_fixed_exits(&entries, &high, &low, &close, &FixedExitParams::new(50.0, 25.0)).unwrap();
    assert_eq!(sim.exits, vec![F, F, F]);
    assert!(sim.open_at_end());
}

#[test]
fn mismatched_lengths_are_rejected() {
    let err = fixed_exits(
        &[F, T, F],
        &[1.0, 1.0],
        &[1.0, 1.0, 1.0],
        &[1.0, 1.0, 1.0],
        &FixedExitParams::new(50.0, 25.0),
    )
    .unwrap_err();
    assert_eq!(
        err,
        IndicatorError::LengthMismatch {
            series: "high",
            expected: 3,
            actual: 2
        }
    );
}
