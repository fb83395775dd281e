use log::debug;

use crate::error::IndicatorError;
use crate::models::{ExitMode, IndicatorOutput, PriceSeries, SignalPair};
use crate::simulator::{simulate_fixed_exits, FixedExitParams};

/// Feed the indicator's entries through the fixed tp/sl simulator. The
/// indicator's own exit condition is discarded in this mode.
pub fn fixed_signal_pair(
    series: &PriceSeries,
    output: IndicatorOutput,
    params: &FixedExitParams,
) -> Result<SignalPair, IndicatorError> {
    let IndicatorOutput {
        entries,
        signal_strength,
        ..
    } = output;

    let simulation =
        simulate_fixed_exits(&entries, &series.high, &series.low, &series.close, params)?;
    let open_at_end = simulation.open_at_end();

    Ok(SignalPair {
        mode: ExitMode::Fixed,
        entries,
        exits: simulation.exits,
        signal_strength,
        trades: simulation.trades,
        open_at_end,
    })
}

/// Pass the indicator's two boolean conditions through unchanged. No
/// position state is tracked, so an entry and an exit may share a bar.
pub fn dynamic_signal_pair(output: IndicatorOutput) -> SignalPair {
    let IndicatorOutput {
        entries,
        exits,
        signal_strength,
        ..
    } = output;

    let overlapping = entries
        .iter()
        .zip(exits.iter())
        .filter(|(entry, exit)| **entry && **exit)
        .count();
    if overlapping > 0 {
        debug!(
            "Dynamic signals contain {} bars flagged as both entry and exit",
            overlapping
        );
    }

    SignalPair {
        mode: ExitMode::Dynamic,
        entries,
        exits,
        signal_strength,
        trades: Vec::new(),
        open_at_end: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriceBar;
    use chrono::{Duration, TimeZone, Utc};

    fn flat_series(len: usize) -> PriceSeries {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bars: Vec<PriceBar> = (0..len)
            .map(|i| PriceBar {
                timestamp: start + Duration::minutes(i as i64),
                open: 1.0,
                high: 1.0,
                low: 1.0,
                close: 1.0,
                volume: 0.0,
            })
            .collect();
        PriceSeries::from_bars(&bars).unwrap()
    }

    fn output(entries: Vec<bool>, exits: Vec<bool>) -> IndicatorOutput {
        let len = entries.len();
        IndicatorOutput {
            signal: vec![0.0; len],
            signal_strength: vec![0.5; len],
            entries,
            exits,
        }
    }

    #[test]
    fn dynamic_mode_keeps_conditions_independent() {
        let pair = dynamic_signal_pair(output(
            vec![false, true, true, false],
            vec![false, true, false, true],
        ));
        assert_eq!(pair.mode, ExitMode::Dynamic);
        assert_eq!(pair.entries, vec![false, true, true, false]);
        assert_eq!(pair.exits, vec![false, true, false, true]);
        assert!(pair.trades.is_empty());
    }

    #[test]
    fn fixed_mode_ignores_indicator_exits() {
        let series = flat_series(4);
        let pair = fixed_signal_pair(
            &series,
            output(vec![false, true, false, false], vec![true, true, true, true]),
            &FixedExitParams::new(10.0, 10.0),
        )
        .unwrap();
        assert_eq!(pair.mode, ExitMode::Fixed);
        assert_eq!(pair.exits, vec![false; 4]);
        assert!(pair.open_at_end);
        assert_eq!(pair.trades.len(), 1);
    }
}
