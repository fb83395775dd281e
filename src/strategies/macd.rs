use crate::error::IndicatorError;
use crate::handbook::ParameterGrid;
use crate::indicators;
use crate::models::*;
use crate::param_utils::{ensure_ordered, get_period_param};
use crate::strategy_utils::{build_output, builtin_grid, ensure_min_data};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdIndicator {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

impl MacdIndicator {
    pub fn new(parameters: &HashMap<String, f64>) -> Result<Self, IndicatorError> {
        let fast_period = get_period_param(parameters, "fast_period", 12, 1)?;
        let slow_period = get_period_param(parameters, "slow_period", 26, 2)?;
        let signal_period = get_period_param(parameters, "signal_period", 9, 1)?;
        ensure_ordered(
            "fast_period",
            fast_period as f64,
            "slow_period",
            slow_period as f64,
        )?;
        Ok(Self {
            fast_period,
            slow_period,
            signal_period,
        })
    }
}

impl super::Indicator for MacdIndicator {
    fn name(&self) -> &str {
        "macd"
    }

    fn min_data_points(&self) -> usize {
        self.slow_period + self.signal_period
    }

    fn calculate(&self, series: &PriceSeries) -> Result<IndicatorOutput, IndicatorError> {
        ensure_min_data(series, self.min_data_points())?;

        let (_macd_line, _signal_line, histogram) = indicators::macd(
            &series.close,
            self.fast_period,
            self.slow_period,
            self.signal_period,
        );

        // MACD line crossing its signal line, expressed through the histogram
        let entries = indicators::crosses_above(&histogram, 0.0);
        let exits = indicators::crosses_below(&histogram, 0.0);

        // Histogram relative to its recent dispersion, mapped around 0.5
        let dispersion = indicators::rolling_std(&histogram, self.slow_period);
        let strength = histogram
            .iter()
            .zip(dispersion.iter())
            .map(|(hist, std)| {
                if *std > 0.0 {
                    0.5 + hist / (4.0 * std)
                } else {
                    f64::NAN
                }
            })
            .collect();

        Ok(build_output(histogram, strength, entries, exits))
    }

    fn parameter_grid(&self) -> ParameterGrid {
        builtin_grid()
            .with_values("fast_period", vec![8.0, 12.0])
            .with_values("slow_period", vec![21.0, 26.0])
            .with_values("signal_period", vec![7.0, 9.0])
    }
}
