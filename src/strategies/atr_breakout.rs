use crate::error::IndicatorError;
use crate::handbook::ParameterGrid;
use crate::indicators;
use crate::models::*;
use crate::param_utils::{get_period_param, get_positive_param};
use crate::strategy_utils::{build_output, builtin_grid, ensure_min_data};
use std::collections::HashMap;

/// Volatility breakout: close pushes above `SMA + multiplier * ATR`.
#[derive(Debug, Clone, PartialEq)]
pub struct AtrBreakoutIndicator {
    period: usize,
    atr_period: usize,
    multiplier: f64,
}

impl AtrBreakoutIndicator {
    pub fn new(parameters: &HashMap<String, f64>) -> Result<Self, IndicatorError> {
        let period = get_period_param(parameters, "period", 20, 2)?;
        let atr_period = get_period_param(parameters, "atr_period", 14, 1)?;
        let multiplier = get_positive_param(parameters, "multiplier", 1.5)?;
        Ok(Self {
            period,
            atr_period,
            multiplier,
        })
    }
}

impl super::Indicator for AtrBreakoutIndicator {
    fn name(&self) -> &str {
        "atr_breakout"
    }

    fn min_data_points(&self) -> usize {
        self.period.max(self.atr_period + 1) + 1
    }

    fn calculate(&self, series: &PriceSeries) -> Result<IndicatorOutput, IndicatorError> {
        ensure_min_data(series, self.min_data_points())?;

        let basis = indicators::sma(&series.close, self.period);
        let atr = indicators::atr(&series.high, &series.low, &series.close, self.atr_period);

        let upper: Vec<f64> = basis
            .iter()
            .zip(atr.iter())
            .map(|(mid, range)| mid + self.multiplier * range)
            .collect();
        let distance: Vec<f64> = series
            .close
            .iter()
            .zip(upper.iter())
            .map(|(close, band)| close - band)
            .collect();

        let entries = indicators::crosses_above(&distance, 0.0);
        let exits = indicators::below(&series.close, &basis);

        // Distance past the band in ATR units
        let strength = distance
            .iter()
            .zip(atr.iter())
            .map(|(d, range)| {
                if *range > 0.0 {
                    0.5 + d / (2.0 * range)
                } else {
                    f64::NAN
                }
            })
            .collect();

        Ok(build_output(distance, strength, entries, exits))
    }

    fn parameter_grid(&self) -> ParameterGrid {
        builtin_grid()
            .with_values("period", vec![20.0, 50.0])
            .with_values("atr_period", vec![10.0, 14.0])
            .with_values("multiplier", vec![1.0, 1.5, 2.0])
    }
}
