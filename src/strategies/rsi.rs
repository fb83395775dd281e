use crate::error::IndicatorError;
use crate::handbook::ParameterGrid;
use crate::indicators;
use crate::models::*;
use crate::param_utils::{ensure_ordered, get_bounded_param, get_period_param};
use crate::strategy_utils::{build_output, builtin_grid, ensure_min_data};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct RsiIndicator {
    period: usize,
    oversold_level: f64,
    overbought_level: f64,
}

impl RsiIndicator {
    pub fn new(parameters: &HashMap<String, f64>) -> Result<Self, IndicatorError> {
        let period = get_period_param(parameters, "period", 14, 2)?;
        let oversold_level = get_bounded_param(parameters, "oversold", 30.0, 0.0, 100.0)?;
        let overbought_level = get_bounded_param(parameters, "overbought", 70.0, 0.0, 100.0)?;
        ensure_ordered("oversold", oversold_level, "overbought", overbought_level)?;
        Ok(Self {
            period,
            oversold_level,
            overbought_level,
        })
    }
}

impl super::Indicator for RsiIndicator {
    fn name(&self) -> &str {
        "rsi"
    }

    fn min_data_points(&self) -> usize {
        self.period + 2
    }

    fn calculate(&self, series: &PriceSeries) -> Result<IndicatorOutput, IndicatorError> {
        ensure_min_data(series, self.min_data_points())?;

        let rsi = indicators::rsi(&series.close, self.period);

        // Buy: RSI recovers out of the oversold zone; exit once it clears overbought
        let entries = indicators::crosses_above(&rsi, self.oversold_level);
        let exits = indicators::crosses_above(&rsi, self.overbought_level);

        let span = self.overbought_level - self.oversold_level;
        let strength = rsi
            .iter()
            .map(|value| (self.overbought_level - value) / span)
            .collect();

        Ok(build_output(rsi, strength, entries, exits))
    }

    fn parameter_grid(&self) -> ParameterGrid {
        builtin_grid()
            .with_values("period", vec![7.0, 14.0, 21.0])
            .with_values("oversold", vec![20.0, 25.0, 30.0])
            .with_values("overbought", vec![70.0, 75.0, 80.0])
    }
}
