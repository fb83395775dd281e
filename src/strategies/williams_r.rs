use crate::error::IndicatorError;
use crate::handbook::ParameterGrid;
use crate::indicators;
use crate::models::*;
use crate::param_utils::{ensure_ordered, get_bounded_param, get_period_param};
use crate::strategy_utils::{build_output, builtin_grid, ensure_min_data};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct WilliamsRIndicator {
    period: usize,
    oversold_level: f64,
    overbought_level: f64,
}

impl WilliamsRIndicator {
    pub fn new(parameters: &HashMap<String, f64>) -> Result<Self, IndicatorError> {
        let period = get_period_param(parameters, "period", 14, 2)?;
        let oversold_level = get_bounded_param(parameters, "oversold", -80.0, -100.0, 0.0)?;
        let overbought_level = get_bounded_param(parameters, "overbought", -20.0, -100.0, 0.0)?;
        ensure_ordered("oversold", oversold_level, "overbought", overbought_level)?;
        Ok(Self {
            period,
            oversold_level,
            overbought_level,
        })
    }
}

impl super::Indicator for WilliamsRIndicator {
    fn name(&self) -> &str {
        "williams_r"
    }

    fn min_data_points(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, series: &PriceSeries) -> Result<IndicatorOutput, IndicatorError> {
        ensure_min_data(series, self.min_data_points())?;

        let williams_r =
            indicators::williams_r(&series.high, &series.low, &series.close, self.period);

        let entries = indicators::crosses_above(&williams_r, self.oversold_level);
        let exits = indicators::crosses_above(&williams_r, self.overbought_level);

        // -100 (deeply oversold) reads as full strength
        let strength = williams_r.iter().map(|value| -value / 100.0).collect();

        Ok(build_output(williams_r, strength, entries, exits))
    }

    fn parameter_grid(&self) -> ParameterGrid {
        builtin_grid()
            .with_values("period", vec![10.0, 14.0, 21.0])
            .with_values("oversold", vec![-90.0, -80.0])
            .with_values("overbought", vec![-20.0, -10.0])
    }
}
