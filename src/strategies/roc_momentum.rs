use crate::error::IndicatorError;
use crate::handbook::ParameterGrid;
use crate::indicators;
use crate::models::*;
use crate::param_utils::{get_finite_param, get_period_param, get_positive_param};
use crate::strategy_utils::{build_output, builtin_grid, ensure_min_data};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct RocMomentumIndicator {
    period: usize,
    threshold: f64,
    strength_scale: f64,
}

impl RocMomentumIndicator {
    pub fn new(parameters: &HashMap<String, f64>) -> Result<Self, IndicatorError> {
        let period = get_period_param(parameters, "period", 10, 1)?;
        let threshold = get_finite_param(parameters, "threshold", 0.1)?;
        let strength_scale = get_positive_param(parameters, "strength_scale", 1.0)?;
        Ok(Self {
            period,
            threshold,
            strength_scale,
        })
    }
}

impl super::Indicator for RocMomentumIndicator {
    fn name(&self) -> &str {
        "roc_momentum"
    }

    fn min_data_points(&self) -> usize {
        self.period + 2
    }

    fn calculate(&self, series: &PriceSeries) -> Result<IndicatorOutput, IndicatorError> {
        ensure_min_data(series, self.min_data_points())?;

        let roc = indicators::roc(&series.close, self.period);

        let entries = indicators::crosses_above(&roc, self.threshold);
        let exits = indicators::crosses_below(&roc, 0.0);

        let strength = roc
            .iter()
            .map(|value| 0.5 + value / (2.0 * self.strength_scale))
            .collect();

        Ok(build_output(roc, strength, entries, exits))
    }

    fn parameter_grid(&self) -> ParameterGrid {
        builtin_grid()
            .with_values("period", vec![5.0, 10.0, 20.0])
            .with_values("threshold", vec![0.05, 0.1, 0.2])
    }
}
