use crate::error::IndicatorError;
use crate::handbook::ParameterGrid;
use crate::indicators;
use crate::models::*;
use crate::param_utils::{get_bounded_param, get_period_param};
use crate::strategy_utils::{build_output, builtin_grid, ensure_min_data};
use std::collections::HashMap;

/// Mean reversion on the close's rolling z-score (Bollinger band distance).
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerZScoreIndicator {
    period: usize,
    entry_z: f64,
    exit_z: f64,
}

impl BollingerZScoreIndicator {
    pub fn new(parameters: &HashMap<String, f64>) -> Result<Self, IndicatorError> {
        let period = get_period_param(parameters, "period", 20, 2)?;
        let entry_z = get_bounded_param(parameters, "entry_z", 2.0, 0.1, 10.0)?;
        let exit_z = get_bounded_param(parameters, "exit_z", 0.0, -10.0, 10.0)?;
        if -entry_z >= exit_z {
            return Err(IndicatorError::invalid_parameter(
                "exit_z",
                exit_z,
                format!("must be above -entry_z ({})", -entry_z),
            ));
        }
        Ok(Self {
            period,
            entry_z,
            exit_z,
        })
    }
}

impl super::Indicator for BollingerZScoreIndicator {
    fn name(&self) -> &str {
        "bollinger_zscore"
    }

    fn min_data_points(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, series: &PriceSeries) -> Result<IndicatorOutput, IndicatorError> {
        ensure_min_data(series, self.min_data_points())?;

        let zscore = indicators::rolling_zscore(&series.close, self.period);

        // Re-enter the band from below the lower edge
        let entries = indicators::crosses_above(&zscore, -self.entry_z);
        let exits = indicators::crosses_above(&zscore, self.exit_z);

        let strength = zscore
            .iter()
            .map(|z| 0.5 - z / (2.0 * self.entry_z))
            .collect();

        Ok(build_output(zscore, strength, entries, exits))
    }

    fn parameter_grid(&self) -> ParameterGrid {
        builtin_grid()
            .with_values("period", vec![14.0, 20.0, 30.0])
            .with_values("entry_z", vec![1.5, 2.0, 2.5])
            .with_values("exit_z", vec![0.0, 0.5])
    }
}
