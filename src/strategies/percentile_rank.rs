use crate::error::IndicatorError;
use crate::handbook::ParameterGrid;
use crate::indicators;
use crate::models::*;
use crate::param_utils::{ensure_ordered, get_bounded_param, get_period_param};
use crate::strategy_utils::{build_output, builtin_grid, ensure_min_data};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct PercentileRankIndicator {
    period: usize,
    low_rank: f64,
    high_rank: f64,
}

impl PercentileRankIndicator {
    pub fn new(parameters: &HashMap<String, f64>) -> Result<Self, IndicatorError> {
        let period = get_period_param(parameters, "period", 50, 5)?;
        let low_rank = get_bounded_param(parameters, "low_rank", 0.2, 0.0, 1.0)?;
        let high_rank = get_bounded_param(parameters, "high_rank", 0.8, 0.0, 1.0)?;
        ensure_ordered("low_rank", low_rank, "high_rank", high_rank)?;
        Ok(Self {
            period,
            low_rank,
            high_rank,
        })
    }
}

impl super::Indicator for PercentileRankIndicator {
    fn name(&self) -> &str {
        "percentile_rank"
    }

    fn min_data_points(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, series: &PriceSeries) -> Result<IndicatorOutput, IndicatorError> {
        ensure_min_data(series, self.min_data_points())?;

        let rank = indicators::rolling_percentile_rank(&series.close, self.period);

        let entries = indicators::crosses_above(&rank, self.low_rank);
        let exits = indicators::crosses_above(&rank, self.high_rank);

        let strength = rank.iter().map(|r| 1.0 - r).collect();

        Ok(build_output(rank, strength, entries, exits))
    }

    fn parameter_grid(&self) -> ParameterGrid {
        builtin_grid()
            .with_values("period", vec![20.0, 50.0, 100.0])
            .with_values("low_rank", vec![0.1, 0.2])
            .with_values("high_rank", vec![0.8, 0.9])
    }
}
