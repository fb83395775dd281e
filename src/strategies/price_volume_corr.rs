use crate::error::IndicatorError;
use crate::handbook::ParameterGrid;
use crate::indicators;
use crate::models::*;
use crate::param_utils::{get_bounded_param, get_period_param};
use crate::strategy_utils::{build_output, builtin_grid, ensure_min_data};
use std::collections::HashMap;

/// Rolling correlation between bar returns and volume changes. Entries need
/// volume confirming an up bar.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceVolumeCorrIndicator {
    period: usize,
    threshold: f64,
}

impl PriceVolumeCorrIndicator {
    pub fn new(parameters: &HashMap<String, f64>) -> Result<Self, IndicatorError> {
        let period = get_period_param(parameters, "period", 20, 3)?;
        let threshold = get_bounded_param(parameters, "threshold", 0.3, -1.0, 1.0)?;
        Ok(Self { period, threshold })
    }
}

impl super::Indicator for PriceVolumeCorrIndicator {
    fn name(&self) -> &str {
        "price_volume_corr"
    }

    fn min_data_points(&self) -> usize {
        self.period + 2
    }

    fn calculate(&self, series: &PriceSeries) -> Result<IndicatorOutput, IndicatorError> {
        ensure_min_data(series, self.min_data_points())?;

        let returns = indicators::pct_change(&series.close, 1);
        let volume_change = indicators::pct_change(&series.volume, 1);
        let corr = indicators::rolling_corr(&returns, &volume_change, self.period);

        let crossed = indicators::crosses_above(&corr, self.threshold);
        let entries = crossed
            .iter()
            .zip(returns.iter())
            .map(|(cross, ret)| *cross && *ret > 0.0)
            .collect();
        let exits = indicators::crosses_below(&corr, 0.0);

        let strength = corr.iter().map(|c| (c + 1.0) / 2.0).collect();

        Ok(build_output(corr, strength, entries, exits))
    }

    fn parameter_grid(&self) -> ParameterGrid {
        builtin_grid()
            .with_values("period", vec![10.0, 20.0, 40.0])
            .with_values("threshold", vec![0.2, 0.3, 0.5])
    }
}
