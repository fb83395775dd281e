use crate::error::IndicatorError;
use crate::features::{build_features, FeatureFrame};
use crate::handbook::ParameterGrid;
use crate::models::*;
use crate::signals::{dynamic_signal_pair, fixed_signal_pair};
use crate::simulator::FixedExitParams;
use anyhow::Result;
use std::collections::HashMap;

/// Uniform surface shared by every indicator adapter. Adapters only supply
/// `calculate`; the signal modes and feature extraction are shared.
pub trait Indicator: Send + Sync {
    fn name(&self) -> &str;

    fn min_data_points(&self) -> usize;

    fn calculate(&self, series: &PriceSeries) -> Result<IndicatorOutput, IndicatorError>;

    /// Built-in search grid used when no handbook entry is available.
    fn parameter_grid(&self) -> ParameterGrid;

    fn generate_signals_fixed(
        &self,
        series: &PriceSeries,
        params: &FixedExitParams,
    ) -> Result<SignalPair, IndicatorError> {
        let output = self.calculate(series)?;
        fixed_signal_pair(series, output, params)
    }

    fn generate_signals_dynamic(&self, series: &PriceSeries) -> Result<SignalPair, IndicatorError> {
        let output = self.calculate(series)?;
        Ok(dynamic_signal_pair(output))
    }

    fn ml_features(&self, series: &PriceSeries) -> Result<FeatureFrame, IndicatorError> {
        let output = self.calculate(series)?;
        build_features(series, &output)
    }
}

#[path = "strategies/rsi.rs"]
pub mod rsi;

pub use rsi::RsiIndicator;

#[path = "strategies/macd.rs"]
pub mod macd;

pub use macd::MacdIndicator;

#[path = "strategies/williams_r.rs"]
pub mod williams_r;

pub use williams_r::WilliamsRIndicator;

#[path = "strategies/bollinger_zscore.rs"]
pub mod bollinger_zscore;

pub use bollinger_zscore::BollingerZScoreIndicator;

#[path = "strategies/roc_momentum.rs"]
pub mod roc_momentum;

pub use roc_momentum::RocMomentumIndicator;

#[path = "strategies/atr_breakout.rs"]
pub mod atr_breakout;

pub use atr_breakout::AtrBreakoutIndicator;

#[path = "strategies/price_volume_corr.rs"]
pub mod price_volume_corr;

pub use price_volume_corr::PriceVolumeCorrIndicator;

#[path = "strategies/percentile_rank.rs"]
pub mod percentile_rank;

pub use percentile_rank::PercentileRankIndicator;

/// Registered adapters, in handbook numbering order (number = index + 1).
pub const INDICATOR_NAMES: [&str; 8] = [
    "rsi",
    "macd",
    "williams_r",
    "bollinger_zscore",
    "roc_momentum",
    "atr_breakout",
    "price_volume_corr",
    "percentile_rank",
];

pub fn indicator_name_for_number(number: u32) -> Option<&'static str> {
    let index = usize::try_from(number).ok()?.checked_sub(1)?;
    INDICATOR_NAMES.get(index).copied()
}

pub fn indicator_number_for_name(name: &str) -> Option<u32> {
    INDICATOR_NAMES
        .iter()
        .position(|candidate| *candidate == name)
        .map(|index| index as u32 + 1)
}

pub fn create_indicator(
    name: &str,
    parameters: &HashMap<String, f64>,
) -> Result<Box<dyn Indicator>> {
    let indicator: Box<dyn Indicator> = match name {
        "rsi" => Box::new(RsiIndicator::new(parameters)?),
        "macd" => Box::new(MacdIndicator::new(parameters)?),
        "williams_r" => Box::new(WilliamsRIndicator::new(parameters)?),
        "bollinger_zscore" => Box::new(BollingerZScoreIndicator::new(parameters)?),
        "roc_momentum" => Box::new(RocMomentumIndicator::new(parameters)?),
        "atr_breakout" => Box::new(AtrBreakoutIndicator::new(parameters)?),
        "price_volume_corr" => Box::new(PriceVolumeCorrIndicator::new(parameters)?),
        "percentile_rank" => Box::new(PercentileRankIndicator::new(parameters)?),
        _ => return Err(anyhow::anyhow!("Unknown indicator: {}", name)),
    };
    Ok(indicator)
}

/// Accepts either a registered name or a handbook number.
pub fn resolve_indicator_name(name_or_number: &str) -> Result<&'static str> {
    let trimmed = name_or_number.trim();
    if let Ok(number) = trimmed.parse::<u32>() {
        return indicator_name_for_number(number)
            .ok_or_else(|| anyhow::anyhow!("No indicator registered under number {}", number));
    }
    INDICATOR_NAMES
        .iter()
        .copied()
        .find(|candidate| candidate.eq_ignore_ascii_case(trimmed))
        .ok_or_else(|| anyhow::anyhow!("Unknown indicator: {}", trimmed))
}
