use crate::error::IndicatorError;
use crate::handbook::ParameterGrid;
use crate::indicators::normalize_strength;
use crate::models::{IndicatorOutput, PriceSeries};

/// Default take-profit choices for built-in grids, in pips
pub const BUILTIN_TP_PIPS: [f64; 3] = [30.0, 50.0, 100.0];

/// Default stop-loss choices for built-in grids, in pips
pub const BUILTIN_SL_PIPS: [f64; 3] = [20.0, 30.0, 50.0];

/// Fail with `InsufficientData` when the series is shorter than required
pub fn ensure_min_data(series: &PriceSeries, required: usize) -> Result<(), IndicatorError> {
    if series.len() < required {
        return Err(IndicatorError::InsufficientData {
            required,
            available: series.len(),
        });
    }
    Ok(())
}

/// Assemble an output, mapping raw strength values into `[0, 1]`
pub fn build_output(
    signal: Vec<f64>,
    raw_strength: Vec<f64>,
    entries: Vec<bool>,
    exits: Vec<bool>,
) -> IndicatorOutput {
    IndicatorOutput {
        signal,
        signal_strength: raw_strength.into_iter().map(normalize_strength).collect(),
        entries,
        exits,
    }
}

/// Start a built-in grid with the shared tp/sl choices
pub fn builtin_grid() -> ParameterGrid {
    ParameterGrid::new()
        .with_exit_values(BUILTIN_TP_PIPS.to_vec(), BUILTIN_SL_PIPS.to_vec())
}
