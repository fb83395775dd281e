use thiserror::Error;

/// Typed outcomes of indicator computation and signal simulation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    #[error("insufficient data: {required} bars required, {available} available")]
    InsufficientData { required: usize, available: usize },

    #[error("length mismatch for {series}: expected {expected}, got {actual}")]
    LengthMismatch {
        series: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid parameter {name}={value}: {reason}")]
    InvalidParameter {
        name: String,
        value: f64,
        reason: String,
    },
}

impl IndicatorError {
    pub fn invalid_parameter<S: Into<String>>(name: &str, value: f64, reason: S) -> Self {
        IndicatorError::InvalidParameter {
            name: name.to_string(),
            value,
            reason: reason.into(),
        }
    }
}

/// Violations of the price bar invariants found while loading market data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("price series is empty")]
    Empty,

    #[error("timestamp at row {index} is not strictly after the previous row")]
    NonIncreasingTimestamp { index: usize },

    #[error("invalid bar at row {index}: {reason}")]
    InvalidBar { index: usize, reason: String },
}
