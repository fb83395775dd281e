use crate::error::IndicatorError;
use std::collections::HashMap;

/// Extract a parameter as f64 with a default value
pub fn get_param_f64(params: &HashMap<String, f64>, key: &str, default: f64) -> f64 {
    params.get(key).copied().unwrap_or(default)
}

/// Extract a finite parameter as f64, rejecting NaN and infinities
pub fn get_finite_param(
    params: &HashMap<String, f64>,
    key: &str,
    default: f64,
) -> Result<f64, IndicatorError> {
    let value = get_param_f64(params, key, default);
    if !value.is_finite() {
        return Err(IndicatorError::invalid_parameter(key, value, "must be finite"));
    }
    Ok(value)
}

/// Extract a window length, rounded, with a minimum value
pub fn get_period_param(
    params: &HashMap<String, f64>,
    key: &str,
    default: usize,
    min: usize,
) -> Result<usize, IndicatorError> {
    let raw = get_finite_param(params, key, default as f64)?;
    let rounded = raw.round();
    if (raw - rounded).abs() > 1e-9 {
        return Err(IndicatorError::invalid_parameter(key, raw, "must be a whole number"));
    }
    if rounded < min as f64 {
        return Err(IndicatorError::invalid_parameter(
            key,
            raw,
            format!("must be >= {}", min),
        ));
    }
    Ok(rounded as usize)
}

/// Extract a finite parameter constrained to an inclusive range
pub fn get_bounded_param(
    params: &HashMap<String, f64>,
    key: &str,
    default: f64,
    min: f64,
    max: f64,
) -> Result<f64, IndicatorError> {
    let value = get_finite_param(params, key, default)?;
    if value < min || value > max {
        return Err(IndicatorError::invalid_parameter(
            key,
            value,
            format!("must be within [{}, {}]", min, max),
        ));
    }
    Ok(value)
}

/// Extract a strictly positive finite parameter
pub fn get_positive_param(
    params: &HashMap<String, f64>,
    key: &str,
    default: f64,
) -> Result<f64, IndicatorError> {
    let value = get_finite_param(params, key, default)?;
    if value <= 0.0 {
        return Err(IndicatorError::invalid_parameter(key, value, "must be > 0"));
    }
    Ok(value)
}

/// Require `lower < upper` for a pair of already-extracted parameters
pub fn ensure_ordered(
    lower_key: &str,
    lower: f64,
    upper_key: &str,
    upper: f64,
) -> Result<(), IndicatorError> {
    if lower >= upper {
        return Err(IndicatorError::invalid_parameter(
            lower_key,
            lower,
            format!("must be < {} ({})", upper_key, upper),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn period_uses_default_and_rejects_fractions() {
        assert_eq!(get_period_param(&params(&[]), "period", 14, 2).unwrap(), 14);
        assert_eq!(
            get_period_param(&params(&[("period", 21.0)]), "period", 14, 2).unwrap(),
            21
        );
        assert!(get_period_param(&params(&[("period", 2.5)]), "period", 14, 2).is_err());
        assert!(get_period_param(&params(&[("period", 1.0)]), "period", 14, 2).is_err());
    }

    #[test]
    fn bounded_param_checks_range() {
        let p = params(&[("level", 120.0)]);
        assert!(get_bounded_param(&p, "level", 30.0, 0.0, 100.0).is_err());
        assert_eq!(
            get_bounded_param(&params(&[]), "level", 30.0, 0.0, 100.0).unwrap(),
            30.0
        );
    }

    #[test]
    fn ordering_violation_names_both_keys() {
        let err = ensure_ordered("fast", 26.0, "slow", 12.0).unwrap_err();
        assert!(err.to_string().contains("slow"));
    }
}
