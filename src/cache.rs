use crate::error::IndicatorError;
use crate::models::*;
use crate::strategy::create_indicator;
use dashmap::DashMap;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

/// Memoized indicator outputs keyed by indicator, parameters and series
/// fingerprint. Exit brackets never change `calculate`, so every tp/sl pair
/// of a grid shares one entry per entry-parameter set.
#[derive(Clone, Default)]
pub struct IndicatorCache {
    outputs: Arc<DashMap<String, CachedOutput>>,
}

#[derive(Debug, Clone)]
pub enum CachedOutput {
    Ready(Arc<IndicatorOutput>),
    Rejected(IndicatorError),
}

impl IndicatorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_cache_key(
        indicator: &str,
        parameters: &HashMap<String, f64>,
        series_fingerprint: u64,
    ) -> String {
        format!(
            "{}:{:016x}:{}",
            indicator,
            series_fingerprint,
            parameter_signature(parameters)
        )
    }

    /// Construct and run the indicator once per key. Construction and
    /// calculation errors are cached alongside successful outputs.
    pub fn get_or_compute(
        &self,
        indicator: &str,
        parameters: &HashMap<String, f64>,
        series: &PriceSeries,
    ) -> Result<Arc<IndicatorOutput>, IndicatorError> {
        self.get_or_compute_with_fingerprint(indicator, parameters, series, series.fingerprint())
    }

    /// Same as `get_or_compute` with the series fingerprint computed by the
    /// caller, so a sweep hashes its series once.
    pub fn get_or_compute_with_fingerprint(
        &self,
        indicator: &str,
        parameters: &HashMap<String, f64>,
        series: &PriceSeries,
        series_fingerprint: u64,
    ) -> Result<Arc<IndicatorOutput>, IndicatorError> {
        let cache_key = Self::get_cache_key(indicator, parameters, series_fingerprint);

        if let Some(cached) = self.outputs.get(&cache_key) {
            return cached.value().clone().into_result();
        }

        let computed = match compute_output(indicator, parameters, series) {
            Ok(output) => CachedOutput::Ready(Arc::new(output)),
            Err(err) => CachedOutput::Rejected(err),
        };
        debug!("Cached indicator output for {}", cache_key);

        // Another worker may have raced us here; keep whichever landed first.
        self.outputs
            .entry(cache_key)
            .or_insert(computed)
            .value()
            .clone()
            .into_result()
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

impl CachedOutput {
    fn into_result(self) -> Result<Arc<IndicatorOutput>, IndicatorError> {
        match self {
            CachedOutput::Ready(output) => Ok(output),
            CachedOutput::Rejected(err) => Err(err),
        }
    }
}

fn compute_output(
    indicator: &str,
    parameters: &HashMap<String, f64>,
    series: &PriceSeries,
) -> Result<IndicatorOutput, IndicatorError> {
    let instance = create_indicator(indicator, parameters).map_err(|err| {
        match err.downcast::<IndicatorError>() {
            Ok(indicator_err) => indicator_err,
            Err(other) => IndicatorError::invalid_parameter("indicator", f64::NAN, other.to_string()),
        }
    })?;
    instance.calculate(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn series(len: usize) -> PriceSeries {
        wave(len, 0.3)
    }

    fn wave(len: usize, step: f64) -> PriceSeries {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bars: Vec<PriceBar> = (0..len)
            .map(|i| {
                let close = 1.1 + 0.01 * (i as f64 * step).sin();
                PriceBar {
                    timestamp: start + Duration::hours(i as i64),
                    open: close,
                    high: close + 0.001,
                    low: close - 0.001,
                    close,
                    volume: 1000.0 + i as f64,
                }
            })
            .collect();
        PriceSeries::from_bars(&bars).unwrap()
    }

    #[test]
    fn key_ignores_parameter_order() {
        let mut a = HashMap::new();
        a.insert("period".to_string(), 14.0);
        a.insert("oversold".to_string(), 30.0);
        let mut b = HashMap::new();
        b.insert("oversold".to_string(), 30.0);
        b.insert("period".to_string(), 14.0);
        assert_eq!(
            IndicatorCache::get_cache_key("rsi", &a, 7),
            IndicatorCache::get_cache_key("rsi", &b, 7)
        );
        assert_ne!(
            IndicatorCache::get_cache_key("rsi", &a, 7),
            IndicatorCache::get_cache_key("rsi", &a, 8)
        );
    }

    #[test]
    fn reuses_output_for_same_parameters() {
        let cache = IndicatorCache::new();
        let data = series(120);
        let params = HashMap::new();
        let first = cache.get_or_compute("rsi", &params, &data).unwrap();
        let second = cache.get_or_compute("rsi", &params, &data).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn different_series_get_their_own_output() {
        let cache = IndicatorCache::new();
        let params = HashMap::new();
        let slow = wave(120, 0.1);
        let fast = wave(120, 0.45);
        let first = cache.get_or_compute("rsi", &params, &slow).unwrap();
        let second = cache.get_or_compute("rsi", &params, &fast).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 2);

        let expected = create_indicator("rsi", &params).unwrap().calculate(&fast).unwrap();
        assert_eq!(second.entries, expected.entries);
        assert_eq!(second.exits, expected.exits);
    }

    #[test]
    fn caches_insufficient_data() {
        let cache = IndicatorCache::new();
        let data = series(5);
        let err = cache.get_or_compute("rsi", &HashMap::new(), &data).unwrap_err();
        assert!(matches!(err, IndicatorError::InsufficientData { .. }));
        assert_eq!(cache.len(), 1);
    }
}
