use anyhow::{Context, Result};
use std::path::Path;

use crate::error::IndicatorError;
use crate::indicators;
use crate::models::{IndicatorOutput, PriceSeries};

const VOLATILITY_WINDOW: usize = 20;
const VOLUME_WINDOW: usize = 20;
const TREND_WINDOW: usize = 20;

/// Named feature columns aligned with a price series.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureFrame {
    pub timestamps: Vec<chrono::DateTime<chrono::Utc>>,
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl FeatureFrame {
    pub fn new(timestamps: Vec<chrono::DateTime<chrono::Utc>>) -> Self {
        Self {
            timestamps,
            names: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn push_column<S: Into<String>>(
        &mut self,
        name: S,
        values: Vec<f64>,
    ) -> Result<(), IndicatorError> {
        if values.len() != self.timestamps.len() {
            return Err(IndicatorError::LengthMismatch {
                series: "feature column",
                expected: self.timestamps.len(),
                actual: values.len(),
            });
        }
        self.names.push(name.into());
        self.columns.push(values);
        Ok(())
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|candidate| candidate == name)
            .map(|index| self.columns[index].as_slice())
    }

    pub fn rows(&self) -> usize {
        self.timestamps.len()
    }

    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("failed to create {}", path.display()))?;

        let mut header = Vec::with_capacity(self.names.len() + 1);
        header.push("timestamp".to_string());
        header.extend(self.names.iter().cloned());
        writer.write_record(&header)?;

        for (row, timestamp) in self.timestamps.iter().enumerate() {
            let mut record = Vec::with_capacity(self.columns.len() + 1);
            record.push(timestamp.to_rfc3339());
            for column in &self.columns {
                let value = column[row];
                record.push(if value.is_finite() {
                    value.to_string()
                } else {
                    String::new()
                });
            }
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }
}

/// Standard feature set for downstream ML use: the indicator's own signal
/// and strength plus price/volume context columns.
pub fn build_features(
    series: &PriceSeries,
    output: &IndicatorOutput,
) -> Result<FeatureFrame, IndicatorError> {
    let returns_1 = indicators::pct_change(&series.close, 1);
    let returns_5 = indicators::pct_change(&series.close, 5);
    let volatility = indicators::rolling_std(&returns_1, VOLATILITY_WINDOW);
    let range_ratio: Vec<f64> = series
        .high
        .iter()
        .zip(series.low.iter().zip(series.close.iter()))
        .map(|(high, (low, close))| {
            if *close != 0.0 {
                (high - low) / close
            } else {
                f64::NAN
            }
        })
        .collect();
    let volume_zscore = indicators::rolling_zscore(&series.volume, VOLUME_WINDOW);
    let trend_basis = indicators::sma(&series.close, TREND_WINDOW);
    let close_sma_ratio: Vec<f64> = series
        .close
        .iter()
        .zip(trend_basis.iter())
        .map(|(close, basis)| {
            if *basis != 0.0 {
                close / basis
            } else {
                f64::NAN
            }
        })
        .collect();

    let columns: Vec<(&str, Vec<f64>)> = vec![
        ("signal", output.signal.clone()),
        ("signal_strength", output.signal_strength.clone()),
        ("return_1", returns_1),
        ("return_5", returns_5),
        ("volatility_20", volatility),
        ("range_ratio", range_ratio),
        ("volume_zscore_20", volume_zscore),
        ("close_sma_ratio_20", close_sma_ratio),
    ];

    let mut frame = FeatureFrame::new(series.timestamps.clone());
    for (name, values) in columns {
        frame.push_column(name, values)?;
    }
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn push_column_rejects_wrong_length() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut frame = FeatureFrame::new(vec![start, start + Duration::hours(1)]);
        assert!(frame.push_column("a", vec![1.0]).is_err());
        assert!(frame.push_column("a", vec![1.0, 2.0]).is_ok());
        assert_eq!(frame.column("a"), Some(&[1.0, 2.0][..]));
        assert_eq!(frame.rows(), 2);
    }

    #[test]
    fn build_features_rejects_misaligned_output() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bars: Vec<crate::models::PriceBar> = (0..3)
            .map(|i| crate::models::PriceBar {
                timestamp: start + Duration::hours(i),
                open: 1.1,
                high: 1.2,
                low: 1.0,
                close: 1.1,
                volume: 10.0,
            })
            .collect();
        let series = PriceSeries::from_bars(&bars).unwrap();
        let output = IndicatorOutput {
            signal: vec![0.0; 2],
            signal_strength: vec![0.5; 3],
            entries: vec![false; 3],
            exits: vec![false; 3],
        };
        assert_eq!(
            build_features(&series, &output),
            Err(IndicatorError::LengthMismatch {
                series: "feature column",
                expected: 3,
                actual: 2
            })
        );
    }
}
