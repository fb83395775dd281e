use anyhow::{anyhow, Result as AnyResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Range;
use std::str::FromStr;

use crate::error::DataError;
use crate::simulator::FixedExitTrade;

/// One row of the OHLCV series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// Checks the bar-level invariants: finite prices, `high` on top,
    /// `low` at the bottom and a non-negative volume.
    pub fn validate(&self, index: usize) -> Result<(), DataError> {
        let fields = [self.open, self.high, self.low, self.close, self.volume];
        if fields.iter().any(|value| !value.is_finite()) {
            return Err(DataError::InvalidBar {
                index,
                reason: "non-finite price or volume".to_string(),
            });
        }
        if self.high < self.open.max(self.close).max(self.low) {
            return Err(DataError::InvalidBar {
                index,
                reason: format!(
                    "high {} below max(open {}, close {}, low {})",
                    self.high, self.open, self.close, self.low
                ),
            });
        }
        if self.low > self.open.min(self.close).min(self.high) {
            return Err(DataError::InvalidBar {
                index,
                reason: format!(
                    "low {} above min(open {}, close {}, high {})",
                    self.low, self.open, self.close, self.high
                ),
            });
        }
        if self.volume < 0.0 {
            return Err(DataError::InvalidBar {
                index,
                reason: format!("negative volume {}", self.volume),
            });
        }
        Ok(())
    }
}

/// Columnar view of a validated bar sequence. Every column has the same
/// length and timestamps are strictly increasing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    pub timestamps: Vec<DateTime<Utc>>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<f64>,
}

impl PriceSeries {
    pub fn from_bars(bars: &[PriceBar]) -> Result<Self, DataError> {
        if bars.is_empty() {
            return Err(DataError::Empty);
        }
        for (index, bar) in bars.iter().enumerate() {
            bar.validate(index)?;
            if index > 0 && bar.timestamp <= bars[index - 1].timestamp {
                return Err(DataError::NonIncreasingTimestamp { index });
            }
        }
        Ok(Self::from_bars_unchecked(bars))
    }

    /// Builds the columns without checking invariants.
    pub fn from_bars_unchecked(bars: &[PriceBar]) -> Self {
        let mut series = PriceSeries {
            timestamps: Vec::with_capacity(bars.len()),
            open: Vec::with_capacity(bars.len()),
            high: Vec::with_capacity(bars.len()),
            low: Vec::with_capacity(bars.len()),
            close: Vec::with_capacity(bars.len()),
            volume: Vec::with_capacity(bars.len()),
        };
        for bar in bars {
            series.timestamps.push(bar.timestamp);
            series.open.push(bar.open);
            series.high.push(bar.high);
            series.low.push(bar.low);
            series.close.push(bar.close);
            series.volume.push(bar.volume);
        }
        series
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    /// Hash of every timestamp and OHLCV value. Two series share a
    /// fingerprint only when their bars are identical.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.timestamps.hash(&mut hasher);
        for column in [&self.open, &self.high, &self.low, &self.close, &self.volume] {
            for value in column {
                value.to_bits().hash(&mut hasher);
            }
        }
        hasher.finish()
    }

    pub fn slice(&self, range: Range<usize>) -> Self {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        PriceSeries {
            timestamps: self.timestamps[start..end].to_vec(),
            open: self.open[start..end].to_vec(),
            high: self.high[start..end].to_vec(),
            low: self.low[start..end].to_vec(),
            close: self.close[start..end].to_vec(),
            volume: self.volume[start..end].to_vec(),
        }
    }
}

/// Raw indicator computation: the signal line, its normalized strength and
/// the two boolean conditions an adapter derives from it.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorOutput {
    pub signal: Vec<f64>,
    pub signal_strength: Vec<f64>,
    pub entries: Vec<bool>,
    pub exits: Vec<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExitMode {
    Fixed,
    Dynamic,
}

impl ExitMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitMode::Fixed => "fixed",
            ExitMode::Dynamic => "dynamic",
        }
    }
}

impl fmt::Display for ExitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExitMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fixed" => Ok(ExitMode::Fixed),
            "dynamic" => Ok(ExitMode::Dynamic),
            other => Err(anyhow!("Unknown exit mode '{}'", other)),
        }
    }
}

/// Entry/exit pair handed to the downstream portfolio sink.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalPair {
    pub mode: ExitMode,
    pub entries: Vec<bool>,
    pub exits: Vec<bool>,
    pub signal_strength: Vec<f64>,
    pub trades: Vec<FixedExitTrade>,
    pub open_at_end: bool,
}

impl SignalPair {
    pub fn entry_count(&self) -> usize {
        self.entries.iter().filter(|&&flag| flag).count()
    }

    pub fn exit_count(&self) -> usize {
        self.exits.iter().filter(|&&flag| flag).count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SignalSummary {
    pub indicator: String,
    pub mode: ExitMode,
    pub bars: usize,
    pub entry_signals: usize,
    pub exit_signals: usize,
    pub trades_opened: usize,
    pub open_at_end: bool,
    pub first_timestamp: Option<DateTime<Utc>>,
    pub last_timestamp: Option<DateTime<Utc>>,
}

impl SignalSummary {
    pub fn from_pair(indicator: &str, series: &PriceSeries, pair: &SignalPair) -> Self {
        SignalSummary {
            indicator: indicator.to_string(),
            mode: pair.mode,
            bars: series.len(),
            entry_signals: pair.entry_count(),
            exit_signals: pair.exit_count(),
            trades_opened: pair.trades.len(),
            open_at_end: pair.open_at_end,
            first_timestamp: series.timestamps.first().copied(),
            last_timestamp: series.timestamps.last().copied(),
        }
    }
}

/// Stable textual key for a parameter map (sorted by name).
pub fn parameter_signature(parameters: &HashMap<String, f64>) -> String {
    let mut sorted: Vec<_> = parameters.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    format!("{:?}", sorted)
}

/// Parses `key=value` pairs as given on the command line.
pub fn parse_parameter_assignments(assignments: &[String]) -> AnyResult<HashMap<String, f64>> {
    let mut parameters = HashMap::with_capacity(assignments.len());
    for assignment in assignments {
        let (key, raw) = assignment
            .split_once('=')
            .ok_or_else(|| anyhow!("Parameter '{}' must be written as key=value", assignment))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(anyhow!("Parameter '{}' has an empty name", assignment));
        }
        let value = raw
            .trim()
            .parse::<f64>()
            .map_err(|_| anyhow!("Parameter {} must be a number (value: {})", key, raw))?;
        if !value.is_finite() {
            return Err(anyhow!("Parameter {} must be finite (value: {})", key, raw));
        }
        parameters.insert(key.to_string(), value);
    }
    Ok(parameters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn bar(offset: i64, open: f64, high: f64, low: f64, close: f64) -> PriceBar {
        PriceBar {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(offset),
            open,
            high,
            low,
            close,
            volume: 100.0,
        }
    }

    #[test]
    fn from_bars_rejects_broken_invariants() {
        let bad_high = vec![bar(0, 1.0, 0.9, 0.8, 0.95)];
        assert!(matches!(
            PriceSeries::from_bars(&bad_high),
            Err(DataError::InvalidBar { index: 0, .. })
        ));

        let unordered = vec![bar(1, 1.0, 1.1, 0.9, 1.0), bar(0, 1.0, 1.1, 0.9, 1.0)];
        assert_eq!(
            PriceSeries::from_bars(&unordered),
            Err(DataError::NonIncreasingTimestamp { index: 1 })
        );

        assert_eq!(PriceSeries::from_bars(&[]), Err(DataError::Empty));
    }

    #[test]
    fn slice_clamps_to_series_length() {
        let bars: Vec<PriceBar> = (0..5).map(|i| bar(i, 1.0, 1.2, 0.8, 1.1)).collect();
        let series = PriceSeries::from_bars(&bars).unwrap();
        let tail = series.slice(3..10);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail.timestamps[0], bars[3].timestamp);
    }

    #[test]
    fn parameter_assignments_parse_numbers() {
        let parsed =
            parse_parameter_assignments(&["period=21".to_string(), "oversold = 25.5".to_string()])
                .unwrap();
        assert_eq!(parsed.get("period"), Some(&21.0));
        assert_eq!(parsed.get("oversold"), Some(&25.5));
        assert!(parse_parameter_assignments(&["period".to_string()]).is_err());
        assert!(parse_parameter_assignments(&["period=abc".to_string()]).is_err());
    }

    #[test]
    fn fingerprint_tracks_bar_values() {
        let bars: Vec<PriceBar> = (0..4).map(|i| bar(i, 1.0, 1.2, 0.8, 1.1)).collect();
        let series = PriceSeries::from_bars(&bars).unwrap();
        assert_eq!(series.fingerprint(), series.clone().fingerprint());

        let mut moved = bars.clone();
        moved[2].close = 1.05;
        let moved = PriceSeries::from_bars(&moved).unwrap();
        assert_ne!(series.fingerprint(), moved.fingerprint());
        assert_ne!(series.fingerprint(), series.slice(0..3).fingerprint());
    }

    #[test]
    fn signature_is_order_independent() {
        let mut first = HashMap::new();
        first.insert("b".to_string(), 2.0);
        first.insert("a".to_string(), 1.0);
        let mut second = HashMap::new();
        second.insert("a".to_string(), 1.0);
        second.insert("b".to_string(), 2.0);
        assert_eq!(parameter_signature(&first), parameter_signature(&second));
    }
}
