use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::info;
use serde::Deserialize;
use std::path::Path;

use crate::models::{PriceBar, PriceSeries};

#[derive(Debug, Deserialize)]
struct CsvBar {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: Option<f64>,
}

/// Parse an RFC 3339, `%Y-%m-%d %H:%M:%S` or `%Y-%m-%d` timestamp as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Ok(parsed.and_utc());
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = parsed.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(anyhow!("Unrecognized timestamp '{}'", trimmed))
}

pub fn read_bars<R: std::io::Read>(reader: R) -> Result<Vec<PriceBar>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut bars = Vec::new();
    for (row, record) in csv_reader.deserialize::<CsvBar>().enumerate() {
        let record = record.with_context(|| format!("malformed price row {}", row + 1))?;
        let timestamp = parse_timestamp(&record.timestamp)
            .with_context(|| format!("bad timestamp in price row {}", row + 1))?;
        bars.push(PriceBar {
            timestamp,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume.unwrap_or(0.0),
        });
    }
    Ok(bars)
}

/// Load and validate an OHLCV CSV with a
/// `timestamp,open,high,low,close,volume` header.
pub fn load_price_series<P: AsRef<Path>>(path: P) -> Result<PriceSeries> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open price data {}", path.display()))?;
    let bars = read_bars(std::io::BufReader::new(file))
        .with_context(|| format!("failed to read price data {}", path.display()))?;
    let series = PriceSeries::from_bars(&bars)
        .with_context(|| format!("invalid price data in {}", path.display()))?;
    info!(
        "Loaded {} bars from {} ({} - {})",
        series.len(),
        path.display(),
        series.timestamps[0].format("%Y-%m-%d %H:%M"),
        series.timestamps[series.len() - 1].format("%Y-%m-%d %H:%M")
    );
    Ok(series)
}

/// Keep bars whose date falls inside the inclusive range.
pub fn restrict_to_date_range(
    series: &PriceSeries,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> PriceSeries {
    let start = series
        .timestamps
        .iter()
        .position(|ts| start_date.map_or(true, |start| ts.date_naive() >= start))
        .unwrap_or(series.len());
    let end = series
        .timestamps
        .iter()
        .rposition(|ts| end_date.map_or(true, |end| ts.date_naive() <= end))
        .map(|index| index + 1)
        .unwrap_or(0);
    if start >= end {
        return series.slice(0..0);
    }
    series.slice(start..end)
}
