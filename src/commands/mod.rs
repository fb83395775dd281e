pub mod candidates;
pub mod cleanup;
pub mod features;
pub mod grid;
pub mod quicktest;
pub mod sweep;
pub mod sync_listings;

use crate::market_data::{load_price_series, restrict_to_date_range};
use crate::models::PriceSeries;
use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use log::info;
use std::path::Path;

/// Load a price CSV and trim it to the optional inclusive date window.
pub(crate) fn load_series(
    path: &Path,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<PriceSeries> {
    let series = load_price_series(path)?;
    if start_date.is_none() && end_date.is_none() {
        return Ok(series);
    }
    let restricted = restrict_to_date_range(&series, start_date, end_date);
    if restricted.is_empty() {
        return Err(anyhow!(
            "No bars in {} between {} and {}",
            path.display(),
            start_date.map_or_else(|| "start".to_string(), |d| d.to_string()),
            end_date.map_or_else(|| "end".to_string(), |d| d.to_string())
        ));
    }
    info!(
        "Restricted {} bars to {} within the requested window",
        series.len(),
        restricted.len()
    );
    Ok(restricted)
}
