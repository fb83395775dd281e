use crate::models::parse_parameter_assignments;
use crate::strategy::{create_indicator, resolve_indicator_name};
use anyhow::Result;
use chrono::NaiveDate;
use log::info;
use std::path::Path;

pub fn run(
    indicator: &str,
    data: &Path,
    output: &Path,
    params: &[String],
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<()> {
    let name = resolve_indicator_name(indicator)?;
    let parameters = parse_parameter_assignments(params)?;
    let instance = create_indicator(name, &parameters)?;
    let series = super::load_series(data, start_date, end_date)?;

    let frame = instance.ml_features(&series)?;
    frame.write_csv(output)?;
    info!(
        "Wrote {} feature rows x {} columns for {} to {}",
        frame.rows(),
        frame.names().len(),
        name,
        output.display()
    );
    Ok(())
}
