use crate::config::EngineSettings;
use crate::handbook::{load_handbook_or_warn, resolve_grid, GridPoint, GridSource};
use crate::strategy::{create_indicator, resolve_indicator_name};
use anyhow::Result;
use log::info;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
struct GridListing {
    indicator: String,
    source: GridSource,
    size: usize,
    points: Vec<GridPoint>,
}

pub fn run(
    settings: &EngineSettings,
    indicator: &str,
    number: Option<u32>,
    handbook_path: Option<PathBuf>,
) -> Result<()> {
    let name = resolve_indicator_name(indicator)?;
    let instance = create_indicator(name, &HashMap::new())?;
    let handbook_path = handbook_path.or_else(|| settings.handbook_path.clone());
    let handbook = load_handbook_or_warn(handbook_path.as_deref());

    let (grid, source) = resolve_grid(
        instance.as_ref(),
        handbook.as_ref(),
        number,
        settings.default_tp_pips,
        settings.default_sl_pips,
    );
    info!("Resolved {:?} grid for {} with {} points", source, name, grid.len());

    let listing = GridListing {
        indicator: name.to_string(),
        source,
        size: grid.len(),
        points: grid.points(),
    };
    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(())
}
