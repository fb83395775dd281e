use crate::listing::sync_listings;
use anyhow::Result;
use std::path::Path;

pub fn run(log_path: &Path, dir: &Path, timeframe: &str) -> Result<()> {
    let report = sync_listings(log_path, dir, timeframe)?;
    for (status, count) in &report.counts {
        println!("{}: {}", status, count);
    }
    if report.malformed_lines > 0 {
        println!("skipped malformed lines: {}", report.malformed_lines);
    }
    Ok(())
}
