use crate::listing::cleanup_listings;
use anyhow::Result;
use std::path::Path;

pub fn run(dir: &Path, timeframe: &str) -> Result<()> {
    let removed = cleanup_listings(dir, timeframe)?;
    if removed.is_empty() {
        println!("Nothing to remove for {}", timeframe);
    }
    for path in removed {
        println!("removed {}", path.display());
    }
    Ok(())
}
