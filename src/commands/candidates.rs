use crate::listing::{build_candidates, candidates_path, RunStatus};
use anyhow::Result;
use std::path::Path;

pub fn run(dir: &Path, timeframe: &str, statuses: &[RunStatus]) -> Result<()> {
    let statuses = if statuses.is_empty() {
        vec![RunStatus::Passed]
    } else {
        statuses.to_vec()
    };
    let candidates = build_candidates(dir, timeframe, &statuses)?;
    println!(
        "{} candidates written to {}",
        candidates.metadata.total,
        candidates_path(dir, timeframe.trim()).display()
    );
    Ok(())
}
