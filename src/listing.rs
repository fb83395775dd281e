use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Outcome recorded for one indicator run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Passed,
    NoTrades,
    Failed,
}

impl RunStatus {
    pub const ALL: [RunStatus; 3] = [RunStatus::Passed, RunStatus::NoTrades, RunStatus::Failed];

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Passed => "passed",
            RunStatus::NoTrades => "no_trades",
            RunStatus::Failed => "failed",
        }
    }

    /// Classify a free-text reason from a run log.
    pub fn from_reason(reason: &str) -> Self {
        let normalized = reason.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "ok" | "success" | "passed" | "pass" => return RunStatus::Passed,
            _ => {}
        }
        let no_trade_markers = ["no trades", "no_trades", "no signals", "no_signals"];
        if no_trade_markers
            .iter()
            .any(|marker| normalized.contains(marker))
        {
            RunStatus::NoTrades
        } else {
            RunStatus::Failed
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "passed" | "pass" | "ok" | "success" => Ok(RunStatus::Passed),
            "no_trades" | "no-trades" => Ok(RunStatus::NoTrades),
            "failed" | "fail" => Ok(RunStatus::Failed),
            other => Err(anyhow!(
                "Unknown status '{}' (expected passed, no_trades or failed)",
                other
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LogRecord {
    indicator: String,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptListing {
    pub scripts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMetadata {
    pub timeframe: String,
    pub total: usize,
    pub counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateListing {
    pub scripts: Vec<String>,
    pub metadata: CandidateMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    pub records: usize,
    pub malformed_lines: usize,
    pub counts: BTreeMap<String, usize>,
    pub written: Vec<PathBuf>,
}

pub fn listing_path(dir: &Path, status: RunStatus, timeframe: &str) -> PathBuf {
    dir.join(format!("{}_{}.json", status.as_str(), timeframe))
}

pub fn candidates_path(dir: &Path, timeframe: &str) -> PathBuf {
    dir.join(format!("candidates_{}.json", timeframe))
}

fn validate_timeframe(timeframe: &str) -> Result<&str> {
    let trimmed = timeframe.trim();
    if trimmed.is_empty()
        || !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(anyhow!("Invalid timeframe '{}'", timeframe));
    }
    Ok(trimmed)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), value)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Group a run log by status and write one listing per status.
pub fn sync_listings(log_path: &Path, out_dir: &Path, timeframe: &str) -> Result<SyncReport> {
    let timeframe = validate_timeframe(timeframe)?;
    let file = std::fs::File::open(log_path)
        .with_context(|| format!("failed to open run log {}", log_path.display()))?;

    let mut grouped: BTreeMap<RunStatus, BTreeSet<String>> = RunStatus::ALL
        .iter()
        .map(|status| (*status, BTreeSet::new()))
        .collect();
    let mut report = SyncReport::default();

    for (line_no, line) in std::io::BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("failed to read {}", log_path.display()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record: LogRecord = match serde_json::from_str(trimmed) {
            Ok(record) => record,
            Err(err) => {
                warn!("Skipping malformed log line {}: {}", line_no + 1, err);
                report.malformed_lines += 1;
                continue;
            }
        };
        let name = record.indicator.trim();
        if name.is_empty() {
            warn!("Skipping log line {} without an indicator name", line_no + 1);
            report.malformed_lines += 1;
            continue;
        }

        let status = match record.status.as_deref() {
            Some(raw) => match raw.parse::<RunStatus>() {
                Ok(status) => status,
                Err(_) => RunStatus::from_reason(raw),
            },
            None => RunStatus::from_reason(&record.reason),
        };
        grouped.entry(status).or_default().insert(name.to_string());
        report.records += 1;
    }

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    for (status, names) in grouped {
        let path = listing_path(out_dir, status, timeframe);
        report.counts.insert(status.as_str().to_string(), names.len());
        write_json(
            &path,
            &ScriptListing {
                scripts: names.into_iter().collect(),
            },
        )?;
        report.written.push(path);
    }

    info!(
        "Synced {} log records for {} into {} ({} malformed lines)",
        report.records,
        timeframe,
        out_dir.display(),
        report.malformed_lines
    );
    Ok(report)
}

fn read_listing(path: &Path) -> Result<Option<ScriptListing>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let listing = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse listing {}", path.display()))?;
    Ok(Some(listing))
}

/// Union the selected per-status listings into one candidates file.
pub fn build_candidates(
    dir: &Path,
    timeframe: &str,
    statuses: &[RunStatus],
) -> Result<CandidateListing> {
    let timeframe = validate_timeframe(timeframe)?;
    let mut scripts = BTreeSet::new();
    let mut counts = BTreeMap::new();

    for status in statuses {
        let path = listing_path(dir, *status, timeframe);
        let names = match read_listing(&path)? {
            Some(listing) => listing.scripts,
            None => {
                info!("No {} listing at {}; counting as empty", status, path.display());
                Vec::new()
            }
        };
        counts.insert(status.as_str().to_string(), names.len());
        scripts.extend(names);
    }

    let scripts: Vec<String> = scripts.into_iter().collect();
    let candidates = CandidateListing {
        metadata: CandidateMetadata {
            timeframe: timeframe.to_string(),
            total: scripts.len(),
            counts,
        },
        scripts,
    };

    std::fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let path = candidates_path(dir, timeframe);
    write_json(&path, &candidates)?;
    info!(
        "Wrote {} candidates for {} to {}",
        candidates.metadata.total,
        timeframe,
        path.display()
    );
    Ok(candidates)
}

/// Remove every listing for a timeframe. Returns the paths removed.
pub fn cleanup_listings(dir: &Path, timeframe: &str) -> Result<Vec<PathBuf>> {
    let timeframe = validate_timeframe(timeframe)?;
    let mut targets: Vec<PathBuf> = RunStatus::ALL
        .iter()
        .map(|status| listing_path(dir, *status, timeframe))
        .collect();
    targets.push(candidates_path(dir, timeframe));

    let mut removed = Vec::new();
    for path in targets {
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("failed to remove {}", path.display()))?;
            removed.push(path);
        }
    }
    info!("Removed {} listing files for {}", removed.len(), timeframe);
    Ok(removed)
}
