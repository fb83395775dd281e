use indicator_engine::listing::{
    build_candidates, candidates_path, cleanup_listings, listing_path, sync_listings,
    CandidateListing, RunStatus, ScriptListing,
};
use std::fs;
use std::path::Path;

const RUN_LOG: &str = r#"{"indicator": "rsi", "reason": "ok"}
{"indicator": "macd", "reason": "Backtest produced no trades"}

{"indicator": "williams_r", "reason": "division by zero"}
not json at all
{"indicator": "rsi", "reason": "success"}
{"indicator": "atr_breakout", "reason": "whatever", "status": "passed"}
{"indicator": "roc_momentum", "reason": "no_signals"}
{"indicator": "", "reason": "ok"}
"#;

fn read_scripts(path: &Path) -> Vec<String> {
    let listing: ScriptListing = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    listing.scripts
}

#[test]
fn sync_groups_log_records_by_status() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("run.ndjson");
    fs::write(&log_path, RUN_LOG).unwrap();
    let out_dir = dir.path().join("listings");

    let report = sync_listings(&log_path, &out_dir, "1h").unwrap();
    assert_eq!(report.records, 6);
    assert_eq!(report.malformed_lines, 2);
    assert_eq!(report.written.len(), 3);

    assert_eq!(
        read_scripts(&listing_path(&out_dir, RunStatus::Passed, "1h")),
        vec!["atr_breakout", "rsi"]
    );
    assert_eq!(
        read_scripts(&listing_path(&out_dir, RunStatus::NoTrades, "1h")),
        vec!["macd", "roc_momentum"]
    );
    assert_eq!(
        read_scripts(&listing_path(&out_dir, RunStatus::Failed, "1h")),
        vec!["williams_r"]
    );

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(listing_path(&out_dir, RunStatus::Failed, "1h")).unwrap())
            .unwrap();
    assert_eq!(raw, serde_json::json!({"scripts": ["williams_r"]}));
}

#[test]
fn candidates_union_selected_statuses() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("run.ndjson");
    fs::write(&log_path, RUN_LOG).unwrap();
    sync_listings(&log_path, dir.path(), "4h").unwrap();

    let candidates =
        build_candidates(dir.path(), "4h", &[RunStatus::Passed, RunStatus::NoTrades]).unwrap();
    assert_eq!(
        candidates.scripts,
        vec!["atr_breakout", "macd", "roc_momentum", "rsi"]
    );
    assert_eq!(candidates.metadata.total, 4);
    assert_eq!(candidates.metadata.timeframe, "4h");
    assert_eq!(candidates.metadata.counts.get("passed"), Some(&2));
    assert_eq!(candidates.metadata.counts.get("no_trades"), Some(&2));

    let written: CandidateListing = serde_json::from_str(
        &fs::read_to_string(candidates_path(dir.path(), "4h")).unwrap(),
    )
    .unwrap();
    assert_eq!(written, candidates);
}

#[test]
fn missing_status_files_count_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let candidates = build_candidates(dir.path(), "1d", &[RunStatus::Passed]).unwrap();
    assert!(candidates.scripts.is_empty());
    assert_eq!(candidates.metadata.counts.get("passed"), Some(&0));
    assert!(candidates_path(dir.path(), "1d").exists());
}

#[test]
fn cleanup_removes_only_the_timeframe() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("run.ndjson");
    fs::write(&log_path, RUN_LOG).unwrap();
    sync_listings(&log_path, dir.path(), "1h").unwrap();
    sync_listings(&log_path, dir.path(), "4h").unwrap();
    build_candidates(dir.path(), "1h", &[RunStatus::Passed]).unwrap();

    let removed = cleanup_listings(dir.path(), "1h").unwrap();
    assert_eq!(removed.len(), 4);
    assert!(!candidates_path(dir.path(), "1h").exists());
    assert!(listing_path(dir.path(), RunStatus::Passed, "4h").exists());
    assert!(log_path.exists());

    assert!(cleanup_listings(dir.path(), "1h").unwrap().is_empty());
}
