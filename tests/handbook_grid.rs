use indicator_engine::handbook::{load_handbook_or_warn, resolve_grid, GridSource, Handbook};
use indicator_engine::strategy::{create_indicator, INDICATOR_NAMES};
use std::collections::HashMap;
use std::fs;

const HANDBOOK: &str = r#"{
    "1": {
        "indicator": "rsi",
        "parameters": {
            "period":     {"values": [7, 14, 21]},
            "oversold":   {"values": [25, 30]},
            "overbought": {"values": [70]},
            "tp_pips":    {"values": [20, 30, 50, 100]},
            "sl_pips":    {"values": [20, 30, 50]}
        }
    },
    "2": {
        "parameters": {
            "fast_period": {"values": [8, 12]}
        }
    },
    "3": {
        "indicator": "macd",
        "parameters": {"period": {"values": [10]}}
    }
}"#;

fn write_handbook(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("handbook.json");
    fs::write(&path, HANDBOOK).unwrap();
    path
}

#[test]
fn handbook_grid_size_is_product_of_value_counts() {
    let dir = tempfile::tempdir().unwrap();
    let handbook = Handbook::load(write_handbook(&dir)).unwrap();
    assert_eq!(handbook.len(), 3);
    assert_eq!(handbook.indicator_name(2).as_deref(), Some("macd"));

    let rsi = create_indicator("rsi", &HashMap::new()).unwrap();
    let (grid, source) = resolve_grid(rsi.as_ref(), Some(&handbook), None, 50.0, 25.0);
    assert_eq!(source, GridSource::Handbook);

    // tp > sl pairs: 30>20, 50>20, 50>30, 100>20, 100>30, 100>50
    assert_eq!(grid.exit_pairs().len(), 6);
    assert_eq!(grid.entry_combinations().len(), 3 * 2);
    assert_eq!(grid.len(), 36);

    let points = grid.points();
    assert_eq!(points.len(), grid.len());
    assert!(points.iter().all(|p| p.tp_pips > p.sl_pips));
    assert!(points
        .iter()
        .all(|p| !p.parameters.contains_key("tp_pips") && !p.parameters.contains_key("sl_pips")));
}

#[test]
fn missing_exit_lists_use_configured_defaults() {
    let handbook = Handbook::from_json_str(HANDBOOK).unwrap();
    let macd = create_indicator("macd", &HashMap::new()).unwrap();
    let (grid, source) = resolve_grid(macd.as_ref(), Some(&handbook), None, 80.0, 40.0);
    assert_eq!(source, GridSource::Handbook);
    assert_eq!(grid.exit_pairs(), vec![(80.0, 40.0)]);
    assert_eq!(grid.len(), 2);
}

#[test]
fn mismatched_or_missing_entries_fall_back_to_builtin() {
    let handbook = Handbook::from_json_str(HANDBOOK).unwrap();
    let williams = create_indicator("williams_r", &HashMap::new()).unwrap();

    // Entry 3 declares macd, not williams_r.
    let (grid, source) = resolve_grid(williams.as_ref(), Some(&handbook), Some(3), 50.0, 25.0);
    assert_eq!(source, GridSource::Builtin);
    assert_eq!(grid, williams.parameter_grid());

    // No entry under percentile_rank's number.
    let rank = create_indicator("percentile_rank", &HashMap::new()).unwrap();
    let (grid, source) = resolve_grid(rank.as_ref(), Some(&handbook), None, 50.0, 25.0);
    assert_eq!(source, GridSource::Builtin);
    assert_eq!(grid, rank.parameter_grid());

    let (_, source) = resolve_grid(williams.as_ref(), None, None, 50.0, 25.0);
    assert_eq!(source, GridSource::Builtin);
}

#[test]
fn unreadable_handbook_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("broken.json");
    fs::write(&broken, "{ not json").unwrap();
    assert!(load_handbook_or_warn(Some(&broken)).is_none());
    assert!(load_handbook_or_warn(Some(&dir.path().join("absent.json"))).is_none());
    assert!(load_handbook_or_warn(None).is_none());
}

#[test]
fn builtin_grids_are_valid_for_every_adapter() {
    for name in INDICATOR_NAMES {
        let indicator = create_indicator(name, &HashMap::new()).unwrap();
        let grid = indicator.parameter_grid();
        assert!(!grid.is_empty(), "{} has an empty built-in grid", name);
        assert!(grid.exit_pairs().iter().all(|(tp, sl)| tp > sl));
        for combination in grid.entry_combinations() {
            // Built-in combinations may be rejected (e.g. crossed thresholds) but never panic.
            let _ = create_indicator(name, &combination);
        }
    }
}
