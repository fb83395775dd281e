//! Parameter handbook loading and grid expansion.
//!
//! The handbook is a JSON object keyed by indicator number. Each entry lists
//! the admissible discrete values of every parameter under a `values` key.
//! `tp_pips` and `sl_pips` are exit parameters: they are paired into
//! `(tp, sl)` combinations, keeping only pairs where `tp > sl`.

use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use crate::strategy::{indicator_name_for_number, indicator_number_for_name, Indicator};

pub const TP_PIPS_KEY: &str = "tp_pips";
pub const SL_PIPS_KEY: &str = "sl_pips";

#[derive(Debug, Clone, Deserialize)]
pub struct HandbookParameter {
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HandbookEntry {
    #[serde(default)]
    pub indicator: Option<String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, HandbookParameter>,
    #[serde(default)]
    pub tp_pips: Option<Vec<f64>>,
    #[serde(default)]
    pub sl_pips: Option<Vec<f64>>,
}

impl HandbookEntry {
    fn exit_values(&self, key: &str) -> Option<Vec<f64>> {
        let top_level = match key {
            TP_PIPS_KEY => self.tp_pips.clone(),
            _ => self.sl_pips.clone(),
        };
        top_level.or_else(|| self.parameters.get(key).map(|p| p.values.clone()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Handbook {
    entries: BTreeMap<u32, HandbookEntry>,
}

impl Handbook {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read handbook {}", path.display()))?;
        let handbook = Self::from_json_str(&raw)
            .with_context(|| format!("failed to parse handbook {}", path.display()))?;
        info!(
            "Loaded handbook {} with {} indicator entries",
            path.display(),
            handbook.entries.len()
        );
        Ok(handbook)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let parsed: BTreeMap<String, HandbookEntry> =
            serde_json::from_str(raw).map_err(|error| anyhow!("Invalid handbook JSON: {}", error))?;

        let mut entries = BTreeMap::new();
        for (key, entry) in parsed {
            let number = key
                .trim()
                .parse::<u32>()
                .map_err(|_| anyhow!("Handbook key '{}' is not an indicator number", key))?;
            for (name, parameter) in &entry.parameters {
                if parameter.values.is_empty() {
                    return Err(anyhow!(
                        "Handbook entry {} parameter {} has no values",
                        number,
                        name
                    ));
                }
                if parameter.values.iter().any(|v| !v.is_finite()) {
                    return Err(anyhow!(
                        "Handbook entry {} parameter {} contains non-finite values",
                        number,
                        name
                    ));
                }
            }
            entries.insert(number, entry);
        }

        Ok(Self { entries })
    }

    pub fn entry(&self, number: u32) -> Option<&HandbookEntry> {
        self.entries.get(&number)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Indicator name an entry refers to: its explicit `indicator` field, or
    /// the registry name for its number.
    pub fn indicator_name(&self, number: u32) -> Option<String> {
        let entry = self.entry(number)?;
        entry
            .indicator
            .clone()
            .or_else(|| indicator_name_for_number(number).map(str::to_string))
    }
}

/// One evaluation of the grid: entry parameters plus an exit bracket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridPoint {
    pub parameters: HashMap<String, f64>,
    pub tp_pips: f64,
    pub sl_pips: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParameterGrid {
    entry_parameters: BTreeMap<String, Vec<f64>>,
    tp_values: Vec<f64>,
    sl_values: Vec<f64>,
}

impl ParameterGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values<S: Into<String>>(mut self, name: S, values: Vec<f64>) -> Self {
        self.entry_parameters.insert(name.into(), values);
        self
    }

    pub fn with_exit_values(mut self, tp_values: Vec<f64>, sl_values: Vec<f64>) -> Self {
        self.tp_values = tp_values;
        self.sl_values = sl_values;
        self
    }

    pub fn from_handbook_entry(entry: &HandbookEntry, default_tp: f64, default_sl: f64) -> Self {
        let mut grid = ParameterGrid::new();
        for (name, parameter) in &entry.parameters {
            if name == TP_PIPS_KEY || name == SL_PIPS_KEY {
                continue;
            }
            grid = grid.with_values(name.clone(), parameter.values.clone());
        }
        let tp_values = entry
            .exit_values(TP_PIPS_KEY)
            .unwrap_or_else(|| vec![default_tp]);
        let sl_values = entry
            .exit_values(SL_PIPS_KEY)
            .unwrap_or_else(|| vec![default_sl]);
        grid.with_exit_values(tp_values, sl_values)
    }

    pub fn entry_parameters(&self) -> &BTreeMap<String, Vec<f64>> {
        &self.entry_parameters
    }

    /// Cartesian product of the entry parameters, in sorted key order. A grid
    /// without entry parameters yields one empty combination.
    pub fn entry_combinations(&self) -> Vec<HashMap<String, f64>> {
        let mut combinations: Vec<HashMap<String, f64>> = vec![HashMap::new()];
        for (name, values) in &self.entry_parameters {
            let mut expanded = Vec::with_capacity(combinations.len() * values.len());
            for combination in &combinations {
                for value in values {
                    let mut next = combination.clone();
                    next.insert(name.clone(), *value);
                    expanded.push(next);
                }
            }
            combinations = expanded;
        }
        combinations
    }

    /// `(tp, sl)` pairs with `tp > sl`.
    pub fn exit_pairs(&self) -> Vec<(f64, f64)> {
        let mut pairs = Vec::new();
        for &tp in &self.tp_values {
            for &sl in &self.sl_values {
                if tp > sl {
                    pairs.push((tp, sl));
                }
            }
        }
        pairs
    }

    pub fn points(&self) -> Vec<GridPoint> {
        let pairs = self.exit_pairs();
        let mut points = Vec::new();
        for parameters in self.entry_combinations() {
            for &(tp_pips, sl_pips) in &pairs {
                points.push(GridPoint {
                    parameters: parameters.clone(),
                    tp_pips,
                    sl_pips,
                });
            }
        }
        points
    }

    pub fn len(&self) -> usize {
        let combinations: usize = self.entry_parameters.values().map(Vec::len).product();
        combinations * self.exit_pairs().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GridSource {
    Handbook,
    Builtin,
}

/// Read a handbook, logging and returning `None` when it cannot be used.
pub fn load_handbook_or_warn(path: Option<&Path>) -> Option<Handbook> {
    let path = path?;
    match Handbook::load(path) {
        Ok(handbook) => Some(handbook),
        Err(err) => {
            warn!("Handbook unavailable, using built-in grids: {:#}", err);
            None
        }
    }
}

/// Pick the handbook grid for an indicator when one exists, otherwise the
/// indicator's built-in grid. The fallback is logged.
pub fn resolve_grid(
    indicator: &dyn Indicator,
    handbook: Option<&Handbook>,
    number: Option<u32>,
    default_tp: f64,
    default_sl: f64,
) -> (ParameterGrid, GridSource) {
    let number = number.or_else(|| indicator_number_for_name(indicator.name()));

    let Some(handbook) = handbook else {
        return (indicator.parameter_grid(), GridSource::Builtin);
    };
    let Some(number) = number else {
        warn!(
            "No handbook number known for {}; using built-in grid",
            indicator.name()
        );
        return (indicator.parameter_grid(), GridSource::Builtin);
    };
    let Some(entry) = handbook.entry(number) else {
        warn!(
            "Handbook has no entry {} for {}; using built-in grid",
            number,
            indicator.name()
        );
        return (indicator.parameter_grid(), GridSource::Builtin);
    };

    if let Some(declared) = entry.indicator.as_deref() {
        if declared != indicator.name() {
            warn!(
                "Handbook entry {} describes {} rather than {}; using built-in grid",
                number,
                declared,
                indicator.name()
            );
            return (indicator.parameter_grid(), GridSource::Builtin);
        }
    }

    (
        ParameterGrid::from_handbook_entry(entry, default_tp, default_sl),
        GridSource::Handbook,
    )
}
