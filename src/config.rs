use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::simulator::{FixedExitParams, DEFAULT_PIP_VALUE};

pub const DEFAULT_TP_PIPS: f64 = 50.0;
pub const DEFAULT_SL_PIPS: f64 = 25.0;
pub const DEFAULT_LISTING_DIR: &str = "listings";

const SETTING_KEYS: [&str; 6] = [
    "PIP_VALUE",
    "DEFAULT_TP_PIPS",
    "DEFAULT_SL_PIPS",
    "HANDBOOK_PATH",
    "LISTING_DIR",
    "SWEEP_THREADS",
];

#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub pip_value: f64,
    pub default_tp_pips: f64,
    pub default_sl_pips: f64,
    pub handbook_path: Option<PathBuf>,
    pub listing_dir: PathBuf,
    pub sweep_threads: Option<usize>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            pip_value: DEFAULT_PIP_VALUE,
            default_tp_pips: DEFAULT_TP_PIPS,
            default_sl_pips: DEFAULT_SL_PIPS,
            handbook_path: None,
            listing_dir: PathBuf::from(DEFAULT_LISTING_DIR),
            sweep_threads: None,
        }
    }
}

impl EngineSettings {
    pub fn from_settings_map(settings: &HashMap<String, String>) -> Result<Self> {
        let defaults = Self::default();

        let pip_value =
            optional_setting_positive_f64(settings, "PIP_VALUE")?.unwrap_or(defaults.pip_value);
        let default_tp_pips = optional_setting_positive_f64(settings, "DEFAULT_TP_PIPS")?
            .unwrap_or(defaults.default_tp_pips);
        let default_sl_pips = optional_setting_positive_f64(settings, "DEFAULT_SL_PIPS")?
            .unwrap_or(defaults.default_sl_pips);
        let handbook_path = optional_setting(settings, "HANDBOOK_PATH").map(PathBuf::from);
        let listing_dir = optional_setting(settings, "LISTING_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.listing_dir);
        let sweep_threads = if optional_setting(settings, "SWEEP_THREADS").is_some() {
            Some(require_setting_count(settings, "SWEEP_THREADS", 1)?)
        } else {
            None
        };

        Ok(Self {
            pip_value,
            default_tp_pips,
            default_sl_pips,
            handbook_path,
            listing_dir,
            sweep_threads,
        })
    }

    /// Read the known keys from the process environment.
    pub fn from_env() -> Result<Self> {
        let settings: HashMap<String, String> = SETTING_KEYS
            .iter()
            .filter_map(|key| std::env::var(key).ok().map(|value| (key.to_string(), value)))
            .collect();
        Self::from_settings_map(&settings)
    }

    pub fn exit_params(&self, tp_pips: f64, sl_pips: f64) -> FixedExitParams {
        FixedExitParams::new(tp_pips, sl_pips).with_pip_value(self.pip_value)
    }
}

fn optional_setting<'a>(settings: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    settings
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

fn require_setting<'a>(settings: &'a HashMap<String, String>, key: &str) -> Result<&'a str> {
    optional_setting(settings, key).ok_or_else(|| anyhow!("Missing required setting {}", key))
}

fn optional_setting_positive_f64(
    settings: &HashMap<String, String>,
    key: &str,
) -> Result<Option<f64>> {
    if optional_setting(settings, key).is_none() {
        return Ok(None);
    }
    let value = require_setting_f64(settings, key)?;
    if value <= 0.0 {
        return Err(anyhow!("Setting {} must be > 0 (value: {})", key, value));
    }
    Ok(Some(value))
}

fn require_setting_f64(settings: &HashMap<String, String>, key: &str) -> Result<f64> {
    let raw = require_setting(settings, key)?;
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| anyhow!("Setting {} must be a finite number (value: {})", key, raw))
}

fn require_setting_count(
    settings: &HashMap<String, String>,
    key: &str,
    min: usize,
) -> Result<usize> {
    let raw = require_setting(settings, key)?;
    let value = raw
        .parse::<usize>()
        .map_err(|_| anyhow!("Setting {} must be a whole number (value: {})", key, raw))?;
    if value < min {
        return Err(anyhow!("Setting {} must be >= {} (value: {})", key, min, raw));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_map_yields_defaults() {
        let parsed = EngineSettings::from_settings_map(&HashMap::new()).unwrap();
        assert_eq!(parsed, EngineSettings::default());
        assert_eq!(parsed.pip_value, 0.0001);
    }

    #[test]
    fn overrides_are_applied() {
        let parsed = EngineSettings::from_settings_map(&settings(&[
            ("PIP_VALUE", "0.01"),
            ("DEFAULT_TP_PIPS", "80"),
            ("SWEEP_THREADS", "4"),
            ("HANDBOOK_PATH", " handbook.json "),
        ]))
        .unwrap();
        assert_eq!(parsed.pip_value, 0.01);
        assert_eq!(parsed.default_tp_pips, 80.0);
        assert_eq!(parsed.default_sl_pips, DEFAULT_SL_PIPS);
        assert_eq!(parsed.sweep_threads, Some(4));
        assert_eq!(parsed.handbook_path, Some(PathBuf::from("handbook.json")));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(EngineSettings::from_settings_map(&settings(&[("PIP_VALUE", "0")])).is_err());
        assert!(EngineSettings::from_settings_map(&settings(&[("DEFAULT_SL_PIPS", "x")])).is_err());
        assert!(EngineSettings::from_settings_map(&settings(&[("SWEEP_THREADS", "0")])).is_err());
        assert!(EngineSettings::from_settings_map(&settings(&[("SWEEP_THREADS", "2.5")])).is_err());
        assert!(EngineSettings::from_settings_map(&settings(&[("PIP_VALUE", "inf")])).is_err());
    }

    #[test]
    fn exit_params_carry_pip_value() {
        let parsed = EngineSettings::from_settings_map(&settings(&[("PIP_VALUE", "0.01")])).unwrap();
        let params = parsed.exit_params(10.0, 5.0);
        assert_eq!(params.pip_value, 0.01);
        assert_eq!(params.tp_pips, 10.0);
    }
}
