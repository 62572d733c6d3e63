//! Desk configuration: what to watch, where data lives, how cycles run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use signaldesk_core::config::{ConfigError, EngineConfig};

/// Runner-level settings wrapping the engine thresholds.
///
/// ```toml
/// instruments = ["EUR/USD", "GBP/USD"]
/// data_dir = "data"
/// history_capacity = 50
/// master_seed = 42
///
/// [spreads]
/// "GBP/USD" = 1.6
///
/// [engine.scoring]
/// min_score = 75
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    pub instruments: Vec<String>,
    /// Directory of `BASE_QUOTE.csv` files; synthetic data when absent.
    pub data_dir: Option<PathBuf>,
    /// Previous opportunities kept alongside each new batch.
    pub history_capacity: usize,
    /// Fixes the confluence draws per cycle; entropy-seeded when absent.
    pub master_seed: Option<u64>,
    /// Seconds between scheduled cycles.
    pub interval_secs: u64,
    /// Bars generated per instrument when running on synthetic data.
    pub synthetic_bars: usize,
    /// Current quoted spread per instrument (pips). Missing instruments are
    /// quoted at their normal baseline.
    pub spreads: BTreeMap<String, f64>,
    pub engine: EngineConfig,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            instruments: ["EUR/USD", "GBP/USD", "AUD/USD", "USD/CAD", "USD/CHF"]
                .into_iter()
                .map(String::from)
                .collect(),
            data_dir: None,
            history_capacity: 50,
            master_seed: None,
            interval_secs: 60,
            synthetic_bars: 240,
            spreads: BTreeMap::new(),
            engine: EngineConfig::default(),
        }
    }
}

impl DeskConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;

        if self.instruments.is_empty() {
            return Err(ConfigError::Invalid("at least one instrument is required".into()));
        }
        if let Some(bad) = self.instruments.iter().find(|i| !is_pair_symbol(i)) {
            return Err(ConfigError::Invalid(format!(
                "instrument `{bad}` is not of the form BASE/QUOTE"
            )));
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid("history_capacity must be >= 1".into()));
        }
        if self.interval_secs == 0 {
            return Err(ConfigError::Invalid("interval_secs must be >= 1".into()));
        }
        if let Some((name, _)) = self.spreads.iter().find(|(_, s)| !(**s >= 0.0)) {
            return Err(ConfigError::Invalid(format!("spread for {name} must be >= 0")));
        }
        Ok(())
    }

    /// Quoted spread for `instrument`, falling back to its normal baseline.
    pub fn spread_for(&self, instrument: &str) -> f64 {
        self.spreads
            .get(instrument)
            .copied()
            .unwrap_or_else(|| self.engine.instruments.normal_spread(instrument))
    }
}

fn is_pair_symbol(s: &str) -> bool {
    match s.split_once('/') {
        Some((base, quote)) => {
            !base.is_empty()
                && !quote.is_empty()
                && base.chars().all(|c| c.is_ascii_alphanumeric())
                && quote.chars().all(|c| c.is_ascii_alphanumeric())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = DeskConfig::from_toml("").unwrap();
        assert_eq!(config, DeskConfig::default());
        assert_eq!(config.history_capacity, 50);
        assert_eq!(config.instruments.len(), 5);
    }

    #[test]
    fn nested_engine_sections_parse() {
        let config = DeskConfig::from_toml(
            r#"
instruments = ["EUR/USD"]
master_seed = 7

[spreads]
"EUR/USD" = 0.9

[engine.scoring]
min_score = 75
"#,
        )
        .unwrap();
        assert_eq!(config.master_seed, Some(7));
        assert_eq!(config.engine.scoring.min_score, 75);
        assert_eq!(config.spread_for("EUR/USD"), 0.9);
    }

    #[test]
    fn spread_falls_back_to_baseline() {
        let config = DeskConfig::default();
        assert_eq!(config.spread_for("EUR/USD"), 1.2);
        assert_eq!(config.spread_for("AUD/USD"), 1.8);
    }

    #[test]
    fn rejects_malformed_instrument() {
        let err = DeskConfig::from_toml("instruments = [\"EURUSD\"]\n").unwrap_err();
        assert!(err.to_string().contains("BASE/QUOTE"));
    }

    #[test]
    fn rejects_zero_capacity() {
        let err = DeskConfig::from_toml("history_capacity = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn engine_validation_is_applied() {
        let err = DeskConfig::from_toml("[engine.indicators]\natr_period = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn toml_roundtrip() {
        let mut config = DeskConfig::default();
        config.master_seed = Some(11);
        config.spreads.insert("GBP/USD".into(), 1.4);
        let parsed = DeskConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }
}
