//! Engine configuration — every threshold the signal pipeline uses.
//!
//! Loaded from TOML; any missing section or key falls back to the default,
//! so an empty file yields the stock configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

use crate::domain::Setup;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration for the signal pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub indicators: IndicatorConfig,
    pub regime: RegimeConfig,
    pub scoring: ScoringConfig,
    pub levels: LevelConfig,
    pub instruments: InstrumentConfig,
}

/// Lookback periods for the Wilder-smoothed indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub rsi_period: usize,
    pub atr_period: usize,
    pub adx_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            atr_period: 14,
            adx_period: 14,
        }
    }
}

/// Regime classification thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeConfig {
    /// ADX strictly above this (with a sloping VWAP) is trending.
    pub trending_adx: f64,
    /// ADX strictly below this is ranging.
    pub ranging_adx: f64,
    /// Minimum |VWAP slope| for a trend to count.
    pub slope_threshold: f64,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            trending_adx: 25.0,
            ranging_adx: 20.0,
            slope_threshold: 0.0001,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Candidates scoring below this are dropped.
    pub min_score: u8,
    /// |VWAP slope| at or above this earns the strong-trend bonus.
    pub strong_slope: f64,
    /// Exclusive ceiling of the market-structure term.
    pub market_structure_max: f64,
    pub high_confidence: u8,
    pub medium_confidence: u8,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_score: 70,
            strong_slope: 0.0003,
            market_structure_max: 20.0,
            high_confidence: 85,
            medium_confidence: 75,
        }
    }
}

/// ATR multipliers per setup and the acceptance floor for risk:reward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub trend_stop_atr: f64,
    pub trend_target_atr: f64,
    pub reversal_stop_atr: f64,
    pub reversal_target_atr: f64,
    /// RSI above this turns a liquidity reversal bearish.
    pub overbought_rsi: f64,
    pub min_risk_reward: f64,
}

impl LevelConfig {
    /// Setups whose fixed risk:reward is below `min_risk_reward`; they can never emit.
    pub fn unreachable_setups(&self) -> Vec<Setup> {
        [Setup::TrendContinuation, Setup::LiquidityReversal]
            .into_iter()
            .filter(|setup| setup.risk_reward(self) < self.min_risk_reward)
            .collect()
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            trend_stop_atr: 1.5,
            trend_target_atr: 2.0,
            reversal_stop_atr: 1.0,
            reversal_target_atr: 1.5,
            overbought_rsi: 70.0,
            min_risk_reward: 1.5,
        }
    }
}

/// Per-instrument constants: normal spread baselines and pip values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentConfig {
    pub primary: String,
    /// Normal spread (pips) of the primary instrument.
    pub primary_spread: f64,
    /// Normal spread (pips) of every other instrument.
    pub default_spread: f64,
    /// Explicit per-instrument spread baselines; win over the two above.
    pub spreads: BTreeMap<String, f64>,
    pub pip_values: BTreeMap<String, f64>,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        let pip_values = [
            ("EUR/USD", 1.0),
            ("GBP/USD", 1.0),
            ("AUD/USD", 1.0),
            ("USD/CAD", 0.73),
            ("USD/CHF", 1.12),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            primary: "EUR/USD".into(),
            primary_spread: 1.2,
            default_spread: 1.8,
            spreads: BTreeMap::new(),
            pip_values,
        }
    }
}

impl InstrumentConfig {
    /// Spread baseline used by the scorer for `instrument`.
    pub fn normal_spread(&self, instrument: &str) -> f64 {
        if let Some(&spread) = self.spreads.get(instrument) {
            return spread;
        }
        if instrument == self.primary {
            self.primary_spread
        } else {
            self.default_spread
        }
    }

    /// Pip value for `instrument`; unknown instruments are worth 1.
    pub fn pip_value(&self, instrument: &str) -> f64 {
        self.pip_values.get(instrument).copied().unwrap_or(1.0)
    }
}

impl EngineConfig {
    /// Load a configuration from a TOML file and validate it.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse a configuration from a TOML string and validate it.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ind = &self.indicators;
        if ind.rsi_period == 0 || ind.atr_period == 0 || ind.adx_period == 0 {
            return Err(ConfigError::Invalid("indicator periods must be >= 1".into()));
        }

        let regime = &self.regime;
        if regime.ranging_adx > regime.trending_adx {
            return Err(ConfigError::Invalid(format!(
                "ranging_adx ({}) must not exceed trending_adx ({})",
                regime.ranging_adx, regime.trending_adx
            )));
        }
        if !(regime.slope_threshold >= 0.0) {
            return Err(ConfigError::Invalid("slope_threshold must be >= 0".into()));
        }

        let scoring = &self.scoring;
        if scoring.min_score > 100 || scoring.high_confidence > 100 {
            return Err(ConfigError::Invalid("scores are bounded by 100".into()));
        }
        if scoring.medium_confidence > scoring.high_confidence {
            return Err(ConfigError::Invalid(
                "medium_confidence must not exceed high_confidence".into(),
            ));
        }
        if !(0.0..=100.0).contains(&scoring.market_structure_max) {
            return Err(ConfigError::Invalid(format!(
                "market_structure_max must be within 0..=100, got {}",
                scoring.market_structure_max
            )));
        }

        let levels = &self.levels;
        let multipliers = [
            ("trend_stop_atr", levels.trend_stop_atr),
            ("trend_target_atr", levels.trend_target_atr),
            ("reversal_stop_atr", levels.reversal_stop_atr),
            ("reversal_target_atr", levels.reversal_target_atr),
            ("min_risk_reward", levels.min_risk_reward),
        ];
        for (name, value) in multipliers {
            if !(value > 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be > 0, got {value}")));
            }
        }

        let inst = &self.instruments;
        if !(inst.primary_spread > 0.0 && inst.default_spread > 0.0)
            || inst.spreads.values().any(|s| !(*s > 0.0))
        {
            return Err(ConfigError::Invalid("spread baselines must be > 0".into()));
        }
        if let Some((name, _)) = inst.pip_values.iter().find(|(_, v)| !(**v > 0.0)) {
            return Err(ConfigError::Invalid(format!("pip value for {name} must be > 0")));
        }

        for setup in levels.unreachable_setups() {
            warn!(
                %setup,
                risk_reward = setup.risk_reward(levels),
                min_risk_reward = levels.min_risk_reward,
                "setup can never clear the risk:reward floor"
            );
        }

        Ok(())
    }

    /// Deterministic BLAKE3 fingerprint of this configuration.
    ///
    /// Two configurations with identical values share a fingerprint, so cycle
    /// logs can be grouped by the settings that produced them.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
