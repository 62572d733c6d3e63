//! MarketSnapshot — the per-instrument "current state" handed to every assessment.
//!
//! The driver owns and overwrites snapshots; the core only receives them by
//! value or reference. The regime is always derived from ADX and VWAP slope,
//! never set on its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{EngineConfig, RegimeConfig};
use crate::domain::OhlcvSeries;
use crate::indicators::compute_indicators;
use crate::regime::{classify, Regime};

#[derive(Debug, Error, PartialEq)]
pub enum SnapshotError {
    #[error("{indicator} needs {required} bars, series has {available}")]
    InsufficientData {
        indicator: &'static str,
        required: usize,
        available: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub instrument: String,
    pub price: f64,
    /// Current spread in pips.
    pub spread: f64,
    pub atr: f64,
    pub vwap_slope: f64,
    pub rsi: f64,
    pub adx: f64,
    pub regime: Regime,
    /// Close-price correlation with the primary instrument.
    pub correlation: f64,
    pub last_update: DateTime<Utc>,
}

impl MarketSnapshot {
    /// Build a snapshot, deriving the regime from `adx` and `vwap_slope`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        instrument: impl Into<String>,
        price: f64,
        spread: f64,
        atr: f64,
        vwap_slope: f64,
        rsi: f64,
        adx: f64,
        correlation: f64,
        last_update: DateTime<Utc>,
        thresholds: &RegimeConfig,
    ) -> Self {
        Self {
            instrument: instrument.into(),
            price,
            spread,
            atr,
            vwap_slope,
            rsi,
            adx,
            regime: classify(adx, vwap_slope, thresholds),
            correlation,
            last_update,
        }
    }

    /// Latest values of every indicator over `series`.
    ///
    /// Price is the last close and `last_update` the last bar's timestamp.
    pub fn from_series(
        series: &OhlcvSeries,
        spread: f64,
        correlation: f64,
        config: &EngineConfig,
    ) -> Result<Self, SnapshotError> {
        let params = &config.indicators;
        let available = series.len();
        let set = compute_indicators(series, params);

        let missing = |indicator: &'static str, required: usize| SnapshotError::InsufficientData {
            indicator,
            required,
            available,
        };

        let last = series.last().ok_or_else(|| missing("price", 1))?;
        let vwap = set.latest_vwap().ok_or_else(|| missing("vwap", 1))?;
        let atr = set
            .latest_atr()
            .ok_or_else(|| missing("atr", params.atr_period + 1))?;
        // RSI emits its first value one delta after the seed window.
        let rsi = set
            .latest_rsi()
            .ok_or_else(|| missing("rsi", params.rsi_period + 2))?;
        let adx = set
            .latest_adx()
            .ok_or_else(|| missing("adx", 2 * params.adx_period))?;

        Ok(Self::new(
            series.instrument(),
            last.close,
            spread,
            atr,
            vwap.slope,
            rsi,
            adx,
            correlation,
            last.timestamp,
            &config.regime,
        ))
    }

    /// Re-derive the regime after a driver has overwritten indicator fields.
    pub fn reclassify(&mut self, thresholds: &RegimeConfig) {
        self.regime = classify(self.adx, self.vwap_slope, thresholds);
    }

    /// Name of the first non-finite numeric field, if any.
    pub fn first_non_finite(&self) -> Option<&'static str> {
        [
            ("price", self.price),
            ("spread", self.spread),
            ("atr", self.atr),
            ("vwap_slope", self.vwap_slope),
            ("rsi", self.rsi),
            ("adx", self.adx),
        ]
        .into_iter()
        .find(|(_, v)| !v.is_finite())
        .map(|(name, _)| name)
    }
}
