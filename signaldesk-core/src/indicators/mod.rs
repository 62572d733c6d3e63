//! Indicator engine — pure functions from an `OhlcvSeries` to sample series.
//!
//! Every function here is deterministic and side-effect free. A series that is
//! too short for an indicator's window yields an empty output, never an error
//! and never zeros: callers treat empty as "not yet computable".

pub mod adx;
pub mod atr;
pub mod pivot;
pub mod rsi;
pub mod vwap;

pub use adx::{adx, directional_movement, DirectionalSample};
pub use atr::{atr, true_ranges};
pub use pivot::{pivot_points, PivotLevels};
pub use rsi::rsi;
pub use vwap::{vwap, VwapSample};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::IndicatorConfig;
use crate::domain::OhlcvSeries;

/// One value of a single-valued indicator (RSI, ATR, DX).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl IndicatorSample {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// One Wilder smoothing step: `(prev * (period - 1) + value) / period`.
pub(crate) fn wilder_step(prev: f64, value: f64, period: usize) -> f64 {
    (prev * (period - 1) as f64 + value) / period as f64
}

/// All indicators for one series, computed in one pass over the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub vwap: Vec<VwapSample>,
    pub rsi: Vec<IndicatorSample>,
    pub atr: Vec<IndicatorSample>,
    pub adx: Vec<IndicatorSample>,
    pub pivot_points: Option<PivotLevels>,
}

impl IndicatorSet {
    pub fn latest_vwap(&self) -> Option<&VwapSample> {
        self.vwap.last()
    }

    pub fn latest_rsi(&self) -> Option<f64> {
        self.rsi.last().map(|s| s.value)
    }

    pub fn latest_atr(&self) -> Option<f64> {
        self.atr.last().map(|s| s.value)
    }

    pub fn latest_adx(&self) -> Option<f64> {
        self.adx.last().map(|s| s.value)
    }
}

/// Compute VWAP, RSI, ATR, ADX (DX) and pivot levels for `series`.
pub fn compute_indicators(series: &OhlcvSeries, params: &IndicatorConfig) -> IndicatorSet {
    IndicatorSet {
        vwap: vwap(series),
        rsi: rsi(series, params.rsi_period),
        atr: atr(series, params.atr_period),
        adx: adx(series, params.adx_period),
        pivot_points: pivot_points(series),
    }
}

/// Build a series from close prices for tests.
///
/// open = previous close (or close for the first bar), high/low = body ± 0.0010,
/// volume = 1000, one bar per minute.
#[cfg(test)]
pub fn make_series(closes: &[f64]) -> OhlcvSeries {
    let data: Vec<(f64, f64, f64, f64)> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            (open, open.max(close) + 0.0010, open.min(close) - 0.0010, close)
        })
        .collect();
    make_ohlc_series(&data)
}

/// Build a series from (open, high, low, close) tuples, volume 1000, one bar per minute.
#[cfg(test)]
pub fn make_ohlc_series(data: &[(f64, f64, f64, f64)]) -> OhlcvSeries {
    use crate::domain::PriceBar;
    use chrono::{Duration, TimeZone};

    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    let bars = data
        .iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| {
            PriceBar::new(base + Duration::minutes(i as i64), open, high, low, close, 1000.0)
        })
        .collect();
    OhlcvSeries::new("TEST", bars).unwrap()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
