//! Trade levels: entry, stop, target and risk:reward for a setup.
//!
//! | setup              | direction                    | stop      | target    |
//! |--------------------|------------------------------|-----------|-----------|
//! | TrendContinuation  | long if slope > 0, else short | 1.5 × ATR | 2.0 × ATR |
//! | LiquidityReversal  | short if RSI > 70, else long  | 1.0 × ATR | 1.5 × ATR |
//!
//! Entry is the snapshot price. risk:reward = |target − entry| / |entry − stop|,
//! rounded to 6 decimals so multiplier ratios such as 1.5 / 1.0 come out exact.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::LevelConfig;
use crate::domain::{Direction, MarketSnapshot, Setup};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum LevelError {
    #[error("ATR must be positive and finite, got {atr}")]
    DegenerateAtr { atr: f64 },

    #[error("stop loss equals entry ({entry}); risk is zero")]
    ZeroRisk { entry: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeLevels {
    pub direction: Direction,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub risk_reward: f64,
}

impl TradeLevels {
    pub fn risk(&self) -> f64 {
        (self.entry - self.stop_loss).abs()
    }

    pub fn reward(&self) -> f64 {
        (self.take_profit - self.entry).abs()
    }
}

impl Setup {
    /// Trade direction this setup takes on `snapshot`.
    pub fn direction(self, snapshot: &MarketSnapshot, params: &LevelConfig) -> Direction {
        match self {
            Setup::TrendContinuation => {
                if snapshot.vwap_slope > 0.0 {
                    Direction::Long
                } else {
                    Direction::Short
                }
            }
            Setup::LiquidityReversal => {
                if snapshot.rsi > params.overbought_rsi {
                    Direction::Short
                } else {
                    Direction::Long
                }
            }
        }
    }

    /// (stop, target) distances in ATR multiples.
    pub fn atr_multipliers(self, params: &LevelConfig) -> (f64, f64) {
        match self {
            Setup::TrendContinuation => (params.trend_stop_atr, params.trend_target_atr),
            Setup::LiquidityReversal => (params.reversal_stop_atr, params.reversal_target_atr),
        }
    }

    /// Risk:reward this setup always produces, independent of ATR.
    pub fn risk_reward(self, params: &LevelConfig) -> f64 {
        let (stop, target) = self.atr_multipliers(params);
        round_ratio(target / stop)
    }

    pub fn levels(
        self,
        snapshot: &MarketSnapshot,
        params: &LevelConfig,
    ) -> Result<TradeLevels, LevelError> {
        compute_levels(self, snapshot, params)
    }
}

pub fn compute_levels(
    setup: Setup,
    snapshot: &MarketSnapshot,
    params: &LevelConfig,
) -> Result<TradeLevels, LevelError> {
    let atr = snapshot.atr;
    if !(atr.is_finite() && atr > 0.0) {
        return Err(LevelError::DegenerateAtr { atr });
    }

    let direction = setup.direction(snapshot, params);
    let (stop_mult, target_mult) = setup.atr_multipliers(params);
    let entry = snapshot.price;
    let sign = direction.sign();

    let stop_loss = entry - sign * stop_mult * atr;
    let take_profit = entry + sign * target_mult * atr;

    let risk = (entry - stop_loss).abs();
    if risk == 0.0 {
        return Err(LevelError::ZeroRisk { entry });
    }
    let risk_reward = round_ratio((take_profit - entry).abs() / risk);

    Ok(TradeLevels {
        direction,
        entry,
        stop_loss,
        take_profit,
        risk_reward,
    })
}

fn round_ratio(x: f64) -> f64 {
    (x * 1e6).round() / 1e6
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegimeConfig;
    use crate::indicators::assert_approx;
    use chrono::{TimeZone, Utc};

    fn snapshot(atr: f64, slope: f64, rsi: f64, adx: f64) -> MarketSnapshot {
        MarketSnapshot::new(
            "EUR/USD",
            1.0855,
            1.1,
            atr,
            slope,
            rsi,
            adx,
            1.0,
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            &RegimeConfig::default(),
        )
    }

    #[test]
    fn bullish_trend_continuation() {
        let s = snapshot(0.0085, 0.0003, 52.0, 28.0);
        let l = compute_levels(Setup::TrendContinuation, &s, &LevelConfig::default()).unwrap();
        assert_eq!(l.direction, Direction::Long);
        assert_approx(l.entry, 1.0855, 1e-12);
        assert_approx(l.stop_loss, 1.07275, 1e-12);
        assert_approx(l.take_profit, 1.1025, 1e-12);
        assert_approx(l.risk_reward, 1.333333, 1e-12);
    }

    #[test]
    fn bearish_trend_mirrors_levels() {
        let s = snapshot(0.0085, -0.0003, 52.0, 28.0);
        let l = compute_levels(Setup::TrendContinuation, &s, &LevelConfig::default()).unwrap();
        assert_eq!(l.direction, Direction::Short);
        assert!(l.stop_loss > l.entry);
        assert!(l.take_profit < l.entry);
        assert_approx(l.stop_loss, 1.0855 + 0.01275, 1e-12);
    }

    #[test]
    fn flat_slope_trend_is_short() {
        let s = snapshot(0.0085, 0.0, 52.0, 28.0);
        let l = compute_levels(Setup::TrendContinuation, &s, &LevelConfig::default()).unwrap();
        assert_eq!(l.direction, Direction::Short);
    }

    #[test]
    fn overbought_reversal_is_bearish() {
        let s = snapshot(0.0040, 0.0, 75.0, 18.0);
        let l = compute_levels(Setup::LiquidityReversal, &s, &LevelConfig::default()).unwrap();
        assert_eq!(l.direction, Direction::Short);
        assert_approx(l.stop_loss, 1.0855 + 0.0040, 1e-12);
        assert_approx(l.take_profit, 1.0855 - 0.0060, 1e-12);
        assert_eq!(l.risk_reward, 1.5);
    }

    #[test]
    fn neutral_or_oversold_reversal_is_bullish() {
        for rsi in [25.0, 50.0, 70.0] {
            let s = snapshot(0.0040, 0.0, rsi, 18.0);
            let l = compute_levels(Setup::LiquidityReversal, &s, &LevelConfig::default()).unwrap();
            assert_eq!(l.direction, Direction::Long, "rsi {rsi}");
            assert!(l.stop_loss < l.entry && l.take_profit > l.entry);
        }
    }

    #[test]
    fn zero_atr_is_degenerate() {
        let s = snapshot(0.0, 0.0003, 52.0, 28.0);
        let err = compute_levels(Setup::TrendContinuation, &s, &LevelConfig::default()).unwrap_err();
        assert_eq!(err, LevelError::DegenerateAtr { atr: 0.0 });
    }

    #[test]
    fn nan_atr_is_degenerate() {
        let s = snapshot(f64::NAN, 0.0003, 52.0, 28.0);
        let err = compute_levels(Setup::LiquidityReversal, &s, &LevelConfig::default()).unwrap_err();
        assert!(matches!(err, LevelError::DegenerateAtr { .. }));
    }

    #[test]
    fn tiny_atr_on_large_price_has_zero_risk() {
        // The stop offset vanishes in floating point.
        let mut s = snapshot(1e-300, 0.0003, 52.0, 28.0);
        s.price = 1.0e6;
        let err = compute_levels(Setup::TrendContinuation, &s, &LevelConfig::default()).unwrap_err();
        assert_eq!(err, LevelError::ZeroRisk { entry: 1.0e6 });
    }

    #[test]
    fn risk_and_reward_accessors() {
        let s = snapshot(0.0040, 0.0, 50.0, 18.0);
        let l = Setup::for_regime(s.regime)
            .levels(&s, &LevelConfig::default())
            .unwrap();
        assert_approx(l.risk(), 0.0040, 1e-12);
        assert_approx(l.reward(), 0.0060, 1e-12);
    }
}
