//! Opportunity scorer: a 0–100 confidence score for one snapshot.
//!
//! score = clamp(50 + trend + rsi + adx + spread + structure, 0, 100)
//!
//! - trend: +15 when trending with |slope| > slope_threshold, +10 more when
//!   |slope| ≥ strong_slope
//! - rsi (trending): 45–65 → +12, 40–70 → +6
//! - rsi (otherwise): >70 or <30 → +15, >65 or <35 → +8
//! - adx: >30 → +12, >25 → +8, <20 → +5
//! - spread vs. normal baseline: ≤ baseline → +10, ≤ 1.2× → +5, above → −10
//! - structure: ⌊sample · market_structure_max⌋ with sample in [0, 1)

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::domain::MarketSnapshot;
use crate::rng::ConfluenceSource;

pub const BASE_SCORE: i32 = 50;

const TREND_BONUS: i32 = 15;
const STRONG_TREND_BONUS: i32 = 10;
const STRONG_ADX: f64 = 30.0;
const SPREAD_TOLERANCE: f64 = 1.2;

/// Every additive term of one score, kept for the rationale and for tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub base: i32,
    pub trend: i32,
    pub rsi: i32,
    pub adx: i32,
    pub spread: i32,
    pub market_structure: i32,
    /// Sum before clamping; may exceed 100.
    pub raw: i32,
    pub score: u8,
}

impl ScoreBreakdown {
    fn from_terms(trend: i32, rsi: i32, adx: i32, spread: i32, market_structure: i32) -> Self {
        let raw = [trend, rsi, adx, spread, market_structure]
            .into_iter()
            .fold(BASE_SCORE, i32::saturating_add);
        Self {
            base: BASE_SCORE,
            trend,
            rsi,
            adx,
            spread,
            market_structure,
            raw,
            score: raw.clamp(0, 100) as u8,
        }
    }

    /// The indicator term that contributed most; ties go to the earlier term.
    pub fn deciding_factor(&self) -> Factor {
        [
            (Factor::Trend, self.trend),
            (Factor::Rsi, self.rsi),
            (Factor::Adx, self.adx),
            (Factor::Spread, self.spread),
        ]
        .into_iter()
        .fold((Factor::Trend, i32::MIN), |best, cur| {
            if cur.1 > best.1 {
                cur
            } else {
                best
            }
        })
        .0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Factor {
    Trend,
    Rsi,
    Adx,
    Spread,
}

pub fn score_snapshot(
    snapshot: &MarketSnapshot,
    config: &EngineConfig,
    source: &mut dyn ConfluenceSource,
) -> ScoreBreakdown {
    let trending = snapshot.regime.is_trending();
    let slope = snapshot.vwap_slope.abs();

    let trend = trend_points(trending, slope, config);
    let rsi = rsi_points(trending, snapshot.rsi);
    let adx = adx_points(snapshot.adx, config);
    let baseline = config.instruments.normal_spread(&snapshot.instrument);
    let spread = spread_points(snapshot.spread, baseline);
    let market_structure = structure_points(source.sample(), config.scoring.market_structure_max);

    ScoreBreakdown::from_terms(trend, rsi, adx, spread, market_structure)
}

fn trend_points(trending: bool, abs_slope: f64, config: &EngineConfig) -> i32 {
    if !trending || abs_slope <= config.regime.slope_threshold {
        return 0;
    }
    if abs_slope >= config.scoring.strong_slope {
        TREND_BONUS + STRONG_TREND_BONUS
    } else {
        TREND_BONUS
    }
}

fn rsi_points(trending: bool, rsi: f64) -> i32 {
    if trending {
        // Continuations want momentum that is not yet stretched.
        if (45.0..=65.0).contains(&rsi) {
            12
        } else if (40.0..=70.0).contains(&rsi) {
            6
        } else {
            0
        }
    } else if rsi > 70.0 || rsi < 30.0 {
        15
    } else if rsi > 65.0 || rsi < 35.0 {
        8
    } else {
        0
    }
}

fn adx_points(adx: f64, config: &EngineConfig) -> i32 {
    if adx > STRONG_ADX {
        12
    } else if adx > config.regime.trending_adx {
        8
    } else if adx < config.regime.ranging_adx {
        5
    } else {
        0
    }
}

fn spread_points(spread: f64, baseline: f64) -> i32 {
    if spread <= baseline {
        10
    } else if spread <= baseline * SPREAD_TOLERANCE {
        5
    } else {
        -10
    }
}

fn structure_points(sample: f64, max: f64) -> i32 {
    let sample = if sample.is_finite() { sample.clamp(0.0, 1.0) } else { 0.0 };
    let points = (sample * max).floor();
    // sample < 1 keeps this below max; guard the sample == 1 edge anyway.
    if points >= max && max > 0.0 {
        (max.ceil() - 1.0) as i32
    } else {
        points as i32
    }
}
