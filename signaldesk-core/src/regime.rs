//! Market regime classification from trend strength and VWAP slope.
//!
//! Rule, first match wins:
//! 1. ADX > trending_adx and |slope| > slope_threshold → Trending
//! 2. ADX < ranging_adx → Ranging
//! 3. otherwise → Volatile
//!
//! Stateless: every call classifies from its inputs alone, so a reading that
//! sits on a boundary may flip between calls.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::RegimeConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    Trending,
    Ranging,
    Volatile,
}

impl Regime {
    pub fn is_trending(self) -> bool {
        self == Regime::Trending
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Regime::Trending => write!(f, "trending"),
            Regime::Ranging => write!(f, "ranging"),
            Regime::Volatile => write!(f, "volatile"),
        }
    }
}

pub fn classify(adx: f64, vwap_slope: f64, thresholds: &RegimeConfig) -> Regime {
    if adx > thresholds.trending_adx && vwap_slope.abs() > thresholds.slope_threshold {
        Regime::Trending
    } else if adx < thresholds.ranging_adx {
        Regime::Ranging
    } else {
        Regime::Volatile
    }
}
