//! Volume-weighted average price (running, from the first bar of the series).
//!
//! Typical price = (high + low + close) / 3.
//! VWAP[t] = Σ volume·typical / Σ volume over bars 0..=t.
//! slope[t] = VWAP[t] − VWAP[t−1], 0 for the first sample.
//! One sample per bar.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::OhlcvSeries;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VwapSample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub slope: f64,
}

pub fn vwap(series: &OhlcvSeries) -> Vec<VwapSample> {
    let mut cumulative_volume = 0.0;
    let mut cumulative_pv = 0.0;
    let mut prev: Option<f64> = None;
    let mut out = Vec::with_capacity(series.len());

    for bar in series.bars() {
        let typical = bar.typical_price();
        cumulative_volume += bar.volume;
        cumulative_pv += bar.volume * typical;

        // No traded volume yet: nothing to weight by, fall back to the bar itself.
        let value = if cumulative_volume > 0.0 {
            cumulative_pv / cumulative_volume
        } else {
            typical
        };
        let slope = prev.map_or(0.0, |p| value - p);
        prev = Some(value);

        out.push(VwapSample {
            timestamp: bar.timestamp,
            value,
            slope,
        });
    }

    out
}
