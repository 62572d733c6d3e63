//! Average True Range (ATR).
//!
//! True Range (from the second bar): max(high−low, |high−prev_close|, |low−prev_close|).
//! Seed: simple mean of the first `period` true ranges, emitted at the bar
//! closing that window. Then Wilder: atr = (atr·(period−1) + tr) / period.
//! Needs `period + 1` bars; produces `len − period` samples.

use crate::domain::{OhlcvSeries, PriceBar};
use crate::indicators::{wilder_step, IndicatorSample};

/// True range of `bar` against the previous close.
pub(crate) fn true_range(bar: &PriceBar, prev_close: f64) -> f64 {
    (bar.high - bar.low)
        .max((bar.high - prev_close).abs())
        .max((bar.low - prev_close).abs())
}

/// True ranges for bars 1..len; entry `k` belongs to bar `k + 1`.
pub fn true_ranges(series: &OhlcvSeries) -> Vec<f64> {
    series
        .bars()
        .windows(2)
        .map(|pair| true_range(&pair[1], pair[0].close))
        .collect()
}

pub fn atr(series: &OhlcvSeries, period: usize) -> Vec<IndicatorSample> {
    let bars = series.bars();
    if period == 0 || bars.len() < period + 1 {
        return Vec::new();
    }

    let tr = true_ranges(series);
    let mut out = Vec::with_capacity(bars.len() - period);

    let mut value = tr[..period].iter().sum::<f64>() / period as f64;
    out.push(IndicatorSample::new(bars[period].timestamp, value));

    for k in period..tr.len() {
        value = wilder_step(value, tr[k], period);
        out.push(IndicatorSample::new(bars[k + 1].timestamp, value));
    }

    out
}
