//! Relative Strength Index (RSI), Wilder-smoothed.
//!
//! Seed: mean gain and mean loss (as a positive number) of the first `period`
//! close-to-close deltas. Every later delta updates both averages with
//! avg = (avg·(period−1) + x) / period and emits one sample, stamped on the bar
//! that produced the delta. Needs `period + 1` bars; produces
//! `len − period − 1` samples.
//!
//! Edge cases: avg_loss == 0 → 100 (or 50 when avg_gain is also 0);
//! avg_gain == 0 → 0.

use crate::domain::OhlcvSeries;
use crate::indicators::{wilder_step, IndicatorSample};

pub fn rsi(series: &OhlcvSeries, period: usize) -> Vec<IndicatorSample> {
    let bars = series.bars();
    if period == 0 || bars.len() < period + 1 {
        return Vec::new();
    }

    // deltas[k] = close[k + 1] − close[k]
    let deltas: Vec<f64> = bars.windows(2).map(|p| p[1].close - p[0].close).collect();

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for &d in &deltas[..period] {
        if d > 0.0 {
            avg_gain += d;
        } else {
            avg_loss -= d;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;

    let mut out = Vec::with_capacity(deltas.len() - period);
    for k in period..deltas.len() {
        let d = deltas[k];
        let gain = if d > 0.0 { d } else { 0.0 };
        let loss = if d < 0.0 { -d } else { 0.0 };
        avg_gain = wilder_step(avg_gain, gain, period);
        avg_loss = wilder_step(avg_loss, loss, period);
        out.push(IndicatorSample::new(
            bars[k + 1].timestamp,
            rsi_value(avg_gain, avg_loss),
        ));
    }

    out
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0 // no movement
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
