//! Directional movement: +DI, −DI and DX over a sliding window.
//!
//! Steps:
//! 1. For each bar pair: +DM = high_diff if high_diff > low_diff and > 0, else 0;
//!    −DM symmetric from low_diff; TR as in ATR.
//! 2. Over each trailing window of `period` pairs take the simple mean of +DM,
//!    −DM and TR (no Wilder smoothing).
//! 3. +DI = 100·mean(+DM)/mean(TR), −DI likewise.
//! 4. DX = 100·|+DI − −DI| / (+DI + −DI).
//!
//! DI and DX are clamped to [0, 100]; the ratio can round past 100 when one
//! side of the movement is zero.
//!
//! The series reported as "ADX" is this DX; it is not smoothed a second time.
//! Needs `2 · period` bars; produces `len − period` samples.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::OhlcvSeries;
use crate::indicators::atr::true_range;
use crate::indicators::IndicatorSample;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalSample {
    pub timestamp: DateTime<Utc>,
    pub plus_di: f64,
    pub minus_di: f64,
    pub dx: f64,
}

pub fn directional_movement(series: &OhlcvSeries, period: usize) -> Vec<DirectionalSample> {
    let bars = series.bars();
    if period == 0 || bars.len() < 2 * period {
        return Vec::new();
    }

    let mut plus_dm = Vec::with_capacity(bars.len() - 1);
    let mut minus_dm = Vec::with_capacity(bars.len() - 1);
    let mut tr = Vec::with_capacity(bars.len() - 1);

    for pair in bars.windows(2) {
        let (prev, bar) = (&pair[0], &pair[1]);
        let high_diff = bar.high - prev.high;
        let low_diff = prev.low - bar.low;

        plus_dm.push(if high_diff > low_diff { high_diff.max(0.0) } else { 0.0 });
        minus_dm.push(if low_diff > high_diff { low_diff.max(0.0) } else { 0.0 });
        tr.push(true_range(bar, prev.close));
    }

    let n = period as f64;
    let mut out = Vec::with_capacity(bars.len() - period);
    for end in (period - 1)..tr.len() {
        let window = (end + 1 - period)..=end;
        let avg_plus = plus_dm[window.clone()].iter().sum::<f64>() / n;
        let avg_minus = minus_dm[window.clone()].iter().sum::<f64>() / n;
        let avg_tr = tr[window].iter().sum::<f64>() / n;

        let (plus_di, minus_di) = if avg_tr > 0.0 {
            (
                to_percent(avg_plus / avg_tr),
                to_percent(avg_minus / avg_tr),
            )
        } else {
            (0.0, 0.0)
        };
        let di_sum = plus_di + minus_di;
        let dx = if di_sum > 0.0 {
            to_percent((plus_di - minus_di).abs() / di_sum)
        } else {
            0.0
        };

        out.push(DirectionalSample {
            timestamp: bars[end + 1].timestamp,
            plus_di,
            minus_di,
            dx,
        });
    }

    out
}

fn to_percent(ratio: f64) -> f64 {
    (100.0 * ratio).clamp(0.0, 100.0)
}

/// DX projected to plain samples; this is the value the regime classifier reads as ADX.
pub fn adx(series: &OhlcvSeries, period: usize) -> Vec<IndicatorSample> {
    directional_movement(series, period)
        .into_iter()
        .map(|s| IndicatorSample::new(s.timestamp, s.dx))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlc_series, DEFAULT_EPSILON};

    fn sample_data() -> Vec<(f64, f64, f64, f64)> {
        vec![
            (100.0, 105.0, 95.0, 102.0),
            (102.0, 108.0, 100.0, 106.0),
            (106.0, 107.0, 98.0, 99.0),
            (99.0, 103.0, 97.0, 101.0),
            (101.0, 106.0, 100.0, 105.0),
            (105.0, 110.0, 103.0, 108.0),
            (108.0, 112.0, 106.0, 110.0),
            (110.0, 111.0, 104.0, 105.0),
            (105.0, 109.0, 103.0, 107.0),
            (107.0, 113.0, 105.0, 112.0),
        ]
    }

    #[test]
    fn adx_bounds() {
        let series = make_ohlc_series(&sample_data());
        let result = adx(&series, 3);
        assert_eq!(result.len(), 10 - 3);
        for (i, s) in result.iter().enumerate() {
            assert!((0.0..=100.0).contains(&s.value), "DX out of bounds at {i}: {}", s.value);
        }
    }

    #[test]
    fn first_window_matches_hand_computation() {
        // Pairs 0..3 (bars 1..=3):
        //   bar1: hd=3, ld=-5 → +DM 3, −DM 0, TR 8
        //   bar2: hd=-1, ld=2 → +DM 0, −DM 2, TR 9
        //   bar3: hd=-4, ld=1 → +DM 0, −DM 1, TR 6
        // mean +DM = 1, mean −DM = 1, mean TR = 23/3
        // +DI = −DI = 300/23 → DX = 0
        let series = make_ohlc_series(&sample_data());
        let dm = directional_movement(&series, 3);
        assert_approx(dm[0].plus_di, 300.0 / 23.0, DEFAULT_EPSILON);
        assert_approx(dm[0].minus_di, 300.0 / 23.0, DEFAULT_EPSILON);
        assert_approx(dm[0].dx, 0.0, DEFAULT_EPSILON);
        assert_eq!(dm[0].timestamp, series.bars()[3].timestamp);
    }

    #[test]
    fn strong_uptrend_has_high_dx() {
        let data: Vec<_> = (0..30)
            .map(|i| {
                let base = 1.08 + i as f64 * 0.0010;
                (base - 0.0002, base + 0.0006, base - 0.0006, base + 0.0004)
            })
            .collect();
        let series = make_ohlc_series(&data);
        let last = adx(&series, 14).last().copied().unwrap();
        assert!(last.value > 90.0, "DX should be near 100 in a clean trend, got {}", last.value);

        let dm = directional_movement(&series, 14);
        assert!(dm.last().unwrap().plus_di > dm.last().unwrap().minus_di);
    }

    #[test]
    fn flat_series_has_zero_dx() {
        let series = make_ohlc_series(&[(1.0, 1.0, 1.0, 1.0); 30]);
        assert!(adx(&series, 14).iter().all(|s| s.value == 0.0));
    }

    #[test]
    fn one_sided_movement_stays_at_100() {
        // Flat bars after the last drop leave +DI at zero, where DX is 100 up
        // to rounding.
        let mut closes: Vec<f64> = vec![1.177_3, 0.5, 1.646_7, 1.654_3];
        closes.extend(std::iter::repeat(0.5).take(26));
        let data: Vec<_> = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let open = if i == 0 { close } else { closes[i - 1] };
                (open, open.max(close) + 0.0005, open.min(close) - 0.0005, close)
            })
            .collect();
        let series = make_ohlc_series(&data);

        for period in 2..15 {
            for s in directional_movement(&series, period) {
                assert!((0.0..=100.0).contains(&s.dx), "DX {} at period {period}", s.dx);
                assert!((0.0..=100.0).contains(&s.plus_di));
                assert!((0.0..=100.0).contains(&s.minus_di));
            }
        }
    }

    #[test]
    fn percent_is_clamped() {
        assert_eq!(to_percent(1.0 + f64::EPSILON), 100.0);
        assert_eq!(to_percent(-0.0), 0.0);
        assert_eq!(to_percent(0.25), 25.0);
    }

    #[test]
    fn requires_two_periods_of_bars() {
        let series = make_ohlc_series(&sample_data()[..5]);
        assert!(adx(&series, 3).is_empty());
        let series = make_ohlc_series(&sample_data()[..6]);
        assert_eq!(adx(&series, 3).len(), 3);
    }
}
