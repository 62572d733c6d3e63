//! Classic floor-trader pivot levels from the most recent bar.

use serde::{Deserialize, Serialize};

use crate::domain::OhlcvSeries;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PivotLevels {
    pub pivot: f64,
    pub r1: f64,
    pub r2: f64,
    pub r3: f64,
    pub s1: f64,
    pub s2: f64,
    pub s3: f64,
}

/// Pivot levels of the last bar in `series`; `None` for an empty series.
pub fn pivot_points(series: &OhlcvSeries) -> Option<PivotLevels> {
    let bar = series.last()?;
    let (h, l, c) = (bar.high, bar.low, bar.close);
    let pivot = (h + l + c) / 3.0;

    Some(PivotLevels {
        pivot,
        r1: 2.0 * pivot - l,
        r2: pivot + (h - l),
        r3: h + 2.0 * (pivot - l),
        s1: 2.0 * pivot - h,
        s2: pivot - (h - l),
        s3: l - 2.0 * (h - pivot),
    })
}
