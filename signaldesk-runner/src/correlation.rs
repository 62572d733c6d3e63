//! Close-price correlation against the primary instrument.
//!
//! Pearson coefficient over the overlapping tail of two series:
//!
//!   ρ = Σ(x − x̄)(y − ȳ) / sqrt(Σ(x − x̄)² · Σ(y − ȳ)²)
//!
//! The primary instrument correlates 1.0 with itself. Fewer than two
//! overlapping bars, or a flat series, yields 0.0.

use std::collections::BTreeMap;

use signaldesk_core::domain::OhlcvSeries;

/// Bars of trailing history used for each coefficient.
pub const DEFAULT_WINDOW: usize = 100;

/// Pearson correlation of the last `window` closes shared by `a` and `b`.
pub fn pearson_tail(a: &[f64], b: &[f64], window: usize) -> f64 {
    let n = a.len().min(b.len()).min(window);
    if n < 2 {
        return 0.0;
    }
    let xs = &a[a.len() - n..];
    let ys = &b[b.len() - n..];

    let mean_x = xs.iter().sum::<f64>() / n as f64;
    let mean_y = ys.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom <= 0.0 || !denom.is_finite() {
        return 0.0;
    }
    (cov / denom).clamp(-1.0, 1.0)
}

/// Correlation of every series against `primary`.
///
/// When the primary instrument has no series every coefficient is 0.0.
pub fn correlations_to_primary(
    series: &BTreeMap<String, OhlcvSeries>,
    primary: &str,
    window: usize,
) -> BTreeMap<String, f64> {
    let primary_closes = series.get(primary).map(OhlcvSeries::closes);

    series
        .iter()
        .map(|(name, s)| {
            let rho = if name == primary {
                1.0
            } else {
                match &primary_closes {
                    Some(p) => pearson_tail(p, &s.closes(), window),
                    None => 0.0,
                }
            };
            (name.clone(), rho)
        })
        .collect()
}
