//! Position sizing from an account risk budget.
//!
//! risk_amount    = balance × risk_pct / 100
//! stop_distance  = |entry − stop| × 10 000 (pips)
//! position_size  = risk_amount / (stop_distance × pip_value), rounded to 0.01

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::InstrumentConfig;
use crate::domain::{AccountRiskProfile, Opportunity};

/// Price units per pip for the four-decimal quotes the desk trades.
pub const PIPS_PER_UNIT: f64 = 10_000.0;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SizingError {
    #[error("stop equals entry; stop distance is zero")]
    ZeroStopDistance,

    #[error("account balance must be positive, got {balance}")]
    NonPositiveBalance { balance: f64 },

    #[error("risk per trade must be positive, got {pct}%")]
    NonPositiveRisk { pct: f64 },

    #[error("{field} must be finite")]
    NonFiniteInput { field: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizingReport {
    pub position_size: f64,
    pub risk_amount: f64,
    /// Stop distance in pips, to one decimal.
    pub stop_distance_pips: f64,
    pub pip_value: f64,
}

/// Size a trade so that hitting `stop` loses `risk_pct` percent of `balance`.
///
/// ```
/// use signaldesk_core::config::InstrumentConfig;
/// use signaldesk_core::risk::size_position;
///
/// let report =
///     size_position(10_000.0, 1.0, 1.0855, 1.0825, "EUR/USD", &InstrumentConfig::default())
///         .unwrap();
/// assert_eq!(report.position_size, 3.33);
/// assert_eq!(report.stop_distance_pips, 30.0);
/// ```
pub fn size_position(
    balance: f64,
    risk_pct: f64,
    entry: f64,
    stop: f64,
    instrument: &str,
    instruments: &InstrumentConfig,
) -> Result<SizingReport, SizingError> {
    for (field, value) in [
        ("balance", balance),
        ("risk_pct", risk_pct),
        ("entry", entry),
        ("stop", stop),
    ] {
        if !value.is_finite() {
            return Err(SizingError::NonFiniteInput { field });
        }
    }
    if balance <= 0.0 {
        return Err(SizingError::NonPositiveBalance { balance });
    }
    if risk_pct <= 0.0 {
        return Err(SizingError::NonPositiveRisk { pct: risk_pct });
    }

    let pips = (entry - stop).abs() * PIPS_PER_UNIT;
    if pips == 0.0 {
        return Err(SizingError::ZeroStopDistance);
    }

    let risk_amount = balance * risk_pct / 100.0;
    let pip_value = instruments.pip_value(instrument);
    let position_size = round_to(risk_amount / (pips * pip_value), 2);

    Ok(SizingReport {
        position_size,
        risk_amount,
        stop_distance_pips: round_to(pips, 1),
        pip_value,
    })
}

/// Size an accepted opportunity against the profile's per-trade budget.
pub fn size_opportunity(
    profile: &AccountRiskProfile,
    opportunity: &Opportunity,
    instruments: &InstrumentConfig,
) -> Result<SizingReport, SizingError> {
    size_position(
        profile.balance(),
        profile.risk_per_trade_pct(),
        opportunity.entry,
        opportunity.stop_loss,
        &opportunity.instrument,
        instruments,
    )
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
