//! Risk-settings validation.
//!
//! Every rule is checked; violations are reported together, in rule order:
//! 1. balance ∈ [100, 1 000 000]
//! 2. risk per trade ∈ [0.1, 5] %
//! 3. daily loss limit ∈ [1, 10] %
//! 4. max trades per day ∈ [1, 20]
//! 5. risk per trade ≤ daily loss limit

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::RiskSettings;

pub const MIN_BALANCE: f64 = 100.0;
pub const MAX_BALANCE: f64 = 1_000_000.0;
pub const MIN_RISK_PER_TRADE_PCT: f64 = 0.1;
pub const MAX_RISK_PER_TRADE_PCT: f64 = 5.0;
pub const MIN_DAILY_LOSS_LIMIT_PCT: f64 = 1.0;
pub const MAX_DAILY_LOSS_LIMIT_PCT: f64 = 10.0;
pub const MIN_TRADES_PER_DAY: u32 = 1;
pub const MAX_TRADES_PER_DAY: u32 = 20;

#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum RiskViolation {
    #[error("{field} must be a finite number")]
    NotFinite { field: String },

    #[error("account balance {balance} is too low (minimum {min})", min = MIN_BALANCE)]
    BalanceTooLow { balance: f64 },

    #[error("account balance {balance} is too high (maximum {max})", max = MAX_BALANCE)]
    BalanceTooHigh { balance: f64 },

    #[error(
        "risk per trade {pct}% must be between {min}% and {max}%",
        min = MIN_RISK_PER_TRADE_PCT,
        max = MAX_RISK_PER_TRADE_PCT
    )]
    RiskPerTradeOutOfRange { pct: f64 },

    #[error(
        "daily loss limit {pct}% must be between {min}% and {max}%",
        min = MIN_DAILY_LOSS_LIMIT_PCT,
        max = MAX_DAILY_LOSS_LIMIT_PCT
    )]
    DailyLossLimitOutOfRange { pct: f64 },

    #[error(
        "max trades per day {count} must be between {min} and {max}",
        min = MIN_TRADES_PER_DAY,
        max = MAX_TRADES_PER_DAY
    )]
    MaxTradesOutOfRange { count: u32 },

    #[error("risk per trade {risk_pct}% exceeds the daily loss limit {limit_pct}%")]
    RiskExceedsDailyLimit { risk_pct: f64, limit_pct: f64 },
}

/// Validation report: `valid` is true iff `violations` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskValidation {
    pub valid: bool,
    /// Human-readable messages, one per violation, in rule order.
    pub errors: Vec<String>,
    pub violations: Vec<RiskViolation>,
}

impl RiskValidation {
    fn from_violations(violations: Vec<RiskViolation>) -> Self {
        Self {
            valid: violations.is_empty(),
            errors: violations.iter().map(ToString::to_string).collect(),
            violations,
        }
    }
}

pub fn validate_risk_settings(settings: &RiskSettings) -> RiskValidation {
    let mut violations = Vec::new();

    let balance = settings.balance;
    if !balance.is_finite() {
        violations.push(not_finite("balance"));
    } else if balance < MIN_BALANCE {
        violations.push(RiskViolation::BalanceTooLow { balance });
    } else if balance > MAX_BALANCE {
        violations.push(RiskViolation::BalanceTooHigh { balance });
    }

    let risk = settings.risk_per_trade_pct;
    if !risk.is_finite() {
        violations.push(not_finite("riskPerTradePct"));
    } else if !(MIN_RISK_PER_TRADE_PCT..=MAX_RISK_PER_TRADE_PCT).contains(&risk) {
        violations.push(RiskViolation::RiskPerTradeOutOfRange { pct: risk });
    }

    let limit = settings.daily_loss_limit_pct;
    if !limit.is_finite() {
        violations.push(not_finite("dailyLossLimitPct"));
    } else if !(MIN_DAILY_LOSS_LIMIT_PCT..=MAX_DAILY_LOSS_LIMIT_PCT).contains(&limit) {
        violations.push(RiskViolation::DailyLossLimitOutOfRange { pct: limit });
    }

    let trades = settings.max_trades_per_day;
    if !(MIN_TRADES_PER_DAY..=MAX_TRADES_PER_DAY).contains(&trades) {
        violations.push(RiskViolation::MaxTradesOutOfRange { count: trades });
    }

    if risk > limit {
        violations.push(RiskViolation::RiskExceedsDailyLimit {
            risk_pct: risk,
            limit_pct: limit,
        });
    }

    RiskValidation::from_violations(violations)
}

fn not_finite(field: &str) -> RiskViolation {
    RiskViolation::NotFinite {
        field: field.to_string(),
    }
}
