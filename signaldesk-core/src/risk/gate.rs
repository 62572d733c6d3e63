//! Trading gate: may the account take another trade today?
//!
//! Blocks when today's realized loss has used up the daily loss budget
//! (balance × daily_loss_limit_pct / 100) or the trade count has reached
//! `max_trades_per_day`.

use serde::{Deserialize, Serialize};

use crate::domain::AccountRiskProfile;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GateDecision {
    Open,
    DailyLossLimitReached { loss: f64, limit: f64 },
    MaxTradesReached { trades: u32, max: u32 },
}

impl GateDecision {
    pub fn is_open(&self) -> bool {
        matches!(self, GateDecision::Open)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TradingGate;

impl TradingGate {
    pub fn check(&self, profile: &AccountRiskProfile) -> GateDecision {
        let limit = daily_loss_budget(profile);
        let loss = (-profile.current_pnl).max(0.0);
        if loss >= limit {
            return GateDecision::DailyLossLimitReached { loss, limit };
        }

        let max = profile.max_trades_per_day();
        if profile.trades_count_today >= max {
            return GateDecision::MaxTradesReached {
                trades: profile.trades_count_today,
                max,
            };
        }

        GateDecision::Open
    }

    /// Loss budget still available today, never negative.
    pub fn remaining_daily_risk(&self, profile: &AccountRiskProfile) -> f64 {
        let loss = (-profile.current_pnl).max(0.0);
        (daily_loss_budget(profile) - loss).max(0.0)
    }
}

fn daily_loss_budget(profile: &AccountRiskProfile) -> f64 {
    profile.balance() * profile.daily_loss_limit_pct() / 100.0
}
