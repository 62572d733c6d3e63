//! Account risk configuration and today's trading state.

use serde::{Deserialize, Serialize};

use crate::risk::{validate_risk_settings, RiskValidation};

/// Proposed risk settings, as submitted by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskSettings {
    pub balance: f64,
    pub risk_per_trade_pct: f64,
    pub daily_loss_limit_pct: f64,
    pub max_trades_per_day: u32,
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            balance: 10_000.0,
            risk_per_trade_pct: 1.0,
            daily_loss_limit_pct: 3.0,
            max_trades_per_day: 5,
        }
    }
}

/// Accepted settings plus the running state for the current trading day.
///
/// Settings only change through [`AccountRiskProfile::apply_settings`], which
/// refuses anything the validator rejects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRiskProfile {
    settings: RiskSettings,
    pub current_pnl: f64,
    pub trades_count_today: u32,
}

impl AccountRiskProfile {
    /// Start a profile from validated settings with a fresh day.
    pub fn new(settings: RiskSettings) -> Result<Self, RiskValidation> {
        let report = validate_risk_settings(&settings);
        if !report.valid {
            return Err(report);
        }
        Ok(Self {
            settings,
            current_pnl: 0.0,
            trades_count_today: 0,
        })
    }

    pub fn settings(&self) -> &RiskSettings {
        &self.settings
    }

    pub fn balance(&self) -> f64 {
        self.settings.balance
    }

    pub fn risk_per_trade_pct(&self) -> f64 {
        self.settings.risk_per_trade_pct
    }

    pub fn daily_loss_limit_pct(&self) -> f64 {
        self.settings.daily_loss_limit_pct
    }

    pub fn max_trades_per_day(&self) -> u32 {
        self.settings.max_trades_per_day
    }

    /// Replace the settings if they validate; the day's PnL and trade count
    /// are kept either way. Returns the validation report.
    pub fn apply_settings(&mut self, settings: RiskSettings) -> RiskValidation {
        let report = validate_risk_settings(&settings);
        if report.valid {
            self.settings = settings;
        }
        report
    }

    /// Book a closed trade against today's totals.
    pub fn record_trade(&mut self, pnl: f64) {
        self.current_pnl += pnl;
        self.trades_count_today += 1;
    }

    pub fn reset_day(&mut self) {
        self.current_pnl = 0.0;
        self.trades_count_today = 0;
    }
}

impl Default for AccountRiskProfile {
    fn default() -> Self {
        Self {
            settings: RiskSettings::default(),
            current_pnl: 0.0,
            trades_count_today: 0,
        }
    }
}
