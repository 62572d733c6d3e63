//! Opportunity — an immutable, vetted trade signal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::OpportunityId;
use crate::regime::Regime;

/// Trade thesis. Each variant carries its own level rule (see `opportunity::levels`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Setup {
    TrendContinuation,
    LiquidityReversal,
}

impl Setup {
    /// Trending markets continue; everything else is played for a reversal.
    pub fn for_regime(regime: Regime) -> Self {
        match regime {
            Regime::Trending => Setup::TrendContinuation,
            Regime::Ranging | Regime::Volatile => Setup::LiquidityReversal,
        }
    }
}

impl fmt::Display for Setup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Setup::TrendContinuation => write!(f, "Trend Continuation"),
            Setup::LiquidityReversal => write!(f, "Liquidity Reversal"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1 for long, −1 for short.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "long"),
            Direction::Short => write!(f, "short"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn from_score(score: u8, medium: u8, high: u8) -> Self {
        if score >= high {
            Confidence::High
        } else if score >= medium {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Low => write!(f, "low"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
        }
    }
}

/// Emitted by the assembler; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub id: OpportunityId,
    pub instrument: String,
    pub setup: Setup,
    pub direction: Direction,
    pub score: u8,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub risk_reward: f64,
    pub confidence: Confidence,
    pub timestamp: DateTime<Utc>,
    pub regime: Regime,
    pub analysis_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_follows_regime() {
        assert_eq!(Setup::for_regime(Regime::Trending), Setup::TrendContinuation);
        assert_eq!(Setup::for_regime(Regime::Ranging), Setup::LiquidityReversal);
        assert_eq!(Setup::for_regime(Regime::Volatile), Setup::LiquidityReversal);
    }

    #[test]
    fn confidence_thresholds() {
        assert_eq!(Confidence::from_score(100, 75, 85), Confidence::High);
        assert_eq!(Confidence::from_score(85, 75, 85), Confidence::High);
        assert_eq!(Confidence::from_score(84, 75, 85), Confidence::Medium);
        assert_eq!(Confidence::from_score(75, 75, 85), Confidence::Medium);
        assert_eq!(Confidence::from_score(74, 75, 85), Confidence::Low);
        assert!(Confidence::High > Confidence::Low);
    }

    #[test]
    fn confidence_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Confidence::Medium).unwrap(), "\"medium\"");
    }
}
