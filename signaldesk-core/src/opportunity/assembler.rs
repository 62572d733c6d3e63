//! Opportunity assembler: score → setup → levels → accept/reject.
//!
//! Per instrument and cycle at most one opportunity is emitted. A candidate is
//! dropped when its score is below `min_score` or its risk:reward is below
//! `min_risk_reward`. Batch assessment isolates per-instrument failures: a bad
//! snapshot is reported and its siblings are still assessed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::domain::{Confidence, Direction, MarketSnapshot, Opportunity, OpportunityId, Setup};
use crate::opportunity::levels::{LevelError, TradeLevels};
use crate::opportunity::scorer::{score_snapshot, Factor, ScoreBreakdown};
use crate::rng::ConfluenceSource;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AssessError {
    #[error(transparent)]
    Level(#[from] LevelError),

    #[error("snapshot field `{field}` is not finite")]
    NonFiniteInput { field: &'static str },
}

/// Outcome of assessing one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Emitted(Opportunity),
    BelowScore { score: u8 },
    BelowRiskReward { score: u8, risk_reward: f64 },
}

impl Verdict {
    pub fn opportunity(&self) -> Option<&Opportunity> {
        match self {
            Verdict::Emitted(opp) => Some(opp),
            _ => None,
        }
    }

    pub fn into_opportunity(self) -> Option<Opportunity> {
        match self {
            Verdict::Emitted(opp) => Some(opp),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub instrument: String,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentFailure {
    pub instrument: String,
    pub reason: String,
}

/// Result of one batch: emitted opportunities ranked by score (descending,
/// ties by instrument), plus what was rejected and what failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchAssessment {
    pub opportunities: Vec<Opportunity>,
    pub rejections: Vec<Rejection>,
    pub failures: Vec<InstrumentFailure>,
}

impl BatchAssessment {
    pub fn rank(&mut self) {
        self.opportunities.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.instrument.cmp(&b.instrument))
        });
    }
}

#[derive(Debug, Clone, Default)]
pub struct OpportunityAssembler {
    config: EngineConfig,
}

impl OpportunityAssembler {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Assess one snapshot and say why nothing was emitted, if so.
    ///
    /// Draws exactly one sample from `source`.
    pub fn assess_detailed(
        &self,
        snapshot: &MarketSnapshot,
        source: &mut dyn ConfluenceSource,
        now: DateTime<Utc>,
    ) -> Result<Verdict, AssessError> {
        if let Some(field) = snapshot.first_non_finite() {
            return Err(AssessError::NonFiniteInput { field });
        }

        let breakdown = score_snapshot(snapshot, &self.config, source);
        if breakdown.score < self.config.scoring.min_score {
            debug!(
                instrument = %snapshot.instrument,
                score = breakdown.score,
                min = self.config.scoring.min_score,
                "candidate below score threshold"
            );
            return Ok(Verdict::BelowScore {
                score: breakdown.score,
            });
        }

        let setup = Setup::for_regime(snapshot.regime);
        let levels = setup.levels(snapshot, &self.config.levels)?;
        if levels.risk_reward < self.config.levels.min_risk_reward {
            debug!(
                instrument = %snapshot.instrument,
                %setup,
                risk_reward = levels.risk_reward,
                min = self.config.levels.min_risk_reward,
                "candidate below risk:reward floor"
            );
            return Ok(Verdict::BelowRiskReward {
                score: breakdown.score,
                risk_reward: levels.risk_reward,
            });
        }

        let scoring = &self.config.scoring;
        let confidence = Confidence::from_score(
            breakdown.score,
            scoring.medium_confidence,
            scoring.high_confidence,
        );

        Ok(Verdict::Emitted(Opportunity {
            id: OpportunityId::generate(),
            instrument: snapshot.instrument.clone(),
            setup,
            direction: levels.direction,
            score: breakdown.score,
            entry: levels.entry,
            stop_loss: levels.stop_loss,
            take_profit: levels.take_profit,
            risk_reward: levels.risk_reward,
            confidence,
            timestamp: now,
            regime: snapshot.regime,
            analysis_text: rationale(snapshot, setup, &levels, &breakdown),
        }))
    }

    /// Zero or one opportunity for `snapshot`.
    pub fn assess_instrument(
        &self,
        snapshot: &MarketSnapshot,
        source: &mut dyn ConfluenceSource,
        now: DateTime<Utc>,
    ) -> Result<Option<Opportunity>, AssessError> {
        Ok(self.assess_detailed(snapshot, source, now)?.into_opportunity())
    }

    /// Assess every snapshot; failures are collected, never propagated.
    pub fn assess_all(
        &self,
        snapshots: &BTreeMap<String, MarketSnapshot>,
        source: &mut dyn ConfluenceSource,
        now: DateTime<Utc>,
    ) -> BatchAssessment {
        let mut batch = BatchAssessment::default();

        for (instrument, snapshot) in snapshots {
            match self.assess_detailed(snapshot, source, now) {
                Ok(Verdict::Emitted(opp)) => batch.opportunities.push(opp),
                Ok(verdict) => batch.rejections.push(Rejection {
                    instrument: instrument.clone(),
                    verdict,
                }),
                Err(e) => {
                    warn!(%instrument, error = %e, "assessment failed");
                    batch.failures.push(InstrumentFailure {
                        instrument: instrument.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        batch.rank();
        batch
    }
}

/// One-paragraph explanation naming the regime, the direction and the
/// indicator that weighed most.
fn rationale(
    snapshot: &MarketSnapshot,
    setup: Setup,
    levels: &TradeLevels,
    breakdown: &ScoreBreakdown,
) -> String {
    let bias = match levels.direction {
        Direction::Long => "bullish",
        Direction::Short => "bearish",
    };
    let thesis = match setup {
        Setup::TrendContinuation => format!(
            "{} regime with a {bias} trend: VWAP slope {:+.5}, ADX {:.1}.",
            capitalize(&snapshot.regime.to_string()),
            snapshot.vwap_slope,
            snapshot.adx
        ),
        Setup::LiquidityReversal => {
            let stretch = if snapshot.rsi > 70.0 {
                "overbought"
            } else if snapshot.rsi < 30.0 {
                "oversold"
            } else {
                "neutral"
            };
            format!(
                "{} regime, {stretch} RSI {:.1}: {bias} reversal expected.",
                capitalize(&snapshot.regime.to_string()),
                snapshot.rsi
            )
        }
    };
    let decided_by = match breakdown.deciding_factor() {
        Factor::Trend => format!("VWAP slope {:+.5}", snapshot.vwap_slope),
        Factor::Rsi => format!("RSI {:.1}", snapshot.rsi),
        Factor::Adx => format!("ADX {:.1}", snapshot.adx),
        Factor::Spread => format!("spread {:.1} pips", snapshot.spread),
    };

    format!(
        "{thesis} {setup} on {}, led by {decided_by}. Score {}, risk:reward {:.2}.",
        snapshot.instrument, breakdown.score, levels.risk_reward
    )
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
