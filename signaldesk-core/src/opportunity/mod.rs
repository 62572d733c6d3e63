//! From a classified snapshot to a vetted Opportunity.

pub mod assembler;
pub mod levels;
pub mod scorer;

pub use assembler::{
    AssessError, BatchAssessment, InstrumentFailure, OpportunityAssembler, Rejection, Verdict,
};
pub use levels::{compute_levels, LevelError, TradeLevels};
pub use scorer::{score_snapshot, Factor, ScoreBreakdown, BASE_SCORE};
