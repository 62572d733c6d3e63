//! Domain types for signaldesk

pub mod account;
pub mod bar;
pub mod ids;
pub mod opportunity;
pub mod snapshot;

pub use account::{AccountRiskProfile, RiskSettings};
pub use bar::{OhlcvSeries, PriceBar, SeriesError};
pub use ids::OpportunityId;
pub use opportunity::{Confidence, Direction, Opportunity, Setup};
pub use snapshot::{MarketSnapshot, SnapshotError};
