//! Risk management: settings validation, the daily trading gate and position sizing.

pub mod gate;
pub mod sizer;
pub mod validator;

pub use gate::{GateDecision, TradingGate};
pub use sizer::{size_opportunity, size_position, SizingError, SizingReport, PIPS_PER_UNIT};
pub use validator::{validate_risk_settings, RiskValidation, RiskViolation};
