//! signaldesk core — the signal-generation pipeline.
//!
//! From an OHLCV series to a vetted, sized trade signal:
//! - Domain types (bars, series, snapshots, opportunities, account risk)
//! - Indicator engine (VWAP, RSI, ATR, DX/DI, pivot levels)
//! - Regime classifier
//! - Opportunity scorer, trade-level calculator and assembler
//! - Risk validator, trading gate and position sizer
//!
//! Nothing here owns mutable shared state or performs I/O beyond config
//! loading; every call works on the values it is handed.

pub mod config;
pub mod domain;
pub mod indicators;
pub mod opportunity;
pub mod regime;
pub mod risk;
pub mod rng;
