//! signaldesk runner — the driver around the signal core.
//!
//! This crate builds on `signaldesk-core` to provide:
//! - Desk configuration (instruments, spreads, history size, seeding)
//! - Bar loading from CSV with a synthetic fallback
//! - Close-price correlation against the primary instrument
//! - Single-flight assessment cycles for timer and on-demand triggers
//! - Bounded opportunity history with JSONL export
//! - Tracing setup for binaries

pub mod config;
pub mod correlation;
pub mod cycle;
pub mod data_loader;
pub mod history;
pub mod logging;

pub use config::DeskConfig;
pub use correlation::{correlations_to_primary, pearson_tail};
pub use cycle::{CycleError, CycleGuard, CycleReport, Desk, Trigger};
pub use data_loader::{
    generate_synthetic_series, load_instruments, load_series_dir, load_series_file, DataSource,
    LoadError, LoadOptions, LoadedData,
};
pub use history::{append_jsonl, read_jsonl, OpportunityHistory};
pub use logging::init_tracing;
