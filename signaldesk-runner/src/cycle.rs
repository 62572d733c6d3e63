//! Assessment cycles — the driver around the core assembler.
//!
//! A cycle turns the latest bar series into snapshots, assesses every
//! instrument and records the emitted opportunities. Two triggers start a
//! cycle (the periodic timer and an on-demand request); both go through
//! [`Desk::run_cycle`], and at most one cycle is in flight at a time.
//! A trigger arriving while another cycle runs is rejected with
//! [`CycleError::Busy`] rather than queued.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use signaldesk_core::domain::{MarketSnapshot, OhlcvSeries, Opportunity};
use signaldesk_core::opportunity::{InstrumentFailure, OpportunityAssembler, Rejection};
use signaldesk_core::rng::{RngHierarchy, SeededConfluence};

use crate::config::DeskConfig;
use crate::correlation::{correlations_to_primary, DEFAULT_WINDOW};
use crate::history::OpportunityHistory;

/// What started a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Scheduled,
    OnDemand,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scheduled => write!(f, "scheduled"),
            Self::OnDemand => write!(f, "on-demand"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CycleError {
    #[error("an assessment cycle is already in flight; {trigger} trigger dropped")]
    Busy { trigger: Trigger },
}

/// Everything one cycle produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub cycle: u64,
    pub trigger: Trigger,
    pub started_at: DateTime<Utc>,
    pub config_fingerprint: String,
    /// Snapshots that were assessed, keyed by instrument.
    pub snapshots: BTreeMap<String, MarketSnapshot>,
    /// Ranked by score descending, then instrument.
    pub opportunities: Vec<Opportunity>,
    pub rejections: Vec<Rejection>,
    /// Snapshot and assessment failures, one per instrument.
    pub failures: Vec<InstrumentFailure>,
}

/// Holds the in-flight flag for one cycle; cleared on drop.
#[derive(Debug)]
pub struct CycleGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// The trading desk: configuration, assembler and opportunity history.
///
/// `Desk` is `Sync`; a timer thread and request handlers can share one
/// behind an `Arc`.
#[derive(Debug)]
pub struct Desk {
    config: DeskConfig,
    assembler: OpportunityAssembler,
    history: Mutex<OpportunityHistory>,
    in_flight: AtomicBool,
    cycles: AtomicU64,
    rng: Option<RngHierarchy>,
    fingerprint: String,
}

impl Desk {
    pub fn new(config: DeskConfig) -> Self {
        let assembler = OpportunityAssembler::new(config.engine.clone());
        let history = Mutex::new(OpportunityHistory::new(config.history_capacity));
        let rng = config.master_seed.map(RngHierarchy::new);
        let fingerprint = config.engine.fingerprint();
        Self {
            config,
            assembler,
            history,
            in_flight: AtomicBool::new(false),
            cycles: AtomicU64::new(0),
            rng,
            fingerprint,
        }
    }

    pub fn config(&self) -> &DeskConfig {
        &self.config
    }

    /// Number of cycles completed so far.
    pub fn cycles_completed(&self) -> u64 {
        self.cycles.load(Ordering::Acquire)
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Claim the single in-flight slot.
    pub fn try_begin_cycle(&self, trigger: Trigger) -> Result<CycleGuard<'_>, CycleError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| CycleGuard {
                flag: &self.in_flight,
            })
            .map_err(|_| {
                warn!(%trigger, "rejecting overlapping cycle trigger");
                CycleError::Busy { trigger }
            })
    }

    /// Run one full cycle over `series`, stamping opportunities with `now`.
    pub fn run_cycle(
        &self,
        trigger: Trigger,
        series: &BTreeMap<String, OhlcvSeries>,
        now: DateTime<Utc>,
    ) -> Result<CycleReport, CycleError> {
        let _guard = self.try_begin_cycle(trigger)?;
        let cycle = self.cycles.load(Ordering::Acquire);

        let (snapshots, mut failures) = self.build_snapshots(series);

        let mut source = self.confluence_for(cycle);
        let batch = self.assembler.assess_all(&snapshots, &mut source, now);
        failures.extend(batch.failures);
        failures.sort_by(|a, b| a.instrument.cmp(&b.instrument));

        let evicted = self.history().record_batch(&batch.opportunities);

        let config_short = self.fingerprint.get(..12).unwrap_or(&self.fingerprint);
        info!(
            cycle,
            %trigger,
            config = config_short,
            instruments = series.len(),
            emitted = batch.opportunities.len(),
            rejected = batch.rejections.len(),
            failed = failures.len(),
            evicted,
            "assessment cycle complete"
        );

        self.cycles.fetch_add(1, Ordering::AcqRel);

        Ok(CycleReport {
            cycle,
            trigger,
            started_at: now,
            config_fingerprint: self.fingerprint.clone(),
            snapshots,
            opportunities: batch.opportunities,
            rejections: batch.rejections,
            failures,
        })
    }

    /// One timer tick: load fresh bars, then run a scheduled cycle.
    ///
    /// A failed load or an overlapping cycle skips the tick with a warning;
    /// the caller's schedule keeps going either way.
    pub fn scheduled_tick<E: fmt::Display>(
        &self,
        load: impl FnOnce() -> Result<BTreeMap<String, OhlcvSeries>, E>,
        now: DateTime<Utc>,
    ) -> Option<CycleReport> {
        let series = match load() {
            Ok(series) => series,
            Err(e) => {
                warn!(error = %e, "bar load failed; skipping tick");
                return None;
            }
        };
        match self.run_cycle(Trigger::Scheduled, &series, now) {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(error = %e, "cycle skipped");
                None
            }
        }
    }

    /// Snapshot every series in parallel; short series become failures.
    pub fn build_snapshots(
        &self,
        series: &BTreeMap<String, OhlcvSeries>,
    ) -> (BTreeMap<String, MarketSnapshot>, Vec<InstrumentFailure>) {
        let engine = &self.config.engine;
        let correlations =
            correlations_to_primary(series, &engine.instruments.primary, DEFAULT_WINDOW);

        let results: Vec<_> = series
            .par_iter()
            .map(|(name, s)| {
                let spread = self.config.spread_for(name);
                let rho = correlations.get(name).copied().unwrap_or(0.0);
                (name.clone(), MarketSnapshot::from_series(s, spread, rho, engine))
            })
            .collect();

        let mut snapshots = BTreeMap::new();
        let mut failures = Vec::new();
        for (instrument, result) in results {
            match result {
                Ok(snap) => {
                    snapshots.insert(instrument, snap);
                }
                Err(e) => {
                    warn!(%instrument, error = %e, "skipping instrument this cycle");
                    failures.push(InstrumentFailure {
                        instrument,
                        reason: e.to_string(),
                    });
                }
            }
        }
        (snapshots, failures)
    }

    pub fn history_len(&self) -> usize {
        self.history().len()
    }

    fn history(&self) -> MutexGuard<'_, OpportunityHistory> {
        // Poisoned locks still guard a consistent deque.
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn confluence_for(&self, cycle: u64) -> SeededConfluence {
        match &self.rng {
            Some(h) => h.confluence_for(cycle, "market_structure"),
            None => SeededConfluence::from_rng(StdRng::from_entropy()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use signaldesk_core::domain::PriceBar;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn flat_series(name: &str, n: usize) -> OhlcvSeries {
        let base = now() - Duration::minutes(n as i64);
        let bars = (0..n)
            .map(|i| {
                let c = 1.0 + (i as f64 * 0.3).sin() * 0.001;
                PriceBar::new(base + Duration::minutes(i as i64), c, c + 0.0005, c - 0.0005, c, 500.0)
            })
            .collect();
        OhlcvSeries::new(name, bars).unwrap()
    }

    fn seeded_desk() -> Desk {
        Desk::new(DeskConfig {
            master_seed: Some(42),
            ..DeskConfig::default()
        })
    }

    #[test]
    fn guard_rejects_overlap_and_releases_on_drop() {
        let desk = seeded_desk();
        let guard = desk.try_begin_cycle(Trigger::Scheduled).unwrap();
        assert!(desk.is_busy());
        assert_eq!(
            desk.try_begin_cycle(Trigger::OnDemand).unwrap_err(),
            CycleError::Busy {
                trigger: Trigger::OnDemand
            }
        );
        drop(guard);
        assert!(!desk.is_busy());
        assert!(desk.try_begin_cycle(Trigger::OnDemand).is_ok());
    }

    #[test]
    fn run_cycle_while_busy_is_rejected() {
        let desk = seeded_desk();
        let _held = desk.try_begin_cycle(Trigger::OnDemand).unwrap();
        let err = desk
            .run_cycle(Trigger::Scheduled, &BTreeMap::new(), now())
            .unwrap_err();
        assert!(matches!(err, CycleError::Busy { .. }));
        assert_eq!(desk.cycles_completed(), 0);
    }

    #[test]
    fn short_series_fail_without_aborting_siblings() {
        let desk = seeded_desk();
        let mut series = BTreeMap::new();
        series.insert("EUR/USD".to_string(), flat_series("EUR/USD", 120));
        series.insert("GBP/USD".to_string(), flat_series("GBP/USD", 5));

        let report = desk.run_cycle(Trigger::Scheduled, &series, now()).unwrap();
        assert_eq!(report.cycle, 0);
        assert!(report.snapshots.contains_key("EUR/USD"));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].instrument, "GBP/USD");
        assert_eq!(desk.cycles_completed(), 1);
        assert!(!desk.is_busy());
    }

    #[test]
    fn primary_snapshot_correlates_one() {
        let desk = seeded_desk();
        let mut series = BTreeMap::new();
        series.insert("EUR/USD".to_string(), flat_series("EUR/USD", 80));
        let (snaps, failures) = desk.build_snapshots(&series);
        assert!(failures.is_empty());
        assert_eq!(snaps["EUR/USD"].correlation, 1.0);
        assert_eq!(snaps["EUR/USD"].spread, 1.2);
    }

    #[test]
    fn failed_load_skips_the_tick_only() {
        let desk = seeded_desk();
        let missing = desk.scheduled_tick(
            || Err::<BTreeMap<String, OhlcvSeries>, _>("EUR_USD.csv: not found"),
            now(),
        );
        assert!(missing.is_none());
        assert_eq!(desk.cycles_completed(), 0);
        assert!(!desk.is_busy());

        let mut series = BTreeMap::new();
        series.insert("EUR/USD".to_string(), flat_series("EUR/USD", 120));
        let report = desk
            .scheduled_tick(|| Ok::<_, String>(series.clone()), now())
            .expect("next tick runs");
        assert_eq!(report.cycle, 0);
        assert_eq!(report.trigger, Trigger::Scheduled);
        assert_eq!(desk.cycles_completed(), 1);
    }

    #[test]
    fn overlapping_tick_is_skipped() {
        let desk = seeded_desk();
        let _held = desk.try_begin_cycle(Trigger::OnDemand).unwrap();
        assert!(desk
            .scheduled_tick(|| Ok::<_, String>(BTreeMap::new()), now())
            .is_none());
        assert_eq!(desk.cycles_completed(), 0);
    }

    #[test]
    fn trigger_display() {
        assert_eq!(Trigger::Scheduled.to_string(), "scheduled");
        assert_eq!(Trigger::OnDemand.to_string(), "on-demand");
    }
}
