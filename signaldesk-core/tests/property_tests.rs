//! Property tests for pipeline invariants.
//!
//! Uses proptest to verify:
//! 1. RSI bounds — every computed RSI lies in [0, 100]
//! 2. ATR non-negativity — and exactly 0 on a flat series
//! 3. VWAP slope — non-negative on a strictly increasing series
//! 4. Assessment floor — nothing emitted below score 70 or risk:reward 1.5
//! 5. Assessment determinism — pinned randomness gives identical levels
//! 6. Classifier purity — regime depends on (ADX, slope) alone

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use signaldesk_core::config::{EngineConfig, RegimeConfig};
use signaldesk_core::domain::{MarketSnapshot, OhlcvSeries, PriceBar};
use signaldesk_core::indicators::{adx, atr, rsi, vwap};
use signaldesk_core::opportunity::OpportunityAssembler;
use signaldesk_core::regime::classify;
use signaldesk_core::rng::{FixedConfluence, SeededConfluence};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_closes(min: usize, max: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.5..2.0_f64, min..max)
}

fn series_from_closes(closes: &[f64]) -> OhlcvSeries {
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar::new(
                base + Duration::minutes(i as i64),
                open,
                open.max(close) + 0.0005,
                open.min(close) - 0.0005,
                close,
                500.0 + (i % 7) as f64 * 100.0,
            )
        })
        .collect();
    OhlcvSeries::new("PROP", bars).unwrap()
}

fn arb_snapshot() -> impl Strategy<Value = MarketSnapshot> {
    (
        0.5..2.0_f64,       // price
        0.1..4.0_f64,       // spread
        0.0001..0.02_f64,   // atr
        -0.001..0.001_f64,  // vwap slope
        0.0..100.0_f64,     // rsi
        0.0..60.0_f64,      // adx
    )
        .prop_map(|(price, spread, atr, slope, rsi, adx)| {
            MarketSnapshot::new(
                "EUR/USD",
                price,
                spread,
                atr,
                slope,
                rsi,
                adx,
                1.0,
                Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
                &RegimeConfig::default(),
            )
        })
}

// ── 1. RSI Bounds ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn rsi_is_bounded(closes in arb_closes(16, 80), period in 2usize..15) {
        let series = series_from_closes(&closes);
        for s in rsi(&series, period) {
            prop_assert!(s.value.is_finite());
            prop_assert!((0.0..=100.0).contains(&s.value), "RSI {} out of bounds", s.value);
        }
    }

    #[test]
    fn dx_is_bounded(closes in arb_closes(30, 80), period in 2usize..15) {
        let series = series_from_closes(&closes);
        for s in adx(&series, period) {
            prop_assert!((0.0..=100.0).contains(&s.value), "DX {} out of bounds", s.value);
        }
    }
}

// ── 2. ATR Non-negativity ────────────────────────────────────────────

proptest! {
    #[test]
    fn atr_is_non_negative(closes in arb_closes(16, 80), period in 1usize..15) {
        let series = series_from_closes(&closes);
        let out = atr(&series, period);
        prop_assert_eq!(out.len(), closes.len() - period);
        for s in out {
            prop_assert!(s.value >= 0.0);
        }
    }

    #[test]
    fn atr_of_flat_series_is_zero(price in 0.5..2.0_f64, len in 15usize..60) {
        let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let bars = (0..len)
            .map(|i| PriceBar::new(base + Duration::minutes(i as i64), price, price, price, price, 1000.0))
            .collect();
        let series = OhlcvSeries::new("FLAT", bars).unwrap();
        prop_assert!(atr(&series, 14).iter().all(|s| s.value == 0.0));
    }
}

// ── 3. VWAP Slope ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn vwap_slope_non_negative_on_rising_prices(
        start in 0.5..2.0_f64,
        steps in prop::collection::vec(0.0001..0.01_f64, 2..60),
    ) {
        let mut closes = vec![start];
        for step in steps {
            let next = closes[closes.len() - 1] + step;
            closes.push(next);
        }
        let series = series_from_closes(&closes);
        let out = vwap(&series);
        prop_assert_eq!(out.len(), closes.len());
        prop_assert_eq!(out[0].slope, 0.0);
        for s in &out[1..] {
            prop_assert!(s.slope >= 0.0, "slope {} negative", s.slope);
        }
    }
}

// ── 4–5. Assessment ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn emitted_opportunities_clear_both_floors(snapshot in arb_snapshot(), seed in any::<u64>()) {
        let asm = OpportunityAssembler::default();
        let mut source = SeededConfluence::new(seed);
        if let Ok(Some(opp)) = asm.assess_instrument(&snapshot, &mut source, snapshot.last_update) {
            prop_assert!(opp.score >= 70);
            prop_assert!(opp.score <= 100);
            prop_assert!(opp.risk_reward >= 1.5);
            prop_assert!(opp.risk_reward > 0.0);
        }
    }

    #[test]
    fn pinned_assessment_is_deterministic(snapshot in arb_snapshot()) {
        let asm = OpportunityAssembler::default();
        let a = asm.assess_instrument(&snapshot, &mut FixedConfluence::zero(), snapshot.last_update);
        let b = asm.assess_instrument(&snapshot, &mut FixedConfluence::zero(), snapshot.last_update);
        match (a, b) {
            (Ok(Some(a)), Ok(Some(b))) => {
                prop_assert_eq!(a.score, b.score);
                prop_assert_eq!(a.setup, b.setup);
                prop_assert_eq!(a.entry, b.entry);
                prop_assert_eq!(a.stop_loss, b.stop_loss);
                prop_assert_eq!(a.take_profit, b.take_profit);
                prop_assert_eq!(a.risk_reward, b.risk_reward);
            }
            (Ok(None), Ok(None)) => {}
            (Err(a), Err(b)) => prop_assert_eq!(a, b),
            (a, b) => prop_assert!(false, "diverging outcomes: {:?} vs {:?}", a, b),
        }
    }
}

// ── 6. Classifier Purity ─────────────────────────────────────────────

proptest! {
    #[test]
    fn classifier_has_no_memory(
        adx_a in 0.0..60.0_f64,
        slope_a in -0.001..0.001_f64,
        history in prop::collection::vec((0.0..60.0_f64, -0.001..0.001_f64), 0..20),
    ) {
        let cfg = RegimeConfig::default();
        let first = classify(adx_a, slope_a, &cfg);
        for (adx, slope) in history {
            let _ = classify(adx, slope, &cfg);
        }
        prop_assert_eq!(classify(adx_a, slope_a, &cfg), first);
    }

    #[test]
    fn snapshot_regime_matches_classifier(snapshot in arb_snapshot()) {
        let cfg = EngineConfig::default();
        prop_assert_eq!(snapshot.regime, classify(snapshot.adx, snapshot.vwap_slope, &cfg.regime));
    }
}
