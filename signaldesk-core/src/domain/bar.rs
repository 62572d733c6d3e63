//! PriceBar and OhlcvSeries — the market data the core reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLCV bar for one instrument over one interval.
///
/// Immutable once produced by the data source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Returns true if any OHLCV field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite())
    }

    /// Basic OHLC sanity: high bounds the body from above, low from below.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.volume >= 0.0
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("bar {index} at {timestamp} is not after the previous bar")]
    OutOfOrder {
        index: usize,
        timestamp: DateTime<Utc>,
    },

    #[error("bar {index} duplicates timestamp {timestamp}")]
    DuplicateTimestamp {
        index: usize,
        timestamp: DateTime<Utc>,
    },

    #[error("bar {index} has a non-finite OHLCV value")]
    NonFinite { index: usize },
}

/// Ordered bar history for one instrument.
///
/// Timestamps are strictly ascending. The core only ever borrows a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvSeries {
    instrument: String,
    bars: Vec<PriceBar>,
}

impl OhlcvSeries {
    /// Build a series, rejecting unordered, duplicated, or non-finite bars.
    pub fn new(instrument: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self, SeriesError> {
        for (index, bar) in bars.iter().enumerate() {
            if bar.is_void() {
                return Err(SeriesError::NonFinite { index });
            }
            if index == 0 {
                continue;
            }
            let prev = bars[index - 1].timestamp;
            if bar.timestamp == prev {
                return Err(SeriesError::DuplicateTimestamp {
                    index,
                    timestamp: bar.timestamp,
                });
            }
            if bar.timestamp < prev {
                return Err(SeriesError::OutOfOrder {
                    index,
                    timestamp: bar.timestamp,
                });
            }
        }
        Ok(Self {
            instrument: instrument.into(),
            bars,
        })
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Most recent bar, if any.
    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// Closing prices in bar order.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 8, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn sample_bar(minutes: i64) -> PriceBar {
        PriceBar::new(at(minutes), 1.0850, 1.0862, 1.0845, 1.0858, 1_250.0)
    }

    #[test]
    fn typical_price_is_hlc_mean() {
        let bar = PriceBar::new(at(0), 1.0, 1.09, 1.08, 1.085, 10.0);
        assert!((bar.typical_price() - 1.085).abs() < 1e-12);
    }

    #[test]
    fn bar_is_sane() {
        assert!(sample_bar(0).is_sane());
    }

    #[test]
    fn bar_detects_void() {
        let mut bar = sample_bar(0);
        bar.close = f64::NAN;
        assert!(bar.is_void());
        assert!(!bar.is_sane());
    }

    #[test]
    fn series_accepts_ascending_bars() {
        let series = OhlcvSeries::new("EUR/USD", vec![sample_bar(0), sample_bar(5)]).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.instrument(), "EUR/USD");
        assert_eq!(series.last().unwrap().timestamp, at(5));
    }

    #[test]
    fn series_rejects_duplicate_timestamp() {
        let err = OhlcvSeries::new("EUR/USD", vec![sample_bar(0), sample_bar(0)]).unwrap_err();
        assert_eq!(
            err,
            SeriesError::DuplicateTimestamp {
                index: 1,
                timestamp: at(0)
            }
        );
    }

    #[test]
    fn series_rejects_out_of_order() {
        let err = OhlcvSeries::new("EUR/USD", vec![sample_bar(5), sample_bar(0)]).unwrap_err();
        assert!(matches!(err, SeriesError::OutOfOrder { index: 1, .. }));
    }

    #[test]
    fn empty_series_is_valid() {
        let series = OhlcvSeries::new("EUR/USD", Vec::new()).unwrap();
        assert!(series.is_empty());
        assert!(series.last().is_none());
    }

    #[test]
    fn bar_serialization_roundtrip() {
        let bar = sample_bar(0);
        let json = serde_json::to_string(&bar).unwrap();
        let deser: PriceBar = serde_json::from_str(&json).unwrap();
        assert_eq!(bar, deser);
    }
}
