//! Bar loading for the desk.
//!
//! Given a list of instruments, loads one series each. Fallback policy:
//! 1. If `<dir>/<BASE>_<QUOTE>.csv` exists → parse it
//! 2. If not and synthetic data is allowed → generate a seeded random walk (tagged)
//! 3. Otherwise → fail with a clear error
//!
//! CSV layout: header `timestamp,open,high,low,close,volume`, RFC 3339
//! timestamps, ascending.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use signaldesk_core::domain::{OhlcvSeries, PriceBar, SeriesError};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("bad series for {instrument}: {source}")]
    Series {
        instrument: String,
        #[source]
        source: SeriesError,
    },

    #[error("no data file for '{instrument}' (expected {path}; use --synthetic for synthetic data)")]
    Missing { instrument: String, path: PathBuf },

    #[error("'{0}' is not a BASE/QUOTE instrument")]
    BadInstrument(String),
}

/// Where a series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    File,
    Synthetic,
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub data_dir: Option<PathBuf>,
    /// Generate synthetic bars when a file is missing (or no directory is given).
    pub synthetic: bool,
    /// Length of each synthetic series.
    pub synthetic_bars: usize,
    /// Timestamp of the last synthetic bar.
    pub synthetic_end: DateTime<Utc>,
}

#[derive(Debug)]
pub struct LoadedData {
    pub series: BTreeMap<String, OhlcvSeries>,
    pub sources: BTreeMap<String, DataSource>,
    /// BLAKE3 over every bar, in instrument order.
    pub dataset_hash: String,
    pub has_synthetic: bool,
}

#[derive(Debug, Deserialize)]
struct CsvBar {
    timestamp: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// `EUR/USD` → `EUR_USD.csv`.
pub fn file_name_for(instrument: &str) -> Result<String, LoadError> {
    match instrument.split_once('/') {
        Some((base, quote)) if !base.is_empty() && !quote.is_empty() => {
            Ok(format!("{base}_{quote}.csv"))
        }
        _ => Err(LoadError::BadInstrument(instrument.to_string())),
    }
}

/// `EUR_USD.csv` → `EUR/USD`; `None` for anything else.
pub fn instrument_for_file(path: &Path) -> Option<String> {
    if path.extension()?.to_str()? != "csv" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let (base, quote) = stem.split_once('_')?;
    if base.is_empty() || quote.is_empty() || quote.contains('_') {
        return None;
    }
    Some(format!("{base}/{quote}"))
}

/// Parse one CSV file into a validated series.
pub fn load_series_file(path: &Path, instrument: &str) -> Result<OhlcvSeries, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    let mut bars = Vec::new();
    for record in reader.deserialize::<CsvBar>() {
        let row = record.map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        bars.push(PriceBar::new(
            row.timestamp,
            row.open,
            row.high,
            row.low,
            row.close,
            row.volume,
        ));
    }

    let insane = bars.iter().filter(|b| !b.is_sane()).count();
    if insane > 0 {
        warn!(%instrument, count = insane, "bars with inconsistent OHLC values");
    }

    OhlcvSeries::new(instrument, bars).map_err(|source| LoadError::Series {
        instrument: instrument.to_string(),
        source,
    })
}

/// Every `BASE_QUOTE.csv` in `dir`, keyed `BASE/QUOTE`. Other files are skipped.
pub fn load_series_dir(dir: &Path) -> Result<BTreeMap<String, OhlcvSeries>, LoadError> {
    let entries = std::fs::read_dir(dir).map_err(|source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut out = BTreeMap::new();
    for entry in entries {
        let path = entry
            .map_err(|source| LoadError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        match instrument_for_file(&path) {
            Some(instrument) => {
                let series = load_series_file(&path, &instrument)?;
                debug!(%instrument, bars = series.len(), "loaded series");
                out.insert(instrument, series);
            }
            None => debug!(path = %path.display(), "skipping non-series file"),
        }
    }
    Ok(out)
}

/// Load every instrument in `instruments` following the fallback policy.
pub fn load_instruments(
    instruments: &[String],
    opts: &LoadOptions,
) -> Result<LoadedData, LoadError> {
    let mut series = BTreeMap::new();
    let mut sources = BTreeMap::new();
    let mut has_synthetic = false;

    for instrument in instruments {
        let file = file_name_for(instrument)?;

        if let Some(dir) = &opts.data_dir {
            let path = dir.join(&file);
            if path.is_file() {
                series.insert(instrument.clone(), load_series_file(&path, instrument)?);
                sources.insert(instrument.clone(), DataSource::File);
                continue;
            }
        }

        if opts.synthetic {
            warn!(%instrument, "generating synthetic data; results are tagged synthetic");
            series.insert(
                instrument.clone(),
                generate_synthetic_series(instrument, opts.synthetic_bars, opts.synthetic_end)?,
            );
            sources.insert(instrument.clone(), DataSource::Synthetic);
            has_synthetic = true;
            continue;
        }

        let path = opts
            .data_dir
            .as_deref()
            .map(|d| d.join(&file))
            .unwrap_or_else(|| PathBuf::from(&file));
        return Err(LoadError::Missing {
            instrument: instrument.clone(),
            path,
        });
    }

    let dataset_hash = compute_dataset_hash(&series);
    Ok(LoadedData {
        series,
        sources,
        dataset_hash,
        has_synthetic,
    })
}

/// Deterministic BLAKE3 hash over all bars in instrument order.
pub fn compute_dataset_hash(series: &BTreeMap<String, OhlcvSeries>) -> String {
    let mut hasher = blake3::Hasher::new();
    for (instrument, s) in series {
        hasher.update(instrument.as_bytes());
        for bar in s.bars() {
            hasher.update(&bar.timestamp.timestamp().to_le_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.volume.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

fn base_price(instrument: &str) -> f64 {
    match instrument {
        "EUR/USD" => 1.0850,
        "GBP/USD" => 1.2700,
        "AUD/USD" => 0.6600,
        "USD/CAD" => 1.3600,
        "USD/CHF" => 0.8800,
        _ => 1.0000,
    }
}

/// Minute-bar random walk ending at `end`, seeded from the instrument name.
///
/// Clearly fake; for demos and tests only.
pub fn generate_synthetic_series(
    instrument: &str,
    bars: usize,
    end: DateTime<Utc>,
) -> Result<OhlcvSeries, LoadError> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(instrument.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    // A per-instrument drift gives some series a trend and others a range.
    let drift: f64 = rng.gen_range(-0.00008..0.00008);
    let start = end - Duration::minutes(bars.saturating_sub(1) as i64);
    let mut price = base_price(instrument);
    let mut out = Vec::with_capacity(bars);

    for i in 0..bars {
        let step: f64 = rng.gen_range(-0.0004..0.0004) + drift;
        let open = price;
        let close = (price * (1.0 + step)).max(0.0001);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.0003));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.0003));
        let volume = rng.gen_range(200.0..2_000.0);

        out.push(PriceBar::new(
            start + Duration::minutes(i as i64),
            open,
            high,
            low,
            close,
            volume,
        ));
        price = close;
    }

    OhlcvSeries::new(instrument, out).map_err(|source| LoadError::Series {
        instrument: instrument.to_string(),
        source,
    })
}
