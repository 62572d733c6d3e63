//! signaldesk CLI — assessment, indicator and risk commands.
//!
//! Commands:
//! - `assess` — one on-demand cycle over a data directory (or synthetic data)
//! - `watch` — scheduled cycles every `interval_secs`, appending to a JSONL history
//! - `indicators` — dump VWAP/RSI/ATR/ADX and pivots for one CSV file
//! - `validate-risk` — check proposed account risk settings
//! - `size` — position size for an entry/stop pair
//! - `config` — print the default TOML configuration or check a file

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use signaldesk_core::config::EngineConfig;
use signaldesk_core::domain::{AccountRiskProfile, OhlcvSeries, RiskSettings};
use signaldesk_core::indicators::compute_indicators;
use signaldesk_core::risk::{size_opportunity, size_position, validate_risk_settings, TradingGate};
use signaldesk_runner::data_loader::instrument_for_file;
use signaldesk_runner::{
    append_jsonl, init_tracing, load_instruments, load_series_file, CycleReport, Desk,
    DeskConfig, LoadOptions, Trigger,
};

#[derive(Parser)]
#[command(
    name = "signaldesk",
    about = "signaldesk — forex opportunity scoring and risk sizing"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv everything). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Clone)]
struct SourceArgs {
    /// Path to a desk TOML config file. Defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of BASE_QUOTE.csv files. Overrides the config's data_dir.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Generate synthetic bars for instruments without a data file.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Master seed for the market-structure draws. Overrides the config.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one on-demand assessment cycle and print the opportunities.
    Assess {
        #[command(flatten)]
        source: SourceArgs,

        /// Size accepted opportunities against this account balance.
        #[arg(long)]
        balance: Option<f64>,

        /// Risk per trade in percent (with --balance).
        #[arg(long, default_value_t = 1.0)]
        risk_pct: f64,

        /// Append emitted opportunities to this JSONL file.
        #[arg(long)]
        history: Option<PathBuf>,

        /// Print the full cycle report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Run scheduled cycles until interrupted (or for --cycles cycles).
    Watch {
        #[command(flatten)]
        source: SourceArgs,

        /// Stop after this many cycles. 0 runs forever.
        #[arg(long, default_value_t = 0)]
        cycles: u64,

        /// Seconds between cycles. Overrides the config's interval_secs.
        #[arg(long)]
        interval: Option<u64>,

        /// JSONL file that receives every emitted opportunity.
        #[arg(long, default_value = "results/opportunities.jsonl")]
        history: PathBuf,
    },
    /// Compute indicators for one CSV file.
    Indicators {
        /// CSV file with timestamp,open,high,low,close,volume rows.
        file: PathBuf,

        /// Instrument name. Derived from a BASE_QUOTE.csv file name when omitted.
        #[arg(long)]
        instrument: Option<String>,

        /// Engine TOML config (indicator periods).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Rows of each indicator to print.
        #[arg(long, default_value_t = 5)]
        last: usize,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Validate proposed account risk settings.
    ValidateRisk {
        #[arg(long)]
        balance: f64,

        #[arg(long, default_value_t = 1.0)]
        risk_pct: f64,

        #[arg(long, default_value_t = 3.0)]
        daily_loss_pct: f64,

        #[arg(long, default_value_t = 5)]
        max_trades: u32,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Position size so that hitting the stop loses risk-pct of balance.
    Size {
        #[arg(long)]
        balance: f64,

        #[arg(long, default_value_t = 1.0)]
        risk_pct: f64,

        #[arg(long)]
        entry: f64,

        #[arg(long)]
        stop: f64,

        #[arg(long, default_value = "EUR/USD")]
        instrument: String,

        /// Engine TOML config (pip values).
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the default desk configuration, or validate a config file.
    Config {
        /// Validate this file instead of printing defaults.
        #[arg(long)]
        check: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Assess {
            source,
            balance,
            risk_pct,
            history,
            json,
        } => run_assess(&source, balance, risk_pct, history.as_deref(), json),
        Commands::Watch {
            source,
            cycles,
            interval,
            history,
        } => run_watch(&source, cycles, interval, &history),
        Commands::Indicators {
            file,
            instrument,
            config,
            last,
            json,
        } => run_indicators(&file, instrument, config.as_deref(), last, json),
        Commands::ValidateRisk {
            balance,
            risk_pct,
            daily_loss_pct,
            max_trades,
            json,
        } => run_validate_risk(
            RiskSettings {
                balance,
                risk_per_trade_pct: risk_pct,
                daily_loss_limit_pct: daily_loss_pct,
                max_trades_per_day: max_trades,
            },
            json,
        ),
        Commands::Size {
            balance,
            risk_pct,
            entry,
            stop,
            instrument,
            config,
            json,
        } => run_size(balance, risk_pct, entry, stop, &instrument, config.as_deref(), json),
        Commands::Config { check } => run_config(check.as_deref()),
    }
}

fn desk_config(source: &SourceArgs) -> Result<DeskConfig> {
    let mut config = match &source.config {
        Some(path) => DeskConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => {
            let config = DeskConfig::default();
            config.validate()?;
            config
        }
    };
    if let Some(dir) = &source.data_dir {
        config.data_dir = Some(dir.clone());
    }
    if source.seed.is_some() {
        config.master_seed = source.seed;
    }
    if config.data_dir.is_none() && !source.synthetic {
        bail!("no data directory configured; pass --data-dir or --synthetic");
    }
    Ok(config)
}

fn load_cycle_data(
    config: &DeskConfig,
    synthetic: bool,
) -> Result<BTreeMap<String, OhlcvSeries>> {
    let opts = LoadOptions {
        data_dir: config.data_dir.clone(),
        synthetic,
        synthetic_bars: config.synthetic_bars,
        synthetic_end: Utc::now(),
    };
    let loaded = load_instruments(&config.instruments, &opts)?;
    if loaded.has_synthetic {
        warn!("some instruments use SYNTHETIC data");
    }
    let dataset = loaded.dataset_hash.get(..12).unwrap_or(&loaded.dataset_hash);
    info!(instruments = loaded.series.len(), dataset, "bars loaded");
    Ok(loaded.series)
}

fn run_assess(
    source: &SourceArgs,
    balance: Option<f64>,
    risk_pct: f64,
    history: Option<&Path>,
    json: bool,
) -> Result<()> {
    let config = desk_config(source)?;
    let series = load_cycle_data(&config, source.synthetic)?;
    let desk = Desk::new(config);

    let report = desk.run_cycle(Trigger::OnDemand, &series, Utc::now())?;

    if let Some(path) = history {
        append_jsonl(path, &report.opportunities)
            .with_context(|| format!("appending to {}", path.display()))?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if let Some(balance) = balance {
        print_sizing(&desk, &report, balance, risk_pct)?;
    }
    Ok(())
}

fn run_watch(source: &SourceArgs, cycles: u64, interval: Option<u64>, history: &Path) -> Result<()> {
    let mut config = desk_config(source)?;
    if let Some(secs) = interval {
        if secs == 0 {
            bail!("--interval must be >= 1");
        }
        config.interval_secs = secs;
    }
    let period = Duration::from_secs(config.interval_secs);
    let synthetic = source.synthetic;
    let desk = Desk::new(config);

    let mut n = 0u64;
    loop {
        let tick = desk.scheduled_tick(|| load_cycle_data(desk.config(), synthetic), Utc::now());
        if let Some(report) = tick {
            append_jsonl(history, &report.opportunities)
                .with_context(|| format!("appending to {}", history.display()))?;
            print_report(&report);
        }

        n += 1;
        if cycles > 0 && n >= cycles {
            break;
        }
        std::thread::sleep(period);
    }

    println!(
        "{} cycles, {} opportunities in memory, history at {}",
        desk.cycles_completed(),
        desk.history_len(),
        history.display()
    );
    Ok(())
}

fn run_indicators(
    file: &Path,
    instrument: Option<String>,
    config_path: Option<&Path>,
    last: usize,
    json: bool,
) -> Result<()> {
    let instrument = match instrument.or_else(|| instrument_for_file(file)) {
        Some(i) => i,
        None => bail!(
            "cannot derive an instrument from '{}'; pass --instrument",
            file.display()
        ),
    };
    let engine = match config_path {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };

    let series = load_series_file(file, &instrument)?;
    let set = compute_indicators(&series, &engine.indicators);

    if json {
        println!("{}", serde_json::to_string_pretty(&set)?);
        return Ok(());
    }

    println!("{instrument}: {} bars", series.len());
    println!();
    println!("{:<22} {:>12} {:>12}", "VWAP timestamp", "vwap", "slope");
    for s in tail(&set.vwap, last) {
        println!(
            "{:<22} {:>12.5} {:>12.6}",
            s.timestamp.format("%Y-%m-%d %H:%M"),
            s.value,
            s.slope
        );
    }
    for (name, samples) in [("RSI", &set.rsi), ("ATR", &set.atr), ("ADX", &set.adx)] {
        println!();
        println!("{:<22} {:>12}", format!("{name} timestamp"), name.to_lowercase());
        if samples.is_empty() {
            println!("  (not enough bars)");
        }
        for s in tail(samples, last) {
            println!(
                "{:<22} {:>12.5}",
                s.timestamp.format("%Y-%m-%d %H:%M"),
                s.value
            );
        }
    }
    if let Some(p) = &set.pivot_points {
        println!();
        println!(
            "Pivots: P {:.5} | R1 {:.5} R2 {:.5} R3 {:.5} | S1 {:.5} S2 {:.5} S3 {:.5}",
            p.pivot, p.r1, p.r2, p.r3, p.s1, p.s2, p.s3
        );
    }
    Ok(())
}

fn run_validate_risk(settings: RiskSettings, json: bool) -> Result<()> {
    let report = validate_risk_settings(&settings);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.valid {
        println!("Risk settings are valid.");
    } else {
        for e in &report.errors {
            println!("  - {e}");
        }
    }
    if !report.valid {
        bail!("{} risk rule(s) violated", report.errors.len());
    }
    Ok(())
}

fn run_size(
    balance: f64,
    risk_pct: f64,
    entry: f64,
    stop: f64,
    instrument: &str,
    config_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let engine = match config_path {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    let r = size_position(balance, risk_pct, entry, stop, instrument, &engine.instruments)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&r)?);
    } else {
        println!("Instrument:     {instrument}");
        println!("Risk amount:    {:.2}", r.risk_amount);
        println!("Stop distance:  {:.1} pips", r.stop_distance_pips);
        println!("Pip value:      {}", r.pip_value);
        println!("Position size:  {:.2} lots", r.position_size);
    }
    Ok(())
}

fn run_config(check: Option<&Path>) -> Result<()> {
    match check {
        Some(path) => {
            let config = DeskConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?;
            println!(
                "{} is valid ({} instruments, engine {})",
                path.display(),
                config.instruments.len(),
                config.engine.fingerprint()
            );
        }
        None => print!("{}", DeskConfig::default().to_toml()?),
    }
    Ok(())
}

fn print_report(report: &CycleReport) {
    println!(
        "Cycle {} ({}) at {}: {} emitted, {} rejected, {} failed",
        report.cycle,
        report.trigger,
        report.started_at.format("%Y-%m-%d %H:%M:%S"),
        report.opportunities.len(),
        report.rejections.len(),
        report.failures.len()
    );
    if !report.opportunities.is_empty() {
        println!();
        println!(
            "{:<8} {:<19} {:<6} {:>5} {:>10} {:>10} {:>10} {:>6} {:<7}",
            "Pair", "Setup", "Dir", "Score", "Entry", "Stop", "Target", "R:R", "Conf"
        );
        println!("{}", "-".repeat(90));
        for o in &report.opportunities {
            println!(
                "{:<8} {:<19} {:<6} {:>5} {:>10.5} {:>10.5} {:>10.5} {:>6.2} {:<7}",
                o.instrument,
                o.setup.to_string(),
                format!("{:?}", o.direction),
                o.score,
                o.entry,
                o.stop_loss,
                o.take_profit,
                o.risk_reward,
                format!("{:?}", o.confidence)
            );
        }
    }
    for f in &report.failures {
        println!("  ! {}: {}", f.instrument, f.reason);
    }
}

fn print_sizing(desk: &Desk, report: &CycleReport, balance: f64, risk_pct: f64) -> Result<()> {
    let settings = RiskSettings {
        balance,
        risk_per_trade_pct: risk_pct,
        ..RiskSettings::default()
    };
    let mut profile = match AccountRiskProfile::new(settings) {
        Ok(p) => p,
        Err(report) => bail!("invalid risk settings: {}", report.errors.join("; ")),
    };
    let gate = TradingGate;
    let instruments = &desk.config().engine.instruments;

    println!();
    for opp in &report.opportunities {
        let decision = gate.check(&profile);
        if !decision.is_open() {
            println!("  {}: gated ({decision:?})", opp.instrument);
            continue;
        }
        match size_opportunity(&profile, opp, instruments) {
            Ok(s) => {
                println!(
                    "  {}: {:.2} lots, risking {:.2} over {:.1} pips",
                    opp.instrument, s.position_size, s.risk_amount, s.stop_distance_pips
                );
                profile.trades_count_today += 1;
            }
            Err(e) => println!("  {}: cannot size ({e})", opp.instrument),
        }
    }
    Ok(())
}

fn tail<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}
