//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::clock_adapter::SystemClock;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_report_adapter::TextReportAdapter;
use crate::domain::batch::{BatchAnalyzer, BatchConfig, BatchReport, FundAnalysis};
use crate::domain::cache::FreshnessCache;
use crate::domain::config_validation::validate_analysis_config;
use crate::domain::decision::{DecisionPolicy, Recommendation};
use crate::domain::error::FundsignalError;
use crate::domain::indicator::{IndicatorConfig, IndicatorType};
use crate::domain::watchlist::{parse_codes, WatchlistError};
use crate::ports::config_port::ConfigPort;
use crate::ports::fund_data_port::FundDataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "fundsignal", about = "Fund nav analysis and trading signals")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze funds and print a detailed recommendation for each
    Analyze {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated fund codes, overriding [batch] codes
        #[arg(long)]
        codes: Option<String>,
        /// Read nav history from CSV files in this directory
        #[arg(long)]
        csv_dir: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Analyze funds and print recommendations grouped by signal
    Summary {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        codes: Option<String>,
        #[arg(long)]
        csv_dir: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Analyze {
            config,
            codes,
            csv_dir,
            json,
        } => run_analyze(&config, codes.as_deref(), csv_dir.as_deref(), json),
        Command::Summary {
            config,
            codes,
            csv_dir,
        } => run_summary(&config, codes.as_deref(), csv_dir.as_deref()),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    tracing::info!("loading config from {}", path.display());
    let adapter = FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })?;
    if let Err(err) = validate_analysis_config(&adapter) {
        eprintln!("error: {err}");
        return Err((&err).into());
    }
    Ok(adapter)
}

pub fn build_indicator_config(config: &dyn ConfigPort) -> IndicatorConfig {
    let defaults = IndicatorConfig::default();
    let window = |key: &str, default: usize| config.get_int("indicators", key, default as i64).max(1) as usize;
    IndicatorConfig {
        short_window: window("short_window", defaults.short_window),
        mid_window: window("mid_window", defaults.mid_window),
        long_window: window("long_window", defaults.long_window),
        momentum_period: window("momentum_period", defaults.momentum_period),
    }
}

pub fn build_decision_policy(config: &dyn ConfigPort) -> DecisionPolicy {
    let d = DecisionPolicy::default();
    let get = |key: &str, default: f64| config.get_double("decision", key, default);
    DecisionPolicy {
        overbought: get("overbought", d.overbought),
        oversold: get("oversold", d.oversold),
        strong_rise_pct: get("strong_rise_pct", d.strong_rise_pct),
        strong_fall_pct: get("strong_fall_pct", d.strong_fall_pct),
        mild_rise_pct: get("mild_rise_pct", d.mild_rise_pct),
        mild_fall_pct: get("mild_fall_pct", d.mild_fall_pct),
        volatile_growth_pct: get("volatile_growth_pct", d.volatile_growth_pct),
        extreme_high: get("extreme_high", d.extreme_high),
        extreme_low: get("extreme_low", d.extreme_low),
    }
}

pub fn build_batch_config(config: &dyn ConfigPort) -> BatchConfig {
    BatchConfig {
        request_spacing: config.get_millis("batch", "request_spacing_ms", 500),
        serve_stale_on_error: config.get_bool("batch", "serve_stale_on_error", false),
    }
}

/// Codes from the command line, else `[batch] codes`. Empty when neither is set;
/// a blank `codes =` counts as unset.
pub fn resolve_codes(
    codes_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, WatchlistError> {
    let configured = config
        .get_string("batch", "codes")
        .filter(|list| !list.trim().is_empty());
    match codes_override.map(str::to_string).or(configured) {
        Some(list) => parse_codes(&list),
        None => Ok(vec![]),
    }
}

pub enum DataSource {
    Csv(CsvAdapter),
    #[cfg(feature = "eastmoney")]
    Eastmoney(crate::adapters::eastmoney_adapter::EastmoneyAdapter),
}

impl DataSource {
    pub fn port(&self) -> &dyn FundDataPort {
        match self {
            DataSource::Csv(adapter) => adapter,
            #[cfg(feature = "eastmoney")]
            DataSource::Eastmoney(adapter) => adapter,
        }
    }
}

pub fn build_data_source(
    config: &dyn ConfigPort,
    csv_dir_override: Option<&Path>,
) -> Result<DataSource, FundsignalError> {
    if let Some(dir) = csv_dir_override {
        return Ok(DataSource::Csv(CsvAdapter::new(dir.to_path_buf())));
    }

    let kind = config
        .get_string("source", "kind")
        .unwrap_or_else(|| "eastmoney".to_string());
    match kind.as_str() {
        "csv" => {
            let dir = config.get_string("source", "csv_dir").ok_or_else(|| {
                FundsignalError::ConfigMissing {
                    section: "source".into(),
                    key: "csv_dir".into(),
                }
            })?;
            Ok(DataSource::Csv(CsvAdapter::new(PathBuf::from(dir))))
        }
        #[cfg(feature = "eastmoney")]
        "eastmoney" => {
            use crate::adapters::eastmoney_adapter::{EastmoneyAdapter, EastmoneyConfig};
            Ok(DataSource::Eastmoney(EastmoneyAdapter::new(
                EastmoneyConfig::from_config(config),
            )?))
        }
        other => Err(FundsignalError::ConfigInvalid {
            section: "source".into(),
            key: "kind".into(),
            reason: format!("source '{}' is not available in this build", other),
        }),
    }
}

/// Runs the batch pipeline: resolve codes, fetch through the cache, analyze.
pub fn run_pipeline(
    config: &dyn ConfigPort,
    source: &DataSource,
    codes: &[String],
) -> BatchReport {
    let mut cache = FreshnessCache::new(config.get_secs("cache", "ttl_secs", 300), SystemClock);
    let mut analyzer = BatchAnalyzer::new(source.port(), &mut cache)
        .with_indicators(build_indicator_config(config))
        .with_policy(build_decision_policy(config))
        .with_config(build_batch_config(config));

    tracing::info!("analyzing {} fund(s)", codes.len());
    analyzer.analyze(codes)
}

fn prepare(
    config_path: &Path,
    codes_override: Option<&str>,
    csv_dir: Option<&Path>,
) -> Result<(FileConfigAdapter, DataSource, Vec<String>), ExitCode> {
    let adapter = load_config(config_path)?;

    let source = build_data_source(&adapter, csv_dir).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;

    let mut codes = resolve_codes(codes_override, &adapter).map_err(|e| {
        eprintln!("error: failed to parse codes: {e}");
        ExitCode::from(2)
    })?;

    if codes.is_empty() {
        if let DataSource::Csv(csv) = &source {
            codes = csv.list_codes().map_err(|e| {
                eprintln!("error: {e}");
                ExitCode::from(&e)
            })?;
        }
    }
    if codes.is_empty() {
        eprintln!("error: no fund codes configured (use --codes or [batch] codes)");
        return Err(ExitCode::from(2));
    }

    Ok((adapter, source, codes))
}

fn exit_for(report: &BatchReport) -> ExitCode {
    if report.successes().next().is_some() {
        return ExitCode::SUCCESS;
    }
    match report.failures().next() {
        Some((_, err)) => err.into(),
        None => ExitCode::SUCCESS,
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.4}", v))
}

pub fn format_analysis(analysis: &FundAnalysis, indicators: &IndicatorConfig) -> String {
    let rec = &analysis.recommendation;
    let snap = &analysis.snapshot;
    let [short, mid, long, momentum] = indicators.indicator_types();
    let mut lines = vec![
        format!("{} {}", analysis.code(), analysis.fund_name),
        format!(
            "  signal:   {} (confidence {:.0}%)",
            rec.signal.as_str().to_uppercase(),
            rec.confidence * 100.0
        ),
        format!("  reason:   {}", rec.reason),
        format!(
            "  nav:      {}{}",
            fmt_opt(analysis.last_nav),
            analysis
                .nav_date
                .map_or_else(String::new, |d| format!(" ({})", d.format("%Y-%m-%d")))
        ),
        format!(
            "  growth:   {:+.2}%  estimate: {}{}",
            analysis.same_day_growth_pct,
            fmt_opt(analysis.estimate_nav),
            analysis
                .estimate_time
                .as_deref()
                .map_or_else(String::new, |t| format!(" at {}", t))
        ),
        format!(
            "  {}/{}/{}: {} / {} / {}",
            short,
            mid,
            long,
            fmt_opt(snap.ma_short),
            fmt_opt(snap.ma_mid),
            fmt_opt(snap.ma_long)
        ),
        format!("  {}: {:.1}", momentum, snap.momentum),
        format!("  history:  {} day(s)", analysis.history_len),
    ];
    if analysis.stale {
        lines.push("  note:     built from stale cached data".to_string());
    }
    lines.join("\n")
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    recommendation: Option<&'a Recommendation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn report_to_json(report: &BatchReport) -> serde_json::Result<String> {
    let entries: Vec<JsonEntry<'_>> = report
        .entries
        .iter()
        .map(|entry| match &entry.outcome {
            Ok(a) => JsonEntry {
                code: &entry.code,
                name: Some(&a.fund_name),
                recommendation: Some(&a.recommendation),
                error: None,
            },
            Err(e) => JsonEntry {
                code: &entry.code,
                name: None,
                recommendation: None,
                error: Some(e.to_string()),
            },
        })
        .collect();
    serde_json::to_string_pretty(&entries)
}

fn run_analyze(
    config_path: &Path,
    codes_override: Option<&str>,
    csv_dir: Option<&Path>,
    json: bool,
) -> ExitCode {
    let (adapter, source, codes) = match prepare(config_path, codes_override, csv_dir) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let report = run_pipeline(&adapter, &source, &codes);

    if json {
        match report_to_json(&report) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("error: failed to encode JSON: {e}");
                return ExitCode::from(1);
            }
        }
    } else {
        let indicators = build_indicator_config(&adapter);
        for entry in &report.entries {
            match &entry.outcome {
                Ok(analysis) => println!("{}\n", format_analysis(analysis, &indicators)),
                Err(e) => println!("{}: analysis failed: {}\n", entry.code, e),
            }
        }
    }

    exit_for(&report)
}

fn run_summary(config_path: &Path, codes_override: Option<&str>, csv_dir: Option<&Path>) -> ExitCode {
    let (adapter, source, codes) = match prepare(config_path, codes_override, csv_dir) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let report = run_pipeline(&adapter, &source, &codes);
    print!("{}", TextReportAdapter.render(&report));
    exit_for(&report)
}

fn run_validate(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let indicators = build_indicator_config(&adapter);
    let policy = build_decision_policy(&adapter);
    eprintln!("Indicators: {}", indicators
        .indicator_types()
        .iter()
        .map(IndicatorType::to_string)
        .collect::<Vec<_>>()
        .join(", "));
    eprintln!(
        "Momentum bands: oversold < {} / overbought > {}",
        policy.oversold, policy.overbought
    );
    eprintln!(
        "Cache ttl: {}s",
        adapter.get_secs("cache", "ttl_secs", 300).as_secs()
    );

    match resolve_codes(None, &adapter) {
        Ok(codes) if codes.is_empty() => eprintln!("Codes: none configured"),
        Ok(codes) => eprintln!("Codes: {}", codes.join(", ")),
        Err(e) => {
            eprintln!("error: failed to parse codes: {e}");
            return ExitCode::from(2);
        }
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}
