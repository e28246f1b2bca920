//! Eastmoney / Tiantian fund data adapter.
//!
//! Two public endpoints per fund:
//! - realtime estimate: `{realtime_base}/{code}.js`, a JSONP call wrapping
//!   `{"fundcode", "name", "jzrq", "dwjz", "gsz", "gszzl", "gztime"}` with
//!   every number quoted as a string
//! - history: `{history_base}/{code}.js`, a script assigning
//!   `Data_ACWorthTrend = [[epoch_ms, nav], ...];`
//!
//! A failed realtime fetch fails the fund. A failed history fetch degrades to
//! an empty series so the fund still gets a growth-only recommendation.

use crate::domain::error::FundsignalError;
use crate::domain::quote::FundQuote;
use crate::domain::valuation::{SeriesStore, ValuationPoint};
use crate::ports::config_port::ConfigPort;
use crate::ports::fund_data_port::FundDataPort;
use chrono::{DateTime, Days, FixedOffset, Local, NaiveDate};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use std::time::Duration;

pub const DEFAULT_REALTIME_BASE: &str = "https://fundgz.1234567.com.cn/js";
pub const DEFAULT_HISTORY_BASE: &str = "https://fund.eastmoney.com/pingzhongdata";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
/// Nav timestamps are midnight China Standard Time.
const CST_OFFSET_SECS: i32 = 8 * 3600;

static JSONP_BODY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\{.*\}").unwrap());
static AC_WORTH_TREND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)Data_ACWorthTrend\s*=\s*(\[.*?\]);").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub struct EastmoneyConfig {
    pub realtime_base: String,
    pub history_base: String,
    pub timeout: Duration,
    pub history_days: u64,
}

impl Default for EastmoneyConfig {
    fn default() -> Self {
        Self {
            realtime_base: DEFAULT_REALTIME_BASE.to_string(),
            history_base: DEFAULT_HISTORY_BASE.to_string(),
            timeout: Duration::from_secs(10),
            history_days: 180,
        }
    }
}

impl EastmoneyConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        let defaults = Self::default();
        Self {
            realtime_base: config
                .get_string("source", "realtime_base")
                .unwrap_or(defaults.realtime_base),
            history_base: config
                .get_string("source", "history_base")
                .unwrap_or(defaults.history_base),
            timeout: config.get_secs("source", "timeout_secs", 10),
            history_days: config.get_int("source", "history_days", 180).max(1) as u64,
        }
    }
}

/// Fields of the realtime estimate payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RealtimeEstimate {
    pub code: String,
    pub name: String,
    pub nav_date: Option<NaiveDate>,
    pub last_nav: Option<f64>,
    pub estimate_nav: Option<f64>,
    pub growth_pct: f64,
    pub estimate_time: Option<String>,
}

pub struct EastmoneyAdapter {
    client: reqwest::blocking::Client,
    config: EastmoneyConfig,
}

impl EastmoneyAdapter {
    pub fn new(config: EastmoneyConfig) -> Result<Self, FundsignalError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| FundsignalError::Transport {
                code: "-".to_string(),
                reason: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self { client, config })
    }

    fn fetch_text(&self, code: &str, url: &str) -> Result<String, FundsignalError> {
        tracing::debug!(code, url, "fetching");
        let transport = |reason: String| FundsignalError::Transport {
            code: code.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(transport(format!("HTTP {} from {}", status, url)));
        }
        response.text().map_err(|e| transport(e.to_string()))
    }

    fn fetch_history(&self, code: &str) -> Result<SeriesStore, FundsignalError> {
        let url = format!("{}/{}.js", self.config.history_base, code);
        let text = self.fetch_text(code, &url)?;
        let today = Local::now().date_naive();
        let since = today.checked_sub_days(Days::new(self.config.history_days));
        parse_history(code, &text, since)
    }
}

impl FundDataPort for EastmoneyAdapter {
    fn fetch_quote(&self, code: &str) -> Result<FundQuote, FundsignalError> {
        let url = format!("{}/{}.js", self.config.realtime_base, code);
        let text = self.fetch_text(code, &url)?;
        let estimate = parse_realtime(code, &text)?;

        let series = match self.fetch_history(code) {
            Ok(series) => series,
            Err(e) => {
                tracing::warn!(code, error = %e, "history unavailable, continuing without it");
                SeriesStore::empty()
            }
        };

        Ok(FundQuote {
            code: estimate.code,
            name: estimate.name,
            nav_date: estimate.nav_date,
            last_nav: estimate.last_nav,
            estimate_nav: estimate.estimate_nav,
            same_day_growth_pct: estimate.growth_pct,
            estimate_time: estimate.estimate_time,
            series,
        })
    }
}

/// Extracts the JSON object wrapped in a JSONP callback.
pub fn unwrap_jsonp(text: &str) -> Option<Value> {
    let body = JSONP_BODY.find(text)?;
    serde_json::from_str(body.as_str()).ok()
}

fn string_field(data: &Value, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number_field(code: &str, data: &Value, key: &str) -> Result<Option<f64>, FundsignalError> {
    match string_field(data, key) {
        None => Ok(None),
        Some(s) => match s.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(FundsignalError::Format {
                code: code.to_string(),
                reason: format!("field {} is not a number: {}", key, s),
            }),
        },
    }
}

pub fn parse_realtime(code: &str, text: &str) -> Result<RealtimeEstimate, FundsignalError> {
    let data = unwrap_jsonp(text).ok_or_else(|| FundsignalError::UnknownFund {
        code: code.to_string(),
    })?;
    let fund_code = string_field(&data, "fundcode").ok_or_else(|| FundsignalError::UnknownFund {
        code: code.to_string(),
    })?;

    Ok(RealtimeEstimate {
        code: fund_code,
        name: string_field(&data, "name").unwrap_or_default(),
        nav_date: string_field(&data, "jzrq")
            .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
        last_nav: number_field(code, &data, "dwjz")?,
        estimate_nav: number_field(code, &data, "gsz")?,
        growth_pct: number_field(code, &data, "gszzl")?.unwrap_or(0.0),
        estimate_time: string_field(&data, "gztime"),
    })
}

fn epoch_ms_to_date(ms: i64) -> Option<NaiveDate> {
    let offset = FixedOffset::east_opt(CST_OFFSET_SECS)?;
    DateTime::from_timestamp_millis(ms).map(|dt| dt.with_timezone(&offset).date_naive())
}

/// Parses the accumulated-nav trend, keeping points on or after `since`.
pub fn parse_history(
    code: &str,
    text: &str,
    since: Option<NaiveDate>,
) -> Result<SeriesStore, FundsignalError> {
    let format_error = |reason: String| FundsignalError::Format {
        code: code.to_string(),
        reason,
    };

    let captures = AC_WORTH_TREND
        .captures(text)
        .ok_or_else(|| format_error("Data_ACWorthTrend not found".into()))?;
    let rows: Vec<Value> = serde_json::from_str(&captures[1])
        .map_err(|e| format_error(format!("invalid history JSON: {}", e)))?;

    let mut points: Vec<ValuationPoint> = rows
        .iter()
        .filter_map(|row| {
            let pair = row.as_array()?;
            let date = epoch_ms_to_date(pair.first()?.as_i64()?)?;
            let nav = pair.get(1)?.as_f64()?;
            (nav > 0.0).then_some(ValuationPoint::new(date, nav))
        })
        .collect();

    points.sort_by_key(|p| p.date);
    points.dedup_by_key(|p| p.date);
    let series = SeriesStore::new(points)?;
    let series = match since {
        Some(since) => series.since(since),
        None => series,
    };
    tracing::debug!(code, points = series.len(), "parsed history");
    Ok(series)
}
