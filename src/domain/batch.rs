//! Batch analysis over a list of fund codes.
//!
//! Each fund runs fetch -> indicators -> decision to completion before the
//! next starts. A failing fund becomes an error entry; the batch carries on.
//! Remote fetches are spaced at least `request_spacing` apart; cache hits do
//! not count as fetches.

use crate::domain::cache::FreshnessCache;
use crate::domain::decision::{self, DecisionPolicy, Recommendation, Signal};
use crate::domain::error::FundsignalError;
use crate::domain::indicator::{self, IndicatorConfig, IndicatorSnapshot};
use crate::domain::quote::FundQuote;
use crate::ports::clock_port::Clock;
use crate::ports::fund_data_port::FundDataPort;
use chrono::{DateTime, Local, NaiveDate};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchConfig {
    pub request_spacing: Duration,
    /// Analyze the last cached payload when a refresh fails.
    pub serve_stale_on_error: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            request_spacing: Duration::from_millis(500),
            serve_stale_on_error: false,
        }
    }
}

/// A recommendation together with what it was derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct FundAnalysis {
    pub recommendation: Recommendation,
    pub fund_name: String,
    pub same_day_growth_pct: f64,
    /// Last published nav and its date.
    pub last_nav: Option<f64>,
    pub nav_date: Option<NaiveDate>,
    pub estimate_nav: Option<f64>,
    pub estimate_time: Option<String>,
    pub snapshot: IndicatorSnapshot,
    pub history_len: usize,
    /// Built from a cached payload older than the ttl.
    pub stale: bool,
}

impl FundAnalysis {
    pub fn code(&self) -> &str {
        &self.recommendation.instrument_id
    }

    pub fn signal(&self) -> Signal {
        self.recommendation.signal
    }
}

#[derive(Debug)]
pub struct BatchEntry {
    pub code: String,
    pub outcome: Result<FundAnalysis, FundsignalError>,
}

#[derive(Debug)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
    pub generated_at: DateTime<Local>,
}

impl BatchReport {
    pub fn get(&self, code: &str) -> Option<&Result<FundAnalysis, FundsignalError>> {
        self.entries
            .iter()
            .find(|entry| entry.code == code)
            .map(|entry| &entry.outcome)
    }

    pub fn successes(&self) -> impl Iterator<Item = &FundAnalysis> {
        self.entries.iter().filter_map(|entry| entry.outcome.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &FundsignalError)> {
        self.entries
            .iter()
            .filter_map(|entry| entry.outcome.as_ref().err().map(|e| (entry.code.as_str(), e)))
    }

    pub fn recommendations(&self) -> Vec<&Recommendation> {
        self.successes().map(|a| &a.recommendation).collect()
    }

    pub fn summary(&self) -> SignalSummary<'_> {
        let mut groups: BTreeMap<Signal, Vec<&FundAnalysis>> = BTreeMap::new();
        for analysis in self.successes() {
            groups.entry(analysis.signal()).or_default().push(analysis);
        }
        SignalSummary {
            groups,
            failures: self.failures().collect(),
        }
    }
}

/// Successful analyses grouped by signal, input order kept within a group.
#[derive(Debug)]
pub struct SignalSummary<'a> {
    pub groups: BTreeMap<Signal, Vec<&'a FundAnalysis>>,
    pub failures: Vec<(&'a str, &'a FundsignalError)>,
}

impl SignalSummary<'_> {
    pub fn group(&self, signal: Signal) -> &[&FundAnalysis] {
        self.groups.get(&signal).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, signal: Signal) -> usize {
        self.group(signal).len()
    }
}

pub struct BatchAnalyzer<'a, C: Clock + Clone> {
    data_port: &'a dyn FundDataPort,
    cache: &'a mut FreshnessCache<FundQuote, C>,
    clock: C,
    indicators: IndicatorConfig,
    policy: DecisionPolicy,
    config: BatchConfig,
    last_fetch: Option<Instant>,
}

impl<'a, C: Clock + Clone> BatchAnalyzer<'a, C> {
    pub fn new(data_port: &'a dyn FundDataPort, cache: &'a mut FreshnessCache<FundQuote, C>) -> Self {
        let clock = cache.clock().clone();
        Self {
            data_port,
            cache,
            clock,
            indicators: IndicatorConfig::default(),
            policy: DecisionPolicy::default(),
            config: BatchConfig::default(),
            last_fetch: None,
        }
    }

    pub fn with_indicators(mut self, indicators: IndicatorConfig) -> Self {
        self.indicators = indicators;
        self
    }

    pub fn with_policy(mut self, policy: DecisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_config(mut self, config: BatchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn analyze<S: AsRef<str>>(&mut self, codes: &[S]) -> BatchReport {
        let mut entries = Vec::with_capacity(codes.len());
        for code in codes {
            let code = code.as_ref();
            let outcome = self.analyze_one(code);
            if let Err(e) = &outcome {
                tracing::warn!(code, error = %e, "fund analysis failed");
            }
            entries.push(BatchEntry {
                code: code.to_string(),
                outcome,
            });
        }

        let ok = entries.iter().filter(|e| e.outcome.is_ok()).count();
        tracing::info!("analyzed {} of {} funds", ok, entries.len());

        BatchReport {
            entries,
            generated_at: Local::now(),
        }
    }

    pub fn analyze_one(&mut self, code: &str) -> Result<FundAnalysis, FundsignalError> {
        tracing::info!(code, "analyzing fund");
        let (quote, stale) = self.load_quote(code)?;

        let snapshot = indicator::compute(&quote.series, &self.indicators);
        let recommendation =
            decision::decide(code, quote.same_day_growth_pct, &snapshot, &self.policy);
        tracing::debug!(
            code,
            signal = %recommendation.signal,
            history = quote.history_len(),
            "fund analyzed"
        );

        Ok(FundAnalysis {
            recommendation,
            fund_name: quote.name.clone(),
            same_day_growth_pct: quote.same_day_growth_pct,
            last_nav: quote.last_nav,
            nav_date: quote.nav_date,
            estimate_nav: quote.estimate_nav,
            estimate_time: quote.estimate_time.clone(),
            snapshot,
            history_len: quote.history_len(),
            stale,
        })
    }

    fn load_quote(&mut self, code: &str) -> Result<(FundQuote, bool), FundsignalError> {
        let port = self.data_port;
        let clock = &self.clock;
        let spacing = self.config.request_spacing;
        let last_fetch = &mut self.last_fetch;

        let fetched = self
            .cache
            .get_or_fetch(code, || {
                pace(clock, spacing, last_fetch);
                let result = port.fetch_quote(code);
                *last_fetch = Some(clock.now());
                let quote = result?;
                if quote.name.trim().is_empty() {
                    return Err(FundsignalError::UnknownFund {
                        code: code.to_string(),
                    });
                }
                Ok(quote)
            })
            .cloned();

        match fetched {
            Ok(quote) => Ok((quote, false)),
            Err(e) if self.config.serve_stale_on_error => match self.cache.get_stale(code) {
                Some(quote) => {
                    tracing::warn!(code, error = %e, "refresh failed, using stale data");
                    Ok((quote.clone(), true))
                }
                None => Err(e),
            },
            Err(e) => Err(e),
        }
    }
}

fn pace<C: Clock>(clock: &C, spacing: Duration, last_fetch: &Option<Instant>) {
    if let Some(last) = last_fetch {
        let elapsed = clock.now().saturating_duration_since(*last);
        if elapsed < spacing {
            clock.sleep(spacing - elapsed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock_adapter::ManualClock;
    use crate::domain::valuation::{SeriesStore, ValuationPoint};
    use chrono::NaiveDate;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct StubPort {
        quotes: HashMap<String, FundQuote>,
        failing: RefCell<Vec<String>>,
        calls: RefCell<Vec<String>>,
    }

    impl StubPort {
        fn with_quote(mut self, code: &str, growth: f64) -> Self {
            self.quotes
                .insert(code.to_string(), FundQuote::new(code, format!("Fund {code}"), growth));
            self
        }

        fn fail(&self, code: &str) {
            self.failing.borrow_mut().push(code.to_string());
        }
    }

    impl FundDataPort for StubPort {
        fn fetch_quote(&self, code: &str) -> Result<FundQuote, FundsignalError> {
            self.calls.borrow_mut().push(code.to_string());
            if self.failing.borrow().iter().any(|c| c == code) {
                return Err(FundsignalError::Transport {
                    code: code.to_string(),
                    reason: "connection refused".into(),
                });
            }
            self.quotes
                .get(code)
                .cloned()
                .ok_or_else(|| FundsignalError::Format {
                    code: code.to_string(),
                    reason: "empty payload".into(),
                })
        }
    }

    fn new_cache(clock: &ManualClock) -> FreshnessCache<FundQuote, ManualClock> {
        FreshnessCache::new(Duration::from_secs(300), clock.clone())
    }

    #[test]
    fn growth_only_recommendation_for_empty_history() {
        let port = StubPort::default().with_quote("000001", 1.5);
        let clock = ManualClock::new();
        let mut cache = new_cache(&clock);
        let mut analyzer = BatchAnalyzer::new(&port, &mut cache);

        let analysis = analyzer.analyze_one("000001").unwrap();

        assert_eq!(analysis.signal(), Signal::Sell);
        assert!(analysis.recommendation.reason.contains("take-profit"));
        assert_eq!(analysis.history_len, 0);
        assert_eq!(analysis.fund_name, "Fund 000001");
    }

    #[test]
    fn trend_recommendation_with_history() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let series = SeriesStore::new(
            [1.00, 1.01, 1.02, 1.03, 1.05]
                .iter()
                .enumerate()
                .map(|(i, &nav)| ValuationPoint::new(start + chrono::Duration::days(i as i64), nav))
                .collect(),
        )
        .unwrap();
        let mut port = StubPort::default();
        port.quotes.insert(
            "000001".into(),
            FundQuote::new("000001", "Trend", 0.3).with_series(series),
        );
        let clock = ManualClock::new();
        let mut cache = new_cache(&clock);
        let mut analyzer = BatchAnalyzer::new(&port, &mut cache);

        let analysis = analyzer.analyze_one("000001").unwrap();

        assert_eq!(analysis.signal(), Signal::Buy);
        assert!(analysis.snapshot.ma_short.is_some());
        assert_eq!(analysis.history_len, 5);
    }

    #[test]
    fn failing_fund_does_not_abort_batch() {
        let port = StubPort::default()
            .with_quote("A", 1.5)
            .with_quote("B", 0.0)
            .with_quote("C", -1.2);
        port.fail("B");
        let clock = ManualClock::new();
        let mut cache = new_cache(&clock);
        let mut analyzer = BatchAnalyzer::new(&port, &mut cache);

        let report = analyzer.analyze(&["A", "B", "C"]);

        assert!(report.get("A").unwrap().is_ok());
        assert!(matches!(
            report.get("B").unwrap(),
            Err(FundsignalError::Transport { .. })
        ));
        assert!(report.get("C").unwrap().is_ok());
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn empty_name_is_unknown_fund_and_not_cached() {
        let mut port = StubPort::default();
        port.quotes
            .insert("999999".into(), FundQuote::new("999999", "", 0.0));
        let clock = ManualClock::new();
        let mut cache = new_cache(&clock);
        {
            let mut analyzer = BatchAnalyzer::new(&port, &mut cache);
            let result = analyzer.analyze_one("999999");
            assert!(matches!(result, Err(FundsignalError::UnknownFund { .. })));
        }
        assert!(cache.is_empty());
    }

    #[test]
    fn cache_hit_skips_fetch_and_spacing() {
        let port = StubPort::default().with_quote("A", 0.1);
        let clock = ManualClock::new();
        let mut cache = new_cache(&clock);
        let mut analyzer = BatchAnalyzer::new(&port, &mut cache);

        analyzer.analyze(&["A"]);
        analyzer.analyze(&["A"]);

        assert_eq!(port.calls.borrow().len(), 1);
        assert_eq!(clock.total_slept(), Duration::ZERO);
    }

    #[test]
    fn fetches_are_spaced() {
        let port = StubPort::default()
            .with_quote("A", 0.1)
            .with_quote("B", 0.1)
            .with_quote("C", 0.1);
        let clock = ManualClock::new();
        let mut cache = new_cache(&clock);
        let mut analyzer = BatchAnalyzer::new(&port, &mut cache).with_config(BatchConfig {
            request_spacing: Duration::from_millis(500),
            serve_stale_on_error: false,
        });

        analyzer.analyze(&["A", "B", "C"]);

        assert_eq!(clock.total_slept(), Duration::from_millis(1000));
    }

    #[test]
    fn stale_payload_served_when_enabled() {
        let port = StubPort::default().with_quote("A", -1.5);
        let clock = ManualClock::new();
        let mut cache = new_cache(&clock);
        let mut analyzer = BatchAnalyzer::new(&port, &mut cache).with_config(BatchConfig {
            request_spacing: Duration::ZERO,
            serve_stale_on_error: true,
        });

        assert!(!analyzer.analyze_one("A").unwrap().stale);
        clock.advance(Duration::from_secs(301));
        port.fail("A");

        let analysis = analyzer.analyze_one("A").unwrap();
        assert!(analysis.stale);
        assert_eq!(analysis.signal(), Signal::Buy);
    }

    #[test]
    fn stale_payload_not_served_by_default() {
        let port = StubPort::default().with_quote("A", -1.5);
        let clock = ManualClock::new();
        let mut cache = new_cache(&clock);
        let mut analyzer = BatchAnalyzer::new(&port, &mut cache);

        analyzer.analyze_one("A").unwrap();
        clock.advance(Duration::from_secs(301));
        port.fail("A");

        assert!(analyzer.analyze_one("A").is_err());
    }

    #[test]
    fn summary_groups_by_signal_in_input_order() {
        let port = StubPort::default()
            .with_quote("S1", 1.5)
            .with_quote("B1", -1.5)
            .with_quote("S2", 2.5)
            .with_quote("W1", -0.7)
            .with_quote("H1", 0.1)
            .with_quote("X", 0.0);
        port.fail("X");
        let clock = ManualClock::new();
        let mut cache = new_cache(&clock);
        let mut analyzer = BatchAnalyzer::new(&port, &mut cache);

        let report = analyzer.analyze(&["S1", "B1", "S2", "X", "W1", "H1"]);
        let summary = report.summary();

        let sells: Vec<&str> = summary.group(Signal::Sell).iter().map(|a| a.code()).collect();
        assert_eq!(sells, vec!["S1", "S2"]);
        assert_eq!(summary.count(Signal::Buy), 1);
        assert_eq!(summary.count(Signal::Watch), 1);
        assert_eq!(summary.count(Signal::Hold), 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].0, "X");
        assert_eq!(
            summary.groups.keys().copied().collect::<Vec<_>>(),
            vec![Signal::Buy, Signal::Sell, Signal::Watch, Signal::Hold]
        );
    }
}
