#![allow(dead_code)]

use chrono::NaiveDate;
use fundsignal::domain::error::FundsignalError;
use fundsignal::domain::quote::FundQuote;
use fundsignal::domain::valuation::{SeriesStore, ValuationPoint};
use fundsignal::ports::fund_data_port::FundDataPort;
use std::cell::RefCell;
use std::collections::HashMap;

pub struct MockFundDataPort {
    pub data: HashMap<String, FundQuote>,
    pub errors: HashMap<String, String>,
    pub calls: RefCell<Vec<String>>,
}

impl MockFundDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_quote(mut self, quote: FundQuote) -> Self {
        self.data.insert(quote.code.clone(), quote);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }

    pub fn call_count(&self, code: &str) -> usize {
        self.calls.borrow().iter().filter(|c| *c == code).count()
    }
}

impl FundDataPort for MockFundDataPort {
    fn fetch_quote(&self, code: &str) -> Result<FundQuote, FundsignalError> {
        self.calls.borrow_mut().push(code.to_string());
        if let Some(reason) = self.errors.get(code) {
            return Err(FundsignalError::Transport {
                code: code.to_string(),
                reason: reason.clone(),
            });
        }
        self.data
            .get(code)
            .cloned()
            .ok_or_else(|| FundsignalError::UnknownFund {
                code: code.to_string(),
            })
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Consecutive daily navs starting 2024-01-01.
pub fn make_series(navs: &[f64]) -> SeriesStore {
    let start = date(2024, 1, 1);
    SeriesStore::new(
        navs.iter()
            .enumerate()
            .map(|(i, &nav)| ValuationPoint::new(start + chrono::Duration::days(i as i64), nav))
            .collect(),
    )
    .unwrap()
}

pub fn make_quote(code: &str, growth: f64, navs: &[f64]) -> FundQuote {
    FundQuote::new(code, format!("Fund {code}"), growth).with_series(make_series(navs))
}

pub fn rising_navs(count: usize) -> Vec<f64> {
    (0..count).map(|i| 1.0 + i as f64 * 0.01).collect()
}

pub fn falling_navs(count: usize) -> Vec<f64> {
    (0..count).map(|i| 2.0 - i as f64 * 0.01).collect()
}
