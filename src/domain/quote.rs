//! Parsed per-fund payload handed over by a data port.

use crate::domain::valuation::SeriesStore;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct FundQuote {
    pub code: String,
    pub name: String,
    /// Date of the last published nav.
    pub nav_date: Option<NaiveDate>,
    pub last_nav: Option<f64>,
    /// Intraday estimate, when the source publishes one.
    pub estimate_nav: Option<f64>,
    pub same_day_growth_pct: f64,
    pub estimate_time: Option<String>,
    pub series: SeriesStore,
}

impl FundQuote {
    pub fn new(code: impl Into<String>, name: impl Into<String>, same_day_growth_pct: f64) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            nav_date: None,
            last_nav: None,
            estimate_nav: None,
            same_day_growth_pct,
            estimate_time: None,
            series: SeriesStore::empty(),
        }
    }

    pub fn with_series(mut self, series: SeriesStore) -> Self {
        self.series = series;
        self
    }

    pub fn history_len(&self) -> usize {
        self.series.len()
    }
}
