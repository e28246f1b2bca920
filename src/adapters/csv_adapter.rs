//! CSV file data adapter for offline runs.
//!
//! One file per fund, `{code}.csv`, with a `date,nav` header. Same-day growth
//! is the percentage change between the last two navs.

use crate::domain::error::FundsignalError;
use crate::domain::quote::FundQuote;
use crate::domain::valuation::{SeriesStore, ValuationPoint};
use crate::ports::fund_data_port::FundDataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", code))
    }

    /// Codes of every `*.csv` file in the base directory, sorted.
    pub fn list_codes(&self) -> Result<Vec<String>, FundsignalError> {
        let mut codes = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    codes.push(stem.to_string_lossy().into_owned());
                }
            }
        }
        codes.sort();
        Ok(codes)
    }

    fn read_series(&self, code: &str) -> Result<SeriesStore, FundsignalError> {
        let path = self.csv_path(code);
        let content = fs::read_to_string(&path).map_err(|e| FundsignalError::Transport {
            code: code.to_string(),
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let format_error = |reason: String| FundsignalError::Format {
            code: code.to_string(),
            reason,
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut points = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| format_error(format!("CSV parse error: {}", e)))?;

            let date_str = record
                .get(0)
                .ok_or_else(|| format_error("missing date column".into()))?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
                .map_err(|e| format_error(format!("invalid date '{}': {}", date_str, e)))?;

            let nav: f64 = record
                .get(1)
                .ok_or_else(|| format_error("missing nav column".into()))?
                .trim()
                .parse()
                .map_err(|e| format_error(format!("invalid nav value: {}", e)))?;

            points.push(ValuationPoint::new(date, nav));
        }

        SeriesStore::from_unordered(points)
    }
}

fn growth_pct(series: &SeriesStore) -> f64 {
    match series.points() {
        [.., prev, last] => (last.nav / prev.nav - 1.0) * 100.0,
        _ => 0.0,
    }
}

impl FundDataPort for CsvAdapter {
    fn fetch_quote(&self, code: &str) -> Result<FundQuote, FundsignalError> {
        let series = self.read_series(code)?;
        let mut quote = FundQuote::new(code, code, growth_pct(&series));
        if let Some(last) = series.latest() {
            quote.nav_date = Some(last.date);
            quote.last_nav = Some(last.nav);
        }
        Ok(quote.with_series(series))
    }
}
