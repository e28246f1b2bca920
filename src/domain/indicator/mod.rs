//! Technical indicators over a nav series.
//!
//! - `IndicatorType`: indicator identity + parameters, used for labelling
//! - `IndicatorConfig`: the moving-average windows and momentum period
//! - `IndicatorSnapshot`: the latest value of every configured indicator
//!
//! Snapshots are recomputed from the series on every call and never cached.

pub mod momentum;
pub mod sma;

use crate::domain::valuation::SeriesStore;
use serde::Serialize;
use std::fmt;

pub const NEUTRAL_MOMENTUM: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Momentum(usize),
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "MA({})", period),
            IndicatorType::Momentum(period) => write!(f, "RSI({})", period),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorConfig {
    pub short_window: usize,
    pub mid_window: usize,
    pub long_window: usize,
    pub momentum_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            short_window: 5,
            mid_window: 10,
            long_window: 20,
            momentum_period: 14,
        }
    }
}

impl IndicatorConfig {
    /// Series shorter than this yield a snapshot with no moving averages.
    pub fn min_history(&self) -> usize {
        self.short_window
    }

    pub fn indicator_types(&self) -> [IndicatorType; 4] {
        [
            IndicatorType::Sma(self.short_window),
            IndicatorType::Sma(self.mid_window),
            IndicatorType::Sma(self.long_window),
            IndicatorType::Momentum(self.momentum_period),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub ma_short: Option<f64>,
    pub ma_mid: Option<f64>,
    pub ma_long: Option<f64>,
    pub momentum: f64,
    pub current_nav: f64,
}

impl IndicatorSnapshot {
    /// Snapshot for a series too short to say anything.
    pub fn insufficient(current_nav: f64) -> Self {
        Self {
            ma_short: None,
            ma_mid: None,
            ma_long: None,
            momentum: NEUTRAL_MOMENTUM,
            current_nav,
        }
    }

    pub fn has_moving_averages(&self) -> bool {
        self.ma_short.is_some()
    }
}

pub fn compute(series: &SeriesStore, config: &IndicatorConfig) -> IndicatorSnapshot {
    let navs = series.navs();
    debug_assert!(
        navs.iter().all(|nav| *nav > 0.0),
        "nav series must be positive"
    );

    let current_nav = navs.last().copied().unwrap_or(0.0);
    if navs.len() < config.min_history() {
        return IndicatorSnapshot::insufficient(current_nav);
    }

    IndicatorSnapshot {
        ma_short: sma::moving_average(&navs, config.short_window),
        ma_mid: sma::moving_average(&navs, config.mid_window),
        ma_long: sma::moving_average(&navs, config.long_window),
        momentum: momentum::calculate_momentum(&navs, config.momentum_period),
        current_nav,
    }
}
