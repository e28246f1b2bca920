//! Net-asset-value observations and the per-fund series that holds them.

use crate::domain::error::FundsignalError;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValuationPoint {
    pub date: NaiveDate,
    pub nav: f64,
}

impl ValuationPoint {
    pub fn new(date: NaiveDate, nav: f64) -> Self {
        Self { date, nav }
    }
}

/// Dated nav observations for one fund, strictly ascending by date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesStore {
    points: Vec<ValuationPoint>,
}

impl SeriesStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a series from points already in ascending date order.
    pub fn new(points: Vec<ValuationPoint>) -> Result<Self, FundsignalError> {
        for point in &points {
            check_nav(point)?;
        }
        for pair in points.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(FundsignalError::InvalidSeries {
                    reason: format!(
                        "dates not strictly increasing: {} followed by {}",
                        pair[0].date, pair[1].date
                    ),
                });
            }
        }
        Ok(Self { points })
    }

    /// Builds a series from points in any order. Duplicate dates are rejected.
    pub fn from_unordered(mut points: Vec<ValuationPoint>) -> Result<Self, FundsignalError> {
        points.sort_by_key(|p| p.date);
        for pair in points.windows(2) {
            if pair[0].date == pair[1].date {
                return Err(FundsignalError::InvalidSeries {
                    reason: format!("duplicate date {}", pair[0].date),
                });
            }
        }
        Self::new(points)
    }

    /// Appends a point newer than every recorded one.
    pub fn push(&mut self, point: ValuationPoint) -> Result<(), FundsignalError> {
        check_nav(&point)?;
        if let Some(last) = self.points.last() {
            if point.date <= last.date {
                return Err(FundsignalError::InvalidSeries {
                    reason: format!("{} is not after {}", point.date, last.date),
                });
            }
        }
        self.points.push(point);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[ValuationPoint] {
        &self.points
    }

    pub fn latest(&self) -> Option<&ValuationPoint> {
        self.points.last()
    }

    /// Nav values in chronological order.
    pub fn navs(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.nav).collect()
    }

    /// Keeps only points dated on or after `since`.
    pub fn since(&self, since: NaiveDate) -> SeriesStore {
        SeriesStore {
            points: self
                .points
                .iter()
                .filter(|p| p.date >= since)
                .copied()
                .collect(),
        }
    }
}

fn check_nav(point: &ValuationPoint) -> Result<(), FundsignalError> {
    if !point.nav.is_finite() || point.nav <= 0.0 {
        return Err(FundsignalError::InvalidSeries {
            reason: format!("nav {} on {} must be positive", point.nav, point.date),
        });
    }
    Ok(())
}
