//! Report rendering port trait.

use crate::domain::batch::BatchReport;

/// Port for turning a batch result into display text.
pub trait ReportPort {
    fn render(&self, report: &BatchReport) -> String;
}
