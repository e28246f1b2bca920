//! Plain-text summary report implementing ReportPort.
//!
//! Layout: header with generation time, one section per actionable signal
//! (buy, sell, watch) listing each fund, a hold count, then failures.

use crate::domain::batch::{BatchReport, FundAnalysis};
use crate::domain::decision::Signal;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Default)]
pub struct TextReportAdapter;

fn section_title(signal: Signal) -> &'static str {
    match signal {
        Signal::Buy => "BUY",
        Signal::Sell => "SELL",
        Signal::Watch => "WATCH",
        Signal::Hold => "HOLD",
    }
}

pub fn fund_line(analysis: &FundAnalysis) -> String {
    let stale = if analysis.stale { " [stale]" } else { "" };
    format!(
        "{} {} ({:+.2}%): {} [confidence {:.0}%]{}",
        analysis.code(),
        analysis.fund_name,
        analysis.same_day_growth_pct,
        analysis.recommendation.reason,
        analysis.recommendation.confidence * 100.0,
        stale
    )
}

impl ReportPort for TextReportAdapter {
    fn render(&self, report: &BatchReport) -> String {
        let summary = report.summary();
        let mut output = String::new();

        output.push_str("=== Fund Signal Report ===\n");
        output.push_str(&format!(
            "Generated: {}\n\n",
            report.generated_at.format("%Y-%m-%d %H:%M:%S")
        ));

        for signal in [Signal::Buy, Signal::Sell, Signal::Watch] {
            let group = summary.group(signal);
            if group.is_empty() {
                continue;
            }
            output.push_str(&format!("{}:\n", section_title(signal)));
            for analysis in group {
                output.push_str(&format!("  {}\n", fund_line(analysis)));
            }
            output.push('\n');
        }

        output.push_str(&format!("HOLD: {} fund(s)\n", summary.count(Signal::Hold)));

        if !summary.failures.is_empty() {
            output.push_str("\nFAILED:\n");
            for (code, err) in &summary.failures {
                output.push_str(&format!("  {}: {}\n", code, err));
            }
        }

        output
    }
}
