//! CLI integration tests for config building and the analysis pipeline.
//!
//! Tests cover:
//! - Builders for indicator, decision and batch settings
//! - Code resolution (command line override, config, csv directory listing)
//! - Data source selection and validation errors
//! - Full pipeline over CSV files on disk, text and JSON output

mod common;

use fundsignal::adapters::file_config_adapter::FileConfigAdapter;
use fundsignal::cli::{self, DataSource};
use fundsignal::domain::decision::Signal;
use fundsignal::domain::error::FundsignalError;
use fundsignal::domain::watchlist::WatchlistError;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn config(content: &str) -> FileConfigAdapter {
    FileConfigAdapter::from_string(content).unwrap()
}

fn write_navs(dir: &Path, code: &str, navs: &[f64]) {
    let mut text = String::from("date,nav\n");
    for (i, nav) in navs.iter().enumerate() {
        let date = common::date(2024, 1, 1) + chrono::Duration::days(i as i64);
        text.push_str(&format!("{},{}\n", date.format("%Y-%m-%d"), nav));
    }
    fs::write(dir.join(format!("{code}.csv")), text).unwrap();
}

fn csv_ini(dir: &Path) -> String {
    format!(
        "[source]\nkind = csv\ncsv_dir = {}\n\n[batch]\nrequest_spacing_ms = 0\n",
        dir.display()
    )
}

mod config_building {
    use super::*;

    #[test]
    fn indicator_config_defaults() {
        let ic = cli::build_indicator_config(&config("[indicators]\n"));
        assert_eq!(ic.short_window, 5);
        assert_eq!(ic.mid_window, 10);
        assert_eq!(ic.long_window, 20);
        assert_eq!(ic.momentum_period, 14);
    }

    #[test]
    fn indicator_config_custom_values() {
        let ic = cli::build_indicator_config(&config(
            "[indicators]\nshort_window = 3\nmid_window = 7\nlong_window = 30\nmomentum_period = 6\n",
        ));
        assert_eq!(
            (ic.short_window, ic.mid_window, ic.long_window, ic.momentum_period),
            (3, 7, 30, 6)
        );
    }

    #[test]
    fn decision_policy_custom_bands() {
        let policy = cli::build_decision_policy(&config(
            "[decision]\noverbought = 75\noversold = 25\nstrong_fall_pct = -2.0\n",
        ));
        assert_eq!(policy.overbought, 75.0);
        assert_eq!(policy.oversold, 25.0);
        assert_eq!(policy.strong_fall_pct, -2.0);
        assert_eq!(policy.strong_rise_pct, 1.0);
        assert_eq!(policy.extreme_high, 80.0);
    }

    #[test]
    fn batch_config_values() {
        let bc = cli::build_batch_config(&config(
            "[batch]\nrequest_spacing_ms = 1200\nserve_stale_on_error = yes\n",
        ));
        assert_eq!(bc.request_spacing, Duration::from_millis(1200));
        assert!(bc.serve_stale_on_error);
    }

    #[test]
    fn batch_config_defaults() {
        let bc = cli::build_batch_config(&config(""));
        assert_eq!(bc.request_spacing, Duration::from_millis(500));
        assert!(!bc.serve_stale_on_error);
    }
}

mod code_resolution {
    use super::*;

    #[test]
    fn override_takes_precedence() {
        let cfg = config("[batch]\ncodes = 000001,000002\n");
        let codes = cli::resolve_codes(Some("110022"), &cfg).unwrap();
        assert_eq!(codes, vec!["110022"]);
    }

    #[test]
    fn codes_from_config_with_whitespace() {
        let cfg = config("[batch]\ncodes =  000001 , 000002 \n");
        let codes = cli::resolve_codes(None, &cfg).unwrap();
        assert_eq!(codes, vec!["000001", "000002"]);
    }

    #[test]
    fn none_available_is_empty() {
        let codes = cli::resolve_codes(None, &config("[batch]\n")).unwrap();
        assert!(codes.is_empty());
    }

    #[test]
    fn blank_config_codes_is_empty() {
        let codes = cli::resolve_codes(None, &config("[batch]\ncodes =\n")).unwrap();
        assert!(codes.is_empty());

        let codes = cli::resolve_codes(None, &config("[batch]\ncodes =   \n")).unwrap();
        assert!(codes.is_empty());
    }

    #[test]
    fn duplicate_codes_rejected() {
        let result = cli::resolve_codes(Some("000001,000001"), &config(""));
        assert!(matches!(result, Err(WatchlistError::DuplicateCode(_))));
    }
}

mod data_source {
    use super::*;

    #[test]
    fn csv_dir_override_wins() {
        let dir = TempDir::new().unwrap();
        let source = cli::build_data_source(&config(""), Some(dir.path())).unwrap();
        assert!(matches!(source, DataSource::Csv(_)));
    }

    #[test]
    fn csv_kind_requires_dir() {
        let result = cli::build_data_source(&config("[source]\nkind = csv\n"), None);
        assert!(matches!(
            result,
            Err(FundsignalError::ConfigMissing { ref key, .. }) if key == "csv_dir"
        ));
    }

    #[test]
    fn unknown_kind_is_invalid() {
        let result = cli::build_data_source(&config("[source]\nkind = ftp\n"), None);
        assert!(matches!(result, Err(FundsignalError::ConfigInvalid { .. })));
    }
}

mod validation {
    use super::*;

    #[test]
    fn load_config_accepts_valid_file() {
        let file = write_temp_ini(
            "[indicators]\nshort_window = 5\nmid_window = 10\n\n[cache]\nttl_secs = 120\n\n[source]\nkind = eastmoney\n",
        );
        assert!(cli::load_config(file.path()).is_ok());
    }

    #[test]
    fn load_config_rejects_missing_file() {
        let result = cli::load_config(Path::new("/nonexistent/fundsignal.ini"));
        assert!(result.is_err());
    }

    #[test]
    fn load_config_rejects_inverted_bands() {
        let file = write_temp_ini("[decision]\noverbought = 20\noversold = 80\n");
        assert!(cli::load_config(file.path()).is_err());
    }
}

mod pipeline_csv {
    use super::*;

    #[test]
    fn pipeline_analyzes_every_file() {
        let dir = TempDir::new().unwrap();
        write_navs(dir.path(), "000001", &[1.00, 1.01, 1.02, 1.03, 1.05]);
        write_navs(dir.path(), "000002", &[1.0, 1.03]);
        let cfg = config(&csv_ini(dir.path()));
        let source = cli::build_data_source(&cfg, None).unwrap();

        let report = cli::run_pipeline(
            &cfg,
            &source,
            &["000001".to_string(), "000002".to_string()],
        );

        let first = report.get("000001").unwrap().as_ref().unwrap();
        assert_eq!(first.signal(), Signal::Buy);
        assert_eq!(first.history_len, 5);

        // Two points: too short for trend, last step is +3%.
        let second = report.get("000002").unwrap().as_ref().unwrap();
        assert_eq!(second.signal(), Signal::Sell);
        assert!(second.recommendation.reason.contains("take-profit"));
    }

    #[test]
    fn missing_csv_is_per_fund_error() {
        let dir = TempDir::new().unwrap();
        write_navs(dir.path(), "000001", &[1.0, 1.0]);
        let cfg = config(&csv_ini(dir.path()));
        let source = cli::build_data_source(&cfg, None).unwrap();

        let report = cli::run_pipeline(
            &cfg,
            &source,
            &["000001".to_string(), "999999".to_string()],
        );

        assert_eq!(report.successes().count(), 1);
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "999999");
        assert!(failures[0].1.is_per_fund());
    }

    #[test]
    fn json_output_carries_recommendations_and_errors() {
        let dir = TempDir::new().unwrap();
        write_navs(dir.path(), "000001", &[1.0, 0.98]);
        let cfg = config(&csv_ini(dir.path()));
        let source = cli::build_data_source(&cfg, None).unwrap();
        let report = cli::run_pipeline(
            &cfg,
            &source,
            &["000001".to_string(), "404404".to_string()],
        );

        let json = cli::report_to_json(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let entries = value.as_array().unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["code"], "000001");
        assert_eq!(entries[0]["recommendation"]["signal"], "buy");
        assert!(entries[0].get("error").is_none());
        assert_eq!(entries[1]["code"], "404404");
        assert!(entries[1]["error"].as_str().unwrap().contains("404404"));
    }

    #[test]
    fn format_analysis_shows_indicators() {
        let dir = TempDir::new().unwrap();
        write_navs(dir.path(), "000001", &[1.00, 1.01, 1.02, 1.03, 1.05]);
        let cfg = config(&csv_ini(dir.path()));
        let source = cli::build_data_source(&cfg, None).unwrap();
        let report = cli::run_pipeline(&cfg, &source, &["000001".to_string()]);

        let analysis = report.successes().next().unwrap();
        let text = cli::format_analysis(analysis, &cli::build_indicator_config(&cfg));

        assert!(text.starts_with("000001 000001"));
        assert!(text.contains("signal:   BUY"));
        assert!(text.contains("nav:      1.0500 (2024-01-05)"));
        assert!(text.contains("estimate: -"));
        assert!(text.contains("MA(5)/MA(10)/MA(20): 1.0220 / - / -"));
        assert!(text.contains("RSI(14): 50.0"));
    }
}
