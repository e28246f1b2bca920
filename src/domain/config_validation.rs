//! Configuration validation.
//!
//! Every key is optional; validation checks the values that are present
//! (or their defaults) before any fund is fetched.

use crate::domain::error::FundsignalError;
use crate::ports::config_port::ConfigPort;

pub const SOURCE_KINDS: [&str; 2] = ["eastmoney", "csv"];

pub fn validate_analysis_config(config: &dyn ConfigPort) -> Result<(), FundsignalError> {
    validate_windows(config)?;
    validate_momentum_period(config)?;
    validate_momentum_bands(config)?;
    validate_growth_thresholds(config)?;
    validate_ttl(config)?;
    validate_request_spacing(config)?;
    validate_source(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> FundsignalError {
    FundsignalError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_windows(config: &dyn ConfigPort) -> Result<(), FundsignalError> {
    let short = config.get_int("indicators", "short_window", 5);
    let mid = config.get_int("indicators", "mid_window", 10);
    let long = config.get_int("indicators", "long_window", 20);

    for (key, value) in [("short_window", short), ("mid_window", mid), ("long_window", long)] {
        if value < 1 {
            return Err(invalid("indicators", key, "window must be at least 1"));
        }
    }
    if short > mid {
        return Err(invalid(
            "indicators",
            "short_window",
            "short_window must not exceed mid_window",
        ));
    }
    if mid > long {
        return Err(invalid(
            "indicators",
            "mid_window",
            "mid_window must not exceed long_window",
        ));
    }
    Ok(())
}

fn validate_momentum_period(config: &dyn ConfigPort) -> Result<(), FundsignalError> {
    if config.get_int("indicators", "momentum_period", 14) < 1 {
        return Err(invalid(
            "indicators",
            "momentum_period",
            "momentum_period must be at least 1",
        ));
    }
    Ok(())
}

fn validate_momentum_bands(config: &dyn ConfigPort) -> Result<(), FundsignalError> {
    let overbought = config.get_double("decision", "overbought", 70.0);
    let oversold = config.get_double("decision", "oversold", 30.0);
    let extreme_high = config.get_double("decision", "extreme_high", 80.0);
    let extreme_low = config.get_double("decision", "extreme_low", 20.0);

    for (key, value) in [
        ("overbought", overbought),
        ("oversold", oversold),
        ("extreme_high", extreme_high),
        ("extreme_low", extreme_low),
    ] {
        if !(0.0..=100.0).contains(&value) {
            return Err(invalid("decision", key, "must be between 0 and 100"));
        }
    }
    if oversold >= overbought {
        return Err(invalid(
            "decision",
            "oversold",
            "oversold must be below overbought",
        ));
    }
    if extreme_low > oversold {
        return Err(invalid(
            "decision",
            "extreme_low",
            "extreme_low must not exceed oversold",
        ));
    }
    if extreme_high < overbought {
        return Err(invalid(
            "decision",
            "extreme_high",
            "extreme_high must not be below overbought",
        ));
    }
    Ok(())
}

fn validate_growth_thresholds(config: &dyn ConfigPort) -> Result<(), FundsignalError> {
    let strong_rise = config.get_double("decision", "strong_rise_pct", 1.0);
    let strong_fall = config.get_double("decision", "strong_fall_pct", -1.0);
    let mild_rise = config.get_double("decision", "mild_rise_pct", 0.5);
    let mild_fall = config.get_double("decision", "mild_fall_pct", -0.5);
    let volatile = config.get_double("decision", "volatile_growth_pct", 2.0);

    if mild_rise > strong_rise {
        return Err(invalid(
            "decision",
            "mild_rise_pct",
            "mild_rise_pct must not exceed strong_rise_pct",
        ));
    }
    if mild_fall < strong_fall {
        return Err(invalid(
            "decision",
            "mild_fall_pct",
            "mild_fall_pct must not be below strong_fall_pct",
        ));
    }
    if mild_fall > mild_rise {
        return Err(invalid(
            "decision",
            "mild_fall_pct",
            "mild_fall_pct must not exceed mild_rise_pct",
        ));
    }
    if volatile < 0.0 {
        return Err(invalid(
            "decision",
            "volatile_growth_pct",
            "volatile_growth_pct must be non-negative",
        ));
    }
    Ok(())
}

fn validate_ttl(config: &dyn ConfigPort) -> Result<(), FundsignalError> {
    if config.get_int("cache", "ttl_secs", 300) < 0 {
        return Err(invalid("cache", "ttl_secs", "ttl_secs must be non-negative"));
    }
    Ok(())
}

fn validate_request_spacing(config: &dyn ConfigPort) -> Result<(), FundsignalError> {
    if config.get_int("batch", "request_spacing_ms", 500) < 0 {
        return Err(invalid(
            "batch",
            "request_spacing_ms",
            "request_spacing_ms must be non-negative",
        ));
    }
    Ok(())
}

fn validate_source(config: &dyn ConfigPort) -> Result<(), FundsignalError> {
    let kind = config
        .get_string("source", "kind")
        .unwrap_or_else(|| "eastmoney".to_string());
    if !SOURCE_KINDS.contains(&kind.as_str()) {
        return Err(invalid(
            "source",
            "kind",
            &format!("unknown source kind '{}', expected eastmoney or csv", kind),
        ));
    }
    if kind == "csv" {
        match config.get_string("source", "csv_dir") {
            Some(dir) if !dir.trim().is_empty() => {}
            _ => {
                return Err(FundsignalError::ConfigMissing {
                    section: "source".to_string(),
                    key: "csv_dir".to_string(),
                })
            }
        }
    }
    if config.get_int("source", "history_days", 180) < 1 {
        return Err(invalid(
            "source",
            "history_days",
            "history_days must be at least 1",
        ));
    }
    if config.get_int("source", "timeout_secs", 10) < 1 {
        return Err(invalid(
            "source",
            "timeout_secs",
            "timeout_secs must be at least 1",
        ));
    }
    Ok(())
}
