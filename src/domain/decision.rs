//! Rule-based recommendation from an indicator snapshot and same-day growth.
//!
//! Two strategies, picked by what the snapshot holds:
//! - `TrendDecision` when a short moving average exists: nav vs MA(short) vs
//!   MA(mid), then a momentum override.
//! - `GrowthOnlyDecision` otherwise: threshold ladder on same-day growth.
//!
//! Confidence is computed separately and never feeds back into the signal.

use crate::domain::indicator::IndicatorSnapshot;
use serde::Serialize;
use std::fmt;

pub const BASE_CONFIDENCE: f64 = 0.5;
pub const MAX_CONFIDENCE: f64 = 0.95;
const VOLATILE_GROWTH_BONUS: f64 = 0.2;
const EXTREME_MOMENTUM_BONUS: f64 = 0.15;

/// Ordering is the order groups appear in a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Buy,
    Sell,
    Watch,
    Hold,
}

impl Signal {
    pub const ALL: [Signal; 4] = [Signal::Buy, Signal::Sell, Signal::Watch, Signal::Hold];

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "buy",
            Signal::Sell => "sell",
            Signal::Watch => "watch",
            Signal::Hold => "hold",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub instrument_id: String,
    pub signal: Signal,
    pub reason: String,
    pub confidence: f64,
}

/// Thresholds for both decision strategies and the confidence score.
/// Growth thresholds are percentages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionPolicy {
    pub overbought: f64,
    pub oversold: f64,
    pub strong_rise_pct: f64,
    pub strong_fall_pct: f64,
    pub mild_rise_pct: f64,
    pub mild_fall_pct: f64,
    pub volatile_growth_pct: f64,
    pub extreme_high: f64,
    pub extreme_low: f64,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            overbought: 70.0,
            oversold: 30.0,
            strong_rise_pct: 1.0,
            strong_fall_pct: -1.0,
            mild_rise_pct: 0.5,
            mild_fall_pct: -0.5,
            volatile_growth_pct: 2.0,
            extreme_high: 80.0,
            extreme_low: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub signal: Signal,
    pub reason: String,
}

impl Verdict {
    fn new(signal: Signal, reason: impl Into<String>) -> Self {
        Self {
            signal,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendDecision {
    pub current_nav: f64,
    pub ma_short: f64,
    pub ma_mid: Option<f64>,
    pub momentum: f64,
}

impl TrendDecision {
    pub fn evaluate(&self, policy: &DecisionPolicy) -> Verdict {
        let base = self.base_verdict();
        self.apply_momentum(base, policy)
    }

    fn base_verdict(&self) -> Verdict {
        let nav = self.current_nav;
        let short = self.ma_short;
        // Without MA(mid) the chain collapses to nav vs MA(short).
        let rising = nav > short && self.ma_mid.is_none_or(|mid| short > mid);
        let falling = nav < short && self.ma_mid.is_none_or(|mid| short < mid);

        let averages = if self.ma_mid.is_some() {
            "its short and mid moving averages"
        } else {
            "its short moving average"
        };

        if rising {
            Verdict::new(Signal::Buy, format!("uptrend: nav above {}", averages))
        } else if falling {
            Verdict::new(Signal::Sell, format!("downtrend: nav below {}", averages))
        } else {
            Verdict::new(Signal::Hold, "no clear trend")
        }
    }

    fn apply_momentum(&self, base: Verdict, policy: &DecisionPolicy) -> Verdict {
        let momentum = self.momentum;
        if momentum > policy.overbought {
            match base.signal {
                Signal::Buy => Verdict::new(
                    Signal::Hold,
                    format!(
                        "{}, but momentum {:.1} is overbought, wait and see",
                        base.reason, momentum
                    ),
                ),
                Signal::Hold => Verdict::new(
                    Signal::Sell,
                    format!("overbought risk: momentum {:.1}, pullback possible", momentum),
                ),
                _ => base,
            }
        } else if momentum < policy.oversold {
            match base.signal {
                Signal::Sell => Verdict::new(
                    Signal::Hold,
                    format!(
                        "{}, but momentum {:.1} is oversold, wait and see",
                        base.reason, momentum
                    ),
                ),
                Signal::Hold => Verdict::new(
                    Signal::Buy,
                    format!(
                        "oversold rebound opportunity: momentum {:.1}",
                        momentum
                    ),
                ),
                _ => base,
            }
        } else {
            base
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthOnlyDecision {
    pub growth_pct: f64,
}

impl GrowthOnlyDecision {
    pub fn evaluate(&self, policy: &DecisionPolicy) -> Verdict {
        let g = self.growth_pct;
        if g > policy.strong_rise_pct {
            Verdict::new(
                Signal::Sell,
                format!("take-profit: strong same-day rise ({:+.2}%)", g),
            )
        } else if g < policy.strong_fall_pct {
            Verdict::new(
                Signal::Buy,
                format!("dip-buy: strong same-day fall ({:+.2}%)", g),
            )
        } else if g > policy.mild_rise_pct {
            Verdict::new(Signal::Hold, format!("mild rise ({:+.2}%), keep holding", g))
        } else if g < policy.mild_fall_pct {
            Verdict::new(Signal::Watch, format!("mild fall ({:+.2}%), watch closely", g))
        } else {
            Verdict::new(Signal::Hold, format!("stable ({:+.2}%), no change", g))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecisionPath {
    Trend(TrendDecision),
    GrowthOnly(GrowthOnlyDecision),
}

impl DecisionPath {
    pub fn select(same_day_growth_pct: f64, snapshot: &IndicatorSnapshot) -> Self {
        match snapshot.ma_short {
            Some(ma_short) => DecisionPath::Trend(TrendDecision {
                current_nav: snapshot.current_nav,
                ma_short,
                ma_mid: snapshot.ma_mid,
                momentum: snapshot.momentum,
            }),
            None => DecisionPath::GrowthOnly(GrowthOnlyDecision {
                growth_pct: same_day_growth_pct,
            }),
        }
    }

    pub fn evaluate(&self, policy: &DecisionPolicy) -> Verdict {
        match self {
            DecisionPath::Trend(trend) => trend.evaluate(policy),
            DecisionPath::GrowthOnly(growth) => growth.evaluate(policy),
        }
    }
}

pub fn confidence(same_day_growth_pct: f64, momentum: f64, policy: &DecisionPolicy) -> f64 {
    let mut score = BASE_CONFIDENCE;
    if same_day_growth_pct.abs() > policy.volatile_growth_pct {
        score += VOLATILE_GROWTH_BONUS;
    }
    if momentum < policy.extreme_low || momentum > policy.extreme_high {
        score += EXTREME_MOMENTUM_BONUS;
    }
    score.min(MAX_CONFIDENCE)
}

pub fn decide(
    instrument_id: &str,
    same_day_growth_pct: f64,
    snapshot: &IndicatorSnapshot,
    policy: &DecisionPolicy,
) -> Recommendation {
    let verdict = DecisionPath::select(same_day_growth_pct, snapshot).evaluate(policy);
    Recommendation {
        instrument_id: instrument_id.to_string(),
        signal: verdict.signal,
        reason: verdict.reason,
        confidence: confidence(same_day_growth_pct, snapshot.momentum, policy),
    }
}
