//! RSI-style momentum oscillator.
//!
//! Gains and losses are taken from consecutive nav deltas, with the opposite
//! bucket zero-filled on every step. Averages are plain means of the last n
//! entries (no Wilder smoothing):
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100 when avg_gain > 0, else 50 (flat series)
//!
//! Needs n + 1 navs; shorter input reads as neutral (50).

use crate::domain::indicator::NEUTRAL_MOMENTUM;

pub fn calculate_momentum(navs: &[f64], period: usize) -> f64 {
    if period == 0 || navs.len() < period + 1 {
        return NEUTRAL_MOMENTUM;
    }

    let mut gains: Vec<f64> = Vec::with_capacity(navs.len() - 1);
    let mut losses: Vec<f64> = Vec::with_capacity(navs.len() - 1);

    for pair in navs.windows(2) {
        let change = pair[1] - pair[0];
        gains.push(if change > 0.0 { change } else { 0.0 });
        losses.push(if change < 0.0 { -change } else { 0.0 });
    }

    let start = gains.len() - period;
    let avg_gain = gains[start..].iter().sum::<f64>() / period as f64;
    let avg_loss = losses[start..].iter().sum::<f64>() / period as f64;

    if avg_loss == 0.0 {
        return if avg_gain > 0.0 {
            100.0
        } else {
            NEUTRAL_MOMENTUM
        };
    }

    100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
}
