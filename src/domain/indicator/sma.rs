//! Simple moving average.
//!
//! SMA(n) = sum(last n navs) / n, only defined once n navs exist.

pub fn moving_average(navs: &[f64], window: usize) -> Option<f64> {
    if window == 0 || navs.len() < window {
        return None;
    }
    let tail = &navs[navs.len() - window..];
    Some(tail.iter().sum::<f64>() / window as f64)
}
