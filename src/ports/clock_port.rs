//! Time source port trait.

use std::time::{Duration, Instant};

/// Monotonic time plus the ability to wait, so cache expiry and request
/// spacing can be driven by tests.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}
