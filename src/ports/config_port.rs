//! Configuration access port trait.

use std::time::Duration;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// Negative values clamp to zero; validation rejects them beforehand.
    fn get_secs(&self, section: &str, key: &str, default: u64) -> Duration {
        Duration::from_secs(self.get_int(section, key, default as i64).max(0) as u64)
    }

    fn get_millis(&self, section: &str, key: &str, default: u64) -> Duration {
        Duration::from_millis(self.get_int(section, key, default as i64).max(0) as u64)
    }
}
