//! Time-to-live cache in front of remote fetches, keyed by fund code.
//!
//! Staleness is checked lazily on read; nothing is evicted in the background.
//! A failed refresh leaves the previous entry in place, and callers that can
//! live with old data read it through [`FreshnessCache::get_stale`].

use crate::ports::clock_port::Clock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct CacheEntry<P> {
    pub payload: P,
    pub fetched_at: Instant,
}

impl<P> CacheEntry<P> {
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.fetched_at)
    }

    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        self.age(now) < ttl
    }
}

pub struct FreshnessCache<P, C: Clock> {
    entries: HashMap<String, CacheEntry<P>>,
    ttl: Duration,
    clock: C,
}

impl<P, C: Clock> FreshnessCache<P, C> {
    pub fn new(ttl: Duration, clock: C) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            clock,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Returns the cached payload if younger than the configured ttl,
    /// otherwise runs `fetch` and caches its result.
    pub fn get_or_fetch<E, F>(&mut self, key: &str, fetch: F) -> Result<&P, E>
    where
        F: FnOnce() -> Result<P, E>,
    {
        let ttl = self.ttl;
        self.get_or_fetch_with_ttl(key, ttl, fetch)
    }

    pub fn get_or_fetch_with_ttl<E, F>(&mut self, key: &str, ttl: Duration, fetch: F) -> Result<&P, E>
    where
        F: FnOnce() -> Result<P, E>,
    {
        let now = self.clock.now();
        let fresh = self
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_fresh(now, ttl));

        if !fresh {
            tracing::debug!(key, "cache miss, fetching");
            let payload = fetch()?;
            let fetched_at = self.clock.now();
            self.entries
                .insert(key.to_string(), CacheEntry { payload, fetched_at });
        } else {
            tracing::debug!(key, "cache hit");
        }

        Ok(&self.entries[key].payload)
    }

    /// The cached payload if it is still within the configured ttl.
    pub fn get_fresh(&self, key: &str) -> Option<&P> {
        let now = self.clock.now();
        self.entries
            .get(key)
            .filter(|entry| entry.is_fresh(now, self.ttl))
            .map(|entry| &entry.payload)
    }

    /// The cached payload regardless of age.
    pub fn get_stale(&self, key: &str) -> Option<&P> {
        self.entries.get(key).map(|entry| &entry.payload)
    }

    pub fn entry(&self, key: &str) -> Option<&CacheEntry<P>> {
        self.entries.get(key)
    }

    pub fn invalidate(&mut self, key: &str) -> Option<P> {
        self.entries.remove(key).map(|entry| entry.payload)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
