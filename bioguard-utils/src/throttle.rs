//! Per-key sliding-window throttle.
//!
//! Used to skip bio checks for a group once it has seen more than
//! `max_hits` checks inside `window`, so a burst of messages does not turn
//! into a burst of profile lookups against the Bot API.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

pub const DEFAULT_BIO_CHECK_WINDOW: Duration = Duration::from_secs(60);
pub const DEFAULT_BIO_CHECK_MAX_HITS: u64 = 10;

#[derive(Debug)]
pub struct SlidingWindowThrottle {
    window: Duration,
    max_hits: u64,
    hits: DashMap<i64, VecDeque<Instant>>,
}

impl SlidingWindowThrottle {
    /// `max_hits == 0` disables throttling.
    pub fn new(window: Duration, max_hits: u64) -> Self {
        Self {
            window,
            max_hits,
            hits: DashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn max_hits(&self) -> u64 {
        self.max_hits
    }

    pub fn is_enabled(&self) -> bool {
        self.max_hits > 0
    }

    /// Records a hit for `key` and reports whether it is within the limit.
    pub fn allow(&self, key: i64) -> bool {
        self.allow_at(key, Instant::now())
    }

    pub fn allow_at(&self, key: i64, now: Instant) -> bool {
        if !self.is_enabled() {
            return true;
        }

        let mut entry = self.hits.entry(key).or_default();
        let hits = entry.value_mut();

        while let Some(oldest) = hits.front() {
            if now.saturating_duration_since(*oldest) >= self.window {
                hits.pop_front();
            } else {
                break;
            }
        }

        if hits.len() as u64 >= self.max_hits {
            debug!(key, hits = hits.len(), "sliding window exhausted");
            return false;
        }

        hits.push_back(now);
        true
    }

    /// Drop keys whose windows are empty.
    pub fn prune(&self, now: Instant) {
        self.hits.retain(|_, hits| {
            hits.back()
                .is_some_and(|newest| now.saturating_duration_since(*newest) < self.window)
        });
    }
}

impl Default for SlidingWindowThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_BIO_CHECK_WINDOW, DEFAULT_BIO_CHECK_MAX_HITS)
    }
}
