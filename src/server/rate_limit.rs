//! Per-client sliding-window admission control.

use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Tracked clients above which stale entries are swept.
const SWEEP_THRESHOLD: usize = 1024;

/// Admits at most `limit` requests per client within any `window`.
#[derive(Debug)]
pub struct RateLimiter {
    limit: usize,
    window: Duration,
    hits: Mutex<HashMap<IpAddr, VecDeque<Instant>>>,
}

impl RateLimiter {
    /// Creates a limiter over an arbitrary window.
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit: limit as usize,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a limiter allowing `limit` requests per minute.
    pub fn per_minute(limit: u32) -> Self {
        Self::new(limit, Duration::from_secs(60))
    }

    /// Returns the configured request budget per window.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Records a request from `client` at `now`; returns false if it must be rejected.
    ///
    /// Rejected requests do not consume budget.
    pub fn check(&self, client: IpAddr, now: Instant) -> bool {
        let mut hits = self.hits.lock().unwrap_or_else(|e| e.into_inner());

        if hits.len() > SWEEP_THRESHOLD {
            let window = self.window;
            hits.retain(|_, times| {
                times
                    .back()
                    .is_some_and(|&last| now.saturating_duration_since(last) < window)
            });
        }

        let times = hits.entry(client).or_default();
        while let Some(&oldest) = times.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                times.pop_front();
            } else {
                break;
            }
        }

        if times.len() >= self.limit {
            return false;
        }
        times.push_back(now);
        true
    }
}
