use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Fixed window counter keyed by a normalized identity (email or username).
struct WindowCounter {
    /// key -> (count, window_start)
    entries: DashMap<String, (u32, Instant)>,
    window: Duration,
}

impl WindowCounter {
    fn new(window: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            window,
        }
    }

    /// Seconds until the window for `key` resets, if `limit` is already reached.
    fn exhausted(&self, key: &str, limit: u32, now: Instant) -> Option<u64> {
        let entry = self.entries.get(key)?;
        let (count, start) = *entry.value();
        let elapsed = now.duration_since(start);

        if elapsed > self.window || count < limit {
            return None;
        }
        Some(self.window.saturating_sub(elapsed).as_secs())
    }

    fn increment(&self, key: &str, now: Instant) {
        let mut entry = self.entries.entry(key.to_string()).or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > self.window {
            *count = 1;
            *start = now;
        } else {
            *count += 1;
        }
    }

    /// Count one hit for `key` unless `limit` is already reached. The reset,
    /// compare and increment happen under a single entry guard.
    fn try_acquire(&self, key: &str, limit: u32, now: Instant) -> Result<(), u64> {
        let mut entry = self.entries.entry(key.to_string()).or_insert((0, now));
        let (count, start) = entry.value_mut();
        let elapsed = now.duration_since(*start);

        if elapsed > self.window {
            *count = 1;
            *start = now;
            return Ok(());
        }

        if *count >= limit {
            return Err(self.window.saturating_sub(elapsed).as_secs());
        }

        *count += 1;
        Ok(())
    }

    fn cleanup(&self, now: Instant) {
        let window = self.window;
        self.entries.retain(|_, (_, start)| now.duration_since(*start) < window);
    }
}

fn normalize(key: &str) -> String {
    key.trim().to_lowercase()
}

/// Per-email login brute force limiter. 5 failures per 15 minutes.
pub struct LoginRateLimiter {
    failures: WindowCounter,
}

impl LoginRateLimiter {
    const MAX_FAILURES: u32 = 5;

    pub fn new() -> Self {
        Self {
            failures: WindowCounter::new(Duration::from_secs(15 * 60)),
        }
    }

    /// Does NOT increment the counter; call `record_failure()` on a bad password.
    pub fn check(&self, email: &str) -> Result<(), u64> {
        match self
            .failures
            .exhausted(&normalize(email), Self::MAX_FAILURES, Instant::now())
        {
            Some(retry_after) => Err(retry_after),
            None => Ok(()),
        }
    }

    pub fn record_failure(&self, email: &str) {
        self.failures.increment(&normalize(email), Instant::now());
    }

    pub fn cleanup(&self) {
        self.failures.cleanup(Instant::now());
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Limits how many recovery mails can be requested for a single identity.
pub struct RecoveryRateLimiter {
    requests: WindowCounter,
    limit: u32,
}

impl RecoveryRateLimiter {
    pub fn new(limit: u32) -> Self {
        Self {
            requests: WindowCounter::new(Duration::from_secs(15 * 60)),
            limit,
        }
    }

    /// Count a request. Returns Err with retry-after seconds once the limit is hit.
    pub fn check(&self, identity: &str) -> Result<(), u64> {
        self.requests
            .try_acquire(&normalize(identity), self.limit, Instant::now())
    }

    pub fn cleanup(&self) {
        self.requests.cleanup(Instant::now());
    }
}
