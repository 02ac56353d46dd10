use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Per-email login brute force limiter.
pub struct LoginRateLimiter {
    /// email -> (failed_count, window_start)
    entries: DashMap<String, (u32, Instant)>,
}

const MAX_FAILURES: u32 = 5;
const WINDOW: Duration = Duration::from_secs(15 * 60);

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Check if a login attempt is allowed. 5 failures per 15 minutes.
    /// Does NOT increment the counter — call `record_failure()` on invalid password.
    pub fn check(&self, email: &str) -> Result<(), u64> {
        let now = Instant::now();

        let entry = self.entries.get(&email.to_lowercase());
        let Some(entry) = entry else {
            return Ok(());
        };

        let (count, start) = entry.value();

        if now.duration_since(*start) > WINDOW {
            return Ok(());
        }

        if *count >= MAX_FAILURES {
            let elapsed = now.duration_since(*start).as_secs();
            return Err(WINDOW.as_secs().saturating_sub(elapsed));
        }

        Ok(())
    }

    pub fn record_failure(&self, email: &str) {
        let now = Instant::now();
        let mut entry = self
            .entries
            .entry(email.to_lowercase())
            .or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > WINDOW {
            *count = 1;
            *start = now;
        } else {
            *count += 1;
        }
    }

    pub fn record_success(&self, email: &str) {
        self.entries.remove(&email.to_lowercase());
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
