use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use parking_lot::Mutex;

use crate::domain::Priority;

/// Cooldown key: notifications are throttled per target and priority,
/// so a CRITICAL alert is never suppressed by an earlier INFO one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RateLimitKey {
    pub target_id: i64,
    pub priority: Priority,
}

/// In-memory cooldown gate, owned by the dispatcher and injectable for
/// tests. The lock only guards single-key reads/updates, so checks for
/// different targets never contend in any meaningful way.
#[derive(Debug)]
pub struct RateLimiter {
    cooldown: Duration,
    last_success: Mutex<HashMap<RateLimitKey, Instant>>,
}

impl RateLimiter {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_success: Mutex::new(HashMap::new()),
        }
    }

    /// True iff a notification for this key succeeded within the
    /// cooldown window. Keys without an entry are never limited.
    pub fn is_limited(&self, key: &RateLimitKey) -> bool {
        let map = self.last_success.lock();
        match map.get(key) {
            Some(last) => last.elapsed() < self.cooldown,
            None => false,
        }
    }

    /// Record a successful notification, unconditionally overwriting
    /// any earlier timestamp for the key.
    pub fn record_success(&self, key: RateLimitKey) {
        self.last_success.lock().insert(key, Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(target_id: i64, priority: Priority) -> RateLimitKey {
        RateLimitKey {
            target_id,
            priority,
        }
    }

    #[test]
    fn unknown_key_is_not_limited() {
        let limiter = RateLimiter::new(Duration::from_secs(600));
        assert!(!limiter.is_limited(&key(1, Priority::Critical)));
    }

    #[test]
    fn limited_within_cooldown_window() {
        let limiter = RateLimiter::new(Duration::from_secs(600));
        limiter.record_success(key(1, Priority::Critical));
        assert!(limiter.is_limited(&key(1, Priority::Critical)));
    }

    #[test]
    fn expires_after_cooldown() {
        let limiter = RateLimiter::new(Duration::ZERO);
        limiter.record_success(key(1, Priority::Info));
        assert!(!limiter.is_limited(&key(1, Priority::Info)));
    }

    #[test]
    fn keys_are_independent_per_target_and_priority() {
        let limiter = RateLimiter::new(Duration::from_secs(600));
        limiter.record_success(key(1, Priority::Critical));
        assert!(!limiter.is_limited(&key(2, Priority::Critical)));
        assert!(!limiter.is_limited(&key(1, Priority::Info)));
    }
}
