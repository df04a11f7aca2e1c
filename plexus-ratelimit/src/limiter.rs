//! Fixed-window `RateLimiter`: on `hit`, a missing or expired record starts
//! a fresh window; otherwise the existing window's count is incremented
//! and its `reset_at` preserved.

use std::sync::Arc;

use plexus_core::AppError;

use crate::limit::Limit;
use crate::store::{now_unix, RateLimitRecord, RateLimitStore};

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>) -> Self {
        Self { store }
    }

    /// Record one attempt against `limit`. Returns the resulting hit count
    /// for the current window, or `Err(AppError::RateLimitExceeded)` if this
    /// attempt would exceed `max_attempts`. An unlimited limit always
    /// succeeds and never touches the store.
    pub fn hit(&self, limit: &Limit) -> Result<u64, AppError> {
        if limit.unlimited {
            return Ok(0);
        }

        if self.too_many_attempts(limit) {
            return Err(AppError::RateLimitExceeded {
                key: limit.key.clone(),
                max_attempts: limit.max_attempts,
                retry_after: self.available_in(&limit.key),
                reset_at: self.reset_at(&limit.key).unwrap_or(0),
            });
        }

        let now = now_unix();
        let record = match self.store.get(&limit.key) {
            Some(existing) => RateLimitRecord {
                hits: existing.hits + 1,
                reset_at: existing.reset_at,
            },
            None => RateLimitRecord {
                hits: 1,
                reset_at: now + limit.decay_seconds,
            },
        };
        let hits = record.hits;
        self.store.set(&limit.key, record);
        Ok(hits)
    }

    /// Whether the next `hit` against `limit` would be rejected, without
    /// recording an attempt.
    pub fn too_many_attempts(&self, limit: &Limit) -> bool {
        if limit.unlimited {
            return false;
        }
        self.attempts(&limit.key) >= limit.max_attempts
    }

    /// Hits recorded in the current window. Zero if there is no record or
    /// it has expired.
    pub fn attempts(&self, key: &str) -> u64 {
        self.store.get(key).map(|r| r.hits).unwrap_or(0)
    }

    /// Remaining attempts before `max_attempts` is reached this window.
    pub fn remaining(&self, key: &str, max_attempts: u64) -> u64 {
        max_attempts.saturating_sub(self.attempts(key))
    }

    /// Seconds until the current window closes. Zero if there is no record.
    pub fn available_in(&self, key: &str) -> u64 {
        match self.store.get(key) {
            Some(record) => record.reset_at.saturating_sub(now_unix()),
            None => 0,
        }
    }

    /// Unix timestamp the current window closes, if a record exists.
    pub fn reset_at(&self, key: &str) -> Option<u64> {
        self.store.get(key).map(|r| r.reset_at)
    }

    /// Drop the record for `key`, resetting its window immediately.
    pub fn clear(&self, key: &str) {
        self.store.delete(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn limiter() -> RateLimiter {
        RateLimiter::new(Arc::new(InMemoryStore::new()))
    }

    #[test]
    fn two_hits_within_one_window_increment_attempts_by_two() {
        let limiter = limiter();
        let limit = Limit::custom(5, 60, "k");
        limiter.hit(&limit).unwrap();
        limiter.hit(&limit).unwrap();
        assert_eq!(limiter.attempts("k"), 2);
    }

    #[test]
    fn fourth_hit_over_a_three_max_is_rejected() {
        let limiter = limiter();
        let limit = Limit::custom(3, 60, "k");
        assert!(limiter.hit(&limit).is_ok());
        assert!(limiter.hit(&limit).is_ok());
        assert!(limiter.hit(&limit).is_ok());
        let err = limiter.hit(&limit).unwrap_err();
        match err {
            AppError::RateLimitExceeded { key, max_attempts, .. } => {
                assert_eq!(key, "k");
                assert_eq!(max_attempts, 3);
            }
            other => panic!("expected RateLimitExceeded, got {other:?}"),
        }
    }

    #[test]
    fn window_reset_after_decay_restarts_the_count_at_one() {
        let limiter = limiter();
        let limit = Limit::custom(2, 0, "k");
        limiter.hit(&limit).unwrap();
        // decay_seconds == 0 means the window is already closed on the next call
        std::thread::sleep(std::time::Duration::from_millis(1100));
        assert_eq!(limiter.attempts("k"), 0);
        limiter.hit(&limit).unwrap();
        assert_eq!(limiter.attempts("k"), 1);
    }

    #[test]
    fn unlimited_never_tracks_or_rejects() {
        let limiter = limiter();
        let limit = Limit::unlimited();
        for _ in 0..100 {
            assert!(limiter.hit(&limit).is_ok());
        }
        assert_eq!(limiter.attempts(""), 0);
    }

    #[test]
    fn remaining_reflects_hits_so_far() {
        let limiter = limiter();
        let limit = Limit::custom(5, 60, "k");
        limiter.hit(&limit).unwrap();
        limiter.hit(&limit).unwrap();
        assert_eq!(limiter.remaining("k", 5), 3);
    }

    #[test]
    fn clear_drops_the_window() {
        let limiter = limiter();
        let limit = Limit::custom(1, 60, "k");
        limiter.hit(&limit).unwrap();
        limiter.clear("k");
        assert_eq!(limiter.attempts("k"), 0);
        assert!(limiter.hit(&limit).is_ok());
    }
}
