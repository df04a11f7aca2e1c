//! `Limit` — the value object a named limiter resolves to per request.

/// `{max_attempts, decay_seconds, key, unlimited}`. An unlimited limit
/// bypasses tracking entirely — `RateLimiter` never touches the store for
/// one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limit {
    pub max_attempts: u64,
    pub decay_seconds: u64,
    pub key: String,
    pub unlimited: bool,
}

impl Limit {
    /// `max_attempts` per `decay_seconds`, keyed by `key`.
    pub fn custom(max_attempts: u64, decay_seconds: u64, key: impl Into<String>) -> Self {
        Self {
            max_attempts,
            decay_seconds,
            key: key.into(),
            unlimited: false,
        }
    }

    /// `max_attempts` per minute.
    pub fn per_minute(max_attempts: u64) -> Self {
        Self::custom(max_attempts, 60, "")
    }

    /// `max_attempts` per hour.
    pub fn per_hour(max_attempts: u64) -> Self {
        Self::custom(max_attempts, 3600, "")
    }

    /// `max_attempts` per day.
    pub fn per_day(max_attempts: u64) -> Self {
        Self::custom(max_attempts, 86_400, "")
    }

    /// A limit that never tracks or rejects.
    pub fn unlimited() -> Self {
        Self {
            max_attempts: 0,
            decay_seconds: 0,
            key: String::new(),
            unlimited: true,
        }
    }

    /// Bind this limit to a concrete bucket key (e.g. an IP or user id).
    pub fn by(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }
}
