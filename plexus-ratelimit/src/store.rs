//! Pluggable rate-limit persistence via the `RateLimitStore` trait,
//! mirroring the sync `SessionDriver` contract in `plexus-core`: `get`
//! returns `none` for an expired record rather than letting a stale one
//! influence the next attempt.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;

pub(crate) fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// A single fixed-window bucket: `hits` so far, `reset_at` the unix second
/// the window closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRecord {
    pub hits: u64,
    pub reset_at: u64,
}

impl RateLimitRecord {
    pub fn is_expired(&self, now: u64) -> bool {
        self.reset_at <= now
    }
}

/// Contract every rate-limit persistence backend implements. `get` must
/// return `None` for an expired record — callers never have to check
/// `is_expired` themselves.
pub trait RateLimitStore: Send + Sync {
    fn get(&self, key: &str) -> Option<RateLimitRecord>;

    fn set(&self, key: &str, record: RateLimitRecord);

    fn delete(&self, key: &str);
}

/// In-memory store, pruning expired records lazily on read.
#[derive(Default)]
pub struct InMemoryStore {
    records: DashMap<String, RateLimitRecord>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RateLimitStore for InMemoryStore {
    fn get(&self, key: &str) -> Option<RateLimitRecord> {
        let now = now_unix();
        match self.records.get(key) {
            Some(entry) if !entry.is_expired(now) => Some(*entry),
            Some(_) => {
                self.records.remove(key);
                None
            }
            None => None,
        }
    }

    fn set(&self, key: &str, record: RateLimitRecord) {
        self.records.insert(key.to_string(), record);
    }

    fn delete(&self, key: &str) {
        self.records.remove(key);
    }
}

/// Adapts a [`plexus_cache::CacheStore`] into a [`RateLimitStore`], storing
/// each record as its `hits:reset_at` wire form and honouring a TTL of
/// `max(1, reset_at - now)` so expired records fall out of the cache on
/// their own.
///
/// `CacheStore` is async; this adapter bridges to the sync `RateLimitStore`
/// contract via `Handle::block_on`, so it must be constructed and used from
/// within a multi-thread Tokio runtime.
pub struct CacheBackedStore {
    cache: Arc<dyn plexus_cache::CacheStore>,
}

impl CacheBackedStore {
    pub fn new(cache: Arc<dyn plexus_cache::CacheStore>) -> Self {
        Self { cache }
    }

    fn block_on<F: std::future::Future>(fut: F) -> F::Output {
        tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(fut))
    }

    fn encode(record: RateLimitRecord) -> bytes::Bytes {
        bytes::Bytes::from(format!("{}:{}", record.hits, record.reset_at))
    }

    fn decode(bytes: bytes::Bytes) -> Option<RateLimitRecord> {
        let text = std::str::from_utf8(&bytes).ok()?;
        let (hits, reset_at) = text.split_once(':')?;
        Some(RateLimitRecord {
            hits: hits.parse().ok()?,
            reset_at: reset_at.parse().ok()?,
        })
    }
}

impl RateLimitStore for CacheBackedStore {
    fn get(&self, key: &str) -> Option<RateLimitRecord> {
        let bytes = Self::block_on(self.cache.get(key))?;
        let record = Self::decode(bytes)?;
        if record.is_expired(now_unix()) {
            Self::block_on(self.cache.remove(key));
            return None;
        }
        Some(record)
    }

    fn set(&self, key: &str, record: RateLimitRecord) {
        let ttl = Duration::from_secs(record.reset_at.saturating_sub(now_unix()).max(1));
        Self::block_on(self.cache.set(key, Self::encode(record), ttl));
    }

    fn delete(&self, key: &str) {
        Self::block_on(self.cache.remove(key));
    }
}
