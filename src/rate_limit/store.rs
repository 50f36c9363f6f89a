use dashmap::DashMap;
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Storage backend for sliding window admission decisions
pub trait RateLimitStore: Send + Sync {
    /// Try to admit one request for `key`.
    ///
    /// Returns `true` if the request is allowed, `false` if the key already
    /// has `max_count` admissions in the trailing `window_ms` milliseconds.
    fn try_acquire(&self, key: &str, window_ms: u64, max_count: u32, now_ms: u64) -> bool;

    /// Drop buckets whose newest admission is older than `now_ms - idle_ms`.
    /// Returns the number of buckets removed.
    fn evict_idle(&self, _now_ms: u64, _idle_ms: u64) -> usize {
        0
    }
}

/// In-memory sliding log store.
///
/// Each key maps to an oldest-first queue of admission timestamps. The whole
/// prune/count/append sequence runs while the map shard for the key is
/// write-locked, so concurrent callers for one key are serialized while
/// unrelated keys on other shards proceed in parallel.
#[derive(Debug, Default)]
pub struct SlidingWindowStore {
    buckets: DashMap<String, VecDeque<u64>>,
}

impl SlidingWindowStore {
    pub fn new() -> Self {
        Self {
            buckets: DashMap::new(),
        }
    }

    /// Number of keys currently tracked (for testing/monitoring)
    pub fn active_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// Number of admissions currently recorded for a key
    pub fn recorded(&self, key: &str) -> usize {
        self.buckets.get(key).map(|bucket| bucket.len()).unwrap_or(0)
    }
}

impl RateLimitStore for SlidingWindowStore {
    fn try_acquire(&self, key: &str, window_ms: u64, max_count: u32, now_ms: u64) -> bool {
        // Both branches hold the shard write lock until `bucket` is dropped.
        let mut bucket = match self.buckets.get_mut(key) {
            Some(bucket) => bucket,
            None => {
                debug!(key = %key, "Creating new rate limit bucket");
                self.buckets.entry(key.to_owned()).or_default()
            }
        };

        let cutoff = now_ms.saturating_sub(window_ms);
        while bucket.front().is_some_and(|&oldest| oldest < cutoff) {
            bucket.pop_front();
        }

        if bucket.len() >= max_count as usize {
            trace!(key = %key, count = bucket.len(), "Bucket full");
            return false;
        }

        // Callers read the clock before taking the lock, so a slightly older
        // timestamp can arrive after a newer one. Keep the log sorted.
        let pos = bucket.partition_point(|&t| t <= now_ms);
        bucket.insert(pos, now_ms);
        true
    }

    fn evict_idle(&self, now_ms: u64, idle_ms: u64) -> usize {
        let cutoff = now_ms.saturating_sub(idle_ms);
        let before = self.buckets.len();

        self.buckets
            .retain(|_, bucket| bucket.back().is_some_and(|&newest| newest >= cutoff));

        before.saturating_sub(self.buckets.len())
    }
}
