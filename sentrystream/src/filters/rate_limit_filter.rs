// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Token-bucket rate limiting keyed by chunk content. Each invocation
//! hashes the first 32 bytes of the chunk (the whole chunk if shorter)
//! with SHA-256, truncated to 8 bytes, into a fixed-size key for a shared
//! `DashMap` of buckets — so distinct sources emitting distinct payloads
//! land in distinct buckets without the map growing unboundedly per byte
//! pattern seen.

use std::time::Instant;

use dashmap::DashMap;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use sentrystream_domain::entities::stats::FilterStats;
use sentrystream_domain::ports::Filter;
use sentrystream_domain::value_objects::enums::FilterPriority;

type ChunkKey = [u8; 8];

fn chunk_key(bytes: &[u8]) -> ChunkKey {
    let prefix = &bytes[..bytes.len().min(32)];
    let digest = Sha256::digest(prefix);
    let mut key = [0u8; 8];
    key.copy_from_slice(&digest[..8]);
    key
}

struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

pub struct RateLimitFilter {
    name: String,
    priority: FilterPriority,
    tokens_per_sec: f64,
    burst: f64,
    buckets: DashMap<ChunkKey, TokenBucket>,
    stats: Mutex<FilterStats>,
}

impl RateLimitFilter {
    pub fn new(name: impl Into<String>, priority: FilterPriority, tokens_per_sec: f64, burst: u64) -> Self {
        Self {
            name: name.into(),
            priority,
            tokens_per_sec,
            burst: burst as f64,
            buckets: DashMap::new(),
            stats: Mutex::new(FilterStats::default()),
        }
    }

    fn try_consume(&self, bytes: &[u8]) -> bool {
        let key = chunk_key(bytes);
        let mut bucket = self.buckets.entry(key).or_insert_with(|| TokenBucket {
            tokens: self.burst,
            last_refill: Instant::now(),
        });

        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.tokens_per_sec).min(self.burst);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

impl Filter for RateLimitFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> FilterPriority {
        self.priority
    }

    fn apply(&self, bytes: &[u8]) -> bool {
        let start = Instant::now();
        let allowed = self.try_consume(bytes);
        self.stats.lock().record(!allowed, start.elapsed());
        allowed
    }

    fn stats(&self) -> FilterStats {
        self.stats.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_the_burst_then_throttles() {
        let filter = RateLimitFilter::new("rate", FilterPriority::Medium, 1.0, 2);
        assert!(filter.apply(b"a"));
        assert!(filter.apply(b"a"));
        assert!(!filter.apply(b"a"));
    }

    #[test]
    fn distinct_chunk_prefixes_hash_to_distinct_keys() {
        assert_ne!(chunk_key(b"pid:1"), chunk_key(b"pid:2"));
    }

    #[test]
    fn buckets_are_independent_per_chunk_prefix() {
        let filter = RateLimitFilter::new("rate", FilterPriority::Medium, 1.0, 1);
        assert!(filter.apply(b"aaaa"));
        // a distinct payload gets its own bucket, so it is not throttled by
        // the first payload's exhausted budget.
        assert!(filter.apply(b"bbbb"));
    }
}
