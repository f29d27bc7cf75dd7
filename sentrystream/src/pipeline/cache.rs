// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! A content-addressed cache of `ProcessingResult`s, keyed by the SHA-256
//! of the chunk that produced them. Identical shell commands (a
//! fork-bombing loop, a re-run benign script) hit the deep stage once and
//! every repeat is a cache lookup — S3's concurrent analyzer fan-out is
//! the most expensive part of the pipeline per §5.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use sha2::{Digest, Sha256};

use sentrystream_domain::aggregates::stage_result::ProcessingResult;

type Key = [u8; 32];

struct Entry {
    result: ProcessingResult,
    inserted_at: Instant,
}

pub struct ResultCache {
    entries: DashMap<Key, Entry>,
    capacity: usize,
    ttl: Duration,
}

fn key_for(bytes: &[u8]) -> Key {
    let digest = Sha256::digest(bytes);
    let mut key = [0u8; 32];
    key.copy_from_slice(&digest);
    key
}

impl ResultCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            capacity,
            ttl,
        }
    }

    pub fn get(&self, bytes: &[u8]) -> Option<ProcessingResult> {
        let key = key_for(bytes);
        let entry = self.entries.get(&key)?;
        if entry.inserted_at.elapsed() > self.ttl {
            drop(entry);
            self.entries.remove(&key);
            return None;
        }
        Some(entry.result.clone())
    }

    pub fn insert(&self, bytes: &[u8], result: ProcessingResult) {
        if self.entries.len() >= self.capacity {
            self.evict_oldest();
        }
        self.entries.insert(
            key_for(bytes),
            Entry {
                result,
                inserted_at: Instant::now(),
            },
        );
    }

    fn evict_oldest(&self) {
        if let Some(oldest_key) = self
            .entries
            .iter()
            .min_by_key(|entry| entry.inserted_at)
            .map(|entry| *entry.key())
        {
            self.entries.remove(&oldest_key);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentrystream_domain::value_objects::enums::Action;

    fn result(action: Action) -> ProcessingResult {
        ProcessingResult {
            action,
            consensus: None,
            stages: vec![],
        }
    }

    #[test]
    fn identical_bytes_hit_the_cache() {
        let cache = ResultCache::new(16, Duration::from_secs(60));
        cache.insert(b"payload", result(Action::Allow));
        assert!(cache.get(b"payload").is_some());
        assert!(cache.get(b"different").is_none());
    }

    #[test]
    fn entries_expire_after_ttl() {
        let cache = ResultCache::new(16, Duration::from_millis(1));
        cache.insert(b"payload", result(Action::Allow));
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get(b"payload").is_none());
    }

    #[test]
    fn inserting_past_capacity_evicts_something() {
        let cache = ResultCache::new(2, Duration::from_secs(60));
        cache.insert(b"a", result(Action::Allow));
        cache.insert(b"b", result(Action::Allow));
        cache.insert(b"c", result(Action::Allow));
        assert_eq!(cache.len(), 2);
    }
}
