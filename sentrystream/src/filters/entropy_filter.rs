// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Passes through (and flags) a chunk whose Shannon entropy exceeds a
//! threshold — high-entropy output is typically base64/hex-encoded
//! exfiltrated data, compressed payloads, or an encryption key, and is
//! worth the deep stage's attention rather than silently dropping. Low-
//! entropy, repetitive payloads carry no such signal and are rejected.

use std::time::Instant;

use parking_lot::Mutex;
use sentrystream_domain::entities::stats::FilterStats;
use sentrystream_domain::ports::Filter;
use sentrystream_domain::value_objects::enums::FilterPriority;

pub fn shannon_entropy(bytes: &[u8]) -> f64 {
    if bytes.is_empty() {
        return 0.0;
    }
    let mut counts = [0u64; 256];
    for &b in bytes {
        counts[b as usize] += 1;
    }
    let len = bytes.len() as f64;
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / len;
            -p * p.log2()
        })
        .sum()
}

pub struct EntropyFilter {
    name: String,
    priority: FilterPriority,
    threshold: f64,
    stats: Mutex<FilterStats>,
}

impl EntropyFilter {
    pub fn new(name: impl Into<String>, priority: FilterPriority, threshold: f64) -> Self {
        Self {
            name: name.into(),
            priority,
            threshold,
            stats: Mutex::new(FilterStats::default()),
        }
    }
}

impl Filter for EntropyFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> FilterPriority {
        self.priority
    }

    fn apply(&self, bytes: &[u8]) -> bool {
        let start = Instant::now();
        let entropy = shannon_entropy(bytes);
        let too_random = entropy > self.threshold;
        self.stats.lock().record(too_random, start.elapsed());
        too_random
    }

    fn stats(&self) -> FilterStats {
        self.stats.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repetitive_text_has_low_entropy() {
        let entropy = shannon_entropy(b"aaaaaaaaaaaaaaaaaaaa");
        assert!(entropy < 0.1, "got {entropy}");
    }

    #[test]
    fn uniformly_distributed_bytes_have_high_entropy() {
        let bytes: Vec<u8> = (0..=255u8).collect();
        let entropy = shannon_entropy(&bytes);
        assert!(entropy > 7.9, "got {entropy}");
    }

    #[test]
    fn filter_accepts_above_threshold() {
        let filter = EntropyFilter::new("entropy", FilterPriority::Low, 7.5);
        let random: Vec<u8> = (0..=255u8).collect();
        assert!(filter.apply(&random));
        assert!(!filter.apply(b"hello hello hello hello"));
    }
}
