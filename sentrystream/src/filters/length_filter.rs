// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Rejects a chunk exceeding a fixed byte length. A pathologically long
//! single write is itself a signal (buffer stuffing, log flooding) worth
//! short-circuiting before it reaches the regex/keyword filters.

use std::time::Instant;

use parking_lot::Mutex;
use sentrystream_domain::entities::stats::FilterStats;
use sentrystream_domain::ports::Filter;
use sentrystream_domain::value_objects::enums::FilterPriority;

pub struct LengthFilter {
    name: String,
    priority: FilterPriority,
    max_bytes: usize,
    stats: Mutex<FilterStats>,
}

impl LengthFilter {
    pub fn new(name: impl Into<String>, priority: FilterPriority, max_bytes: usize) -> Self {
        Self {
            name: name.into(),
            priority,
            max_bytes,
            stats: Mutex::new(FilterStats::default()),
        }
    }
}

impl Filter for LengthFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> FilterPriority {
        self.priority
    }

    fn apply(&self, bytes: &[u8]) -> bool {
        let start = Instant::now();
        let too_long = bytes.len() > self.max_bytes;
        self.stats.lock().record(too_long, start.elapsed());
        !too_long
    }

    fn stats(&self) -> FilterStats {
        self.stats.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_chunks_over_the_limit_and_accepts_chunks_at_or_under_it() {
        let filter = LengthFilter::new("length", FilterPriority::Low, 4);
        assert!(filter.apply(b"abcd"));
        assert!(!filter.apply(b"abcde"));
    }
}
