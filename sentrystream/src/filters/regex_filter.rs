// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Rejects a chunk if any of a set of byte-regexes match. Compiled once at
//! construction; `apply` never allocates a new `Regex`.

use std::time::Instant;

use parking_lot::Mutex;
use regex::bytes::RegexSet;
use sentrystream_domain::entities::stats::FilterStats;
use sentrystream_domain::ports::Filter;
use sentrystream_domain::value_objects::enums::FilterPriority;
use sentrystream_domain::{DomainError, DomainResult};

pub struct RegexFilter {
    name: String,
    priority: FilterPriority,
    set: RegexSet,
    stats: Mutex<FilterStats>,
}

impl RegexFilter {
    pub fn new(name: impl Into<String>, priority: FilterPriority, patterns: &[String]) -> DomainResult<Self> {
        let set = RegexSet::new(patterns).map_err(|e| DomainError::InvalidConfiguration(e.to_string()))?;
        Ok(Self {
            name: name.into(),
            priority,
            set,
            stats: Mutex::new(FilterStats::default()),
        })
    }
}

impl Filter for RegexFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> FilterPriority {
        self.priority
    }

    fn apply(&self, bytes: &[u8]) -> bool {
        let start = Instant::now();
        let matched = self.set.is_match(bytes);
        self.stats.lock().record(matched, start.elapsed());
        !matched
    }

    fn stats(&self) -> FilterStats {
        self.stats.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_a_chunk_matching_any_pattern() {
        let filter = RegexFilter::new(
            "sql",
            FilterPriority::High,
            &["(?i)union\\s+select".to_string(), "drop\\s+table".to_string()],
        )
        .unwrap();
        assert!(!filter.apply(b"1 UNION SELECT password FROM users"));
        assert!(filter.apply(b"hello world"));
        assert_eq!(filter.stats().processed, 2);
        assert_eq!(filter.stats().matched, 1);
    }
}
