// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Rejects a chunk containing any of a fixed keyword list, using a single
//! Aho-Corasick automaton so an arbitrarily long keyword list still costs
//! one linear pass per chunk.

use std::time::Instant;

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use parking_lot::Mutex;
use sentrystream_domain::entities::stats::FilterStats;
use sentrystream_domain::ports::Filter;
use sentrystream_domain::value_objects::enums::FilterPriority;
use sentrystream_domain::{DomainError, DomainResult};

pub struct KeywordFilter {
    name: String,
    priority: FilterPriority,
    automaton: AhoCorasick,
    stats: Mutex<FilterStats>,
}

impl KeywordFilter {
    pub fn new(
        name: impl Into<String>,
        priority: FilterPriority,
        keywords: &[String],
        case_sensitive: bool,
    ) -> DomainResult<Self> {
        let automaton = AhoCorasickBuilder::new()
            .ascii_case_insensitive(!case_sensitive)
            .match_kind(MatchKind::LeftmostFirst)
            .build(keywords)
            .map_err(|e| DomainError::InvalidConfiguration(e.to_string()))?;

        Ok(Self {
            name: name.into(),
            priority,
            automaton,
            stats: Mutex::new(FilterStats::default()),
        })
    }
}

impl Filter for KeywordFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> FilterPriority {
        self.priority
    }

    fn apply(&self, bytes: &[u8]) -> bool {
        let start = Instant::now();
        let matched = self.automaton.find(bytes).is_some();
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
    fn rejects_a_chunk_containing_any_keyword_case_insensitively() {
        let filter = KeywordFilter::new(
            "secrets",
            FilterPriority::Medium,
            &["password".to_string(), "api_key".to_string()],
            false,
        )
        .unwrap();
        assert!(!filter.apply(b"export PASSWORD=hunter2"));
        assert!(filter.apply(b"nothing to see here"));
    }
}
