// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The five edge filters and the factory that resolves a `FilterSpec` into
//! a live `Filter` trait object (§4.3).

pub mod entropy_filter;
pub mod keyword_filter;
pub mod length_filter;
pub mod rate_limit_filter;
pub mod regex_filter;

use std::sync::Arc;

use sentrystream_domain::entities::stream_config::FilterSpec;
use sentrystream_domain::ports::Filter;
use sentrystream_domain::value_objects::enums::FilterPriority;
use sentrystream_domain::{DomainError, DomainResult};

pub use entropy_filter::EntropyFilter;
pub use keyword_filter::KeywordFilter;
pub use length_filter::LengthFilter;
pub use rate_limit_filter::RateLimitFilter;
pub use regex_filter::RegexFilter;

/// Builds the live `Filter` for a `FilterSpec`.
pub fn build_filter(spec: &FilterSpec) -> DomainResult<Arc<dyn Filter>> {
    let filter: Arc<dyn Filter> = match spec {
        FilterSpec::Regex { name, patterns } => Arc::new(RegexFilter::new(name, FilterPriority::High, patterns)?),
        FilterSpec::Keyword {
            name,
            keywords,
            case_sensitive,
        } => Arc::new(KeywordFilter::new(name, FilterPriority::Medium, keywords, *case_sensitive)?),
        FilterSpec::Length { name, max_bytes } => Arc::new(LengthFilter::new(name, FilterPriority::Low, *max_bytes)),
        FilterSpec::RateLimit {
            name,
            tokens_per_sec,
            burst,
        } => Arc::new(RateLimitFilter::new(name, FilterPriority::Medium, *tokens_per_sec, *burst)),
        FilterSpec::Entropy { name, threshold } => Arc::new(EntropyFilter::new(name, FilterPriority::Low, *threshold)),
    };
    Ok(filter)
}

/// SQL/shell/path patterns critical enough to reject outright rather than
/// merely flag in the deep stage.
const DEFAULT_REGEX_PATTERNS: &[&str] = &[
    r"(?i)drop\s+table",
    r"(?i)delete\s+from",
    r";rm\s+-rf\s+/",
    r"/etc/passwd",
    r"/etc/shadow",
];

/// Keywords covering XSS, injection, path traversal, and LLM prompt
/// injection attempts, matched case-insensitively in one Aho-Corasick pass.
const DEFAULT_KEYWORDS: &[&str] = &["<script", "javascript:", "onerror=", "UNION SELECT", "../", "ignore previous"];

/// The default S1 edge-filter set installed when a `StreamConfig` names no
/// filters of its own (§4.5): a conservative baseline covering the regex
/// and keyword deny-lists, length, entropy, and rate limiting.
pub fn default_filter_specs(rate_limit_per_sec: u32) -> Vec<FilterSpec> {
    vec![
        FilterSpec::Regex {
            name: "default-regex".into(),
            patterns: DEFAULT_REGEX_PATTERNS.iter().map(|p| p.to_string()).collect(),
        },
        FilterSpec::Keyword {
            name: "default-keyword".into(),
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            case_sensitive: false,
        },
        FilterSpec::Length {
            name: "default-length".into(),
            max_bytes: 1_048_576,
        },
        FilterSpec::Entropy {
            name: "default-entropy".into(),
            threshold: 7.5,
        },
        FilterSpec::RateLimit {
            name: "default-rate-limit".into(),
            tokens_per_sec: rate_limit_per_sec as f64,
            burst: (rate_limit_per_sec as u64).max(1) * 2,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unparseable_regex_patterns() {
        let spec = FilterSpec::Regex {
            name: "bad".into(),
            patterns: vec!["(".into()],
        };
        let result = build_filter(&spec);
        assert!(matches!(result, Err(DomainError::InvalidConfiguration(_))));
    }

    #[test]
    fn default_filter_specs_cover_all_five_edge_filters() {
        let specs = default_filter_specs(1000);
        assert_eq!(specs.len(), 5);
        assert!(matches!(specs[0], FilterSpec::Regex { .. }));
        assert!(matches!(specs[1], FilterSpec::Keyword { .. }));
        assert!(matches!(specs[2], FilterSpec::Length { max_bytes: 1_048_576, .. }));
        assert!(matches!(specs[3], FilterSpec::Entropy { .. }));
        assert!(matches!(specs[4], FilterSpec::RateLimit { .. }));
    }

    #[test]
    fn default_filters_all_build_successfully() {
        for spec in default_filter_specs(1000) {
            build_filter(&spec).unwrap();
        }
    }
}
