// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! A `DeepAnalyzer` wrapping the Pattern Registry. Runs the same matcher
//! S2 already ran; kept as a deep analyzer too so its opinion participates
//! in consensus reduction alongside analyzers S2 doesn't have access to
//! (entropy, heuristic), rather than being taken as ground truth on its
//! own.

use std::sync::Arc;

use async_trait::async_trait;

use sentrystream_domain::aggregates::stage_result::AnalyzerResult;
use sentrystream_domain::entities::stream_data::StreamData;
use sentrystream_domain::ports::DeepAnalyzer;
use sentrystream_domain::services::PatternRegistry;
use sentrystream_domain::value_objects::confidence::Confidence;
use sentrystream_domain::value_objects::severity::Severity;
use sentrystream_domain::DomainResult;

pub struct PatternAnalyzer {
    registry: Arc<PatternRegistry>,
}

impl PatternAnalyzer {
    pub fn new(registry: Arc<PatternRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl DeepAnalyzer for PatternAnalyzer {
    fn name(&self) -> &str {
        "pattern"
    }

    fn weight(&self) -> f64 {
        1.5
    }

    async fn analyze(&self, data: &StreamData) -> DomainResult<AnalyzerResult> {
        let findings = self.registry.match_all(data.data());
        let severity = findings.iter().map(|f| f.severity).max().unwrap_or(Severity::None);
        let confidence = findings
            .iter()
            .map(|f| f.confidence.value())
            .fold(0.0_f64, f64::max);

        Ok(AnalyzerResult {
            analyzer: self.name().to_string(),
            severity,
            confidence: Confidence::new(confidence),
            findings,
            weight: self.weight(),
        })
    }
}
