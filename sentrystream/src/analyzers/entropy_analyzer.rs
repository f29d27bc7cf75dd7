// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! A `DeepAnalyzer` scoring Shannon entropy. Gives a graded severity rather
//! than the edge filter's binary accept/reject, so a chunk just above the
//! edge threshold still registers as `Low`/`Medium` in consensus instead of
//! having already been dropped before S3 ever sees it.

use async_trait::async_trait;

use sentrystream_domain::aggregates::stage_result::AnalyzerResult;
use sentrystream_domain::entities::stream_data::StreamData;
use sentrystream_domain::ports::DeepAnalyzer;
use sentrystream_domain::value_objects::confidence::Confidence;
use sentrystream_domain::value_objects::severity::Severity;
use sentrystream_domain::DomainResult;

use crate::filters::entropy_filter::shannon_entropy;

pub struct EntropyAnalyzer {
    threshold: f64,
}

impl EntropyAnalyzer {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    fn severity_for(&self, entropy: f64) -> Severity {
        if entropy < self.threshold * 0.7 {
            Severity::None
        } else if entropy < self.threshold * 0.9 {
            Severity::Low
        } else if entropy < self.threshold {
            Severity::Medium
        } else {
            Severity::High
        }
    }
}

#[async_trait]
impl DeepAnalyzer for EntropyAnalyzer {
    fn name(&self) -> &str {
        "entropy"
    }

    fn weight(&self) -> f64 {
        0.75
    }

    async fn analyze(&self, data: &StreamData) -> DomainResult<AnalyzerResult> {
        let entropy = shannon_entropy(data.data());
        let severity = self.severity_for(entropy);
        let confidence = (entropy / 8.0).clamp(0.0, 1.0);

        Ok(AnalyzerResult {
            analyzer: self.name().to_string(),
            severity,
            confidence: Confidence::new(confidence),
            findings: Vec::new(),
            weight: self.weight(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentrystream_domain::entities::stream_config::StreamKind;
    use sentrystream_domain::value_objects::enums::Direction;
    use sentrystream_domain::value_objects::ids::StreamId;

    #[tokio::test]
    async fn high_entropy_payload_scores_high_severity() {
        let analyzer = EntropyAnalyzer::new(7.5);
        let random: Vec<u8> = (0..=255u8).collect();
        let data = StreamData::new(StreamId::new(), StreamKind::Stdio, "test", Direction::Inbound, random);
        let result = analyzer.analyze(&data).await.unwrap();
        assert_eq!(result.severity, Severity::High);
    }

    #[tokio::test]
    async fn low_entropy_payload_scores_none() {
        let analyzer = EntropyAnalyzer::new(7.5);
        let data = StreamData::new(
            StreamId::new(),
            StreamKind::Stdio,
            "test",
            Direction::Inbound,
            b"aaaaaaaaaaaaaaaaaaaa".to_vec(),
        );
        let result = analyzer.analyze(&data).await.unwrap();
        assert_eq!(result.severity, Severity::None);
    }
}
