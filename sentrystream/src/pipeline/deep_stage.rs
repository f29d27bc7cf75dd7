// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! S3, the deep stage (§4.6): runs every registered `DeepAnalyzer`
//! concurrently via `FuturesUnordered` and reduces their opinions with
//! `ConsensusResult::reduce`. An analyzer that errors is logged and
//! excluded from the reduction rather than failing the whole stage — one
//! flaky analyzer should not block the pipeline.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::warn;

use sentrystream_domain::aggregates::stage_result::{AnalyzerResult, ConsensusResult, StageResult};
use sentrystream_domain::entities::stream_data::StreamData;
use sentrystream_domain::ports::{DeepAnalyzer, Stage};
use sentrystream_domain::value_objects::enums::{Action, StageTag};
use sentrystream_domain::DomainResult;

/// Absolute deadline for the whole analyzer fan-out. Analyzers still
/// running when it elapses are abandoned; their results never reach the
/// consensus reducer.
const DEEP_STAGE_TIMEOUT: Duration = Duration::from_millis(250);

pub struct DeepStage {
    analyzers: Vec<Arc<dyn DeepAnalyzer>>,
    enforcing: bool,
}

impl DeepStage {
    pub fn new(analyzers: Vec<Arc<dyn DeepAnalyzer>>, enforcing: bool) -> Self {
        Self { analyzers, enforcing }
    }

    /// Whether this stage's consensus resolves `Medium`/agreement-bound
    /// severities to `Block` (enforcing) or `Alert` (monitor-only). Callers
    /// that re-derive an `Action` from a `ConsensusResult` need this to
    /// match the decision `process_with_consensus` itself already made.
    pub fn enforcing(&self) -> bool {
        self.enforcing
    }

    /// Runs every analyzer and returns both the stage verdict and the raw
    /// consensus that produced it, for callers that need to carry the
    /// consensus forward into a `ProcessingResult` rather than just the
    /// pass/reject outcome the `Stage` trait exposes.
    pub async fn process_with_consensus(&self, data: &StreamData) -> DomainResult<(StageResult, ConsensusResult)> {
        let start = Instant::now();

        let mut futures = FuturesUnordered::new();
        for analyzer in &self.analyzers {
            let analyzer = analyzer.clone();
            let data = data.clone();
            futures.push(async move { (analyzer.name().to_string(), analyzer.analyze(&data).await) });
        }

        let mut results: Vec<AnalyzerResult> = Vec::with_capacity(self.analyzers.len());
        let outstanding = self.analyzers.len();
        let drain = async {
            while let Some((name, outcome)) = futures.next().await {
                match outcome {
                    Ok(result) => results.push(result),
                    Err(e) => warn!("deep analyzer '{name}' failed: {e}"),
                }
            }
        };
        if tokio::time::timeout(DEEP_STAGE_TIMEOUT, drain).await.is_err() {
            warn!(
                "deep stage exceeded {DEEP_STAGE_TIMEOUT:?} with {} of {outstanding} analyzer(s) still running; abandoning the rest",
                outstanding - results.len()
            );
        }

        let consensus = ConsensusResult::reduce(&results);
        let action = consensus.action(self.enforcing);
        let findings = results.into_iter().flat_map(|r| r.findings).collect();
        let passed = action == Action::Allow;

        let stage_result = if passed {
            StageResult::pass(StageTag::Deep, consensus.confidence, findings, start.elapsed())
        } else {
            StageResult::reject(StageTag::Deep, consensus.confidence, findings, start.elapsed())
        };

        Ok((stage_result, consensus))
    }
}

#[async_trait]
impl Stage for DeepStage {
    fn tag(&self) -> StageTag {
        StageTag::Deep
    }

    async fn process(&self, data: &StreamData) -> DomainResult<StageResult> {
        self.process_with_consensus(data).await.map(|(stage_result, _)| stage_result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentrystream_domain::entities::stream_config::StreamKind;
    use sentrystream_domain::value_objects::confidence::Confidence;
    use sentrystream_domain::value_objects::enums::Direction;
    use sentrystream_domain::value_objects::ids::StreamId;
    use sentrystream_domain::value_objects::severity::Severity;

    struct StubAnalyzer {
        name: &'static str,
        severity: Severity,
    }

    #[async_trait]
    impl DeepAnalyzer for StubAnalyzer {
        fn name(&self) -> &str {
            self.name
        }

        async fn analyze(&self, _data: &StreamData) -> DomainResult<AnalyzerResult> {
            Ok(AnalyzerResult {
                analyzer: self.name.to_string(),
                severity: self.severity,
                confidence: Confidence::new(0.9),
                findings: vec![],
                weight: 1.0,
            })
        }
    }

    #[tokio::test]
    async fn unanimous_critical_does_not_pass() {
        let stage = DeepStage::new(
            vec![
                Arc::new(StubAnalyzer { name: "a", severity: Severity::Critical }),
                Arc::new(StubAnalyzer { name: "b", severity: Severity::Critical }),
            ],
            true,
        );
        let data = StreamData::new(StreamId::new(), StreamKind::Stdio, "test", Direction::Inbound, b"x".to_vec());
        let result = stage.process(&data).await.unwrap();
        assert!(!result.passed);
    }

    #[tokio::test]
    async fn no_analyzers_always_allows() {
        let stage = DeepStage::new(vec![], true);
        let data = StreamData::new(StreamId::new(), StreamKind::Stdio, "test", Direction::Inbound, b"x".to_vec());
        let result = stage.process(&data).await.unwrap();
        assert!(result.passed);
    }
}
