// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The three-stage analysis pipeline (§4.6) and the `Pipeline` orchestrator
//! that drives a chunk through S1 (edge) → S2 (shallow) → S3 (deep),
//! short-circuiting as soon as a stage rejects and consulting the result
//! cache before ever reaching S3.

pub mod cache;
pub mod deep_stage;
pub mod edge_stage;
pub mod shallow_stage;

pub use cache::ResultCache;
pub use deep_stage::DeepStage;
pub use edge_stage::EdgeStage;
pub use shallow_stage::ShallowStage;

use std::sync::Arc;

use tracing::debug;

use sentrystream_domain::aggregates::stage_result::{ConsensusResult, ProcessingResult, StageResult};
use sentrystream_domain::entities::stream_data::StreamData;
use sentrystream_domain::ports::Stage;
use sentrystream_domain::value_objects::enums::Action;
use sentrystream_domain::DomainResult;

use crate::metrics::MetricsService;

fn action_label(action: Action) -> &'static str {
    match action {
        Action::Allow => "allow",
        Action::Alert => "alert",
        Action::Block => "block",
        Action::Redirect => "redirect",
    }
}

/// Drives a chunk through S1/S2/S3, recording latency and outcome metrics
/// and short-circuiting at the first stage that rejects. S3 is only
/// reached when S1 and S2 both pass, and its result is cached by content
/// hash so a repeated chunk skips the concurrent analyzer fan-out.
pub struct Pipeline {
    edge: EdgeStage,
    shallow: ShallowStage,
    deep: DeepStage,
    cache: ResultCache,
    metrics: Arc<MetricsService>,
}

impl Pipeline {
    pub fn new(edge: EdgeStage, shallow: ShallowStage, deep: DeepStage, cache: ResultCache, metrics: Arc<MetricsService>) -> Self {
        Self { edge, shallow, deep, cache, metrics }
    }

    pub async fn process(&self, data: &StreamData) -> DomainResult<ProcessingResult> {
        if let Some(cached) = self.cache.get(data.data()) {
            debug!("result cache hit for stream {}", data.stream_id);
            return Ok(cached);
        }

        let mut stages = Vec::with_capacity(3);

        let edge_result = self.run_stage(&self.edge, data).await?;
        let edge_passed = edge_result.passed;
        stages.push(edge_result);
        if !edge_passed {
            return Ok(self.finish(Action::Block, None, stages, data));
        }

        let shallow_result = self.run_stage(&self.shallow, data).await?;
        stages.push(shallow_result);

        let (deep_result, consensus) = self.deep.process_with_consensus(data).await?;
        self.metrics.stage_latency_seconds.observe(deep_result.elapsed.as_secs_f64());
        for finding in &deep_result.findings {
            self.metrics.record_finding(finding.severity.as_str());
        }
        stages.push(deep_result);

        let action = consensus.action(self.deep.enforcing());

        Ok(self.finish(action, Some(consensus), stages, data))
    }

    async fn run_stage(&self, stage: &dyn Stage, data: &StreamData) -> DomainResult<StageResult> {
        let result = stage.process(data).await?;
        self.metrics.stage_latency_seconds.observe(result.elapsed.as_secs_f64());
        for finding in &result.findings {
            self.metrics.record_finding(finding.severity.as_str());
        }
        Ok(result)
    }

    fn finish(
        &self,
        action: Action,
        consensus: Option<ConsensusResult>,
        stages: Vec<StageResult>,
        data: &StreamData,
    ) -> ProcessingResult {
        self.metrics.record_action(action_label(action));
        let result = ProcessingResult { action, consensus, stages };
        self.cache.insert(data.data(), result.clone());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sentrystream_domain::aggregates::stage_result::AnalyzerResult;
    use sentrystream_domain::entities::stream_config::StreamKind;
    use sentrystream_domain::ports::DeepAnalyzer;
    use sentrystream_domain::services::PatternRegistry;
    use sentrystream_domain::value_objects::confidence::Confidence;
    use sentrystream_domain::value_objects::enums::Direction;
    use sentrystream_domain::value_objects::ids::StreamId;
    use sentrystream_domain::value_objects::severity::Severity;
    use std::time::Duration;

    struct StubAnalyzer(Severity);

    #[async_trait]
    impl DeepAnalyzer for StubAnalyzer {
        fn name(&self) -> &str {
            "stub"
        }

        async fn analyze(&self, _data: &StreamData) -> DomainResult<AnalyzerResult> {
            Ok(AnalyzerResult {
                analyzer: "stub".to_string(),
                severity: self.0,
                confidence: Confidence::new(0.9),
                findings: vec![],
                weight: 1.0,
            })
        }
    }

    fn pipeline() -> Pipeline {
        let registry = Arc::new(PatternRegistry::with_default_patterns().unwrap());
        Pipeline::new(
            EdgeStage::new(vec![]),
            ShallowStage::new(registry.clone()),
            DeepStage::new(vec![], true),
            ResultCache::new(64, Duration::from_secs(60)),
            Arc::new(MetricsService::new().unwrap()),
        )
    }

    #[tokio::test]
    async fn benign_input_is_allowed() {
        let pipeline = pipeline();
        let data = StreamData::new(StreamId::new(), StreamKind::Stdio, "test", Direction::Inbound, b"ls -la".to_vec());
        let result = pipeline.process(&data).await.unwrap();
        assert_eq!(result.action, Action::Allow);
    }

    #[tokio::test]
    async fn sql_injection_is_flagged() {
        let pipeline = pipeline();
        let data = StreamData::new(
            StreamId::new(),
            StreamKind::Stdio,
            "test",
            Direction::Inbound,
            b"' UNION SELECT * FROM users --".to_vec(),
        );
        let result = pipeline.process(&data).await.unwrap();
        assert_ne!(result.action, Action::Allow);
    }

    #[tokio::test]
    async fn critical_consensus_redirects_rather_than_blocks() {
        let registry = Arc::new(PatternRegistry::with_default_patterns().unwrap());
        let pipeline = Pipeline::new(
            EdgeStage::new(vec![]),
            ShallowStage::new(registry),
            DeepStage::new(vec![Arc::new(StubAnalyzer(Severity::Critical))], true),
            ResultCache::new(64, Duration::from_secs(60)),
            Arc::new(MetricsService::new().unwrap()),
        );
        let data = StreamData::new(StreamId::new(), StreamKind::Stdio, "test", Direction::Inbound, b"x".to_vec());
        let result = pipeline.process(&data).await.unwrap();
        assert_eq!(result.action, Action::Redirect);
    }

    #[tokio::test]
    async fn repeated_chunk_hits_cache() {
        let pipeline = pipeline();
        let data = StreamData::new(StreamId::new(), StreamKind::Stdio, "test", Direction::Inbound, b"ls -la".to_vec());
        pipeline.process(&data).await.unwrap();
        assert_eq!(pipeline.cache.len(), 1);
        pipeline.process(&data).await.unwrap();
        assert_eq!(pipeline.cache.len(), 1);
    }
}
