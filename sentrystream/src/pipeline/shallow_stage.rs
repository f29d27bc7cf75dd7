// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! S2, the shallow stage (§4.6): a single synchronous pass over the
//! Pattern Registry. Cheap enough to run on every chunk that clears S1;
//! any finding here still lets the chunk continue into S3 so the deep
//! analyzers can weigh in, but the findings themselves are already
//! authoritative (the registry's confidence/severity are fixed per
//! pattern, not a provisional guess S3 refines).

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use sentrystream_domain::entities::stream_data::StreamData;
use sentrystream_domain::ports::Stage;
use sentrystream_domain::services::PatternRegistry;
use sentrystream_domain::value_objects::confidence::Confidence;
use sentrystream_domain::value_objects::enums::StageTag;
use sentrystream_domain::DomainResult;
use sentrystream_domain::aggregates::stage_result::StageResult;

pub struct ShallowStage {
    registry: Arc<PatternRegistry>,
}

impl ShallowStage {
    pub fn new(registry: Arc<PatternRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Stage for ShallowStage {
    fn tag(&self) -> StageTag {
        StageTag::Shallow
    }

    async fn process(&self, data: &StreamData) -> DomainResult<StageResult> {
        let start = Instant::now();
        let findings = self.registry.match_all(data.data());
        let passed = findings.is_empty();
        let confidence = findings
            .iter()
            .map(|f| f.confidence.value())
            .fold(0.0_f64, f64::max);

        Ok(if passed {
            StageResult::pass(StageTag::Shallow, Confidence::ZERO, findings, start.elapsed())
        } else {
            StageResult::reject(StageTag::Shallow, Confidence::new(confidence), findings, start.elapsed())
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
    async fn flags_sql_injection_patterns() {
        let stage = ShallowStage::new(Arc::new(PatternRegistry::with_default_patterns().unwrap()));
        let data = StreamData::new(
            StreamId::new(),
            StreamKind::Stdio,
            "test",
            Direction::Inbound,
            b"' UNION SELECT * FROM users --".to_vec(),
        );
        let result = stage.process(&data).await.unwrap();
        assert!(!result.passed);
        assert!(!result.findings.is_empty());
    }

    #[tokio::test]
    async fn passes_benign_input() {
        let stage = ShallowStage::new(Arc::new(PatternRegistry::with_default_patterns().unwrap()));
        let data = StreamData::new(StreamId::new(), StreamKind::Stdio, "test", Direction::Inbound, b"ls -la".to_vec());
        let result = stage.process(&data).await.unwrap();
        assert!(result.passed);
    }
}
