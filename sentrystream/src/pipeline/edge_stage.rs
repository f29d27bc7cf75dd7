// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! S1, the edge stage (§4.6): re-evaluates the same `Filter` set the
//! capture already ran at ingest, as the pipeline's own record of why a
//! chunk passed or was rejected — the capture's pass/fail decision and the
//! pipeline's are independent so a capture-level filter change doesn't
//! retroactively alter history already in the ring buffer.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use sentrystream_domain::entities::stream_data::StreamData;
use sentrystream_domain::ports::{Filter, Stage};
use sentrystream_domain::value_objects::confidence::Confidence;
use sentrystream_domain::value_objects::enums::StageTag;
use sentrystream_domain::DomainResult;
use sentrystream_domain::aggregates::stage_result::StageResult;

pub struct EdgeStage {
    filters: Vec<Arc<dyn Filter>>,
}

impl EdgeStage {
    pub fn new(filters: Vec<Arc<dyn Filter>>) -> Self {
        Self { filters }
    }
}

#[async_trait]
impl Stage for EdgeStage {
    fn tag(&self) -> StageTag {
        StageTag::Edge
    }

    async fn process(&self, data: &StreamData) -> DomainResult<StageResult> {
        let start = Instant::now();
        let passed = self.filters.iter().all(|f| f.apply(data.data()));
        let confidence = if passed { Confidence::FULL } else { Confidence::new(0.5) };
        Ok(if passed {
            StageResult::pass(StageTag::Edge, confidence, Vec::new(), start.elapsed())
        } else {
            StageResult::reject(StageTag::Edge, confidence, Vec::new(), start.elapsed())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentrystream_domain::value_objects::ids::StreamId;
    use sentrystream_domain::entities::stream_config::StreamKind;
    use sentrystream_domain::value_objects::enums::Direction;
    use crate::filters::LengthFilter;
    use sentrystream_domain::value_objects::enums::FilterPriority;

    #[tokio::test]
    async fn rejects_when_any_filter_rejects() {
        let stage = EdgeStage::new(vec![Arc::new(LengthFilter::new("len", FilterPriority::Low, 4))]);
        let data = StreamData::new(StreamId::new(), StreamKind::Stdio, "test", Direction::Inbound, b"toolong".to_vec());
        let result = stage.process(&data).await.unwrap();
        assert!(!result.passed);
    }
}
