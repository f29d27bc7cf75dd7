// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The `Stage` port (§4.6): S1/S2/S3 pipeline stages share one contract.

use async_trait::async_trait;

use crate::aggregates::stage_result::StageResult;
use crate::entities::stream_data::StreamData;
use crate::error::DomainResult;
use crate::value_objects::enums::StageTag;

#[async_trait]
pub trait Stage: Send + Sync {
    fn tag(&self) -> StageTag;

    async fn process(&self, data: &StreamData) -> DomainResult<StageResult>;
}

/// A pluggable deep-stage analyzer (§4.6, §9 "capability-polymorphic set").
/// Concrete variants may be pattern-based, structural, or remote-service
/// backed; the deep stage only depends on this contract.
#[async_trait]
pub trait DeepAnalyzer: Send + Sync {
    fn name(&self) -> &str;

    /// Relative weight this analyzer's opinion carries in the consensus
    /// reduction (§4.6); defaults to 1.0 when unset by the registrant.
    fn weight(&self) -> f64 {
        1.0
    }

    async fn analyze(&self, data: &StreamData) -> DomainResult<crate::aggregates::stage_result::AnalyzerResult>;
}
