// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `EngineService`: the operations behind the control CLI (§6.1). Owns the
//! Stream Manager, a Pipeline and Sink per live stream, and the shared
//! Pattern Registry and metrics every stream's pipeline is built from.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::warn;

use sentrystream_domain::aggregates::alert::Alert;
use sentrystream_domain::aggregates::attack_pattern::Finding;
use sentrystream_domain::aggregates::event::Event;
use sentrystream_domain::aggregates::stage_result::ProcessingResult;
use sentrystream_domain::entities::stats::CaptureStats;
use sentrystream_domain::entities::stream_config::{FilterSpec, StreamConfig};
use sentrystream_domain::entities::stream_data::StreamData;
use sentrystream_domain::ports::capture::SubscriberCallback;
use sentrystream_domain::ports::Sink;
use sentrystream_domain::services::PatternRegistry;
use sentrystream_domain::value_objects::enums::{Action, Direction, EventKind};
use sentrystream_domain::value_objects::ids::StreamId;
use sentrystream_domain::value_objects::severity::Severity;
use sentrystream_domain::DomainResult;

use crate::filters::{build_filter, default_filter_specs};
use crate::manager::StreamManager;
use crate::metrics::MetricsService;
use crate::pipeline::{DeepStage, EdgeStage, Pipeline, ResultCache, ShallowStage};
use crate::sinks::{build_sink, Format};

use crate::analyzers::{EntropyAnalyzer, PatternAnalyzer};

pub struct EngineService {
    manager: Arc<StreamManager>,
    pipelines: DashMap<StreamId, Arc<Pipeline>>,
    sinks: DashMap<StreamId, Arc<dyn Sink>>,
    pattern_registry: Arc<PatternRegistry>,
    metrics: Arc<MetricsService>,
    entropy_threshold: f64,
    enforcing: bool,
    default_rate_limit_per_sec: u32,
    cache_capacity: usize,
    cache_ttl: Duration,
}

impl EngineService {
    pub fn new(
        manager: Arc<StreamManager>,
        pattern_registry: Arc<PatternRegistry>,
        metrics: Arc<MetricsService>,
        entropy_threshold: f64,
        enforcing: bool,
        default_rate_limit_per_sec: u32,
    ) -> Self {
        Self {
            manager,
            pipelines: DashMap::new(),
            sinks: DashMap::new(),
            pattern_registry,
            metrics,
            entropy_threshold,
            enforcing,
            default_rate_limit_per_sec,
            cache_capacity: 4096,
            cache_ttl: Duration::from_secs(300),
        }
    }

    /// Creates a stream and the pipeline/sink pair that processes it, then
    /// subscribes the pipeline to the capture's fan-out so every accepted
    /// chunk is analyzed and routed without the caller driving it by hand.
    pub async fn create_stream(&self, config: StreamConfig, destination: &str, format: Format) -> DomainResult<StreamId> {
        let specs = if config.has_no_filters() {
            default_filter_specs(self.default_rate_limit_per_sec)
        } else {
            config.filters.clone()
        };

        let edge_filters = specs.iter().map(build_filter).collect::<DomainResult<Vec<_>>>()?;

        let pipeline = Arc::new(Pipeline::new(
            EdgeStage::new(edge_filters),
            ShallowStage::new(self.pattern_registry.clone()),
            DeepStage::new(
                vec![
                    Arc::new(PatternAnalyzer::new(self.pattern_registry.clone())),
                    Arc::new(EntropyAnalyzer::new(self.entropy_threshold)),
                ],
                self.enforcing,
            ),
            ResultCache::new(self.cache_capacity, self.cache_ttl),
            self.metrics.clone(),
        ));

        let sink = build_sink(destination, format).await?;

        let stream_id = self.manager.create_stream(config)?;
        let capture = self.manager.get(&stream_id)?;

        let pipeline_for_callback = pipeline.clone();
        let sink_for_callback = sink.clone();
        let metrics = self.metrics.clone();
        let callback: SubscriberCallback = Box::new(move |data: StreamData| {
            let pipeline = pipeline_for_callback.clone();
            let sink = sink_for_callback.clone();
            let metrics = metrics.clone();
            tokio::spawn(async move {
                if let Err(e) = process_and_route(&pipeline, &sink, &metrics, data).await {
                    warn!("pipeline processing failed: {e}");
                }
            });
        });
        capture.subscribe(callback);

        self.pipelines.insert(stream_id, pipeline);
        self.sinks.insert(stream_id, sink);
        self.metrics.active_streams.inc();

        Ok(stream_id)
    }

    pub async fn destroy_stream(&self, id: &StreamId) -> DomainResult<()> {
        self.manager.destroy_stream(id).await?;
        self.pipelines.remove(id);
        if let Some((_, sink)) = self.sinks.remove(id) {
            sink.close().await?;
        }
        self.metrics.active_streams.dec();
        Ok(())
    }

    pub async fn start_stream(&self, id: &StreamId) -> DomainResult<()> {
        self.manager.start_stream(id).await
    }

    pub async fn stop_stream(&self, id: &StreamId, deadline: Duration) -> DomainResult<()> {
        self.manager.stop_stream(id, deadline).await
    }

    pub fn attach_filter(&self, id: &StreamId, spec: &FilterSpec) -> DomainResult<()> {
        let capture = self.manager.get(id)?;
        let filter = build_filter(spec)?;
        capture.add_filter(filter);
        Ok(())
    }

    pub fn list(&self) -> Vec<StreamId> {
        self.manager.list()
    }

    pub fn stats(&self, id: &StreamId) -> DomainResult<CaptureStats> {
        Ok(self.manager.get(id)?.stats())
    }

    pub fn manager(&self) -> Arc<StreamManager> {
        self.manager.clone()
    }

    pub fn metrics(&self) -> Arc<MetricsService> {
        self.metrics.clone()
    }
}

async fn process_and_route(pipeline: &Pipeline, sink: &Arc<dyn Sink>, metrics: &MetricsService, data: StreamData) -> DomainResult<()> {
    let result = pipeline.process(&data).await?;

    let severity = result.consensus.as_ref().map(|c| c.severity).unwrap_or(Severity::None);
    let (pid, process_name) = identify_source(&data.source);

    let event = Event::new(event_kind(data.direction), data.direction, pid, process_name.as_str(), 0, data.data())
        .with_severity(severity)
        .with_summary(format!("{:?} -> {:?}", data.direction, result.action));
    sink.write_event(&event).await?;
    metrics.bytes_captured_total.inc_by(data.len() as u64);

    if result.action != Action::Allow {
        let alert = build_alert(&result, &process_name, pid, data.data(), severity);
        sink.write_alert(&alert).await?;
    }

    Ok(())
}

fn event_kind(direction: Direction) -> EventKind {
    match direction {
        Direction::Inbound => EventKind::Read,
        Direction::Outbound => EventKind::Write,
        Direction::Unknown | Direction::None => EventKind::Summary,
    }
}

fn identify_source(source: &str) -> (i32, String) {
    if let Some(pid_str) = source.strip_prefix("pid:") {
        if let Ok(pid) = pid_str.parse::<i32>() {
            return (pid, source.to_string());
        }
    }
    (0, source.to_string())
}

fn build_alert(result: &ProcessingResult, process_name: &str, pid: i32, evidence: &[u8], severity: Severity) -> Alert {
    let top_finding: Option<&Finding> = result
        .stages
        .iter()
        .flat_map(|stage| stage.findings.iter())
        .max_by_key(|f| f.severity);

    let category = top_finding.map(|f| f.family.clone()).unwrap_or_else(|| "policy".to_string());
    let pattern = top_finding.map(|f| f.pattern_id.clone()).unwrap_or_else(|| "edge-filter-reject".to_string());
    let blocked = matches!(result.action, Action::Block | Action::Redirect);

    Alert::new(
        severity,
        category,
        pattern,
        "SentryStream detection",
        format!("pipeline action: {:?}", result.action),
        pid,
        process_name,
        evidence,
        blocked,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentrystream_domain::entities::stream_config::{SourceDescriptor, StreamKind};

    #[tokio::test]
    async fn creating_and_destroying_a_stream_updates_the_manager() {
        let manager = Arc::new(StreamManager::new(1000));
        let registry = Arc::new(PatternRegistry::with_default_patterns().unwrap());
        let metrics = Arc::new(MetricsService::new().unwrap());
        let service = EngineService::new(manager, registry, metrics, 7.5, true, 1000);

        let config = StreamConfig {
            kind: StreamKind::Stdio,
            source: SourceDescriptor::Spawn { argv: vec!["/bin/true".into()] },
            capacity_bytes: 4096,
            filters: vec![],
            metadata: Default::default(),
        };

        let id = service.create_stream(config, "-", Format::Jsonl).await.unwrap();
        assert_eq!(service.list(), vec![id]);
        service.destroy_stream(&id).await.unwrap();
        assert!(service.list().is_empty());
    }
}
