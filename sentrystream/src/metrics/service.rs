// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Prometheus metrics service for the capture/analysis/sink engine. Tracks
//! events captured, findings per severity, actions taken, filter
//! short-circuits, stage latency, and bypass-channel usage.

use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use std::sync::Arc;
use tracing::debug;

use crate::error::{EngineError, EngineResult};

#[derive(Clone)]
pub struct MetricsService {
    registry: Arc<Registry>,

    pub events_captured_total: IntCounter,
    pub events_dropped_total: IntCounter,
    pub bytes_captured_total: IntCounter,

    pub findings_total: IntCounterVec,
    pub actions_total: IntCounterVec,
    pub filter_short_circuits_total: IntCounterVec,

    pub stage_latency_seconds: Histogram,
    pub active_streams: IntGauge,

    pub bypass_events_total: IntCounter,
    pub bypass_sla_breaches_total: IntCounter,
}

impl MetricsService {
    pub fn new() -> EngineResult<Self> {
        let registry = Registry::new();
        let ns = "sentrystream";

        let events_captured_total = IntCounter::with_opts(
            Opts::new("events_captured_total", "Total stream events captured").namespace(ns),
        )
        .map_err(|e| EngineError::Metrics(e.to_string()))?;

        let events_dropped_total = IntCounter::with_opts(
            Opts::new("events_dropped_total", "Total stream events dropped due to backpressure").namespace(ns),
        )
        .map_err(|e| EngineError::Metrics(e.to_string()))?;

        let bytes_captured_total = IntCounter::with_opts(
            Opts::new("bytes_captured_total", "Total bytes captured across all streams").namespace(ns),
        )
        .map_err(|e| EngineError::Metrics(e.to_string()))?;

        let findings_total = IntCounterVec::new(
            Opts::new("findings_total", "Total findings emitted, by severity").namespace(ns),
            &["severity"],
        )
        .map_err(|e| EngineError::Metrics(e.to_string()))?;

        let actions_total = IntCounterVec::new(
            Opts::new("actions_total", "Total consensus actions taken, by action").namespace(ns),
            &["action"],
        )
        .map_err(|e| EngineError::Metrics(e.to_string()))?;

        let filter_short_circuits_total = IntCounterVec::new(
            Opts::new("filter_short_circuits_total", "Total edge-filter short circuits, by filter name").namespace(ns),
            &["filter"],
        )
        .map_err(|e| EngineError::Metrics(e.to_string()))?;

        let stage_latency_seconds = Histogram::with_opts(
            HistogramOpts::new("stage_latency_seconds", "Pipeline stage processing latency")
                .namespace(ns)
                .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        )
        .map_err(|e| EngineError::Metrics(e.to_string()))?;

        let active_streams =
            IntGauge::with_opts(Opts::new("active_streams", "Number of streams currently being captured").namespace(ns))
                .map_err(|e| EngineError::Metrics(e.to_string()))?;

        let bypass_events_total = IntCounter::with_opts(
            Opts::new("bypass_events_total", "Total events routed through the bypass channel").namespace(ns),
        )
        .map_err(|e| EngineError::Metrics(e.to_string()))?;

        let bypass_sla_breaches_total = IntCounter::with_opts(
            Opts::new(
                "bypass_sla_breaches_total",
                "Total bypass channel deliveries that missed their SLA deadline",
            )
            .namespace(ns),
        )
        .map_err(|e| EngineError::Metrics(e.to_string()))?;

        registry
            .register(Box::new(events_captured_total.clone()))
            .map_err(|e| EngineError::Metrics(e.to_string()))?;
        registry
            .register(Box::new(events_dropped_total.clone()))
            .map_err(|e| EngineError::Metrics(e.to_string()))?;
        registry
            .register(Box::new(bytes_captured_total.clone()))
            .map_err(|e| EngineError::Metrics(e.to_string()))?;
        registry
            .register(Box::new(findings_total.clone()))
            .map_err(|e| EngineError::Metrics(e.to_string()))?;
        registry
            .register(Box::new(actions_total.clone()))
            .map_err(|e| EngineError::Metrics(e.to_string()))?;
        registry
            .register(Box::new(filter_short_circuits_total.clone()))
            .map_err(|e| EngineError::Metrics(e.to_string()))?;
        registry
            .register(Box::new(stage_latency_seconds.clone()))
            .map_err(|e| EngineError::Metrics(e.to_string()))?;
        registry
            .register(Box::new(active_streams.clone()))
            .map_err(|e| EngineError::Metrics(e.to_string()))?;
        registry
            .register(Box::new(bypass_events_total.clone()))
            .map_err(|e| EngineError::Metrics(e.to_string()))?;
        registry
            .register(Box::new(bypass_sla_breaches_total.clone()))
            .map_err(|e| EngineError::Metrics(e.to_string()))?;

        debug!("metrics service initialized");

        Ok(Self {
            registry: Arc::new(registry),
            events_captured_total,
            events_dropped_total,
            bytes_captured_total,
            findings_total,
            actions_total,
            filter_short_circuits_total,
            stage_latency_seconds,
            active_streams,
            bypass_events_total,
            bypass_sla_breaches_total,
        })
    }

    pub fn record_finding(&self, severity: &str) {
        self.findings_total.with_label_values(&[severity]).inc();
    }

    pub fn record_action(&self, action: &str) {
        self.actions_total.with_label_values(&[action]).inc();
    }

    pub fn record_filter_short_circuit(&self, filter: &str) {
        self.filter_short_circuits_total.with_label_values(&[filter]).inc();
    }

    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn render(&self) -> EngineResult<String> {
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .map_err(|e| EngineError::Metrics(e.to_string()))
    }
}

impl Default for MetricsService {
    fn default() -> Self {
        Self::new().expect("failed to construct default MetricsService")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_registered_metric_families() {
        let svc = MetricsService::new().unwrap();
        svc.record_finding("high");
        svc.record_action("block");
        let text = svc.render().unwrap();
        assert!(text.contains("sentrystream_findings_total"));
        assert!(text.contains("sentrystream_actions_total"));
    }

    #[test]
    fn active_streams_gauge_tracks_increment_and_decrement() {
        let svc = MetricsService::new().unwrap();
        svc.active_streams.inc();
        svc.active_streams.inc();
        svc.active_streams.dec();
        assert_eq!(svc.active_streams.get(), 1);
    }
}
