// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! End-to-end scenarios driving the pipeline, filters, sinks, and bypass
//! channel through their public APIs rather than any one stage in
//! isolation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use sentrystream::analyzers::PatternAnalyzer;
use sentrystream::bypass::{BypassChannel, BypassSignal};
use sentrystream::filters::RateLimitFilter;
use sentrystream::metrics::MetricsService;
use sentrystream::pipeline::{DeepStage, EdgeStage, Pipeline, ResultCache, ShallowStage};
use sentrystream::sinks::MemorySink;

use sentrystream_domain::aggregates::alert::Alert;
use sentrystream_domain::aggregates::event::Event;
use sentrystream_domain::entities::stream_config::StreamKind;
use sentrystream_domain::ports::{Filter, Sink};
use sentrystream_domain::services::PatternRegistry;
use sentrystream_domain::value_objects::enums::{Action, Direction, FilterPriority};
use sentrystream_domain::value_objects::ids::StreamId;
use sentrystream_domain::value_objects::severity::Severity;
use sentrystream_domain::{DomainError, DomainResult};

fn default_pipeline() -> Pipeline {
    let registry = Arc::new(PatternRegistry::with_default_patterns().unwrap());
    Pipeline::new(
        EdgeStage::new(vec![]),
        ShallowStage::new(registry.clone()),
        DeepStage::new(vec![Arc::new(PatternAnalyzer::new(registry))], true),
        ResultCache::new(64, Duration::from_secs(60)),
        Arc::new(MetricsService::new().unwrap()),
    )
}

fn chunk(bytes: &[u8]) -> sentrystream_domain::entities::stream_data::StreamData {
    sentrystream_domain::entities::stream_data::StreamData::new(StreamId::new(), StreamKind::Stdio, "test", Direction::Inbound, bytes.to_vec())
}

/// §8 scenario 1: SQL injection detection.
#[tokio::test]
async fn sql_injection_in_spawned_output_is_flagged() {
    let pipeline = default_pipeline();
    let data = chunk(b"username=' UNION SELECT password FROM users --");
    let result = pipeline.process(&data).await.unwrap();

    assert_ne!(result.action, Action::Allow);
    let finding = result
        .stages
        .iter()
        .flat_map(|s| s.findings.iter())
        .find(|f| f.family == "sql_injection")
        .expect("a sql_injection finding");
    assert!(finding.severity >= Severity::High);
    assert!(String::from_utf8_lossy(data.data()).contains("UNION SELECT"));
}

/// §8 scenario 2: path traversal.
#[tokio::test]
async fn path_traversal_request_line_is_flagged() {
    let pipeline = default_pipeline();
    let data = chunk(b"GET /../../../etc/passwd HTTP/1.1\r\n\r\n");
    let result = pipeline.process(&data).await.unwrap();

    assert_ne!(result.action, Action::Allow);
    let finding = result
        .stages
        .iter()
        .flat_map(|s| s.findings.iter())
        .find(|f| f.family == "path_traversal")
        .expect("a path_traversal finding");
    assert!(finding.severity >= Severity::High);
    assert_eq!(finding.pattern_id, "path-etc-passwd");
}

/// §8 scenario 3: rate limiting. 15 chunks of 32 bytes from one source
/// against a 10 tokens/s, burst-10 bucket: the first 10 are accepted, the
/// rest rejected, back to back with no time for refill between them.
#[tokio::test]
async fn fifteen_chunks_against_a_burst_of_ten_allows_exactly_ten() {
    let filter = RateLimitFilter::new("rate", FilterPriority::Medium, 10.0, 10);
    let chunk_bytes = vec![0u8; 32];

    let accepted = (0..15).filter(|_| filter.apply(&chunk_bytes)).count();
    assert_eq!(accepted, 10);

    let stats = filter.stats();
    assert_eq!(stats.processed, 15);
    // `matched` counts the filter's own trigger condition (over the limit),
    // so it is the rejected count, not the accepted count.
    assert_eq!(stats.matched, 5);
}

/// §8 scenario 4: entropy discrimination. A run of identical bytes has
/// zero entropy and is rejected; a chunk with every byte value distinct
/// has the maximum entropy reachable by that many samples and is accepted
/// (and flagged downstream) once the threshold sits below it.
#[tokio::test]
async fn high_entropy_input_passes_low_entropy_input_is_rejected() {
    use sentrystream::filters::entropy_filter::shannon_entropy;

    let repeated = vec![b'A'; 64];
    let distinct: Vec<u8> = (0..64).collect();
    assert_eq!(shannon_entropy(&repeated), 0.0);
    assert!(shannon_entropy(&distinct) > shannon_entropy(&repeated));

    let filter = sentrystream::filters::EntropyFilter::new("entropy", FilterPriority::Low, 5.0);
    assert!(!filter.apply(&repeated));
    assert!(filter.apply(&distinct));
}

struct AlwaysFailingSink;

#[async_trait]
impl Sink for AlwaysFailingSink {
    async fn write_event(&self, _event: &Event) -> DomainResult<()> {
        Err(DomainError::Io("blocking consumer never reads".into()))
    }

    async fn write_alert(&self, _alert: &Alert) -> DomainResult<()> {
        Err(DomainError::Io("blocking consumer never reads".into()))
    }

    async fn close(&self) -> DomainResult<()> {
        Ok(())
    }
}

/// §8 scenario 5: sink fan-out with a slow consumer. The memory sink still
/// receives the alert and the aggregate write reports success even though
/// the other sink fails every call.
#[tokio::test]
async fn multi_sink_delivers_to_the_healthy_sink_despite_a_failing_one() {
    let memory = Arc::new(MemorySink::new());
    let multi = sentrystream::sinks::MultiSink::new(vec![memory.clone(), Arc::new(AlwaysFailingSink)]);

    let alert = Alert::new(
        Severity::Critical,
        "sql_injection",
        "sqli-union-select",
        "SentryStream detection",
        "pipeline action: Block",
        4242,
        "pid:4242",
        b"' UNION SELECT password FROM users --",
        true,
    );

    multi.write_alert(&alert).await.unwrap();
    assert_eq!(memory.alerts().len(), 1);
    assert_eq!(memory.alerts()[0].pattern, "sqli-union-select");
}

/// §8 scenario 6: bypass timing. Firing a signal reaches the executive
/// consumer and its action runs well under the 100 ms SLA.
#[tokio::test]
async fn bypass_signal_resolves_the_flag_within_the_sla() {
    let metrics = Arc::new(MetricsService::new().unwrap());
    let (writer, channel) = BypassChannel::new(metrics);

    let active_exploitation_flag = Arc::new(std::sync::atomic::AtomicBool::new(true));
    let flag_for_action = active_exploitation_flag.clone();
    let action: sentrystream::bypass::BypassAction = Arc::new(move |_signal| {
        flag_for_action.store(false, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    });

    let handle = tokio::spawn(channel.run(action));

    let start = std::time::Instant::now();
    writer.signal(BypassSignal::ActiveExploitation).await.unwrap();
    drop(writer);
    handle.await.unwrap();
    let elapsed = start.elapsed();

    assert!(elapsed < Duration::from_millis(100), "bypass round trip took {elapsed:?}");
    assert!(!active_exploitation_flag.load(std::sync::atomic::Ordering::SeqCst));
}
