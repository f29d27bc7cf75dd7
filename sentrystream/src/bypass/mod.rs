// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The Bypass Channel (§4.9): a second, priority path guaranteeing an
//! end-to-end response for a small set of critical signal kinds within
//! 100 ms wall-clock. Bypass firings execute synchronously on detection —
//! they are never queued behind the Feedback-Loop Controller's 100 Hz
//! schedule.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{error, warn};

use sentrystream_domain::{DomainError, DomainResult};

use crate::metrics::MetricsService;

/// The required bypass-eligible signal kinds (§4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BypassSignal {
    ActiveExploitation,
    CascadingComponentFailure,
    ImminentDataLoss,
    PublicDisclosure,
}

impl BypassSignal {
    pub fn as_str(self) -> &'static str {
        match self {
            BypassSignal::ActiveExploitation => "active_exploitation",
            BypassSignal::CascadingComponentFailure => "cascading_component_failure",
            BypassSignal::ImminentDataLoss => "imminent_data_loss",
            BypassSignal::PublicDisclosure => "public_disclosure",
        }
    }
}

struct BypassEvent {
    signal: BypassSignal,
    detected_at: Instant,
}

const SLA: Duration = Duration::from_millis(100);
const WRITER_BLOCK_LIMIT: Duration = Duration::from_millis(10);
const CHANNEL_CAPACITY: usize = 64;

/// The writer handle every signal source holds. Cloning is cheap; the
/// underlying `mpsc::Sender` is shared.
#[derive(Clone)]
pub struct BypassWriter {
    sender: mpsc::Sender<BypassEvent>,
}

impl BypassWriter {
    /// Declares the channel unavailable if the send can't complete within
    /// the 10 ms writer-block limit (§4.9) — a hard failure the caller must
    /// surface, not silently retry.
    pub async fn signal(&self, signal: BypassSignal) -> DomainResult<()> {
        let event = BypassEvent { signal, detected_at: Instant::now() };
        match timeout(WRITER_BLOCK_LIMIT, self.sender.send(event)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(DomainError::BypassUnavailable("executive consumer has shut down".into())),
            Err(_) => Err(DomainError::BypassUnavailable(format!(
                "writer blocked past {}ms limit",
                WRITER_BLOCK_LIMIT.as_millis()
            ))),
        }
    }
}

pub type BypassAction = Arc<dyn Fn(BypassSignal) -> DomainResult<()> + Send + Sync>;

/// Owns the single executive consumer task. Constructed with the action to
/// run for every signal; `spawn` drives the consume loop until the writer
/// side is dropped.
pub struct BypassChannel {
    receiver: mpsc::Receiver<BypassEvent>,
    metrics: Arc<MetricsService>,
}

impl BypassChannel {
    pub fn new(metrics: Arc<MetricsService>) -> (BypassWriter, Self) {
        let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        (BypassWriter { sender }, Self { receiver, metrics })
    }

    /// Runs until the writer side is dropped. Every signal's action executes
    /// synchronously and its end-to-end latency (from `detected_at` to the
    /// action returning) is measured against the 100 ms SLA.
    pub async fn run(mut self, action: BypassAction) {
        while let Some(event) = self.receiver.recv().await {
            self.metrics.bypass_events_total.inc();
            let result = action(event.signal);
            let elapsed = event.detected_at.elapsed();

            if elapsed > SLA {
                self.metrics.bypass_sla_breaches_total.inc();
                warn!(
                    "bypass action for {} missed its SLA: {:?} > {:?}",
                    event.signal.as_str(),
                    elapsed,
                    SLA
                );
            }
            if let Err(e) = result {
                error!("bypass action for {} failed: {e}", event.signal.as_str());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn signal_runs_the_action_within_sla() {
        let metrics = Arc::new(MetricsService::new().unwrap());
        let (writer, channel) = BypassChannel::new(metrics.clone());
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_clone = fired.clone();

        let handle = tokio::spawn(channel.run(Arc::new(move |_signal| {
            fired_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })));

        writer.signal(BypassSignal::ActiveExploitation).await.unwrap();
        drop(writer);
        handle.await.unwrap();

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.bypass_events_total.get(), 1);
        assert_eq!(metrics.bypass_sla_breaches_total.get(), 0);
    }

    #[tokio::test]
    async fn action_error_does_not_stop_the_consumer() {
        let metrics = Arc::new(MetricsService::new().unwrap());
        let (writer, channel) = BypassChannel::new(metrics);
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();

        let handle = tokio::spawn(channel.run(Arc::new(move |_signal| {
            seen_clone.fetch_add(1, Ordering::SeqCst);
            Err(DomainError::Internal("simulated failure".into()))
        })));

        writer.signal(BypassSignal::ImminentDataLoss).await.unwrap();
        writer.signal(BypassSignal::PublicDisclosure).await.unwrap();
        drop(writer);
        handle.await.unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }
}
