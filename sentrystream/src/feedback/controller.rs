// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The Feedback-Loop Controller (§4.8): owns the named loop catalogue,
//! runs a 100 Hz scheduler that fires each loop's trigger/action in
//! parallel, and recomputes system-wide telemetry once a second.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::warn;

use super::loop_def::FeedbackLoop;
use super::scalars::{AtomicF64, ScalarMetrics};

/// Per-loop fire/success/failure counters and latency, read by the `stats`
/// command and by the once-a-second system telemetry recompute.
#[derive(Default)]
pub struct LoopTelemetry {
    pub fires: AtomicU64,
    pub successes: AtomicU64,
    pub failures: AtomicU64,
    mean_latency_micros: AtomicF64,
    last_fired_unix_millis: AtomicU64,
}

impl LoopTelemetry {
    fn record(&self, success: bool, latency: Duration) {
        self.fires.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }

        let sample = latency.as_secs_f64() * 1_000_000.0;
        let prev = self.mean_latency_micros.get();
        let fires = self.fires.load(Ordering::Relaxed) as f64;
        self.mean_latency_micros.set(prev + (sample - prev) / fires);

        let now_millis = ScalarMetrics::now_unix_secs() * 1000.0;
        self.last_fired_unix_millis.store(now_millis as u64, Ordering::Relaxed);
    }

    pub fn mean_latency(&self) -> Duration {
        Duration::from_secs_f64((self.mean_latency_micros.get() / 1_000_000.0).max(0.0))
    }
}

/// Firing rate, variety absorption, topology completeness and coherence,
/// recomputed once per second (§4.8 step 3).
#[derive(Default)]
pub struct SystemTelemetry {
    pub firing_rate: AtomicF64,
    pub variety_absorption_rate: AtomicF64,
    pub topology_completeness: AtomicF64,
    pub coherence: AtomicF64,
}

struct LoopEntry {
    feedback_loop: Arc<dyn FeedbackLoop>,
    telemetry: LoopTelemetry,
}

pub struct FeedbackController {
    scalars: Arc<ScalarMetrics>,
    loops: Vec<LoopEntry>,
    tick_hz: u32,
    required_levels: usize,
    system: SystemTelemetry,
}

impl FeedbackController {
    pub fn new(scalars: Arc<ScalarMetrics>, loops: Vec<Arc<dyn FeedbackLoop>>, tick_hz: u32) -> Self {
        let required_levels = loops.iter().map(|l| l.level()).collect::<HashSet<_>>().len();
        Self {
            scalars,
            loops: loops.into_iter().map(|feedback_loop| LoopEntry { feedback_loop, telemetry: LoopTelemetry::default() }).collect(),
            tick_hz,
            required_levels: required_levels.max(1),
            system: SystemTelemetry::default(),
        }
    }

    pub fn scalars(&self) -> Arc<ScalarMetrics> {
        self.scalars.clone()
    }

    pub fn system_telemetry(&self) -> &SystemTelemetry {
        &self.system
    }

    /// Runs forever at `tick_hz` until the passed cancellation flag fires.
    /// Each tick snapshots the loop list, fires every loop concurrently,
    /// and once per second recomputes system-wide telemetry.
    pub async fn run(&self, cancelled: Arc<std::sync::atomic::AtomicBool>) {
        let period = Duration::from_secs_f64(1.0 / self.tick_hz as f64);
        let mut interval = tokio::time::interval(period);
        let mut last_recompute = Instant::now();
        let mut fires_since_recompute: u64 = 0;
        let mut successes_since_recompute: u64 = 0;

        while !cancelled.load(Ordering::SeqCst) {
            interval.tick().await;
            let (fires, successes) = self.tick().await;
            fires_since_recompute += fires;
            successes_since_recompute += successes;

            if last_recompute.elapsed() >= Duration::from_secs(1) {
                self.recompute_system_telemetry(fires_since_recompute, successes_since_recompute, last_recompute.elapsed());
                fires_since_recompute = 0;
                successes_since_recompute = 0;
                last_recompute = Instant::now();
            }
        }
    }

    /// Fires every loop's trigger/action once, in parallel. Returns
    /// (fires, successes) for the telemetry recompute.
    pub async fn tick(&self) -> (u64, u64) {
        let tasks = self.loops.iter().map(|entry| {
            let feedback_loop = entry.feedback_loop.clone();
            let scalars = self.scalars.clone();
            async move {
                if !feedback_loop.trigger(&scalars) {
                    return None;
                }
                let start = Instant::now();
                let result = feedback_loop.action(&scalars);
                Some((start.elapsed(), result))
            }
        });

        let outcomes = futures::future::join_all(tasks).await;
        let mut fires = 0u64;
        let mut successes = 0u64;
        for (entry, outcome) in self.loops.iter().zip(outcomes) {
            if let Some((elapsed, result)) = outcome {
                fires += 1;
                let success = result.is_ok();
                if success {
                    successes += 1;
                } else if let Err(e) = result {
                    warn!("feedback loop '{}' action failed: {e}", entry.feedback_loop.name());
                }
                entry.telemetry.record(success, elapsed);
            }
        }
        (fires, successes)
    }

    fn recompute_system_telemetry(&self, fires: u64, successes: u64, elapsed: Duration) {
        let firing_rate = fires as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
        let absorption = if fires > 0 { successes as f64 / fires as f64 } else { 1.0 };
        let active_levels = self.loops.iter().map(|e| e.feedback_loop.level()).collect::<HashSet<_>>().len();
        let completeness = active_levels as f64 / self.required_levels as f64;

        self.system.firing_rate.set(firing_rate);
        self.system.variety_absorption_rate.set(absorption);
        self.system.topology_completeness.set(completeness);
        self.system.coherence.set(firing_rate * absorption);
    }

    pub fn telemetry_for(&self, name: &str) -> Option<(u64, u64, u64, Duration)> {
        self.loops.iter().find(|e| e.feedback_loop.name() == name).map(|e| {
            (
                e.telemetry.fires.load(Ordering::Relaxed),
                e.telemetry.successes.load(Ordering::Relaxed),
                e.telemetry.failures.load(Ordering::Relaxed),
                e.telemetry.mean_latency(),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::catalogue::default_loops;

    #[tokio::test]
    async fn tick_fires_a_loop_whose_trigger_is_satisfied() {
        let scalars = Arc::new(ScalarMetrics::new());
        scalars.cpu_memory_composite.set(0.95);
        let controller = FeedbackController::new(scalars, default_loops(), 100);

        let (fires, successes) = controller.tick().await;
        assert!(fires >= 1);
        assert_eq!(fires, successes);

        let (total_fires, _, _, _) = controller.telemetry_for("resource_contention_yield").unwrap();
        assert_eq!(total_fires, 1);
    }

    #[tokio::test]
    async fn quiescent_scalars_fire_only_the_bootstrap_snapshot_loop() {
        let scalars = Arc::new(ScalarMetrics::new());
        let controller = FeedbackController::new(scalars, default_loops(), 100);
        let (fires, _) = controller.tick().await;
        assert_eq!(fires, 1, "only the periodic snapshot loop should fire on a cold start");
    }
}
