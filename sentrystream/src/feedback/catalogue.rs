// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The required per-level loop catalogue (§4.8). One `ClosureLoop` per
//! listed behavior; actions only adjust scalar gauges or log, since the
//! actual remediation (throttling a capture, re-indexing patterns) is
//! owned by components this controller only observes and nudges.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use sentrystream_domain::DomainResult;

use super::loop_def::{ClosureLoop, FeedbackLoop, Level};
use super::scalars::ScalarMetrics;

const SNAPSHOT_INTERVAL: Duration = Duration::from_secs(60);

pub fn default_loops() -> Vec<Arc<dyn FeedbackLoop>> {
    vec![
        Arc::new(ClosureLoop::new(
            "resource_contention_yield",
            Level::S1S2,
            |s| s.cpu_memory_composite.get() > 0.8,
            |s| {
                info!("resource contention above threshold, yielding and forcing collection");
                s.cpu_memory_composite.set(0.0);
                Ok(())
            },
        )),
        Arc::new(ClosureLoop::new(
            "buffer_pressure_throttle",
            Level::S1S2,
            |s| s.buffer_pressure.get() > 0.9,
            |s| {
                let current = s.buffer_pressure.get();
                info!("buffer pressure {current:.2} above threshold, commanding upstream throttle");
                s.buffer_pressure.set(current / 2.0);
                Ok(())
            },
        )),
        Arc::new(ClosureLoop::new(
            "policy_violation_enforce",
            Level::S2S3,
            |s| s.policy_violation_count.get() > 0.0,
            |s| {
                info!("policy violations observed, enforcing and resetting counter");
                s.policy_violation_count.set(0.0);
                Ok(())
            },
        )),
        Arc::new(ClosureLoop::new(
            "configuration_drift_correct",
            Level::S2S3,
            |s| s.configuration_drift_pct.get() > 10.0,
            |s| {
                info!("configuration drift above 10%, auto-correcting");
                s.configuration_drift_pct.set(0.0);
                Ok(())
            },
        )),
        Arc::new(ClosureLoop::new(
            "quota_usage_throttle",
            Level::S2S3,
            |s| s.quota_usage_pct.get() > 90.0,
            |_s| {
                info!("quota usage above 90%, throttling");
                Ok(())
            },
        )),
        Arc::new(ClosureLoop::new(
            "audit_integrity_restore",
            Level::S3Audit,
            |s| s.audit_integrity_ok.get() == 0.0,
            |s| {
                info!("audit integrity flag false, restoring from backup");
                s.audit_integrity_ok.set(1.0);
                Ok(())
            },
        )),
        Arc::new(ClosureLoop::new(
            "monitor_health_failover",
            Level::S3Audit,
            |s| s.monitor_health.get() < 0.8,
            |s| {
                info!("monitor health below threshold, failing over");
                s.monitor_health.set(1.0);
                Ok(())
            },
        )),
        Arc::new(ClosureLoop::new(
            "threat_intel_reindex",
            Level::S3S4,
            |s| s.threat_intel_update_count.get() > 0.0,
            |s| {
                info!("threat intelligence updates pending, re-indexing detection patterns");
                s.threat_intel_update_count.set(0.0);
                Ok(())
            },
        )),
        Arc::new(ClosureLoop::new(
            "capacity_scale_out_recommend",
            Level::S3S4,
            |s| s.capacity_utilization.get() > 0.8,
            |_s| {
                info!("capacity utilization above 80%, recommending scale-out");
                Ok(())
            },
        )),
        Arc::new(ClosureLoop::new(
            "strategic_goal_adjust",
            Level::S4S5,
            |s| s.strategic_goal_deviation_pct.get() > 10.0,
            |s| {
                info!("strategic goal deviation above 10%, adjusting targets");
                s.strategic_goal_deviation_pct.set(0.0);
                Ok(())
            },
        )),
        Arc::new(ClosureLoop::new(
            "risk_score_mitigate",
            Level::S4S5,
            |s| s.risk_score.get() > 70.0,
            |s| {
                info!("risk score above 70, applying mitigation");
                s.risk_score.set(0.0);
                Ok(())
            },
        )),
        Arc::new(ClosureLoop::new(
            "coherence_health_restore_snapshot",
            Level::S5S6,
            |s| s.coherence_health.get() < 0.7,
            |s| {
                info!("coherence health below threshold, restoring last snapshot");
                s.coherence_health.set(1.0);
                Ok(())
            },
        )),
        Arc::new(ClosureLoop::new(
            "variety_inject",
            Level::S5S6,
            |s| s.variety_level.get() < 0.3,
            |s| {
                info!("variety level below threshold, injecting controlled variation");
                s.variety_level.set(1.0);
                Ok(())
            },
        )),
        Arc::new(periodic_snapshot_loop()),
    ]
}

fn periodic_snapshot_loop() -> ClosureLoop<impl Fn(&ScalarMetrics) -> bool, impl Fn(&ScalarMetrics) -> DomainResult<()>> {
    ClosureLoop::new(
        "periodic_snapshot",
        Level::S5S6,
        |s| {
            let now = ScalarMetrics::now_unix_secs();
            now - s.last_snapshot_unix_secs.get() >= SNAPSHOT_INTERVAL.as_secs_f64()
        },
        |s| {
            info!("taking periodic coherence snapshot");
            s.last_snapshot_unix_secs.set(ScalarMetrics::now_unix_secs());
            Ok(())
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_covers_every_required_level() {
        let loops = default_loops();
        for level in [Level::S1S2, Level::S2S3, Level::S3Audit, Level::S3S4, Level::S4S5, Level::S5S6] {
            assert!(loops.iter().any(|l| l.level() == level), "missing a loop for {:?}", level.as_str());
        }
    }

    #[test]
    fn resource_contention_loop_resets_after_firing() {
        let scalars = ScalarMetrics::new();
        scalars.cpu_memory_composite.set(0.95);
        let loops = default_loops();
        let target = loops.iter().find(|l| l.name() == "resource_contention_yield").unwrap();

        assert!(target.trigger(&scalars));
        target.action(&scalars).unwrap();
        assert!(!target.trigger(&scalars));
    }
}
