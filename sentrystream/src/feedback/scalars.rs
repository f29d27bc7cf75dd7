// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Atomic scalar gauges the Feedback-Loop Controller's triggers read and
//! its actions adjust (§5, "atomic scalars for all metric gauges ... so
//! trigger evaluation never blocks"). Stored as `AtomicU64` bit patterns of
//! an `f64` since no lock-free float type is in the dependency set.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug)]
pub struct AtomicF64(AtomicU64);

impl AtomicF64 {
    pub fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn set(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

impl Default for AtomicF64 {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// One scalar per trigger condition named in §4.8's per-level catalogue,
/// plus the upper-level health/variety gauges the Open Question resolved
/// as ordinary numeric loops rather than anything more exotic.
#[derive(Debug, Default)]
pub struct ScalarMetrics {
    pub cpu_memory_composite: AtomicF64,
    pub buffer_pressure: AtomicF64,

    pub policy_violation_count: AtomicF64,
    pub configuration_drift_pct: AtomicF64,
    pub quota_usage_pct: AtomicF64,

    pub audit_integrity_ok: AtomicF64,
    pub monitor_health: AtomicF64,

    pub threat_intel_update_count: AtomicF64,
    pub capacity_utilization: AtomicF64,

    pub strategic_goal_deviation_pct: AtomicF64,
    pub risk_score: AtomicF64,

    pub coherence_health: AtomicF64,
    pub variety_level: AtomicF64,
    pub last_snapshot_unix_secs: AtomicF64,
}

impl ScalarMetrics {
    pub fn new() -> Self {
        Self {
            audit_integrity_ok: AtomicF64::new(1.0),
            monitor_health: AtomicF64::new(1.0),
            coherence_health: AtomicF64::new(1.0),
            variety_level: AtomicF64::new(1.0),
            ..Default::default()
        }
    }

    pub fn now_unix_secs() -> f64 {
        SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs_f64()).unwrap_or(0.0)
    }
}
