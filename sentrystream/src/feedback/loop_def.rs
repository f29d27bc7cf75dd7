// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The `FeedbackLoop` contract and the levels loops are organized under
//! (§4.8). Every loop action must be idempotent: the scheduler may fire
//! the same loop repeatedly while its trigger condition persists.

use sentrystream_domain::DomainResult;

use super::scalars::ScalarMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    S1S2,
    S2S3,
    S3Audit,
    S3S4,
    S4S5,
    S5S6,
    Bypass,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::S1S2 => "s1_s2",
            Level::S2S3 => "s2_s3",
            Level::S3Audit => "s3_audit",
            Level::S3S4 => "s3_s4",
            Level::S4S5 => "s4_s5",
            Level::S5S6 => "s5_s6",
            Level::Bypass => "bypass",
        }
    }
}

pub trait FeedbackLoop: Send + Sync {
    fn name(&self) -> &str;
    fn level(&self) -> Level;

    /// Cheap, lock-free condition check against current scalar gauges.
    fn trigger(&self, scalars: &ScalarMetrics) -> bool;

    /// Must be safe to re-invoke every tick while `trigger` keeps firing.
    fn action(&self, scalars: &ScalarMetrics) -> DomainResult<()>;
}

/// A loop built from two closures, used for the catalogue of simple
/// threshold-triggered loops in §4.8 rather than hand-writing one struct
/// per behavior.
pub struct ClosureLoop<T, A> {
    name: &'static str,
    level: Level,
    trigger: T,
    action: A,
}

impl<T, A> ClosureLoop<T, A>
where
    T: Fn(&ScalarMetrics) -> bool + Send + Sync,
    A: Fn(&ScalarMetrics) -> DomainResult<()> + Send + Sync,
{
    pub fn new(name: &'static str, level: Level, trigger: T, action: A) -> Self {
        Self { name, level, trigger, action }
    }
}

impl<T, A> FeedbackLoop for ClosureLoop<T, A>
where
    T: Fn(&ScalarMetrics) -> bool + Send + Sync,
    A: Fn(&ScalarMetrics) -> DomainResult<()> + Send + Sync,
{
    fn name(&self) -> &str {
        self.name
    }

    fn level(&self) -> Level {
        self.level
    }

    fn trigger(&self, scalars: &ScalarMetrics) -> bool {
        (self.trigger)(scalars)
    }

    fn action(&self, scalars: &ScalarMetrics) -> DomainResult<()> {
        (self.action)(scalars)
    }
}
