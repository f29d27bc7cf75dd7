// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Small closed enumerations shared across the engine: filter priority
//! buckets, pipeline stage tags, the terminal pipeline action, and stream
//! direction.

use serde::{Deserialize, Serialize};

/// Priority bucket a Filter is registered under (§3, Filter entity).
/// Not currently used to reorder evaluation — filters run in insertion
/// order per §3 — but carried through stats for operator visibility and
/// for S1↔S2 loops that may want to disable low-priority filters first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterPriority {
    Low,
    Medium,
    High,
    Critical,
}

/// Which pipeline stage produced a `StageResult` (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageTag {
    Edge,
    Shallow,
    Deep,
}

/// Terminal action a `ProcessingResult` resolves to (§3, §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Allow,
    Alert,
    Block,
    Redirect,
}

/// Direction of a captured chunk relative to the monitored process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
    Unknown,
    None,
}

/// Event record `type` field (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Read,
    Write,
    Connect,
    Close,
    Error,
    Summary,
}

/// Lifecycle state of a `StreamCapture` (§3 invariant: created → running →
/// stopped, one-way).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureStatus {
    Created,
    Running,
    Stopped,
}

/// Executive operating mode: in `Monitored`, a policy result of `block` on
/// medium/≥2/3 agreement downgrades to `alert` instead, per the §4.6
/// policy table footnote "(monitored modes: alert)".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorMode {
    Enforcing,
    Monitored,
}
