// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # StreamConfig
//!
//! The immutable parameters of a capture (§3). `StreamConfig` is the only
//! input the Stream Manager needs to dispatch `create_stream` on `kind`; it
//! never changes after a `StreamCapture` is built from it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stream transport kind. Only `Stdio` is fully specified; the others are
/// placeholders left for a later specification (§9 Open Questions) but are
/// still representable so the Manager's dispatch is exhaustive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Stdio,
    Remote,
    Serial,
    Network,
}

/// Where a capture's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceDescriptor {
    /// Attach to an already-running process by pid.
    Attach { pid: u32 },
    /// Spawn a new process under a PTY; `argv[0]` is the command.
    Spawn { argv: Vec<String> },
}

impl SourceDescriptor {
    pub fn as_source_string(&self) -> String {
        match self {
            SourceDescriptor::Attach { pid } => format!("pid:{pid}"),
            SourceDescriptor::Spawn { argv } => format!("spawn:{}", argv.join(" ")),
        }
    }
}

/// A single filter's construction parameters, carried as data so
/// `StreamConfig` stays serializable; the engine resolves these into live
/// `Filter` trait objects when it builds the `StreamCapture`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterSpec {
    Regex { name: String, patterns: Vec<String> },
    Keyword { name: String, keywords: Vec<String>, case_sensitive: bool },
    Length { name: String, max_bytes: usize },
    RateLimit { name: String, tokens_per_sec: f64, burst: u64 },
    Entropy { name: String, threshold: f64 },
}

impl FilterSpec {
    pub fn name(&self) -> &str {
        match self {
            FilterSpec::Regex { name, .. }
            | FilterSpec::Keyword { name, .. }
            | FilterSpec::Length { name, .. }
            | FilterSpec::RateLimit { name, .. }
            | FilterSpec::Entropy { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    pub kind: StreamKind,
    pub source: SourceDescriptor,
    pub capacity_bytes: usize,
    pub filters: Vec<FilterSpec>,
    pub metadata: HashMap<String, Value>,
}

impl StreamConfig {
    pub fn stdio_spawn(argv: Vec<String>, capacity_bytes: usize) -> Self {
        Self {
            kind: StreamKind::Stdio,
            source: SourceDescriptor::Spawn { argv },
            capacity_bytes,
            filters: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn stdio_attach(pid: u32, capacity_bytes: usize) -> Self {
        Self {
            kind: StreamKind::Stdio,
            source: SourceDescriptor::Attach { pid },
            capacity_bytes,
            filters: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    /// A config with no explicit filters is the trigger for the Manager to
    /// install the default S1 set, per §4.5.
    pub fn has_no_filters(&self) -> bool {
        self.filters.is_empty()
    }
}
