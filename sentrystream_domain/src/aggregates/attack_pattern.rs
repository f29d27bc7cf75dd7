// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `AttackPattern` and `Finding` — the units the Pattern Registry compiles
//! and emits. Confidence and severity are authored per pattern, never
//! derived at runtime (§4.2 key design decision), so downstream aggregators
//! can treat them as stable weights.

use std::collections::HashMap;

use regex::bytes::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::value_objects::confidence::Confidence;
use crate::value_objects::severity::Severity;

#[derive(Clone)]
pub struct AttackPattern {
    pub id: &'static str,
    pub family: &'static str,
    pub severity: Severity,
    pub confidence: Confidence,
    pub description: &'static str,
    pub regex: Regex,
}

impl std::fmt::Debug for AttackPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttackPattern")
            .field("id", &self.id)
            .field("family", &self.family)
            .field("severity", &self.severity)
            .finish()
    }
}

/// One matched pattern against one chunk, produced by `match_all`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub pattern_id: String,
    pub family: String,
    pub severity: Severity,
    pub confidence: Confidence,
    pub details: HashMap<String, Value>,
}
