// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Serialization-ready `Event` snapshot (§6). Field names and shape match
//! the JSON record in the spec exactly.

use std::collections::HashMap;

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::value_objects::enums::{Direction, EventKind};
use crate::value_objects::severity::Severity;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub direction: Direction,
    pub pid: i32,
    pub process_name: String,
    pub fd: i32,
    pub data: String,
    pub size: usize,
    pub summary: String,
    pub metadata: HashMap<String, Value>,
    pub severity: Severity,
}

impl Event {
    pub fn new(kind: EventKind, direction: Direction, pid: i32, process_name: impl Into<String>, fd: i32, data: &[u8]) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            direction,
            pid,
            process_name: process_name.into(),
            fd,
            data: base64::engine::general_purpose::STANDARD.encode(data),
            size: data.len(),
            summary: String::new(),
            metadata: HashMap::new(),
            severity: Severity::None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let event = Event::new(EventKind::Read, Direction::Inbound, 42, "sh", 0, b"hello").with_summary("greeting");
        let line = event.to_json_line().unwrap();
        let decoded: Event = serde_json::from_str(&line).unwrap();
        assert_eq!(decoded.pid, 42);
        assert_eq!(decoded.size, 5);
        assert_eq!(decoded.summary, "greeting");
    }
}
