// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Serialization-ready `Alert` snapshot, and the CEF single-line encoder
//! (§6). Evidence is length-bounded per §3 so a single matched chunk can
//! never blow up an alert sink's line length.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value_objects::severity::Severity;

const MAX_EVIDENCE_LEN: usize = 512;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub timestamp: DateTime<Utc>,
    pub event_id: String,
    pub severity: Severity,
    pub category: String,
    pub pattern: String,
    pub title: String,
    pub description: String,
    pub details: String,
    pub pid: i32,
    pub process_name: String,
    pub evidence: String,
    pub blocked: bool,
    pub mitigation: String,
}

impl Alert {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        severity: Severity,
        category: impl Into<String>,
        pattern: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        pid: i32,
        process_name: impl Into<String>,
        evidence: &[u8],
        blocked: bool,
    ) -> Self {
        let evidence = String::from_utf8_lossy(evidence);
        let evidence = if evidence.len() > MAX_EVIDENCE_LEN { &evidence[..MAX_EVIDENCE_LEN] } else { &evidence };

        Self {
            timestamp: Utc::now(),
            event_id: Uuid::new_v4().to_string(),
            severity,
            category: category.into(),
            pattern: pattern.into(),
            title: title.into(),
            description: description.into(),
            details: String::new(),
            pid,
            process_name: process_name.into(),
            evidence: evidence.to_string(),
            blocked,
            mitigation: String::new(),
        }
    }

    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// `CEF:0|Macawi|Strigoi|1.0|<signature>|<name>|<cefSeverity>|<k=v ...>`
    /// per §6's CEF format.
    pub fn to_cef(&self) -> String {
        let cef_sev = self.severity.cef_severity();
        let extension = format!(
            "pid={} proc={} pattern={} blocked={} evidence={}",
            self.pid,
            cef_escape(&self.process_name),
            cef_escape(&self.pattern),
            self.blocked,
            cef_escape(&self.evidence),
        );
        format!(
            "CEF:0|Macawi|Strigoi|1.0|{}|{}|{}|{}",
            cef_escape(&self.pattern),
            cef_escape(&self.title),
            cef_sev,
            extension
        )
    }
}

fn cef_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('=', "\\=").replace('|', "\\|").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cef_line_has_required_header_and_severity() {
        let alert = Alert::new(Severity::Critical, "sql_injection", "sqli-union-select", "SQLi", "desc", 1, "bash", b"UNION SELECT", true);
        let cef = alert.to_cef();
        assert!(cef.starts_with("CEF:0|Macawi|Strigoi|1.0|"));
        assert!(cef.contains("|10|"));
    }

    #[test]
    fn evidence_is_length_bounded() {
        let long = vec![b'A'; 10_000];
        let alert = Alert::new(Severity::Low, "c", "p", "t", "d", 1, "proc", &long, false);
        assert!(alert.evidence.len() <= MAX_EVIDENCE_LEN);
    }

    #[test]
    fn round_trips_through_json() {
        let alert = Alert::new(Severity::High, "path_traversal", "path-etc-passwd", "Traversal", "desc", 7, "curl", b"../../../etc/passwd", true);
        let line = alert.to_json_line().unwrap();
        let decoded: Alert = serde_json::from_str(&line).unwrap();
        assert_eq!(decoded.pid, 7);
        assert_eq!(decoded.severity, Severity::High);
    }
}
